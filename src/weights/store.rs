//! The host-side weight seam and its in-memory implementation.

use std::collections::BTreeMap;

use crate::error::Result;
use crate::mesh::{MeshIndex, VertexId};

/// Named per-vertex weight groups owned by a host application.
///
/// A group's name is the name of the bone it binds to. Weights are in `[0, 1]`;
/// a vertex absent from a group has no weight in it.
pub trait WeightStore<I: MeshIndex = u32> {
    /// Group names in creation order.
    fn group_names(&self) -> Vec<String>;

    /// Create a group if it does not exist.
    fn ensure_group(&mut self, name: &str) -> Result<()>;

    /// Weight of `vertex` in group `name`.
    fn weight(&self, name: &str, vertex: VertexId<I>) -> Option<f64>;

    /// Set the weight of `vertex` in group `name`, creating the group on demand.
    ///
    /// The weight is clamped to `[0, 1]` and replaces any previous value.
    fn set_weight(&mut self, name: &str, vertex: VertexId<I>, weight: f64) -> Result<()>;

    /// Remove a group. Returns whether it existed.
    fn remove_group(&mut self, name: &str) -> Result<bool>;

    /// Every `(group, weight)` pair of `vertex`, in group order.
    fn groups_of(&self, vertex: VertexId<I>) -> Vec<(String, f64)>;

    /// Multiply every weight of group `name` by `factor`.
    fn scale_group(&mut self, name: &str, factor: f64) -> Result<()>;

    /// Whether a group exists.
    fn has_group(&self, name: &str) -> bool {
        self.group_names().iter().any(|n| n == name)
    }
}

/// In-memory weight groups.
///
/// Groups keep their creation order; weights within a group are ordered by
/// vertex.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightMap<I: MeshIndex = u32> {
    groups: Vec<(String, BTreeMap<VertexId<I>, f64>)>,
}

impl<I: MeshIndex> Default for WeightMap<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: MeshIndex> WeightMap<I> {
    /// Create an empty weight map.
    pub fn new() -> Self {
        Self { groups: Vec::new() }
    }

    /// Number of groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// The weights of one group.
    pub fn group(&self, name: &str) -> Option<&BTreeMap<VertexId<I>, f64>> {
        self.groups.iter().find(|(n, _)| n == name).map(|(_, g)| g)
    }

    fn group_mut(&mut self, name: &str) -> &mut BTreeMap<VertexId<I>, f64> {
        let index = match self.groups.iter().position(|(n, _)| n == name) {
            Some(index) => index,
            None => {
                self.groups.push((name.to_string(), BTreeMap::new()));
                self.groups.len() - 1
            }
        };
        &mut self.groups[index].1
    }
}

impl<I: MeshIndex> WeightStore<I> for WeightMap<I> {
    fn group_names(&self) -> Vec<String> {
        self.groups.iter().map(|(n, _)| n.clone()).collect()
    }

    fn ensure_group(&mut self, name: &str) -> Result<()> {
        self.group_mut(name);
        Ok(())
    }

    fn weight(&self, name: &str, vertex: VertexId<I>) -> Option<f64> {
        self.group(name)?.get(&vertex).copied()
    }

    fn set_weight(&mut self, name: &str, vertex: VertexId<I>, weight: f64) -> Result<()> {
        self.group_mut(name).insert(vertex, weight.clamp(0.0, 1.0));
        Ok(())
    }

    fn remove_group(&mut self, name: &str) -> Result<bool> {
        let before = self.groups.len();
        self.groups.retain(|(n, _)| n != name);
        Ok(self.groups.len() != before)
    }

    fn groups_of(&self, vertex: VertexId<I>) -> Vec<(String, f64)> {
        self.groups
            .iter()
            .filter_map(|(n, g)| g.get(&vertex).map(|&w| (n.clone(), w)))
            .collect()
    }

    fn scale_group(&mut self, name: &str, factor: f64) -> Result<()> {
        if let Some((_, group)) = self.groups.iter_mut().find(|(n, _)| n == name) {
            for w in group.values_mut() {
                *w = (*w * factor).clamp(0.0, 1.0);
            }
        }
        Ok(())
    }

    fn has_group(&self, name: &str) -> bool {
        self.group(name).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_groups_keep_creation_order() {
        let mut map: WeightMap = WeightMap::new();
        map.set_weight("b", VertexId::new(0), 0.5).unwrap();
        map.ensure_group("a").unwrap();
        map.set_weight("b", VertexId::new(1), 0.25).unwrap();
        map.ensure_group("b").unwrap();
        assert_eq!(map.group_names(), vec!["b", "a"]);
        assert_eq!(map.group("b").unwrap().len(), 2);
    }

    #[test]
    fn test_weights_are_clamped_and_replaced() {
        let mut map: WeightMap = WeightMap::new();
        let v = VertexId::new(3);
        map.set_weight("g", v, 1.5).unwrap();
        assert_eq!(map.weight("g", v), Some(1.0));
        map.set_weight("g", v, -0.5).unwrap();
        assert_eq!(map.weight("g", v), Some(0.0));
        assert_eq!(map.weight("g", VertexId::new(4)), None);
        assert_eq!(map.weight("h", v), None);
    }

    #[test]
    fn test_remove_and_scale() {
        let mut map: WeightMap = WeightMap::new();
        let v = VertexId::new(0);
        map.set_weight("a", v, 0.8).unwrap();
        map.set_weight("b", v, 0.4).unwrap();
        map.scale_group("a", 0.5).unwrap();
        assert_eq!(map.groups_of(v), vec![("a".to_string(), 0.4), ("b".to_string(), 0.4)]);

        assert!(map.remove_group("a").unwrap());
        assert!(!map.remove_group("a").unwrap());
        assert!(!map.has_group("a"));
        assert_eq!(map.len(), 1);
    }
}
