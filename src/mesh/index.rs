//! Typed element ids.
//!
//! Vertices, corners, faces and edges are numbered densely from zero. The
//! wrappers keep the four numberings apart; the integer width is a type
//! parameter so a single card can live in `u16` ids while a full groom export
//! uses `u64`.

use std::fmt::{self, Debug};
use std::hash::Hash;
use std::ops::Range;

/// Integer storage for mesh element ids.
pub trait MeshIndex:
    Copy + Eq + Ord + Hash + Debug + Send + Sync + 'static
{
    /// Narrow a dense index into this type.
    ///
    /// # Panics
    /// Panics in debug builds if `v` does not fit.
    fn from_usize(v: usize) -> Self;

    /// Widen back to `usize`.
    fn to_usize(self) -> usize;
}

macro_rules! impl_mesh_index {
    ($($t:ty),*) => {
        $(
            impl MeshIndex for $t {
                #[inline]
                fn from_usize(v: usize) -> Self {
                    debug_assert!(<$t>::try_from(v).is_ok(), "index {} overflows {}", v, stringify!($t));
                    v as $t
                }

                #[inline]
                fn to_usize(self) -> usize {
                    self as usize
                }
            }
        )*
    };
}

impl_mesh_index!(u16, u32, u64);

macro_rules! element_id {
    ($(#[$doc:meta])* $name:ident, $tag:literal) => {
        $(#[$doc])*
        #[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
        #[repr(transparent)]
        pub struct $name<I: MeshIndex = u32>(I);

        impl<I: MeshIndex> $name<I> {
            /// Wrap a dense index.
            #[inline]
            pub fn new(index: usize) -> Self {
                Self(I::from_usize(index))
            }

            /// The dense index.
            #[inline]
            pub fn index(self) -> usize {
                self.0.to_usize()
            }

            /// Ids `0..count`, in order.
            pub fn range(count: usize) -> impl DoubleEndedIterator<Item = Self> + ExactSizeIterator {
                Range { start: 0, end: count }.map(Self::new)
            }
        }

        impl<I: MeshIndex> Debug for $name<I> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($tag, "{}"), self.index())
            }
        }

        impl<I: MeshIndex> From<usize> for $name<I> {
            fn from(v: usize) -> Self {
                Self::new(v)
            }
        }
    };
}

element_id!(
    /// A vertex of the mesh; also the key of a weight group entry.
    VertexId,
    "v"
);
element_id!(
    /// A face corner. Every UV layer stores one coordinate per corner.
    CornerId,
    "c"
);
element_id!(
    /// A polygon face.
    FaceId,
    "f"
);
element_id!(
    /// An undirected edge of the edge table.
    EdgeId,
    "e"
);
