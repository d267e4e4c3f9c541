//! Progress reporting for rig generation and binding.
//!
//! Operations that walk many meshes, loops or smoothing passes take a
//! [`Progress`] and report each step to the caller.
//!
//! # Example
//!
//! ```
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//! use tress::algo::Progress;
//!
//! let steps = Arc::new(AtomicUsize::new(0));
//! let counter = Arc::clone(&steps);
//! let progress = Progress::new(move |current, total, message| {
//!     counter.fetch_add(1, Ordering::Relaxed);
//!     eprintln!("[{}/{}] {}", current, total, message);
//! });
//!
//! progress.report(0, 2, "Generating bone chains");
//! progress.report(1, 2, "Generating bone chains");
//! assert_eq!(steps.load(Ordering::Relaxed), 2);
//! ```

/// Resolution of one outer step in [`Progress::report_sub`].
const SUB_STEPS: usize = 1000;

type Callback = dyn Fn(usize, usize, &str) + Send + Sync;

/// Step callback for long operations: `(current, total, message)`.
///
/// `current` counts completed steps; `current == total` marks the end.
pub struct Progress {
    callback: Box<Callback>,
}

impl Progress {
    /// Wrap a callback.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(usize, usize, &str) + Send + Sync + 'static,
    {
        Self {
            callback: Box::new(callback),
        }
    }

    /// A reporter that ignores every update.
    pub fn none() -> Self {
        Self::new(|_, _, _| {})
    }

    /// Report step `current` of `total`.
    #[inline]
    pub fn report(&self, current: usize, total: usize, message: &str) {
        (self.callback)(current, total, message);
    }

    /// Report phase `sub_current` of `sub_total` inside outer step
    /// `range_current` of `range_total`.
    ///
    /// The callback sees `range_total * 1000` steps, so nested phases advance
    /// the bar smoothly. Binding reports three phases per mesh this way:
    ///
    /// ```
    /// # use tress::algo::Progress;
    /// let progress = Progress::new(|current, total, _| assert_eq!((current, total), (2333, 4000)));
    /// progress.report_sub(1, 3, 2, 4, "Assigning weights");
    /// ```
    #[inline]
    pub fn report_sub(
        &self,
        sub_current: usize,
        sub_total: usize,
        range_current: usize,
        range_total: usize,
        message: &str,
    ) {
        if sub_total == 0 || range_total == 0 {
            return;
        }
        let within = sub_current * SUB_STEPS / sub_total;
        (self.callback)(range_current * SUB_STEPS + within, range_total * SUB_STEPS, message);
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self::none()
    }
}

impl std::fmt::Debug for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Progress")
    }
}
