use crate::toolkit::bitmap::BitMask;
use itertools::{enumerate, izip};
use ndarray::{Array2, ArrayView2};
use num_traits::Float;
use std::{cell::UnsafeCell, thread::available_parallelism};

/// The float types the numeric kernels are defined over.
pub trait AFloat: Float + Send + Sync + 'static {}

impl AFloat for f32 {}
impl AFloat for f64 {}

/// A shared writable window over a slice, for tasks that each own a
/// disjoint set of slots.
pub struct UnsafeSlice<'a, T> {
    slice: &'a [UnsafeCell<T>],
}
unsafe impl<'a, T: Send + Sync> Send for UnsafeSlice<'a, T> {}
unsafe impl<'a, T: Send + Sync> Sync for UnsafeSlice<'a, T> {}
impl<'a, T> Clone for UnsafeSlice<'a, T> {
    fn clone(&self) -> Self {
        Self { slice: self.slice }
    }
}
impl<'a, T> Copy for UnsafeSlice<'a, T> {}

impl<'a, T> UnsafeSlice<'a, T> {
    pub fn new(slice: &'a mut [T]) -> Self {
        let ptr = slice as *mut [T] as *const [UnsafeCell<T>];
        Self {
            slice: unsafe { &*ptr },
        }
    }

    pub fn shadow(&mut self) -> Self {
        Self { slice: self.slice }
    }

    /// Callers must write each slot from at most one task at a time.
    pub fn set(&self, i: usize, value: T) {
        let ptr = self.slice[i].get();
        unsafe {
            *ptr = value;
        }
    }
}

/// Apply `f` to every non-null position of `values`; null slots keep a
/// zero backing value and `f` is never invoked on them.
pub fn map_unary<T, F>(values: &[T], nulls: &BitMask, f: F) -> Vec<T>
where
    T: AFloat,
    F: Fn(T) -> T,
{
    let mut out = vec![T::zero(); values.len()];
    for (i, &v) in enumerate(values.iter()) {
        if !nulls.is_set(i) {
            out[i] = f(v);
        }
    }
    out
}

/// Pair `lhs` and `rhs` positionwise under `f`. A position that is null on
/// either side is null in the result and `f` is not invoked on it.
pub fn zip_binary<T, F>(
    lhs: &[T],
    rhs: &[T],
    lhs_nulls: &BitMask,
    rhs_nulls: &BitMask,
    f: F,
) -> (Vec<T>, BitMask)
where
    T: AFloat,
    F: Fn(T, T) -> T,
{
    debug_assert_eq!(lhs.len(), rhs.len());
    let nulls = lhs_nulls.union(rhs_nulls);
    let mut out = vec![T::zero(); lhs.len()];
    for (i, (&a, &b)) in enumerate(izip!(lhs, rhs)) {
        if !nulls.is_set(i) {
            out[i] = f(a, b);
        }
    }
    (out, nulls)
}

/// The raw-buffer form of the unary engine: a dense matrix has no null
/// mask, so `f` runs at every position.
pub fn map_unary_view<T, F>(values: ArrayView2<T>, f: F) -> Array2<T>
where
    T: AFloat,
    F: Fn(T) -> T,
{
    values.mapv(f)
}

/// How many worker threads `tasks` independent tasks deserve.
pub fn suggested_threads(tasks: usize) -> usize {
    let max_threads = available_parallelism().map(|n| n.get()).unwrap_or(1);
    tasks.min(max_threads)
}
