use core::mem::size_of;

#[inline]
pub fn to_nbytes<T: Sized>(values_len: usize) -> usize {
    values_len * size_of::<T>()
}
