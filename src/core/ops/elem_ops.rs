use log::debug;
use std::{
    ops::{AddAssign, DivAssign, MulAssign, SubAssign},
    ptr,
};

use crate::core::{
    alloc::Allocator,
    array::MultiArray,
    errors::*,
    iters::Strider,
    ops::overlap::overlaps,
    view::{ArrayView, ArrayViewMut, NdArray},
};

#[track_caller]
fn same_shape<const N: usize>(operation: &'static str, lhs: &[usize; N], rhs: &[usize; N]) {
    precondition(lhs == rhs, || ShapeMismatchError {
        operation,
        lhs_shape: lhs.to_vec(),
        rhs_shape: rhs.to_vec(),
    });
}

impl<'a, T: Copy, const N: usize> ArrayViewMut<'a, T, N> {
    /// Copies `rhs` element by element.
    ///
    /// `rhs` may overlap `self`; it is then read through a temporary copy,
    /// so the result equals copying from an untouched `rhs`.
    #[track_caller]
    pub fn assign<S>(&self, rhs: &S)
    where
        S: NdArray<T, N>,
    {
        same_shape("assign", self.shape(), rhs.shape());

        if self.is_unstrided() && rhs.is_unstrided() && !overlaps(self, rhs) {
            // SAFETY: both sides are gapless blocks of `len` elements and do
            // not share memory.
            unsafe { ptr::copy_nonoverlapping(rhs.as_ptr(), self.ptr, self.len()) };
            return;
        }

        self.combine("assign", rhs, |_, r| r);
    }

    /// Replaces each element `l` with `f(l, r)`, `r` being the matching
    /// element of `rhs`. Overlap is handled as in [`ArrayViewMut::assign`].
    #[track_caller]
    pub fn zip_assign<S, F>(&self, rhs: &S, f: F)
    where
        S: NdArray<T, N>,
        F: Fn(T, T) -> T,
    {
        self.combine("zip_assign", rhs, f);
    }

    pub fn map_assign<F>(&self, f: F)
    where
        F: Fn(T) -> T,
    {
        for offset in Strider::new(&self.layout) {
            let target = self.ptr.wrapping_offset(offset);
            // SAFETY: the offset is addressed by the layout.
            unsafe { target.write(f(target.read())) };
        }
    }

    /// Overwrites every element with `value`.
    pub fn fill(&self, value: T) {
        self.map_assign(|_| value);
    }

    /// Exchanges the elements of `self` and `other`.
    #[track_caller]
    pub fn swap_data(&self, other: &ArrayViewMut<'_, T, N>) {
        same_shape("swap_data", self.shape(), other.shape());

        if overlaps(self, other) {
            debug!(
                "swap_data: operands of shape {:?} overlap, going through a temporary",
                self.shape()
            );
            let saved = self.to_array();
            self.assign(other);
            other.assign(&saved);
            return;
        }

        for (lhs, rhs) in Strider::new(&self.layout).zip(Strider::new(&other.layout)) {
            // SAFETY: both offsets are addressed, and the operands are disjoint.
            unsafe { ptr::swap(self.ptr.wrapping_offset(lhs), other.ptr.wrapping_offset(rhs)) };
        }
    }

    #[track_caller]
    fn combine<S, F>(&self, operation: &'static str, rhs: &S, f: F)
    where
        S: NdArray<T, N>,
        F: Fn(T, T) -> T,
    {
        same_shape(operation, self.shape(), rhs.shape());

        if overlaps(self, rhs) {
            debug!(
                "{operation}: operands of shape {:?} overlap, buffering right-hand side",
                rhs.shape()
            );
            let buffered = rhs.to_array();
            self.combine_disjoint(&buffered, f);
        } else {
            self.combine_disjoint(rhs, f);
        }
    }

    fn combine_disjoint<S, F>(&self, rhs: &S, f: F)
    where
        S: NdArray<T, N>,
        F: Fn(T, T) -> T,
    {
        let source = rhs.as_ptr();

        for (lhs, rhs) in Strider::new(&self.layout).zip(Strider::new(rhs.layout())) {
            let target = self.ptr.wrapping_offset(lhs);
            // SAFETY: both offsets are addressed by their layouts, and the
            // source is not written during the loop.
            unsafe { target.write(f(target.read(), source.wrapping_offset(rhs).read())) };
        }
    }
}

// --- Compute-assign operators ---

macro_rules! compute_assign {
    ($trait:ident, $method:ident, $op:tt) => {
        impl<'b, T, const N: usize> $trait<&ArrayView<'b, T, N>> for ArrayViewMut<'_, T, N>
        where
            T: Copy + $trait,
        {
            #[track_caller]
            fn $method(&mut self, rhs: &ArrayView<'b, T, N>) {
                self.combine(stringify!($method), rhs, |mut l, r| {
                    l $op r;
                    l
                });
            }
        }

        impl<'b, T, const N: usize> $trait<&ArrayViewMut<'b, T, N>> for ArrayViewMut<'_, T, N>
        where
            T: Copy + $trait,
        {
            #[track_caller]
            fn $method(&mut self, rhs: &ArrayViewMut<'b, T, N>) {
                self.combine(stringify!($method), rhs, |mut l, r| {
                    l $op r;
                    l
                });
            }
        }

        impl<T, const N: usize, A: Allocator> $trait<&MultiArray<T, N, A>> for ArrayViewMut<'_, T, N>
        where
            T: Copy + $trait,
        {
            #[track_caller]
            fn $method(&mut self, rhs: &MultiArray<T, N, A>) {
                self.combine(stringify!($method), rhs, |mut l, r| {
                    l $op r;
                    l
                });
            }
        }

        impl<T, const N: usize> $trait<T> for ArrayViewMut<'_, T, N>
        where
            T: Copy + $trait,
        {
            fn $method(&mut self, rhs: T) {
                self.map_assign(|mut l| {
                    l $op rhs;
                    l
                });
            }
        }

        impl<'b, T, const N: usize, A: Allocator> $trait<&ArrayView<'b, T, N>> for MultiArray<T, N, A>
        where
            T: Copy + $trait,
        {
            #[track_caller]
            fn $method(&mut self, rhs: &ArrayView<'b, T, N>) {
                let mut lhs = self.view_mut();
                lhs $op rhs;
            }
        }

        impl<'b, T, const N: usize, A: Allocator> $trait<&ArrayViewMut<'b, T, N>> for MultiArray<T, N, A>
        where
            T: Copy + $trait,
        {
            #[track_caller]
            fn $method(&mut self, rhs: &ArrayViewMut<'b, T, N>) {
                let mut lhs = self.view_mut();
                lhs $op rhs;
            }
        }

        impl<T, const N: usize, A: Allocator, B: Allocator> $trait<&MultiArray<T, N, B>> for MultiArray<T, N, A>
        where
            T: Copy + $trait,
        {
            #[track_caller]
            fn $method(&mut self, rhs: &MultiArray<T, N, B>) {
                let mut lhs = self.view_mut();
                lhs $op rhs;
            }
        }

        impl<T, const N: usize, A: Allocator> $trait<T> for MultiArray<T, N, A>
        where
            T: Copy + $trait,
        {
            fn $method(&mut self, rhs: T) {
                for element in self.iter_mut() {
                    *element $op rhs;
                }
            }
        }
    };
}

compute_assign!(AddAssign, add_assign, +=);
compute_assign!(SubAssign, sub_assign, -=);
compute_assign!(MulAssign, mul_assign, *=);
compute_assign!(DivAssign, div_assign, /=);

// --- Equality ---

fn equals<T, L, R, const N: usize>(lhs: &L, rhs: &R) -> bool
where
    T: Copy + PartialEq,
    L: NdArray<T, N>,
    R: NdArray<T, N>,
{
    lhs.shape() == rhs.shape() && lhs.elements().zip(rhs.elements()).all(|(l, r)| l == r)
}

macro_rules! equality {
    ([$($generics:tt)*] $lhs:ty, $rhs:ty) => {
        impl<$($generics)*, T: Copy + PartialEq, const N: usize> PartialEq<$rhs> for $lhs {
            fn eq(&self, rhs: &$rhs) -> bool {
                equals(self, rhs)
            }
        }
    };
}

equality!(['a, 'b] ArrayView<'a, T, N>, ArrayView<'b, T, N>);
equality!(['a, 'b] ArrayView<'a, T, N>, ArrayViewMut<'b, T, N>);
equality!(['a, A: Allocator] ArrayView<'a, T, N>, MultiArray<T, N, A>);

equality!(['a, 'b] ArrayViewMut<'a, T, N>, ArrayViewMut<'b, T, N>);
equality!(['a, 'b] ArrayViewMut<'a, T, N>, ArrayView<'b, T, N>);
equality!(['a, A: Allocator] ArrayViewMut<'a, T, N>, MultiArray<T, N, A>);

equality!([A: Allocator, B: Allocator] MultiArray<T, N, A>, MultiArray<T, N, B>);
equality!(['b, A: Allocator] MultiArray<T, N, A>, ArrayView<'b, T, N>);
equality!(['b, A: Allocator] MultiArray<T, N, A>, ArrayViewMut<'b, T, N>);

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{catch_unwind, AssertUnwindSafe};

    fn iota(count: usize) -> Vec<i32> {
        (0..count as i32).collect()
    }

    #[test]
    fn shift_by_one_matches_explicit_temporary() {
        let mut data = iota(10);
        let expected: Vec<i32> = {
            let snapshot = data.clone();
            let mut out = snapshot.clone();
            out[1..10].copy_from_slice(&snapshot[0..9]);
            out
        };

        let whole = ArrayViewMut::new(&mut data, [10]).unwrap();
        let head = whole.subarray([0], [9]);
        let tail = whole.subarray([1], [10]);
        tail.assign(&head);

        assert_eq!(data, expected);
    }

    #[test]
    fn overlapping_compute_assign_reads_original_values() {
        let mut data = iota(6);
        let whole = ArrayViewMut::new(&mut data, [6]).unwrap();
        let mut head = whole.subarray([0], [5]);
        let tail = whole.subarray([1], [6]);

        head += &tail;
        assert_eq!(data, vec![1, 3, 5, 7, 9, 5]);
    }

    #[test]
    fn shape_mismatch_panics_and_leaves_operands_unchanged() {
        let mut lhs = MultiArray::from_elem([2, 3], 1);
        let rhs = MultiArray::from_elem([3, 2], 2);

        let result = catch_unwind(AssertUnwindSafe(|| lhs.view_mut().assign(&rhs)));
        assert!(result.is_err());
        assert!(lhs.iter().all(|&x| x == 1));
        assert!(rhs.iter().all(|&x| x == 2));

        let result = catch_unwind(AssertUnwindSafe(|| lhs += &rhs));
        assert!(result.is_err());
        assert!(lhs.iter().all(|&x| x == 1));
    }

    #[test]
    #[should_panic(expected = "do not match in sub_assign")]
    fn shape_mismatch_names_the_operation() {
        let mut lhs = MultiArray::from_elem([4], 1.0);
        lhs -= &MultiArray::from_elem([5], 1.0);
    }

    #[test]
    fn compute_assign_with_arrays_and_scalars() {
        let mut a = MultiArray::from_fn([2, 2], |[i, j]| (1 + i + 2 * j) as f64);
        let b = MultiArray::from_elem([2, 2], 2.0);

        a += &b;
        assert_eq!(a.as_slice(), &[3.0, 4.0, 5.0, 6.0]);
        a *= 2.0;
        assert_eq!(a.as_slice(), &[6.0, 8.0, 10.0, 12.0]);
        a /= &b.view();
        assert_eq!(a.as_slice(), &[3.0, 4.0, 5.0, 6.0]);
        a -= 3.0;
        assert_eq!(a.as_slice(), &[0.0, 1.0, 2.0, 3.0]);

        let mut column = a.view_mut().bind::<1, 1>(1);
        column *= 10.0;
        assert_eq!(a.as_slice(), &[0.0, 1.0, 20.0, 30.0]);
    }

    #[test]
    fn assign_through_transposed_view() {
        let mut a = MultiArray::from_fn([2, 3], |[i, j]| (i + 2 * j) as u8);
        let b = MultiArray::from_fn([3, 2], |[i, j]| (10 * i + j) as u8);

        a.view_mut().transpose().assign(&b);
        assert_eq!(a[[1, 2]], b[[2, 1]]);
        assert_eq!(a.view().transpose(), b.view());
    }

    #[test]
    fn transposing_in_place_buffers() {
        let mut a = MultiArray::from_fn([3, 3], |[i, j]| (i + 3 * j) as i32);
        let expected = a.view().transpose().to_array();

        let target = a.view_mut();
        target.assign(&target.transpose());
        assert_eq!(a, expected);
    }

    #[test]
    fn swap_data_between_disjoint_views() {
        let mut data = iota(8);
        let whole = ArrayViewMut::new(&mut data, [8]).unwrap();

        whole.subarray([0], [4]).swap_data(&whole.subarray([4], [8]));
        assert_eq!(data, vec![4, 5, 6, 7, 0, 1, 2, 3]);
    }

    #[test]
    fn swap_data_between_overlapping_views() {
        let mut data = iota(5);
        let whole = ArrayViewMut::new(&mut data, [5]).unwrap();
        let head = whole.subarray([0], [4]);
        let tail = whole.subarray([1], [5]);

        head.swap_data(&tail);
        // head takes [1, 2, 3, 4], then tail takes the saved [0, 1, 2, 3].
        assert_eq!(data, vec![1, 0, 1, 2, 3]);
    }

    #[test]
    fn equality_across_handle_kinds() {
        let a = MultiArray::from_fn([2, 2], |[i, j]| i + 2 * j);
        let b = a.clone();
        let mut c = MultiArray::from_fn([2, 2], |[i, j]| i + 2 * j);

        assert_eq!(a, b);
        assert_eq!(a.view(), b);
        assert_eq!(a, b.view());
        assert!(c.view_mut() == a.view());

        c[[1, 1]] = 0;
        assert_ne!(a, c);

        let flat = MultiArray::from_fn([4, 1], |[i, _]| i);
        assert!(a != flat);
        assert_eq!(flat.view().bind::<1, 1>(0), MultiArray::from_fn([4], |[i]| i));
    }

    #[test]
    fn fill_and_map_assign_follow_strides() {
        let mut a = MultiArray::<i64, 2>::zeros([3, 3]);
        let view = a.view_mut();

        view.stridearray([2, 1]).fill(7);
        view.bind::<0, 1>(1).map_assign(|x| x - 1);
        assert_eq!(a.as_slice(), &[7, -1, 0, 7, -1, 0, 7, -1, 0]);
    }
}
