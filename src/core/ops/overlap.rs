use std::mem::size_of;

use crate::core::view::NdArray;

/// Half-open byte range `[first, end)` touched by `array`, `None` when it
/// touches no memory.
fn span<T, S, const N: usize>(array: &S) -> Option<(usize, usize)>
where
    S: NdArray<T, N>,
{
    let size = size_of::<T>() as isize;
    if size == 0 {
        return None;
    }

    let (low, high) = array.layout().offset_bounds()?;
    let base = array.as_ptr() as isize;

    Some((
        base.wrapping_add(low * size) as usize,
        base.wrapping_add((high + 1) * size) as usize,
    ))
}

/// True if `lhs` and `rhs` might address the same memory.
///
/// Compares the address ranges between the first and last element of each
/// operand, so interleaved but disjoint operands count as overlapping.
pub(crate) fn overlaps<T, U, L, R, const N: usize, const M: usize>(lhs: &L, rhs: &R) -> bool
where
    L: NdArray<T, N>,
    R: NdArray<U, M>,
{
    match (span(lhs), span(rhs)) {
        (Some((lhs_first, lhs_end)), Some((rhs_first, rhs_end))) => {
            lhs_first < rhs_end && rhs_first < lhs_end
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use crate::core::{array::MultiArray, view::NdArray};

    #[test]
    fn disjoint_subarrays_do_not_overlap() {
        let a = MultiArray::from_fn([8], |[i]| i as u32);
        let view = a.view();

        let head = view.subarray([0], [4]);
        let tail = view.subarray([4], [8]);
        assert!(!head.overlaps(&tail));
        assert!(!tail.overlaps(&head));
    }

    #[test]
    fn shifted_subarrays_overlap() {
        let a = MultiArray::from_fn([8], |[i]| i as u32);
        let view = a.view();

        assert!(view.subarray([0], [5]).overlaps(&view.subarray([4], [8])));
        assert!(view.overlaps(&view));
    }

    #[test]
    fn interleaved_views_are_treated_as_overlapping() {
        let a = MultiArray::from_fn([2, 4], |[i, j]| (i + 2 * j) as u32);
        let view = a.view();

        let even = view.bind::<0, 1>(0);
        let odd = view.bind::<0, 1>(1);
        assert!(even.overlaps(&odd));
    }

    #[test]
    fn separate_arrays_and_empty_views_do_not_overlap() {
        let a = MultiArray::from_elem([3, 3], 1.0f64);
        let b = MultiArray::from_elem([3, 3], 1.0f64);
        assert!(!a.overlaps(&b));

        let empty = a.view().subarray([1, 1], [1, 3]);
        assert!(!empty.overlaps(&a));
    }
}
