use crate::core::errors::*;

/// Whether dimension 0 of a layout is known to have unit stride.
///
/// `Contiguous` enables the cheaper offset computation that skips the
/// multiply on dimension 0. `General` makes no assumption about any stride.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Classification {
    Contiguous,
    General,
}

impl Classification {
    fn classify(stride: &[isize]) -> Classification {
        match stride.first() {
            Some(1) => Classification::Contiguous,
            _ => Classification::General,
        }
    }
}

// --- Shape and stride arithmetic ---

/// Gapless stride of `shape`, or `None` if its element count does not fit
/// in `isize`.
pub(crate) fn checked_stride<const N: usize>(shape: &[usize; N]) -> Option<[isize; N]> {
    let mut stride = [0; N];
    let mut current: isize = 1;

    for (step, &extent) in stride.iter_mut().zip(shape) {
        *step = current;
        current = current.checked_mul(isize::try_from(extent).ok()?)?;
    }

    Some(stride)
}

/// Number of elements addressed by `shape`.
///
/// Panics if the count does not fit in `isize`.
#[track_caller]
pub fn element_count(shape: &[usize]) -> usize {
    shape
        .iter()
        .try_fold(1usize, |count, &extent| count.checked_mul(extent))
        .filter(|&count| count <= isize::MAX as usize)
        .unwrap_or_else(|| violated(ShapeOverflowError { shape: shape.to_vec() }))
}

/// Gapless stride of `shape`, dimension 0 varying fastest.
///
/// Panics if the element count does not fit in `isize`.
#[track_caller]
pub fn default_stride<const N: usize>(shape: &[usize; N]) -> [isize; N] {
    match checked_stride(shape) {
        Some(stride) => stride,
        None => violated(ShapeOverflowError { shape: shape.to_vec() }),
    }
}

/// Coordinate of the `index`-th element in scan order.
///
/// `index` must lie in `[0, element_count(shape))`.
pub fn scan_order_to_coordinate<const N: usize>(index: usize, shape: &[usize; N]) -> [usize; N] {
    let mut coordinate = [0; N];

    if let Some((last, inner)) = coordinate.split_last_mut() {
        let mut rest = index;
        for (c, &extent) in inner.iter_mut().zip(shape) {
            *c = rest % extent;
            rest /= extent;
        }
        *last = rest;
    }

    coordinate
}

/// Position of `coordinate` in scan order. Inverse of [`scan_order_to_coordinate`].
pub fn coordinate_to_scan_order<const N: usize>(
    coordinate: &[usize; N],
    shape: &[usize; N],
) -> usize {
    coordinate
        .iter()
        .zip(shape)
        .rev()
        .fold(0, |acc, (&c, &extent)| acc * extent + c)
}

/// Memory offset of the `index`-th element in scan order, without building
/// the intermediate coordinate.
pub fn scan_order_to_offset<const N: usize>(
    index: usize,
    shape: &[usize; N],
    stride: &[isize; N],
) -> isize {
    let mut offset = 0;

    if let Some((&last, inner)) = stride.split_last() {
        let mut rest = index;
        for (&step, &extent) in inner.iter().zip(shape) {
            offset += (rest % extent) as isize * step;
            rest /= extent;
        }
        offset += rest as isize * last;
    }

    offset
}

/// Dot product of `coordinate` and `stride`.
#[inline]
pub fn offset_of<const N: usize>(coordinate: &[usize; N], stride: &[isize; N]) -> isize {
    let term = |k: usize| coordinate[k] as isize * stride[k];

    match N {
        1 => term(0),
        2 => term(0) + term(1),
        3 => term(0) + term(1) + term(2),
        4 => term(0) + term(1) + term(2) + term(3),
        5 => term(0) + term(1) + term(2) + term(3) + term(4),
        _ => (0..N).map(term).sum(),
    }
}

/// [`offset_of`] for layouts whose dimension 0 has unit stride.
#[inline]
pub fn offset_of_contiguous<const N: usize>(coordinate: &[usize; N], stride: &[isize; N]) -> isize {
    let head = coordinate.first().map_or(0, |&c| c as isize);
    let term = |k: usize| coordinate[k] as isize * stride[k];

    match N {
        0 | 1 => head,
        2 => head + term(1),
        3 => head + term(1) + term(2),
        4 => head + term(1) + term(2) + term(3),
        5 => head + term(1) + term(2) + term(3) + term(4),
        _ => head + (1..N).map(term).sum::<isize>(),
    }
}

// --- Layout ---

/// Shape, stride and classification of an N-dimensional strided array.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Layout<const N: usize> {
    pub(crate) shape: [usize; N],
    pub(crate) stride: [isize; N],
    pub(crate) classification: Classification,
}

impl<const N: usize> Layout<N> {
    /// Gapless layout of `shape`.
    ///
    /// Panics if the element count does not fit in `isize`.
    #[track_caller]
    pub fn new(shape: [usize; N]) -> Layout<N> {
        match Layout::try_new(shape) {
            Ok(layout) => layout,
            Err(error) => violated(error),
        }
    }

    /// Gapless layout of `shape`, or an error if its element count does not
    /// fit in `isize`.
    #[track_caller]
    pub fn try_new(shape: [usize; N]) -> Result<Layout<N>, ShapeOverflowError> {
        precondition(N > 0, || RankError::Zero);

        let stride = checked_stride(&shape).ok_or_else(|| ShapeOverflowError {
            shape: shape.to_vec(),
        })?;

        Ok(Layout {
            shape,
            stride,
            classification: Classification::Contiguous,
        })
    }

    /// Layout with explicit strides, classified from the stride of dimension 0.
    pub fn with_stride(shape: [usize; N], stride: [isize; N]) -> Layout<N> {
        precondition(N > 0, || RankError::Zero);

        Layout {
            shape,
            stride,
            classification: Classification::classify(&stride),
        }
    }

    pub fn shape(&self) -> &[usize; N] {
        &self.shape
    }

    pub fn stride(&self) -> &[isize; N] {
        &self.stride
    }

    pub fn classification(&self) -> Classification {
        self.classification
    }

    pub fn len(&self) -> usize {
        element_count(&self.shape)
    }

    pub fn is_empty(&self) -> bool {
        self.shape.contains(&0)
    }

    /// True if the elements occupy one gapless block in scan order.
    pub fn is_unstrided(&self) -> bool {
        let mut expected = 1;

        for (&extent, &step) in self.shape.iter().zip(&self.stride) {
            if extent > 1 && step != expected {
                return false;
            }
            expected *= extent as isize;
        }

        true
    }

    #[inline]
    pub(crate) fn offset(&self, coordinate: &[usize; N]) -> isize {
        match self.classification {
            Classification::Contiguous => offset_of_contiguous(coordinate, &self.stride),
            Classification::General => offset_of(coordinate, &self.stride),
        }
    }

    #[track_caller]
    pub(crate) fn checked_offset(&self, coordinate: &[usize; N]) -> isize {
        self.valid_coordinate(coordinate);
        self.offset(coordinate)
    }

    #[track_caller]
    pub(crate) fn scan_offset(&self, index: usize) -> isize {
        let count = self.len();
        precondition(index < count, || IndexError::ScanOrder { index, count });

        scan_order_to_offset(index, &self.shape, &self.stride)
    }

    pub(crate) fn scan_order_to_coordinate(&self, index: usize) -> [usize; N] {
        scan_order_to_coordinate(index, &self.shape)
    }

    pub(crate) fn coordinate_to_scan_order(&self, coordinate: &[usize; N]) -> usize {
        coordinate_to_scan_order(coordinate, &self.shape)
    }

    pub(crate) fn is_inside(&self, point: &[isize; N]) -> bool {
        point
            .iter()
            .zip(&self.shape)
            .all(|(&p, &extent)| p >= 0 && (p as usize) < extent)
    }

    /// Smallest and largest offset addressed by this layout, `None` if empty.
    pub(crate) fn offset_bounds(&self) -> Option<(isize, isize)> {
        if self.is_empty() {
            return None;
        }

        self.extreme_offsets()
    }

    /// Lowest and highest offset of a non-empty layout, `None` if either
    /// does not fit in `isize`.
    pub(crate) fn extreme_offsets(&self) -> Option<(isize, isize)> {
        self.shape
            .iter()
            .zip(&self.stride)
            .try_fold((0isize, 0isize), |(low, high), (&extent, &step)| {
                let end = isize::try_from(extent.saturating_sub(1)).ok()?.checked_mul(step)?;
                if end < 0 {
                    Some((low.checked_add(end)?, high))
                } else {
                    Some((low, high.checked_add(end)?))
                }
            })
    }

    // --- Dimension reduction ---

    /// Fixes the `K` outermost dimensions. Returns the reduced layout and the
    /// offset of its first element.
    #[track_caller]
    pub(crate) fn bind_outer<const K: usize, const M: usize>(
        &self,
        indices: &[usize; K],
    ) -> (Layout<M>, isize) {
        valid_reduction::<K, M>(N);
        let first = N - K;

        let offset = indices
            .iter()
            .enumerate()
            .map(|(j, &index)| self.bound_term(first + j, index))
            .sum();
        let kept = self.kept(0..first);

        (collapse(kept, self.classification), offset)
    }

    /// Fixes the `K` innermost dimensions, which always removes dimension 0.
    #[track_caller]
    pub(crate) fn bind_inner<const K: usize, const M: usize>(
        &self,
        indices: &[usize; K],
    ) -> (Layout<M>, isize) {
        valid_reduction::<K, M>(N);

        let offset = indices
            .iter()
            .enumerate()
            .map(|(dimension, &index)| self.bound_term(dimension, index))
            .sum();
        let kept = self.kept(K..N);

        (collapse(kept, Classification::General), offset)
    }

    /// Fixes `dimension` at `index`. The result keeps the classification
    /// only when dimension 0 survives.
    #[track_caller]
    pub(crate) fn bind_at<const M: usize>(&self, dimension: usize, index: usize) -> (Layout<M>, isize) {
        precondition(dimension < N, || DimensionError::OutOfRange { dimension, rank: N });
        valid_reduction::<1, M>(N);

        let offset = self.bound_term(dimension, index);
        let kept = self.kept((0..N).filter(move |&d| d != dimension));
        let classification = if dimension == 0 {
            Classification::General
        } else {
            self.classification
        };

        (collapse(kept, classification), offset)
    }

    /// Half-open box `[low, high)`.
    #[track_caller]
    pub(crate) fn subarray(&self, low: &[usize; N], high: &[usize; N]) -> (Layout<N>, isize) {
        let mut shape = [0; N];

        for (dimension, ((&start, &end), &size)) in low.iter().zip(high).zip(&self.shape).enumerate() {
            precondition(start <= end, || RangeError::GreaterStartRange(start, end));
            precondition(end <= size, || RangeError::OutOfRange {
                range: (start, end),
                dimension,
                size,
            });
            shape[dimension] = end - start;
        }

        let layout = Layout {
            shape,
            stride: self.stride,
            classification: self.classification,
        };

        (layout, offset_of(low, &self.stride))
    }

    /// Multiplies the strides and divides the extents by `factor`.
    #[track_caller]
    pub(crate) fn stridearray(&self, factor: &[usize; N]) -> Layout<N> {
        let mut shape = self.shape;
        let mut stride = self.stride;

        for (dimension, &f) in factor.iter().enumerate() {
            precondition(f > 0, || RangeError::ZeroFactor(dimension));
            shape[dimension] /= f;
            stride[dimension] *= f as isize;
        }

        Layout {
            shape,
            stride,
            classification: Classification::General,
        }
    }

    #[track_caller]
    pub(crate) fn permute(&self, permutation: &[usize; N]) -> Layout<N> {
        let mut counts = [0usize; N];

        for &dimension in permutation {
            precondition(dimension < N, || PermutationError::OutOfRange { dimension, rank: N });
            counts[dimension] += 1;
        }
        if let Some(repeated) = counts.iter().position(|&count| count != 1) {
            let repeated = permutation
                .iter()
                .copied()
                .find(|&d| counts[d] > 1)
                .unwrap_or(repeated);
            violated(PermutationError::Repetition(repeated));
        }

        let mut shape = [0; N];
        let mut stride = [0; N];
        for (k, &dimension) in permutation.iter().enumerate() {
            shape[k] = self.shape[dimension];
            stride[k] = self.stride[dimension];
        }

        Layout {
            shape,
            stride,
            classification: Classification::General,
        }
    }

    // --- Validation ---

    #[track_caller]
    fn valid_coordinate(&self, coordinate: &[usize; N]) {
        for (dimension, (&index, &size)) in coordinate.iter().zip(&self.shape).enumerate() {
            precondition(index < size, || IndexError::OutOfRange {
                index,
                dimension,
                size,
            });
        }
    }

    #[track_caller]
    fn bound_term(&self, dimension: usize, index: usize) -> isize {
        let size = self.shape[dimension];
        precondition(index < size, || IndexError::OutOfRange {
            index,
            dimension,
            size,
        });

        index as isize * self.stride[dimension]
    }

    fn kept<'s, I>(&'s self, dimensions: I) -> impl Iterator<Item = (usize, isize)> + 's
    where
        I: Iterator<Item = usize> + 's,
    {
        dimensions.map(move |d| (self.shape[d], self.stride[d]))
    }
}

impl Layout<2> {
    pub(crate) fn transpose(&self) -> Layout<2> {
        Layout {
            shape: [self.shape[1], self.shape[0]],
            stride: [self.stride[1], self.stride[0]],
            classification: Classification::General,
        }
    }
}

/// Rank left after binding `bound` of `rank` dimensions. Scalars stay rank 1.
pub const fn reduced_rank(rank: usize, bound: usize) -> usize {
    if rank > bound {
        rank - bound
    } else {
        1
    }
}

#[track_caller]
fn valid_reduction<const K: usize, const M: usize>(rank: usize) {
    precondition(K <= rank, || DimensionError::OutOfRange {
        dimension: K.saturating_sub(1),
        rank,
    });

    let expected = reduced_rank(rank, K);
    precondition(M == expected, || RankError::Reduced {
        rank,
        bound: K,
        expected,
        requested: M,
    });
}

fn collapse<const M: usize>(
    kept: impl Iterator<Item = (usize, isize)>,
    classification: Classification,
) -> Layout<M> {
    let mut shape = [1; M];
    let mut stride = [1; M];

    for (k, (extent, step)) in kept.enumerate() {
        shape[k] = extent;
        stride[k] = step;
    }

    Layout {
        shape,
        stride,
        classification,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_stride_is_gapless() {
        assert_eq!(default_stride(&[2, 3, 4]), [1, 2, 6]);
        assert_eq!(default_stride(&[5]), [1]);
        assert_eq!(default_stride(&[3, 0, 2]), [1, 3, 0]);
    }

    #[test]
    fn scan_order_round_trip() {
        let shape = [3, 4, 2];

        for index in 0..element_count(&shape) {
            let coordinate = scan_order_to_coordinate(index, &shape);
            assert!(coordinate.iter().zip(&shape).all(|(&c, &s)| c < s));
            assert_eq!(coordinate_to_scan_order(&coordinate, &shape), index);
        }
    }

    #[test]
    fn dimension_zero_varies_fastest() {
        let shape = [3, 4];

        assert_eq!(scan_order_to_coordinate(1, &shape), [1, 0]);
        assert_eq!(scan_order_to_coordinate(3, &shape), [0, 1]);
        assert_eq!(scan_order_to_coordinate(11, &shape), [2, 3]);
    }

    #[test]
    fn scan_order_offset_matches_dot_product() {
        let shape = [3, 2, 4];
        let stride = [8, 1, 2];

        for index in 0..element_count(&shape) {
            let coordinate = scan_order_to_coordinate(index, &shape);
            assert_eq!(
                scan_order_to_offset(index, &shape, &stride),
                offset_of(&coordinate, &stride)
            );
        }
    }

    #[test]
    fn offset_round_trip_through_scan_order() {
        let shape = [2, 3, 2, 2, 3, 2];
        let stride = default_stride(&shape);

        for index in 0..element_count(&shape) {
            let c = scan_order_to_coordinate(index, &shape);
            let back = scan_order_to_coordinate(coordinate_to_scan_order(&c, &shape), &shape);
            assert_eq!(offset_of(&c, &stride), offset_of(&back, &stride));
            assert_eq!(offset_of(&c, &stride), index as isize);
        }
    }

    #[test]
    fn contiguous_offset_skips_dimension_zero_stride() {
        let stride = [1, 5, 20];
        assert_eq!(offset_of_contiguous(&[3, 2, 1], &stride), offset_of(&[3, 2, 1], &stride));

        let stride = [1, 2, 6, 24, 120, 720];
        let coordinate = [1, 1, 2, 3, 4, 5];
        assert_eq!(
            offset_of_contiguous(&coordinate, &stride),
            offset_of(&coordinate, &stride)
        );
    }

    #[test]
    fn bind_preserves_classification_unless_dimension_zero() {
        let layout = Layout::new([2, 3, 4]);

        let (inner, offset) = layout.bind_at::<2>(0, 1);
        assert_eq!(inner.classification(), Classification::General);
        assert_eq!(offset, 1);
        assert_eq!(inner.shape(), &[3, 4]);

        let (outer, offset) = layout.bind_at::<2>(2, 3);
        assert_eq!(outer.classification(), Classification::Contiguous);
        assert_eq!(offset, 18);
        assert_eq!(outer.stride(), &[1, 2]);
    }

    #[test]
    fn bind_outer_and_inner() {
        let layout = Layout::new([2, 3, 4]);

        let (outer, offset) = layout.bind_outer::<2, 1>(&[1, 2]);
        assert_eq!(outer.shape(), &[2]);
        assert_eq!(outer.classification(), Classification::Contiguous);
        assert_eq!(offset, 2 + 12);

        let (inner, offset) = layout.bind_inner::<2, 1>(&[1, 2]);
        assert_eq!(inner.shape(), &[4]);
        assert_eq!(inner.stride(), &[6]);
        assert_eq!(inner.classification(), Classification::General);
        assert_eq!(offset, 1 + 4);
    }

    #[test]
    fn binding_every_dimension_leaves_a_scalar() {
        let layout = Layout::new([2, 3]);
        let (scalar, offset) = layout.bind_outer::<2, 1>(&[1, 2]);

        assert_eq!(scalar.shape(), &[1]);
        assert_eq!(scalar.len(), 1);
        assert_eq!(offset, 5);
    }

    #[test]
    #[should_panic(expected = "yields rank 2, not 1")]
    fn bind_rejects_wrong_result_rank() {
        Layout::new([2, 3, 4]).bind_outer::<1, 1>(&[0]);
    }

    #[test]
    #[should_panic(expected = "out of range for dimension 1")]
    fn bind_rejects_out_of_range_index() {
        Layout::new([2, 3]).bind_at::<1>(1, 3);
    }

    #[test]
    fn subarray_and_stridearray() {
        let layout = Layout::new([4, 6]);

        let (sub, offset) = layout.subarray(&[1, 2], &[3, 5]);
        assert_eq!(sub.shape(), &[2, 3]);
        assert_eq!(sub.stride(), &[1, 4]);
        assert_eq!(offset, 1 + 8);
        assert_eq!(sub.classification(), Classification::Contiguous);

        let strided = layout.stridearray(&[2, 4]);
        assert_eq!(strided.shape(), &[2, 1]);
        assert_eq!(strided.stride(), &[2, 16]);
        assert_eq!(strided.classification(), Classification::General);
    }

    #[test]
    fn permute_reorders_shape_and_stride() {
        let layout = Layout::new([2, 3, 4]).permute(&[2, 0, 1]);

        assert_eq!(layout.shape(), &[4, 2, 3]);
        assert_eq!(layout.stride(), &[6, 1, 2]);
    }

    #[test]
    #[should_panic(expected = "Dimension 1 repeats")]
    fn permute_rejects_repeated_dimension() {
        Layout::new([2, 3, 4]).permute(&[1, 1, 0]);
    }

    #[test]
    #[should_panic(expected = "out of range for rank 3")]
    fn permute_rejects_out_of_range_dimension() {
        Layout::new([2, 3, 4]).permute(&[0, 1, 3]);
    }

    #[test]
    fn unstrided_detection() {
        assert!(Layout::new([3, 4]).is_unstrided());
        assert!(!Layout::new([3, 4]).transpose().is_unstrided());
        assert!(Layout::with_stride([1, 4], [7, 1]).is_unstrided());
    }

    #[test]
    fn oversized_shapes_are_rejected() {
        let huge = usize::MAX / 2 + 1;

        assert!(Layout::try_new([huge, 2]).is_err());
        assert!(Layout::try_new([2, huge]).is_err());
        assert!(checked_stride(&[huge, 2]).is_none());
        assert_eq!(Layout::try_new([isize::MAX as usize, 1]).map(|l| l.len()), Ok(isize::MAX as usize));
        assert!(Layout::try_new([0, isize::MAX as usize]).unwrap().is_empty());
    }

    #[test]
    #[should_panic(expected = "more elements than fit in isize")]
    fn element_count_panics_instead_of_wrapping() {
        element_count(&[usize::MAX / 2 + 1, 2]);
    }

    #[test]
    fn extreme_offsets_detect_overflow() {
        let layout = Layout::with_stride([5], [isize::MAX / 2 + 1]);
        assert_eq!(layout.extreme_offsets(), None);

        let layout = Layout::with_stride([3, 2], [isize::MIN / 2, 1]);
        assert_eq!(layout.extreme_offsets(), Some((isize::MIN, 1)));
    }

    #[test]
    fn offset_bounds_cover_negative_strides() {
        let layout = Layout::with_stride([3, 2], [-1, 3]);
        assert_eq!(layout.offset_bounds(), Some((-2, 3)));
        assert_eq!(Layout::new([0, 2]).offset_bounds(), None);
    }
}
