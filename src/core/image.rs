use num_traits::Num;
use std::{
    fmt::{self, Display, Formatter},
    ops::Index,
    slice,
};

use crate::core::{
    errors::*,
    view::{ArrayView, NdArray},
};

/// Three-channel color pixel laid out as three consecutive scalars.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rgb<T> {
    pub r: T,
    pub g: T,
    pub b: T,
}

impl<T> Rgb<T> {
    pub fn new(r: T, g: T, b: T) -> Rgb<T> {
        Rgb { r, g, b }
    }
}

impl<T: Display> Display for Rgb<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.r, self.g, self.b)
    }
}

/// Row-major raster borrowed from an unstrided array. Pixel `(x, y)` is
/// element `x + y * width`.
#[derive(Clone, Copy, Debug)]
pub struct Raster<'a, T> {
    data: &'a [T],
    width: usize,
    height: usize,
}

impl<'a, T> Raster<'a, T> {
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn as_slice(&self) -> &'a [T] {
        self.data
    }

    #[track_caller]
    pub fn row(&self, y: usize) -> &'a [T] {
        precondition(y < self.height, || IndexError::OutOfRange {
            index: y,
            dimension: 1,
            size: self.height,
        });

        &self.data[y * self.width..(y + 1) * self.width]
    }

    pub fn rows(&self) -> impl ExactSizeIterator<Item = &'a [T]> {
        let (data, width) = (self.data, self.width);
        (0..self.height).map(move |y| &data[y * width..(y + 1) * width])
    }
}

impl<T> Index<(usize, usize)> for Raster<'_, T> {
    type Output = T;

    #[track_caller]
    fn index(&self, (x, y): (usize, usize)) -> &T {
        precondition(x < self.width, || IndexError::OutOfRange {
            index: x,
            dimension: 0,
            size: self.width,
        });

        &self.row(y)[x]
    }
}

#[track_caller]
fn unstrided<'a, T, const N: usize>(view: &ArrayView<'a, T, N>) -> &'a [T] {
    precondition(view.is_unstrided(), || {
        RasterError::Strided(view.shape().to_vec(), view.strides().to_vec())
    });

    // SAFETY: an unstrided view addresses `len` consecutive elements borrowed for 'a.
    unsafe { slice::from_raw_parts(view.ptr, view.len()) }
}

impl<'a, T> ArrayView<'a, T, 2> {
    /// Raster of width `shape[0]` and height `shape[1]`. The view must be
    /// unstrided.
    #[track_caller]
    pub fn as_raster(&self) -> Raster<'a, T> {
        Raster {
            data: unstrided(self),
            width: self.shape()[0],
            height: self.shape()[1],
        }
    }
}

impl<'a, T> ArrayView<'a, T, 3> {
    /// Raster whose rows join dimensions 0 and 1, one row per index of
    /// dimension 2.
    #[track_caller]
    pub fn as_raster(&self) -> Raster<'a, T> {
        let [channels, columns, rows] = *self.shape();

        Raster {
            data: unstrided(self),
            width: channels * columns,
            height: rows,
        }
    }

    /// Reads dimension 0 as the three channels of an [`Rgb`] pixel.
    #[track_caller]
    pub fn as_rgb_raster(&self) -> Raster<'a, Rgb<T>>
    where
        T: Num + Copy,
    {
        let [channels, columns, rows] = *self.shape();
        precondition(channels == 3, || RasterError::Channels(channels));
        let data = unstrided(self);

        Raster {
            // SAFETY: `Rgb<T>` is three `T`s with the alignment of `T`, and
            // `data` holds exactly `columns * rows` such triples.
            data: unsafe { slice::from_raw_parts(data.as_ptr().cast::<Rgb<T>>(), columns * rows) },
            width: columns,
            height: rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::array::MultiArray;

    #[test]
    fn rank_two_raster_is_row_major() {
        let a = MultiArray::from_fn([4, 3], |[x, y]| 10 * y + x);
        let raster = a.view().as_raster();

        assert_eq!((raster.width(), raster.height()), (4, 3));
        assert_eq!(raster.row(1), &[10, 11, 12, 13]);
        assert_eq!(raster[(3, 2)], 23);
        assert_eq!(raster.rows().count(), 3);
    }

    #[test]
    fn rank_three_raster_flattens_inner_dimensions() {
        let a = MultiArray::from_fn([2, 3, 2], |[c, x, y]| 100 * y + 10 * x + c);
        let raster = a.view().as_raster();

        assert_eq!((raster.width(), raster.height()), (6, 2));
        assert_eq!(raster.row(1), &[100, 101, 110, 111, 120, 121]);
    }

    #[test]
    fn rgb_raster_groups_channels() {
        let a = MultiArray::from_fn([3, 2, 2], |[c, x, y]| (c + 3 * x + 6 * y) as u8);
        let raster = a.view().as_rgb_raster();

        assert_eq!((raster.width(), raster.height()), (2, 2));
        assert_eq!(raster[(0, 0)], Rgb::new(0, 1, 2));
        assert_eq!(raster[(1, 1)], Rgb::new(9, 10, 11));
    }

    #[test]
    #[should_panic(expected = "an RGB raster requires 3")]
    fn rgb_raster_requires_three_channels() {
        let a = MultiArray::<f32, 3>::zeros([4, 2, 2]);
        a.view().as_rgb_raster();
    }

    #[test]
    #[should_panic(expected = "is not unstrided")]
    fn strided_view_is_not_a_raster() {
        let a = MultiArray::<i16, 2>::zeros([3, 3]);
        a.view().transpose().as_raster();
    }

    #[test]
    fn subarray_spanning_full_rows_is_a_raster() {
        let a = MultiArray::from_fn([3, 4], |[x, y]| x + 3 * y);
        let rows = a.view().subarray([0, 1], [3, 3]).as_raster();

        assert_eq!(rows.as_slice(), &[3, 4, 5, 6, 7, 8]);
    }
}
