//! Argument objects handed to external traversal algorithms.
//!
//! Each factory packages a traverser, the shape to cover and an access
//! policy. The factories perform no computation themselves.

use crate::core::{
    errors::*,
    image::Rgb,
    view::{ArrayView, ArrayViewMut, NdArray},
};

/// Maps stored elements to the values an algorithm works with.
pub trait Accessor<T> {
    type Value;

    fn get(&self, stored: T) -> Self::Value;

    /// Element to store when writing `value` over `stored`.
    fn set(&self, value: Self::Value, stored: T) -> T;
}

/// Passes elements through unchanged.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StandardAccessor;

impl<T> Accessor<T> for StandardAccessor {
    type Value = T;

    fn get(&self, stored: T) -> T {
        stored
    }

    fn set(&self, value: T, _stored: T) -> T {
        value
    }
}

/// Reads and writes one channel of an [`Rgb`] pixel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChannelAccessor(pub usize);

impl<T> Accessor<Rgb<T>> for ChannelAccessor {
    type Value = T;

    #[track_caller]
    fn get(&self, stored: Rgb<T>) -> T {
        match self.0 {
            0 => stored.r,
            1 => stored.g,
            2 => stored.b,
            channel => violated(DimensionError::OutOfRange { dimension: channel, rank: 3 }),
        }
    }

    #[track_caller]
    fn set(&self, value: T, mut stored: Rgb<T>) -> Rgb<T> {
        match self.0 {
            0 => stored.r = value,
            1 => stored.g = value,
            2 => stored.b = value,
            channel => violated(DimensionError::OutOfRange { dimension: channel, rank: 3 }),
        }
        stored
    }
}

/// Read-only traversal argument.
#[derive(Clone, Copy, Debug)]
pub struct SourceRange<'a, T, const N: usize, A> {
    pub traverser: ArrayView<'a, T, N>,
    pub shape: [usize; N],
    pub accessor: A,
}

/// Writable traversal argument.
#[derive(Clone, Copy, Debug)]
pub struct DestRange<'a, T, const N: usize, A> {
    pub traverser: ArrayViewMut<'a, T, N>,
    pub shape: [usize; N],
    pub accessor: A,
}

pub fn src_range<T, const N: usize>(view: ArrayView<'_, T, N>) -> SourceRange<'_, T, N, StandardAccessor> {
    src_range_with(view, StandardAccessor)
}

pub fn src_range_with<T, A, const N: usize>(view: ArrayView<'_, T, N>, accessor: A) -> SourceRange<'_, T, N, A>
where
    A: Accessor<T>,
{
    SourceRange {
        traverser: view,
        shape: *view.shape(),
        accessor,
    }
}

pub fn dest_range<T, const N: usize>(view: ArrayViewMut<'_, T, N>) -> DestRange<'_, T, N, StandardAccessor> {
    DestRange {
        traverser: view,
        shape: *view.shape(),
        accessor: StandardAccessor,
    }
}

impl<'a, T: Copy, const N: usize, A: Accessor<T>> SourceRange<'a, T, N, A> {
    #[track_caller]
    pub fn get(&self, coordinate: [usize; N]) -> A::Value {
        self.accessor.get(self.traverser[coordinate])
    }

    pub fn into_parts(self) -> (ArrayView<'a, T, N>, [usize; N], A) {
        (self.traverser, self.shape, self.accessor)
    }
}

impl<'a, T: Copy, const N: usize, A: Accessor<T>> DestRange<'a, T, N, A> {
    #[track_caller]
    pub fn set(&self, coordinate: [usize; N], value: A::Value) {
        let stored = self.traverser.get(coordinate);
        self.traverser.set(coordinate, self.accessor.set(value, stored));
    }

    pub fn into_parts(self) -> (ArrayViewMut<'a, T, N>, [usize; N], A) {
        (self.traverser, self.shape, self.accessor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{array::MultiArray, iters::Indexer};

    fn copy_with<T, U, A, B, const N: usize>(src: SourceRange<'_, T, N, A>, dest: DestRange<'_, U, N, B>)
    where
        T: Copy,
        U: Copy,
        A: Accessor<T>,
        B: Accessor<U, Value = A::Value>,
    {
        assert_eq!(src.shape, dest.shape);

        for coordinate in Indexer::new(&src.shape) {
            dest.set(coordinate, src.get(coordinate));
        }
    }

    #[test]
    fn standard_ranges_copy_through_views() {
        let source = MultiArray::from_fn([3, 2], |[i, j]| (i + 3 * j) as f32);
        let mut target = MultiArray::<f32, 2>::zeros([2, 3]);

        copy_with(src_range(source.view()), dest_range(target.view_mut().transpose()));
        assert_eq!(target.view().transpose(), source);
    }

    #[test]
    fn channel_accessor_touches_one_channel() {
        let pixels = MultiArray::from_fn([2], |[i]| Rgb::new(i as u8, 10, 20));
        let mut green = MultiArray::from_elem([2], 0u8);

        copy_with(src_range_with(pixels.view(), ChannelAccessor(1)), dest_range(green.view_mut()));
        assert_eq!(green.as_slice(), &[10, 10]);

        let mut image = MultiArray::from_elem([2], Rgb::new(1u8, 2, 3));
        let (traverser, shape, _) = dest_range(image.view_mut()).into_parts();
        let blue = DestRange {
            traverser,
            shape,
            accessor: ChannelAccessor(2),
        };
        blue.set([1], 99);
        assert_eq!(image.as_slice(), &[Rgb::new(1, 2, 3), Rgb::new(1, 2, 99)]);
    }

    #[test]
    fn parts_keep_the_shape() {
        let a = MultiArray::from_elem([4, 5, 6], 0i8);
        let (traverser, shape, accessor) = src_range(a.view()).into_parts();

        assert_eq!(shape, [4, 5, 6]);
        assert_eq!(traverser.shape(), &shape);
        assert_eq!(accessor, StandardAccessor);
    }
}
