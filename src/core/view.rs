use anyhow::{bail, Result};
use std::{
    cell::Cell,
    fmt::{self, Debug, Formatter},
    marker::PhantomData,
    ops::Index,
};

use crate::core::{
    array::MultiArray,
    errors::*,
    iters::Strider,
    ops::{
        norm_ops::{self, ElementNorm, NormKind},
        overlap,
    },
    shape::{Classification, Layout},
};

pub(crate) mod private {
    pub trait Sealed {}
}

// --- Shared read surface ---

/// Read access shared by [`ArrayView`], [`ArrayViewMut`] and [`MultiArray`].
///
/// Anything taking `&impl NdArray<T, N>` accepts all three, which is how
/// the compute-assign operations mix handle kinds on the right-hand side.
pub trait NdArray<T, const N: usize>: private::Sealed {
    fn layout(&self) -> &Layout<N>;

    /// Address of the element at coordinate zero.
    fn as_ptr(&self) -> *const T;

    fn shape(&self) -> &[usize; N] {
        self.layout().shape()
    }

    fn strides(&self) -> &[isize; N] {
        self.layout().stride()
    }

    #[track_caller]
    fn extent(&self, dimension: usize) -> usize {
        precondition(dimension < N, || DimensionError::OutOfRange { dimension, rank: N });
        self.shape()[dimension]
    }

    fn rank(&self) -> usize {
        N
    }

    fn len(&self) -> usize {
        self.layout().len()
    }

    fn is_empty(&self) -> bool {
        self.layout().is_empty()
    }

    fn classification(&self) -> Classification {
        self.layout().classification()
    }

    fn is_unstrided(&self) -> bool {
        self.layout().is_unstrided()
    }

    fn is_inside(&self, point: &[isize; N]) -> bool {
        self.layout().is_inside(point)
    }

    fn scan_order_to_coordinate(&self, index: usize) -> [usize; N] {
        self.layout().scan_order_to_coordinate(index)
    }

    fn coordinate_to_scan_order(&self, coordinate: &[usize; N]) -> usize {
        self.layout().coordinate_to_scan_order(coordinate)
    }

    /// Element values in scan order.
    fn elements(&self) -> Elements<'_, T, N>
    where
        T: Copy,
    {
        Elements {
            ptr: self.as_ptr(),
            offsets: Strider::new(self.layout()),
            marker: PhantomData,
        }
    }

    /// True if the memory spanned by `self` intersects the memory spanned by `other`.
    fn overlaps<U, S, const M: usize>(&self, other: &S) -> bool
    where
        Self: Sized,
        S: NdArray<U, M>,
    {
        overlap::overlaps::<T, U, Self, S, N, M>(self, other)
    }

    /// Gapless owned copy in scan order.
    fn to_array(&self) -> MultiArray<T, N>
    where
        T: Copy,
        Self: Sized,
    {
        MultiArray::from_view(self)
    }

    fn squared_norm(&self) -> T::Norm
    where
        T: ElementNorm,
        Self: Sized,
    {
        norm_ops::squared_norm(self)
    }

    /// Maximum, Manhattan or Euclidean norm.
    ///
    /// With `use_fast_sqrt` the Euclidean norm is the square root of the
    /// plain sum of squares. Otherwise elements are scaled by the largest
    /// magnitude first, which avoids overflow and underflow.
    fn norm(&self, kind: NormKind, use_fast_sqrt: bool) -> T::Norm
    where
        T: ElementNorm,
        Self: Sized,
    {
        norm_ops::norm_of(self, kind, use_fast_sqrt)
    }
}

/// Iterator over element values in scan order.
pub struct Elements<'a, T, const N: usize> {
    ptr: *const T,
    offsets: Strider<N>,
    marker: PhantomData<&'a T>,
}

impl<T: Copy, const N: usize> Iterator for Elements<'_, T, N> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        let offset = self.offsets.next()?;
        // SAFETY: the strider only yields offsets addressed by the source layout.
        Some(unsafe { self.ptr.wrapping_offset(offset).read() })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.offsets.size_hint()
    }
}

impl<T: Copy, const N: usize> ExactSizeIterator for Elements<'_, T, N> {}

// --- Handles ---

/// Read-only strided view over borrowed elements.
///
/// Views never own their elements. Copying a view copies the handle.
pub struct ArrayView<'a, T, const N: usize> {
    pub(crate) ptr: *const T,
    pub(crate) layout: Layout<N>,
    marker: PhantomData<&'a T>,
}

/// Writable strided view over borrowed elements.
///
/// Handles are `Copy` and may alias: two `ArrayViewMut`s derived from the
/// same borrow can address overlapping elements. Elements are therefore
/// read and written by value, like a [`Cell`], never through references.
/// Handles are neither `Send` nor `Sync`.
pub struct ArrayViewMut<'a, T, const N: usize> {
    pub(crate) ptr: *mut T,
    pub(crate) layout: Layout<N>,
    marker: PhantomData<&'a Cell<T>>,
}

unsafe impl<T: Sync, const N: usize> Send for ArrayView<'_, T, N> {}
unsafe impl<T: Sync, const N: usize> Sync for ArrayView<'_, T, N> {}

impl<T, const N: usize> Clone for ArrayView<'_, T, N> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, const N: usize> Copy for ArrayView<'_, T, N> {}

impl<T, const N: usize> Clone for ArrayViewMut<'_, T, N> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, const N: usize> Copy for ArrayViewMut<'_, T, N> {}

#[track_caller]
fn checked_layout<const N: usize>(
    data_length: usize,
    shape: [usize; N],
    stride: [isize; N],
    offset: usize,
) -> Result<Layout<N>> {
    let layout = Layout::with_stride(shape, stride);

    if shape
        .iter()
        .try_fold(1usize, |count, &extent| count.checked_mul(extent))
        .map_or(true, |count| count > isize::MAX as usize)
    {
        bail!(ShapeOverflowError { shape: shape.to_vec() });
    }
    if layout.is_empty() {
        return Ok(layout);
    }

    let overflow = || StrideBoundsError::Overflow {
        shape: shape.to_vec(),
        stride: stride.to_vec(),
        offset,
    };
    let (low, high) = layout.extreme_offsets().ok_or_else(overflow)?;
    let start = isize::try_from(offset).map_err(|_| overflow())?;
    let low = start.checked_add(low).ok_or_else(overflow)?;
    let high = start.checked_add(high).ok_or_else(overflow)?;

    if low < 0 || high >= data_length as isize {
        bail!(StrideBoundsError::OutOfData {
            stride: stride.to_vec(),
            offset,
            low,
            high,
            data_length,
        });
    }

    Ok(layout)
}

impl<'a, T, const N: usize> ArrayView<'a, T, N> {
    /// Gapless view of `data` with the given shape.
    pub fn new(data: &'a [T], shape: [usize; N]) -> Result<ArrayView<'a, T, N>> {
        let layout = Layout::try_new(shape)?;

        if data.len() != layout.len() {
            bail!(InvalidDataLengthError {
                data_length: data.len(),
                array_size: layout.len(),
            });
        }

        Ok(ArrayView {
            ptr: data.as_ptr(),
            layout,
            marker: PhantomData,
        })
    }

    /// View of `data` with explicit strides, starting at `offset`. Every
    /// addressed element must lie inside `data`.
    pub fn with_stride(
        data: &'a [T],
        shape: [usize; N],
        stride: [isize; N],
        offset: usize,
    ) -> Result<ArrayView<'a, T, N>> {
        let layout = checked_layout(data.len(), shape, stride, offset)?;

        Ok(ArrayView {
            ptr: data.as_ptr().wrapping_add(offset),
            layout,
            marker: PhantomData,
        })
    }

    /// # Safety
    ///
    /// Every offset addressed by `layout` from `ptr` must be a valid, initialized
    /// element for `'a`, and no element may be written through another
    /// pointer during `'a`.
    pub unsafe fn from_raw_parts(ptr: *const T, layout: Layout<N>) -> ArrayView<'a, T, N> {
        ArrayView {
            ptr,
            layout,
            marker: PhantomData,
        }
    }

    fn derive<const M: usize>(&self, layout: Layout<M>, offset: isize) -> ArrayView<'a, T, M> {
        ArrayView {
            ptr: self.ptr.wrapping_offset(offset),
            layout,
            marker: PhantomData,
        }
    }

    pub fn get(&self, coordinate: [usize; N]) -> Option<&'a T> {
        let inside = coordinate.iter().zip(self.shape()).all(|(&c, &s)| c < s);

        // SAFETY: the coordinate was checked against the shape.
        inside.then(|| unsafe { &*self.ptr.wrapping_offset(self.layout.offset(&coordinate)) })
    }

    /// References to the elements in scan order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &'a T> {
        let ptr = self.ptr;

        // SAFETY: the strider only yields offsets addressed by the layout.
        Strider::new(&self.layout).map(move |offset| unsafe { &*ptr.wrapping_offset(offset) })
    }
}

impl<'a, T, const N: usize> ArrayViewMut<'a, T, N> {
    /// Gapless writable view of `data` with the given shape.
    pub fn new(data: &'a mut [T], shape: [usize; N]) -> Result<ArrayViewMut<'a, T, N>> {
        let layout = Layout::try_new(shape)?;

        if data.len() != layout.len() {
            bail!(InvalidDataLengthError {
                data_length: data.len(),
                array_size: layout.len(),
            });
        }

        Ok(ArrayViewMut {
            ptr: data.as_mut_ptr(),
            layout,
            marker: PhantomData,
        })
    }

    pub fn with_stride(
        data: &'a mut [T],
        shape: [usize; N],
        stride: [isize; N],
        offset: usize,
    ) -> Result<ArrayViewMut<'a, T, N>> {
        let layout = checked_layout(data.len(), shape, stride, offset)?;

        Ok(ArrayViewMut {
            ptr: data.as_mut_ptr().wrapping_add(offset),
            layout,
            marker: PhantomData,
        })
    }

    /// # Safety
    ///
    /// Every offset addressed by `layout` from `ptr` must be a valid,
    /// initialized element for `'a`, and for `'a` the elements may only be
    /// accessed through handles derived from this one.
    pub unsafe fn from_raw_parts(ptr: *mut T, layout: Layout<N>) -> ArrayViewMut<'a, T, N> {
        ArrayViewMut {
            ptr,
            layout,
            marker: PhantomData,
        }
    }

    fn derive<const M: usize>(&self, layout: Layout<M>, offset: isize) -> ArrayViewMut<'a, T, M> {
        ArrayViewMut {
            ptr: self.ptr.wrapping_offset(offset),
            layout,
            marker: PhantomData,
        }
    }

    pub fn as_mut_ptr(&self) -> *mut T {
        self.ptr
    }

    #[track_caller]
    pub fn get(&self, coordinate: [usize; N]) -> T
    where
        T: Copy,
    {
        let offset = self.layout.checked_offset(&coordinate);
        // SAFETY: the offset is addressed by the layout.
        unsafe { self.ptr.wrapping_offset(offset).read() }
    }

    /// Stores `value` at `coordinate` and drops the previous element.
    #[track_caller]
    pub fn set(&self, coordinate: [usize; N], value: T) {
        let offset = self.layout.checked_offset(&coordinate);
        // SAFETY: the offset is addressed by the layout, and no reference to
        // the element can exist.
        drop(unsafe { self.ptr.wrapping_offset(offset).replace(value) });
    }

    #[track_caller]
    pub fn get_scan(&self, index: usize) -> T
    where
        T: Copy,
    {
        let offset = self.layout.scan_offset(index);
        unsafe { self.ptr.wrapping_offset(offset).read() }
    }

    #[track_caller]
    pub fn set_scan(&self, index: usize, value: T) {
        let offset = self.layout.scan_offset(index);
        drop(unsafe { self.ptr.wrapping_offset(offset).replace(value) });
    }
}

// --- Slicing ---

macro_rules! slicing {
    ($view:ident) => {
        impl<'a, T, const N: usize> $view<'a, T, N> {
            /// Fixes the `K` outermost dimensions at `indices`, yielding a view
            /// of rank `M = max(1, N - K)` that keeps the classification.
            #[track_caller]
            pub fn bind_outer<const K: usize, const M: usize>(&self, indices: [usize; K]) -> $view<'a, T, M> {
                let (layout, offset) = self.layout.bind_outer::<K, M>(&indices);
                self.derive(layout, offset)
            }

            /// Fixes the `K` innermost dimensions at `indices`. The result is
            /// always [`Classification::General`].
            #[track_caller]
            pub fn bind_inner<const K: usize, const M: usize>(&self, indices: [usize; K]) -> $view<'a, T, M> {
                let (layout, offset) = self.layout.bind_inner::<K, M>(&indices);
                self.derive(layout, offset)
            }

            /// Fixes dimension `D` at `index`.
            #[track_caller]
            pub fn bind<const D: usize, const M: usize>(&self, index: usize) -> $view<'a, T, M> {
                let (layout, offset) = self.layout.bind_at::<M>(D, index);
                self.derive(layout, offset)
            }

            /// Fixes a runtime-chosen dimension at `index`. The result is
            /// always [`Classification::General`].
            #[track_caller]
            pub fn bind_at<const M: usize>(&self, dimension: usize, index: usize) -> $view<'a, T, M> {
                let (mut layout, offset) = self.layout.bind_at::<M>(dimension, index);
                layout.classification = Classification::General;
                self.derive(layout, offset)
            }

            /// Elements in the half-open box `[low, high)`.
            #[track_caller]
            pub fn subarray(&self, low: [usize; N], high: [usize; N]) -> $view<'a, T, N> {
                let (layout, offset) = self.layout.subarray(&low, &high);
                self.derive(layout, offset)
            }

            /// Every `factor[d]`-th element along each dimension `d`.
            #[track_caller]
            pub fn stridearray(&self, factor: [usize; N]) -> $view<'a, T, N> {
                self.derive(self.layout.stridearray(&factor), 0)
            }

            /// Dimension `k` of the result is dimension `permutation[k]` of `self`.
            #[track_caller]
            pub fn permute_dimensions(&self, permutation: [usize; N]) -> $view<'a, T, N> {
                self.derive(self.layout.permute(&permutation), 0)
            }
        }

        impl<'a, T> $view<'a, T, 2> {
            pub fn transpose(&self) -> $view<'a, T, 2> {
                self.derive(self.layout.transpose(), 0)
            }
        }

        impl<T, const N: usize> private::Sealed for $view<'_, T, N> {}

        impl<T, const N: usize> NdArray<T, N> for $view<'_, T, N> {
            fn layout(&self) -> &Layout<N> {
                &self.layout
            }

            fn as_ptr(&self) -> *const T {
                self.ptr as *const T
            }
        }

        impl<T, const N: usize> Debug for $view<'_, T, N> {
            fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
                f.debug_struct(stringify!($view))
                    .field("dtype", &std::any::type_name::<T>())
                    .field("shape", self.shape())
                    .field("strides", self.strides())
                    .field("classification", &self.classification())
                    .finish()
            }
        }
    };
}

slicing!(ArrayView);
slicing!(ArrayViewMut);

// --- Indexing ---

impl<T, const N: usize> Index<[usize; N]> for ArrayView<'_, T, N> {
    type Output = T;

    #[track_caller]
    fn index(&self, coordinate: [usize; N]) -> &T {
        let offset = self.layout.checked_offset(&coordinate);
        // SAFETY: the offset is addressed by the layout.
        unsafe { &*self.ptr.wrapping_offset(offset) }
    }
}

/// Scan-order indexing.
impl<T, const N: usize> Index<usize> for ArrayView<'_, T, N> {
    type Output = T;

    #[track_caller]
    fn index(&self, index: usize) -> &T {
        let offset = self.layout.scan_offset(index);
        unsafe { &*self.ptr.wrapping_offset(offset) }
    }
}
