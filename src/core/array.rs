use anyhow::{bail, Result};
use log::debug;
use num_traits::{One, Zero};
use std::{
    alloc::handle_alloc_error,
    marker::PhantomData,
    mem,
    ops::{Index, IndexMut},
    ptr::NonNull,
    slice,
};

use crate::core::{
    alloc::{release, Allocator, Global, RawBuffer},
    errors::*,
    iters::Indexer,
    shape::Layout,
    view::{private, ArrayView, ArrayViewMut, NdArray},
};

/// Owning N-dimensional array with gapless storage.
///
/// Storage comes from the allocator `A` and is released, elements first,
/// when the array is dropped. Dimension 0 varies fastest in memory.
pub struct MultiArray<T, const N: usize, A: Allocator = Global> {
    ptr: NonNull<T>,
    layout: Layout<N>,
    alloc: A,
    marker: PhantomData<T>,
}

unsafe impl<T: Send, A: Allocator + Send, const N: usize> Send for MultiArray<T, N, A> {}
unsafe impl<T: Sync, A: Allocator + Sync, const N: usize> Sync for MultiArray<T, N, A> {}

#[track_caller]
fn infallible<R>(result: Result<R, AllocationError>) -> R {
    match result {
        Ok(value) => value,
        Err(AllocationError::Failed { layout }) => handle_alloc_error(layout),
        Err(error) => violated(error),
    }
}

fn valid_length(data_length: usize, array_size: usize) -> Result<()> {
    if data_length != array_size {
        bail!(InvalidDataLengthError {
            data_length,
            array_size,
        });
    }

    Ok(())
}

impl<T, const N: usize> MultiArray<T, N> {
    /// Array with no elements and shape `[0; N]`.
    pub fn empty() -> MultiArray<T, N> {
        MultiArray::empty_in(Global)
    }

    pub fn from_elem(shape: [usize; N], value: T) -> MultiArray<T, N>
    where
        T: Clone,
    {
        MultiArray::from_elem_in(shape, value, Global)
    }

    pub fn zeros(shape: [usize; N]) -> MultiArray<T, N>
    where
        T: Clone + Zero,
    {
        MultiArray::from_elem(shape, T::zero())
    }

    pub fn ones(shape: [usize; N]) -> MultiArray<T, N>
    where
        T: Clone + One,
    {
        MultiArray::from_elem(shape, T::one())
    }

    /// Copies `data`, read in scan order.
    pub fn from_slice(shape: [usize; N], data: &[T]) -> Result<MultiArray<T, N>>
    where
        T: Clone,
    {
        MultiArray::from_slice_in(shape, data, Global)
    }

    /// Gapless copy of any array or view.
    pub fn from_view<S>(source: &S) -> MultiArray<T, N>
    where
        T: Copy,
        S: NdArray<T, N>,
    {
        MultiArray::from_view_in(source, Global)
    }

    /// Element at each coordinate is `f(coordinate)`.
    pub fn from_fn<F>(shape: [usize; N], mut f: F) -> MultiArray<T, N>
    where
        F: FnMut([usize; N]) -> T,
    {
        infallible(MultiArray::build(shape, Global, |buffer| {
            for coordinate in Indexer::new(&shape) {
                buffer.push(f(coordinate));
            }
        }))
    }
}

impl<T, const N: usize, A: Allocator> MultiArray<T, N, A> {
    fn build<F>(shape: [usize; N], alloc: A, fill: F) -> Result<MultiArray<T, N, A>, AllocationError>
    where
        F: FnOnce(&mut RawBuffer<'_, T, A>),
    {
        let layout = Layout::try_new(shape)?;

        let ptr = {
            let mut buffer = RawBuffer::allocate(layout.len(), &alloc)?;
            fill(&mut buffer);
            buffer.finish()
        };

        Ok(MultiArray {
            ptr,
            layout,
            alloc,
            marker: PhantomData,
        })
    }

    pub fn empty_in(alloc: A) -> MultiArray<T, N, A> {
        MultiArray {
            ptr: NonNull::dangling(),
            layout: Layout::new([0; N]),
            alloc,
            marker: PhantomData,
        }
    }

    pub fn from_elem_in(shape: [usize; N], value: T, alloc: A) -> MultiArray<T, N, A>
    where
        T: Clone,
    {
        infallible(MultiArray::build_filled(shape, value, alloc))
    }

    /// Like [`MultiArray::from_elem_in`], but reports allocation failure
    /// instead of aborting.
    ///
    /// If cloning `value` panics, the clones made so far are dropped and the
    /// storage is returned to `alloc` before the panic propagates.
    pub fn try_from_elem_in(shape: [usize; N], value: T, alloc: A) -> Result<MultiArray<T, N, A>>
    where
        T: Clone,
    {
        Ok(MultiArray::build_filled(shape, value, alloc)?)
    }

    fn build_filled(shape: [usize; N], value: T, alloc: A) -> Result<MultiArray<T, N, A>, AllocationError>
    where
        T: Clone,
    {
        MultiArray::build(shape, alloc, |buffer| {
            for _ in 0..buffer.capacity() {
                buffer.push(value.clone());
            }
        })
    }

    pub fn from_slice_in(shape: [usize; N], data: &[T], alloc: A) -> Result<MultiArray<T, N, A>>
    where
        T: Clone,
    {
        let count = Layout::try_new(shape).map_err(AllocationError::from)?.len();
        valid_length(data.len(), count)?;

        Ok(MultiArray::build(shape, alloc, |buffer| {
            for element in data {
                buffer.push(element.clone());
            }
        })?)
    }

    pub fn from_view_in<S>(source: &S, alloc: A) -> MultiArray<T, N, A>
    where
        T: Copy,
        S: NdArray<T, N>,
    {
        infallible(MultiArray::build_copied(source, alloc))
    }

    pub fn try_from_view_in<S>(source: &S, alloc: A) -> Result<MultiArray<T, N, A>>
    where
        T: Copy,
        S: NdArray<T, N>,
    {
        Ok(MultiArray::build_copied(source, alloc)?)
    }

    fn build_copied<S>(source: &S, alloc: A) -> Result<MultiArray<T, N, A>, AllocationError>
    where
        T: Copy,
        S: NdArray<T, N>,
    {
        MultiArray::build(*source.shape(), alloc, |buffer| {
            for element in source.elements() {
                buffer.push(element);
            }
        })
    }

    // --- Storage ---

    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    pub fn as_ptr(&self) -> *const T {
        self.ptr.as_ptr()
    }

    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.ptr.as_ptr()
    }

    /// Elements in scan order.
    pub fn as_slice(&self) -> &[T] {
        // SAFETY: storage is gapless and holds `len` initialized elements.
        unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.layout.len()) }
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        unsafe { slice::from_raw_parts_mut(self.ptr.as_ptr(), self.layout.len()) }
    }

    pub fn iter(&self) -> slice::Iter<'_, T> {
        self.as_slice().iter()
    }

    pub fn iter_mut(&mut self) -> slice::IterMut<'_, T> {
        self.as_mut_slice().iter_mut()
    }

    pub fn view(&self) -> ArrayView<'_, T, N> {
        // SAFETY: the layout addresses exactly the owned elements, which
        // cannot be written while `self` is borrowed.
        unsafe { ArrayView::from_raw_parts(self.ptr.as_ptr(), self.layout) }
    }

    pub fn view_mut(&mut self) -> ArrayViewMut<'_, T, N> {
        unsafe { ArrayViewMut::from_raw_parts(self.ptr.as_ptr(), self.layout) }
    }

    /// Drops the elements and releases the storage, leaving an empty array.
    /// Calling it again has no effect.
    pub(crate) fn deallocate(&mut self) {
        let count = self.layout.len();
        let ptr = mem::replace(&mut self.ptr, NonNull::dangling());
        self.layout = Layout::new([0; N]);

        // SAFETY: `ptr` held `count` elements built by a `RawBuffer` on `alloc`.
        unsafe { release(ptr, count, &self.alloc) }
    }

    // --- Whole-array updates ---

    /// Overwrites every element with `value`.
    pub fn fill(&mut self, value: T)
    where
        T: Clone,
    {
        self.as_mut_slice().fill(value);
    }

    /// Gives the array a new shape filled with `value`.
    ///
    /// Storage is kept when the shape does not change. Otherwise new storage
    /// is built before the old one is released, so on failure the array is
    /// left untouched.
    pub fn reshape(&mut self, shape: [usize; N], value: T) -> Result<()>
    where
        T: Clone,
        A: Clone,
    {
        if shape == *self.layout.shape() {
            self.fill(value);
            return Ok(());
        }

        debug!("reshape: reallocating {:?} as {:?}", self.layout.shape(), shape);
        let mut fresh = MultiArray::try_from_elem_in(shape, value, self.alloc.clone())?;
        self.swap(&mut fresh);

        Ok(())
    }

    /// Exchanges shape, storage and allocator with `other`. No element is
    /// copied.
    pub fn swap(&mut self, other: &mut MultiArray<T, N, A>) {
        mem::swap(self, other);
    }

    /// Copies `rhs` into `self`, adopting its shape if it differs.
    pub fn assign_from<S>(&mut self, rhs: &S) -> Result<()>
    where
        T: Copy,
        A: Clone,
        S: NdArray<T, N>,
    {
        if self.shape() == rhs.shape() {
            self.view_mut().assign(rhs);
            return Ok(());
        }

        debug!("assign_from: reallocating {:?} as {:?}", self.layout.shape(), rhs.shape());
        let mut fresh = MultiArray::try_from_view_in(rhs, self.alloc.clone())?;
        self.swap(&mut fresh);

        Ok(())
    }
}

impl<T, const N: usize, A: Allocator> Drop for MultiArray<T, N, A> {
    fn drop(&mut self) {
        self.deallocate();
    }
}

impl<T: Clone, const N: usize, A: Allocator + Clone> Clone for MultiArray<T, N, A> {
    fn clone(&self) -> Self {
        infallible(MultiArray::build(*self.shape(), self.alloc.clone(), |buffer| {
            for element in self.as_slice() {
                buffer.push(element.clone());
            }
        }))
    }

    fn clone_from(&mut self, source: &Self) {
        if self.shape() == source.shape() {
            self.as_mut_slice().clone_from_slice(source.as_slice());
        } else {
            let mut fresh = source.clone();
            self.swap(&mut fresh);
        }
    }
}

impl<T, const N: usize> Default for MultiArray<T, N> {
    fn default() -> Self {
        MultiArray::empty()
    }
}

impl<T, const N: usize, A: Allocator> private::Sealed for MultiArray<T, N, A> {}

impl<T, const N: usize, A: Allocator> NdArray<T, N> for MultiArray<T, N, A> {
    fn layout(&self) -> &Layout<N> {
        &self.layout
    }

    fn as_ptr(&self) -> *const T {
        self.ptr.as_ptr()
    }
}

// --- Indexing ---

impl<T, const N: usize, A: Allocator> Index<[usize; N]> for MultiArray<T, N, A> {
    type Output = T;

    #[track_caller]
    fn index(&self, coordinate: [usize; N]) -> &T {
        let offset = self.layout.checked_offset(&coordinate) as usize;
        &self.as_slice()[offset]
    }
}

impl<T, const N: usize, A: Allocator> IndexMut<[usize; N]> for MultiArray<T, N, A> {
    #[track_caller]
    fn index_mut(&mut self, coordinate: [usize; N]) -> &mut T {
        let offset = self.layout.checked_offset(&coordinate) as usize;
        &mut self.as_mut_slice()[offset]
    }
}

impl<T, const N: usize, A: Allocator> Index<usize> for MultiArray<T, N, A> {
    type Output = T;

    #[track_caller]
    fn index(&self, index: usize) -> &T {
        let offset = self.layout.scan_offset(index) as usize;
        &self.as_slice()[offset]
    }
}

impl<T, const N: usize, A: Allocator> IndexMut<usize> for MultiArray<T, N, A> {
    #[track_caller]
    fn index_mut(&mut self, index: usize) -> &mut T {
        let offset = self.layout.scan_offset(index) as usize;
        &mut self.as_mut_slice()[offset]
    }
}
