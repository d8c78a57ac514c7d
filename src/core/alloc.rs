use std::{alloc::Layout, marker::PhantomData, mem, ptr, ptr::NonNull};

use crate::core::errors::AllocationError;

/// Source of raw storage for owning arrays.
///
/// # Safety
///
/// Implementations must ensure:
/// - `allocate` returns a valid pointer aligned for `layout` on success
/// - memory returned by `allocate` is not aliased until it is deallocated
/// - `deallocate` accepts any pointer returned by `allocate` with the same `layout`
pub unsafe trait Allocator {
    /// Returns `None` if allocation fails. Never called with a zero-sized layout.
    fn allocate(&self, layout: Layout) -> Option<NonNull<u8>>;

    /// # Safety
    ///
    /// - `ptr` must have been returned by a previous call to `allocate`
    /// - `layout` must be the same as the one used for allocation
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout);
}

unsafe impl<A: Allocator + ?Sized> Allocator for &A {
    fn allocate(&self, layout: Layout) -> Option<NonNull<u8>> {
        (**self).allocate(layout)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        (**self).deallocate(ptr, layout)
    }
}

/// The global heap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Global;

unsafe impl Allocator for Global {
    #[inline]
    fn allocate(&self, layout: Layout) -> Option<NonNull<u8>> {
        // SAFETY: callers never pass a zero-sized layout.
        NonNull::new(unsafe { std::alloc::alloc(layout) })
    }

    #[inline]
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        std::alloc::dealloc(ptr.as_ptr(), layout)
    }
}

fn array_layout<T>(count: usize) -> Result<Layout, AllocationError> {
    Layout::array::<T>(count).map_err(|_| AllocationError::CapacityOverflow { shape: vec![count] })
}

/// Storage being filled element by element.
///
/// Dropping an unfinished buffer, including during unwinding out of a
/// panicking `Clone`, destroys the elements written so far and returns the
/// storage to the allocator. `finish` hands both over to the caller.
pub(crate) struct RawBuffer<'a, T, A: Allocator> {
    ptr: NonNull<T>,
    capacity: usize,
    initialized: usize,
    alloc: &'a A,
    marker: PhantomData<T>,
}

impl<'a, T, A: Allocator> RawBuffer<'a, T, A> {
    pub(crate) fn allocate(capacity: usize, alloc: &'a A) -> Result<Self, AllocationError> {
        let layout = array_layout::<T>(capacity)?;

        let ptr = if layout.size() == 0 {
            NonNull::dangling()
        } else {
            alloc
                .allocate(layout)
                .ok_or(AllocationError::Failed { layout })?
                .cast()
        };

        Ok(RawBuffer {
            ptr,
            capacity,
            initialized: 0,
            alloc,
            marker: PhantomData,
        })
    }

    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub(crate) fn push(&mut self, value: T) {
        assert!(self.initialized < self.capacity, "RawBuffer overfilled");

        // SAFETY: the slot is inside the allocation and not yet initialized.
        unsafe { ptr::write(self.ptr.as_ptr().add(self.initialized), value) };
        self.initialized += 1;
    }

    pub(crate) fn finish(self) -> NonNull<T> {
        assert_eq!(self.initialized, self.capacity, "RawBuffer underfilled");

        let ptr = self.ptr;
        mem::forget(self);
        ptr
    }
}

impl<T, A: Allocator> Drop for RawBuffer<'_, T, A> {
    fn drop(&mut self) {
        // SAFETY: exactly `initialized` leading elements were written, and the
        // storage came from `alloc` with the layout of `capacity` elements.
        unsafe {
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(
                self.ptr.as_ptr(),
                self.initialized,
            ));
            free(self.ptr, self.capacity, self.alloc);
        }
    }
}

/// Destroys `count` elements at `ptr` and releases their storage.
///
/// # Safety
///
/// `ptr` must hold `count` initialized elements in storage obtained from a
/// [`RawBuffer`] of the same capacity and allocator.
pub(crate) unsafe fn release<T, A: Allocator>(ptr: NonNull<T>, count: usize, alloc: &A) {
    ptr::drop_in_place(ptr::slice_from_raw_parts_mut(ptr.as_ptr(), count));
    free(ptr, count, alloc);
}

unsafe fn free<T, A: Allocator>(ptr: NonNull<T>, capacity: usize, alloc: &A) {
    if let Ok(layout) = Layout::array::<T>(capacity) {
        if layout.size() != 0 {
            alloc.deallocate(ptr.cast(), layout);
        }
    }
}
