pub(crate) mod alloc;
mod array;
mod display;
pub mod errors;
mod image;
mod iters;
mod ops;
mod ranges;
mod shape;
mod view;

pub use alloc::{Allocator, Global};
pub use array::MultiArray;
pub use image::{Raster, Rgb};
pub use ops::norm_ops::{norm, squared_norm, ElementNorm, NormKind};
pub use ranges::{
    dest_range, src_range, src_range_with, Accessor, ChannelAccessor, DestRange, SourceRange,
    StandardAccessor,
};
pub use shape::{
    coordinate_to_scan_order, default_stride, element_count, offset_of, offset_of_contiguous,
    reduced_rank, scan_order_to_coordinate, scan_order_to_offset, Classification, Layout,
};
pub use view::{ArrayView, ArrayViewMut, Elements, NdArray};
