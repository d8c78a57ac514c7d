use std::alloc::Layout;
use thiserror::Error;

// --- Shape ---

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Shapes {lhs_shape:?} and {rhs_shape:?} do not match in {operation}.")]
pub struct ShapeMismatchError {
    pub operation: &'static str,
    pub lhs_shape: Vec<usize>,
    pub rhs_shape: Vec<usize>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Data length ({data_length}) does not match size of array ({array_size}).")]
pub struct InvalidDataLengthError {
    pub data_length: usize,
    pub array_size: usize,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Shape {shape:?} has more elements than fit in isize.")]
pub struct ShapeOverflowError {
    pub shape: Vec<usize>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StrideBoundsError {
    #[error("Strides {stride:?} from offset {offset} address [{low}, {high}], outside data of length {data_length}.")]
    OutOfData {
        stride: Vec<isize>,
        offset: usize,
        low: isize,
        high: isize,
        data_length: usize,
    },

    #[error("Shape {shape:?} with strides {stride:?} from offset {offset} spans more offsets than fit in isize.")]
    Overflow {
        shape: Vec<usize>,
        stride: Vec<isize>,
        offset: usize,
    },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RankError {
    #[error("Rank 0 arrays are not representable. Use a rank 1 array of shape [1].")]
    Zero,

    #[error("Binding {bound} of {rank} dimensions yields rank {expected}, not {requested}.")]
    Reduced {
        rank: usize,
        bound: usize,
        expected: usize,
        requested: usize,
    },
}

// --- Index, Range, Dims ---

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IndexError {
    #[error("Index {index} is out of range for dimension {dimension}, of size {size}.")]
    OutOfRange {
        index: usize,
        dimension: usize,
        size: usize,
    },

    #[error("Scan order index {index} is out of range for array of {count} elements.")]
    ScanOrder { index: usize, count: usize },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DimensionError {
    #[error("Dimension {dimension} is out of range for rank {rank}.")]
    OutOfRange { dimension: usize, rank: usize },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RangeError {
    #[error("{range:?} is out of range for dimension {dimension}, of size {size}.")]
    OutOfRange {
        range: (usize, usize),
        dimension: usize,
        size: usize,
    },

    #[error("Range start index {0} is greater than range end index {1}.")]
    GreaterStartRange(usize, usize),

    #[error("Stride factor of dimension {0} is zero.")]
    ZeroFactor(usize),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PermutationError {
    #[error("Dimension {dimension} is out of range for rank {rank}.")]
    OutOfRange { dimension: usize, rank: usize },

    #[error("Dimension {0} repeats.")]
    Repetition(usize),
}

// --- Norm ---

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown norm type {0}. Expected 0 (maximum), 1 (manhattan) or 2 (euclidean).")]
pub struct NormKindError(pub u32);

// --- Raster ---

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RasterError {
    #[error("Array of shape {0:?} and strides {1:?} is not unstrided.")]
    Strided(Vec<usize>, Vec<isize>),

    #[error("Innermost extent is {0}, but an RGB raster requires 3.")]
    Channels(usize),
}

// --- Allocation ---

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AllocationError {
    #[error("Allocation for shape {shape:?} overflows the address space.")]
    CapacityOverflow { shape: Vec<usize> },

    #[error("Allocator failed to provide {} bytes.", .layout.size())]
    Failed { layout: Layout },
}

impl From<ShapeOverflowError> for AllocationError {
    fn from(error: ShapeOverflowError) -> AllocationError {
        AllocationError::CapacityOverflow { shape: error.shape }
    }
}

/// Aborts the current operation with the message of a precondition error.
///
/// Precondition violations are programming errors and are not meant to be
/// recovered from, so they unwind instead of being returned.
#[track_caller]
pub(crate) fn violated<E: std::fmt::Display>(error: E) -> ! {
    panic!("{error}")
}

#[track_caller]
pub(crate) fn precondition<E, F>(condition: bool, error: F)
where
    E: std::fmt::Display,
    F: FnOnce() -> E,
{
    if !condition {
        violated(error())
    }
}
