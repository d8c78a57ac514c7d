pub(crate) mod elem_ops;
pub(crate) mod norm_ops;
pub(crate) mod overlap;
