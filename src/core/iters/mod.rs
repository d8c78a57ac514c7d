mod indexer;
mod strider;

pub(crate) use indexer::Indexer;
pub(crate) use strider::Strider;
