//! Query-time layer: scoped retrieval, retrieval units and dependency
//! context.

pub mod context;
pub mod guards;
pub mod scope;
pub mod units;
