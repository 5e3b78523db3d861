//! Tool implementations.

pub mod stub;
