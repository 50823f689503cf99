//! Command implementations.

pub mod unpack;
