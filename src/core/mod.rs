//! Core types shared by the whole crate.

pub mod device;
pub mod error;
pub mod name;
