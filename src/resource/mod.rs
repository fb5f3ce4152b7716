//! Resource handles exchanged with the external allocator and caches.

pub mod buffer;
pub mod image;
pub mod pool;
