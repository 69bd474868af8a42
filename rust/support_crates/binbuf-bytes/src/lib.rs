//! Byte storage for the binbuf infrastructure: aligned, zero-initialized storage that
//! grows in powers of two, and the alignment arithmetic it is built on.

pub mod align;
pub mod storage;

pub use storage::AlignedStorage;
