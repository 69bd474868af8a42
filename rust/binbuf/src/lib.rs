//! Binary buffer engine:
//! - `Buffer`: a cursor-based reader/writer for fixed-width scalars, VLQ integers,
//!   length-prefixed text and byte payloads, big integers and plain structs.
//! - `Resource`: the backing store a `Buffer` runs on. Provided implementations hold a
//!   growable heap area, a raw memory region, or a seekable `std::io` stream.
//!
//! All fixed-width values use host byte order.

mod packed;

pub mod buffer;
pub mod decimal;
pub mod resource;
pub mod shapes;

pub use binbuf_common::{Error, ErrorKind, Result};
pub use buffer::{Buffer, TextEncoding};
pub use decimal::Decimal128;
pub use packed::{PACKED_SIZE, PackedBytes};
pub use resource::{
    GrowableResource, NativeOwnership, NativeResource, Resource, StreamResource,
};
pub use shapes::{Colour, Complex, Int24, Point, Point16, PointF, Rectangle, Rectangle16};
