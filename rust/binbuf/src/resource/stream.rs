use std::io::{Cursor, Read, Seek, SeekFrom, Write};

use binbuf_common::{Error, Result};

use super::{ReadSeek, Resource, check_packed_len, check_read, transfer_end};
use crate::packed::{PACKED_SIZE, PackedBytes};

/// A resource over a seekable `std::io` stream.
///
/// The resource owns `S`; pass `&mut S` to keep ownership of the stream with the
/// caller. The cursor and the logical size are tracked next to the stream, the size
/// starting at the stream length observed at construction.
pub struct StreamResource<S> {
    stream: Option<S>,
    position: usize,
    size: usize,
}

impl<S: Read + Write + Seek> StreamResource<S> {
    /// Wraps `stream`, keeping its current position as the cursor.
    pub fn new(mut stream: S) -> Result<StreamResource<S>> {
        let position = stream
            .stream_position()
            .map_err(|e| Error::io("stream position", e))?;
        let end = stream
            .seek(SeekFrom::End(0))
            .map_err(|e| Error::io("seek to stream end", e))?;
        stream
            .seek(SeekFrom::Start(position))
            .map_err(|e| Error::io("seek to stream position", e))?;
        Ok(StreamResource {
            stream: Some(stream),
            position: to_usize(position)?,
            size: to_usize(end)?,
        })
    }

    /// Returns a reference to the underlying stream.
    pub fn get_ref(&self) -> Result<&S> {
        self.stream.as_ref().ok_or_else(Error::disposed)
    }

    /// Consumes the resource and returns the underlying stream.
    pub fn into_inner(mut self) -> Result<S> {
        self.stream.take().ok_or_else(Error::disposed)
    }

    fn stream_mut(&mut self) -> Result<&mut S> {
        self.stream.as_mut().ok_or_else(Error::disposed)
    }

    /// Moves the stream back to the tracked cursor after a failed transfer.
    fn restore_position(&mut self) {
        let position = self.position as u64;
        if let Some(stream) = self.stream.as_mut() {
            let _ = stream.seek(SeekFrom::Start(position));
        }
    }

    fn write_at_cursor(&mut self, src: &[u8]) -> Result<()> {
        let end = transfer_end(self.position, src.len())?;
        if let Err(e) = self.stream_mut()?.write_all(src) {
            self.restore_position();
            return Err(Error::io("stream write", e));
        }
        self.position = end;
        self.size = self.size.max(end);
        Ok(())
    }

    fn read_at_cursor(&mut self, dest: &mut [u8]) -> Result<()> {
        let len = dest.len();
        let end = check_read(self.position, len, self.size)?;
        let read = read_fully(self.stream_mut()?, dest);
        match read {
            Ok(n) if n == len => {
                self.position = end;
                Ok(())
            }
            Ok(n) => {
                self.restore_position();
                Err(Error::end_of_data(self.position, len, self.position + n))
            }
            Err(e) => {
                self.restore_position();
                Err(Error::io("stream read", e))
            }
        }
    }
}

impl StreamResource<Cursor<Vec<u8>>> {
    /// Reads `reader` to its end and wraps a copy of the data in an in-memory stream,
    /// with the cursor at zero.
    pub fn copy_from<R: Read>(mut reader: R) -> Result<StreamResource<Cursor<Vec<u8>>>> {
        let mut data = Vec::new();
        reader
            .read_to_end(&mut data)
            .map_err(|e| Error::io("copy stream", e))?;
        StreamResource::new(Cursor::new(data))
    }
}

impl<S: Read + Write + Seek> Resource for StreamResource<S> {
    fn position(&self) -> usize {
        self.position
    }

    fn set_position(&mut self, position: usize) -> Result<()> {
        self.stream_mut()?
            .seek(SeekFrom::Start(position as u64))
            .map_err(|e| Error::io("stream seek", e))?;
        self.position = position;
        Ok(())
    }

    fn size(&self) -> usize {
        self.size
    }

    fn capacity(&self) -> usize {
        self.size
    }

    fn clear(&mut self, wipe: bool) -> Result<()> {
        let size = self.size;
        let stream = self.stream_mut()?;
        stream
            .seek(SeekFrom::Start(0))
            .map_err(|e| Error::io("stream seek", e))?;
        if wipe {
            let zeros = [0u8; 4096];
            let mut remaining = size;
            while remaining != 0 {
                let n = remaining.min(zeros.len());
                stream
                    .write_all(&zeros[..n])
                    .map_err(|e| Error::io("stream wipe", e))?;
                remaining -= n;
            }
            stream
                .seek(SeekFrom::Start(0))
                .map_err(|e| Error::io("stream seek", e))?;
        }
        self.position = 0;
        self.size = 0;
        Ok(())
    }

    fn write_packed(&mut self, bytes: &PackedBytes, len: usize) -> Result<()> {
        check_packed_len(len)?;
        self.write_at_cursor(&bytes[..len])
    }

    fn write_byte(&mut self, value: u8) -> Result<()> {
        self.write_at_cursor(&[value])
    }

    fn write_bytes(&mut self, src: &[u8]) -> Result<()> {
        self.write_at_cursor(src)
    }

    fn read_packed(&mut self, len: usize) -> Result<PackedBytes> {
        check_packed_len(len)?;
        let mut bytes = [0u8; PACKED_SIZE];
        self.read_at_cursor(&mut bytes[..len])?;
        Ok(bytes)
    }

    fn read_byte(&mut self) -> Result<u8> {
        let mut byte = [0u8; 1];
        self.read_at_cursor(&mut byte)?;
        Ok(byte[0])
    }

    fn read_bytes(&mut self, dest: &mut [u8]) -> Result<usize> {
        let count = dest.len().min(self.bytes_left());
        let read = read_fully(self.stream_mut()?, &mut dest[..count]);
        match read {
            Ok(n) => {
                self.position += n;
                Ok(n)
            }
            Err(e) => {
                self.restore_position();
                Err(Error::io("stream read", e))
            }
        }
    }

    /// Returns the live stream rewound to its start. The stream is moved back to the
    /// resource cursor when the returned view is dropped.
    fn as_stream(&mut self) -> Result<Box<dyn ReadSeek + '_>> {
        let restore = self.position as u64;
        let stream = self.stream_mut()?;
        stream
            .seek(SeekFrom::Start(0))
            .map_err(|e| Error::io("stream seek", e))?;
        Ok(Box::new(StreamView { stream, restore }))
    }

    fn as_bytes(&self) -> Result<&[u8]> {
        Err(Error::unsupported("as_bytes on a stream"))
    }

    fn dispose(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            log::debug!("disposing stream resource: size {}", self.size);
            let _ = stream.flush();
        }
        self.position = 0;
        self.size = 0;
    }

    fn is_disposed(&self) -> bool {
        self.stream.is_none()
    }
}

impl<S> std::fmt::Debug for StreamResource<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamResource")
            .field("position", &self.position)
            .field("size", &self.size)
            .field("disposed", &self.stream.is_none())
            .finish_non_exhaustive()
    }
}

/// Borrowed view of a resource's stream that puts the stream back at the resource
/// cursor when dropped.
struct StreamView<'a, S: Seek> {
    stream: &'a mut S,
    restore: u64,
}

impl<S: Read + Seek> Read for StreamView<'_, S> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.stream.read(buf)
    }
}

impl<S: Seek> Seek for StreamView<'_, S> {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        self.stream.seek(pos)
    }
}

impl<S: Seek> Drop for StreamView<'_, S> {
    fn drop(&mut self) {
        let _ = self.stream.seek(SeekFrom::Start(self.restore));
    }
}

/// Reads until `buffer` is full or the stream ends, returning the number of bytes read.
fn read_fully<R: Read>(mut read: R, buffer: &mut [u8]) -> std::io::Result<usize> {
    let mut pos: usize = 0;
    while pos < buffer.len() {
        match read.read(&mut buffer[pos..]) {
            Ok(0) => break,
            Ok(bytes) => pos += bytes,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(pos)
}

fn to_usize(n: u64) -> Result<usize> {
    usize::try_from(n).map_err(|_| Error::invalid_arg("stream", "stream is larger than usize"))
}
