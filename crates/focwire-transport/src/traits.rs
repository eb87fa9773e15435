use std::io::{ErrorKind, Write};

use crate::error::{Result, TransportError};

/// A serial-like byte stream.
///
/// Implementations are driven from two sides: one reader thread polls
/// [`bytes_available`](SerialLink::bytes_available) and calls
/// [`read`](SerialLink::read), while any thread may call
/// [`write_all`](SerialLink::write_all). Callers serialise access (the
/// connection keeps the link behind a mutex), so `&mut self` is enough.
pub trait SerialLink: Send {
    /// Human-readable port name, used in logs and errors.
    fn name(&self) -> &str;

    fn open(&mut self) -> Result<()>;

    fn close(&mut self) -> Result<()>;

    fn is_open(&self) -> bool;

    /// Number of received bytes that can be read without blocking.
    fn bytes_available(&mut self) -> Result<usize>;

    /// Read up to `buf.len()` bytes. Returns the number of bytes read.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Write every byte of `data`, blocking on backpressure.
    fn write_all(&mut self, data: &[u8]) -> Result<()>;
}

impl SerialLink for Box<dyn SerialLink> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn open(&mut self) -> Result<()> {
        (**self).open()
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }

    fn is_open(&self) -> bool {
        (**self).is_open()
    }

    fn bytes_available(&mut self) -> Result<usize> {
        (**self).bytes_available()
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        (**self).read(buf)
    }

    fn write_all(&mut self, data: &[u8]) -> Result<()> {
        (**self).write_all(data)
    }
}

/// Blocking write loop shared by `std::io::Write` based links.
///
/// Retries on `Interrupted`/`WouldBlock`, fails on a zero-length write.
pub(crate) fn write_fully<W: Write + ?Sized>(inner: &mut W, data: &[u8]) -> Result<()> {
    let mut offset = 0usize;
    while offset < data.len() {
        match inner.write(&data[offset..]) {
            Ok(0) => return Err(TransportError::Closed),
            Ok(n) => offset += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
            Err(err) => return Err(TransportError::Io(err)),
        }
    }

    loop {
        match inner.flush() {
            Ok(()) => return Ok(()),
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
            Err(err) => return Err(TransportError::Io(err)),
        }
    }
}
