//! Byte transport seen by the session engine.
//!
//! The engine only needs to read whatever bytes are available and to write
//! whole frames. How the link is opened and timed is up to the caller.

use std::io::{self, ErrorKind, Read, Write};

/// Source of bytes received from the radar.
pub trait ByteSource {
    /// Read up to `max_bytes`. An empty result means nothing arrived yet.
    fn read(&mut self, max_bytes: usize) -> io::Result<Vec<u8>>;
}

/// Sink for bytes sent to the radar.
pub trait ByteSink {
    /// Write all of `bytes`.
    fn write(&mut self, bytes: &[u8]) -> io::Result<()>;
}

/// A bidirectional byte link.
pub trait Transport: ByteSource + ByteSink {}

impl<T: ByteSource + ByteSink> Transport for T {}

/// Adapter for any `std::io` stream, e.g. a serial device opened as a file.
///
/// The stream should be configured with a read timeout; reads that time out
/// are reported as empty.
#[derive(Debug)]
pub struct IoTransport<T> {
    inner: T,
}

impl<T> IoTransport<T> {
    /// Wrap a stream.
    pub fn new(inner: T) -> Self {
        IoTransport { inner }
    }

    /// Borrow the wrapped stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Unwrap the stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: Read> ByteSource for IoTransport<T> {
    fn read(&mut self, max_bytes: usize) -> io::Result<Vec<u8>> {
        let mut buf = vec![0u8; max_bytes];
        match self.inner.read(&mut buf) {
            Ok(n) => {
                buf.truncate(n);
                Ok(buf)
            }
            Err(e)
                if matches!(
                    e.kind(),
                    ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::Interrupted
                ) =>
            {
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }
}

impl<T: Write> ByteSink for IoTransport<T> {
    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.inner.write_all(bytes)?;
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    struct TimingOut;

    impl Read for TimingOut {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(ErrorKind::TimedOut, "no data"))
        }
    }

    #[test]
    fn test_io_transport_reads_in_chunks() {
        let mut transport = IoTransport::new(Cursor::new(vec![1u8, 2, 3, 4, 5]));
        assert_eq!(transport.read(2).unwrap(), vec![1, 2]);
        assert_eq!(transport.read(10).unwrap(), vec![3, 4, 5]);
        assert!(transport.read(10).unwrap().is_empty());
    }

    #[test]
    fn test_io_transport_timeout_is_empty_read() {
        let mut transport = IoTransport::new(TimingOut);
        assert!(transport.read(8).unwrap().is_empty());
    }

    #[test]
    fn test_io_transport_writes_all() {
        let mut transport = IoTransport::new(Vec::new());
        transport.write(&[0xFD, 0xFC]).unwrap();
        transport.write(&[0xFB, 0xFA]).unwrap();
        assert_eq!(transport.into_inner(), vec![0xFD, 0xFC, 0xFB, 0xFA]);
    }
}
