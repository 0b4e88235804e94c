//! Transport abstraction: any byte-oriented channel to the broker.
//!
//! The MQTT client is generic over `Transport`, so tests drive it with an
//! in-memory script and production uses [`TcpTransport`].

use std::io::{ErrorKind, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use log::{debug, info};

use crate::error::TransportError;

/// Byte-oriented transport channel.
pub trait Transport {
    /// Read up to `buf.len()` bytes into `buf`.
    ///
    /// Returns `Ok(0)` when nothing arrived within the read timeout and
    /// [`TransportError::Disconnected`] once the peer has closed.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError>;

    /// Write all of `data`.
    fn write_all(&mut self, data: &[u8]) -> Result<(), TransportError>;

    /// Flush any buffered output.
    fn flush(&mut self) -> Result<(), TransportError>;

    /// Bound subsequent writes to `timeout`.
    fn set_write_timeout(&mut self, _timeout: Duration) -> Result<(), TransportError> {
        Ok(())
    }

    /// Close the channel.  Further calls fail with `Disconnected`.
    fn close(&mut self);
}

/// Plain TCP connection to the broker.
pub struct TcpTransport {
    stream: Option<TcpStream>,
}

impl TcpTransport {
    /// Connect to `host:port`, trying every resolved address.
    ///
    /// `read_timeout` is how long a single [`read`](Transport::read) may
    /// block; `io_timeout` bounds connects and writes.
    pub fn connect(
        host: &str,
        port: u16,
        read_timeout: Duration,
        io_timeout: Duration,
    ) -> Result<Self, TransportError> {
        let addrs = (host, port).to_socket_addrs().map_err(|e| {
            debug!("resolve {}:{} failed: {}", host, port, e);
            TransportError::ConnectFailed
        })?;
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, io_timeout) {
                Ok(stream) => {
                    stream
                        .set_read_timeout(Some(read_timeout))
                        .and_then(|()| stream.set_write_timeout(Some(io_timeout)))
                        .and_then(|()| stream.set_nodelay(true))
                        .map_err(|_| TransportError::Io)?;
                    info!("TCP connected to {}", addr);
                    return Ok(Self {
                        stream: Some(stream),
                    });
                }
                Err(e) => debug!("connect {} failed: {}", addr, e),
            }
        }
        Err(TransportError::ConnectFailed)
    }

    fn stream(&mut self) -> Result<&mut TcpStream, TransportError> {
        self.stream.as_mut().ok_or(TransportError::Disconnected)
    }
}

impl Transport for TcpTransport {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        match self.stream()?.read(buf) {
            Ok(0) => {
                self.stream = None;
                Err(TransportError::Disconnected)
            }
            Ok(n) => Ok(n),
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::Interrupted) => {
                Ok(0)
            }
            Err(e) => {
                debug!("TCP read error: {}", e);
                Err(TransportError::Io)
            }
        }
    }

    fn write_all(&mut self, data: &[u8]) -> Result<(), TransportError> {
        self.stream()?.write_all(data).map_err(|e| {
            debug!("TCP write error: {}", e);
            if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) {
                TransportError::Timeout
            } else {
                TransportError::Io
            }
        })
    }

    fn flush(&mut self) -> Result<(), TransportError> {
        self.stream()?.flush().map_err(|_| TransportError::Io)
    }

    fn set_write_timeout(&mut self, timeout: Duration) -> Result<(), TransportError> {
        self.stream()?
            .set_write_timeout(Some(timeout))
            .map_err(|_| TransportError::Io)
    }

    fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            let _ = stream.shutdown(std::net::Shutdown::Both);
        }
    }
}
