//! Blocking TCP connection with bounded connect and read timeouts
//!
//! A `TcpConnection` owns exactly one socket and is created per request,
//! never shared. Connect tries every address the system resolver returns,
//! spending a single shared timeout budget across all candidates. Reads are
//! bounded by a per-call timeout; a zero-byte read means the peer closed the
//! connection, which is not an error.

use std::io::{self, ErrorKind, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};

use thiserror::Error;

/// Errors produced by the TCP transport layer
#[derive(Debug, Error)]
pub enum TcpError {
    /// Hostname could not be resolved to any address
    #[error("failed to resolve host '{host}': {source}")]
    Resolution {
        host: String,
        #[source]
        source: io::Error,
    },

    /// Every candidate address failed to connect
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    /// The timeout budget was exhausted before any candidate connected
    #[error("connection to '{host}' timed out")]
    ConnectTimeout { host: String },

    /// A send failed partway through; no retry is attempted
    #[error("send failed: {0}")]
    Send(#[source] io::Error),

    /// A receive failed for a reason other than a timeout
    #[error("receive failed: {0}")]
    Receive(#[source] io::Error),

    /// No data became readable within the configured timeout
    #[error("receive timed out")]
    ReceiveTimeout,

    /// Operation attempted on a connection that is not open
    #[error("connection is not open")]
    NotConnected,
}

/// A single-use TCP connection
///
/// The socket is closed when `close` is called or when the value is dropped,
/// whichever comes first, so no descriptor outlives its request regardless
/// of which exit path the request takes.
#[derive(Debug)]
pub struct TcpConnection {
    stream: Option<TcpStream>,
}

impl TcpConnection {
    /// Connects to `host:port`, spending at most `timeout` across every
    /// candidate address the resolver returns.
    ///
    /// Each candidate gets whatever remains of the budget; when the budget
    /// runs out before a candidate succeeds the result is
    /// `TcpError::ConnectTimeout`. `TcpStream::connect_timeout` performs the
    /// non-blocking connect and readiness wait that a plain blocking
    /// `connect` cannot bound portably.
    pub fn connect(host: &str, port: u16, timeout: Duration) -> Result<Self, TcpError> {
        let deadline = Instant::now() + timeout;

        let addrs: Vec<SocketAddr> = (host, port)
            .to_socket_addrs()
            .map_err(|source| TcpError::Resolution {
                host: host.to_string(),
                source,
            })?
            .collect();

        if addrs.is_empty() {
            return Err(TcpError::Resolution {
                host: host.to_string(),
                source: io::Error::new(ErrorKind::NotFound, "resolver returned no addresses"),
            });
        }

        let mut last_failure: Option<(SocketAddr, io::Error)> = None;

        for addr in addrs {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(TcpError::ConnectTimeout {
                    host: host.to_string(),
                });
            }

            match TcpStream::connect_timeout(&addr, remaining) {
                Ok(stream) => {
                    log::debug!("connected to {addr}");
                    return Ok(Self {
                        stream: Some(stream),
                    });
                }
                Err(e) => {
                    log::debug!("connect to {addr} failed: {e}");
                    last_failure = Some((addr, e));
                }
            }
        }

        match last_failure {
            Some((_, e)) if e.kind() == ErrorKind::TimedOut => Err(TcpError::ConnectTimeout {
                host: host.to_string(),
            }),
            Some((addr, source)) => Err(TcpError::Connect { addr, source }),
            // addrs was non-empty, so at least one attempt ran
            None => Err(TcpError::ConnectTimeout {
                host: host.to_string(),
            }),
        }
    }

    /// Writes the entire buffer to the socket.
    ///
    /// `write_all` loops until every byte is written and retries transient
    /// interrupts; any other failure is fatal and is not retried.
    pub fn send(&mut self, data: &[u8]) -> Result<(), TcpError> {
        let stream = self.stream.as_mut().ok_or(TcpError::NotConnected)?;
        stream.write_all(data).map_err(TcpError::Send)
    }

    /// Performs one blocking read of at most `max_len` bytes, bounded by
    /// `timeout`.
    ///
    /// Returns an empty buffer when the peer has closed the connection.
    pub fn receive(&mut self, max_len: usize, timeout: Duration) -> Result<Vec<u8>, TcpError> {
        let stream = self.stream.as_mut().ok_or(TcpError::NotConnected)?;

        stream
            .set_read_timeout(Some(timeout))
            .map_err(TcpError::Receive)?;

        let mut buf = vec![0u8; max_len];
        loop {
            match stream.read(&mut buf) {
                Ok(n) => {
                    buf.truncate(n);
                    return Ok(buf);
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) if e.kind() == ErrorKind::WouldBlock || e.kind() == ErrorKind::TimedOut => {
                    return Err(TcpError::ReceiveTimeout);
                }
                Err(e) => return Err(TcpError::Receive(e)),
            }
        }
    }

    /// Closes the connection. Idempotent; safe on a never-connected or
    /// already-closed instance.
    pub fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            let _ = stream.shutdown(Shutdown::Both);
        }
    }

    /// Whether the connection currently holds an open socket
    pub fn is_open(&self) -> bool {
        self.stream.is_some()
    }
}

impl Drop for TcpConnection {
    fn drop(&mut self) {
        self.close();
    }
}
