//! Raw TCP transport and the HTTP/1.1 client built on top of it
//!
//! `tcp` owns socket lifecycle (bounded-timeout connect, blocking send and
//! receive, idempotent close); `http` frames GET requests and parses
//! responses, including chunked transfer-encoding.

pub mod http;
pub mod tcp;

pub use http::{HttpClient, HttpError, HttpResponse};
pub use tcp::{TcpConnection, TcpError};
