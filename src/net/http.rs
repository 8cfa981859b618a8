//! Minimal HTTP/1.1 GET client over raw TCP
//!
//! This module provides functionality to issue a single `GET` request per
//! connection (`Connection: close`), read the response to EOF, and decode
//! the body, including chunked transfer-encoding. Plaintext transport only:
//! `https://` URLs are parsed for completeness but there is no TLS, so using
//! one surfaces later as a connection failure.

use std::borrow::Cow;
use std::time::Duration;

use thiserror::Error;

use super::tcp::{TcpConnection, TcpError};

/// Timeout applied when the caller supplies a zero duration
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Longest host segment accepted by the URL parser
const MAX_HOST_LEN: usize = 255;

/// Size of a single socket read while accumulating the response
const RECV_BUF_LEN: usize = 8192;

/// User-agent header sent with every request
const USER_AGENT: &str = "just-weather-client/1.0";

/// Errors that can occur when issuing an HTTP request
#[derive(Debug, Error)]
pub enum HttpError {
    /// The URL could not be parsed into host, port, and path
    #[error("failed to parse URL '{0}'")]
    UrlParse(String),

    /// No connection could be established
    #[error("connection failed: {0}")]
    Connection(#[source] TcpError),

    /// The request could not be written to the socket
    #[error("failed to send request: {0}")]
    Send(#[source] TcpError),

    /// The response could not be read from the socket
    #[error("failed to receive response: {0}")]
    Receive(#[source] TcpError),

    /// The response bytes do not form a parsable HTTP response
    #[error("malformed response: {0}")]
    MalformedResponse(&'static str),

    /// The status code falls outside the range of a received response
    #[error("HTTP {0}")]
    Status(u16),
}

/// A parsed HTTP response
///
/// Any status code in `[200, 600)` counts as a received response; what to do
/// with a 4xx or 5xx is the caller's decision.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// The body as text, with invalid UTF-8 replaced
    pub fn body_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

/// URL decomposed into the pieces needed to open a connection
#[derive(Debug, Clone, PartialEq, Eq)]
struct ParsedUrl {
    host: String,
    port: u16,
    path: String,
}

/// Status line and the framing-relevant headers of a response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ResponseHead {
    status: u16,
    content_length: Option<usize>,
    chunked: bool,
}

/// Client for plaintext HTTP/1.1 GET requests
#[derive(Debug, Clone)]
pub struct HttpClient {
    timeout: Duration,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl HttpClient {
    /// Creates a client with the given connect/read timeout.
    ///
    /// A zero timeout falls back to the 5 second default.
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout: if timeout.is_zero() {
                DEFAULT_TIMEOUT
            } else {
                timeout
            },
        }
    }

    /// The configured timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Issues a GET request and returns the decoded response.
    ///
    /// The connection is closed on every exit path, success or failure.
    pub fn get(&self, url: &str) -> Result<HttpResponse, HttpError> {
        let target = parse_url(url)?;
        log::debug!("GET {}:{}{}", target.host, target.port, target.path);

        let mut conn = TcpConnection::connect(&target.host, target.port, self.timeout)
            .map_err(HttpError::Connection)?;
        let result = self.exchange(&mut conn, &target);
        conn.close();
        result
    }

    fn exchange(
        &self,
        conn: &mut TcpConnection,
        target: &ParsedUrl,
    ) -> Result<HttpResponse, HttpError> {
        let request = build_request(&target.host, &target.path);
        conn.send(request.as_bytes()).map_err(HttpError::Send)?;

        let raw = receive_full_response(conn, self.timeout)?;
        let head = parse_headers(&raw)?;

        let body_start = find_subslice(&raw, b"\r\n\r\n")
            .ok_or(HttpError::MalformedResponse("missing header terminator"))?
            + 4;
        let remainder = &raw[body_start..];

        let body = if head.chunked {
            decode_chunked(remainder)?
        } else if let Some(len) = head.content_length {
            remainder[..len.min(remainder.len())].to_vec()
        } else {
            remainder.to_vec()
        };

        if !(200..600).contains(&head.status) {
            return Err(HttpError::Status(head.status));
        }

        Ok(HttpResponse {
            status: head.status,
            body,
        })
    }
}

/// Splits a URL into host, port, and path.
///
/// `http://` defaults the port to 80 and `https://` to 443; a scheme-less
/// URL is treated as starting at the host with port 80. The host runs up to
/// the first `:` or `/`; an explicit port must parse as a `u16`; the path is
/// everything from the first `/` onward, defaulting to `/`.
fn parse_url(url: &str) -> Result<ParsedUrl, HttpError> {
    let err = || HttpError::UrlParse(url.to_string());

    let (rest, mut port) = if let Some(rest) = url.strip_prefix("http://") {
        (rest, 80u16)
    } else if let Some(rest) = url.strip_prefix("https://") {
        (rest, 443u16)
    } else {
        (url, 80u16)
    };

    let host_end = rest
        .find(|c| c == ':' || c == '/')
        .unwrap_or(rest.len());
    let host = &rest[..host_end];
    if host.is_empty() || host.len() > MAX_HOST_LEN {
        return Err(err());
    }

    let mut after_host = &rest[host_end..];
    if let Some(port_rest) = after_host.strip_prefix(':') {
        let port_end = port_rest.find('/').unwrap_or(port_rest.len());
        let port_str = &port_rest[..port_end];
        if !port_str.is_empty() {
            port = port_str.parse::<u16>().map_err(|_| err())?;
        }
        after_host = &port_rest[port_end..];
    }

    let path = if after_host.is_empty() {
        "/".to_string()
    } else {
        after_host.to_string()
    };

    Ok(ParsedUrl {
        host: host.to_string(),
        port,
        path,
    })
}

/// Formats the request line and headers for a GET to `path` on `host`.
fn build_request(host: &str, path: &str) -> String {
    format!(
        "GET {path} HTTP/1.1\r\n\
         Host: {host}\r\n\
         User-Agent: {USER_AGENT}\r\n\
         Accept: application/json\r\n\
         Connection: close\r\n\
         \r\n"
    )
}

/// Reads from the connection until the peer closes it.
///
/// `Connection: close` makes EOF the end-of-response marker. Fails if the
/// peer closed without sending anything at all.
fn receive_full_response(
    conn: &mut TcpConnection,
    timeout: Duration,
) -> Result<Vec<u8>, HttpError> {
    let mut response = Vec::new();

    loop {
        let chunk = conn
            .receive(RECV_BUF_LEN, timeout)
            .map_err(HttpError::Receive)?;
        if chunk.is_empty() {
            break;
        }
        response.extend_from_slice(&chunk);
    }

    if response.is_empty() {
        return Err(HttpError::MalformedResponse(
            "connection closed before any data arrived",
        ));
    }

    Ok(response)
}

/// Parses the status line and scans headers for `Content-Length` and
/// `Transfer-Encoding: chunked`, both matched case-insensitively.
fn parse_headers(data: &[u8]) -> Result<ResponseHead, HttpError> {
    let first_end = find_subslice(data, b"\r\n")
        .ok_or(HttpError::MalformedResponse("missing status line"))?;
    let status_line = std::str::from_utf8(&data[..first_end])
        .map_err(|_| HttpError::MalformedResponse("status line is not valid UTF-8"))?;

    let status = parse_status_line(status_line)
        .ok_or(HttpError::MalformedResponse("unparsable status line"))?;

    let mut head = ResponseHead {
        status,
        content_length: None,
        chunked: false,
    };

    let mut pos = first_end + 2;
    while pos < data.len() {
        let Some(line_len) = find_subslice(&data[pos..], b"\r\n") else {
            break;
        };
        if line_len == 0 {
            break;
        }

        if let Ok(line) = std::str::from_utf8(&data[pos..pos + line_len]) {
            if let Some((name, value)) = line.split_once(':') {
                if name.eq_ignore_ascii_case("content-length") {
                    head.content_length = value.trim().parse::<usize>().ok();
                } else if name.eq_ignore_ascii_case("transfer-encoding")
                    && value.to_ascii_lowercase().contains("chunked")
                {
                    head.chunked = true;
                }
            }
        }

        pos += line_len + 2;
    }

    Ok(head)
}

/// Extracts the status code from a line of the form `HTTP/<major>.<minor> <code>`.
fn parse_status_line(line: &str) -> Option<u16> {
    let mut parts = line.split_whitespace();

    let version = parts.next()?.strip_prefix("HTTP/")?;
    let (major, minor) = version.split_once('.')?;
    major.parse::<u8>().ok()?;
    minor.parse::<u8>().ok()?;

    parts.next()?.parse::<u16>().ok()
}

/// Decodes a chunked transfer-encoded body.
///
/// Each chunk is a hex size line (anything after the hex digits, such as a
/// chunk extension, is ignored), CRLF, payload, CRLF; a zero-size chunk
/// terminates the body, optionally followed by one final CRLF. Any framing
/// violation fails the whole body; no partial output is returned.
fn decode_chunked(input: &[u8]) -> Result<Vec<u8>, HttpError> {
    let mut out = Vec::new();
    let mut pos = 0;

    while pos < input.len() {
        let line_len = find_subslice(&input[pos..], b"\r\n")
            .ok_or(HttpError::MalformedResponse("chunk size line missing CRLF"))?;
        if line_len == 0 {
            return Err(HttpError::MalformedResponse("empty chunk size line"));
        }

        let size = parse_chunk_size(&input[pos..pos + line_len])?;
        pos += line_len + 2;

        if size == 0 {
            // Terminating chunk; swallow the optional trailing CRLF
            if input[pos..].starts_with(b"\r\n") {
                pos += 2;
            }
            break;
        }

        if pos + size > input.len() {
            return Err(HttpError::MalformedResponse(
                "chunk size exceeds remaining input",
            ));
        }

        out.extend_from_slice(&input[pos..pos + size]);
        pos += size;

        if !input[pos..].starts_with(b"\r\n") {
            return Err(HttpError::MalformedResponse("missing CRLF after chunk data"));
        }
        pos += 2;
    }

    Ok(out)
}

/// Parses the leading hex digits of a chunk size line.
fn parse_chunk_size(line: &[u8]) -> Result<usize, HttpError> {
    let digits = line
        .iter()
        .take_while(|b| b.is_ascii_hexdigit())
        .count();
    if digits == 0 {
        return Err(HttpError::MalformedResponse("non-hex chunk size"));
    }

    let text = std::str::from_utf8(&line[..digits])
        .map_err(|_| HttpError::MalformedResponse("non-hex chunk size"))?;
    usize::from_str_radix(text, 16)
        .map_err(|_| HttpError::MalformedResponse("chunk size out of range"))
}

/// Returns the index of the first occurrence of `needle` in `haystack`.
fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_url_full() {
        let parsed = parse_url("http://example.com:8080/v1/current?lat=1").unwrap();
        assert_eq!(parsed.host, "example.com");
        assert_eq!(parsed.port, 8080);
        assert_eq!(parsed.path, "/v1/current?lat=1");
    }

    #[test]
    fn test_parse_url_default_port_and_path() {
        let parsed = parse_url("http://example.com").unwrap();
        assert_eq!(parsed.host, "example.com");
        assert_eq!(parsed.port, 80);
        assert_eq!(parsed.path, "/");
    }

    #[test]
    fn test_parse_url_https_default_port() {
        let parsed = parse_url("https://example.com/x").unwrap();
        assert_eq!(parsed.port, 443);
        assert_eq!(parsed.path, "/x");
    }

    #[test]
    fn test_parse_url_schemeless() {
        let parsed = parse_url("localhost:10680/echo").unwrap();
        assert_eq!(parsed.host, "localhost");
        assert_eq!(parsed.port, 10680);
        assert_eq!(parsed.path, "/echo");
    }

    #[test]
    fn test_parse_url_port_without_path() {
        let parsed = parse_url("http://localhost:10680").unwrap();
        assert_eq!(parsed.port, 10680);
        assert_eq!(parsed.path, "/");
    }

    #[test]
    fn test_parse_url_empty_host_fails() {
        assert!(parse_url("http:///path").is_err());
        assert!(parse_url("http://").is_err());
        assert!(parse_url("").is_err());
    }

    #[test]
    fn test_parse_url_overlong_host_fails() {
        let url = format!("http://{}/", "a".repeat(256));
        assert!(parse_url(&url).is_err());

        let url = format!("http://{}/", "a".repeat(255));
        assert!(parse_url(&url).is_ok());
    }

    #[test]
    fn test_parse_url_bad_port_fails() {
        assert!(parse_url("http://example.com:abc/").is_err());
        assert!(parse_url("http://example.com:99999/").is_err());
    }

    #[test]
    fn test_parse_url_empty_port_keeps_default() {
        let parsed = parse_url("http://example.com:/x").unwrap();
        assert_eq!(parsed.port, 80);
        assert_eq!(parsed.path, "/x");
    }

    #[test]
    fn test_build_request_framing() {
        let request = build_request("example.com", "/v1/cities?query=van");

        assert!(request.starts_with("GET /v1/cities?query=van HTTP/1.1\r\n"));
        assert!(request.contains("Host: example.com\r\n"));
        assert!(request.contains("User-Agent: just-weather-client/1.0\r\n"));
        assert!(request.contains("Accept: application/json\r\n"));
        assert!(request.contains("Connection: close\r\n"));
        assert!(request.ends_with("\r\n\r\n"));
    }

    #[test]
    fn test_parse_headers_basic() {
        let raw = b"HTTP/1.1 200 OK\r\nContent-Length: 12\r\n\r\nhello world!";
        let head = parse_headers(raw).unwrap();
        assert_eq!(head.status, 200);
        assert_eq!(head.content_length, Some(12));
        assert!(!head.chunked);
    }

    #[test]
    fn test_parse_headers_case_insensitive() {
        let raw = b"HTTP/1.1 200 OK\r\ncontent-length: 3\r\nTRANSFER-ENCODING: Chunked\r\n\r\n";
        let head = parse_headers(raw).unwrap();
        assert_eq!(head.content_length, Some(3));
        assert!(head.chunked);
    }

    #[test]
    fn test_parse_headers_missing_status_line() {
        assert!(matches!(
            parse_headers(b"not http at all"),
            Err(HttpError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_headers(b"HTTP/1.1 OK\r\n\r\n"),
            Err(HttpError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_headers(b"ICY 200 OK\r\n\r\n"),
            Err(HttpError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_parse_status_line_versions() {
        assert_eq!(parse_status_line("HTTP/1.1 404 Not Found"), Some(404));
        assert_eq!(parse_status_line("HTTP/1.0 200 OK"), Some(200));
        assert_eq!(parse_status_line("HTTP/2.0 301"), Some(301));
        assert_eq!(parse_status_line("HTTP/1 200 OK"), None);
        assert_eq!(parse_status_line("HTTP/1.1"), None);
    }

    /// Encodes `data` as chunks with the given payload split points.
    fn encode_chunks(pieces: &[&[u8]]) -> Vec<u8> {
        let mut out = Vec::new();
        for piece in pieces {
            out.extend_from_slice(format!("{:x}\r\n", piece.len()).as_bytes());
            out.extend_from_slice(piece);
            out.extend_from_slice(b"\r\n");
        }
        out.extend_from_slice(b"0\r\n\r\n");
        out
    }

    #[test]
    fn test_decode_chunked_roundtrip() {
        let data = b"{\"temp\": 21.5, \"city\": \"Vancouver\"}";

        // Several arbitrary split points over the same payload
        for splits in [vec![&data[..]], vec![&data[..1], &data[1..]], {
            let third = data.len() / 3;
            vec![&data[..third], &data[third..2 * third], &data[2 * third..]]
        }] {
            let encoded = encode_chunks(&splits);
            let decoded = decode_chunked(&encoded).unwrap();
            assert_eq!(decoded, data);
        }
    }

    #[test]
    fn test_decode_chunked_empty_body() {
        let decoded = decode_chunked(b"0\r\n\r\n").unwrap();
        assert!(decoded.is_empty());
    }

    #[test]
    fn test_decode_chunked_without_final_crlf() {
        // The CRLF after the terminating zero chunk is optional
        let decoded = decode_chunked(b"3\r\nabc\r\n0\r\n").unwrap();
        assert_eq!(decoded, b"abc");
    }

    #[test]
    fn test_decode_chunked_hex_sizes_and_extension() {
        let mut encoded = Vec::new();
        encoded.extend_from_slice(b"a;name=value\r\n");
        encoded.extend_from_slice(b"0123456789");
        encoded.extend_from_slice(b"\r\n0\r\n\r\n");

        let decoded = decode_chunked(&encoded).unwrap();
        assert_eq!(decoded, b"0123456789");
    }

    #[test]
    fn test_decode_chunked_non_hex_size() {
        let result = decode_chunked(b"zz\r\nabc\r\n0\r\n\r\n");
        assert!(matches!(result, Err(HttpError::MalformedResponse(_))));
    }

    #[test]
    fn test_decode_chunked_size_exceeds_input() {
        let result = decode_chunked(b"ff\r\nabc\r\n");
        assert!(matches!(result, Err(HttpError::MalformedResponse(_))));
    }

    #[test]
    fn test_decode_chunked_missing_delimiter() {
        // No CRLF after the chunk payload
        let result = decode_chunked(b"3\r\nabcdef");
        assert!(matches!(result, Err(HttpError::MalformedResponse(_))));

        // Size line never terminated
        let result = decode_chunked(b"3");
        assert!(matches!(result, Err(HttpError::MalformedResponse(_))));
    }

    #[test]
    fn test_zero_timeout_falls_back_to_default() {
        let client = HttpClient::new(Duration::ZERO);
        assert_eq!(client.timeout(), Duration::from_secs(5));
    }
}
