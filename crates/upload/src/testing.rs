//! Test doubles: in-memory transport and session, sized files without data,
//! and a routing HTTP server.

use std::collections::HashMap;
use std::future::Future;
use std::io::SeekFrom;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeek, AsyncWriteExt, ReadBuf};
use tokio::net::{TcpListener, TcpStream};

use crate::digest::md5_hex;
use crate::error::UploadError;
use crate::session::{PartLink, PartsPage, UploadSession};
use crate::transport::PartTransport;

pub(crate) type Responder =
    Box<dyn Fn(&str, &[u8], u32) -> Result<Option<String>, UploadError> + Send + Sync>;

/// Deterministic file contents.
pub(crate) fn patterned(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

pub(crate) fn quoted_md5(data: &[u8]) -> String {
    format!("\"{}\"", md5_hex(data))
}

pub(crate) fn connection_reset() -> UploadError {
    UploadError::Io(std::io::Error::from(std::io::ErrorKind::ConnectionReset))
}

// ---------------------------------------------------------------------------
// MockTransport
// ---------------------------------------------------------------------------

/// Records every PUT and answers through a responder that sees the link, the
/// bytes and the 1-based attempt number for that link.
pub(crate) struct MockTransport {
    calls: Mutex<Vec<String>>,
    responder: Responder,
}

impl MockTransport {
    pub fn new(
        responder: impl Fn(&str, &[u8], u32) -> Result<Option<String>, UploadError>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            responder: Box::new(responder),
        }
    }

    /// Stores everything and reports the correct quoted digest.
    pub fn honest() -> Self {
        Self::new(|_, data, _| Ok(Some(quoted_md5(data))))
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, link: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|l| *l == link).count()
    }
}

impl PartTransport for MockTransport {
    fn put_part<'a>(
        &'a self,
        upload_link: &'a str,
        data: Bytes,
    ) -> Pin<Box<dyn Future<Output = Result<Option<String>, UploadError>> + Send + 'a>> {
        let attempt = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(upload_link.to_string());
            calls.iter().filter(|l| *l == upload_link).count() as u32
        };
        let result = (self.responder)(upload_link, &data, attempt);
        Box::pin(std::future::ready(result))
    }
}

// ---------------------------------------------------------------------------
// MockSession
// ---------------------------------------------------------------------------

/// Serves a fixed list of part links, paged the way the upload host does.
pub(crate) struct MockSession {
    parts: Vec<PartLink>,
    list_calls: Mutex<Vec<(u32, u32)>>,
    complete_calls: Mutex<u32>,
    list_drops: Mutex<u32>,
    complete_drops: Mutex<u32>,
}

impl MockSession {
    pub fn new(parts: Vec<PartLink>) -> Self {
        Self {
            parts,
            list_calls: Mutex::new(Vec::new()),
            complete_calls: Mutex::new(0),
            list_drops: Mutex::new(0),
            complete_drops: Mutex::new(0),
        }
    }

    /// Links `http://storage/part/{n}` for parts `1..=count`.
    pub fn with_links(count: u64) -> Self {
        Self::new((1..=count).map(|n| link(n, None)).collect())
    }

    /// The first `n` list calls fail with a connection reset.
    pub fn drop_list_calls(self, n: u32) -> Self {
        *self.list_drops.lock().unwrap() = n;
        self
    }

    /// The first `n` complete calls fail with a connection reset.
    pub fn drop_complete_calls(self, n: u32) -> Self {
        *self.complete_drops.lock().unwrap() = n;
        self
    }

    pub fn list_calls(&self) -> Vec<(u32, u32)> {
        self.list_calls.lock().unwrap().clone()
    }

    pub fn complete_calls(&self) -> u32 {
        *self.complete_calls.lock().unwrap()
    }

    fn take_drop(counter: &Mutex<u32>) -> bool {
        let mut left = counter.lock().unwrap();
        if *left > 0 {
            *left -= 1;
            true
        } else {
            false
        }
    }
}

pub(crate) fn link(n: u64, etag: Option<&str>) -> PartLink {
    PartLink {
        part_number: n,
        upload_link: Some(part_url(n)),
        etag: etag.map(str::to_string),
    }
}

pub(crate) fn part_url(n: u64) -> String {
    format!("http://storage/part/{n}")
}

impl UploadSession for MockSession {
    fn list_parts<'a>(
        &'a self,
        _upload_id: &'a str,
        page: u32,
        page_length: u32,
    ) -> Pin<Box<dyn Future<Output = Result<PartsPage, UploadError>> + Send + 'a>> {
        self.list_calls.lock().unwrap().push((page, page_length));
        let result = if Self::take_drop(&self.list_drops) {
            Err(connection_reset())
        } else {
            let start = ((page - 1) * page_length) as usize;
            let end = (start + page_length as usize).min(self.parts.len());
            Ok(PartsPage {
                parts: self.parts.get(start..end).unwrap_or_default().to_vec(),
                total: Some(self.parts.len() as u64),
            })
        };
        Box::pin(std::future::ready(result))
    }

    fn complete<'a>(
        &'a self,
        _upload_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<(), UploadError>> + Send + 'a>> {
        *self.complete_calls.lock().unwrap() += 1;
        let result = if Self::take_drop(&self.complete_drops) {
            Err(connection_reset())
        } else {
            Ok(())
        };
        Box::pin(std::future::ready(result))
    }
}

// ---------------------------------------------------------------------------
// ZeroFile
// ---------------------------------------------------------------------------

/// A file of `len` zero bytes of which only the first `readable` can be read.
///
/// Lets tests use huge sizes without allocating them, and simulate files that
/// shrink under the reader.
pub(crate) struct ZeroFile {
    len: u64,
    readable: u64,
    pos: u64,
}

impl ZeroFile {
    pub fn new(len: u64) -> Self {
        Self::truncated(len, len)
    }

    pub fn truncated(len: u64, readable: u64) -> Self {
        Self {
            len,
            readable,
            pos: 0,
        }
    }
}

impl AsyncRead for ZeroFile {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        let left = self.readable.saturating_sub(self.pos);
        let n = left.min(buf.remaining() as u64) as usize;
        buf.initialize_unfilled_to(n).fill(0);
        buf.advance(n);
        self.pos += n as u64;
        Poll::Ready(Ok(()))
    }
}

impl AsyncSeek for ZeroFile {
    fn start_seek(mut self: Pin<&mut Self>, position: SeekFrom) -> std::io::Result<()> {
        let target = match position {
            SeekFrom::Start(n) => n as i64,
            SeekFrom::End(n) => self.len as i64 + n,
            SeekFrom::Current(n) => self.pos as i64 + n,
        };
        if target < 0 {
            return Err(std::io::Error::from(std::io::ErrorKind::InvalidInput));
        }
        self.pos = target as u64;
        Ok(())
    }

    fn poll_complete(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<u64>> {
        Poll::Ready(Ok(self.pos))
    }
}

// ---------------------------------------------------------------------------
// MockServer
// ---------------------------------------------------------------------------

/// A request as seen by [`MockServer`].
#[derive(Debug, Clone)]
pub(crate) struct Captured {
    pub method: String,
    pub target: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Captured {
    pub fn header(&self, name: &str) -> Option<&str> {
        let name = name.to_ascii_lowercase();
        self.headers
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn path(&self) -> &str {
        self.target.split('?').next().unwrap_or_default()
    }
}

pub(crate) struct MockResponse {
    status: u16,
    headers: Vec<(String, String)>,
    body: String,
}

impl MockResponse {
    pub fn ok(body: &str) -> Self {
        Self::status(200, body)
    }

    pub fn status(status: u16, body: &str) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }
}

/// Requests received so far, in arrival order.
#[derive(Clone, Default)]
pub(crate) struct Recorded(Arc<Mutex<Vec<Captured>>>);

impl Recorded {
    pub fn requests(&self) -> Vec<Captured> {
        self.0.lock().unwrap().clone()
    }

    /// Count of requests per `METHOD path`.
    pub fn counts(&self) -> HashMap<String, usize> {
        let mut counts = HashMap::new();
        for req in self.0.lock().unwrap().iter() {
            *counts.entry(format!("{} {}", req.method, req.path())).or_default() += 1;
        }
        counts
    }
}

/// HTTP server answering every request through a handler, one request per
/// connection.
pub(crate) struct MockServer {
    listener: TcpListener,
    url: String,
}

impl MockServer {
    pub async fn bind() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        Self {
            listener,
            url: format!("http://127.0.0.1:{port}"),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn serve(
        self,
        handler: impl Fn(&Captured) -> MockResponse + Send + Sync + 'static,
    ) -> Recorded {
        let recorded = Recorded::default();
        let log = recorded.clone();
        let handler = Arc::new(handler);
        tokio::spawn(async move {
            while let Ok((mut stream, _)) = self.listener.accept().await {
                let log = log.clone();
                let handler = handler.clone();
                tokio::spawn(async move {
                    if let Some(req) = read_request(&mut stream).await {
                        let resp = handler(&req);
                        log.0.lock().unwrap().push(req);
                        write_response(&mut stream, resp).await;
                    }
                });
            }
        });
        recorded
    }
}

async fn read_request(stream: &mut TcpStream) -> Option<Captured> {
    let mut buf = Vec::new();
    let mut chunk = vec![0u8; 64 * 1024];
    let head_end = loop {
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).into_owned();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next()?.split_whitespace();
    let method = request_line.next()?.to_string();
    let target = request_line.next()?.to_string();
    let headers: Vec<(String, String)> = lines
        .filter_map(|l| l.split_once(':'))
        .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
        .collect();

    let content_length = headers
        .iter()
        .find(|(k, _)| k == "content-length")
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .unwrap_or(0);

    let mut body = buf[head_end..].to_vec();
    while body.len() < content_length {
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..n]);
    }

    Some(Captured {
        method,
        target,
        headers,
        body,
    })
}

async fn write_response(stream: &mut TcpStream, resp: MockResponse) {
    let mut head = format!(
        "HTTP/1.1 {} Mock\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n",
        resp.status,
        resp.body.len()
    );
    for (name, value) in &resp.headers {
        head.push_str(&format!("{name}: {value}\r\n"));
    }
    head.push_str("\r\n");
    let _ = stream.write_all(head.as_bytes()).await;
    let _ = stream.write_all(resp.body.as_bytes()).await;
    let _ = stream.shutdown().await;
}
