//! Writing a [`Response`] to a live connection.

use crate::{
    errors::Error,
    http::{message::HttpMessage, response::Response},
    limits::SendLimits,
};
use tokio::{
    io::{AsyncWrite, AsyncWriteExt},
    time::timeout,
};
use tracing::trace;

/// Sends one response over `W`, head first and then the body.
///
/// A body of unknown size goes out with chunked framing, anything else is
/// copied as-is in pieces of [`SendLimits::chunk_size`]. Each write must
/// finish within [`SendLimits::write_timeout`].
///
/// # Examples
/// ```
/// use http_value::{HttpMessage, Response, ResponseWriter, SendLimits};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), http_value::Error> {
/// let mut response = Response::default().with_content("Hi");
///
/// let mut writer = ResponseWriter::new(Vec::new(), SendLimits::default());
/// writer.send(&mut response).await?;
///
/// assert_eq!(writer.into_inner(), b"HTTP/1.0 200 OK\r\nContent-Length: 2\r\n\r\nHi");
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ResponseWriter<W> {
    stream: W,
    limits: SendLimits,
    headers_sent: bool,
    written: u64,
}

impl<W: AsyncWrite + Unpin> ResponseWriter<W> {
    pub fn new(stream: W, limits: SendLimits) -> Self {
        Self {
            stream,
            limits,
            headers_sent: false,
            written: 0,
        }
    }

    /// Whether a response head has gone out on this connection.
    #[inline]
    pub fn headers_sent(&self) -> bool {
        self.headers_sent
    }

    /// Total bytes written so far.
    #[inline]
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Writes `response` and flushes.
    ///
    /// Reading the body consumes it, hence `&mut`.
    ///
    /// # Errors
    /// - [`Error::HeadersSent`] if a response was already sent;
    /// - [`Error::WriteTimeout`] when a write takes too long;
    /// - [`Error::Io`] from the connection or the body.
    pub async fn send(&mut self, response: &mut Response) -> Result<(), Error> {
        if self.headers_sent {
            return Err(Error::HeadersSent);
        }

        let head = response.head();
        self.headers_sent = true;
        self.write(head.as_bytes()).await?;

        let chunked = response
            .header("Transfer-Encoding")
            .eq_ignore_ascii_case("chunked");
        let chunk_size = self.limits.chunk_size.max(1);

        if let Some(body) = response.body_mut() {
            loop {
                let chunk = body.read(chunk_size)?;
                if chunk.is_empty() {
                    break;
                }

                match chunked {
                    true => {
                        let mut framed = format!("{:X}\r\n", chunk.len()).into_bytes();
                        framed.extend_from_slice(&chunk);
                        framed.extend_from_slice(b"\r\n");
                        self.write(&framed).await?;
                    }
                    false => self.write(&chunk).await?,
                }
            }

            if chunked {
                self.write(b"0\r\n\r\n").await?;
            }
        }

        timeout(self.limits.write_timeout, self.stream.flush())
            .await
            .map_err(|_| Error::WriteTimeout)??;

        trace!(
            status = response.status_code(),
            bytes = self.written,
            "response sent"
        );
        Ok(())
    }

    async fn write(&mut self, bytes: &[u8]) -> Result<(), Error> {
        timeout(self.limits.write_timeout, self.stream.write_all(bytes))
            .await
            .map_err(|_| Error::WriteTimeout)??;

        self.written += bytes.len() as u64;
        Ok(())
    }

    #[inline]
    pub fn into_inner(self) -> W {
        self.stream
    }
}
