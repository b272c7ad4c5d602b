//! State and operations shared by requests and responses.

use crate::http::{
    body::Body,
    headers::{HeaderBag, IntoHeaderValues},
    types::parse_digits,
};
use indexmap::IndexMap;
use std::io;

/// Headers, body and protocol version of an HTTP message.
///
/// Embedded in [`Request`](crate::Request) and [`Response`](crate::Response);
/// all access goes through [`HttpMessage`].
#[derive(Debug, Clone)]
pub struct Message {
    pub(crate) protocol_version: String,
    pub(crate) headers: HeaderBag,
    pub(crate) body: Option<Body>,
}

impl Default for Message {
    fn default() -> Self {
        Self {
            protocol_version: "1.0".to_owned(),
            headers: HeaderBag::new(),
            body: None,
        }
    }
}

impl Message {
    /// Sets the body and keeps the framing headers consistent with it.
    ///
    /// A known size sets `Content-Length` and drops `Transfer-Encoding`, an
    /// unknown size does the opposite, and no body drops both.
    pub(crate) fn set_body(&mut self, body: Option<Body>) {
        match body.as_ref().map(Body::size) {
            Some(Some(size)) => {
                self.headers.set("Content-Length", size);
                self.headers.remove("Transfer-Encoding");
            }
            Some(None) => {
                self.headers.set("Transfer-Encoding", "chunked");
                self.headers.remove("Content-Length");
            }
            None => {
                self.headers.remove("Content-Length");
                self.headers.remove("Transfer-Encoding");
            }
        }

        self.body = body;
    }

    pub(crate) fn head(&self, start_line: &str) -> String {
        let mut head = String::with_capacity(start_line.len() + 2 + self.headers.len() * 32 + 2);
        head.push_str(start_line);
        head.push_str("\r\n");
        self.headers.write_lines(&mut head);
        head.push_str("\r\n");
        head
    }
}

/// Copy-on-write operations common to requests and responses.
///
/// Every `with_*` method consumes the message and returns the updated one; to
/// keep the original, clone it first. Header names are matched
/// case-insensitively throughout.
///
/// # Examples
/// ```
/// use http_value::{HttpMessage, Response};
///
/// let response = Response::default()
///     .with_header("Accept", "image/png")
///     .with_added_header("accept", ["image/gif", "image/jpeg"])
///     .with_content("param1=value1&param2=value2");
///
/// assert_eq!(response.header("Accept"), "image/png, image/gif, image/jpeg");
/// assert_eq!(response.content_length(), 27);
/// assert_eq!(
///     response.head(),
///     "HTTP/1.0 200 OK\r\n\
///      Accept: image/png\r\n\
///      Accept: image/gif\r\n\
///      Accept: image/jpeg\r\n\
///      Content-Length: 27\r\n\
///      \r\n"
/// );
/// ```
pub trait HttpMessage: Sized {
    #[doc(hidden)]
    fn message(&self) -> &Message;
    #[doc(hidden)]
    fn message_mut(&mut self) -> &mut Message;

    /// The first line of the message, without CRLF.
    fn start_line(&self) -> String;

    /// Version without the `HTTP/` prefix, `"1.0"` by default.
    #[inline]
    fn protocol_version(&self) -> &str {
        &self.message().protocol_version
    }

    #[inline]
    fn with_protocol_version(mut self, version: impl Into<String>) -> Self {
        self.message_mut().protocol_version = version.into();
        self
    }

    /// The header bag itself.
    #[inline]
    fn header_bag(&self) -> &HeaderBag {
        &self.message().headers
    }

    /// Title-cased header names mapped to their values, in insertion order.
    #[inline]
    fn headers(&self) -> IndexMap<String, Vec<String>> {
        self.message().headers.presented()
    }

    #[inline]
    fn has_header(&self, name: &str) -> bool {
        self.message().headers.contains(name)
    }

    /// All values joined with `", "`, or `""` when absent.
    #[inline]
    fn header(&self, name: &str) -> String {
        self.message().headers.get(name)
    }

    #[inline]
    fn header_values(&self, name: &str) -> &[String] {
        self.message().headers.values(name)
    }

    #[inline]
    fn first_header(&self, name: &str) -> Option<&str> {
        self.message().headers.first(name)
    }

    #[inline]
    fn last_header(&self, name: &str) -> Option<&str> {
        self.message().headers.last(name)
    }

    /// Replaces every value of `name`.
    #[inline]
    fn with_header<V: IntoHeaderValues>(mut self, name: &str, value: V) -> Self {
        self.message_mut().headers.set(name, value);
        self
    }

    /// Replaces the values of several headers at once.
    fn with_headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: IntoHeaderValues,
    {
        for (name, value) in headers {
            self.message_mut().headers.set(name.as_ref(), value);
        }
        self
    }

    /// Appends to the values of `name`.
    #[inline]
    fn with_added_header<V: IntoHeaderValues>(mut self, name: &str, value: V) -> Self {
        self.message_mut().headers.add(name, value);
        self
    }

    fn with_added_headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: IntoHeaderValues,
    {
        for (name, value) in headers {
            self.message_mut().headers.add(name.as_ref(), value);
        }
        self
    }

    #[inline]
    fn without_header(mut self, name: &str) -> Self {
        self.message_mut().headers.remove(name);
        self
    }

    #[inline]
    fn body(&self) -> Option<&Body> {
        self.message().body.as_ref()
    }

    /// Mutable access for reading, which advances the body cursor.
    #[inline]
    fn body_mut(&mut self) -> Option<&mut Body> {
        self.message_mut().body.as_mut()
    }

    /// Sets the body together with `Content-Length` or `Transfer-Encoding`.
    #[inline]
    fn with_body(mut self, body: impl Into<Body>) -> Self {
        self.message_mut().set_body(Some(body.into()));
        self
    }

    /// Drops the body and both framing headers.
    #[inline]
    fn without_body(mut self) -> Self {
        self.message_mut().set_body(None);
        self
    }

    /// `Content-Length` as a number, or 0 when absent or not a plain integer.
    #[inline]
    fn content_length(&self) -> u64 {
        parse_digits(&self.header("Content-Length")).unwrap_or(0)
    }

    /// Compares the media type before any `;` parameters, ignoring case.
    #[inline]
    fn is_content_type(&self, content_type: &str) -> bool {
        let header = self.header("Content-Type");
        let media_type = header.split(';').next().unwrap_or_default();
        media_type.eq_ignore_ascii_case(content_type)
    }

    /// Start line, headers and the terminating blank line.
    #[inline]
    fn head(&self) -> String {
        self.message().head(&self.start_line())
    }

    /// Head followed by the full body contents.
    ///
    /// Reading a streamed body consumes it, hence `&mut self`.
    fn to_bytes(&mut self) -> io::Result<Vec<u8>> {
        let mut bytes = self.head().into_bytes();
        if let Some(body) = self.body_mut() {
            bytes.extend(body.contents()?);
        }
        Ok(bytes)
    }
}

/// `Display` renders the head plus an in-memory body; a streamed body is
/// left out since rendering must not consume it.
macro_rules! impl_display_message {
    ($($t:ty),*) => {
        $(impl std::fmt::Display for $t {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.head())?;
                if let Some(bytes) = self.body().and_then(Body::as_bytes) {
                    f.write_str(&String::from_utf8_lossy(bytes))?;
                }
                Ok(())
            }
        })*
    };
}

impl_display_message!(crate::Request, crate::Response);
