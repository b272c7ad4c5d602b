use crate::{
    errors::{Error, ParseStage},
    http::{
        body::Body,
        cookie::Cookie,
        message::{HttpMessage, Message},
        types::{reason_phrase, StatusCode},
    },
};
use memchr::{memchr, memmem};

/// An HTTP response as an immutable value.
///
/// Status code and reason phrase live beside the [`Message`]; every cookie
/// in [`Response::cookies`] has a matching `Set-Cookie` header, in the same
/// order.
///
/// # Examples
/// ```
/// use http_value::{Cookie, HttpMessage, Response, StatusCode};
///
/// let response = Response::default()
///     .with_status(StatusCode::Created)
///     .with_header("Content-Type", "application/json")
///     .with_cookie(Cookie::new("sid", "abc").with_path("/").with_http_only(true))
///     .with_content(r#"{"id":1}"#);
///
/// assert_eq!(
///     response.to_string(),
///     "HTTP/1.0 201 Created\r\n\
///      Content-Type: application/json\r\n\
///      Set-Cookie: sid=abc; Path=/; HttpOnly\r\n\
///      Content-Length: 8\r\n\
///      \r\n\
///      {\"id\":1}"
/// );
/// ```
#[derive(Debug, Clone)]
pub struct Response {
    pub(crate) message: Message,
    status_code: u16,
    reason_phrase: String,
    cookies: Vec<Cookie>,
}

impl Default for Response {
    fn default() -> Self {
        Self {
            message: Message::default(),
            status_code: 200,
            reason_phrase: "OK".to_owned(),
            cookies: Vec::new(),
        }
    }
}

impl HttpMessage for Response {
    #[inline]
    fn message(&self) -> &Message {
        &self.message
    }

    #[inline]
    fn message_mut(&mut self) -> &mut Message {
        &mut self.message
    }

    /// `HTTP/version code reason`
    fn start_line(&self) -> String {
        format!(
            "HTTP/{} {} {}",
            self.message.protocol_version, self.status_code, self.reason_phrase
        )
    }
}

impl Response {
    /// Parses a raw response: status line, headers, blank line, body.
    ///
    /// The status line must look like `HTTP/1.1 200 OK`; the reason phrase
    /// on the wire is kept, an empty one is replaced by the default phrase.
    /// Header lines are `name: value` and keep their duplicates. Each
    /// `Set-Cookie` line goes through [`Response::with_cookie`]. Whatever
    /// follows the blank line is the body.
    ///
    /// # Errors
    /// - [`Error::ResponseParse`] with the stage that failed;
    /// - [`Error::InvalidCookie`] for an unreadable `Set-Cookie` line.
    ///
    /// # Examples
    /// ```
    /// use http_value::{HttpMessage, Response};
    ///
    /// let response = Response::parse("HTTP/1.1 404 Not Found\r\nX-A: 1\r\n\r\nmissing").unwrap();
    ///
    /// assert_eq!(response.status_code(), 404);
    /// assert_eq!(response.protocol_version(), "1.1");
    /// assert_eq!(response.header("Content-Length"), "7");
    /// ```
    pub fn parse(raw: impl AsRef<[u8]>) -> Result<Self, Error> {
        let raw = raw.as_ref();

        let (version, code, reason, mut rest) = parse_status_line(raw)?;
        let mut response = Self::default()
            .with_protocol_version(version)
            .with_status_code(code, (!reason.is_empty()).then_some(reason))?;

        loop {
            let end = memmem::find(rest, b"\r\n")
                .ok_or(Error::ResponseParse(ParseStage::HeaderTerminator))?;
            if end == 0 {
                break;
            }

            let (name, value) = parse_header_line(&rest[..end])?;
            response = match name.eq_ignore_ascii_case("set-cookie") {
                true => response.with_cookie(Cookie::parse(value)?),
                false => response.with_added_header(name, value),
            };

            rest = &rest[end + 2..];
        }

        Ok(response.with_content(rest[2..].to_vec()))
    }

    #[inline]
    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    #[inline]
    pub fn reason_phrase(&self) -> &str {
        &self.reason_phrase
    }

    /// Sets the status code and reason phrase.
    ///
    /// Without a reason, the registered phrase for `code` is used, or
    /// `"Unknown"` for an unregistered code.
    ///
    /// # Errors
    /// [`Error::InvalidStatusCode`] unless `code` is in `100..=999`.
    pub fn with_status_code(self, code: u16, reason: Option<&str>) -> Result<Self, Error> {
        if !(100..=999).contains(&code) {
            return Err(Error::InvalidStatusCode(code));
        }
        Ok(self.with_status_unchecked(code, reason))
    }

    /// Sets a registered status with its default reason phrase.
    #[inline]
    pub fn with_status(self, status: StatusCode) -> Self {
        self.with_status_unchecked(status.as_u16(), None)
    }

    pub(crate) fn with_status_unchecked(mut self, code: u16, reason: Option<&str>) -> Self {
        self.status_code = code;
        self.reason_phrase = match reason {
            Some(reason) => reason.to_owned(),
            None => reason_phrase(code).unwrap_or("Unknown").to_owned(),
        };
        self
    }

    /// Cookies set by this response, in header order.
    #[inline]
    pub fn cookies(&self) -> &[Cookie] {
        &self.cookies
    }

    /// Appends a cookie and its `Set-Cookie` header.
    pub fn with_cookie(mut self, cookie: Cookie) -> Self {
        self.message.headers.add("Set-Cookie", cookie.to_string());
        self.cookies.push(cookie);
        self
    }

    /// Drops every cookie together with the `Set-Cookie` header.
    pub fn without_cookies(mut self) -> Self {
        self.cookies.clear();
        self.message.headers.remove("Set-Cookie");
        self
    }

    /// Sets the body from text, bytes or a stream.
    #[inline]
    pub fn with_content(self, content: impl Into<Body>) -> Self {
        self.with_body(content)
    }

    #[inline]
    pub fn is_status_code(&self, code: u16) -> bool {
        self.status_code == code
    }

    /// 1xx
    #[inline]
    pub fn is_informational(&self) -> bool {
        (100..200).contains(&self.status_code)
    }

    /// 2xx
    #[inline]
    pub fn is_successful(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    /// 3xx
    #[inline]
    pub fn is_redirection(&self) -> bool {
        (300..400).contains(&self.status_code)
    }

    /// 4xx
    #[inline]
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code)
    }

    /// 5xx
    #[inline]
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status_code)
    }
}

/// `HTTP/d.d ddd reason\r\n`, returning version, code, reason and the rest.
fn parse_status_line(raw: &[u8]) -> Result<(&str, u16, &str, &[u8]), Error> {
    const ERR: Error = Error::ResponseParse(ParseStage::StatusLine);
    // "HTTP/1.1 200 "
    const PREFIX_LEN: usize = 13;

    let end = memchr(b'\n', raw).ok_or(ERR)?;
    let line = match raw[..end].strip_suffix(b"\r") {
        Some(line) if line.len() >= PREFIX_LEN => line,
        _ => return Err(ERR),
    };

    let (prefix, reason) = line.split_at(PREFIX_LEN);
    let valid = prefix.starts_with(b"HTTP/")
        && prefix[5].is_ascii_digit()
        && prefix[6] == b'.'
        && prefix[7].is_ascii_digit()
        && prefix[8] == b' '
        && prefix[9..12].iter().all(u8::is_ascii_digit)
        && prefix[12] == b' ';
    if !valid {
        return Err(ERR);
    }

    let reason = simdutf8::basic::from_utf8(reason).map_err(|_| ERR)?;
    // The prefix is ASCII at this point
    let version = simdutf8::basic::from_utf8(&prefix[5..8]).map_err(|_| ERR)?;
    let code = prefix[9..12]
        .iter()
        .fold(0u16, |acc, digit| acc * 10 + u16::from(digit - b'0'));

    Ok((version, code, reason, &raw[end + 1..]))
}

/// `name: value`, where the name is the longest run of non-whitespace text
/// before a `:`.
fn parse_header_line(line: &[u8]) -> Result<(&str, &str), Error> {
    const ERR: Error = Error::ResponseParse(ParseStage::HeaderLine);

    let line = simdutf8::basic::from_utf8(line).map_err(|_| ERR)?;
    if line.contains('\n') {
        return Err(ERR);
    }

    let token_end = line
        .find(|c: char| c.is_ascii_whitespace() || c == '\x0b')
        .unwrap_or(line.len());
    let colon = line[..token_end].rfind(':').filter(|&i| i > 0).ok_or(ERR)?;

    let value = line[colon + 1..].trim_start_matches(|c: char| c.is_ascii_whitespace() || c == '\x0b');
    Ok((&line[..colon], value))
}
