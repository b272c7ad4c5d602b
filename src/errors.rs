use crate::{
    http::{message::HttpMessage, response::Response},
    StatusCode,
};
use std::io;

/// Errors returned by the value model and its adapters.
///
/// Every variant is a synchronous failure of the call that produced it.
/// Lenient parses (cookie `Expires`, `q` values, `Referer`) never end up here.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A cookie line without a usable `name=value` pair.
    #[error("The cookie string is not valid.")]
    InvalidCookie,

    #[error("URL is malformed.")]
    MalformedUrl,
    #[error("URL must contain a scheme, http or https.")]
    MissingScheme,
    #[error("URL scheme must be http or https, got \"{0}\".")]
    UnsupportedScheme(String),
    #[error("URL must contain a host name.")]
    MissingHost,

    #[error("The request path must not contain a query string.")]
    QueryInPath,
    /// An uploaded-files tree holding something other than files and containers.
    #[error("Expected UploadedFile or nested map, got {0}.")]
    InvalidUpload(&'static str),

    #[error("Invalid status code: {0}")]
    InvalidStatusCode(u16),
    #[error("Invalid HTTP redirect status code: {0}")]
    InvalidRedirectStatus(u16),
    #[error("Could not parse response (error {}).", .0.code())]
    ResponseParse(ParseStage),

    #[error("Headers have already been sent.")]
    HeadersSent,
    #[error("The uploaded file has already been moved.")]
    AlreadyMoved,
    #[error("Timed out while writing to the connection.")]
    WriteTimeout,
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Stage at which [`Response::parse`] gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStage {
    /// The first line is not `HTTP/d.d ddd reason` followed by CRLF.
    StatusLine,
    /// No blank line terminates the header block.
    HeaderTerminator,
    /// A header line is not `name: value`.
    HeaderLine,
}

impl ParseStage {
    /// Stable number used in the error message.
    #[inline]
    pub const fn code(self) -> u8 {
        match self {
            Self::StatusLine => 1,
            Self::HeaderTerminator => 2,
            Self::HeaderLine => 3,
        }
    }
}

/// An HTTP-level failure that carries its own response semantics.
///
/// Application code returns it to abort handling with a specific status and
/// headers; [`HttpError::into_response`] turns it into the wire response.
///
/// # Examples
/// ```
/// use http_value::{HttpError, HttpMessage};
///
/// let response = HttpError::method_not_allowed(&["GET", "POST"]).into_response();
///
/// assert_eq!(response.status_code(), 405);
/// assert_eq!(response.header("Allow"), "GET, POST");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{status} {message}")]
pub struct HttpError {
    status: u16,
    headers: Vec<(String, String)>,
    message: String,
}

macro_rules! http_errors {
    ($($(#[$docs:meta])* $name:ident => $status:ident;)*) => {
        impl HttpError { $(
            $(#[$docs])*
            #[inline]
            pub fn $name(message: impl Into<String>) -> Self {
                Self::new(StatusCode::$status, message)
            }
        )* }
    };
}

http_errors! {
    /// 400, the request cannot be understood.
    bad_request => BadRequest;
    /// 403, the client is known but not allowed.
    forbidden => Forbidden;
    /// 404
    not_found => NotFound;
    /// 500
    internal_server_error => InternalServerError;
    /// 503, usually temporary.
    service_unavailable => ServiceUnavailable;
}

impl HttpError {
    #[inline]
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status: status.as_u16(),
            headers: Vec::new(),
            message: message.into(),
        }
    }

    /// 401 with a `WWW-Authenticate` challenge.
    pub fn unauthorized(challenge: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(StatusCode::Unauthorized, message).with_header("WWW-Authenticate", challenge)
    }

    /// 405 with an `Allow` header listing the accepted methods.
    pub fn method_not_allowed(allowed: &[&str]) -> Self {
        Self::new(StatusCode::MethodNotAllowed, "").with_header("Allow", allowed.join(", "))
    }

    /// A redirect to `location`.
    ///
    /// # Errors
    /// [`Error::InvalidRedirectStatus`] unless `status` is in `300..=399`.
    pub fn redirect(location: impl Into<String>, status: u16) -> Result<Self, Error> {
        if !(300..=399).contains(&status) {
            return Err(Error::InvalidRedirectStatus(status));
        }

        Ok(Self {
            status,
            headers: vec![("Location".to_owned(), location.into())],
            message: String::new(),
        })
    }

    /// A `302 Found` redirect.
    #[inline]
    pub fn found(location: impl Into<String>) -> Self {
        Self::new(StatusCode::Found, "").with_header("Location", location)
    }

    /// Adds a header sent along with the error response.
    #[inline]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    #[inline]
    pub fn status(&self) -> u16 {
        self.status
    }

    #[inline]
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Builds the response: status, headers, and the message as a plain-text body.
    pub fn into_response(self) -> Response {
        let mut response = Response::default().with_status_unchecked(self.status, None);

        for (name, value) in &self.headers {
            response = response.with_added_header(name, value.as_str());
        }

        if self.message.is_empty() {
            response
        } else {
            response
                .with_header("Content-Type", "text/plain; charset=utf-8")
                .with_content(self.message)
        }
    }
}

impl From<HttpError> for Response {
    fn from(err: HttpError) -> Self {
        err.into_response()
    }
}
