//! http_value - Immutable HTTP request and response values
//!
//! A value model for HTTP messages: every request and response is an
//! immutable value, and every change goes through a `with_*` method that
//! returns the updated message. Derived state stays consistent on each call,
//! so a request's URI, path, query, `Host` header and URL never disagree.
//!
//! # Features
//!
//! - **Headers** - case-insensitive, multi-valued, insertion ordered
//! - **Bodies** - in-memory buffers or streamed [`Resource`]s, with automatic
//!   `Content-Length` / `Transfer-Encoding`
//! - **Requests** - URL, host and port normalization, nested query/post/cookie
//!   trees, uploaded files and content negotiation
//! - **Responses** - status codes, `Set-Cookie` handling and wire parsing
//! - **Adapters** - [`ingest`] a CGI-style environment, send a response with
//!   [`ResponseWriter`], and glue both to a [`Handler`]
//!
//! # Examples
//!
//! Building messages:
//! ```
//! use http_value::{Cookie, HttpMessage, Request, Response, StatusCode};
//!
//! let request = Request::default()
//!     .with_url("https://shop.example.com/cart?item[]=1&item[]=7")
//!     .unwrap()
//!     .with_header("Accept-Language", "fr-ch, fr;q=0.9, en;q=0.8");
//!
//! assert!(request.is_host("example.com", true));
//! assert_eq!(request.query_param("item[1]").and_then(|v| v.as_str()), Some("7"));
//! assert_eq!(request.accept_language().keys().next().map(String::as_str), Some("fr-ch"));
//!
//! let response = Response::default()
//!     .with_status(StatusCode::NotFound)
//!     .with_cookie(Cookie::new("seen", "1").with_path("/"))
//!     .with_content("Not here");
//!
//! assert_eq!(
//!     response.head(),
//!     "HTTP/1.0 404 Not Found\r\nSet-Cookie: seen=1; Path=/\r\nContent-Length: 8\r\n\r\n"
//! );
//! ```
//! Serving a request:
//! ```
//! use http_value::{serve, Environment, HttpError, IngestLimits, Request, Response, ResponseWriter, SendLimits};
//!
//! fn hello(request: Request) -> Result<Response, HttpError> {
//!     match request.path_parts()[..] {
//!         ["hello", name] => Ok(Response::default().with_content(format!("Hello {name}!"))),
//!         _ => Err(HttpError::not_found("")),
//!     }
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), http_value::Error> {
//! let env = Environment::from_vars([("REQUEST_URI", "/hello/Ann"), ("HTTP_HOST", "localhost")]);
//!
//! let mut writer = ResponseWriter::new(Vec::new(), SendLimits::default());
//! serve(&hello, env, &IngestLimits::default(), &mut writer).await?;
//!
//! assert_eq!(writer.into_inner(), b"HTTP/1.0 200 OK\r\nContent-Length: 10\r\n\r\nHello Ann!");
//! # Ok(())
//! # }
//! ```

pub(crate) mod http {
    pub(crate) mod body;
    pub(crate) mod cookie;
    pub(crate) mod headers;
    pub(crate) mod message;
    pub mod quality;
    pub mod query;
    pub(crate) mod request;
    pub(crate) mod response;
    pub(crate) mod types;
    pub(crate) mod upload;
    pub(crate) mod url;
    pub(crate) mod value;
}
pub(crate) mod server {
    pub(crate) mod handler;
    pub(crate) mod ingest;
    pub(crate) mod transmit;
}
pub(crate) mod errors;
pub mod limits;

pub use crate::{
    errors::{Error, HttpError, ParseStage},
    http::{
        body::{Body, FileResource, Resource},
        cookie::Cookie,
        headers::{present_name, HeaderBag, IntoHeaderValues},
        message::{HttpMessage, Message},
        quality, query,
        request::Request,
        response::Response,
        types::{reason_phrase, Method, Scheme, StatusCode},
        upload::{FileStore, FsStore, UploadStatus, UploadedFile},
        url::{Path, Url},
        value::{params, resolve, Params, Value},
    },
    limits::{HostSource, IngestLimits, SendLimits},
    server::{
        handler::{respond, serve, Handler},
        ingest::{ingest, Environment},
        transmit::ResponseWriter,
    },
};
