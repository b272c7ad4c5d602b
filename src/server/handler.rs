//! The seam between the adapters and application code.

use crate::{
    errors::{Error, HttpError},
    http::{request::Request, response::Response},
    limits::IngestLimits,
    server::{
        ingest::{ingest, Environment},
        transmit::ResponseWriter,
    },
};
use tokio::io::AsyncWrite;
use tracing::debug;

/// Turns a request into a response.
///
/// Returning an [`HttpError`] aborts handling with that status; see
/// [`respond`].
///
/// Closures of the right shape are handlers too.
///
/// # Examples
/// ```
/// use http_value::{respond, HttpError, HttpMessage, Request, Response};
///
/// let hello = |request: Request| match request.path().as_str() {
///     "/" => Ok(Response::default().with_content("Hello World!")),
///     _ => Err(HttpError::not_found("Nothing here")),
/// };
///
/// let response = respond(&hello, Request::default().with_request_uri("/missing"));
/// assert_eq!(response.status_code(), 404);
/// assert_eq!(response.header("Content-Length"), "12");
/// ```
pub trait Handler {
    fn handle(&self, request: Request) -> Result<Response, HttpError>;
}

impl<F> Handler for F
where
    F: Fn(Request) -> Result<Response, HttpError>,
{
    #[inline]
    fn handle(&self, request: Request) -> Result<Response, HttpError> {
        self(request)
    }
}

/// Runs `handler` and folds an error into its response.
pub fn respond<H: Handler + ?Sized>(handler: &H, request: Request) -> Response {
    match handler.handle(request) {
        Ok(response) => response,
        Err(err) => {
            debug!(status = err.status(), error = %err, "handler returned an error");
            err.into_response()
        }
    }
}

/// Handles one request from ingestion to the wire.
///
/// An environment that cannot be ingested is answered with its
/// `400 Bad Request` without calling the handler.
///
/// # Errors
/// Whatever [`ResponseWriter::send`] reports.
pub async fn serve<H, W>(
    handler: &H,
    env: Environment,
    ingest_limits: &IngestLimits,
    writer: &mut ResponseWriter<W>,
) -> Result<(), Error>
where
    H: Handler + ?Sized,
    W: AsyncWrite + Unpin,
{
    let mut response = match ingest(env, ingest_limits) {
        Ok(request) => respond(handler, request),
        Err(err) => {
            debug!(error = %err, "rejecting request environment");
            err.into_response()
        }
    };

    writer.send(&mut response).await
}
