//! Adapter configuration
//!
//! The value model itself has no knobs. These structs configure the two
//! boundary adapters: building a [`Request`](crate::Request) from a server
//! environment snapshot, and sending a [`Response`](crate::Response) over a
//! connection.
//!
//! # Examples
//!
//! ```
//! use http_value::limits::{HostSource, IngestLimits, SendLimits};
//! use std::time::Duration;
//!
//! let ingest = IngestLimits {
//!     trust_proxy: true, // Behind a load balancer
//!     host_source: HostSource::OnlyServerName,
//!     ..IngestLimits::default()
//! };
//! let send = SendLimits {
//!     write_timeout: Duration::from_secs(1),
//!     ..SendLimits::default()
//! };
//! # let _ = (ingest, send);
//! ```

use std::time::Duration;

/// Where the request host and port are taken from.
///
/// Two sources exist: the client-supplied `Host` header (`HTTP_HOST`) and the
/// server configuration (`SERVER_NAME` / `SERVER_PORT`). Host and port are
/// resolved independently, so a `Host` header without a port still lets the
/// port come from the other source in the `Prefer*` modes.
///
/// | Mode                | Host              | Port              |
/// |---------------------|-------------------|-------------------|
/// | `PreferHostHeader`  | header, else name | header, else port |
/// | `PreferServerName`  | name, else header | port, else header |
/// | `OnlyHostHeader`    | header            | header            |
/// | `OnlyServerName`    | name              | port              |
///
/// When the chosen source is absent, the request keeps its default
/// (`localhost`, and 80 or 443 depending on `HTTPS`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HostSource {
    /// Default.
    #[default]
    PreferHostHeader,
    PreferServerName,
    OnlyHostHeader,
    OnlyServerName,
}

/// Controls how [`ingest`](crate::ingest) builds a request.
#[derive(Debug, Clone)]
pub struct IngestLimits {
    /// Host/port precedence (default: [`HostSource::PreferHostHeader`]).
    pub host_source: HostSource,

    /// Honor `X-Forwarded-For/Host/Port/Proto` (default: `false`).
    ///
    /// Only enable this behind a proxy that overwrites these headers, since
    /// any client can send them.
    pub trust_proxy: bool,

    #[doc(hidden)]
    #[allow(dead_code)]
    pub _priv: (),
}

impl Default for IngestLimits {
    fn default() -> Self {
        Self {
            host_source: HostSource::default(),
            trust_proxy: false,

            _priv: (),
        }
    }
}

/// Controls how [`ResponseWriter`](crate::ResponseWriter) writes.
#[derive(Debug, Clone)]
pub struct SendLimits {
    /// Maximum time for each write to the connection (default: `5s`).
    pub write_timeout: Duration,

    /// Bytes read from the body per write (default: `8 KiB`).
    ///
    /// With a chunked body this is also the size of each chunk.
    pub chunk_size: usize,

    #[doc(hidden)]
    #[allow(dead_code)]
    pub _priv: (),
}

impl Default for SendLimits {
    fn default() -> Self {
        Self {
            write_timeout: Duration::from_secs(5),
            chunk_size: 8 * 1024,

            _priv: (),
        }
    }
}
