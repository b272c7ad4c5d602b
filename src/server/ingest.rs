//! Building a [`Request`] from a CGI-style server environment.

use crate::{
    errors::HttpError,
    http::{
        body::{Body, Resource},
        request::{check_files, Request},
        types::Method,
        value::Params,
    },
    limits::{HostSource, IngestLimits},
};
use indexmap::IndexMap;
use tracing::debug;

/// A snapshot of what the web server hands over for one request.
///
/// `server` holds the CGI variables (`REQUEST_METHOD`, `HTTP_HOST`, ...).
/// Form, cookie and upload data arrive already decoded.
#[derive(Debug, Default)]
pub struct Environment {
    pub server: IndexMap<String, String>,
    pub post: Params,
    pub cookies: Params,
    pub files: Params,
    /// The raw request body, if the server provides one.
    pub body: Option<Box<dyn Resource>>,
}

impl Environment {
    /// An environment with only server variables.
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            server: vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
            ..Self::default()
        }
    }

    #[inline]
    fn var(&self, name: &str) -> Option<&str> {
        self.server.get(name).map(String::as_str)
    }
}

/// Builds the request described by `env`.
///
/// Host and port are picked according to [`IngestLimits::host_source`]; with
/// [`IngestLimits::trust_proxy`] the `X-Forwarded-*` headers override client
/// IP, host, port and scheme. Headers are taken from the `HTTP_*` variables
/// plus `CONTENT_TYPE` and `CONTENT_LENGTH`. A body is attached only when
/// `CONTENT_LENGTH` or `HTTP_TRANSFER_ENCODING` is set.
///
/// `REQUEST_METHOD` goes through [`Request::with_method`], so `get` becomes
/// `GET` while extension methods keep their case.
///
/// # Errors
/// [`HttpError::bad_request`] when
/// - `SERVER_PROTOCOL` is not `HTTP/<version>`;
/// - [`Environment::files`] holds a leaf that is not an uploaded file.
///
/// # Examples
/// ```
/// use http_value::{ingest, Environment, HttpMessage, IngestLimits};
///
/// let env = Environment::from_vars([
///     ("REQUEST_METHOD", "POST"),
///     ("REQUEST_URI", "/login?next=%2Fhome"),
///     ("SERVER_PROTOCOL", "HTTP/1.1"),
///     ("HTTP_HOST", "example.com:8080"),
///     ("REMOTE_ADDR", "10.0.0.7"),
/// ]);
/// let request = ingest(env, &IngestLimits::default()).unwrap();
///
/// assert_eq!(request.start_line(), "POST /login?next=%2Fhome HTTP/1.1");
/// assert_eq!(request.url(), "http://example.com:8080/login?next=%2Fhome");
/// assert_eq!(request.client_ip(), "10.0.0.7");
/// assert_eq!(request.header("Host"), "example.com:8080");
/// ```
pub fn ingest(mut env: Environment, limits: &IngestLimits) -> Result<Request, HttpError> {
    let mut request = Request::default();

    if matches!(env.var("HTTPS"), Some("on" | "1")) {
        request.secure = true;
        request.port = 443;
    }

    let (header_host, header_port) = match env.var("HTTP_HOST") {
        Some(host) => {
            let (host, port) = split_host(host);
            (Some(host), port.or(Some(request.port)))
        }
        None => (None, None),
    };
    let server_name = env.var("SERVER_NAME");
    let server_port = env.var("SERVER_PORT").and_then(parse_port);

    let (host, port) = match limits.host_source {
        HostSource::PreferHostHeader => (header_host.or(server_name), header_port.or(server_port)),
        HostSource::PreferServerName => (server_name.or(header_host), server_port.or(header_port)),
        HostSource::OnlyHostHeader => (header_host, header_port),
        HostSource::OnlyServerName => (server_name, server_port),
    };

    if let Some(host) = host {
        request.host = host.to_owned();
    }
    if let Some(port) = port {
        request.port = port;
    }

    if let Some(method) = env.var("REQUEST_METHOD") {
        request.method = Method::new(method);
    }
    if let Some(uri) = env.var("REQUEST_URI") {
        request = request.with_request_uri(uri);
    }

    if let Some(protocol) = env.var("SERVER_PROTOCOL") {
        match protocol.strip_prefix("HTTP/") {
            Some(version) if !version.is_empty() => {
                request.message.protocol_version = version.to_owned();
            }
            _ => return Err(HttpError::bad_request(format!("Invalid protocol: {protocol}"))),
        }
    }

    if let Err(err) = check_files(env.files.values()) {
        return Err(HttpError::bad_request(format!("Invalid uploaded files: {err}")));
    }

    if let Some(ip) = env.var("REMOTE_ADDR") {
        request.client_ip = ip.to_owned();
    }

    for (key, value) in &env.server {
        let name = match key.strip_prefix("HTTP_") {
            Some(name) => name,
            None if key == "CONTENT_TYPE" || key == "CONTENT_LENGTH" => key,
            None => continue,
        };
        request.message.headers.set(&name.replace('_', "-"), value.as_str());
    }

    if env.server.contains_key("CONTENT_LENGTH") || env.server.contains_key("HTTP_TRANSFER_ENCODING") {
        request.message.body = Some(match env.body.take() {
            Some(resource) => Body::from_boxed(resource),
            None => Body::from(""),
        });
    }

    if limits.trust_proxy {
        apply_forwarded(&mut request, &env);
    }

    debug!(
        method = %request.method,
        host = %request.host,
        port = request.port,
        secure = request.secure,
        uri = %request.request_uri,
        "ingested request"
    );

    request.post = env.post;
    request.cookies = env.cookies;
    request.files = env.files;
    Ok(request)
}

fn apply_forwarded(request: &mut Request, env: &Environment) {
    if let Some(ip) = env
        .var("HTTP_X_FORWARDED_FOR")
        .and_then(|ips| ips.rsplit(',').next())
    {
        debug!(ip = ip.trim(), "client IP from X-Forwarded-For");
        request.client_ip = ip.trim().to_owned();
    }

    if let Some(host) = env.var("HTTP_X_FORWARDED_HOST") {
        debug!(host, "host from X-Forwarded-Host");
        request.host = host.to_owned();
    }

    if let Some(port) = env.var("HTTP_X_FORWARDED_PORT").and_then(parse_port) {
        debug!(port, "port from X-Forwarded-Port");
        request.port = port;
    }

    if let Some(proto) = env.var("HTTP_X_FORWARDED_PROTO") {
        debug!(proto, "scheme from X-Forwarded-Proto");
        request.secure = proto == "https";
    }
}

/// Splits `host[:port]` at the last `:`; a bracketed IPv6 literal alone has
/// no port.
fn split_host(host: &str) -> (&str, Option<u16>) {
    match host.rfind(':') {
        Some(pos) if !host[pos..].contains(']') => (&host[..pos], parse_port(&host[pos + 1..])),
        _ => (host, None),
    }
}

#[inline]
fn parse_port(port: &str) -> Option<u16> {
    match port.trim().parse() {
        Ok(port) => Some(port),
        Err(_) => {
            debug!(port, "ignoring unreadable port");
            None
        }
    }
}
