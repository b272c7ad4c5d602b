use crate::{
    errors::Error,
    http::{
        body::Body,
        message::{HttpMessage, Message},
        quality::parse_quality_values,
        query::Query,
        types::{Method, Scheme},
        upload::UploadedFile,
        url::{host_matches, Path, Url},
        value::{resolve, Params, Value},
    },
};
use indexmap::IndexMap;
use tracing::debug;

/// An HTTP request as an immutable value.
///
/// Every `with_*` method consumes the request and returns the updated one. The
/// derived fields are kept consistent on each call:
///
/// | Changed                                    | Also updated                               |
/// |--------------------------------------------|--------------------------------------------|
/// | path, query string, query                  | request URI                                |
/// | request URI                                | path, query string, query                  |
/// | host, port, scheme, secure flag            | `Host` header                              |
/// | URL                                        | all of the above                           |
/// | post params                                | body, `Content-Type`, `Content-Length`     |
/// | cookies                                    | `Cookie` header                            |
///
/// # Defaults
///
/// `GET / HTTP/1.0` to `localhost` on port 80, insecure, no headers, no body,
/// client IP `0.0.0.0`.
///
/// # Examples
/// ```
/// use http_value::{HttpMessage, Request, Value};
///
/// let request = Request::default()
///     .with_url("https://Example.com:8443/search?q=rust&page=2")
///     .unwrap()
///     .with_method("post");
///
/// assert_eq!(request.start_line(), "POST /search?q=rust&page=2 HTTP/1.0");
/// assert_eq!(request.header("Host"), "example.com:8443");
/// assert_eq!(request.query_param("page"), Some(&Value::from("2")));
/// assert_eq!(request.url(), "https://example.com:8443/search?q=rust&page=2");
/// ```
#[derive(Debug, Clone)]
pub struct Request {
    pub(crate) message: Message,
    pub(crate) method: Method,
    pub(crate) secure: bool,
    pub(crate) host: String,
    pub(crate) port: u16,
    pub(crate) path: Path,
    pub(crate) query_string: String,
    pub(crate) request_uri: String,
    pub(crate) query: Params,
    pub(crate) post: Params,
    pub(crate) cookies: Params,
    pub(crate) files: Params,
    pub(crate) client_ip: String,
    pub(crate) attributes: IndexMap<String, Value>,
}

impl Default for Request {
    fn default() -> Self {
        Self {
            message: Message::default(),
            method: Method::Get,
            secure: false,
            host: "localhost".to_owned(),
            port: 80,
            path: Path::default(),
            query_string: String::new(),
            request_uri: "/".to_owned(),
            query: Params::new(),
            post: Params::new(),
            cookies: Params::new(),
            files: Params::new(),
            client_ip: "0.0.0.0".to_owned(),
            attributes: IndexMap::new(),
        }
    }
}

impl HttpMessage for Request {
    #[inline]
    fn message(&self) -> &Message {
        &self.message
    }

    #[inline]
    fn message_mut(&mut self) -> &mut Message {
        &mut self.message
    }

    /// `METHOD request-uri HTTP/version`
    fn start_line(&self) -> String {
        format!(
            "{} {} HTTP/{}",
            self.method,
            self.request_uri,
            self.message.protocol_version
        )
    }
}

// METHOD

impl Request {
    #[inline]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Standard method names are upper-cased, others kept verbatim.
    #[inline]
    pub fn with_method(mut self, method: &str) -> Self {
        self.method = Method::new(method);
        self
    }

    /// Compares with `method` normalized the same way as [`Request::with_method`].
    #[inline]
    pub fn is_method(&self, method: &str) -> bool {
        self.method == Method::new(method)
    }

    /// `true` only for `GET` and `HEAD`.
    #[inline]
    pub fn is_method_safe(&self) -> bool {
        self.method.is_safe()
    }
}

// SCHEME, HOST & PORT

impl Request {
    #[inline]
    pub fn scheme(&self) -> Scheme {
        Scheme::from_secure(self.secure)
    }

    /// Accepts `http` or `https` in any case; the port is left alone.
    ///
    /// # Errors
    /// [`Error::UnsupportedScheme`] for anything else.
    pub fn with_scheme(mut self, scheme: &str) -> Result<Self, Error> {
        let scheme =
            Scheme::parse(scheme).ok_or_else(|| Error::UnsupportedScheme(scheme.to_ascii_lowercase()))?;

        self.secure = scheme.is_secure();
        self.update_host_header();
        Ok(self)
    }

    #[inline]
    pub fn is_secure(&self) -> bool {
        self.secure
    }

    /// Sets the secure flag.
    ///
    /// The port follows the scheme only when it is the standard port of the
    /// current scheme: a request on port 80 moves to 443 and back, a request on
    /// port 81 stays on 81.
    pub fn with_secure(mut self, secure: bool) -> Self {
        if self.port == self.scheme().standard_port() {
            self.port = Scheme::from_secure(secure).standard_port();
        }

        self.secure = secure;
        self.update_host_header();
        self
    }

    #[inline]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The labels of the host, `www.example.com` gives `["www", "example", "com"]`.
    #[inline]
    pub fn host_parts(&self) -> Vec<&str> {
        self.host.split('.').collect()
    }

    /// Compares the host, ignoring case; see [`Url::is_host`].
    #[inline]
    pub fn is_host(&self, host: &str, include_sub_domains: bool) -> bool {
        host_matches(&self.host, host, include_sub_domains)
    }

    #[inline]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self.update_host_header();
        self
    }

    #[inline]
    pub fn port(&self) -> u16 {
        self.port
    }

    #[inline]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self.update_host_header();
        self
    }

    /// `Host: host[:port]`, the port only when it is not standard.
    pub(crate) fn update_host_header(&mut self) {
        let host = match self.port == self.scheme().standard_port() {
            true => self.host.clone(),
            false => format!("{}:{}", self.host, self.port),
        };
        self.message.headers.set("Host", host);
    }
}

// PATH, QUERY & REQUEST URI

impl Request {
    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Non-empty segments of the path.
    #[inline]
    pub fn path_parts(&self) -> Vec<&str> {
        self.path.parts()
    }

    /// # Errors
    /// [`Error::QueryInPath`] if `path` contains `?`.
    pub fn with_path(mut self, path: &str) -> Result<Self, Error> {
        if path.contains('?') {
            return Err(Error::QueryInPath);
        }

        self.path = Path::new(path);
        self.update_request_uri();
        Ok(self)
    }

    /// The raw query string, without `?`.
    #[inline]
    pub fn query_string(&self) -> &str {
        &self.query_string
    }

    /// Sets the raw query string and decodes the query params from it.
    pub fn with_query_string(mut self, query_string: impl Into<String>) -> Self {
        self.query_string = query_string.into();
        self.query = Query::parse(&self.query_string);
        self.update_request_uri();
        self
    }

    #[inline]
    pub fn request_uri(&self) -> &str {
        &self.request_uri
    }

    /// Splits on the first `?` into path and query string; the URI itself is
    /// stored verbatim, so `/a?` keeps its trailing `?`.
    pub fn with_request_uri(mut self, request_uri: &str) -> Self {
        match request_uri.split_once('?') {
            Some((path, query_string)) => {
                self.path = Path::new(path);
                self.query_string = query_string.to_owned();
                self.query = Query::parse(query_string);
            }
            None => {
                self.path = Path::new(request_uri);
                self.query_string.clear();
                self.query.clear();
            }
        }

        self.request_uri = request_uri.to_owned();
        self
    }

    fn update_request_uri(&mut self) {
        self.request_uri = match self.query_string.is_empty() {
            true => self.path.as_str().to_owned(),
            false => format!("{}?{}", self.path, self.query_string),
        };
    }

    /// Decoded query params.
    #[inline]
    pub fn query(&self) -> &Params {
        &self.query
    }

    /// A query param by path, `a.b` or `a[b]`.
    #[inline]
    pub fn query_param(&self, path: &str) -> Option<&Value> {
        resolve(&self.query, path)
    }

    /// Replaces the query params and re-encodes the query string.
    ///
    /// The stored params are decoded back from the new query string, so they
    /// only hold strings, as if they had arrived over the wire.
    pub fn with_query(mut self, query: Params) -> Self {
        let (query_string, query) = Query::normalize(&query);

        self.query_string = query_string;
        self.query = query;
        self.update_request_uri();
        self
    }
}

// URL

impl Request {
    /// `scheme://host[:port]`, the port only when it is not standard.
    pub fn url_base(&self) -> String {
        let scheme = self.scheme();
        match self.port == scheme.standard_port() {
            true => format!("{scheme}://{}", self.host),
            false => format!("{scheme}://{}:{}", self.host, self.port),
        }
    }

    /// The absolute URL: [`Request::url_base`] followed by the request URI.
    #[inline]
    pub fn url(&self) -> String {
        self.url_base() + &self.request_uri
    }

    /// Replaces scheme, host, port, path and query from an absolute URL.
    ///
    /// The fragment is dropped.
    ///
    /// # Errors
    /// Same as [`Url::parse`]; the request is left unchanged on error.
    pub fn with_url(mut self, url: &str) -> Result<Self, Error> {
        let url = Url::parse(url)?;

        self.secure = url.is_secure();
        self.host = url.host().to_owned();
        self.port = url.port();
        self.path = url.path().clone();
        self.query_string = url.query().to_owned();
        self.query = Query::parse(url.query());
        self.update_request_uri();
        self.update_host_header();
        Ok(self)
    }

    /// The first `Referer` header as a URL.
    ///
    /// `None` when the header is missing or is not a valid http(s) URL.
    pub fn referer(&self) -> Option<Url> {
        let referer = self.first_header("Referer")?;

        match Url::parse(referer) {
            Ok(url) => Some(url),
            Err(err) => {
                debug!(referer, error = %err, "ignoring invalid Referer header");
                None
            }
        }
    }
}

// POST, FILES & COOKIES

impl Request {
    #[inline]
    pub fn post(&self) -> &Params {
        &self.post
    }

    #[inline]
    pub fn post_param(&self, path: &str) -> Option<&Value> {
        resolve(&self.post, path)
    }

    /// Replaces the post params.
    ///
    /// Unless the request is `multipart/form-data`, the body becomes the form
    /// encoding of `post` and `Content-Type` is set to `x-www-form-urlencoded`.
    pub fn with_post(mut self, post: Params) -> Self {
        let (body, post) = Query::normalize(&post);
        self.post = post;

        if !self.is_content_type("multipart/form-data") {
            self.message.set_body(Some(Body::from(body)));
            self.message.headers.set("Content-Type", "x-www-form-urlencoded");
        }
        self
    }

    /// The uploaded-files tree.
    #[inline]
    pub fn files(&self) -> &Params {
        &self.files
    }

    /// The uploaded file at `path`.
    ///
    /// `None` if nothing is there or if it is a container of files.
    #[inline]
    pub fn file(&self, path: &str) -> Option<&UploadedFile> {
        resolve(&self.files, path).and_then(Value::as_file)
    }

    /// The uploaded files at `path`, keyed by name.
    ///
    /// A single file comes back under key `"0"`; for a container only its
    /// direct file children are kept.
    pub fn files_at(&self, path: &str) -> IndexMap<String, &UploadedFile> {
        match resolve(&self.files, path) {
            Some(Value::File(file)) => IndexMap::from([("0".to_owned(), file)]),
            Some(value) => value
                .entries()
                .into_iter()
                .filter_map(|(key, value)| Some((key, value.as_file()?)))
                .collect(),
            None => IndexMap::new(),
        }
    }

    /// Replaces the uploaded-files tree.
    ///
    /// The body is emptied and the request becomes
    /// `multipart/form-data` with `Content-Length: 0`.
    ///
    /// # Errors
    /// [`Error::InvalidUpload`] if a leaf of `files` is not a file.
    pub fn with_files(mut self, files: Params) -> Result<Self, Error> {
        check_files(files.values())?;

        self.files = files;
        self.message.headers.set("Content-Type", "multipart/form-data");
        self.message.set_body(Some(Body::from("")));
        Ok(self)
    }

    /// Cookies sent with the request.
    #[inline]
    pub fn cookies(&self) -> &Params {
        &self.cookies
    }

    #[inline]
    pub fn cookie(&self, path: &str) -> Option<&Value> {
        resolve(&self.cookies, path)
    }

    /// Replaces the cookies and rewrites the `Cookie` header.
    ///
    /// The header holds the form encoding of `cookies` with `&` replaced by
    /// `"; "`; an empty map removes it.
    pub fn with_cookies(mut self, cookies: Params) -> Self {
        let (encoded, decoded) = Query::normalize(&cookies);
        self.cookies = decoded;

        match cookies.is_empty() {
            true => {
                self.message.headers.remove("Cookie");
            }
            false => self.message.headers.set("Cookie", encoded.replace('&', "; ")),
        }
        self
    }

    /// Merges `cookies` into the current ones, new values winning.
    pub fn with_added_cookies(self, mut cookies: Params) -> Self {
        for (name, value) in &self.cookies {
            if !cookies.contains_key(name) {
                cookies.insert(name.clone(), value.clone());
            }
        }
        self.with_cookies(cookies)
    }
}

pub(crate) fn check_files<'a>(values: impl Iterator<Item = &'a Value>) -> Result<(), Error> {
    for value in values {
        match value {
            Value::File(_) => {}
            Value::Map(map) => check_files(map.values())?,
            Value::List(list) => check_files(list.iter())?,
            Value::Str(_) => return Err(Error::InvalidUpload("string")),
        }
    }
    Ok(())
}

// CLIENT & NEGOTIATION

impl Request {
    #[inline]
    pub fn client_ip(&self) -> &str {
        &self.client_ip
    }

    #[inline]
    pub fn with_client_ip(mut self, ip: impl Into<String>) -> Self {
        self.client_ip = ip.into();
        self
    }

    /// Whether `X-Requested-With` is exactly `XMLHttpRequest`.
    #[inline]
    pub fn is_ajax(&self) -> bool {
        self.header("X-Requested-With") == "XMLHttpRequest"
    }

    /// Media types from `Accept`, most preferred first.
    #[inline]
    pub fn accept(&self) -> IndexMap<String, f64> {
        parse_quality_values(&self.header("Accept"))
    }

    /// Language tags from `Accept-Language`, most preferred first.
    #[inline]
    pub fn accept_language(&self) -> IndexMap<String, f64> {
        parse_quality_values(&self.header("Accept-Language"))
    }

    #[inline]
    pub fn accept_charset(&self) -> IndexMap<String, f64> {
        parse_quality_values(&self.header("Accept-Charset"))
    }

    #[inline]
    pub fn accept_encoding(&self) -> IndexMap<String, f64> {
        parse_quality_values(&self.header("Accept-Encoding"))
    }
}

// ATTRIBUTES

impl Request {
    /// Application data attached to the request, such as route params.
    #[inline]
    pub fn attributes(&self) -> &IndexMap<String, Value> {
        &self.attributes
    }

    #[inline]
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    #[inline]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    #[inline]
    pub fn without_attribute(mut self, name: &str) -> Self {
        self.attributes.shift_remove(name);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        http::{upload::UploadStatus, value::params},
        tools::*,
    };

    fn upload(name: &str) -> UploadedFile {
        UploadedFile::new(format!("/tmp/{name}"), name, "application/octet-stream", 1, UploadStatus::Ok)
    }

    fn sample_files() -> Params {
        params([
            ("logo", Value::from(upload("logo.png"))),
            ("pictures", Value::from(vec![upload("a.jpg"), upload("b.jpx")])),
            (
                "files",
                Value::from(params([(
                    "images",
                    params([(
                        "logo",
                        params([("small", upload("small.bmp")), ("large", upload("large.gif"))]),
                    )]),
                )])),
            ),
        ])
    }

    fn assert_uri_invariant(request: &Request) {
        let expected = match request.query_string().is_empty() {
            true => request.path().to_string(),
            false => format!("{}?{}", request.path(), request.query_string()),
        };
        assert_eq!(request.request_uri(), expected);
    }

    #[test]
    fn defaults() {
        let request = Request::default();

        assert_eq!(request.start_line(), "GET / HTTP/1.0");
        assert_eq!(request.protocol_version(), "1.0");
        assert!(request.body().is_none());
        assert!(request.headers().is_empty());
        assert!(request.query().is_empty());
        assert!(request.post().is_empty());
        assert!(request.cookies().is_empty());
        assert!(request.files().is_empty());
        assert_eq!(request.method(), &Method::Get);
        assert_eq!(request.host(), "localhost");
        assert_eq!(request.port(), 80);
        assert_eq!(request.request_uri(), "/");
        assert_eq!(request.path(), "/");
        assert_eq!(request.query_string(), "");
        assert_eq!(request.client_ip(), "0.0.0.0");
        assert!(!request.is_secure());
    }

    #[test]
    fn method() {
        let cases = [
            ("get", "GET", true),
            ("Get", "GET", true),
            ("PUT", "PUT", false),
            ("purge", "purge", false),
            ("Purge", "Purge", false),
        ];

        for (set, expected, is_get) in cases {
            let request = Request::default().with_method(set);

            assert_eq!(request.method().as_str(), expected);
            assert_eq!(request.is_method("GET"), is_get);
            assert_eq!(request.is_method("get"), is_get);
            assert!(request.is_method(set));
            assert!(request.is_method(expected));
        }

        let request = Request::default().with_method("Purge");
        assert!(!request.is_method("PURGE"));
        assert!(!request.is_method("purge"));

        for (method, safe) in [("GET", true), ("head", true), ("POST", false), ("Get2", false)] {
            assert_eq!(Request::default().with_method(method).is_method_safe(), safe, "{method}");
        }

        let request = Request::default()
            .with_method("POST")
            .with_path("/test")
            .unwrap()
            .with_protocol_version("1.1");
        assert_eq!(request.start_line(), "POST /test HTTP/1.1");
    }

    #[test]
    fn scheme() {
        for (set, scheme, secure) in [("http", "http", false), ("HTTPS", "https", true), ("Http", "http", false)] {
            let request = Request::default().with_scheme(set).unwrap();

            assert_eq!(request.scheme().as_str(), scheme);
            assert_eq!(request.is_secure(), secure);
            assert_eq!(request.port(), 80);
        }

        assert!(matches!(
            Request::default().with_scheme("ftp"),
            Err(Error::UnsupportedScheme(s)) if s == "ftp"
        ));

        // Port untouched, so the Host header now shows it
        let request = Request::default().with_scheme("https").unwrap();
        assert_eq!(request.header("Host"), "localhost:80");
    }

    #[test]
    fn host_and_port() {
        let request = Request::default().with_host("example.com");
        assert_eq!(request.host(), "example.com");
        assert_eq!(request.header("Host"), "example.com");
        assert_eq!(request.port(), 80);

        let request = request.with_port(81);
        assert_eq!(request.port(), 81);
        assert_eq!(request.header("Host"), "example.com:81");

        let request = request.with_port(80);
        assert_eq!(request.header("Host"), "example.com");

        let request = Request::default().with_host("www.example.com");
        assert_eq!(request.host_parts(), ["www", "example", "com"]);
    }

    #[test]
    fn is_host() {
        let cases = [
            ("example.com", "example.com", false, true),
            ("example.com", "EXAMPLE.COM", false, true),
            ("Example.Com", "example.com", false, true),
            ("en.example.com", "example.com", false, false),
            ("en.example.com", "example.com", true, true),
            ("anexample.com", "example.com", true, false),
            ("example.com", "en.example.com", true, false),
            ("a.b.example.com", "B.EXAMPLE.com", true, true),
        ];

        for (host, test, sub_domains, expected) in cases {
            let request = Request::default().with_host(host);
            assert_eq!(request.is_host(test, sub_domains), expected, "{host} {test}");

            let url = Url::parse(&format!("http://{host}/")).unwrap();
            assert_eq!(url.is_host(test, sub_domains), expected, "{host} {test}");
        }
    }

    #[test]
    fn secure() {
        let request = Request::default().with_secure(true);
        assert!(request.is_secure());
        assert_eq!(request.port(), 443);
        assert_eq!(request.header("Host"), "localhost");

        let request = request.with_secure(false);
        assert!(!request.is_secure());
        assert_eq!(request.port(), 80);

        let request = request.with_port(81).with_secure(true);
        assert!(request.is_secure());
        assert_eq!(request.port(), 81);
        assert_eq!(request.header("Host"), "localhost:81");

        // Secure at port 80 is not standard, so flipping back keeps it
        let request = Request::default().with_scheme("https").unwrap().with_secure(false);
        assert_eq!(request.port(), 80);
        let request = Request::default()
            .with_port(443)
            .with_scheme("https")
            .unwrap()
            .with_secure(false);
        assert_eq!(request.port(), 80);
    }

    #[test]
    fn path() {
        let request = Request::default()
            .with_request_uri("/user/profile?user=123")
            .with_path("/user/edit")
            .unwrap();

        assert_eq!(request.path(), "/user/edit");
        assert_eq!(request.request_uri(), "/user/edit?user=123");
        assert_uri_invariant(&request);

        assert!(matches!(
            Request::default().with_path("/user/edit?user=123"),
            Err(Error::QueryInPath)
        ));

        let cases: [(&str, &[&str]); 4] = [
            ("/", &[]),
            ("/foo", &["foo"]),
            ("/foo/bar/", &["foo", "bar"]),
            ("//foo//bar//", &["foo", "bar"]),
        ];
        for (path, parts) in cases {
            assert_eq!(Request::default().with_path(path).unwrap().path_parts(), parts);
        }
    }

    #[test]
    fn query_string() {
        let request = Request::default().with_request_uri("/user/profile?user=123");
        let request = request.with_query_string("user=456");

        assert_eq!(request.query_string(), "user=456");
        assert_eq!(request.request_uri(), "/user/profile?user=456");
        assert_eq!(request.query_param("user"), Some(&Value::from("456")));
        assert_uri_invariant(&request);

        let request = request.with_query_string("");
        assert_eq!(request.request_uri(), "/user/profile");
        assert!(request.query().is_empty());
    }

    #[test]
    fn request_uri() {
        let request = Request::default().with_request_uri("/test?foo=bar");
        assert_eq!(request.request_uri(), "/test?foo=bar");
        assert_eq!(request.path(), "/test");
        assert_eq!(request.query_string(), "foo=bar");
        assert_eq!(request.query(), &params([("foo", "bar")]));

        for uri in ["/foo", "/foo/bar?"] {
            let request = Request::default().with_request_uri(uri);
            assert_eq!(request.request_uri(), uri);
            assert!(request.query().is_empty());
            assert_eq!(request.query_string(), "");
            assert_eq!(request.path(), uri.trim_end_matches('?'));
        }
    }

    #[test]
    fn query() {
        let request = Request::default().with_request_uri("/test?foo=bar");
        let query = params([
            ("a", Value::from("x")),
            ("b", Value::from(params([("c", params([("d", "y")]))]))),
        ]);
        let request = request.with_query(query.clone());

        assert_eq!(request.query(), &query);
        assert_eq!(request.query_string(), "a=x&b%5Bc%5D%5Bd%5D=y");
        assert_eq!(request.request_uri(), "/test?a=x&b%5Bc%5D%5Bd%5D=y");
        assert_uri_invariant(&request);

        assert_eq!(request.query_param("a"), Some(&Value::from("x")));
        assert_eq!(request.query_param("b.c.d"), Some(&Value::from("y")));
        assert_eq!(request.query_param("b[c][d]"), Some(&Value::from("y")));
        assert_eq!(request.query_param("b.c"), Some(&Value::from(params([("d", "y")]))));
        assert_eq!(request.query_param("b[c]"), Some(&Value::from(params([("d", "y")]))));
        assert_eq!(request.query_param("b.c.d.e"), None);

        // Scalars come back as strings
        let request = request.with_query(params([("n", 5)]));
        assert_eq!(request.query_param("n"), Some(&Value::from("5")));

        let request = request.with_query(Params::new());
        assert_eq!(request.request_uri(), "/test");
    }

    #[test]
    fn post() {
        let post = params([
            ("a", Value::from("x")),
            ("b", Value::from(params([("c", "y")]))),
        ]);
        let mut request = Request::default().with_post(post.clone());

        assert_eq!(request.post(), &post);
        assert_eq!(request.header("Content-Type"), "x-www-form-urlencoded");
        assert_eq!(request.header("Content-Length"), "14");
        assert_eq!(
            str_op(&request.body_mut().unwrap().contents().unwrap()),
            "a=x&b%5Bc%5D=y"
        );

        assert_eq!(request.post_param("a"), Some(&Value::from("x")));
        assert_eq!(request.post_param("b.c"), Some(&Value::from("y")));
        assert_eq!(request.post_param("b[c]"), Some(&Value::from("y")));
        assert_eq!(request.post_param("b"), Some(&Value::from(params([("c", "y")]))));
    }

    #[test]
    fn post_multipart() {
        let request = Request::default()
            .with_header("Content-Type", "multipart/form-data; boundary=x")
            .with_body("raw")
            .with_post(params([("a", "x")]));

        assert_eq!(request.post_param("a"), Some(&Value::from("x")));
        assert_eq!(request.header("Content-Type"), "multipart/form-data; boundary=x");
        assert_eq!(request.body().and_then(Body::as_bytes), Some(&b"raw"[..]));
    }

    #[test]
    fn cookies() {
        let cookies = params([("a", "b"), ("c", "d")]);
        let request = Request::default().with_cookies(cookies.clone());

        assert_eq!(request.cookies(), &cookies);
        assert_eq!(request.header("Cookie"), "a=b; c=d");

        let request = request.with_added_cookies(params([("a", "x"), ("b", "y")]));
        assert_eq!(request.cookie("a"), Some(&Value::from("x")));
        assert_eq!(request.cookie("b"), Some(&Value::from("y")));
        assert_eq!(request.cookie("c"), Some(&Value::from("d")));
        assert_eq!(request.header("Cookie"), "a=x; b=y; c=d");

        let request = Request::default().with_cookies(params([("Key", "Value")]));
        assert_eq!(request.header("Cookie"), "Key=Value");

        let request = request.with_cookies(Params::new());
        assert_eq!(request.header("Cookie"), "");
        assert!(!request.has_header("Cookie"));
    }

    #[test]
    fn file() {
        let request = Request::default().with_files(sample_files()).unwrap();

        let found = [
            ("logo", "logo.png"),
            ("pictures.0", "a.jpg"),
            ("pictures[1]", "b.jpx"),
            ("files.images.logo.small", "small.bmp"),
            ("files[images][logo][large]", "large.gif"),
        ];
        for (path, name) in found {
            assert_eq!(request.file(path).map(UploadedFile::name), Some(name), "{path}");
        }

        let missing = [
            "foo",
            "pictures",
            "pictures.0.test",
            "pictures[0][test]",
            "files",
            "files.images",
            "files.images.logo",
            "files.images.logo.small.test",
            "files[images]",
            "files[images[logo]",
            "files[images][logo][small][test]",
        ];
        for path in missing {
            assert!(request.file(path).is_none(), "{path}");
        }
    }

    #[test]
    fn files_at() {
        let request = Request::default().with_files(sample_files()).unwrap();

        let cases: [(&str, &[(&str, &str)]); 10] = [
            ("foo", &[]),
            ("logo", &[("0", "logo.png")]),
            ("pictures", &[("0", "a.jpg"), ("1", "b.jpx")]),
            ("files", &[]),
            ("files.images", &[]),
            ("files[images]", &[]),
            ("files.images.logo", &[("small", "small.bmp"), ("large", "large.gif")]),
            ("files[images][logo]", &[("small", "small.bmp"), ("large", "large.gif")]),
            ("files.images.logo.test", &[]),
            ("files[images][logo][test]", &[]),
        ];

        for (path, expected) in cases {
            let names: Vec<(String, &str)> = request
                .files_at(path)
                .into_iter()
                .map(|(key, file)| (key, file.name()))
                .collect();
            let expected: Vec<(String, &str)> =
                expected.iter().map(|(k, v)| (k.to_string(), *v)).collect();

            assert_eq!(names, expected, "{path}");
        }
    }

    #[test]
    fn with_files() {
        let files = sample_files();
        let request = Request::default().with_body("old").with_files(files.clone()).unwrap();

        assert_eq!(request.files(), &files);
        assert_eq!(request.header("Content-Type"), "multipart/form-data");
        assert_eq!(request.header("Content-Length"), "0");
        assert_eq!(request.body().and_then(Body::as_bytes), Some(&b""[..]));

        let invalid = params([("a", Value::from(params([("b", "not a file")])))]);
        assert!(matches!(
            Request::default().with_files(invalid),
            Err(Error::InvalidUpload("string"))
        ));
    }

    #[test]
    fn url() {
        let cases = [
            ("http://foo", "http://foo/", "foo", 80, "/", "/", "", false),
            ("https://foo/", "https://foo/", "foo", 443, "/", "/", "", true),
            ("http://foo:81/x/y", "http://foo:81/x/y", "foo", 81, "/x/y", "/x/y", "", false),
            ("https://x.y:444/z?x=y", "https://x.y:444/z?x=y", "x.y", 444, "/z?x=y", "/z", "x=y", true),
            ("https://x.y/z#frag", "https://x.y/z", "x.y", 443, "/z", "/z", "", true),
        ];

        for (input, url, host, port, request_uri, path, qs, secure) in cases {
            let original = Request::default()
                .with_port(999)
                .with_secure(true)
                .with_request_uri("/path?a=b");

            let request = original.clone().with_url(input).unwrap();

            assert_eq!(original.port(), 999);
            assert!(original.is_secure());
            assert_eq!(original.request_uri(), "/path?a=b");

            assert_eq!(request.url(), url, "{input}");
            assert_eq!(request.host(), host, "{input}");
            assert_eq!(request.port(), port, "{input}");
            assert_eq!(request.request_uri(), request_uri, "{input}");
            assert_eq!(request.path(), path, "{input}");
            assert_eq!(request.query_string(), qs, "{input}");
            assert_eq!(request.is_secure(), secure, "{input}");
            assert_uri_invariant(&request);
        }

        let request = Request::default().with_url("https://x.y:444/z?x=y").unwrap();
        assert_eq!(request.query(), &params([("x", "y")]));
        assert_eq!(request.header("Host"), "x.y:444");

        let request = Request::default().with_url("https://x.y:443/").unwrap();
        assert_eq!(request.header("Host"), "x.y");
    }

    #[test]
    fn url_errors() {
        let cases = ["/relative", "ftp://example.com", "http://", "http:example.com"];
        for url in cases {
            assert!(Request::default().with_url(url).is_err(), "{url}");
        }
    }

    #[test]
    fn url_base() {
        let cases = [
            ("http://example.com", "http://example.com"),
            ("http://example.com/", "http://example.com"),
            ("https://example.com", "https://example.com"),
            ("https://example.com/", "https://example.com"),
            ("http://example.com/foo/bar", "http://example.com"),
            ("https://example.com/foo/bar?x=y", "https://example.com"),
            ("https://example.com:80/", "https://example.com:80"),
        ];

        for (url, base) in cases {
            assert_eq!(Request::default().with_url(url).unwrap().url_base(), base);
        }
    }

    #[test]
    fn referer() {
        let request = Request::default().with_header(
            "Referer",
            ["https://example.com/path?query=string", "http://other/"],
        );
        assert_eq!(
            request.referer().map(|url| url.to_string()),
            Some("https://example.com/path?query=string".to_owned())
        );

        assert!(Request::default().referer().is_none());
        assert!(Request::default().with_header("Referer", "foo").referer().is_none());
    }

    #[test]
    fn first_last_header() {
        let request = Request::default().with_header(
            "Referer",
            ["http://example.com/1", "http://example.com/2", "http://example.com/3"],
        );

        assert_eq!(request.first_header("Referer"), Some("http://example.com/1"));
        assert_eq!(request.last_header("Referer"), Some("http://example.com/3"));
        assert_eq!(Request::default().first_header("Referer"), None);
        assert_eq!(Request::default().last_header("Referer"), None);
    }

    #[test]
    fn negotiation() {
        let request = Request::default()
            .with_header("Accept", "text/html, application/xml;q=0.9, */*;q=0.8")
            .with_header("Accept-Language", "fr-ch, fr;q=0.9, en;q=0.8")
            .with_header("Accept-Charset", "utf-8, iso-8859-1;q=0.5")
            .with_header("Accept-Encoding", "gzip;q=1.0, identity; q=0.5, *;q=0");

        assert_eq!(request.accept().keys().collect::<Vec<_>>(), ["text/html", "application/xml", "*/*"]);
        assert_eq!(request.accept_language()["fr"], 0.9);
        assert_eq!(request.accept_charset()["iso-8859-1"], 0.5);
        assert_eq!(request.accept_encoding().keys().collect::<Vec<_>>(), ["gzip", "identity", "*"]);

        assert!(Request::default().accept().is_empty());
    }

    #[test]
    fn misc() {
        let request = Request::default().with_client_ip("4.3.2.1");
        assert_eq!(request.client_ip(), "4.3.2.1");

        assert!(!request.is_ajax());
        let request = request.with_header("X-Requested-With", "XMLHttpRequest");
        assert!(request.is_ajax());

        let request = request.with_attribute("user", 42).with_attribute("role", "admin");
        assert_eq!(request.attribute("user"), Some(&Value::from("42")));
        assert_eq!(request.attributes().len(), 2);

        let request = request.without_attribute("user");
        assert_eq!(request.attribute("user"), None);
        assert_eq!(request.attributes().len(), 1);
    }
}
