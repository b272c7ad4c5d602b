//! Paths and absolute http(s) URLs.

use crate::{errors::Error, http::types::{parse_digits, Scheme}};
use std::{fmt, str::FromStr};

// PATH

/// A URL path such as `/api/users/123`.
///
/// # Components
///
/// - **Path**: the string itself (e.g., `/api/users/123/`)
/// - **Parts**: segments between `/`, empty ones dropped (e.g., `["api", "users", "123"]`)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Path(String);

impl Path {
    #[inline]
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the non-empty segments of the path.
    ///
    /// # Examples
    ///
    /// - `/api/users/123`: `["api", "users", "123"]`
    /// - `//foo//bar//`: `["foo", "bar"]`
    /// - `/`: `[]`
    #[inline]
    pub fn parts(&self) -> Vec<&str> {
        self.0.split('/').filter(|part| !part.is_empty()).collect()
    }

    /// Checks if the segments equal `pattern` exactly.
    ///
    /// # Examples
    ///
    /// For path `/api/users/123`:
    /// - pattern `&["api", "users", "123"]`: `true`
    /// - pattern `&["api", "users"]`: `false`
    #[inline]
    pub fn matches(&self, pattern: &[&str]) -> bool {
        self.parts() == pattern
    }

    /// Substring test on the raw path.
    #[inline]
    pub fn contains(&self, text: &str) -> bool {
        self.0.contains(text)
    }

    /// Prefix test on the raw path.
    ///
    /// # Examples
    ///
    /// For path `/api/users/123`:
    /// - `/api`: `true`
    /// - `/api/users/123`: `true`
    /// - `api`: `false`
    #[inline]
    pub fn starts_with(&self, text: &str) -> bool {
        self.0.starts_with(text)
    }

    /// Suffix test on the raw path.
    ///
    /// # Examples
    ///
    /// For path `/files/report.pdf`:
    /// - `.pdf`: `true`
    /// - `report`: `false`
    #[inline]
    pub fn ends_with(&self, text: &str) -> bool {
        self.0.ends_with(text)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Path {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for Path {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Path {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl Default for Path {
    fn default() -> Self {
        Self::new("/")
    }
}

// URL

/// A normalized absolute http or https URL.
///
/// Scheme and host are lowercased, a missing port becomes the scheme's
/// standard port and a missing path becomes `/`. The canonical string is
/// built once at construction: it omits a standard port, and omits `?` and
/// `#` when the query or fragment is empty.
///
/// # Examples
/// ```
/// use http_value::Url;
///
/// let url: Url = "HTTPS://Example.COM:443/a/b?x=1#top".parse().unwrap();
///
/// assert_eq!(url.host(), "example.com");
/// assert_eq!(url.port(), 443);
/// assert!(url.is_secure());
/// assert_eq!(url.path().parts(), ["a", "b"]);
/// assert_eq!(url.query(), "x=1");
/// assert_eq!(url.fragment(), "top");
/// assert_eq!(url.as_str(), "https://example.com/a/b?x=1#top");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Url {
    scheme: Scheme,
    host: String,
    port: u16,
    explicit_port: bool,
    path: Path,
    query: String,
    fragment: String,
    url: String,
}

impl Url {
    /// Parses an absolute URL.
    ///
    /// # Errors
    ///
    /// Checked in this order:
    /// - [`Error::MalformedUrl`]: the string is not a URL (empty authority,
    ///   bad port, user info or IPv6 literal);
    /// - [`Error::MissingScheme`];
    /// - [`Error::MissingHost`]: e.g. `http:example.com`;
    /// - [`Error::UnsupportedScheme`]: anything but http/https.
    pub fn parse(input: &str) -> Result<Self, Error> {
        let parts = UrlParts::split(input)?;

        let scheme_name = parts.scheme.ok_or(Error::MissingScheme)?;
        let host = parts.host.ok_or(Error::MissingHost)?.to_ascii_lowercase();
        let scheme = Scheme::parse(scheme_name)
            .ok_or_else(|| Error::UnsupportedScheme(scheme_name.to_ascii_lowercase()))?;

        let port = parts.port.unwrap_or(scheme.standard_port());
        let path = match parts.path {
            "" => Path::new("/"),
            path => Path::new(path),
        };
        let query = parts.query.unwrap_or_default().to_owned();
        let fragment = parts.fragment.unwrap_or_default().to_owned();

        let mut url = format!("{scheme}://{host}");
        if port != scheme.standard_port() {
            url.push(':');
            url.push_str(&port.to_string());
        }
        url.push_str(path.as_str());
        if !query.is_empty() {
            url.push('?');
            url.push_str(&query);
        }
        if !fragment.is_empty() {
            url.push('#');
            url.push_str(&fragment);
        }

        Ok(Self {
            scheme,
            host,
            port,
            explicit_port: parts.port.is_some(),
            path,
            query,
            fragment,
            url,
        })
    }

    #[inline]
    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    #[inline]
    pub fn host(&self) -> &str {
        &self.host
    }

    #[inline]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Whether the port was written in the URL rather than defaulted.
    #[inline]
    pub fn has_explicit_port(&self) -> bool {
        self.explicit_port
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Query string without the leading `?`.
    #[inline]
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Fragment without the leading `#`.
    #[inline]
    pub fn fragment(&self) -> &str {
        &self.fragment
    }

    #[inline]
    pub fn is_secure(&self) -> bool {
        self.scheme.is_secure()
    }

    #[inline]
    pub fn is_standard_port(&self) -> bool {
        self.port == self.scheme.standard_port()
    }

    /// Compares the host, ignoring case.
    ///
    /// With `include_sub_domains`, any host whose trailing labels equal those
    /// of `host` matches as well.
    ///
    /// # Examples
    ///
    /// For host `en.example.com`, with subdomains included:
    /// - `example.com`: `true`
    /// - `EXAMPLE.com`: `true`
    /// - `xample.com`: `false`
    ///
    /// For host `anexample.com`, with subdomains included:
    /// - `example.com`: `false`
    #[inline]
    pub fn is_host(&self, host: &str, include_sub_domains: bool) -> bool {
        host_matches(&self.host, host, include_sub_domains)
    }

    /// The canonical string form.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.url
    }
}

/// Case-insensitive host comparison; with `include_sub_domains` the labels
/// of `host` only have to end with those of `target`.
pub(crate) fn host_matches(host: &str, target: &str, include_sub_domains: bool) -> bool {
    let host = host.to_ascii_lowercase();
    let target = target.to_ascii_lowercase();
    if !include_sub_domains {
        return host == target;
    }

    let ours: Vec<&str> = host.split('.').collect();
    let theirs: Vec<&str> = target.split('.').collect();
    ours.ends_with(&theirs)
}

impl FromStr for Url {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Url {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

/// Raw components of a URL before validation.
#[derive(Debug, Default, PartialEq)]
pub(crate) struct UrlParts<'a> {
    pub(crate) scheme: Option<&'a str>,
    pub(crate) host: Option<&'a str>,
    pub(crate) port: Option<u16>,
    pub(crate) path: &'a str,
    pub(crate) query: Option<&'a str>,
    pub(crate) fragment: Option<&'a str>,
}

impl<'a> UrlParts<'a> {
    /// Splits `scheme://host:port/path?query#fragment`.
    ///
    /// Only the authority is validated; a string without a scheme is not an
    /// error here.
    pub(crate) fn split(input: &'a str) -> Result<Self, Error> {
        let mut parts = UrlParts::default();
        let mut rest = input;

        if let Some((scheme, after)) = rest.split_once(':') {
            if is_scheme(scheme) {
                parts.scheme = Some(scheme);
                rest = after;
            }
        }

        if let Some((before, fragment)) = rest.split_once('#') {
            parts.fragment = Some(fragment);
            rest = before;
        }
        if let Some((before, query)) = rest.split_once('?') {
            parts.query = Some(query);
            rest = before;
        }

        if let Some(authority) = rest.strip_prefix("//") {
            let end = authority.find('/').unwrap_or(authority.len());
            let (host, port) = split_authority(&authority[..end])?;

            parts.host = Some(host);
            parts.port = port;
            rest = &authority[end..];
        }

        parts.path = rest;
        Ok(parts)
    }
}

#[inline]
fn is_scheme(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

fn split_authority(authority: &str) -> Result<(&str, Option<u16>), Error> {
    if authority.is_empty() || authority.contains(['@', '[', ']']) {
        return Err(Error::MalformedUrl);
    }

    let (host, port) = match authority.rsplit_once(':') {
        Some((host, "")) => (host, None),
        Some((host, port)) => {
            let port = parse_digits(port)
                .and_then(|port| u16::try_from(port).ok())
                .ok_or(Error::MalformedUrl)?;
            (host, Some(port))
        }
        None => (authority, None),
    };

    if host.is_empty() {
        return Err(Error::MalformedUrl);
    }

    Ok((host, port))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_parts() {
        let cases: [(&str, &[&str]); 6] = [
            ("", &[]),
            ("/", &[]),
            ("/foo", &["foo"]),
            ("/foo/bar/", &["foo", "bar"]),
            ("//foo//bar//", &["foo", "bar"]),
            ("/a/0/b", &["a", "0", "b"]),
        ];

        for (path, parts) in cases {
            assert_eq!(Path::new(path).parts(), parts, "{path}");
        }

        assert!(Path::new("/api/users/1").matches(&["api", "users", "1"]));
        assert!(!Path::new("/api/users/1").matches(&["api", "users"]));
    }

    #[test]
    fn path_predicates() {
        let path = Path::new("/foo/bar.html");

        assert!(path.contains("bar"));
        assert!(!path.contains("baz"));
        assert!(path.starts_with("/foo"));
        assert!(!path.starts_with("foo"));
        assert!(path.ends_with(".html"));
        assert!(!path.ends_with(".htm"));
        assert_eq!(path.to_string(), "/foo/bar.html");
    }

    #[test]
    fn valid() {
        let cases = [
            ("http://example.com", "http", "example.com", 80, "/", "", "", "http://example.com/"),
            ("https://example.com/test?", "https", "example.com", 443, "/test", "", "", "https://example.com/test"),
            ("http://test.example.com:443/#", "http", "test.example.com", 443, "/", "", "", "http://test.example.com:443/"),
            ("https://test.example.com:443/#test", "https", "test.example.com", 443, "/", "", "test", "https://test.example.com/#test"),
            ("https://example.com:80/a?b#c", "https", "example.com", 80, "/a", "b", "c", "https://example.com:80/a?b#c"),
            ("HTTP://EXAMPLE.COM:8080/Path?Query#Frag", "http", "example.com", 8080, "/Path", "Query", "Frag", "http://example.com:8080/Path?Query#Frag"),
            ("http://example.com:/x", "http", "example.com", 80, "/x", "", "", "http://example.com/x"),
            ("http://example.com?a=1", "http", "example.com", 80, "/", "a=1", "", "http://example.com/?a=1"),
        ];

        for (input, scheme, host, port, path, query, fragment, rendered) in cases {
            let url = Url::parse(input).unwrap();

            assert_eq!(url.scheme().as_str(), scheme, "{input}");
            assert_eq!(url.host(), host, "{input}");
            assert_eq!(url.port(), port, "{input}");
            assert_eq!(url.path().as_str(), path, "{input}");
            assert_eq!(url.query(), query, "{input}");
            assert_eq!(url.fragment(), fragment, "{input}");
            assert_eq!(url.as_str(), rendered, "{input}");
            assert_eq!(url.is_secure(), scheme == "https", "{input}");

            // Rendering is idempotent
            assert_eq!(Url::parse(url.as_str()).unwrap().as_str(), rendered, "{input}");
        }
    }

    #[test]
    fn invalid() {
        let cases = [
            ("", "URL must contain a scheme, http or https."),
            ("example.com", "URL must contain a scheme, http or https."),
            ("//example.com/", "URL must contain a scheme, http or https."),
            ("invalid_protocol://invalid_url", "URL must contain a scheme, http or https."),
            ("http://", "URL is malformed."),
            ("https:///path", "URL is malformed."),
            ("http:////invalid_url", "URL is malformed."),
            ("http://host:port", "URL is malformed."),
            ("http://host:65536", "URL is malformed."),
            ("http://user@host/", "URL is malformed."),
            ("http://[::1]/", "URL is malformed."),
            ("http:sub.site.org", "URL must contain a host name."),
            ("ftp://example.com/", "URL scheme must be http or https, got \"ftp\"."),
        ];

        for (input, message) in cases {
            assert_eq!(Url::parse(input).unwrap_err().to_string(), message, "{input}");
        }
    }

    #[test]
    fn standard_port() {
        let cases = [
            ("http://example.com", true),
            ("http://example.com:80", true),
            ("http://example.com:443", false),
            ("https://example.com", true),
            ("https://example.com:443", true),
            ("https://example.com:80", false),
        ];

        for (input, expected) in cases {
            assert_eq!(Url::parse(input).unwrap().is_standard_port(), expected, "{input}");
        }

        assert!(Url::parse("http://a:80").unwrap().has_explicit_port());
        assert!(!Url::parse("http://a").unwrap().has_explicit_port());
    }

    #[test]
    fn is_host() {
        let cases = [
            ("example.com", "example.com", false, true),
            ("example.com", "EXAMPLE.COM", false, true),
            ("en.example.com", "example.com", false, false),
            ("en.example.com", "example.com", true, true),
            ("en.example.com", "Example.Com", true, true),
            ("en.example.com", "en.example.com", true, true),
            ("anexample.com", "example.com", true, false),
            ("example.com", "en.example.com", true, false),
            ("example.com", "com", true, true),
        ];

        for (url_host, host, sub_domains, expected) in cases {
            let url = Url::parse(&format!("http://{url_host}/")).unwrap();
            assert_eq!(url.is_host(host, sub_domains), expected, "{url_host} {host}");
        }
    }

    #[test]
    fn split() {
        let parts = UrlParts::split("mailto:someone").unwrap();
        assert_eq!(parts.scheme, Some("mailto"));
        assert_eq!(parts.host, None);
        assert_eq!(parts.path, "someone");

        let parts = UrlParts::split("/just/a/path?q").unwrap();
        assert_eq!(parts.scheme, None);
        assert_eq!(parts.path, "/just/a/path");
        assert_eq!(parts.query, Some("q"));
    }
}
