//! `Set-Cookie` values.

use crate::errors::Error;
use chrono::{DateTime, NaiveDateTime, Utc};
use memchr::memchr_iter;
use std::fmt;
use tracing::debug;

/// A single cookie with its attributes.
///
/// `expires` is a Unix timestamp; `0` marks a session cookie. A cookie
/// without a domain is host-only.
///
/// # Examples
/// ```
/// use http_value::Cookie;
///
/// let cookie = Cookie::parse("sid=a%20b; Path=/; Domain=.Example.com; Secure; HttpOnly").unwrap();
///
/// assert_eq!(cookie.value(), "a b");
/// assert_eq!(cookie.domain(), Some("example.com"));
/// assert!(cookie.is_secure() && cookie.is_http_only());
/// assert_eq!(cookie.to_string(), "sid=a%20b; Domain=example.com; Path=/; Secure; HttpOnly");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Cookie {
    name: String,
    value: String,
    expires: i64,
    path: Option<String>,
    domain: Option<String>,
    secure: bool,
    http_only: bool,
}

impl Cookie {
    /// A session cookie with no attributes. Any strings are accepted here;
    /// only [`Cookie::parse`] insists on a non-empty name and value.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            expires: 0,
            path: None,
            domain: None,
            secure: false,
            http_only: false,
        }
    }

    /// Parses the value of a `Set-Cookie` header.
    ///
    /// Attribute names are matched case-insensitively, the name and value are
    /// taken as-is apart from percent-decoding the value. A decoded value that
    /// is not UTF-8 gets `U+FFFD` in place of the bad bytes, so `a=%FF` renders
    /// back as `a=%EF%BF%BD`. A single leading `.` is dropped from `Domain`.
    /// An `Expires` date that cannot be read leaves the cookie a session
    /// cookie. Unknown attributes are skipped.
    ///
    /// # Errors
    /// [`Error::InvalidCookie`] if the first part is not `name=value` with both
    /// sides non-empty.
    pub fn parse(line: &str) -> Result<Self, Error> {
        let mut parts = split_parts(line);

        let (name, value) = parts
            .next()
            .and_then(|pair| pair.split_once('='))
            .ok_or(Error::InvalidCookie)?;

        if name.is_empty() || value.is_empty() {
            return Err(Error::InvalidCookie);
        }

        let value = urlencoding::decode_binary(value.as_bytes());
        let mut cookie = Cookie::new(name, String::from_utf8_lossy(&value));

        for part in parts {
            if part.eq_ignore_ascii_case("secure") {
                cookie.secure = true;
            } else if part.eq_ignore_ascii_case("httponly") {
                cookie.http_only = true;
            } else if let Some((key, value)) = part.split_once('=') {
                if key.eq_ignore_ascii_case("expires") {
                    match parse_date(value) {
                        Some(time) => cookie.expires = time,
                        None => debug!(value = %value, "ignoring unreadable cookie expiry date"),
                    }
                } else if key.eq_ignore_ascii_case("path") {
                    cookie.path = Some(value.to_owned());
                } else if key.eq_ignore_ascii_case("domain") {
                    cookie.domain = Some(value.strip_prefix('.').unwrap_or(value).to_ascii_lowercase());
                }
            }
        }

        Ok(cookie)
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Unix timestamp, `0` for a session cookie.
    #[inline]
    pub fn expires(&self) -> i64 {
        self.expires
    }

    #[inline]
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    #[inline]
    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    #[inline]
    pub fn is_secure(&self) -> bool {
        self.secure
    }

    #[inline]
    pub fn is_http_only(&self) -> bool {
        self.http_only
    }

    #[inline]
    pub fn with_expires(mut self, expires: i64) -> Self {
        self.expires = expires;
        self
    }

    #[inline]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    #[inline]
    pub fn without_path(mut self) -> Self {
        self.path = None;
        self
    }

    #[inline]
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    #[inline]
    pub fn without_domain(mut self) -> Self {
        self.domain = None;
        self
    }

    #[inline]
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    #[inline]
    pub fn with_http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    /// `true` once a persistent cookie's expiry is in the past.
    #[inline]
    pub fn is_expired(&self) -> bool {
        self.expires != 0 && self.expires < Utc::now().timestamp()
    }

    #[inline]
    pub fn is_persistent(&self) -> bool {
        self.expires != 0
    }

    #[inline]
    pub fn is_host_only(&self) -> bool {
        self.domain.is_none()
    }
}

impl fmt::Display for Cookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, urlencoding::encode(&self.value))?;

        if self.expires != 0 {
            match DateTime::from_timestamp(self.expires, 0) {
                Some(date) => write!(f, "; Expires={}", date.to_rfc2822())?,
                None => debug!(expires = self.expires, "cookie expiry out of range"),
            }
        }
        if let Some(domain) = &self.domain {
            write!(f, "; Domain={domain}")?;
        }
        if let Some(path) = &self.path {
            write!(f, "; Path={path}")?;
        }
        if self.secure {
            f.write_str("; Secure")?;
        }
        if self.http_only {
            f.write_str("; HttpOnly")?;
        }

        Ok(())
    }
}

/// Splits on `;` and strips the whitespace that follows each separator.
fn split_parts(line: &str) -> impl Iterator<Item = &str> {
    let mut start = 0;
    let mut ends = memchr_iter(b';', line.as_bytes()).chain(std::iter::once(line.len()));

    std::iter::from_fn(move || {
        let end = ends.next()?;
        let part = &line[start..end];
        start = (end + 1).min(line.len());
        Some(part)
    })
    .enumerate()
    .map(|(i, part)| match i {
        0 => part,
        _ => part.trim_start_matches(|c: char| c.is_ascii_whitespace()),
    })
}

const DATE_FORMATS: [&str; 5] = [
    "%a, %d %b %Y %H:%M:%S",  // RFC 1123
    "%A, %d-%b-%y %H:%M:%S",  // RFC 850
    "%a, %d-%b-%Y %H:%M:%S",  // Netscape
    "%a %b %e %H:%M:%S %Y",   // asctime
    "%d %b %Y %H:%M:%S",      // Without weekday
];

/// Reads the date forms found in `Expires` attributes, as a Unix timestamp.
///
/// Month and day names match case-insensitively. A trailing `GMT`/`UTC`
/// zone is accepted, as is any RFC 2822 or RFC 3339 date with an offset.
fn parse_date(value: &str) -> Option<i64> {
    let value = value.trim();

    if let Ok(date) = DateTime::parse_from_rfc2822(value) {
        return Some(date.timestamp());
    }
    if let Ok(date) = DateTime::parse_from_rfc3339(value) {
        return Some(date.timestamp());
    }

    let naive = strip_zone(value);
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(naive, format).ok())
        .map(|date| date.and_utc().timestamp())
}

fn strip_zone(value: &str) -> &str {
    for zone in ["GMT", "UTC", "UT", "Z"] {
        if value.len() > zone.len() {
            let (head, tail) = value.split_at(value.len() - zone.len());
            if tail.eq_ignore_ascii_case(zone) {
                return head.trim_end();
            }
        }
    }
    value
}
