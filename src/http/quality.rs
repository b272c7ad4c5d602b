//! Content negotiation headers with `q` weights (RFC 7231, section 5.3.1).

use indexmap::IndexMap;
use tracing::debug;

/// Parameters of one header item, keyed as written (`charset`, `q`, ...).
pub type HeaderParameters = IndexMap<String, String>;

/// Splits a header like `text/html; charset=utf8, text/xml` into items and
/// their parameters.
///
/// Items are trimmed and blank ones skipped. A parameter is `key=value` with
/// the leading whitespace of the key and trailing whitespace of the value
/// removed; anything else is ignored. A repeated item keeps its first
/// position and its last parameters.
///
/// # Examples
/// ```
/// use http_value::quality::parse_header_parameters;
///
/// let items = parse_header_parameters("text/html; charset=utf8, text/xml");
///
/// assert_eq!(items["text/html"]["charset"], "utf8");
/// assert!(items["text/xml"].is_empty());
/// ```
pub fn parse_header_parameters(header: &str) -> IndexMap<String, HeaderParameters> {
    let mut result = IndexMap::new();

    for entry in header.split(',') {
        let mut parts = entry.split(';');
        let item = parts.next().unwrap_or_default().trim();
        if item.is_empty() {
            continue;
        }

        let parameters = parts
            .filter_map(|part| {
                let (key, value) = part.trim_start().split_once('=')?;
                match key.is_empty() {
                    true => None,
                    false => Some((key.to_owned(), value.trim_end().to_owned())),
                }
            })
            .collect();

        result.insert(item.to_owned(), parameters);
    }

    result
}

/// Parses a quality-weighted header into items ordered by preference.
///
/// Items sort by descending quality, ties keep their declaration order. A
/// missing `q` means 1, and of several `q`/`Q` parameters the last one
/// counts. An item whose `q` does not match
/// `0[.]ddd` or `1[.]000` is dropped.
///
/// # Examples
/// ```
/// use http_value::quality::parse_quality_values;
///
/// let accept = parse_quality_values("text/*;q=0.5, text/html, */*;q=0.1, text/plain;q=2");
///
/// assert_eq!(accept.keys().collect::<Vec<_>>(), ["text/html", "text/*", "*/*"]);
/// assert_eq!(accept["text/*"], 0.5);
/// ```
pub fn parse_quality_values(header: &str) -> IndexMap<String, f64> {
    let items = parse_header_parameters(header);

    let count = items.len() as i64;
    let mut position = count - 1;
    let mut weighted = Vec::with_capacity(items.len());

    for (item, parameters) in items {
        let q = parameters
            .iter()
            .rev()
            .find(|(key, _)| key.eq_ignore_ascii_case("q"))
            .map(|(_, value)| value.as_str());

        let quality = match q {
            None => 1.0,
            Some(q) => match is_quality(q).then(|| q.parse::<f64>().ok()).flatten() {
                Some(quality) => quality,
                None => {
                    debug!(item = %item, q, "dropping item with an invalid quality value");
                    continue;
                }
            },
        };

        let weight = position + count * (quality * 1000.0) as i64;
        weighted.push((item, quality, weight));
        position -= 1;
    }

    weighted.sort_by(|a, b| b.2.cmp(&a.2));
    weighted
        .into_iter()
        .map(|(item, quality, _)| (item, quality))
        .collect()
}

/// Matches `^(0\.?\d{0,3}|1\.?0{0,3})$`.
fn is_quality(q: &str) -> bool {
    let bytes = q.as_bytes();
    let (allowed, rest): (fn(&u8) -> bool, &[u8]) = match bytes.split_first() {
        Some((b'0', rest)) => (u8::is_ascii_digit, rest),
        Some((b'1', rest)) => (|b| *b == b'0', rest),
        _ => return false,
    };

    let digits = rest.strip_prefix(b".").unwrap_or(rest);
    digits.len() <= 3 && digits.iter().all(allowed)
}
