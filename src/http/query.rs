//! `application/x-www-form-urlencoded` decoding into nested parameter trees.

use crate::http::value::{Params, Value};
use tracing::debug;
use url::form_urlencoded;

/// Form-encoded query and body codec.
///
/// Bracketed names build nested trees: `a[]` appends to a list, `a[k]` nests
/// into a map, and any number of subscripts may follow each other. In a base
/// name, `.` and space become `_`; an unmatched first `[` becomes `_` too.
///
/// # Examples
/// ```rust
/// use http_value::{query::Query, Value};
///
/// let params = Query::parse("name=john&tags[]=a&tags[]=b&user[address][city]=Paris");
///
/// assert_eq!(params["name"], Value::from("john"));
/// assert_eq!(params["tags"], Value::from(["a", "b"]));
/// assert_eq!(
///     params["user"].get("address").and_then(|a| a.get("city")),
///     Some(&Value::from("Paris"))
/// );
///
/// assert_eq!(Query::build(&params), "name=john&tags%5B0%5D=a&tags%5B1%5D=b&user%5Baddress%5D%5Bcity%5D=Paris");
/// ```
/// All possible formats:
/// ```rust
/// use http_value::{query::Query, Value};
///
/// let params = Query::parse("?debug&name=&=Qwe&my.key=a+b%21&&");
///
/// assert_eq!(params.len(), 3);
/// assert_eq!(params["debug"], Value::from(""));
/// assert_eq!(params["name"], Value::from(""));
/// assert_eq!(params["my_key"], Value::from("a b!"));
/// ```
pub struct Query;

impl Query {
    /// Decodes a query string, with or without the leading `?`.
    ///
    /// Pairs with an empty name are skipped, a name without `=` gets an empty
    /// value, and a repeated scalar name keeps the last value.
    pub fn parse(query: &str) -> Params {
        let data = query.strip_prefix('?').unwrap_or(query);
        let mut result = Params::new();

        for (key, value) in form_urlencoded::parse(data.as_bytes()) {
            let Some((base, subscripts)) = split_key(&key) else {
                debug!(key = %key, "skipping form pair without a name");
                continue;
            };

            let slot = result.entry(base).or_insert_with(|| Value::Str(String::new()));
            assign(slot, &subscripts, value.into_owned());
        }

        result
    }

    /// Encodes a tree as `key=value` pairs joined by `&`.
    ///
    /// Nested names are written as `prefix[key]` and list items as
    /// `prefix[index]`; empty containers and file leaves produce nothing.
    pub fn build(params: &Params) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, value) in params {
            encode(&mut serializer, key.clone(), value);
        }
        serializer.finish()
    }

    /// Decodes and re-encodes, so every scalar ends up as a string exactly as
    /// it would arrive over the wire.
    pub fn normalize(params: &Params) -> (String, Params) {
        let encoded = Self::build(params);
        let decoded = Self::parse(&encoded);
        (encoded, decoded)
    }
}

/// Splits `base[a][]` into `("base", [Some("a"), None])`.
fn split_key(key: &str) -> Option<(String, Vec<Option<&str>>)> {
    let key = key.trim_start_matches(' ');
    let mut subscripts = Vec::new();

    let base = match key.find('[') {
        Some(open) if key[open..].contains(']') => {
            let mut rest = &key[open..];
            while let Some(inner) = rest.strip_prefix('[') {
                let Some(close) = inner.find(']') else { break };
                subscripts.push(match &inner[..close] {
                    "" => None,
                    name => Some(name),
                });
                rest = &inner[close + 1..];
            }
            clean_base(&key[..open])
        }
        Some(open) => format!("{}_{}", clean_base(&key[..open]), &key[open + 1..]),
        None => clean_base(key),
    };

    if base.is_empty() {
        return None;
    }
    Some((base, subscripts))
}

#[inline]
fn clean_base(base: &str) -> String {
    base.replace(['.', ' '], "_")
}

fn assign(slot: &mut Value, subscripts: &[Option<&str>], value: String) {
    let Some((subscript, rest)) = subscripts.split_first() else {
        *slot = Value::Str(value);
        return;
    };

    if !slot.is_container() {
        *slot = match subscript {
            None => Value::List(Vec::new()),
            Some(_) => Value::Map(Params::new()),
        };
    }

    // A named key turns a list into a map keyed by position
    if subscript.is_some() {
        if let Value::List(values) = slot {
            let map = std::mem::take(values)
                .into_iter()
                .enumerate()
                .map(|(i, v)| (i.to_string(), v))
                .collect();
            *slot = Value::Map(map);
        }
    }

    let child = match (slot, subscript) {
        (Value::List(values), _) => {
            values.push(Value::Str(String::new()));
            values.last_mut()
        }
        (Value::Map(map), None) => {
            let key = next_index(map).to_string();
            Some(map.entry(key).or_insert_with(|| Value::Str(String::new())))
        }
        (Value::Map(map), Some(key)) => Some(
            map.entry((*key).to_owned())
                .or_insert_with(|| Value::Str(String::new())),
        ),
        _ => None,
    };

    if let Some(child) = child {
        assign(child, rest, value);
    }
}

/// One past the largest non-negative integer key, or 0.
fn next_index(map: &Params) -> u64 {
    map.keys()
        .filter_map(|key| key.parse::<u64>().ok())
        .max()
        .map_or(0, |max| max + 1)
}

fn encode(serializer: &mut form_urlencoded::Serializer<'_, String>, name: String, value: &Value) {
    match value {
        Value::Str(value) => {
            serializer.append_pair(&name, value);
        }
        Value::List(values) => {
            for (i, value) in values.iter().enumerate() {
                encode(serializer, format!("{name}[{i}]"), value);
            }
        }
        Value::Map(map) => {
            for (key, value) in map {
                encode(serializer, format!("{name}[{key}]"), value);
            }
        }
        Value::File(_) => {}
    }
}
