//! Nested parameter trees for query, post, cookie and file data.

use crate::http::upload::UploadedFile;
use indexmap::IndexMap;

/// An ordered map of parameter names to values.
pub type Params = IndexMap<String, Value>;

/// One node of a parameter tree.
///
/// Decoded form data only ever holds [`Value::Str`], [`Value::List`] and
/// [`Value::Map`]; [`Value::File`] appears in upload trees.
///
/// # Examples
/// ```
/// use http_value::{params, Value};
///
/// let tree = params([("a", Value::from(params([("b", params([("c", "y")]))])))]);
///
/// assert_eq!(http_value::resolve(&tree, "a.b.c").and_then(Value::as_str), Some("y"));
/// assert_eq!(http_value::resolve(&tree, "a[b][c]").and_then(Value::as_str), Some("y"));
/// assert_eq!(http_value::resolve(&tree, "a.b.c.d"), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Str(String),
    List(Vec<Value>),
    Map(Params),
    File(UploadedFile),
}

impl Value {
    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(value) => Some(value),
            _ => None,
        }
    }

    #[inline]
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(values) => Some(values),
            _ => None,
        }
    }

    #[inline]
    pub fn as_map(&self) -> Option<&Params> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    #[inline]
    pub fn as_file(&self) -> Option<&UploadedFile> {
        match self {
            Self::File(file) => Some(file),
            _ => None,
        }
    }

    /// Whether the value is a list or a map.
    #[inline]
    pub fn is_container(&self) -> bool {
        matches!(self, Self::List(_) | Self::Map(_))
    }

    /// Indexes one level down: maps by key, lists by decimal position.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Self::Map(map) => map.get(key),
            Self::List(values) => key.parse::<usize>().ok().and_then(|i| values.get(i)),
            _ => None,
        }
    }

    /// Children of a container as `(key, value)` pairs; list keys are positions.
    pub fn entries(&self) -> Vec<(String, &Value)> {
        match self {
            Self::Map(map) => map.iter().map(|(k, v)| (k.clone(), v)).collect(),
            Self::List(values) => values
                .iter()
                .enumerate()
                .map(|(i, v)| (i.to_string(), v))
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Builds a [`Params`] map from pairs.
pub fn params<I, K, V>(entries: I) -> Params
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    entries
        .into_iter()
        .map(|(key, value)| (key.into(), value.into()))
        .collect()
}

/// Follows a dotted or bracketed path such as `a.b.c` or `a[b][c]`.
///
/// Each `[x]` is rewritten to `.x` (up to the first `]`), then the path is
/// split on `.`. Returns `None` as soon as a segment is missing or the
/// current value cannot be indexed.
pub fn resolve<'a>(params: &'a Params, path: &str) -> Option<&'a Value> {
    let path = brackets_to_dots(path);
    let mut segments = path.split('.');

    let first = segments.next()?;
    let mut value = params.get(first)?;
    for segment in segments {
        value = value.get(segment)?;
    }

    Some(value)
}

fn brackets_to_dots(path: &str) -> String {
    let mut result = String::with_capacity(path.len());
    let mut rest = path;

    while let Some(open) = rest.find('[') {
        let after = &rest[open + 1..];
        match after.find(']') {
            Some(close) => {
                result.push_str(&rest[..open]);
                result.push('.');
                result.push_str(&after[..close]);
                rest = &after[close + 1..];
            }
            None => break,
        }
    }

    result.push_str(rest);
    result
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}
impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}
impl From<&String> for Value {
    fn from(value: &String) -> Self {
        Self::Str(value.clone())
    }
}
impl From<Params> for Value {
    fn from(value: Params) -> Self {
        Self::Map(value)
    }
}
impl From<UploadedFile> for Value {
    fn from(value: UploadedFile) -> Self {
        Self::File(value)
    }
}
impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}
impl<T: Into<Value>, const N: usize> From<[T; N]> for Value {
    fn from(values: [T; N]) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

macro_rules! impl_from_number {
    ($($t:ty),*) => {
        $(impl From<$t> for Value {
            #[inline] fn from(value: $t) -> Self {
                Self::Str(value.to_string())
            }
        })*
    };
}

impl_from_number!(u8, u16, u32, u64, usize, i8, i16, i32, i64, isize);

impl From<bool> for Value {
    #[inline]
    fn from(value: bool) -> Self {
        Self::Str(if value { "1" } else { "0" }.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::upload::UploadStatus;

    fn tree() -> Params {
        params([
            ("a", Value::from(params([("b", params([("c", "y")]))]))),
            ("list", Value::from(["x", "z"])),
            ("s", Value::from("plain")),
        ])
    }

    #[test]
    fn brackets() {
        let cases = [
            ("a", "a"),
            ("a[b]", "a.b"),
            ("a[b][c]", "a.b.c"),
            ("a[]", "a."),
            ("a[b", "a[b"),
            ("files[images[logo]", "files.images[logo"),
            ("a[b]c[d]", "a.bc.d"),
        ];

        for (path, expected) in cases {
            assert_eq!(brackets_to_dots(path), expected, "{path}");
        }
    }

    #[test]
    fn resolve_paths() {
        let tree = tree();
        let found = |path: &str| resolve(&tree, path).and_then(Value::as_str);

        assert_eq!(found("a.b.c"), Some("y"));
        assert_eq!(found("a[b][c]"), Some("y"));
        assert_eq!(found("a[b].c"), Some("y"));
        assert_eq!(found("list.1"), Some("z"));
        assert_eq!(found("list[0]"), Some("x"));
        assert_eq!(found("s"), Some("plain"));

        assert_eq!(resolve(&tree, "a.b.c.d"), None);
        assert_eq!(resolve(&tree, "list.2"), None);
        assert_eq!(resolve(&tree, "list.x"), None);
        assert_eq!(resolve(&tree, "s.x"), None);
        assert_eq!(resolve(&tree, "missing"), None);
        assert_eq!(resolve(&tree, ""), None);
        assert!(resolve(&tree, "a.b").unwrap().is_container());
    }

    #[test]
    fn conversions() {
        assert_eq!(Value::from(12), Value::Str("12".into()));
        assert_eq!(Value::from(true), Value::Str("1".into()));
        assert_eq!(Value::from(false), Value::Str("0".into()));
        assert_eq!(
            Value::from(vec!["a", "b"]),
            Value::List(vec![Value::from("a"), Value::from("b")])
        );

        let file = UploadedFile::new("/tmp/x", "x.txt", "text/plain", 1, UploadStatus::Ok);
        assert_eq!(Value::from(file.clone()).as_file(), Some(&file));
        assert_eq!(Value::from("x").as_file(), None);
    }

    #[test]
    fn entries() {
        let list = Value::from(["a", "b"]);
        let keys: Vec<_> = list.entries().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["0", "1"]);

        assert!(Value::from("x").entries().is_empty());
    }
}
