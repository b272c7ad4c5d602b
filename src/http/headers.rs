//! Case-insensitive, multi-valued header storage.

use indexmap::IndexMap;
use std::{borrow::Cow, fmt::Write, rc::Rc, sync::Arc};

/// Header store keyed by lowercase name.
///
/// Each name maps to an ordered list of values. Names keep the order in which
/// they were first inserted; replacing the values of an existing name keeps
/// its position, removing it closes the gap.
///
/// # Examples
/// ```
/// use http_value::HeaderBag;
///
/// let mut bag = HeaderBag::new();
/// bag.add("Accept", ["text/html", "image/png"]);
/// bag.add("ACCEPT", "*/*");
///
/// assert_eq!(bag.get("accept"), "text/html, image/png, */*");
/// assert_eq!(bag.first("Accept"), Some("text/html"));
/// assert_eq!(bag.last("Accept"), Some("*/*"));
/// assert_eq!(bag.get("X-Missing"), "");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderBag {
    entries: IndexMap<String, Vec<String>>,
}

impl HeaderBag {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces every value of `name`.
    #[inline]
    pub fn set<V: IntoHeaderValues>(&mut self, name: &str, values: V) {
        self.entries
            .insert(name.to_ascii_lowercase(), values.into_header_values());
    }

    /// Appends to the values of `name`, creating the entry if needed.
    #[inline]
    pub fn add<V: IntoHeaderValues>(&mut self, name: &str, values: V) {
        self.entries
            .entry(name.to_ascii_lowercase())
            .or_default()
            .extend(values.into_header_values());
    }

    /// Removes `name`; a missing name is not an error.
    #[inline]
    pub fn remove(&mut self, name: &str) -> Option<Vec<String>> {
        self.entries.shift_remove(&name.to_ascii_lowercase())
    }

    /// The authoritative presence check, see [`HeaderBag::get`].
    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&name.to_ascii_lowercase())
    }

    /// All values joined with `", "`.
    ///
    /// Returns an empty string when the header is absent, which is
    /// indistinguishable from a header present with an empty value. Use
    /// [`HeaderBag::contains`] to tell the two apart.
    #[inline]
    pub fn get(&self, name: &str) -> String {
        self.values(name).join(", ")
    }

    #[inline]
    pub fn values(&self, name: &str) -> &[String] {
        self.entries
            .get(&name.to_ascii_lowercase())
            .map_or(&[], Vec::as_slice)
    }

    #[inline]
    pub fn first(&self, name: &str) -> Option<&str> {
        self.values(name).first().map(String::as_str)
    }

    #[inline]
    pub fn last(&self, name: &str) -> Option<&str> {
        self.values(name).last().map(String::as_str)
    }

    /// Number of distinct header names.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates `(presented name, values)` in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (String, &[String])> + '_ {
        self.entries
            .iter()
            .map(|(name, values)| (present_name(name), values.as_slice()))
    }

    /// The presented view: title-cased names mapped to their values.
    pub fn presented(&self) -> IndexMap<String, Vec<String>> {
        self.iter()
            .map(|(name, values)| (name, values.to_vec()))
            .collect()
    }

    /// Writes one `Name: value\r\n` line per value.
    pub(crate) fn write_lines(&self, out: &mut String) {
        for (name, values) in self.iter() {
            for value in values {
                // Writing into a String cannot fail
                let _ = write!(out, "{name}: {value}\r\n");
            }
        }
    }
}

/// Title-cases each hyphen-delimited word: `content-type` becomes `Content-Type`.
pub fn present_name(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    let mut word_start = true;

    for c in name.chars() {
        if word_start {
            result.push(c.to_ascii_uppercase());
        } else {
            result.push(c.to_ascii_lowercase());
        }
        word_start = c == '-';
    }

    result
}

/// Converts a header argument into its list of values.
///
/// Scalars become a single value and sequences keep one value per element, so
/// `with_header("Accept", "a")` and `with_header("Accept", ["a", "b"])` both
/// work. Integers are formatted in decimal.
///
/// # Example
/// ```
/// use http_value::IntoHeaderValues;
///
/// struct Challenge(&'static str);
///
/// impl IntoHeaderValues for Challenge {
///     fn into_header_values(self) -> Vec<String> {
///         vec![format!("Basic realm=\"{}\"", self.0)]
///     }
/// }
/// ```
pub trait IntoHeaderValues {
    fn into_header_values(self) -> Vec<String>;
}

macro_rules! impl_into_header_values {
    (scalar => $($t:ty),*) => {
        $(impl IntoHeaderValues for $t {
            #[inline] fn into_header_values(self) -> Vec<String> {
                vec![self.to_string()]
            }
        })*
    };
}

impl_into_header_values! {
    scalar => &str, String, &String, Box<str>, Cow<'_, str>, Arc<str>, Rc<str>, char
}
impl_into_header_values! {
    scalar => u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize
}

impl<T: ToString> IntoHeaderValues for Vec<T> {
    #[inline]
    fn into_header_values(self) -> Vec<String> {
        self.iter().map(ToString::to_string).collect()
    }
}
impl<T: ToString> IntoHeaderValues for &[T] {
    #[inline]
    fn into_header_values(self) -> Vec<String> {
        self.iter().map(ToString::to_string).collect()
    }
}
impl<T: ToString, const N: usize> IntoHeaderValues for [T; N] {
    #[inline]
    fn into_header_values(self) -> Vec<String> {
        self.iter().map(ToString::to_string).collect()
    }
}
