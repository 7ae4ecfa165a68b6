//! Key paths addressing locations in the state tree.
//!
//! A path is an ordered list of segments. Each segment is either an object
//! field name or an array index; interpretation is positional and there is no
//! schema attached (see [`crate::Shape`] for optional validation).

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// A single segment in a path.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Seg {
    /// Object field name.
    Key(String),
    /// Array position.
    Index(usize),
}

impl Seg {
    /// Create a key segment.
    #[inline]
    pub fn key(k: impl Into<String>) -> Self {
        Seg::Key(k.into())
    }

    /// Create an index segment.
    #[inline]
    pub fn index(i: usize) -> Self {
        Seg::Index(i)
    }

    /// The array position this segment addresses, if any.
    ///
    /// Key segments count as positions only when they are canonical decimal
    /// integers (`"2"`, not `"02"` or `"+2"`).
    pub fn as_array_index(&self) -> Option<usize> {
        match self {
            Seg::Index(i) => Some(*i),
            Seg::Key(k) => {
                let canonical = k == "0" || (!k.starts_with('0') && !k.is_empty());
                if canonical && k.bytes().all(|b| b.is_ascii_digit()) {
                    k.parse().ok()
                } else {
                    None
                }
            }
        }
    }

    /// The object field name this segment addresses.
    ///
    /// Index segments address the field named by their decimal form.
    pub fn as_object_key(&self) -> Cow<'_, str> {
        match self {
            Seg::Key(k) => Cow::Borrowed(k),
            Seg::Index(i) => Cow::Owned(i.to_string()),
        }
    }
}

impl fmt::Display for Seg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Seg::Key(k) => write!(f, ".{}", k),
            Seg::Index(i) => write!(f, "[{}]", i),
        }
    }
}

impl From<String> for Seg {
    fn from(s: String) -> Self {
        Seg::Key(s)
    }
}

impl From<&str> for Seg {
    fn from(s: &str) -> Self {
        Seg::Key(s.to_owned())
    }
}

impl From<&String> for Seg {
    fn from(s: &String) -> Self {
        Seg::Key(s.clone())
    }
}

impl From<usize> for Seg {
    fn from(i: usize) -> Self {
        Seg::Index(i)
    }
}

/// A location in the state tree.
///
/// # Examples
///
/// ```
/// use console_state::Path;
///
/// let path = Path::root().key("clusters").key("index").index(0);
/// assert_eq!(path.len(), 3);
/// assert_eq!(path.to_string(), "$.clusters.index[0]");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path(Vec<Seg>);

impl Path {
    /// The empty path, addressing the whole tree.
    #[inline]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Create a path from segments.
    #[inline]
    pub fn from_segments(segments: Vec<Seg>) -> Self {
        Self(segments)
    }

    /// Parse a dot-separated path.
    ///
    /// Canonical decimal components (`"2"`, not `"02"`) become index
    /// segments; empty components are skipped.
    ///
    /// ```
    /// use console_state::{path, Path};
    ///
    /// assert_eq!(Path::parse("app.selectedRegion"), path!("app", "selectedRegion"));
    /// assert_eq!(Path::parse("clusters.list.2"), path!("clusters", "list", 2));
    /// ```
    pub fn parse(raw: &str) -> Self {
        raw.split('.')
            .filter(|part| !part.is_empty())
            .map(|part| {
                let seg = Seg::key(part);
                match seg.as_array_index() {
                    Some(i) => Seg::Index(i),
                    None => seg,
                }
            })
            .collect()
    }

    /// Append a key segment (builder pattern).
    #[inline]
    pub fn key(mut self, k: impl Into<String>) -> Self {
        self.0.push(Seg::Key(k.into()));
        self
    }

    /// Append an index segment (builder pattern).
    #[inline]
    pub fn index(mut self, i: usize) -> Self {
        self.0.push(Seg::Index(i));
        self
    }

    /// Push a segment onto the path.
    #[inline]
    pub fn push(&mut self, seg: Seg) {
        self.0.push(seg);
    }

    #[inline]
    pub fn segments(&self) -> &[Seg] {
        &self.0
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn last(&self) -> Option<&Seg> {
        self.0.last()
    }

    /// The path without its last segment; `None` for the root.
    pub fn parent(&self) -> Option<Path> {
        match self.0.split_last() {
            Some((_, head)) => Some(Path(head.to_vec())),
            None => None,
        }
    }

    /// Returns a new path with `seg` appended.
    pub fn child(&self, seg: impl Into<Seg>) -> Path {
        let mut result = self.clone();
        result.0.push(seg.into());
        result
    }

    /// Check if this path is a prefix of (or equal to) another path.
    #[inline]
    pub fn is_prefix_of(&self, other: &Path) -> bool {
        other.0.starts_with(&self.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Seg> {
        self.0.iter()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "$")?;
        for seg in &self.0 {
            write!(f, "{}", seg)?;
        }
        Ok(())
    }
}

impl FromIterator<Seg> for Path {
    fn from_iter<I: IntoIterator<Item = Seg>>(iter: I) -> Self {
        Path(iter.into_iter().collect())
    }
}

impl From<Vec<Seg>> for Path {
    fn from(segments: Vec<Seg>) -> Self {
        Path(segments)
    }
}

impl From<&[Seg]> for Path {
    fn from(segments: &[Seg]) -> Self {
        Path(segments.to_vec())
    }
}

impl<'a> IntoIterator for &'a Path {
    type Item = &'a Seg;
    type IntoIter = std::slice::Iter<'a, Seg>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl std::ops::Index<usize> for Path {
    type Output = Seg;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

/// Construct a [`Path`] from a list of segments.
///
/// String expressions become key segments, `usize` expressions become index
/// segments.
///
/// ```
/// use console_state::path;
///
/// let region = path!("app", "selectedRegion");
/// let node = path!("clusters", "index", "demo", "nodes", 0);
/// assert_eq!(node.len(), 5);
/// ```
#[macro_export]
macro_rules! path {
    () => {
        $crate::Path::root()
    };
    ($($seg:expr),+ $(,)?) => {{
        let mut p = $crate::Path::root();
        $(
            p.push($crate::Seg::from($seg));
        )+
        p
    }};
}
