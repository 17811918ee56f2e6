use core::fmt;
use core::str::FromStr;

use crate::error::PropertyError;
use crate::expr::{DefaultResolver, Resolver};

// -----------------------------------------------------------------------------
// Segment

/// A single step of a [`PropertyPath`].
///
/// An empty name on an indexed or keyed segment addresses the current
/// value itself, e.g. `[3]` on an array root.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// `name`
    Simple(String),
    /// `name[index]`
    Indexed(String, usize),
    /// `name(key)`
    Keyed(String, String),
}

impl Segment {
    /// The property name, possibly empty for indexed and keyed segments.
    #[inline]
    pub fn name(&self) -> &str {
        match self {
            Self::Simple(name) | Self::Indexed(name, _) | Self::Keyed(name, _) => name,
        }
    }

    #[inline]
    pub fn index(&self) -> Option<usize> {
        match self {
            Self::Indexed(_, index) => Some(*index),
            _ => None,
        }
    }

    #[inline]
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::Keyed(_, key) => Some(key),
            _ => None,
        }
    }

    #[inline]
    pub fn is_indexed(&self) -> bool {
        matches!(self, Self::Indexed(..))
    }

    #[inline]
    pub fn is_mapped(&self) -> bool {
        matches!(self, Self::Keyed(..))
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Simple(name) => f.write_str(name),
            Self::Indexed(name, index) => write!(f, "{name}[{index}]"),
            Self::Keyed(name, key) => write!(f, "{name}({key})"),
        }
    }
}

// -----------------------------------------------------------------------------
// PropertyPath

/// A parsed, non-empty property expression.
///
/// Paths are cheap and meant to be built per call. `Display` renders the
/// default dialect, so a path produced by [`DefaultResolver`] prints back
/// as the expression it came from.
///
/// # Examples
///
/// ```
/// use dp_beans::expr::{PropertyPath, Segment};
///
/// let path: PropertyPath = "people[2].address(home).city".parse().unwrap();
/// assert_eq!(path.len(), 4);
/// assert_eq!(path.segments()[1], Segment::Keyed("address".into(), "home".into()));
/// assert_eq!(path.prefix(2), "people[2].address(home)");
/// assert_eq!(path.to_string(), "people[2].address(home).city");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PropertyPath(Box<[Segment]>);

impl PropertyPath {
    /// Creates a path from segments, `None` if there are none.
    pub fn new(segments: Vec<Segment>) -> Option<Self> {
        (!segments.is_empty()).then(|| Self(segments.into_boxed_slice()))
    }

    /// A path of one segment.
    #[inline]
    pub fn single(segment: Segment) -> Self {
        Self(Box::new([segment]))
    }

    #[inline]
    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false` for a constructed path.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn is_nested(&self) -> bool {
        self.0.len() > 1
    }

    #[inline]
    pub fn first(&self) -> &Segment {
        &self.0[0]
    }

    #[inline]
    pub fn last(&self) -> &Segment {
        &self.0[self.0.len() - 1]
    }

    /// Splits into the final segment and the segments leading to it.
    #[inline]
    pub fn split_last(&self) -> (&Segment, &[Segment]) {
        let (leading, last) = self.0.split_at(self.0.len() - 1);
        (&last[0], leading)
    }

    /// Renders the first `n` segments in the default dialect.
    pub fn prefix(&self, n: usize) -> String {
        render(&self.0[..n.min(self.0.len())])
    }

    #[inline]
    pub fn iter(&self) -> core::slice::Iter<'_, Segment> {
        self.0.iter()
    }
}

pub(crate) fn render(segments: &[Segment]) -> String {
    let mut out = String::new();
    for (i, segment) in segments.iter().enumerate() {
        if i > 0 {
            out.push('.');
        }
        out.push_str(&segment.to_string());
    }
    out
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render(&self.0))
    }
}

impl FromStr for PropertyPath {
    type Err = PropertyError;

    /// Parses with the [`DefaultResolver`].
    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DefaultResolver.parse(s)
    }
}

impl<'a> IntoIterator for &'a PropertyPath {
    type Item = &'a Segment;
    type IntoIter = core::slice::Iter<'a, Segment>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

// -----------------------------------------------------------------------------
// Tests
