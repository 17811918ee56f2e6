use std::borrow::Cow;

use crate::error::PropertyError;
use crate::expr::{PropertyPath, Resolver, Segment};

fn invalid(expression: &str, offset: usize, reason: impl Into<Cow<'static, str>>) -> PropertyError {
    PropertyError::InvalidExpression {
        expression: expression.to_owned(),
        offset,
        reason: reason.into(),
    }
}

// -----------------------------------------------------------------------------
// DefaultResolver

/// The default expression dialect.
///
/// - Segments are separated by `.`.
/// - A segment is `name`, `name[index]` or `name(key)`.
/// - A `.` inside `[...]` or `(...)` does not separate segments, so keys
///   may contain dots.
/// - The name may be empty for indexed and keyed segments: `[3]`, `(k)`.
/// - There is no escaping.
///
/// # Examples
///
/// ```
/// use dp_beans::expr::{DefaultResolver, Resolver, Segment};
///
/// let path = DefaultResolver.parse("map(a.b).list[0]").unwrap();
/// assert_eq!(path.segments(), &[
///     Segment::Keyed("map".into(), "a.b".into()),
///     Segment::Indexed("list".into(), 0),
/// ]);
///
/// assert_eq!(DefaultResolver.next("a[1].b.c").unwrap(), "a[1]");
/// assert_eq!(DefaultResolver.remove("a[1].b.c").unwrap(), Some("b.c"));
/// assert_eq!(DefaultResolver.property_name("a[1].b").unwrap(), "a");
/// assert_eq!(DefaultResolver.index("a[1].b").unwrap(), Some(1));
/// assert!(DefaultResolver.parse("a[x]").is_err());
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultResolver;

impl DefaultResolver {
    /// Returns the byte length of the first segment of `rest`, which starts
    /// at byte `base` of `expression`.
    fn segment_len(expression: &str, base: usize, rest: &str) -> Result<usize, PropertyError> {
        let mut open: Option<(char, usize)> = None;
        for (i, c) in rest.char_indices() {
            match open {
                None if c == '.' => return Ok(i),
                None if c == '[' => open = Some((']', i)),
                None if c == '(' => open = Some((')', i)),
                Some((close, _)) if c == close => open = None,
                _ => {}
            }
        }
        match open {
            Some((close, at)) => Err(invalid(
                expression,
                base + at,
                format!("unterminated `{}`", if close == ']' { '[' } else { '(' }),
            )),
            None => Ok(rest.len()),
        }
    }

    fn parse_segment(expression: &str, base: usize, text: &str) -> Result<Segment, PropertyError> {
        if text.is_empty() {
            return Err(invalid(expression, base, "empty segment"));
        }

        let stray = |name: &str| {
            name.find([']', ')'])
                .map(|at| invalid(expression, base + at, "unexpected closing delimiter"))
        };

        let Some(open) = text.find(['[', '(']) else {
            return match stray(text) {
                Some(err) => Err(err),
                None => Ok(Segment::Simple(text.to_owned())),
            };
        };

        let name = &text[..open];
        if let Some(err) = stray(name) {
            return Err(err);
        }

        let indexed = text.as_bytes()[open] == b'[';
        let close_char = if indexed { ']' } else { ')' };
        let close = text[open + 1..]
            .find(close_char)
            .map(|at| open + 1 + at)
            .ok_or_else(|| invalid(expression, base + open, "unterminated delimiter"))?;
        if close + 1 != text.len() {
            return Err(invalid(
                expression,
                base + close + 1,
                format!("unexpected text after `{close_char}`"),
            ));
        }

        let inner = &text[open + 1..close];
        if !indexed {
            return Ok(Segment::Keyed(name.to_owned(), inner.to_owned()));
        }

        let at = base + open + 1;
        if inner.is_empty() {
            return Err(invalid(expression, at, "missing index"));
        }
        if inner.starts_with('-') {
            return Err(invalid(expression, at, "negative index"));
        }
        match inner.parse::<usize>() {
            Ok(index) => Ok(Segment::Indexed(name.to_owned(), index)),
            Err(_) => Err(invalid(expression, at, "index is not an integer")),
        }
    }

    fn first_segment(&self, expression: &str) -> Result<Segment, PropertyError> {
        let text = self.next(expression)?;
        Self::parse_segment(expression, 0, text)
    }

    /// Returns the text of the first segment, e.g. `a[1]` for `a[1].b`.
    pub fn next<'a>(&self, expression: &'a str) -> Result<&'a str, PropertyError> {
        let len = Self::segment_len(expression, 0, expression)?;
        Ok(&expression[..len])
    }

    /// Returns the expression without its first segment, `None` if it has
    /// only one.
    pub fn remove<'a>(&self, expression: &'a str) -> Result<Option<&'a str>, PropertyError> {
        let len = Self::segment_len(expression, 0, expression)?;
        Ok(expression.get(len + 1..).filter(|_| len < expression.len()))
    }

    /// Returns `true` if the expression has more than one segment.
    pub fn has_nested(&self, expression: &str) -> bool {
        matches!(self.remove(expression), Ok(Some(_)))
    }

    /// The name of the first segment, without index or key.
    pub fn property_name(&self, expression: &str) -> Result<String, PropertyError> {
        match self.first_segment(expression)? {
            Segment::Simple(name) | Segment::Indexed(name, _) | Segment::Keyed(name, _) => Ok(name),
        }
    }

    /// The index of the first segment, if it is indexed.
    pub fn index(&self, expression: &str) -> Result<Option<usize>, PropertyError> {
        Ok(self.first_segment(expression)?.index())
    }

    /// The key of the first segment, if it is keyed.
    pub fn key(&self, expression: &str) -> Result<Option<String>, PropertyError> {
        Ok(self.first_segment(expression)?.key().map(str::to_owned))
    }

    /// Returns `true` if the first segment is well formed and indexed.
    pub fn is_indexed(&self, expression: &str) -> bool {
        self.first_segment(expression).is_ok_and(|s| s.is_indexed())
    }

    /// Returns `true` if the first segment is well formed and keyed.
    pub fn is_mapped(&self, expression: &str) -> bool {
        self.first_segment(expression).is_ok_and(|s| s.is_mapped())
    }
}

impl Resolver for DefaultResolver {
    fn parse(&self, expression: &str) -> Result<PropertyPath, PropertyError> {
        if expression.is_empty() {
            return Err(invalid(expression, 0, "empty expression"));
        }

        let mut segments = Vec::new();
        let mut base = 0;
        loop {
            let rest = &expression[base..];
            let len = Self::segment_len(expression, base, rest)?;
            segments.push(Self::parse_segment(expression, base, &rest[..len])?);
            if len == rest.len() {
                break;
            }
            // Skip the separator.
            base += len + 1;
        }

        PropertyPath::new(segments).ok_or_else(|| invalid(expression, 0, "empty expression"))
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::DefaultResolver;
    use crate::error::PropertyError;
    use crate::expr::{Resolver, Segment};

    fn offset_of(expression: &str) -> (usize, String) {
        match DefaultResolver.parse(expression) {
            Err(PropertyError::InvalidExpression { offset, reason, .. }) => (offset, reason.into_owned()),
            other => panic!("expected InvalidExpression for {expression:?}, got {other:?}"),
        }
    }

    #[test]
    fn simple_nested_indexed_keyed() {
        let path = DefaultResolver.parse("a.b[3].c(k).d").unwrap();
        assert_eq!(path.segments(), &[
            Segment::Simple("a".into()),
            Segment::Indexed("b".into(), 3),
            Segment::Keyed("c".into(), "k".into()),
            Segment::Simple("d".into()),
        ]);
    }

    #[test]
    fn self_access() {
        let path = DefaultResolver.parse("[3]").unwrap();
        assert_eq!(path.first(), &Segment::Indexed(String::new(), 3));
        let path = DefaultResolver.parse("(k)").unwrap();
        assert_eq!(path.first(), &Segment::Keyed(String::new(), "k".into()));
    }

    #[test]
    fn keys_may_hold_separators() {
        let path = DefaultResolver.parse("m(a.b[c).x").unwrap();
        assert_eq!(path.len(), 2);
        assert_eq!(path.first().key(), Some("a.b[c"));
    }

    #[test]
    fn malformed_expressions() {
        assert_eq!(offset_of(""), (0, "empty expression".into()));
        assert_eq!(offset_of("a..b"), (2, "empty segment".into()));
        assert_eq!(offset_of("a."), (2, "empty segment".into()));
        assert_eq!(offset_of("a[1"), (1, "unterminated `[`".into()));
        assert_eq!(offset_of("x.m(k"), (3, "unterminated `(`".into()));
        assert_eq!(offset_of("a[x]"), (2, "index is not an integer".into()));
        assert_eq!(offset_of("a[-1]"), (2, "negative index".into()));
        assert_eq!(offset_of("a[]"), (2, "missing index".into()));
        assert_eq!(offset_of("a[1]b"), (4, "unexpected text after `]`".into()));
        assert_eq!(offset_of("a]"), (1, "unexpected closing delimiter".into()));
    }

    #[test]
    fn round_trips_through_display() {
        for expr in ["a", "a.b", "a[0]", "m(k).x[2]", "[1]", "people[2].address(home).city"] {
            assert_eq!(DefaultResolver.parse(expr).unwrap().to_string(), expr);
        }
    }

    #[test]
    fn helpers() {
        let r = DefaultResolver;
        assert_eq!(r.next("m(a.b).c").unwrap(), "m(a.b)");
        assert_eq!(r.remove("m(a.b).c").unwrap(), Some("c"));
        assert_eq!(r.remove("abc").unwrap(), None);
        assert!(r.has_nested("a.b"));
        assert!(!r.has_nested("a[1]"));
        assert_eq!(r.key("m(x).c").unwrap().as_deref(), Some("x"));
        assert_eq!(r.index("m(x)").unwrap(), None);
        assert!(r.is_indexed("a[2].b"));
        assert!(r.is_mapped("a(2).b"));
        assert!(!r.is_mapped("a[2].b"));
        assert_eq!(r.property_name("[4]").unwrap(), "");
    }
}
