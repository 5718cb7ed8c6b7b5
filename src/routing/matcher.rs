//! Path pattern matching.
//!
//! # Responsibilities
//! - Compile route patterns (`/api/**`, `/users/*/profile`, `/files/*.png`)
//! - Test a request path against a pattern
//! - Pick the single best pattern for a path
//!
//! # Design Decisions
//! - Path matching is case-sensitive
//! - A literal pattern equal to the path beats every wildcard pattern
//! - Otherwise the longest fixed (pre-wildcard) prefix wins, ties go to the
//!   earliest pattern in table order
//! - No regex, segment walk only

/// One `/`-separated piece of a compiled pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    /// Segment with embedded `*`, matched within the segment only.
    Glob(String),
    /// `*`: exactly one non-empty segment.
    Any,
    /// `**`: zero or more segments.
    Rest,
}

impl Segment {
    fn parse(raw: &str) -> Self {
        match raw {
            "**" => Segment::Rest,
            "*" => Segment::Any,
            s if s.contains('*') => Segment::Glob(s.to_string()),
            s => Segment::Literal(s.to_string()),
        }
    }

    fn matches(&self, segment: &str) -> bool {
        match self {
            Segment::Literal(lit) => lit == segment,
            Segment::Any => !segment.is_empty(),
            Segment::Glob(glob) => glob_matches(glob, segment),
            Segment::Rest => true,
        }
    }
}

/// A compiled route pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
    /// Text before the first `*`; the whole pattern when literal.
    fixed_prefix_len: usize,
    literal: bool,
}

impl PathPattern {
    pub fn compile(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let first_wildcard = raw.find('*');
        let mut segments: Vec<Segment> = Vec::new();
        for segment in split_path(&raw).map(Segment::parse) {
            // `**/**` is the same as `**`.
            if segment == Segment::Rest && segments.last() == Some(&Segment::Rest) {
                continue;
            }
            segments.push(segment);
        }

        Self {
            fixed_prefix_len: first_wildcard.unwrap_or(raw.len()),
            literal: first_wildcard.is_none(),
            segments,
            raw,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn is_literal(&self) -> bool {
        self.literal
    }

    /// The non-wildcard head of the pattern, e.g. `/api/` for `/api/**`.
    pub fn fixed_prefix(&self) -> &str {
        &self.raw[..self.fixed_prefix_len]
    }

    /// Returns true if `path` matches this pattern.
    pub fn matches(&self, path: &str) -> bool {
        if self.literal {
            return self.raw == path;
        }
        let parts: Vec<&str> = split_path(path).collect();
        match_segments(&self.segments, &parts)
    }

    /// Remove the fixed prefix from a path this pattern matched.
    ///
    /// Wildcard patterns strip up to the last `/` of their fixed prefix, so
    /// `/api/**` turns `/api/orders/5` into `/orders/5`. Literal patterns strip
    /// the whole pattern. An empty remainder becomes `/`.
    pub fn strip(&self, path: &str) -> String {
        let prefix = if self.literal {
            self.raw.trim_end_matches('/')
        } else {
            let fixed = self.fixed_prefix();
            match fixed.rfind('/') {
                Some(idx) => &fixed[..idx],
                None => "",
            }
        };

        let rest = path.strip_prefix(prefix).unwrap_or(path);
        if rest.is_empty() {
            "/".to_string()
        } else if rest.starts_with('/') {
            rest.to_string()
        } else {
            format!("/{}", rest)
        }
    }
}

/// Selects the best pattern for a request path.
pub struct PathMatcher;

impl PathMatcher {
    /// Index of the best matching pattern, in iteration order, or `None`.
    pub fn best_match<'a, I>(path: &str, patterns: I) -> Option<usize>
    where
        I: IntoIterator<Item = &'a PathPattern>,
    {
        let mut best: Option<(usize, usize)> = None;

        for (idx, pattern) in patterns.into_iter().enumerate() {
            if !pattern.matches(path) {
                continue;
            }
            if pattern.is_literal() {
                // Paths are unique in a table, so no other literal can match.
                return Some(idx);
            }
            let len = pattern.fixed_prefix_len;
            match best {
                Some((_, best_len)) if best_len >= len => {}
                _ => best = Some((idx, len)),
            }
        }

        best.map(|(idx, _)| idx)
    }
}

fn split_path(path: &str) -> std::str::Split<'_, char> {
    path.strip_prefix('/').unwrap_or(path).split('/')
}

/// Segment-wise match in O(pattern × path) time.
///
/// `rest[j]` holds whether the pattern suffix starting at the current
/// segment matches `path[j..]`; rows are filled from the last segment back.
fn match_segments(pattern: &[Segment], path: &[&str]) -> bool {
    let n = path.len();
    let mut next = vec![false; n + 1];
    next[n] = true;

    for segment in pattern.iter().rev() {
        let mut row = vec![false; n + 1];
        for j in (0..=n).rev() {
            row[j] = match segment {
                Segment::Rest => next[j] || (j < n && row[j + 1]),
                _ => j < n && segment.matches(path[j]) && next[j + 1],
            };
        }
        next = row;
    }
    next[0]
}

/// `*` matches any run of characters inside a single segment.
fn glob_matches(glob: &str, text: &str) -> bool {
    let mut parts = glob.split('*');
    let first = parts.next().unwrap_or("");
    let Some(mut remaining) = text.strip_prefix(first) else {
        return false;
    };

    let rest: Vec<&str> = parts.collect();
    let Some((last, middle)) = rest.split_last() else {
        return remaining.is_empty();
    };

    for part in middle {
        match remaining.find(part) {
            Some(pos) => remaining = &remaining[pos + part.len()..],
            None => return false,
        }
    }
    remaining.len() >= last.len() && remaining.ends_with(last)
}
