//! Byte ranges into the template source.

use std::ops::{Index, Range};

/// The half-open byte range `m..n` of a token or node in the source.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub m: usize,
    pub n: usize,
}

impl Span {
    /// Returns the smallest span covering both `self` and `other`.
    pub fn combine(self, other: Self) -> Self {
        Self {
            m: self.m.min(other.m),
            n: self.n.max(other.n),
        }
    }
}

impl From<Range<usize>> for Span {
    fn from(Range { start, end }: Range<usize>) -> Self {
        Self { m: start, n: end }
    }
}

impl From<Span> for Range<usize> {
    fn from(Span { m, n }: Span) -> Self {
        m..n
    }
}

impl Index<Span> for str {
    type Output = str;

    fn index(&self, span: Span) -> &Self::Output {
        &self[Range::from(span)]
    }
}
