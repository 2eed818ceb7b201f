//! Event patterns - pure predicates over raw MIDI events
//!
//! A [`Pattern`] is an immutable tree. Matching never mutates anything and a
//! miss is a plain `false`, so the common "this control doesn't care" outcome
//! costs nothing.

use std::ops::{Range, RangeInclusive};

use crate::error::{Result, ValidationError};
use crate::midi::{forward, RawEvent};

/// Matcher for a single byte of an event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ByteMatcher {
    /// Exact value
    Literal(u8),
    /// Any value, including a missing data byte
    Wildcard,
    /// Inclusive range of values
    Range(RangeInclusive<u8>),
    /// Explicit set of values
    Set(Vec<u8>),
}

impl ByteMatcher {
    /// Match against an optional field; a missing byte only matches `Wildcard`
    pub fn matches(&self, value: Option<u8>) -> bool {
        match (self, value) {
            (ByteMatcher::Wildcard, _) => true,
            (_, None) => false,
            (ByteMatcher::Literal(b), Some(v)) => *b == v,
            (ByteMatcher::Range(r), Some(v)) => r.contains(&v),
            (ByteMatcher::Set(s), Some(v)) => s.contains(&v),
        }
    }
}

impl From<u8> for ByteMatcher {
    fn from(value: u8) -> Self {
        ByteMatcher::Literal(value)
    }
}

impl From<RangeInclusive<u8>> for ByteMatcher {
    fn from(range: RangeInclusive<u8>) -> Self {
        ByteMatcher::Range(range)
    }
}

impl From<Range<u8>> for ByteMatcher {
    fn from(range: Range<u8>) -> Self {
        if range.is_empty() {
            ByteMatcher::Set(Vec::new())
        } else {
            ByteMatcher::Range(range.start..=range.end - 1)
        }
    }
}

impl From<Vec<u8>> for ByteMatcher {
    fn from(values: Vec<u8>) -> Self {
        ByteMatcher::Set(values)
    }
}

/// Shorthand for [`ByteMatcher::Wildcard`]
pub const ANY: ByteMatcher = ByteMatcher::Wildcard;

/// Composable predicate over [`RawEvent`]s
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pattern {
    /// Status/data1/data2 matcher; never matches sysex events
    Basic {
        status: ByteMatcher,
        data1: ByteMatcher,
        data2: ByteMatcher,
    },
    /// Sysex prefix matcher; never matches standard events
    Sysex(Vec<ByteMatcher>),
    /// Matches if any member matches, built with [`Pattern::union`]
    Union(UnionPattern),
    /// Matches events forwarded from `port` whose embedded event matches `inner`
    Forwarded { port: u8, inner: Box<Pattern> },
    /// Matches nothing, used for intentionally ignored messages
    Null,
}

impl Pattern {
    pub fn basic(
        status: impl Into<ByteMatcher>,
        data1: impl Into<ByteMatcher>,
        data2: impl Into<ByteMatcher>,
    ) -> Self {
        Pattern::Basic {
            status: status.into(),
            data1: data1.into(),
            data2: data2.into(),
        }
    }

    pub fn sysex<I>(bytes: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<ByteMatcher>,
    {
        Pattern::Sysex(bytes.into_iter().map(Into::into).collect())
    }

    /// Union of several patterns
    ///
    /// Fails when given fewer than two patterns: a single-member union is a
    /// wiring mistake, not an empty match.
    pub fn union(patterns: Vec<Pattern>) -> Result<Self> {
        if patterns.len() < 2 {
            return Err(ValidationError::UnionArity {
                count: patterns.len(),
            });
        }
        Ok(Pattern::Union(UnionPattern(patterns)))
    }

    pub fn forwarded(port: u8, inner: Pattern) -> Self {
        Pattern::Forwarded {
            port,
            inner: Box::new(inner),
        }
    }

    /// Note on or note off for `note` on `channel` (0-15), any velocity
    pub fn note(note: u8, channel: u8) -> Self {
        let channel = channel & 0x0F;
        Pattern::basic(vec![0x80 | channel, 0x90 | channel], note, ANY)
    }

    /// Control change `cc` on `channel` (0-15), any value
    pub fn control_change(channel: u8, cc: u8) -> Self {
        Pattern::basic(0xB0 | (channel & 0x0F), cc, ANY)
    }

    pub fn matches(&self, event: &RawEvent) -> bool {
        match self {
            Pattern::Basic {
                status,
                data1,
                data2,
            } => {
                !event.is_sysex()
                    && status.matches(Some(event.status))
                    && data1.matches(event.data1)
                    && data2.matches(event.data2)
            }
            Pattern::Sysex(expected) => match event.sysex.as_deref() {
                Some(actual) if actual.len() >= expected.len() => expected
                    .iter()
                    .zip(actual)
                    .all(|(m, b)| m.matches(Some(*b))),
                _ => false,
            },
            Pattern::Union(union) => union.0.iter().any(|p| p.matches(event)),
            Pattern::Forwarded { port, inner } => {
                // Cheap rejection before decoding the envelope
                if forward::port_of(event) != Some(*port) {
                    return false;
                }
                forward::unwrap(event).is_some_and(|(_, decoded)| inner.matches(&decoded))
            }
            Pattern::Null => false,
        }
    }
}

/// Members of a [`Pattern::Union`], always at least two
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnionPattern(Vec<Pattern>);

impl UnionPattern {
    pub fn members(&self) -> &[Pattern] {
        &self.0
    }
}

/// Prefix pattern for a universal enquiry response
///
/// `F0 7E <any device id> 06 02` followed by the device-specific manufacturer
/// and family bytes.
pub fn enquiry_response(suffix: &[u8]) -> Pattern {
    let mut bytes = vec![
        ByteMatcher::Literal(0xF0),
        ByteMatcher::Literal(0x7E),
        ByteMatcher::Wildcard,
        ByteMatcher::Literal(0x06),
        ByteMatcher::Literal(0x02),
    ];
    bytes.extend(suffix.iter().copied().map(ByteMatcher::Literal));
    Pattern::Sysex(bytes)
}
