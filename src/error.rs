//! Error types for wiring-time validation
//!
//! Runtime "no match" / "not found" outcomes are `Option::None`, never errors.
//! Only construction mistakes (bad pattern unions, bad index tables, shadow
//! values out of range) surface through [`ValidationError`].

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("expected at least two event patterns to union, got {count}")]
    UnionArity { count: usize },

    #[error("value {value} must be within range 0-1")]
    ValueOutOfRange { value: f32 },

    #[error("indexed matcher requires at least one control")]
    EmptyIndexTable,

    #[error("indexed matcher range {base}..{base}+{count} exceeds data byte range")]
    IndexRangeOverflow { base: u8, count: usize },
}

pub type Result<T> = std::result::Result<T, ValidationError>;
