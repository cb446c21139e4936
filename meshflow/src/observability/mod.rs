//! Timing helpers for stage records.

mod timer;

pub use timer::SpanTimer;
