//! Cooperative cancellation.
//!
//! The runner checks a [`CancellationToken`] at every stage boundary. A
//! subprocess that is already running is not interrupted by the token.

mod token;

pub use token::CancellationToken;
