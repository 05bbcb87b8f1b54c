//! Utility functions and helpers.

pub mod token;

pub use token::{correlation_token, new_token};
