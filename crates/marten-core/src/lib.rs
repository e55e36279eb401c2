//! # marten-core
//!
//! Shared types for the marten dataset crates.
//!
//! This crate provides:
//! - [`Error`] — every failure mode of scanning, decoding and sample access
//! - [`Result`] — convenience alias used across the workspace
//! - [`bail!`] — early return with a formatted message

pub mod error;

pub use error::Error;

/// Convenience Result type used throughout marten.
pub type Result<T> = std::result::Result<T, Error>;

/// Macro for early return with a formatted error message.
/// Usage: `bail!("something went wrong: {}", detail)`
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::Error::Msg(format!($($arg)*)))
    };
}
