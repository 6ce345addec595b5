//! Trailing-edge debouncing
//!
//! This crate provides:
//! - [`Debouncer`], a single-timer wrapper that collapses bursts of calls
//!   into one callback invocation carrying the last call's arguments
//! - [`Delay`], a validated quiet-period length
//! - [`DebounceConfig`], TOML-loadable settings
//!
//! Time comes from an injected [`clock::Scheduler`]. Tests install a virtual
//! clock with [`clock::install_virtual_clock`] and drive it explicitly.

pub mod config;
pub mod debouncer;
pub mod delay;

// Re-exports
pub use config::DebounceConfig;
pub use debouncer::{debounce, DebounceState, Debouncer};
pub use delay::Delay;

/// Errors raised when constructing a debouncer
#[derive(Debug, thiserror::Error)]
pub enum DebounceError {
    /// Delay was negative, NaN or infinite
    #[error("invalid debounce delay: {0} (must be a finite, non-negative duration)")]
    InvalidDelay(String),

    /// No time source could be resolved
    #[error(transparent)]
    Clock(#[from] clock::ClockError),
}

/// Result type for debounce operations
pub type Result<T> = std::result::Result<T, DebounceError>;
