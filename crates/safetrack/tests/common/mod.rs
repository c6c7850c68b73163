//! Shared utilities for safetrack integration tests.
//!
//! - `TestHarness`: an `AppContext` opened inside a temporary base directory
//! - builders for inspection and site check drafts

pub mod builders;
pub mod harness;

pub use builders::*;
pub use harness::TestHarness;
