//! Integration tests for BabylonFS.
//!
//! This crate provides:
//! - A library harness that drives the filesystem through paths
//! - Integration tests for generation, topology, books on desks and notes
//! - Concurrency tests for shared libraries

pub mod harness;

pub use harness::TestLibrary;

/// Initialize tracing for tests.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("babylon_fs=debug,babylon_tests=debug")
        .with_test_writer()
        .try_init();
}
