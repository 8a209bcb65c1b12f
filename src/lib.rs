//! Bookshelf application library
//!
//! Project modules mounted by the binary and by integration tests.

pub mod modules;

pub use modules::*;
