//! BIBLIO Application Library
//!
//! Library catalog modules and the process bootstrap shared by the
//! `biblio-app` binary and the `biblio` CLI.

pub mod bootstrap;
pub mod modules;

/// Re-export commonly used types
pub use modules::*;
