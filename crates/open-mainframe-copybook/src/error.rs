//! Copybook crate error types.
//!
//! Data-quality problems in a copybook never surface here: the tokenizer,
//! analyzer and resolver degrade to documented defaults and log through
//! `tracing`. Only contract violations become a [`CopybookError`].

use miette::Diagnostic;
use thiserror::Error;

/// Errors produced by the copybook parser.
#[derive(Debug, Error, Diagnostic)]
pub enum CopybookError {
    /// The input contained no data description entry that can own storage.
    #[error("no data description entries found in {source_name}")]
    #[diagnostic(
        code(copybook::no_data_items),
        help("a copybook must declare at least one level 01-49 or 77 item")
    )]
    NoDataItems {
        /// Name of the copybook source.
        source_name: String,
    },
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, CopybookError>;
