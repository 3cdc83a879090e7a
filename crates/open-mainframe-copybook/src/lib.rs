//! COBOL copybook record layouts for OpenMainframe.
//!
//! This crate reads the data description entries of a copybook and resolves
//! the physical byte layout of every record it declares:
//! - Lexer: splits source lines into data description entries
//! - Picture: derives category and byte length from PICTURE and USAGE
//! - Hierarchy: nests entries by level number
//! - Resolver: assigns 1-based positions, applies REDEFINES and OCCURS
//! - Record: builds one layout per record (and per record variant)
//!
//! # Example
//!
//! ```
//! use open_mainframe_copybook::parse_copybook;
//!
//! let result = parse_copybook(
//!     "CUSTOMER",
//!     "01 CUSTOMER.\n   05 CUST-ID PIC 9(6).\n   05 CUST-NAME PIC X(30).",
//! )
//! .unwrap();
//! assert_eq!(result.total_length, 36);
//! assert_eq!(result.find_field("CUST-NAME").unwrap().start, 7);
//! ```
//!
//! The crate performs no I/O; callers hand it lines already in memory.

pub mod ast;
pub mod config;
pub mod error;
pub mod hierarchy;
pub mod lexer;
pub mod parser;
pub mod picture;
pub mod record;
pub mod resolver;

pub use ast::{ArrayElement, ConditionName, Field, FieldPosition, ParseResult, RecordLayout};
pub use config::ParserConfig;
pub use error::{CopybookError, Result};
pub use lexer::SourceFormat;
pub use parser::{parse_copybook, CopybookParser};
pub use picture::{analyze, Category, PictureInfo, Usage};
