//! fwxml Code Generation
//!
//! This crate turns template source into something the runtime can execute.
//!
//! # Pipeline Overview
//!
//! ```text
//! ┌──────────┐     ┌─────────┐     ┌─────────┐     ┌──────────────┐
//! │ Template │────▶│   IR    │────▶│  Tape   │────▶│   Expander   │
//! │  Source  │     │ (Parse) │     │ (Build) │     │ (fwxml-core) │
//! └──────────┘     └─────────┘     └─────────┘     └──────────────┘
//!                                       │
//!                                       ▼
//!                                ┌─────────────┐
//!                                │ Rust module │
//!                                │ (Generate)  │
//!                                └─────────────┘
//! ```
//!
//! # Example
//!
//! ```rust
//! let mut expander = fwxml_codegen::compile("<acct>{field:4}</acct>")?;
//! assert_eq!(expander.expand_str("0042", 64)?, "<acct>0042</acct>");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod builder;
pub mod cache;
pub mod compiler;
pub mod error;
pub mod generator;
pub mod ir;
pub mod parser;

pub use builder::build;
pub use cache::BuildCache;
pub use compiler::{CompileOptions, CompiledTemplate, Compiler};
pub use error::{BuildError, Error, ParseError, ParseErrorKind, Result};
pub use generator::Generator;
pub use ir::{Instruction, Program};
pub use parser::Parser;

use fwxml_core::CompiledExpander;

/// Parse and build template source in one step
pub fn compile(source: &str) -> Result<CompiledExpander> {
    let program = Parser::new().parse("template", source)?;
    Ok(build(&program)?)
}
