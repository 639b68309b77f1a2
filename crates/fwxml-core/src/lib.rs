//! fwxml Core Library
//!
//! This crate provides the runtime half of fwxml:
//! - The validated instruction tape a template compiles to
//! - The expander that runs a tape against fixed-width records
//! - Pooling of expander instances for concurrent workers
//! - Project configuration
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌──────────────┐
//! │    Tape     │────▶│  Expander   │────▶│ UTF-16 text  │
//! │ (immutable) │     │ (per call)  │     │ or UTF-8     │
//! └─────────────┘     └─────────────┘     └──────────────┘
//! ```
//!
//! Tapes are produced by `fwxml-codegen` from template source, or by the Rust
//! code it generates for templates shipped precompiled.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use fwxml_core::{CompiledExpander, Op, Tape};
//!
//! let tape = Tape::from_static(&[Op::Literal(0), Op::Copy(3), Op::Literal(1)], &["<id>", "</id>"])?;
//! let mut expander = CompiledExpander::new(Arc::new(tape));
//! assert_eq!(expander.expand_str("042", 64)?, "<id>042</id>");
//! # Ok::<(), fwxml_core::Error>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod expander;
pub mod pool;
pub mod tape;

pub use config::{Config, ProjectConfig};
pub use error::{Error, ExpandError, Result};
pub use expander::CompiledExpander;
pub use pool::{ExpanderPool, PooledExpander};
pub use tape::{Literal, Op, Tape};
