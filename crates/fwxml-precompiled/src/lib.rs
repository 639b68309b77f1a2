//! Precompiled fwxml expanders
//!
//! `build.rs` runs the generator over the fixture templates and this crate
//! includes the result, so every build compiles the generated modules.
//!
//! ```rust
//! use fwxml_precompiled::tpl_edge;
//!
//! let mut expander = tpl_edge::expander()?;
//! let xml = expander.expand_str("abcdef0042", tpl_edge::OUTPUT_LEN_UTF16 as usize)?;
//! assert!(xml.ends_with("<tail>0042</tail>\n</edge>\n"));
//! # Ok::<(), fwxml_core::Error>(())
//! ```

#![forbid(unsafe_code)]

include!(concat!(env!("OUT_DIR"), "/statement.rs"));
include!(concat!(env!("OUT_DIR"), "/edge.rs"));
