//! CLI command implementations

pub mod compile;
pub mod expand;
pub mod init;
pub mod validate;
