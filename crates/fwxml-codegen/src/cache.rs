//! Build cache keyed by program content hash
//!
//! Reloading configuration should not rebuild templates that did not change.
//! Tapes are immutable, so one cached tape backs every expander built from
//! the same program.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use fwxml_core::Tape;

use crate::builder::assemble;
use crate::error::BuildError;
use crate::ir::Program;

/// Thread-safe cache of assembled tapes
#[derive(Debug, Default)]
pub struct BuildCache {
    tapes: Mutex<HashMap<String, Arc<Tape>>>,
}

impl BuildCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached tape for `program`, assembling it on a miss
    pub fn get_or_build(&self, program: &Program) -> Result<Arc<Tape>, BuildError> {
        let key = program.content_hash();
        if let Some(tape) = self.get(&key) {
            tracing::debug!(template = %program.name, hash = %&key[..8], "build cache hit");
            return Ok(tape);
        }

        // Assemble outside the lock; a racing build of the same program
        // yields an identical tape and the first insert wins.
        let tape = Arc::new(assemble(program)?);
        let mut tapes = self.tapes.lock().unwrap_or_else(PoisonError::into_inner);
        let tape = tapes.entry(key).or_insert(tape);
        tracing::debug!(template = %program.name, "build cache miss");
        Ok(Arc::clone(tape))
    }

    /// Look up a tape by content hash
    pub fn get(&self, hash: &str) -> Option<Arc<Tape>> {
        self.tapes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(hash)
            .cloned()
    }

    /// Drop a cached tape
    pub fn invalidate(&self, hash: &str) -> bool {
        self.tapes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(hash)
            .is_some()
    }

    /// Number of cached tapes
    pub fn len(&self) -> usize {
        self.tapes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every cached tape
    pub fn clear(&self) {
        self.tapes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}
