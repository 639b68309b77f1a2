//! Per-worker expander instances
//!
//! An expander's cursors make it single-caller. The pool keeps idle instances
//! over one shared tape and hands each concurrent worker its own.

use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex, PoisonError};

use crate::expander::CompiledExpander;
use crate::tape::Tape;

/// Default number of idle instances kept around
const DEFAULT_MAX_IDLE: usize = 64;

/// A pool of expanders sharing one tape
#[derive(Debug)]
pub struct ExpanderPool {
    tape: Arc<Tape>,
    idle: Mutex<Vec<CompiledExpander>>,
    max_idle: usize,
}

impl ExpanderPool {
    /// Create an empty pool over `tape`
    pub fn new(tape: Arc<Tape>) -> Self {
        Self {
            tape,
            idle: Mutex::new(Vec::new()),
            max_idle: DEFAULT_MAX_IDLE,
        }
    }

    /// Limit how many returned instances are kept for reuse
    pub fn with_max_idle(mut self, max_idle: usize) -> Self {
        self.max_idle = max_idle;
        self
    }

    /// The shared tape
    pub fn tape(&self) -> &Arc<Tape> {
        &self.tape
    }

    /// Take an idle expander, or build a fresh one over the shared tape.
    ///
    /// The instance goes back to the pool when the guard is dropped.
    pub fn checkout(&self) -> PooledExpander<'_> {
        let reused = self
            .idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop();
        let expander = reused.unwrap_or_else(|| {
            tracing::trace!("expander pool empty, creating instance");
            CompiledExpander::new(Arc::clone(&self.tape))
        });
        PooledExpander {
            pool: self,
            expander,
        }
    }

    /// Number of idle instances
    pub fn idle(&self) -> usize {
        self.idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn give_back(&self, expander: CompiledExpander) {
        let mut idle = self.idle.lock().unwrap_or_else(PoisonError::into_inner);
        if idle.len() < self.max_idle {
            idle.push(expander);
        }
    }
}

impl From<CompiledExpander> for ExpanderPool {
    fn from(expander: CompiledExpander) -> Self {
        let pool = Self::new(Arc::clone(expander.tape()));
        pool.give_back(expander);
        pool
    }
}

/// An expander checked out of an [`ExpanderPool`]
#[derive(Debug)]
pub struct PooledExpander<'a> {
    pool: &'a ExpanderPool,
    expander: CompiledExpander,
}

impl Deref for PooledExpander<'_> {
    type Target = CompiledExpander;

    fn deref(&self) -> &CompiledExpander {
        &self.expander
    }
}

impl DerefMut for PooledExpander<'_> {
    fn deref_mut(&mut self) -> &mut CompiledExpander {
        &mut self.expander
    }
}

impl Drop for PooledExpander<'_> {
    fn drop(&mut self) {
        let detached = self.expander.detached();
        let expander = std::mem::replace(&mut self.expander, detached);
        self.pool.give_back(expander);
    }
}
