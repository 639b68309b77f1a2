//! Flattened instruction tape
//!
//! A [`Tape`] is the executable form of a template: a flat list of [`Op`]s
//! plus the literal segments they reference, each pre-encoded as UTF-16 and
//! UTF-8. Repeat groups become `Enter`/`Next` pairs that jump to each other.
//!
//! ```text
//! <a>{field:2}</a>{repeat:3}<b>{field:1}</b>{end}
//!
//! 0: Literal(0)          "<a>"
//! 1: Copy(2)
//! 2: Literal(1)          "</a>"
//! 3: Enter { count: 3, end: 8 }
//! 4: Literal(2)          "<b>"
//! 5: Copy(1)
//! 6: Literal(3)          "</b>"
//! 7: Next { start: 3 }
//! ```
//!
//! Tapes are immutable once validated and are shared between expander
//! instances behind an `Arc`.

use crate::error::{Error, Result};

/// A single tape instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    /// Emit the literal at this index
    Literal(u32),

    /// Copy this many UTF-16 code units from the input
    Copy(u32),

    /// Start a repeat group; `end` is the index just past the matching `Next`
    Enter {
        /// Iterations
        count: u32,
        /// Index of the op following the group
        end: u32,
    },

    /// Close a repeat group; `start` is the index of the matching `Enter`
    Next {
        /// Index of the matching `Enter`
        start: u32,
    },
}

/// Literal output text with both encodings computed up front
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Literal {
    text: Box<str>,
    utf16: Box<[u16]>,
}

impl Literal {
    /// Encode `text` once for both output paths
    pub fn new(text: &str) -> Self {
        Self {
            text: text.into(),
            utf16: text.encode_utf16().collect(),
        }
    }

    /// The literal text
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Text as UTF-16 code units
    pub fn utf16(&self) -> &[u16] {
        &self.utf16
    }

    /// Text as UTF-8 bytes
    pub fn utf8(&self) -> &[u8] {
        self.text.as_bytes()
    }
}

/// A validated instruction tape
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tape {
    ops: Vec<Op>,
    literals: Vec<Literal>,
    max_depth: usize,
}

impl Tape {
    /// Assemble a tape, checking that every jump and literal reference is sound.
    pub fn new(ops: Vec<Op>, literals: Vec<Literal>) -> Result<Self> {
        let max_depth = validate(&ops, literals.len())?;
        Ok(Self {
            ops,
            literals,
            max_depth,
        })
    }

    /// Assemble a tape from static tables, as emitted by the source generator.
    pub fn from_static(ops: &[Op], literals: &[&str]) -> Result<Self> {
        Self::new(
            ops.to_vec(),
            literals.iter().map(|text| Literal::new(text)).collect(),
        )
    }

    /// The instructions
    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    /// The literal table
    pub fn literals(&self) -> &[Literal] {
        &self.literals
    }

    /// Deepest repeat-group nesting on the tape
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }
}

fn invalid(index: usize, reason: impl Into<String>) -> Error {
    Error::InvalidTape {
        index,
        reason: reason.into(),
    }
}

/// Returns the maximum nesting depth.
fn validate(ops: &[Op], literal_count: usize) -> Result<usize> {
    if u32::try_from(ops.len()).is_err() {
        return Err(invalid(ops.len(), "tape is too long"));
    }

    let mut open: Vec<usize> = Vec::new();
    let mut max_depth = 0;

    for (index, op) in ops.iter().enumerate() {
        match *op {
            Op::Literal(lit) => {
                if lit as usize >= literal_count {
                    return Err(invalid(
                        index,
                        format!("literal {lit} out of range ({literal_count} literals)"),
                    ));
                }
            }
            Op::Copy(_) => {}
            Op::Enter { end, .. } => {
                let end = end as usize;
                if end <= index + 1 || end > ops.len() {
                    return Err(invalid(index, format!("group end {end} out of range")));
                }
                if ops[end - 1] != (Op::Next { start: index as u32 }) {
                    return Err(invalid(index, "group end does not close this group"));
                }
                open.push(index);
                max_depth = max_depth.max(open.len());
            }
            Op::Next { start } => match open.pop() {
                Some(expected) if expected == start as usize => {}
                Some(expected) => {
                    return Err(invalid(
                        index,
                        format!("group close points at {start}, innermost open group is {expected}"),
                    ));
                }
                None => return Err(invalid(index, "group close without an open group")),
            },
        }
    }

    if let Some(unclosed) = open.pop() {
        return Err(invalid(unclosed, "group is never closed"));
    }

    Ok(max_depth)
}
