//! Expander runtime
//!
//! Runs a [`Tape`] against a positional input record. Both output paths share
//! one dispatch loop and differ only in the [`Sink`] that receives literals
//! and copied fields:
//!
//! - char mode writes UTF-16 code units and copies input verbatim, lone
//!   surrogates included
//! - byte mode writes UTF-8, using each literal's cached encoding and
//!   transcoding copied fields one code unit at a time
//!
//! An expander keeps its cursors between calls only so callers can inspect
//! where the last call stopped; every call resets them on entry.

use std::sync::Arc;

use crate::error::ExpandError;
use crate::tape::{Literal, Op, Tape};

type ExpandResult<T> = std::result::Result<T, ExpandError>;

/// A compiled template ready to expand input records.
///
/// Expansion takes `&mut self`, so one instance serves one caller at a time.
/// Use [`CompiledExpander::fork`] or an [`ExpanderPool`](crate::ExpanderPool)
/// to give each worker its own instance over the same shared tape.
#[derive(Debug)]
pub struct CompiledExpander {
    tape: Arc<Tape>,
    input_pos: usize,
    output_pos: usize,
    loops: Vec<u32>,
}

impl CompiledExpander {
    /// Create an expander over a shared tape
    pub fn new(tape: Arc<Tape>) -> Self {
        let loops = Vec::with_capacity(tape.max_depth());
        Self {
            tape,
            input_pos: 0,
            output_pos: 0,
            loops,
        }
    }

    /// A fresh instance sharing this expander's tape and literal caches
    pub fn fork(&self) -> Self {
        Self::new(Arc::clone(&self.tape))
    }

    /// Same tape, zeroed cursors, no preallocated loop stack
    pub(crate) fn detached(&self) -> Self {
        Self {
            tape: Arc::clone(&self.tape),
            input_pos: 0,
            output_pos: 0,
            loops: Vec::new(),
        }
    }

    /// The tape this expander runs
    pub fn tape(&self) -> &Arc<Tape> {
        &self.tape
    }

    /// Input characters consumed by the last call, up to where it stopped
    pub fn input_position(&self) -> usize {
        self.input_pos
    }

    /// Output units (char mode) or bytes (byte mode) written by the last call
    pub fn output_position(&self) -> usize {
        self.output_pos
    }

    /// Expand `input` as UTF-16 code units into `out`.
    ///
    /// Returns the number of units written.
    pub fn expand(&mut self, input: &[u16], out: &mut [u16]) -> ExpandResult<usize> {
        self.run(input, &mut Utf16Sink { out })
    }

    /// Expand `input` as UTF-8 into `out`.
    ///
    /// Returns the number of bytes written. Input surrogates are rejected with
    /// [`ExpandError::NonBmpCharacter`]; use [`expand`](Self::expand) when the
    /// data may hold characters outside the BMP.
    pub fn expand_bytes(&mut self, input: &[u16], out: &mut [u8]) -> ExpandResult<usize> {
        self.run(input, &mut Utf8Sink { out })
    }

    /// Char-mode expansion into a new buffer of `capacity` units
    pub fn expand_to_vec(&mut self, input: &[u16], capacity: usize) -> ExpandResult<Vec<u16>> {
        let mut out = vec![0u16; capacity];
        let written = self.expand(input, &mut out)?;
        out.truncate(written);
        Ok(out)
    }

    /// Byte-mode expansion into a new buffer of `capacity` bytes
    pub fn expand_bytes_to_vec(&mut self, input: &[u16], capacity: usize) -> ExpandResult<Vec<u8>> {
        let mut out = vec![0u8; capacity];
        let written = self.expand_bytes(input, &mut out)?;
        out.truncate(written);
        Ok(out)
    }

    /// Char-mode expansion of a Rust string.
    ///
    /// `capacity` counts UTF-16 code units. Fails with
    /// [`ExpandError::InvalidUtf16`] if a field boundary cut a surrogate pair.
    pub fn expand_str(&mut self, input: &str, capacity: usize) -> ExpandResult<String> {
        let input: Vec<u16> = input.encode_utf16().collect();
        let units = self.expand_to_vec(&input, capacity)?;
        String::from_utf16(&units).map_err(|_| ExpandError::InvalidUtf16)
    }

    fn run<S: Sink>(&mut self, input: &[u16], sink: &mut S) -> ExpandResult<usize> {
        let Self {
            tape,
            input_pos,
            output_pos,
            loops,
        } = self;

        *input_pos = 0;
        *output_pos = 0;
        loops.clear();

        let ops = tape.ops();
        let literals = tape.literals();
        let mut pc = 0;

        while let Some(&op) = ops.get(pc) {
            match op {
                Op::Literal(index) => {
                    sink.literal(&literals[index as usize], output_pos)?;
                    pc += 1;
                }
                Op::Copy(width) => {
                    let width = width as usize;
                    let remaining = input.len() - *input_pos;
                    if remaining < width {
                        return Err(ExpandError::InputExhausted {
                            offset: *input_pos,
                            needed: width,
                            remaining,
                        });
                    }
                    let end = *input_pos + width;
                    sink.field(&input[*input_pos..end], *input_pos, output_pos)?;
                    *input_pos = end;
                    pc += 1;
                }
                Op::Enter { count, end } => {
                    if count == 0 {
                        pc = end as usize;
                    } else {
                        loops.push(count);
                        pc += 1;
                    }
                }
                Op::Next { start } => match loops.last_mut() {
                    Some(left) if *left > 1 => {
                        *left -= 1;
                        pc = start as usize + 1;
                    }
                    _ => {
                        loops.pop();
                        pc += 1;
                    }
                },
            }
        }

        Ok(*output_pos)
    }
}

/// Output side of the dispatch loop
trait Sink {
    fn literal(&mut self, literal: &Literal, pos: &mut usize) -> ExpandResult<()>;

    /// `offset` is the input offset of `units[0]`
    fn field(&mut self, units: &[u16], offset: usize, pos: &mut usize) -> ExpandResult<()>;
}

struct Utf16Sink<'a> {
    out: &'a mut [u16],
}

impl Utf16Sink<'_> {
    fn put(&mut self, units: &[u16], pos: &mut usize) -> ExpandResult<()> {
        let end = *pos + units.len();
        if end > self.out.len() {
            return Err(ExpandError::OutputCapacityExceeded {
                capacity: self.out.len(),
                required: end,
            });
        }
        self.out[*pos..end].copy_from_slice(units);
        *pos = end;
        Ok(())
    }
}

impl Sink for Utf16Sink<'_> {
    fn literal(&mut self, literal: &Literal, pos: &mut usize) -> ExpandResult<()> {
        self.put(literal.utf16(), pos)
    }

    fn field(&mut self, units: &[u16], _offset: usize, pos: &mut usize) -> ExpandResult<()> {
        self.put(units, pos)
    }
}

struct Utf8Sink<'a> {
    out: &'a mut [u8],
}

impl Sink for Utf8Sink<'_> {
    fn literal(&mut self, literal: &Literal, pos: &mut usize) -> ExpandResult<()> {
        let bytes = literal.utf8();
        let end = *pos + bytes.len();
        if end > self.out.len() {
            return Err(ExpandError::OutputCapacityExceeded {
                capacity: self.out.len(),
                required: end,
            });
        }
        self.out[*pos..end].copy_from_slice(bytes);
        *pos = end;
        Ok(())
    }

    fn field(&mut self, units: &[u16], offset: usize, pos: &mut usize) -> ExpandResult<()> {
        // Surrogates are the only u16 values that are not scalar values.
        let mut len = 0;
        for (i, &unit) in units.iter().enumerate() {
            let ch = char::from_u32(u32::from(unit)).ok_or(ExpandError::NonBmpCharacter {
                offset: offset + i,
                unit,
            })?;
            len += ch.len_utf8();
        }

        let end = *pos + len;
        if end > self.out.len() {
            return Err(ExpandError::OutputCapacityExceeded {
                capacity: self.out.len(),
                required: end,
            });
        }

        // Every unit was checked above.
        for ch in char::decode_utf16(units.iter().copied()).flatten() {
            *pos += ch.encode_utf8(&mut self.out[*pos..]).len();
        }
        Ok(())
    }
}
