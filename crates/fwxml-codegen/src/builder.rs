//! Program builder
//!
//! Flattens the IR tree into a [`Tape`]: literals are interned and encoded
//! once, repeat groups become `Enter`/`Next` jump pairs.

use std::collections::HashMap;
use std::sync::Arc;

use fwxml_core::{CompiledExpander, Literal, Op, Tape};

use crate::error::BuildError;
use crate::ir::{Instruction, Program};

/// Build a ready-to-run expander from a program
pub fn build(program: &Program) -> Result<CompiledExpander, BuildError> {
    let tape = assemble(program)?;
    Ok(CompiledExpander::new(Arc::new(tape)))
}

/// Flatten a program into a validated tape
pub fn assemble(program: &Program) -> Result<Tape, BuildError> {
    let mut assembler = Assembler::default();
    assembler.emit(&program.instructions)?;

    tracing::debug!(
        template = %program.name,
        ops = assembler.ops.len(),
        literals = assembler.literals.len(),
        "assembled tape"
    );

    Tape::new(assembler.ops, assembler.literals).map_err(BuildError::InvalidTape)
}

#[derive(Default)]
struct Assembler<'a> {
    ops: Vec<Op>,
    literals: Vec<Literal>,
    interned: HashMap<&'a str, u32>,
}

impl<'a> Assembler<'a> {
    fn emit(&mut self, instructions: &'a [Instruction]) -> Result<(), BuildError> {
        for instruction in instructions {
            match instruction {
                Instruction::Literal(text) => {
                    let index = self.intern(text)?;
                    self.ops.push(Op::Literal(index));
                }
                Instruction::CopyField { width } => self.ops.push(Op::Copy(*width)),
                Instruction::RepeatGroup { count, body } => {
                    let start = self.ops.len();
                    let start_index = to_u32("op count", start)?;
                    self.ops.push(Op::Enter {
                        count: *count,
                        end: 0,
                    });
                    self.emit(body)?;
                    self.ops.push(Op::Next { start: start_index });
                    let end = to_u32("op count", self.ops.len())?;
                    self.ops[start] = Op::Enter { count: *count, end };
                }
            }
        }
        Ok(())
    }

    fn intern(&mut self, text: &'a str) -> Result<u32, BuildError> {
        if let Some(&index) = self.interned.get(text) {
            return Ok(index);
        }
        let index = to_u32("literal count", self.literals.len())?;
        self.literals.push(Literal::new(text));
        self.interned.insert(text, index);
        Ok(index)
    }
}

fn to_u32(what: &'static str, value: usize) -> Result<u32, BuildError> {
    u32::try_from(value).map_err(|_| BuildError::TooLarge { what, value })
}
