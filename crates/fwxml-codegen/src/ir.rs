//! Intermediate Representation for templates
//!
//! The IR is the parsed tree form of a template: literal text, fixed-width
//! field copies and fixed-count repeat groups. Its shape never depends on
//! input data, so everything about an expansion except the copied characters
//! is known here.

use sha2::{Digest, Sha256};

/// A single template instruction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    /// Emit fixed text
    Literal(String),

    /// Copy `width` characters from the input
    CopyField {
        /// Field width in UTF-16 code units
        width: u32,
    },

    /// Run `body` exactly `count` times
    RepeatGroup {
        /// Iterations
        count: u32,
        /// Instructions repeated
        body: Vec<Instruction>,
    },
}

/// Intermediate representation of a complete template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    /// Template name (used for generated module naming)
    pub name: String,

    /// Top-level instructions, in order
    pub instructions: Vec<Instruction>,
}

impl Program {
    /// Create a new empty Program
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            instructions: Vec::new(),
        }
    }

    /// Hex SHA-256 of the program structure.
    ///
    /// The name is not hashed, so identical templates share a cache entry.
    pub fn content_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hash_instructions(&mut hasher, &self.instructions);
        hex::encode(hasher.finalize())
    }

    /// Number of `CopyField` instructions in the tree
    pub fn field_count(&self) -> usize {
        fn count(instructions: &[Instruction]) -> usize {
            instructions
                .iter()
                .map(|i| match i {
                    Instruction::Literal(_) => 0,
                    Instruction::CopyField { .. } => 1,
                    Instruction::RepeatGroup { body, .. } => count(body),
                })
                .sum()
        }
        count(&self.instructions)
    }

    /// Input characters one complete expansion consumes
    pub fn input_width(&self) -> u64 {
        self.measure(|_| 0, u64::from)
    }

    /// Exact char-mode output length in UTF-16 code units
    pub fn output_len_utf16(&self) -> u64 {
        self.measure(|text| text.encode_utf16().count() as u64, u64::from)
    }

    /// Upper bound on byte-mode output length.
    ///
    /// Copied BMP characters take at most three UTF-8 bytes.
    pub fn max_output_len_utf8(&self) -> u64 {
        self.measure(|text| text.len() as u64, |width| u64::from(width) * 3)
    }

    fn measure(
        &self,
        literal: impl Fn(&str) -> u64 + Copy,
        field: impl Fn(u32) -> u64 + Copy,
    ) -> u64 {
        fn walk(
            instructions: &[Instruction],
            literal: impl Fn(&str) -> u64 + Copy,
            field: impl Fn(u32) -> u64 + Copy,
        ) -> u64 {
            instructions.iter().fold(0u64, |total, i| {
                let size = match i {
                    Instruction::Literal(text) => literal(text),
                    Instruction::CopyField { width } => field(*width),
                    Instruction::RepeatGroup { count, body } => {
                        walk(body, literal, field).saturating_mul(u64::from(*count))
                    }
                };
                total.saturating_add(size)
            })
        }
        walk(&self.instructions, literal, field)
    }
}

fn hash_instructions(hasher: &mut Sha256, instructions: &[Instruction]) {
    hasher.update((instructions.len() as u64).to_le_bytes());
    for instruction in instructions {
        match instruction {
            Instruction::Literal(text) => {
                hasher.update([b'L']);
                hasher.update((text.len() as u64).to_le_bytes());
                hasher.update(text.as_bytes());
            }
            Instruction::CopyField { width } => {
                hasher.update([b'F']);
                hasher.update(width.to_le_bytes());
            }
            Instruction::RepeatGroup { count, body } => {
                hasher.update([b'R']);
                hasher.update(count.to_le_bytes());
                hash_instructions(hasher, body);
            }
        }
    }
}
