//! Rust source generation for precompiled expanders
//!
//! A template that is known ahead of time can ship as generated Rust: a
//! module holding the tape's op and literal tables as statics and a
//! constructor that rebuilds the tape through [`fwxml_core::Tape::from_static`].
//! Loading it skips the parser and builder entirely.
//!
//! ```rust,ignore
//! mod generated {
//!     include!(concat!(env!("OUT_DIR"), "/statement.rs"));
//! }
//!
//! let mut expander = generated::tpl_statement::expander()?;
//! ```

use proc_macro2::{Ident, Literal as TokenLiteral, Span, TokenStream};
use quote::quote;

use fwxml_core::{Op, Tape};

use crate::builder::assemble;
use crate::error::BuildError;
use crate::ir::Program;

/// Generator for precompiled expander modules
#[derive(Debug, Default)]
pub struct Generator {
    with_source_comment: bool,
}

impl Generator {
    /// Create a new generator
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefix the output with a comment describing the program
    pub fn with_source_comment(mut self) -> Self {
        self.with_source_comment = true;
        self
    }

    /// Name of the module generated for `program`
    pub fn module_name(program: &Program) -> String {
        let sanitized: String = program
            .name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
            .collect();
        format!("tpl_{sanitized}")
    }

    /// Generate Rust source for `program`
    pub fn generate(&self, program: &Program) -> Result<String, BuildError> {
        let tape = assemble(program)?;
        let tokens = self.module_tokens(program, &tape);

        let mut code = String::from("// @generated by fwxml-codegen. Do not edit.\n");
        if self.with_source_comment {
            code.push_str(&format!(
                "// template: {}\n// fields: {}, input width: {}, char output: {}\n",
                program.name,
                program.field_count(),
                program.input_width(),
                program.output_len_utf16(),
            ));
        }
        code.push_str(&tokens.to_string());
        code.push('\n');
        Ok(code)
    }

    fn module_tokens(&self, program: &Program, tape: &Tape) -> TokenStream {
        let module = Ident::new(&Self::module_name(program), Span::call_site());
        let name = program.name.as_str();
        let hash = program.content_hash();
        let ops = tape.ops().iter().map(op_tokens);
        let literals = tape.literals().iter().map(|l| l.as_str());
        let input_width = TokenLiteral::u64_unsuffixed(program.input_width());
        let output_len = TokenLiteral::u64_unsuffixed(program.output_len_utf16());

        quote! {
            #[allow(dead_code)]
            pub mod #module {
                /// Template name
                pub const NAME: &str = #name;

                /// Content hash of the compiled program
                pub const CONTENT_HASH: &str = #hash;

                /// Input characters one expansion consumes
                pub const INPUT_WIDTH: u64 = #input_width;

                /// Exact char-mode output length
                pub const OUTPUT_LEN_UTF16: u64 = #output_len;

                static OPS: &[::fwxml_core::Op] = &[#(#ops),*];

                static LITERALS: &[&str] = &[#(#literals),*];

                /// Build the tape from the static tables
                pub fn tape() -> ::fwxml_core::Result<::fwxml_core::Tape> {
                    ::fwxml_core::Tape::from_static(OPS, LITERALS)
                }

                /// A fresh expander for this template
                pub fn expander() -> ::fwxml_core::Result<::fwxml_core::CompiledExpander> {
                    Ok(::fwxml_core::CompiledExpander::new(::std::sync::Arc::new(tape()?)))
                }
            }
        }
    }
}

fn op_tokens(op: &Op) -> TokenStream {
    match *op {
        Op::Literal(index) => {
            let index = TokenLiteral::u32_unsuffixed(index);
            quote!(::fwxml_core::Op::Literal(#index))
        }
        Op::Copy(width) => {
            let width = TokenLiteral::u32_unsuffixed(width);
            quote!(::fwxml_core::Op::Copy(#width))
        }
        Op::Enter { count, end } => {
            let count = TokenLiteral::u32_unsuffixed(count);
            let end = TokenLiteral::u32_unsuffixed(end);
            quote!(::fwxml_core::Op::Enter { count: #count, end: #end })
        }
        Op::Next { start } => {
            let start = TokenLiteral::u32_unsuffixed(start);
            quote!(::fwxml_core::Op::Next { start: #start })
        }
    }
}
