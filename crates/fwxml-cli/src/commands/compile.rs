//! Compile templates

use anyhow::{Context, Result};
use fwxml_codegen::{CompileOptions, CompiledTemplate, Compiler};
use fwxml_core::Config;
use serde::Serialize;

/// One line of the `--json` summary
#[derive(Debug, Serialize)]
struct TemplateSummary<'a> {
    name: &'a str,
    hash: &'a str,
    fields: usize,
    input_width: u64,
    output_len_utf16: u64,
    max_output_len_utf8: u64,
    ops: usize,
    literals: usize,
    rust_source: Option<String>,
}

impl<'a> From<&'a CompiledTemplate> for TemplateSummary<'a> {
    fn from(compiled: &'a CompiledTemplate) -> Self {
        Self {
            name: &compiled.name,
            hash: &compiled.hash,
            fields: compiled.program.field_count(),
            input_width: compiled.program.input_width(),
            output_len_utf16: compiled.program.output_len_utf16(),
            max_output_len_utf8: compiled.program.max_output_len_utf8(),
            ops: compiled.tape.ops().len(),
            literals: compiled.tape.literals().len(),
            rust_source: compiled
                .rust_source
                .as_ref()
                .map(|p| p.display().to_string()),
        }
    }
}

/// Run the compile command
pub async fn run(
    config_path: &str,
    template: Option<&str>,
    emit_rust: bool,
    force: bool,
    json: bool,
) -> Result<()> {
    tracing::info!("Loading configuration from {}", config_path);

    let config = Config::load(config_path).context("Failed to load configuration")?;

    let compiler = Compiler::new(CompileOptions {
        out_dir: config.out_dir(),
        cache_dir: config.base_path.join(".fwxml/cache"),
        emit_rust,
        force,
    });

    let results = if let Some(name) = template {
        let path = config.template_path(name)?;
        vec![
            compiler
                .compile_file(&path)
                .with_context(|| format!("Failed to compile template '{name}'"))?,
        ]
    } else {
        let templates_dir = config.templates_dir();
        tracing::info!("Compiling all templates in {}", templates_dir.display());
        compiler
            .compile_all(&templates_dir)
            .context("Failed to compile templates")?
    };

    tracing::info!("Compiled {} templates:", results.len());
    for compiled in &results {
        tracing::info!(
            "  ✓ {} ({} ops, input width {}, hash: {}...)",
            compiled.name,
            compiled.tape.ops().len(),
            compiled.program.input_width(),
            &compiled.hash[..8]
        );
        if let Some(path) = &compiled.rust_source {
            tracing::info!("    → {}", path.display());
        }
    }

    if json {
        let summary: Vec<TemplateSummary<'_>> = results.iter().map(TemplateSummary::from).collect();
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }

    tracing::info!("Compilation complete");
    Ok(())
}
