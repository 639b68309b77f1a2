//! Expand a positional data file through a template

use std::path::PathBuf;

use anyhow::{Context, Result};
use fwxml_codegen::{CompileOptions, Compiler};
use fwxml_core::{Config, ExpandError};
use tokio::io::AsyncWriteExt;

/// Arguments of the expand command
#[derive(Debug)]
pub struct ExpandArgs {
    /// Template name
    pub template: String,
    /// Positional input file
    pub input: PathBuf,
    /// Use the UTF-8 output path
    pub bytes: bool,
    /// Output buffer size override
    pub capacity: Option<usize>,
    /// Output file, stdout when absent
    pub output: Option<PathBuf>,
}

/// Run the expand command
pub async fn run(config_path: &str, args: ExpandArgs) -> Result<()> {
    let config = Config::load(config_path).context("Failed to load configuration")?;

    let source = config.load_template(&args.template)?;
    let compiled = Compiler::new(CompileOptions::default())
        .compile_source(&args.template, &source)
        .with_context(|| format!("Failed to compile template '{}'", args.template))?;

    let data = tokio::fs::read_to_string(&args.input)
        .await
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    let record = data.trim_end_matches(['\r', '\n']);
    let input: Vec<u16> = record.encode_utf16().collect();

    let capacity = args
        .capacity
        .unwrap_or_else(|| config.output_capacity(&args.template));
    tracing::debug!(
        template = %compiled.name,
        input_len = input.len(),
        capacity,
        bytes = args.bytes,
        "expanding"
    );

    let mut expander = compiled.expander();
    let xml = if args.bytes {
        expander.expand_bytes_to_vec(&input, capacity)
    } else {
        expander
            .expand_to_vec(&input, capacity)
            .and_then(|units| {
                String::from_utf16(&units)
                    .map(String::into_bytes)
                    .map_err(|_| ExpandError::InvalidUtf16)
            })
    }
    .with_context(|| format!("Failed to expand {}", args.input.display()))?;

    let consumed = expander.input_position();
    if consumed < input.len() {
        tracing::warn!(
            "Ignored {} trailing input characters after offset {}",
            input.len() - consumed,
            consumed
        );
    }

    match &args.output {
        Some(path) => {
            tokio::fs::write(path, &xml)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::info!("✓ Wrote {} bytes to {}", xml.len(), path.display());
        }
        None => {
            let mut stdout = tokio::io::stdout();
            stdout.write_all(&xml).await?;
            stdout.flush().await?;
        }
    }

    Ok(())
}
