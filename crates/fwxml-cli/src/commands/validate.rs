//! Validate configuration and templates

use anyhow::{Context, Result};
use fwxml_codegen::{Parser, build};
use fwxml_core::Config;

/// Run the validate command
pub async fn run(config_path: &str) -> Result<()> {
    tracing::info!("Validating configuration: {}", config_path);

    let config = Config::load(config_path).context("Failed to load configuration")?;
    tracing::info!("✓ Project: {}", config.project.name);

    let names = config.template_names().context("Failed to list templates")?;
    if names.is_empty() {
        tracing::warn!("No templates found in {}", config.templates_dir().display());
    }

    for configured in config.project.templates.keys() {
        if !names.contains(configured) {
            tracing::warn!("Template '{}' is configured but has no source", configured);
        }
    }

    let parser = Parser::new();
    let mut failed = 0;
    for name in &names {
        let source = config.load_template(name)?;
        let result = parser
            .parse(name, &source)
            .map_err(fwxml_codegen::Error::from)
            .and_then(|program| {
                build(&program)?;
                Ok(program)
            });

        match result {
            Ok(program) => {
                tracing::info!(
                    "✓ {} ({} fields, input width {}, output {} units)",
                    name,
                    program.field_count(),
                    program.input_width(),
                    program.output_len_utf16()
                );
                let capacity = config.output_capacity(name) as u64;
                if program.output_len_utf16() > capacity {
                    tracing::warn!(
                        "  {} needs {} output units but its capacity is {}",
                        name,
                        program.output_len_utf16(),
                        capacity
                    );
                }
            }
            Err(e) => {
                tracing::error!("✗ {}: {}", name, e);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{} of {} templates failed validation", failed, names.len());
    }

    tracing::info!("✓ Configuration is valid");
    Ok(())
}
