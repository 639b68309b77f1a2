//! Initialize a new fwxml project

use anyhow::Result;
use std::path::Path;
use tokio::fs;

use fwxml_core::config::CONFIG_FILE;

const EXAMPLE_TEMPLATE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
{# Three customer records of 27 characters each: id(5) name(20) country(2) #}
<Customers>
{repeat:3}  <Customer>
    <Id>{field:5}</Id>
    <Name>{field:20}</Name>
    <Country>{field:2}</Country>
  </Customer>
{end}</Customers>
"#;

const EXAMPLE_DATA: &str =
    "00001Ada Lovelace        GB00002Grace Hopper        US00003Linus Torvalds      FI\n";

const GITIGNORE: &str = r#"# fwxml generated sources
.fwxml/

# Expanded output
out/

# IDE
.idea/
.vscode/
*.swp
"#;

/// Run the init command
pub async fn run(path: &str, name: Option<&str>) -> Result<()> {
    let project_dir = Path::new(path);

    if !project_dir.exists() {
        fs::create_dir_all(project_dir).await?;
    }

    let abs_path = fs::canonicalize(project_dir).await?;

    let project_name = match name {
        Some(n) => n.to_string(),
        None => abs_path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|s| s.to_string())
            .ok_or_else(|| anyhow::anyhow!("Could not determine project name from path"))?,
    };

    if project_dir.join(CONFIG_FILE).exists() {
        anyhow::bail!(
            "Directory '{}' already contains a {}",
            project_dir.display(),
            CONFIG_FILE
        );
    }

    tracing::info!("Creating new fwxml project: {}", project_name);

    fs::create_dir_all(project_dir.join("templates")).await?;
    fs::create_dir_all(project_dir.join("data")).await?;

    let config = format!(
        r#"# fwxml project configuration
name: {project_name}
templates_dir: templates
out_dir: .fwxml/generated

# Output buffer size (UTF-16 units or bytes) when a template sets none
default_output_capacity: 65536

templates:
  example:
    description: Customer list
    output_capacity: 4096
"#
    );
    fs::write(project_dir.join(CONFIG_FILE), config).await?;
    fs::write(project_dir.join("templates/example.fwt"), EXAMPLE_TEMPLATE).await?;
    fs::write(project_dir.join("data/example.dat"), EXAMPLE_DATA).await?;
    fs::write(project_dir.join(".gitignore"), GITIGNORE).await?;

    tracing::info!(
        "✓ Created project '{}' at {}",
        project_name,
        abs_path.display()
    );
    tracing::info!("");
    tracing::info!("Next steps:");
    if path != "." {
        tracing::info!("  cd {}", project_dir.display());
    }
    tracing::info!("  fwxml validate                          # Check templates");
    tracing::info!("  fwxml expand example data/example.dat   # Produce XML");

    Ok(())
}
