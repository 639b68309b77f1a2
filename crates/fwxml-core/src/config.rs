//! Configuration parsing and validation
//!
//! A project is a directory holding `fwxml.yaml` and a templates directory of
//! `*.fwt` template sources.
//!
//! ```yaml
//! name: billing
//! templates_dir: templates
//! out_dir: .fwxml/generated
//! default_output_capacity: 65536
//! templates:
//!   statement:
//!     description: Monthly statement
//!     output_capacity: 262144
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Project configuration file name
pub const CONFIG_FILE: &str = "fwxml.yaml";

/// File extension of template sources
pub const TEMPLATE_EXTENSION: &str = "fwt";

/// Root project configuration from `fwxml.yaml`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project name
    pub name: String,

    /// Directory of template sources, relative to the project
    #[serde(default = "default_templates_dir")]
    pub templates_dir: String,

    /// Directory for generated Rust sources, relative to the project
    #[serde(default = "default_out_dir")]
    pub out_dir: String,

    /// Output buffer size used when a template sets none
    #[serde(default = "default_output_capacity")]
    pub default_output_capacity: usize,

    /// Per-template settings
    #[serde(default)]
    pub templates: HashMap<String, TemplateSettings>,
}

/// Settings for one template
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplateSettings {
    /// Human readable description
    #[serde(default)]
    pub description: Option<String>,

    /// Output buffer size for this template
    #[serde(default)]
    pub output_capacity: Option<usize>,
}

fn default_templates_dir() -> String {
    "templates".to_string()
}

fn default_out_dir() -> String {
    ".fwxml/generated".to_string()
}

fn default_output_capacity() -> usize {
    64 * 1024
}

impl ProjectConfig {
    /// Check values serde cannot
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::ConfigInvalid {
                message: "project name must not be empty".to_string(),
            });
        }
        if self.default_output_capacity == 0 {
            return Err(Error::ConfigInvalid {
                message: "default_output_capacity must be greater than zero".to_string(),
            });
        }
        for (name, settings) in &self.templates {
            if settings.output_capacity == Some(0) {
                return Err(Error::ConfigInvalid {
                    message: format!("template '{name}': output_capacity must be greater than zero"),
                });
            }
        }
        Ok(())
    }
}

/// Main configuration container
#[derive(Debug, Clone)]
pub struct Config {
    /// Project configuration
    pub project: ProjectConfig,

    /// Base path of the project
    pub base_path: PathBuf,
}

impl Config {
    /// Load configuration from a directory or a path to `fwxml.yaml`
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let config = Config::load("./my-project")?;
    /// println!("Project: {}", config.project.name);
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let (config_path, base_path) = if path.is_dir() {
            (path.join(CONFIG_FILE), path.to_path_buf())
        } else {
            (
                path.to_path_buf(),
                path.parent().unwrap_or(Path::new(".")).to_path_buf(),
            )
        };

        if !config_path.exists() {
            return Err(Error::ConfigNotFound {
                path: config_path.display().to_string(),
            });
        }

        let contents = std::fs::read_to_string(&config_path)?;
        let project: ProjectConfig = serde_yaml::from_str(&contents)?;
        project.validate()?;

        tracing::debug!(
            project = %project.name,
            base = %base_path.display(),
            "loaded configuration"
        );

        Ok(Self { project, base_path })
    }

    /// Directory holding template sources
    pub fn templates_dir(&self) -> PathBuf {
        self.base_path.join(&self.project.templates_dir)
    }

    /// Directory for generated sources
    pub fn out_dir(&self) -> PathBuf {
        self.base_path.join(&self.project.out_dir)
    }

    /// Path of the named template's source, which must exist
    pub fn template_path(&self, name: &str) -> Result<PathBuf> {
        let path = self
            .templates_dir()
            .join(format!("{name}.{TEMPLATE_EXTENSION}"));
        if !path.exists() {
            return Err(Error::TemplateNotFound {
                name: name.to_string(),
                path: path.display().to_string(),
            });
        }
        Ok(path)
    }

    /// Read the named template's source
    pub fn load_template(&self, name: &str) -> Result<String> {
        let path = self.template_path(name)?;
        Ok(std::fs::read_to_string(path)?)
    }

    /// Names of all templates in the templates directory, sorted
    pub fn template_names(&self) -> Result<Vec<String>> {
        let dir = self.templates_dir();
        if !dir.exists() {
            return Ok(vec![]);
        }

        let mut names: Vec<String> = std::fs::read_dir(&dir)?
            .filter_map(|e| match e {
                Ok(entry) => Some(entry.path()),
                Err(err) => {
                    tracing::warn!("Skipping unreadable entry in {}: {}", dir.display(), err);
                    None
                }
            })
            .filter(|p| p.extension().is_some_and(|ext| ext == TEMPLATE_EXTENSION))
            .filter_map(|p| p.file_stem().and_then(|s| s.to_str()).map(str::to_string))
            .collect();
        names.sort();
        Ok(names)
    }

    /// Output buffer size for the named template
    pub fn output_capacity(&self, name: &str) -> usize {
        self.project
            .templates
            .get(name)
            .and_then(|t| t.output_capacity)
            .unwrap_or(self.project.default_output_capacity)
    }
}
