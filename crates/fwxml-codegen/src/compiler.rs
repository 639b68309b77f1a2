//! Template compiler
//!
//! Drives parse → build for template files, reusing cached tapes and
//! optionally writing precompiled Rust modules next to the project.
//!
//! Generated modules are also kept in an on-disk cache keyed by module name
//! and content hash, so a later run reuses them unless `force` is set.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use fwxml_core::config::TEMPLATE_EXTENSION;
use fwxml_core::{CompiledExpander, ExpanderPool, Tape};

use crate::cache::BuildCache;
use crate::error::{Error, Result};
use crate::generator::Generator;
use crate::ir::Program;
use crate::parser::Parser;

/// Options for the compiler
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Output directory for generated Rust sources
    pub out_dir: PathBuf,

    /// Cache directory for generated Rust kept between runs
    pub cache_dir: PathBuf,

    /// Whether to write a precompiled Rust module per template
    pub emit_rust: bool,

    /// Whether to skip both caches and force a rebuild
    pub force: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from(".fwxml/generated"),
            cache_dir: PathBuf::from(".fwxml/cache"),
            emit_rust: false,
            force: false,
        }
    }
}

/// Template compiler
pub struct Compiler {
    options: CompileOptions,
    parser: Parser,
    generator: Generator,
    cache: BuildCache,
    /// Generated module name → template that claimed it
    modules: Mutex<HashMap<String, String>>,
}

impl Compiler {
    /// Create a new compiler with the given options
    pub fn new(options: CompileOptions) -> Self {
        Self {
            parser: Parser::new(),
            generator: Generator::new().with_source_comment(),
            cache: BuildCache::new(),
            modules: Mutex::default(),
            options,
        }
    }

    /// The tape cache shared by every compilation on this compiler
    pub fn cache(&self) -> &BuildCache {
        &self.cache
    }

    /// Compile template source held in memory
    pub fn compile_source(&self, name: &str, source: &str) -> Result<CompiledTemplate> {
        let program = self.parser.parse(name, source)?;
        self.finish(program)
    }

    /// Compile a template file
    pub fn compile_file(&self, path: impl AsRef<Path>) -> Result<CompiledTemplate> {
        let path = path.as_ref();
        tracing::info!("Compiling template: {}", path.display());
        let program = self.parser.parse_file(path)?;
        self.finish(program)
    }

    /// Compile all templates in a directory
    ///
    /// A missing or unreadable directory is an error; an unreadable entry
    /// below it is skipped with a warning.
    pub fn compile_all(&self, templates_dir: impl AsRef<Path>) -> Result<Vec<CompiledTemplate>> {
        let templates_dir = templates_dir.as_ref();
        let mut paths = Vec::new();
        for entry in walkdir::WalkDir::new(templates_dir) {
            match entry {
                Ok(entry) => {
                    if entry
                        .path()
                        .extension()
                        .is_some_and(|ext| ext == TEMPLATE_EXTENSION)
                    {
                        paths.push(entry.into_path());
                    }
                }
                Err(err) if err.depth() == 0 => return Err(std::io::Error::from(err).into()),
                Err(err) => {
                    tracing::warn!(
                        "Skipping unreadable path in {}: {}",
                        templates_dir.display(),
                        err
                    );
                }
            }
        }
        paths.sort();

        paths.iter().map(|p| self.compile_file(p)).collect()
    }

    fn finish(&self, program: Program) -> Result<CompiledTemplate> {
        let hash = program.content_hash();

        if self.options.force {
            self.cache.invalidate(&hash);
        }
        let tape = self.cache.get_or_build(&program)?;

        let rust_source = if self.options.emit_rust {
            Some(self.emit(&program, &hash)?)
        } else {
            None
        };

        Ok(CompiledTemplate {
            name: program.name.clone(),
            hash,
            program,
            tape,
            rust_source,
        })
    }

    /// Write the generated module for `program` into the output directory
    fn emit(&self, program: &Program, hash: &str) -> Result<PathBuf> {
        let module = Generator::module_name(program);
        {
            let mut modules = self.modules.lock().unwrap_or_else(PoisonError::into_inner);
            let owner = modules
                .entry(module.clone())
                .or_insert_with(|| program.name.clone());
            if *owner != program.name {
                return Err(Error::ModuleCollision {
                    module,
                    first: owner.clone(),
                    second: program.name.clone(),
                });
            }
        }

        let cached = self
            .options
            .cache_dir
            .join(format!("{module}-{}.rs", &hash[..16]));
        let code = if !self.options.force && cached.exists() {
            tracing::debug!("Using cached Rust: {}", cached.display());
            std::fs::read_to_string(&cached)?
        } else {
            let code = self.generator.generate(program)?;
            std::fs::create_dir_all(&self.options.cache_dir)?;
            std::fs::write(&cached, &code)?;
            code
        };

        std::fs::create_dir_all(&self.options.out_dir)?;
        let path = self.options.out_dir.join(format!("{module}.rs"));
        // An unchanged module keeps its mtime so includers are not rebuilt.
        if std::fs::read_to_string(&path).ok().as_deref() != Some(code.as_str()) {
            std::fs::write(&path, &code)?;
            tracing::debug!("Saved generated Rust: {}", path.display());
        }
        Ok(path)
    }
}

/// A compiled template ready for expansion
#[derive(Debug, Clone)]
pub struct CompiledTemplate {
    /// Template name
    pub name: String,

    /// Content hash (build cache key)
    pub hash: String,

    /// The parsed program
    pub program: Program,

    /// Shared tape
    pub tape: Arc<Tape>,

    /// Generated Rust module, when emitted
    pub rust_source: Option<PathBuf>,
}

impl CompiledTemplate {
    /// A fresh expander over the shared tape
    pub fn expander(&self) -> CompiledExpander {
        CompiledExpander::new(Arc::clone(&self.tape))
    }

    /// A pool of expanders over the shared tape
    pub fn pool(&self) -> ExpanderPool {
        ExpanderPool::new(Arc::clone(&self.tape))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emitting(dir: &Path, force: bool) -> Compiler {
        Compiler::new(CompileOptions {
            out_dir: dir.join("gen"),
            cache_dir: dir.join("cache"),
            emit_rust: true,
            force,
        })
    }

    #[test]
    fn test_compile_options_default() {
        let opts = CompileOptions::default();
        assert!(!opts.emit_rust);
        assert!(!opts.force);
        assert_eq!(opts.out_dir, PathBuf::from(".fwxml/generated"));
        assert_eq!(opts.cache_dir, PathBuf::from(".fwxml/cache"));
    }

    #[test]
    fn test_compile_source_uses_cache() {
        let compiler = Compiler::new(CompileOptions::default());
        let a = compiler.compile_source("a", "<x>{field:2}</x>").unwrap();
        let b = compiler.compile_source("b", "<x>{field:2}</x>").unwrap();
        assert!(Arc::ptr_eq(&a.tape, &b.tape));
        assert_eq!(a.hash, b.hash);
        assert_eq!(compiler.cache().len(), 1);
        assert_eq!(a.expander().expand_str("hi", 16).unwrap(), "<x>hi</x>");
    }

    #[test]
    fn test_force_rebuilds() {
        let compiler = Compiler::new(CompileOptions {
            force: true,
            ..Default::default()
        });
        let a = compiler.compile_source("a", "{field:2}").unwrap();
        let b = compiler.compile_source("a", "{field:2}").unwrap();
        assert!(!Arc::ptr_eq(&a.tape, &b.tape));
        assert_eq!(*a.tape, *b.tape);
    }

    #[test]
    fn test_parse_error_is_reported() {
        let compiler = Compiler::new(CompileOptions::default());
        let err = compiler.compile_source("bad", "{repeat:2}").unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
        assert!(compiler.cache().is_empty());
    }

    #[test]
    fn test_compile_all_and_emit() {
        let dir = tempfile::tempdir().unwrap();
        let templates = dir.path().join("templates");
        std::fs::create_dir_all(&templates).unwrap();
        std::fs::write(templates.join("b.fwt"), "<b>{field:1}</b>").unwrap();
        std::fs::write(templates.join("a.fwt"), "<a>{field:1}</a>").unwrap();
        std::fs::write(templates.join("readme.md"), "not a template").unwrap();

        let out_dir = dir.path().join("gen");
        let compiled = emitting(dir.path(), false).compile_all(&templates).unwrap();

        let names: Vec<&str> = compiled.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(compiled[0].rust_source, Some(out_dir.join("tpl_a.rs")));
        let code = std::fs::read_to_string(out_dir.join("tpl_b.rs")).unwrap();
        assert!(code.contains("pub mod tpl_b"));
    }

    #[test]
    fn test_compile_all_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let compiler = Compiler::new(CompileOptions::default());
        let err = compiler.compile_all(dir.path().join("missing")).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_generated_rust_cache_survives_compiler() {
        let dir = tempfile::tempdir().unwrap();
        let source = "<x>{field:2}</x>";

        let first = emitting(dir.path(), false).compile_source("x", source).unwrap();
        let cached = dir
            .path()
            .join("cache")
            .join(format!("tpl_x-{}.rs", &first.hash[..16]));
        assert!(cached.exists());

        // A later compiler reuses the cached module as is.
        std::fs::write(&cached, "// cached\n").unwrap();
        let second = emitting(dir.path(), false).compile_source("x", source).unwrap();
        let out = second.rust_source.unwrap();
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "// cached\n");

        // Forcing regenerates it.
        emitting(dir.path(), true).compile_source("x", source).unwrap();
        let code = std::fs::read_to_string(&out).unwrap();
        assert!(code.contains("pub mod tpl_x"));
        assert_eq!(std::fs::read_to_string(&cached).unwrap(), code);
    }

    #[test]
    fn test_module_name_collision() {
        let dir = tempfile::tempdir().unwrap();
        let compiler = emitting(dir.path(), false);
        compiler.compile_source("a-b", "{field:1}").unwrap();
        let err = compiler.compile_source("a_b", "{field:2}").unwrap_err();
        assert!(matches!(
            err,
            Error::ModuleCollision { ref module, ref first, ref second }
                if module == "tpl_a_b" && first == "a-b" && second == "a_b"
        ));

        // Recompiling the same template is not a collision.
        compiler.compile_source("a-b", "{field:3}").unwrap();
    }

    #[test]
    fn test_no_collision_without_emit() {
        let compiler = Compiler::new(CompileOptions::default());
        compiler.compile_source("a-b", "{field:1}").unwrap();
        compiler.compile_source("a_b", "{field:1}").unwrap();
    }
}
