//! Generates one expander module per template into `OUT_DIR`

use std::path::PathBuf;

use fwxml_codegen::{Generator, Parser};

const TEMPLATES: &[&str] = &[
    "../fwxml-codegen/tests/fixtures/statement.fwt",
    "templates/edge.fwt",
];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let manifest_dir = PathBuf::from(std::env::var("CARGO_MANIFEST_DIR")?);
    let out_dir = PathBuf::from(std::env::var("OUT_DIR")?);
    let parser = Parser::new();
    let generator = Generator::new().with_source_comment();

    for template in TEMPLATES {
        let path = manifest_dir.join(template);
        println!("cargo:rerun-if-changed={}", path.display());

        let program = parser.parse_file(&path)?;
        let code = generator.generate(&program)?;
        std::fs::write(out_dir.join(format!("{}.rs", program.name)), code)?;
    }
    Ok(())
}
