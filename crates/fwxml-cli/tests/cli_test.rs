use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use rstest::rstest;
use std::path::Path;

fn init_project(dir: &Path) {
    cargo_bin_cmd!("fwxml")
        .args(["init", dir.to_str().unwrap(), "--name", "demo"])
        .assert()
        .success();
}

fn fwxml(dir: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("fwxml");
    cmd.args(["--config", dir.to_str().unwrap()]);
    cmd
}

#[test]
fn test_init_creates_project() {
    let dir = tempfile::tempdir().unwrap();
    init_project(dir.path());

    assert!(dir.path().join("fwxml.yaml").exists());
    assert!(dir.path().join("templates/example.fwt").exists());
    assert!(dir.path().join("data/example.dat").exists());

    let config = std::fs::read_to_string(dir.path().join("fwxml.yaml")).unwrap();
    assert!(config.contains("name: demo"));

    // A second init refuses to overwrite
    cargo_bin_cmd!("fwxml")
        .args(["init", dir.path().to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already contains a fwxml.yaml"));
}

#[test]
fn test_validate_scaffolded_project() {
    let dir = tempfile::tempdir().unwrap();
    init_project(dir.path());

    fwxml(dir.path())
        .arg("validate")
        .assert()
        .success()
        .stderr(predicate::str::contains("Configuration is valid"));
}

#[test]
fn test_validate_reports_broken_template() {
    let dir = tempfile::tempdir().unwrap();
    init_project(dir.path());
    std::fs::write(
        dir.path().join("templates/broken.fwt"),
        "<a>\n  {repeat:2}<b>{field:1}</b>\n</a>\n",
    )
    .unwrap();

    fwxml(dir.path())
        .arg("validate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unterminated repeat group at line 2, column 3"))
        .stderr(predicate::str::contains("1 of 2 templates failed validation"));
}

#[test]
fn test_validate_without_config_fails() {
    let dir = tempfile::tempdir().unwrap();

    fwxml(dir.path())
        .arg("validate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("configuration file not found"));
}

#[test]
fn test_compile_json_summary() {
    let dir = tempfile::tempdir().unwrap();
    init_project(dir.path());

    let output = fwxml(dir.path())
        .args(["compile", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let templates = summary.as_array().unwrap();
    assert_eq!(templates.len(), 1);
    assert_eq!(templates[0]["name"], "example");
    assert_eq!(templates[0]["fields"], 3);
    assert_eq!(templates[0]["input_width"], 81);
    assert_eq!(templates[0]["hash"].as_str().unwrap().len(), 64);
    assert!(templates[0]["rust_source"].is_null());
}

#[test]
fn test_compile_emit_rust() {
    let dir = tempfile::tempdir().unwrap();
    init_project(dir.path());

    fwxml(dir.path())
        .args(["compile", "--template", "example", "--emit-rust"])
        .assert()
        .success();

    let generated = dir.path().join(".fwxml/generated/tpl_example.rs");
    let code = std::fs::read_to_string(generated).unwrap();
    assert!(code.starts_with("// @generated"));
    assert!(code.contains("pub mod tpl_example"));
}

#[test]
fn test_compile_force_bypasses_module_cache() {
    let dir = tempfile::tempdir().unwrap();
    init_project(dir.path());
    let generated = dir.path().join(".fwxml/generated/tpl_example.rs");

    fwxml(dir.path())
        .args(["compile", "--emit-rust"])
        .assert()
        .success();
    let cached: Vec<_> = std::fs::read_dir(dir.path().join(".fwxml/cache"))
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    assert_eq!(cached.len(), 1);

    // A second run takes the module from the cache.
    std::fs::write(&cached[0], "// stale\n").unwrap();
    fwxml(dir.path())
        .args(["compile", "--emit-rust"])
        .assert()
        .success();
    assert_eq!(std::fs::read_to_string(&generated).unwrap(), "// stale\n");

    fwxml(dir.path())
        .args(["compile", "--emit-rust", "--force"])
        .assert()
        .success();
    let code = std::fs::read_to_string(&generated).unwrap();
    assert!(code.contains("pub mod tpl_example"));
}

#[test]
fn test_compile_rejects_module_collision() {
    let dir = tempfile::tempdir().unwrap();
    init_project(dir.path());
    std::fs::write(dir.path().join("templates/ex-ample.fwt"), "{field:1}").unwrap();
    std::fs::write(dir.path().join("templates/ex_ample.fwt"), "{field:2}").unwrap();

    fwxml(dir.path())
        .args(["compile", "--emit-rust"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("both generate module `tpl_ex_ample`"));
}

#[test]
fn test_compile_unknown_template() {
    let dir = tempfile::tempdir().unwrap();
    init_project(dir.path());

    fwxml(dir.path())
        .args(["compile", "--template", "missing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("template 'missing' not found"));
}

#[rstest]
#[case::chars(&[])]
#[case::bytes(&["--bytes"])]
fn test_expand_example(#[case] extra: &[&str]) {
    let dir = tempfile::tempdir().unwrap();
    init_project(dir.path());
    let data = dir.path().join("data/example.dat");

    fwxml(dir.path())
        .args(["expand", "example", data.to_str().unwrap()])
        .args(extra)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("<?xml"))
        .stdout(predicate::str::contains("<Name>Grace Hopper        </Name>"))
        .stdout(predicate::str::contains("<Country>FI</Country>"))
        .stdout(predicate::str::ends_with("</Customers>\n"));
}

#[test]
fn test_expand_to_file() {
    let dir = tempfile::tempdir().unwrap();
    init_project(dir.path());
    let data = dir.path().join("data/example.dat");
    let out = dir.path().join("out.xml");

    fwxml(dir.path())
        .args(["expand", "example", data.to_str().unwrap()])
        .args(["--output", out.to_str().unwrap()])
        .assert()
        .success();

    let xml = std::fs::read_to_string(out).unwrap();
    assert_eq!(xml.matches("<Customer>").count(), 3);
    assert!(xml.contains("<Id>00001</Id>"));
}

#[test]
fn test_expand_short_input() {
    let dir = tempfile::tempdir().unwrap();
    init_project(dir.path());
    let data = dir.path().join("short.dat");
    std::fs::write(&data, "00001Ada\r\n").unwrap();

    fwxml(dir.path())
        .args(["expand", "example", data.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "input exhausted at offset 5: field needs 20 characters but 3 remain",
        ));
}

#[test]
fn test_expand_small_capacity() {
    let dir = tempfile::tempdir().unwrap();
    init_project(dir.path());
    let data = dir.path().join("data/example.dat");

    fwxml(dir.path())
        .args(["expand", "example", data.to_str().unwrap(), "--capacity", "16"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("output capacity of 16 exceeded"));
}
