use predicates::prelude::*;
use pretty_assertions::assert_eq;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn cmd() -> assert_cmd::Command {
    let mut cmd = assert_cmd::Command::from(Command::new(env!("CARGO_BIN_EXE_tofu-docs")));
    // Keep the host environment out of the settings tree.
    for (key, _) in std::env::vars_os() {
        if key.to_string_lossy().starts_with("TOFU_DOCS_") {
            cmd.env_remove(key);
        }
    }
    cmd.env_remove("RUST_LOG");
    cmd
}

fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

/// Copy a fixture module into a fresh directory named `name`.
fn module(fixture: &str, name: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let module = dir.path().join(name);
    fs::create_dir(&module).unwrap();
    for entry in fs::read_dir(fixture_path(fixture)).unwrap() {
        let entry = entry.unwrap();
        fs::copy(entry.path(), module.join(entry.file_name())).unwrap();
    }
    (dir, module)
}

fn readme(module: &Path) -> String {
    fs::read_to_string(module.join("README.md")).unwrap()
}

// -- stdout target --

#[test]
fn renders_section_to_stdout() {
    let expected = fs::read_to_string(fixture_path("basic.expected.md")).unwrap();

    let assert = cmd()
        .args(["--target", "-"])
        .arg(fixture_path("basic"))
        .assert()
        .success();
    let output = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    assert_eq!(output, expected);
}

// -- target file lifecycle --

#[test]
fn seeds_absent_readme() {
    let (_dir, module) = module("basic", "network");

    cmd().arg(&module).assert().success();

    let content = readme(&module);
    assert!(content.starts_with("# network\n\n## Description\n"), "{content}");
    let section = fs::read_to_string(fixture_path("basic.expected.md")).unwrap();
    assert!(content.ends_with(&format!(
        "<!-- TOFU_DOCS START -->\n{section}<!-- TOFU_DOCS END -->\n"
    )));
    let region = content.find("[region]").unwrap();
    let tags = content.find("[tags]").unwrap();
    assert!(region < tags);
}

#[test]
fn second_run_is_idempotent() {
    let (_dir, module) = module("network", "network");

    cmd()
        .arg(&module)
        .env("TOFU_DOCS_CHANGED_EXIT_CODE", "3")
        .assert()
        .code(3);
    let first = readme(&module);

    cmd()
        .arg(&module)
        .env("TOFU_DOCS_CHANGED_EXIT_CODE", "3")
        .assert()
        .code(0);
    assert_eq!(readme(&module), first);
}

#[test]
fn content_outside_markers_is_preserved() {
    let (_dir, module) = module("basic", "basic");
    let pre = "# Custom title\n\nHand-written intro.\n\n<!-- TOFU_DOCS START -->\n";
    let post = "<!-- TOFU_DOCS END -->\n\n## License\n\nMIT";
    fs::write(module.join("README.md"), format!("{pre}stale\n{post}")).unwrap();

    cmd().arg(&module).assert().success();

    let content = readme(&module);
    assert!(content.starts_with(pre));
    assert!(content.ends_with(post));
    assert!(!content.contains("stale"));
    assert!(content.contains("|[vpc_id](/outputs.tf#L1)|The VPC id|"));
}

#[test]
fn appends_when_no_markers() {
    let (_dir, module) = module("basic", "basic");
    fs::write(module.join("README.md"), "# Existing\n").unwrap();

    cmd().arg(&module).assert().success();

    assert!(readme(&module).starts_with("# Existing\n\n<!-- TOFU_DOCS START -->\n## API Documentation\n"));
}

#[test]
fn malformed_markers_abort_without_writing() {
    let (_dir, module) = module("basic", "basic");
    let original = "# Title\n<!-- TOFU_DOCS START -->\nno end marker\n";
    fs::write(module.join("README.md"), original).unwrap();

    cmd()
        .arg(&module)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("error: merge:"))
        .stderr(predicate::str::contains("hint:").not());

    assert_eq!(readme(&module), original);
}

#[test]
fn explicit_relative_target() {
    let (dir, module) = module("basic", "basic");

    cmd()
        .current_dir(dir.path())
        .args(["--target", "./docs/API.md", "basic"])
        .assert()
        .success();

    assert!(dir.path().join("docs/API.md").is_file());
    assert!(!module.join("README.md").exists());
}

// -- extraction and formatting --

#[test]
fn full_module_sections() {
    let assert = cmd()
        .args(["--target", "stdout"])
        .arg(fixture_path("network"))
        .assert()
        .success();
    let output = String::from_utf8(assert.get_output().stdout.clone()).unwrap();

    let titles: Vec<&str> = output
        .lines()
        .filter_map(|l| l.strip_prefix("### "))
        .collect();
    assert_eq!(
        titles,
        vec!["Resources", "Locals", "Variables", "Outputs", "Output Validations"]
    );

    assert!(output.contains(
        "|[aws_subnet.private](/main.tf#L6)|aws|[subnet](https://registry.terraform.io/providers/hashicorp/aws/latest/docs/resources/subnet)|"
    ));
    assert!(output.contains("|[name](/main.tf#L13)|"));
    assert!(output.contains(
        "<details><summary>CIDR block of the VPC.</summary><ul><li>must be a /16</li><li>must not overlap</li></ul></details>"
    ));
    assert!(output.contains("<ul><li>Must be a valid CIDR block.</li></ul>"));
    assert!(output.contains("<ul><li>CIDR must be set.</li></ul>"));
    assert!(!output.contains("generated"));
    assert!(!output.contains("aws_region"));
}

#[test]
fn validation_outputs_can_be_removed() {
    let assert = cmd()
        .args(["--target", "-"])
        .arg(fixture_path("network"))
        .env("TOFU_DOCS_FORMAT__VALIDATION_REMOVE", "true")
        .assert()
        .success();
    let output = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    assert!(!output.contains("validate_network"));
    assert!(!output.contains("Output Validations"));
}

#[test]
fn auto_files_included_when_skip_auto_off() {
    cmd()
        .args(["--target", "-"])
        .arg(fixture_path("network"))
        .env("TOFU_DOCS_FORMAT__SKIP_AUTO", "false")
        .assert()
        .success()
        .stdout(predicate::str::contains("[generated](/auto.providers.tf#L1)"));
}

#[test]
fn replacement_rules_from_settings_file() {
    let (_dir, module) = module("network", "network");
    fs::write(
        module.join(".tofu-docs.yml"),
        r#"target: "-"
replace:
  - pattern: 'repo `([^`.]+)`'
    replacement: '[\1](https://x/\1)'
    variables:
      ns: "ns/"
    category: variable
    column: description
"#,
    )
    .unwrap();

    cmd()
        .arg(&module)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "AWS region, see [regions](https://x/regions)",
        ));
}

#[test]
fn invalid_pattern_is_a_configuration_error() {
    let (_dir, module) = module("basic", "basic");
    let settings = module.join("custom.yml");
    fs::write(
        &settings,
        "replace:\n  - pattern: '(unclosed'\n    replacement: x\n    category: output\n    column: description\n",
    )
    .unwrap();

    cmd()
        .arg(&module)
        .arg("--config-file")
        .arg(&settings)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("error: substitution: replace rule #1"))
        .stderr(predicate::str::contains("hint: check .tofu-docs.yml"));

    assert!(!module.join("README.md").exists());
}

#[test]
fn crlf_module_keeps_table_rows_intact() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("variables.tf"),
        "variable \"tags\" {\r\n  description = <<-EOT\r\n    Tags to apply.\r\n    - on every resource\r\n  EOT\r\n  type = map(string)\r\n  default = {\r\n    a = \"b\"\r\n  }\r\n}\r\n",
    )
    .unwrap();

    let assert = cmd()
        .args(["--target", "-"])
        .arg(dir.path())
        .assert()
        .success();
    let output = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    assert!(!output.contains('\r'));
    assert!(output.contains(
        "|[tags](/variables.tf#L1)|<pre>map(string)</pre>|<details><summary>Tags to apply.</summary><ul><li>on every resource</li></ul></details>|<pre>{<br/>    a = \"b\"<br/>  }</pre>|"
    ));
}

#[test]
fn escaped_template_sequence_in_default() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("main.tf"),
        "variable \"a\" {\n  default = \"$${\"\n  type = string\n}\n",
    )
    .unwrap();

    cmd()
        .args(["--target", "-"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("|[a](/main.tf#L1)|<pre>string</pre>|<pre>\"$${\"</pre>|"));
}

#[test]
fn numeric_env_value_for_string_setting() {
    cmd()
        .args(["--target", "-"])
        .arg(fixture_path("basic"))
        .env("TOFU_DOCS_TARGET_CONFIG__HEADING", "2024")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("## 2024\n"));
}

#[test]
fn unclosed_block_is_an_extraction_error() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("main.tf"), "variable \"a\" {\n  type = string\n").unwrap();

    cmd()
        .arg(dir.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("error: extraction: main.tf:1:"));
}

#[test]
fn unsupported_sort_order() {
    cmd()
        .arg(fixture_path("basic"))
        .env("TOFU_DOCS_FORMAT__SORT_ORDER", "alpha-desc")
        .assert()
        .code(2)
        .stderr(predicate::str::contains(
            "error: configuration: TOFU_DOCS_FORMAT__SORT_ORDER:",
        ));
}

// -- settings dump --

#[test]
fn dump_config_refuses_to_overwrite() {
    let (_dir, module) = module("basic", "basic");

    cmd()
        .arg(&module)
        .args(["--dump-config", "--target", "-"])
        .assert()
        .success();
    let dumped: tofu_docs::Settings =
        serde_yaml::from_str(&fs::read_to_string(module.join(".tofu-docs.yml")).unwrap()).unwrap();
    assert_eq!(dumped.target_config.marker, "TOFU_DOCS");
    // The CLI target override is part of the effective settings.
    assert_eq!(dumped.target, "-");

    cmd()
        .arg(&module)
        .arg("--dump-config")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("already exists"));

    cmd()
        .arg(&module)
        .args(["--dump-config", "--dump-overwrite"])
        .assert()
        .success();
}

#[test]
fn debug_logs_cover_settings_loading() {
    cmd()
        .args(["--debug", "--target", "-"])
        .arg(fixture_path("basic"))
        .assert()
        .success()
        .stderr(predicate::str::contains("No settings file at"))
        .stderr(predicate::str::contains("Loaded settings from"));
}

#[test]
fn help_flag() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--dump-config"));
}
