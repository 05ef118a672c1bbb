use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::{tempdir, TempDir};

const DOUBLE_GO: &str = "// +gobra

package p

func double(x int) int {
\t//@ assert x == x
\ty := x + x
\t//@ assert y == 2 * x // keep
\t//@ assert y >= x || x < 0
\treturn y
}
";

/// Verifier stand-in: fails once a line tagged `keep` has been chopped.
const SHELL_VERIFIER: &str = r#"for a in "$@"; do ws="$a"; done
if grep -q 'chop!.*keep' "$ws"/*.go; then
  echo "ERROR assertion might fail"
else
  echo "Gobra has found 0 error(s)"
fi"#;

#[allow(deprecated)]
fn minify() -> Command {
    let mut cmd = Command::cargo_bin("minify").expect("binary");
    cmd.env_remove("GOBRA").env("RUST_LOG", "info");
    cmd
}

/// project/go.mod, project/pkg/{double.go, plain.go}, project/gobra.jar
fn setup_project() -> TempDir {
    let temp = tempdir().unwrap();
    let root = temp.path().join("project");
    let pkg = root.join("pkg");
    fs::create_dir_all(&pkg).unwrap();
    fs::write(root.join("go.mod"), "module example.com/project\n").unwrap();
    fs::write(root.join("gobra.jar"), b"").unwrap();
    fs::write(pkg.join("double.go"), DOUBLE_GO).unwrap();
    fs::write(pkg.join("plain.go"), "package p\n").unwrap();
    temp
}

fn project(temp: &TempDir) -> std::path::PathBuf {
    temp.path().join("project")
}

fn with_shell_verifier<'a>(cmd: &'a mut Command, root: &Path) -> &'a mut Command {
    cmd.arg("--gobra")
        .arg(root.join("gobra.jar"))
        .arg("--java")
        .arg("sh")
        .arg("--jvm-arg")
        .arg("-c")
        .arg("--jvm-arg")
        .arg(SHELL_VERIFIER)
        .arg("--jvm-arg")
        .arg("gobra")
}

#[test]
fn missing_package_argument_is_a_usage_error() {
    minify()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn missing_verifier_jar_is_fatal() {
    let temp = setup_project();
    minify()
        .arg(project(&temp).join("pkg"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("verifier jar is not set"));
}

#[test]
fn missing_project_root_is_fatal() {
    let temp = tempdir().unwrap();
    let pkg = temp.path().join("pkg");
    fs::create_dir_all(&pkg).unwrap();
    fs::write(pkg.join("a.go"), "// +gobra\n").unwrap();
    let jar = temp.path().join("gobra.jar");
    fs::write(&jar, b"").unwrap();

    minify()
        .arg("--gobra")
        .arg(&jar)
        .arg("--module-marker")
        .arg("minify-test-marker-that-does-not-exist")
        .arg(&pkg)
        .assert()
        .failure()
        .stderr(predicate::str::contains("minify-test-marker-that-does-not-exist"));
}

#[test]
fn package_without_header_files_is_fatal() {
    let temp = setup_project();
    let root = project(&temp);
    minify()
        .arg("--gobra")
        .arg(root.join("gobra.jar"))
        .arg("--header")
        .arg("+verify-me")
        .arg(root.join("pkg"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("no files with header"));
}

#[test]
fn malformed_pattern_is_fatal() {
    let temp = setup_project();
    let root = project(&temp);
    minify()
        .arg("--gobra")
        .arg(root.join("gobra.jar"))
        .arg("--pattern")
        .arg("(unclosed")
        .arg(root.join("pkg"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("pattern"));
}

#[cfg(unix)]
#[test]
fn reduces_package_and_writes_working_copy_and_report() {
    let temp = setup_project();
    let root = project(&temp);
    let out = temp.path().join("out");
    let report = temp.path().join("report.md");

    let mut cmd = minify();
    with_shell_verifier(&mut cmd, &root)
        .arg("--baseline")
        .arg("20s")
        .arg("--output")
        .arg(&out)
        .arg("--report")
        .arg(&report)
        .arg(root.join("pkg"))
        .assert()
        .success();

    let working = fs::read_to_string(out.join("double.go.working")).unwrap();
    let lines: Vec<&str> = working.split('\n').collect();
    assert_eq!(lines.len(), DOUBLE_GO.split('\n').count());
    assert_eq!(lines[5], "\t//chop! //# assert x == x");
    assert_eq!(lines[7], "\t//@ assert y == 2 * x // keep");
    assert_eq!(lines[8], "\t//chop! //# assert y >= x || x < 0");
    assert!(!out.join("plain.go.working").exists());

    let md = fs::read_to_string(&report).unwrap();
    assert!(md.contains("| `double.go` | `3` | `2` |"));
}

#[cfg(unix)]
#[test]
fn calibrates_deadline_when_none_given() {
    let temp = setup_project();
    let root = project(&temp);
    let out = temp.path().join("out");

    let mut cmd = minify();
    with_shell_verifier(&mut cmd, &root)
        .arg("--pattern")
        .arg("NO_LINE_MATCHES_THIS")
        .arg("--output")
        .arg(&out)
        .arg(root.join("pkg"))
        .assert()
        .success()
        .stderr(predicate::str::contains("baseline took"));

    assert!(!out.join("double.go.working").exists());
}

#[test]
fn config_file_supplies_settings() {
    let temp = setup_project();
    let root = project(&temp);
    let config = temp.path().join("minify.toml");
    fs::write(
        &config,
        format!(
            "header_marker = \"+nothing-has-this\"\n\n[verifier]\njar = {:?}\n",
            root.join("gobra.jar").display().to_string()
        ),
    )
    .unwrap();

    minify()
        .arg("--config")
        .arg(&config)
        .arg(root.join("pkg"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("+nothing-has-this"));
}
