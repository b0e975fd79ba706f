use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Config using the offline hashing backend and a query log inside `dir`
fn write_config(dir: &Path) -> String {
    let config = format!(
        r#"[embedding]
backend = "hashing"
model = "unused"
endpoint = "http://127.0.0.1:9"
max_tokens = 512
dimensions = 384
timeout_secs = 5
cache = false

[recovery]
repo_path = "{repo}"
extension = "py"

[server]
host = "127.0.0.1"
port = 8000

[history]
enabled = true
db_path = "{db}"
"#,
        repo = dir.join("repo").display().to_string().replace('\\', "/"),
        db = dir.join("history.db").display().to_string().replace('\\', "/"),
    );
    let path = dir.join("config.toml");
    fs::write(&path, config).unwrap();
    path.display().to_string()
}

fn sample_repo() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let repo = dir.path().join("repo");
    fs::create_dir(&repo).unwrap();
    fs::write(
        repo.join("math_utils.py"),
        "def add_numbers(a, b):\n    \"\"\"Add two numbers safely.\"\"\"\n    return a + b\n",
    )
    .unwrap();
    fs::write(
        repo.join("string_utils.py"),
        "def reverse_string(s: str) -> str:\n    return s[::-1]\n",
    )
    .unwrap();
    fs::write(repo.join("README.md"), "reference repository").unwrap();
    dir
}

fn sanctuary() -> Command {
    let mut cmd = Command::cargo_bin("sanctuary").unwrap();
    cmd.env_remove("OLLAMA_HOST")
        .env_remove("OLLAMA_EMBED_MODEL")
        .env_remove("SANCTUARY_URL");
    cmd
}

#[test]
fn recover_prints_suggested_file_as_json() {
    let dir = sample_repo();
    let config = write_config(dir.path());

    sanctuary()
        .args(["--config", &config, "recover", "--json", "--code", "def add(a, b):\n  return a+b"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"suggested_file\": \"math_utils.py\""))
        .stdout(predicate::str::contains("similarity_score"));
}

#[test]
fn recover_reads_file_argument() {
    let dir = sample_repo();
    let config = write_config(dir.path());
    let broken = dir.path().join("broken.py");
    fs::write(&broken, "def reverse(s):\n    return s[::-1").unwrap();

    sanctuary()
        .args(["--config", &config, "recover", "--json"])
        .arg(&broken)
        .assert()
        .success()
        .stdout(predicate::str::contains("string_utils.py"));
}

#[test]
fn recover_reads_stdin() {
    let dir = sample_repo();
    let config = write_config(dir.path());

    sanctuary()
        .args(["--config", &config, "recover", "--json"])
        .write_stdin("return a + b")
        .assert()
        .success()
        .stdout(predicate::str::contains("math_utils.py"));
}

#[test]
fn recover_fails_on_empty_repository() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path());
    let empty = dir.path().join("empty");
    fs::create_dir(&empty).unwrap();

    sanctuary()
        .args(["--config", &config, "recover", "--json", "--code", "x = 1", "--repo"])
        .arg(&empty)
        .assert()
        .failure()
        .stderr(predicate::str::contains("no candidate files"));
}

#[test]
fn history_lists_previous_recoveries() {
    let dir = sample_repo();
    let config = write_config(dir.path());

    sanctuary()
        .args(["--config", &config, "recover", "--json", "--code", "def add(a, b): return a+b"])
        .assert()
        .success();

    sanctuary()
        .args(["--config", &config, "history", "--limit", "5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("math_utils.py"))
        .stdout(predicate::str::contains("1 of 1 queries shown"));
}

#[test]
fn config_show_prints_effective_config() {
    let dir = sample_repo();
    let config = write_config(dir.path());

    sanctuary()
        .args(["--config", &config, "config", "--show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("backend = \"hashing\""));
}
