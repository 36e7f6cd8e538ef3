use super::path_to_file_url;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;
use urlinclude::cache::url_digest;

fn urlinclude(dir: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("urlinclude").unwrap();
    cmd.current_dir(dir).env("RUST_LOG", "warn");
    cmd
}

#[test]
fn test_resolve_raw_url() {
    let temp = TempDir::new().unwrap();
    urlinclude(temp.path())
        .args(["resolve", "lib/mod.py", "--github", "org/repo", "--branch", "v2"])
        .assert()
        .success()
        .stdout("https://github.com/org/repo/raw/v2/lib/mod.py\n");
}

#[test]
fn test_resolve_link_url() {
    let temp = TempDir::new().unwrap();
    urlinclude(temp.path())
        .args(["resolve", "lib/mod.py", "--github", "org/repo", "--link"])
        .assert()
        .success()
        .stdout("https://github.com/org/repo/blob/master/lib/mod.py\n");
}

#[test]
fn test_resolve_verbatim_url() {
    let temp = TempDir::new().unwrap();
    urlinclude(temp.path())
        .args(["resolve", "ignored.py", "--url", "https://example.com/setup.py"])
        .assert()
        .success()
        .stdout("https://example.com/setup.py\n");
}

#[test]
fn test_resolve_uses_project_config() {
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join("urlinclude.toml"),
        "github_host = \"https://git.example.com/\"\ndefault_branch = \"main\"\n",
    )
    .unwrap();

    urlinclude(temp.path())
        .args(["resolve", "a.py", "--github", "org/repo"])
        .assert()
        .success()
        .stdout("https://git.example.com/org/repo/raw/main/a.py\n");
}

#[test]
fn test_resolve_without_source_fails() {
    let temp = TempDir::new().unwrap();
    urlinclude(temp.path())
        .args(["resolve", "a.py"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing reference source"));
}

#[test]
fn test_resolve_link_requires_github() {
    let temp = TempDir::new().unwrap();
    urlinclude(temp.path())
        .args(["resolve", "a.py", "--url", "https://example.com/a.py", "--link"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing `github` option"));
}

/// A build over `file://` URLs renders the include and reuses the cache.
#[test]
fn test_build_with_file_url() {
    let temp = TempDir::new().unwrap();
    let remote = temp.path().join("remote");
    let docs = temp.path().join("docs");
    let out = temp.path().join("_build");
    fs::create_dir_all(&remote).unwrap();
    fs::create_dir_all(&docs).unwrap();

    let snippet = remote.join("snippet.py");
    fs::write(&snippet, "print('hi')\n").unwrap();
    let url = path_to_file_url(&snippet);
    fs::write(docs.join("index.md"), format!(".. literalinclude:: snippet.py\n   :url: {url}\n")).unwrap();

    urlinclude(temp.path())
        .args(["--no-progress", "build", "docs", "-o", "_build"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Built 1 document(s)"))
        .stdout(predicate::str::contains("cache: 0 hit(s), 1 download(s)"));

    assert_eq!(fs::read_to_string(out.join("index.md")).unwrap(), "```python\nprint('hi')\n```\n");
    assert!(out.join("_urlinclude").join(format!("{}.py", url_digest(&url))).is_file());

    // The cached copy wins over the changed remote file.
    fs::write(&snippet, "print('changed')\n").unwrap();
    urlinclude(temp.path())
        .args(["--no-progress", "build", "docs", "-o", "_build"])
        .assert()
        .success()
        .stdout(predicate::str::contains("cache: 1 hit(s), 0 download(s)"));
    assert!(fs::read_to_string(out.join("index.md")).unwrap().contains("print('hi')"));

    urlinclude(temp.path())
        .args(["--no-progress", "build", "docs", "-o", "_build", "--refresh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("cache: 0 hit(s), 1 download(s)"));
    assert!(fs::read_to_string(out.join("index.md")).unwrap().contains("print('changed')"));
}

#[test]
fn test_build_quiet_prints_nothing() {
    let temp = TempDir::new().unwrap();
    fs::create_dir_all(temp.path().join("docs")).unwrap();
    fs::write(temp.path().join("docs/index.md"), "# Title\n").unwrap();

    urlinclude(temp.path())
        .args(["--quiet", "build", "docs", "-o", "out"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
    assert_eq!(fs::read_to_string(temp.path().join("out/index.md")).unwrap(), "# Title\n");
}

#[test]
fn test_build_missing_source_dir() {
    let temp = TempDir::new().unwrap();
    urlinclude(temp.path())
        .args(["build", "missing", "-o", "out"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn test_build_reports_failing_document() {
    let temp = TempDir::new().unwrap();
    fs::create_dir_all(temp.path().join("docs")).unwrap();
    fs::write(temp.path().join("docs/index.md"), ".. include:: other.md\n").unwrap();

    urlinclude(temp.path())
        .args(["--no-progress", "build", "docs", "-o", "out"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown directive 'include'"))
        .stderr(predicate::str::contains("Failed to build document 'index'"));
}

#[test]
fn test_fetch_prints_entry_path() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("setup.py");
    fs::write(&source, "setup()\n").unwrap();
    let url = path_to_file_url(&source);
    let cache_dir = temp.path().join("cache");

    let expected = cache_dir.join(format!("{}.py", url_digest(&url)));
    urlinclude(temp.path())
        .args(["--no-progress", "fetch", url.as_str(), "--cache-dir"])
        .arg(&cache_dir)
        .assert()
        .success()
        .stdout(format!("{}\n", expected.display()));
    assert_eq!(fs::read_to_string(&expected).unwrap(), "setup()\n");
}

#[test]
fn test_fetch_missing_file_fails() {
    let temp = TempDir::new().unwrap();
    let url = path_to_file_url(&temp.path().join("absent.py"));

    urlinclude(temp.path())
        .args(["--no-progress", "fetch", url.as_str(), "--cache-dir", "cache"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to fetch"));
    assert!(!temp.path().join("cache").join(format!("{}.py", url_digest(&url))).exists());
}
