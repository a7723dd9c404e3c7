mod common;

use std::fs;
use std::process::Command;

use anyhow::Result;
use assert_cmd::prelude::*;
use common::*;
use predicates::prelude::*;
use rstest::*;
use tempfile::TempDir;

macro_rules! cargo_run {
    ($cmd:expr, $($args:expr),*) => {
        {
            let mut cmd = Command::cargo_bin($cmd)?;
            $(cmd.arg($args);)*
            cmd.assert()
        }
    };
}

#[fixture]
fn dataset() -> TempDir {
    let dir = TempDir::new().unwrap();
    for (category, name, hist) in [
        ("Forest", "1.jpg", [1.0, 0.0, 0.0]),
        ("Forest", "2.jpg", [0.9, 0.1, 0.0]),
        ("Sea", "1.png", [0.0, 0.0, 1.0]),
        ("Sea", "2.png", [0.0, 0.1, 0.9]),
    ] {
        fs::create_dir_all(dir.path().join(category)).unwrap();
        fs::write(dir.path().join(category).join(name), histogram(&hist)).unwrap();
    }
    fs::write(dir.path().join("Sea").join("notes.txt"), "not an image").unwrap();
    dir
}

#[test]
fn help() -> Result<()> {
    cargo_run!("imcbir", "--help")
        .success()
        .stdout(predicate::str::contains("add"))
        .stdout(predicate::str::contains("search"))
        .stdout(predicate::str::contains("server"));
    Ok(())
}

#[rstest]
fn add_and_search(dataset: TempDir) -> Result<()> {
    let url = spawn_extractor();
    let conf_dir = TempDir::new()?;

    cargo_run!("imcbir", "-c", conf_dir.path(), "add", dataset.path(), "--extractor-url", &url)
        .success();
    // 重复添加时会跳过已存在的图片
    cargo_run!("imcbir", "-c", conf_dir.path(), "add", dataset.path(), "--extractor-url", &url)
        .success();

    let query = dataset.path().join("Sea").join("1.png");
    let output = Command::cargo_bin("imcbir")?
        .arg("--conf-dir")
        .arg(conf_dir.path())
        .arg("search")
        .arg(&query)
        .args(["--extractor-url", &url, "--output-format", "json", "--count", "3"])
        .output()?;
    assert!(output.status.success());

    let hits: Vec<serde_json::Value> = serde_json::from_slice(&output.stdout)?;
    assert_eq!(hits.len(), 3);
    assert_eq!(hits[0]["category"], "Sea");
    assert!(hits[0]["path"].as_str().unwrap().ends_with("1.png"));
    assert_eq!(hits[1]["category"], "Sea");
    Ok(())
}

#[rstest]
fn add_with_category(dataset: TempDir) -> Result<()> {
    let url = spawn_extractor();
    let conf_dir = TempDir::new()?;

    cargo_run!(
        "imcbir",
        "-c",
        conf_dir.path(),
        "add",
        dataset.path().join("Forest"),
        "--category",
        "Woods",
        "--extractor-url",
        &url
    )
    .success();

    let query = dataset.path().join("Forest").join("1.jpg");
    cargo_run!("imcbir", "-c", conf_dir.path(), "search", query, "--extractor-url", &url)
        .success()
        .stdout(predicate::str::contains("\tWoods\t"));
    Ok(())
}

#[test]
fn search_unreachable_extractor() -> Result<()> {
    let conf_dir = TempDir::new()?;
    let image = conf_dir.path().join("q.jpg");
    fs::write(&image, histogram(&[1.0, 0.0]))?;

    cargo_run!(
        "imcbir",
        "-c",
        conf_dir.path(),
        "search",
        &image,
        "--extractor-url",
        "http://127.0.0.1:1/api",
        "--extractor-timeout",
        "2"
    )
    .failure()
    .stderr(predicate::str::contains("特征提取"));
    Ok(())
}
