#![allow(missing_docs, clippy::expect_used, clippy::unwrap_used)]

use predicates::prelude::*;
use sitemapper_core::{parse_index, parse_urlset, read_gzip_document};
use std::fs;
use tempfile::tempdir;

mod common;
use common::{file_names, sitemapper_cmd, write_input};

#[test]
fn generate_writes_sitemaps_and_index() -> anyhow::Result<()> {
    let home = tempdir()?;
    write_input(
        home.path(),
        "blog.txt",
        &[
            "# blog posts",
            "https://example.com/blog/1",
            "",
            r#"{"location":"https://example.com/blog/2","changeFrequency":"daily","priority":0.8}"#,
            "https://example.com/blog/3",
        ],
    );

    sitemapper_cmd(home.path())
        .args([
            "generate",
            "--group",
            "blog=blog.txt",
            "--folder",
            "out",
            "--base-url",
            "https://example.com/maps",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("blog_1.xml.gz"))
        .stdout(predicate::str::contains("sitemap_index.xml.gz"));

    let out = home.path().join("out");
    assert_eq!(file_names(&out), vec!["blog_1.xml.gz", "sitemap_index.xml.gz"]);

    let entries = parse_urlset(&read_gzip_document(&out.join("blog_1.xml.gz"))?)?;
    let locations: Vec<_> = entries.iter().map(|e| e.location.as_str()).collect();
    assert_eq!(
        locations,
        vec![
            "https://example.com/blog/1",
            "https://example.com/blog/2",
            "https://example.com/blog/3"
        ]
    );
    assert_eq!(entries[1].priority, Some(0.8));

    let index = parse_index(&read_gzip_document(&out.join("sitemap_index.xml.gz"))?)?;
    assert_eq!(index.len(), 1);
    assert_eq!(index[0].location, "https://example.com/maps/blog_1.xml.gz");
    Ok(())
}

#[test]
fn generate_splits_groups_by_configured_limit() -> anyhow::Result<()> {
    let home = tempdir()?;
    let config = home.path().join("sitemapper.toml");
    fs::write(&config, "[limits]\nmax_entries = 2\n")?;
    write_input(
        home.path(),
        "docs.txt",
        &[
            "https://example.com/d/1",
            "https://example.com/d/2",
            "https://example.com/d/3",
            "https://example.com/d/4",
        ],
    );
    write_input(home.path(), "news.txt", &["https://example.com/n/1"]);

    sitemapper_cmd(home.path())
        .args(["--config", "sitemapper.toml", "generate"])
        .args(["--group", "docs=docs.txt", "--group", "news=news.txt"])
        .args(["--folder", "out"])
        .assert()
        .success();

    assert_eq!(
        file_names(&home.path().join("out")),
        vec!["docs_1.xml.gz", "docs_2.xml.gz", "news_1.xml.gz"]
    );
    Ok(())
}

#[test]
fn generate_reads_stdin_and_marks_mobile() -> anyhow::Result<()> {
    let home = tempdir()?;

    sitemapper_cmd(home.path())
        .args(["generate", "--group", "m=-", "--folder", "out", "--mobile"])
        .write_stdin("https://m.example.com/a\nhttps://m.example.com/b\n")
        .assert()
        .success();

    let xml = read_gzip_document(&home.path().join("out").join("m_1.xml.gz"))?;
    assert!(xml.contains("<mobile:mobile/>"));
    assert!(parse_urlset(&xml)?.iter().all(|e| e.mobile));
    Ok(())
}

#[test]
fn generate_reports_bad_lines_as_usage_errors() -> anyhow::Result<()> {
    let home = tempdir()?;
    write_input(
        home.path(),
        "bad.txt",
        &["https://example.com/ok", "not a url"],
    );

    sitemapper_cmd(home.path())
        .args(["generate", "--group", "bad=bad.txt", "--folder", "out"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("bad.txt:2"));

    // Entries before the bad line are still drained.
    assert_eq!(file_names(&home.path().join("out")), vec!["bad_1.xml.gz"]);
    Ok(())
}

#[test]
fn generate_with_missing_input_is_not_found() -> anyhow::Result<()> {
    let home = tempdir()?;

    sitemapper_cmd(home.path())
        .args(["generate", "--group", "g=missing.txt", "--folder", "out"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("missing.txt"));
    Ok(())
}

#[test]
fn generate_rejects_duplicate_groups() -> anyhow::Result<()> {
    let home = tempdir()?;
    write_input(home.path(), "a.txt", &["https://example.com/"]);

    sitemapper_cmd(home.path())
        .args(["generate", "--group", "a=a.txt", "--group", "a.xml.gz=a.txt"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("given twice"));
    Ok(())
}

#[test]
fn generate_ping_requires_base_url() -> anyhow::Result<()> {
    let home = tempdir()?;
    write_input(home.path(), "a.txt", &["https://example.com/"]);

    sitemapper_cmd(home.path())
        .args(["generate", "--group", "a=a.txt", "--ping"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--ping requires"));
    Ok(())
}

#[test]
fn environment_selects_output_folder() -> anyhow::Result<()> {
    let home = tempdir()?;
    write_input(home.path(), "a.txt", &["https://example.com/"]);

    sitemapper_cmd(home.path())
        .env("SITEMAPPER_FOLDER", "from-env")
        .args(["generate", "--group", "a=a.txt"])
        .assert()
        .success();

    assert!(home.path().join("from-env").join("a_1.xml.gz").is_file());
    Ok(())
}
