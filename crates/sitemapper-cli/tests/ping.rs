#![allow(missing_docs, clippy::expect_used, clippy::unwrap_used)]

use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;
use common::{sitemapper_cmd, write_input};

const INDEX_URL: &str = "https://example.com/maps/sitemap_index.xml.gz";

fn write_ping_config(dir: &std::path::Path, endpoints: &[String]) {
    let list = endpoints
        .iter()
        .map(|e| format!("\"{e}\""))
        .collect::<Vec<_>>()
        .join(", ");
    fs::write(
        dir.join("ping.toml"),
        format!("[ping]\nendpoints = [{list}]\ntimeout_secs = 5\n"),
    )
    .unwrap();
}

#[tokio::test]
async fn ping_notifies_configured_endpoints() -> anyhow::Result<()> {
    let home = tempdir()?;
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ping"))
        .and(query_param("sitemap", INDEX_URL))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    write_ping_config(home.path(), &[format!("{}/ping", server.uri())]);

    sitemapper_cmd(home.path())
        .args(["--config", "ping.toml", "ping", INDEX_URL])
        .assert()
        .success()
        .stdout(predicate::str::contains("pinged"));
    Ok(())
}

#[tokio::test]
async fn ping_fails_when_every_endpoint_fails() -> anyhow::Result<()> {
    let home = tempdir()?;
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    write_ping_config(home.path(), &[format!("{}/ping", server.uri())]);

    sitemapper_cmd(home.path())
        .args(["--config", "ping.toml", "ping", INDEX_URL])
        .assert()
        .code(5)
        .stdout(predicate::str::contains("failed"));
    Ok(())
}

#[tokio::test]
async fn generate_pings_after_writing_index() -> anyhow::Result<()> {
    let home = tempdir()?;
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ping"))
        .and(query_param("sitemap", INDEX_URL))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    write_ping_config(home.path(), &[format!("{}/ping", server.uri())]);
    write_input(home.path(), "urls.txt", &["https://example.com/"]);

    sitemapper_cmd(home.path())
        .args(["--config", "ping.toml", "generate", "--group", "site=urls.txt"])
        .args(["--folder", "out", "--base-url", "https://example.com/maps/", "--ping"])
        .assert()
        .success()
        .stdout(predicate::str::contains("sitemap_index.xml.gz"))
        .stdout(predicate::str::contains("pinged"));
    Ok(())
}

#[test]
fn ping_rejects_invalid_url() {
    let home = tempdir().unwrap();
    sitemapper_cmd(home.path())
        .args(["ping", "not a url"])
        .assert()
        .code(2);
}
