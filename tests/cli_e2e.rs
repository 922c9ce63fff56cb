//! End-to-end CLI tests for the workshop-dl binary.

#![allow(deprecated)]

mod support;
use support::socket_guard::start_mock_server_or_skip;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

/// Binary with config lookup pointed at an empty directory.
fn workshop_dl(tempdir: &TempDir) -> Command {
    let config_home = tempdir.path().join("xdg-config");
    std::fs::create_dir_all(config_home.join("workshop-dl")).unwrap();
    let mut cmd = Command::cargo_bin("workshop-dl").unwrap();
    cmd.env("XDG_CONFIG_HOME", &config_home)
        .env_remove("STEAMCMD_DIR")
        .env_remove("RUST_LOG");
    cmd
}

fn exit_code(assert: &assert_cmd::assert::Assert) -> Option<i32> {
    assert.get_output().status.code()
}

#[test]
fn test_binary_help_displays_usage() {
    let tempdir = TempDir::new().unwrap();
    workshop_dl(&tempdir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Download Steam Workshop items"))
        .stdout(predicate::str::contains("--app-id"))
        .stdout(predicate::str::contains("community-url").not());
}

#[test]
fn test_binary_version_displays_version() {
    let tempdir = TempDir::new().unwrap();
    workshop_dl(&tempdir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("workshop-dl"));
}

#[test]
fn test_binary_invalid_flag_returns_error() {
    let tempdir = TempDir::new().unwrap();
    workshop_dl(&tempdir)
        .arg("--invalid-flag")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_binary_without_input_prints_guidance_and_fails() {
    let tempdir = TempDir::new().unwrap();
    let assert = workshop_dl(&tempdir)
        .write_stdin("")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No input provided"));
    assert_eq!(exit_code(&assert), Some(2));
}

#[test]
fn test_binary_garbage_input_fails_with_suggestion() {
    let tempdir = TempDir::new().unwrap();
    let assert = workshop_dl(&tempdir)
        .args(["hello", "https://example.com/?id=5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "no Workshop item or collection found",
        ))
        .stderr(predicate::str::contains("Suggestion"));
    assert_eq!(exit_code(&assert), Some(2));
}

#[tokio::test]
async fn test_binary_dry_run_prints_plan() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/sharedfiles/filedetails/"))
        .and(query_param("id", "456"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"<div class="workshopItemTitle">Mod</div>"#),
        )
        .mount(&mock_server)
        .await;

    let tempdir = TempDir::new().unwrap();
    let output_dir = tempdir.path().join("mods");
    workshop_dl(&tempdir)
        .args(["--dry-run", "--app-id", "108600", "--community-url"])
        .arg(mock_server.uri())
        .arg("-o")
        .arg(&output_dir)
        .args([
            "123",
            "https://steamcommunity.com/sharedfiles/filedetails/?id=456",
            "123",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Download plan: 2 item(s), app id 108600",
        ))
        .stdout(predicate::str::contains("123 (direct)"))
        .stdout(predicate::str::contains("456 (direct)"));
    assert!(!output_dir.exists(), "dry run must not create the output dir");
}

#[test]
fn test_binary_dry_run_reads_piped_stdin_and_applies_exclusions() {
    let tempdir = TempDir::new().unwrap();
    workshop_dl(&tempdir)
        .args(["--dry-run", "--exclude", "2"])
        .write_stdin("1\n2\nnot-an-id\n3\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Download plan: 2 item(s), app id unknown"))
        .stdout(predicate::str::contains("Excluded: 2"));
}

#[test]
fn test_binary_plan_json_written() {
    let tempdir = TempDir::new().unwrap();
    let plan_path = tempdir.path().join("plan.json");
    workshop_dl(&tempdir)
        .args(["--dry-run", "-q", "--app-id", "4000", "--plan-json"])
        .arg(&plan_path)
        .args(["7", "8"])
        .assert()
        .success();

    let plan: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&plan_path).unwrap()).unwrap();
    assert_eq!(plan["app_id"], "4000");
    assert_eq!(plan["units"][0]["id"], "7");
    assert_eq!(plan["units"][1]["source"]["kind"], "direct");
}

#[test]
fn test_binary_missing_steamcmd_is_fatal() {
    let tempdir = TempDir::new().unwrap();
    let assert = workshop_dl(&tempdir)
        .args(["--app-id", "108600", "--steamcmd"])
        .arg(tempdir.path().join("nowhere").join("steamcmd.sh"))
        .arg("-o")
        .arg(tempdir.path().join("mods"))
        .arg("123")
        .assert()
        .failure()
        .stderr(predicate::str::contains("steamcmd not found"));
    assert_eq!(exit_code(&assert), Some(2));
}

#[test]
fn test_binary_config_file_values_apply() {
    let tempdir = TempDir::new().unwrap();
    let config_path = tempdir
        .path()
        .join("xdg-config")
        .join("workshop-dl")
        .join("config.toml");
    let mut cmd = workshop_dl(&tempdir);
    std::fs::write(&config_path, "app_id = 294100\nexclude = \"9\"\n").unwrap();

    cmd.args(["--dry-run", "8", "9"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Download plan: 1 item(s), app id 294100",
        ))
        .stdout(predicate::str::contains("Excluded: 9"));
}

#[test]
fn test_binary_invalid_config_file_is_fatal() {
    let tempdir = TempDir::new().unwrap();
    let config_path = tempdir
        .path()
        .join("xdg-config")
        .join("workshop-dl")
        .join("config.toml");
    let mut cmd = workshop_dl(&tempdir);
    std::fs::write(&config_path, "speed = 3\n").unwrap();

    let assert = cmd
        .args(["--dry-run", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown configuration key"));
    assert_eq!(exit_code(&assert), Some(2));
}

#[tokio::test]
async fn test_binary_missing_app_id_is_fatal_when_item_page_unavailable() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/sharedfiles/filedetails/"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let tempdir = TempDir::new().unwrap();
    let assert = workshop_dl(&tempdir)
        .arg("--community-url")
        .arg(mock_server.uri())
        .arg("-o")
        .arg(tempdir.path().join("mods"))
        .arg("123")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--app-id"));
    assert_eq!(exit_code(&assert), Some(2));
}

#[tokio::test]
async fn test_binary_dry_run_expands_collection_behind_item_link() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    let page = r#"<html><body>
<div class="workshopItemTitle">Server Pack</div>
<div class="collectionChildren">
<a href="https://steamcommunity.com/sharedfiles/filedetails/?id=111">A</a>
<a href="https://steamcommunity.com/sharedfiles/filedetails/?id=222">B</a>
</div>
<span data-appid="107410"></span>
</body></html>"#;
    Mock::given(method("GET"))
        .and(path("/sharedfiles/filedetails/"))
        .and(query_param("id", "2169435993"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page))
        .mount(&mock_server)
        .await;

    let tempdir = TempDir::new().unwrap();
    workshop_dl(&tempdir)
        .args(["--dry-run", "--community-url"])
        .arg(mock_server.uri())
        .arg("https://steamcommunity.com/sharedfiles/filedetails/?id=2169435993.")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Download plan: 2 item(s), app id 107410",
        ))
        .stdout(predicate::str::contains("111 (from collection 2169435993)"))
        .stdout(predicate::str::contains("222 (from collection 2169435993)"));
}

#[tokio::test]
async fn test_binary_unresolvable_collection_only_fails() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/workshop/filedetails/"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let tempdir = TempDir::new().unwrap();
    let assert = workshop_dl(&tempdir)
        .args(["--dry-run", "--community-url"])
        .arg(mock_server.uri())
        .arg("https://steamcommunity.com/workshop/filedetails/?id=999")
        .assert()
        .failure()
        .stdout(predicate::str::contains("Collections that could not be resolved"))
        .stdout(predicate::str::contains("collection 999: HTTP 404"));
    assert_eq!(exit_code(&assert), Some(2));
}

#[cfg(unix)]
mod with_fake_steamcmd {
    use super::*;
    use crate::support::fake_steamcmd;

    #[test]
    fn test_binary_downloads_every_item() {
        let tempdir = TempDir::new().unwrap();
        let steamcmd = fake_steamcmd::install(&tempdir.path().join("tools"));
        let output_dir = tempdir.path().join("mods");

        let assert = workshop_dl(&tempdir)
            .args(["--app-id", "108600", "-c", "2", "--steamcmd"])
            .arg(&steamcmd)
            .arg("-o")
            .arg(&output_dir)
            .args(["123", "456"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Downloaded 2 of 2 item(s)"))
            .stdout(predicate::str::contains("SUCCESS 123 (attempts: 1)"));
        assert_eq!(exit_code(&assert), Some(0));
        assert!(output_dir.join("123").join("mod.info").is_file());
        assert!(output_dir.join("456").join("mod.info").is_file());
    }

    #[test]
    fn test_binary_steamcmd_found_through_directory() {
        let tempdir = TempDir::new().unwrap();
        let tools = tempdir.path().join("tools");
        fake_steamcmd::install(&tools);

        workshop_dl(&tempdir)
            .args(["--app-id", "108600"])
            .env("STEAMCMD_DIR", &tools)
            .arg("-o")
            .arg(tempdir.path().join("mods"))
            .arg("5")
            .assert()
            .success();
        assert!(tempdir.path().join("mods").join("5").is_dir());
    }

    #[test]
    fn test_binary_partial_success_exit_code_is_one() {
        let tempdir = TempDir::new().unwrap();
        let steamcmd = fake_steamcmd::install(&tempdir.path().join("tools"));

        let assert = workshop_dl(&tempdir)
            .args(["--app-id", "108600", "-r", "1", "--steamcmd"])
            .arg(&steamcmd)
            .arg("-o")
            .arg(tempdir.path().join("mods"))
            .args(["123", "666"])
            .assert()
            .failure()
            .stdout(predicate::str::contains("Downloaded 1 of 2 item(s)"))
            .stdout(predicate::str::contains(
                "FAILED  666 (attempts: 2): download of item 666 failed: ERROR! Download item 666 failed (Failure).",
            ));
        assert_eq!(exit_code(&assert), Some(1), "partial success must yield exit code 1");
    }

    #[test]
    fn test_binary_all_failed_exit_code_is_two() {
        let tempdir = TempDir::new().unwrap();
        let steamcmd = fake_steamcmd::install(&tempdir.path().join("tools"));

        let assert = workshop_dl(&tempdir)
            .args(["--app-id", "108600", "-r", "0", "--steamcmd"])
            .arg(&steamcmd)
            .arg("-o")
            .arg(tempdir.path().join("mods"))
            .arg("666")
            .assert()
            .failure();
        assert_eq!(exit_code(&assert), Some(2));
    }

    #[tokio::test]
    async fn test_binary_collection_run_detects_app_id() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        let page = r#"<html><body>
<div class="workshopItemTitle">Server Pack</div>
<a href="https://steamcommunity.com/sharedfiles/filedetails/?id=111">A</a>
<a href="https://steamcommunity.com/sharedfiles/filedetails/?id=222">B</a>
<a href="https://steamcommunity.com/sharedfiles/filedetails/?id=111">A</a>
<span data-appid="108600"></span>
</body></html>"#;
        Mock::given(method("GET"))
            .and(path("/workshop/filedetails/"))
            .and(query_param("id", "999"))
            .respond_with(ResponseTemplate::new(200).set_body_string(page))
            .mount(&mock_server)
            .await;

        let tempdir = TempDir::new().unwrap();
        let steamcmd = fake_steamcmd::install(&tempdir.path().join("tools"));
        let output_dir = tempdir.path().join("mods");

        workshop_dl(&tempdir)
            .arg("--community-url")
            .arg(mock_server.uri())
            .arg("--steamcmd")
            .arg(&steamcmd)
            .arg("-o")
            .arg(&output_dir)
            .arg("https://steamcommunity.com/workshop/filedetails/?id=999")
            .assert()
            .success()
            .stdout(predicate::str::contains("Downloaded 2 of 2 item(s)"));

        let args = std::fs::read_to_string(output_dir.join("222").join("args.txt")).unwrap();
        assert!(args.contains("+workshop_download_item 108600 222"));
    }
}
