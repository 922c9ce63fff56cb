//! [`ItemFetcher`] backed by the `steamcmd` command line tool.
//!
//! Each attempt downloads into `<dest>/.partial/<id>` and, on success, moves the
//! item folder to `<dest>/<id>`. A failed or timed-out attempt leaves at most a
//! staging directory behind, which the next attempt clears.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use tokio::process::Command;
use tracing::{debug, instrument, warn};

use super::fetcher::ItemFetcher;
use super::{FetchItemError, PreconditionError};
use crate::parser::WorkshopId;

/// Environment variable naming a directory that contains steamcmd.
pub const STEAMCMD_DIR_ENV: &str = "STEAMCMD_DIR";

/// Staging directory name under the destination root.
pub const STAGING_DIR_NAME: &str = ".partial";

#[cfg(windows)]
const BINARY_NAMES: &[&str] = &["steamcmd.exe"];
#[cfg(not(windows))]
const BINARY_NAMES: &[&str] = &["steamcmd.sh", "steamcmd"];

#[allow(clippy::expect_used)]
static SUCCESS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Success\.\s+Downloaded item\s+(\d+)")
        .expect("steamcmd success regex is valid") // Static pattern, safe to panic
});

/// Downloads Workshop items with `steamcmd` under an anonymous login.
#[derive(Debug, Clone)]
pub struct SteamCmd {
    binary: PathBuf,
    app_id: String,
    validate: bool,
}

impl SteamCmd {
    /// Creates a fetcher for items of the game `app_id`.
    #[must_use]
    pub fn new(binary: impl Into<PathBuf>, app_id: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            app_id: app_id.into(),
            validate: false,
        }
    }

    /// Asks steamcmd to validate downloaded files.
    #[must_use]
    pub fn with_validate(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    #[must_use]
    pub fn binary(&self) -> &Path {
        &self.binary
    }

    #[must_use]
    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    /// Finds steamcmd: `explicit`, then `$STEAMCMD_DIR`, then `./steamcmd/`, then `PATH`.
    ///
    /// # Errors
    ///
    /// Returns [`PreconditionError::ToolNotFound`] listing the searched locations.
    pub fn locate(explicit: Option<&Path>) -> Result<PathBuf, PreconditionError> {
        let env_dir = std::env::var_os(STEAMCMD_DIR_ENV).map(PathBuf::from);
        let cwd_dir = std::env::current_dir().ok().map(|cwd| cwd.join("steamcmd"));
        Self::locate_with(explicit, env_dir.as_deref(), cwd_dir.as_deref())
    }

    /// [`locate`](Self::locate) with the environment supplied by the caller.
    ///
    /// An explicit path that does not hold steamcmd is an error; no fallback
    /// is tried in that case.
    ///
    /// # Errors
    ///
    /// Returns [`PreconditionError::ToolNotFound`] listing the searched locations.
    pub fn locate_with(
        explicit: Option<&Path>,
        env_dir: Option<&Path>,
        cwd_dir: Option<&Path>,
    ) -> Result<PathBuf, PreconditionError> {
        if let Some(path) = explicit {
            if path.is_file() {
                return Ok(path.to_path_buf());
            }
            return find_in_dir(path).ok_or_else(|| PreconditionError::ToolNotFound {
                searched: path.display().to_string(),
            });
        }

        let mut searched = Vec::new();
        for dir in [env_dir, cwd_dir].into_iter().flatten() {
            if let Some(found) = find_in_dir(dir) {
                debug!(path = %found.display(), "found steamcmd");
                return Ok(found);
            }
            searched.push(dir.display().to_string());
        }

        if let Some(found) = BINARY_NAMES.iter().find_map(|name| which::which(name).ok()) {
            debug!(path = %found.display(), "found steamcmd on PATH");
            return Ok(found);
        }
        searched.push("PATH".to_string());

        Err(PreconditionError::ToolNotFound {
            searched: searched.join(", "),
        })
    }

    fn args(&self, install_dir: &Path, id: &WorkshopId) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "+force_install_dir".into(),
            install_dir.as_os_str().to_owned(),
            "+login".into(),
            "anonymous".into(),
            "+workshop_download_item".into(),
            self.app_id.clone().into(),
            id.as_str().into(),
        ];
        if self.validate {
            args.push("validate".into());
        }
        args.push("+quit".into());
        args
    }

    /// Where steamcmd leaves an item's files under `install_dir`.
    fn content_dir(&self, install_dir: &Path, id: &WorkshopId) -> PathBuf {
        install_dir
            .join("steamapps")
            .join("workshop")
            .join("content")
            .join(&self.app_id)
            .join(id.as_str())
    }
}

#[async_trait]
impl ItemFetcher for SteamCmd {
    fn name(&self) -> &str {
        "steamcmd"
    }

    #[instrument(skip(self, dest_dir), fields(item_id = %id, app_id = %self.app_id))]
    async fn fetch_item(&self, id: &WorkshopId, dest_dir: &Path) -> Result<(), FetchItemError> {
        let dest_dir =
            std::path::absolute(dest_dir).map_err(|e| FetchItemError::io(dest_dir, e))?;
        let staging = dest_dir.join(STAGING_DIR_NAME).join(id.as_str());

        if tokio::fs::try_exists(&staging).await.unwrap_or(false) {
            debug!(path = %staging.display(), "clearing stale staging directory");
            tokio::fs::remove_dir_all(&staging)
                .await
                .map_err(|e| FetchItemError::io(&staging, e))?;
        }
        tokio::fs::create_dir_all(&staging)
            .await
            .map_err(|e| FetchItemError::io(&staging, e))?;

        debug!(binary = %self.binary.display(), "running steamcmd");
        let output = Command::new(&self.binary)
            .args(self.args(&staging, id))
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| FetchItemError::Spawn {
                program: self.binary.clone(),
                source,
            })?;

        let mut log = String::from_utf8_lossy(&output.stdout).into_owned();
        log.push('\n');
        log.push_str(&String::from_utf8_lossy(&output.stderr));

        if !reports_success(&log, id) {
            remove_staging(&staging).await;
            let reason = failure_reason(&log)
                .unwrap_or_else(|| format!("steamcmd exited with {}", output.status));
            return Err(FetchItemError::failed(id, reason));
        }

        let content = self.content_dir(&staging, id);
        if !tokio::fs::try_exists(&content).await.unwrap_or(false) {
            remove_staging(&staging).await;
            return Err(FetchItemError::MissingContent {
                id: id.clone(),
                path: content,
            });
        }

        let target = dest_dir.join(id.as_str());
        if tokio::fs::try_exists(&target).await.unwrap_or(false) {
            debug!(path = %target.display(), "replacing previous download");
            tokio::fs::remove_dir_all(&target)
                .await
                .map_err(|e| FetchItemError::io(&target, e))?;
        }
        tokio::fs::rename(&content, &target)
            .await
            .map_err(|e| FetchItemError::io(&target, e))?;

        remove_staging(&staging).await;
        debug!(path = %target.display(), "item placed");
        Ok(())
    }

    async fn discard_partial(&self, id: &WorkshopId, dest_dir: &Path) {
        let staging = match std::path::absolute(dest_dir) {
            Ok(dest_dir) => dest_dir.join(STAGING_DIR_NAME).join(id.as_str()),
            Err(e) => {
                warn!(path = %dest_dir.display(), error = %e, "could not resolve destination");
                return;
            }
        };
        if tokio::fs::try_exists(&staging).await.unwrap_or(false) {
            debug!(item_id = %id, path = %staging.display(), "discarding partial download");
            remove_staging(&staging).await;
        }
    }
}

fn find_in_dir(dir: &Path) -> Option<PathBuf> {
    BINARY_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|candidate| candidate.is_file())
}

/// True when the output confirms the download of exactly `id`.
fn reports_success(log: &str, id: &WorkshopId) -> bool {
    SUCCESS_RE
        .captures_iter(log)
        .any(|caps| caps.get(1).is_some_and(|m| m.as_str() == id.as_str()))
}

/// Picks the most useful line of a failed run: the last `ERROR`/`FAILED`
/// line, else the last non-empty line.
fn failure_reason(log: &str) -> Option<String> {
    let lines: Vec<&str> = log
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    lines
        .iter()
        .rev()
        .find(|line| {
            let upper = line.to_ascii_uppercase();
            upper.contains("ERROR") || upper.contains("FAILED")
        })
        .or_else(|| lines.last())
        .map(|line| (*line).to_string())
}

async fn remove_staging(staging: &Path) {
    if let Err(e) = tokio::fs::remove_dir_all(staging).await {
        warn!(path = %staging.display(), error = %e, "could not remove staging directory");
    }
    if let Some(parent) = staging.parent() {
        // Only succeeds once no other item is staging.
        if let Err(e) = tokio::fs::remove_dir(parent).await {
            debug!(path = %parent.display(), error = %e, "staging root kept");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn id(raw: &str) -> WorkshopId {
        WorkshopId::parse(raw).unwrap()
    }

    #[test]
    fn test_args_anonymous_download_then_quit() {
        let steamcmd = SteamCmd::new("/opt/steamcmd/steamcmd.sh", "108600");
        let args = steamcmd.args(Path::new("/mods/.partial/42"), &id("42"));
        let args: Vec<_> = args.iter().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(
            args,
            vec![
                "+force_install_dir",
                "/mods/.partial/42",
                "+login",
                "anonymous",
                "+workshop_download_item",
                "108600",
                "42",
                "+quit",
            ]
        );
    }

    #[test]
    fn test_args_validate_precedes_quit() {
        let steamcmd = SteamCmd::new("steamcmd", "4000").with_validate(true);
        let args = steamcmd.args(Path::new("/tmp/x"), &id("1"));
        let tail: Vec<_> = args[args.len() - 2..]
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(tail, vec!["validate", "+quit"]);
    }

    #[test]
    fn test_reports_success_requires_matching_id() {
        let log = "Downloading item 123 ...\nSuccess. Downloaded item 123 to \"/x\" (100 bytes)";
        assert!(reports_success(log, &id("123")));
        assert!(!reports_success(log, &id("12")));
        assert!(!reports_success("ERROR! Download item 123 failed (Timeout).", &id("123")));
    }

    #[test]
    fn test_failure_reason_prefers_error_lines() {
        let log = "Loading Steam API...OK\nERROR! Download item 9 failed (Access Denied).\nUnloading\n";
        assert_eq!(
            failure_reason(log).as_deref(),
            Some("ERROR! Download item 9 failed (Access Denied).")
        );
        assert_eq!(failure_reason("a\n\nlast line\n").as_deref(), Some("last line"));
        assert_eq!(failure_reason("\n  \n"), None);
    }

    #[test]
    fn test_locate_explicit_file() {
        let dir = TempDir::new().unwrap();
        let binary = dir.path().join("my-steamcmd");
        std::fs::write(&binary, "").unwrap();
        assert_eq!(SteamCmd::locate_with(Some(&binary), None, None).unwrap(), binary);
    }

    #[test]
    fn test_locate_explicit_directory() {
        let dir = TempDir::new().unwrap();
        let binary = dir.path().join(BINARY_NAMES[0]);
        std::fs::write(&binary, "").unwrap();
        assert_eq!(
            SteamCmd::locate_with(Some(dir.path()), None, None).unwrap(),
            binary
        );
    }

    #[test]
    fn test_locate_explicit_missing_does_not_fall_back() {
        let dir = TempDir::new().unwrap();
        let fallback = TempDir::new().unwrap();
        std::fs::write(fallback.path().join(BINARY_NAMES[0]), "").unwrap();
        let missing = dir.path().join("nope");
        let result = SteamCmd::locate_with(Some(&missing), Some(fallback.path()), None);
        assert!(matches!(result, Err(PreconditionError::ToolNotFound { .. })));
    }

    #[test]
    fn test_locate_env_dir_before_cwd() {
        let env_dir = TempDir::new().unwrap();
        let cwd_dir = TempDir::new().unwrap();
        std::fs::write(env_dir.path().join(BINARY_NAMES[0]), "").unwrap();
        std::fs::write(cwd_dir.path().join(BINARY_NAMES[0]), "").unwrap();
        let found =
            SteamCmd::locate_with(None, Some(env_dir.path()), Some(cwd_dir.path())).unwrap();
        assert!(found.starts_with(env_dir.path()));
    }

    #[test]
    fn test_content_dir_layout() {
        let steamcmd = SteamCmd::new("steamcmd", "108600");
        assert_eq!(
            steamcmd.content_dir(Path::new("/s"), &id("7")),
            PathBuf::from("/s/steamapps/workshop/content/108600/7")
        );
    }
}
