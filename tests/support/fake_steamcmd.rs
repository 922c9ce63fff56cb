//! Shell script standing in for steamcmd.
//!
//! Arguments arrive as `+force_install_dir DIR +login anonymous
//! +workshop_download_item APP ID [validate] +quit`. Item `666` always fails,
//! item `777` claims success without writing content, and every other item
//! is written to the Workshop content layout.

#![allow(dead_code)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

const SCRIPT: &str = r#"#!/bin/sh
dir="$2"
app="$6"
id="$7"
echo "Steam Console Client (c) Valve Corporation - version 1700000000"
echo "Connecting anonymously to Steam Public...OK"
case "$id" in
  666)
    echo "ERROR! Download item $id failed (Failure)."
    exit 1
    ;;
  777)
    echo "Success. Downloaded item $id to \"$dir/steamapps/workshop/content/$app/$id\" (0 bytes)"
    exit 0
    ;;
esac
content="$dir/steamapps/workshop/content/$app/$id"
mkdir -p "$content"
echo "item $id" > "$content/mod.info"
echo "$@" > "$content/args.txt"
echo "Success. Downloaded item $id to \"$content\" (7 bytes)"
"#;

/// Writes the script as `steamcmd.sh` in `dir` and returns its path.
pub fn install(dir: &Path) -> PathBuf {
    std::fs::create_dir_all(dir).unwrap();
    let path = dir.join("steamcmd.sh");
    std::fs::write(&path, SCRIPT).unwrap();
    let mut permissions = std::fs::metadata(&path).unwrap().permissions();
    permissions.set_mode(0o755);
    std::fs::set_permissions(&path, permissions).unwrap();
    path
}
