//! Test helpers: a scripted stand-in for yt-dlp.

use std::fs;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// Serializes every test that writes and executes a stub script. Forking
/// while another test still holds a stub open for writing makes `exec` fail
/// with ETXTBSY.
pub static PROCESS_LOCK: Mutex<()> = Mutex::const_new(());

/// Name of the file the stubs append their argument lists to.
pub const CALLS_LOG: &str = "calls.log";

/// Behaves like a cooperative yt-dlp: writes `<template with ext>` for
/// downloads, prints a title for `--get-title` and a JSON document for
/// `--dump-json`.
pub const HAPPY_STUB: &str = r#"template=""
ext="mp4"
mode="download"
prev=""
for arg in "$@"; do
  if [ "$prev" = "-o" ]; then template="$arg"; fi
  case "$arg" in
    -x) ext="mp3" ;;
    --get-title) mode="title" ;;
    --dump-json) mode="info" ;;
  esac
  prev="$arg"
done

if [ "$mode" = "title" ]; then
  echo "Never Gonna: Give/You Up!"
  exit 0
fi

if [ "$mode" = "info" ]; then
  cat "$(dirname "$0")/info.json"
  exit 0
fi

target=$(printf '%s' "$template" | sed "s/%(ext)s/$ext/")
echo "[download] Destination: $target"
printf 'media-payload-bytes' > "$target"
exit 0
"#;

/// Writes an executable `/bin/sh` script named `yt-dlp` into `dir`. Every
/// invocation appends its arguments (one line per call) to [`CALLS_LOG`].
pub fn install_stub(dir: &Path, body: &str) -> PathBuf {
    let script_path = dir.join("yt-dlp");
    let script = format!(
        "#!/bin/sh\nprintf '%s\\n' \"$*\" >> \"$(dirname \"$0\")/{CALLS_LOG}\"\n{body}"
    );
    fs::write(&script_path, script).unwrap();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(&script_path).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&script_path, perms).unwrap();
    }
    script_path
}

/// Argument lines recorded by a stub, oldest first.
pub fn recorded_calls(dir: &Path) -> Vec<String> {
    fs::read_to_string(dir.join(CALLS_LOG))
        .map(|raw| raw.lines().map(str::to_string).collect())
        .unwrap_or_default()
}

/// Sorted paths directly inside `dir`.
pub fn dir_entries(dir: &Path) -> Vec<PathBuf> {
    let mut entries: Vec<PathBuf> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect();
    entries.sort();
    entries
}
