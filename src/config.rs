#![forbid(unsafe_code)]

//! Runtime settings. Resolution order: explicit override (CLI flag), process
//! environment, `.env` file, built-in default.

use anyhow::{Context, Result};
use std::{
    collections::HashMap,
    env, fs,
    path::{Path, PathBuf},
};

use crate::cookies::DEFAULT_COOKIES_PATH;
use crate::ytdlp::DEFAULT_YTDLP_BIN;

pub const DEFAULT_ENV_PATH: &str = ".env";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_HOST: &str = "127.0.0.1";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeSettings {
    pub host: String,
    pub port: u16,
    pub cookies_path: PathBuf,
    pub ytdlp_bin: PathBuf,
    pub temp_dir: PathBuf,
}

#[derive(Debug, Clone, Default)]
pub struct RuntimeOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub cookies_path: Option<PathBuf>,
    pub ytdlp_bin: Option<PathBuf>,
    pub temp_dir: Option<PathBuf>,
    pub env_path: Option<PathBuf>,
}

pub fn resolve_runtime_settings(overrides: RuntimeOverrides) -> Result<RuntimeSettings> {
    let env_path = overrides
        .env_path
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_ENV_PATH));
    let file_vars = read_env_file(&env_path)?;
    Ok(build_settings(&file_vars, env_var_string, overrides))
}

fn build_settings(
    file_vars: &HashMap<String, String>,
    env_lookup: impl Fn(&str) -> Option<String>,
    overrides: RuntimeOverrides,
) -> RuntimeSettings {
    let lookup = |key: &str| lookup_value(key, file_vars, &env_lookup);

    let host = overrides
        .host
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .or_else(|| lookup("FETCHTUBE_HOST"))
        .unwrap_or_else(|| DEFAULT_HOST.to_string());
    let port = overrides
        .port
        .or_else(|| lookup("FETCHTUBE_PORT").and_then(|value| value.parse::<u16>().ok()))
        .unwrap_or(DEFAULT_PORT);
    let cookies_path = overrides
        .cookies_path
        .or_else(|| lookup("COOKIES_PATH").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_COOKIES_PATH));
    let ytdlp_bin = overrides
        .ytdlp_bin
        .or_else(|| lookup("YTDLP_BIN").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_YTDLP_BIN));
    let temp_dir = overrides
        .temp_dir
        .or_else(|| lookup("FETCHTUBE_TEMP_DIR").map(PathBuf::from))
        .unwrap_or_else(env::temp_dir);

    RuntimeSettings {
        host,
        port,
        cookies_path,
        ytdlp_bin,
        temp_dir,
    }
}

fn env_var_string(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| non_empty(&value))
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn lookup_value(
    key: &str,
    file_vars: &HashMap<String, String>,
    env_lookup: &impl Fn(&str) -> Option<String>,
) -> Option<String> {
    env_lookup(key).or_else(|| file_vars.get(key).and_then(|value| non_empty(value)))
}

/// Reads `KEY=value` pairs. Blank lines, `#` comments and lines without `=`
/// are skipped; an `export ` prefix and one level of matching quotes are
/// stripped. A missing file is an empty map.
pub fn read_env_file(path: &Path) -> Result<HashMap<String, String>> {
    let mut vars = HashMap::new();
    if !path.exists() {
        return Ok(vars);
    }
    let content =
        fs::read_to_string(path).with_context(|| format!("Reading {}", path.display()))?;
    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let line = trimmed.strip_prefix("export ").unwrap_or(trimmed);
        let Some((key, raw)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        vars.insert(key.to_string(), unquote(raw.trim()).to_string());
    }
    Ok(vars)
}

fn unquote(value: &str) -> &str {
    ['"', '\'']
        .into_iter()
        .find_map(|quote| value.strip_prefix(quote)?.strip_suffix(quote))
        .unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn make_config(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", contents).unwrap();
        file
    }

    fn settings_from(contents: &str) -> RuntimeSettings {
        let cfg = make_config(contents);
        let vars = read_env_file(cfg.path()).unwrap();
        build_settings(&vars, |_| None, RuntimeOverrides::default())
    }

    #[test]
    fn defaults_apply_without_any_source() {
        let settings = settings_from("");
        assert_eq!(settings.host, DEFAULT_HOST);
        assert_eq!(settings.port, DEFAULT_PORT);
        assert_eq!(settings.cookies_path, PathBuf::from(DEFAULT_COOKIES_PATH));
        assert_eq!(settings.ytdlp_bin, PathBuf::from(DEFAULT_YTDLP_BIN));
        assert_eq!(settings.temp_dir, env::temp_dir());
    }

    #[test]
    fn file_values_are_used() {
        let settings = settings_from(
            "FETCHTUBE_HOST=\"0.0.0.0\"\nFETCHTUBE_PORT=8081\nCOOKIES_PATH='/srv/cookies.txt'\n\
             YTDLP_BIN=/opt/yt-dlp\nFETCHTUBE_TEMP_DIR=/scratch\n",
        );
        assert_eq!(settings.host, "0.0.0.0");
        assert_eq!(settings.port, 8081);
        assert_eq!(settings.cookies_path, PathBuf::from("/srv/cookies.txt"));
        assert_eq!(settings.ytdlp_bin, PathBuf::from("/opt/yt-dlp"));
        assert_eq!(settings.temp_dir, PathBuf::from("/scratch"));
    }

    #[test]
    fn env_beats_file_and_overrides_beat_env() {
        let vars = read_env_file(
            make_config("COOKIES_PATH=/file/cookies.txt\nFETCHTUBE_PORT=7000\n").path(),
        )
        .unwrap();
        let env_lookup = |key: &str| match key {
            "COOKIES_PATH" => Some("/env/cookies.txt".to_string()),
            "FETCHTUBE_PORT" => Some("8000".to_string()),
            _ => None,
        };

        let settings = build_settings(&vars, env_lookup, RuntimeOverrides::default());
        assert_eq!(settings.cookies_path, PathBuf::from("/env/cookies.txt"));
        assert_eq!(settings.port, 8000);

        let settings = build_settings(
            &vars,
            env_lookup,
            RuntimeOverrides {
                port: Some(9000),
                cookies_path: Some(PathBuf::from("/flag/cookies.txt")),
                ..RuntimeOverrides::default()
            },
        );
        assert_eq!(settings.cookies_path, PathBuf::from("/flag/cookies.txt"));
        assert_eq!(settings.port, 9000);
    }

    #[test]
    fn blank_and_invalid_values_fall_back() {
        let vars = read_env_file(
            make_config("FETCHTUBE_HOST=\"  \"\nFETCHTUBE_PORT=\"nope\"\nYTDLP_BIN=\n").path(),
        )
        .unwrap();
        let settings = build_settings(
            &vars,
            |_| None,
            RuntimeOverrides {
                host: Some("   ".into()),
                ..RuntimeOverrides::default()
            },
        );
        assert_eq!(settings.host, DEFAULT_HOST);
        assert_eq!(settings.port, DEFAULT_PORT);
        assert_eq!(settings.ytdlp_bin, PathBuf::from(DEFAULT_YTDLP_BIN));
    }

    #[test]
    fn read_env_file_handles_export_comments_and_junk() {
        let cfg = make_config(
            r#"
            export COOKIES_PATH="/app/cookies.txt"
            # comment
            FETCHTUBE_HOST =  '0.0.0.0'
            INVALID_LINE
            =orphan
            "#,
        );
        let vars = read_env_file(cfg.path()).unwrap();
        assert_eq!(vars.get("COOKIES_PATH").unwrap(), "/app/cookies.txt");
        assert_eq!(vars.get("FETCHTUBE_HOST").unwrap(), "0.0.0.0");
        assert_eq!(vars.len(), 2);
    }

    #[test]
    fn read_env_file_missing_file_returns_empty() {
        let dir = tempfile::tempdir().unwrap();
        let vars = read_env_file(&dir.path().join("missing.env")).unwrap();
        assert!(vars.is_empty());
    }

    #[test]
    fn resolve_reads_explicit_env_path() {
        let cfg = make_config("YTDLP_BIN=/from/env-file/yt-dlp\n");
        let settings = resolve_runtime_settings(RuntimeOverrides {
            env_path: Some(cfg.path().to_path_buf()),
            ..RuntimeOverrides::default()
        })
        .unwrap();
        // The process environment may carry YTDLP_BIN in CI; only assert when it does not.
        if env::var("YTDLP_BIN").map(|v| v.trim().is_empty()).unwrap_or(true) {
            assert_eq!(settings.ytdlp_bin, PathBuf::from("/from/env-file/yt-dlp"));
        }
    }
}
