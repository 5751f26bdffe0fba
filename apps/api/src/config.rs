use std::{path::PathBuf, str::FromStr, time::Duration};

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Every variable has a default; a malformed number fails startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    /// Directory holding `resume.tex` and `awesome-cv.cls`.
    pub template_dir: PathBuf,
    /// Parent of the per-job workspaces.
    pub output_dir: PathBuf,
    pub upload_dir: PathBuf,
    pub cache_dir: PathBuf,
    pub cache_ttl_secs: u64,
    pub cache_max_bytes: u64,
    pub latex_program: String,
    pub fallback_timeout: Duration,
    pub default_style: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            port: parse_env("PORT", 8080)?,
            rust_log: env_or("RUST_LOG", "info"),
            template_dir: env_or("TEMPLATE_DIR", "./build").into(),
            output_dir: env_or("OUTPUT_DIR", "./output").into(),
            upload_dir: env_or("UPLOAD_DIR", "./uploads").into(),
            cache_dir: std::env::var("CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| default_cache_dir()),
            cache_ttl_secs: parse_env("CACHE_TTL_SECS", 7 * 24 * 60 * 60)?,
            cache_max_bytes: parse_env("CACHE_MAX_BYTES", 100 * 1024 * 1024)?,
            latex_program: env_or("LATEX_PROGRAM", "xelatex"),
            fallback_timeout: Duration::from_secs(parse_env("FALLBACK_TIMEOUT_SECS", 30)?),
            default_style: env_or("DEFAULT_STYLE", "red"),
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        Err(_) => Ok(default),
    }
}

/// `~/.cv_generator/cache`, or `./.cv_cache` when there is no home directory.
fn default_cache_dir() -> PathBuf {
    match std::env::var_os("HOME") {
        Some(home) if !home.is_empty() => PathBuf::from(home).join(".cv_generator").join("cache"),
        _ => PathBuf::from("./.cv_cache"),
    }
}
