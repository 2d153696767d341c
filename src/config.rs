use anyhow::{Context, Result, anyhow};
use getset::Getters;
use log::LevelFilter;
use std::{
    collections::HashMap,
    env, fs,
    path::{Path, PathBuf},
    str::FromStr,
};

pub const ENV_FILE: &str = ".env";

const DEFAULT_INPUT_DIR: &str = "input";
const DEFAULT_OUTPUT_DIR: &str = "output";
const DEFAULT_LOG_DIR: &str = "logs";
const DEFAULT_LOG_FILE: &str = "app.log";
const DEFAULT_LOG_MAX_BYTES: u64 = 1_048_576;
const DEFAULT_LOG_BACKUP_COUNT: usize = 5;

/// Directories of one run, absolute and existing.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct Paths {
    #[getset(get = "pub")]
    input_dir: PathBuf,
    #[getset(get = "pub")]
    output_dir: PathBuf,
    #[getset(get = "pub")]
    log_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct LogSettings {
    #[getset(get = "pub")]
    file_name: String,
    #[getset(get = "pub")]
    level: LevelFilter,
    #[getset(get = "pub")]
    max_bytes: u64,
    #[getset(get = "pub")]
    backup_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct Settings {
    #[getset(get = "pub")]
    paths: Paths,
    #[getset(get = "pub")]
    log: LogSettings,
}

impl Settings {
    /// Loads settings from the process environment, falling back to a `.env`
    /// file in the working directory. Relative paths resolve against the
    /// working directory.
    pub fn load() -> Result<Self> {
        let cwd = env::current_dir().context("cannot determine working directory")?;
        let dotenv = read_env_file(&cwd.join(ENV_FILE))?;
        Self::resolve(&cwd, |key| {
            env::var(key).ok().or_else(|| dotenv.get(key).cloned())
        })
    }

    /// Resolves settings from `lookup`.
    ///
    /// `INPUT_DIR` must already exist, `OUTPUT_DIR` and `LOG_DIR` are created.
    pub fn resolve(base: &Path, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let value = |key: &str, default: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let paths = Paths {
            input_dir: ensure_dir(base, &value("INPUT_DIR", DEFAULT_INPUT_DIR), "INPUT_DIR", false)?,
            output_dir: ensure_dir(base, &value("OUTPUT_DIR", DEFAULT_OUTPUT_DIR), "OUTPUT_DIR", true)?,
            log_dir: ensure_dir(base, &value("LOG_DIR", DEFAULT_LOG_DIR), "LOG_DIR", true)?,
        };

        let log = LogSettings {
            file_name: value("LOG_FILE", DEFAULT_LOG_FILE),
            level: parse_level(&value("LOG_LEVEL", "INFO")),
            max_bytes: parse_number("LOG_MAX_BYTES", &value("LOG_MAX_BYTES", ""), DEFAULT_LOG_MAX_BYTES)?,
            backup_count: parse_number(
                "LOG_BACKUP_COUNT",
                &value("LOG_BACKUP_COUNT", ""),
                DEFAULT_LOG_BACKUP_COUNT,
            )?,
        };

        Ok(Settings { paths, log })
    }
}

/// Reads `KEY=VALUE` pairs from a dotenv file without touching the process
/// environment. A missing file yields no pairs.
pub fn read_env_file(path: &Path) -> Result<HashMap<String, String>> {
    if !path.is_file() {
        return Ok(HashMap::new());
    }
    let mut vars = HashMap::new();
    for item in dotenvy::from_path_iter(path)
        .with_context(|| format!("cannot read {}", path.display()))?
    {
        let (key, value) = item.with_context(|| format!("malformed line in {}", path.display()))?;
        vars.insert(key, value);
    }
    Ok(vars)
}

fn ensure_dir(base: &Path, raw: &str, key: &str, create: bool) -> Result<PathBuf> {
    let path = base.join(raw);
    if create {
        fs::create_dir_all(&path)
            .with_context(|| format!("cannot create {key} at {}", path.display()))?;
    }
    if !path.exists() {
        return Err(anyhow!("path for {key} does not exist: {}", path.display()));
    }
    if !path.is_dir() {
        return Err(anyhow!("path for {key} is not a directory: {}", path.display()));
    }
    path.canonicalize()
        .with_context(|| format!("cannot resolve {key} at {}", path.display()))
}

/// Accepts `log` level names plus `WARNING` and `CRITICAL`. Unknown names mean INFO.
fn parse_level(raw: &str) -> LevelFilter {
    match raw.to_ascii_uppercase().as_str() {
        "WARNING" => LevelFilter::Warn,
        "CRITICAL" | "FATAL" => LevelFilter::Error,
        other => LevelFilter::from_str(other).unwrap_or(LevelFilter::Info),
    }
}

fn parse_number<T: FromStr>(key: &str, raw: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    if raw.is_empty() {
        return Ok(default);
    }
    raw.parse::<T>()
        .with_context(|| format!("{key} must be a non-negative integer, got {raw:?}"))
}
