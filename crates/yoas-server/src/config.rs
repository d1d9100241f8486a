use std::path::{Path, PathBuf};

use anyhow::{Result, bail};

/// Runtime configuration, read from the environment (after `.env` / `.KEY`).
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub access_key: String,
    pub api_prefix: String,
    pub main_address: Option<String>,
    pub dump_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let access_key = var("KEY").unwrap_or_default();
        if access_key.is_empty() {
            bail!("KEY is not set.");
        }

        let port: u16 = var("YOAS_PORT").unwrap_or_else(|| "8000".into()).parse()?;

        Ok(Self {
            host: var("YOAS_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            db_path: db_file_path(
                &var("DB_N_LOGS_FOLDER").unwrap_or_else(|| "db_n_logs".into()),
                &var("DB_FILE").unwrap_or_else(|| "yoas.db".into()),
            ),
            access_key,
            api_prefix: normalize_api_prefix(&var("MAIN_API_ADDRESS").unwrap_or_else(|| "/api".into())),
            main_address: var("MAIN_ADDRESS").filter(|s| !s.is_empty()),
            dump_dir: var("YOAS_DUMP_DIR").unwrap_or_else(|| "dumps".into()).into(),
        })
    }
}

/// `<folder>/<file>`, with `.db` appended when the file name lacks it.
fn db_file_path(folder: &str, file: &str) -> PathBuf {
    let file = if file.ends_with(".db") {
        file.to_string()
    } else {
        format!("{file}.db")
    };
    Path::new(folder).join(file)
}

/// Leading slash added, trailing slashes dropped; an empty prefix becomes `/`.
fn normalize_api_prefix(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}
