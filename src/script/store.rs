use crate::{agent::site_label,
            error::{Result, ScrapError},
            script::Script};
use std::path::{Path, PathBuf};

/// Scripts persisted as `<dir>/<host>.json`
#[derive(Debug, Clone)]
pub struct ScriptStore {
    dir: PathBuf,
}

impl ScriptStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Store key for the site a URL points at
    pub fn key_for_url(url: &str) -> String {
        sanitize_key(&site_label(url))
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", sanitize_key(key)))
    }

    pub fn exists(&self, key: &str) -> bool {
        self.path_for(key).is_file()
    }

    pub fn get(&self, key: &str) -> Result<Script> {
        let path = self.path_for(key);
        if !path.is_file() {
            return Err(ScrapError::ScriptNotFound(key.to_string()));
        }
        Script::load(&path)
    }

    /// Write `script` under `key`, replacing any previous version
    pub fn save(&self, key: &str, script: &Script) -> Result<PathBuf> {
        script.validate()?;
        std::fs::create_dir_all(&self.dir)?;

        let path = self.path_for(key);
        std::fs::write(&path, script.to_json()?)?;
        log::info!("Saved script for '{}' to {}", key, path.display());
        Ok(path)
    }
}

/// Keep keys to a single safe file name component
fn sanitize_key(key: &str) -> String {
    let cleaned: String = key
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
        .collect();
    let cleaned = cleaned.trim_matches('.');
    if cleaned.is_empty() { "_".to_string() } else { cleaned.to_string() }
}
