use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::paths::AppPaths;
use super::schema::AppConfig;
use super::validation::validate_config;
use crate::core::errors::TutorError;

#[derive(Clone)]
pub struct ConfigService {
    paths: Arc<AppPaths>,
}

impl ConfigService {
    pub fn new(paths: Arc<AppPaths>) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &AppPaths {
        &self.paths
    }

    pub fn config_path(&self) -> PathBuf {
        if let Ok(path) = env::var("TUTOR_CONFIG_PATH") {
            return PathBuf::from(path);
        }

        let user_config = self.paths.user_data_dir.join("config.yml");
        if user_config.exists() {
            return user_config;
        }

        self.paths.project_root.join("config.yml")
    }

    /// Load the file, apply environment overrides, then validate.
    pub fn load_config(&self) -> Result<AppConfig, TutorError> {
        let mut config = load_yaml_file(&self.config_path())?;
        apply_env_overrides(&mut config, |key| env::var(key).ok());
        validate_config(&config)?;
        Ok(config)
    }

    /// Read the API key from the environment variable named by `llm.api_key_env`.
    pub fn api_key(&self, config: &AppConfig) -> Result<String, TutorError> {
        let name = &config.llm.api_key_env;
        match env::var(name) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(TutorError::Config(format!(
                "API key not found. Please set the {} environment variable.",
                name
            ))),
        }
    }
}

fn load_yaml_file(path: &Path) -> Result<AppConfig, TutorError> {
    if !path.exists() {
        tracing::debug!("No config file at {}, using defaults", path.display());
        return Ok(AppConfig::default());
    }

    let contents = fs::read_to_string(path)
        .map_err(|e| TutorError::Config(format!("Failed to read {}: {}", path.display(), e)))?;
    if contents.trim().is_empty() {
        return Ok(AppConfig::default());
    }

    serde_yaml::from_str::<AppConfig>(&contents)
        .map_err(|e| TutorError::Config(format!("Failed to parse {}: {}", path.display(), e)))
}

pub(crate) fn apply_env_overrides<F>(config: &mut AppConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(model) = lookup("TUTOR_MODEL") {
        config.llm.model = model;
    }
    if let Some(base_url) = lookup("TUTOR_BASE_URL") {
        config.llm.base_url = base_url;
    }
    if let Some(dir) = lookup("TUTOR_CORPUS_DIR") {
        config.rag.corpus_dir = PathBuf::from(dir);
    }
    if let Some(enabled) = lookup("TUTOR_RAG_ENABLED") {
        config.rag.enabled = matches!(enabled.to_ascii_lowercase().as_str(), "1" | "true" | "yes");
    }
    if let Some(port) = lookup("PORT").and_then(|val| val.parse::<u16>().ok()) {
        config.server.port = port;
    }
}
