use std::path::PathBuf;

use crate::constants::{
    API_KEY_FILE, APP_NAME, DEFAULT_GEMINI_ENDPOINT, DEFAULT_IMAGE_MODEL, ENV_API_KEY,
    ENV_API_KEY_FALLBACK, ENV_ENDPOINT, ENV_HOME, ENV_MODEL, OUTPUT_DIR_NAME,
};

/// Values given on the command line; they win over the environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub model: Option<String>,
    pub endpoint: Option<String>,
    pub data_dir: Option<PathBuf>,
}

#[derive(Clone)]
pub struct AppConfig {
    pub model: String,
    pub endpoint: String,
    pub data_dir: PathBuf,
    /// Key supplied through the environment, if any.
    pub api_key: Option<String>,
}

impl AppConfig {
    pub fn load(overrides: ConfigOverrides) -> Self {
        Self::resolve(overrides, |name| std::env::var(name).ok())
    }

    pub fn resolve(overrides: ConfigOverrides, env: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |name: &str| {
            env(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let model = overrides
            .model
            .or_else(|| non_empty(ENV_MODEL))
            .unwrap_or_else(|| DEFAULT_IMAGE_MODEL.to_string());
        let endpoint = overrides
            .endpoint
            .or_else(|| non_empty(ENV_ENDPOINT))
            .unwrap_or_else(|| DEFAULT_GEMINI_ENDPOINT.to_string());
        let data_dir = overrides
            .data_dir
            .or_else(|| non_empty(ENV_HOME).map(PathBuf::from))
            .unwrap_or_else(default_data_dir);
        let api_key = non_empty(ENV_API_KEY).or_else(|| non_empty(ENV_API_KEY_FALLBACK));

        Self {
            model,
            endpoint,
            data_dir,
            api_key,
        }
    }

    pub fn output_dir(&self) -> PathBuf {
        self.data_dir.join(OUTPUT_DIR_NAME)
    }

    pub fn key_file(&self) -> PathBuf {
        self.data_dir.join(API_KEY_FILE)
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .field("data_dir", &self.data_dir)
            .field("api_key", &self.api_key.as_ref().map(|_| "<set>"))
            .finish()
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join(APP_NAME))
        .unwrap_or_else(|| PathBuf::from(format!(".{APP_NAME}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_apply_without_environment() {
        let config = AppConfig::resolve(ConfigOverrides::default(), env_from(&[]));
        assert_eq!(config.model, DEFAULT_IMAGE_MODEL);
        assert_eq!(config.endpoint, DEFAULT_GEMINI_ENDPOINT);
        assert!(config.api_key.is_none());
        assert_eq!(config.output_dir(), config.data_dir.join("output"));
    }

    #[test]
    fn overrides_win_over_environment() {
        let config = AppConfig::resolve(
            ConfigOverrides {
                model: Some("gemini-2.5-flash-image".into()),
                endpoint: None,
                data_dir: Some(PathBuf::from("/tmp/forge")),
            },
            env_from(&[
                (ENV_MODEL, "from-env"),
                (ENV_ENDPOINT, "http://localhost:8080"),
                (ENV_HOME, "/srv/forge"),
            ]),
        );
        assert_eq!(config.model, "gemini-2.5-flash-image");
        assert_eq!(config.endpoint, "http://localhost:8080");
        assert_eq!(config.key_file(), PathBuf::from("/tmp/forge/api_key"));
    }

    #[test]
    fn api_key_falls_back_and_ignores_blank_values() {
        let config = AppConfig::resolve(
            ConfigOverrides::default(),
            env_from(&[(ENV_API_KEY, "   "), (ENV_API_KEY_FALLBACK, "abc123")]),
        );
        assert_eq!(config.api_key.as_deref(), Some("abc123"));
        assert!(!format!("{config:?}").contains("abc123"));
    }
}
