use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use client_core::api::normalize_base_url;
use serde::Deserialize;
use tracing::warn;
use url::Url;

pub const SETTINGS_FILE: &str = "car-client.toml";
const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8000";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_base_url: String,
    pub data_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.into(),
            data_dir: default_data_dir(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    api_base_url: Option<String>,
    data_dir: Option<PathBuf>,
}

pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("car-client")
}

pub fn load_settings() -> Settings {
    load_settings_from(Path::new(SETTINGS_FILE), |key| std::env::var(key).ok())
}

/// Defaults, then the settings file, then environment; later sources win.
pub fn load_settings_from(path: &Path, env: impl Fn(&str) -> Option<String>) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        match toml::from_str::<FileSettings>(&raw) {
            Ok(file_cfg) => {
                if let Some(v) = file_cfg.api_base_url {
                    settings.api_base_url = v;
                }
                if let Some(v) = file_cfg.data_dir {
                    settings.data_dir = v;
                }
            }
            Err(err) => warn!(path = %path.display(), %err, "ignoring malformed settings file"),
        }
    }

    if let Some(v) = env("CAR_CLIENT_API_URL") {
        settings.api_base_url = v;
    }
    if let Some(v) = env("APP__API_BASE_URL") {
        settings.api_base_url = v;
    }

    if let Some(v) = env("CAR_CLIENT_DATA_DIR") {
        settings.data_dir = PathBuf::from(v);
    }
    if let Some(v) = env("APP__DATA_DIR") {
        settings.data_dir = PathBuf::from(v);
    }

    settings
}

impl Settings {
    pub fn api_url(&self) -> anyhow::Result<Url> {
        let url = Url::parse(self.api_base_url.trim())
            .with_context(|| format!("invalid api base url '{}'", self.api_base_url))?;
        Ok(normalize_base_url(url))
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, io::Write};

    use tempfile::NamedTempFile;

    use super::*;

    fn settings_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("temp settings");
        file.write_all(contents.as_bytes()).expect("write settings");
        file
    }

    #[test]
    fn missing_file_and_env_yield_defaults() {
        let settings = load_settings_from(Path::new("/nonexistent/car-client.toml"), |_| None);
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn file_values_are_overridden_by_env() {
        let file =
            settings_file("api_base_url = \"http://cars.internal:9000\"\ndata_dir = \"/tmp/cars\"\n");
        let env: HashMap<&str, &str> = HashMap::from([("APP__DATA_DIR", "/var/lib/cars")]);

        let settings = load_settings_from(file.path(), |key| env.get(key).map(|v| v.to_string()));

        assert_eq!(settings.api_base_url, "http://cars.internal:9000");
        assert_eq!(settings.data_dir, PathBuf::from("/var/lib/cars"));
    }

    #[test]
    fn app_prefixed_env_wins_over_short_name() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("CAR_CLIENT_API_URL", "http://a:1"),
            ("APP__API_BASE_URL", "http://b:2"),
        ]);
        let settings = load_settings_from(Path::new("/nonexistent/car-client.toml"), |key| {
            env.get(key).map(|v| v.to_string())
        });
        assert_eq!(settings.api_base_url, "http://b:2");
    }

    #[test]
    fn malformed_file_is_ignored() {
        let file = settings_file("api_base_url = [");
        let settings = load_settings_from(file.path(), |_| None);
        assert_eq!(settings.api_base_url, DEFAULT_API_BASE_URL);
    }

    #[test]
    fn api_url_gains_trailing_slash_for_joining() {
        let settings = Settings {
            api_base_url: "http://localhost:8000/backend".into(),
            ..Settings::default()
        };
        let url = settings.api_url().expect("url");
        assert_eq!(
            url.join("api/v1/cars/").expect("join").as_str(),
            "http://localhost:8000/backend/api/v1/cars/"
        );
        assert!(Settings {
            api_base_url: "not a url".into(),
            ..Settings::default()
        }
        .api_url()
        .is_err());
    }
}
