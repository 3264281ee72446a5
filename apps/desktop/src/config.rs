use std::{fs, io, path::Path, time::Duration};

use anyhow::Context;
use serde::Deserialize;
use shared::domain::{DEFAULT_SIMILAR_RESULTS, DEFAULT_USERNAME};
use url::Url;
use writer_core::{Configuration, DEFAULT_MINING_DEADLINE};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_base_url: String,
    pub username: String,
    pub mining_timeout_secs: u64,
    pub similar_results: u32,
    pub bucket: Option<String>,
    pub novel_name: Option<String>,
    pub story_name: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:8000/api".into(),
            username: DEFAULT_USERNAME.into(),
            mining_timeout_secs: DEFAULT_MINING_DEADLINE.as_secs(),
            similar_results: DEFAULT_SIMILAR_RESULTS,
            bucket: None,
            novel_name: None,
            story_name: None,
        }
    }
}

/// Every key is optional; missing keys keep their defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileSettings {
    api_base_url: Option<String>,
    username: Option<String>,
    mining_timeout_secs: Option<u64>,
    similar_results: Option<u32>,
    bucket: Option<String>,
    novel_name: Option<String>,
    story_name: Option<String>,
}

impl Settings {
    pub fn mining_deadline(&self) -> Duration {
        Duration::from_secs(self.mining_timeout_secs)
    }

    /// Initial session configuration seeded from the process settings.
    pub fn session_configuration(&self) -> Configuration {
        Configuration {
            bucket: self.bucket.clone(),
            novel_name: self.novel_name.clone(),
            story_name: self.story_name.clone(),
        }
    }

    fn merge_file(&mut self, file: FileSettings) {
        if let Some(v) = file.api_base_url {
            self.api_base_url = v;
        }
        if let Some(v) = file.username {
            self.username = v;
        }
        if let Some(v) = file.mining_timeout_secs {
            self.mining_timeout_secs = v;
        }
        if let Some(v) = file.similar_results {
            self.similar_results = v;
        }
        if file.bucket.is_some() {
            self.bucket = file.bucket;
        }
        if file.novel_name.is_some() {
            self.novel_name = file.novel_name;
        }
        if file.story_name.is_some() {
            self.story_name = file.story_name;
        }
    }

    /// Applies environment overrides read through `var`.
    fn merge_env(&mut self, var: impl Fn(&str) -> Option<String>) -> anyhow::Result<()> {
        if let Some(v) = var("NOVELWRITER_API_URL") {
            self.api_base_url = v;
        }
        if let Some(v) = var("APP__API_BASE_URL") {
            self.api_base_url = v;
        }
        if let Some(v) = var("NOVELWRITER_USERNAME") {
            self.username = v;
        }
        if let Some(v) = var("NOVELWRITER_MINING_TIMEOUT_SECS") {
            self.mining_timeout_secs = v
                .trim()
                .parse()
                .with_context(|| format!("invalid NOVELWRITER_MINING_TIMEOUT_SECS '{v}'"))?;
        }
        if let Some(v) = var("NOVELWRITER_BUCKET") {
            self.bucket = Some(v);
        }
        if let Some(v) = var("NOVELWRITER_NOVEL_NAME") {
            self.novel_name = Some(v);
        }
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let url = Url::parse(&self.api_base_url)
            .with_context(|| format!("invalid api base url '{}'", self.api_base_url))?;
        if !matches!(url.scheme(), "http" | "https") {
            anyhow::bail!("api base url must be http or https, got '{}'", url.scheme());
        }
        if self.mining_timeout_secs == 0 {
            anyhow::bail!("mining timeout must be at least one second");
        }
        Ok(())
    }
}

/// Defaults, then `path` if it exists, then the process environment.
pub fn load_settings(path: &Path) -> anyhow::Result<Settings> {
    load_settings_with(path, |key| std::env::var(key).ok())
}

fn load_settings_with(
    path: &Path,
    var: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    match fs::read_to_string(path) {
        Ok(raw) => {
            let file: FileSettings = toml::from_str(&raw)
                .with_context(|| format!("failed to parse '{}'", path.display()))?;
            settings.merge_file(file);
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no settings file, using defaults");
        }
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read '{}'", path.display()));
        }
    }

    settings.merge_env(var)?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use std::{
        collections::HashMap,
        env,
        time::{SystemTime, UNIX_EPOCH},
    };

    use super::*;

    fn temp_file(name: &str, contents: &str) -> std::path::PathBuf {
        let suffix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos();
        let path = env::temp_dir().join(format!("novelwriter_{name}_{suffix}.toml"));
        fs::write(&path, contents).expect("write settings");
        path
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn missing_file_yields_defaults() {
        let settings =
            load_settings_with(Path::new("/definitely/not/here.toml"), no_env).expect("load");
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.mining_deadline(), Duration::from_secs(300));
        settings.validate().expect("defaults are valid");
    }

    #[test]
    fn file_then_env_override() {
        let path = temp_file(
            "layered",
            "api_base_url = \"http://writer.local/api\"\nbucket = \"novels\"\nmining_timeout_secs = 60\n",
        );
        let env: HashMap<&str, &str> = HashMap::from([
            ("NOVELWRITER_BUCKET", "archive"),
            ("NOVELWRITER_USERNAME", "mira"),
        ]);
        let settings =
            load_settings_with(&path, |key| env.get(key).map(|v| v.to_string())).expect("load");
        fs::remove_file(&path).expect("cleanup");

        assert_eq!(settings.api_base_url, "http://writer.local/api");
        assert_eq!(settings.mining_timeout_secs, 60);
        assert_eq!(settings.bucket.as_deref(), Some("archive"));
        assert_eq!(settings.username, "mira");
        assert_eq!(settings.session_configuration().bucket.as_deref(), Some("archive"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let path = temp_file("unknown", "bind_addr = \"0.0.0.0:1\"\n");
        let result = load_settings_with(&path, no_env);
        fs::remove_file(&path).expect("cleanup");
        assert!(result.is_err());
    }

    #[test]
    fn bad_timeout_env_is_an_error() {
        let result = load_settings_with(Path::new("/definitely/not/here.toml"), |key| {
            (key == "NOVELWRITER_MINING_TIMEOUT_SECS").then(|| "soon".to_string())
        });
        assert!(result.is_err());
    }

    #[test]
    fn non_http_base_url_fails_validation() {
        let settings = Settings {
            api_base_url: "ftp://example.com/api".into(),
            ..Settings::default()
        };
        assert!(settings.validate().is_err());
    }
}
