//! Runtime configuration.
//!
//! Settings are layered: built-in defaults, an optional TOML file, then
//! `WORKSCRIBE_*` environment variables. The CLI applies its flags on top via
//! [`SettingsOverrides`]. A fresh [`Settings`] is built for every invocation
//! and passed explicitly into each workflow.

use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::ai::AiProvider;
use crate::error::ConfigError;
use crate::vcs::VcsSelector;

/// Config file looked up in the workspace root when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = ".workscribe.toml";

/// Default report output directory, relative to the workspace root.
pub const DEFAULT_OUTPUT_DIR: &str = "./reports";

const ENV_AI_PROVIDER: &str = "WORKSCRIBE_AI_PROVIDER";
const ENV_API_KEY: &str = "WORKSCRIBE_API_KEY";
const ENV_MODEL: &str = "WORKSCRIBE_MODEL";
const ENV_OUTPUT_DIR: &str = "WORKSCRIBE_OUTPUT_DIR";
const ENV_AUTHOR: &str = "WORKSCRIBE_AUTHOR";
const ENV_VCS: &str = "WORKSCRIBE_VCS";
const ENV_LANGUAGE: &str = "WORKSCRIBE_LANGUAGE";

/// Report and prompt language.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Language {
    #[default]
    Chinese,
    English,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Chinese => "zh-CN",
            Language::English => "en",
        }
    }

    /// Language name used inside English prompt instructions.
    pub fn english_name(&self) -> &'static str {
        match self {
            Language::Chinese => "Simplified Chinese",
            Language::English => "English",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "zh-cn" | "zh" | "zh_cn" => Ok(Language::Chinese),
            "en" | "en-us" | "english" => Ok(Language::English),
            _ => Err(ConfigError::UnsupportedLanguage(s.to_string())),
        }
    }
}

/// Effective configuration for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub ai_provider: AiProvider,
    pub api_key: String,
    /// `None` selects the provider's default model.
    pub model: Option<String>,
    pub output_directory: PathBuf,
    /// Empty means no author filtering.
    pub author_filter: String,
    pub vcs: VcsSelector,
    pub language: Language,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ai_provider: AiProvider::DeepSeek,
            api_key: String::new(),
            model: None,
            output_directory: PathBuf::from(DEFAULT_OUTPUT_DIR),
            author_filter: String::new(),
            vcs: VcsSelector::Auto,
            language: Language::Chinese,
        }
    }
}

/// Shape of the TOML config file. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileSettings {
    ai_provider: Option<String>,
    api_key: Option<String>,
    model: Option<String>,
    output_directory: Option<PathBuf>,
    author_filter: Option<String>,
    vcs_type: Option<String>,
    language: Option<String>,
}

/// Values supplied on the command line; `None` leaves the setting untouched.
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub ai_provider: Option<String>,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub output_directory: Option<PathBuf>,
    pub author_filter: Option<String>,
    pub vcs: Option<String>,
    pub language: Option<String>,
}

impl Settings {
    /// Load defaults, then the config file, then environment variables.
    ///
    /// `config_path` wins over `<workspace>/.workscribe.toml`. An explicit
    /// path that does not exist is an error; a missing default file is not.
    pub fn load(workspace: &Path, config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut settings = Settings::default();

        let file = match config_path {
            Some(path) => Some(read_file_settings(path)?),
            None => {
                let default_path = workspace.join(DEFAULT_CONFIG_FILE);
                if default_path.is_file() {
                    Some(read_file_settings(&default_path)?)
                } else {
                    None
                }
            }
        };

        if let Some(file) = file {
            settings.apply_file(file)?;
        }
        settings.apply_env()?;

        Ok(settings)
    }

    fn apply_file(&mut self, file: FileSettings) -> Result<(), ConfigError> {
        self.apply(SettingsOverrides {
            ai_provider: file.ai_provider,
            api_key: file.api_key,
            model: file.model,
            output_directory: file.output_directory,
            author_filter: file.author_filter,
            vcs: file.vcs_type,
            language: file.language,
        })
    }

    fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply(SettingsOverrides {
            ai_provider: env_value(ENV_AI_PROVIDER),
            api_key: env_value(ENV_API_KEY),
            model: env_value(ENV_MODEL),
            output_directory: env_value(ENV_OUTPUT_DIR).map(PathBuf::from),
            author_filter: env_value(ENV_AUTHOR),
            vcs: env_value(ENV_VCS),
            language: env_value(ENV_LANGUAGE),
        })
    }

    /// Apply a layer of overrides. Selector strings are validated here.
    pub fn apply(&mut self, overrides: SettingsOverrides) -> Result<(), ConfigError> {
        if let Some(provider) = overrides.ai_provider {
            self.ai_provider = provider
                .parse()
                .map_err(|_| ConfigError::UnsupportedAiProvider(provider))?;
        }
        if let Some(key) = overrides.api_key {
            self.api_key = key;
        }
        if let Some(model) = overrides.model {
            self.model = Some(model).filter(|m| !m.trim().is_empty());
        }
        if let Some(dir) = overrides.output_directory {
            self.output_directory = dir;
        }
        if let Some(author) = overrides.author_filter {
            self.author_filter = author;
        }
        if let Some(vcs) = overrides.vcs {
            self.vcs = vcs
                .parse()
                .map_err(|_| ConfigError::UnsupportedVcsType(vcs))?;
        }
        if let Some(language) = overrides.language {
            self.language = language.parse()?;
        }
        Ok(())
    }

    /// Whether an AI backend can be called.
    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    /// Configured model, or the provider's default.
    pub fn effective_model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.ai_provider.default_model())
    }

    /// Output directory, resolved against `workspace` when relative.
    pub fn resolve_output_dir(&self, workspace: &Path) -> PathBuf {
        if self.output_directory.is_absolute() {
            self.output_directory.clone()
        } else {
            workspace.join(&self.output_directory)
        }
    }
}

fn read_file_settings(path: &Path) -> Result<FileSettings, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
        path: path.display().to_string(),
        source,
    })?;
    debug!("Loaded config file {}", path.display());
    toml::from_str(&contents).map_err(|source| ConfigError::ParseFailed {
        path: path.display().to_string(),
        source,
    })
}

/// Non-empty environment value.
fn env_value(name: &str) -> Option<String> {
    match env::var(name) {
        Ok(v) if !v.trim().is_empty() => Some(v),
        Ok(_) => None,
        Err(env::VarError::NotPresent) => None,
        Err(env::VarError::NotUnicode(_)) => {
            warn!("Ignoring {}: value is not valid UTF-8", name);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vcs::VcsKind;
    use serial_test::serial;

    const ALL_VARS: [&str; 7] = [
        ENV_AI_PROVIDER,
        ENV_API_KEY,
        ENV_MODEL,
        ENV_OUTPUT_DIR,
        ENV_AUTHOR,
        ENV_VCS,
        ENV_LANGUAGE,
    ];

    fn without_env<F: FnOnce()>(f: F) {
        temp_env::with_vars_unset(ALL_VARS, f);
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.ai_provider, AiProvider::DeepSeek);
        assert!(!settings.has_api_key());
        assert_eq!(settings.output_directory, PathBuf::from("./reports"));
        assert_eq!(settings.vcs, VcsSelector::Auto);
        assert_eq!(settings.language, Language::Chinese);
        assert_eq!(settings.effective_model(), "deepseek-chat");
    }

    #[test]
    #[serial]
    fn test_load_without_file_or_env_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        without_env(|| {
            let settings = Settings::load(dir.path(), None).unwrap();
            assert_eq!(settings, Settings::default());
        });
    }

    #[test]
    #[serial]
    fn test_load_reads_workspace_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(DEFAULT_CONFIG_FILE),
            r#"
ai_provider = "anthropic"
api_key = "sk-file"
vcs_type = "svn"
language = "en"
author_filter = "alice"
"#,
        )
        .unwrap();

        without_env(|| {
            let settings = Settings::load(dir.path(), None).unwrap();
            assert_eq!(settings.ai_provider, AiProvider::Anthropic);
            assert_eq!(settings.api_key, "sk-file");
            assert_eq!(settings.vcs, VcsSelector::Fixed(VcsKind::Svn));
            assert_eq!(settings.language, Language::English);
            assert_eq!(settings.author_filter, "alice");
            assert_eq!(settings.effective_model(), "claude-3-haiku-20240307");
        });
    }

    #[test]
    #[serial]
    fn test_env_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(DEFAULT_CONFIG_FILE),
            "api_key = \"sk-file\"\nmodel = \"file-model\"\n",
        )
        .unwrap();

        without_env(|| {
            temp_env::with_vars(
                [(ENV_API_KEY, Some("sk-env")), (ENV_MODEL, Some(""))],
                || {
                    let settings = Settings::load(dir.path(), None).unwrap();
                    assert_eq!(settings.api_key, "sk-env");
                    // Empty env values are ignored
                    assert_eq!(settings.model.as_deref(), Some("file-model"));
                },
            );
        });
    }

    #[test]
    #[serial]
    fn test_unsupported_provider_in_env_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        without_env(|| {
            temp_env::with_var(ENV_AI_PROVIDER, Some("gemini"), || {
                let result = Settings::load(dir.path(), None);
                assert!(matches!(
                    result,
                    Err(ConfigError::UnsupportedAiProvider(p)) if p == "gemini"
                ));
            });
        });
    }

    #[test]
    #[serial]
    fn test_explicit_missing_config_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        without_env(|| {
            let result = Settings::load(dir.path(), Some(&missing));
            assert!(matches!(result, Err(ConfigError::ReadFailed { .. })));
        });
    }

    #[test]
    #[serial]
    fn test_malformed_config_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(DEFAULT_CONFIG_FILE), "api_key = [").unwrap();
        without_env(|| {
            let result = Settings::load(dir.path(), None);
            assert!(matches!(result, Err(ConfigError::ParseFailed { .. })));
        });
    }

    #[test]
    fn test_overrides_validate_vcs_type() {
        let mut settings = Settings::default();
        let result = settings.apply(SettingsOverrides {
            vcs: Some("cvs".to_string()),
            ..Default::default()
        });
        assert!(matches!(result, Err(ConfigError::UnsupportedVcsType(v)) if v == "cvs"));
    }

    #[test]
    fn test_resolve_output_dir() {
        let settings = Settings::default();
        assert_eq!(
            settings.resolve_output_dir(Path::new("/work")),
            PathBuf::from("/work/./reports")
        );

        let absolute = Settings {
            output_directory: PathBuf::from("/tmp/out"),
            ..Settings::default()
        };
        assert_eq!(
            absolute.resolve_output_dir(Path::new("/work")),
            PathBuf::from("/tmp/out")
        );
    }

    #[test]
    fn test_language_parsing() {
        assert_eq!("zh-CN".parse::<Language>().unwrap(), Language::Chinese);
        assert_eq!("EN".parse::<Language>().unwrap(), Language::English);
        assert!(matches!(
            "fr".parse::<Language>(),
            Err(ConfigError::UnsupportedLanguage(_))
        ));
    }
}
