use crate::error::{AppError, Result};
use crate::exclusion::{ExclusionMatcher, default_ignored_folders};
use crate::extensions::ExtensionSet;
use crate::merge::{CopyrightStripper, DEFAULT_COPYRIGHT_HOLDER, DEFAULT_SEPARATOR, MergeEngine};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_DIR: &str = ".filemerge";
pub const DEFAULT_CONFIG_FILENAME: &str = "filemerge.toml";
pub const ROOT_ENV_VAR: &str = "FILEMERGE_ROOT";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub filters: FiltersConfig,
    #[serde(default)]
    pub merge: MergeConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct GeneralConfig {
    /// Folder opened when no root is given on the command line.
    #[serde(default)]
    pub root: Option<PathBuf>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FiltersConfig {
    #[serde(default)]
    pub extensions: ExtensionSet,
    #[serde(default = "default_ignored_folders")]
    pub ignored_folders: Vec<String>,
    #[serde(default = "default_false")]
    pub hide_empty_directories: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct MergeConfig {
    #[serde(default = "default_true")]
    pub strip_copyright: bool,
    #[serde(default = "default_copyright_holder")]
    pub copyright_holder: String,
    #[serde(default = "default_separator")]
    pub separator: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    #[serde(default)]
    pub target: OutputTarget,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum OutputTarget {
    #[default]
    Clipboard,
    Stdout,
}

fn default_true() -> bool {
    true
}
fn default_false() -> bool {
    false
}
fn default_copyright_holder() -> String {
    DEFAULT_COPYRIGHT_HOLDER.to_string()
}
fn default_separator() -> String {
    DEFAULT_SEPARATOR.to_string()
}

impl Default for FiltersConfig {
    fn default() -> Self {
        Self {
            extensions: ExtensionSet::default(),
            ignored_folders: default_ignored_folders(),
            hide_empty_directories: default_false(),
        }
    }
}
impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            strip_copyright: default_true(),
            copyright_holder: default_copyright_holder(),
            separator: default_separator(),
        }
    }
}

impl Config {
    /// Root resolution order: explicit path, `FILEMERGE_ROOT`, `general.root`, current directory.
    pub fn determine_root(&self, cli_root: Option<&PathBuf>) -> Result<PathBuf> {
        let path_str_opt = cli_root
            .map(|p| p.to_string_lossy().to_string())
            .or_else(|| env::var(ROOT_ENV_VAR).ok().filter(|s| !s.is_empty()))
            .or_else(|| {
                self.general
                    .root
                    .as_ref()
                    .map(|p| p.to_string_lossy().to_string())
            });

        let path_to_resolve = match path_str_opt {
            Some(p_str) => PathBuf::from(shellexpand::tilde(&p_str).as_ref()),
            None => env::current_dir().map_err(AppError::Io)?,
        };

        path_to_resolve.canonicalize().map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => AppError::RootNotFound {
                path: path_to_resolve.clone(),
            },
            _ => AppError::RootInaccessible {
                path: path_to_resolve.clone(),
                source: e,
            },
        })
    }

    /// Finds the config file to load, if any. `search_dir` is where the default
    /// `.filemerge/filemerge.toml` is looked up.
    pub fn resolve_config_path(
        search_dir: &Path,
        cli_config_file: Option<&PathBuf>,
        cli_disable_config: bool,
    ) -> Result<Option<PathBuf>> {
        if cli_disable_config {
            log::debug!("Config file loading disabled via CLI flag.");
            return Ok(None);
        }

        match cli_config_file {
            Some(p) => {
                let path = PathBuf::from(shellexpand::tilde(&p.to_string_lossy()).as_ref());
                if !path.exists() {
                    return Err(AppError::Config(format!(
                        "Specified config file not found at path: {}",
                        path.display()
                    )));
                }
                log::debug!("Using specified config file path: {}", path.display());
                Ok(Some(path))
            }
            None => {
                let default_path = search_dir
                    .join(DEFAULT_CONFIG_DIR)
                    .join(DEFAULT_CONFIG_FILENAME);
                if default_path.exists() {
                    log::debug!("Using default config file path: {}", default_path.display());
                    Ok(Some(default_path))
                } else {
                    log::debug!(
                        "No config file specified and default not found at: {}",
                        default_path.display()
                    );
                    Ok(None)
                }
            }
        }
    }

    pub fn load_from_path(config_path: &Path) -> Result<Self> {
        log::info!("Loading configuration from: {}", config_path.display());
        let toml_content = fs::read_to_string(config_path).map_err(|e| AppError::FileRead {
            path: config_path.to_path_buf(),
            source: e,
        })?;
        toml::from_str::<Config>(&toml_content).map_err(|e| {
            AppError::TomlParse(format!(
                "Error parsing config file '{}': {}. Check TOML syntax and structure.",
                config_path.display(),
                e
            ))
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str::<Config>(content)?)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn exclusion_matcher(&self) -> Result<ExclusionMatcher> {
        ExclusionMatcher::new(self.filters.ignored_folders.iter().cloned())
    }

    pub fn merge_engine(&self) -> Result<MergeEngine> {
        let stripper = if self.merge.strip_copyright {
            Some(CopyrightStripper::new(&self.merge.copyright_holder)?)
        } else {
            None
        };
        Ok(MergeEngine::new(stripper, self.merge.separator.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn empty_file_gives_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.filters.extensions.to_string(), ".cs, .json, .ts, .tsx");
        assert!(config.filters.ignored_folders.contains(&"node_modules".to_string()));
        assert_eq!(config.output.target, OutputTarget::Clipboard);
    }

    #[test]
    fn sections_override_defaults() {
        let config = Config::from_toml_str(
            r#"
            [general]
            root = "/src/project"

            [filters]
            extensions = ["RS", "toml"]
            ignored_folders = ["vendor"]
            hide_empty_directories = true

            [merge]
            strip_copyright = false

            [output]
            target = "stdout"
            "#,
        )
        .unwrap();
        assert_eq!(config.general.root, Some(PathBuf::from("/src/project")));
        assert_eq!(config.filters.extensions.as_slice(), &[".rs", ".toml"]);
        assert_eq!(config.filters.ignored_folders, vec!["vendor"]);
        assert!(config.filters.hide_empty_directories);
        assert!(!config.merge.strip_copyright);
        assert_eq!(config.merge.separator, DEFAULT_SEPARATOR);
        assert_eq!(config.output.target, OutputTarget::Stdout);
    }

    #[test]
    fn bad_extension_in_file_is_a_parse_error() {
        assert!(Config::from_toml_str("[filters]\nextensions = [\"*.cs\"]\n").is_err());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(Config::from_toml_str("[general]\nproject = \"x\"\n").is_err());
    }

    #[test]
    fn default_config_round_trips_through_toml() {
        let text = Config::default().to_toml_string().unwrap();
        assert_eq!(Config::from_toml_str(&text).unwrap(), Config::default());
    }

    #[test]
    fn resolves_default_config_location() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(Config::resolve_config_path(tmp.path(), None, false).unwrap(), None);

        let dir = tmp.path().join(DEFAULT_CONFIG_DIR);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(DEFAULT_CONFIG_FILENAME), "").unwrap();
        assert_eq!(
            Config::resolve_config_path(tmp.path(), None, false).unwrap(),
            Some(dir.join(DEFAULT_CONFIG_FILENAME))
        );
        assert_eq!(Config::resolve_config_path(tmp.path(), None, true).unwrap(), None);
    }

    #[test]
    fn explicit_missing_config_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("nope.toml");
        assert!(matches!(
            Config::resolve_config_path(tmp.path(), Some(&missing), false),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn explicit_root_wins_and_is_canonicalized() {
        let tmp = TempDir::new().unwrap();
        let nested = tmp.path().join("a");
        fs::create_dir_all(&nested).unwrap();
        let config = Config::default();
        let given = tmp.path().join("a/../a");
        assert_eq!(
            config.determine_root(Some(&given)).unwrap(),
            nested.canonicalize().unwrap()
        );
    }

    #[test]
    fn explicit_missing_root_is_reported() {
        let tmp = TempDir::new().unwrap();
        let config = Config::default();
        let err = config
            .determine_root(Some(&tmp.path().join("gone")))
            .unwrap_err();
        assert!(matches!(err, AppError::RootNotFound { .. }));
    }
}
