//! Configuration loading and root folder resolution
//!
//! Bootstrap configuration comes from a TOML file. Every value can be
//! overridden, in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. OS-dependent compiled default (fallback)
//!
//! A missing TOML file is not an error: a warning is logged and defaults apply.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "GALLERY_ROOT_FOLDER";

/// Environment variables carrying image host credentials
pub const CLOUD_NAME_ENV: &str = "CLOUDINARY_NAME";
pub const API_KEY_ENV: &str = "CLOUDINARY_API_KEY";
pub const API_SECRET_ENV: &str = "CLOUDINARY_API_SECRET";

/// Database file name inside the root folder
pub const DATABASE_FILE_NAME: &str = "gallery.db";

/// Compiled-in defaults used when nothing else is configured
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub root_folder: PathBuf,
    pub bind_address: String,
    pub log_level: String,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        Self {
            root_folder: default_root_folder(),
            bind_address: default_bind_address(),
            log_level: default_log_level(),
        }
    }
}

/// OS-dependent default root folder path
pub fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/gallery (or /var/lib/gallery for system-wide)
        dirs::data_local_dir()
            .map(|d| d.join("gallery"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/gallery"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join("gallery"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/gallery"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join("gallery"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\gallery"))
    } else {
        PathBuf::from("./gallery_data")
    }
}

fn default_bind_address() -> String {
    "127.0.0.1:8000".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_auto_tagging() -> f32 {
    0.6
}

fn default_categorization() -> String {
    "google_tagging".to_string()
}

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    /// Root folder holding the database
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    /// Address the HTTP server binds to
    #[serde(default)]
    pub bind_address: Option<String>,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Image host credentials and upload options
    #[serde(default)]
    pub image_host: ImageHostSettings,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level or filter directive (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Algorithm used to sign upload requests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignatureAlgorithm {
    #[default]
    Sha1,
    Sha256,
}

/// `[image_host]` table as written in the TOML file (every field optional)
#[derive(Debug, Clone, Deserialize)]
pub struct ImageHostSettings {
    #[serde(default)]
    pub cloud_name: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub api_secret: Option<String>,
    #[serde(default)]
    pub signature_algorithm: SignatureAlgorithm,
    /// Minimum confidence for auto-tags (0.0-1.0)
    #[serde(default = "default_auto_tagging")]
    pub auto_tagging: f32,
    /// Categorization add-on used to produce tags
    #[serde(default = "default_categorization")]
    pub categorization: String,
}

impl Default for ImageHostSettings {
    fn default() -> Self {
        Self {
            cloud_name: None,
            api_key: None,
            api_secret: None,
            signature_algorithm: SignatureAlgorithm::default(),
            auto_tagging: default_auto_tagging(),
            categorization: default_categorization(),
        }
    }
}

/// Fully resolved image host configuration
///
/// Constructed once at startup and handed to the upload client.
#[derive(Debug, Clone)]
pub struct ImageHostConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    pub signature_algorithm: SignatureAlgorithm,
    pub auto_tagging: f32,
    pub categorization: String,
}

impl ImageHostConfig {
    /// Resolve credentials from the process environment, then TOML
    pub fn resolve(settings: &ImageHostSettings) -> Result<Self> {
        Self::resolve_with(settings, |name| std::env::var(name).ok())
    }

    /// Resolve credentials using `lookup` in place of the process environment
    pub fn resolve_with<F>(settings: &ImageHostSettings, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let pick = |env_name: &str, toml_value: &Option<String>, field: &str| -> Result<String> {
            let env_value = lookup(env_name).filter(|v| is_valid_value(v));
            let toml_value = toml_value.clone().filter(|v| is_valid_value(v));

            match (env_value, toml_value) {
                (Some(env), Some(_)) => {
                    warn!(
                        "Image host {} set in both {} and TOML config. Using environment.",
                        field, env_name
                    );
                    Ok(env)
                }
                (Some(env), None) => Ok(env),
                (None, Some(toml)) => Ok(toml),
                (None, None) => Err(Error::Config(format!(
                    "Image host {} not configured. Set {} or add `{}` under [image_host] in the TOML config.",
                    field, env_name, field
                ))),
            }
        };

        let config = Self {
            cloud_name: pick(CLOUD_NAME_ENV, &settings.cloud_name, "cloud_name")?,
            api_key: pick(API_KEY_ENV, &settings.api_key, "api_key")?,
            api_secret: pick(API_SECRET_ENV, &settings.api_secret, "api_secret")?,
            signature_algorithm: settings.signature_algorithm,
            auto_tagging: settings.auto_tagging,
            categorization: settings.categorization.clone(),
        };

        if !(0.0..=1.0).contains(&config.auto_tagging) {
            return Err(Error::Config(format!(
                "image_host.auto_tagging must be within 0.0-1.0, got {}",
                config.auto_tagging
            )));
        }

        Ok(config)
    }
}

/// Non-empty, non-whitespace
pub fn is_valid_value(value: &str) -> bool {
    !value.trim().is_empty()
}

impl TomlConfig {
    /// Load and parse a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config file {}: {}", path.display(), e)))?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse TOML {}: {}", path.display(), e)))
    }

    /// Load from `path`, or from the platform config location when `None`
    ///
    /// A missing file yields defaults. A file that exists but does not parse
    /// is still an error.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match default_config_path() {
                Some(p) => p,
                None => {
                    warn!("Could not determine config directory, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        if !path.exists() {
            warn!("Config file not found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let config = Self::load(&path)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }
}

/// Platform config file location: `<config_dir>/gallery/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("gallery").join("config.toml"))
}

/// Resolves the root folder following CLI → ENV → TOML → default
#[derive(Debug, Clone)]
pub struct RootFolderResolver {
    module_name: String,
    cli_arg: Option<PathBuf>,
    toml_value: Option<PathBuf>,
}

impl RootFolderResolver {
    pub fn new(module_name: &str) -> Self {
        Self {
            module_name: module_name.to_string(),
            cli_arg: None,
            toml_value: None,
        }
    }

    pub fn with_cli_arg(mut self, path: Option<PathBuf>) -> Self {
        self.cli_arg = path;
        self
    }

    pub fn with_toml(mut self, config: &TomlConfig) -> Self {
        self.toml_value = config.root_folder.clone();
        self
    }

    pub fn resolve(&self) -> PathBuf {
        if let Some(path) = &self.cli_arg {
            info!("{}: root folder from command line: {}", self.module_name, path.display());
            return path.clone();
        }

        if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
            if is_valid_value(&path) {
                info!("{}: root folder from {}: {}", self.module_name, ROOT_FOLDER_ENV, path);
                return PathBuf::from(path);
            }
        }

        if let Some(path) = &self.toml_value {
            info!("{}: root folder from TOML config: {}", self.module_name, path.display());
            return path.clone();
        }

        let path = default_root_folder();
        info!("{}: root folder (compiled default): {}", self.module_name, path.display());
        path
    }
}

/// Creates the root folder and locates the database inside it
#[derive(Debug, Clone)]
pub struct RootFolderInitializer {
    root_folder: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root_folder: PathBuf) -> Self {
        Self { root_folder }
    }

    /// Create the root folder if missing (idempotent)
    pub fn ensure_directory_exists(&self) -> Result<()> {
        if !self.root_folder.exists() {
            std::fs::create_dir_all(&self.root_folder)?;
            info!("Created root folder: {}", self.root_folder.display());
        }
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(DATABASE_FILE_NAME)
    }

    pub fn database_exists(&self) -> bool {
        self.database_path().exists()
    }
}
