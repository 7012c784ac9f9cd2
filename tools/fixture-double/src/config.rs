use crate::errors::FixtureError;
use crate::logging::DEFAULT_MAX_PAYLOAD_BYTES;
use crate::normalizer::{API_KEY_PLACEHOLDER, PROJECT_ID_PLACEHOLDER};
use crate::runtime::FileSystem;
use crate::types::FixtureMode;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub config_path: Option<PathBuf>,
    pub root: Option<PathBuf>,
    pub record: Option<bool>,
    pub project_id: Option<String>,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FixtureConfig {
    pub fixtures: FixturesConfig,
    pub project: ProjectConfig,
    pub mode: ModeConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FixturesConfig {
    pub root: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProjectConfig {
    pub project_id: String,
    pub api_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModeConfig {
    pub record: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoggingConfig {
    pub path: Option<PathBuf>,
    pub max_payload_bytes: usize,
}

impl FixtureConfig {
    pub fn fixture_mode(&self) -> FixtureMode {
        FixtureMode::from_record_flag(self.mode.record)
    }
}

impl Default for FixtureConfig {
    fn default() -> Self {
        Self {
            fixtures: FixturesConfig {
                root: PathBuf::from("tests/fixtures"),
            },
            project: ProjectConfig {
                project_id: String::new(),
                api_key: String::new(),
            },
            mode: ModeConfig { record: false },
            logging: LoggingConfig {
                path: None,
                max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PartialFixtureConfig {
    fixtures: Option<PartialFixturesConfig>,
    project: Option<PartialProjectConfig>,
    mode: Option<PartialModeConfig>,
    logging: Option<PartialLoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PartialFixturesConfig {
    root: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PartialProjectConfig {
    project_id: Option<String>,
    api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PartialModeConfig {
    record: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PartialLoggingConfig {
    path: Option<PathBuf>,
    max_payload_bytes: Option<usize>,
}

pub fn load_config(
    overrides: &CliOverrides,
    process_cwd: &Path,
    fs: &dyn FileSystem,
) -> Result<FixtureConfig, FixtureError> {
    let mut cfg = FixtureConfig::default();

    if let Some(path) = &overrides.config_path {
        let file_contents = fs.read_to_string(path)?;
        let partial: PartialFixtureConfig = toml::from_str(&file_contents)
            .map_err(|e| FixtureError::ConfigParse(e.to_string()))?;
        merge_partial_config(&mut cfg, partial);
    }

    apply_cli_overrides(&mut cfg, overrides);

    cfg.fixtures.root = absolutize_path(process_cwd, &cfg.fixtures.root);
    if let Some(path) = &cfg.logging.path {
        cfg.logging.path = Some(absolutize_path(process_cwd, path));
    }

    validate_config(&cfg)?;
    Ok(cfg)
}

fn merge_partial_config(cfg: &mut FixtureConfig, partial: PartialFixtureConfig) {
    if let Some(fixtures) = partial.fixtures {
        if let Some(root) = fixtures.root {
            cfg.fixtures.root = root;
        }
    }

    if let Some(project) = partial.project {
        if let Some(value) = project.project_id {
            cfg.project.project_id = value;
        }
        if let Some(value) = project.api_key {
            cfg.project.api_key = value;
        }
    }

    if let Some(mode) = partial.mode {
        if let Some(record) = mode.record {
            cfg.mode.record = record;
        }
    }

    if let Some(logging) = partial.logging {
        if let Some(path) = logging.path {
            cfg.logging.path = Some(path);
        }
        if let Some(value) = logging.max_payload_bytes {
            cfg.logging.max_payload_bytes = value;
        }
    }
}

fn apply_cli_overrides(cfg: &mut FixtureConfig, overrides: &CliOverrides) {
    if let Some(root) = &overrides.root {
        cfg.fixtures.root = root.clone();
    }
    if let Some(record) = overrides.record {
        cfg.mode.record = record;
    }
    if let Some(project_id) = &overrides.project_id {
        cfg.project.project_id = project_id.clone();
    }
    if let Some(api_key) = &overrides.api_key {
        cfg.project.api_key = api_key.clone();
    }
}

fn absolutize_path(base: &Path, value: &Path) -> PathBuf {
    if value.is_absolute() {
        value.to_path_buf()
    } else {
        base.join(value)
    }
}

fn validate_config(cfg: &FixtureConfig) -> Result<(), FixtureError> {
    if cfg.fixtures.root.as_os_str().is_empty() {
        return Err(FixtureError::InvalidConfig(
            "fixtures.root must not be empty".to_string(),
        ));
    }

    for (field, value) in [
        ("project.project_id", &cfg.project.project_id),
        ("project.api_key", &cfg.project.api_key),
    ] {
        if value.contains(PROJECT_ID_PLACEHOLDER) || value.contains(API_KEY_PLACEHOLDER) {
            return Err(FixtureError::InvalidConfig(format!(
                "{field} must not contain a fixture placeholder"
            )));
        }
        if cfg.mode.record && value.trim().is_empty() {
            return Err(FixtureError::InvalidConfig(format!(
                "{field} is required when recording fixtures"
            )));
        }
    }

    if cfg.logging.max_payload_bytes == 0 {
        return Err(FixtureError::InvalidConfig(
            "logging.max_payload_bytes must be greater than zero".to_string(),
        ));
    }

    Ok(())
}
