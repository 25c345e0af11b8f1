//! Config loading entry points.

use super::merge::merge_policy;
use super::sources::{global_file, workspace_file};
use super::GroupsConfig;
use config::{ConfigError, Environment, File};
use std::path::{Path, PathBuf};

/// Loads [`GroupsConfig`] from layered sources.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for a workspace.
    ///
    /// Precedence (highest last): defaults, global file, `config/config.toml`,
    /// `config/{CONTOUR_GROUPS_ENV}.toml`, `CONTOUR_GROUPS__*` environment variables.
    pub fn load(workspace_root: &Path) -> Result<GroupsConfig, ConfigError> {
        let builder = merge_policy::builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = workspace_file::add_to_builder(builder, workspace_root)?;
        builder
            .add_source(Self::environment())
            .build()?
            .try_deserialize()
    }

    /// Load configuration from one explicit file on top of the defaults.
    pub fn load_from_file(path: &Path) -> Result<GroupsConfig, ConfigError> {
        merge_policy::builder_with_defaults()?
            .add_source(File::from(path).required(true))
            .add_source(Self::environment())
            .build()?
            .try_deserialize()
    }

    /// Path of the global config file, if the platform has a config directory.
    pub fn global_config_path() -> Option<PathBuf> {
        global_file::global_config_path()
    }

    fn environment() -> Environment {
        Environment::with_prefix("CONTOUR_GROUPS")
            .prefix_separator("__")
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("tools.registered")
            .try_parsing(true)
    }
}
