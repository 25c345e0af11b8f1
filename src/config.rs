//! Configuration System
//!
//! Layered configuration for the interpolation coordinator: registered tools, grouping
//! policy and logging. Sources are merged defaults -> global file -> workspace files ->
//! environment (`CONTOUR_GROUPS__SECTION__KEY`).

use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

mod facade;
mod merge;
mod sources;

pub use crate::resolver::GroupingConfig;
pub use facade::ConfigLoader;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupsConfig {
    /// Tools participating in interpolation
    #[serde(default)]
    pub tools: ToolsConfig,

    /// Group resolution policy
    #[serde(default)]
    pub grouping: GroupingConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Tool registration, applied once when the manager is constructed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolsConfig {
    #[serde(default)]
    pub registered: Vec<String>,
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Tool(String, String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Tool(name, msg) => write!(f, "Tool '{}': {}", name, msg),
            ValidationError::Logging(msg) => write!(f, "Logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl ToolsConfig {
    fn validate(&self, errors: &mut Vec<ValidationError>) {
        let mut seen = HashSet::new();
        for name in &self.registered {
            if name.trim().is_empty() {
                errors.push(ValidationError::Tool(
                    name.clone(),
                    "Tool name cannot be empty".to_string(),
                ));
            } else if !seen.insert(name.as_str()) {
                errors.push(ValidationError::Tool(
                    name.clone(),
                    "Tool registered more than once".to_string(),
                ));
            }
        }
    }
}

impl GroupsConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        self.tools.validate(&mut errors);

        if let Err(e) = self.logging.validate() {
            errors.push(ValidationError::Logging(e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
