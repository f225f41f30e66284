//! Rendering of cluster objects as JSON or YAML text.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// Output encoding selectable per tool call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    Json,
    #[default]
    Yaml,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Yaml => write!(f, "yaml"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "yaml" | "yml" => Ok(OutputFormat::Yaml),
            other => Err(format!("Unknown output format: '{other}'. Expected json or yaml")),
        }
    }
}

impl OutputFormat {
    /// Resolves an optional tool argument, defaulting to YAML.
    pub fn from_arg(arg: Option<&str>) -> Result<Self, String> {
        match arg {
            None => Ok(Self::default()),
            Some(s) if s.trim().is_empty() => Ok(Self::default()),
            Some(s) => s.parse(),
        }
    }

    /// Serializes `value` in this format.
    pub fn render<T: Serialize + ?Sized>(self, value: &T) -> anyhow::Result<String> {
        match self {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(value)?),
            OutputFormat::Yaml => Ok(serde_yaml::to_string(value)?),
        }
    }
}
