//! Serde helpers shared by the application config structs.

use std::path::PathBuf;

use serde::{Deserialize, Deserializer};

/// Deserializes an optional path, treating an empty string as "not set".
pub fn opt_path_from_toml<'de, D>(deserializer: D) -> Result<Option<PathBuf>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .map(PathBuf::from))
}
