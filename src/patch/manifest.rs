//! `package.json` field updates: version, description, keywords.

use crate::error::{AppError, Result};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bump {
    Major,
    Minor,
    Patch,
}

/// Target version for a manifest update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionChange {
    Set(String),
    Bump(Bump),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestUpdate {
    pub version: VersionChange,
    pub description: Option<String>,
    pub keywords: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestOutcome {
    pub text: String,
    pub previous_version: Option<String>,
    pub new_version: String,
}

/// Next `major.minor.patch` version; lower components reset to zero.
///
/// Pre-release or build suffixes on the input are dropped.
pub fn bump_version(version: &str, bump: Bump) -> Result<String> {
    let core = version
        .split(|c| c == '-' || c == '+')
        .next()
        .unwrap_or_default();
    let parts: Vec<u64> = core
        .split('.')
        .map(|p| p.parse::<u64>())
        .collect::<std::result::Result<_, _>>()
        .map_err(|_| AppError::Manifest(format!("Not a semantic version: {:?}", version)))?;

    let [major, minor, patch] = parts[..] else {
        return Err(AppError::Manifest(format!(
            "Expected major.minor.patch, got {:?}",
            version
        )));
    };

    let overflow =
        || AppError::Manifest(format!("Version component overflows: {:?}", version));
    Ok(match bump {
        Bump::Major => format!("{}.0.0", major.checked_add(1).ok_or_else(overflow)?),
        Bump::Minor => format!("{}.{}.0", major, minor.checked_add(1).ok_or_else(overflow)?),
        Bump::Patch => format!(
            "{}.{}.{}",
            major,
            minor,
            patch.checked_add(1).ok_or_else(overflow)?
        ),
    })
}

/// Apply `update` to manifest JSON text.
///
/// Unrelated keys keep their values and order. Output is two-space
/// indented with a trailing newline.
pub fn update_manifest(text: &str, update: &ManifestUpdate) -> Result<ManifestOutcome> {
    let mut manifest: Value = serde_json::from_str(text)?;
    let object = manifest
        .as_object_mut()
        .ok_or_else(|| AppError::Manifest("Manifest root is not an object".to_string()))?;

    let previous_version = object
        .get("version")
        .and_then(|v| v.as_str())
        .map(str::to_string);

    let new_version = match &update.version {
        VersionChange::Set(version) => version.clone(),
        VersionChange::Bump(bump) => {
            let current = previous_version.as_deref().ok_or_else(|| {
                AppError::Manifest("Cannot bump: manifest has no version".to_string())
            })?;
            bump_version(current, *bump)?
        }
    };

    object.insert("version".to_string(), Value::String(new_version.clone()));
    if let Some(description) = &update.description {
        object.insert("description".to_string(), Value::String(description.clone()));
    }
    if let Some(keywords) = &update.keywords {
        object.insert(
            "keywords".to_string(),
            Value::Array(keywords.iter().cloned().map(Value::String).collect()),
        );
    }

    let mut text = serde_json::to_string_pretty(&manifest)?;
    text.push('\n');

    tracing::info!(
        previous = previous_version.as_deref().unwrap_or("none"),
        new = %new_version,
        "Manifest update prepared"
    );

    Ok(ManifestOutcome {
        text,
        previous_version,
        new_version,
    })
}
