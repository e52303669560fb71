//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into the transformation pipeline. The core never reads process-wide environment
//! variables itself; binaries read them and hand the raw values to the helpers below.

use crate::constants::{DEFAULT_IDENTIFIER_SYSTEM_BASE, DEFAULT_STORAGE_SIZE_UNIT};
use crate::{CoreError, CoreResult};

/// Core configuration resolved at startup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CoreConfig {
    storage_size_unit: String,
    identifier_system_base: String,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// A trailing `/` on `identifier_system_base` is removed.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidInput`] if either value is empty or contains whitespace.
    pub fn new(storage_size_unit: String, identifier_system_base: String) -> CoreResult<Self> {
        validate_token("storage_size_unit", &storage_size_unit)?;
        validate_token("identifier_system_base", &identifier_system_base)?;

        let identifier_system_base = identifier_system_base.trim_end_matches('/').to_string();
        if identifier_system_base.is_empty() {
            return Err(CoreError::InvalidInput(
                "identifier_system_base cannot be only '/'".into(),
            ));
        }

        Ok(Self {
            storage_size_unit,
            identifier_system_base,
        })
    }

    /// UCUM code reported for the aggregate storage size.
    pub fn storage_size_unit(&self) -> &str {
        &self.storage_size_unit
    }

    pub fn identifier_system_base(&self) -> &str {
        &self.identifier_system_base
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            storage_size_unit: DEFAULT_STORAGE_SIZE_UNIT.to_string(),
            identifier_system_base: DEFAULT_IDENTIFIER_SYSTEM_BASE.to_string(),
        }
    }
}

/// Resolve the storage size unit from an optional raw value.
///
/// If `value` is `None` or empty/whitespace, returns [`DEFAULT_STORAGE_SIZE_UNIT`].
pub fn storage_size_unit_from_env_value(value: Option<String>) -> String {
    non_blank(value).unwrap_or_else(|| DEFAULT_STORAGE_SIZE_UNIT.to_string())
}

/// Resolve the identifier system base from an optional raw value.
///
/// If `value` is `None` or empty/whitespace, returns [`DEFAULT_IDENTIFIER_SYSTEM_BASE`].
pub fn identifier_system_base_from_env_value(value: Option<String>) -> String {
    non_blank(value).unwrap_or_else(|| DEFAULT_IDENTIFIER_SYSTEM_BASE.to_string())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn validate_token(field: &str, value: &str) -> CoreResult<()> {
    if value.trim().is_empty() {
        return Err(CoreError::InvalidInput(format!("{field} cannot be empty")));
    }
    if value.chars().any(char::is_whitespace) {
        return Err(CoreError::InvalidInput(format!(
            "{field} must not contain whitespace"
        )));
    }
    Ok(())
}
