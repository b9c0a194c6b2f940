//! Compiler options.
//!
//! ```toml
//! base-element-type = "Visual"
//! warnings-as-errors = true
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CompilerOptions {
    /// Filter applied to storyboard targets that name no element type.
    pub base_element_type: String,
    /// Refuse trees that carry warnings as well as errors.
    pub warnings_as_errors: bool,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            base_element_type: String::from("UIElement"),
            warnings_as_errors: false,
        }
    }
}

impl CompilerOptions {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let options: CompilerOptions = toml::from_str(content)?;
        if options.base_element_type.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "base-element-type",
            });
        }
        Ok(options)
    }
}
