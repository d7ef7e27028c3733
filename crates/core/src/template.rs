//! Template loading and the structural summary returned by validation.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Structural description of a template, as reported by the validation service.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TemplateSummary {
    /// Template description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Declared parameters
    #[serde(default)]
    pub parameters: Vec<TemplateParameter>,

    /// Capabilities a stack created from the template must acknowledge
    #[serde(default)]
    pub capabilities: Vec<String>,

    /// Why those capabilities are required
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capabilities_reason: Option<String>,

    /// Transforms (macros) the template declares
    #[serde(default)]
    pub declared_transforms: Vec<String>,
}

/// A parameter declared by a template.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TemplateParameter {
    /// Parameter name
    pub key: String,
    /// Default value, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    /// Whether the value is masked
    #[serde(default)]
    pub no_echo: bool,
    /// Parameter description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl fmt::Display for TemplateSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} parameter(s)", self.parameters.len())?;
        if !self.capabilities.is_empty() {
            write!(f, ", requires {}", self.capabilities.join(", "))?;
        }
        if !self.declared_transforms.is_empty() {
            write!(f, ", transforms {}", self.declared_transforms.join(", "))?;
        }
        if let Some(description) = &self.description {
            write!(f, ": {description}")?;
        }
        Ok(())
    }
}

/// Read the template at `path` as text.
///
/// # Errors
///
/// Returns [`Error::TemplateMissing`] if nothing is at `path`,
/// [`Error::TemplateEncoding`] if the bytes are not UTF-8, and an IO error
/// for anything else.
pub async fn read_template(path: &Path) -> Result<String> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Error::TemplateMissing {
                path: path.to_path_buf(),
            });
        }
        Err(e) => return Err(e.into()),
    };

    String::from_utf8(bytes).map_err(|_| Error::TemplateEncoding {
        path: path.to_path_buf(),
    })
}
