//! Exported dashboard documents.

use std::path::Path;

use perfdash_core::widget::Widget;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{CliError, CliResult};

/// A dashboard as exported by the persistence layer: a JSON object with a
/// `widgets` array. Every other field is carried through unchanged; inside
/// widgets, nulls in typed optional fields are dropped (see
/// [`perfdash_core::widget`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardDocument {
    #[serde(default)]
    pub widgets: Vec<Widget>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DashboardDocument {
    /// Read and parse a document from disk.
    pub fn load(path: &Path) -> CliResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|source| CliError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let document: Self = serde_json::from_str(&raw).map_err(|source| CliError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), widgets = document.widgets.len(), "Loaded dashboard document");
        Ok(document)
    }
}
