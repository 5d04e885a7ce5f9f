//! Loading the element list produced by the discovery step.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::core::annotate::AnnotationTarget;

/// One discovered element. Discovery-only keys (`componentName`, `route`,
/// `label`, ...) are accepted and dropped.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementRecord {
    pub agent_id: String,
    pub file_path: PathBuf,
    pub line: usize,
    pub column: usize,
    #[serde(rename = "type")]
    pub element_type: String,
    #[serde(default)]
    pub source_tag_name: Option<String>,
}

impl ElementRecord {
    pub fn to_target(&self) -> AnnotationTarget {
        AnnotationTarget {
            agent_id: self.agent_id.clone(),
            line: self.line,
            column: self.column,
            element_type: self.element_type.clone(),
            source_tag_name: self.source_tag_name.clone(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ElementsError {
    #[error("failed to read element list {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid element list {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("element {agent_id} has no file path")]
    MissingPath { agent_id: String },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ElementList {
    Bare(Vec<ElementRecord>),
    Wrapped { elements: Vec<ElementRecord> },
}

/// Parse an element list: a JSON array, or an object with an `elements` array.
pub fn parse_elements(text: &str) -> Result<Vec<ElementRecord>, serde_json::Error> {
    Ok(match serde_json::from_str::<ElementList>(text)? {
        ElementList::Bare(v) | ElementList::Wrapped { elements: v } => v,
    })
}

/// Read `path` and resolve every relative `filePath` against `root`.
pub fn load_elements(path: &Path, root: &Path) -> Result<Vec<ElementRecord>, ElementsError> {
    let text = std::fs::read_to_string(path).map_err(|source| ElementsError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mut elements = parse_elements(&text).map_err(|source| ElementsError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    for el in &mut elements {
        if el.file_path.as_os_str().is_empty() {
            return Err(ElementsError::MissingPath {
                agent_id: el.agent_id.clone(),
            });
        }
        if el.file_path.is_relative() {
            el.file_path = root.join(&el.file_path);
        }
    }

    tracing::debug!(count = elements.len(), list = %path.display(), "loaded elements");
    Ok(elements)
}
