use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use masstock_core::{load_catalog_str, CatalogDocument, CatalogError, WorkflowConfig};

/// Read-only view of the workflow configurations known to the service.
pub trait WorkflowCatalog: Send + Sync {
    fn get(&self, workflow_id: &str) -> Option<Arc<WorkflowConfig>>;
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogLoadError {
    #[error("failed to read catalog {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Catalog fixed at startup, typically loaded from a YAML/JSON file.
#[derive(Debug, Default)]
pub struct StaticCatalog {
    workflows: HashMap<String, Arc<WorkflowConfig>>,
}

impl StaticCatalog {
    pub fn new(doc: CatalogDocument) -> Self {
        let workflows = doc
            .workflows
            .into_iter()
            .map(|wf| (wf.id.clone(), Arc::new(wf)))
            .collect();
        Self { workflows }
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogLoadError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| CatalogLoadError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self::new(load_catalog_str(&raw)?))
    }

    pub fn len(&self) -> usize {
        self.workflows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workflows.is_empty()
    }
}

impl WorkflowCatalog for StaticCatalog {
    fn get(&self, workflow_id: &str) -> Option<Arc<WorkflowConfig>> {
        self.workflows.get(workflow_id).cloned()
    }
}
