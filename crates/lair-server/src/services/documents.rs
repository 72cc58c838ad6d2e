//! Documents read from disk.

use std::{collections::HashMap, path::PathBuf};

use async_trait::async_trait;

use super::{DocumentSource, ServiceError};

/// Serves a fixed set of named files.
pub struct FileDocuments {
    paths: HashMap<String, PathBuf>,
}

impl FileDocuments {
    /// Documents from a name → path map.
    pub fn new(paths: HashMap<String, PathBuf>) -> Self {
        Self { paths }
    }
}

#[async_trait]
impl DocumentSource for FileDocuments {
    async fn load(&self, name: &str) -> Result<String, ServiceError> {
        let path =
            self.paths.get(name).ok_or_else(|| ServiceError::UnknownDocument(name.to_string()))?;
        tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ServiceError::Io { path: path.clone(), source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn loads_registered_documents_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("about.md");
        std::fs::write(&path, "# About\n").unwrap();

        let docs = FileDocuments::new(HashMap::from([
            ("about".to_string(), path),
            ("cv".to_string(), dir.path().join("missing.md")),
        ]));

        assert_eq!(docs.load("about").await.unwrap(), "# About\n");
        assert!(matches!(docs.load("cv").await, Err(ServiceError::Io { .. })));
        assert!(matches!(docs.load("blog").await, Err(ServiceError::UnknownDocument(_))));
    }
}
