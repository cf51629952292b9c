//! Filesystem connection

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use bv_core::{Connection, Container, ContainerPolicy, Error, Result};

use crate::container::FsContainer;
use crate::error::IoResultExt;
use crate::is_hidden;

/// A root directory whose subdirectories are containers
pub struct FsConnection {
    root: PathBuf,
    policy: ContainerPolicy,
}

impl FsConnection {
    /// Create a connection; the root is made absolute but not checked
    pub fn new(root: impl Into<PathBuf>, policy: ContainerPolicy) -> Self {
        let root = root.into();
        let root = std::path::absolute(&root).unwrap_or(root);
        Self { root, policy }
    }

    /// Absolute root directory
    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl Connection for FsConnection {
    fn policy(&self) -> &ContainerPolicy {
        &self.policy
    }

    fn max_list(&self) -> Option<usize> {
        None
    }

    async fn list_containers(&self) -> Result<Vec<Arc<dyn Container>>> {
        let root = self.root.display().to_string();
        let mut entries = tokio::fs::read_dir(&self.root)
            .await
            .for_container(&root)?;

        let mut containers: Vec<Arc<FsContainer>> = Vec::new();
        while let Some(entry) = entries.next_entry().await.for_container(&root)? {
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if is_hidden(&name) {
                continue;
            }
            if entry.file_type().await.for_container(&name)?.is_dir() {
                containers.push(FsContainer::new(&name, entry.path()));
            }
        }

        containers.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(containers
            .into_iter()
            .map(|c| c as Arc<dyn Container>)
            .collect())
    }

    async fn open_container(&self, name: &str) -> Result<Arc<dyn Container>> {
        if name == "." || name == ".." {
            return Err(Error::InvalidName(format!(
                "\"{name}\" is not a container name"
            )));
        }
        if is_hidden(name) {
            return Err(Error::NoContainer(format!("{name} does not exist")));
        }

        let base = self.root.join(name);
        let metadata = tokio::fs::metadata(&base).await.for_container(name)?;
        if !metadata.is_dir() {
            return Err(Error::NoContainer(format!("{name} is not a directory")));
        }
        tracing::debug!(container = name, path = %base.display(), "Opened directory container");
        Ok(FsContainer::new(name, base) as Arc<dyn Container>)
    }
}
