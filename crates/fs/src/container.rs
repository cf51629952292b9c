//! Directory-backed container
//!
//! Objects map one-to-one onto entries below the container directory, so
//! every operation is a single native call; no listing emulation needed.

use std::collections::{BTreeSet, VecDeque};
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use bv_core::object::{ObjectHead, ObjectType, StorageObject};
use bv_core::path::{self, ROOT, SEP};
use bv_core::{Container, Error, Result};
use jiff::Timestamp;

use crate::error::IoResultExt;
use crate::is_hidden;

/// A directory below the connection root
pub struct FsContainer {
    me: Weak<FsContainer>,
    name: String,
    base: PathBuf,
}

impl FsContainer {
    pub(crate) fn new(name: &str, base: PathBuf) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            me: me.clone(),
            name: name.to_string(),
            base,
        })
    }

    /// Absolute directory of the container
    pub fn base_path(&self) -> &Path {
        &self.base
    }

    /// Resolve a container-relative path, refusing to leave the container
    fn full_path(&self, path: &str) -> Result<PathBuf> {
        let mut full = self.base.clone();
        for segment in path.split(SEP).filter(|s| !s.is_empty() && *s != ".") {
            if segment == ".." {
                return Err(Error::InvalidName(format!(
                    "\"{path}\" may not contain \"..\" segments"
                )));
            }
            full.push(segment);
        }
        Ok(full)
    }

    fn object_from_metadata(&self, path: &str, metadata: &Metadata) -> StorageObject {
        let obj_type = if metadata.is_dir() {
            ObjectType::Subdir
        } else {
            ObjectType::File
        };
        let name = path.trim_matches(SEP);
        let mut object = StorageObject::new(self.me.clone(), &self.name, name, obj_type);
        object.size = metadata.len();
        object.last_modified = modified(metadata);
        object
    }

    async fn object_from_path(&self, path: &str) -> Result<StorageObject> {
        let full = self.full_path(path)?;
        let metadata = tokio::fs::metadata(&full).await.for_object(path)?;
        Ok(self.object_from_metadata(path, &metadata))
    }

    async fn rename_path(&self, src: &str, dst: &str) -> Result<StorageObject> {
        let full_src = self.full_path(src)?;
        let full_dst = self.full_path(dst)?;
        tokio::fs::rename(&full_src, &full_dst)
            .await
            .for_object(src)?;
        tracing::debug!(container = %self.name, src, dst, "Renamed path");
        self.object_from_path(dst).await
    }
}

fn modified(metadata: &Metadata) -> Option<Timestamp> {
    metadata
        .modified()
        .ok()
        .and_then(|time| Timestamp::try_from(time).ok())
}

#[async_trait]
impl Container for FsContainer {
    fn name(&self) -> &str {
        &self.name
    }

    fn max_list(&self) -> Option<usize> {
        None
    }

    async fn get_objects(
        &self,
        path: &str,
        marker: Option<&str>,
        limit: usize,
    ) -> Result<Vec<StorageObject>> {
        let dir = self.full_path(path)?;
        let marker = marker.map(|m| m.trim_matches(SEP));
        let mut entries = tokio::fs::read_dir(&dir).await.for_object(path)?;

        let mut objects = Vec::new();
        while let Some(entry) = entries.next_entry().await.for_object(path)? {
            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                tracing::warn!(container = %self.name, entry = ?entry.path(), "Skipping non UTF-8 entry");
                continue;
            };
            if is_hidden(file_name) {
                continue;
            }
            let name = path::path_join(path, file_name);
            if marker.is_some_and(|m| name.trim_matches(SEP) <= m) {
                continue;
            }
            // Follow symlinks like a plain stat would.
            let metadata = tokio::fs::metadata(entry.path()).await.for_object(&name)?;
            objects.push(self.object_from_metadata(&name, &metadata));
        }

        objects.sort_by(|a, b| a.name.cmp(&b.name));
        objects.truncate(limit);
        Ok(objects)
    }

    async fn get_object(&self, path: &str) -> Result<StorageObject> {
        self.object_from_path(path).await
    }

    async fn head_object(&self, path: &str) -> Result<ObjectHead> {
        let full = self.full_path(path)?;
        let metadata = tokio::fs::metadata(&full).await.for_object(path)?;
        Ok(ObjectHead {
            size: metadata.len(),
            last_modified: modified(&metadata),
            ..Default::default()
        })
    }

    async fn read_object(&self, path: &str) -> Result<Vec<u8>> {
        let full = self.full_path(path)?;
        tokio::fs::read(&full).await.for_object(path)
    }

    async fn has_directory(&self, path: &str) -> Result<bool> {
        let full = self.full_path(path)?;
        let metadata = tokio::fs::metadata(&full).await.for_object(path)?;
        Ok(metadata.is_dir())
    }

    async fn get_directories_paths(&self) -> Result<Vec<String>> {
        let mut dirs = BTreeSet::from([ROOT.to_string()]);
        let mut queue = VecDeque::from([ROOT.to_string()]);

        while let Some(prefix) = queue.pop_front() {
            let dir = self.full_path(&prefix)?;
            let mut entries = tokio::fs::read_dir(&dir).await.for_object(&prefix)?;
            while let Some(entry) = entries.next_entry().await.for_object(&prefix)? {
                let file_name = entry.file_name();
                let Some(file_name) = file_name.to_str() else {
                    continue;
                };
                if is_hidden(file_name) {
                    continue;
                }
                let is_dir = entry
                    .file_type()
                    .await
                    .for_object(&prefix)?
                    .is_dir();
                if is_dir {
                    let child = format!("{prefix}{file_name}{SEP}");
                    if dirs.insert(child.clone()) {
                        queue.push_back(child);
                    }
                }
            }
        }
        Ok(dirs.into_iter().collect())
    }

    async fn filter_objects(&self, objects: Vec<StorageObject>) -> Result<Vec<StorageObject>> {
        Ok(objects)
    }

    async fn mkdir(&self, path: &str, _actor: Option<&str>) -> Result<StorageObject> {
        self.validate_basename(path::basename(path))?;
        let full = self.full_path(path)?;
        if !tokio::fs::try_exists(&full).await.for_object(path)? {
            tokio::fs::create_dir(&full).await.for_object(path)?;
            tracing::debug!(container = %self.name, path, "Created directory");
        }
        self.object_from_path(path).await
    }

    async fn delete(&self, path: &str, is_file: bool) -> Result<()> {
        if path.trim_matches(SEP).is_empty() {
            return Err(Error::InvalidName("Cannot delete the container root".into()));
        }
        let full = self.full_path(path)?;
        if is_file {
            tokio::fs::remove_file(&full).await.for_object(path)
        } else {
            tokio::fs::remove_dir_all(&full).await.for_object(path)
        }
    }

    async fn rename(
        &self,
        parent: &str,
        src: &str,
        new_name: &str,
        is_file: bool,
    ) -> Result<StorageObject> {
        self.validate_basename(new_name)?;
        if src.trim_matches(SEP).is_empty() {
            return Err(Error::InvalidName("Cannot rename the container root".into()));
        }
        let dst = format!("{}{new_name}", path::dir_prefix(parent));

        if !is_file {
            let new_parent = self.full_path(parent)?;
            tokio::fs::create_dir_all(&new_parent)
                .await
                .for_object(parent)?;
        }
        self.rename_path(src, &dst).await
    }

    async fn move_file(&self, src: &str, target_dir: &str) -> Result<StorageObject> {
        let dst = format!("{}{}", path::dir_prefix(target_dir), path::basename(src));
        self.rename_path(src, &dst).await
    }
}
