//! Directory emulation over a flat key space
//!
//! Keys are plain strings; a directory is either a zero-byte placeholder
//! key ending in `/` or simply the common prefix of the keys below it.
//! Listings use the `/` delimiter so direct children come back as keys
//! and common prefixes, merged in name order.

use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use bv_core::object::{MODIFIED_BY_KEY, ObjectHead, ObjectType, StorageObject, UNKNOWN_MODIFIER};
use bv_core::path::{self, ROOT, SEP};
use bv_core::upload::DEFAULT_UPLOAD_ACL;
use bv_core::{Container, Error, Result};
use tokio::sync::OnceCell;

use crate::bucket::{Bucket, KeyHead, ListEntry, ListRequest, S3Bucket};
use crate::connection::Session;
use crate::error::{NativeError, NativeResult, NativeResultExt};

/// Largest listing a single request may ask for
pub const MAX_LIST: usize = 10_000;

/// Keys per native listing call
const PAGE_SIZE: usize = 1000;

/// A bucket seen as a directory tree
pub struct S3Container {
    me: Weak<S3Container>,
    session: Arc<Session>,
    name: String,
    native: OnceCell<Arc<dyn Bucket>>,
}

impl S3Container {
    pub(crate) fn new(session: Arc<Session>, name: &str) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            me: me.clone(),
            session,
            name: name.to_string(),
            native: OnceCell::new(),
        })
    }

    #[cfg(test)]
    pub(crate) fn with_bucket(session: Arc<Session>, name: &str, bucket: Arc<dyn Bucket>) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            me: me.clone(),
            session,
            name: name.to_string(),
            native: OnceCell::new_with(Some(bucket)),
        })
    }

    /// Native bucket handle, resolved on first use
    pub(crate) async fn bucket(&self) -> Result<&Arc<dyn Bucket>> {
        self.native
            .get_or_try_init(|| async {
                let client = self.session.client().await.clone();
                let bucket = S3Bucket::open(client, &self.name)
                    .await
                    .for_container(&self.name)?;
                Ok(Arc::new(bucket) as Arc<dyn Bucket>)
            })
            .await
    }

    fn weak(&self) -> Weak<dyn Container> {
        self.me.clone()
    }

    fn subdir(&self, name: &str) -> StorageObject {
        StorageObject::new(self.weak(), &self.name, name, ObjectType::Subdir)
    }

    fn file_from_listing(&self, head: KeyHead) -> StorageObject {
        let mut object = StorageObject::new(self.weak(), &self.name, &head.key, ObjectType::File);
        object.size = head.size;
        object.last_modified = head.last_modified;
        object.is_placeholder = head.is_placeholder;
        object
    }

    fn file_from_head(&self, head: KeyHead) -> StorageObject {
        let name = head.key.clone();
        StorageObject::from_head(self.weak(), &self.name, name, head.into_object_head())
    }

    fn subdir_from_head(&self, head: KeyHead) -> StorageObject {
        let mut object = self.subdir(&head.key);
        object.last_modified = head.last_modified;
        object.modified_by = Some(modifier(&head.metadata));
        object
    }

    fn object_from_entry(&self, entry: ListEntry) -> StorageObject {
        match entry {
            ListEntry::Key(head) => self.file_from_listing(head),
            ListEntry::Prefix(prefix) => self.subdir(&prefix),
        }
    }

    /// Collect up to `want` entries under `prefix`, following continuation tokens
    async fn list_entries(
        bucket: &dyn Bucket,
        prefix: &str,
        delimiter: Option<char>,
        start_after: Option<&str>,
        want: usize,
    ) -> NativeResult<Vec<ListEntry>> {
        let mut entries = Vec::new();
        let mut token = None;
        loop {
            let request = ListRequest {
                prefix: prefix.to_string(),
                delimiter,
                start_after: start_after.map(str::to_string),
                continuation_token: token.take(),
                max_keys: (want - entries.len()).min(PAGE_SIZE),
            };
            let mut page = bucket.list_page(request).await?;
            let next_token = page.next_token.take();
            entries.extend(page.into_entries());
            match next_token {
                Some(next) if entries.len() < want => token = Some(next),
                _ => break,
            }
        }
        entries.truncate(want);
        Ok(entries)
    }

    /// Native start-after key for a listing marker
    ///
    /// A directory lists as `name/`, which sorts after siblings such as
    /// `name.txt`. A bare directory name is widened to its prefix so the
    /// listing resumes past those siblings; a key of that exact name wins.
    async fn resolve_marker(bucket: &dyn Bucket, marker: &str) -> NativeResult<String> {
        if marker.ends_with(SEP) || bucket.head(marker).await?.is_some() {
            return Ok(marker.to_string());
        }
        let dir = format!("{marker}{SEP}");
        let page = bucket
            .list_page(ListRequest {
                prefix: dir.clone(),
                max_keys: 1,
                ..Default::default()
            })
            .await?;
        if page.keys.is_empty() && page.prefixes.is_empty() {
            Ok(marker.to_string())
        } else {
            Ok(dir)
        }
    }

    /// Every key under a directory prefix, placeholder excluded
    ///
    /// Pages are requested by marker starting at the prefix itself; a page
    /// shorter than the page size ends the walk, a full one never does.
    async fn collect_keys(bucket: &dyn Bucket, dir: &str) -> NativeResult<Vec<KeyHead>> {
        let mut keys = Vec::new();
        let mut marker = dir.to_string();
        loop {
            let page = bucket
                .list_page(ListRequest {
                    prefix: dir.to_string(),
                    start_after: Some(marker.clone()),
                    max_keys: PAGE_SIZE,
                    ..Default::default()
                })
                .await?;
            let count = page.keys.len();
            match page.keys.last() {
                Some(last) => marker = last.key.clone(),
                None => break,
            }
            keys.extend(page.keys);
            if count < PAGE_SIZE {
                break;
            }
        }
        Ok(keys)
    }

    /// Copy `src` to `new_parent + new_basename`, then remove the source
    async fn rename_key(
        bucket: &dyn Bucket,
        new_parent: &str,
        src: &str,
        new_basename: &str,
    ) -> NativeResult<KeyHead> {
        let dst = format!("{new_parent}{new_basename}");
        if dst == src {
            return bucket
                .head(src)
                .await?
                .ok_or_else(|| NativeError::not_found(src));
        }

        let copied = bucket.copy(src, &dst, true).await?;
        if bucket.head(src).await?.is_some() {
            bucket.delete(src).await?;
        }
        tracing::debug!(src, dst = %dst, "Renamed key");
        Ok(copied)
    }

    async fn rename_dir(
        &self,
        bucket: &dyn Bucket,
        parent: &str,
        src: &str,
        new_name: &str,
    ) -> Result<StorageObject> {
        let src_dir = path::dir_prefix(src);
        let new_dir = format!("{parent}{new_name}{SEP}");
        if src_dir == new_dir {
            return Ok(self.subdir(&src_dir));
        }

        let keys = Self::collect_keys(bucket, &src_dir)
            .await
            .for_object(&src_dir)?;

        let mut first = None;
        for key in &keys {
            let suffix = &key.key[src_dir.len()..];
            match Self::rename_key(bucket, &new_dir, &key.key, suffix).await {
                Ok(head) => {
                    first.get_or_insert(head);
                }
                Err(e) if e.is_not_found() => {
                    tracing::debug!(key = %key.key, "Key vanished during rename, skipping");
                }
                Err(e) => return Err(e.into_object_error(&key.key)),
            }
        }

        if bucket.head(&src_dir).await.for_object(&src_dir)?.is_some() {
            let placeholder = format!("{new_name}{SEP}");
            let head = Self::rename_key(bucket, parent, &src_dir, &placeholder)
                .await
                .for_object(&src_dir)?;
            return Ok(self.subdir_from_head(head));
        }

        match first {
            Some(child) => {
                let mut object = self.subdir(&new_dir);
                object.last_modified = child.last_modified;
                Ok(object)
            }
            None => Err(Error::NoObject(format!("{src_dir} does not exist"))),
        }
    }
}

fn modifier(metadata: &HashMap<String, String>) -> String {
    metadata
        .get(MODIFIED_BY_KEY)
        .cloned()
        .unwrap_or_else(|| UNKNOWN_MODIFIER.to_string())
}

#[async_trait]
impl Container for S3Container {
    fn name(&self) -> &str {
        &self.name
    }

    fn max_list(&self) -> Option<usize> {
        Some(MAX_LIST)
    }

    async fn get_objects(
        &self,
        path: &str,
        marker: Option<&str>,
        limit: usize,
    ) -> Result<Vec<StorageObject>> {
        let bucket = self.bucket().await?;
        let prefix = path::dir_prefix(path);
        let limit = limit.min(MAX_LIST);
        let marker = match marker {
            Some(marker) => Some(
                Self::resolve_marker(bucket.as_ref(), marker)
                    .await
                    .for_object(marker)?,
            ),
            None => None,
        };
        let marker = marker.as_deref();

        // One extra entry absorbs the marker itself when the store returns it.
        let mut entries =
            Self::list_entries(bucket.as_ref(), &prefix, Some(SEP), marker, limit + 1)
                .await
                .for_object(path)?;

        let collides = match (marker, entries.first()) {
            (Some(marker), Some(first)) => {
                first.name().trim_end_matches(SEP) == marker.trim_end_matches(SEP)
            }
            _ => false,
        };
        if collides {
            entries.remove(0);
        } else {
            entries.truncate(limit);
        }

        Ok(entries
            .into_iter()
            .map(|entry| self.object_from_entry(entry))
            .collect())
    }

    async fn get_object(&self, path: &str) -> Result<StorageObject> {
        let bucket = self.bucket().await?;
        let head = bucket
            .head(path)
            .await
            .for_object(path)?
            .ok_or_else(|| Error::NoObject(format!("{path} does not exist")))?;
        Ok(self.file_from_head(head))
    }

    async fn head_object(&self, path: &str) -> Result<ObjectHead> {
        let bucket = self.bucket().await?;
        bucket
            .head(path)
            .await
            .for_object(path)?
            .map(KeyHead::into_object_head)
            .ok_or_else(|| Error::NoObject(format!("{path} does not exist")))
    }

    async fn read_object(&self, path: &str) -> Result<Vec<u8>> {
        let bucket = self.bucket().await?;
        bucket.get(path).await.for_object(path)
    }

    async fn has_directory(&self, path: &str) -> Result<bool> {
        let bucket = self.bucket().await?;
        let page = bucket
            .list_page(ListRequest {
                prefix: path.to_string(),
                max_keys: 1,
                ..Default::default()
            })
            .await
            .for_object(path)?;
        if page.keys.is_empty() && page.prefixes.is_empty() {
            return Err(Error::NoObject(format!("{path} does not exist")));
        }
        Ok(true)
    }

    async fn get_directories_paths(&self) -> Result<Vec<String>> {
        let bucket = self.bucket().await?;
        let mut dirs = BTreeSet::from([ROOT.to_string()]);
        let mut queue = VecDeque::from([ROOT.to_string()]);

        while let Some(prefix) = queue.pop_front() {
            let entries = Self::list_entries(bucket.as_ref(), &prefix, Some(SEP), None, usize::MAX)
                .await
                .for_object(&prefix)?;
            for entry in entries {
                if let ListEntry::Prefix(dir) = entry
                    && dirs.insert(dir.clone())
                {
                    queue.push_back(dir);
                }
            }
        }
        Ok(dirs.into_iter().collect())
    }

    async fn filter_objects(&self, objects: Vec<StorageObject>) -> Result<Vec<StorageObject>> {
        let bucket = self.bucket().await?;
        let mut filtered = Vec::with_capacity(objects.len());

        for mut object in objects {
            if object.is_placeholder {
                continue;
            }
            if object.is_subdir() {
                let key = path::dir_prefix(&object.name);
                if let Some(head) = bucket.head(&key).await.for_object(&key)? {
                    object.last_modified = head.last_modified;
                    object.modified_by = Some(modifier(&head.metadata));
                }
                filtered.push(object);
            } else {
                // Keys deleted since the listing are dropped.
                if let Some(head) = bucket.head(&object.name).await.for_object(&object.name)? {
                    object.modified_by = Some(modifier(&head.metadata));
                    filtered.push(object);
                }
            }
        }
        Ok(filtered)
    }

    async fn mkdir(&self, path: &str, actor: Option<&str>) -> Result<StorageObject> {
        self.validate_basename(path::basename(path))?;
        let key = path::dir_prefix(path);
        let bucket = self.bucket().await?;

        if let Some(existing) = bucket.head(&key).await.for_object(&key)? {
            return Ok(self.subdir_from_head(existing));
        }

        let mut metadata = HashMap::new();
        if let Some(actor) = actor {
            metadata.insert(MODIFIED_BY_KEY.to_string(), actor.to_string());
        }
        let head = bucket
            .put(&key, Vec::new(), metadata, Some(DEFAULT_UPLOAD_ACL.to_string()))
            .await
            .for_object(&key)?;
        tracing::debug!(container = %self.name, key = %key, "Created directory placeholder");
        Ok(self.subdir_from_head(head))
    }

    async fn delete(&self, path: &str, is_file: bool) -> Result<()> {
        let bucket = self.bucket().await?;

        if is_file {
            if bucket.head(path).await.for_object(path)?.is_none() {
                return Err(Error::NoObject(format!("{path} does not exist")));
            }
            return bucket.delete(path).await.for_object(path);
        }

        let dir = path::dir_prefix(path);
        if dir.is_empty() {
            return Err(Error::InvalidName("Cannot delete the container root".into()));
        }

        let keys = Self::collect_keys(bucket.as_ref(), &dir)
            .await
            .for_object(&dir)?;
        for key in &keys {
            bucket.delete(&key.key).await.for_object(&key.key)?;
        }
        tracing::debug!(container = %self.name, dir = %dir, count = keys.len(), "Deleted directory contents");

        if bucket.head(&dir).await.for_object(&dir)?.is_none() {
            return Err(Error::NoObject(format!("{dir} does not exist")));
        }
        bucket.delete(&dir).await.for_object(&dir)
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
        let parent = path::dir_prefix(parent);
        let bucket = self.bucket().await?;

        if is_file {
            let head = Self::rename_key(bucket.as_ref(), &parent, src, new_name)
                .await
                .for_object(src)?;
            return Ok(self.file_from_head(head));
        }
        self.rename_dir(bucket.as_ref(), &parent, src, new_name).await
    }

    async fn move_file(&self, src: &str, target_dir: &str) -> Result<StorageObject> {
        let bucket = self.bucket().await?;
        let target = path::dir_prefix(target_dir);
        let head = Self::rename_key(bucket.as_ref(), &target, src, path::basename(src))
            .await
            .for_object(src)?;
        Ok(self.file_from_head(head))
    }
}
