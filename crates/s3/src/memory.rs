//! In-memory bucket with S3 listing semantics, for tests

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use jiff::Timestamp;

use crate::bucket::{Bucket, KeyHead, ListEntry, ListPage, ListRequest};
use crate::error::{NativeError, NativeResult};

struct StoredKey {
    head: KeyHead,
    body: Vec<u8>,
    acl: Option<String>,
}

#[derive(Default)]
pub(crate) struct MemoryBucket {
    keys: Mutex<BTreeMap<String, StoredKey>>,
    copy_failures: Mutex<HashMap<String, u16>>,
}

impl MemoryBucket {
    pub(crate) fn with_keys(keys: &[&str]) -> Self {
        let bucket = Self::default();
        for key in keys {
            bucket.insert(key, key.as_bytes().to_vec(), &[]);
        }
        bucket
    }

    pub(crate) fn insert(&self, key: &str, body: Vec<u8>, metadata: &[(&str, &str)]) {
        let mut head = KeyHead::new(key);
        head.size = body.len() as u64;
        head.last_modified = Some(Timestamp::now());
        head.metadata = metadata
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.keys.lock().unwrap().insert(
            key.to_string(),
            StoredKey {
                head,
                body,
                acl: None,
            },
        );
    }

    pub(crate) fn keys(&self) -> Vec<String> {
        self.keys.lock().unwrap().keys().cloned().collect()
    }

    pub(crate) fn acl(&self, key: &str) -> Option<String> {
        self.keys
            .lock()
            .unwrap()
            .get(key)
            .and_then(|stored| stored.acl.clone())
    }

    pub(crate) fn set_acl(&self, key: &str, acl: &str) {
        if let Some(stored) = self.keys.lock().unwrap().get_mut(key) {
            stored.acl = Some(acl.to_string());
        }
    }

    /// Make copies from `src` fail with `status`
    pub(crate) fn fail_copy(&self, src: &str, status: u16) {
        self.copy_failures
            .lock()
            .unwrap()
            .insert(src.to_string(), status);
    }
}

#[async_trait]
impl Bucket for MemoryBucket {
    async fn list_page(&self, request: ListRequest) -> NativeResult<ListPage> {
        let keys = self.keys.lock().unwrap();
        let mut entries = Vec::new();
        let mut seen = BTreeSet::new();

        for (key, stored) in keys.iter() {
            if !key.starts_with(&request.prefix) {
                continue;
            }
            if request.start_after.as_ref().is_some_and(|after| key <= after) {
                continue;
            }
            if let Some(delimiter) = request.delimiter {
                let rest = &key[request.prefix.len()..];
                if let Some(pos) = rest.find(delimiter) {
                    let prefix = format!("{}{}", request.prefix, &rest[..=pos]);
                    if seen.insert(prefix.clone()) {
                        entries.push(ListEntry::Prefix(prefix));
                    }
                    continue;
                }
            }
            entries.push(ListEntry::Key(stored.head.clone()));
        }
        entries.sort_by(|a, b| a.name().cmp(b.name()));

        if let Some(token) = &request.continuation_token {
            entries.retain(|e| e.name() > token.as_str());
        }
        let truncated = entries.len() > request.max_keys;
        entries.truncate(request.max_keys);

        let next_token = if truncated {
            entries.last().map(|e| e.name().to_string())
        } else {
            None
        };
        let mut page = ListPage {
            next_token,
            ..Default::default()
        };
        for entry in entries {
            match entry {
                ListEntry::Key(head) => page.keys.push(head),
                ListEntry::Prefix(prefix) => page.prefixes.push(prefix),
            }
        }
        Ok(page)
    }

    async fn head(&self, key: &str) -> NativeResult<Option<KeyHead>> {
        Ok(self
            .keys
            .lock()
            .unwrap()
            .get(key)
            .map(|stored| stored.head.clone()))
    }

    async fn get(&self, key: &str) -> NativeResult<Vec<u8>> {
        self.keys
            .lock()
            .unwrap()
            .get(key)
            .map(|stored| stored.body.clone())
            .ok_or_else(|| NativeError::not_found(key))
    }

    async fn put(
        &self,
        key: &str,
        body: Vec<u8>,
        metadata: HashMap<String, String>,
        acl: Option<String>,
    ) -> NativeResult<KeyHead> {
        let mut head = KeyHead::new(key);
        head.size = body.len() as u64;
        head.last_modified = Some(Timestamp::now());
        head.metadata = metadata;
        self.keys.lock().unwrap().insert(
            key.to_string(),
            StoredKey {
                head: head.clone(),
                body,
                acl,
            },
        );
        Ok(head)
    }

    async fn copy(&self, src: &str, dst: &str, preserve_acl: bool) -> NativeResult<KeyHead> {
        if let Some(status) = self.copy_failures.lock().unwrap().get(src) {
            return Err(NativeError::Server {
                status: *status,
                code: None,
                message: format!("copy of {src} failed"),
            });
        }

        let mut keys = self.keys.lock().unwrap();
        let source = keys.get(src).ok_or_else(|| NativeError::not_found(src))?;
        let mut head = source.head.clone();
        head.key = dst.to_string();
        head.is_placeholder = KeyHead::new(dst).is_placeholder;
        let copy = StoredKey {
            head: head.clone(),
            body: source.body.clone(),
            acl: if preserve_acl { source.acl.clone() } else { None },
        };
        keys.insert(dst.to_string(), copy);
        Ok(head)
    }

    async fn delete(&self, key: &str) -> NativeResult<()> {
        self.keys.lock().unwrap().remove(key);
        Ok(())
    }
}
