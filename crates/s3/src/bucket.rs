//! Native bucket primitives
//!
//! [`Bucket`] is the narrow set of key-level calls the flat store
//! emulation needs. [`S3Bucket`] implements it over aws-sdk-s3; tests
//! substitute an in-memory bucket or a mock.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{AccessControlPolicy, ObjectCannedAcl};
use bv_core::object::ObjectHead;
use bv_core::path::SEP;
use jiff::Timestamp;

use crate::error::{NativeError, NativeResult};

/// One native key, as seen by a listing or a head request
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct KeyHead {
    pub key: String,
    pub size: u64,
    pub content_type: Option<String>,
    pub content_encoding: Option<String>,
    pub last_modified: Option<Timestamp>,
    pub metadata: HashMap<String, String>,
    /// Key ends with the separator (a directory placeholder)
    pub is_placeholder: bool,
}

impl KeyHead {
    pub(crate) fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            is_placeholder: key.ends_with(SEP),
            key,
            ..Default::default()
        }
    }

    pub(crate) fn into_object_head(self) -> ObjectHead {
        ObjectHead {
            size: self.size,
            content_type: self.content_type,
            content_encoding: self.content_encoding,
            last_modified: self.last_modified,
            metadata: self.metadata,
        }
    }
}

/// Parameters of one listing call
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct ListRequest {
    pub prefix: String,
    /// Group keys sharing a prefix up to this character into common prefixes
    pub delimiter: Option<char>,
    /// Only return names strictly after this one
    pub start_after: Option<String>,
    pub continuation_token: Option<String>,
    pub max_keys: usize,
}

/// One listing page
#[derive(Debug, Clone, Default)]
pub(crate) struct ListPage {
    pub keys: Vec<KeyHead>,
    pub prefixes: Vec<String>,
    /// Token for the next page, `None` once the listing is exhausted
    pub next_token: Option<String>,
}

/// Listing result entry: a key or a delimiter-grouped common prefix
#[derive(Debug, Clone)]
pub(crate) enum ListEntry {
    Key(KeyHead),
    Prefix(String),
}

impl ListEntry {
    pub(crate) fn name(&self) -> &str {
        match self {
            Self::Key(head) => &head.key,
            Self::Prefix(prefix) => prefix,
        }
    }
}

impl ListPage {
    /// Keys and common prefixes merged in name order
    pub(crate) fn into_entries(self) -> Vec<ListEntry> {
        let mut entries: Vec<ListEntry> = self
            .keys
            .into_iter()
            .map(ListEntry::Key)
            .chain(self.prefixes.into_iter().map(ListEntry::Prefix))
            .collect();
        entries.sort_by(|a, b| a.name().cmp(b.name()));
        entries
    }
}

/// Key-level operations on one bucket
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub(crate) trait Bucket: Send + Sync {
    /// List one page of keys
    async fn list_page(&self, request: ListRequest) -> NativeResult<ListPage>;

    /// Head a key, `None` if it does not exist
    async fn head(&self, key: &str) -> NativeResult<Option<KeyHead>>;

    /// Read a key's body
    async fn get(&self, key: &str) -> NativeResult<Vec<u8>>;

    /// Write a key
    async fn put(
        &self,
        key: &str,
        body: Vec<u8>,
        metadata: HashMap<String, String>,
        acl: Option<String>,
    ) -> NativeResult<KeyHead>;

    /// Server-side copy, optionally carrying the source ACL over to the copy
    async fn copy(&self, src: &str, dst: &str, preserve_acl: bool) -> NativeResult<KeyHead>;

    /// Delete a key
    async fn delete(&self, key: &str) -> NativeResult<()>;
}

/// A bucket reached through aws-sdk-s3
pub(crate) struct S3Bucket {
    client: aws_sdk_s3::Client,
    name: String,
}

impl S3Bucket {
    /// Resolve a bucket, failing if it does not exist or is not reachable
    pub(crate) async fn open(client: aws_sdk_s3::Client, name: &str) -> NativeResult<Self> {
        client.head_bucket().bucket(name).send().await?;
        tracing::debug!(bucket = name, "Opened bucket");
        Ok(Self {
            client,
            name: name.to_string(),
        })
    }

    fn copy_source(&self, key: &str) -> String {
        let encoded: Vec<String> = key
            .split(SEP)
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect();
        format!("{}/{}", self.name, encoded.join("/"))
    }
}

fn timestamp(dt: &aws_smithy_types::DateTime) -> Option<Timestamp> {
    Timestamp::from_second(dt.secs()).ok()
}

#[async_trait]
impl Bucket for S3Bucket {
    async fn list_page(&self, request: ListRequest) -> NativeResult<ListPage> {
        let max_keys = i32::try_from(request.max_keys).unwrap_or(i32::MAX);
        let response = self
            .client
            .list_objects_v2()
            .bucket(&self.name)
            .prefix(&request.prefix)
            .set_delimiter(request.delimiter.map(String::from))
            .set_start_after(request.start_after)
            .set_continuation_token(request.continuation_token)
            .max_keys(max_keys)
            .send()
            .await?;

        let keys = response
            .contents()
            .iter()
            .map(|object| {
                let mut head = KeyHead::new(object.key().unwrap_or_default());
                head.size = object.size().unwrap_or(0).max(0) as u64;
                head.last_modified = object.last_modified().and_then(timestamp);
                head
            })
            .collect();

        let prefixes = response
            .common_prefixes()
            .iter()
            .filter_map(|p| p.prefix().map(str::to_string))
            .collect();

        let next_token = if response.is_truncated().unwrap_or(false) {
            response.next_continuation_token().map(str::to_string)
        } else {
            None
        };

        Ok(ListPage {
            keys,
            prefixes,
            next_token,
        })
    }

    async fn head(&self, key: &str) -> NativeResult<Option<KeyHead>> {
        let response = match self
            .client
            .head_object()
            .bucket(&self.name)
            .key(key)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                let err = NativeError::from(e);
                if err.is_not_found() {
                    return Ok(None);
                }
                return Err(err);
            }
        };

        let mut head = KeyHead::new(key);
        head.size = response.content_length().unwrap_or(0).max(0) as u64;
        head.content_type = response.content_type().map(str::to_string);
        head.content_encoding = response.content_encoding().map(str::to_string);
        head.last_modified = response.last_modified().and_then(timestamp);
        head.metadata = response.metadata().cloned().unwrap_or_default();
        Ok(Some(head))
    }

    async fn get(&self, key: &str) -> NativeResult<Vec<u8>> {
        let response = self
            .client
            .get_object()
            .bucket(&self.name)
            .key(key)
            .send()
            .await?;

        let data = response
            .body
            .collect()
            .await
            .map_err(|e| NativeError::Transport(e.to_string()))?
            .into_bytes()
            .to_vec();
        Ok(data)
    }

    async fn put(
        &self,
        key: &str,
        body: Vec<u8>,
        metadata: HashMap<String, String>,
        acl: Option<String>,
    ) -> NativeResult<KeyHead> {
        let size = body.len() as u64;
        self.client
            .put_object()
            .bucket(&self.name)
            .key(key)
            .body(ByteStream::from(body))
            .set_metadata(Some(metadata.clone()))
            .set_acl(acl.as_deref().map(ObjectCannedAcl::from))
            .send()
            .await?;

        let mut head = KeyHead::new(key);
        head.size = size;
        head.last_modified = Some(Timestamp::now());
        head.metadata = metadata;
        Ok(head)
    }

    async fn copy(&self, src: &str, dst: &str, preserve_acl: bool) -> NativeResult<KeyHead> {
        let grants = if preserve_acl {
            let acl = self
                .client
                .get_object_acl()
                .bucket(&self.name)
                .key(src)
                .send()
                .await?;
            Some(
                AccessControlPolicy::builder()
                    .set_grants(Some(acl.grants().to_vec()))
                    .set_owner(acl.owner().cloned())
                    .build(),
            )
        } else {
            None
        };

        self.client
            .copy_object()
            .bucket(&self.name)
            .key(dst)
            .copy_source(self.copy_source(src))
            .send()
            .await?;

        if let Some(policy) = grants {
            self.client
                .put_object_acl()
                .bucket(&self.name)
                .key(dst)
                .access_control_policy(policy)
                .send()
                .await?;
        }

        self.head(dst)
            .await?
            .ok_or_else(|| NativeError::not_found(dst))
    }

    async fn delete(&self, key: &str) -> NativeResult<()> {
        self.client
            .delete_object()
            .bucket(&self.name)
            .key(key)
            .send()
            .await?;
        Ok(())
    }
}
