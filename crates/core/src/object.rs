//! Storage object model
//!
//! A [`StorageObject`] describes one file or one (possibly emulated)
//! directory inside a container. It only holds a weak reference to its
//! container; the native handle is resolved through the container on first
//! use and cached for the lifetime of the descriptor.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use jiff::Timestamp;
use serde::Serialize;
use tokio::sync::OnceCell;

use crate::error::{Error, Result};
use crate::path::{self, SEP};
use crate::traits::Container;

/// Metadata key carrying the identity of the last modifier
pub const MODIFIED_BY_KEY: &str = "modified-by";

/// Modifier identity reported when a key carries no `modified-by` metadata
pub const UNKNOWN_MODIFIER: &str = "unknown";

/// Kind of a storage object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectType {
    File,
    #[serde(rename = "subdirectory")]
    Subdir,
}

/// Backend-neutral description of a native object, as returned by a head request
#[derive(Debug, Clone, Default, Serialize)]
pub struct ObjectHead {
    /// Size in bytes
    pub size: u64,

    /// Stored content type
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,

    /// Stored content encoding
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_encoding: Option<String>,

    /// Last modified timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<Timestamp>,

    /// User-defined metadata
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,
}

impl ObjectHead {
    /// Identity of the last modifier, if recorded
    pub fn modified_by(&self) -> Option<&str> {
        self.metadata.get(MODIFIED_BY_KEY).map(String::as_str)
    }
}

/// A file or subdirectory inside a container
#[derive(Clone, Serialize)]
pub struct StorageObject {
    #[serde(skip)]
    container: Weak<dyn Container>,

    /// Name of the owning container
    pub container_name: String,

    /// Path relative to the container, never separator-terminated
    pub name: String,

    /// Size in bytes
    pub size: u64,

    /// Stored content type (may be empty)
    pub content_type: String,

    /// Stored content encoding (may be empty)
    pub content_encoding: String,

    /// Last modified timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<Timestamp>,

    /// File or subdirectory
    #[serde(rename = "type")]
    pub obj_type: ObjectType,

    /// Identity of the last modifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_by: Option<String>,

    /// Listing entry that came from a directory placeholder key
    #[serde(skip)]
    pub is_placeholder: bool,

    #[serde(skip)]
    native: OnceCell<ObjectHead>,
}

impl StorageObject {
    /// Create a new descriptor; the name is stripped of trailing separators
    pub fn new(
        container: Weak<dyn Container>,
        container_name: impl Into<String>,
        name: impl AsRef<str>,
        obj_type: ObjectType,
    ) -> Self {
        Self {
            container,
            container_name: container_name.into(),
            name: name.as_ref().trim_end_matches(SEP).to_string(),
            size: 0,
            content_type: String::new(),
            content_encoding: String::new(),
            last_modified: None,
            obj_type,
            modified_by: None,
            is_placeholder: false,
            native: OnceCell::new(),
        }
    }

    /// Create a file descriptor from a native head, caching it as the native handle
    pub fn from_head(
        container: Weak<dyn Container>,
        container_name: impl Into<String>,
        name: impl AsRef<str>,
        head: ObjectHead,
    ) -> Self {
        let mut object = Self::new(container, container_name, name, ObjectType::File);
        object.size = head.size;
        object.content_type = head.content_type.clone().unwrap_or_default();
        object.content_encoding = head.content_encoding.clone().unwrap_or_default();
        object.last_modified = head.last_modified;
        object.modified_by = head.modified_by().map(str::to_string);
        object.native = OnceCell::new_with(Some(head));
        object
    }

    /// Is a subdirectory?
    pub fn is_subdir(&self) -> bool {
        self.obj_type == ObjectType::Subdir
    }

    /// Is a file?
    pub fn is_file(&self) -> bool {
        self.obj_type == ObjectType::File
    }

    /// Full path including the container
    pub fn path(&self) -> String {
        path::path_join(&self.container_name, &self.name)
    }

    /// Base name from the rightmost separator
    pub fn basename(&self) -> &str {
        path::basename(&self.name)
    }

    /// Human-readable size
    pub fn size_human(&self) -> String {
        humansize::format_size(self.size, humansize::BINARY)
    }

    /// Stored content type, or a type guessed from the name when unset
    pub fn smart_content_type(&self) -> Option<String> {
        match self.content_type.as_str() {
            "" | "application/octet-stream" => mime_guess::from_path(&self.name)
                .first_raw()
                .map(str::to_string),
            stored => Some(stored.to_string()),
        }
    }

    /// Stored content encoding, or an encoding guessed from the name's extensions
    ///
    /// Extensions are tried right to left, so `logs.tar.gz` yields `gzip`.
    pub fn smart_content_encoding(&self) -> Option<String> {
        if !self.content_encoding.is_empty() {
            return Some(self.content_encoding.clone());
        }
        self.basename()
            .split('.')
            .skip(1)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .find_map(encoding_for_extension)
            .map(str::to_string)
    }

    /// The owning container, if it is still alive
    pub fn container(&self) -> Result<Arc<dyn Container>> {
        self.container.upgrade().ok_or_else(|| {
            Error::Cloud(format!(
                "Container \"{}\" is no longer available",
                self.container_name
            ))
        })
    }

    /// Native handle, resolved on first access and cached afterwards
    pub async fn native(&self) -> Result<&ObjectHead> {
        self.native
            .get_or_try_init(|| async { self.container()?.head_object(&self.name).await })
            .await
    }

    /// Return the contents of the object
    pub async fn read(&self) -> Result<Vec<u8>> {
        self.container()?.read_object(&self.name).await
    }
}

impl std::fmt::Debug for StorageObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageObject")
            .field("container_name", &self.container_name)
            .field("name", &self.name)
            .field("size", &self.size)
            .field("obj_type", &self.obj_type)
            .field("last_modified", &self.last_modified)
            .field("modified_by", &self.modified_by)
            .field("is_placeholder", &self.is_placeholder)
            .finish_non_exhaustive()
    }
}

fn encoding_for_extension(ext: &str) -> Option<&'static str> {
    match ext {
        "gz" => Some("gzip"),
        "Z" => Some("compress"),
        "bz2" => Some("bzip2"),
        "xz" => Some("xz"),
        "br" => Some("br"),
        _ => None,
    }
}
