//! bv-core: Core library for the bucketview storage browser
//!
//! This crate provides the backend-independent pieces of bucketview:
//! - Error taxonomy shared by every backend adapter
//! - StorageObject descriptors and their lazily resolved native handles
//! - Container and Connection traits implemented per backend family
//! - Path helpers, paged listings and configuration
//!
//! Adapters for concrete backends live in `bv-s3` (flat object stores) and
//! `bv-fs` (hierarchical filesystems).

pub mod config;
pub mod error;
pub mod listing;
pub mod object;
pub mod path;
pub mod traits;
pub mod upload;

pub use config::{BackendConfig, Config, ConfigManager, ContainerPolicy, ListingConfig};
pub use error::{Error, Result};
pub use listing::{ListingPage, list_page};
pub use object::{ObjectHead, ObjectType, StorageObject};
pub use path::{BrowsePath, ROOT, SEP, parse_path};
pub use traits::{Connection, Container};
pub use upload::{UploadForm, UploadFormRequest};
