//! bv-fs: Local filesystem adapter for bucketview
//!
//! A root directory is the account; its non-hidden subdirectories are the
//! containers and everything below them maps onto files and subdirectories.

pub mod connection;
pub mod container;
mod error;

pub use connection::FsConnection;
pub use container::FsContainer;

/// Hidden entries (dot files and dot directories) are never exposed
pub(crate) fn is_hidden(name: &str) -> bool {
    name.is_empty() || name.starts_with('.')
}
