//! bv-s3: S3 flat object store adapter for bucketview
//!
//! This crate implements the Connection and Container traits from bv-core
//! on top of aws-sdk-s3, emulating directories over the flat key space.
//! It is the only crate that directly depends on the AWS SDK.

mod bucket;
pub mod connection;
pub mod container;
mod error;
#[cfg(test)]
mod memory;
mod upload;

pub use connection::S3Connection;
pub use container::{MAX_LIST, S3Container};
