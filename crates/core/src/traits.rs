//! Container and Connection trait definitions
//!
//! These traits define the capability set every backend family implements.
//! The presentation layer only talks to `dyn Connection` / `dyn Container`,
//! so flat object stores and hierarchical filesystems are interchangeable.

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::ContainerPolicy;
use crate::error::{Error, Result};
use crate::object::{ObjectHead, StorageObject};
use crate::path::{self, SEP};
use crate::upload::{UploadForm, UploadFormRequest};

/// A single-level namespace of objects (a bucket, a share, a root directory)
#[async_trait]
pub trait Container: Send + Sync {
    /// Container name
    fn name(&self) -> &str;

    /// Cached object count, when the backend knows it
    fn count(&self) -> Option<u64> {
        None
    }

    /// Cached total size in bytes, when the backend knows it
    fn size(&self) -> Option<u64> {
        None
    }

    /// Maximum number of objects a single listing may return, `None` if unbounded
    fn max_list(&self) -> Option<usize>;

    /// Special characters allowed in object basenames
    fn get_safe_special_characters(&self) -> &str {
        path::SAFE_SPECIAL_CHARACTERS
    }

    /// Whether a basename only contains characters this backend accepts
    fn is_safe_basename(&self, name: &str) -> bool {
        path::is_safe_basename(name)
    }

    /// Reject an unsafe basename before any mutating backend call is issued
    fn validate_basename(&self, name: &str) -> Result<()> {
        if self.is_safe_basename(name) {
            Ok(())
        } else {
            Err(Error::InvalidName(format!(
                "\"{name}\" may only contain letters, digits and \"{}\"",
                self.get_safe_special_characters()
            )))
        }
    }

    /// List the direct children of `path`, resuming after `marker`
    async fn get_objects(
        &self,
        path: &str,
        marker: Option<&str>,
        limit: usize,
    ) -> Result<Vec<StorageObject>>;

    /// Get a single object
    async fn get_object(&self, path: &str) -> Result<StorageObject>;

    /// Resolve the native description of an object
    async fn head_object(&self, path: &str) -> Result<ObjectHead>;

    /// Read the contents of an object
    async fn read_object(&self, path: &str) -> Result<Vec<u8>>;

    /// Check that a directory exists
    ///
    /// Fails with `NoObject` when nothing is there; `false` when the path
    /// names something other than a directory.
    async fn has_directory(&self, path: &str) -> Result<bool>;

    /// Every directory path in the container, root included, sorted
    async fn get_directories_paths(&self) -> Result<Vec<String>>;

    /// Normalise a listing: attach metadata, drop placeholder entries
    async fn filter_objects(&self, objects: Vec<StorageObject>) -> Result<Vec<StorageObject>>;

    /// Create a directory; calling it on an existing directory changes nothing
    async fn mkdir(&self, path: &str, actor: Option<&str>) -> Result<StorageObject>;

    /// Delete a file, or a directory with everything under it
    async fn delete(&self, path: &str, is_file: bool) -> Result<()>;

    /// Rename a file or directory to `parent/new_name`
    async fn rename(
        &self,
        parent: &str,
        src: &str,
        new_name: &str,
        is_file: bool,
    ) -> Result<StorageObject>;

    /// Move a single file into `target_dir`
    async fn move_file(&self, src: &str, target_dir: &str) -> Result<StorageObject>;
}

/// Top-level entry point to one backend account
#[async_trait]
pub trait Connection: Send + Sync {
    /// Account identifier, if the backend uses credentials
    fn account(&self) -> Option<&str> {
        None
    }

    /// Container permission policy
    fn policy(&self) -> &ContainerPolicy;

    /// Maximum listing page size of this backend, `None` if unbounded
    fn max_list(&self) -> Option<usize>;

    /// Backend hook: every container, unfiltered
    async fn list_containers(&self) -> Result<Vec<Arc<dyn Container>>>;

    /// Backend hook: open a container by validated name
    async fn open_container(&self, name: &str) -> Result<Arc<dyn Container>>;

    /// Containers permitted by policy
    async fn get_containers(&self) -> Result<Vec<Arc<dyn Container>>> {
        let containers = self.list_containers().await?;
        let policy = self.policy();
        Ok(containers
            .into_iter()
            .filter(|c| policy.permits(c.name()))
            .collect())
    }

    /// A single container
    async fn get_container(&self, name: &str) -> Result<Arc<dyn Container>> {
        let name = name.trim_matches(SEP);
        if !self.policy().permits(name) {
            return Err(Error::NotPermitted(format!(
                "Access to container \"{name}\" is not permitted"
            )));
        }
        if name.is_empty() || name.contains(SEP) {
            return Err(Error::InvalidName(format!(
                "Container name \"{name}\" must be a single path segment"
            )));
        }
        self.open_container(name).await
    }

    /// Build a browser-postable form uploading straight to the backend
    async fn upload_form(&self, _request: &UploadFormRequest) -> Result<UploadForm> {
        Err(Error::Cloud(
            "Upload forms are not supported by this backend".into(),
        ))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Container with no objects, used where only a type is needed
    pub(crate) struct NullContainer {
        pub(crate) name: String,
    }

    #[async_trait]
    impl Container for NullContainer {
        fn name(&self) -> &str {
            &self.name
        }

        fn max_list(&self) -> Option<usize> {
            None
        }

        async fn get_objects(
            &self,
            _path: &str,
            _marker: Option<&str>,
            _limit: usize,
        ) -> Result<Vec<StorageObject>> {
            Ok(Vec::new())
        }

        async fn get_object(&self, path: &str) -> Result<StorageObject> {
            Err(Error::NoObject(path.to_string()))
        }

        async fn head_object(&self, path: &str) -> Result<ObjectHead> {
            Err(Error::NoObject(path.to_string()))
        }

        async fn read_object(&self, path: &str) -> Result<Vec<u8>> {
            Err(Error::NoObject(path.to_string()))
        }

        async fn has_directory(&self, path: &str) -> Result<bool> {
            Err(Error::NoObject(path.to_string()))
        }

        async fn get_directories_paths(&self) -> Result<Vec<String>> {
            Ok(vec![path::ROOT.to_string()])
        }

        async fn filter_objects(
            &self,
            objects: Vec<StorageObject>,
        ) -> Result<Vec<StorageObject>> {
            Ok(objects)
        }

        async fn mkdir(&self, path: &str, _actor: Option<&str>) -> Result<StorageObject> {
            Err(Error::Client(format!("read-only: {path}")))
        }

        async fn delete(&self, path: &str, _is_file: bool) -> Result<()> {
            Err(Error::NoObject(path.to_string()))
        }

        async fn rename(
            &self,
            _parent: &str,
            src: &str,
            _new_name: &str,
            _is_file: bool,
        ) -> Result<StorageObject> {
            Err(Error::NoObject(src.to_string()))
        }

        async fn move_file(&self, src: &str, _target_dir: &str) -> Result<StorageObject> {
            Err(Error::NoObject(src.to_string()))
        }
    }

    struct StaticConnection {
        policy: ContainerPolicy,
        names: Vec<&'static str>,
    }

    #[async_trait]
    impl Connection for StaticConnection {
        fn policy(&self) -> &ContainerPolicy {
            &self.policy
        }

        fn max_list(&self) -> Option<usize> {
            None
        }

        async fn list_containers(&self) -> Result<Vec<Arc<dyn Container>>> {
            Ok(self
                .names
                .iter()
                .map(|n| {
                    Arc::new(NullContainer {
                        name: n.to_string(),
                    }) as Arc<dyn Container>
                })
                .collect())
        }

        async fn open_container(&self, name: &str) -> Result<Arc<dyn Container>> {
            if self.names.contains(&name) {
                Ok(Arc::new(NullContainer {
                    name: name.to_string(),
                }))
            } else {
                Err(Error::NoContainer(name.to_string()))
            }
        }
    }

    fn connection(policy: ContainerPolicy) -> StaticConnection {
        StaticConnection {
            policy,
            names: vec!["docs", "photos", "private"],
        }
    }

    #[tokio::test]
    async fn test_get_containers_filters_by_policy() {
        let conn = connection(ContainerPolicy {
            allow: Vec::new(),
            deny: vec!["private".into()],
        });
        let names: Vec<String> = conn
            .get_containers()
            .await
            .unwrap()
            .iter()
            .map(|c| c.name().to_string())
            .collect();
        assert_eq!(names, vec!["docs", "photos"]);
    }

    #[tokio::test]
    async fn test_get_container_not_permitted_before_lookup() {
        let conn = connection(ContainerPolicy {
            allow: vec!["docs".into()],
            deny: Vec::new(),
        });
        let err = conn.get_container("photos").await.err().unwrap();
        assert!(matches!(err, Error::NotPermitted(_)));

        // Disallowed names fail on policy even when they do not exist.
        let err = conn.get_container("missing").await.err().unwrap();
        assert!(matches!(err, Error::NotPermitted(_)));
    }

    #[tokio::test]
    async fn test_get_container_missing_and_invalid() {
        let conn = connection(ContainerPolicy::default());
        assert!(matches!(
            conn.get_container("missing").await.err().unwrap(),
            Error::NoContainer(_)
        ));
        assert!(matches!(
            conn.get_container("docs/sub").await.err().unwrap(),
            Error::InvalidName(_)
        ));
        assert_eq!(conn.get_container("docs/").await.unwrap().name(), "docs");
    }

    #[tokio::test]
    async fn test_upload_form_unsupported_by_default() {
        let conn = connection(ContainerPolicy::default());
        let request = UploadFormRequest::new("docs", "", "https://example.com/done");
        assert!(matches!(
            conn.upload_form(&request).await.unwrap_err(),
            Error::Cloud(_)
        ));
    }

    #[test]
    fn test_validate_basename() {
        let container = NullContainer {
            name: "docs".into(),
        };
        assert!(container.validate_basename("ok name.txt").is_ok());
        assert!(matches!(
            container.validate_basename("bad?name"),
            Err(Error::InvalidName(_))
        ));
    }
}
