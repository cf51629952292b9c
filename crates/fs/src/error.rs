//! I/O error translation

use std::io;

use bv_core::Error;

/// Attach translation context to I/O results
pub(crate) trait IoResultExt<T> {
    /// Missing paths become `NoObject`, anything else `StorageResponse`
    fn for_object(self, path: &str) -> bv_core::Result<T>;

    /// Missing paths become `NoContainer`, anything else `StorageResponse`
    fn for_container(self, name: &str) -> bv_core::Result<T>;
}

impl<T> IoResultExt<T> for io::Result<T> {
    fn for_object(self, path: &str) -> bv_core::Result<T> {
        self.map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => Error::NoObject(format!("{path}: {e}")),
            _ => Error::StorageResponse(format!("{path}: {e}")),
        })
    }

    fn for_container(self, name: &str) -> bv_core::Result<T> {
        self.map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => Error::NoContainer(format!("{name}: {e}")),
            _ => Error::StorageResponse(format!("{name}: {e}")),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_translation() {
        let missing: io::Result<()> = Err(io::Error::from(io::ErrorKind::NotFound));
        assert!(matches!(missing.for_object("a.txt"), Err(Error::NoObject(_))));

        let missing: io::Result<()> = Err(io::Error::from(io::ErrorKind::NotFound));
        assert!(matches!(missing.for_container("docs"), Err(Error::NoContainer(_))));
    }

    #[test]
    fn test_other_errors_are_storage_responses() {
        let denied: io::Result<()> = Err(io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(matches!(
            denied.for_object("a.txt"),
            Err(Error::StorageResponse(_))
        ));
    }
}
