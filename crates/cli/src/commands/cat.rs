//! cat command - Display object contents

use std::io::Write;

use bv_core::{Error, Result, parse_path};
use clap::Args;

use crate::backend::Backend;

/// Display object contents
#[derive(Args, Debug)]
pub struct CatArgs {
    /// Object path (container/path)
    pub path: String,
}

/// Execute the cat command
pub async fn execute(args: CatArgs, backend: &Backend) -> Result<()> {
    let data = read(&args.path, backend).await?;
    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(&data)
        .and_then(|()| stdout.flush())
        .map_err(|e| Error::Cloud(format!("Failed to write output: {e}")))
}

async fn read(path: &str, backend: &Backend) -> Result<Vec<u8>> {
    let target = parse_path(path)?;
    let container = backend.container(&target.container).await?;
    let object = container.get_object(&target.path).await?;
    if object.is_subdir() {
        return Err(Error::InvalidName(format!("{target} is a directory")));
    }
    object.read().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::*;

    #[tokio::test]
    async fn test_read_contents() {
        let (_temp, backend) = fs_backend();
        assert_eq!(read("docs/a.txt", &backend).await.unwrap(), b"alpha");
    }

    #[tokio::test]
    async fn test_read_directory_is_rejected() {
        let (_temp, backend) = fs_backend();
        let err = read("docs/sub", &backend).await.unwrap_err();
        assert!(matches!(err, Error::InvalidName(_)));
    }
}
