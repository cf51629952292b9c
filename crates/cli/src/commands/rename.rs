//! rename command - Rename a file or directory in place

use bv_core::{Error, Result, parse_path};
use clap::Args;

use crate::backend::Backend;
use crate::output::Formatter;

/// Rename a file or directory, keeping it in its parent directory
#[derive(Args, Debug)]
pub struct RenameArgs {
    /// Path to rename (container/path)
    pub path: String,

    /// New base name
    pub new_name: String,

    /// The path is a directory
    #[arg(short, long)]
    pub dir: bool,
}

/// Execute the rename command
pub async fn execute(args: RenameArgs, backend: &Backend, formatter: &Formatter) -> Result<()> {
    let target = parse_path(&args.path)?;
    let parent = target
        .parent()
        .ok_or_else(|| Error::InvalidName(format!("{} names a container", args.path)))?;

    let container = backend.container(&target.container).await?;
    let renamed = container
        .rename(&parent.path, &target.path, &args.new_name, !args.dir)
        .await?;

    if formatter.is_json() {
        formatter.json(&renamed);
    } else {
        formatter.success(&format!("Renamed {target} to {}", renamed.path()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::*;

    #[tokio::test]
    async fn test_rename_file_in_subdirectory() {
        let (temp, backend) = fs_backend();
        let args = RenameArgs {
            path: "docs/sub/b.txt".into(),
            new_name: "c.txt".into(),
            dir: false,
        };
        execute(args, &backend, &quiet()).await.unwrap();
        assert!(docs(&temp).join("sub/c.txt").exists());
        assert!(!docs(&temp).join("sub/b.txt").exists());
    }

    #[tokio::test]
    async fn test_rename_directory() {
        let (temp, backend) = fs_backend();
        let args = RenameArgs {
            path: "docs/sub".into(),
            new_name: "renamed".into(),
            dir: true,
        };
        execute(args, &backend, &quiet()).await.unwrap();
        assert!(docs(&temp).join("renamed/b.txt").exists());
    }

    #[tokio::test]
    async fn test_rename_container_is_rejected() {
        let (_temp, backend) = fs_backend();
        let args = RenameArgs {
            path: "docs".into(),
            new_name: "other".into(),
            dir: true,
        };
        let err = execute(args, &backend, &quiet()).await.unwrap_err();
        assert!(matches!(err, Error::InvalidName(_)));
    }
}
