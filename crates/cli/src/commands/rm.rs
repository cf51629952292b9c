//! rm command - Remove a file or a directory tree

use bv_core::{Result, parse_path};
use clap::Args;
use serde::Serialize;

use crate::backend::Backend;
use crate::output::Formatter;

/// Remove a file, or a directory with everything below it
#[derive(Args, Debug)]
pub struct RmArgs {
    /// Path to remove (container/path)
    pub path: String,

    /// The path is a directory; remove it recursively
    #[arg(short, long)]
    pub dir: bool,
}

#[derive(Debug, Serialize)]
struct RmOutput {
    deleted: String,
    directory: bool,
}

/// Execute the rm command
pub async fn execute(args: RmArgs, backend: &Backend, formatter: &Formatter) -> Result<()> {
    let target = parse_path(&args.path)?;
    let container = backend.container(&target.container).await?;
    container.delete(&target.path, !args.dir).await?;

    if formatter.is_json() {
        formatter.json(&RmOutput {
            deleted: target.to_full_path(),
            directory: args.dir,
        });
    } else {
        formatter.success(&format!("Removed {target}"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use bv_core::Error;

    use super::*;
    use crate::commands::test_support::*;

    #[tokio::test]
    async fn test_rm_file_and_dir() {
        let (temp, backend) = fs_backend();
        let args = RmArgs {
            path: "docs/a.txt".into(),
            dir: false,
        };
        execute(args, &backend, &quiet()).await.unwrap();
        assert!(!docs(&temp).join("a.txt").exists());

        let args = RmArgs {
            path: "docs/sub".into(),
            dir: true,
        };
        execute(args, &backend, &quiet()).await.unwrap();
        assert!(!docs(&temp).join("sub").exists());
    }

    #[tokio::test]
    async fn test_rm_missing() {
        let (_temp, backend) = fs_backend();
        let args = RmArgs {
            path: "docs/missing.txt".into(),
            dir: false,
        };
        let err = execute(args, &backend, &quiet()).await.unwrap_err();
        assert!(matches!(err, Error::NoObject(_)));
    }
}
