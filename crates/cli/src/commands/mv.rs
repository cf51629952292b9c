//! mv command - Move a file into another directory of the same container

use bv_core::{Error, Result, parse_path};
use clap::Args;

use crate::backend::Backend;
use crate::output::Formatter;

/// Move a file into another directory
#[derive(Args, Debug)]
pub struct MvArgs {
    /// File to move (container/path)
    pub source: String,

    /// Target directory (container[/path]) in the same container
    pub target: String,
}

/// Execute the mv command
pub async fn execute(args: MvArgs, backend: &Backend, formatter: &Formatter) -> Result<()> {
    let source = parse_path(&args.source)?;
    let target = parse_path(&args.target)?;
    if source.container != target.container {
        return Err(Error::InvalidName(format!(
            "Cannot move {source} to {target}: files only move within one container"
        )));
    }
    if source.is_root() {
        return Err(Error::InvalidName(format!("{source} names a container")));
    }

    let container = backend.container(&source.container).await?;
    let moved = container.move_file(&source.path, &target.path).await?;

    if formatter.is_json() {
        formatter.json(&moved);
    } else {
        formatter.success(&format!("Moved {source} to {}", moved.path()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::*;

    fn args(source: &str, target: &str) -> MvArgs {
        MvArgs {
            source: source.into(),
            target: target.into(),
        }
    }

    #[tokio::test]
    async fn test_mv_into_subdirectory() {
        let (temp, backend) = fs_backend();
        execute(args("docs/a.txt", "docs/sub"), &backend, &quiet())
            .await
            .unwrap();
        assert!(docs(&temp).join("sub/a.txt").exists());
        assert!(!docs(&temp).join("a.txt").exists());
    }

    #[tokio::test]
    async fn test_mv_across_containers_is_rejected() {
        let (_temp, backend) = fs_backend();
        let err = execute(args("docs/a.txt", "other/sub"), &backend, &quiet())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidName(_)));
    }
}
