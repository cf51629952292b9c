//! mkdir command - Create a directory

use bv_core::{Error, Result, parse_path};
use clap::Args;

use crate::backend::Backend;
use crate::output::Formatter;

/// Create a directory
#[derive(Args, Debug)]
pub struct MkdirArgs {
    /// Directory path (container/path)
    pub path: String,

    /// Identity recorded as the directory's modifier
    #[arg(long)]
    pub actor: Option<String>,
}

/// Execute the mkdir command
pub async fn execute(args: MkdirArgs, backend: &Backend, formatter: &Formatter) -> Result<()> {
    let target = parse_path(&args.path)?;
    if target.is_root() {
        return Err(Error::InvalidName(format!(
            "{} names a container, not a directory",
            args.path
        )));
    }

    let container = backend.container(&target.container).await?;
    let created = container.mkdir(&target.path, args.actor.as_deref()).await?;

    if formatter.is_json() {
        formatter.json(&created);
    } else {
        formatter.success(&format!("Created directory {}", created.path()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::*;

    fn args(path: &str) -> MkdirArgs {
        MkdirArgs {
            path: path.to_string(),
            actor: Some("alice".into()),
        }
    }

    #[tokio::test]
    async fn test_mkdir_twice() {
        let (temp, backend) = fs_backend();
        execute(args("docs/photos"), &backend, &quiet()).await.unwrap();
        execute(args("docs/photos"), &backend, &quiet()).await.unwrap();
        assert!(docs(&temp).join("photos").is_dir());
    }

    #[tokio::test]
    async fn test_mkdir_on_container_root() {
        let (_temp, backend) = fs_backend();
        let err = execute(args("docs"), &backend, &quiet()).await.unwrap_err();
        assert!(matches!(err, Error::InvalidName(_)));
    }
}
