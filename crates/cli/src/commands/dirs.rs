//! dirs command - List every directory of a container

use bv_core::{Result, parse_path};
use clap::Args;
use serde::Serialize;

use crate::backend::Backend;
use crate::output::Formatter;

/// List every directory of a container
#[derive(Args, Debug)]
pub struct DirsArgs {
    /// Container name
    pub container: String,
}

#[derive(Debug, Serialize)]
struct DirsOutput {
    container: String,
    directories: Vec<String>,
}

/// Execute the dirs command
pub async fn execute(args: DirsArgs, backend: &Backend, formatter: &Formatter) -> Result<()> {
    let target = parse_path(&args.container)?;
    let container = backend.container(&target.container).await?;
    let directories = container.get_directories_paths().await?;

    if formatter.is_json() {
        formatter.json(&DirsOutput {
            container: target.container,
            directories,
        });
    } else {
        for dir in &directories {
            let shown = if dir.is_empty() { "/" } else { dir.as_str() };
            formatter.println(&formatter.dir_name(shown));
        }
    }
    Ok(())
}
