//! stat command - Show object metadata

use bv_core::{Result, StorageObject, parse_path};
use clap::Args;
use serde::Serialize;

use super::format_time;
use crate::backend::Backend;
use crate::output::Formatter;

/// Show object metadata
#[derive(Args, Debug)]
pub struct StatArgs {
    /// Object path (container/path)
    pub path: String,
}

#[derive(Debug, Serialize)]
struct StatOutput {
    container: String,
    name: String,
    #[serde(rename = "type")]
    obj_type: &'static str,
    size_bytes: u64,
    size_human: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content_encoding: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_modified: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    modified_by: Option<String>,
}

impl From<&StorageObject> for StatOutput {
    fn from(object: &StorageObject) -> Self {
        Self {
            container: object.container_name.clone(),
            name: object.name.clone(),
            obj_type: if object.is_subdir() { "subdirectory" } else { "file" },
            size_bytes: object.size,
            size_human: object.size_human(),
            content_type: object.smart_content_type(),
            content_encoding: object.smart_content_encoding(),
            last_modified: object.last_modified.map(|t| t.to_string()),
            modified_by: object.modified_by.clone(),
        }
    }
}

/// Execute the stat command
pub async fn execute(args: StatArgs, backend: &Backend, formatter: &Formatter) -> Result<()> {
    let target = parse_path(&args.path)?;
    let container = backend.container(&target.container).await?;
    let object = container.get_object(&target.path).await?;
    let output = StatOutput::from(&object);

    if formatter.is_json() {
        formatter.json(&output);
        return Ok(());
    }

    formatter.println(&format!("Name      : {}", object.path()));
    formatter.println(&format!("Type      : {}", output.obj_type));
    formatter.println(&format!(
        "Size      : {} ({} bytes)",
        output.size_human, output.size_bytes
    ));
    if object.last_modified.is_some() {
        formatter.println(&format!(
            "Date      : {} UTC",
            format_time(object.last_modified)
        ));
    }
    if let Some(content_type) = &output.content_type {
        formatter.println(&format!("Content   : {content_type}"));
    }
    if let Some(encoding) = &output.content_encoding {
        formatter.println(&format!("Encoding  : {encoding}"));
    }
    if let Some(modified_by) = &output.modified_by {
        formatter.println(&format!("Modifier  : {modified_by}"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::*;

    #[tokio::test]
    async fn test_stat_output() {
        let (_temp, backend) = fs_backend();
        let container = backend.container("docs").await.unwrap();
        let object = container.get_object("sub/b.txt").await.unwrap();

        let output = StatOutput::from(&object);
        assert_eq!(output.name, "sub/b.txt");
        assert_eq!(output.obj_type, "file");
        assert_eq!(output.size_bytes, 4);
        assert_eq!(output.content_type.as_deref(), Some("text/plain"));
        assert!(output.last_modified.is_some());

        let args = StatArgs {
            path: "docs/sub/b.txt".into(),
        };
        execute(args, &backend, &quiet()).await.unwrap();
    }
}
