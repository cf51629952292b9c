//! ls command - List containers or one page of a directory
//!
//! Without a path the permitted containers are listed. With a path, one
//! page of direct children is shown together with the marker that resumes
//! the listing.

use bv_core::{Error, ListingPage, Result, StorageObject, list_page, parse_path, path};
use clap::Args;
use serde::Serialize;

use super::format_time;
use crate::backend::Backend;
use crate::output::Formatter;

/// List containers or directory contents
#[derive(Args, Debug)]
pub struct LsArgs {
    /// Directory to list (container[/path]); lists containers when omitted
    pub path: Option<String>,

    /// Resume the listing after this object name
    #[arg(long)]
    pub marker: Option<String>,

    /// Objects per page
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
struct ContainersOutput {
    containers: Vec<String>,
}

#[derive(Debug, Serialize)]
struct LsOutput<'a> {
    container: &'a str,
    path: &'a str,
    #[serde(flatten)]
    page: &'a ListingPage,
}

/// Execute the ls command
pub async fn execute(args: LsArgs, backend: &Backend, formatter: &Formatter) -> Result<()> {
    let Some(raw) = args.path.as_deref() else {
        return list_containers(backend, formatter).await;
    };

    let target = parse_path(raw)?;
    let container = backend.container(&target.container).await?;
    if !target.is_root() && !container.has_directory(&path::dir_prefix(&target.path)).await? {
        return Err(Error::NoObject(format!("{target} is not a directory")));
    }

    let limit = backend.list_limit(args.limit);
    let page = list_page(container.as_ref(), &target.path, args.marker.as_deref(), limit).await?;

    if formatter.is_json() {
        formatter.json(&LsOutput {
            container: &target.container,
            path: &target.path,
            page: &page,
        });
        return Ok(());
    }

    let rows = page
        .objects
        .iter()
        .map(|object| object_row(object, formatter))
        .collect();
    formatter.table(&["MODIFIED", "SIZE", "MODIFIED BY", "NAME"], rows, &[1]);
    if let Some(marker) = &page.next_marker {
        formatter.println(&format!(
            "\nMore objects follow: bv ls {target} --marker '{marker}'"
        ));
    }
    Ok(())
}

async fn list_containers(backend: &Backend, formatter: &Formatter) -> Result<()> {
    let containers: Vec<String> = backend
        .connection
        .get_containers()
        .await?
        .iter()
        .map(|c| c.name().to_string())
        .collect();

    if formatter.is_json() {
        formatter.json(&ContainersOutput { containers });
    } else {
        for name in &containers {
            formatter.println(&formatter.dir_name(&format!("{name}/")));
        }
    }
    Ok(())
}

fn object_row(object: &StorageObject, formatter: &Formatter) -> Vec<String> {
    let (size, name) = if object.is_subdir() {
        (String::new(), formatter.dir_name(&format!("{}/", object.basename())))
    } else {
        (object.size_human(), object.basename().to_string())
    };
    vec![
        format_time(object.last_modified),
        size,
        object.modified_by.clone().unwrap_or_default(),
        name,
    ]
}
