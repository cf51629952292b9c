//! upload-form command - Generate a signed browser upload form

use std::time::Duration;

use bv_core::path::dir_prefix;
use bv_core::upload::DEFAULT_UPLOAD_ACL;
use bv_core::{Result, UploadFormRequest, parse_path};
use clap::Args;

use crate::backend::Backend;
use crate::output::Formatter;

/// Generate a form that uploads files straight into a directory
#[derive(Args, Debug)]
pub struct UploadFormArgs {
    /// Target directory (container[/path])
    pub path: String,

    /// URL the backend redirects to after a successful upload
    #[arg(long)]
    pub redirect: String,

    /// Canned ACL applied to uploaded files
    #[arg(long, default_value = DEFAULT_UPLOAD_ACL)]
    pub acl: String,

    /// Identity recorded as the uploaded files' modifier
    #[arg(long)]
    pub actor: Option<String>,

    /// Policy validity in seconds
    #[arg(long, default_value = "3600")]
    pub expires: u64,

    /// Print an HTML form instead of the field list
    #[arg(long)]
    pub html: bool,
}

/// Execute the upload-form command
pub async fn execute(args: UploadFormArgs, backend: &Backend, formatter: &Formatter) -> Result<()> {
    let target = parse_path(&args.path)?;
    let request = UploadFormRequest {
        acl: args.acl,
        actor: args.actor,
        expires_in: Duration::from_secs(args.expires),
        ..UploadFormRequest::new(&target.container, dir_prefix(&target.path), args.redirect)
    };
    let form = backend.connection.upload_form(&request).await?;

    if formatter.is_json() {
        formatter.json(&form);
    } else if args.html {
        formatter.println(form.to_html().trim_end());
    } else {
        formatter.println(&format!("action: {}", form.action));
        for (name, value) in &form.fields {
            formatter.println(&format!("{name}: {value}"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use bv_core::Error;

    use super::*;
    use crate::commands::test_support::*;

    #[tokio::test]
    async fn test_filesystem_has_no_upload_forms() {
        let (_temp, backend) = fs_backend();
        let args = UploadFormArgs {
            path: "docs/sub".into(),
            redirect: "https://example.com/done".into(),
            acl: DEFAULT_UPLOAD_ACL.into(),
            actor: None,
            expires: 60,
            html: false,
        };
        let err = execute(args, &backend, &quiet()).await.unwrap_err();
        assert!(matches!(err, Error::Cloud(_)));
    }
}
