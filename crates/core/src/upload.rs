//! Direct-to-backend upload forms
//!
//! The browser posts file bytes straight to the object store; the
//! application only hands out a signed, time-boxed form.

use std::time::Duration;

use serde::Serialize;

/// Default validity of an upload policy
pub const DEFAULT_UPLOAD_EXPIRY: Duration = Duration::from_secs(60 * 60);

/// Default ACL applied to uploaded objects
pub const DEFAULT_UPLOAD_ACL: &str = "public-read";

/// Parameters of an upload form
#[derive(Debug, Clone)]
pub struct UploadFormRequest {
    /// Target container
    pub container: String,
    /// Key prefix every uploaded key must start with (empty or `dir/`)
    pub key_prefix: String,
    /// Where the backend redirects the browser after a successful upload
    pub success_action_redirect: String,
    /// Canned ACL for the uploaded object
    pub acl: String,
    /// Identity recorded as the object's modifier
    pub actor: Option<String>,
    /// Policy validity
    pub expires_in: Duration,
}

impl UploadFormRequest {
    /// Create a request with the default ACL and expiry
    pub fn new(
        container: impl Into<String>,
        key_prefix: impl Into<String>,
        success_action_redirect: impl Into<String>,
    ) -> Self {
        Self {
            container: container.into(),
            key_prefix: key_prefix.into(),
            success_action_redirect: success_action_redirect.into(),
            acl: DEFAULT_UPLOAD_ACL.to_string(),
            actor: None,
            expires_in: DEFAULT_UPLOAD_EXPIRY,
        }
    }
}

/// A signed form the client submits directly to the backend
#[derive(Debug, Clone, Serialize)]
pub struct UploadForm {
    /// Form action URL
    pub action: String,
    /// Hidden fields, in submission order
    pub fields: Vec<(String, String)>,
}

impl UploadForm {
    /// Value of a hidden field
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Render as a multipart HTML form
    pub fn to_html(&self) -> String {
        let mut html = format!(
            "<form action=\"{}\" method=\"post\" enctype=\"multipart/form-data\">\n",
            escape_html(&self.action)
        );
        for (name, value) in &self.fields {
            html.push_str(&format!(
                "  <input type=\"hidden\" name=\"{}\" value=\"{}\">\n",
                escape_html(name),
                escape_html(value)
            ));
        }
        html.push_str("  <input type=\"file\" name=\"file\">\n");
        html.push_str("  <input type=\"submit\" value=\"Upload\">\n");
        html.push_str("</form>\n");
        html
    }
}

fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults() {
        let request = UploadFormRequest::new("docs", "a/", "https://example.com/done");
        assert_eq!(request.acl, "public-read");
        assert_eq!(request.expires_in, Duration::from_secs(3600));
        assert!(request.actor.is_none());
    }

    #[test]
    fn test_to_html_escapes_values() {
        let form = UploadForm {
            action: "https://docs.s3.amazonaws.com".into(),
            fields: vec![
                ("key".into(), "a/${filename}".into()),
                ("x-amz-meta-modified-by".into(), "<bob & \"eve\">".into()),
            ],
        };
        let html = form.to_html();
        assert!(html.starts_with("<form action=\"https://docs.s3.amazonaws.com\""));
        assert!(html.contains("value=\"a/${filename}\""));
        assert!(html.contains("&lt;bob &amp; &quot;eve&quot;&gt;"));
        assert!(html.contains("type=\"file\" name=\"file\""));
        assert_eq!(form.field("key"), Some("a/${filename}"));
        assert_eq!(form.field("missing"), None);
    }
}
