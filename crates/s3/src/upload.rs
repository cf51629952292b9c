//! Browser-based POST upload forms
//!
//! The policy document constrains the bucket, the key prefix, the ACL,
//! the redirect target and the modifier metadata; it is base64 encoded
//! and signed with HMAC-SHA1 over the account secret.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use bv_core::config::S3Settings;
use bv_core::object::MODIFIED_BY_KEY;
use bv_core::{Error, Result, UploadForm, UploadFormRequest};
use hmac::{Hmac, Mac};
use jiff::{SignedDuration, Timestamp};
use serde_json::{Value, json};
use sha1::Sha1;
use url::Url;

type HmacSha1 = Hmac<Sha1>;

const EXPIRATION_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

fn modified_by_field() -> String {
    format!("x-amz-meta-{MODIFIED_BY_KEY}")
}

/// Policy document for `request`, valid until `now + request.expires_in`
pub(crate) fn policy_document(request: &UploadFormRequest, now: Timestamp) -> Result<Value> {
    let validity = SignedDuration::try_from(request.expires_in)
        .map_err(|e| Error::Client(format!("Invalid upload expiry: {e}")))?;
    let expires = now
        .checked_add(validity)
        .map_err(|e| Error::Client(format!("Invalid upload expiry: {e}")))?;

    let mut conditions = vec![
        json!({ "bucket": request.container }),
        json!(["starts-with", "$key", request.key_prefix]),
        json!({ "acl": request.acl }),
        json!({ "success_action_redirect": request.success_action_redirect }),
    ];
    if let Some(actor) = &request.actor {
        conditions.push(json!({ modified_by_field(): actor }));
    }

    Ok(json!({
        "expiration": expires.strftime(EXPIRATION_FORMAT).to_string(),
        "conditions": conditions,
    }))
}

/// Base64 encoding of the serialized policy
pub(crate) fn encode_policy(policy: &Value) -> String {
    BASE64.encode(policy.to_string())
}

/// Base64 HMAC-SHA1 of the encoded policy
pub(crate) fn sign_policy(secret: &str, encoded_policy: &str) -> Result<String> {
    let mut mac = HmacSha1::new_from_slice(secret.as_bytes())
        .map_err(|e| Error::Client(format!("Invalid signing key: {e}")))?;
    mac.update(encoded_policy.as_bytes());
    Ok(BASE64.encode(mac.finalize().into_bytes()))
}

/// URL the form posts to
pub(crate) fn form_action(settings: &S3Settings, bucket: &str) -> Result<String> {
    let Some(endpoint) = &settings.endpoint else {
        return Ok(format!("https://{bucket}.s3.amazonaws.com"));
    };

    let mut url = Url::parse(endpoint)
        .map_err(|e| Error::Config(format!("Invalid endpoint \"{endpoint}\": {e}")))?;
    if settings.path_style {
        url.path_segments_mut()
            .map_err(|_| Error::Config(format!("Endpoint \"{endpoint}\" cannot hold a path")))?
            .pop_if_empty()
            .push(bucket);
    } else {
        let host = url
            .host_str()
            .map(|host| format!("{bucket}.{host}"))
            .ok_or_else(|| Error::Config(format!("Endpoint \"{endpoint}\" has no host")))?;
        url.set_host(Some(&host))
            .map_err(|e| Error::Config(format!("Invalid endpoint \"{endpoint}\": {e}")))?;
    }
    Ok(url.to_string().trim_end_matches('/').to_string())
}

/// Build a signed upload form
pub(crate) fn build_form(
    settings: &S3Settings,
    request: &UploadFormRequest,
    now: Timestamp,
) -> Result<UploadForm> {
    let policy = encode_policy(&policy_document(request, now)?);
    let signature = sign_policy(&settings.secret, &policy)?;

    let mut fields = vec![
        (
            "key".to_string(),
            format!("{}${{filename}}", request.key_prefix),
        ),
        ("AWSAccessKeyId".to_string(), settings.account.clone()),
        ("acl".to_string(), request.acl.clone()),
        (
            "success_action_redirect".to_string(),
            request.success_action_redirect.clone(),
        ),
    ];
    if let Some(actor) = &request.actor {
        fields.push((modified_by_field(), actor.clone()));
    }
    fields.push(("policy".to_string(), policy));
    fields.push(("signature".to_string(), signature));

    Ok(UploadForm {
        action: form_action(settings, &request.container)?,
        fields,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_year() -> Timestamp {
        Timestamp::from_second(1_767_225_600).unwrap()
    }

    fn decode(encoded: &str) -> Value {
        let bytes = BASE64.decode(encoded).unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_sign_policy_known_value() {
        let policy = "eyJjb25kaXRpb25zIjpbXSwiZXhwaXJhdGlvbiI6IjIwMjYtMDEtMDFUMDA6MDA6MDBaIn0=";
        assert_eq!(
            sign_policy("secret", policy).unwrap(),
            "N5IqzH9NFWlFeV5gCX/ZU85TojI="
        );
    }

    #[test]
    fn test_policy_document_conditions() {
        let mut request = UploadFormRequest::new("docs", "reports/", "https://example.com/done");
        request.actor = Some("alice".into());

        let policy = policy_document(&request, new_year()).unwrap();
        assert_eq!(policy["expiration"], "2026-01-01T01:00:00Z");

        let conditions = policy["conditions"].as_array().unwrap();
        assert_eq!(conditions[0], json!({ "bucket": "docs" }));
        assert_eq!(conditions[1], json!(["starts-with", "$key", "reports/"]));
        assert_eq!(conditions[2], json!({ "acl": "public-read" }));
        assert_eq!(
            conditions[3],
            json!({ "success_action_redirect": "https://example.com/done" })
        );
        assert_eq!(conditions[4], json!({ "x-amz-meta-modified-by": "alice" }));
    }

    #[test]
    fn test_build_form_fields() {
        let settings = S3Settings::new("AKID", "secret");
        let request = UploadFormRequest::new("docs", "reports/", "https://example.com/done");

        let form = build_form(&settings, &request, new_year()).unwrap();
        assert_eq!(form.action, "https://docs.s3.amazonaws.com");
        assert_eq!(form.field("key"), Some("reports/${filename}"));
        assert_eq!(form.field("AWSAccessKeyId"), Some("AKID"));
        assert_eq!(form.field("acl"), Some("public-read"));
        assert_eq!(form.field("x-amz-meta-modified-by"), None);

        let policy = form.field("policy").unwrap();
        assert_eq!(decode(policy)["conditions"].as_array().unwrap().len(), 4);
        assert_eq!(
            form.field("signature").unwrap(),
            sign_policy("secret", policy).unwrap()
        );
    }

    #[test]
    fn test_form_action_for_custom_endpoint() {
        let mut settings = S3Settings::new("AKID", "secret");
        settings.endpoint = Some("http://localhost:9000".into());
        settings.path_style = true;
        assert_eq!(
            form_action(&settings, "docs").unwrap(),
            "http://localhost:9000/docs"
        );

        settings.path_style = false;
        settings.endpoint = Some("https://storage.example.com".into());
        assert_eq!(
            form_action(&settings, "docs").unwrap(),
            "https://docs.storage.example.com"
        );
    }
}
