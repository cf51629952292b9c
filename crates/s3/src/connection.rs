//! S3 connection
//!
//! The SDK client is built on first use and shared by every container
//! opened through the connection.

use std::sync::Arc;

use async_trait::async_trait;
use bv_core::config::S3Settings;
use bv_core::{
    Connection, Container, ContainerPolicy, Result, UploadForm, UploadFormRequest,
};
use jiff::Timestamp;
use tokio::sync::OnceCell;

use crate::container::{MAX_LIST, S3Container};
use crate::error::NativeError;
use crate::upload;

/// State shared between a connection and its containers
pub(crate) struct Session {
    settings: S3Settings,
    policy: ContainerPolicy,
    client: OnceCell<aws_sdk_s3::Client>,
}

impl Session {
    pub(crate) fn new(settings: S3Settings, policy: ContainerPolicy) -> Self {
        Self {
            settings,
            policy,
            client: OnceCell::new(),
        }
    }

    /// The SDK client, built on first call
    pub(crate) async fn client(&self) -> &aws_sdk_s3::Client {
        self.client
            .get_or_init(|| build_client(&self.settings))
            .await
    }
}

async fn build_client(settings: &S3Settings) -> aws_sdk_s3::Client {
    let credentials = aws_credential_types::Credentials::new(
        settings.account.clone(),
        settings.secret.clone(),
        None, // session token
        None, // expiry
        "bv-static-credentials",
    );

    let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .credentials_provider(credentials)
        .region(aws_config::Region::new(settings.region.clone()));
    if let Some(endpoint) = &settings.endpoint {
        loader = loader.endpoint_url(endpoint);
    }
    let config = loader.load().await;

    let s3_config = aws_sdk_s3::config::Builder::from(&config)
        .force_path_style(settings.path_style)
        .build();
    tracing::debug!(
        region = %settings.region,
        endpoint = settings.endpoint.as_deref().unwrap_or("aws"),
        "Built S3 client"
    );
    aws_sdk_s3::Client::from_conf(s3_config)
}

/// Connection to an S3-compatible service
pub struct S3Connection {
    session: Arc<Session>,
}

impl S3Connection {
    /// Create a connection; nothing is contacted until the first request
    pub fn new(settings: S3Settings, policy: ContainerPolicy) -> Self {
        Self {
            session: Arc::new(Session::new(settings, policy)),
        }
    }

    /// Settings this connection was built from
    pub fn settings(&self) -> &S3Settings {
        &self.session.settings
    }
}

#[async_trait]
impl Connection for S3Connection {
    fn account(&self) -> Option<&str> {
        Some(&self.session.settings.account)
    }

    fn policy(&self) -> &ContainerPolicy {
        &self.session.policy
    }

    fn max_list(&self) -> Option<usize> {
        Some(MAX_LIST)
    }

    async fn list_containers(&self) -> Result<Vec<Arc<dyn Container>>> {
        let client = self.session.client().await;
        let response = client
            .list_buckets()
            .send()
            .await
            .map_err(|e| NativeError::from(e).into_service_error())?;

        Ok(response
            .buckets()
            .iter()
            .filter_map(|b| b.name())
            .map(|name| S3Container::new(self.session.clone(), name) as Arc<dyn Container>)
            .collect())
    }

    async fn open_container(&self, name: &str) -> Result<Arc<dyn Container>> {
        let container = S3Container::new(self.session.clone(), name);
        container.bucket().await?;
        Ok(container as Arc<dyn Container>)
    }

    async fn upload_form(&self, request: &UploadFormRequest) -> Result<UploadForm> {
        // The bucket must exist before a form pointing at it is handed out.
        self.get_container(&request.container).await?;
        upload::build_form(&self.session.settings, request, Timestamp::now())
    }
}

#[cfg(test)]
mod tests {
    use bv_core::Error;

    use super::*;

    fn connection(policy: ContainerPolicy) -> S3Connection {
        S3Connection::new(S3Settings::new("AKID", "secret"), policy)
    }

    #[test]
    fn test_connection_reports_account_and_limits() {
        let conn = connection(ContainerPolicy::default());
        assert_eq!(conn.account(), Some("AKID"));
        assert_eq!(conn.max_list(), Some(MAX_LIST));
        assert_eq!(conn.settings().region, "us-east-1");
    }

    #[tokio::test]
    async fn test_denied_container_fails_before_any_request() {
        let conn = connection(ContainerPolicy {
            allow: Vec::new(),
            deny: vec!["secret".into()],
        });
        let err = conn.get_container("secret").await.err().unwrap();
        assert!(matches!(err, Error::NotPermitted(_)));

        let request = UploadFormRequest::new("secret", "", "https://example.com/done");
        let err = conn.upload_form(&request).await.unwrap_err();
        assert!(matches!(err, Error::NotPermitted(_)));
    }
}
