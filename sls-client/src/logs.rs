//! PutLogs endpoint

use async_trait::async_trait;
use chrono::Utc;
use prost::Message;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, DATE};
use sls_core::dto::put_logs::PutLogsRequest;
use std::collections::BTreeMap;
use tracing::debug;

use crate::error::Result;
use crate::proto::LogGroup;
use crate::signature::{SignedRequest, content_md5};
use crate::{DeliveryClient, SlsClient};

const PROTOBUF_CONTENT_TYPE: &str = "application/x-protobuf";
const SIGNATURE_METHOD: &str = "hmac-sha1";

impl SlsClient {
    /// Send one log group to a logstore
    ///
    /// The logstore picks the shard (`shards/lb`). An empty request is a
    /// no-op and never reaches the network.
    ///
    /// # Arguments
    /// * `request` - Target project/logstore, topic and the records to ship
    pub async fn send_log_group(&self, request: &PutLogsRequest) -> Result<()> {
        if request.is_empty() {
            return Ok(());
        }

        let body = LogGroup::from(request).encode_to_vec();
        let resource = format!("/logstores/{}/shards/lb", request.logstore);
        let url = format!("{}{}", self.project_url(&request.project), resource);

        let date = Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string();
        let md5 = content_md5(&body);
        let log_headers = BTreeMap::from([
            ("x-log-apiversion".to_string(), self.api_version.clone()),
            ("x-log-bodyrawsize".to_string(), body.len().to_string()),
            ("x-log-signaturemethod".to_string(), SIGNATURE_METHOD.to_string()),
        ]);

        let signature = SignedRequest {
            verb: "POST",
            content_md5: &md5,
            content_type: PROTOBUF_CONTENT_TYPE,
            date: &date,
            headers: &log_headers,
            resource: &resource,
        }
        .sign(&self.access_key_secret)?;

        let mut builder = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, PROTOBUF_CONTENT_TYPE)
            .header("Content-MD5", md5)
            .header(DATE, date)
            .header(
                AUTHORIZATION,
                format!("LOG {}:{}", self.access_key_id, signature),
            );
        for (name, value) in &log_headers {
            builder = builder.header(name, value);
        }

        debug!(
            "Posting {} log(s) to {}/{}",
            request.len(),
            request.project,
            request.logstore
        );

        let response = builder.body(body).send().await?;

        self.handle_empty_response(response).await
    }
}

#[async_trait]
impl DeliveryClient for SlsClient {
    async fn put_logs(&self, request: PutLogsRequest) -> Result<()> {
        self.send_log_group(&request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ClientError, ClientOptions};
    use mockito::{Matcher, Server};
    use sls_core::domain::record::{BatchedRecord, Content};

    fn request(logs: Vec<BatchedRecord>) -> PutLogsRequest {
        PutLogsRequest {
            project: "demo".to_string(),
            logstore: "app".to_string(),
            topic: Some("web".to_string()),
            logs,
        }
    }

    fn client_for(server: &Server) -> SlsClient {
        SlsClient::new(ClientOptions::new("mock-ak", "mock-secret", server.url())).unwrap()
    }

    #[tokio::test]
    async fn test_put_logs_sends_signed_protobuf() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/logstores/app/shards/lb")
            .match_header("content-type", PROTOBUF_CONTENT_TYPE)
            .match_header("x-log-apiversion", "0.6.0")
            .match_header("x-log-signaturemethod", SIGNATURE_METHOD)
            .match_header("x-log-bodyrawsize", Matcher::Regex(r"^[1-9][0-9]*$".into()))
            .match_header("content-md5", Matcher::Regex(r"^[0-9A-F]{32}$".into()))
            .match_header("authorization", Matcher::Regex(r"^LOG mock-ak:.+=$".into()))
            .with_status(200)
            .create_async()
            .await;

        let client = client_for(&server);
        let result = client
            .put_logs(request(vec![BatchedRecord::new(
                1_700_000_000,
                vec![Content::new("_message", "hello")],
            )]))
            .await;

        assert!(result.is_ok());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_put_logs_reports_api_error() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/logstores/app/shards/lb")
            .with_status(401)
            .with_body(r#"{"errorCode":"Unauthorized"}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let err = client
            .put_logs(request(vec![BatchedRecord::new(1, vec![])]))
            .await
            .unwrap_err();

        match err {
            ClientError::ApiError { status, message } => {
                assert_eq!(status, 401);
                assert!(message.contains("Unauthorized"));
            }
            other => panic!("unexpected error: {other}"),
        }
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_empty_request_skips_network() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let client = client_for(&server);
        assert!(client.put_logs(request(vec![])).await.is_ok());
        mock.assert_async().await;
    }
}
