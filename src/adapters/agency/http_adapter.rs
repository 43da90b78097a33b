//! Agency HTTP adapter. Implements NotificationGateway by POSTing JSON to the agency endpoint.

use crate::domain::{ContentItem, DomainError, PointOfInterest};
use crate::ports::NotificationGateway;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::{info, warn};

/// Wire format of one notification.
#[derive(Debug, Serialize)]
struct NotificationBody<'a> {
    event: &'static str,
    content: &'a ContentItem,
    point_of_interest: &'a PointOfInterest,
}

/// Agency API adapter.
///
/// Sends `{"event": "content.inserted", "content": ..., "point_of_interest": ...}`.
/// A bearer token is attached when configured. The request timeout belongs to this
/// adapter; the workflow itself imposes none.
pub struct AgencyHttpAdapter {
    client: Client,
    url: String,
    token: Option<String>,
}

impl AgencyHttpAdapter {
    /// Create a new agency adapter.
    ///
    /// # Arguments
    /// * `url` - Endpoint receiving notifications
    /// * `token` - Optional bearer token
    /// * `timeout` - Per-request timeout
    pub fn new(url: String, token: Option<String>, timeout: Duration) -> Result<Self, DomainError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DomainError::Notify(format!("HTTP client setup failed: {}", e)))?;
        Ok(Self { client, url, token })
    }

    fn body<'a>(item: &'a ContentItem, poi: &'a PointOfInterest) -> NotificationBody<'a> {
        NotificationBody {
            event: "content.inserted",
            content: item,
            point_of_interest: poi,
        }
    }
}

#[async_trait::async_trait]
impl NotificationGateway for AgencyHttpAdapter {
    async fn notify(&self, item: &ContentItem, poi: &PointOfInterest) -> Result<(), DomainError> {
        let mut req = self.client.post(&self.url).json(&Self::body(item, poi));
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }

        let res = req
            .send()
            .await
            .map_err(|e| DomainError::Notify(format!("Request failed: {}", e)))?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_else(|_| "unknown".to_string());
            warn!(status = %status, content_id = item.id, "agency rejected notification");
            return Err(DomainError::Notify(format!(
                "Agency API error {}: {}",
                status,
                text.chars().take(200).collect::<String>()
            )));
        }

        info!(content_id = item.id, poi_id = %poi.id, "agency notified");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ImageDescriptor, MimeType};
    use chrono::Utc;

    fn sample() -> (ContentItem, PointOfInterest) {
        let item = ContentItem {
            id: 3,
            point_of_interest_id: "poi-9".into(),
            descriptor: ImageDescriptor {
                byte_size: 2048,
                width: 300,
                height: 150,
                mime_type: MimeType::Png,
            },
            created_at: Utc::now(),
        };
        let poi = PointOfInterest {
            id: "poi-9".into(),
            name: "Lighthouse".into(),
            max_content_count: 4,
            current_content_count: 1,
        };
        (item, poi)
    }

    #[test]
    fn test_body_shape() {
        let (item, poi) = sample();
        let json = serde_json::to_value(AgencyHttpAdapter::body(&item, &poi)).unwrap();
        assert_eq!(json["event"], "content.inserted");
        assert_eq!(json["content"]["id"], 3);
        assert_eq!(json["content"]["descriptor"]["mime_type"], "png");
        assert_eq!(json["point_of_interest"]["current_content_count"], 1);
    }

    #[tokio::test]
    async fn test_unreachable_agency_maps_to_notify_error() {
        let (item, poi) = sample();
        // Port 9 (discard) is closed on loopback; the connect is refused.
        let adapter = AgencyHttpAdapter::new(
            "http://127.0.0.1:9/notify".into(),
            None,
            Duration::from_secs(2),
        )
        .unwrap();
        let err = adapter.notify(&item, &poi).await.unwrap_err();
        assert!(matches!(err, DomainError::Notify(_)));
    }

    /// Accepts one connection, captures the raw request, answers 503.
    async fn unavailable_agency() -> (String, tokio::task::JoinHandle<String>) {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/notify", listener.local_addr().unwrap());
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut raw = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                raw.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&raw).to_string();
                if let Some(end) = text.find("\r\n\r\n") {
                    let body_len = text[..end]
                        .lines()
                        .find_map(|l| {
                            let (name, value) = l.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);
                    if raw.len() >= end + 4 + body_len {
                        break;
                    }
                }
            }
            let body = "agency down";
            let response = format!(
                "HTTP/1.1 503 Service Unavailable\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            String::from_utf8_lossy(&raw).to_string()
        });
        (url, handle)
    }

    #[tokio::test]
    async fn test_non_success_status_maps_to_notify_error() {
        let (item, poi) = sample();
        let (url, server) = unavailable_agency().await;
        let adapter =
            AgencyHttpAdapter::new(url, Some("s3cret".into()), Duration::from_secs(5)).unwrap();

        let err = adapter.notify(&item, &poi).await.unwrap_err();
        let DomainError::Notify(msg) = err else {
            panic!("expected Notify, got {:?}", err);
        };
        assert!(msg.contains("503"), "message: {}", msg);
        assert!(msg.contains("agency down"), "message: {}", msg);

        let request = server.await.unwrap().to_lowercase();
        assert!(request.starts_with("post /notify"));
        assert!(request.contains("authorization: bearer s3cret"));
        assert!(request.contains("content.inserted"));
    }
}
