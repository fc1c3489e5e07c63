use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::{Method, Request, StatusCode, Uri, header};
use hyper_util::client::legacy::{Client, connect::HttpConnector};
use hyper_util::rt::TokioExecutor;
use serde::Deserialize;

use super::{EmotionClassifier, EmotionPrediction};
use crate::error::ClassificationError;

type HttpClient = Client<hyper_tls::HttpsConnector<HttpConnector>, Full<Bytes>>;

fn create_client() -> HttpClient {
    let https = hyper_tls::HttpsConnector::new();
    Client::builder(TokioExecutor::new()).build(https)
}

#[derive(Debug, Deserialize)]
struct ClassifierResponse {
    #[serde(alias = "emotion", alias = "prediction")]
    label: String,
    confidence: f64,
}

#[derive(Debug, Deserialize)]
struct ClassifierErrorBody {
    error: String,
}

/// Posts raw image bytes to a model service and reads back `{label, confidence}`.
pub struct HttpClassifier {
    client: HttpClient,
    endpoint: Uri,
}

impl HttpClassifier {
    pub fn new(endpoint: &str) -> anyhow::Result<Self> {
        let endpoint: Uri = endpoint
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid CLASSIFIER_URL {}: {}", endpoint, e))?;

        Ok(Self {
            client: create_client(),
            endpoint,
        })
    }
}

#[async_trait]
impl EmotionClassifier for HttpClassifier {
    async fn classify(&self, image: &[u8]) -> Result<EmotionPrediction, ClassificationError> {
        let req = Request::builder()
            .method(Method::POST)
            .uri(self.endpoint.clone())
            .header(header::CONTENT_TYPE, "application/octet-stream")
            .header(header::ACCEPT, "application/json")
            .body(Full::new(Bytes::copy_from_slice(image)))
            .map_err(|e| ClassificationError::Unavailable(e.to_string()))?;

        let response = self
            .client
            .request(req)
            .await
            .map_err(|e| ClassificationError::Unavailable(e.to_string()))?;

        let status = response.status();
        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|e| ClassificationError::Unavailable(e.to_string()))?
            .to_bytes();

        interpret_response(status, &body)
    }
}

fn interpret_response(status: StatusCode, body: &[u8]) -> Result<EmotionPrediction, ClassificationError> {
    if status.is_client_error() {
        let message = serde_json::from_slice::<ClassifierErrorBody>(body)
            .map(|b| b.error)
            .unwrap_or_else(|_| status.to_string());
        return Err(ClassificationError::Rejected(message));
    }

    if !status.is_success() {
        return Err(ClassificationError::Unavailable(format!(
            "classifier responded with {}",
            status
        )));
    }

    let parsed: ClassifierResponse = serde_json::from_slice(body)
        .map_err(|e| ClassificationError::InvalidResponse(e.to_string()))?;

    let label = parsed.label.trim();
    if label.is_empty() {
        return Err(ClassificationError::InvalidResponse(
            "empty emotion label".to_string(),
        ));
    }

    Ok(EmotionPrediction {
        label: label.to_string(),
        confidence: parsed.confidence,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::tests::JPEG_BYTES;
    use axum::{Json, Router, http::HeaderMap, routing::post};
    use serde_json::json;
    use tokio::net::TcpListener;

    #[test]
    fn success_body_is_parsed() {
        let prediction =
            interpret_response(StatusCode::OK, br#"{"label":"happy","confidence":0.87}"#).unwrap();
        assert_eq!(prediction.label, "happy");
        assert_eq!(prediction.confidence, 0.87);
    }

    #[test]
    fn emotion_key_is_accepted_as_label() {
        let prediction =
            interpret_response(StatusCode::OK, br#"{"emotion":"sad","confidence":42}"#).unwrap();
        assert_eq!(prediction.label, "sad");
        assert_eq!(prediction.confidence, 42.0);
    }

    #[test]
    fn client_error_carries_service_message() {
        let err = interpret_response(StatusCode::BAD_REQUEST, br#"{"error":"no face found"}"#)
            .unwrap_err();
        match err {
            ClassificationError::Rejected(message) => assert_eq!(message, "no face found"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn server_error_means_unavailable() {
        let err = interpret_response(StatusCode::SERVICE_UNAVAILABLE, b"").unwrap_err();
        assert!(matches!(err, ClassificationError::Unavailable(_)));
    }

    #[test]
    fn garbage_body_is_invalid_response() {
        let err = interpret_response(StatusCode::OK, b"<html>").unwrap_err();
        assert!(matches!(err, ClassificationError::InvalidResponse(_)));
    }

    #[test]
    fn blank_label_is_invalid_response() {
        let err =
            interpret_response(StatusCode::OK, br#"{"label":"  ","confidence":0.5}"#).unwrap_err();
        assert!(matches!(err, ClassificationError::InvalidResponse(_)));
    }

    #[test]
    fn invalid_endpoint_is_rejected() {
        assert!(HttpClassifier::new("not a url").is_err());
    }

    /// Answers `/predict` with a confidence of one hundredth per received byte.
    async fn echo_predict(headers: HeaderMap, body: Bytes) -> (StatusCode, Json<serde_json::Value>) {
        let content_type = headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        if content_type != "application/octet-stream" {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": format!("unexpected content type {content_type}") })),
            );
        }

        (
            StatusCode::OK,
            Json(json!({ "label": "happy", "confidence": body.len() as f64 / 100.0 })),
        )
    }

    async fn unavailable_predict() -> StatusCode {
        StatusCode::SERVICE_UNAVAILABLE
    }

    async fn spawn_service(app: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/predict")
    }

    #[tokio::test]
    async fn posts_image_bytes_and_reads_prediction() {
        let url = spawn_service(Router::new().route("/predict", post(echo_predict))).await;
        let classifier = HttpClassifier::new(&url).unwrap();

        let prediction = classifier.classify(JPEG_BYTES).await.unwrap();
        assert_eq!(prediction.label, "happy");
        assert!((prediction.confidence - JPEG_BYTES.len() as f64 / 100.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn service_error_status_means_unavailable() {
        let url = spawn_service(Router::new().route("/predict", post(unavailable_predict))).await;
        let classifier = HttpClassifier::new(&url).unwrap();

        let err = classifier.classify(JPEG_BYTES).await.unwrap_err();
        assert!(matches!(err, ClassificationError::Unavailable(_)));
    }

    #[tokio::test]
    async fn closed_port_means_unavailable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let classifier = HttpClassifier::new(&format!("http://{addr}/predict")).unwrap();
        let err = classifier.classify(JPEG_BYTES).await.unwrap_err();
        assert!(matches!(err, ClassificationError::Unavailable(_)));
    }
}
