use super::*;
use crate::settings;
use async_trait::async_trait;
use ccapi_auth_core::AuthError;
use parking_lot::Mutex;
use pretty_assertions::assert_eq;

/// Answers every request with the same response and records what was sent.
struct RecordingExecutor {
    response: CameraResponse,
    requests: Mutex<Vec<CameraRequest>>,
}

impl RecordingExecutor {
    fn answering(status: u16, body: &str) -> Self {
        RecordingExecutor {
            response: CameraResponse::new(status).with_body(body.as_bytes().to_vec()),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn last(&self) -> CameraRequest {
        self.requests.lock().last().cloned().unwrap()
    }
}

#[async_trait]
impl RequestExecutor for RecordingExecutor {
    async fn execute(
        &self,
        request: &CameraRequest,
        _authorization: Option<&str>,
    ) -> ccapi_auth_core::Result<CameraResponse> {
        self.requests.lock().push(request.clone());
        Ok(self.response.clone())
    }
}

fn client(executor: Arc<RecordingExecutor>) -> CameraClient<Arc<RecordingExecutor>> {
    let config = ClientConfig::new().with_credentials("admin", "canon");
    CameraClient::with_executor("https://192.168.1.2:443/ccapi", &config, executor).unwrap()
}

#[test]
fn test_base_url_is_normalized() {
    let executor = Arc::new(RecordingExecutor::answering(200, "{}"));
    let client = client(executor);
    assert_eq!(client.base_url().as_str(), "https://192.168.1.2/ccapi/");
}

#[test]
fn test_endpoint_resolution() {
    let client = client(Arc::new(RecordingExecutor::answering(200, "{}")));

    assert_eq!(
        client.endpoint_url("ver100/shooting/settings/iso").unwrap().as_str(),
        "https://192.168.1.2/ccapi/ver100/shooting/settings/iso"
    );
    assert_eq!(
        client.endpoint_url("/ver100/contents?type=jpeg").unwrap().as_str(),
        "https://192.168.1.2/ccapi/ver100/contents?type=jpeg"
    );
    assert_eq!(client.endpoint_url("").unwrap().as_str(), "https://192.168.1.2/ccapi");
}

#[test]
fn test_endpoints_cannot_escape_base() {
    let client = client(Arc::new(RecordingExecutor::answering(200, "{}")));

    for path in ["../admin", "ver100/../../etc", "http://elsewhere/ccapi"] {
        assert!(
            matches!(client.endpoint_url(path), Err(ClientError::InvalidEndpoint { .. })),
            "accepted {}",
            path
        );
    }
}

#[test]
fn test_invalid_base_url() {
    let config = ClientConfig::new();
    let executor = RecordingExecutor::answering(200, "{}");
    assert!(matches!(
        CameraClient::with_executor("mailto:camera", &config, executor),
        Err(ClientError::Config(_))
    ));
}

#[test]
fn test_new_requires_base_url() {
    assert!(matches!(
        CameraClient::new(&ClientConfig::new()),
        Err(ClientError::Config(_))
    ));
}

#[tokio::test]
async fn test_get_setting_uses_version_prefix() {
    let executor = Arc::new(RecordingExecutor::answering(
        200,
        r#"{"value":"1/250","ability":["1/125","1/250","1/500"]}"#,
    ));
    let client = client(executor.clone());

    let setting = client.get_setting(settings::TV).await.unwrap();
    assert_eq!(setting.value.as_deref(), Some("1/250"));
    assert!(setting.accepts("1/500"));

    let sent = executor.last();
    assert_eq!(sent.method, Method::GET);
    assert_eq!(sent.url.path(), "/ccapi/ver100/shooting/settings/tv");
    assert!(sent.body.is_none());
}

#[tokio::test]
async fn test_put_setting_sends_value_body() {
    let executor = Arc::new(RecordingExecutor::answering(200, r#"{"value":"800"}"#));
    let client = client(executor.clone());

    let setting = client.put_setting(settings::ISO, "800").await.unwrap();
    assert_eq!(setting.value.as_deref(), Some("800"));
    assert_eq!(setting.ability, None);

    let sent = executor.last();
    assert_eq!(sent.method, Method::PUT);
    assert_eq!(sent.body.as_deref(), Some(br#"{"value":"800"}"#.as_slice()));
    assert_eq!(sent.content_type.as_deref(), Some("application/json"));
}

#[tokio::test]
async fn test_accepted_with_empty_body() {
    let executor = Arc::new(RecordingExecutor::answering(202, ""));
    let client = client(executor);

    let setting = client.put_setting(settings::WHITE_BALANCE, "daylight").await.unwrap();
    assert_eq!(setting, SettingResponse::default());
}

#[tokio::test]
async fn test_non_json_body_is_decode_error() {
    let executor = Arc::new(RecordingExecutor::answering(200, "<html>busy</html>"));
    let client = client(executor);

    assert!(matches!(
        client.get_setting(settings::AV).await,
        Err(ClientError::Decode(_))
    ));
}

#[tokio::test]
async fn test_status_errors_surface_as_auth_errors() {
    let executor = Arc::new(RecordingExecutor::answering(503, ""));
    let client = client(executor);

    let err = tokio_test::assert_err!(client.get_setting(settings::ISO).await);
    assert!(matches!(err, ClientError::Auth(AuthError::UnexpectedStatusCode(503))));
    assert!(!err.is_auth_failure());
}

#[tokio::test]
async fn test_open_camera_needs_no_handshake() {
    let executor = Arc::new(RecordingExecutor::answering(200, "{}"));
    let client = client(executor.clone());

    tokio_test::assert_ok!(client.authenticate().await);
    assert!(!client.is_authenticated());
    assert_eq!(executor.last().url.as_str(), "https://192.168.1.2/ccapi");
}
