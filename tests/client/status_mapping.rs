use httpmock::Method::{DELETE, GET};
use pandora_http::{ApiError, RequestOptions};

#[tokio::test]
async fn not_found_is_not_retried() {
    let server = crate::common::setup_server();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/api/prompts/404");
        then.status(404)
            .header("content-type", "application/json")
            .body(r#"{"detail":"Not found"}"#);
    });

    let client = crate::common::client_for(&server).build().unwrap();
    let err = client.get("/prompts/404", RequestOptions::new()).await.unwrap_err();

    mock.assert_calls(1);
    match err {
        ApiError::Client { status, url, body } => {
            assert_eq!(status, 404);
            assert!(url.ends_with("/api/prompts/404"));
            assert!(body.contains("Not found"));
        }
        other => panic!("expected Client error, got {other:?}"),
    }
}

#[tokio::test]
async fn unprocessable_write_is_not_retried() {
    let server = crate::common::setup_server();
    let mock = server.mock(|when, then| {
        when.method(DELETE).path("/api/projects/3");
        then.status(422).body("locked");
    });

    let client = crate::common::client_for(&server).build().unwrap();
    let err = client.delete("/projects/3", RequestOptions::new()).await.unwrap_err();

    mock.assert_calls(1);
    assert_eq!(err.status(), Some(422));
    assert_eq!(err.attempts(), 1);
    assert!(!err.is_retryable());
}

#[test]
fn classification_table() {
    let url = || "http://h/api".to_string();
    let retryable = [
        ApiError::Timeout { url: url(), attempts: 1 },
        ApiError::NetworkUnavailable { url: url(), message: "refused".into(), attempts: 1 },
        ApiError::Server { status: 500, url: url(), attempts: 1 },
        ApiError::Server { status: 599, url: url(), attempts: 1 },
    ];
    let terminal = [
        ApiError::Client { status: 400, url: url(), body: String::new() },
        ApiError::Client { status: 499, url: url(), body: String::new() },
        ApiError::UnexpectedStatus { status: 304, url: url() },
        ApiError::Parse { url: url(), message: "eof".into() },
        ApiError::Aborted,
        ApiError::Encode("bad".into()),
        ApiError::Config("bad".into()),
    ];
    assert!(retryable.iter().all(ApiError::is_retryable));
    assert!(!terminal.iter().any(ApiError::is_retryable));
}
