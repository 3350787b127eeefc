use httpmock::Method::{GET, PUT};
use pandora_http::RequestOptions;
use reqwest::header::{ACCEPT, HeaderName, HeaderValue};
use serde_json::json;

#[tokio::test]
async fn default_headers_are_sent() {
    let server = crate::common::setup_server();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/api/prompts")
            .header("accept", "application/json")
            .header("x-requested-with", "XMLHttpRequest")
            .header("x-client", "pandora-ui");
        then.status(200)
            .header("content-type", "application/json")
            .body("[]");
    });

    let client = crate::common::client_for(&server)
        .default_header("X-Client", "pandora-ui")
        .build()
        .unwrap();
    client.get("/prompts", RequestOptions::new()).await.unwrap();
    mock.assert_calls(1);
}

#[tokio::test]
async fn writes_send_json_and_call_headers_override_defaults() {
    let server = crate::common::setup_server();
    let mock = server.mock(|when, then| {
        when.method(PUT)
            .path("/api/prompts/4")
            .header("content-type", "application/json")
            .header("accept", "application/vnd.pandora+json")
            .header("x-trace", "abc")
            .json_body(json!({ "title": "Ode", "favorite": true }));
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"id":4}"#);
    });

    let client = crate::common::client_for(&server).build().unwrap();
    let opts = RequestOptions::new()
        .header(ACCEPT, HeaderValue::from_static("application/vnd.pandora+json"))
        .header(HeaderName::from_static("x-trace"), HeaderValue::from_static("abc"));

    client
        .put("/prompts/4", &json!({ "title": "Ode", "favorite": true }), opts)
        .await
        .unwrap();
    mock.assert_calls(1);
}
