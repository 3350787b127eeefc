use crate::common::{Scripted, Step};
use httpmock::Method::GET;
use pandora_http::{CacheMode, Payload, RequestOptions};
use serde_json::json;
use std::time::Duration;

#[tokio::test]
async fn get_serves_from_cache_on_second_call() {
    let server = crate::common::setup_server();

    // This mock only expects to be called ONCE.
    let mock = server.mock(|when, then| {
        when.method(GET).path("/api/prompts");
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"[{"id":1,"title":"Haiku"}]"#);
    });

    let client = crate::common::client_for(&server).build().unwrap();

    let first = client.get("/prompts", RequestOptions::new()).await.unwrap();
    mock.assert_calls(1);

    let second = client.get("prompts", RequestOptions::new()).await.unwrap();
    mock.assert_calls(1);

    assert_eq!(first, second);
    assert_eq!(first, Payload::Json(json!([{ "id": 1, "title": "Haiku" }])));
    assert_eq!(client.cached_entries().await, 1);
}

#[tokio::test]
async fn expired_entry_triggers_a_new_call() {
    let server = crate::common::setup_server();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/api/tags");
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"["poetry"]"#);
    });

    let client = crate::common::client_for(&server)
        .cache_ttl(Duration::from_millis(50))
        .build()
        .unwrap();

    client.get("/tags", RequestOptions::new()).await.unwrap();
    client.get("/tags", RequestOptions::new()).await.unwrap();
    mock.assert_calls(1);

    tokio::time::sleep(Duration::from_millis(120)).await;
    assert_eq!(client.cached_entries().await, 0);

    client.get("/tags", RequestOptions::new()).await.unwrap();
    mock.assert_calls(2);
}

#[tokio::test]
async fn skip_cache_always_hits_network_and_never_stores() {
    let server = crate::common::setup_server();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/api/projects");
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"projects":[]}"#);
    });

    let client = crate::common::client_for(&server).build().unwrap();

    client.get("/projects", RequestOptions::new()).await.unwrap();
    mock.assert_calls(1);

    // A live entry exists, but skip_cache must ignore it.
    client
        .get("/projects", RequestOptions::new().skip_cache())
        .await
        .unwrap();
    mock.assert_calls(2);

    client.clear_cache().await;
    client
        .get("/projects", RequestOptions::new().skip_cache())
        .await
        .unwrap();
    mock.assert_calls(3);
    assert_eq!(client.cached_entries().await, 0);

    // Nothing was stored by the bypassing call, so this one goes out too.
    client.get("/projects", RequestOptions::new()).await.unwrap();
    mock.assert_calls(4);
}

#[tokio::test]
async fn refresh_bypasses_cache_read_but_updates_cache() {
    let server = crate::common::setup_server();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/api/prompts/7");
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"id":7}"#);
    });

    let client = crate::common::client_for(&server).build().unwrap();

    client.get("/prompts/7", RequestOptions::new()).await.unwrap();
    mock.assert_calls(1);

    client
        .get("/prompts/7", RequestOptions::new().cache_mode(CacheMode::Refresh))
        .await
        .unwrap();
    mock.assert_calls(2);

    client.get("/prompts/7", RequestOptions::new()).await.unwrap();
    mock.assert_calls(2);
}

#[tokio::test]
async fn query_strings_are_part_of_the_cache_key() {
    let server = crate::common::setup_server();
    let page1 = server.mock(|when, then| {
        when.method(GET).path("/api/prompts").query_param("page", "1");
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"page":1}"#);
    });
    let page2 = server.mock(|when, then| {
        when.method(GET).path("/api/prompts").query_param("page", "2");
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"page":2}"#);
    });

    let client = crate::common::client_for(&server).build().unwrap();

    let a = client.get("/prompts?page=1", RequestOptions::new()).await.unwrap();
    let b = client.get("/prompts?page=2", RequestOptions::new()).await.unwrap();
    client.get("/prompts?page=1", RequestOptions::new()).await.unwrap();

    assert_ne!(a, b);
    page1.assert_calls(1);
    page2.assert_calls(1);
}

#[tokio::test]
async fn primed_entries_are_served_and_purged() {
    let server = crate::common::setup_server();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/api/settings");
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"theme":"dark"}"#);
    });

    let client = crate::common::client_for(&server).build().unwrap();

    client
        .prime_cache("/settings", Payload::Json(json!({ "theme": "light" })), Some(Duration::from_millis(40)))
        .await
        .unwrap();

    let primed = client.get("/settings", RequestOptions::new()).await.unwrap();
    assert_eq!(primed, Payload::Json(json!({ "theme": "light" })));
    mock.assert_calls(0);

    tokio::time::sleep(Duration::from_millis(80)).await;
    assert_eq!(client.purge_expired().await, 1);

    let fresh = client.get("/settings", RequestOptions::new()).await.unwrap();
    assert_eq!(fresh, Payload::Json(json!({ "theme": "dark" })));
    mock.assert_calls(1);
}

#[tokio::test]
async fn disabled_cache_still_fetches_every_time() {
    let server = crate::common::setup_server();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/api/prompts");
        then.status(200)
            .header("content-type", "application/json")
            .body("[]");
    });

    let client = crate::common::client_for(&server).disable_cache().build().unwrap();
    assert!(!client.cache_enabled());

    client.get("/prompts", RequestOptions::new()).await.unwrap();
    client.get("/prompts", RequestOptions::new()).await.unwrap();
    mock.assert_calls(2);
}

#[tokio::test]
async fn reads_during_a_refresh_get_the_refreshed_value() {
    let transport = Scripted::new([
        Step::json(200, r#"{"v":1}"#),
        Step::json(200, r#"{"v":2}"#).after(Duration::from_millis(150)),
    ]);
    let client = transport.client().build().unwrap();

    let cached = client.get("/stats", RequestOptions::new()).await.unwrap();
    assert_eq!(cached, Payload::Json(json!({ "v": 1 })));

    // A live v1 entry exists while the refresh is on the wire.
    let late = async {
        tokio::time::sleep(Duration::from_millis(30)).await;
        client.get("/stats", RequestOptions::new()).await
    };
    let (refreshed, joined) = tokio::join!(
        client.get("/stats", RequestOptions::new().cache_mode(CacheMode::Refresh)),
        late,
    );

    assert_eq!(refreshed.unwrap(), Payload::Json(json!({ "v": 2 })));
    assert_eq!(joined.unwrap(), Payload::Json(json!({ "v": 2 })));
    assert_eq!(transport.calls(), 2);

    let after = client.get("/stats", RequestOptions::new()).await.unwrap();
    assert_eq!(after, Payload::Json(json!({ "v": 2 })));
    assert_eq!(transport.calls(), 2);
}
