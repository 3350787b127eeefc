use pandora_http::{ApiClient, ApiError, Backoff, RetryConfig};
use std::time::Duration;
use url::Url;

#[test]
fn defaults_match_documented_values() {
    let client = ApiClient::builder().build().unwrap();
    let cfg = client.config();

    assert_eq!(cfg.base_url.as_str(), "http://127.0.0.1:8000/api");
    assert_eq!(cfg.timeout, Duration::from_secs(30));
    assert_eq!(cfg.cache_ttl, Some(Duration::from_secs(60)));
    assert_eq!(cfg.retry.max_attempts, 3);
    assert_eq!(cfg.retry.backoff.delay_for(0), Duration::from_millis(1000));
    assert_eq!(cfg.retry.backoff.delay_for(1), Duration::from_millis(2000));
    assert!(client.cache_enabled());
    assert_eq!(client.in_flight(), 0);
}

#[test]
fn invalid_settings_are_rejected() {
    let cases = [
        ApiClient::builder().timeout(Duration::ZERO).build(),
        ApiClient::builder().retry_attempts(0).build(),
        ApiClient::builder().cache_ttl(Duration::ZERO).build(),
        ApiClient::builder()
            .base_url(Url::parse("ftp://files.example.com/api").unwrap())
            .build(),
        ApiClient::builder().default_header("bad header", "x").build(),
        ApiClient::builder()
            .retry_config(RetryConfig {
                max_attempts: 2,
                backoff: Backoff::Exponential {
                    base: Duration::from_millis(10),
                    factor: 0.5,
                    max: Duration::from_secs(1),
                },
            })
            .build(),
    ];
    for case in cases {
        assert!(matches!(case, Err(ApiError::Config(_))), "got {case:?}");
    }
}

#[test]
fn retry_delay_keeps_the_backoff_shape() {
    let client = ApiClient::builder()
        .retry_config(RetryConfig {
            max_attempts: 4,
            backoff: Backoff::Fixed(Duration::from_millis(5)),
        })
        .retry_delay(Duration::from_millis(20))
        .build()
        .unwrap();
    assert_eq!(client.config().retry.max_attempts, 4);
    assert_eq!(client.config().retry.backoff, Backoff::Fixed(Duration::from_millis(20)));

    let client = ApiClient::builder()
        .retry_delay(Duration::from_millis(250))
        .build()
        .unwrap();
    assert_eq!(client.config().retry.backoff.delay_for(2), Duration::from_millis(1000));
}

#[test]
fn endpoints_resolve_against_the_base() {
    let client = ApiClient::builder()
        .base_url(Url::parse("https://pandora.example.com/api/").unwrap())
        .build()
        .unwrap();

    let expect = "https://pandora.example.com/api/prompts?tag=poetry";
    assert_eq!(client.resolve("/prompts?tag=poetry").unwrap().as_str(), expect);
    assert_eq!(client.resolve("prompts?tag=poetry").unwrap().as_str(), expect);
    assert_eq!(
        client.resolve("http://other.example.com/x").unwrap().as_str(),
        "http://other.example.com/x"
    );
    assert!(matches!(client.resolve("http://"), Err(ApiError::InvalidUrl(_))));
}

#[test]
fn disable_cache_then_ttl_reenables() {
    let off = ApiClient::builder().disable_cache().build().unwrap();
    assert_eq!(off.config().cache_ttl, None);

    let on = ApiClient::builder()
        .disable_cache()
        .cache_ttl(Duration::from_secs(5))
        .build()
        .unwrap();
    assert_eq!(on.config().cache_ttl, Some(Duration::from_secs(5)));
}
