use std::time::{Duration, SystemTime};

use masstock_exec::retry::{parse_retry_after, parse_retry_after_value, RetryHeadersConfig};
use masstock_exec::retry::{RetryVendorHeader, VendorHeaderKind};
use reqwest::header::{HeaderMap, HeaderValue};

fn headers(pairs: &[(&'static str, String)]) -> HeaderMap {
    let mut map = HeaderMap::new();
    for (k, v) in pairs {
        map.insert(*k, HeaderValue::from_str(v).unwrap());
    }
    map
}

#[test]
fn parse_retry_after_delta_seconds() {
    let h = headers(&[("retry-after", "5".to_string())]);
    let result = parse_retry_after(&h, &RetryHeadersConfig::default(), SystemTime::now());
    assert_eq!(result, Some(Duration::from_secs(5)));
}

#[test]
fn parse_retry_after_http_date() {
    let future = SystemTime::now() + Duration::from_secs(10);
    let h = headers(&[("retry-after", httpdate::fmt_http_date(future))]);

    let delay = parse_retry_after(&h, &RetryHeadersConfig::default(), SystemTime::now()).unwrap();
    assert!(delay.as_secs() >= 8 && delay.as_secs() <= 11);
}

#[test]
fn parse_retry_after_value_rejects_garbage_and_past_dates() {
    let now = SystemTime::now();
    assert_eq!(parse_retry_after_value("soon", now), None);
    let past = httpdate::fmt_http_date(now - Duration::from_secs(60));
    assert_eq!(parse_retry_after_value(&past, now), None);
}

#[test]
fn default_vendor_header_is_unix_reset() {
    let future = SystemTime::now() + Duration::from_secs(15);
    let unix_secs = future
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap()
        .as_secs();
    let h = headers(&[("x-ratelimit-reset", unix_secs.to_string())]);

    let delay = parse_retry_after(&h, &RetryHeadersConfig::default(), SystemTime::now()).unwrap();
    assert!(delay.as_secs() >= 13 && delay.as_secs() <= 16);
}

#[test]
fn custom_vendor_header_delta_seconds() {
    let h = headers(&[("x-custom-retry", "7".to_string())]);
    let cfg = RetryHeadersConfig {
        vendor_headers: vec![RetryVendorHeader {
            name: "X-Custom-Retry".to_string(),
            kind: VendorHeaderKind::DeltaSeconds,
        }],
    };
    let result = parse_retry_after(&h, &cfg, SystemTime::now());
    assert_eq!(result, Some(Duration::from_secs(7)));
}

#[test]
fn standard_header_takes_precedence() {
    let h = headers(&[
        ("retry-after", "2".to_string()),
        ("x-custom-retry", "10".to_string()),
    ]);
    let cfg = RetryHeadersConfig {
        vendor_headers: vec![RetryVendorHeader {
            name: "x-custom-retry".to_string(),
            kind: VendorHeaderKind::DeltaSeconds,
        }],
    };
    let result = parse_retry_after(&h, &cfg, SystemTime::now());
    assert_eq!(result, Some(Duration::from_secs(2)));
}

#[test]
fn missing_headers_yield_none() {
    let result = parse_retry_after(&HeaderMap::new(), &RetryHeadersConfig::default(), SystemTime::now());
    assert!(result.is_none());
}
