use std::time::{Duration, SystemTime};

use httpdate::parse_http_date;
use reqwest::header::{HeaderMap, RETRY_AFTER};

use crate::retry::config::{RetryHeadersConfig, VendorHeaderKind};

/// Wait hint from a generation response: `Retry-After` first, then the
/// configured vendor headers.
pub fn parse_retry_after(
    headers: &HeaderMap,
    cfg: &RetryHeadersConfig,
    now: SystemTime,
) -> Option<Duration> {
    if let Some(v) = header_str(headers, RETRY_AFTER.as_str()) {
        if let Some(d) = parse_retry_after_value(v, now) {
            return Some(d);
        }
    }

    for vh in &cfg.vendor_headers {
        if let Some(v) = header_str(headers, &vh.name) {
            if let Some(d) = parse_vendor_value(v, vh.kind, now) {
                return Some(d);
            }
        }
    }
    None
}

/// `Retry-After` is either delta seconds or an HTTP-date.
pub fn parse_retry_after_value(v: &str, now: SystemTime) -> Option<Duration> {
    let v = v.trim();
    if let Ok(secs) = v.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }
    let dt = parse_http_date(v).ok()?;
    dt.duration_since(now).ok()
}

fn parse_vendor_value(v: &str, kind: VendorHeaderKind, now: SystemTime) -> Option<Duration> {
    let v = v.trim();
    match kind {
        VendorHeaderKind::DeltaSeconds => v.parse::<u64>().ok().map(Duration::from_secs),
        VendorHeaderKind::UnixSeconds => {
            let ts = v.parse::<u64>().ok()?;
            let dt = SystemTime::UNIX_EPOCH + Duration::from_secs(ts);
            dt.duration_since(now).ok()
        }
        VendorHeaderKind::HttpDate => {
            let dt = parse_http_date(v).ok()?;
            dt.duration_since(now).ok()
        }
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
