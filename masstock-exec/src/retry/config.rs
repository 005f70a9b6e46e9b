use std::time::Duration;

/// Backoff between attempts of one execution.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub base_delay: Duration,
    pub factor: f64,
    pub max_delay: Duration,
    pub headers: RetryHeadersConfig,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(1000),
            factor: 2.0,
            max_delay: Duration::from_secs(60),
            headers: RetryHeadersConfig::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RetryHeadersConfig {
    /// Non-standard rate-limit headers some generation providers send
    /// instead of `Retry-After`.
    pub vendor_headers: Vec<RetryVendorHeader>,
}

impl Default for RetryHeadersConfig {
    fn default() -> Self {
        Self {
            vendor_headers: vec![RetryVendorHeader {
                name: "x-ratelimit-reset".to_string(),
                kind: VendorHeaderKind::UnixSeconds,
            }],
        }
    }
}

#[derive(Debug, Clone)]
pub struct RetryVendorHeader {
    pub name: String,
    pub kind: VendorHeaderKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VendorHeaderKind {
    /// delta seconds
    DeltaSeconds,
    /// unix epoch seconds
    UnixSeconds,
    /// HTTP-date
    HttpDate,
}
