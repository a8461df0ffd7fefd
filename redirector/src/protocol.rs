//! Protocol resolution for redirect targets.
//!
//! Decides whether a response should use HTTPS. The SSL-upgrade policy has
//! two exemptions: traffic already forced through the platform's internal
//! termination proxy (detected via a `Via` header marker) must not be
//! redirected a second time, and `/robots.txt` stays reachable over plain
//! HTTP so crawler access is never broken by the upgrade.

use http::header::VIA;

use crate::inputs::{PlatformConfig, RequestInfo, Scheme};

/// Marker substring the internal termination proxy stamps into `Via`
pub const PROXY_VIA_MARKER: &str = "sharetribe_proxy";

const ROBOTS_PATH: &str = "/robots.txt";

/// Resolves the scheme the response should use
pub fn resolve_protocol(request: &RequestInfo, configs: &PlatformConfig) -> Scheme {
    if should_use_https(request, configs) {
        Scheme::Https
    } else {
        request.scheme
    }
}

/// True iff the SSL-upgrade policy applies to this request
pub fn should_use_https(request: &RequestInfo, configs: &PlatformConfig) -> bool {
    configs.always_use_ssl && !from_termination_proxy(request) && request.fullpath != ROBOTS_PATH
}

fn from_termination_proxy(request: &RequestInfo) -> bool {
    request
        .headers
        .get(VIA)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.contains(PROXY_VIA_MARKER))
}
