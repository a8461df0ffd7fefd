// Header hygiene for traffic crossing the gateway: hop-by-hop headers are
// stripped and a Via entry is appended, in both directions.

use http::Version;
use http::header::{
    CONNECTION, HeaderMap, HeaderName, HeaderValue, PROXY_AUTHENTICATE, PROXY_AUTHORIZATION, TE,
    TRAILER, TRANSFER_ENCODING, UPGRADE, VIA,
};

const GATEWAY_NAME: &str = "marketplace-gateway";

static HOP_BY_HOP_NAMES: &[HeaderName] = &[
    CONNECTION,
    TRANSFER_ENCODING,
    TE,
    TRAILER,
    UPGRADE,
    PROXY_AUTHORIZATION,
    PROXY_AUTHENTICATE,
];

fn is_http1(version: Version) -> bool {
    matches!(
        version,
        Version::HTTP_09 | Version::HTTP_10 | Version::HTTP_11
    )
}

/// Removes hop-by-hop headers before a message crosses the gateway.
///
/// Strips the standard hop-by-hop set, any extra headers named in the
/// Connection header value, and keep-alive on pre-1.1 versions. HTTP/2 and
/// HTTP/3 don't use hop-by-hop headers, so those messages are left alone.
pub fn strip_hop_by_hop(headers: &mut HeaderMap, version: Version) {
    if !is_http1(version) {
        return;
    }

    let connection_listed: Vec<HeaderName> = headers
        .get(CONNECTION)
        .and_then(|value| value.to_str().ok())
        .map(|value| {
            value
                .split(',')
                .filter_map(|token| HeaderName::from_bytes(token.trim().as_bytes()).ok())
                .collect()
        })
        .unwrap_or_default();

    for name in HOP_BY_HOP_NAMES {
        headers.remove(name);
    }
    for name in connection_listed {
        headers.remove(&name);
    }

    if matches!(version, Version::HTTP_09 | Version::HTTP_10) {
        headers.remove(HeaderName::from_static("keep-alive"));
    }
}

/// Appends this gateway to the Via chain
pub fn append_via(headers: &mut HeaderMap, version: Version) {
    let protocol_version = match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_11 => "1.1",
        Version::HTTP_2 => "2",
        Version::HTTP_3 => "3",
        _ => {
            tracing::warn!(?version, "unknown HTTP version, skipping Via header");
            return;
        }
    };

    let entry = format!("{protocol_version} {GATEWAY_NAME}");
    let combined = match headers.get(VIA).and_then(|value| value.to_str().ok()) {
        Some(existing) => format!("{existing}, {entry}"),
        None => entry,
    };

    if let Ok(value) = HeaderValue::from_str(&combined) {
        headers.insert(VIA, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::CONTENT_TYPE;

    #[test]
    fn test_strip_hop_by_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(CONNECTION, HeaderValue::from_static("close, x-internal"));
        headers.insert(TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        headers.insert("x-internal", HeaderValue::from_static("1"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/html"));

        strip_hop_by_hop(&mut headers, Version::HTTP_11);

        assert_eq!(headers.len(), 1);
        assert!(headers.get(CONTENT_TYPE).is_some());
        assert!(headers.get(CONNECTION).is_none());
        assert!(headers.get(TRANSFER_ENCODING).is_none());
        // Named in the Connection header value
        assert!(headers.get("x-internal").is_none());
    }

    #[test]
    fn test_http2_messages_are_untouched() {
        let mut headers = HeaderMap::new();
        headers.insert(TE, HeaderValue::from_static("trailers"));

        strip_hop_by_hop(&mut headers, Version::HTTP_2);

        assert!(headers.get(TE).is_some());
    }

    #[test]
    fn test_append_via() {
        let mut headers = HeaderMap::new();
        append_via(&mut headers, Version::HTTP_11);
        assert_eq!(
            headers.get(VIA).unwrap(),
            &HeaderValue::from_static("1.1 marketplace-gateway")
        );

        // Appends to an existing chain
        append_via(&mut headers, Version::HTTP_11);
        assert_eq!(
            headers.get(VIA).unwrap(),
            &HeaderValue::from_static("1.1 marketplace-gateway, 1.1 marketplace-gateway")
        );
    }
}
