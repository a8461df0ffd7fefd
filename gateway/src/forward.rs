//! Upstream pass-through.
//!
//! Traffic that needs no redirect is handed to the marketplace application
//! behind the gateway. The full response body is collected before it is
//! returned, so this path is not suitable for server-sent events or other
//! long-lived streaming responses.

use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::{Request, Response};
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use std::time::Duration;
use tokio::time::timeout;
use url::Url;

use crate::errors::GatewayError;
use crate::headers::{append_via, strip_hop_by_hop};

/// Forwards requests to the configured upstream application server
pub struct Forwarder {
    client: Client<HttpConnector, Full<Bytes>>,
    upstream_url: Url,
    timeout_secs: u64,
}

impl Forwarder {
    pub fn new(upstream_url: Url, timeout_secs: u64) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Self {
            client,
            upstream_url,
            timeout_secs,
        }
    }

    /// Sends the request to the upstream and collects the complete response.
    ///
    /// The timeout covers the entire cycle: connecting, sending, receiving
    /// headers and collecting the response body.
    pub async fn forward(&self, request: Request<Bytes>) -> Result<Response<Bytes>, GatewayError> {
        // Use host as identifier for error messages
        let upstream = self
            .upstream_url
            .host_str()
            .unwrap_or(self.upstream_url.as_str());

        // Rebuild the URI from the upstream base plus the request path/query
        let path_and_query = request
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");
        let mut url = self.upstream_url.clone();
        if let Some((path, query)) = path_and_query.split_once('?') {
            url.set_path(path);
            url.set_query(Some(query));
        } else {
            url.set_path(path_and_query);
            url.set_query(None);
        }

        let (mut parts, body) = request.into_parts();
        let version = parts.version;
        strip_hop_by_hop(&mut parts.headers, version);
        append_via(&mut parts.headers, version);

        let mut builder = Request::builder().method(parts.method).uri(url.as_str());
        for (name, value) in parts.headers.iter() {
            builder = builder.header(name, value);
        }
        let upstream_request = builder.body(Full::new(body)).map_err(|e| {
            GatewayError::InternalError(format!("failed to build upstream request: {e}"))
        })?;

        let response = timeout(
            Duration::from_secs(self.timeout_secs),
            self.client.request(upstream_request),
        )
        .await
        .map_err(|_| GatewayError::UpstreamTimeout(upstream.to_string()))?
        .map_err(|e| GatewayError::UpstreamRequestFailed(upstream.to_string(), e.to_string()))?;

        let (mut parts, body) = response.into_parts();
        let version = parts.version;
        strip_hop_by_hop(&mut parts.headers, version);
        append_via(&mut parts.headers, version);

        let body_bytes = body
            .collect()
            .await
            .map(|collected| collected.to_bytes())
            .map_err(|e| GatewayError::ResponseBodyError(e.to_string()))?;

        Ok(Response::from_parts(parts, body_bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::service::service_fn;
    use std::convert::Infallible;
    use tokio::net::TcpListener;

    // Echo server that returns the request body and headers
    async fn echo_handler(
        req: Request<hyper::body::Incoming>,
    ) -> Result<Response<Full<Bytes>>, Infallible> {
        let (parts, body) = req.into_parts();
        let body_bytes = body
            .collect()
            .await
            .map(|collected| collected.to_bytes())
            .unwrap_or_else(|_| Bytes::new());

        let mut response = Response::new(Full::new(body_bytes));
        *response.headers_mut() = parts.headers;
        Ok(response)
    }

    async fn start_echo_server() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind echo server");
        let port = listener.local_addr().unwrap().port();

        tokio::spawn(async move {
            loop {
                let (stream, _) = listener.accept().await.unwrap();
                let io = hyper_util::rt::TokioIo::new(stream);
                tokio::spawn(async move {
                    let _ = hyper_util::server::conn::auto::Builder::new(TokioExecutor::new())
                        .serve_connection(io, service_fn(echo_handler))
                        .await;
                });
            }
        });

        port
    }

    #[tokio::test]
    async fn test_forward_success() {
        let port = start_echo_server().await;
        let forwarder = Forwarder::new(
            Url::parse(&format!("http://127.0.0.1:{port}")).unwrap(),
            5,
        );

        let request = Request::builder()
            .method("POST")
            .uri("http://acme.sharetribe.com/listings?page=2")
            .header("connection", "keep-alive")
            .header("x-custom", "value")
            .body(Bytes::from_static(b"payload"))
            .unwrap();

        let response = forwarder.forward(request).await.expect("forward");

        assert_eq!(response.status(), 200);
        assert_eq!(response.body().as_ref(), b"payload");
        // The gateway names itself in the Via chain
        assert!(
            response
                .headers()
                .get("via")
                .unwrap()
                .to_str()
                .unwrap()
                .contains("marketplace-gateway")
        );
        // Hop-by-hop headers never cross the gateway
        assert!(response.headers().get("connection").is_none());
        assert_eq!(response.headers().get("x-custom").unwrap(), "value");
    }

    #[tokio::test]
    async fn test_forward_timeout() {
        // Non-routable address per RFC 5737
        let forwarder = Forwarder::new(Url::parse("http://192.0.2.1:9999").unwrap(), 1);

        let request = Request::builder()
            .uri("http://acme.sharetribe.com/listings")
            .body(Bytes::new())
            .unwrap();

        let err = forwarder.forward(request).await.unwrap_err();
        assert!(matches!(err, GatewayError::UpstreamTimeout(_)));
    }
}
