//! The redirect edge service.
//!
//! Translates each inbound request into the engine's input records, asks the
//! engine for a decision, and either answers with a redirect or forwards the
//! request to the upstream application. Engine validation failures indicate
//! a request-construction bug and surface as 500s, never as redirects.

use bytes::Bytes;
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::header::{HOST, LOCATION};
use hyper::service::Service;
use hyper::{Request, Response, StatusCode};
use redirector::{FallbackPaths, Location, PlatformConfig, RequestInfo, Scheme, SearchState, Target};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::config::{Config, RouteTable};
use crate::errors::GatewayError;
use crate::forward::Forwarder;
use crate::http::canned_response;
use crate::metrics_defs;
use crate::registry::CommunityStore;

type ServiceResponse = Response<BoxBody<Bytes, GatewayError>>;

#[derive(Clone)]
pub struct RedirectService {
    inner: Arc<Inner>,
}

struct Inner {
    platform: PlatformConfig,
    paths: FallbackPaths,
    routes: RouteTable,
    store: Arc<dyn CommunityStore>,
    forwarder: Forwarder,
}

impl RedirectService {
    pub fn new(config: &Config, store: Arc<dyn CommunityStore>) -> Result<Self, GatewayError> {
        Ok(Self {
            inner: Arc::new(Inner {
                platform: config.platform_config(),
                paths: config.fallback_paths()?,
                routes: config.route_table(),
                store,
                forwarder: Forwarder::new(
                    config.upstream.url.clone(),
                    config.upstream.timeout_secs,
                ),
            }),
        })
    }
}

impl Inner {
    async fn handle<B>(&self, req: Request<B>) -> Result<ServiceResponse, GatewayError>
    where
        B: hyper::body::Body + Send + Unpin + 'static,
        B::Data: Send,
        B::Error: std::error::Error + Send + Sync + 'static,
    {
        let Some(host) = host_header(&req) else {
            // Nothing to canonicalize without a host; pass straight through
            tracing::debug!(path = %req.uri().path(), "request without host header");
            return self.forward(req).await;
        };

        let request = request_info(&req, &host);
        let resolution = self.store.resolve(&host).await;
        let state = SearchState {
            no_communities: self.store.no_communities().await,
            community_search_status: resolution.status,
        };

        match redirector::redirect_target(
            &request,
            resolution.community.as_ref(),
            &self.paths,
            &self.platform,
            &state,
        ) {
            Ok(Some(target)) => self.redirect_response(&target),
            Ok(None) => self.forward(req).await,
            Err(err) => {
                tracing::error!(host = %request.host, error = %err, "redirect decision failed");
                Ok(canned_response(StatusCode::INTERNAL_SERVER_ERROR))
            }
        }
    }

    fn redirect_response(&self, target: &Target) -> Result<ServiceResponse, GatewayError> {
        let location = match &target.location {
            Location::Url(url) => url.clone(),
            // Route names resolve through the configured route table
            Location::Route(name) => match self.routes.resolve(name) {
                Some(path) => path.to_string(),
                None => {
                    tracing::error!(route = %name, "redirect target references unknown route");
                    return Ok(canned_response(StatusCode::INTERNAL_SERVER_ERROR));
                }
            },
        };

        metrics::counter!(metrics_defs::REDIRECTS_ISSUED.name, "reason" => target.reason.as_str())
            .increment(1);
        tracing::debug!(
            reason = target.reason.as_str(),
            location = %location,
            status = ?target.status,
            "redirecting"
        );

        Response::builder()
            .status(target.status.as_status_code())
            .header(LOCATION, location.as_str())
            .body(Full::new(Bytes::new()).map_err(|never| match never {}).boxed())
            .map_err(|e| {
                GatewayError::InternalError(format!("failed to build redirect response: {e}"))
            })
    }

    async fn forward<B>(&self, req: Request<B>) -> Result<ServiceResponse, GatewayError>
    where
        B: hyper::body::Body + Send + Unpin + 'static,
        B::Data: Send,
        B::Error: std::error::Error + Send + Sync + 'static,
    {
        let (parts, body) = req.into_parts();
        let body_bytes = body
            .collect()
            .await
            .map(|collected| collected.to_bytes())
            .map_err(|e| GatewayError::RequestBodyError(e.to_string()))?;

        match self
            .forwarder
            .forward(Request::from_parts(parts, body_bytes))
            .await
        {
            Ok(response) => {
                metrics::counter!(metrics_defs::REQUESTS_FORWARDED.name).increment(1);
                let (parts, body) = response.into_parts();
                Ok(Response::from_parts(
                    parts,
                    Full::new(body).map_err(|never| match never {}).boxed(),
                ))
            }
            Err(
                err @ (GatewayError::UpstreamTimeout(_) | GatewayError::UpstreamRequestFailed(..)),
            ) => {
                metrics::counter!(metrics_defs::UPSTREAM_ERRORS.name).increment(1);
                tracing::warn!(error = %err, "upstream unavailable");
                Ok(canned_response(StatusCode::BAD_GATEWAY))
            }
            Err(err) => Err(err),
        }
    }
}

fn host_header<B>(req: &Request<B>) -> Option<String> {
    req.headers()
        .get(HOST)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

fn request_info<B>(req: &Request<B>, raw_host: &str) -> RequestInfo {
    let (host, port_string) = match raw_host.split_once(':') {
        Some((host, port)) => (host.to_string(), format!(":{port}")),
        None => (raw_host.to_string(), String::new()),
    };

    let fullpath = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/")
        .to_string();

    RequestInfo {
        host,
        scheme: request_scheme(req),
        fullpath,
        port_string,
        headers: req.headers().clone(),
    }
}

fn request_scheme<B>(req: &Request<B>) -> Scheme {
    // TLS terminates ahead of the gateway; trust the forwarded protocol
    // header and fall back to plain HTTP
    req.headers()
        .get("x-forwarded-proto")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse().ok())
        .unwrap_or(Scheme::Http)
}

impl Service<Request<Incoming>> for RedirectService {
    type Response = ServiceResponse;
    type Error = GatewayError;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn call(&self, req: Request<Incoming>) -> Self::Future {
        let inner = self.inner.clone();
        Box::pin(async move { inner.handle(req).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::CommunityRegistry;
    use http_body_util::Empty;

    fn test_config(always_use_ssl: bool, upstream_port: u16) -> Config {
        let yaml = format!(
            r#"
listener: {{host: "127.0.0.1", port: 8080}}
admin_listener: {{host: "127.0.0.1", port: 8081}}
platform:
    always_use_ssl: {always_use_ssl}
    app_domain: sharetribe.com
paths:
    community_not_found:
        url: "https://www.sharetribe.com/not_found"
    new_community:
        route: new_community
routes:
    new_community: /community/new
communities:
    - ident: acme
      domain: market.acme.com
      use_domain: true
    - ident: globex
upstream:
    url: "http://127.0.0.1:{upstream_port}"
    timeout_secs: 2
"#
        );
        serde_yaml::from_str(&yaml).expect("parse test config")
    }

    fn test_service(config: &Config) -> RedirectService {
        let registry = Arc::new(CommunityRegistry::from_config(
            &config.platform.app_domain,
            &config.communities,
        ));
        RedirectService::new(config, registry).expect("build service")
    }

    fn test_request(host: Option<&str>, path: &str, proto: Option<&str>) -> Request<Empty<Bytes>> {
        let mut builder = Request::builder().uri(path);
        if let Some(host) = host {
            builder = builder.header(HOST, host);
        }
        if let Some(proto) = proto {
            builder = builder.header("x-forwarded-proto", proto);
        }
        builder.body(Empty::new()).unwrap()
    }

    /// Port that nothing listens on, so forwarding fails fast
    fn closed_port() -> u16 {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        port
    }

    fn location(response: &ServiceResponse) -> &str {
        response
            .headers()
            .get(LOCATION)
            .expect("location header")
            .to_str()
            .unwrap()
    }

    #[tokio::test]
    async fn test_custom_domain_redirect() {
        let config = test_config(false, closed_port());
        let service = test_service(&config);

        let req = test_request(Some("acme.sharetribe.com"), "/somepath", Some("https"));
        let response = service.inner.handle(req).await.unwrap();

        assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(location(&response), "https://market.acme.com/somepath");
    }

    #[tokio::test]
    async fn test_unknown_tenant_redirect_is_decorated() {
        let config = test_config(false, closed_port());
        let service = test_service(&config);

        let req = test_request(Some("nosuch.sharetribe.com"), "/", Some("https"));
        let response = service.inner.handle(req).await.unwrap();

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            location(&response),
            "https://www.sharetribe.com/not_found?utm_source=nosuch.sharetribe.com&utm_medium=redirect&utm_campaign=na-auto-redirect"
        );
    }

    #[tokio::test]
    async fn test_www_prefix_redirect() {
        let config = test_config(false, closed_port());
        let service = test_service(&config);

        let req = test_request(Some("www.globex.sharetribe.com"), "/somepath", Some("https"));
        let response = service.inner.handle(req).await.unwrap();

        assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(location(&response), "https://globex.sharetribe.com/somepath");
    }

    #[tokio::test]
    async fn test_https_upgrade() {
        let config = test_config(true, closed_port());
        let service = test_service(&config);

        // No x-forwarded-proto header means the request came in over plain HTTP
        let req = test_request(Some("globex.sharetribe.com"), "/listings", None);
        let response = service.inner.handle(req).await.unwrap();

        assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(location(&response), "https://globex.sharetribe.com/listings");
    }

    #[tokio::test]
    async fn test_robots_is_not_upgraded() {
        let config = test_config(true, closed_port());
        let service = test_service(&config);

        // No redirect fires, so the request goes to the (closed) upstream
        let req = test_request(Some("globex.sharetribe.com"), "/robots.txt", None);
        let response = service.inner.handle(req).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_route_target_resolves_through_route_table() {
        let mut config = test_config(false, closed_port());
        config.communities.clear();
        let service = test_service(&config);

        let req = test_request(Some("anything.sharetribe.com"), "/", Some("https"));
        let response = service.inner.handle(req).await.unwrap();

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(location(&response), "/community/new");
    }

    #[tokio::test]
    async fn test_unresolvable_route_is_an_internal_error() {
        let mut config = test_config(false, closed_port());
        config.communities.clear();
        config.routes.clear();
        let service = test_service(&config);

        let req = test_request(Some("anything.sharetribe.com"), "/", Some("https"));
        let response = service.inner.handle(req).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_request_without_host_is_forwarded() {
        let config = test_config(true, closed_port());
        let service = test_service(&config);

        let req = test_request(None, "/listings", None);
        let response = service.inner.handle(req).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_platform_host_is_forwarded() {
        let config = test_config(false, closed_port());
        let service = test_service(&config);

        // The bare app domain skips tenant search and passes through
        let req = test_request(Some("sharetribe.com"), "/about", Some("https"));
        let response = service.inner.handle(req).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_host_port_is_carried_into_target() {
        let config = test_config(false, closed_port());
        let service = test_service(&config);

        let req = test_request(Some("www.globex.sharetribe.com:8080"), "/", Some("https"));
        let response = service.inner.handle(req).await.unwrap();

        assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(location(&response), "https://globex.sharetribe.com:8080/");
    }
}
