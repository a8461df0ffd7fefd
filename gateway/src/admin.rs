//! Health and readiness endpoints served on the admin listener.

use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::service::Service;
use hyper::{Request, Response, StatusCode};
use std::future::Future;
use std::pin::Pin;

use crate::errors::GatewayError;
use crate::http::canned_response;

#[derive(Clone, Copy, Default)]
pub struct AdminService;

impl Service<Request<Incoming>> for AdminService {
    type Response = Response<BoxBody<Bytes, GatewayError>>;
    type Error = GatewayError;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn call(&self, req: Request<Incoming>) -> Self::Future {
        Box::pin(async move {
            let ok_body = || Full::new(Bytes::from("ok\n")).map_err(|never| match never {}).boxed();

            let res = match req.uri().path() {
                "/health" => Response::new(ok_body()),
                "/ready" => Response::new(ok_body()),
                _ => canned_response(StatusCode::NOT_FOUND),
            };
            Ok(res)
        })
    }
}
