//! Marketplace gateway.
//!
//! The HTTP edge in front of the marketplace application. Every inbound
//! request is run through the redirect engine first; canonicalization
//! redirects (protocol upgrade, custom-domain preference, www-stripping) and
//! fallback redirects (unknown, deleted or closed tenants) are answered
//! directly, everything else is forwarded to the upstream application
//! server. A separate admin listener serves health and readiness probes.

pub mod admin;
pub mod config;
pub mod errors;
pub mod forward;
pub mod headers;
pub mod http;
pub mod metrics_defs;
pub mod registry;
pub mod service;

use std::sync::Arc;

use crate::admin::AdminService;
use crate::config::Config;
use crate::errors::GatewayError;
use crate::registry::CommunityRegistry;
use crate::service::RedirectService;

/// Runs the gateway and admin listeners until one of them fails
pub async fn run(config: Config) -> Result<(), GatewayError> {
    let registry = Arc::new(CommunityRegistry::from_config(
        &config.platform.app_domain,
        &config.communities,
    ));
    tracing::info!(
        app_domain = %config.platform.app_domain,
        communities = config.communities.len(),
        upstream = %config.upstream.url,
        "starting gateway"
    );

    let service = RedirectService::new(&config, registry)?;
    let gateway_task = http::run_http_service(&config.listener.host, config.listener.port, service);
    let admin_task = http::run_http_service(
        &config.admin_listener.host,
        config.admin_listener.port,
        AdminService,
    );

    tokio::try_join!(gateway_task, admin_task)?;
    Ok(())
}
