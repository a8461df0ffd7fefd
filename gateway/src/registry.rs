//! Tenant Registry
//!
//! Resolves the tenant addressed by a request host.
//!
//! # Model
//!
//! Hosts are resolved in precedence order:
//!
//! 1. **Custom domain**: an exact match on a tenant's configured domain
//! 2. **Subdomain label**: `<ident>.<app_domain>`, with a leading `www.`
//!    label ignored so www-stripping can still resolve the tenant
//!
//! The platform's own host (the bare app domain, with or without `www.`)
//! skips tenant search entirely. The registry is built at startup from
//! configuration and remains immutable during request processing.

use async_trait::async_trait;
use indexmap::IndexMap;
use redirector::{Community, SearchStatus};
use std::collections::HashMap;

use crate::config::CommunityConfig;

/// Outcome of resolving a request host to a tenant
#[derive(Clone, Debug)]
pub struct Resolution {
    pub community: Option<Community>,
    pub status: SearchStatus,
}

impl Resolution {
    fn skipped() -> Self {
        Self {
            community: None,
            status: SearchStatus::Skipped,
        }
    }

    fn not_found() -> Self {
        Self {
            community: None,
            status: SearchStatus::NotFound,
        }
    }
}

/// Boundary for tenant lookup, so the request path does not care whether
/// tenants come from static configuration or a backing store
#[async_trait]
pub trait CommunityStore: Send + Sync {
    /// Resolve the tenant addressed by `host` (which may carry a port)
    async fn resolve(&self, host: &str) -> Resolution;

    /// True if the platform has zero tenants
    async fn no_communities(&self) -> bool;
}

/// In-memory registry built once from configuration
pub struct CommunityRegistry {
    app_domain: String,
    /// Map of ident to community, preserving configuration order
    by_ident: IndexMap<String, Community>,
    domain_to_ident: HashMap<String, String>,
}

impl CommunityRegistry {
    /// Build a registry from tenant configurations
    pub fn from_config(app_domain: &str, communities: &[CommunityConfig]) -> Self {
        let by_ident: IndexMap<String, Community> = communities
            .iter()
            .map(|config| (config.ident.clone(), Community::from(config.clone())))
            .collect();

        let domain_to_ident = by_ident
            .values()
            .filter_map(|community| {
                community
                    .custom_domain()
                    .map(|domain| (domain.to_string(), community.ident.clone()))
            })
            .collect();

        Self {
            app_domain: app_domain.to_string(),
            by_ident,
            domain_to_ident,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.by_ident.is_empty()
    }

    /// Look up the tenant for a request host
    pub fn lookup(&self, host: &str) -> Resolution {
        // Strip port if present
        let host = host.split(':').next().unwrap_or(host);

        if host == self.app_domain || host == format!("www.{}", self.app_domain) {
            return Resolution::skipped();
        }

        if let Some(ident) = self.domain_to_ident.get(host) {
            return Resolution {
                community: self.by_ident.get(ident).cloned(),
                status: SearchStatus::Found,
            };
        }

        if let Some(label) = self.subdomain_label(host)
            && let Some(community) = self.by_ident.get(label)
        {
            return Resolution {
                community: Some(community.clone()),
                status: SearchStatus::Found,
            };
        }

        Resolution::not_found()
    }

    fn subdomain_label<'a>(&self, host: &'a str) -> Option<&'a str> {
        let label = host
            .strip_suffix(self.app_domain.as_str())?
            .strip_suffix('.')?;
        let label = label.strip_prefix("www.").unwrap_or(label);
        (!label.is_empty()).then_some(label)
    }
}

#[async_trait]
impl CommunityStore for CommunityRegistry {
    async fn resolve(&self, host: &str) -> Resolution {
        self.lookup(host)
    }

    async fn no_communities(&self) -> bool {
        self.is_empty()
    }
}
