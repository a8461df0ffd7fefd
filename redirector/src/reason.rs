//! Redirect reason selection.
//!
//! A prioritized, mutually-exclusive rule chain over the request, tenant and
//! search state. The first matching rule wins; later rules are skipped even
//! if they would also match. Tenant-existence rules rank above tenant-state
//! rules, which rank above domain canonicalization, which ranks above the
//! protocol upgrade.

use crate::inputs::{Community, PlatformConfig, RequestInfo, SearchState, SearchStatus};

/// Why a request must be redirected
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reason {
    /// The platform has no tenants at all; send to marketplace setup
    NewMarketplace,
    /// No tenant matched the request
    NotFound,
    /// The tenant was deleted
    Deleted,
    /// The tenant was closed
    Closed,
    /// An active custom domain exists but the request did not use it
    Domain,
    /// A configured but inactive custom domain was used anyway
    NoDomain,
    /// Subdomain access with a superfluous `www.` prefix
    WwwIdent,
    /// Protocol upgrade only
    Https,
}

impl Reason {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Reason::NewMarketplace => "new_marketplace",
            Reason::NotFound => "not_found",
            Reason::Deleted => "deleted",
            Reason::Closed => "closed",
            Reason::Domain => "domain",
            Reason::NoDomain => "no_domain",
            Reason::WwwIdent => "www_ident",
            Reason::Https => "https",
        }
    }
}

/// Selects at most one redirect reason for the request.
///
/// `protocol_needs_redirect` is derived by the orchestrator from the
/// resolved protocol so the rule chain can treat the upgrade as one boolean
/// signal alongside the tenant rules.
pub fn select_reason(
    request: &RequestInfo,
    community: Option<&Community>,
    configs: &PlatformConfig,
    state: &SearchState,
    protocol_needs_redirect: bool,
) -> Option<Reason> {
    if state.community_search_status == SearchStatus::NotFound {
        if state.no_communities {
            return Some(Reason::NewMarketplace);
        }
        return Some(Reason::NotFound);
    }

    if let Some(community) = community {
        if community.deleted {
            return Some(Reason::Deleted);
        }
        if community.closed {
            return Some(Reason::Closed);
        }

        if let Some(domain) = community.custom_domain() {
            if community.use_domain && request.host != domain {
                return Some(Reason::Domain);
            }
            if !community.use_domain && request.host == domain {
                return Some(Reason::NoDomain);
            }
        }

        let www_host = format!("www.{}", community.subdomain_host(&configs.app_domain));
        if request.host == www_host {
            return Some(Reason::WwwIdent);
        }
    }

    if protocol_needs_redirect {
        return Some(Reason::Https);
    }

    None
}
