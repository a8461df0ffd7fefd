//! Redirect target construction.
//!
//! Turns a selected reason into a concrete redirect target: a URL or a named
//! route plus its status code. Missing/deleted/closed fallbacks get tracking
//! parameters appended so redirected traffic stays attributable; a protocol
//! upgrade forces the final status to a permanent redirect regardless of the
//! reason's own status.

use http::StatusCode;

use crate::errors::RedirectError;
use crate::inputs::{
    Community, Destination, FallbackPaths, PlatformConfig, RequestInfo, RouteName, Scheme,
};
use crate::reason::Reason;

/// HTTP status a redirect is issued with
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RedirectStatus {
    /// 302, a temporary redirect
    Found,
    /// 301, a permanent redirect
    MovedPermanently,
}

impl RedirectStatus {
    pub const fn as_status_code(&self) -> StatusCode {
        match self {
            RedirectStatus::Found => StatusCode::FOUND,
            RedirectStatus::MovedPermanently => StatusCode::MOVED_PERMANENTLY,
        }
    }
}

/// Where a redirect points: a literal URL, or a route name the caller
/// resolves through its own routing layer
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Location {
    Url(String),
    Route(RouteName),
}

/// A finished redirect decision
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Target {
    pub reason: Reason,
    pub location: Location,
    /// Scheme to carry alongside a named route, for callers that build an
    /// absolute URL out of it. Only populated when the chosen fallback path
    /// needs it.
    pub scheme: Option<Scheme>,
    pub status: RedirectStatus,
}

impl Target {
    /// The literal target URL, if this target carries one
    pub fn url(&self) -> Option<&str> {
        match &self.location {
            Location::Url(url) => Some(url),
            Location::Route(_) => None,
        }
    }

    /// The named route, if this target carries one
    pub fn route_name(&self) -> Option<&str> {
        match &self.location {
            Location::Url(_) => None,
            Location::Route(name) => Some(name),
        }
    }
}

/// Builds the concrete redirect target for a selected reason.
///
/// Reasons scoped to an existing tenant require a community record; its
/// absence here is an internal invariant violation, not a runtime condition.
pub fn build_target(
    reason: Reason,
    request: &RequestInfo,
    community: Option<&Community>,
    paths: &FallbackPaths,
    configs: &PlatformConfig,
    scheme: Scheme,
    protocol_needs_redirect: bool,
) -> Result<Target, RedirectError> {
    let (location, carried_scheme, status) = match reason {
        Reason::NewMarketplace => (
            fallback_location(&paths.new_community),
            Some(scheme),
            RedirectStatus::Found,
        ),
        Reason::NotFound => (
            decorated_fallback(&paths.community_not_found, request, "na-auto-redirect"),
            None,
            RedirectStatus::Found,
        ),
        Reason::Deleted => (
            decorated_fallback(&paths.community_not_found, request, "dl-auto-redirect"),
            None,
            RedirectStatus::MovedPermanently,
        ),
        Reason::Closed => (
            decorated_fallback(&paths.community_not_found, request, "qc-auto-redirect"),
            None,
            RedirectStatus::MovedPermanently,
        ),
        Reason::Domain => {
            let community = require_community(community, reason)?;
            let domain = community
                .custom_domain()
                .ok_or(RedirectError::MissingDomain { reason })?;
            (
                absolute_url(scheme, domain, request),
                None,
                RedirectStatus::MovedPermanently,
            )
        }
        Reason::NoDomain | Reason::WwwIdent => {
            let community = require_community(community, reason)?;
            let host = community.subdomain_host(&configs.app_domain);
            (
                absolute_url(scheme, &host, request),
                None,
                RedirectStatus::MovedPermanently,
            )
        }
        Reason::Https => (
            absolute_url(scheme, &request.host, request),
            None,
            RedirectStatus::MovedPermanently,
        ),
    };

    // A protocol upgrade is always a permanent redirect, even when the
    // reason's own status is temporary.
    let status = if protocol_needs_redirect {
        RedirectStatus::MovedPermanently
    } else {
        status
    };

    Ok(Target {
        reason,
        location,
        scheme: carried_scheme,
        status,
    })
}

fn require_community<'a>(
    community: Option<&'a Community>,
    reason: Reason,
) -> Result<&'a Community, RedirectError> {
    community.ok_or(RedirectError::MissingCommunity { reason })
}

fn absolute_url(scheme: Scheme, host: &str, request: &RequestInfo) -> Location {
    Location::Url(format!(
        "{}://{}{}{}",
        scheme, host, request.port_string, request.fullpath
    ))
}

fn fallback_location(path: &Destination) -> Location {
    match path {
        Destination::Url(url) => Location::Url(url.as_str().to_string()),
        Destination::Route(name) => Location::Route(name.clone()),
    }
}

/// Appends tracking parameters to a URL fallback so redirected traffic stays
/// attributable; route fallbacks are passed through undecorated.
fn decorated_fallback(path: &Destination, request: &RequestInfo, campaign: &str) -> Location {
    match path {
        Destination::Url(url) => {
            let mut url = url.clone();
            url.query_pairs_mut()
                .append_pair("utm_source", &request.host)
                .append_pair("utm_medium", "redirect")
                .append_pair("utm_campaign", campaign);
            Location::Url(url.into())
        }
        Destination::Route(name) => Location::Route(name.clone()),
    }
}
