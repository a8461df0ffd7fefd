//! Input records for the redirect decision pipeline.
//!
//! All records are immutable value types constructed fresh per call by the
//! caller and validated before any decision logic runs. The engine never
//! retains a reference to them beyond the call.

use http::HeaderMap;
use std::fmt;
use std::str::FromStr;
use url::Url;

use crate::errors::ValidationError;

/// Symbolic destination resolved to a concrete path by the caller's routing
/// layer
pub type RouteName = String;

/// URL scheme of a request or redirect target
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scheme {
    type Err = ValidationError;

    /// Accepts both the bare scheme and the `scheme://` form seen on the wire
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "http" | "http://" => Ok(Scheme::Http),
            "https" | "https://" => Ok(Scheme::Https),
            other => Err(ValidationError::UnsupportedScheme(other.to_string())),
        }
    }
}

/// One inbound HTTP request, reduced to the fields the decision rules consult
#[derive(Clone, Debug)]
pub struct RequestInfo {
    /// Host the client addressed, without port (e.g. "acme.sharetribe.com")
    pub host: String,
    /// Scheme the request arrived with
    pub scheme: Scheme,
    /// Path plus query string (e.g. "/listings?page=2")
    pub fullpath: String,
    /// Port suffix carried into redirect targets, ":8080" or empty
    pub port_string: String,
    /// Request headers; the engine consults at least `Via`
    pub headers: HeaderMap,
}

impl RequestInfo {
    /// Validates the request record
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.host.is_empty() {
            return Err(ValidationError::EmptyHost);
        }
        if !self.fullpath.starts_with('/') {
            return Err(ValidationError::FullpathNotAbsolute(self.fullpath.clone()));
        }
        if !self.port_string.is_empty() && !self.port_string.starts_with(':') {
            return Err(ValidationError::MalformedPortString(
                self.port_string.clone(),
            ));
        }
        Ok(())
    }
}

/// A tenant of the platform; absent when no matching tenant was found
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Community {
    /// Unique subdomain label under the shared app domain
    pub ident: String,
    /// Custom domain, if one was configured for this tenant
    pub domain: Option<String>,
    /// Whether the custom domain is activated for serving
    pub use_domain: bool,
    pub deleted: bool,
    pub closed: bool,
}

impl Community {
    /// Validates the community record
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.ident.is_empty() {
            return Err(ValidationError::EmptyIdent);
        }
        Ok(())
    }

    /// The configured custom domain, treating empty strings as absent
    pub fn custom_domain(&self) -> Option<&str> {
        self.domain.as_deref().filter(|domain| !domain.is_empty())
    }

    /// Canonical subdomain host for this tenant under the app domain
    pub fn subdomain_host(&self, app_domain: &str) -> String {
        format!("{}.{}", self.ident, app_domain)
    }
}

/// A fallback destination: either a literal URL or a named route the caller
/// resolves through its own routing layer
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Destination {
    Url(Url),
    Route(RouteName),
}

impl Destination {
    fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Destination::Url(_) => Ok(()),
            Destination::Route(name) if name.is_empty() => Err(ValidationError::EmptyRouteName),
            Destination::Route(_) => Ok(()),
        }
    }
}

/// Static fallback destinations for tenants that cannot be served
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FallbackPaths {
    /// Where traffic for missing, deleted and closed tenants is sent
    pub community_not_found: Destination,
    /// Where traffic goes when the platform has no tenants at all
    pub new_community: Destination,
}

impl FallbackPaths {
    /// Validates both fallback destinations
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.community_not_found.validate()?;
        self.new_community.validate()?;
        Ok(())
    }
}

/// Platform-wide configuration consulted by the decision rules
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlatformConfig {
    /// Force an HTTPS upgrade on eligible requests
    pub always_use_ssl: bool,
    /// Shared base domain used for subdomain-style tenant access
    pub app_domain: String,
}

impl PlatformConfig {
    /// Validates the platform configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.app_domain.is_empty() {
            return Err(ValidationError::EmptyAppDomain);
        }
        Ok(())
    }
}

/// Outcome of the caller's tenant search
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchStatus {
    Found,
    NotFound,
    /// The caller decided not to search for a tenant at all
    Skipped,
}

/// Platform search state accompanying each request
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SearchState {
    /// True if the platform has zero tenants
    pub no_communities: bool,
    pub community_search_status: SearchStatus,
}
