//! Gateway configuration.
//!
//! Loaded from a YAML file at startup and validated before anything is
//! served. Invalid configuration is rejected with an error naming the
//! offending field.

use redirector::{Community, Destination, FallbackPaths, PlatformConfig, RouteName};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::fs::File;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Port cannot be 0")]
    InvalidPort,

    #[error("App domain cannot be empty")]
    EmptyAppDomain,

    #[error("Empty community ident")]
    EmptyCommunityIdent,

    #[error("Duplicate community ident: {0}")]
    DuplicateIdent(String),

    #[error("Duplicate custom domain: {0}")]
    DuplicateDomain(String),

    #[error("Path {0} must set exactly one of url/route")]
    AmbiguousPath(&'static str),

    #[error("Path {0} must set one of url/route")]
    MissingPath(&'static str),

    #[error("Path references unknown route: {0}")]
    UnknownRoute(String),

    #[error("Route {0} must map to an absolute path")]
    RoutePathNotAbsolute(String),

    #[error("Upstream timeout cannot be 0")]
    InvalidTimeout,
}

/// Gateway configuration
#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    /// Main listener for incoming requests
    pub listener: Listener,
    /// Admin listener for health/readiness endpoints
    pub admin_listener: Listener,
    /// Platform-wide settings consulted by the redirect rules
    pub platform: PlatformSettings,
    /// Fallback destinations for tenants that cannot be served
    pub paths: PathsConfig,
    /// Named routes resolvable into concrete paths
    #[serde(default)]
    pub routes: HashMap<RouteName, String>,
    /// The tenants served by this gateway
    #[serde(default)]
    pub communities: Vec<CommunityConfig>,
    /// Where non-redirected traffic is forwarded
    pub upstream: UpstreamConfig,
    pub metrics: Option<MetricsConfig>,
    pub logging: Option<LoggingConfig>,
}

impl Config {
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        let config = serde_yaml::from_reader(file)?;
        Ok(config)
    }

    /// Validates the gateway configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.listener.validate()?;
        self.admin_listener.validate()?;

        if self.platform.app_domain.is_empty() {
            return Err(ValidationError::EmptyAppDomain);
        }

        if self.upstream.timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }

        for path in self.routes.values() {
            if !path.starts_with('/') {
                return Err(ValidationError::RoutePathNotAbsolute(path.clone()));
            }
        }

        self.paths
            .community_not_found
            .validate("community_not_found", &self.routes)?;
        self.paths
            .new_community
            .validate("new_community", &self.routes)?;

        let mut idents = HashSet::new();
        let mut domains = HashSet::new();
        for community in &self.communities {
            if community.ident.is_empty() {
                return Err(ValidationError::EmptyCommunityIdent);
            }
            if !idents.insert(&community.ident) {
                return Err(ValidationError::DuplicateIdent(community.ident.clone()));
            }
            if let Some(domain) = &community.domain
                && !domain.is_empty()
                && !domains.insert(domain)
            {
                return Err(ValidationError::DuplicateDomain(domain.clone()));
            }
        }

        Ok(())
    }

    /// The engine's platform configuration record
    pub fn platform_config(&self) -> PlatformConfig {
        PlatformConfig {
            always_use_ssl: self.platform.always_use_ssl,
            app_domain: self.platform.app_domain.clone(),
        }
    }

    /// The engine's fallback destinations
    pub fn fallback_paths(&self) -> Result<FallbackPaths, ValidationError> {
        Ok(FallbackPaths {
            community_not_found: self
                .paths
                .community_not_found
                .destination("community_not_found")?,
            new_community: self.paths.new_community.destination("new_community")?,
        })
    }

    /// The route table resolving named routes into concrete paths
    pub fn route_table(&self) -> RouteTable {
        RouteTable {
            routes: self.routes.clone(),
        }
    }
}

/// Network listener configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Listener {
    /// Host address to bind to (e.g., "0.0.0.0" or "127.0.0.1")
    pub host: String,
    /// Port number to listen on
    pub port: u16,
}

impl Listener {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        Ok(())
    }
}

/// Platform-wide settings consulted by the redirect rules
#[derive(Clone, Debug, Deserialize)]
pub struct PlatformSettings {
    /// Force an HTTPS upgrade on eligible requests
    pub always_use_ssl: bool,
    /// Shared base domain used for subdomain-style tenant access
    pub app_domain: String,
}

/// A fallback destination: a literal URL or the name of a configured route
///
/// Exactly one of the two fields must be set.
#[derive(Clone, Debug, Deserialize)]
pub struct PathConfig {
    pub url: Option<Url>,
    pub route: Option<RouteName>,
}

impl PathConfig {
    fn validate(
        &self,
        field: &'static str,
        routes: &HashMap<RouteName, String>,
    ) -> Result<(), ValidationError> {
        match self.destination(field)? {
            Destination::Route(route) if !routes.contains_key(&route) => {
                Err(ValidationError::UnknownRoute(route))
            }
            _ => Ok(()),
        }
    }

    fn destination(&self, field: &'static str) -> Result<Destination, ValidationError> {
        match (&self.url, &self.route) {
            (Some(url), None) => Ok(Destination::Url(url.clone())),
            (None, Some(route)) => Ok(Destination::Route(route.clone())),
            (Some(_), Some(_)) => Err(ValidationError::AmbiguousPath(field)),
            (None, None) => Err(ValidationError::MissingPath(field)),
        }
    }
}

/// Fallback destinations for tenants that cannot be served
#[derive(Clone, Debug, Deserialize)]
pub struct PathsConfig {
    pub community_not_found: PathConfig,
    pub new_community: PathConfig,
}

/// One tenant entry
#[derive(Clone, Debug, Deserialize)]
pub struct CommunityConfig {
    /// Unique subdomain label under the app domain
    pub ident: String,
    /// Custom domain, if one is configured
    pub domain: Option<String>,
    /// Whether the custom domain is activated for serving
    #[serde(default)]
    pub use_domain: bool,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub closed: bool,
}

impl From<CommunityConfig> for Community {
    fn from(config: CommunityConfig) -> Self {
        Self {
            ident: config.ident,
            domain: config.domain,
            use_domain: config.use_domain,
            deleted: config.deleted,
            closed: config.closed,
        }
    }
}

/// Upstream application server configuration
#[derive(Clone, Debug, Deserialize)]
pub struct UpstreamConfig {
    /// URL of the upstream server
    ///
    /// Note: Uses the `url::Url` type so invalid URLs are rejected during
    /// config deserialization.
    pub url: Url,
    /// Timeout for the entire upstream request/response cycle
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

#[derive(Clone, Debug, Deserialize)]
pub struct MetricsConfig {
    pub statsd_host: String,
    pub statsd_port: u16,
}

#[derive(Clone, Debug, Deserialize)]
pub struct LoggingConfig {
    pub sentry_dsn: String,
}

/// Resolves named routes into the concrete paths configured for them
#[derive(Clone, Debug, Default)]
pub struct RouteTable {
    routes: HashMap<RouteName, String>,
}

impl RouteTable {
    pub fn resolve(&self, name: &str) -> Option<&str> {
        self.routes.get(name).map(String::as_str)
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not load config from file: {0}")]
    LoadError(#[from] std::io::Error),
    #[error("could not parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),
}
