//! Redirect decision engine for a multi-tenant marketplace platform.
//!
//! Decides, for each inbound request, whether it must be redirected, to what
//! target and with what status. Tenants are reached through a subdomain of
//! the shared app domain or through a custom domain; the engine canonicalizes
//! traffic (protocol upgrade, subdomain-vs-custom-domain preference,
//! www-stripping) and routes requests for tenants that do not exist, were
//! deleted or were closed to decorated fallback destinations.
//!
//! # Decision pipeline
//!
//! ```text
//! RequestInfo ─┐
//! Community  ──┤    resolve_protocol     select_reason      build_target
//! FallbackPaths├──▶ (http or https?) ──▶ (first matching ─▶ (URL or route
//! PlatformConfig│                         rule wins)         + status)
//! SearchState ─┘
//! ```
//!
//! The pipeline is a pure function of its five inputs. The caller supplies
//! an already-resolved tenant record (or none) and translates the finished
//! [`Target`] into an actual HTTP response.

pub mod engine;
pub mod errors;
pub mod inputs;
pub mod protocol;
pub mod reason;
pub mod target;

pub use engine::{needs_redirect, redirect_target};
pub use errors::{RedirectError, ValidationError};
pub use inputs::{
    Community, Destination, FallbackPaths, PlatformConfig, RequestInfo, RouteName, Scheme,
    SearchState, SearchStatus,
};
pub use protocol::{PROXY_VIA_MARKER, resolve_protocol, should_use_https};
pub use reason::{Reason, select_reason};
pub use target::{Location, RedirectStatus, Target, build_target};
