//! Redirect decision orchestration.
//!
//! Composes the protocol resolver, reason selector and target builder into
//! the single public entry point. The pipeline is a pure function of its
//! five inputs: no hidden state, no randomness, no I/O. Every call is
//! independent and may run concurrently without coordination.

use crate::errors::Result;
use crate::inputs::{Community, FallbackPaths, PlatformConfig, RequestInfo, SearchState};
use crate::protocol::resolve_protocol;
use crate::reason::select_reason;
use crate::target::{Target, build_target};

/// Decides whether the request must be redirected.
///
/// Validates all inputs first; a validation failure indicates malformed
/// caller input and propagates untouched. Returns `Ok(None)` when the
/// request needs no redirect.
pub fn redirect_target(
    request: &RequestInfo,
    community: Option<&Community>,
    paths: &FallbackPaths,
    configs: &PlatformConfig,
    state: &SearchState,
) -> Result<Option<Target>> {
    request.validate()?;
    if let Some(community) = community {
        community.validate()?;
    }
    paths.validate()?;
    configs.validate()?;

    let protocol = resolve_protocol(request, configs);
    let protocol_needs_redirect = protocol != request.scheme;

    let Some(reason) = select_reason(request, community, configs, state, protocol_needs_redirect)
    else {
        tracing::trace!(host = %request.host, "no redirect needed");
        return Ok(None);
    };

    let target = build_target(
        reason,
        request,
        community,
        paths,
        configs,
        protocol,
        protocol_needs_redirect,
    )?;
    tracing::debug!(
        host = %request.host,
        reason = reason.as_str(),
        status = ?target.status,
        "redirect decided"
    );
    Ok(Some(target))
}

/// Invokes `on_redirect` with the finished target iff a redirect is
/// warranted. The continuation runs at most once; when no reason is
/// produced the call returns without side effects.
pub fn needs_redirect(
    request: &RequestInfo,
    community: Option<&Community>,
    paths: &FallbackPaths,
    configs: &PlatformConfig,
    state: &SearchState,
    on_redirect: impl FnOnce(Target),
) -> Result<()> {
    if let Some(target) = redirect_target(request, community, paths, configs, state)? {
        on_redirect(target);
    }
    Ok(())
}
