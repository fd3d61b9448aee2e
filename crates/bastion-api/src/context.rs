//! Request headers that feed the command context.

use axum::http::HeaderMap;
use bastion_core::command::CommandContext;
use bastion_core::error::DomainError;
use uuid::Uuid;

use crate::state::AppState;

/// Tenant the request acts for.
pub const RESOURCE_OWNER_HEADER: &str = "x-resource-owner";
/// Principal recorded on produced events.
pub const ACTOR_HEADER: &str = "x-actor";
/// Correlation id propagated onto produced events.
pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";

const ANONYMOUS_ACTOR: &str = "anonymous";

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// The resource owner header, if present.
#[must_use]
pub fn resource_owner(headers: &HeaderMap) -> Option<&str> {
    header(headers, RESOURCE_OWNER_HEADER)
}

/// The resource owner header.
///
/// # Errors
///
/// Returns `DomainError::InvalidArgument` if the header is missing or blank.
pub fn require_resource_owner(headers: &HeaderMap) -> Result<&str, DomainError> {
    resource_owner(headers).ok_or_else(|| {
        DomainError::invalid_argument(format!("{RESOURCE_OWNER_HEADER} header is required"))
    })
}

/// Builds the context for one write request. The deadline starts now.
#[must_use]
pub fn command_context(state: &AppState, headers: &HeaderMap) -> CommandContext {
    let mut ctx = CommandContext::new(header(headers, ACTOR_HEADER).unwrap_or(ANONYMOUS_ACTOR))
        .with_timeout(state.request_timeout);
    if let Some(correlation_id) =
        header(headers, CORRELATION_ID_HEADER).and_then(|raw| Uuid::parse_str(raw).ok())
    {
        ctx = ctx.with_correlation_id(correlation_id);
    }
    ctx
}
