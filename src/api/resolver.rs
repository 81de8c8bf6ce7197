// src/api/resolver.rs
//! Space name to id resolution.

use super::parser::parse_spaces_response;
use super::types::{ApiRequest, ApiResponse, SpaceEntry};
use super::{ApiContext, AsyncTransport, Transport};
use crate::constants::SPACE_LISTING_LIMIT;
use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::error::LoaderError;
use crate::types::{BaseUrl, SpaceId};
use indexmap::IndexMap;
use std::collections::HashSet;

/// `GET /v1/spaces?limit=100&offset=0`
pub fn spaces_request(base_url: &BaseUrl) -> ApiRequest {
    ApiRequest::get(base_url.join("/v1/spaces")).paged(SPACE_LISTING_LIMIT, 0)
}

/// Resolves wanted space names over a blocking transport.
pub fn resolve_spaces(
    transport: &dyn Transport,
    ctx: &ApiContext,
    wanted: &[String],
) -> Result<IndexMap<SpaceId, String>, LoaderError> {
    let response = ctx.send(transport, &spaces_request(&ctx.base_url))?;
    resolve_from_response(&response, wanted, ctx.sink())
}

/// Resolves wanted space names over the pooled transport.
pub async fn aresolve_spaces(
    transport: &dyn AsyncTransport,
    ctx: &ApiContext,
    wanted: &[String],
) -> Result<IndexMap<SpaceId, String>, LoaderError> {
    let response = ctx
        .send_async(transport, &spaces_request(&ctx.base_url))
        .await?;
    resolve_from_response(&response, wanted, ctx.sink())
}

fn resolve_from_response(
    response: &ApiResponse,
    wanted: &[String],
    sink: &dyn DiagnosticSink,
) -> Result<IndexMap<SpaceId, String>, LoaderError> {
    let entries = parse_spaces_response(&response.json()?, sink);
    let resolved = match_spaces(entries, wanted, sink)?;
    log::info!(
        "Resolved {} space(s): {}",
        resolved.len(),
        resolved.values().cloned().collect::<Vec<_>>().join(", ")
    );
    Ok(resolved)
}

/// Keeps the listed spaces whose name was asked for, keyed by id.
///
/// Entries without an id are ignored. When two entries share an id the
/// later one wins. Wanted names with no match are reported once, together.
pub fn match_spaces(
    entries: Vec<SpaceEntry>,
    wanted: &[String],
    sink: &dyn DiagnosticSink,
) -> Result<IndexMap<SpaceId, String>, LoaderError> {
    let wanted_set: HashSet<&str> = wanted.iter().map(String::as_str).collect();
    let mut resolved = IndexMap::new();

    for entry in entries {
        let (Some(id), Some(name)) = (entry.id, entry.name) else {
            continue;
        };
        if wanted_set.contains(name.as_str()) {
            resolved.insert(SpaceId::from_trusted(id), name);
        }
    }

    let found: HashSet<&str> = resolved.values().map(String::as_str).collect();
    let mut reported = HashSet::new();
    let missing: Vec<String> = wanted
        .iter()
        .filter(|name| !found.contains(name.as_str()) && reported.insert(name.as_str()))
        .cloned()
        .collect();

    if !missing.is_empty() {
        sink.emit(Diagnostic::UnknownSpaces { names: missing });
    }

    if resolved.is_empty() {
        return Err(LoaderError::Configuration(
            "At least one space name must resolve to an id".to_string(),
        ));
    }

    Ok(resolved)
}
