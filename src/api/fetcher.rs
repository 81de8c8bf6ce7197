// src/api/fetcher.rs
//! Single object fetch, shared by both orchestration modes.
//!
//! A fetch never returns `Err`: request failures and malformed bodies
//! become [`FetchOutcome::Failed`] for that object. The orchestrators stop
//! on failures where [`FetchOutcome::ends_run`] holds and carry on past
//! the rest.

use super::parser::{normalize_object, parse_object_detail};
use super::types::{ApiRequest, ApiResponse, FetchOutcome};
use super::{ApiContext, AsyncTransport, Transport};
use crate::diagnostics::DiagnosticSink;
use crate::error::LoaderError;
use crate::types::{ObjectId, SpaceId};

/// `GET /v1/spaces/{space_id}/objects/{object_id}`
pub fn object_request(ctx: &ApiContext, space_id: &SpaceId, object_id: &ObjectId) -> ApiRequest {
    ApiRequest::get(
        ctx.base_url
            .join(&format!("/v1/spaces/{}/objects/{}", space_id, object_id)),
    )
}

/// The object a fetch is about.
#[derive(Debug, Clone, Copy)]
pub struct FetchTarget<'a> {
    pub space_id: &'a SpaceId,
    pub space_name: &'a str,
    pub object_id: &'a ObjectId,
}

/// Fetches one object over a blocking transport.
pub fn fetch_object(
    transport: &dyn Transport,
    ctx: &ApiContext,
    target: FetchTarget<'_>,
) -> FetchOutcome {
    let request = object_request(ctx, target.space_id, target.object_id);
    interpret_detail(ctx.send(transport, &request), target, ctx.sink())
}

/// Fetches one object over the pooled transport.
pub async fn afetch_object(
    transport: &dyn AsyncTransport,
    ctx: &ApiContext,
    target: FetchTarget<'_>,
) -> FetchOutcome {
    let request = object_request(ctx, target.space_id, target.object_id);
    let response = ctx.send_async(transport, &request).await;
    interpret_detail(response, target, ctx.sink())
}

/// Turns the result of a detail request into an outcome.
pub fn interpret_detail(
    response: Result<ApiResponse, LoaderError>,
    target: FetchTarget<'_>,
    sink: &dyn DiagnosticSink,
) -> FetchOutcome {
    let detail = response
        .and_then(|response| response.json())
        .and_then(|body| parse_object_detail(&body, target.object_id));

    match detail {
        Ok(detail) => normalize_object(
            target.space_id,
            target.space_name,
            target.object_id,
            detail,
            sink,
        ),
        Err(error) => {
            log::debug!("Fetching object {} failed: {}", target.object_id, error);
            FetchOutcome::Failed {
                space_id: target.space_id.clone(),
                object_id: Some(target.object_id.clone()),
                error,
            }
        }
    }
}
