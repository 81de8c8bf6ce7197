// src/api/pagination.rs
//! Offset-driven pagination over a space's objects.
//!
//! [`PageCursor`] holds the paging state machine; [`ObjectIds`] drives it
//! over a blocking transport and [`object_id_stream`] over the pooled one.
//! Ids come out in server order, page after page.

use super::parser::parse_objects_page;
use super::types::{ApiRequest, ObjectPage};
use super::{ApiContext, AsyncTransport, Transport};
use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::error::LoaderError;
use crate::types::{ObjectId, SpaceId};
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use serde_json::json;
use std::collections::VecDeque;
use std::sync::Arc;

/// Builds the listing request for one page.
///
/// With a query this is `POST /v1/spaces/{id}/search` carrying
/// `{"query": ...}`; without, `GET /v1/spaces/{id}/objects`.
pub fn page_request(ctx: &ApiContext, space_id: &SpaceId, offset: usize) -> ApiRequest {
    let request = match ctx.query.as_deref() {
        Some(query) => ApiRequest::post(
            ctx.base_url.join(&format!("/v1/spaces/{}/search", space_id)),
            json!({ "query": query }),
        ),
        None => ApiRequest::get(ctx.base_url.join(&format!("/v1/spaces/{}/objects", space_id))),
    };
    request.paged(ctx.page_size, offset)
}

/// Fetches and parses one page over a blocking transport.
pub fn fetch_page(
    transport: &dyn Transport,
    ctx: &ApiContext,
    space_id: &SpaceId,
    offset: usize,
) -> Result<ObjectPage, LoaderError> {
    let response = ctx.send(transport, &page_request(ctx, space_id, offset))?;
    Ok(parse_objects_page(&response.json()?, space_id, ctx.sink()))
}

/// Fetches and parses one page over the pooled transport.
pub async fn afetch_page(
    transport: &dyn AsyncTransport,
    ctx: &ApiContext,
    space_id: &SpaceId,
    offset: usize,
) -> Result<ObjectPage, LoaderError> {
    let response = ctx
        .send_async(transport, &page_request(ctx, space_id, offset))
        .await?;
    Ok(parse_objects_page(&response.json()?, space_id, ctx.sink()))
}

/// Paging state for one space.
///
/// The offset advances by the number of entries the server returned, not by
/// the page size. Paging ends when `has_more` is false or a page is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageCursor {
    offset: usize,
    finished: bool,
}

impl PageCursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Records a received page and moves to the next offset.
    pub fn advance(&mut self, page: &ObjectPage, space_id: &SpaceId, sink: &dyn DiagnosticSink) {
        if self.offset == 0 && page.ids.is_empty() {
            sink.emit(Diagnostic::NoObjects {
                space_id: space_id.clone(),
            });
        }

        log::debug!(
            "Space {}: {} entries at offset {} (has_more={})",
            space_id,
            page.returned,
            self.offset,
            page.has_more
        );

        if !page.has_more || page.returned == 0 {
            self.finished = true;
        } else {
            self.offset += page.returned;
        }
    }

    /// Stops paging, e.g. after an error.
    pub fn finish(&mut self) {
        self.finished = true;
    }
}

/// Lazy sequence of a space's object ids over a blocking transport.
///
/// A page is requested only once the previous page's ids are consumed. A
/// failed page yields its error once and ends the sequence.
pub struct ObjectIds {
    transport: Arc<dyn Transport>,
    ctx: ApiContext,
    space_id: SpaceId,
    cursor: PageCursor,
    buffered: VecDeque<ObjectId>,
}

impl ObjectIds {
    pub fn new(transport: Arc<dyn Transport>, ctx: ApiContext, space_id: SpaceId) -> Self {
        Self {
            transport,
            ctx,
            space_id,
            cursor: PageCursor::new(),
            buffered: VecDeque::new(),
        }
    }

    pub fn space_id(&self) -> &SpaceId {
        &self.space_id
    }
}

impl Iterator for ObjectIds {
    type Item = Result<ObjectId, LoaderError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(id) = self.buffered.pop_front() {
                return Some(Ok(id));
            }
            if self.cursor.is_finished() {
                return None;
            }

            match fetch_page(
                self.transport.as_ref(),
                &self.ctx,
                &self.space_id,
                self.cursor.offset(),
            ) {
                Ok(page) => {
                    self.cursor.advance(&page, &self.space_id, self.ctx.sink());
                    self.buffered.extend(page.ids);
                }
                Err(err) => {
                    self.cursor.finish();
                    return Some(Err(err));
                }
            }
        }
    }
}

/// Lazy stream of a space's object ids over the pooled transport.
///
/// Same paging rules as [`ObjectIds`]; the stream ends after an error.
pub fn object_id_stream(
    transport: Arc<dyn AsyncTransport>,
    ctx: ApiContext,
    space_id: SpaceId,
) -> BoxStream<'static, Result<ObjectId, LoaderError>> {
    stream::try_unfold(PageCursor::new(), move |mut cursor| {
        let transport = transport.clone();
        let ctx = ctx.clone();
        let space_id = space_id.clone();
        async move {
            if cursor.is_finished() {
                return Ok::<_, LoaderError>(None);
            }
            let page = afetch_page(transport.as_ref(), &ctx, &space_id, cursor.offset()).await?;
            cursor.advance(&page, &space_id, ctx.sink());
            Ok(Some((page.ids, cursor)))
        }
    })
    .map_ok(|ids| stream::iter(ids.into_iter().map(Ok)))
    .try_flatten()
    .boxed()
}
