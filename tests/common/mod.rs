// tests/common/mod.rs
//! In-memory Anytype API used by the loader integration tests.
#![allow(dead_code)]

use anytype_loader::{
    ApiRequest, ApiResponse, AsyncTransport, Connector, LoaderConfig, LoaderError, RetryPolicy,
    Transport,
};
use parking_lot::Mutex;
use serde_json::json;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const LIST_SPACES: &str = include_str!("../fixtures/api_responses/list_spaces.json");
pub const SPACE_1_OBJECTS: &str = include_str!("../fixtures/api_responses/space_1_objects.json");
pub const OBJECT_OBJ_1: &str = include_str!("../fixtures/api_responses/object_obj_1.json");
pub const OBJECT_WITHOUT_MARKDOWN: &str =
    include_str!("../fixtures/api_responses/object_without_markdown.json");

/// Object ids listed in `space_1_objects.json`.
pub fn fixture_ids() -> Vec<String> {
    let body: serde_json::Value = serde_json::from_str(SPACE_1_OBJECTS).unwrap();
    body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| entry["id"].as_str().unwrap().to_string())
        .collect()
}

/// A scripted Anytype server.
///
/// Listings are paged from `objects` by the request's limit and offset.
/// Details come from `details` (the last scripted response repeats) or are
/// generated. Detail requests are counted to measure concurrency.
pub struct FakeAnytype {
    spaces: Mutex<(u16, String)>,
    objects: BTreeMap<String, Vec<String>>,
    details: Mutex<HashMap<String, VecDeque<(u16, String)>>>,
    detail_delay: Duration,
    requests: Mutex<Vec<ApiRequest>>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl FakeAnytype {
    pub fn new() -> Self {
        Self {
            spaces: Mutex::new((200, LIST_SPACES.to_string())),
            objects: BTreeMap::new(),
            details: Mutex::new(HashMap::new()),
            detail_delay: Duration::ZERO,
            requests: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    /// Lists `ids` in `space_id`.
    pub fn with_objects<I, S>(mut self, space_id: &str, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.objects
            .insert(space_id.to_string(), ids.into_iter().map(Into::into).collect());
        self
    }

    /// Lists `count` generated ids (`{prefix}-1`..) in `space_id`.
    pub fn with_generated(self, space_id: &str, prefix: &str, count: usize) -> Self {
        self.with_objects(space_id, (1..=count).map(|i| format!("{prefix}-{i}")))
    }

    /// Scripts the detail responses for one object, served in order.
    pub fn with_detail(self, object_id: &str, responses: &[(u16, &str)]) -> Self {
        self.details.lock().insert(
            object_id.to_string(),
            responses
                .iter()
                .map(|(status, body)| (*status, body.to_string()))
                .collect(),
        );
        self
    }

    pub fn with_spaces_response(self, status: u16, body: &str) -> Self {
        *self.spaces.lock() = (status, body.to_string());
        self
    }

    /// Makes every async detail request take this long.
    pub fn with_detail_delay(mut self, delay: Duration) -> Self {
        self.detail_delay = delay;
        self
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().clone()
    }

    /// `(space_id, offset)` of every listing request, in order.
    pub fn listing_offsets(&self) -> Vec<(String, usize)> {
        self.requests()
            .iter()
            .filter_map(|request| {
                let (space_id, _) = listing_target(&request.url)?;
                let offset = request.query_param("offset")?.parse().ok()?;
                Some((space_id.to_string(), offset))
            })
            .collect()
    }

    pub fn detail_requests(&self) -> usize {
        self.requests()
            .iter()
            .filter(|request| detail_target(&request.url).is_some())
            .count()
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    fn respond(&self, request: &ApiRequest) -> ApiResponse {
        self.requests.lock().push(request.clone());
        let url = request.url.clone();

        if url.ends_with("/v1/spaces") {
            let (status, body) = self.spaces.lock().clone();
            return ApiResponse::new(status, body, url);
        }

        if let Some((space_id, _)) = listing_target(&url) {
            let ids = self.objects.get(space_id).cloned().unwrap_or_default();
            let limit: usize = request.query_param("limit").unwrap().parse().unwrap();
            let offset: usize = request.query_param("offset").unwrap().parse().unwrap();
            let page: Vec<_> = ids
                .iter()
                .skip(offset)
                .take(limit)
                .map(|id| json!({ "id": id }))
                .collect();
            let body = json!({
                "data": page,
                "pagination": {"has_more": offset + limit < ids.len()},
            });
            return ApiResponse::new(200, body.to_string(), url);
        }

        if let Some(object_id) = detail_target(&url) {
            let mut details = self.details.lock();
            if let Some(script) = details.get_mut(object_id) {
                let (status, body) = if script.len() > 1 {
                    script.pop_front().unwrap()
                } else {
                    script.front().cloned().unwrap()
                };
                return ApiResponse::new(status, body, url);
            }
            let body = json!({
                "object": {
                    "markdown": format!("# {object_id}"),
                    "name": object_id,
                    "archived": false,
                    "type": {"name": "Page"},
                }
            });
            return ApiResponse::new(200, body.to_string(), url);
        }

        ApiResponse::new(404, r#"{"message": "not found"}"#, url)
    }
}

/// `(space_id, endpoint)` when the URL is a listing or search.
fn listing_target(url: &str) -> Option<(&str, &str)> {
    let rest = url.split("/v1/spaces/").nth(1)?;
    let mut parts = rest.split('/');
    let space_id = parts.next()?;
    let endpoint = parts.next()?;
    if parts.next().is_some() || !(endpoint == "objects" || endpoint == "search") {
        return None;
    }
    Some((space_id, endpoint))
}

/// The object id when the URL is an object detail.
fn detail_target(url: &str) -> Option<&str> {
    let rest = url.split("/v1/spaces/").nth(1)?;
    let mut parts = rest.split('/');
    let _space_id = parts.next()?;
    (parts.next()? == "objects").then_some(())?;
    let object_id = parts.next()?;
    parts.next().is_none().then_some(object_id)
}

impl Transport for FakeAnytype {
    fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, LoaderError> {
        Ok(self.respond(request))
    }
}

#[async_trait::async_trait]
impl AsyncTransport for FakeAnytype {
    async fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, LoaderError> {
        if detail_target(&request.url).is_none() {
            return Ok(self.respond(request));
        }

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.detail_delay).await;
        let response = self.respond(request);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(response)
    }
}

/// Hands out the same fake server for both modes and counts pool openings.
pub struct FakeConnector {
    pub server: Arc<FakeAnytype>,
    pools_opened: AtomicUsize,
}

impl FakeConnector {
    pub fn new(server: FakeAnytype) -> Arc<Self> {
        Arc::new(Self {
            server: Arc::new(server),
            pools_opened: AtomicUsize::new(0),
        })
    }

    pub fn pools_opened(&self) -> usize {
        self.pools_opened.load(Ordering::SeqCst)
    }
}

impl Connector for FakeConnector {
    fn blocking(&self) -> Result<Arc<dyn Transport>, LoaderError> {
        Ok(self.server.clone())
    }

    fn open_pool(&self, _max_concurrency: usize) -> Result<Arc<dyn AsyncTransport>, LoaderError> {
        self.pools_opened.fetch_add(1, Ordering::SeqCst);
        Ok(self.server.clone())
    }
}

/// A config against the fake server that retries without sleeping.
pub fn test_config(space_names: &[&str]) -> LoaderConfig {
    LoaderConfig::new("http://anytype.test", "secret", space_names.iter().copied())
        .unwrap()
        .with_retry_policy(RetryPolicy::new(3, Duration::ZERO))
}
