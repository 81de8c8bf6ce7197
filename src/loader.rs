// src/loader.rs
//! The public entry point: resolve spaces once, then load them as records.
//!
//! ```no_run
//! use anytype_loader::{AnytypeLoader, LoaderConfig};
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = LoaderConfig::new("http://127.0.0.1:31009", "secret", ["Personal"])?;
//! let loader = AnytypeLoader::new(config)?;
//! for record in loader.lazy_load()? {
//!     println!("{}", record?.metadata.name);
//! }
//! # Ok(())
//! # }
//! ```

use crate::api::parallel_fetcher::concurrent_outcomes;
use crate::api::pagination::ObjectIds;
use crate::api::resolver::{aresolve_spaces, resolve_spaces};
use crate::api::sequential::SequentialOutcomes;
use crate::api::{ApiContext, ClientSlot, Connector, FetchOutcome, HttpConnector};
use crate::config::LoaderConfig;
use crate::diagnostics::{DiagnosticSink, LogSink};
use crate::error::LoaderError;
use crate::model::Record;
use crate::types::SpaceId;
use futures::stream::{BoxStream, StreamExt, TryStreamExt};
use indexmap::IndexMap;
use std::sync::Arc;

/// Loads the objects of named Anytype spaces as [`Record`]s.
///
/// Sequential methods (`lazy_load`, `load`) block and must not be called
/// from async code. Concurrent methods (`alazy_load`, `aload`) share one
/// pooled client that stays open until [`AnytypeLoader::aclose`].
pub struct AnytypeLoader {
    config: LoaderConfig,
    connector: Arc<dyn Connector>,
    ctx: ApiContext,
    spaces: IndexMap<SpaceId, String>,
    pool: ClientSlot,
}

/// Configures how a loader reaches the API before resolving its spaces.
pub struct LoaderBuilder {
    config: LoaderConfig,
    connector: Option<Arc<dyn Connector>>,
    sink: Option<Arc<dyn DiagnosticSink>>,
}

impl LoaderBuilder {
    /// Replaces the reqwest connector, e.g. with an in-memory one.
    pub fn connector(mut self, connector: Arc<dyn Connector>) -> Self {
        self.connector = Some(connector);
        self
    }

    /// Sends diagnostics somewhere other than the log.
    pub fn diagnostics(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    fn parts(self) -> (LoaderConfig, Arc<dyn Connector>, ApiContext) {
        let connector = self.connector.unwrap_or_else(|| {
            Arc::new(HttpConnector::new(
                self.config.api_key.clone(),
                self.config.request_timeout,
            ))
        });
        let ctx = ApiContext {
            base_url: self.config.base_url.clone(),
            page_size: self.config.page_size,
            query: self.config.query.clone(),
            retry_policy: self.config.retry_policy,
            sink: self.sink.unwrap_or_else(|| Arc::new(LogSink)),
        };
        (self.config, connector, ctx)
    }

    /// Resolves space names with a blocking request.
    pub fn build(self) -> Result<AnytypeLoader, LoaderError> {
        let (config, connector, ctx) = self.parts();
        let transport = connector.blocking()?;
        let spaces = resolve_spaces(transport.as_ref(), &ctx, &config.space_names)?;
        Ok(AnytypeLoader {
            config,
            connector,
            ctx,
            spaces,
            pool: ClientSlot::new(),
        })
    }

    /// Resolves space names over the pooled client, which stays open.
    pub async fn connect(self) -> Result<AnytypeLoader, LoaderError> {
        let (config, connector, ctx) = self.parts();
        let pool = ClientSlot::new();
        let transport = pool.get_or_open(connector.as_ref(), config.max_concurrency)?;
        let spaces = aresolve_spaces(transport.as_ref(), &ctx, &config.space_names).await?;
        Ok(AnytypeLoader {
            config,
            connector,
            ctx,
            spaces,
            pool,
        })
    }
}

impl AnytypeLoader {
    /// Resolves the configured space names over HTTP, blocking.
    pub fn new(config: LoaderConfig) -> Result<Self, LoaderError> {
        Self::builder(config).build()
    }

    pub fn builder(config: LoaderConfig) -> LoaderBuilder {
        LoaderBuilder {
            config,
            connector: None,
            sink: None,
        }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Resolved space ids, in listing order.
    pub fn space_ids(&self) -> Vec<SpaceId> {
        self.spaces.keys().cloned().collect()
    }

    pub fn space_name_map(&self) -> &IndexMap<SpaceId, String> {
        &self.spaces
    }

    pub fn is_pool_open(&self) -> bool {
        self.pool.is_open()
    }

    fn space_list(&self) -> Vec<(SpaceId, String)> {
        self.spaces
            .iter()
            .map(|(id, name)| (id.clone(), name.clone()))
            .collect()
    }

    /// Object ids of one space, paged lazily over the blocking client.
    pub fn object_ids(&self, space_id: &SpaceId) -> Result<ObjectIds, LoaderError> {
        let transport = self.connector.blocking()?;
        Ok(ObjectIds::new(transport, self.ctx.clone(), space_id.clone()))
    }

    // --- Sequential ---

    /// Every fetch outcome, one request at a time, in space and page order.
    pub fn lazy_outcomes(&self) -> Result<SequentialOutcomes, LoaderError> {
        let transport = self.connector.blocking()?;
        Ok(SequentialOutcomes::new(
            transport,
            self.ctx.clone(),
            self.space_list(),
        ))
    }

    /// Records in space and page order. Skipped objects are left out;
    /// failures are yielded as `Err` and iteration continues.
    pub fn lazy_load(
        &self,
    ) -> Result<impl Iterator<Item = Result<Record, LoaderError>>, LoaderError> {
        Ok(self.lazy_outcomes()?.filter_map(FetchOutcome::into_record))
    }

    /// Collects every record, stopping at the first failure.
    pub fn load(&self) -> Result<Vec<Record>, LoaderError> {
        let records = self.lazy_load()?.collect::<Result<Vec<_>, _>>()?;
        log::info!("Loaded {} record(s)", records.len());
        Ok(records)
    }

    // --- Concurrent ---

    /// Every fetch outcome, in completion order, opening the pool if needed.
    pub async fn alazy_outcomes(&self) -> Result<BoxStream<'static, FetchOutcome>, LoaderError> {
        let transport = self
            .pool
            .get_or_open(self.connector.as_ref(), self.config.max_concurrency)?;
        Ok(concurrent_outcomes(
            transport,
            self.ctx.clone(),
            self.space_list(),
            self.config.max_concurrency,
        ))
    }

    /// Records in completion order. Skipped objects are left out; failures
    /// are yielded as `Err` and the stream continues.
    pub async fn alazy_load(
        &self,
    ) -> Result<BoxStream<'static, Result<Record, LoaderError>>, LoaderError> {
        let outcomes = self.alazy_outcomes().await?;
        Ok(outcomes
            .filter_map(|outcome| futures::future::ready(outcome.into_record()))
            .boxed())
    }

    /// Collects every record, stopping at the first failure.
    ///
    /// Fetches not yet started when a failure arrives are abandoned.
    pub async fn aload(&self) -> Result<Vec<Record>, LoaderError> {
        let records: Vec<Record> = self.alazy_load().await?.try_collect().await?;
        log::info!("Loaded {} record(s) concurrently", records.len());
        Ok(records)
    }

    /// Releases the pooled client. Safe to call more than once.
    pub async fn aclose(&self) {
        self.pool.release();
    }
}

impl std::fmt::Debug for AnytypeLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnytypeLoader")
            .field("base_url", &self.config.base_url)
            .field("spaces", &self.spaces)
            .field("pool", &self.pool)
            .finish_non_exhaustive()
    }
}
