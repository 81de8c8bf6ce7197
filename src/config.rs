// src/config.rs
use crate::constants::{
    API_KEY_ENV_VAR, DEFAULT_BASE_URL, DEFAULT_MAX_CONCURRENCY, DEFAULT_PAGE_SIZE,
    REQUEST_TIMEOUT,
};
use crate::error::LoaderError;
use crate::error_recovery::RetryPolicy;
use crate::types::{ApiKey, BaseUrl, ValidationError};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Parsed and validated command-line input.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CommandLineInput {
    /// Names of the Anytype spaces to load (e.g., "Personal" "Work")
    #[arg(required = true)]
    pub space_names: Vec<String>,

    /// Base URL of the Anytype API
    #[arg(short, long, default_value = DEFAULT_BASE_URL)]
    pub url: String,

    /// Number of object ids requested per page
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    pub page_size: u32,

    /// Free-text search query; only matching objects are loaded
    #[arg(short, long)]
    pub query: Option<String>,

    /// Fetch objects concurrently instead of one at a time
    #[arg(short, long, default_value_t = false)]
    pub concurrent: bool,

    /// Maximum object fetches in flight with --concurrent
    #[arg(long, default_value_t = DEFAULT_MAX_CONCURRENCY)]
    pub max_concurrency: usize,

    /// Output file for the JSON-lines records (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Enable verbose logging (debug level)
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

/// Resolved loader configuration, validated before any request is made.
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    pub base_url: BaseUrl,
    pub api_key: ApiKey,
    pub space_names: Vec<String>,
    pub page_size: u32,
    pub query: Option<String>,
    pub max_concurrency: usize,
    pub request_timeout: Duration,
    pub retry_policy: RetryPolicy,
}

impl LoaderConfig {
    /// Validates the three required settings; everything else takes its default.
    pub fn new<I, S>(url: &str, api_key: &str, space_names: I) -> Result<Self, LoaderError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if url.trim().is_empty() || api_key.trim().is_empty() {
            return Err(LoaderError::Configuration(
                "url and api_key are required".to_string(),
            ));
        }

        let space_names: Vec<String> = space_names
            .into_iter()
            .map(Into::into)
            .filter(|name: &String| !name.trim().is_empty())
            .collect();
        if space_names.is_empty() {
            return Err(LoaderError::Configuration(
                "At least one space name is required".to_string(),
            ));
        }

        Ok(Self {
            base_url: BaseUrl::parse(url)?,
            api_key: ApiKey::new(api_key)?,
            space_names,
            page_size: DEFAULT_PAGE_SIZE,
            query: None,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            request_timeout: REQUEST_TIMEOUT,
            retry_policy: RetryPolicy::default(),
        })
    }

    pub fn with_page_size(mut self, page_size: u32) -> Result<Self, LoaderError> {
        if page_size == 0 {
            return Err(ValidationError::OutOfBounds {
                value: 0,
                min: 1,
                max: u64::from(u32::MAX),
            }
            .into());
        }
        self.page_size = page_size;
        Ok(self)
    }

    /// Sets the search query. A blank query means a plain listing.
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        let query = query.into();
        self.query = (!query.trim().is_empty()).then_some(query);
        self
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Result<Self, LoaderError> {
        if max_concurrency == 0 {
            return Err(ValidationError::OutOfBounds {
                value: 0,
                min: 1,
                max: u64::from(u32::MAX),
            }
            .into());
        }
        self.max_concurrency = max_concurrency;
        Ok(self)
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Resolves a complete configuration from CLI input and environment.
    pub fn resolve(cli: &CommandLineInput) -> Result<Self, LoaderError> {
        let api_key = std::env::var(API_KEY_ENV_VAR).map_err(|_| {
            LoaderError::Configuration(format!("{} environment variable not set", API_KEY_ENV_VAR))
        })?;

        let mut config = Self::new(&cli.url, &api_key, cli.space_names.iter().cloned())?
            .with_page_size(cli.page_size)?
            .with_max_concurrency(cli.max_concurrency)?;
        if let Some(query) = &cli.query {
            config = config.with_query(query.as_str());
        }
        Ok(config)
    }
}

/// Where the CLI writes records.
pub fn output_path(cli: &CommandLineInput) -> Option<PathBuf> {
    cli.output.as_ref().map(PathBuf::from)
}
