pub mod aave;
pub mod contracts;
pub mod http;
pub mod morpho;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::{Config, SourceKind, TrackedEntity};
use crate::errors::{ConfigError, FetchError};
use crate::metrics::Reading;
use crate::sources::aave::AaveSource;
use crate::sources::morpho::MorphoSource;

/// Produces a reading for one tracked entity. The transport behind it may
/// issue several sub-requests; callers only see the assembled reading.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    fn kind(&self) -> SourceKind;
    async fn fetch(&self, entity: &TrackedEntity) -> Result<Reading, FetchError>;
}

#[derive(Clone, Default)]
pub struct SourceRegistry {
    adapters: BTreeMap<SourceKind, Arc<dyn SourceAdapter>>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build one adapter per source kind used by the configured entities.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let mut registry = Self::new();
        for entity in &config.entities {
            let kind = entity.adapter.source();
            if registry.adapters.contains_key(&kind) {
                continue;
            }
            let adapter: Arc<dyn SourceAdapter> = match kind {
                SourceKind::Aave => Arc::new(AaveSource::connect(&config.rpc.url)?),
                SourceKind::Morpho => Arc::new(MorphoSource::new(config.morpho.api_url.clone())),
            };
            registry = registry.with_adapter(adapter);
        }
        Ok(registry)
    }

    pub fn with_adapter(mut self, adapter: Arc<dyn SourceAdapter>) -> Self {
        self.adapters.insert(adapter.kind(), adapter);
        self
    }

    pub fn get(&self, kind: SourceKind) -> Option<Arc<dyn SourceAdapter>> {
        self.adapters.get(&kind).cloned()
    }

    /// Fetch with a hard per-call deadline.
    pub async fn fetch(
        &self,
        entity: &TrackedEntity,
        timeout: Duration,
    ) -> Result<Reading, FetchError> {
        let kind = entity.adapter.source();
        let Some(adapter) = self.get(kind) else {
            return Err(FetchError::NoAdapter(kind.as_slug().to_string()));
        };
        match tokio::time::timeout(timeout, adapter.fetch(entity)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout(timeout.as_secs())),
        }
    }
}
