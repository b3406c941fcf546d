//! Availability registry
//!
//! Every data source occupies one [`AdapterSlot`]. A slot is resolved exactly
//! once, when the registry is built, by calling the factory injected for it.
//! A factory that fails (missing credential, feature not compiled in, client
//! construction error) leaves the slot unavailable with the reason recorded;
//! resolution itself never fails. After `build()` the registry is read-only
//! and can be shared freely across concurrent operations.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

use crate::capability::{
    CentralBankSource, DisclosureSource, FilingsSource, NewsSource, PriceSource,
    StatisticsSource,
};
use crate::error::Unavailable;
use crate::source::SourceId;

/// Availability of one source, as reported by the health check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceStatus {
    pub source: SourceId,
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unavailable_reason: Option<String>,
}

/// Handle to one adapter, tracking whether it is usable
pub struct AdapterSlot<A: ?Sized> {
    source: SourceId,
    state: Result<Arc<A>, Unavailable>,
}

impl<A: ?Sized> AdapterSlot<A> {
    /// Resolve a slot by running its factory once
    pub fn resolve<F>(source: SourceId, factory: F) -> Self
    where
        F: FnOnce() -> Result<Arc<A>, Unavailable>,
    {
        let state = factory();
        match &state {
            Ok(_) => debug!(source = %source, "adapter available"),
            Err(reason) => info!(source = %source, %reason, "adapter unavailable"),
        }
        Self { source, state }
    }

    /// A slot with no adapter registered at all
    pub fn unregistered(source: SourceId) -> Self {
        Self::resolve(source, || {
            Err(Unavailable::MissingDependency(format!(
                "no {} adapter registered",
                source.display_name()
            )))
        })
    }

    pub fn source(&self) -> SourceId {
        self.source
    }

    pub fn is_available(&self) -> bool {
        self.state.is_ok()
    }

    /// The adapter, when the slot is usable
    pub fn adapter(&self) -> Option<&Arc<A>> {
        self.state.as_ref().ok()
    }

    pub fn unavailable_reason(&self) -> Option<&Unavailable> {
        self.state.as_ref().err()
    }

    pub fn status(&self) -> SourceStatus {
        SourceStatus {
            source: self.source,
            available: self.is_available(),
            unavailable_reason: self.unavailable_reason().map(ToString::to_string),
        }
    }
}

impl<A: ?Sized> fmt::Debug for AdapterSlot<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdapterSlot")
            .field("source", &self.source)
            .field("available", &self.is_available())
            .field("unavailable_reason", &self.unavailable_reason())
            .finish()
    }
}

/// Process-wide view of which adapters are usable
#[derive(Debug)]
pub struct AvailabilityRegistry {
    filings: AdapterSlot<dyn FilingsSource>,
    disclosures: AdapterSlot<dyn DisclosureSource>,
    statistics: AdapterSlot<dyn StatisticsSource>,
    central_bank: AdapterSlot<dyn CentralBankSource>,
    news: AdapterSlot<dyn NewsSource>,
    prices: AdapterSlot<dyn PriceSource>,
}

impl AvailabilityRegistry {
    /// Create a registry builder
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    pub fn filings(&self) -> &AdapterSlot<dyn FilingsSource> {
        &self.filings
    }

    pub fn disclosures(&self) -> &AdapterSlot<dyn DisclosureSource> {
        &self.disclosures
    }

    pub fn statistics(&self) -> &AdapterSlot<dyn StatisticsSource> {
        &self.statistics
    }

    pub fn central_bank(&self) -> &AdapterSlot<dyn CentralBankSource> {
        &self.central_bank
    }

    pub fn news(&self) -> &AdapterSlot<dyn NewsSource> {
        &self.news
    }

    pub fn prices(&self) -> &AdapterSlot<dyn PriceSource> {
        &self.prices
    }

    /// Availability of every source, in canonical order
    pub fn status(&self) -> Vec<SourceStatus> {
        SourceId::ALL
            .iter()
            .map(|&source| self.status_of(source))
            .collect()
    }

    pub fn status_of(&self, source: SourceId) -> SourceStatus {
        match source {
            SourceId::Edinet => self.filings.status(),
            SourceId::Tdnet => self.disclosures.status(),
            SourceId::Estat => self.statistics.status(),
            SourceId::Boj => self.central_bank.status(),
            SourceId::News => self.news.status(),
            SourceId::StockPrice => self.prices.status(),
        }
    }

    /// Number of usable sources
    pub fn available_count(&self) -> usize {
        self.status().iter().filter(|s| s.available).count()
    }
}

type Factory<A> = Box<dyn FnOnce() -> Result<Arc<A>, Unavailable> + Send>;

/// Builder for [`AvailabilityRegistry`]
///
/// One factory per slot; a slot without a factory resolves as unavailable.
#[derive(Default)]
pub struct RegistryBuilder {
    filings: Option<Factory<dyn FilingsSource>>,
    disclosures: Option<Factory<dyn DisclosureSource>>,
    statistics: Option<Factory<dyn StatisticsSource>>,
    central_bank: Option<Factory<dyn CentralBankSource>>,
    news: Option<Factory<dyn NewsSource>>,
    prices: Option<Factory<dyn PriceSource>>,
}

impl RegistryBuilder {
    /// Set the securities-filings (EDINET) factory
    pub fn filings<F>(mut self, factory: F) -> Self
    where
        F: FnOnce() -> Result<Arc<dyn FilingsSource>, Unavailable> + Send + 'static,
    {
        self.filings = Some(Box::new(factory));
        self
    }

    /// Set the timely-disclosure (TDnet) factory
    pub fn disclosures<F>(mut self, factory: F) -> Self
    where
        F: FnOnce() -> Result<Arc<dyn DisclosureSource>, Unavailable> + Send + 'static,
    {
        self.disclosures = Some(Box::new(factory));
        self
    }

    /// Set the government-statistics (e-Stat) factory
    pub fn statistics<F>(mut self, factory: F) -> Self
    where
        F: FnOnce() -> Result<Arc<dyn StatisticsSource>, Unavailable> + Send + 'static,
    {
        self.statistics = Some(Box::new(factory));
        self
    }

    /// Set the central-bank (BOJ) factory
    pub fn central_bank<F>(mut self, factory: F) -> Self
    where
        F: FnOnce() -> Result<Arc<dyn CentralBankSource>, Unavailable> + Send + 'static,
    {
        self.central_bank = Some(Box::new(factory));
        self
    }

    /// Set the news factory
    pub fn news<F>(mut self, factory: F) -> Self
    where
        F: FnOnce() -> Result<Arc<dyn NewsSource>, Unavailable> + Send + 'static,
    {
        self.news = Some(Box::new(factory));
        self
    }

    /// Set the stock-price factory
    pub fn prices<F>(mut self, factory: F) -> Self
    where
        F: FnOnce() -> Result<Arc<dyn PriceSource>, Unavailable> + Send + 'static,
    {
        self.prices = Some(Box::new(factory));
        self
    }

    /// Resolve every slot
    pub fn build(self) -> AvailabilityRegistry {
        fn slot<A: ?Sized>(source: SourceId, factory: Option<Factory<A>>) -> AdapterSlot<A> {
            match factory {
                Some(factory) => AdapterSlot::resolve(source, factory),
                None => AdapterSlot::unregistered(source),
            }
        }

        let registry = AvailabilityRegistry {
            filings: slot(SourceId::Edinet, self.filings),
            disclosures: slot(SourceId::Tdnet, self.disclosures),
            statistics: slot(SourceId::Estat, self.statistics),
            central_bank: slot(SourceId::Boj, self.central_bank),
            news: slot(SourceId::News, self.news),
            prices: slot(SourceId::StockPrice, self.prices),
        };

        info!(
            "Resolved data sources: {}/{} available",
            registry.available_count(),
            SourceId::ALL.len()
        );

        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::Headline;
    use crate::error::AdapterResult;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StaticNews;

    #[async_trait]
    impl NewsSource for StaticNews {
        async fn headlines(
            &self,
            _query: Option<&str>,
            _limit: usize,
        ) -> AdapterResult<Vec<Headline>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_unregistered_slots_are_unavailable() {
        let registry = AvailabilityRegistry::builder().build();
        let status = registry.status();

        assert_eq!(status.len(), 6);
        assert!(status.iter().all(|s| !s.available));
        assert!(
            status
                .iter()
                .all(|s| s.unavailable_reason.as_deref().unwrap().starts_with("missing dependency"))
        );
        assert_eq!(registry.available_count(), 0);
    }

    #[test]
    fn test_factory_failure_is_recorded() {
        let registry = AvailabilityRegistry::builder()
            .statistics(|| Err(Unavailable::MissingCredential("ESTAT_APP_ID".to_string())))
            .news(|| Ok(Arc::new(StaticNews) as Arc<dyn NewsSource>))
            .build();

        let estat = registry.status_of(SourceId::Estat);
        assert!(!estat.available);
        assert_eq!(
            estat.unavailable_reason.as_deref(),
            Some("missing credential: ESTAT_APP_ID")
        );

        let news = registry.status_of(SourceId::News);
        assert!(news.available);
        assert!(news.unavailable_reason.is_none());
        assert!(registry.news().adapter().is_some());
    }

    #[test]
    fn test_factory_runs_exactly_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let registry = AvailabilityRegistry::builder()
            .news(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(Arc::new(StaticNews) as Arc<dyn NewsSource>)
            })
            .build();

        let _ = registry.status();
        let _ = registry.status();
        assert!(registry.news().is_available());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_status_order_is_canonical() {
        let registry = AvailabilityRegistry::builder().build();
        let order: Vec<SourceId> = registry.status().iter().map(|s| s.source).collect();
        assert_eq!(order, SourceId::ALL.to_vec());
    }
}
