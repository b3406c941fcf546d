//! Wiring of the concrete clients into the availability registry
//!
//! One factory per slot. A factory reports why its slot is unusable instead
//! of failing: switched off by configuration, client compiled out, missing
//! credential, or client construction error.

use jpfin_core::{AvailabilityRegistry, SourceId, Unavailable};
use std::sync::Arc;

use crate::config::SourceConfig;

/// Build the registry for every source from one configuration
pub fn build_registry(config: &SourceConfig) -> AvailabilityRegistry {
    let filings = factory_config(config, SourceId::Edinet);
    let disclosures = factory_config(config, SourceId::Tdnet);
    let statistics = factory_config(config, SourceId::Estat);
    let central_bank = factory_config(config, SourceId::Boj);
    let news = factory_config(config, SourceId::News);
    let prices = factory_config(config, SourceId::StockPrice);

    AvailabilityRegistry::builder()
        .filings(move || edinet(filings?))
        .disclosures(move || tdnet(disclosures?))
        .statistics(move || estat(statistics?))
        .central_bank(move || boj(central_bank?))
        .news(move || news_api(news?))
        .prices(move || stock_price(prices?))
        .build()
}

/// The configuration a slot's factory gets, unless the slot is switched off
fn factory_config(config: &SourceConfig, source: SourceId) -> Result<SourceConfig, Unavailable> {
    if config.is_disabled(source) {
        return Err(Unavailable::Disabled(format!(
            "{} listed in JPFIN_DISABLED_SOURCES",
            source.as_str()
        )));
    }
    Ok(config.clone())
}

#[cfg(any(feature = "edinet", feature = "estat", feature = "news"))]
fn credential(value: Option<&String>, name: &str) -> Result<String, Unavailable> {
    value
        .cloned()
        .ok_or_else(|| Unavailable::MissingCredential(format!("{name} is not set")))
}

#[cfg(any(
    feature = "edinet",
    feature = "tdnet",
    feature = "estat",
    feature = "boj",
    feature = "news",
    feature = "stockprice"
))]
fn init_failed(source: SourceId, err: impl std::fmt::Display) -> Unavailable {
    Unavailable::InitializationFailed(format!("{} client: {err}", source.display_name()))
}

#[cfg(not(all(
    feature = "edinet",
    feature = "tdnet",
    feature = "estat",
    feature = "boj",
    feature = "news",
    feature = "stockprice"
)))]
fn compiled_out(feature: &str) -> Unavailable {
    Unavailable::MissingDependency(format!("built without the `{feature}` feature"))
}

#[cfg(feature = "edinet")]
fn edinet(config: SourceConfig) -> Result<Arc<dyn jpfin_core::FilingsSource>, Unavailable> {
    let key = credential(config.edinet_api_key.as_ref(), crate::config::ENV_EDINET_API_KEY)?;
    let client = crate::edinet::EdinetClient::new(key, &config)
        .map_err(|e| init_failed(SourceId::Edinet, e))?;
    Ok(Arc::new(client))
}

#[cfg(not(feature = "edinet"))]
fn edinet(_config: SourceConfig) -> Result<Arc<dyn jpfin_core::FilingsSource>, Unavailable> {
    Err(compiled_out("edinet"))
}

#[cfg(feature = "tdnet")]
fn tdnet(config: SourceConfig) -> Result<Arc<dyn jpfin_core::DisclosureSource>, Unavailable> {
    let client =
        crate::tdnet::TdnetClient::new(&config).map_err(|e| init_failed(SourceId::Tdnet, e))?;
    Ok(Arc::new(client))
}

#[cfg(not(feature = "tdnet"))]
fn tdnet(_config: SourceConfig) -> Result<Arc<dyn jpfin_core::DisclosureSource>, Unavailable> {
    Err(compiled_out("tdnet"))
}

#[cfg(feature = "estat")]
fn estat(config: SourceConfig) -> Result<Arc<dyn jpfin_core::StatisticsSource>, Unavailable> {
    let app_id = credential(config.estat_app_id.as_ref(), crate::config::ENV_ESTAT_APP_ID)?;
    let client = crate::estat::EstatClient::new(app_id, &config)
        .map_err(|e| init_failed(SourceId::Estat, e))?;
    Ok(Arc::new(client))
}

#[cfg(not(feature = "estat"))]
fn estat(_config: SourceConfig) -> Result<Arc<dyn jpfin_core::StatisticsSource>, Unavailable> {
    Err(compiled_out("estat"))
}

#[cfg(feature = "boj")]
fn boj(config: SourceConfig) -> Result<Arc<dyn jpfin_core::CentralBankSource>, Unavailable> {
    let client = crate::boj::BojClient::new(&config).map_err(|e| init_failed(SourceId::Boj, e))?;
    Ok(Arc::new(client))
}

#[cfg(not(feature = "boj"))]
fn boj(_config: SourceConfig) -> Result<Arc<dyn jpfin_core::CentralBankSource>, Unavailable> {
    Err(compiled_out("boj"))
}

#[cfg(feature = "news")]
fn news_api(config: SourceConfig) -> Result<Arc<dyn jpfin_core::NewsSource>, Unavailable> {
    let key = credential(config.news_api_key.as_ref(), crate::config::ENV_NEWS_API_KEY)?;
    let client = crate::news::NewsApiClient::new(key, &config)
        .map_err(|e| init_failed(SourceId::News, e))?;
    Ok(Arc::new(client))
}

#[cfg(not(feature = "news"))]
fn news_api(_config: SourceConfig) -> Result<Arc<dyn jpfin_core::NewsSource>, Unavailable> {
    Err(compiled_out("news"))
}

#[cfg(feature = "stockprice")]
fn stock_price(_config: SourceConfig) -> Result<Arc<dyn jpfin_core::PriceSource>, Unavailable> {
    let client = crate::stockprice::YahooPriceClient::new()
        .map_err(|e| init_failed(SourceId::StockPrice, e))?;
    Ok(Arc::new(client))
}

#[cfg(not(feature = "stockprice"))]
fn stock_price(_config: SourceConfig) -> Result<Arc<dyn jpfin_core::PriceSource>, Unavailable> {
    Err(compiled_out("stockprice"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_credentials_only_disable_their_slot() {
        let registry = build_registry(&SourceConfig::default());

        let edinet = registry.status_of(SourceId::Edinet);
        assert!(!edinet.available);
        let reason = edinet.unavailable_reason.unwrap();
        assert!(
            reason.contains("EDINET_API_KEY") || reason.contains("`edinet` feature"),
            "unexpected reason: {reason}"
        );

        let estat = registry.status_of(SourceId::Estat);
        assert!(!estat.available);

        let news = registry.status_of(SourceId::News);
        assert!(!news.available);

        #[cfg(feature = "tdnet")]
        assert!(registry.disclosures().is_available());
        #[cfg(feature = "boj")]
        assert!(registry.central_bank().is_available());
    }

    #[test]
    fn test_disabled_sources_are_reported() {
        let config = SourceConfig::builder()
            .edinet_api_key("key")
            .disable(SourceId::Edinet)
            .disable(SourceId::Tdnet)
            .build()
            .unwrap();

        let registry = build_registry(&config);

        for source in [SourceId::Edinet, SourceId::Tdnet] {
            let status = registry.status_of(source);
            assert!(!status.available);
            assert!(
                status
                    .unavailable_reason
                    .unwrap()
                    .starts_with("disabled by configuration")
            );
        }
    }

    #[cfg(feature = "edinet")]
    #[test]
    fn test_credentials_make_slot_available() {
        let config = SourceConfig::builder()
            .edinet_api_key("key")
            .estat_app_id("app")
            .news_api_key("news")
            .build()
            .unwrap();

        let registry = build_registry(&config);
        assert!(registry.filings().is_available());
        #[cfg(feature = "estat")]
        assert!(registry.statistics().is_available());
        #[cfg(feature = "news")]
        assert!(registry.news().is_available());
    }

    #[test]
    fn test_reasons_are_distinct_per_source() {
        let config = SourceConfig::builder()
            .disable(SourceId::Tdnet)
            .disable(SourceId::Boj)
            .disable(SourceId::StockPrice)
            .build()
            .unwrap();
        let registry = build_registry(&config);

        let reasons: std::collections::BTreeSet<String> = registry
            .status()
            .into_iter()
            .filter_map(|s| s.unavailable_reason)
            .collect();
        assert_eq!(reasons.len(), 6);
    }
}
