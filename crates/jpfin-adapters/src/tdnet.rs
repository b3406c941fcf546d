//! TDnet timely-disclosure client
//!
//! Reads the public JSON mirror of the TDnet disclosure feed. No key needed.

use async_trait::async_trait;
use jpfin_core::{AdapterResult, Disclosure, DisclosureSource};
use serde_json::Value;

use crate::config::SourceConfig;
use crate::error::{Result, SourceError};
use crate::http::{ApiClient, endpoint, json};

const SERVICE: &str = "TDnet";

/// Title keywords mapped to a disclosure category, first match wins
const CATEGORIES: &[(&str, &str)] = &[
    ("決算短信", "earnings"),
    ("業績予想", "forecast"),
    ("配当", "dividend"),
    ("自己株式", "buyback"),
    ("株式分割", "stock_split"),
    ("役員", "personnel"),
    ("人事", "personnel"),
    ("合併", "merger"),
    ("買付", "tender_offer"),
];

/// TDnet disclosure list client
#[derive(Debug)]
pub struct TdnetClient {
    api: ApiClient,
    base_url: String,
}

impl TdnetClient {
    pub fn new(config: &SourceConfig) -> Result<Self> {
        Ok(Self {
            api: ApiClient::new(SERVICE, config, 2)?,
            base_url: config.endpoints.tdnet.clone(),
        })
    }

    async fn list(&self, segments: &[&str], limit: usize) -> Result<Vec<Disclosure>> {
        let mut url = endpoint(&self.base_url, segments)?;
        url.query_pairs_mut()
            .append_pair("limit", &limit.max(1).to_string());

        let body = self.api.get_json(url).await?;
        let mut items = parse_items(&body)?;
        items.truncate(limit);
        Ok(items)
    }
}

#[async_trait]
impl DisclosureSource for TdnetClient {
    async fn company_disclosures(
        &self,
        code: &str,
        limit: usize,
    ) -> AdapterResult<Vec<Disclosure>> {
        let file = format!("{code}.json");
        Ok(self.list(&["list", &file], limit).await?)
    }

    async fn latest_disclosures(&self, limit: usize) -> AdapterResult<Vec<Disclosure>> {
        Ok(self.list(&["list", "recent.json"], limit).await?)
    }
}

fn parse_items(body: &Value) -> Result<Vec<Disclosure>> {
    let items = match body.get("items") {
        Some(Value::Array(items)) => items,
        Some(Value::Null) | None => return Ok(Vec::new()),
        Some(_) => return Err(SourceError::format(SERVICE, "items is not an array")),
    };

    Ok(items
        .iter()
        .map(|item| item.get("Tdnet").unwrap_or(item))
        .filter_map(parse_disclosure)
        .collect())
}

fn parse_disclosure(item: &Value) -> Option<Disclosure> {
    let title = json::text(item, "title")?;
    let code = json::text(item, "company_code").unwrap_or_default();

    Some(Disclosure {
        pubdate: json::text(item, "pubdate").unwrap_or_default(),
        company_code: short_code(&code),
        company_name: json::text(item, "company_name").unwrap_or_default(),
        category: Some(categorize(&title).to_string()),
        document_url: json::text(item, "document_url"),
        title,
    })
}

/// TDnet uses five-digit codes with a trailing check digit
fn short_code(code: &str) -> String {
    match code.get(..4) {
        Some(head) if code.len() == 5 && code.ends_with('0') => head.to_string(),
        _ => code.to_string(),
    }
}

fn categorize(title: &str) -> &'static str {
    CATEGORIES
        .iter()
        .find(|(keyword, _)| title.contains(keyword))
        .map_or("other", |&(_, category)| category)
}
