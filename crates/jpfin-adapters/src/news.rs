//! NewsAPI headline client
//!
//! With a query, searches `everything`; without one, returns Japanese
//! business top headlines.
//!
//! API Key: https://newsapi.org/register
//! Rate Limit: 100 requests per day on the free tier

use async_trait::async_trait;
use jpfin_core::{AdapterResult, Headline, NewsSource};
use serde::Deserialize;
use serde_json::Value;

use crate::config::SourceConfig;
use crate::error::{Result, SourceError};
use crate::http::{ApiClient, endpoint};

const SERVICE: &str = "NewsAPI";

/// NewsAPI caps page size at 100
const MAX_PAGE_SIZE: usize = 100;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ArticlesResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    articles: Vec<Article>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Article {
    #[serde(default)]
    source: Option<ArticleSource>,
    title: Option<String>,
    url: Option<String>,
    published_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ArticleSource {
    name: Option<String>,
}

/// NewsAPI client
#[derive(Debug)]
pub struct NewsApiClient {
    api: ApiClient,
    base_url: String,
    api_key: String,
}

impl NewsApiClient {
    pub fn new(api_key: impl Into<String>, config: &SourceConfig) -> Result<Self> {
        Ok(Self {
            api: ApiClient::new(SERVICE, config, 1)?,
            base_url: config.endpoints.news.clone(),
            api_key: api_key.into(),
        })
    }
}

#[async_trait]
impl NewsSource for NewsApiClient {
    async fn headlines(&self, query: Option<&str>, limit: usize) -> AdapterResult<Vec<Headline>> {
        let page_size = limit.clamp(1, MAX_PAGE_SIZE).to_string();

        let url = match query.map(str::trim).filter(|q| !q.is_empty()) {
            Some(query) => {
                let mut url = endpoint(&self.base_url, &["everything"])?;
                url.query_pairs_mut()
                    .append_pair("q", query)
                    .append_pair("sortBy", "publishedAt")
                    .append_pair("pageSize", &page_size);
                url
            }
            None => {
                let mut url = endpoint(&self.base_url, &["top-headlines"])?;
                url.query_pairs_mut()
                    .append_pair("country", "jp")
                    .append_pair("category", "business")
                    .append_pair("pageSize", &page_size);
                url
            }
        };

        let body = self
            .api
            .get_json_with_headers(url, &[("X-Api-Key", self.api_key.clone())])
            .await?;

        let mut headlines = parse_articles(body)?;
        headlines.truncate(limit);
        Ok(headlines)
    }
}

fn parse_articles(body: Value) -> Result<Vec<Headline>> {
    let response: ArticlesResponse = serde_json::from_value(body)?;

    if response.status != "ok" {
        return Err(SourceError::Service {
            service: SERVICE,
            message: response
                .message
                .unwrap_or_else(|| format!("status {}", response.status)),
        });
    }

    Ok(response
        .articles
        .into_iter()
        .filter_map(|article| {
            let title = article.title.filter(|t| !t.trim().is_empty() && t != "[Removed]")?;
            Some(Headline {
                title,
                source_name: article.source.and_then(|s| s.name),
                published: article.published_at,
                url: article.url,
            })
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_articles() {
        let body = json!({
            "status": "ok",
            "totalResults": 3,
            "articles": [
                {
                    "source": {"id": null, "name": "Nikkei Asia"},
                    "title": "Toyota raises full-year profit forecast",
                    "url": "https://asia.nikkei.com/a",
                    "publishedAt": "2026-05-08T06:30:00Z"
                },
                {"source": {"id": null, "name": "x"}, "title": "[Removed]", "url": null},
                {"title": "日経平均、続伸", "publishedAt": null}
            ]
        });

        let headlines = parse_articles(body).unwrap();
        assert_eq!(headlines.len(), 2);
        assert_eq!(headlines[0].source_name.as_deref(), Some("Nikkei Asia"));
        assert_eq!(headlines[1].title, "日経平均、続伸");
        assert!(headlines[1].source_name.is_none());
    }

    #[test]
    fn test_parse_error_status() {
        let body = json!({
            "status": "error",
            "code": "apiKeyInvalid",
            "message": "Your API key is invalid."
        });
        let err = parse_articles(body).unwrap_err();
        assert!(err.to_string().contains("API key is invalid"));
    }

    #[tokio::test]
    #[ignore] // Requires network access and NEWS_API_KEY
    async fn test_headlines_live() {
        let Some(key) = jpfin_utils::env_var("NEWS_API_KEY") else {
            return;
        };
        let client = NewsApiClient::new(key, &SourceConfig::default()).unwrap();
        let headlines = client.headlines(Some("Toyota"), 2).await.unwrap();
        assert!(headlines.len() <= 2);
    }
}
