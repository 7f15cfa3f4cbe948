use crate::content_cache::ContentSource;
use crate::error::Error;
use crate::item::Item;
use async_trait::async_trait;
use log::*;
use serde::Deserialize;
use service::config::Config;

/// HTTP client for the subreddit JSON listing that feeds the meme cache.
pub struct RedditClient {
    client: reqwest::Client,
    url: String,
}

/// `{ "data": { "children": [ { "data": { "title", "url" } } ] } }`
#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    children: Vec<ListingChild>,
}

#[derive(Debug, Deserialize)]
struct ListingChild {
    data: Item,
}

impl RedditClient {
    /// Create a client with the configured timeout and identifying User-Agent.
    pub fn new(config: &Config) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .timeout(config.upstream_timeout())
            .user_agent(config.upstream_user_agent())
            .build()?;

        Ok(Self {
            client,
            url: config.upstream_url().to_string(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ContentSource for RedditClient {
    async fn fetch(&self) -> Result<Vec<Item>, Error> {
        debug!("Fetching memes from {}", self.url);

        let response = self.client.get(&self.url).send().await?.error_for_status()?;
        let body = response.text().await?;

        parse_listing(&body)
    }
}

/// Extract the items of a listing body, in listing order.
fn parse_listing(body: &str) -> Result<Vec<Item>, Error> {
    let listing: Listing = serde_json::from_str(body)?;

    Ok(listing
        .data
        .children
        .into_iter()
        .map(|child| child.data)
        .collect())
}
