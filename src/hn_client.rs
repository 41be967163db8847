use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::error::HnError;
use crate::models::{Category, Comment, RawItem, Story};

/// Base path of the public Hacker News Firebase API.
pub const API_BASE: &str = "https://hacker-news.firebaseio.com/v0";

/// Blocking client for the read-only Hacker News API. Cheap to clone; each
/// fetch thread gets its own copy.
#[derive(Clone)]
pub struct HnClient {
    client: Client,
    base_url: String,
}

impl HnClient {
    pub fn new() -> Self {
        Self::with_base_url(API_BASE)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("hn_reader/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// The full ordered id sequence for a category. A failure here aborts
    /// the whole activation; the caller logs it and leaves the view empty.
    pub fn fetch_category_ids(&self, category: Category) -> Result<Vec<u64>, HnError> {
        self.get_json(&self.ids_url(category))
    }

    /// One story by id, normalized. A failure here only skips this story.
    pub fn fetch_item(&self, id: u64) -> Result<Story, HnError> {
        let raw: RawItem = self.get_json(&self.item_url(id))?;
        Ok(raw.into())
    }

    /// One comment by id, normalized.
    pub fn fetch_comment(&self, id: u64) -> Result<Comment, HnError> {
        let raw: RawItem = self.get_json(&self.item_url(id))?;
        Ok(raw.into())
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, HnError> {
        let response = self.client.get(url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(HnError::Status(status.as_u16()));
        }
        // Decode from text rather than response.json() so a non-JSON body
        // surfaces as Decode, not as a generic reqwest error. The API also
        // returns literal `null` for unknown ids, which fails here too.
        let body = response.text()?;
        Ok(serde_json::from_str(&body)?)
    }

    fn ids_url(&self, category: Category) -> String {
        format!("{}/{}.json", self.base_url, category.endpoint())
    }

    fn item_url(&self, id: u64) -> String {
        format!("{}/item/{}.json", self.base_url, id)
    }
}

impl Default for HnClient {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_follow_the_api_layout() {
        let client = HnClient::new();
        assert_eq!(
            client.ids_url(Category::Top),
            "https://hacker-news.firebaseio.com/v0/topstories.json"
        );
        assert_eq!(
            client.item_url(8863),
            "https://hacker-news.firebaseio.com/v0/item/8863.json"
        );
    }

    #[test]
    fn custom_base_url_is_respected() {
        let client = HnClient::with_base_url("http://localhost:8080/v0");
        assert_eq!(
            client.ids_url(Category::Ask),
            "http://localhost:8080/v0/askstories.json"
        );
    }

    #[test]
    fn null_item_body_is_a_decode_error() {
        let result: Result<RawItem, serde_json::Error> = serde_json::from_str("null");
        assert!(result.is_err());
    }
}
