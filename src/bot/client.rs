use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::env;

use crate::bot::entities::{Coliving, Image, Location, User};

#[derive(Debug, thiserror::Error)]
pub enum BotError {
    #[error("API_BASE_URL is not set")]
    MissingBaseUrl,
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("api responded {status}: {body}")]
    Api { status: StatusCode, body: String },
}

/// Listing filters; only the fields that are set end up in the query string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColivingQuery {
    pub location: Option<String>,
    pub room_type: Option<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub owner: Option<i64>,
}

impl ColivingQuery {
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(location) = &self.location {
            pairs.push(("location", location.clone()));
        }
        if let Some(room_type) = &self.room_type {
            pairs.push(("room_type", room_type.clone()));
        }
        if let Some(min_price) = self.min_price {
            pairs.push(("min_price", min_price.to_string()));
        }
        if let Some(max_price) = self.max_price {
            pairs.push(("max_price", max_price.to_string()));
        }
        if let Some(owner) = self.owner {
            pairs.push(("owner", owner.to_string()));
        }
        pairs
    }
}

/// HTTP client the bot uses to reach the coliving API.
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        ApiClient {
            client: Client::new(),
            base_url,
        }
    }

    pub fn from_env() -> Result<Self, BotError> {
        let base_url = env::var("API_BASE_URL").map_err(|_| BotError::MissingBaseUrl)?;
        Ok(Self::new(base_url))
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub async fn list_colivings(&self, query: &ColivingQuery) -> Result<Vec<Coliving>, BotError> {
        let request = self.client.get(self.url("colivings")).query(&query.pairs());
        self.send(request).await
    }

    pub async fn get_coliving(&self, id: i64) -> Result<Coliving, BotError> {
        let request = self.client.get(self.url(&format!("colivings/{}", id)));
        self.send(request).await
    }

    pub async fn create_coliving(&self, coliving: &Coliving) -> Result<Coliving, BotError> {
        let request = self.client.post(self.url("colivings")).json(coliving);
        self.send(request).await
    }

    pub async fn update_coliving(&self, id: i64, changes: &Coliving) -> Result<Coliving, BotError> {
        let request = self
            .client
            .patch(self.url(&format!("colivings/{}", id)))
            .json(changes);
        self.send(request).await
    }

    pub async fn delete_coliving(&self, id: i64) -> Result<(), BotError> {
        let response = self
            .client
            .delete(self.url(&format!("colivings/{}", id)))
            .send()
            .await?;
        check_status(response).await.map(|_| ())
    }

    pub async fn add_image(&self, coliving_id: i64, image: &Image) -> Result<Coliving, BotError> {
        let request = self
            .client
            .post(self.url(&format!("colivings/{}/images", coliving_id)))
            .json(image);
        self.send(request).await
    }

    pub async fn get_or_create_user(
        &self,
        telegram_id: i64,
        username: Option<&str>,
        first_name: Option<&str>,
        last_name: Option<&str>,
    ) -> Result<User, BotError> {
        let request = self.client.post(self.url("users")).json(&json!({
            "telegram_id": telegram_id,
            "username": username,
            "first_name": first_name,
            "last_name": last_name,
        }));
        self.send(request).await
    }

    pub async fn set_residence(&self, telegram_id: i64, residence: Option<i64>) -> Result<User, BotError> {
        let request = self
            .client
            .patch(self.url(&format!("users/{}", telegram_id)))
            .json(&json!({ "residence": residence }));
        self.send(request).await
    }

    pub async fn list_locations(&self) -> Result<Vec<Location>, BotError> {
        let request = self.client.get(self.url("locations"));
        self.send(request).await
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, BotError> {
        let response = check_status(request.send().await?).await?;
        Ok(response.json::<T>().await?)
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, BotError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    log::warn!("api call failed with {}: {}", status, body);
    Err(BotError::Api { status, body })
}
