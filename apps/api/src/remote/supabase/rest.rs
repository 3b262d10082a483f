//! Minimal PostgREST query builder: equality filters, ordering, limits, and
//! the four row verbs. Reads retry on 429/5xx; writes are sent once.

use std::fmt::Display;

use reqwest::{Client, Method, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, warn};

use crate::remote::RemoteError;

use super::{AccessToken, SupabaseConfig};

const MAX_RETRIES: u32 = 3;

#[derive(Debug, Deserialize)]
struct PostgrestError {
    message: String,
    #[serde(default)]
    details: Option<String>,
}

#[derive(Clone)]
pub struct PostgrestClient {
    http: Client,
    config: SupabaseConfig,
    access_token: AccessToken,
}

impl PostgrestClient {
    pub fn new(http: Client, config: SupabaseConfig, access_token: AccessToken) -> Self {
        Self {
            http,
            config,
            access_token,
        }
    }

    pub fn table<'a>(&'a self, table: &'a str) -> Query<'a> {
        Query {
            client: self,
            table,
            params: Vec::new(),
        }
    }

    async fn request(
        &self,
        method: Method,
        table: &str,
        params: &[(String, String)],
    ) -> RequestBuilder {
        let url = format!("{}/rest/v1/{}", self.config.url, table);
        let bearer = self
            .access_token
            .read()
            .await
            .clone()
            .unwrap_or_else(|| self.config.anon_key.clone());
        let profile_header = if method == Method::GET {
            "Accept-Profile"
        } else {
            "Content-Profile"
        };

        self.http
            .request(method, url)
            .query(params)
            .header("apikey", &self.config.anon_key)
            .header("Authorization", format!("Bearer {bearer}"))
            .header(profile_header, &self.config.schema)
    }
}

pub struct Query<'a> {
    client: &'a PostgrestClient,
    table: &'a str,
    params: Vec<(String, String)>,
}

impl<'a> Query<'a> {
    pub fn select(mut self, columns: &str) -> Self {
        self.params.push(("select".to_string(), columns.to_string()));
        self
    }

    pub fn eq(mut self, column: &str, value: impl Display) -> Self {
        self.params.push((column.to_string(), format!("eq.{value}")));
        self
    }

    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        let direction = if ascending { "asc" } else { "desc" };
        self.params
            .push(("order".to_string(), format!("{column}.{direction}")));
        self
    }

    pub fn limit(mut self, count: u32) -> Self {
        self.params.push(("limit".to_string(), count.to_string()));
        self
    }

    /// GET with retry on 429 and 5xx, exponential backoff 1s, 2s.
    pub async fn fetch<T: DeserializeOwned>(self) -> Result<Vec<T>, RemoteError> {
        let mut last_error: Option<RemoteError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                let delay = std::time::Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "Select on {} attempt {} failed, retrying after {}ms...",
                    self.table,
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .request(Method::GET, self.table, &self.params)
                .await
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(RemoteError::Http(e));
                    continue;
                }
            };

            let status = response.status();
            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("PostgREST returned {} for {}: {}", status, self.table, body);
                last_error = Some(RemoteError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            return read_rows(self.table, response).await;
        }

        Err(last_error.unwrap_or(RemoteError::RateLimited {
            retries: MAX_RETRIES,
        }))
    }

    pub async fn insert<B, T>(self, body: &B) -> Result<Vec<T>, RemoteError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .client
            .request(Method::POST, self.table, &self.params)
            .await
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .await?;
        read_rows(self.table, response).await
    }

    pub async fn update<B, T>(self, body: &B) -> Result<Vec<T>, RemoteError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .client
            .request(Method::PATCH, self.table, &self.params)
            .await
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .await?;
        read_rows(self.table, response).await
    }

    pub async fn delete(self) -> Result<(), RemoteError> {
        let response = self
            .client
            .request(Method::DELETE, self.table, &self.params)
            .await
            .send()
            .await?;
        check_status(response).await.map(|_| ())
    }

    #[cfg(test)]
    fn query_string(&self) -> Vec<(String, String)> {
        self.params.clone()
    }
}

async fn read_rows<T: DeserializeOwned>(
    table: &str,
    response: Response,
) -> Result<Vec<T>, RemoteError> {
    let response = check_status(response).await?;
    let body = response.text().await?;
    let rows: Vec<T> = serde_json::from_str(&body)?;
    debug!("PostgREST {} returned {} row(s)", table, rows.len());
    Ok(rows)
}

async fn check_status(response: Response) -> Result<Response, RemoteError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(RemoteError::Api {
        status: status.as_u16(),
        message: error_message(&body),
    })
}

/// Extracts the `message` (and `details`) of a PostgREST error body, falling
/// back to the raw body.
fn error_message(body: &str) -> String {
    match serde_json::from_str::<PostgrestError>(body) {
        Ok(PostgrestError {
            message,
            details: Some(details),
        }) if !details.is_empty() => format!("{message} ({details})"),
        Ok(err) => err.message,
        Err(_) => body.to_string(),
    }
}
