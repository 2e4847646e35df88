//! PostgREST-style HTTP implementation of [`RemoteTable`].
//!
//! Speaks the REST dialect of hosted table stores (Supabase and friends):
//! `GET /rest/v1/{table}?select=*&order=...`, `POST` with
//! `Prefer: return=representation`, and `PATCH`/`DELETE` filtered by
//! `id=eq.{key}`. An empty representation on update/delete means the target
//! row does not exist.

use async_trait::async_trait;
use color_eyre::{eyre::eyre, Result};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use std::marker::PhantomData;
use url::Url;

use crate::cache::Entity;
use crate::config::Config;

use super::table::{RemoteError, RemoteTable};

/// One remote table reached over authenticated REST calls.
pub struct HttpTable<T, D, P> {
  client: reqwest::Client,
  endpoint: Url,
  order: Option<String>,
  _marker: PhantomData<fn() -> (T, D, P)>,
}

impl<T, D, P> HttpTable<T, D, P> {
  /// Create a client for one table of the configured backend.
  pub fn new(config: &Config, table: &str) -> Result<Self> {
    let api_key = Config::get_api_key()?;

    let base = Url::parse(&config.backend.url)
      .map_err(|e| eyre!("Invalid backend url {}: {}", config.backend.url, e))?;
    let endpoint = base
      .join("rest/v1/")
      .and_then(|u| u.join(table))
      .map_err(|e| eyre!("Invalid table name {}: {}", table, e))?;

    let mut headers = HeaderMap::new();
    let mut key_value = HeaderValue::from_str(&api_key)
      .map_err(|e| eyre!("Invalid api key: {}", e))?;
    key_value.set_sensitive(true);
    headers.insert("apikey", key_value);
    let mut bearer = HeaderValue::from_str(&format!("Bearer {}", api_key))
      .map_err(|e| eyre!("Invalid api key: {}", e))?;
    bearer.set_sensitive(true);
    headers.insert(AUTHORIZATION, bearer);

    let client = reqwest::Client::builder()
      .default_headers(headers)
      .build()
      .map_err(|e| eyre!("Failed to create http client: {}", e))?;

    Ok(Self {
      client,
      endpoint,
      order: None,
      _marker: PhantomData,
    })
  }

  /// Ordering applied to `list`, e.g. `created_at.desc`.
  pub fn with_order(mut self, order: impl Into<String>) -> Self {
    self.order = Some(order.into());
    self
  }

  fn key_filter(key: &str) -> (&'static str, String) {
    ("id", format!("eq.{}", key))
  }
}

/// Pull the store's error message out of a failed response body.
///
/// PostgREST reports `{"message": "..."}`; anything else falls back to the
/// raw body or the status code.
fn store_error(status: StatusCode, body: &str) -> RemoteError {
  let message = serde_json::from_str::<serde_json::Value>(body)
    .ok()
    .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
    .unwrap_or_else(|| body.to_string());

  if message.trim().is_empty() {
    RemoteError::Store(format!("store returned {}", status))
  } else {
    RemoteError::Store(message)
  }
}

/// Decode the representation rows of a response, or its error message.
fn rows_from_response<T: DeserializeOwned>(
  status: StatusCode,
  body: &str,
) -> Result<Vec<T>, RemoteError> {
  if !status.is_success() {
    return Err(store_error(status, body));
  }
  serde_json::from_str(body)
    .map_err(|e| RemoteError::Store(format!("Failed to parse store response: {}", e)))
}

/// Decide the outcome of a keyed update/delete response.
///
/// PostgREST answers a mutation of a missing row with an empty
/// representation rather than a 404, so both map to `NotFound`.
fn keyed_rows_from_response<T: DeserializeOwned>(
  status: StatusCode,
  body: &str,
  key: &str,
) -> Result<Vec<T>, RemoteError> {
  if status == StatusCode::NOT_FOUND {
    return Err(RemoteError::NotFound(key.to_string()));
  }
  let rows: Vec<T> = rows_from_response(status, body)?;
  if rows.is_empty() {
    return Err(RemoteError::NotFound(key.to_string()));
  }
  Ok(rows)
}

fn transport_error(err: reqwest::Error) -> RemoteError {
  RemoteError::Store(format!("Failed to reach store: {}", err))
}

async fn read_response(response: Response) -> Result<(StatusCode, String), RemoteError> {
  let status = response.status();
  let body = response
    .text()
    .await
    .map_err(|e| RemoteError::Store(format!("Failed to read store response: {}", e)))?;
  Ok((status, body))
}

#[async_trait]
impl<T, D, P> RemoteTable for HttpTable<T, D, P>
where
  T: Entity,
  D: Serialize + Send + Sync + 'static,
  P: Serialize + Send + Sync + 'static,
{
  type Item = T;
  type Draft = D;
  type Patch = P;

  async fn list(&self) -> Result<Vec<T>, RemoteError> {
    let mut query = vec![("select".to_string(), "*".to_string())];
    if let Some(order) = &self.order {
      query.push(("order".to_string(), order.clone()));
    }

    let response = self
      .client
      .get(self.endpoint.clone())
      .query(&query)
      .send()
      .await
      .map_err(transport_error)?;

    let (status, body) = read_response(response).await?;
    rows_from_response(status, &body)
  }

  async fn insert(&self, draft: &D) -> Result<T, RemoteError> {
    let response = self
      .client
      .post(self.endpoint.clone())
      .header("Prefer", "return=representation")
      .json(draft)
      .send()
      .await
      .map_err(transport_error)?;

    let (status, body) = read_response(response).await?;
    let rows: Vec<T> = rows_from_response(status, &body)?;
    rows
      .into_iter()
      .next()
      .ok_or_else(|| RemoteError::Store("store returned no row for insert".to_string()))
  }

  async fn update(&self, key: &str, patch: &P) -> Result<T, RemoteError> {
    let response = self
      .client
      .patch(self.endpoint.clone())
      .query(&[Self::key_filter(key)])
      .header("Prefer", "return=representation")
      .json(patch)
      .send()
      .await
      .map_err(transport_error)?;

    let (status, body) = read_response(response).await?;
    let rows: Vec<T> = keyed_rows_from_response(status, &body, key)?;
    rows
      .into_iter()
      .next()
      .ok_or_else(|| RemoteError::NotFound(key.to_string()))
  }

  async fn delete(&self, key: &str) -> Result<(), RemoteError> {
    let response = self
      .client
      .delete(self.endpoint.clone())
      .query(&[Self::key_filter(key)])
      .header("Prefer", "return=representation")
      .send()
      .await
      .map_err(transport_error)?;

    let (status, body) = read_response(response).await?;
    keyed_rows_from_response::<serde_json::Value>(status, &body, key)?;
    Ok(())
  }
}
