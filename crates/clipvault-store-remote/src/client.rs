//! [`RemoteStore`] — async HTTP client implementing [`RecordStore`] against
//! the clipvault JSON API.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use clipvault_core::{
  ident::SourceId,
  record::{Overlay, OverlayPatch, Record, SourceFields},
  source::Source,
  store::{Page, RecordQuery, RecordStore, UpsertOutcome},
};

use crate::{Error, Result};

// ─── Configuration ───────────────────────────────────────────────────────────

/// Connection settings for the clipvault API.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
  pub base_url:     String,
  pub timeout_secs: u64,
}

impl Default for RemoteConfig {
  fn default() -> Self {
    Self { base_url: "http://127.0.0.1:8425".into(), timeout_secs: 30 }
  }
}

// ─── Wire types ──────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct ErrorBody {
  error_kind: String,
  message:    String,
}

#[derive(Serialize)]
struct UpsertBody<'a> {
  fields:      &'a SourceFields,
  fingerprint: &'a str,
}

#[derive(Deserialize)]
struct OutcomeBody {
  outcome: UpsertOutcome,
}

#[derive(Serialize)]
struct RegisterBody<'a> {
  source_id: &'a SourceId,
  label:     &'a str,
}

#[derive(Deserialize)]
struct DeletedBody {
  deleted: usize,
}

#[derive(Deserialize)]
struct CountBody {
  count: usize,
}

#[derive(Serialize)]
struct TruncateBody {
  confirm: bool,
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// Async HTTP client for the clipvault JSON API.
///
/// Cheap to clone — the inner [`reqwest::Client`] is `Arc`-based. Every
/// request carries an explicit `?source=` scope, so the server-side resolver
/// never has to guess.
#[derive(Clone)]
pub struct RemoteStore {
  client: Client,
  config: RemoteConfig,
}

impl RemoteStore {
  pub fn new(config: RemoteConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!("{}/api{}", self.config.base_url.trim_end_matches('/'), path)
  }

  /// Turn a non-success response into a typed [`Error::Api`].
  async fn check(resp: reqwest::Response) -> Result<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
      return Ok(resp);
    }
    let (kind, message) = match resp.json::<ErrorBody>().await {
      Ok(body) => (body.error_kind, body.message),
      Err(_) => ("unknown".to_owned(), status.to_string()),
    };
    Err(Error::Api { status: status.as_u16(), kind, message })
  }

  /// Like [`Self::check`] but maps 404 to `None`.
  async fn check_optional<T: serde::de::DeserializeOwned>(
    resp: reqwest::Response,
  ) -> Result<Option<T>> {
    if resp.status() == StatusCode::NOT_FOUND {
      return Ok(None);
    }
    Ok(Some(Self::check(resp).await?.json().await?))
  }
}

impl RecordStore for RemoteStore {
  type Error = Error;

  // ── Source registry ───────────────────────────────────────────────────────

  async fn register_source(
    &self,
    source_id: SourceId,
    label: String,
  ) -> Result<Source> {
    let resp = self
      .client
      .post(self.url("/sources"))
      .json(&RegisterBody { source_id: &source_id, label: &label })
      .send()
      .await?;
    Ok(Self::check(resp).await?.json().await?)
  }

  async fn get_source(&self, source_id: &SourceId) -> Result<Option<Source>> {
    let resp = self
      .client
      .get(self.url(&format!("/sources/{source_id}")))
      .send()
      .await?;
    Self::check_optional(resp).await
  }

  async fn list_sources(&self) -> Result<Vec<Source>> {
    let resp = self.client.get(self.url("/sources")).send().await?;
    Ok(Self::check(resp).await?.json().await?)
  }

  async fn set_default_source(&self, source_id: &SourceId) -> Result<()> {
    let resp = self
      .client
      .post(self.url(&format!("/sources/{source_id}/default")))
      .send()
      .await?;
    Self::check(resp).await?;
    Ok(())
  }

  async fn remove_source(&self, source_id: &SourceId) -> Result<()> {
    let resp = self
      .client
      .delete(self.url(&format!("/sources/{source_id}")))
      .send()
      .await?;
    Self::check(resp).await?;
    Ok(())
  }

  // ── Records ───────────────────────────────────────────────────────────────

  async fn get_record(
    &self,
    source_id: &SourceId,
    id: &str,
  ) -> Result<Option<Record>> {
    let resp = self
      .client
      .get(self.url(&format!("/records/{id}")))
      .query(&[("source", source_id.as_str())])
      .send()
      .await?;
    Self::check_optional(resp).await
  }

  async fn upsert_record(
    &self,
    source_id: &SourceId,
    id: &str,
    fields: SourceFields,
    fingerprint: String,
  ) -> Result<UpsertOutcome> {
    let resp = self
      .client
      .put(self.url(&format!("/records/{id}")))
      .query(&[("source", source_id.as_str())])
      .json(&UpsertBody { fields: &fields, fingerprint: &fingerprint })
      .send()
      .await?;
    let body: OutcomeBody = Self::check(resp).await?.json().await?;
    Ok(body.outcome)
  }

  async fn update_overlay(
    &self,
    source_id: &SourceId,
    id: &str,
    patch: OverlayPatch,
  ) -> Result<Overlay> {
    let resp = self
      .client
      .put(self.url(&format!("/records/{id}/overlay")))
      .query(&[("source", source_id.as_str())])
      .json(&patch)
      .send()
      .await?;
    Ok(Self::check(resp).await?.json().await?)
  }

  async fn query_records(
    &self,
    source_id: &SourceId,
    query: &RecordQuery,
  ) -> Result<Page<Record>> {
    let resp = self
      .client
      .post(self.url("/records/query"))
      .query(&[("source", source_id.as_str())])
      .json(query)
      .send()
      .await?;
    Ok(Self::check(resp).await?.json().await?)
  }

  async fn search(
    &self,
    source_id: &SourceId,
    text: &str,
    limit: usize,
    offset: usize,
  ) -> Result<Page<Record>> {
    let resp = self
      .client
      .get(self.url("/search"))
      .query(&[
        ("source", source_id.as_str()),
        ("q", text),
        ("limit", &limit.to_string()),
        ("offset", &offset.to_string()),
      ])
      .send()
      .await?;
    Ok(Self::check(resp).await?.json().await?)
  }

  async fn delete_record(&self, source_id: &SourceId, id: &str) -> Result<bool> {
    let resp = self
      .client
      .delete(self.url(&format!("/records/{id}")))
      .query(&[("source", source_id.as_str())])
      .send()
      .await?;
    let body: DeletedBody = Self::check(resp).await?.json().await?;
    Ok(body.deleted > 0)
  }

  async fn list_ids(&self, source_id: &SourceId) -> Result<Vec<String>> {
    let resp = self
      .client
      .get(self.url("/ids"))
      .query(&[("source", source_id.as_str())])
      .send()
      .await?;
    Ok(Self::check(resp).await?.json().await?)
  }

  async fn count_records(&self, source_id: &SourceId) -> Result<usize> {
    let resp = self
      .client
      .get(self.url("/count"))
      .query(&[("source", source_id.as_str())])
      .send()
      .await?;
    let body: CountBody = Self::check(resp).await?.json().await?;
    Ok(body.count)
  }

  // ── Destructive / maintenance ─────────────────────────────────────────────

  async fn truncate(&self, source_id: &SourceId, confirm: bool) -> Result<usize> {
    // Fail-closed on the client as well; never put an unconfirmed truncate
    // on the wire.
    if !confirm {
      return Err(Error::Core(clipvault_core::Error::Conflict(format!(
        "truncate of {source_id} requires explicit confirmation"
      ))));
    }
    let resp = self
      .client
      .post(self.url("/truncate"))
      .query(&[("source", source_id.as_str())])
      .json(&TruncateBody { confirm })
      .send()
      .await?;
    let body: DeletedBody = Self::check(resp).await?.json().await?;
    Ok(body.deleted)
  }

  async fn rebuild_search_index(&self, source_id: &SourceId) -> Result<()> {
    let resp = self
      .client
      .post(self.url("/rebuild-search"))
      .query(&[("source", source_id.as_str())])
      .send()
      .await?;
    Self::check(resp).await?;
    Ok(())
  }
}
