//! `SubmissionStore` over the portal's REST API.

use super::SubmissionStore;
use crate::batches::models::{BatchDetails, BatchPayload, CreatedBatch, PersistedBatch};
use crate::common::errors::{PortalError, PortalResult};
use crate::common::models::{CompanyId, FarmId, FieldId, GrowerId};
use crate::config::Config;
use crate::export::models::CsvGeneration;
use crate::history::models::PlotHistoryEntry;
use crate::references::models::{
    Company, CreatedId, Farm, FarmInput, Field, FieldInput, Grower, GrowerInput,
};
use crate::{not_found, remote_unavailable};
use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

/// What a 404 from an endpoint means
#[derive(Debug, Clone, Copy)]
enum Missing<'a> {
    Resource(&'static str, &'a str),
    Artifact(&'a str),
}

#[derive(Debug, Clone)]
pub struct HttpStore {
    client: Client,
    base_url: Url,
}

impl HttpStore {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(config.app_name.as_str())
            .timeout(config.request_timeout())
            .build()
            .context("Failed to build HTTP client")?;
        let base_url = Url::parse(&config.api_url)
            .with_context(|| format!("PORTAL_API_URL is not a valid URL: {}", config.api_url))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("PORTAL_API_URL cannot be used as a base URL: {}", config.api_url);
        }
        Ok(Self { client, base_url })
    }

    /// `segments` are appended to the base path and percent-encoded. A
    /// trailing empty segment keeps the trailing slash some routes expect.
    fn url(&self, segments: &[&str]) -> PortalResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| remote_unavailable!("request", "base URL cannot carry a path"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send(
        &self,
        operation: &str,
        request: RequestBuilder,
        missing: Option<Missing<'_>>,
    ) -> PortalResult<Response> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            debug!("{operation}: HTTP {status}");
            return Ok(response);
        }

        match (status, missing) {
            (StatusCode::NOT_FOUND, Some(Missing::Resource(resource, id))) => {
                Err(not_found!(resource, id))
            }
            (StatusCode::NOT_FOUND, Some(Missing::Artifact(batch_id))) => {
                Err(PortalError::ArtifactNotReady {
                    batch_id: batch_id.to_string(),
                })
            }
            _ => {
                let endpoint = response.url().path().to_string();
                let error_text = response.text().await.unwrap_or_default();
                Err(remote_unavailable!(
                    operation,
                    format!("HTTP {status} {endpoint}: {error_text}")
                ))
            }
        }
    }

    async fn json<T: DeserializeOwned>(
        &self,
        operation: &str,
        request: RequestBuilder,
        missing: Option<Missing<'_>>,
    ) -> PortalResult<T> {
        let response = self.send(operation, request, missing).await?;
        response.json::<T>().await.map_err(|e| {
            remote_unavailable!(operation, format!("JSON parse error: {e}"))
        })
    }

    async fn list<T: DeserializeOwned>(
        &self,
        operation: &str,
        segments: &[&str],
    ) -> PortalResult<Vec<T>> {
        let url = self.url(segments)?;
        self.json(operation, self.client.get(url), None).await
    }
}

#[async_trait]
impl SubmissionStore for HttpStore {
    async fn list_companies(&self) -> PortalResult<Vec<Company>> {
        self.list("list_companies", &["api", "companies", ""]).await
    }

    async fn list_growers(&self, company_id: CompanyId) -> PortalResult<Vec<Grower>> {
        let id = company_id.to_string();
        self.list("list_growers", &["api", "growers", "company", &id]).await
    }

    async fn list_farms(&self, grower_id: GrowerId) -> PortalResult<Vec<Farm>> {
        let id = grower_id.to_string();
        self.list("list_farms", &["api", "farms", "grower", &id]).await
    }

    async fn list_fields(&self, farm_id: FarmId) -> PortalResult<Vec<Field>> {
        let id = farm_id.to_string();
        self.list("list_fields", &["api", "fields", "farm", &id]).await
    }

    async fn create_grower(&self, grower: &GrowerInput) -> PortalResult<GrowerId> {
        let url = self.url(&["api", "growers", ""])?;
        let created: CreatedId = self
            .json("create_grower", self.client.post(url).json(grower), None)
            .await?;
        Ok(created.id)
    }

    async fn update_grower(&self, grower_id: GrowerId, grower: &GrowerInput) -> PortalResult<()> {
        let id = grower_id.to_string();
        let url = self.url(&["api", "growers", &id])?;
        self.send(
            "update_grower",
            self.client.put(url).json(grower),
            Some(Missing::Resource("Grower", &id)),
        )
        .await?;
        Ok(())
    }

    async fn delete_grower(&self, grower_id: GrowerId) -> PortalResult<()> {
        let id = grower_id.to_string();
        let url = self.url(&["api", "growers", &id])?;
        self.send(
            "delete_grower",
            self.client.delete(url),
            Some(Missing::Resource("Grower", &id)),
        )
        .await?;
        Ok(())
    }

    async fn create_farm(&self, farm: &FarmInput) -> PortalResult<FarmId> {
        let url = self.url(&["api", "farms", ""])?;
        let created: CreatedId = self
            .json("create_farm", self.client.post(url).json(farm), None)
            .await?;
        Ok(created.id)
    }

    async fn delete_farm(&self, farm_id: FarmId) -> PortalResult<()> {
        let id = farm_id.to_string();
        let url = self.url(&["api", "farms", &id])?;
        self.send(
            "delete_farm",
            self.client.delete(url),
            Some(Missing::Resource("Farm", &id)),
        )
        .await?;
        Ok(())
    }

    async fn create_field(&self, field: &FieldInput) -> PortalResult<FieldId> {
        let url = self.url(&["api", "fields", ""])?;
        let created: CreatedId = self
            .json("create_field", self.client.post(url).json(field), None)
            .await?;
        Ok(created.id)
    }

    async fn delete_field(&self, field_id: FieldId) -> PortalResult<()> {
        let id = field_id.to_string();
        let url = self.url(&["api", "fields", &id])?;
        self.send(
            "delete_field",
            self.client.delete(url),
            Some(Missing::Resource("Field", &id)),
        )
        .await?;
        Ok(())
    }

    async fn lookup_plot_history(&self, plot_id: &str) -> PortalResult<Vec<PlotHistoryEntry>> {
        self.list("lookup_plot_history", &["api", "plot-history", plot_id.trim()])
            .await
    }

    async fn create_batch(&self, payload: &BatchPayload) -> PortalResult<CreatedBatch> {
        let url = self.url(&["api", "batches", ""])?;
        self.json("create_batch", self.client.post(url).json(payload), None)
            .await
    }

    async fn list_batches(&self, limit: u64, offset: u64) -> PortalResult<Vec<PersistedBatch>> {
        let url = self.url(&["api", "batches", ""])?;
        let request = self
            .client
            .get(url)
            .query(&[("limit", limit), ("offset", offset)]);
        self.json("list_batches", request, None).await
    }

    async fn get_batch(&self, batch_id: &str) -> PortalResult<BatchDetails> {
        let url = self.url(&["api", "batches", batch_id])?;
        self.json(
            "get_batch",
            self.client.get(url),
            Some(Missing::Resource("Batch", batch_id)),
        )
        .await
    }

    async fn delete_batch(&self, batch_id: &str) -> PortalResult<()> {
        let url = self.url(&["api", "batches", batch_id])?;
        self.send(
            "delete_batch",
            self.client.delete(url),
            Some(Missing::Resource("Batch", batch_id)),
        )
        .await?;
        Ok(())
    }

    async fn generate_csv(&self, batch_id: &str) -> PortalResult<CsvGeneration> {
        let url = self.url(&["api", "batches", batch_id, "generate-csv"])?;
        self.json(
            "generate_csv",
            self.client.post(url),
            Some(Missing::Resource("Batch", batch_id)),
        )
        .await
    }

    async fn download_csv(&self, batch_id: &str) -> PortalResult<Vec<u8>> {
        let url = self.url(&["api", "batches", batch_id, "download-csv"])?;
        let response = self
            .send(
                "download_csv",
                self.client.get(url),
                Some(Missing::Artifact(batch_id)),
            )
            .await?;
        let bytes = response.bytes().await?;
        Ok(bytes.to_vec())
    }
}
