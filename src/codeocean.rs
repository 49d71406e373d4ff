//! reqwest client for the Code Ocean data asset API
use crate::config::Config;
use crate::data_asset::{AssetHandle, DataAsset, DataAssetParams, DataAssetState, Permissions};
use crate::error::{ConfigError, ServiceError};
use crate::service::DataAssetService;
use anyhow::Result;
use reqwest::{Client, Response};
use std::time::{Duration, Instant};
use tracing::debug;
use url::Url;

const API_PATH: [&str; 2] = ["api", "v1"];

pub struct CodeOcean {
    client: Client,
    base: Url,
    token: String,
    polling_interval: Duration,
    timeout: Option<Duration>,
}

impl CodeOcean {
    pub fn new(config: &Config) -> Result<Self> {
        // Keep any path the deployment is served under
        let mut base = config.domain.clone();
        base.path_segments_mut()
            .map_err(|_| ConfigError::InvalidDomain {
                domain: config.domain.to_string(),
                reason: "not a base URL".to_string(),
            })?
            .pop_if_empty()
            .extend(API_PATH);
        Ok(Self {
            client: Client::new(),
            base,
            token: config.token.clone(),
            polling_interval: config.polling_interval,
            timeout: config.timeout,
        })
    }

    pub async fn get_data_asset(self: &Self, data_asset_id: &str) -> Result<DataAsset> {
        let url = self.url(&["data_assets", data_asset_id])?;
        let response = self
            .client
            .get(url)
            .basic_auth(&self.token, Some(""))
            .send()
            .await
            .map_err(ServiceError::from)?;
        let asset = check_status(response)
            .await?
            .json::<DataAsset>()
            .await
            .map_err(ServiceError::from)?;
        Ok(asset)
    }

    /// Each segment is percent-encoded, so ids cannot escape their path position.
    fn url(self: &Self, segments: &[&str]) -> Result<Url, ServiceError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ServiceError::Endpoint(self.base.to_string()))?
            .extend(segments);
        Ok(url)
    }
}

impl DataAssetService for CodeOcean {
    async fn create_data_asset(self: &Self, params: &DataAssetParams) -> Result<AssetHandle> {
        let url = self.url(&["data_assets"])?;
        let response = self
            .client
            .post(url)
            .basic_auth(&self.token, Some(""))
            .json(params)
            .send()
            .await
            .map_err(ServiceError::from)?;
        let asset = check_status(response)
            .await?
            .json::<DataAsset>()
            .await
            .map_err(ServiceError::from)?;
        Ok(AssetHandle::from(&asset))
    }

    async fn wait_until_ready(self: &Self, handle: &AssetHandle) -> Result<DataAsset> {
        let started = Instant::now();
        loop {
            let asset = self.get_data_asset(&handle.id).await?;
            match asset.state {
                DataAssetState::Ready => return Ok(asset),
                DataAssetState::Failed => {
                    return Err(ServiceError::AssetFailed {
                        id: asset.id,
                        name: asset.name,
                    }
                    .into())
                }
                DataAssetState::Draft => {}
            }

            if let Some(timeout) = self.timeout {
                if started.elapsed() > timeout {
                    return Err(ServiceError::Timeout {
                        id: handle.id.clone(),
                    }
                    .into());
                }
            }

            debug!(id = %handle.id, "Data asset not ready, polling again");
            tokio::time::sleep(self.polling_interval).await;
        }
    }

    async fn update_permissions(
        self: &Self,
        data_asset_id: &str,
        permissions: &Permissions,
    ) -> Result<()> {
        let url = self.url(&["data_assets", data_asset_id, "permissions"])?;
        let response = self
            .client
            .post(url)
            .basic_auth(&self.token, Some(""))
            .json(permissions)
            .send()
            .await
            .map_err(ServiceError::from)?;
        check_status(response).await?;
        Ok(())
    }
}

async fn check_status(response: Response) -> Result<Response, ServiceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ServiceError::Status { status, body })
}
