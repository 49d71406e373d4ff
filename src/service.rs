use crate::data_asset::{AssetHandle, DataAsset, DataAssetParams, Permissions};

/// Remote service that owns data assets.
pub trait DataAssetService {
    async fn create_data_asset(self: &Self, params: &DataAssetParams)
        -> anyhow::Result<AssetHandle>;

    /// Resolves once the asset is ready; fails if processing fails.
    async fn wait_until_ready(self: &Self, handle: &AssetHandle) -> anyhow::Result<DataAsset>;

    async fn update_permissions(
        self: &Self,
        data_asset_id: &str,
        permissions: &Permissions,
    ) -> anyhow::Result<()>;
}
