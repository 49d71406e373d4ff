//! Request and response bodies of the Code Ocean data asset API
use serde::{Deserialize, Serialize};

/// Everything needed to create one data asset.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct DataAssetParams {
    pub name: String,
    pub description: String,
    /// Folder name under `/data` where the asset is attached.
    pub mount: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub source: Source,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Default)]
pub struct Source {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws: Option<AwsS3Source>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub computation: Option<ComputationSource>,
}

impl Source {
    pub fn aws(source: AwsS3Source) -> Self {
        Self {
            aws: Some(source),
            computation: None,
        }
    }

    pub fn computation(source: ComputationSource) -> Self {
        Self {
            aws: None,
            computation: Some(source),
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct AwsS3Source {
    pub bucket: String,
    #[serde(default)]
    pub prefix: String,
    #[serde(default)]
    pub keep_on_external_storage: bool,
    #[serde(default)]
    pub public: bool,
}

/// Captures the results folder of a finished computation.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct ComputationSource {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DataAssetState {
    Draft,
    Ready,
    Failed,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct DataAsset {
    pub id: String,
    pub name: String,
    pub state: DataAssetState,
    #[serde(default)]
    pub mount: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub created: Option<i64>,
    #[serde(default)]
    pub size: Option<u64>,
}

/// Reference to an asset that was accepted but may still be processing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssetHandle {
    pub id: String,
    pub name: String,
}

impl From<&DataAsset> for AssetHandle {
    fn from(asset: &DataAsset) -> Self {
        Self {
            id: asset.id.clone(),
            name: asset.name.clone(),
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Owner,
    Editor,
    Viewer,
}

#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EveryoneRole {
    Viewer,
    None,
}

#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GroupRole {
    Owner,
    Editor,
    Viewer,
    /// Members can find the asset but not open it.
    Discoverable,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct UserPermissions {
    pub email: String,
    pub role: UserRole,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct GroupPermissions {
    pub group: String,
    pub role: GroupRole,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq, Default)]
pub struct Permissions {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub users: Vec<UserPermissions>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<GroupPermissions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub everyone: Option<EveryoneRole>,
    #[serde(default)]
    pub share_assets: bool,
}

impl Permissions {
    /// Every user on the deployment may view the asset, and sharing is on.
    pub fn everyone_viewer() -> Self {
        Self {
            users: vec![],
            groups: vec![],
            everyone: Some(EveryoneRole::Viewer),
            share_assets: true,
        }
    }
}
