//! Preflight check that public S3 sources are readable before assets are created
use crate::data_asset::{AwsS3Source, DataAssetParams};
use crate::error::SourceCheckError;
use anyhow::Result;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::Client;
use tracing::info;

pub const DEFAULT_REGION: &str = "us-east-1";

pub async fn anon_client(region: &str) -> Client {
    let region = Region::new(region.to_string());
    let config = aws_config::defaults(BehaviorVersion::latest())
        .no_credentials()
        .region(region)
        .load()
        .await;
    Client::new(&config)
}

/// Sources that can be listed without credentials.
pub fn public_aws_sources(specs: &[DataAssetParams]) -> Vec<&AwsS3Source> {
    specs
        .iter()
        .filter_map(|params| params.source.aws.as_ref())
        .filter(|aws| aws.public)
        .collect()
}

pub async fn check_sources(client: &Client, specs: &[DataAssetParams]) -> Result<()> {
    for source in public_aws_sources(specs) {
        let listing = client
            .list_objects_v2()
            .bucket(&source.bucket)
            .prefix(&source.prefix)
            .max_keys(1)
            .send()
            .await?;

        if listing.contents().is_empty() {
            return Err(SourceCheckError::EmptyPrefix {
                bucket: source.bucket.clone(),
                prefix: source.prefix.clone(),
            }
            .into());
        }
        info!(bucket = %source.bucket, prefix = %source.prefix, "Source found");
    }
    Ok(())
}
