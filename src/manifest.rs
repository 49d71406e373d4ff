use crate::data_asset::DataAssetParams;
use crate::error::ManifestError;
use anyhow::Result;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use toml;

/// A list of data assets to create, stored as `[[assets]]` tables.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct AssetManifest {
    pub assets: Vec<DataAssetParams>,
}

impl AssetManifest {
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let manifest: Self = toml::from_str(&content)?;
        Ok(manifest)
    }

    pub fn write<P: AsRef<Path>>(self: &Self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn from_template(table: &toml::Table) -> Result<Self> {
        let manifest: Self = toml::Value::Table(table.clone()).try_into()?;
        Ok(manifest)
    }

    pub fn validate(self: &Self) -> Result<(), ManifestError> {
        if self.assets.is_empty() {
            return Err(ManifestError::Empty);
        }

        // A mount is a single folder name under /data
        let mount_re =
            Regex::new(r"^[A-Za-z0-9_.-]+$").expect("Regex pattern should always compile");

        for (index, params) in self.assets.iter().enumerate() {
            if params.name.trim().is_empty() {
                return Err(ManifestError::EmptyName { index });
            }
            if !mount_re.is_match(&params.mount) || params.mount == "." || params.mount == ".." {
                return Err(ManifestError::InvalidMount {
                    name: params.name.clone(),
                    mount: params.mount.clone(),
                });
            }
            if params.source.aws.is_some() == params.source.computation.is_some() {
                return Err(ManifestError::Source {
                    name: params.name.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Reads, annotation and STAR index used by the RNA-seq pipeline training capsule.
pub fn pipeline_training_toml() -> toml::Table {
    toml::toml! {
        [[assets]]
        name = "Pipeline Training: NGS Reads"
        description = "Paired end reads from GSE157194 patient 1"
        mount = "reads"
        tags = ["fastq", "genomics", "SDK"]
        source = { aws = { bucket = "codeocean-public-data", prefix = "example_datasets/rna-seq-tutorial/GSE157194_reads/", public = true, keep_on_external_storage = false } }

        [[assets]]
        name = "Pipeline Training: GRCh38 Release 21 GTF"
        description = "Comprehensive gene annotation on the reference chromosomes only."
        mount = "annotation"
        tags = ["gtf", "genomics", "SDK"]
        source = { aws = { bucket = "codeocean-public-data", prefix = "example_datasets/GRCh38_GTF/", public = true, keep_on_external_storage = false } }

        [[assets]]
        name = "Pipeline Training: STAR GRCh38 GENCODE Release 21 Index"
        description = "Created with STAR 2.7.10a from GENCODE Release 21 (GRCh38) assembly with comprehensive gene annotation."
        mount = "star_index"
        tags = ["STAR", "genomics", "SDK", "index"]
        source = { aws = { bucket = "codeocean-public-data", prefix = "example_datasets/STAR_GRCh38_GENCODE_Release_21_Index/star_index/", public = true, keep_on_external_storage = false } }
    }
}

pub fn pipeline_training() -> Result<AssetManifest> {
    AssetManifest::from_template(&pipeline_training_toml())
}
