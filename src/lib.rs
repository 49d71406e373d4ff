#![allow(async_fn_in_trait)]
pub mod codeocean;
pub mod config;
pub mod data_asset;
pub mod error;
pub mod manifest;
pub mod provision;
pub mod service;
pub mod source_check;
