//! Concurrent create-and-wait of data assets
use crate::data_asset::{DataAsset, DataAssetParams, Permissions};
use crate::error::ProvisionError;
use crate::service::DataAssetService;
use anyhow::Result;
use futures_util::future::try_join_all;
use tokio::sync::Semaphore;
use tracing::info;

const MAX_DEFAULT_CONCURRENCY: usize = 32;

/// `min(32, cpus + 4)`, enough to keep every asset of a typical batch in flight.
pub fn default_concurrency() -> usize {
    let cpus = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    (cpus + 4).min(MAX_DEFAULT_CONCURRENCY)
}

pub async fn create_and_wait(
    service: &impl DataAssetService,
    params: &DataAssetParams,
) -> Result<DataAsset> {
    let handle = service.create_data_asset(params).await?;
    info!(name = %params.name, id = %handle.id, mount = %params.mount, "Creating data asset");

    let asset = service.wait_until_ready(&handle).await?;
    info!(name = %asset.name, id = %asset.id, "Data asset creation complete");
    Ok(asset)
}

/// Creates every asset in `specs` and waits for all of them to become ready.
///
/// At most `concurrency` assets are in flight at once. The returned assets are in
/// the same order as `specs`. The first failure aborts the whole batch; assets
/// created before it are left on the service as they are.
pub async fn provision(
    service: &impl DataAssetService,
    specs: &[DataAssetParams],
    concurrency: usize,
) -> Result<Vec<DataAsset>> {
    if specs.is_empty() {
        return Err(ProvisionError::NoAssets.into());
    }
    if concurrency == 0 {
        return Err(ProvisionError::ZeroConcurrency.into());
    }

    let limit = Semaphore::new(concurrency);
    let limit = &limit;
    let tasks = specs.iter().map(|params| async move {
        let _permit = limit.acquire().await?;
        create_and_wait(service, params).await
    });
    try_join_all(tasks).await
}

/// Applies `permissions` to each asset in turn, stopping at the first failure.
pub async fn grant_permissions(
    service: &impl DataAssetService,
    assets: &[DataAsset],
    permissions: &Permissions,
) -> Result<()> {
    for asset in assets {
        service.update_permissions(&asset.id, permissions).await?;
        info!(name = %asset.name, id = %asset.id, "Updated data asset permissions");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_asset::{AssetHandle, AwsS3Source, DataAssetState, Source};
    use crate::error::ServiceError;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Create(String),
        Ready(String),
    }

    #[derive(Default)]
    struct MockService {
        create_delay: HashMap<String, Duration>,
        wait_delay: HashMap<String, Duration>,
        fail_create: Option<String>,
        fail_wait: Option<String>,
        fail_permissions: Option<String>,
        next_id: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        calls: Mutex<Vec<Call>>,
        permission_calls: AtomicUsize,
        permissions: Mutex<HashMap<String, Permissions>>,
    }

    impl MockService {
        fn creates(&self) -> usize {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter(|c| matches!(c, Call::Create(_)))
                .count()
        }
    }

    impl DataAssetService for MockService {
        async fn create_data_asset(&self, params: &DataAssetParams) -> Result<AssetHandle> {
            let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(running, Ordering::SeqCst);
            self.calls
                .lock()
                .unwrap()
                .push(Call::Create(params.name.clone()));

            if let Some(delay) = self.create_delay.get(&params.name) {
                tokio::time::sleep(*delay).await;
            }
            if self.fail_create.as_deref() == Some(params.name.as_str()) {
                return Err(ServiceError::Status {
                    status: reqwest::StatusCode::BAD_REQUEST,
                    body: "invalid params".to_string(),
                }
                .into());
            }

            let n = self.next_id.fetch_add(1, Ordering::SeqCst);
            Ok(AssetHandle {
                id: format!("da-{n}"),
                name: params.name.clone(),
            })
        }

        async fn wait_until_ready(&self, handle: &AssetHandle) -> Result<DataAsset> {
            if let Some(delay) = self.wait_delay.get(&handle.name) {
                tokio::time::sleep(*delay).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            if self.fail_wait.as_deref() == Some(handle.name.as_str()) {
                return Err(ServiceError::AssetFailed {
                    id: handle.id.clone(),
                    name: handle.name.clone(),
                }
                .into());
            }
            self.calls
                .lock()
                .unwrap()
                .push(Call::Ready(handle.name.clone()));
            Ok(DataAsset {
                id: handle.id.clone(),
                name: handle.name.clone(),
                state: DataAssetState::Ready,
                mount: String::new(),
                description: String::new(),
                tags: vec![],
                created: None,
                size: None,
            })
        }

        async fn update_permissions(
            &self,
            data_asset_id: &str,
            permissions: &Permissions,
        ) -> Result<()> {
            self.permission_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_permissions.as_deref() == Some(data_asset_id) {
                return Err(ServiceError::Status {
                    status: reqwest::StatusCode::FORBIDDEN,
                    body: "insufficient privilege".to_string(),
                }
                .into());
            }
            self.permissions
                .lock()
                .unwrap()
                .insert(data_asset_id.to_string(), permissions.clone());
            Ok(())
        }
    }

    fn spec(name: &str) -> DataAssetParams {
        DataAssetParams {
            name: name.to_string(),
            description: format!("{name} description"),
            mount: name.to_lowercase(),
            tags: vec!["SDK".to_string()],
            source: Source::aws(AwsS3Source {
                bucket: "codeocean-public-data".to_string(),
                prefix: format!("example_datasets/{name}/"),
                keep_on_external_storage: false,
                public: true,
            }),
        }
    }

    fn names(assets: &[DataAsset]) -> Vec<&str> {
        assets.iter().map(|a| a.name.as_str()).collect()
    }

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    #[tokio::test]
    async fn test_order_matches_input_when_completed_in_reverse() {
        let specs: Vec<_> = ["A", "B", "C", "D"].iter().map(|n| spec(n)).collect();
        let service = MockService {
            wait_delay: HashMap::from([
                ("A".to_string(), ms(80)),
                ("B".to_string(), ms(60)),
                ("C".to_string(), ms(40)),
                ("D".to_string(), ms(20)),
            ]),
            ..Default::default()
        };

        let assets = provision(&service, &specs, 4).await.unwrap();
        assert_eq!(names(&assets), vec!["A", "B", "C", "D"]);

        let readies: Vec<_> = service
            .calls
            .lock()
            .unwrap()
            .iter()
            .filter_map(|c| match c {
                Call::Ready(name) => Some(name.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(readies, vec!["D", "C", "B", "A"]);
    }

    #[tokio::test]
    async fn test_slow_create_keeps_position() {
        let specs = vec![spec("A"), spec("B"), spec("C")];
        let service = MockService {
            create_delay: HashMap::from([("B".to_string(), ms(60))]),
            ..Default::default()
        };

        let assets = provision(&service, &specs, 3).await.unwrap();
        assert_eq!(names(&assets), vec!["A", "B", "C"]);
    }

    #[tokio::test]
    async fn test_workflows_overlap() {
        let specs = vec![spec("A"), spec("B"), spec("C")];
        let service = MockService {
            wait_delay: HashMap::from([
                ("A".to_string(), ms(30)),
                ("B".to_string(), ms(30)),
                ("C".to_string(), ms(30)),
            ]),
            ..Default::default()
        };

        provision(&service, &specs, default_concurrency()).await.unwrap();

        // Every create was issued before any asset became ready.
        let calls = service.calls.lock().unwrap().clone();
        let first_ready = calls
            .iter()
            .position(|c| matches!(c, Call::Ready(_)))
            .unwrap();
        assert_eq!(first_ready, 3);
        assert_eq!(service.max_in_flight.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_concurrency_limit() {
        let specs: Vec<_> = ["A", "B", "C", "D", "E"].iter().map(|n| spec(n)).collect();
        let service = MockService {
            wait_delay: specs.iter().map(|s| (s.name.clone(), ms(20))).collect(),
            ..Default::default()
        };

        let assets = provision(&service, &specs, 2).await.unwrap();
        assert_eq!(assets.len(), 5);
        assert_eq!(service.max_in_flight.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_one_create_per_spec_with_duplicates() {
        let specs = vec![spec("A"), spec("A"), spec("B")];
        let service = MockService::default();

        let assets = provision(&service, &specs, 3).await.unwrap();
        assert_eq!(service.creates(), 3);
        assert_eq!(names(&assets), vec!["A", "A", "B"]);
        assert_ne!(assets[0].id, assets[1].id);
    }

    #[tokio::test]
    async fn test_wait_failure_aborts_batch() {
        let specs = vec![spec("A"), spec("B"), spec("C")];
        let service = MockService {
            wait_delay: HashMap::from([
                ("A".to_string(), ms(50)),
                ("C".to_string(), ms(50)),
            ]),
            fail_wait: Some("B".to_string()),
            ..Default::default()
        };

        let err = provision(&service, &specs, 3).await.unwrap_err();
        match err.downcast_ref::<ServiceError>() {
            Some(ServiceError::AssetFailed { name, .. }) => assert_eq!(name, "B"),
            other => panic!("unexpected error: {other:?}"),
        }
        // The batch did not wait for the slower assets.
        assert!(service.calls.lock().unwrap().iter().all(|c| !matches!(c, Call::Ready(_))));
    }

    #[tokio::test]
    async fn test_create_failure_aborts_batch() {
        let specs = vec![spec("A"), spec("B"), spec("C")];
        let service = MockService {
            fail_create: Some("B".to_string()),
            ..Default::default()
        };

        let err = provision(&service, &specs, 3).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ServiceError>(),
            Some(ServiceError::Status { .. })
        ));
    }

    #[tokio::test]
    async fn test_empty_input_and_zero_concurrency() {
        let service = MockService::default();

        let err = provision(&service, &[], 4).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ProvisionError>(),
            Some(ProvisionError::NoAssets)
        ));

        let err = provision(&service, &[spec("A")], 0).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ProvisionError>(),
            Some(ProvisionError::ZeroConcurrency)
        ));
        assert_eq!(service.creates(), 0);
    }

    #[tokio::test]
    async fn test_grant_permissions_twice() {
        let specs = vec![spec("A"), spec("B")];
        let service = MockService::default();
        let assets = provision(&service, &specs, 2).await.unwrap();

        let permissions = Permissions::everyone_viewer();
        grant_permissions(&service, &assets, &permissions).await.unwrap();
        let first = service.permissions.lock().unwrap().clone();
        grant_permissions(&service, &assets, &permissions).await.unwrap();
        let second = service.permissions.lock().unwrap().clone();

        assert_eq!(first, second);
        assert_eq!(second.len(), 2);
        assert_eq!(service.permission_calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_grant_permissions_stops_at_failure() {
        let specs = vec![spec("A"), spec("B"), spec("C")];
        let service = MockService {
            fail_permissions: Some("da-1".to_string()),
            ..Default::default()
        };
        let assets = provision(&service, &specs, 1).await.unwrap();
        assert_eq!(assets[1].id, "da-1");

        let err = grant_permissions(&service, &assets, &Permissions::everyone_viewer())
            .await
            .unwrap_err();
        assert!(err.downcast_ref::<ServiceError>().is_some());
        assert_eq!(service.permission_calls.load(Ordering::SeqCst), 2);
        assert!(!service.permissions.lock().unwrap().contains_key("da-2"));
    }

    #[test]
    fn test_default_concurrency_bounds() {
        let n = default_concurrency();
        assert!(n >= 5);
        assert!(n <= MAX_DEFAULT_CONCURRENCY);
    }
}
