//! Predicted vs. actual basket comparison.
//!
//! Comparisons are cached per user using `moka` because the prediction
//! endpoint recomputes on every request.

use std::sync::Arc;

use basket_core::{Alignment, PredictionComparison, UserId};
use moka::future::Cache;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::api::PredictionApi;
use crate::config::StorefrontConfig;
use crate::error::{Result, SyncError, SyncOperation};

/// Aligned comparison for one user.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonReport {
    pub user_id: UserId,
    pub alignment: Alignment,
    /// Share of predicted products that were bought.
    pub precision: f64,
    /// Share of bought products that were predicted.
    pub recall: f64,
}

impl ComparisonReport {
    #[must_use]
    pub fn new(user_id: UserId, comparison: &PredictionComparison) -> Self {
        let alignment = comparison.align();
        Self {
            user_id,
            precision: ratio(alignment.common_count, alignment.predicted_count),
            recall: ratio(alignment.common_count, alignment.actual_count),
            alignment,
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn ratio(common: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        common as f64 / total as f64
    }
}

#[derive(Clone)]
pub struct PredictionService {
    api: Arc<dyn PredictionApi>,
    cache: Cache<UserId, Arc<PredictionComparison>>,
}

impl PredictionService {
    #[must_use]
    pub fn new(api: Arc<dyn PredictionApi>, config: &StorefrontConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.prediction_cache_capacity)
            .time_to_live(config.prediction_cache_ttl)
            .build();
        Self { api, cache }
    }

    /// Fetch (or reuse) the user's baskets and align them.
    ///
    /// # Errors
    ///
    /// [`StoreError::Sync`](crate::StoreError::Sync) if the fetch fails.
    /// Failures are not cached.
    #[instrument(skip(self))]
    pub async fn compare(&self, user_id: UserId) -> Result<ComparisonReport> {
        let comparison = if let Some(cached) = self.cache.get(&user_id).await {
            debug!("Cache hit for prediction comparison");
            cached
        } else {
            let fetched = self.api.fetch(user_id).await.map_err(|err| {
                warn!(error = %err, "Prediction fetch failed");
                SyncError::new(SyncOperation::FetchPredictions, &err)
            })?;
            let fetched = Arc::new(fetched);
            self.cache.insert(user_id, Arc::clone(&fetched)).await;
            fetched
        };

        let report = ComparisonReport::new(user_id, &comparison);
        info!(
            predicted = report.alignment.predicted_count,
            actual = report.alignment.actual_count,
            common = report.alignment.common_count,
            "Baskets compared"
        );
        Ok(report)
    }

    /// Drop one user's cached comparison.
    pub async fn invalidate(&self, user_id: UserId) {
        self.cache.invalidate(&user_id).await;
    }

    pub async fn clear(&self) {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::services::testing::{Scripted, product};

    fn service(api: &Arc<Scripted>) -> PredictionService {
        let config = StorefrontConfig::new(url::Url::parse("http://localhost:8080/api").unwrap());
        PredictionService::new(Arc::clone(api) as Arc<dyn PredictionApi>, &config)
    }

    #[tokio::test]
    async fn test_compare_computes_precision_and_recall() {
        let api = Arc::new(Scripted::default());
        api.prediction(Ok(PredictionComparison {
            predicted: vec![product(1, 5), product(2, 5), product(3, 5), product(4, 5)],
            actual: vec![product(2, 5), product(4, 5)],
        }));
        let predictions = service(&api);

        let report = predictions.compare(UserId::new(9)).await.unwrap();

        assert_eq!(report.alignment.common_count, 2);
        assert_eq!(report.precision, 0.5);
        assert_eq!(report.recall, 1.0);
    }

    #[tokio::test]
    async fn test_compare_reuses_cached_comparison() {
        let api = Arc::new(Scripted::default());
        api.prediction(Ok(PredictionComparison::default()));
        api.prediction(Ok(PredictionComparison::default()));
        let predictions = service(&api);
        let user = UserId::new(9);

        predictions.compare(user).await.unwrap();
        predictions.compare(user).await.unwrap();
        assert_eq!(api.prediction_fetches(), 1);

        predictions.invalidate(user).await;
        predictions.compare(user).await.unwrap();
        assert_eq!(api.prediction_fetches(), 2);
    }

    #[tokio::test]
    async fn test_failed_fetch_is_not_cached() {
        let api = Arc::new(Scripted::default());
        let predictions = service(&api);
        let user = UserId::new(9);

        assert!(predictions.compare(user).await.is_err());
        api.prediction(Ok(PredictionComparison::default()));
        predictions.compare(user).await.unwrap();
        assert_eq!(api.prediction_fetches(), 2);
    }

    #[test]
    fn test_empty_baskets_have_zero_ratios() {
        let report = ComparisonReport::new(UserId::new(1), &PredictionComparison::default());
        assert_eq!(report.precision, 0.0);
        assert_eq!(report.recall, 0.0);
    }
}
