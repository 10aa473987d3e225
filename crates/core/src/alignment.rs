//! Predicted vs. actual basket alignment.
//!
//! Pairs the basket a model predicted with the basket the customer actually
//! bought, producing equal-width rows for a side-by-side comparison:
//!
//! 1. Matched rows first, in the predicted basket's order.
//! 2. Then the leftovers paired positionally: predicted-only on the left,
//!    actual-only on the right, either side empty when the lists differ in
//!    length.
//!
//! Duplicate product ids multiply-match by occurrence: every occurrence in
//! the actual basket can be claimed by at most one predicted occurrence. With
//! `predicted = [A, A]` and `actual = [A]` the result is one matched `(A, A)`
//! row and one unmatched `(A, -)` row. Nothing is collapsed or rejected.
//!
//! Matching uses a hash index over the actual basket, so alignment is
//! O(n + m).

use std::collections::{HashMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::types::{Product, ProductId};

/// Outcome badge for one side of a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowBadge {
    /// Predicted and bought.
    Hit,
    /// Predicted but not bought.
    FalsePositive,
    /// Bought but not predicted.
    Missed,
}

/// One paired slot in the comparison display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlignedRow {
    pub predicted: Option<Product>,
    pub actual: Option<Product>,
    pub is_matched: bool,
}

impl AlignedRow {
    /// Badge for the predicted side, if occupied.
    #[must_use]
    pub const fn predicted_badge(&self) -> Option<RowBadge> {
        match (&self.predicted, self.is_matched) {
            (None, _) => None,
            (Some(_), true) => Some(RowBadge::Hit),
            (Some(_), false) => Some(RowBadge::FalsePositive),
        }
    }

    /// Badge for the actual side, if occupied.
    #[must_use]
    pub const fn actual_badge(&self) -> Option<RowBadge> {
        match (&self.actual, self.is_matched) {
            (None, _) => None,
            (Some(_), true) => Some(RowBadge::Hit),
            (Some(_), false) => Some(RowBadge::Missed),
        }
    }
}

/// Result of aligning two baskets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Alignment {
    pub rows: Vec<AlignedRow>,
    pub predicted_count: usize,
    pub actual_count: usize,
    pub common_count: usize,
}

impl Alignment {
    /// Matched rows.
    pub fn matched(&self) -> impl Iterator<Item = &AlignedRow> {
        self.rows.iter().filter(|row| row.is_matched)
    }

    /// Ids of predicted products that were bought.
    #[must_use]
    pub fn hits(&self) -> HashSet<ProductId> {
        self.matched()
            .filter_map(|row| row.predicted.as_ref().map(|product| product.id))
            .collect()
    }
}

/// A predicted basket and the basket actually bought.
///
/// The ground-truth side arrives as either `trueFutureBasket` or
/// `groundTruthBasket` depending on the prediction endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionComparison {
    #[serde(rename = "predictedBasket", default)]
    pub predicted: Vec<Product>,
    #[serde(rename = "trueFutureBasket", alias = "groundTruthBasket", default)]
    pub actual: Vec<Product>,
}

impl PredictionComparison {
    #[must_use]
    pub fn align(&self) -> Alignment {
        align_baskets(&self.predicted, &self.actual)
    }
}

/// Align a predicted basket against the actual one.
#[must_use]
pub fn align_baskets(predicted: &[Product], actual: &[Product]) -> Alignment {
    let mut unclaimed: HashMap<ProductId, VecDeque<usize>> = HashMap::new();
    for (index, product) in actual.iter().enumerate() {
        unclaimed.entry(product.id).or_default().push_back(index);
    }

    let mut claimed = vec![false; actual.len()];
    let mut rows = Vec::with_capacity(predicted.len().max(actual.len()));
    let mut predicted_only = Vec::new();

    for product in predicted {
        let partner = unclaimed
            .get_mut(&product.id)
            .and_then(VecDeque::pop_front)
            .and_then(|index| {
                if let Some(flag) = claimed.get_mut(index) {
                    *flag = true;
                }
                actual.get(index)
            });

        match partner {
            Some(bought) => rows.push(AlignedRow {
                predicted: Some(product.clone()),
                actual: Some(bought.clone()),
                is_matched: true,
            }),
            None => predicted_only.push(product),
        }
    }

    let common_count = rows.len();
    let actual_only: Vec<&Product> = actual
        .iter()
        .zip(&claimed)
        .filter(|(_, claimed)| !**claimed)
        .map(|(product, _)| product)
        .collect();

    let leftover = predicted_only.len().max(actual_only.len());
    rows.extend((0..leftover).map(|i| AlignedRow {
        predicted: predicted_only.get(i).map(|product| (*product).clone()),
        actual: actual_only.get(i).map(|product| (*product).clone()),
        is_matched: false,
    }));

    Alignment {
        rows,
        predicted_count: predicted.len(),
        actual_count: actual.len(),
        common_count,
    }
}
