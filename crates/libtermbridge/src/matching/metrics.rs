use libtermbridge_macros::similarity_metric;

use crate::matching::{Metric, comparers};

#[similarity_metric(Ratio, name = "ratio")]
fn similarity(&self, lhs: &str, rhs: &str) -> f64 {
  comparers::ratio(lhs, rhs)
}

#[similarity_metric(PartialRatio, name = "partial_ratio")]
fn similarity(&self, lhs: &str, rhs: &str) -> f64 {
  comparers::partial_ratio(lhs, rhs)
}

#[similarity_metric(TokenSortRatio, name = "token_sort_ratio")]
fn similarity(&self, lhs: &str, rhs: &str) -> f64 {
  comparers::token_sort_ratio(lhs, rhs)
}

#[similarity_metric(TokenSetRatio, name = "token_set_ratio")]
fn similarity(&self, lhs: &str, rhs: &str) -> f64 {
  comparers::token_set_ratio(lhs, rhs)
}
