//! Engine algorithm tests

mod content_test;
mod metrics_test;
mod preference_test;
