//# The search, gallery and detail pipelines and the views they feed
pub mod batch;
pub mod detail;
pub mod filter;
pub mod gallery;
pub mod search;
pub mod view;
