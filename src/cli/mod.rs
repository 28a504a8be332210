/// CLI Indexes: Pipelines
pub mod pipelines;

/// CLI Indexes: Model presets
pub mod models;

/// CLI Indexes: Datasets
pub mod datasets;
