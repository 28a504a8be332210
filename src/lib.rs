//! # Burn Text RNN
//!
//! Text classification with vocabularies, padded batches and recurrent classifiers on Burn.
#![forbid(unsafe_code)]

/// Errors
pub mod error;

/// Tokenization, vocabularies, vectorization and batching
pub mod text;

/// Pre-trained embedding providers
pub mod embeddings;

/// Models
pub mod models;

/// Pipelines
pub mod pipelines;

/// Datasets
pub mod datasets;

/// Backends used by the binaries
pub mod backend;

/// Utilities
pub mod utils;

/// CLI indexes and utilities
pub mod cli;

/// Error macros
#[macro_use]
extern crate anyhow;
