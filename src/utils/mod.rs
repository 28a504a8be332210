/// File utilities
pub mod files;

/// Tensor Utilities
pub mod tensors;

/// Seeded parameter initialization
pub mod init;

/// Utilities for classification tasks
pub mod classes;
