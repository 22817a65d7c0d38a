//! Shared fixture paths for integration tests.
//!
//! For assertion helpers, use `ginfer::testing`.

#![allow(dead_code)]

use std::path::PathBuf;

/// Base directory for test cases.
pub fn test_cases_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/test-cases")
}

/// A hand-sized 2-representation model with identity weights and
/// running-stats norms chosen so normalization is the identity map.
pub fn tiny_model_path() -> PathBuf {
    test_cases_dir().join("gin/tiny.model.txt")
}

/// Two graphs: a 3-node path (label 7, tags 5 5 9) and a 2-node pair
/// (label 3, tags 5 9). Tags densify to one-hot indices 0 and 1.
pub fn tiny_dataset_path() -> PathBuf {
    test_cases_dir().join("gin/tiny.dataset.txt")
}
