//! Shared test utilities for the knowledge bank crates
//!
//! - `TestGrpcServer`: in-process tonic server on an ephemeral port, shut down on drop
//! - `TestDataBuilder`: deterministic test data generation
//! - `assertions`: float comparison helpers
//!
//! # Usage
//!
//! ```rust,ignore
//! use test_utils::{TestDataBuilder, TestGrpcServer};
//! use tonic::service::Routes;
//!
//! #[tokio::test]
//! async fn my_grpc_test() {
//!     let server = TestGrpcServer::start(Routes::new(my_service)).await;
//!     let builder = TestDataBuilder::from_test_name("my_grpc_test");
//!
//!     let client = connect(server.endpoint()).await;
//!     let keys = builder.keys("word", 3);
//! }
//! ```

mod grpc;

pub use grpc::TestGrpcServer;

use std::path::PathBuf;

/// Builder for test data with deterministic randomization
///
/// This ensures tests are reproducible by deriving all data from one seed.
pub struct TestDataBuilder {
    seed: u64,
}

impl TestDataBuilder {
    /// Create a new builder with a seed (for deterministic tests)
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Create from test name (generates seed from test name hash)
    ///
    /// ```
    /// use test_utils::TestDataBuilder;
    ///
    /// let builder = TestDataBuilder::from_test_name("test_lookup_cold_start");
    /// assert_eq!(builder.keys("k", 2).len(), 2);
    /// ```
    pub fn from_test_name(name: &str) -> Self {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        name.hash(&mut hasher);
        Self::new(hasher.finish())
    }

    /// Unique session name, e.g. `test-session-12345-main`
    pub fn name(&self, prefix: &str, suffix: &str) -> String {
        format!("test-{}-{}-{}", prefix, self.seed, suffix)
    }

    /// `count` distinct keys of the form `{prefix}-{seed}-{i}`
    pub fn keys(&self, prefix: &str, count: usize) -> Vec<String> {
        (0..count)
            .map(|i| format!("{}-{}-{}", prefix, self.seed, i))
            .collect()
    }

    /// Deterministic vector with components in [-1, 1)
    pub fn vector(&self, dim: usize, salt: u64) -> Vec<f32> {
        let mut state = self.seed ^ salt.wrapping_mul(0x9E37_79B9_7F4A_7C15);
        (0..dim)
            .map(|_| {
                // xorshift64
                state ^= state << 13;
                state ^= state >> 7;
                state ^= state << 17;
                ((state >> 40) as f32 / (1u64 << 24) as f32) * 2.0 - 1.0
            })
            .collect()
    }

    /// Fresh temporary directory, removed when the returned guard drops
    pub fn temp_dir(&self) -> tempfile::TempDir {
        tempfile::Builder::new()
            .prefix(&format!("kbs-test-{}-", self.seed))
            .tempdir()
            .unwrap_or_else(|e| panic!("Failed to create temp dir: {e}"))
    }

    /// Path inside `dir` that is guaranteed not to exist yet
    pub fn missing_path(&self, dir: &tempfile::TempDir) -> PathBuf {
        dir.path().join(format!("missing-{}", self.seed))
    }
}

/// Test assertion helpers
pub mod assertions {
    /// Assert two floats are within `eps` of each other
    pub fn assert_close(actual: f32, expected: f32, eps: f32, context: &str) {
        assert!(
            (actual - expected).abs() <= eps,
            "{}: expected {}, got {} (eps {})",
            context,
            expected,
            actual,
            eps
        );
    }

    /// Assert two float slices have the same length and are element-wise within `eps`
    pub fn assert_all_close(actual: &[f32], expected: &[f32], eps: f32, context: &str) {
        assert_eq!(
            actual.len(),
            expected.len(),
            "{}: length mismatch, expected {:?}, got {:?}",
            context,
            expected,
            actual
        );
        for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
            assert_close(*a, *e, eps, &format!("{context}[{i}]"));
        }
    }

    /// Assert that an optional value is Some
    pub fn assert_some<T>(value: Option<T>, context: &str) -> T {
        value.unwrap_or_else(|| panic!("{}: expected Some, got None", context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_builder_deterministic() {
        let builder1 = TestDataBuilder::new(42);
        let builder2 = TestDataBuilder::new(42);

        assert_eq!(builder1.keys("k", 3), builder2.keys("k", 3));
        assert_eq!(builder1.vector(4, 1), builder2.vector(4, 1));
        assert_eq!(builder1.name("session", "a"), builder2.name("session", "a"));
    }

    #[test]
    fn test_data_builder_different_names() {
        let builder1 = TestDataBuilder::from_test_name("test1");
        let builder2 = TestDataBuilder::from_test_name("test2");

        assert_ne!(builder1.keys("k", 1), builder2.keys("k", 1));
    }

    #[test]
    fn test_vector_range() {
        let v = TestDataBuilder::new(7).vector(64, 3);
        assert_eq!(v.len(), 64);
        assert!(v.iter().all(|x| (-1.0..1.0).contains(x)));
    }

    #[test]
    fn test_temp_dir_cleanup() {
        let builder = TestDataBuilder::new(9);
        let path = {
            let dir = builder.temp_dir();
            assert!(!builder.missing_path(&dir).exists());
            dir.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn test_assert_all_close() {
        assertions::assert_all_close(&[1.0, 2.0], &[1.0005, 1.9995], 1e-3, "close");
    }

    #[test]
    #[should_panic]
    fn test_assert_all_close_length_mismatch() {
        assertions::assert_all_close(&[1.0], &[1.0, 2.0], 1e-3, "len");
    }
}
