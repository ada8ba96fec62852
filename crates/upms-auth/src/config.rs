//! Authentication configuration.

/// Configuration for credential hashing and account provisioning.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Argon2id memory cost in KiB (default: 19456 = 19 MiB).
    pub hash_memory_kib: u32,
    /// Argon2id iteration count (default: 2).
    pub hash_iterations: u32,
    /// Argon2id lanes (default: 1).
    pub hash_parallelism: u32,
    /// Optional pepper prepended to passwords before hashing.
    pub pepper: Option<String>,
    /// Length of the per-user alphanumeric salt (default: 32).
    pub salt_length: usize,
    /// Length of the random suffix of an activation code (default: 8).
    pub activation_code_suffix_length: usize,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            // OWASP ASVS recommended: m=19456 (19 MiB), t=2, p=1
            hash_memory_kib: 19456,
            hash_iterations: 2,
            hash_parallelism: 1,
            pepper: None,
            salt_length: 32,
            activation_code_suffix_length: 8,
        }
    }
}
