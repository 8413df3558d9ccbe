//! Compiled-validator cache.
//!
//! Compiling a JSON Schema is far more expensive than running it, and
//! response envelopes are validated on every send. The cache stores compiled
//! validators keyed by route key, validation kind, and a content hash of the
//! schema, so a route whose declared schema changes between builds can never
//! be served a stale validator.
//!
//! Calls that supply custom format validators bypass the cache entirely:
//! their predicates are baked into the compiled instance and must stay
//! scoped to the single call.

use jsonschema::JSONSchema;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};

use super::core::compile_schema;

/// Thread-safe cache of compiled schema validators.
///
/// Cloning is cheap; clones share the underlying store. Disable at runtime
/// with `SCHEMAROUTE_SCHEMA_CACHE=off`.
#[derive(Clone)]
pub struct ValidatorCache {
    /// Key format: "{route_key}:{kind}:{schema_hash}"
    cache: Arc<RwLock<HashMap<String, Arc<JSONSchema>>>>,
    enabled: bool,
}

impl ValidatorCache {
    pub fn new(enabled: bool) -> Self {
        debug!(enabled = enabled, "Initializing schema validator cache");
        Self {
            cache: Arc::new(RwLock::new(HashMap::new())),
            enabled,
        }
    }

    /// First 16 hex chars of the SHA-256 of the schema's canonical JSON.
    fn schema_hash(schema: &Value) -> String {
        let mut hasher = Sha256::new();
        hasher.update(schema.to_string().as_bytes());
        let digest = format!("{:x}", hasher.finalize());
        digest.chars().take(16).collect()
    }

    fn cache_key(route_key: &str, kind: &str, schema: &Value) -> String {
        format!("{}:{}:{}", route_key, kind, Self::schema_hash(schema))
    }

    /// Return a cached validator for `(route_key, kind, schema)`, compiling
    /// and inserting on miss. `None` means the schema failed to compile.
    pub fn get_or_compile(
        &self,
        route_key: &str,
        kind: &str,
        schema: &Value,
    ) -> Option<Arc<JSONSchema>> {
        if !self.enabled {
            return match compile_schema(schema, &[]) {
                Ok(compiled) => Some(Arc::new(compiled)),
                Err(error) => {
                    warn!(route_key = route_key, kind = kind, error = %error, "Schema failed to compile");
                    None
                }
            };
        }

        let key = Self::cache_key(route_key, kind, schema);

        {
            let cache = self.cache.read().expect("validator cache lock poisoned");
            if let Some(validator) = cache.get(&key) {
                debug!(route_key = route_key, kind = kind, cache_key = %key, "Schema validator cache hit");
                return Some(Arc::clone(validator));
            }
        }

        match compile_schema(schema, &[]) {
            Ok(compiled) => {
                let validator = Arc::new(compiled);
                let mut cache = self.cache.write().expect("validator cache lock poisoned");
                // Another coroutine may have compiled while we waited
                if let Some(existing) = cache.get(&key) {
                    return Some(Arc::clone(existing));
                }
                cache.insert(key.clone(), Arc::clone(&validator));
                info!(
                    route_key = route_key,
                    kind = kind,
                    cache_key = %key,
                    cache_size = cache.len(),
                    "Schema validator compiled and cached"
                );
                Some(validator)
            }
            Err(error) => {
                warn!(route_key = route_key, kind = kind, error = %error, "Schema failed to compile");
                None
            }
        }
    }

    /// Number of validators currently cached.
    #[must_use]
    pub fn size(&self) -> usize {
        self.cache.read().expect("validator cache lock poisoned").len()
    }

    /// Drop all cached validators.
    pub fn clear(&self) {
        let mut cache = self.cache.write().expect("validator cache lock poisoned");
        cache.clear();
    }
}
