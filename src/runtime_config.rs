//! Environment variable based runtime configuration.
//!
//! ## `SCHEMAROUTE_STACK_SIZE`
//!
//! Stack size for route coroutines, decimal (`262144`) or hexadecimal
//! (`0x40000`). Default: `0x40000` (256 KB). Route coroutines compile and
//! run schema validators while answering a request, which needs far more
//! stack than a thin handler would. Total memory is
//! `stack_size × concurrent coroutines`, so tune it to handler complexity.
//!
//! ## `SCHEMAROUTE_SCHEMA_CACHE`
//!
//! Set to `off` to disable the compiled schema validator cache. Enabled by
//! default; disabling it compiles the response schema on every send, which
//! is only useful when schemas change at runtime.

use std::env;

/// Default route coroutine stack size in bytes (256 KB). Sized for the
/// envelope self-validation that runs inside the coroutine.
pub const DEFAULT_STACK_SIZE: usize = 0x40000;

/// Runtime configuration loaded from environment variables.
///
/// Load at startup with [`RuntimeConfig::from_env()`].
#[derive(Debug, Clone, Copy)]
pub struct RuntimeConfig {
    /// Stack size for route coroutines in bytes (default: 256 KB / 0x40000)
    pub stack_size: usize,
    /// Whether compiled schema validators are cached (default: true)
    pub schema_cache_enabled: bool,
}

/// Parse a stack size value, decimal or `0x`-prefixed hexadecimal.
fn parse_stack_size(value: &str) -> Option<usize> {
    if let Some(hex) = value.strip_prefix("0x") {
        usize::from_str_radix(hex, 16).ok()
    } else {
        value.parse().ok()
    }
}

impl RuntimeConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let stack_size = env::var("SCHEMAROUTE_STACK_SIZE")
            .ok()
            .and_then(|val| parse_stack_size(&val))
            .unwrap_or(DEFAULT_STACK_SIZE);
        let schema_cache_enabled = env::var("SCHEMAROUTE_SCHEMA_CACHE")
            .map(|val| !val.eq_ignore_ascii_case("off"))
            .unwrap_or(true);
        RuntimeConfig {
            stack_size,
            schema_cache_enabled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_stack_size() {
        assert_eq!(parse_stack_size("0x40000"), Some(0x40000));
        assert_eq!(parse_stack_size("16384"), Some(16384));
        assert_eq!(parse_stack_size("not a number"), None);
        assert_eq!(parse_stack_size("0xzz"), None);
    }

    #[test]
    fn test_default_covers_validation_workload() {
        // validators compile inside the route coroutine; a thin-handler
        // sized stack overflows mid-request
        assert!(DEFAULT_STACK_SIZE >= 0x40000);
    }
}
