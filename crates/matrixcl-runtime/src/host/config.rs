//! Host runtime configuration

use std::env;

const MIB: usize = 1024 * 1024;

/// Limits and behaviour of a [`super::HostRuntime`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostRuntimeConfig {
    /// Name reported in [`crate::DeviceInfo`]
    pub device_name: String,
    /// Total bytes that may be allocated at once
    pub global_mem_bytes: usize,
    /// Largest single allocation
    pub max_alloc_bytes: usize,
    /// Byte written into fresh allocations so that reading memory that was
    /// never cleared or set yields recognisable garbage
    pub uninit_byte: u8,
}

impl Default for HostRuntimeConfig {
    fn default() -> Self {
        Self {
            device_name: "matrixcl host".to_string(),
            global_mem_bytes: 1024 * MIB,
            max_alloc_bytes: 256 * MIB,
            uninit_byte: 0xA5,
        }
    }
}

impl HostRuntimeConfig {
    /// Configuration with a total memory budget of `bytes`
    ///
    /// The single-allocation limit is capped to the same budget.
    pub fn with_memory(bytes: usize) -> Self {
        let defaults = Self::default();
        Self {
            global_mem_bytes: bytes,
            max_alloc_bytes: defaults.max_alloc_bytes.min(bytes),
            ..defaults
        }
    }

    /// Build a configuration from the environment, starting from defaults.
    ///
    /// # Environment Variables
    ///
    /// - `MATRIXCL_HOST_DEVICE_NAME` - reported device name
    /// - `MATRIXCL_HOST_MEM_BYTES` - total memory budget
    /// - `MATRIXCL_HOST_MAX_ALLOC_BYTES` - single allocation limit
    /// - `MATRIXCL_HOST_UNINIT_BYTE` - garbage byte, decimal or `0x`-prefixed hex
    ///
    /// Values that fail to parse are ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(name) = env::var("MATRIXCL_HOST_DEVICE_NAME") {
            if !name.trim().is_empty() {
                config.device_name = name.trim().to_string();
            }
        }

        if let Some(bytes) = env_usize("MATRIXCL_HOST_MEM_BYTES") {
            config.global_mem_bytes = bytes;
            config.max_alloc_bytes = config.max_alloc_bytes.min(bytes);
        }

        if let Some(bytes) = env_usize("MATRIXCL_HOST_MAX_ALLOC_BYTES") {
            config.max_alloc_bytes = bytes;
        }

        if let Ok(value) = env::var("MATRIXCL_HOST_UNINIT_BYTE") {
            if let Some(byte) = parse_byte(&value) {
                config.uninit_byte = byte;
            }
        }

        config
    }
}

fn env_usize(key: &str) -> Option<usize> {
    env::var(key).ok().and_then(|value| value.trim().parse::<usize>().ok())
}

fn parse_byte(value: &str) -> Option<u8> {
    let value = value.trim();
    match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16).ok(),
        None => value.parse::<u8>().ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const ENV_KEYS: &[&str] = &[
        "MATRIXCL_HOST_DEVICE_NAME",
        "MATRIXCL_HOST_MEM_BYTES",
        "MATRIXCL_HOST_MAX_ALLOC_BYTES",
        "MATRIXCL_HOST_UNINIT_BYTE",
    ];

    fn reset_env() {
        for key in ENV_KEYS {
            env::remove_var(key);
        }
    }

    #[test]
    fn with_memory_caps_single_allocation() {
        let config = HostRuntimeConfig::with_memory(4096);
        assert_eq!(config.global_mem_bytes, 4096);
        assert_eq!(config.max_alloc_bytes, 4096);
    }

    #[test]
    #[serial]
    fn from_env_without_variables_is_default() {
        reset_env();
        assert_eq!(HostRuntimeConfig::from_env(), HostRuntimeConfig::default());
    }

    #[test]
    #[serial]
    fn from_env_reads_limits() {
        reset_env();
        env::set_var("MATRIXCL_HOST_DEVICE_NAME", "  sim0 ");
        env::set_var("MATRIXCL_HOST_MEM_BYTES", "65536");
        env::set_var("MATRIXCL_HOST_MAX_ALLOC_BYTES", "1024");
        env::set_var("MATRIXCL_HOST_UNINIT_BYTE", "0xCD");

        let config = HostRuntimeConfig::from_env();
        assert_eq!(config.device_name, "sim0");
        assert_eq!(config.global_mem_bytes, 65536);
        assert_eq!(config.max_alloc_bytes, 1024);
        assert_eq!(config.uninit_byte, 0xCD);
        reset_env();
    }

    #[test]
    #[serial]
    fn from_env_ignores_garbage() {
        reset_env();
        env::set_var("MATRIXCL_HOST_MEM_BYTES", "lots");
        env::set_var("MATRIXCL_HOST_UNINIT_BYTE", "300");
        assert_eq!(HostRuntimeConfig::from_env(), HostRuntimeConfig::default());
        reset_env();
    }

    #[test]
    fn parses_decimal_and_hex_bytes() {
        assert_eq!(parse_byte("17"), Some(17));
        assert_eq!(parse_byte("0xff"), Some(255));
        assert_eq!(parse_byte("0x1ff"), None);
    }
}
