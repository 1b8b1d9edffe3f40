//! Host platform queries behind a single capability interface.
//!
//! Every query is stateless and infallible: on platforms where a value
//! cannot be determined it degrades to a documented sentinel (`"(Unknown
//! ...)"` strings, `0` counts) instead of erroring. OS-specific lookups are
//! confined to the [`SystemPlatform`] backend; [`NullPlatform`] answers
//! with sentinels only and suits tests and headless embedding.

pub mod args;
pub mod console;
pub mod native;

pub use args::parse_arguments;
pub use console::{error_exit, print_line, read_console_line};
pub use native::SystemPlatform;

/// Sentinel for an undeterminable CPU architecture.
pub const UNKNOWN_ARCHITECTURE: &str = "(Unknown architecture)";
/// Sentinel for an undeterminable OS version.
pub const UNKNOWN_OS_VERSION: &str = "(Unknown OS version)";
/// Sentinel for an undeterminable host name.
pub const UNKNOWN_HOST_NAME: &str = "(Unknown host name)";
/// Sentinel for an undeterminable login name.
pub const UNKNOWN_LOGIN_NAME: &str = "(Unknown login name)";
/// Sentinel for an undeterminable filesystem path.
pub const UNKNOWN_PATH: &str = "(Unknown path)";

/// The platform query contract.
///
/// Implementations must be side-effect free; cross-platform fallbacks are
/// the sentinels above and `0` for numeric queries.
pub trait PlatformInfo: Send + Sync {
    /// Physical core count. `0` when it cannot be determined.
    fn num_physical_cores(&self) -> u32;

    /// Logical core (hardware thread) count. `0` when unknown.
    fn num_logical_cores(&self) -> u32;

    /// Total installed memory in bytes. `0` when unknown.
    fn total_memory_bytes(&self) -> u64;

    /// CPU architecture name, e.g. `"x86_64"` or `"ARM64"`.
    fn cpu_architecture(&self) -> String;

    /// Supported CPU extensions joined with `";"`, e.g. `"SSE;SSE2;AVX2"`.
    /// Empty when none can be detected.
    fn cpu_extensions(&self) -> String;

    /// The current user's home directory.
    fn home_path(&self) -> String;

    /// The system temporary directory.
    fn temp_path(&self) -> String;

    /// Network host name.
    fn host_name(&self) -> String;

    /// Login name of the current user.
    fn login_name(&self) -> String;

    /// Human-readable OS name and version.
    fn os_version(&self) -> String;

    /// Backend name, for diagnostics.
    fn name(&self) -> &str;
}

/// Backend that answers every query with its sentinel.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPlatform;

impl PlatformInfo for NullPlatform {
    fn num_physical_cores(&self) -> u32 {
        0
    }

    fn num_logical_cores(&self) -> u32 {
        0
    }

    fn total_memory_bytes(&self) -> u64 {
        0
    }

    fn cpu_architecture(&self) -> String {
        UNKNOWN_ARCHITECTURE.into()
    }

    fn cpu_extensions(&self) -> String {
        String::new()
    }

    fn home_path(&self) -> String {
        UNKNOWN_PATH.into()
    }

    fn temp_path(&self) -> String {
        UNKNOWN_PATH.into()
    }

    fn host_name(&self) -> String {
        UNKNOWN_HOST_NAME.into()
    }

    fn login_name(&self) -> String {
        UNKNOWN_LOGIN_NAME.into()
    }

    fn os_version(&self) -> String {
        UNKNOWN_OS_VERSION.into()
    }

    fn name(&self) -> &str {
        "null"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
