//! Native backend: answers platform queries from the running host.
//!
//! Core counts and memory come from `sysinfo`; identity and path queries
//! from the environment. Anything the host cannot answer degrades to the
//! crate's sentinels.

use log::debug;
use sysinfo::{CpuRefreshKind, MemoryRefreshKind, RefreshKind, System};

use crate::{
    PlatformInfo, UNKNOWN_ARCHITECTURE, UNKNOWN_HOST_NAME, UNKNOWN_LOGIN_NAME,
    UNKNOWN_OS_VERSION, UNKNOWN_PATH,
};

/// Platform backend for the running host.
pub struct SystemPlatform {
    system: System,
}

impl SystemPlatform {
    /// Snapshot CPU and memory information for the running host.
    pub fn new() -> Self {
        let system = System::new_with_specifics(
            RefreshKind::new()
                .with_cpu(CpuRefreshKind::everything())
                .with_memory(MemoryRefreshKind::everything()),
        );
        Self { system }
    }
}

impl Default for SystemPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl PlatformInfo for SystemPlatform {
    fn num_physical_cores(&self) -> u32 {
        match self.system.physical_core_count() {
            Some(count) => count as u32,
            None => {
                debug!("marionette-platform: physical core count unavailable");
                0
            }
        }
    }

    fn num_logical_cores(&self) -> u32 {
        let count = self.system.cpus().len();
        if count > 0 {
            count as u32
        } else {
            std::thread::available_parallelism()
                .map(|n| n.get() as u32)
                .unwrap_or(0)
        }
    }

    fn total_memory_bytes(&self) -> u64 {
        self.system.total_memory()
    }

    fn cpu_architecture(&self) -> String {
        match std::env::consts::ARCH {
            "x86_64" => "x86_64".into(),
            "x86" => "x86".into(),
            "aarch64" => "ARM64".into(),
            "arm" => "ARM".into(),
            "powerpc64" => "PPC64".into(),
            "riscv64" => "RISC-V64".into(),
            _ => UNKNOWN_ARCHITECTURE.into(),
        }
    }

    fn cpu_extensions(&self) -> String {
        detect_cpu_extensions().join(";")
    }

    fn home_path(&self) -> String {
        std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| UNKNOWN_PATH.into())
    }

    fn temp_path(&self) -> String {
        std::env::temp_dir().to_string_lossy().into_owned()
    }

    fn host_name(&self) -> String {
        System::host_name().unwrap_or_else(|| UNKNOWN_HOST_NAME.into())
    }

    fn login_name(&self) -> String {
        std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .unwrap_or_else(|_| UNKNOWN_LOGIN_NAME.into())
    }

    fn os_version(&self) -> String {
        System::long_os_version().unwrap_or_else(|| UNKNOWN_OS_VERSION.into())
    }

    fn name(&self) -> &str {
        "system"
    }
}

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
fn detect_cpu_extensions() -> Vec<&'static str> {
    let mut extensions = Vec::new();
    macro_rules! add_if {
        ($feature:tt, $label:expr) => {
            if std::arch::is_x86_feature_detected!($feature) {
                extensions.push($label);
            }
        };
    }
    add_if!("sse", "SSE");
    add_if!("sse2", "SSE2");
    add_if!("sse3", "SSE3");
    add_if!("ssse3", "SSSE3");
    add_if!("sse4.1", "SSE4.1");
    add_if!("sse4.2", "SSE4.2");
    add_if!("aes", "AES");
    add_if!("fma", "FMA3");
    add_if!("rdrand", "RDRAND");
    add_if!("avx", "AVX");
    add_if!("avx2", "AVX2");
    add_if!("bmi1", "BMI");
    add_if!("bmi2", "BMI2");
    add_if!("adx", "ADX");
    add_if!("sha", "SHA");
    add_if!("avx512f", "AVX-512 F");
    add_if!("avx512bw", "AVX-512 BW");
    add_if!("avx512dq", "AVX-512 DQ");
    add_if!("avx512vl", "AVX-512 VL");
    extensions
}

#[cfg(target_arch = "aarch64")]
fn detect_cpu_extensions() -> Vec<&'static str> {
    let mut extensions = Vec::new();
    if std::arch::is_aarch64_feature_detected!("neon") {
        extensions.push("NEON");
    }
    extensions
}

#[cfg(not(any(target_arch = "x86", target_arch = "x86_64", target_arch = "aarch64")))]
fn detect_cpu_extensions() -> Vec<&'static str> {
    Vec::new()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
