//! The machine a benchmark ran on.

use serde::Serialize;

/// Host description attached to a report so results can be compared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SystemInfo {
    pub os: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kernel: Option<String>,
    pub arch: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu_brand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu_cores: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ram_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
}

impl Default for SystemInfo {
    fn default() -> Self {
        Self {
            os: std::env::consts::OS.to_owned(),
            os_version: None,
            kernel: None,
            arch: std::env::consts::ARCH.to_owned(),
            cpu_brand: None,
            cpu_cores: None,
            ram_bytes: None,
            hostname: None,
        }
    }
}

impl SystemInfo {
    /// Blocking: reads CPU and memory information of the host.
    pub fn detect() -> Self {
        use sysinfo::System;

        let sys = System::new_all();
        let cpu_brand = sys
            .cpus()
            .first()
            .map(|c| c.brand().trim().to_owned())
            .filter(|s| !s.is_empty());

        Self {
            os: System::name().unwrap_or_else(|| std::env::consts::OS.to_owned()),
            os_version: System::os_version(),
            kernel: System::kernel_version(),
            arch: std::env::consts::ARCH.to_owned(),
            cpu_brand,
            cpu_cores: sys.physical_core_count(),
            ram_bytes: Some(sys.total_memory()).filter(|&n| n > 0),
            hostname: System::host_name(),
        }
    }

    /// Human readable `(label, value)` pairs, unknown entries left out.
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        let os = match &self.os_version {
            Some(v) => format!("{} {}", self.os, v),
            None => self.os.clone(),
        };
        let optional = [
            ("Kernel", self.kernel.clone()),
            ("CPU", self.cpu_brand.clone()),
            ("Cores", self.cpu_cores.map(|n| n.to_string())),
            ("Memory", self.ram_bytes.map(format_bytes)),
            ("Hostname", self.hostname.clone()),
        ];

        let mut v = vec![("OS", os), ("Architecture", self.arch.clone())];
        v.extend(optional.into_iter().filter_map(|(k, v)| Some((k, v?))));
        v
    }
}

fn format_bytes(n: u64) -> String {
    const GIB: f64 = (1u64 << 30) as f64;
    format!("{:.1} GiB", n as f64 / GIB)
}
