// ─── Host Hardware ───

use serde::Serialize;
use sysinfo::System;

#[derive(Debug, Clone, Serialize)]
pub struct HardwareInfo {
    pub total_memory_mb: u64,
    pub cpu_count: usize,
}

pub fn hardware_info() -> HardwareInfo {
    let mut sys = System::new();
    sys.refresh_memory();
    sys.refresh_cpu_usage();

    HardwareInfo {
        total_memory_mb: sys.total_memory() / (1024 * 1024),
        cpu_count: sys.cpus().len(),
    }
}

pub fn total_memory_mb() -> u64 {
    hardware_info().total_memory_mb
}
