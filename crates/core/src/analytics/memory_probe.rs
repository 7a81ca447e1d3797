use std::sync::Mutex;

use sysinfo::{Pid, System};

/// Samples the memory footprint of the running process for the benchmark.
pub trait MemoryProbe: Send + Sync {
    /// Resident set size in bytes, or `None` when the platform cannot report it.
    fn resident_bytes(&self) -> Option<u64>;
}

/// Reads the current process's resident memory through `sysinfo`.
///
/// The figure is process-wide: when providers are benchmarked in parallel their
/// allocations overlap in the samples.
pub struct ProcessMemoryProbe {
    pid: Option<Pid>,
    system: Mutex<System>,
}

impl ProcessMemoryProbe {
    pub fn new() -> Self {
        let pid = sysinfo::get_current_pid().ok();
        if pid.is_none() {
            log::warn!("current process id unavailable, memory growth will read as zero");
        }
        Self {
            pid,
            system: Mutex::new(System::new()),
        }
    }
}

impl Default for ProcessMemoryProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryProbe for ProcessMemoryProbe {
    fn resident_bytes(&self) -> Option<u64> {
        let pid = self.pid?;
        let mut system = self.system.lock().ok()?;
        if !system.refresh_process(pid) {
            return None;
        }
        system.process(pid).map(|p| p.memory())
    }
}

/// Probe that never reports, so every run records zero growth.
pub struct NullMemoryProbe;

impl MemoryProbe for NullMemoryProbe {
    fn resident_bytes(&self) -> Option<u64> {
        None
    }
}
