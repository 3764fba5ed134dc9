//! macOS `CpuTopology`. Darwin has no `sched_setaffinity` equivalent exposed
//! to user space in a form worth depending on here, so binding is best-effort
//! (a no-op) and the host is always reported as a single processor group.

use super::{CpuPlacement, CpuTopology};

pub struct MacosTopology {
    cpu_count: usize,
}

impl MacosTopology {
    pub fn new() -> Self {
        Self { cpu_count: num_cpus::get() }
    }
}

impl Default for MacosTopology {
    fn default() -> Self {
        Self::new()
    }
}

impl CpuTopology for MacosTopology {
    fn cpu_count(&self) -> usize {
        self.cpu_count
    }

    fn processor_group_count(&self) -> usize {
        1
    }

    fn group_cpu_count(&self, _group_index: usize) -> usize {
        self.cpu_count
    }

    fn bind_current_thread(&self, _placement: CpuPlacement) -> std::io::Result<()> {
        Ok(())
    }
}
