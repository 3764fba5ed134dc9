//! Fallback `CpuTopology` for hosts without a native affinity API. Binding is
//! a no-op; the pool still functions, just without pinning.

use super::{CpuPlacement, CpuTopology};

pub struct GenericTopology {
    cpu_count: usize,
}

impl GenericTopology {
    pub fn new() -> Self {
        Self { cpu_count: num_cpus::get() }
    }
}

impl Default for GenericTopology {
    fn default() -> Self {
        Self::new()
    }
}

impl CpuTopology for GenericTopology {
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
