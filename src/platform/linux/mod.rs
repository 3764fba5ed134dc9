//! Linux `CpuTopology`: no native processor-group concept, so the whole host
//! is reported as a single group and CPU pinning goes straight through
//! `sched_setaffinity`.

use super::{CpuPlacement, CpuTopology};
use nix::sched::{sched_setaffinity, CpuSet};
use nix::unistd::Pid;

pub struct LinuxTopology {
    cpu_count: usize,
}

impl LinuxTopology {
    pub fn new() -> Self {
        Self { cpu_count: num_cpus::get() }
    }
}

impl Default for LinuxTopology {
    fn default() -> Self {
        Self::new()
    }
}

impl CpuTopology for LinuxTopology {
    fn cpu_count(&self) -> usize {
        self.cpu_count
    }

    fn processor_group_count(&self) -> usize {
        1
    }

    fn group_cpu_count(&self, group_index: usize) -> usize {
        debug_assert_eq!(group_index, 0);
        self.cpu_count
    }

    fn bind_current_thread(&self, placement: CpuPlacement) -> std::io::Result<()> {
        let mut cpu_set = CpuSet::new();
        cpu_set
            .set(placement.index_in_group)
            .map_err(|e| std::io::Error::from_raw_os_error(e as i32))?;
        sched_setaffinity(Pid::from_raw(0), &cpu_set)
            .map_err(|e| std::io::Error::from_raw_os_error(e as i32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topology_reports_single_group() {
        let topology = LinuxTopology::new();
        assert_eq!(topology.processor_group_count(), 1);
        assert!(topology.cpu_count() > 0);
        assert_eq!(topology.group_cpu_count(0), topology.cpu_count());
    }

    #[test]
    fn test_bind_current_thread_to_cpu_zero() {
        let topology = LinuxTopology::new();
        let result = topology.bind_current_thread(CpuPlacement { group_index: 0, index_in_group: 0 });
        assert!(result.is_ok());
    }
}
