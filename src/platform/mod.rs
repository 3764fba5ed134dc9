//! Processor-topology seam: the one piece of the dispatch engine that differs
//! by host OS. Everything else (queue, slot, dispatcher, worker loop) is
//! platform-agnostic and talks to the host only through the `CpuTopology` trait.

#[cfg(target_os = "linux")]
pub mod linux;
#[cfg(target_os = "macos")]
pub mod macos;
#[cfg(windows)]
pub mod windows;
#[cfg(not(any(target_os = "linux", target_os = "macos", windows)))]
pub mod generic;

/// One logical CPU's placement: which processor group it belongs to, and its
/// index within that group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuPlacement {
    pub group_index: usize,
    pub index_in_group: usize,
}

/// Seam for everything the pool needs to know about host CPU topology:
/// how many logical CPUs exist, how they are partitioned into processor
/// groups (a concept that matters once a host has more logical CPUs than a
/// single group can address), and how to bind the calling thread to one.
pub trait CpuTopology: Send + Sync {
    /// Total logical CPU count across all groups.
    fn cpu_count(&self) -> usize;

    /// Number of active processor groups. 1 on every host without a native
    /// grouping concept.
    fn processor_group_count(&self) -> usize;

    /// Logical CPU count of the given group.
    fn group_cpu_count(&self, group_index: usize) -> usize;

    /// Bind the calling thread to the given CPU placement. Best-effort: a
    /// failure here should be logged, not treated as fatal to pool startup.
    fn bind_current_thread(&self, placement: CpuPlacement) -> std::io::Result<()>;
}

/// Return the default `CpuTopology` implementation for the current host.
pub fn default_topology() -> Box<dyn CpuTopology> {
    #[cfg(target_os = "linux")]
    {
        Box::new(linux::LinuxTopology::new())
    }
    #[cfg(target_os = "macos")]
    {
        Box::new(macos::MacosTopology::new())
    }
    #[cfg(windows)]
    {
        Box::new(windows::WindowsTopology::new())
    }
    #[cfg(not(any(target_os = "linux", target_os = "macos", windows)))]
    {
        Box::new(generic::GenericTopology::new())
    }
}

/// Distribute `thread_count` workers across `group_cpu_counts` (one entry per
/// processor group, its logical CPU count) proportionally, returning one
/// `CpuPlacement` per worker in spawn order.
///
/// This is the corrected cumulative-CPU-scan: a worker at overall index `i`
/// (0-based) is placed in the first group `g` whose cumulative CPU count,
/// summed over groups `0..=g`, is `>= i + 1` — i.e. the group that contains
/// the `(i+1)`-th CPU when every group's CPUs are laid end to end. Comparing
/// against `i + 1` rather than `i` is what keeps the last CPU of each group
/// assigned to that group instead of spilling into the next one.
pub fn distribute_workers(thread_count: usize, group_cpu_counts: &[usize]) -> Vec<CpuPlacement> {
    let mut placements = Vec::with_capacity(thread_count);
    let mut cumulative = 0usize;
    for i in 0..thread_count {
        let mut group_index = 0;
        let mut running = 0usize;
        for (g, &count) in group_cpu_counts.iter().enumerate() {
            running += count;
            if running >= i + 1 {
                group_index = g;
                break;
            }
            group_index = g;
        }
        let group_start: usize = group_cpu_counts[..group_index].iter().sum();
        let index_in_group = i - group_start;
        placements.push(CpuPlacement { group_index, index_in_group });
        cumulative = running;
    }
    let _ = cumulative;
    placements
}
