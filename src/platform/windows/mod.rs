//! Windows `CpuTopology`: hosts with more than 64 logical processors are
//! partitioned into processor groups by the kernel, and a thread must be
//! bound to a specific group before `SetThreadAffinityMask` is meaningful
//! within it. This is the only platform where `processor_group_count()` can
//! return more than 1.

use super::{CpuPlacement, CpuTopology};
use windows_sys::Win32::Foundation::HANDLE;
use windows_sys::Win32::System::SystemInformation::GetActiveProcessorGroupCount;
use windows_sys::Win32::System::Threading::{
    GetActiveProcessorCount, GetCurrentThread, SetThreadGroupAffinity, GROUP_AFFINITY,
};

pub struct WindowsTopology {
    group_count: usize,
    group_cpu_counts: Vec<usize>,
}

impl WindowsTopology {
    pub fn new() -> Self {
        let group_count = unsafe { GetActiveProcessorGroupCount() as usize }.max(1);
        let group_cpu_counts = (0..group_count)
            .map(|g| unsafe { GetActiveProcessorCount(g as u16) as usize })
            .collect();
        Self { group_count, group_cpu_counts }
    }
}

impl Default for WindowsTopology {
    fn default() -> Self {
        Self::new()
    }
}

impl CpuTopology for WindowsTopology {
    fn cpu_count(&self) -> usize {
        self.group_cpu_counts.iter().sum()
    }

    fn processor_group_count(&self) -> usize {
        self.group_count
    }

    fn group_cpu_count(&self, group_index: usize) -> usize {
        self.group_cpu_counts[group_index]
    }

    fn bind_current_thread(&self, placement: CpuPlacement) -> std::io::Result<()> {
        unsafe {
            let mut affinity: GROUP_AFFINITY = std::mem::zeroed();
            affinity.Group = placement.group_index as u16;
            affinity.Mask = 1usize << placement.index_in_group;
            let handle: HANDLE = GetCurrentThread();
            let result = SetThreadGroupAffinity(handle, &affinity, std::ptr::null_mut());
            if result != 0 {
                Ok(())
            } else {
                Err(std::io::Error::last_os_error())
            }
        }
    }
}
