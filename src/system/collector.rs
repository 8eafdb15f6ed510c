use std::time::Duration;

use sysinfo::{
    Pid, Process, ProcessRefreshKind, ProcessesToUpdate, System, ThreadKind, UpdateKind, Users,
};

use super::process::{ProcessRecord, Reading};
use super::snapshot::{ProbeError, ProcessSource};

/// `ProcessSource` over the live OS process table.
pub struct SysinfoSource {
    sys: System,
    users: Users,
}

impl Default for SysinfoSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SysinfoSource {
    pub fn new() -> Self {
        let mut sys = System::new();
        sys.refresh_memory();
        sys.refresh_cpu_all();
        SysinfoSource {
            sys,
            users: Users::new_with_refreshed_list(),
        }
    }

    fn refresh_processes(&mut self, kind: ProcessRefreshKind) {
        self.sys
            .refresh_processes_specifics(ProcessesToUpdate::All, true, kind);
    }

    fn username(&self, process: &Process) -> Reading<String> {
        process
            .user_id()
            .and_then(|uid| self.users.get_user_by_id(uid))
            .map(|user| user.name().to_string())
            .into()
    }

    fn memory_percent(&self, memory_bytes: u64) -> Reading<f64> {
        match self.sys.total_memory() {
            0 => Reading::Denied,
            total => Reading::Value(memory_bytes as f64 / total as f64 * 100.0),
        }
    }
}

impl ProcessSource for SysinfoSource {
    fn begin_interval(&mut self) -> Vec<u32> {
        self.sys.refresh_memory();
        self.refresh_processes(
            ProcessRefreshKind::nothing()
                .with_cpu()
                .with_memory()
                .with_user(UpdateKind::OnlyIfNotSet),
        );

        // Linux lists userland threads as tasks sharing their leader's
        // memory; counting them would double every multithreaded process.
        let mut pids: Vec<u32> = self
            .sys
            .processes()
            .iter()
            .filter(|(_, p)| p.thread_kind() != Some(ThreadKind::Userland))
            .map(|(pid, _)| pid.as_u32())
            .collect();
        pids.sort_unstable();
        pids
    }

    fn end_interval(&mut self) {
        self.refresh_processes(ProcessRefreshKind::nothing().with_cpu().with_memory());
    }

    fn probe(&self, pid: u32) -> Result<ProcessRecord, ProbeError> {
        let process = self
            .sys
            .process(Pid::from_u32(pid))
            .ok_or(ProbeError::Vanished(pid))?;

        let memory_bytes = process.memory();
        Ok(ProcessRecord {
            pid,
            parent_pid: process.parent().map(|p| p.as_u32()),
            name: process.name().to_string_lossy().to_string(),
            memory_percent: self.memory_percent(memory_bytes),
            cpu_percent: Reading::Value(f64::from(process.cpu_usage())),
            username: self.username(process),
            memory_bytes: Reading::Value(memory_bytes),
        })
    }

    fn cpu_count(&self) -> usize {
        match self.sys.cpus().len() {
            0 => std::thread::available_parallelism().map_or(1, usize::from),
            n => n,
        }
    }

    fn min_interval(&self) -> Duration {
        sysinfo::MINIMUM_CPU_UPDATE_INTERVAL
    }
}
