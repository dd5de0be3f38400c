/// Host facts recorded once per run, at spawn time.
#[derive(Clone, Debug)]
pub struct SystemProbe {
    /// Page size times physical page count.
    pub max_memory_total: u64,
    pub cpu_total: u64,
    /// Processors available per node; defaults to every configured core.
    pub max_ppn: u64,
    /// Invoking user, from the environment.
    pub uid: String,
}

pub fn probe() -> SystemProbe {
    let page_size = sysconf(libc::_SC_PAGESIZE);
    let phys_pages = sysconf(libc::_SC_PHYS_PAGES);
    let cpus = sysconf(libc::_SC_NPROCESSORS_CONF).max(1) as u64;
    SystemProbe {
        max_memory_total: page_size.saturating_mul(phys_pages) as u64,
        cpu_total: cpus,
        max_ppn: cpus,
        uid: std::env::var("USER").unwrap_or_else(|_| "unknown".to_string()),
    }
}

/// `sysconf` reports -1 for unsupported names; clamp to zero.
fn sysconf(name: libc::c_int) -> i64 {
    let value = unsafe { libc::sysconf(name) };
    if value < 0 { 0 } else { value as i64 }
}
