//! Memory policy (spec §5): pause workers after their current file when
//! resident-set usage exceeds 80% of a configured cap. No crate in the
//! corpus tracks RSS, so this reads `/proc/self/status` directly rather
//! than adding a system-info dependency for one counter; it degrades to
//! "never over cap" on platforms without `/proc`.

const PAUSE_THRESHOLD: f64 = 0.8;

pub struct MemoryPolicy {
    cap_bytes: u64,
}

impl MemoryPolicy {
    pub fn new(cap_mb: u64) -> Self {
        Self { cap_bytes: cap_mb * 1024 * 1024 }
    }

    /// `true` once resident memory crosses `PAUSE_THRESHOLD` of the cap;
    /// the worker pool checks this between files.
    pub fn should_pause(&self) -> bool {
        match current_rss_bytes() {
            Some(rss) => (rss as f64) >= (self.cap_bytes as f64) * PAUSE_THRESHOLD,
            None => false,
        }
    }
}

fn current_rss_bytes() -> Option<u64> {
    let status = std::fs::read_to_string("/proc/self/status").ok()?;
    for line in status.lines() {
        if let Some(rest) = line.strip_prefix("VmRSS:") {
            let kb: u64 = rest.trim().trim_end_matches(" kB").trim().parse().ok()?;
            return Some(kb * 1024);
        }
    }
    None
}
