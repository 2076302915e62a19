//! Real-time scheduling helpers (Linux SCHED_FIFO / affinity / mlockall).
//!
//! Everything here is best-effort: a failed step is logged and the run
//! continues with whatever was applied. Settings are applied once per process.

use crate::cli::RtOpts;

#[cfg(all(feature = "rt", target_os = "linux"))]
pub fn setup_rt_once(opts: RtOpts) {
    use crate::cli::RtLock;
    use std::sync::OnceLock;
    static RT_ONCE: OnceLock<()> = OnceLock::new();

    /// Capacity of cpu_set_t in CPU indices (bits).
    const MAX_CPUSET_BITS: usize = std::mem::size_of::<libc::cpu_set_t>() * 8;

    fn last_os_error() -> eyre::Report {
        eyre::eyre!(std::io::Error::last_os_error())
    }

    fn apply_mem_lock(lock: RtLock) -> eyre::Result<()> {
        let flags = match lock {
            RtLock::None => return Ok(()),
            RtLock::Current => libc::MCL_CURRENT,
            RtLock::All => libc::MCL_CURRENT | libc::MCL_FUTURE,
        };
        // SAFETY: mlockall takes plain flags and touches no Rust-managed memory.
        if unsafe { libc::mlockall(flags) } == 0 {
            return Ok(());
        }
        let err = std::io::Error::last_os_error();
        if lock == RtLock::All
            && matches!(err.raw_os_error(), Some(c) if c == libc::EPERM || c == libc::ENOMEM)
        {
            // SAFETY: as above.
            if unsafe { libc::mlockall(libc::MCL_CURRENT) } == 0 {
                tracing::warn!(error = %err, "mlockall(current|future) failed; locked current pages only");
                return Ok(());
            }
        }
        Err(eyre::eyre!(
            "mlockall failed: {err}; hint: needs CAP_IPC_LOCK (or root) and sufficient 'ulimit -l'"
        ))
    }

    fn apply_fifo_priority(prio: Option<i32>) -> eyre::Result<i32> {
        // SAFETY: querying scheduler limits has no side effects.
        let (min, max) = unsafe {
            (
                libc::sched_get_priority_min(libc::SCHED_FIFO),
                libc::sched_get_priority_max(libc::SCHED_FIFO),
            )
        };
        let (min, max) = if min < 0 || max < 0 { (1, 99) } else { (min, max) };
        let value = prio.unwrap_or(max).clamp(min, max);
        let param = libc::sched_param {
            sched_priority: value,
        };
        // SAFETY: `param` outlives the call; pid 0 means this process.
        if unsafe { libc::sched_setscheduler(0, libc::SCHED_FIFO, &param) } != 0 {
            return Err(last_os_error());
        }
        Ok(value)
    }

    fn apply_affinity(cpu: Option<usize>) -> eyre::Result<usize> {
        let target = cpu.unwrap_or(0);
        if target >= MAX_CPUSET_BITS {
            eyre::bail!("requested CPU {target} exceeds cpu_set_t capacity {MAX_CPUSET_BITS}");
        }
        // SAFETY: cpu_set_t is a plain bitmask; all-zero is a valid empty set.
        let mut allowed: libc::cpu_set_t = unsafe { std::mem::zeroed() };
        let size = std::mem::size_of::<libc::cpu_set_t>();
        // SAFETY: `allowed` is a valid, writable cpu_set_t of `size` bytes.
        if unsafe { libc::sched_getaffinity(0, size, &mut allowed) } != 0 {
            return Err(last_os_error());
        }
        // SAFETY: target < MAX_CPUSET_BITS was checked above.
        if !unsafe { libc::CPU_ISSET(target, &allowed) } {
            eyre::bail!("CPU {target} not permitted by current affinity mask");
        }
        // SAFETY: as above.
        let mut desired: libc::cpu_set_t = unsafe { std::mem::zeroed() };
        unsafe {
            libc::CPU_ZERO(&mut desired);
            libc::CPU_SET(target, &mut desired);
        }
        // SAFETY: `desired` is a valid cpu_set_t of `size` bytes.
        if unsafe { libc::sched_setaffinity(0, size, &desired) } != 0 {
            return Err(last_os_error());
        }
        Ok(target)
    }

    if !opts.enabled {
        return;
    }
    RT_ONCE.get_or_init(|| {
        let lock = opts.lock.unwrap_or(RtLock::Current);
        match apply_mem_lock(lock) {
            Ok(()) => tracing::info!(?lock, "rt: memory lock applied"),
            Err(e) => tracing::warn!(error = %e, "rt: memory lock not applied"),
        }
        match apply_fifo_priority(opts.prio) {
            Ok(prio) => tracing::info!(prio, "rt: SCHED_FIFO applied"),
            Err(e) => tracing::warn!(
                error = %e,
                "rt: SCHED_FIFO not applied; needs CAP_SYS_NICE or root"
            ),
        }
        match apply_affinity(opts.cpu) {
            Ok(cpu) => tracing::info!(cpu, "rt: pinned to CPU"),
            Err(e) => tracing::warn!(error = %e, "rt: affinity not applied"),
        }
    });
}

#[cfg(not(all(feature = "rt", target_os = "linux")))]
pub fn setup_rt_once(opts: RtOpts) {
    if opts.enabled {
        tracing::warn!(
            prio = opts.prio,
            cpu = opts.cpu,
            lock = ?opts.lock,
            "--rt requested but this build has no real-time support (Linux + `rt` feature); continuing without it"
        );
    }
}
