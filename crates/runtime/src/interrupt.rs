//! HALT cancellation: an external signal sets a flag the trampoline polls
//! between levels and turns into a `ThrowLabel::Halt` at the next safe
//! point, rather than tearing down the process.
//!
//! With the `signals` feature, a SIGINT handler is installed via
//! `signal-hook`; without it (default for embedding contexts that manage
//! their own signal handling) the flag can still be set programmatically
//! via [`request_halt`], e.g. from a host-side watchdog timer.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

static HALT_FLAG: OnceLock<Arc<AtomicBool>> = OnceLock::new();

fn halt_flag() -> &'static Arc<AtomicBool> {
    HALT_FLAG.get_or_init(|| Arc::new(AtomicBool::new(false)))
}

pub fn request_halt() {
    halt_flag().store(true, Ordering::SeqCst);
}

pub fn halt_requested() -> bool {
    halt_flag().load(Ordering::SeqCst)
}

pub fn clear_halt() {
    halt_flag().store(false, Ordering::SeqCst);
}

#[cfg(all(unix, feature = "signals"))]
pub fn install_sigint_handler() -> Result<(), std::io::Error> {
    use signal_hook::consts::SIGINT;
    use signal_hook::flag;
    // The trampoline polls `halt_requested` between levels, so the signal
    // handler only has to flip the shared flag -- no background thread.
    flag::register(SIGINT, halt_flag().clone())?;
    Ok(())
}

#[cfg(not(all(unix, feature = "signals")))]
pub fn install_sigint_handler() -> Result<(), std::io::Error> {
    Ok(())
}

/// Spawn a one-shot wall-clock watchdog: after `timeout`, request a HALT.
/// A simplified, single-flag cousin of the teacher's strand-registry
/// watchdog, which scans many running strands for one stuck longer than a
/// threshold -- this trampoline is single-threaded, so there is only ever
/// one thing that can be stuck, and "stuck" just means "still running".
pub fn install_watchdog(timeout: std::time::Duration) {
    if timeout.is_zero() {
        return;
    }
    std::thread::Builder::new()
        .name("rebel-watchdog".to_string())
        .spawn(move || {
            std::thread::sleep(timeout);
            tracing::warn!(?timeout, "watchdog timeout elapsed, requesting HALT");
            request_halt();
        })
        .expect("failed to spawn watchdog thread");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn halt_flag_round_trips() {
        clear_halt();
        assert!(!halt_requested());
        request_halt();
        assert!(halt_requested());
        clear_halt();
        assert!(!halt_requested());
    }
}
