//! SIGINT wiring for interruptible scans and debugger commands.
//!
//! Ctrl-C sets the shared cancel flag instead of killing the process, so a
//! running scan stops and still prints its partial summary. While a command
//! is forwarded to gdb, the signal is also relayed to gdb's process group so
//! `run` or `continue` can be interrupted.

use once_cell::sync::OnceCell;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::Arc;
use symload_core::CancelToken;

static SIGINT_FLAG: OnceCell<Arc<AtomicBool>> = OnceCell::new();
/// Process group receiving relayed SIGINTs; `0` means none.
static FORWARD_PGID: AtomicI32 = AtomicI32::new(0);

/// Installs the SIGINT handler once and returns a token bound to it.
pub fn install_interrupt_handler() -> CancelToken {
    let flag = SIGINT_FLAG
        .get_or_init(|| {
            let flag = Arc::new(AtomicBool::new(false));
            register_handler();
            flag
        })
        .clone();
    CancelToken::from_flag(flag)
}

/// Relays SIGINT to `process_group` until the guard is dropped.
///
/// Without a process group the guard does nothing.
pub fn forward_interrupts_to(process_group: Option<u32>) -> InterruptForward {
    let previous = process_group
        .and_then(|pid| i32::try_from(pid).ok())
        .map(|pgid| FORWARD_PGID.swap(pgid, Ordering::SeqCst));
    InterruptForward { previous }
}

/// Current relay target, if any.
#[cfg(test)]
pub fn forward_target() -> Option<i32> {
    match FORWARD_PGID.load(Ordering::SeqCst) {
        0 => None,
        pgid => Some(pgid),
    }
}

/// Scope of one relayed command; restores the previous target on drop.
pub struct InterruptForward {
    previous: Option<i32>,
}

impl Drop for InterruptForward {
    fn drop(&mut self) {
        if let Some(previous) = self.previous {
            FORWARD_PGID.store(previous, Ordering::SeqCst);
        }
    }
}

#[cfg(unix)]
fn register_handler() {
    extern "C" fn on_sigint(_signal: libc::c_int) {
        if let Some(flag) = SIGINT_FLAG.get() {
            flag.store(true, Ordering::SeqCst);
        }
        let pgid = FORWARD_PGID.load(Ordering::SeqCst);
        if pgid > 0 {
            // SAFETY: kill(2) is async-signal-safe.
            unsafe {
                libc::kill(-pgid, libc::SIGINT);
            }
        }
    }

    let handler = on_sigint as extern "C" fn(libc::c_int) as libc::sighandler_t;
    // SAFETY: the handler only touches atomics and calls kill(2).
    let previous = unsafe { libc::signal(libc::SIGINT, handler) };
    if previous == libc::SIG_ERR {
        log::warn!("event=signal_install module=cli status=error signal=SIGINT");
    }
}

// Ctrl-C keeps its default behavior elsewhere.
#[cfg(not(unix))]
fn register_handler() {}
