//! Periodic scanning until interrupted.
//!
//! SIGINT and SIGTERM only set a flag; the loop checks it between ticks and
//! while sleeping, so a tick in progress always finishes its save.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use continuum_core::{DocumentStore, MemoryDocument, ScanState, Tracker};

use crate::report;

const SLEEP_SLICE: Duration = Duration::from_millis(250);

static SHUTDOWN: AtomicBool = AtomicBool::new(false);

extern "C" fn request_shutdown(_signal: libc::c_int) {
    SHUTDOWN.store(true, Ordering::SeqCst);
}

fn install_signal_handlers() {
    #[cfg(unix)]
    {
        let handler = request_shutdown as extern "C" fn(libc::c_int);
        // SAFETY: the handler only stores to an atomic, which is
        // async-signal-safe.
        #[allow(unsafe_code)]
        unsafe {
            libc::signal(libc::SIGINT, handler as libc::sighandler_t);
            libc::signal(libc::SIGTERM, handler as libc::sighandler_t);
        }
    }
}

fn shutdown_requested() -> bool {
    SHUTDOWN.load(Ordering::SeqCst)
}

pub fn run<S, M>(tracker: &Tracker<S, M>, interval: Duration)
where
    S: DocumentStore<ScanState>,
    M: DocumentStore<MemoryDocument>,
{
    install_signal_handlers();
    println!(
        "Starting Continuum auto-tracker (scan every {}s)",
        interval.as_secs()
    );
    println!("   Press Ctrl+C to stop");
    tracing::info!(interval_secs = interval.as_secs(), root = %tracker.scanner().root().display(), "Watch started");

    let mut ticks: u64 = 0;
    while !shutdown_requested() {
        match tracker.tick() {
            Ok(tick) => {
                ticks += 1;
                report::print_tick(&tick);
            }
            Err(err) => {
                tracing::error!(error = %err, "Scan tick failed");
            }
        }
        if !sleep_interruptibly(interval, shutdown_requested) {
            break;
        }
    }

    println!("\nAuto-tracker stopped");
    tracing::info!(ticks, "Watch stopped");
}

/// Sleeps for `total` in short slices. Returns `false` if `stop` fired first.
fn sleep_interruptibly(total: Duration, stop: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + total;
    loop {
        if stop() {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        thread::sleep(SLEEP_SLICE.min(deadline - now));
    }
}
