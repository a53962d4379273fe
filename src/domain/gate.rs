//! Single-flight guard for watch-triggered rebuilds
//!
//! A gate admits one run at a time. Requests that arrive while a run is in
//! flight collapse into a single pending flag, so any number of changes
//! during a run produce exactly one trailing run.

use std::sync::{Condvar, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct GateState {
    running: bool,
    pending: bool,
    closed: bool,
}

/// What happened to a rerun request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    /// The gate was idle; a run will start
    Scheduled,
    /// A run is in flight or already queued; merged into the pending run
    Coalesced,
}

#[derive(Debug, Default)]
pub struct RerunGate {
    state: Mutex<GateState>,
    wake: Condvar,
}

impl RerunGate {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, GateState> {
        // A panicking run must not wedge the watcher
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Requests a run
    pub fn request(&self) -> Request {
        let mut state = self.lock();
        let outcome = if state.running || state.pending {
            Request::Coalesced
        } else {
            Request::Scheduled
        };
        state.pending = true;
        self.wake.notify_all();
        outcome
    }

    /// Blocks until a run may start. Returns false once the gate is closed.
    pub fn wait_begin(&self) -> bool {
        let mut state = self.lock();
        loop {
            if Self::begin(&mut state) {
                return true;
            }
            if state.closed {
                return false;
            }
            state = self
                .wake
                .wait(state)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
    }

    fn begin(state: &mut GateState) -> bool {
        if state.running || !state.pending {
            return false;
        }
        state.running = true;
        state.pending = false;
        true
    }

    /// Marks the in-flight run finished. Returns true if a rerun is pending.
    pub fn finish(&self) -> bool {
        let mut state = self.lock();
        state.running = false;
        self.wake.notify_all();
        state.pending
    }

    /// Stops accepting work; wakes any waiting worker
    pub fn close(&self) {
        let mut state = self.lock();
        state.closed = true;
        self.wake.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{mpsc, Arc};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn idle_request_schedules() {
        let gate = RerunGate::new();
        assert_eq!(gate.request(), Request::Scheduled);
        assert!(gate.wait_begin());
        assert!(!gate.finish());
    }

    #[test]
    fn closed_idle_gate_does_not_begin() {
        let gate = RerunGate::new();
        gate.close();
        assert!(!gate.wait_begin());
    }

    #[test]
    fn requests_during_run_coalesce_into_one() {
        let gate = RerunGate::new();
        gate.request();
        assert!(gate.wait_begin());

        assert_eq!(gate.request(), Request::Coalesced);
        assert_eq!(gate.request(), Request::Coalesced);

        assert!(gate.finish());
        assert!(gate.wait_begin());
        assert!(!gate.finish());

        gate.close();
        assert!(!gate.wait_begin());
    }

    #[test]
    fn queued_request_before_start_coalesces() {
        let gate = RerunGate::new();
        assert_eq!(gate.request(), Request::Scheduled);
        assert_eq!(gate.request(), Request::Coalesced);
        assert!(gate.wait_begin());
        assert!(!gate.finish());
    }

    #[test]
    fn closed_gate_releases_worker() {
        let gate = Arc::new(RerunGate::new());
        let worker = {
            let gate = Arc::clone(&gate);
            thread::spawn(move || gate.wait_begin())
        };
        thread::sleep(Duration::from_millis(20));
        gate.close();
        assert!(!worker.join().unwrap());
    }

    #[test]
    fn two_rapid_changes_during_run_cause_exactly_one_rerun() {
        let gate = Arc::new(RerunGate::new());
        let runs = Arc::new(AtomicUsize::new(0));
        let (started_tx, started_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();

        let worker = {
            let gate = Arc::clone(&gate);
            let runs = Arc::clone(&runs);
            thread::spawn(move || {
                while gate.wait_begin() {
                    runs.fetch_add(1, Ordering::SeqCst);
                    started_tx.send(()).unwrap();
                    // Hold each run open until the test releases it
                    let _ = release_rx.recv();
                    gate.finish();
                }
            })
        };

        gate.request();
        started_rx.recv().unwrap();

        // Two changes land while the first run is in flight
        assert_eq!(gate.request(), Request::Coalesced);
        assert_eq!(gate.request(), Request::Coalesced);

        release_tx.send(()).unwrap();
        started_rx.recv().unwrap();
        release_tx.send(()).unwrap();

        gate.close();
        worker.join().unwrap();

        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }
}
