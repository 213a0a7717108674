//! Readiness gate: frames are only sent once every overlay says it can
//! receive them, or once the timeout passes.

use log::{debug, warn};
use std::collections::BTreeSet;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender, TrySendError};
use std::time::{Duration, Instant};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReadyOutcome {
    AllReady,
    TimedOut { ready: Vec<usize>, missing: Vec<usize> },
}

/// Cloneable handle given to each overlay to report readiness.
#[derive(Clone, Debug)]
pub struct ReadySignal {
    tx: SyncSender<usize>,
}

impl ReadySignal {
    pub fn signal(&self, display_index: usize) {
        match self.tx.try_send(display_index) {
            Ok(()) => debug!("Display {} ready", display_index),
            Err(TrySendError::Full(_)) => {
                warn!("Readiness channel full, dropping signal from display {}", display_index)
            }
            // Gate already resolved; a late signal is harmless.
            Err(TrySendError::Disconnected(_)) => {}
        }
    }
}

pub struct ReadinessGate {
    rx: Receiver<usize>,
    expected: BTreeSet<usize>,
    ready: BTreeSet<usize>,
    deadline: Instant,
}

impl ReadinessGate {
    pub fn new(
        expected: impl IntoIterator<Item = usize>,
        timeout: Duration,
    ) -> (Self, ReadySignal) {
        let expected: BTreeSet<usize> = expected.into_iter().collect();
        // Room for one duplicate per display before anything is dropped.
        let (tx, rx) = mpsc::sync_channel(expected.len().max(1) * 2);

        let gate = Self {
            rx,
            expected,
            ready: BTreeSet::new(),
            deadline: Instant::now() + timeout,
        };
        (gate, ReadySignal { tx })
    }

    /// Narrows the expected set, e.g. when some overlay windows failed to open.
    pub fn retain(&mut self, keep: impl Fn(usize) -> bool) {
        self.expected.retain(|i| keep(*i));
        self.ready.retain(|i| keep(*i));
    }

    pub fn is_complete(&self) -> bool {
        self.ready.len() == self.expected.len()
    }

    /// Non-blocking check, for callers that cannot block such as a UI main loop.
    pub fn poll(&mut self) -> Option<ReadyOutcome> {
        while let Ok(index) = self.rx.try_recv() {
            self.record(index);
        }

        if self.is_complete() {
            Some(ReadyOutcome::AllReady)
        } else if Instant::now() >= self.deadline {
            Some(self.timed_out())
        } else {
            None
        }
    }

    /// Blocks until every expected display reported or the deadline passes.
    pub fn wait(&mut self) -> ReadyOutcome {
        loop {
            if self.is_complete() {
                return ReadyOutcome::AllReady;
            }

            let now = Instant::now();
            if now >= self.deadline {
                return self.timed_out();
            }

            match self.rx.recv_timeout(self.deadline - now) {
                Ok(index) => self.record(index),
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                    return self.timed_out()
                }
            }
        }
    }

    fn record(&mut self, index: usize) {
        if self.expected.contains(&index) {
            self.ready.insert(index);
        } else {
            debug!("Ignoring readiness from unexpected display {}", index);
        }
    }

    fn timed_out(&self) -> ReadyOutcome {
        ReadyOutcome::TimedOut {
            ready: self.ready.iter().copied().collect(),
            missing: self.expected.difference(&self.ready).copied().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_all_ready_from_other_threads() {
        let (mut gate, signal) = ReadinessGate::new([0, 1, 2], Duration::from_secs(5));

        let handles: Vec<_> = (0..3)
            .map(|i| {
                let signal = signal.clone();
                thread::spawn(move || signal.signal(i))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(gate.wait(), ReadyOutcome::AllReady);
    }

    #[test]
    fn test_duplicates_do_not_count_twice() {
        let (mut gate, signal) = ReadinessGate::new([0, 1], Duration::from_millis(50));
        signal.signal(0);
        signal.signal(0);
        signal.signal(7);

        assert_eq!(
            gate.wait(),
            ReadyOutcome::TimedOut {
                ready: vec![0],
                missing: vec![1]
            }
        );
    }

    #[test]
    fn test_poll_is_non_blocking() {
        let (mut gate, signal) = ReadinessGate::new([0, 1], Duration::from_secs(60));
        assert_eq!(gate.poll(), None);

        signal.signal(1);
        assert_eq!(gate.poll(), None);
        signal.signal(0);
        assert_eq!(gate.poll(), Some(ReadyOutcome::AllReady));
    }

    #[test]
    fn test_retain_narrows_expected() {
        let (mut gate, signal) = ReadinessGate::new([0, 1, 2], Duration::from_secs(60));
        gate.retain(|i| i != 2);
        signal.signal(0);
        signal.signal(1);
        assert_eq!(gate.poll(), Some(ReadyOutcome::AllReady));
    }

    #[test]
    fn test_empty_gate_is_complete() {
        let (mut gate, _signal) = ReadinessGate::new(Vec::new(), Duration::from_secs(60));
        assert_eq!(gate.wait(), ReadyOutcome::AllReady);
    }
}
