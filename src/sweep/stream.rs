use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, TryRecvError};

use crate::error::{AuthError, AuthResult};

use super::report::SweepReport;

/// Receiving end of the sweep report channel.
///
/// Cloning yields another handle on the same channel; each report is delivered
/// to exactly one handle.
#[derive(Debug, Clone)]
pub struct SweepStream {
    rx: Receiver<SweepReport>,
}

impl SweepStream {
    pub(crate) fn new(rx: Receiver<SweepReport>) -> Self {
        Self { rx }
    }

    /// Receive the next report (blocking).
    pub fn recv(&self) -> AuthResult<SweepReport> {
        self.rx.recv().map_err(|_| AuthError::Disconnected {
            path: "sweep_reports".to_string(),
        })
    }

    /// Receive the next report with a timeout.
    pub fn recv_timeout(&self, timeout: Duration) -> AuthResult<SweepReport> {
        self.rx.recv_timeout(timeout).map_err(|err| match err {
            RecvTimeoutError::Timeout => AuthError::Timeout {
                duration_ms: timeout.as_millis().min(u128::from(u64::MAX)) as u64,
            },
            RecvTimeoutError::Disconnected => AuthError::Disconnected {
                path: "sweep_reports".to_string(),
            },
        })
    }

    /// Take a report if one is ready.
    pub fn try_recv(&self) -> AuthResult<Option<SweepReport>> {
        match self.rx.try_recv() {
            Ok(report) => Ok(Some(report)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(AuthError::Disconnected {
                path: "sweep_reports".to_string(),
            }),
        }
    }
}
