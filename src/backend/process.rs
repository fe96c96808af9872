//! Lifecycle of tracer and helper child processes.

use log::{debug, warn};
use std::io;
use std::process::{Child, ExitStatus};
use std::thread;
use std::time::{Duration, Instant};

const WAIT_POLL: Duration = Duration::from_millis(20);

/// Owns a child process and guarantees it is gone when dropped
///
/// Termination is graceful first (SIGTERM on unix), then forced after the
/// stop timeout.
#[derive(Debug)]
pub struct ChildGuard {
    child: Option<Child>,
    name: String,
    stop_timeout: Duration,
}

impl ChildGuard {
    pub fn new(child: Child, name: impl Into<String>, stop_timeout: Duration) -> Self {
        Self {
            child: Some(child),
            name: name.into(),
            stop_timeout,
        }
    }

    pub fn id(&self) -> Option<u32> {
        self.child.as_ref().map(Child::id)
    }

    /// Exit status if the child already finished
    pub fn try_wait(&mut self) -> io::Result<Option<ExitStatus>> {
        match self.child.as_mut() {
            Some(child) => child.try_wait(),
            None => Ok(None),
        }
    }

    /// Poll for exit up to `timeout`
    pub fn wait_timeout(&mut self, timeout: Duration) -> io::Result<Option<ExitStatus>> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(status) = self.try_wait()? {
                return Ok(Some(status));
            }
            if self.child.is_none() || Instant::now() >= deadline {
                return Ok(None);
            }
            thread::sleep(WAIT_POLL);
        }
    }

    /// Stop the child: signal, wait, then kill
    ///
    /// Returns the exit status when the child exited on its own or after
    /// the signal.
    pub fn terminate(&mut self) -> io::Result<Option<ExitStatus>> {
        let Some(mut child) = self.child.take() else {
            return Ok(None);
        };

        if let Some(status) = child.try_wait()? {
            debug!("{} already exited with {}", self.name, status);
            return Ok(Some(status));
        }

        send_term(&mut child)?;

        let deadline = Instant::now() + self.stop_timeout;
        while Instant::now() < deadline {
            if let Some(status) = child.try_wait()? {
                debug!("{} stopped with {}", self.name, status);
                return Ok(Some(status));
            }
            thread::sleep(WAIT_POLL);
        }

        warn!(
            "{} did not stop within {:?}, killing it",
            self.name, self.stop_timeout
        );
        child.kill()?;
        child.wait().map(Some)
    }
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        if let Err(e) = self.terminate() {
            warn!("Failed to stop {}: {}", self.name, e);
        }
    }
}

#[cfg(unix)]
fn send_term(child: &mut Child) -> io::Result<()> {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    match kill(Pid::from_raw(child.id() as i32), Signal::SIGTERM) {
        Ok(()) | Err(nix::errno::Errno::ESRCH) => Ok(()),
        Err(e) => Err(io::Error::from(e)),
    }
}

#[cfg(not(unix))]
fn send_term(child: &mut Child) -> io::Result<()> {
    child.kill()
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::process::Command;

    #[test]
    fn test_terminate_running_child() {
        let child = Command::new("sleep").arg("30").spawn().unwrap();
        let mut guard = ChildGuard::new(child, "sleep", Duration::from_secs(2));
        let status = guard.terminate().unwrap();
        assert!(status.is_some());
        assert!(guard.id().is_none());
    }

    #[test]
    fn test_wait_timeout_on_exited_child() {
        let child = Command::new("true").spawn().unwrap();
        let mut guard = ChildGuard::new(child, "true", Duration::from_secs(1));
        let status = guard.wait_timeout(Duration::from_secs(5)).unwrap();
        assert!(status.is_some_and(|s| s.success()));
    }
}
