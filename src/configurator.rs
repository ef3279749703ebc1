//! Device configuration through the line-discipline utility.
//!
//! Wraps the three `stty` invocations the session needs: a validity probe,
//! disabling local echo, and setting the baud rate. All process handling
//! goes through the injected [`CommandRunner`], so none of this requires a
//! real device under test.

use crate::error::{SessionError, SessionResult};
use crate::runner::CommandRunner;
use tracing::{debug, warn};

/// Name of the line-discipline utility.
const STTY: &str = "stty";

/// Thin strategy object over a [`CommandRunner`].
#[derive(Debug)]
pub struct DeviceConfigurator<'a> {
    runner: &'a dyn CommandRunner,
}

impl<'a> DeviceConfigurator<'a> {
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self { runner }
    }

    /// Probe `device` for validity.
    ///
    /// A nonzero exit from `stty -F <device>` means the path is not a
    /// configurable terminal device.
    pub fn probe(&self, device: &str) -> SessionResult<()> {
        let out = self
            .runner
            .run(&[STTY.into(), "-F".into(), device.into()])
            .map_err(SessionError::CommandFailed)?;

        if out.success() {
            debug!(device, "device probe succeeded");
            Ok(())
        } else {
            warn!(device, status = out.status, "device probe failed");
            Err(SessionError::InvalidDevice(device.to_string()))
        }
    }

    /// Disable local echo on `device`.
    ///
    /// The probe has already validated the path; a failure here is reported
    /// the same way, since the device evidently cannot be configured.
    pub fn disable_echo(&self, device: &str) -> SessionResult<()> {
        let out = self
            .runner
            .run(&[STTY.into(), "-F".into(), device.into(), "-echo".into()])
            .map_err(SessionError::CommandFailed)?;

        if out.success() {
            debug!(device, "local echo disabled");
            Ok(())
        } else {
            warn!(device, status = out.status, "disabling echo failed");
            Err(SessionError::InvalidDevice(device.to_string()))
        }
    }

    /// Set the baud rate on `device`.
    ///
    /// The caller has already validated `rate` against the whitelist. A
    /// nonzero exit carries the captured process output back to the caller.
    pub fn set_baud(&self, device: &str, rate: u32) -> SessionResult<()> {
        let out = self
            .runner
            .run(&[STTY.into(), "-F".into(), device.into(), rate.to_string()])
            .map_err(SessionError::CommandFailed)?;

        if out.success() {
            debug!(device, rate, "baud rate set");
            Ok(())
        } else {
            warn!(device, rate, status = out.status, "setting baud rate failed");
            Err(SessionError::BaudRateSet {
                stdout: out.stdout,
                stderr: out.stderr,
            })
        }
    }
}
