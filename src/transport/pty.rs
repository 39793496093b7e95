//! Pseudo-terminal transport.
//!
//! Allocates a pty pair, puts the slave side in raw mode with echo off so
//! it behaves like a serial line, and hands out async reader/writer
//! handles over the master side. Senders open [`PtyTransport::slave_path`]
//! as their serial port.

#![cfg(feature = "pty")]

use super::TransportError;
use nix::pty::openpty;
use nix::sys::termios::{self, LocalFlags, SetArg};
use nix::unistd::ttyname;
use std::fs::File;
use std::os::fd::{AsFd, OwnedFd};

pub struct PtyTransport {
    master: OwnedFd,
    // Held open so master reads block instead of failing with EIO while
    // no sender has the slave open.
    _slave: OwnedFd,
    slave_path: String,
}

impl PtyTransport {
    /// Allocates and configures the pty pair.
    pub fn open() -> Result<Self, TransportError> {
        let pty = openpty(None, None)?;

        let mut attrs = termios::tcgetattr(&pty.slave)?;
        termios::cfmakeraw(&mut attrs);
        attrs.local_flags.remove(LocalFlags::ECHO);
        termios::tcsetattr(&pty.slave, SetArg::TCSANOW, &attrs)?;

        let slave_path = ttyname(pty.slave.as_fd())?.to_string_lossy().into_owned();
        Ok(Self {
            master: pty.master,
            _slave: pty.slave,
            slave_path,
        })
    }

    /// Path senders open as their serial port.
    pub fn slave_path(&self) -> &str {
        &self.slave_path
    }

    /// Async reader/writer pair over the master side. `tokio::fs::File`
    /// routes the blocking pty I/O through the blocking thread pool.
    pub fn split(&self) -> Result<(tokio::fs::File, tokio::fs::File), TransportError> {
        let reader = File::from(self.master.try_clone()?);
        let writer = File::from(self.master.try_clone()?);
        Ok((
            tokio::fs::File::from_std(reader),
            tokio::fs::File::from_std(writer),
        ))
    }
}
