//! A single Discord IPC connection with handshake, liveness probing and
//! transparent reconnects.
//!
//! The session is synchronous and expects one owner. Every public operation
//! does at most one round-trip on the socket.
//!
//! # Liveness probe
//!
//! Before each operation the session polls a one-byte read in non-blocking
//! mode for `probe_timeout`. Silence means the peer is alive. EOF, an error, or
//! a byte that actually arrived means the connection is treated as dead and is
//! rebuilt. A byte read by the probe is dropped, so a late response that
//! shows up between operations is lost and forces a reconnect. This is a
//! known limitation of the probe, not something callers need to handle.

use interprocess::local_socket::prelude::*;
use interprocess::local_socket::{GenericFilePath, Stream};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::codec::{self, Opcode};
use super::error::IpcError;
use super::locator::Locator;
use super::{Command, Handshake};
use crate::models::Status;

pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_millis(50);

const PROBE_POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Everything the session needs from its environment, fixed at construction.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub client_id: String,
    pub pid: u32,
    pub probe_timeout: Duration,
    pub locator: Locator,
}

impl SessionConfig {
    pub fn new(client_id: impl Into<String>, locator: Locator) -> Self {
        Self {
            client_id: client_id.into(),
            pid: std::process::id(),
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            locator,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unconnected,
    Connecting,
    Handshaking,
    Ready,
    Failed,
}

struct Connection {
    path: PathBuf,
    stream: Stream,
}

impl Connection {
    fn dial(path: PathBuf) -> Result<Self, IpcError> {
        match open_stream(&path) {
            Ok(stream) => Ok(Self { path, stream }),
            Err(source) => Err(IpcError::ConnectFailed { path, source }),
        }
    }

    fn send(&mut self, frame: &[u8]) -> Result<(), IpcError> {
        self.stream.write_all(frame)?;
        self.stream.flush()?;
        Ok(())
    }

    fn receive(&mut self) -> Result<(), IpcError> {
        let frame = codec::read_frame(&mut self.stream)?;
        debug!(
            "Received frame (opcode {}, {} bytes)",
            frame.opcode,
            frame.payload.len()
        );
        Ok(())
    }

    fn handshake(&mut self, client_id: &str) -> Result<(), IpcError> {
        let frame = codec::encode(Opcode::Handshake, &Handshake::new(client_id))?;
        self.send(&frame)?;
        let response = codec::decode(&mut self.stream)?;
        debug!("Handshake response: {} bytes", response.len());
        Ok(())
    }

    fn probe(&mut self, timeout: Duration) -> Liveness {
        if self.stream.set_nonblocking(true).is_err() {
            return Liveness::Dead("could not switch to non-blocking mode");
        }

        let deadline = Instant::now() + timeout;
        let mut byte = [0u8; 1];
        let outcome = loop {
            match self.stream.read(&mut byte) {
                Ok(0) => break Liveness::Dead("closed by peer"),
                Ok(_) => break Liveness::Dead("unexpected data on idle connection"),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    if Instant::now() >= deadline {
                        break Liveness::Alive;
                    }
                    thread::sleep(PROBE_POLL_INTERVAL);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(_) => break Liveness::Dead("read error"),
            }
        };

        if outcome == Liveness::Alive && self.stream.set_nonblocking(false).is_err() {
            return Liveness::Dead("could not restore blocking mode");
        }
        outcome
    }
}

fn open_stream(path: &Path) -> io::Result<Stream> {
    let name = path.as_os_str().to_fs_name::<GenericFilePath>()?;
    Stream::connect(name)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Liveness {
    Alive,
    Dead(&'static str),
}

pub struct Session {
    config: SessionConfig,
    conn: Option<Connection>,
    state: SessionState,
    activity_present: bool,
}

impl Session {
    /// Locate the socket, connect and complete the handshake.
    pub fn open(config: SessionConfig) -> Result<Self, IpcError> {
        let mut session = Self {
            config,
            conn: None,
            state: SessionState::Unconnected,
            // Assume a presence may be left over from a previous run so the
            // first clear always goes out.
            activity_present: true,
        };
        session.establish()?;

        if let Some(path) = session.endpoint() {
            info!("Connected to Discord at {}", path.display());
        }
        Ok(session)
    }

    #[allow(dead_code)]
    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn endpoint(&self) -> Option<&Path> {
        self.conn.as_ref().map(|c| c.path.as_path())
    }

    #[allow(dead_code)]
    pub fn activity_present(&self) -> bool {
        self.activity_present
    }

    /// Probe the connection and rebuild it if it looks dead.
    pub fn ensure_live(&mut self) -> Result<(), IpcError> {
        let timeout = self.config.probe_timeout;
        let liveness = match self.conn.as_mut() {
            Some(conn) => conn.probe(timeout),
            None => Liveness::Dead("not connected"),
        };

        let reason = match liveness {
            Liveness::Alive => return Ok(()),
            Liveness::Dead(reason) => reason,
        };

        info!("Discord connection lost ({reason}), reconnecting...");
        self.close();
        self.establish().map_err(IpcError::reconnect)?;
        info!("Reconnected to Discord");
        Ok(())
    }

    /// Show `status` in Discord.
    ///
    /// A failed liveness check is logged and the send is still attempted.
    pub fn set_status(&mut self, status: &Status) -> Result<(), IpcError> {
        if let Err(e) = self.ensure_live() {
            warn!("Liveness check failed, sending anyway: {e}");
        }

        self.activity_present = true;

        let command = Command::set_activity(self.config.pid, Some(status));
        let frame = codec::encode(Opcode::Message, &command).map_err(IpcError::send)?;

        let conn = self.conn.as_mut().ok_or_else(|| IpcError::send(not_connected()))?;
        conn.send(&frame).map_err(IpcError::send)?;
        conn.receive().map_err(IpcError::receive)?;

        debug!("Activity set: {} / {}", status.details, status.state);
        Ok(())
    }

    /// Remove the presence. Does nothing if none is believed to be shown.
    ///
    /// Unlike `set_status`, a failed liveness check aborts the call. The
    /// response to the clear is not read.
    pub fn clear_status(&mut self) -> Result<(), IpcError> {
        self.ensure_live()?;

        if !self.activity_present {
            return Ok(());
        }
        self.activity_present = false;

        let command = Command::set_activity(self.config.pid, None);
        let frame = codec::encode(Opcode::Message, &command).map_err(IpcError::send)?;

        let conn = self.conn.as_mut().ok_or_else(|| IpcError::send(not_connected()))?;
        conn.send(&frame).map_err(IpcError::send)?;

        debug!("Activity cleared");
        Ok(())
    }

    pub fn close(&mut self) {
        if let Some(conn) = self.conn.take() {
            debug!("Closing connection to {}", conn.path.display());
        }
        self.state = SessionState::Unconnected;
    }

    // Replaces the connection with a freshly dialed and handshaken one.
    fn establish(&mut self) -> Result<(), IpcError> {
        match self.connect() {
            Ok(conn) => {
                self.conn = Some(conn);
                self.state = SessionState::Ready;
                Ok(())
            }
            Err(e) => {
                self.state = SessionState::Failed;
                Err(e)
            }
        }
    }

    fn connect(&mut self) -> Result<Connection, IpcError> {
        self.state = SessionState::Connecting;
        let locator = &self.config.locator;
        let path = locator
            .locate()
            .ok_or_else(|| IpcError::EndpointNotFound(locator.base_dir().to_path_buf()))?;
        let mut conn = Connection::dial(path)?;

        self.state = SessionState::Handshaking;
        conn.handshake(&self.config.client_id).map_err(IpcError::handshake)?;
        Ok(conn)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close();
    }
}

fn not_connected() -> IpcError {
    IpcError::Io(io::Error::new(
        io::ErrorKind::NotConnected,
        "no open Discord connection",
    ))
}
