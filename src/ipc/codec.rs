//! Wire framing for the Discord IPC socket.
//!
//! ```text
//! +----------------------+----------------------+------------------+
//! | opcode (u32, LE)     | length (u32, LE)     | JSON payload     |
//! +----------------------+----------------------+------------------+
//! ```

use serde::Serialize;
use std::io::{self, Read};

use super::error::IpcError;

pub const HEADER_LEN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    Handshake = 0,
    Message = 1,
}

impl Opcode {
    pub fn as_u32(self) -> u32 {
        self as u32
    }
}

/// A decoded frame. The opcode is kept raw since responses are never validated.
#[derive(Debug, Clone)]
pub struct Frame {
    pub opcode: u32,
    pub payload: Vec<u8>,
}

impl Frame {
    #[allow(dead_code)]
    pub fn json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::from_slice(&self.payload)
    }
}

pub fn encode<T: Serialize + ?Sized>(opcode: Opcode, value: &T) -> Result<Vec<u8>, IpcError> {
    let payload = serde_json::to_vec(value)?;

    let mut buf = Vec::with_capacity(HEADER_LEN + payload.len());
    buf.extend_from_slice(&opcode.as_u32().to_le_bytes());
    buf.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    buf.extend_from_slice(&payload);
    Ok(buf)
}

/// Read one frame and return its payload bytes.
pub fn decode<R: Read>(reader: &mut R) -> Result<Vec<u8>, IpcError> {
    read_frame(reader).map(|frame| frame.payload)
}

pub fn read_frame<R: Read>(reader: &mut R) -> Result<Frame, IpcError> {
    let mut header = [0u8; HEADER_LEN];
    read_full(reader, &mut header)?;

    let opcode = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
    let length = u32::from_le_bytes([header[4], header[5], header[6], header[7]]) as usize;

    // The declared length comes from the peer, so nothing is allocated up front.
    let mut payload = Vec::new();
    let read = reader.take(length as u64).read_to_end(&mut payload)?;
    if read < length {
        return Err(IpcError::ShortRead {
            expected: length,
            read,
        });
    }

    Ok(Frame { opcode, payload })
}

// Like `read_exact`, but reports how far it got before the stream closed.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<(), IpcError> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => {
                return Err(IpcError::ShortRead {
                    expected: buf.len(),
                    read: filled,
                });
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(IpcError::Io(e)),
        }
    }
    Ok(())
}
