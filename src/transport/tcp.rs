use std::{
    cell::RefCell,
    io::{Read, Write},
    net::{TcpStream, ToSocketAddrs},
};

use log::{debug, warn};
use serde_json::Value;

use crate::{
    BulkError,
    core::{Document, command::CommandRunner},
};

/// Largest frame body accepted in either direction.
pub const MAX_FRAME_BYTES: usize = 16 * 1024 * 1024;

const HEADER_BYTES: usize = 4;

fn checked_len(len: usize) -> Result<u32, BulkError> {
    u32::try_from(len)
        .ok()
        .filter(|_| len <= MAX_FRAME_BYTES)
        .ok_or_else(|| {
            BulkError::transport(format!(
                "frame of {len} bytes exceeds the {MAX_FRAME_BYTES} bytes limit"
            ))
        })
}

/// Prefixes `body` with its length as a little-endian `u32`.
pub fn encode_frame(body: &[u8]) -> Result<Vec<u8>, BulkError> {
    let len = checked_len(body.len())?;
    let mut frame = Vec::with_capacity(HEADER_BYTES + body.len());
    frame.extend_from_slice(&len.to_le_bytes());
    frame.extend_from_slice(body);
    Ok(frame)
}

/// Reads one frame and returns its body.
///
/// The announced length is checked before the body is allocated.
pub fn read_frame(reader: &mut impl Read) -> Result<Vec<u8>, BulkError> {
    let mut header = [0u8; HEADER_BYTES];
    reader.read_exact(&mut header)?;
    let len = u32::from_le_bytes(header) as usize;
    checked_len(len)?;

    let mut body = vec![0u8; len];
    reader.read_exact(&mut body)?;
    Ok(body)
}

/// A [`CommandRunner`] sending each command as one JSON frame and reading one reply frame.
///
/// The target database travels in the `$db` field of the request. A failure
/// in the middle of an exchange leaves the stream out of step with the
/// server, so the runner drops it and every later command fails without I/O.
pub struct TcpRunner<S: Read + Write = TcpStream> {
    stream: RefCell<Option<S>>,
}

impl TcpRunner<TcpStream> {
    pub fn connect(addr: impl ToSocketAddrs) -> Result<Self, BulkError> {
        let stream = TcpStream::connect(addr)?;
        stream.set_nodelay(true)?;
        Ok(Self::from_stream(stream))
    }
}

impl<S: Read + Write> TcpRunner<S> {
    pub fn from_stream(stream: S) -> Self {
        Self {
            stream: RefCell::new(Some(stream)),
        }
    }

    /// `true` once an exchange failed and the stream was dropped.
    pub fn is_broken(&self) -> bool {
        self.stream.borrow().is_none()
    }
}

fn exchange<S: Read + Write>(stream: &mut S, frame: &[u8]) -> Result<Vec<u8>, BulkError> {
    stream.write_all(frame)?;
    stream.flush()?;
    read_frame(stream)
}

impl<S: Read + Write> CommandRunner for TcpRunner<S> {
    fn run_command(&self, db: &str, command: &Document) -> Result<Document, BulkError> {
        let mut request = command.clone();
        request.insert("$db".to_string(), Value::String(db.to_string()));
        let frame = encode_frame(&serde_json::to_vec(&request)?)?;

        let mut slot = self.stream.borrow_mut();
        let Some(stream) = slot.as_mut() else {
            return Err(BulkError::transport(
                "connection dropped after a failed exchange",
            ));
        };

        debug!("Send {} byte command frame to {}", frame.len(), db);
        let reply = match exchange(stream, &frame) {
            Ok(reply) => reply,
            Err(error) => {
                warn!("Drop connection after failed exchange: {}", error);
                *slot = None;
                return Err(error);
            }
        };

        match serde_json::from_slice(&reply) {
            Ok(Value::Object(reply)) => Ok(reply),
            Ok(other) => Err(BulkError::transport(format!(
                "reply is not a document: {other}"
            ))),
            Err(error) => Err(BulkError::transport(format!("malformed reply: {error}"))),
        }
    }
}
