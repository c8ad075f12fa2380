//! Message framing: a message is a series of length-prefixed chunks
//! followed by a zero-length terminator.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::trace;

use super::error::BoltResult;

pub const MAX_CHUNK_SIZE: usize = 65_535;

const TERMINATOR: [u8; 2] = [0x00, 0x00];

/// Appends the chunked form of `payload` to `dst`.
///
/// An empty payload produces only the terminator, which a receiver cannot
/// tell apart from a keep-alive.
pub fn chunk_into(payload: &[u8], dst: &mut Vec<u8>) {
    dst.reserve(payload.len() + 2 * (payload.len() / MAX_CHUNK_SIZE + 2));
    for piece in payload.chunks(MAX_CHUNK_SIZE) {
        dst.extend_from_slice(&(piece.len() as u16).to_be_bytes());
        dst.extend_from_slice(piece);
    }
    dst.extend_from_slice(&TERMINATOR);
}

pub fn chunk(payload: &[u8]) -> Vec<u8> {
    let mut buf = Vec::new();
    chunk_into(payload, &mut buf);
    buf
}

/// Reassembles messages from chunks.
///
/// Keeps a partial header or chunk across `feed` calls, so bytes may arrive
/// split at any offset.
#[derive(Debug, Default)]
pub struct Dechunker {
    cumulation: Option<Vec<u8>>,
    pending: Vec<u8>,
}

impl Dechunker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handles one complete chunk body. Returns a message when the chunk is
    /// the terminator of a non-empty cumulation.
    pub fn push(&mut self, chunk: &[u8]) -> Option<Vec<u8>> {
        if chunk.is_empty() {
            // Terminator with nothing buffered is a keep-alive.
            return self.cumulation.take();
        }
        self.cumulation
            .get_or_insert_with(Vec::new)
            .extend_from_slice(chunk);
        None
    }

    /// Consumes raw wire bytes and returns every message completed by them.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<Vec<u8>> {
        self.pending.extend_from_slice(bytes);

        let mut messages = Vec::new();
        let mut offset = 0;
        while self.pending.len() - offset >= 2 {
            let size =
                u16::from_be_bytes([self.pending[offset], self.pending[offset + 1]]) as usize;
            if self.pending.len() - offset - 2 < size {
                break;
            }
            let start = offset + 2;
            let body = self.pending[start..start + size].to_vec();
            offset = start + size;
            if let Some(message) = self.push(&body) {
                messages.push(message);
            }
        }
        self.pending.drain(..offset);
        messages
    }

    /// True when no partial message or chunk is buffered.
    pub fn is_idle(&self) -> bool {
        self.cumulation.is_none() && self.pending.is_empty()
    }
}

/// Writes one message as chunks and flushes.
pub async fn write_message<W>(writer: &mut W, payload: &[u8]) -> BoltResult<()>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let framed = chunk(payload);
    trace!("Writing {} byte message in {} framed bytes", payload.len(), framed.len());
    writer.write_all(&framed).await?;
    writer.flush().await?;
    Ok(())
}

/// Reads chunks until a complete message is available, skipping keep-alives.
pub async fn read_message<R>(reader: &mut R) -> BoltResult<Vec<u8>>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut dechunker = Dechunker::new();
    let mut header = [0u8; 2];
    loop {
        reader.read_exact(&mut header).await?;
        let size = u16::from_be_bytes(header) as usize;
        let mut body = vec![0u8; size];
        reader.read_exact(&mut body).await?;
        if let Some(message) = dechunker.push(&body) {
            trace!("Read {} byte message", message.len());
            return Ok(message);
        }
    }
}
