//! One-shot version negotiation run on every new transport.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info};

use super::error::{BoltError, BoltErrorKind, BoltResult};
use super::version::Version;

/// Identification preamble sent before the version candidates.
pub const BOLT_MAGIC: [u8; 4] = [0x60, 0x60, 0xB0, 0x17];

/// Number of version candidates in a handshake request.
pub const VERSION_SLOTS: usize = 4;

/// Default candidates, in preference order.
pub const SUPPORTED_VERSIONS: [Version; VERSION_SLOTS] =
    [Version::V5_4, Version::ZERO, Version::ZERO, Version::ZERO];

/// Builds the 20-byte handshake: magic plus four versions, zero-padded.
pub fn handshake_request(versions: &[Version]) -> BoltResult<[u8; 20]> {
    if versions.is_empty() || versions.len() > VERSION_SLOTS {
        return Err(BoltError::with_detail(
            BoltErrorKind::HandshakeFailed,
            format!(
                "Between 1 and {} candidate versions are required, got {}",
                VERSION_SLOTS,
                versions.len()
            ),
        ));
    }

    let mut buf = [0u8; 20];
    buf[..4].copy_from_slice(&BOLT_MAGIC);
    for (slot, version) in versions.iter().enumerate() {
        let start = 4 + slot * 4;
        buf[start..start + 4].copy_from_slice(&version.to_raw().to_be_bytes());
    }
    Ok(buf)
}

/// Interprets the server's 4-byte answer.
pub fn parse_handshake_response(bytes: [u8; 4]) -> BoltResult<Version> {
    let version = Version::from_raw(u32::from_be_bytes(bytes));
    if version.is_zero() {
        return Err(BoltError::with_detail(
            BoltErrorKind::HandshakeFailed,
            "The server does not support any of the proposed versions",
        ));
    }
    Ok(version)
}

/// Runs the handshake over `stream` and returns the agreed version.
pub async fn negotiate<S>(stream: &mut S, versions: &[Version]) -> BoltResult<Version>
where
    S: AsyncRead + AsyncWrite + Unpin + ?Sized,
{
    let request = handshake_request(versions)?;
    debug!(
        "Starting handshake, supported Bolt versions: {:?}",
        versions.iter().map(ToString::to_string).collect::<Vec<_>>()
    );

    stream.write_all(&request).await?;
    stream.flush().await?;

    let mut response = [0u8; 4];
    stream.read_exact(&mut response).await.map_err(|e| {
        BoltError::with_detail(
            BoltErrorKind::HandshakeFailed,
            format!("Failed to read the negotiated version: {}", e),
        )
    })?;

    let version = parse_handshake_response(response)?;
    info!("Bolt handshake completed, version {}", version);
    Ok(version)
}
