//! Length-prefixed message framing.
//!
//! Every message on the wire is a fixed-width ASCII-decimal header giving
//! the payload length in bytes, followed by the payload itself. This
//! mirrors the original node's socket protocol: a persistent TCP
//! connection carrying many such frames rather than one-shot requests.

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::time::timeout;
use tracing::warn;

use crate::error::TransportError;

/// Write `payload` as a single framed message: a `header_size`-byte
/// ASCII-decimal header (left-aligned, space-padded) followed by the bytes
/// themselves.
pub async fn write_message<W>(
    writer: &mut W,
    payload: &[u8],
    header_size: usize,
    op_timeout: Duration,
) -> Result<(), TransportError>
where
    W: AsyncWriteExt + Unpin,
{
    let header = format!("{:<width$}", payload.len(), width = header_size);
    if header.len() > header_size {
        return Err(TransportError::MessageTooLarge);
    }

    timeout(op_timeout, async {
        writer.write_all(header.as_bytes()).await?;
        writer.write_all(payload).await?;
        writer.flush().await?;
        Ok::<_, std::io::Error>(())
    })
    .await
    .map_err(|_| TransportError::Timeout)??;

    Ok(())
}

/// Read one framed message. Returns `Ok(None)` when the peer closed the
/// connection cleanly before sending a header (an empty first read), which
/// signals orderly shutdown rather than a protocol error.
pub async fn read_message<R>(
    reader: &mut R,
    header_size: usize,
    buffer_size: usize,
    max_message_size: usize,
    op_timeout: Duration,
) -> Result<Option<Vec<u8>>, TransportError>
where
    R: AsyncReadExt + Unpin,
{
    timeout(
        op_timeout,
        read_message_inner(reader, header_size, buffer_size, max_message_size),
    )
    .await
    .map_err(|_| TransportError::Timeout)?
}

async fn read_message_inner<R>(
    reader: &mut R,
    header_size: usize,
    buffer_size: usize,
    max_message_size: usize,
) -> Result<Option<Vec<u8>>, TransportError>
where
    R: AsyncReadExt + Unpin,
{
    let mut header_buf = vec![0u8; header_size];
    let mut read_total = 0;
    while read_total < header_size {
        let n = reader.read(&mut header_buf[read_total..]).await?;
        if n == 0 {
            if read_total == 0 {
                return Ok(None);
            }
            warn!(read_total, header_size, "peer closed mid-header");
            return Err(TransportError::SocketClosed);
        }
        read_total += n;
    }

    let declared_len: usize = std::str::from_utf8(&header_buf)
        .map_err(|_| TransportError::InvalidHeader)?
        .trim()
        .parse()
        .map_err(|_| TransportError::InvalidHeader)?;

    if declared_len > max_message_size {
        warn!(declared_len, max_message_size, "declared message length exceeds the cap");
        return Err(TransportError::MessageTooLarge);
    }

    let mut message = Vec::with_capacity(declared_len);
    let mut chunk = vec![0u8; buffer_size];
    while message.len() < declared_len {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            warn!(received = message.len(), declared_len, "peer closed mid-body");
            return Err(TransportError::SocketClosed);
        }
        message.extend_from_slice(&chunk[..n]);
        if message.len() > max_message_size {
            warn!(received = message.len(), max_message_size, "message body exceeded the cap while reading");
            return Err(TransportError::MessageTooLarge);
        }
    }
    message.truncate(declared_len);

    Ok(Some(message))
}
