use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, trace};

use crate::channel::buffer::BufferPool;
use crate::channel::context::ContextHandle;

/// Reads `reader` into pooled buffers and delivers them to `context`.
///
/// Stops at end of stream (closing the context) or as soon as the context
/// stops accepting buffers. Returns the number of bytes delivered.
pub async fn pump<R>(mut reader: R, pool: &BufferPool, context: &ContextHandle) -> anyhow::Result<usize>
where
    R: AsyncRead + Unpin,
{
    let mut delivered = 0;
    loop {
        let mut buffer = pool.acquire();
        let n = reader.read_buf(buffer.bytes_mut()).await?;

        if n == 0 {
            // Peer closed the stream
            buffer.release();
            debug!(context = %context.id(), delivered, "Transport reached end of stream");
            context.close();
            return Ok(delivered);
        }

        trace!(context = %context.id(), len = n, "Read buffer");
        if !context.deliver(buffer) {
            debug!(context = %context.id(), delivered, "Context stopped accepting buffers");
            return Ok(delivered);
        }
        delivered += n;
    }
}
