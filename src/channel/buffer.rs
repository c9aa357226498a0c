//! Pooled receive buffers.

use bytes::BytesMut;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

struct PoolInner {
    free: Mutex<Vec<BytesMut>>,
    buffer_size: usize,
    capacity: usize,
    outstanding: AtomicUsize,
}

/// Hands out [`ConsumerBuffer`]s and takes them back on release.
#[derive(Clone)]
pub struct BufferPool {
    inner: Arc<PoolInner>,
}

impl fmt::Debug for BufferPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferPool")
            .field("buffer_size", &self.inner.buffer_size)
            .field("capacity", &self.inner.capacity)
            .field("outstanding", &self.outstanding())
            .finish()
    }
}

impl BufferPool {
    /// `capacity` bounds how many released buffers are kept for reuse.
    pub fn new(buffer_size: usize, capacity: usize) -> Self {
        Self {
            inner: Arc::new(PoolInner {
                free: Mutex::new(Vec::with_capacity(capacity)),
                buffer_size: buffer_size.max(1),
                capacity,
                outstanding: AtomicUsize::new(0),
            }),
        }
    }

    /// An empty buffer with at least `buffer_size` bytes of capacity.
    pub fn acquire(&self) -> ConsumerBuffer {
        let reused = self.inner.free.lock().ok().and_then(|mut free| free.pop());
        let bytes = reused.unwrap_or_else(|| BytesMut::with_capacity(self.inner.buffer_size));
        self.inner.outstanding.fetch_add(1, Ordering::AcqRel);
        ConsumerBuffer {
            bytes,
            pool: Arc::clone(&self.inner),
        }
    }

    /// A buffer holding a copy of `data`.
    pub fn filled(&self, data: &[u8]) -> ConsumerBuffer {
        let mut buffer = self.acquire();
        buffer.bytes_mut().extend_from_slice(data);
        buffer
    }

    /// Buffers handed out and not yet released.
    pub fn outstanding(&self) -> usize {
        self.inner.outstanding.load(Ordering::Acquire)
    }

    /// Released buffers waiting for reuse.
    pub fn available(&self) -> usize {
        self.inner.free.lock().map(|free| free.len()).unwrap_or(0)
    }

    pub fn buffer_size(&self) -> usize {
        self.inner.buffer_size
    }
}

/// A buffer on loan from a [`BufferPool`].
///
/// Returned to the pool by [`ConsumerBuffer::release`] or on drop; ownership
/// makes a second release impossible.
pub struct ConsumerBuffer {
    bytes: BytesMut,
    pool: Arc<PoolInner>,
}

impl fmt::Debug for ConsumerBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsumerBuffer")
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl ConsumerBuffer {
    /// The filled part of the buffer.
    pub fn to_array(&self) -> &[u8] {
        &self.bytes
    }

    pub fn bytes_mut(&mut self) -> &mut BytesMut {
        &mut self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn release(self) {
        drop(self);
    }
}

impl Drop for ConsumerBuffer {
    fn drop(&mut self) {
        let mut bytes = std::mem::take(&mut self.bytes);
        bytes.clear();
        if let Ok(mut free) = self.pool.free.lock() {
            if free.len() < self.pool.capacity && bytes.capacity() >= self.pool.buffer_size {
                free.push(bytes);
            }
        }
        self.pool.outstanding.fetch_sub(1, Ordering::AcqRel);
    }
}
