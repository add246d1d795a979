use crate::domain::ports::NativeLibrary;
use tracing::warn;

/// Capacity for short replies: last error, names, versions, lookups.
pub const DEFAULT_CAPACITY: usize = 1024;
/// Capacity for a full configuration export.
pub const EXPORT_CAPACITY: usize = 32 * 1024;
/// Capacity for rendered documents. The engine cannot grow the buffer, so this
/// errs on the large side.
pub const DOCUMENT_CAPACITY: usize = 4 * 1024 * 1024;

/// Reply of a buffer-returning native call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeReply {
    pub code: i32,
    pub bytes: Vec<u8>,
}

impl NativeReply {
    pub fn is_ok(&self) -> bool {
        self.code == 0
    }

    /// Lossy UTF-8 decoding with surrounding whitespace and NULs removed.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes)
            .trim_matches(|c: char| c.is_whitespace() || c == '\0')
            .to_string()
    }
}

/// Runs native calls that answer through a caller-owned buffer.
///
/// The size cell starts at the buffer capacity and holds the number of bytes
/// written once the call returns. Replies longer than the capacity are cut at
/// the capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferChannel {
    capacity: usize,
}

impl Default for BufferChannel {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl BufferChannel {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.clamp(1, i32::MAX as usize),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn invoke<F>(&self, call: F) -> NativeReply
    where
        F: FnOnce(&mut [u8], &mut i32) -> i32,
    {
        let mut buffer = vec![0u8; self.capacity];
        let mut size = self.capacity as i32;
        let code = call(&mut buffer, &mut size);

        let reported = usize::try_from(size).unwrap_or(0);
        if reported > self.capacity {
            warn!(
                reported,
                capacity = self.capacity,
                "native reply exceeds buffer capacity, output truncated"
            );
        }
        buffer.truncate(reported.min(self.capacity));
        NativeReply {
            code,
            bytes: buffer,
        }
    }
}

/// Fetches the message of the engine's last failed call.
pub fn last_error<L: NativeLibrary + ?Sized>(library: &L) -> String {
    BufferChannel::default()
        .invoke(|buffer, size| library.last_error(buffer, size))
        .text()
}
