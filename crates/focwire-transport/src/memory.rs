use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::error::{Result, TransportError};
use crate::traits::SerialLink;

#[derive(Debug, Default)]
struct Shared {
    inbound: VecDeque<u8>,
    outbound: Vec<u8>,
    open: bool,
    open_count: usize,
}

/// In-memory [`SerialLink`].
///
/// Bytes pushed through the paired [`MemoryLinkHandle`] become readable on
/// the link; bytes written to the link can be drained from the handle. This
/// plays the role of the device in tests.
#[derive(Debug)]
pub struct MemoryLink {
    name: String,
    shared: Arc<Mutex<Shared>>,
}

/// Device side of a [`MemoryLink`].
#[derive(Debug, Clone)]
pub struct MemoryLinkHandle {
    shared: Arc<Mutex<Shared>>,
}

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MemoryLink {
    /// Create a link and its device-side handle.
    pub fn pair() -> (Self, MemoryLinkHandle) {
        Self::named("memory")
    }

    pub fn named(name: impl Into<String>) -> (Self, MemoryLinkHandle) {
        let shared = Arc::new(Mutex::new(Shared::default()));
        let link = Self {
            name: name.into(),
            shared: Arc::clone(&shared),
        };
        (link, MemoryLinkHandle { shared })
    }

    fn ensure_open(&self, shared: &Shared) -> Result<()> {
        if shared.open {
            Ok(())
        } else {
            Err(TransportError::NotOpen(self.name.clone()))
        }
    }
}

impl SerialLink for MemoryLink {
    fn name(&self) -> &str {
        &self.name
    }

    fn open(&mut self) -> Result<()> {
        let mut shared = lock(&self.shared);
        shared.open = true;
        shared.open_count += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        lock(&self.shared).open = false;
        Ok(())
    }

    fn is_open(&self) -> bool {
        lock(&self.shared).open
    }

    fn bytes_available(&mut self) -> Result<usize> {
        let shared = lock(&self.shared);
        self.ensure_open(&shared)?;
        Ok(shared.inbound.len())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut shared = lock(&self.shared);
        self.ensure_open(&shared)?;
        let n = buf.len().min(shared.inbound.len());
        for (slot, byte) in buf.iter_mut().zip(shared.inbound.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    fn write_all(&mut self, data: &[u8]) -> Result<()> {
        let mut shared = lock(&self.shared);
        self.ensure_open(&shared)?;
        shared.outbound.extend_from_slice(data);
        Ok(())
    }
}

impl MemoryLinkHandle {
    /// Queue bytes for the host to read.
    pub fn push(&self, data: &[u8]) {
        lock(&self.shared).inbound.extend(data.iter().copied());
    }

    /// Drain everything the host has written so far.
    pub fn take_written(&self) -> Vec<u8> {
        std::mem::take(&mut lock(&self.shared).outbound)
    }

    /// Copy of everything the host has written, without draining.
    pub fn written(&self) -> Vec<u8> {
        lock(&self.shared).outbound.clone()
    }

    /// Bytes queued but not yet read by the host.
    pub fn pending(&self) -> usize {
        lock(&self.shared).inbound.len()
    }

    pub fn is_open(&self) -> bool {
        lock(&self.shared).open
    }

    /// How many times the link has been opened.
    pub fn open_count(&self) -> usize {
        lock(&self.shared).open_count
    }

    /// Poll until the host has written at least `len` bytes.
    ///
    /// Returns `false` if `timeout` elapses first.
    pub fn wait_written(&self, len: usize, timeout: Duration) -> bool {
        self.wait_until(timeout, |shared| shared.outbound.len() >= len)
    }

    /// Poll until the host has consumed every pushed byte.
    pub fn wait_drained(&self, timeout: Duration) -> bool {
        self.wait_until(timeout, |shared| shared.inbound.is_empty())
    }

    fn wait_until(&self, timeout: Duration, done: impl Fn(&Shared) -> bool) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if done(&lock(&self.shared)) {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
    }
}
