use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, SystemTime};

use bytes::BytesMut;
use focwire_frame::{Decoded, Echo, Frame, FrameCodec, Protocol};
use focwire_registers::Catalog;
use focwire_transport::SerialLink;
use tracing::{debug, info, trace, warn};

use crate::bus::{Broadcast, Subscription};
use crate::error::{LinkError, Result};

/// Reader loop settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkConfig {
    /// Sleep between polls when no bytes are available.
    pub poll_interval: Duration,
    /// Upper bound on bytes read per poll.
    pub read_chunk: usize,
}

impl LinkConfig {
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_read_chunk(mut self, read_chunk: usize) -> Self {
        self.read_chunk = read_chunk.max(1);
        self
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(1),
            read_chunk: 256,
        }
    }
}

/// An inbound frame as seen by subscribers.
#[derive(Debug, Clone, PartialEq)]
pub struct Inbound {
    pub frame: Frame,
    /// Motor the frame is attributed to, set by the addressing stage.
    pub motor_id: Option<u8>,
    pub received_at: SystemTime,
}

impl Inbound {
    pub fn new(frame: Frame) -> Self {
        Self {
            frame,
            motor_id: None,
            received_at: SystemTime::now(),
        }
    }
}

/// Processing step run on the reader thread for every inbound frame,
/// before the frame is published.
pub trait InboundStage: Send + Sync {
    fn process(&self, inbound: &mut Inbound);
}

fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

struct Shared {
    name: String,
    protocol: Protocol,
    catalog: Arc<Catalog>,
    config: LinkConfig,
    link: Mutex<Box<dyn SerialLink>>,
    codec: Mutex<Box<dyn FrameCodec>>,
    running: AtomicBool,
    stages: Mutex<Vec<Arc<dyn InboundStage>>>,
    frames: Broadcast<Inbound>,
    echo: Broadcast<Echo>,
}

/// A framed, event-distributing connection to one device.
///
/// One reader thread per connection owns the inbound side: it polls the
/// link, feeds bytes to the framer, runs the inbound stages and publishes
/// each frame to every subscriber in arrival order. Outbound frames are
/// written synchronously by whichever thread calls
/// [`send_frame`](Self::send_frame).
pub struct Connection {
    shared: Arc<Shared>,
    reader: Mutex<Option<JoinHandle<()>>>,
}

impl Connection {
    pub fn new(link: Box<dyn SerialLink>, codec: Box<dyn FrameCodec>) -> Self {
        Self::with_config(link, codec, LinkConfig::default())
    }

    pub fn with_config(
        link: Box<dyn SerialLink>,
        codec: Box<dyn FrameCodec>,
        config: LinkConfig,
    ) -> Self {
        let shared = Shared {
            name: link.name().to_string(),
            protocol: codec.protocol(),
            catalog: Arc::clone(codec.catalog()),
            config,
            link: Mutex::new(link),
            codec: Mutex::new(codec),
            running: AtomicBool::new(false),
            stages: Mutex::new(Vec::new()),
            frames: Broadcast::new(),
            echo: Broadcast::new(),
        };
        Self {
            shared: Arc::new(shared),
            reader: Mutex::new(None),
        }
    }

    /// Open the link and start the reader thread.
    pub fn connect(&self) -> Result<()> {
        let mut reader = lock(&self.reader);
        if let Some(handle) = reader.take() {
            if self.shared.running.load(Ordering::Acquire) {
                *reader = Some(handle);
                return Err(LinkError::AlreadyConnected);
            }
            // The previous reader stopped on a transport error.
            let _ = handle.join();
            let _ = lock(&self.shared.link).close();
        }

        lock(&self.shared.link).open()?;
        lock(&self.shared.codec).reset();
        self.shared.frames.reopen();
        self.shared.echo.reopen();
        self.shared.running.store(true, Ordering::Release);

        let shared = Arc::clone(&self.shared);
        let spawned = thread::Builder::new()
            .name(format!("focwire-reader {}", self.shared.name))
            .spawn(move || shared.run_reader());

        match spawned {
            Ok(handle) => {
                *reader = Some(handle);
                info!(port = %self.shared.name, protocol = %self.shared.protocol, "connected");
                Ok(())
            }
            Err(err) => {
                self.shared.running.store(false, Ordering::Release);
                let _ = lock(&self.shared.link).close();
                Err(LinkError::Spawn(err))
            }
        }
    }

    /// Stop the reader, close the link and complete every stream.
    ///
    /// Safe to call more than once.
    pub fn disconnect(&self) -> Result<()> {
        let handle = lock(&self.reader).take();
        let Some(handle) = handle else {
            return Ok(());
        };

        self.shared.running.store(false, Ordering::Release);
        if handle.join().is_err() {
            warn!(port = %self.shared.name, "reader thread panicked");
        }
        self.shared.frames.close();
        self.shared.echo.close();
        lock(&self.shared.link).close()?;
        info!(port = %self.shared.name, "disconnected");
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    /// Encode and write one frame, then publish its echo.
    pub fn send_frame(&self, frame: &Frame) -> Result<Echo> {
        if !self.is_connected() {
            return Err(LinkError::NotConnected);
        }
        self.shared.send(frame)
    }

    /// Subscribe to inbound frames accepted by `filter`.
    pub fn subscribe<F>(&self, filter: F) -> Subscription<Inbound>
    where
        F: Fn(&Inbound) -> bool + Send + Sync + 'static,
    {
        self.shared.frames.subscribe(filter)
    }

    /// Subscribe to every inbound frame.
    pub fn frames(&self) -> Subscription<Inbound> {
        self.shared.frames.subscribe_all()
    }

    /// Subscribe to the wire form of every outbound frame.
    pub fn echo(&self) -> Subscription<Echo> {
        self.shared.echo.subscribe_all()
    }

    /// Append a stage to the inbound pipeline.
    pub fn add_stage(&self, stage: Arc<dyn InboundStage>) {
        lock(&self.shared.stages).push(stage);
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.shared.catalog
    }

    pub fn protocol(&self) -> Protocol {
        self.shared.protocol
    }

    pub fn port_name(&self) -> &str {
        &self.shared.name
    }

    /// Whether the framer currently trusts its frame boundaries.
    pub fn in_sync(&self) -> bool {
        lock(&self.shared.codec).in_sync()
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        if let Err(err) = self.disconnect() {
            debug!(error = %err, "disconnect on drop failed");
        }
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("port", &self.shared.name)
            .field("protocol", &self.shared.protocol)
            .field("connected", &self.is_connected())
            .finish()
    }
}

impl Shared {
    fn send(&self, frame: &Frame) -> Result<Echo> {
        let mut buf = BytesMut::new();
        let echo = lock(&self.codec).encode(frame, &mut buf)?;
        lock(&self.link).write_all(&buf)?;
        trace!(echo = %echo, bytes = buf.len(), "frame sent");
        self.echo.publish(&echo);
        Ok(echo)
    }

    fn run_reader(&self) {
        debug!(port = %self.name, "reader started");
        let mut buf = vec![0u8; self.config.read_chunk.max(1)];

        while self.running.load(Ordering::Acquire) {
            match self.poll(&mut buf) {
                Ok(0) => thread::sleep(self.config.poll_interval),
                Ok(_) => {}
                Err(err) => {
                    warn!(port = %self.name, error = %err, "transport error, stopping reader");
                    break;
                }
            }
        }

        self.running.store(false, Ordering::Release);
        self.frames.close();
        self.echo.close();
        debug!(port = %self.name, "reader stopped");
    }

    /// Read whatever is available and dispatch the frames it completes.
    fn poll(&self, buf: &mut [u8]) -> Result<usize> {
        let n = {
            let mut link = lock(&self.link);
            let available = link.bytes_available()?;
            if available == 0 {
                return Ok(0);
            }
            let len = available.min(buf.len());
            link.read(&mut buf[..len])?
        };
        if n == 0 {
            return Ok(0);
        }

        let decoded = lock(&self.codec).feed_all(&buf[..n]);
        for item in decoded {
            match item {
                Decoded::Frame(frame) => self.dispatch(frame),
                Decoded::SyncRequest => {
                    let in_sync = lock(&self.codec).in_sync();
                    debug!(port = %self.name, in_sync, "peer requested sync");
                    if let Err(err) = self.send(&Frame::Sync { in_sync }) {
                        warn!(port = %self.name, error = %err, "failed to answer sync request");
                    }
                }
            }
        }
        Ok(n)
    }

    fn dispatch(&self, frame: Frame) {
        let mut inbound = Inbound::new(frame);
        let stages = lock(&self.stages).clone();
        for stage in &stages {
            stage.process(&mut inbound);
        }
        trace!(frame = %inbound.frame, motor = ?inbound.motor_id, "frame received");
        self.frames.publish(&inbound);
    }
}
