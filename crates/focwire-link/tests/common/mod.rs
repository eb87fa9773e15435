#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use bytes::{BufMut, BytesMut};
use focwire_frame::{BinaryCodec, Frame, FrameCodec, MARKER};
use focwire_link::{LinkConfig, Motors, Protocol};
use focwire_registers::Catalog;
use focwire_transport::{MemoryLink, MemoryLinkHandle};

pub const WAIT: Duration = Duration::from_secs(2);

/// Device side of a binary in-memory link.
pub struct Device {
    pub handle: MemoryLinkHandle,
    codec: BinaryCodec,
}

impl Device {
    /// Frames the host has written since the last call.
    pub fn received(&mut self) -> Vec<Frame> {
        let mut bytes = self.handle.take_written();
        bytes.push(MARKER);
        self.codec
            .feed_all(&bytes)
            .into_iter()
            .filter_map(|d| match d {
                focwire_frame::Decoded::Frame(frame) => Some(frame),
                focwire_frame::Decoded::SyncRequest => None,
            })
            .collect()
    }

    /// Send `frames` to the host, followed by a closing marker.
    pub fn send(&self, frames: &[Frame]) {
        let mut wire = BytesMut::new();
        for frame in frames {
            self.codec.encode(frame, &mut wire).unwrap();
        }
        wire.put_u8(MARKER);
        self.handle.push(&wire);
    }
}

pub fn binary_motors() -> (Motors, Device) {
    let catalog = Arc::new(Catalog::builtin());
    let (link, handle) = MemoryLink::pair();
    let motors = focwire_link::open(
        Box::new(link),
        Protocol::Binary,
        Arc::clone(&catalog),
        LinkConfig::default(),
    );
    motors.connect().unwrap();
    let device = Device {
        handle,
        codec: BinaryCodec::new(catalog),
    };
    (motors, device)
}

pub fn text_motors() -> (Motors, MemoryLinkHandle) {
    let (link, handle) = MemoryLink::pair();
    let motors = focwire_link::open(
        Box::new(link),
        Protocol::Text,
        Arc::new(Catalog::builtin()),
        LinkConfig::default(),
    );
    motors.connect().unwrap();
    (motors, handle)
}

/// Register ids of REGISTER frames, in order.
pub fn register_ids(frames: &[Frame]) -> Vec<u8> {
    frames
        .iter()
        .filter_map(|f| match f {
            Frame::Register { register, .. } => Some(register.id),
            _ => None,
        })
        .collect()
}
