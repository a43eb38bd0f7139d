//! Trait abstraction for the downlink radio to enable testing

use std::io;

/// Sink for downlink frames
///
/// Each call hands one complete frame to the radio. No acknowledgment is
/// expected; delivery is the transport's concern.
pub trait Transport: Send {
    fn send_frame(&mut self, frame: &[u8]) -> io::Result<()>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn send_frame(&mut self, frame: &[u8]) -> io::Result<()> {
        (**self).send_frame(frame)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send_frame(&mut self, frame: &[u8]) -> io::Result<()> {
        (**self).send_frame(frame)
    }
}
