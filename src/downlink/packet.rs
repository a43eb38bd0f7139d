//! # Downlink Packet
//!
//! Frame layout:
//!
//! ```text
//! Byte 0:   packet index (0..=num_packets)
//! Byte 1:   frame marker (0x45)
//! Byte 2:   num_packets (file_size / chunk_size)
//! Byte 3..: payload (up to chunk_size bytes)
//! ```

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{HousekeepingError, Result};

/// Frame type marker carried in every downlink packet
pub const FRAME_MARKER: u8 = 0x45;

/// Bytes preceding the payload
pub const FRAME_HEADER_LEN: usize = 3;

/// Largest frame the radio accepts
pub const MAX_FRAME_LEN: usize = 252;

/// Largest payload that keeps a frame within [`MAX_FRAME_LEN`]
pub const MAX_CHUNK_SIZE: usize = MAX_FRAME_LEN - FRAME_HEADER_LEN;

/// One sequence-numbered chunk of a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub index: u8,
    /// The `num_packets` field; a file yields `num_packets + 1` packets
    pub num_packets: u8,
    pub payload: Bytes,
}

impl Packet {
    /// Total frame length including the header
    pub fn frame_len(&self) -> usize {
        FRAME_HEADER_LEN + self.payload.len()
    }

    /// Build the wire frame
    pub fn encode(&self) -> Bytes {
        let mut frame = BytesMut::with_capacity(self.frame_len());
        frame.put_u8(self.index);
        frame.put_u8(FRAME_MARKER);
        frame.put_u8(self.num_packets);
        frame.put_slice(&self.payload);
        frame.freeze()
    }

    /// Parse a wire frame
    ///
    /// # Errors
    ///
    /// Returns `InvalidFrame` if the frame is shorter than the header, the
    /// marker is wrong, or the index is past the packet count
    pub fn decode(frame: &[u8]) -> Result<Self> {
        if frame.len() < FRAME_HEADER_LEN {
            return Err(HousekeepingError::InvalidFrame(format!(
                "Frame too short: {} bytes",
                frame.len()
            )));
        }

        if frame[1] != FRAME_MARKER {
            return Err(HousekeepingError::InvalidFrame(format!(
                "Invalid frame marker: 0x{:02X}",
                frame[1]
            )));
        }

        let (index, num_packets) = (frame[0], frame[2]);
        if index > num_packets {
            return Err(HousekeepingError::InvalidFrame(format!(
                "Packet index {} exceeds packet count {}",
                index, num_packets
            )));
        }

        Ok(Self {
            index,
            num_packets,
            payload: Bytes::copy_from_slice(&frame[FRAME_HEADER_LEN..]),
        })
    }
}
