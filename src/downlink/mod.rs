//! # Downlink Module
//!
//! Splits stored files into sequence-numbered frames for the radio.
//!
//! This module handles:
//! - Framing file chunks as `[index, 0x45, num_packets] ++ payload`
//! - Producing packets lazily, one read per packet
//! - Driving frames into a [`Transport`] in ascending order
//!
//! A failed send aborts the rest of the file; nothing is retried.

pub mod packet;
pub mod packetizer;

use std::path::Path;

use tracing::{debug, info};

use crate::error::{HousekeepingError, Result};
use crate::radio::Transport;
use crate::storage::Storage;

pub use packet::{Packet, FRAME_HEADER_LEN, FRAME_MARKER, MAX_CHUNK_SIZE};
pub use packetizer::Packetizer;

/// Lazily split `path` into `chunk_size` packets
pub fn packetize<'a, S: Storage + ?Sized>(
    storage: &'a S,
    path: &Path,
    chunk_size: usize,
) -> Result<Packetizer<'a, S>> {
    Packetizer::new(storage, path, chunk_size)
}

/// Downlink a whole file, returning the number of frames sent
///
/// # Errors
///
/// Returns `Transport` on the first failed send; later packets are not sent
pub fn send_file<S, T>(storage: &S, transport: &mut T, path: &Path, chunk_size: usize) -> Result<usize>
where
    S: Storage + ?Sized,
    T: Transport + ?Sized,
{
    send_file_from(storage, transport, path, chunk_size, 0)
}

/// Downlink a file starting at packet `start`
///
/// Used to resume a transfer that was cut short.
pub fn send_file_from<S, T>(
    storage: &S,
    transport: &mut T,
    path: &Path,
    chunk_size: usize,
    start: u8,
) -> Result<usize>
where
    S: Storage + ?Sized,
    T: Transport + ?Sized,
{
    let packets = Packetizer::new(storage, path, chunk_size)?.starting_at(start);
    let total = packets.packet_count();

    let mut sent = 0;
    for packet in packets {
        let packet = packet?;
        let frame = packet.encode();

        transport.send_frame(&frame).map_err(|e| {
            HousekeepingError::Transport(format!(
                "Failed to send packet {}/{} of {}: {}",
                packet.index,
                packet.num_packets,
                path.display(),
                e
            ))
        })?;

        debug!("Sent packet {}/{} ({} bytes)", packet.index, packet.num_packets, frame.len());
        sent += 1;
    }

    info!("Downlinked {} ({} of {} packets)", path.display(), sent, total);
    Ok(sent)
}
