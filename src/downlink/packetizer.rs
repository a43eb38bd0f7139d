//! Lazy file-to-packet splitter.

use std::path::{Path, PathBuf};

use bytes::{Bytes, BytesMut};

use super::packet::Packet;
use crate::error::{HousekeepingError, Result};
use crate::storage::Storage;

/// Iterator over the packets of one stored file
///
/// A file of `size` bytes split into `chunk_size` chunks gives
/// `num_packets = size / chunk_size` and yields `num_packets + 1` packets.
/// Packet `i` carries the bytes at `i * chunk_size`; the last packet holds
/// whatever remains, which is empty when the size is an exact multiple.
///
/// Reads go through one reusable buffer that is zero-filled before each
/// read, and every payload is truncated to the bytes actually read. The
/// iterator stops after the first read error.
pub struct Packetizer<'a, S: Storage + ?Sized> {
    storage: &'a S,
    path: PathBuf,
    chunk_size: usize,
    num_packets: u8,
    next_index: u16,
    buffer: BytesMut,
}

impl<S: Storage + ?Sized> std::fmt::Debug for Packetizer<'_, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Packetizer")
            .field("path", &self.path)
            .field("chunk_size", &self.chunk_size)
            .field("num_packets", &self.num_packets)
            .field("next_index", &self.next_index)
            .finish_non_exhaustive()
    }
}

impl<'a, S: Storage + ?Sized> Packetizer<'a, S> {
    /// Prepare to packetize `path` in `chunk_size` chunks
    ///
    /// # Errors
    ///
    /// - `InvalidFrame` if `chunk_size` is zero
    /// - `Storage` if the file size cannot be read
    /// - `Encoding` if the packet count does not fit in one byte
    pub fn new(storage: &'a S, path: &Path, chunk_size: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(HousekeepingError::InvalidFrame(
                "chunk size must be greater than 0".to_string(),
            ));
        }

        let file_size = storage
            .size(path)
            .map_err(|e| HousekeepingError::storage("Failed to stat", path, e))?;

        let count = file_size / chunk_size as u64;
        let num_packets = u8::try_from(count).map_err(|_| HousekeepingError::Encoding {
            field: "packet count",
            value: count,
            width: 1,
        })?;

        Ok(Self {
            storage,
            path: path.to_path_buf(),
            chunk_size,
            num_packets,
            next_index: 0,
            buffer: BytesMut::with_capacity(chunk_size),
        })
    }

    /// Skip ahead so the next packet produced is `index`
    pub fn starting_at(mut self, index: u8) -> Self {
        self.next_index = u16::from(index);
        self
    }

    /// Value of the packet-count field
    pub fn num_packets(&self) -> u8 {
        self.num_packets
    }

    /// Number of packets a full pass yields (`num_packets + 1`)
    pub fn packet_count(&self) -> usize {
        usize::from(self.num_packets) + 1
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    fn read_packet(&mut self, index: u8) -> Result<Packet> {
        let offset = u64::from(index) * self.chunk_size as u64;

        self.buffer.clear();
        self.buffer.resize(self.chunk_size, 0);
        let read = self
            .storage
            .read_at(&self.path, offset, &mut self.buffer[..])
            .map_err(|e| HousekeepingError::storage("Failed to read", &self.path, e))?;

        Ok(Packet {
            index,
            num_packets: self.num_packets,
            payload: Bytes::copy_from_slice(&self.buffer[..read]),
        })
    }

    fn remaining(&self) -> usize {
        (usize::from(self.num_packets) + 1).saturating_sub(usize::from(self.next_index))
    }
}

impl<S: Storage + ?Sized> Iterator for Packetizer<'_, S> {
    type Item = Result<Packet>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next_index > u16::from(self.num_packets) {
            return None;
        }

        let index = self.next_index as u8;
        self.next_index += 1;

        let packet = self.read_packet(index);
        if packet.is_err() {
            self.next_index = u16::from(self.num_packets) + 1;
        }
        Some(packet)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining();
        (remaining, Some(remaining))
    }
}
