//! # Qube Housekeeping Library
//!
//! Onboard housekeeping for a PocketQube satellite.
//!
//! This library provides the core pieces that run on the flight computer:
//! status snapshots with a fixed 13-byte encoding, numbered data and log files
//! with size-based rotation, a text serializer for telemetry datasets, and a
//! packetizer that frames stored files for the downlink radio.
//!
//! Hardware access, the storage medium and the radio are reached through
//! the [`status::StatusProvider`], [`storage::Storage`] and
//! [`radio::Transport`] traits.

pub mod clock;
pub mod config;
pub mod dataset;
pub mod downlink;
pub mod error;
pub mod files;
pub mod indicator;
pub mod radio;
pub mod status;
pub mod storage;
