//! Command handlers for packctl
//!
//! - Pack: build a container from a list file
//! - Info: container statistics
//! - Sample: stream records with a sampling config

pub mod info;
pub mod pack;
pub mod sample;
