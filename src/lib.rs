//! Library for encoding and decoding LoRaWAN frames and MAC commands.
#![no_std]
#![deny(rust_2018_idioms)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

#[cfg(test)]
extern crate std;

// This mod MUST go first, so that the others see its macros.
#[macro_use]
mod fmt;
mod macros;

pub mod bytes;
pub mod creator;
pub mod error;
pub mod gps;
pub mod keys;
pub mod maccommandcreator;
pub mod maccommands;
pub mod packet_length;
pub mod parser;
pub mod securityhelpers;
pub mod string;
pub mod types;

#[cfg(feature = "default-crypto")]
#[cfg_attr(docsrs, doc(cfg(feature = "default-crypto")))]
pub mod default_crypto;

pub use error::Error;
