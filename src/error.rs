//! Error kinds reported by the codec.
//!
//! Every decode error is fatal for the call that produced it: no partial frame is ever returned
//! next to an error. Encode errors point at a value that does not fit its wire field.
use crate::types::Direction;
use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum Error {
    /// MHDR.MType outside 0..=7.
    UnknownMType(u8),
    /// The CID has no payload shape in the given direction.
    UnknownMacCommand { cid: u8, direction: Direction },
    /// The PHYPayload is shorter than its MType requires.
    TruncatedFrame { expected: usize, actual: usize },
    /// A MAC command payload is shorter than the width of its CID.
    TruncatedMacCommand { cid: u8, expected: usize, actual: usize },
    /// FCtrl.FOptsLen points past the bytes available before the MIC.
    FOptsLenMismatch { declared: usize, available: usize },
    /// A value does not fit the width of its wire field.
    FieldOutOfRange { field: &'static str, value: u64 },
    /// The last byte of a CFList is neither 0x00 nor 0x01.
    InvalidCfListType(u8),
    /// The RejoinType byte of a rejoin-request is not 0, 1 or 2.
    InvalidRejoinType(u8),
    /// The destination buffer cannot hold the encoded bytes.
    BufferTooShort { required: usize, available: usize },
    /// A fixed size body is followed by extra bytes.
    TrailingBytes { expected: usize, actual: usize },
    /// MHDR.MType does not agree with the body it is attached to.
    MTypeMismatch,
    /// A MIC is given for an encrypted join-accept, or missing for any other frame.
    MicPlacement,
    /// A MIC input was requested for a frame of the other direction.
    DirectionMismatch,
}

impl Error {
    pub(crate) fn out_of_range<V: Into<u64>>(field: &'static str, value: V) -> Self {
        Error::FieldOutOfRange { field, value: value.into() }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Error::UnknownMType(m) => write!(f, "unknown MType {}", m),
            Error::UnknownMacCommand { cid, direction } => {
                write!(f, "unknown MAC command 0x{:02x} in {} direction", cid, direction)
            }
            Error::TruncatedFrame { expected, actual } => {
                write!(f, "truncated frame: need {} bytes, got {}", expected, actual)
            }
            Error::TruncatedMacCommand { cid, expected, actual } => write!(
                f,
                "truncated MAC command 0x{:02x}: need {} payload bytes, got {}",
                cid, expected, actual
            ),
            Error::FOptsLenMismatch { declared, available } => write!(
                f,
                "FOptsLen {} exceeds the {} bytes available before the MIC",
                declared, available
            ),
            Error::FieldOutOfRange { field, value } => {
                write!(f, "value {} out of range for field {}", value, field)
            }
            Error::InvalidCfListType(t) => write!(f, "invalid CFList type {}", t),
            Error::InvalidRejoinType(t) => write!(f, "invalid RejoinType {}", t),
            Error::BufferTooShort { required, available } => write!(
                f,
                "buffer too short: need {} bytes, have {}",
                required, available
            ),
            Error::TrailingBytes { expected, actual } => {
                write!(f, "expected {} bytes, got {}", expected, actual)
            }
            Error::MTypeMismatch => f.write_str("MType does not match the payload"),
            Error::MicPlacement => {
                f.write_str("MIC must be absent on encrypted join-accept and present otherwise")
            }
            Error::DirectionMismatch => f.write_str("frame direction does not match"),
        }
    }
}
