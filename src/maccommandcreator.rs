// Copyright (c) 2018-2020 Ivaylo Petrov
//
// Licensed under the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//
// Author: Ivaylo Petrov <ivajloip@gmail.com>

//! Writes MAC commands (CID followed by the packed payload) into caller supplied buffers.
//!
//! # Examples
//!
//! ```
//! use heapless::Vec;
//! use lorawan_codec::maccommandcreator::*;
//! use lorawan_codec::maccommands::*;
//! use lorawan_codec::types::Direction;
//!
//! let mut fopts: Vec<u8, 15> = Vec::new();
//! let cmd = MacCommand::Uplink(LinkCheckReqPayload.into());
//! append_mac_command(&mut fopts, &cmd, Direction::Uplink).unwrap();
//! assert_eq!(&fopts[..], &[0x02]);
//! ```
use crate::bytes::{append_with, Writer};
use crate::error::Error;
use crate::maccommands::{MacCommand, SerializableMacCommand};
use crate::packet_length::phy::mac::fhdr::FOPTS_MAX_LEN;
use crate::types::Direction;
use heapless::Vec;

/// Writes `cmd` (CID and payload) at the cursor position.
pub fn write_mac_command(
    w: &mut Writer<'_>,
    cmd: &dyn SerializableMacCommand,
) -> Result<(), Error> {
    w.put_u8(cmd.cid())?;
    cmd.write_payload(w.reserve(cmd.payload_len())?)
}

/// Appends `cmd` to `dst` if it belongs to `direction`.
///
/// Returns the number of bytes appended. On error `dst` is unchanged.
pub fn append_mac_command<const N: usize>(
    dst: &mut Vec<u8, N>,
    cmd: &MacCommand,
    direction: Direction,
) -> Result<usize, Error> {
    if cmd.direction() != direction {
        return Err(Error::DirectionMismatch);
    }
    trace!("appending MAC command {:?}", cmd.sanitized());
    append_serializable(dst, cmd)
}

/// Appends any serializable command to `dst`. On error `dst` is unchanged.
pub fn append_serializable<const N: usize>(
    dst: &mut Vec<u8, N>,
    cmd: &dyn SerializableMacCommand,
) -> Result<usize, Error> {
    append_with(dst, |w| write_mac_command(w, cmd))
}

/// Writes all `cmds` back to back into `out` and returns the number of bytes used.
///
/// # Examples
///
/// ```
/// use lorawan_codec::maccommandcreator::*;
/// use lorawan_codec::maccommands::*;
///
/// let ans = LinkADRAnsPayload {
///     channel_mask_ack: true,
///     data_rate_ack: true,
///     tx_power_ack: false,
/// };
/// let status = DevStatusAnsPayload { battery: 0xfe, margin: -2 };
/// let mut buf = [0u8; 8];
/// let len = build_mac_commands(&[&ans, &status], &mut buf).unwrap();
/// assert_eq!(&buf[..len], &[0x03, 0x03, 0x06, 0xfe, 0x3e]);
/// ```
pub fn build_mac_commands(
    cmds: &[&dyn SerializableMacCommand],
    out: &mut [u8],
) -> Result<usize, Error> {
    let mut w = Writer::new(out);
    for cmd in cmds {
        write_mac_command(&mut w, *cmd)?;
    }
    Ok(w.position())
}

/// Calculates the length in bytes of a sequence of MAC commands, including the CIDs.
pub fn mac_commands_len(cmds: &[&dyn SerializableMacCommand]) -> usize {
    cmds.iter().map(|mc| mc.payload_len() + 1).sum()
}

/// Whether the commands fit into FOpts.
pub fn can_piggyback(cmds: &[&dyn SerializableMacCommand]) -> bool {
    mac_commands_len(cmds) <= FOPTS_MAX_LEN
}
