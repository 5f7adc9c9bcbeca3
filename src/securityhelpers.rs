// Copyright (c) 2017,2018,2020 Ivaylo Petrov
//
// Licensed under the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//
// author: Ivaylo Petrov <ivajloip@gmail.com>

//! Assembles the exact byte sequences over which a MIC is computed.
//!
//! Data frames are signed over a B0 (or, for LoRaWAN 1.1 uplinks, also a B1) block followed by
//! the frame without its MIC. Join frames are signed over the frame alone. The CMAC itself is
//! delegated to a [`Mac`] implementation supplied by the caller.
//!
//! # Examples
//!
//! ```
//! # #[cfg(feature = "default-crypto")] {
//! use lorawan_codec::default_crypto::DefaultFactory;
//! use lorawan_codec::keys::{AES128, MIC};
//! use lorawan_codec::securityhelpers::*;
//!
//! let frame = [0x40, 0x04, 0x03, 0x02, 0x01, 0x80, 0x01, 0x00, 0x01,
//!     0xa6, 0x94, 0x64, 0x26, 0x15, 0xd6, 0xc3, 0xb5, 0x82];
//! let (msg, mic) = frame.split_at(frame.len() - 4);
//! let params = UplinkMicParams { f_cnt: 1, ..Default::default() };
//! let input = assemble_uplink_mic_input(msg, &params).unwrap();
//! let key = AES128([2; 16]);
//! assert_eq!(input.compute(&DefaultFactory, &key, &key).0, mic);
//! # }
//! ```
use core::borrow::Borrow;
use crate::error::Error;
use crate::keys::{CryptoFactory, Mac, AES128, MIC};
use crate::packet_length::phy::{
    mac::fhdr::FHDR_MIN_LEN, MHDR_LEN, MIC_LEN, PHY_PAYLOAD_MAX_LEN,
};
use crate::parser::{MType, MHDR};
use crate::types::{Direction, MacVersion};
use heapless::Vec;

const MIC_BLOCK_TAG: u8 = 0x49;
const MIC_BLOCK_LEN: usize = 16;
const FCTRL_ACK: u8 = 0x20;

/// Bytes a MIC is computed over: an optional 16 byte block followed by the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct MicInput<'a> {
    block: Option<[u8; MIC_BLOCK_LEN]>,
    message: &'a [u8],
}

impl<'a> MicInput<'a> {
    /// The B0 / B1 block, absent for join frames.
    pub fn block(&self) -> Option<&[u8; MIC_BLOCK_LEN]> {
        self.block.as_ref()
    }

    /// The frame without its MIC.
    pub fn message(&self) -> &'a [u8] {
        self.message
    }

    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.block.map_or(0, |_| MIC_BLOCK_LEN) + self.message.len()
    }

    /// Copies the full input to the start of `out`.
    pub fn copy_to(&self, out: &mut [u8]) -> Result<usize, Error> {
        let len = self.len();
        if out.len() < len {
            return Err(Error::BufferTooShort { required: len, available: out.len() });
        }
        let mut pos = 0;
        if let Some(block) = &self.block {
            out[..MIC_BLOCK_LEN].copy_from_slice(block);
            pos = MIC_BLOCK_LEN;
        }
        out[pos..len].copy_from_slice(self.message);
        Ok(len)
    }

    pub fn to_vec(&self) -> Vec<u8, { MIC_BLOCK_LEN + PHY_PAYLOAD_MAX_LEN }> {
        let mut out = Vec::new();
        // The message never exceeds PHY_PAYLOAD_MAX_LEN, checked on assembly.
        let _ = out.resize_default(self.len());
        let _ = self.copy_to(&mut out);
        out
    }

    /// Feeds the input to `mac` and returns the full CMAC.
    pub fn cmac<M: Mac>(&self, mut mac: M) -> [u8; 16] {
        if let Some(block) = &self.block {
            mac.input(block);
        }
        mac.input(self.message);
        mac.result()
    }

    /// The MIC: the first four bytes of the CMAC.
    pub fn compute<M: Mac>(&self, mac: M) -> MIC {
        let cmac = self.cmac(mac);
        MIC([cmac[0], cmac[1], cmac[2], cmac[3]])
    }
}

/// Counters and channel data that do not travel in an uplink but enter its MIC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct UplinkMicParams {
    pub version: MacVersion,
    /// Full 32 bit FCntUp.
    pub f_cnt: u32,
    /// Counter of the acknowledged downlink, used only by 1.1 frames with Ack set.
    pub conf_f_cnt: u32,
    pub tx_dr_index: u8,
    pub tx_ch_index: u8,
}

/// Counters that do not travel in a downlink but enter its MIC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct DownlinkMicParams {
    pub version: MacVersion,
    /// Full 32 bit NFCntDown or AFCntDown.
    pub f_cnt: u32,
    /// Counter of the acknowledged uplink, used only by 1.1 frames with Ack set.
    pub conf_f_cnt: u32,
}

/// MIC inputs of an uplink.
///
/// LoRaWAN 1.0 uses `b0` alone. LoRaWAN 1.1 signs `b0` with FNwkSIntKey and `b1` with
/// SNwkSIntKey and combines both with [`uplink_mic_1_1`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct UplinkMicInput<'a> {
    pub b0: MicInput<'a>,
    pub b1: Option<MicInput<'a>>,
}

impl UplinkMicInput<'_> {
    /// Computes the MIC. LoRaWAN 1.0 frames use only `f_key` (the NwkSKey).
    pub fn compute<F, KF, KS>(&self, factory: &F, f_key: &KF, s_key: &KS) -> MIC
    where
        F: CryptoFactory,
        KF: Borrow<AES128>,
        KS: Borrow<AES128>,
    {
        let cmac_f = self.b0.cmac(factory.new_mac(Borrow::<AES128>::borrow(f_key)));
        match &self.b1 {
            Some(b1) => {
                let cmac_s = b1.cmac(factory.new_mac(Borrow::<AES128>::borrow(s_key)));
                uplink_mic_1_1(&cmac_f, &cmac_s)
            }
            None => MIC([cmac_f[0], cmac_f[1], cmac_f[2], cmac_f[3]]),
        }
    }
}

/// LoRaWAN 1.1 uplink MIC: cmacS[0..2] followed by cmacF[0..2].
pub fn uplink_mic_1_1(cmac_f: &[u8; 16], cmac_s: &[u8; 16]) -> MIC {
    MIC([cmac_s[0], cmac_s[1], cmac_f[0], cmac_f[1]])
}

struct DataHeader<'a> {
    direction: Direction,
    dev_addr: &'a [u8],
    ack: bool,
}

fn data_header(msg: &[u8]) -> Result<DataHeader<'_>, Error> {
    let min = MHDR_LEN + FHDR_MIN_LEN;
    if msg.len() < min {
        return Err(Error::TruncatedFrame { expected: min, actual: msg.len() });
    }
    if msg.len() > PHY_PAYLOAD_MAX_LEN - MIC_LEN {
        return Err(Error::TrailingBytes {
            expected: PHY_PAYLOAD_MAX_LEN - MIC_LEN,
            actual: msg.len(),
        });
    }
    let mhdr = MHDR::parse(msg[0])?;
    if !mhdr.mtype.is_data() {
        return Err(Error::MTypeMismatch);
    }
    let direction = mhdr.mtype.direction().ok_or(Error::MTypeMismatch)?;
    Ok(DataHeader { direction, dev_addr: &msg[1..5], ack: msg[5] & FCTRL_ACK != 0 })
}

fn mic_block(
    direction: Direction,
    dev_addr: &[u8],
    f_cnt: u32,
    msg_len: usize,
) -> [u8; MIC_BLOCK_LEN] {
    let mut b = [0u8; MIC_BLOCK_LEN];
    b[0] = MIC_BLOCK_TAG;
    b[5] = direction.dir_bit();
    b[6..10].copy_from_slice(dev_addr);
    b[10..14].copy_from_slice(&f_cnt.to_le_bytes());
    b[15] = msg_len as u8;
    b
}

fn low16(v: u32) -> [u8; 2] {
    (v as u16).to_le_bytes()
}

/// Assembles the MIC input of an uplink data frame.
///
/// `msg` is the encoded frame from MHDR to the end of FRMPayload (without MIC).
pub fn assemble_uplink_mic_input<'a>(
    msg: &'a [u8],
    params: &UplinkMicParams,
) -> Result<UplinkMicInput<'a>, Error> {
    let header = data_header(msg)?;
    if header.direction != Direction::Uplink {
        return Err(Error::DirectionMismatch);
    }
    let b0 = mic_block(Direction::Uplink, header.dev_addr, params.f_cnt, msg.len());
    let b1 = match params.version {
        MacVersion::V1_0 => None,
        MacVersion::V1_1 => {
            let mut b1 = b0;
            if header.ack {
                b1[1..3].copy_from_slice(&low16(params.conf_f_cnt));
            }
            b1[3] = params.tx_dr_index;
            b1[4] = params.tx_ch_index;
            Some(MicInput { block: Some(b1), message: msg })
        }
    };
    Ok(UplinkMicInput { b0: MicInput { block: Some(b0), message: msg }, b1 })
}

/// Assembles the MIC input of a downlink data frame.
///
/// `msg` is the encoded frame from MHDR to the end of FRMPayload (without MIC).
pub fn assemble_downlink_mic_input<'a>(
    msg: &'a [u8],
    params: &DownlinkMicParams,
) -> Result<MicInput<'a>, Error> {
    let header = data_header(msg)?;
    if header.direction != Direction::Downlink {
        return Err(Error::DirectionMismatch);
    }
    let mut b0 = mic_block(Direction::Downlink, header.dev_addr, params.f_cnt, msg.len());
    if params.version == MacVersion::V1_1 && header.ack {
        b0[1..3].copy_from_slice(&low16(params.conf_f_cnt));
    }
    Ok(MicInput { block: Some(b0), message: msg })
}

/// MIC input of a join-request, rejoin-request or decrypted join-accept: the frame itself.
///
/// `msg` is the frame without its MIC.
pub fn assemble_join_mic_input(msg: &[u8]) -> Result<MicInput<'_>, Error> {
    let Some(&first) = msg.first() else {
        return Err(Error::TruncatedFrame { expected: MHDR_LEN, actual: 0 });
    };
    match MHDR::parse(first)?.mtype {
        MType::JoinRequest | MType::JoinAccept | MType::RejoinRequest => {
            Ok(MicInput { block: None, message: msg })
        }
        _ => Err(Error::MTypeMismatch),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const UP: [u8; 14] =
        [0x40, 0x04, 0x03, 0x02, 0x01, 0xa0, 0x01, 0x00, 0x01, 0xa6, 0x94, 0x64, 0x26, 0x15];

    #[test]
    fn test_b0_layout() {
        let params = UplinkMicParams { f_cnt: 0x0102_0304, ..Default::default() };
        let input = assemble_uplink_mic_input(&UP, &params).unwrap();
        assert_eq!(
            input.b0.block(),
            Some(&[0x49, 0, 0, 0, 0, 0, 0x04, 0x03, 0x02, 0x01, 0x04, 0x03, 0x02, 0x01, 0, 14])
        );
        assert!(input.b1.is_none());
        assert_eq!(input.b0.len(), 30);
    }

    #[test]
    fn test_b1_layout_with_ack() {
        let params = UplinkMicParams {
            version: MacVersion::V1_1,
            f_cnt: 7,
            conf_f_cnt: 0x0001_abcd,
            tx_dr_index: 5,
            tx_ch_index: 2,
        };
        let input = assemble_uplink_mic_input(&UP, &params).unwrap();
        assert_eq!(input.b0.block().unwrap()[1..5], [0, 0, 0, 0]);
        let b1 = input.b1.unwrap();
        assert_eq!(
            b1.block(),
            Some(&[0x49, 0xcd, 0xab, 5, 2, 0, 0x04, 0x03, 0x02, 0x01, 7, 0, 0, 0, 0, 14])
        );
    }

    #[test]
    fn test_downlink_conf_f_cnt_only_with_ack_on_1_1() {
        let mut msg = UP;
        msg[0] = 0x60;
        let params =
            DownlinkMicParams { version: MacVersion::V1_1, f_cnt: 0x10, conf_f_cnt: 0x0302 };
        let b0 = assemble_downlink_mic_input(&msg, &params).unwrap();
        assert_eq!(
            b0.block(),
            Some(&[0x49, 0x02, 0x03, 0, 0, 1, 0x04, 0x03, 0x02, 0x01, 0x10, 0, 0, 0, 0, 14])
        );
        let b0 = assemble_downlink_mic_input(
            &msg,
            &DownlinkMicParams { version: MacVersion::V1_0, ..params },
        )
        .unwrap();
        assert_eq!(b0.block().unwrap()[1..3], [0, 0]);
        msg[5] = 0;
        let b0 = assemble_downlink_mic_input(&msg, &params).unwrap();
        assert_eq!(b0.block().unwrap()[1..3], [0, 0]);
    }

    #[test]
    fn test_rejections() {
        let params = UplinkMicParams::default();
        assert_eq!(
            assemble_uplink_mic_input(&UP[..7], &params),
            Err(Error::TruncatedFrame { expected: 8, actual: 7 })
        );
        let mut down = UP;
        down[0] = 0x60;
        assert_eq!(assemble_uplink_mic_input(&down, &params), Err(Error::DirectionMismatch));
        assert_eq!(
            assemble_downlink_mic_input(&UP, &DownlinkMicParams::default()),
            Err(Error::DirectionMismatch)
        );
        let mut join = UP;
        join[0] = 0x00;
        assert_eq!(assemble_uplink_mic_input(&join, &params), Err(Error::MTypeMismatch));
        assert_eq!(assemble_join_mic_input(&UP), Err(Error::MTypeMismatch));
        assert!(assemble_join_mic_input(&join).unwrap().block().is_none());
    }

    #[test]
    fn test_copy_to_and_to_vec_agree() {
        let input = assemble_uplink_mic_input(&UP, &UplinkMicParams::default()).unwrap().b0;
        let mut buf = [0u8; 40];
        assert_eq!(input.copy_to(&mut buf), Ok(30));
        assert_eq!(&buf[..30], &input.to_vec()[..]);
        assert_eq!(&buf[16..30], &UP);
        assert!(matches!(input.copy_to(&mut [0u8; 29]), Err(Error::BufferTooShort { .. })));
    }

    #[test]
    fn test_uplink_mic_1_1_combination() {
        let f = [0xf0; 16];
        let mut s = [0x50; 16];
        s[1] = 0x51;
        assert_eq!(uplink_mic_1_1(&f, &s), MIC([0x50, 0x51, 0xf0, 0xf0]));
    }
}
