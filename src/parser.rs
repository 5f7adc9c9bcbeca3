// Copyright (c) 2017,2018,2020 Ivaylo Petrov
//
// Licensed under the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//
// author: Ivaylo Petrov <ivajloip@gmail.com>

//! Provides the frame tree of a LoRaWAN PHYPayload and the functions decoding it from bytes.
//!
//! # Examples
//!
//! ```
//! use lorawan_codec::parser::*;
//!
//! let data = [0x40, 0x04, 0x03, 0x02, 0x01, 0x80, 0x01, 0x00, 0x01,
//!     0xa6, 0x94, 0x64, 0x26, 0x15, 0xd6, 0xc3, 0xb5, 0x82];
//! let phy = decode(&data).unwrap();
//! if let Payload::Data(mac_payload) = &phy.payload {
//!     assert_eq!(mac_payload.fhdr.f_cnt, 1);
//!     assert_eq!(mac_payload.f_port, Some(1));
//! } else {
//!     panic!("failed to parse data payload");
//! }
//! ```

use core::borrow::Borrow;
use crate::bytes::{check_bits, get_uint_le};
use crate::error::Error;
use crate::keys::{CryptoFactory, Encrypter, AES128, MIC};
use crate::maccommands::{MacCommandIterator, MacCommandSet};
use crate::packet_length::phy::{
    join, mac, rejoin, MHDR_LEN, MIC_LEN, PHY_PAYLOAD_MAX_LEN, PHY_PAYLOAD_MIN_LEN,
};
use crate::types::{rx_delay_seconds, CfList, DLSettings, Direction, FCtrl};
use heapless::Vec;

macro_rules! fixed_len_struct {
    (
        $(#[$outer:meta])*
        struct $type:ident[$size:expr];
    ) => {
        $(#[$outer])*
        ///
        /// The bytes are kept in wire order (least significant byte first); the textual form
        /// is the reverse.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
        pub struct $type([u8; $size]);

        impl $type {
            /// Width on the wire.
            pub const LEN: usize = $size;

            /// Builds the value from its wire bytes if there are exactly enough of them.
            pub fn new(data: &[u8]) -> Option<$type> {
                if data.len() != $size {
                    return None;
                }
                Some(Self::new_from_raw(data))
            }

            /// Builds the value from the first bytes of `data`, without checking the length.
            ///
            /// Improper use of this method could lead to panic during runtime!
            pub(crate) fn new_from_raw(data: &[u8]) -> $type {
                let mut bytes = [0; $size];
                bytes.copy_from_slice(&data[..$size]);
                $type(bytes)
            }

            /// Builds the value from its most significant byte first representation.
            pub fn from_msb(mut bytes: [u8; $size]) -> $type {
                bytes.reverse();
                $type(bytes)
            }

            /// Most significant byte first representation.
            pub fn to_msb(&self) -> [u8; $size] {
                let mut bytes = self.0;
                bytes.reverse();
                bytes
            }

            pub fn is_zero(&self) -> bool {
                self.0.iter().all(|b| *b == 0)
            }
        }

        impl From<[u8; $size]> for $type {
            fn from(v: [u8; $size]) -> Self {
                $type(v)
            }
        }

        impl AsRef<[u8]> for $type {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }
    };
}

fixed_len_struct! {
    /// EUI64 represents a 64 bit EUI (JoinEUI, DevEUI).
    struct EUI64[8];
}

fixed_len_struct! {
    /// DevNonce represents a 16 bit device nonce.
    struct DevNonce[2];
}

fixed_len_struct! {
    /// JoinNonce represents a 24 bit network server nonce.
    struct JoinNonce[3];
}

fixed_len_struct! {
    /// NetId represents a 24 bit network identifier.
    struct NetId[3];
}

fixed_len_struct! {
    /// DevAddr represents a 32 bit device address.
    struct DevAddr[4];
}

impl DevAddr {
    /// The 7 most significant bits, identifying the network.
    pub fn nwk_id(&self) -> u8 {
        self.0[3] >> 1
    }
}

impl From<DevAddr> for u32 {
    fn from(v: DevAddr) -> Self {
        u32::from_le_bytes(v.0)
    }
}

impl From<u32> for DevAddr {
    fn from(v: u32) -> Self {
        DevAddr(v.to_le_bytes())
    }
}

impl From<DevNonce> for u16 {
    fn from(v: DevNonce) -> Self {
        u16::from_le_bytes(v.0)
    }
}

impl From<u16> for DevNonce {
    fn from(v: u16) -> Self {
        DevNonce(v.to_le_bytes())
    }
}

/// MType gives the possible message types of the PhyPayload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[repr(u8)]
pub enum MType {
    JoinRequest = 0,
    JoinAccept = 1,
    UnconfirmedDataUp = 2,
    UnconfirmedDataDown = 3,
    ConfirmedDataUp = 4,
    ConfirmedDataDown = 5,
    RejoinRequest = 6,
    Proprietary = 7,
}

impl TryFrom<u8> for MType {
    type Error = Error;

    fn try_from(v: u8) -> Result<Self, Error> {
        Ok(match v {
            0 => MType::JoinRequest,
            1 => MType::JoinAccept,
            2 => MType::UnconfirmedDataUp,
            3 => MType::UnconfirmedDataDown,
            4 => MType::ConfirmedDataUp,
            5 => MType::ConfirmedDataDown,
            6 => MType::RejoinRequest,
            7 => MType::Proprietary,
            _ => return Err(Error::UnknownMType(v)),
        })
    }
}

impl MType {
    /// Direction of frames of this type; proprietary frames have none.
    pub fn direction(self) -> Option<Direction> {
        match self {
            MType::JoinRequest
            | MType::UnconfirmedDataUp
            | MType::ConfirmedDataUp
            | MType::RejoinRequest => Some(Direction::Uplink),
            MType::JoinAccept | MType::UnconfirmedDataDown | MType::ConfirmedDataDown => {
                Some(Direction::Downlink)
            }
            MType::Proprietary => None,
        }
    }

    pub fn is_data(self) -> bool {
        matches!(
            self,
            MType::UnconfirmedDataUp
                | MType::UnconfirmedDataDown
                | MType::ConfirmedDataUp
                | MType::ConfirmedDataDown
        )
    }

    pub fn is_confirmed(self) -> bool {
        matches!(self, MType::ConfirmedDataUp | MType::ConfirmedDataDown)
    }
}

/// MHDR represents LoRaWAN MHDR: MType << 5 | RFU << 2 | Major.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct MHDR {
    pub mtype: MType,
    /// LoRaWAN major version, 0 for LoRaWAN R1. Other values are surfaced, not rejected.
    pub major: u8,
}

impl MHDR {
    pub fn new(mtype: MType) -> MHDR {
        MHDR { mtype, major: 0 }
    }

    pub fn parse(byte: u8) -> Result<MHDR, Error> {
        Ok(MHDR { mtype: MType::try_from(byte >> 5)?, major: byte & 0x03 })
    }

    /// The MHDR byte. RFU bits are always written as zero.
    pub fn to_byte(&self) -> Result<u8, Error> {
        Ok((self.mtype as u8) << 5 | check_bits("Major", self.major, 2)?)
    }
}

/// A decoded LoRaWAN PHYPayload.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct PhyPayload {
    pub mhdr: MHDR,
    pub payload: Payload,
    /// Absent only on an encrypted join-accept, whose MIC is part of the encrypted blob.
    pub mic: Option<MIC>,
}

impl PhyPayload {
    pub fn direction(&self) -> Option<Direction> {
        self.mhdr.mtype.direction()
    }

    /// Decrypts an encrypted join-accept with the AppKey (1.0) or NwkKey / JSEncKey (1.1).
    pub fn decrypt_join_accept<F: CryptoFactory, K: Borrow<AES128>>(
        &self,
        key: &K,
        factory: &F,
    ) -> Result<PhyPayload, Error> {
        match &self.payload {
            Payload::JoinAccept(JoinAcceptPayload::Encrypted(enc)) => {
                enc.decrypt(&self.mhdr, Borrow::<AES128>::borrow(key), factory)
            }
            _ => Err(Error::MTypeMismatch),
        }
    }
}

/// Body of a PHYPayload, one variant per frame kind.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum Payload {
    JoinRequest(JoinRequestPayload),
    JoinAccept(JoinAcceptPayload),
    Data(MacPayload),
    RejoinRequest(RejoinRequestPayload),
    /// Opaque body of a proprietary frame: everything between MHDR and MIC.
    Proprietary(Vec<u8, { PHY_PAYLOAD_MAX_LEN - MHDR_LEN - MIC_LEN }>),
}

impl Payload {
    /// Whether the body may sit behind an MHDR carrying `mtype`.
    pub fn matches(&self, mtype: MType) -> bool {
        match self {
            Payload::JoinRequest(_) => mtype == MType::JoinRequest,
            Payload::JoinAccept(_) => mtype == MType::JoinAccept,
            Payload::Data(_) => mtype.is_data(),
            Payload::RejoinRequest(_) => mtype == MType::RejoinRequest,
            Payload::Proprietary(_) => mtype == MType::Proprietary,
        }
    }
}

/// JoinRequestPayload represents the body of a join-request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct JoinRequestPayload {
    pub join_eui: EUI64,
    pub dev_eui: EUI64,
    pub dev_nonce: DevNonce,
}

impl JoinRequestPayload {
    /// Parses the 18 byte body.
    pub fn parse(body: &[u8]) -> Result<Self, Error> {
        exact_len(body.len(), join::JOIN_REQUEST_PAYLOAD_LEN)?;
        Ok(JoinRequestPayload {
            join_eui: EUI64::new_from_raw(&body[0..8]),
            dev_eui: EUI64::new_from_raw(&body[8..16]),
            dev_nonce: DevNonce::new_from_raw(&body[16..18]),
        })
    }
}

/// Join-accept body, either as received (encrypted) or after decryption.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum JoinAcceptPayload {
    Encrypted(EncryptedJoinAccept),
    Decrypted(DecryptedJoinAccept),
}

/// The 16 or 32 encrypted bytes following the MHDR of a join-accept, MIC included.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct EncryptedJoinAccept(Vec<u8, { join::JOIN_ACCEPT_WITH_CFLIST_LEN - MHDR_LEN }>);

impl EncryptedJoinAccept {
    pub fn new(data: &[u8]) -> Result<Self, Error> {
        match data.len() {
            16 | 32 => Vec::from_slice(data)
                .map(EncryptedJoinAccept)
                .map_err(|_| Error::out_of_range("EncryptedJoinAccept", data.len() as u64)),
            n => Err(Error::out_of_range("EncryptedJoinAccept", n as u64)),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Decrypts the blob producing the join-accept with its fields and MIC.
    ///
    /// The network server encrypts join-accepts with an AES decrypt operation, so decryption
    /// runs AES encrypt over each 16 byte block. The MIC is not verified.
    ///
    /// # Examples
    ///
    /// ```
    /// # #[cfg(feature = "default-crypto")] {
    /// use lorawan_codec::default_crypto::DefaultFactory;
    /// use lorawan_codec::keys::AES128;
    /// use lorawan_codec::parser::*;
    ///
    /// let data = [0x20, 0x49, 0x3e, 0xeb, 0x51, 0xfb, 0xa2, 0x11, 0x6f, 0x81, 0x0e, 0xdb,
    ///     0x37, 0x42, 0x97, 0x51, 0x42];
    /// let phy = decode(&data).unwrap();
    /// let key = AES128([0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88,
    ///     0x99, 0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff]);
    /// let decrypted = phy.decrypt_join_accept(&key, &DefaultFactory).unwrap();
    /// assert!(decrypted.mic.is_some());
    /// # }
    /// ```
    pub fn decrypt<F: CryptoFactory>(
        &self,
        mhdr: &MHDR,
        key: &AES128,
        factory: &F,
    ) -> Result<PhyPayload, Error> {
        let mut image = [0u8; join::JOIN_ACCEPT_WITH_CFLIST_LEN];
        let len = MHDR_LEN + self.0.len();
        image[0] = mhdr.to_byte()?;
        image[MHDR_LEN..len].copy_from_slice(&self.0);
        let aes_enc = factory.new_enc(key);
        for block in image[MHDR_LEN..len].chunks_exact_mut(16) {
            aes_enc.encrypt_block(block);
        }
        decode_decrypted_join_accept(&image[..len])
    }
}

/// DecryptedJoinAccept represents the plaintext fields of a join-accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct DecryptedJoinAccept {
    pub join_nonce: JoinNonce,
    pub net_id: NetId,
    pub dev_addr: DevAddr,
    pub dl_settings: DLSettings,
    /// Raw RxDelay byte; the delay is the low nibble.
    pub rx_delay: u8,
    pub cf_list: Option<CfList>,
}

impl DecryptedJoinAccept {
    /// Parses the 12 or 28 byte plaintext body (without MHDR and MIC).
    pub fn parse(body: &[u8]) -> Result<Self, Error> {
        let cf_list = match body.len() {
            join::JOIN_ACCEPT_PAYLOAD_LEN => None,
            join::JOIN_ACCEPT_PAYLOAD_WITH_CFLIST_LEN => {
                Some(CfList::parse(&body[join::JOIN_ACCEPT_PAYLOAD_LEN..])?)
            }
            n if n < join::JOIN_ACCEPT_PAYLOAD_LEN => {
                return Err(Error::TruncatedFrame {
                    expected: join::JOIN_ACCEPT_PAYLOAD_LEN,
                    actual: n,
                })
            }
            n => {
                exact_len(n, join::JOIN_ACCEPT_PAYLOAD_WITH_CFLIST_LEN)?;
                None
            }
        };
        Ok(DecryptedJoinAccept {
            join_nonce: JoinNonce::new_from_raw(&body[0..3]),
            net_id: NetId::new_from_raw(&body[3..6]),
            dev_addr: DevAddr::new_from_raw(&body[6..10]),
            dl_settings: DLSettings::from_byte(body[10]),
            rx_delay: body[11],
            cf_list,
        })
    }

    /// Length of the plaintext body.
    pub fn payload_len(&self) -> usize {
        match self.cf_list {
            Some(_) => join::JOIN_ACCEPT_PAYLOAD_WITH_CFLIST_LEN,
            None => join::JOIN_ACCEPT_PAYLOAD_LEN,
        }
    }

    /// Delay in seconds between the end of an uplink and the first receive window.
    pub fn rx_delay_seconds(&self) -> u8 {
        rx_delay_seconds(self.rx_delay)
    }
}

/// FHDR represents the frame header of a data frame.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct FHDR {
    pub dev_addr: DevAddr,
    pub f_ctrl: FCtrl,
    /// The low 16 bits of the frame counter; the upper bits never travel over the air.
    pub f_cnt: u16,
    /// Raw FOpts bytes (MAC commands); FCtrl.FOptsLen is their count.
    pub f_opts: Vec<u8, { mac::fhdr::FOPTS_MAX_LEN }>,
}

impl FHDR {
    pub fn len(&self) -> usize {
        mac::fhdr::FHDR_MIN_LEN + self.f_opts.len()
    }
}

/// MacPayload represents the body of a data frame.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct MacPayload {
    pub fhdr: FHDR,
    /// Present if and only if `frm_payload` is not empty.
    pub f_port: Option<u8>,
    pub frm_payload: Vec<u8, { mac::FRM_PAYLOAD_MAX_LEN }>,
}

impl MacPayload {
    /// Iterates over the MAC commands piggybacked in FOpts.
    pub fn fopts_commands<T: MacCommandSet>(&self) -> MacCommandIterator<'_, T> {
        MacCommandIterator::new(&self.fhdr.f_opts)
    }

    /// Iterates over the MAC commands carried as FRMPayload, if the frame uses FPort 0.
    ///
    /// The bytes are expected to be decrypted already.
    pub fn frm_mac_commands<T: MacCommandSet>(&self) -> Option<MacCommandIterator<'_, T>> {
        if self.f_port == Some(0) {
            Some(MacCommandIterator::new(&self.frm_payload))
        } else {
            None
        }
    }
}

/// RejoinRequestPayload represents the body of a rejoin-request.
///
/// Types 0 and 2 carry NetID, type 1 carries JoinEUI; the field not used by the type is zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct RejoinRequestPayload {
    pub rejoin_type: u8,
    pub net_id: NetId,
    pub join_eui: EUI64,
    pub dev_eui: EUI64,
    pub rejoin_cnt: u16,
}

impl RejoinRequestPayload {
    /// Body length (without MHDR and MIC) for a rejoin type.
    pub fn payload_len_for(rejoin_type: u8) -> Result<usize, Error> {
        match rejoin_type {
            0 | 2 => Ok(rejoin::REJOIN_NET_ID_PAYLOAD_LEN),
            1 => Ok(rejoin::REJOIN_JOIN_EUI_PAYLOAD_LEN),
            t => Err(Error::InvalidRejoinType(t)),
        }
    }

    pub fn parse(body: &[u8]) -> Result<Self, Error> {
        let Some(&rejoin_type) = body.first() else {
            return Err(Error::TruncatedFrame {
                expected: rejoin::REJOIN_NET_ID_PAYLOAD_LEN,
                actual: 0,
            });
        };
        exact_len(body.len(), Self::payload_len_for(rejoin_type)?)?;
        let mut res = RejoinRequestPayload { rejoin_type, ..Default::default() };
        let rest = match rejoin_type {
            1 => {
                res.join_eui = EUI64::new_from_raw(&body[1..9]);
                &body[9..]
            }
            _ => {
                res.net_id = NetId::new_from_raw(&body[1..4]);
                &body[4..]
            }
        };
        res.dev_eui = EUI64::new_from_raw(&rest[0..8]);
        res.rejoin_cnt = get_uint_le(&rest[8..10], 2) as u16;
        Ok(res)
    }
}

/// Decodes a PHYPayload.
///
/// Join-accepts come back in their encrypted form; see [`EncryptedJoinAccept::decrypt`] and
/// [`decode_decrypted_join_accept`].
pub fn decode(bytes: &[u8]) -> Result<PhyPayload, Error> {
    decode_phy(bytes).map_err(|e| {
        debug!("PHYPayload of {} bytes rejected: {}", bytes.len(), e);
        e
    })
}

/// Decodes the plaintext image of a join-accept: MHDR | fields | CFList? | MIC.
pub fn decode_decrypted_join_accept(bytes: &[u8]) -> Result<PhyPayload, Error> {
    let len = bytes.len();
    join_accept_len(len)?;
    let mhdr = MHDR::parse(bytes[0])?;
    if mhdr.mtype != MType::JoinAccept {
        return Err(Error::MTypeMismatch);
    }
    let fields = DecryptedJoinAccept::parse(&bytes[MHDR_LEN..len - MIC_LEN])?;
    Ok(PhyPayload {
        mhdr,
        payload: Payload::JoinAccept(JoinAcceptPayload::Decrypted(fields)),
        mic: Some(trailing_mic(bytes)),
    })
}

fn decode_phy(bytes: &[u8]) -> Result<PhyPayload, Error> {
    let len = bytes.len();
    let Some(&first) = bytes.first() else {
        return Err(Error::TruncatedFrame { expected: MHDR_LEN, actual: 0 });
    };
    if len > PHY_PAYLOAD_MAX_LEN {
        return Err(Error::TrailingBytes { expected: PHY_PAYLOAD_MAX_LEN, actual: len });
    }
    let mhdr = MHDR::parse(first)?;
    match mhdr.mtype {
        MType::JoinRequest => {
            exact_len(len, join::JOIN_REQUEST_LEN)?;
            let body = JoinRequestPayload::parse(&bytes[MHDR_LEN..len - MIC_LEN])?;
            Ok(PhyPayload {
                mhdr,
                payload: Payload::JoinRequest(body),
                mic: Some(trailing_mic(bytes)),
            })
        }
        MType::JoinAccept => {
            join_accept_len(len)?;
            let enc = EncryptedJoinAccept::new(&bytes[MHDR_LEN..])?;
            Ok(PhyPayload {
                mhdr,
                payload: Payload::JoinAccept(JoinAcceptPayload::Encrypted(enc)),
                mic: None,
            })
        }
        MType::UnconfirmedDataUp
        | MType::UnconfirmedDataDown
        | MType::ConfirmedDataUp
        | MType::ConfirmedDataDown => decode_data(bytes, mhdr),
        MType::RejoinRequest => {
            if len < MHDR_LEN + 1 {
                return Err(Error::TruncatedFrame { expected: rejoin::REJOIN_NET_ID_LEN, actual: len });
            }
            let expected = RejoinRequestPayload::payload_len_for(bytes[1])? + MHDR_LEN + MIC_LEN;
            exact_len(len, expected)?;
            let body = RejoinRequestPayload::parse(&bytes[MHDR_LEN..len - MIC_LEN])?;
            Ok(PhyPayload {
                mhdr,
                payload: Payload::RejoinRequest(body),
                mic: Some(trailing_mic(bytes)),
            })
        }
        MType::Proprietary => {
            if len < MHDR_LEN + MIC_LEN {
                return Err(Error::TruncatedFrame { expected: MHDR_LEN + MIC_LEN, actual: len });
            }
            let body = Vec::from_slice(&bytes[MHDR_LEN..len - MIC_LEN])
                .map_err(|_| Error::TrailingBytes { expected: PHY_PAYLOAD_MAX_LEN, actual: len })?;
            Ok(PhyPayload { mhdr, payload: Payload::Proprietary(body), mic: Some(trailing_mic(bytes)) })
        }
    }
}

fn decode_data(bytes: &[u8], mhdr: MHDR) -> Result<PhyPayload, Error> {
    let len = bytes.len();
    if len < PHY_PAYLOAD_MIN_LEN {
        return Err(Error::TruncatedFrame { expected: PHY_PAYLOAD_MIN_LEN, actual: len });
    }
    let direction = mhdr.mtype.direction().ok_or(Error::MTypeMismatch)?;
    let body = &bytes[MHDR_LEN..len - MIC_LEN];

    let (f_ctrl, f_opts_len) = FCtrl::from_byte(body[4], direction);
    let available = body.len() - mac::fhdr::FHDR_MIN_LEN;
    if f_opts_len > available {
        return Err(Error::FOptsLenMismatch { declared: f_opts_len, available });
    }
    let fhdr_len = mac::fhdr::FHDR_MIN_LEN + f_opts_len;
    let too_long = |_| Error::TrailingBytes { expected: PHY_PAYLOAD_MAX_LEN, actual: len };
    let fhdr = FHDR {
        dev_addr: DevAddr::new_from_raw(&body[0..4]),
        f_ctrl,
        f_cnt: get_uint_le(&body[5..7], mac::fhdr::FCNT_LEN) as u16,
        f_opts: Vec::from_slice(&body[mac::fhdr::FHDR_MIN_LEN..fhdr_len]).map_err(too_long)?,
    };

    let (f_port, frm_payload) = match &body[fhdr_len..] {
        [] => (None, Vec::new()),
        // An FPort must be followed by at least one FRMPayload byte.
        [_] => return Err(Error::TruncatedFrame { expected: len + 1, actual: len }),
        [port, payload @ ..] => (Some(*port), Vec::from_slice(payload).map_err(too_long)?),
    };

    Ok(PhyPayload {
        mhdr,
        payload: Payload::Data(MacPayload { fhdr, f_port, frm_payload }),
        mic: Some(trailing_mic(bytes)),
    })
}

fn trailing_mic(bytes: &[u8]) -> MIC {
    let mut mic = [0; MIC_LEN];
    mic.copy_from_slice(&bytes[bytes.len() - MIC_LEN..]);
    MIC(mic)
}

fn exact_len(actual: usize, expected: usize) -> Result<(), Error> {
    if actual < expected {
        Err(Error::TruncatedFrame { expected, actual })
    } else if actual > expected {
        Err(Error::TrailingBytes { expected, actual })
    } else {
        Ok(())
    }
}

fn join_accept_len(len: usize) -> Result<(), Error> {
    match len {
        join::JOIN_ACCEPT_LEN | join::JOIN_ACCEPT_WITH_CFLIST_LEN => Ok(()),
        n if n < join::JOIN_ACCEPT_LEN => exact_len(n, join::JOIN_ACCEPT_LEN),
        n => exact_len(n, join::JOIN_ACCEPT_WITH_CFLIST_LEN),
    }
}
