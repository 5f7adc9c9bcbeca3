// Copyright (c) 2017,2018 Ivaylo Petrov
//
// Licensed under the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//
// author: Ivaylo Petrov <ivajloip@gmail.com>

//! Encodes the frame tree of [`parser`](crate::parser) back into bytes.
//!
//! Every encoder checks the same invariants the decoder enforces, so anything that encodes
//! successfully decodes back to an equal tree.
//!
//! # Examples
//!
//! ```
//! use lorawan_codec::keys::MIC;
//! use lorawan_codec::parser::*;
//!
//! let phy = PhyPayload {
//!     mhdr: MHDR::new(MType::JoinRequest),
//!     payload: Payload::JoinRequest(JoinRequestPayload {
//!         join_eui: EUI64::from([1; 8]),
//!         dev_eui: EUI64::from([2; 8]),
//!         dev_nonce: DevNonce::from(0x0304u16),
//!     }),
//!     mic: Some(MIC([0xaa, 0xbb, 0xcc, 0xdd])),
//! };
//! let bytes = phy.to_vec().unwrap();
//! assert_eq!(bytes.len(), 23);
//! assert_eq!(&bytes[17..19], &[0x04, 0x03]);
//! assert_eq!(decode(&bytes), Ok(phy));
//! ```
use crate::bytes::{append_with, get_uint_le, Writer};
use crate::error::Error;
use crate::packet_length::phy::{join, MHDR_LEN, MIC_LEN, PHY_PAYLOAD_MAX_LEN};
use crate::parser::{
    DecryptedJoinAccept, JoinAcceptPayload, JoinRequestPayload, MacPayload, Payload, PhyPayload,
    RejoinRequestPayload,
};
use crate::types::{CfList, Direction};
use heapless::Vec;

impl PhyPayload {
    /// Length of the encoded frame, MIC included.
    pub fn encoded_len(&self) -> usize {
        let body = match &self.payload {
            Payload::JoinRequest(_) => join::JOIN_REQUEST_PAYLOAD_LEN,
            Payload::JoinAccept(JoinAcceptPayload::Encrypted(enc)) => enc.as_bytes().len(),
            Payload::JoinAccept(JoinAcceptPayload::Decrypted(dec)) => dec.payload_len(),
            Payload::Data(mac) => mac.encoded_len(),
            Payload::RejoinRequest(r) => {
                RejoinRequestPayload::payload_len_for(r.rejoin_type).unwrap_or(0)
            }
            Payload::Proprietary(body) => body.len(),
        };
        MHDR_LEN + body + self.mic.map_or(0, |_| MIC_LEN)
    }

    /// Encodes the frame at the start of `out` and returns the number of bytes written.
    pub fn encode_to_slice(&self, out: &mut [u8]) -> Result<usize, Error> {
        let mut w = Writer::new(out);
        self.write(&mut w)?;
        Ok(w.position())
    }

    /// Appends the encoded frame to `dst`. On error `dst` is unchanged.
    pub fn append_to<const N: usize>(&self, dst: &mut Vec<u8, N>) -> Result<usize, Error> {
        append_with(dst, |w| self.write(w))
    }

    pub fn to_vec(&self) -> Result<Vec<u8, PHY_PAYLOAD_MAX_LEN>, Error> {
        let mut out = Vec::new();
        self.append_to(&mut out)?;
        Ok(out)
    }

    fn write(&self, w: &mut Writer<'_>) -> Result<(), Error> {
        if !self.payload.matches(self.mhdr.mtype) {
            return Err(Error::MTypeMismatch);
        }
        let encrypted =
            matches!(self.payload, Payload::JoinAccept(JoinAcceptPayload::Encrypted(_)));
        if encrypted == self.mic.is_some() {
            return Err(Error::MicPlacement);
        }
        let len = self.encoded_len();
        if len > PHY_PAYLOAD_MAX_LEN {
            return Err(Error::TrailingBytes { expected: PHY_PAYLOAD_MAX_LEN, actual: len });
        }

        w.put_u8(self.mhdr.to_byte()?)?;
        match &self.payload {
            Payload::JoinRequest(p) => p.write(w)?,
            Payload::JoinAccept(JoinAcceptPayload::Encrypted(enc)) => w.put_slice(enc.as_bytes())?,
            Payload::JoinAccept(JoinAcceptPayload::Decrypted(dec)) => dec.write(w)?,
            Payload::Data(mac) => {
                let direction = self.mhdr.mtype.direction().ok_or(Error::MTypeMismatch)?;
                mac.write(w, direction)?
            }
            Payload::RejoinRequest(r) => r.write(w)?,
            Payload::Proprietary(body) => w.put_slice(body)?,
        }
        if let Some(mic) = &self.mic {
            w.put_slice(&mic.0)?;
        }
        Ok(())
    }
}

impl JoinRequestPayload {
    fn write(&self, w: &mut Writer<'_>) -> Result<(), Error> {
        w.put_slice(self.join_eui.as_ref())?;
        w.put_slice(self.dev_eui.as_ref())?;
        w.put_slice(self.dev_nonce.as_ref())
    }
}

impl DecryptedJoinAccept {
    /// Encodes the 12 or 28 byte plaintext body (without MHDR and MIC).
    ///
    /// # Examples
    ///
    /// ```
    /// use lorawan_codec::parser::*;
    /// use lorawan_codec::types::*;
    ///
    /// let ja = DecryptedJoinAccept {
    ///     join_nonce: JoinNonce::from([1, 2, 3]),
    ///     net_id: NetId::from([4, 5, 6]),
    ///     dev_addr: DevAddr::from(0x0a0b0c0du32),
    ///     dl_settings: DLSettings { opt_neg: false, rx1_dr_offset: 1, rx2_data_rate: 3 },
    ///     rx_delay: 1,
    ///     cf_list: None,
    /// };
    /// let body = ja.to_vec().unwrap();
    /// assert_eq!(&body[..], &[1, 2, 3, 4, 5, 6, 0x0d, 0x0c, 0x0b, 0x0a, 0x13, 1]);
    /// ```
    pub fn encode_to_slice(&self, out: &mut [u8]) -> Result<usize, Error> {
        let mut w = Writer::new(out);
        self.write(&mut w)?;
        Ok(w.position())
    }

    pub fn to_vec(&self) -> Result<Vec<u8, { join::JOIN_ACCEPT_PAYLOAD_WITH_CFLIST_LEN }>, Error> {
        let mut out = Vec::new();
        append_with(&mut out, |w| self.write(w))?;
        Ok(out)
    }

    fn write(&self, w: &mut Writer<'_>) -> Result<(), Error> {
        w.put_slice(self.join_nonce.as_ref())?;
        w.put_slice(self.net_id.as_ref())?;
        w.put_slice(self.dev_addr.as_ref())?;
        w.put_u8(self.dl_settings.to_byte()?)?;
        w.put_u8(self.rx_delay)?;
        if let Some(cf_list) = &self.cf_list {
            let mut buf = [0u8; CfList::LEN];
            cf_list.write_to(&mut buf)?;
            w.put_slice(&buf)?;
        }
        Ok(())
    }
}

impl MacPayload {
    /// Length of FHDR, FPort and FRMPayload.
    pub fn encoded_len(&self) -> usize {
        self.fhdr.len() + self.f_port.map_or(0, |_| 1) + self.frm_payload.len()
    }

    fn write(&self, w: &mut Writer<'_>, direction: Direction) -> Result<(), Error> {
        match (self.f_port, self.frm_payload.is_empty()) {
            (Some(port), true) => return Err(Error::out_of_range("FPort", port)),
            (None, false) => {
                return Err(Error::out_of_range("FRMPayload", self.frm_payload.len() as u64))
            }
            _ => (),
        }
        let fhdr = &self.fhdr;
        let f_ctrl = fhdr.f_ctrl.to_byte(direction, fhdr.f_opts.len())?;
        w.put_slice(fhdr.dev_addr.as_ref())?;
        w.put_u8(f_ctrl)?;
        w.put_uint_le("FCnt", u64::from(fhdr.f_cnt), 2)?;
        w.put_slice(&fhdr.f_opts)?;
        if let Some(port) = self.f_port {
            w.put_u8(port)?;
            w.put_slice(&self.frm_payload)?;
        }
        Ok(())
    }
}

impl RejoinRequestPayload {
    fn write(&self, w: &mut Writer<'_>) -> Result<(), Error> {
        Self::payload_len_for(self.rejoin_type)?;
        w.put_u8(self.rejoin_type)?;
        if self.rejoin_type == 1 {
            if !self.net_id.is_zero() {
                return Err(Error::out_of_range("NetID", get_uint_le(self.net_id.as_ref(), 3)));
            }
            w.put_slice(self.join_eui.as_ref())?;
        } else {
            if !self.join_eui.is_zero() {
                return Err(Error::out_of_range("JoinEUI", get_uint_le(self.join_eui.as_ref(), 8)));
            }
            w.put_slice(self.net_id.as_ref())?;
        }
        w.put_slice(self.dev_eui.as_ref())?;
        w.put_uint_le("RejoinCnt", u64::from(self.rejoin_cnt), 2)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::keys::MIC;
    use crate::parser::{decode, DevAddr, EncryptedJoinAccept, MType, FHDR, MHDR};
    use crate::types::FCtrl;

    fn data_frame(f_port: Option<u8>, frm: &[u8]) -> PhyPayload {
        PhyPayload {
            mhdr: MHDR::new(MType::UnconfirmedDataUp),
            payload: Payload::Data(MacPayload {
                fhdr: FHDR { dev_addr: DevAddr::from(0x01020304u32), ..Default::default() },
                f_port,
                frm_payload: Vec::from_slice(frm).unwrap(),
            }),
            mic: Some(MIC([1, 2, 3, 4])),
        }
    }

    #[test]
    fn test_fport_presence_follows_frm_payload() {
        assert_eq!(
            data_frame(Some(1), &[]).to_vec(),
            Err(Error::FieldOutOfRange { field: "FPort", value: 1 })
        );
        assert_eq!(
            data_frame(None, &[1, 2]).to_vec(),
            Err(Error::FieldOutOfRange { field: "FRMPayload", value: 2 })
        );
        assert_eq!(data_frame(None, &[]).to_vec().unwrap().len(), 12);
    }

    #[test]
    fn test_mic_placement() {
        let mut phy = data_frame(None, &[]);
        phy.mic = None;
        assert_eq!(phy.to_vec(), Err(Error::MicPlacement));

        let enc = PhyPayload {
            mhdr: MHDR::new(MType::JoinAccept),
            payload: Payload::JoinAccept(JoinAcceptPayload::Encrypted(
                EncryptedJoinAccept::new(&[7; 16]).unwrap(),
            )),
            mic: Some(MIC([0; 4])),
        };
        assert_eq!(enc.to_vec(), Err(Error::MicPlacement));
        let enc = PhyPayload { mic: None, ..enc };
        let bytes = enc.to_vec().unwrap();
        assert_eq!(bytes.len(), 17);
        assert_eq!(decode(&bytes), Ok(enc));
    }

    #[test]
    fn test_mtype_mismatch() {
        let mut phy = data_frame(None, &[]);
        phy.mhdr = MHDR::new(MType::JoinRequest);
        assert_eq!(phy.to_vec(), Err(Error::MTypeMismatch));
    }

    #[test]
    fn test_fctrl_direction_rules() {
        let mut phy = data_frame(None, &[]);
        if let Payload::Data(mac) = &mut phy.payload {
            mac.fhdr.f_ctrl = FCtrl { f_pending: true, ..Default::default() };
        }
        assert!(matches!(phy.to_vec(), Err(Error::FieldOutOfRange { .. })));
        phy.mhdr = MHDR::new(MType::UnconfirmedDataDown);
        assert!(phy.to_vec().is_ok());
    }

    #[test]
    fn test_frame_too_long() {
        let mut phy = data_frame(Some(1), &[0x55; 242]);
        if let Payload::Data(mac) = &mut phy.payload {
            mac.fhdr.f_opts = Vec::from_slice(&[0x02; 15]).unwrap();
        }
        assert_eq!(phy.to_vec(), Err(Error::TrailingBytes { expected: 255, actual: 270 }));
        let mut buf = [0u8; 300];
        assert!(phy.encode_to_slice(&mut buf).is_err());
    }

    #[test]
    fn test_append_to_existing_buffer() {
        let phy = data_frame(Some(2), &[9]);
        let mut dst: Vec<u8, 64> = Vec::from_slice(&[0xee]).unwrap();
        assert_eq!(phy.append_to(&mut dst), Ok(14));
        assert_eq!(dst[0], 0xee);
        assert_eq!(&dst[1..], &phy.to_vec().unwrap()[..]);

        let mut small: Vec<u8, 10> = Vec::new();
        assert!(matches!(phy.append_to(&mut small), Err(Error::BufferTooShort { .. })));
        assert!(small.is_empty());
    }

    #[test]
    fn test_rejoin_unused_fields_must_be_zero() {
        let mut r = RejoinRequestPayload { rejoin_type: 0, ..Default::default() };
        r.join_eui = [1, 0, 0, 0, 0, 0, 0, 0].into();
        let phy = PhyPayload {
            mhdr: MHDR::new(MType::RejoinRequest),
            payload: Payload::RejoinRequest(r),
            mic: Some(MIC([0; 4])),
        };
        assert_eq!(phy.to_vec(), Err(Error::FieldOutOfRange { field: "JoinEUI", value: 1 }));

        let r = RejoinRequestPayload { rejoin_type: 3, ..Default::default() };
        let phy = PhyPayload { payload: Payload::RejoinRequest(r), ..phy };
        assert_eq!(phy.to_vec(), Err(Error::InvalidRejoinType(3)));
    }
}
