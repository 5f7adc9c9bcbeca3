//! LoRaWAN type primitives (frequency, channelmask, etc)
//! commonly used in payloads.
use crate::bytes::{check_bits, get_uint_le, put_uint_le};
use crate::error::Error;
use core::fmt;

/// Direction of a frame or MAC command, from the end-device point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    Uplink,
    Downlink,
}

impl Direction {
    /// Direction bit used in the B0/B1 MIC blocks (0 = uplink, 1 = downlink).
    pub fn dir_bit(self) -> u8 {
        match self {
            Direction::Uplink => 0,
            Direction::Downlink => 1,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Uplink => f.write_str("uplink"),
            Direction::Downlink => f.write_str("downlink"),
        }
    }
}

/// LoRaWAN MAC layer version, as far as it changes the MIC computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MacVersion {
    /// LoRaWAN 1.0.x
    #[default]
    V1_0,
    /// LoRaWAN 1.1.x
    V1_1,
}

/// ChannelMask represents the ChannelMask from LoRaWAN.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct ChannelMask<const N: usize>([u8; N]);

impl<const N: usize> Default for ChannelMask<N> {
    fn default() -> Self {
        ChannelMask([0xFF; N])
    }
}

#[cfg(feature = "serde")]
impl<const N: usize> serde::Serialize for ChannelMask<N> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeSeq;
        let mut seq = serializer.serialize_seq(Some(self.0.len()))?;
        for e in &self.0 {
            seq.serialize_element(e)?;
        }
        seq.end()
    }
}

#[cfg(feature = "serde")]
struct ChannelMaskDeserializer<const N: usize>;

#[cfg(feature = "serde")]
impl<'de, const N: usize> serde::de::Visitor<'de> for ChannelMaskDeserializer<N> {
    type Value = ChannelMask<N>;

    fn expecting(&self, formatter: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        formatter.write_str("ChannelMask bytes")
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
    where
        A: serde::de::SeqAccess<'de>,
    {
        let mut arr = [0; N];
        let mut index = 0;
        while let Some(el) = seq.next_element()? {
            if index >= N {
                return Err(serde::de::Error::custom("ChannelMask has too many elements"));
            }
            arr[index] = el;
            index += 1;
        }
        if index != N {
            return Err(serde::de::Error::invalid_length(index, &self));
        }
        Ok(ChannelMask(arr))
    }
}

#[cfg(feature = "serde")]
impl<'de, const N: usize> serde::Deserialize<'de> for ChannelMask<N> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_seq(ChannelMaskDeserializer {})
    }
}

impl<const N: usize> ChannelMask<N> {
    /// Constructs a new ChannelMask from the provided data.
    pub fn new(data: &[u8]) -> Result<Self, Error> {
        if data.len() < N {
            return Err(Error::BufferTooShort { required: N, available: data.len() });
        }
        let mut payload = [0; N];
        payload.copy_from_slice(&data[..N]);
        Ok(ChannelMask(payload))
    }

    /// A mask with every channel disabled.
    pub const fn none() -> Self {
        ChannelMask([0; N])
    }

    pub fn set_bank(&mut self, index: usize, value: u8) -> Result<(), Error> {
        let bank = self.0.get_mut(index).ok_or(Error::out_of_range("bank", index as u64))?;
        *bank = value;
        Ok(())
    }

    /// Enable or disable a specific channel. LoRaWAN channel numbers start indexing at zero.
    pub fn set_channel(&mut self, channel: usize, set: bool) -> Result<(), Error> {
        Self::check_index(channel)?;
        let flag = 0b1 << (channel & 0x07);
        if set {
            self.0[channel >> 3] |= flag;
        } else {
            self.0[channel >> 3] &= !flag;
        }
        Ok(())
    }

    pub fn get_index(&self, index: usize) -> Option<u8> {
        self.0.get(index).copied()
    }

    fn check_index(index: usize) -> Result<(), Error> {
        if index >= N * 8 {
            return Err(Error::out_of_range("channel", index as u64));
        }
        Ok(())
    }

    fn channel_enabled(&self, index: usize) -> bool {
        self.0[index >> 3] & (1 << (index & 0x07)) != 0
    }

    /// Verifies if a given channel is enabled.
    pub fn is_enabled(&self, index: usize) -> Result<bool, Error> {
        Self::check_index(index)?;
        Ok(self.channel_enabled(index))
    }

    /// Provides information for the first `M` channels if they are enabled.
    pub fn statuses<const M: usize>(&self) -> [bool; M] {
        let mut res = [false; M];
        for (i, c) in res.iter_mut().enumerate().take(N * 8) {
            *c = self.channel_enabled(i);
        }
        res
    }
}

impl<const N: usize> From<[u8; N]> for ChannelMask<N> {
    fn from(v: [u8; N]) -> Self {
        ChannelMask(v)
    }
}

impl<const N: usize> AsRef<[u8]> for ChannelMask<N> {
    fn as_ref(&self) -> &[u8] {
        &self.0[..]
    }
}

/// DataRateRange represents LoRaWAN DataRateRange (MaxDR << 4 | MinDR).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DataRateRange {
    /// The highest data rate allowed on this channel.
    pub max_data_rate: u8,
    /// The lowest data rate allowed on this channel.
    pub min_data_rate: u8,
}

impl DataRateRange {
    pub fn from_byte(byte: u8) -> Self {
        Self { max_data_rate: byte >> 4, min_data_rate: byte & 0x0f }
    }

    pub fn to_byte(&self) -> Result<u8, Error> {
        Ok(check_bits("MaxDR", self.max_data_rate, 4)? << 4
            | check_bits("MinDR", self.min_data_rate, 4)?)
    }

    /// Whether the range is usable, i.e. the maximum is not below the minimum.
    pub fn is_valid(&self) -> bool {
        self.max_data_rate >= self.min_data_rate
    }
}

/// DLSettings represents LoRaWAN DLSettings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DLSettings {
    /// Set by a LoRaWAN 1.1 network server.
    pub opt_neg: bool,
    /// The offset between the uplink data rate and the downlink data rate used to communicate
    /// with the end-device on the first reception slot (RX1).
    pub rx1_dr_offset: u8,
    /// The data rate of a downlink using the second receive window.
    pub rx2_data_rate: u8,
}

impl DLSettings {
    pub fn from_byte(byte: u8) -> Self {
        Self {
            opt_neg: byte & 0x80 != 0,
            rx1_dr_offset: (byte >> 4) & 0x07,
            rx2_data_rate: byte & 0x0f,
        }
    }

    pub fn to_byte(&self) -> Result<u8, Error> {
        Ok((self.opt_neg as u8) << 7
            | check_bits("Rx1DROffset", self.rx1_dr_offset, 3)? << 4
            | check_bits("Rx2DR", self.rx2_data_rate, 4)?)
    }
}

/// Receive delay in seconds encoded in the low nibble of an RxDelay byte (0 means 1 s).
pub fn rx_delay_seconds(raw: u8) -> u8 {
    match raw & 0x0f {
        0 => 1,
        d => d,
    }
}

/// Frequency represents a channel's central frequency, kept in Hz.
///
/// On the wire it is a 24-bit little-endian count of 100 Hz units. Zero is legal and means
/// "unused" or "no change" depending on the command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Frequency(u32);

impl Frequency {
    /// Encoded width in bytes.
    pub const LEN: usize = 3;

    pub const fn from_hz(hz: u32) -> Self {
        Frequency(hz)
    }

    /// Builds a frequency from a count of 100 Hz units.
    pub fn from_units(units: u32) -> Result<Self, Error> {
        if units > 0x00ff_ffff {
            return Err(Error::out_of_range("Frequency", units));
        }
        Ok(Frequency(units * 100))
    }

    /// Provides the decimal value in Hz of the frequency.
    pub fn value(&self) -> u32 {
        self.0
    }

    /// Value in 100 Hz units, as transmitted.
    pub fn units(&self) -> Result<u32, Error> {
        if self.0 % 100 != 0 || self.0 / 100 > 0x00ff_ffff {
            return Err(Error::out_of_range("Frequency", self.0));
        }
        Ok(self.0 / 100)
    }

    pub fn is_unused(&self) -> bool {
        self.0 == 0
    }

    /// Reads three little-endian bytes.
    pub fn parse(bytes: &[u8]) -> Self {
        Frequency(get_uint_le(bytes, Self::LEN) as u32 * 100)
    }

    /// Writes the frequency as three little-endian bytes into `out`.
    pub fn write_to(&self, out: &mut [u8]) -> Result<(), Error> {
        put_uint_le(out, u64::from(self.units()?), Self::LEN)
    }
}

impl From<&[u8; 3]> for Frequency {
    fn from(v: &[u8; 3]) -> Self {
        Frequency::parse(v)
    }
}

/// Redundancy represents the LinkADRReq Redundancy from LoRaWAN.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Redundancy {
    /// Controls the interpretation of the previously defined ChannelMask bit mask.
    pub channel_mask_control: u8,
    /// How many times each message should be repeated.
    pub number_of_transmissions: u8,
}

impl Redundancy {
    pub fn from_byte(byte: u8) -> Self {
        Self { channel_mask_control: (byte >> 4) & 0x07, number_of_transmissions: byte & 0x0f }
    }

    pub fn to_byte(&self) -> Result<u8, Error> {
        Ok(check_bits("ChMaskCntl", self.channel_mask_control, 3)? << 4
            | check_bits("NbTrans", self.number_of_transmissions, 4)?)
    }
}

/// Flags of the FCtrl byte. FOptsLen is derived from the FOpts field and not stored here.
///
/// Bit 6 is ADRAckReq on uplink and RFU on downlink. Bit 4 is ClassB on uplink and FPending on
/// downlink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FCtrl {
    pub adr: bool,
    pub adr_ack_req: bool,
    pub ack: bool,
    pub class_b: bool,
    pub f_pending: bool,
}

impl FCtrl {
    /// Splits an FCtrl byte into its flags and FOptsLen.
    pub fn from_byte(byte: u8, direction: Direction) -> (Self, usize) {
        let uplink = direction == Direction::Uplink;
        let fctrl = FCtrl {
            adr: byte & 0x80 != 0,
            adr_ack_req: uplink && byte & 0x40 != 0,
            ack: byte & 0x20 != 0,
            class_b: uplink && byte & 0x10 != 0,
            f_pending: !uplink && byte & 0x10 != 0,
        };
        (fctrl, usize::from(byte & 0x0f))
    }

    pub fn to_byte(&self, direction: Direction, f_opts_len: usize) -> Result<u8, Error> {
        if f_opts_len > 15 {
            return Err(Error::out_of_range("FOptsLen", f_opts_len as u64));
        }
        let (bit6, bit4) = match direction {
            Direction::Uplink => {
                if self.f_pending {
                    return Err(Error::out_of_range("FPending", 1u8));
                }
                (self.adr_ack_req, self.class_b)
            }
            Direction::Downlink => {
                if self.adr_ack_req {
                    return Err(Error::out_of_range("ADRAckReq", 1u8));
                }
                if self.class_b {
                    return Err(Error::out_of_range("ClassB", 1u8));
                }
                (false, self.f_pending)
            }
        };
        Ok((self.adr as u8) << 7
            | (bit6 as u8) << 6
            | (self.ack as u8) << 5
            | (bit4 as u8) << 4
            | f_opts_len as u8)
    }
}

/// Channel frequency list optionally carried at the end of a join-accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CfList {
    /// CFListType 0: five additional channel frequencies.
    Frequencies([Frequency; 5]),
    /// CFListType 1: 96 channel mask bits.
    ChannelMasks(ChannelMask<12>),
}

impl CfList {
    pub const LEN: usize = 16;

    pub fn cf_list_type(&self) -> u8 {
        match self {
            CfList::Frequencies(_) => 0,
            CfList::ChannelMasks(_) => 1,
        }
    }

    /// Parses the 16 CFList bytes. The caller guarantees the length.
    pub fn parse(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() < Self::LEN {
            return Err(Error::TruncatedFrame { expected: Self::LEN, actual: bytes.len() });
        }
        match bytes[15] {
            0 => {
                let mut freqs = [Frequency::default(); 5];
                for (f, chunk) in freqs.iter_mut().zip(bytes[..15].chunks_exact(3)) {
                    *f = Frequency::parse(chunk);
                }
                Ok(CfList::Frequencies(freqs))
            }
            1 => Ok(CfList::ChannelMasks(ChannelMask::new(&bytes[..12])?)),
            t => Err(Error::InvalidCfListType(t)),
        }
    }

    pub fn write_to(&self, out: &mut [u8]) -> Result<(), Error> {
        if out.len() < Self::LEN {
            return Err(Error::BufferTooShort { required: Self::LEN, available: out.len() });
        }
        let out = &mut out[..Self::LEN];
        out.fill(0);
        match self {
            CfList::Frequencies(freqs) => {
                for (f, chunk) in freqs.iter().zip(out[..15].chunks_exact_mut(3)) {
                    f.write_to(chunk)?;
                }
            }
            CfList::ChannelMasks(mask) => out[..12].copy_from_slice(mask.as_ref()),
        }
        out[15] = self.cf_list_type();
        Ok(())
    }
}

/// Device class carried by DeviceModeInd and DeviceModeConf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DeviceClass {
    A,
    C,
    /// Reserved value, kept so that it survives a round trip.
    Rfu(u8),
}

impl DeviceClass {
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            0 => DeviceClass::A,
            2 => DeviceClass::C,
            v => DeviceClass::Rfu(v),
        }
    }

    pub fn to_byte(&self) -> Result<u8, Error> {
        match *self {
            DeviceClass::A => Ok(0),
            DeviceClass::C => Ok(2),
            DeviceClass::Rfu(v) if v == 0 || v == 2 => Err(Error::out_of_range("Class", v)),
            DeviceClass::Rfu(v) => Ok(v),
        }
    }
}

impl Default for DeviceClass {
    fn default() -> Self {
        DeviceClass::A
    }
}

/// Maximum EIRP in dBm for a TxParamSetupReq MaxEIRP index.
pub fn max_eirp_dbm(index: u8) -> u8 {
    const TABLE: [u8; 16] = [8, 10, 12, 13, 14, 16, 18, 20, 21, 24, 26, 27, 29, 30, 33, 36];
    TABLE[usize::from(index & 0x0f)]
}
