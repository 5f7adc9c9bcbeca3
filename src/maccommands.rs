//! MAC command payloads for both directions and the streaming reader over FOpts or an FPort 0
//! FRMPayload.
//!
//! Requests and answers share a CID; which payload shape a CID carries depends on the
//! direction, which is given by the command set being parsed ([`UplinkMacCommand`] or
//! [`DownlinkMacCommand`]).
use crate::bytes::{check_bits, get_uint_le, put_uint_le, sign_extend, to_twos_complement};
use crate::error::Error;
use crate::gps::GpsTime;
use crate::keys::AES128;
use crate::macros::{mac_cmd_acks, mac_cmd_zero_len, mac_cmds, mac_cmds_enum};
use crate::parser::DevAddr;
use crate::types::{
    max_eirp_dbm, rx_delay_seconds, ChannelMask, DataRateRange, DeviceClass, Direction, Frequency,
    Redundancy,
};
use core::marker::PhantomData;

/// A MAC command that can be written after its CID.
pub trait SerializableMacCommand {
    fn cid(&self) -> u8;
    fn payload_len(&self) -> usize;
    /// Writes the payload into `out`, which must be exactly `payload_len()` bytes long.
    fn write_payload(&self, out: &mut [u8]) -> Result<(), Error>;
}

/// One row of a dispatch table: the payload width of a CID in one direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MacCommandSpec {
    pub cid: u8,
    pub len: usize,
    pub name: &'static str,
}

/// Looks up `cid` in a dispatch table.
pub fn lookup(table: &[MacCommandSpec], cid: u8) -> Option<&MacCommandSpec> {
    table.iter().find(|spec| spec.cid == cid)
}

/// The commands of one direction together with their dispatch table.
pub trait MacCommandSet: Sized {
    const DIRECTION: Direction;
    /// Immutable dispatch table of every CID known in this direction.
    const TABLE: &'static [MacCommandSpec];

    /// Builds the command for `cid` from exactly its payload bytes.
    fn parse_payload(cid: u8, payload: &[u8]) -> Option<Self>;
}

mac_cmds_enum! {
    /// Commands sent by the network server.
    pub enum DownlinkMacCommand[direction=Direction::Downlink] {
        // 1.0.0
        LinkCheckAns(LinkCheckAnsPayload)
        LinkADRReq(LinkADRReqPayload)
        DutyCycleReq(DutyCycleReqPayload)
        RXParamSetupReq(RXParamSetupReqPayload)
        DevStatusReq(DevStatusReqPayload)
        NewChannelReq(NewChannelReqPayload)
        RXTimingSetupReq(RXTimingSetupReqPayload)
        // 1.0.2
        TXParamSetupReq(TXParamSetupReqPayload)
        DlChannelReq(DlChannelReqPayload)
        // 1.0.3
        DeviceTimeAns(DeviceTimeAnsPayload)
        PingSlotInfoAns(PingSlotInfoAnsPayload)
        PingSlotChannelReq(PingSlotChannelReqPayload)
        BeaconTimingAns(BeaconTimingAnsPayload)
        BeaconFreqReq(BeaconFreqReqPayload)
        // 1.1
        ResetConf(ResetConfPayload)
        RekeyConf(RekeyConfPayload)
        ADRParamSetupReq(ADRParamSetupReqPayload)
        ForceRejoinReq(ForceRejoinReqPayload)
        RejoinParamSetupReq(RejoinParamSetupReqPayload)
        DeviceModeConf(DeviceModeConfPayload)
        // TS011 relay
        RelayConfReq(RelayConfReqPayload)
        RelayEndDeviceConfReq(RelayEndDeviceConfReqPayload)
        RelayFilterListReq(RelayFilterListReqPayload)
        RelayUpdateUplinkListReq(RelayUpdateUplinkListReqPayload)
        RelayCtrlUplinkListReq(RelayCtrlUplinkListReqPayload)
        RelayConfigureFwdLimitReq(RelayConfigureFwdLimitReqPayload)
    }
}

mac_cmds_enum! {
    /// Commands sent by the end device.
    pub enum UplinkMacCommand[direction=Direction::Uplink] {
        // 1.0.0
        LinkCheckReq(LinkCheckReqPayload)
        LinkADRAns(LinkADRAnsPayload)
        DutyCycleAns(DutyCycleAnsPayload)
        RXParamSetupAns(RXParamSetupAnsPayload)
        DevStatusAns(DevStatusAnsPayload)
        NewChannelAns(NewChannelAnsPayload)
        RXTimingSetupAns(RXTimingSetupAnsPayload)
        // 1.0.2
        TXParamSetupAns(TXParamSetupAnsPayload)
        DlChannelAns(DlChannelAnsPayload)
        // 1.0.3
        DeviceTimeReq(DeviceTimeReqPayload)
        PingSlotInfoReq(PingSlotInfoReqPayload)
        PingSlotChannelAns(PingSlotChannelAnsPayload)
        BeaconTimingReq(BeaconTimingReqPayload)
        BeaconFreqAns(BeaconFreqAnsPayload)
        // 1.1
        ResetInd(ResetIndPayload)
        RekeyInd(RekeyIndPayload)
        ADRParamSetupAns(ADRParamSetupAnsPayload)
        RejoinParamSetupAns(RejoinParamSetupAnsPayload)
        DeviceModeInd(DeviceModeIndPayload)
        // TS011 relay
        RelayConfAns(RelayConfAnsPayload)
        RelayEndDeviceConfAns(RelayEndDeviceConfAnsPayload)
        RelayFilterListAns(RelayFilterListAnsPayload)
        RelayUpdateUplinkListAns(RelayUpdateUplinkListAnsPayload)
        RelayCtrlUplinkListAns(RelayCtrlUplinkListAnsPayload)
        RelayConfigureFwdLimitAns(RelayConfigureFwdLimitAnsPayload)
        RelayNotifyNewEndDeviceReq(RelayNotifyNewEndDeviceReqPayload)
    }
}

impl UplinkMacCommand {
    /// Copy safe to hand to logging. Uplink commands carry no secrets.
    pub fn sanitized(&self) -> Self {
        *self
    }
}

impl DownlinkMacCommand {
    /// Copy with secret-bearing fields cleared, safe to hand to logging.
    pub fn sanitized(&self) -> Self {
        match *self {
            Self::RelayUpdateUplinkListReq(p) => {
                Self::RelayUpdateUplinkListReq(RelayUpdateUplinkListReqPayload {
                    root_wor_s_key: AES128::default(),
                    ..p
                })
            }
            other => other,
        }
    }
}

/// A MAC command of either direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum MacCommand {
    Uplink(UplinkMacCommand),
    Downlink(DownlinkMacCommand),
}

impl MacCommand {
    pub fn direction(&self) -> Direction {
        match self {
            MacCommand::Uplink(_) => Direction::Uplink,
            MacCommand::Downlink(_) => Direction::Downlink,
        }
    }

    /// Copy with secret-bearing fields cleared, safe to hand to logging.
    pub fn sanitized(&self) -> Self {
        match self {
            MacCommand::Uplink(c) => MacCommand::Uplink(c.sanitized()),
            MacCommand::Downlink(c) => MacCommand::Downlink(c.sanitized()),
        }
    }
}

impl SerializableMacCommand for MacCommand {
    fn cid(&self) -> u8 {
        match self {
            MacCommand::Uplink(c) => c.cid(),
            MacCommand::Downlink(c) => c.cid(),
        }
    }

    fn payload_len(&self) -> usize {
        match self {
            MacCommand::Uplink(c) => c.payload_len(),
            MacCommand::Downlink(c) => c.payload_len(),
        }
    }

    fn write_payload(&self, out: &mut [u8]) -> Result<(), Error> {
        match self {
            MacCommand::Uplink(c) => c.write_payload(out),
            MacCommand::Downlink(c) => c.write_payload(out),
        }
    }
}

impl From<UplinkMacCommand> for MacCommand {
    fn from(v: UplinkMacCommand) -> Self {
        MacCommand::Uplink(v)
    }
}

impl From<DownlinkMacCommand> for MacCommand {
    fn from(v: DownlinkMacCommand) -> Self {
        MacCommand::Downlink(v)
    }
}

mac_cmd_zero_len! {
    /// LinkCheckReqPayload represents the LinkCheckReq LoRaWAN MACCommand.
    struct LinkCheckReqPayload[cmd=LinkCheckReq, cid=0x02, uplink=true]

    /// DutyCycleAnsPayload represents the DutyCycleAns LoRaWAN MACCommand.
    struct DutyCycleAnsPayload[cmd=DutyCycleAns, cid=0x04, uplink=true]

    /// DevStatusReqPayload represents the DevStatusReq LoRaWAN MACCommand.
    struct DevStatusReqPayload[cmd=DevStatusReq, cid=0x06, uplink=false]

    /// RXTimingSetupAnsPayload represents the RXTimingSetupAns LoRaWAN MACCommand.
    struct RXTimingSetupAnsPayload[cmd=RXTimingSetupAns, cid=0x08, uplink=true]

    /// TXParamSetupAnsPayload represents the TXParamSetupAns LoRaWAN MACCommand.
    struct TXParamSetupAnsPayload[cmd=TXParamSetupAns, cid=0x09, uplink=true]

    /// ADRParamSetupAnsPayload represents the ADRParamSetupAns LoRaWAN MACCommand.
    struct ADRParamSetupAnsPayload[cmd=ADRParamSetupAns, cid=0x0C, uplink=true]

    /// DeviceTimeReqPayload represents the DeviceTimeReq LoRaWAN MACCommand.
    struct DeviceTimeReqPayload[cmd=DeviceTimeReq, cid=0x0D, uplink=true]

    /// PingSlotInfoAnsPayload represents the PingSlotInfoAns LoRaWAN MACCommand.
    struct PingSlotInfoAnsPayload[cmd=PingSlotInfoAns, cid=0x10, uplink=false]

    /// BeaconTimingReqPayload represents the deprecated BeaconTimingReq LoRaWAN MACCommand.
    struct BeaconTimingReqPayload[cmd=BeaconTimingReq, cid=0x12, uplink=true]

    /// RelayUpdateUplinkListAnsPayload represents the RelayUpdateUplinkListAns MACCommand.
    struct RelayUpdateUplinkListAnsPayload[cmd=RelayUpdateUplinkListAns, cid=0x43, uplink=true]

    /// RelayConfigureFwdLimitAnsPayload represents the RelayConfigureFwdLimitAns MACCommand.
    struct RelayConfigureFwdLimitAnsPayload[cmd=RelayConfigureFwdLimitAns, cid=0x45, uplink=true]
}

mac_cmd_acks! {
    /// LinkADRAnsPayload represents the LinkADRAns LoRaWAN MACCommand.
    struct LinkADRAnsPayload[cmd=LinkADRAns, cid=0x03, uplink=true] {
        /// Whether the channel mask change was applied successsfully.
        channel_mask_ack = bit 0,
        /// Whether the data rate change was applied successsfully.
        data_rate_ack = bit 1,
        /// Whether the power change was applied successsfully.
        tx_power_ack = bit 2,
    }

    /// RXParamSetupAnsPayload represents the RXParamSetupAns LoRaWAN MACCommand.
    struct RXParamSetupAnsPayload[cmd=RXParamSetupAns, cid=0x05, uplink=true] {
        /// Whether the RX2 channel frequency is usable.
        channel_ack = bit 0,
        /// Whether the rx2 data rate change was applied successsfully.
        rx2_data_rate_ack = bit 1,
        /// Whether the rx1 data rate offset change was applied successsfully.
        rx1_dr_offset_ack = bit 2,
    }

    /// NewChannelAnsPayload represents the NewChannelAns LoRaWAN MACCommand.
    struct NewChannelAnsPayload[cmd=NewChannelAns, cid=0x07, uplink=true] {
        /// Whether the channel frequency change was applied successsfully.
        channel_freq_ack = bit 0,
        /// Whether the data rate range change was applied successsfully.
        data_rate_range_ack = bit 1,
    }

    /// DlChannelAnsPayload represents the DlChannelAns LoRaWAN MACCommand.
    struct DlChannelAnsPayload[cmd=DlChannelAns, cid=0x0A, uplink=true] {
        /// Channel frequency ok.
        channel_freq_ack = bit 0,
        /// Uplink frequency exists.
        uplink_freq_exists_ack = bit 1,
    }

    /// RejoinParamSetupAnsPayload represents the RejoinParamSetupAns LoRaWAN MACCommand.
    struct RejoinParamSetupAnsPayload[cmd=RejoinParamSetupAns, cid=0x0F, uplink=true] {
        max_time_exp_ack = bit 0,
    }

    /// PingSlotChannelAnsPayload represents the PingSlotChannelAns LoRaWAN MACCommand.
    struct PingSlotChannelAnsPayload[cmd=PingSlotChannelAns, cid=0x11, uplink=true] {
        frequency_ack = bit 0,
        data_rate_ack = bit 1,
    }

    /// BeaconFreqAnsPayload represents the BeaconFreqAns LoRaWAN MACCommand.
    struct BeaconFreqAnsPayload[cmd=BeaconFreqAns, cid=0x13, uplink=true] {
        beacon_frequency_ack = bit 0,
    }

    /// RelayConfAnsPayload represents the RelayConfAns relay MACCommand.
    struct RelayConfAnsPayload[cmd=RelayConfAns, cid=0x40, uplink=true] {
        second_ch_ack_offset_ack = bit 0,
        second_ch_dr_ack = bit 1,
        second_ch_idx_ack = bit 2,
        default_ch_idx_ack = bit 3,
        cad_periodicity_ack = bit 4,
    }

    /// RelayEndDeviceConfAnsPayload represents the RelayEndDeviceConfAns relay MACCommand.
    struct RelayEndDeviceConfAnsPayload[cmd=RelayEndDeviceConfAns, cid=0x41, uplink=true] {
        second_ch_ack_offset_ack = bit 0,
        second_ch_dr_ack = bit 1,
        second_ch_idx_ack = bit 2,
        backoff_ack = bit 3,
    }

    /// RelayFilterListAnsPayload represents the RelayFilterListAns relay MACCommand.
    struct RelayFilterListAnsPayload[cmd=RelayFilterListAns, cid=0x42, uplink=true] {
        index_ack = bit 0,
        action_ack = bit 1,
        combined_rules_ack = bit 2,
    }
}

mac_cmds! {
    /// ResetIndPayload represents the ResetInd LoRaWAN MACCommand.
    struct ResetIndPayload[cmd=ResetInd, cid=0x01, uplink=true, size=1] {
        /// LoRaWAN 1.x minor version of the device.
        minor_version: u8,
    }

    /// ResetConfPayload represents the ResetConf LoRaWAN MACCommand.
    struct ResetConfPayload[cmd=ResetConf, cid=0x01, uplink=false, size=1] {
        minor_version: u8,
    }

    /// LinkCheckAnsPayload represents the LinkCheckAns LoRaWAN MACCommand.
    struct LinkCheckAnsPayload[cmd=LinkCheckAns, cid=0x02, uplink=false, size=2] {
        /// The link margin in dB of the last successfully received LinkCheckReq command.
        margin: u8,
        /// The number of gateways that successfully received the last LinkCheckReq command.
        gateway_count: u8,
    }

    /// LinkADRReqPayload represents the LinkADRReq LoRaWAN MACCommand.
    struct LinkADRReqPayload[cmd=LinkADRReq, cid=0x03, uplink=false, size=4] {
        /// Data Rate that the device should use for its next transmissions.
        data_rate: u8,
        /// TX Power that the device should use for its next transmissions.
        tx_power: u8,
        /// Usable channels for next transmissions.
        channel_mask: ChannelMask<2>,
        redundancy: Redundancy,
    }

    /// DutyCycleReqPayload represents the DutyCycleReq LoRaWAN MACCommand.
    struct DutyCycleReqPayload[cmd=DutyCycleReq, cid=0x04, uplink=false, size=1] {
        /// Aggregated duty cycle is 1 / 2^max_duty_cycle.
        max_duty_cycle: u8,
    }

    /// RXParamSetupReqPayload represents the RXParamSetupReq LoRaWAN MACCommand.
    struct RXParamSetupReqPayload[cmd=RXParamSetupReq, cid=0x05, uplink=false, size=4] {
        rx1_dr_offset: u8,
        rx2_data_rate: u8,
        /// RX2 frequency.
        frequency: Frequency,
    }

    /// DevStatusAnsPayload represents the DevStatusAns LoRaWAN MACCommand.
    struct DevStatusAnsPayload[cmd=DevStatusAns, cid=0x06, uplink=true, size=2] {
        /// 0 means external power, 255 means the device could not measure, anything else is
        /// the battery level.
        battery: u8,
        /// Demodulation SNR in dB of the last DevStatusReq, -32..=31.
        margin: i8,
    }

    /// NewChannelReqPayload represents the NewChannelReq LoRaWAN MACCommand.
    struct NewChannelReqPayload[cmd=NewChannelReq, cid=0x07, uplink=false, size=5] {
        /// The index of the channel being created or modified.
        channel_index: u8,
        /// The frequency of the new or modified channel; zero disables the channel.
        frequency: Frequency,
        /// The data rate range specifies allowed data rates for the new or modified channel.
        data_rate_range: DataRateRange,
    }

    /// RXTimingSetupReqPayload represents the RXTimingSetupReq LoRaWAN MACCommand.
    struct RXTimingSetupReqPayload[cmd=RXTimingSetupReq, cid=0x08, uplink=false, size=1] {
        /// Delay before the first RX window, 0 meaning 1 s.
        delay: u8,
    }

    /// TXParamSetupReqPayload represents the TXParamSetupReq LoRaWAN MACCommand.
    struct TXParamSetupReqPayload[cmd=TXParamSetupReq, cid=0x09, uplink=false, size=1] {
        downlink_dwell_time: bool,
        uplink_dwell_time: bool,
        /// Index into the MaxEIRP table.
        max_eirp: u8,
    }

    /// DlChannelReqPayload represents the DlChannelReq LoRaWAN MACCommand.
    struct DlChannelReqPayload[cmd=DlChannelReq, cid=0x0A, uplink=false, size=4] {
        channel_index: u8,
        frequency: Frequency,
    }

    /// RekeyIndPayload represents the RekeyInd LoRaWAN MACCommand.
    struct RekeyIndPayload[cmd=RekeyInd, cid=0x0B, uplink=true, size=1] {
        minor_version: u8,
    }

    /// RekeyConfPayload represents the RekeyConf LoRaWAN MACCommand.
    struct RekeyConfPayload[cmd=RekeyConf, cid=0x0B, uplink=false, size=1] {
        minor_version: u8,
    }

    /// ADRParamSetupReqPayload represents the ADRParamSetupReq LoRaWAN MACCommand.
    struct ADRParamSetupReqPayload[cmd=ADRParamSetupReq, cid=0x0C, uplink=false, size=1] {
        limit_exp: u8,
        delay_exp: u8,
    }

    /// DeviceTimeAnsPayload represents the DeviceTimeAns LoRaWAN MACCommand.
    struct DeviceTimeAnsPayload[cmd=DeviceTimeAns, cid=0x0D, uplink=false, size=5] {
        /// Seconds since the GPS epoch.
        seconds: u32,
        /// Units of 2^-8 seconds.
        fractional: u8,
    }

    /// ForceRejoinReqPayload represents the ForceRejoinReq LoRaWAN MACCommand.
    struct ForceRejoinReqPayload[cmd=ForceRejoinReq, cid=0x0E, uplink=false, size=2] {
        period_exp: u8,
        max_retries: u8,
        rejoin_type: u8,
        data_rate: u8,
    }

    /// RejoinParamSetupReqPayload represents the RejoinParamSetupReq LoRaWAN MACCommand.
    struct RejoinParamSetupReqPayload[cmd=RejoinParamSetupReq, cid=0x0F, uplink=false, size=1] {
        max_time_exp: u8,
        max_count_exp: u8,
    }

    /// PingSlotInfoReqPayload represents the PingSlotInfoReq LoRaWAN MACCommand.
    struct PingSlotInfoReqPayload[cmd=PingSlotInfoReq, cid=0x10, uplink=true, size=1] {
        /// Ping slots open every 2^periodicity seconds.
        periodicity: u8,
    }

    /// PingSlotChannelReqPayload represents the PingSlotChannelReq LoRaWAN MACCommand.
    struct PingSlotChannelReqPayload[cmd=PingSlotChannelReq, cid=0x11, uplink=false, size=4] {
        frequency: Frequency,
        data_rate: u8,
    }

    /// BeaconTimingAnsPayload represents the deprecated BeaconTimingAns LoRaWAN MACCommand.
    struct BeaconTimingAnsPayload[cmd=BeaconTimingAns, cid=0x12, uplink=false, size=3] {
        delay: u16,
        channel: u8,
    }

    /// BeaconFreqReqPayload represents the BeaconFreqReq LoRaWAN MACCommand.
    struct BeaconFreqReqPayload[cmd=BeaconFreqReq, cid=0x13, uplink=false, size=3] {
        frequency: Frequency,
    }

    /// DeviceModeIndPayload represents the DeviceModeInd LoRaWAN MACCommand.
    struct DeviceModeIndPayload[cmd=DeviceModeInd, cid=0x20, uplink=true, size=1] {
        class: DeviceClass,
    }

    /// DeviceModeConfPayload represents the DeviceModeConf LoRaWAN MACCommand.
    struct DeviceModeConfPayload[cmd=DeviceModeConf, cid=0x20, uplink=false, size=1] {
        class: DeviceClass,
    }

    /// RelayConfReqPayload represents the RelayConfReq relay MACCommand.
    struct RelayConfReqPayload[cmd=RelayConfReq, cid=0x40, uplink=false, size=5] {
        start_stop: bool,
        cad_periodicity: u8,
        default_ch_idx: u8,
        second_ch_idx: u8,
        second_ch_dr: u8,
        second_ch_ack_offset: u8,
        second_ch_freq: Frequency,
    }

    /// RelayEndDeviceConfReqPayload represents the RelayEndDeviceConfReq relay MACCommand.
    struct RelayEndDeviceConfReqPayload[cmd=RelayEndDeviceConfReq, cid=0x41, uplink=false, size=6] {
        mode: u8,
        smart_enable_level: u8,
        backoff: u8,
        second_ch_idx: u8,
        second_ch_dr: u8,
        second_ch_ack_offset: u8,
        second_ch_freq: Frequency,
    }

    /// RelayFilterListReqPayload represents the RelayFilterListReq relay MACCommand.
    struct RelayFilterListReqPayload[cmd=RelayFilterListReq, cid=0x42, uplink=false, size=17] {
        action: u8,
        index: u8,
        /// Raw JoinEUI || DevEUI bytes matched by the rule.
        match_bytes: [u8; 16],
    }

    /// RelayUpdateUplinkListReqPayload represents the RelayUpdateUplinkListReq relay MACCommand.
    ///
    /// `root_wor_s_key` is a long-term secret; log only [`DownlinkMacCommand::sanitized`] copies.
    struct RelayUpdateUplinkListReqPayload[cmd=RelayUpdateUplinkListReq, cid=0x43, uplink=false, size=26] {
        uplink_list_idx: u8,
        bucket_size: u8,
        reload_rate: u8,
        dev_addr: DevAddr,
        w_f_cnt: u32,
        root_wor_s_key: AES128,
    }

    /// RelayCtrlUplinkListReqPayload represents the RelayCtrlUplinkListReq relay MACCommand.
    struct RelayCtrlUplinkListReqPayload[cmd=RelayCtrlUplinkListReq, cid=0x44, uplink=false, size=1] {
        /// 0 reads the WOR frame counter, 1 removes the entry.
        action: u8,
        uplink_list_idx: u8,
    }

    /// RelayCtrlUplinkListAnsPayload represents the RelayCtrlUplinkListAns relay MACCommand.
    struct RelayCtrlUplinkListAnsPayload[cmd=RelayCtrlUplinkListAns, cid=0x44, uplink=true, size=5] {
        uplink_list_idx_ack: bool,
        w_f_cnt: u32,
    }

    /// RelayConfigureFwdLimitReqPayload represents the RelayConfigureFwdLimitReq relay MACCommand.
    struct RelayConfigureFwdLimitReqPayload[cmd=RelayConfigureFwdLimitReq, cid=0x45, uplink=false, size=5] {
        reset_limit_counter: u8,
        join_req_reload_rate: u8,
        notify_reload_rate: u8,
        global_uplink_reload_rate: u8,
        overall_reload_rate: u8,
        join_req_bucket_size: u8,
        notify_bucket_size: u8,
        global_uplink_bucket_size: u8,
        overall_bucket_size: u8,
    }

    /// RelayNotifyNewEndDeviceReqPayload represents the RelayNotifyNewEndDeviceReq relay
    /// MACCommand.
    struct RelayNotifyNewEndDeviceReqPayload[cmd=RelayNotifyNewEndDeviceReq, cid=0x46, uplink=true, size=6] {
        dev_addr: DevAddr,
        /// RSSI of the forwarded join-request, -127..=0 dBm.
        rssi: i8,
        /// SNR of the forwarded join-request, -20..=11 dB.
        snr: i8,
    }
}

impl ResetIndPayload {
    pub fn parse(data: &[u8; 1]) -> Self {
        Self { minor_version: data[0] & 0x0f }
    }

    pub fn write_to(&self, out: &mut [u8; 1]) -> Result<(), Error> {
        out[0] = check_bits("MinorVersion", self.minor_version, 4)?;
        Ok(())
    }
}

impl ResetConfPayload {
    pub fn parse(data: &[u8; 1]) -> Self {
        Self { minor_version: data[0] & 0x0f }
    }

    pub fn write_to(&self, out: &mut [u8; 1]) -> Result<(), Error> {
        out[0] = check_bits("MinorVersion", self.minor_version, 4)?;
        Ok(())
    }
}

impl LinkCheckAnsPayload {
    pub fn parse(data: &[u8; 2]) -> Self {
        Self { margin: data[0], gateway_count: data[1] }
    }

    pub fn write_to(&self, out: &mut [u8; 2]) -> Result<(), Error> {
        *out = [self.margin, self.gateway_count];
        Ok(())
    }
}

impl LinkADRReqPayload {
    pub fn parse(data: &[u8; 4]) -> Self {
        Self {
            data_rate: data[0] >> 4,
            tx_power: data[0] & 0x0f,
            channel_mask: ChannelMask::from([data[1], data[2]]),
            redundancy: Redundancy::from_byte(data[3]),
        }
    }

    pub fn write_to(&self, out: &mut [u8; 4]) -> Result<(), Error> {
        out[0] = check_bits("DataRate", self.data_rate, 4)? << 4
            | check_bits("TXPower", self.tx_power, 4)?;
        out[1..3].copy_from_slice(self.channel_mask.as_ref());
        out[3] = self.redundancy.to_byte()?;
        Ok(())
    }
}

impl DutyCycleReqPayload {
    pub fn parse(data: &[u8; 1]) -> Self {
        Self { max_duty_cycle: data[0] & 0x0f }
    }

    pub fn write_to(&self, out: &mut [u8; 1]) -> Result<(), Error> {
        out[0] = check_bits("MaxDutyCycle", self.max_duty_cycle, 4)?;
        Ok(())
    }

    /// Value of the max duty cycle field as portion of time (ex: 0.5).
    pub fn max_duty_cycle_fraction(&self) -> f32 {
        let divisor = 1u32 << (self.max_duty_cycle & 0x0f);
        1.0 / (divisor as f32)
    }
}

impl RXParamSetupReqPayload {
    pub fn parse(data: &[u8; 4]) -> Self {
        Self {
            rx1_dr_offset: (data[0] >> 4) & 0x07,
            rx2_data_rate: data[0] & 0x0f,
            frequency: Frequency::parse(&data[1..]),
        }
    }

    pub fn write_to(&self, out: &mut [u8; 4]) -> Result<(), Error> {
        out[0] = check_bits("Rx1DROffset", self.rx1_dr_offset, 3)? << 4
            | check_bits("Rx2DR", self.rx2_data_rate, 4)?;
        self.frequency.write_to(&mut out[1..])
    }
}

impl DevStatusAnsPayload {
    pub fn parse(data: &[u8; 2]) -> Self {
        Self { battery: data[0], margin: sign_extend(data[1], 6) }
    }

    pub fn write_to(&self, out: &mut [u8; 2]) -> Result<(), Error> {
        *out = [self.battery, to_twos_complement(self.margin, 6, "Margin")?];
        Ok(())
    }
}

impl NewChannelReqPayload {
    pub fn parse(data: &[u8; 5]) -> Self {
        Self {
            channel_index: data[0],
            frequency: Frequency::parse(&data[1..4]),
            data_rate_range: DataRateRange::from_byte(data[4]),
        }
    }

    pub fn write_to(&self, out: &mut [u8; 5]) -> Result<(), Error> {
        out[0] = self.channel_index;
        self.frequency.write_to(&mut out[1..4])?;
        out[4] = self.data_rate_range.to_byte()?;
        Ok(())
    }
}

impl RXTimingSetupReqPayload {
    pub fn parse(data: &[u8; 1]) -> Self {
        Self { delay: data[0] & 0x0f }
    }

    pub fn write_to(&self, out: &mut [u8; 1]) -> Result<(), Error> {
        out[0] = check_bits("Delay", self.delay, 4)?;
        Ok(())
    }

    /// Delay before the first RX window in seconds.
    pub fn delay_seconds(&self) -> u8 {
        rx_delay_seconds(self.delay)
    }
}

impl TXParamSetupReqPayload {
    pub fn parse(data: &[u8; 1]) -> Self {
        Self {
            downlink_dwell_time: data[0] & (1 << 5) != 0,
            uplink_dwell_time: data[0] & (1 << 4) != 0,
            max_eirp: data[0] & 0x0f,
        }
    }

    pub fn write_to(&self, out: &mut [u8; 1]) -> Result<(), Error> {
        out[0] = (self.downlink_dwell_time as u8) << 5
            | (self.uplink_dwell_time as u8) << 4
            | check_bits("MaxEIRP", self.max_eirp, 4)?;
        Ok(())
    }

    /// Maximum EIRP in dBm.
    pub fn max_eirp_dbm(&self) -> u8 {
        max_eirp_dbm(self.max_eirp)
    }
}

impl DlChannelReqPayload {
    pub fn parse(data: &[u8; 4]) -> Self {
        Self { channel_index: data[0], frequency: Frequency::parse(&data[1..]) }
    }

    pub fn write_to(&self, out: &mut [u8; 4]) -> Result<(), Error> {
        out[0] = self.channel_index;
        self.frequency.write_to(&mut out[1..])
    }
}

impl RekeyIndPayload {
    pub fn parse(data: &[u8; 1]) -> Self {
        Self { minor_version: data[0] & 0x0f }
    }

    pub fn write_to(&self, out: &mut [u8; 1]) -> Result<(), Error> {
        out[0] = check_bits("MinorVersion", self.minor_version, 4)?;
        Ok(())
    }
}

impl RekeyConfPayload {
    pub fn parse(data: &[u8; 1]) -> Self {
        Self { minor_version: data[0] & 0x0f }
    }

    pub fn write_to(&self, out: &mut [u8; 1]) -> Result<(), Error> {
        out[0] = check_bits("MinorVersion", self.minor_version, 4)?;
        Ok(())
    }
}

impl ADRParamSetupReqPayload {
    pub fn parse(data: &[u8; 1]) -> Self {
        Self { limit_exp: data[0] >> 4, delay_exp: data[0] & 0x0f }
    }

    pub fn write_to(&self, out: &mut [u8; 1]) -> Result<(), Error> {
        out[0] = check_bits("LimitExp", self.limit_exp, 4)? << 4
            | check_bits("DelayExp", self.delay_exp, 4)?;
        Ok(())
    }
}

impl DeviceTimeAnsPayload {
    pub fn parse(data: &[u8; 5]) -> Self {
        Self { seconds: get_uint_le(&data[..4], 4) as u32, fractional: data[4] }
    }

    pub fn write_to(&self, out: &mut [u8; 5]) -> Result<(), Error> {
        put_uint_le(&mut out[..4], u64::from(self.seconds), 4)?;
        out[4] = self.fractional;
        Ok(())
    }

    pub fn gps_time(&self) -> GpsTime {
        GpsTime::new(self.seconds, self.fractional)
    }

    /// Fractional part in nanoseconds.
    pub fn nano_seconds(&self) -> u32 {
        u32::from(self.fractional) * 3_906_250
    }
}

impl From<GpsTime> for DeviceTimeAnsPayload {
    fn from(t: GpsTime) -> Self {
        Self { seconds: t.seconds, fractional: t.fractional }
    }
}

impl ForceRejoinReqPayload {
    pub fn parse(data: &[u8; 2]) -> Self {
        Self {
            period_exp: (data[0] >> 3) & 0x07,
            max_retries: data[0] & 0x07,
            rejoin_type: data[1] >> 4,
            data_rate: data[1] & 0x0f,
        }
    }

    pub fn write_to(&self, out: &mut [u8; 2]) -> Result<(), Error> {
        out[0] = check_bits("Period", self.period_exp, 3)? << 3
            | check_bits("MaxRetries", self.max_retries, 3)?;
        out[1] = check_bits("RejoinType", self.rejoin_type, 4)? << 4
            | check_bits("DR", self.data_rate, 4)?;
        Ok(())
    }
}

impl RejoinParamSetupReqPayload {
    pub fn parse(data: &[u8; 1]) -> Self {
        Self { max_time_exp: data[0] >> 4, max_count_exp: data[0] & 0x0f }
    }

    pub fn write_to(&self, out: &mut [u8; 1]) -> Result<(), Error> {
        out[0] = check_bits("MaxTimeN", self.max_time_exp, 4)? << 4
            | check_bits("MaxCountN", self.max_count_exp, 4)?;
        Ok(())
    }
}

impl PingSlotInfoReqPayload {
    pub fn parse(data: &[u8; 1]) -> Self {
        Self { periodicity: data[0] & 0x07 }
    }

    pub fn write_to(&self, out: &mut [u8; 1]) -> Result<(), Error> {
        out[0] = check_bits("Periodicity", self.periodicity, 3)?;
        Ok(())
    }
}

impl PingSlotChannelReqPayload {
    pub fn parse(data: &[u8; 4]) -> Self {
        Self { frequency: Frequency::parse(&data[..3]), data_rate: data[3] & 0x0f }
    }

    pub fn write_to(&self, out: &mut [u8; 4]) -> Result<(), Error> {
        self.frequency.write_to(&mut out[..3])?;
        out[3] = check_bits("DR", self.data_rate, 4)?;
        Ok(())
    }
}

impl BeaconTimingAnsPayload {
    pub fn parse(data: &[u8; 3]) -> Self {
        Self { delay: get_uint_le(&data[..2], 2) as u16, channel: data[2] }
    }

    pub fn write_to(&self, out: &mut [u8; 3]) -> Result<(), Error> {
        put_uint_le(&mut out[..2], u64::from(self.delay), 2)?;
        out[2] = self.channel;
        Ok(())
    }
}

impl BeaconFreqReqPayload {
    pub fn parse(data: &[u8; 3]) -> Self {
        Self { frequency: Frequency::parse(data) }
    }

    pub fn write_to(&self, out: &mut [u8; 3]) -> Result<(), Error> {
        self.frequency.write_to(out)
    }
}

impl DeviceModeIndPayload {
    pub fn parse(data: &[u8; 1]) -> Self {
        Self { class: DeviceClass::from_byte(data[0]) }
    }

    pub fn write_to(&self, out: &mut [u8; 1]) -> Result<(), Error> {
        out[0] = self.class.to_byte()?;
        Ok(())
    }
}

impl DeviceModeConfPayload {
    pub fn parse(data: &[u8; 1]) -> Self {
        Self { class: DeviceClass::from_byte(data[0]) }
    }

    pub fn write_to(&self, out: &mut [u8; 1]) -> Result<(), Error> {
        out[0] = self.class.to_byte()?;
        Ok(())
    }
}

impl RelayConfReqPayload {
    pub fn parse(data: &[u8; 5]) -> Self {
        let settings = get_uint_le(&data[..2], 2) as u16;
        Self {
            start_stop: settings & (1 << 13) != 0,
            cad_periodicity: ((settings >> 10) & 0x07) as u8,
            default_ch_idx: ((settings >> 9) & 0x01) as u8,
            second_ch_idx: ((settings >> 7) & 0x01) as u8,
            second_ch_dr: ((settings >> 3) & 0x0f) as u8,
            second_ch_ack_offset: (settings & 0x07) as u8,
            second_ch_freq: Frequency::parse(&data[2..]),
        }
    }

    pub fn write_to(&self, out: &mut [u8; 5]) -> Result<(), Error> {
        let settings = u16::from(self.start_stop) << 13
            | u16::from(check_bits("CADPeriodicity", self.cad_periodicity, 3)?) << 10
            | u16::from(check_bits("DefaultChIdx", self.default_ch_idx, 1)?) << 9
            | u16::from(check_bits("SecondChIdx", self.second_ch_idx, 1)?) << 7
            | u16::from(check_bits("SecondChDR", self.second_ch_dr, 4)?) << 3
            | u16::from(check_bits("SecondChAckOffset", self.second_ch_ack_offset, 3)?);
        put_uint_le(&mut out[..2], u64::from(settings), 2)?;
        self.second_ch_freq.write_to(&mut out[2..])
    }
}

impl RelayEndDeviceConfReqPayload {
    pub fn parse(data: &[u8; 6]) -> Self {
        let settings = get_uint_le(&data[1..3], 2) as u16;
        Self {
            mode: (data[0] >> 2) & 0x03,
            smart_enable_level: data[0] & 0x03,
            backoff: ((settings >> 8) & 0x3f) as u8,
            second_ch_idx: ((settings >> 7) & 0x01) as u8,
            second_ch_dr: ((settings >> 3) & 0x0f) as u8,
            second_ch_ack_offset: (settings & 0x07) as u8,
            second_ch_freq: Frequency::parse(&data[3..]),
        }
    }

    pub fn write_to(&self, out: &mut [u8; 6]) -> Result<(), Error> {
        out[0] = check_bits("Mode", self.mode, 2)? << 2
            | check_bits("SmartEnableLevel", self.smart_enable_level, 2)?;
        let settings = u16::from(check_bits("Backoff", self.backoff, 6)?) << 8
            | u16::from(check_bits("SecondChIdx", self.second_ch_idx, 1)?) << 7
            | u16::from(check_bits("SecondChDR", self.second_ch_dr, 4)?) << 3
            | u16::from(check_bits("SecondChAckOffset", self.second_ch_ack_offset, 3)?);
        put_uint_le(&mut out[1..3], u64::from(settings), 2)?;
        self.second_ch_freq.write_to(&mut out[3..])
    }
}

impl RelayFilterListReqPayload {
    pub fn parse(data: &[u8; 17]) -> Self {
        let mut match_bytes = [0; 16];
        match_bytes.copy_from_slice(&data[1..]);
        Self { action: (data[0] >> 5) & 0x03, index: data[0] & 0x1f, match_bytes }
    }

    pub fn write_to(&self, out: &mut [u8; 17]) -> Result<(), Error> {
        out[0] = check_bits("Action", self.action, 2)? << 5 | check_bits("Index", self.index, 5)?;
        out[1..].copy_from_slice(&self.match_bytes);
        Ok(())
    }
}

impl RelayUpdateUplinkListReqPayload {
    pub fn parse(data: &[u8; 26]) -> Self {
        let mut key = [0; 16];
        key.copy_from_slice(&data[10..]);
        Self {
            uplink_list_idx: data[0] & 0x0f,
            bucket_size: data[1] >> 6,
            reload_rate: data[1] & 0x3f,
            dev_addr: DevAddr::from([data[2], data[3], data[4], data[5]]),
            w_f_cnt: get_uint_le(&data[6..10], 4) as u32,
            root_wor_s_key: AES128(key),
        }
    }

    pub fn write_to(&self, out: &mut [u8; 26]) -> Result<(), Error> {
        out[0] = check_bits("UplinkListIdx", self.uplink_list_idx, 4)?;
        out[1] = check_bits("BucketSize", self.bucket_size, 2)? << 6
            | check_bits("ReloadRate", self.reload_rate, 6)?;
        out[2..6].copy_from_slice(self.dev_addr.as_ref());
        put_uint_le(&mut out[6..10], u64::from(self.w_f_cnt), 4)?;
        out[10..].copy_from_slice(&self.root_wor_s_key.0);
        Ok(())
    }
}

impl RelayCtrlUplinkListReqPayload {
    pub fn parse(data: &[u8; 1]) -> Self {
        Self { action: (data[0] >> 4) & 0x01, uplink_list_idx: data[0] & 0x0f }
    }

    pub fn write_to(&self, out: &mut [u8; 1]) -> Result<(), Error> {
        out[0] = check_bits("Action", self.action, 1)? << 4
            | check_bits("UplinkListIdx", self.uplink_list_idx, 4)?;
        Ok(())
    }
}

impl RelayCtrlUplinkListAnsPayload {
    pub fn parse(data: &[u8; 5]) -> Self {
        Self { uplink_list_idx_ack: data[0] & 0x01 != 0, w_f_cnt: get_uint_le(&data[1..], 4) as u32 }
    }

    pub fn write_to(&self, out: &mut [u8; 5]) -> Result<(), Error> {
        out[0] = self.uplink_list_idx_ack as u8;
        put_uint_le(&mut out[1..], u64::from(self.w_f_cnt), 4)
    }
}

impl RelayConfigureFwdLimitReqPayload {
    pub fn parse(data: &[u8; 5]) -> Self {
        let rates = get_uint_le(&data[..4], 4) as u32;
        let capacity = data[4];
        Self {
            reset_limit_counter: ((rates >> 28) & 0x03) as u8,
            join_req_reload_rate: ((rates >> 21) & 0x7f) as u8,
            notify_reload_rate: ((rates >> 14) & 0x7f) as u8,
            global_uplink_reload_rate: ((rates >> 7) & 0x7f) as u8,
            overall_reload_rate: (rates & 0x7f) as u8,
            join_req_bucket_size: capacity >> 6,
            notify_bucket_size: (capacity >> 4) & 0x03,
            global_uplink_bucket_size: (capacity >> 2) & 0x03,
            overall_bucket_size: capacity & 0x03,
        }
    }

    pub fn write_to(&self, out: &mut [u8; 5]) -> Result<(), Error> {
        let rates = u32::from(check_bits("ResetLimitCounter", self.reset_limit_counter, 2)?) << 28
            | u32::from(check_bits("JoinReqReloadRate", self.join_req_reload_rate, 7)?) << 21
            | u32::from(check_bits("NotifyReloadRate", self.notify_reload_rate, 7)?) << 14
            | u32::from(check_bits("GlobalUplinkReloadRate", self.global_uplink_reload_rate, 7)?)
                << 7
            | u32::from(check_bits("OverallReloadRate", self.overall_reload_rate, 7)?);
        put_uint_le(&mut out[..4], u64::from(rates), 4)?;
        out[4] = check_bits("JoinReqBucketSize", self.join_req_bucket_size, 2)? << 6
            | check_bits("NotifyBucketSize", self.notify_bucket_size, 2)? << 4
            | check_bits("GlobalUplinkBucketSize", self.global_uplink_bucket_size, 2)? << 2
            | check_bits("OverallBucketSize", self.overall_bucket_size, 2)?;
        Ok(())
    }
}

impl RelayNotifyNewEndDeviceReqPayload {
    const SNR_OFFSET: i8 = 20;

    pub fn parse(data: &[u8; 6]) -> Self {
        let power = get_uint_le(&data[4..], 2) as u16;
        Self {
            dev_addr: DevAddr::from([data[0], data[1], data[2], data[3]]),
            rssi: -(((power >> 5) & 0x7f) as i8),
            snr: (power & 0x1f) as i8 - Self::SNR_OFFSET,
        }
    }

    pub fn write_to(&self, out: &mut [u8; 6]) -> Result<(), Error> {
        if !(-127..=0).contains(&self.rssi) {
            return Err(Error::out_of_range("RSSI", self.rssi as u8));
        }
        if !(-20..=11).contains(&self.snr) {
            return Err(Error::out_of_range("SNR", self.snr as u8));
        }
        let power = (u16::from(self.rssi.unsigned_abs()) << 5)
            | (self.snr + Self::SNR_OFFSET) as u16;
        out[..4].copy_from_slice(self.dev_addr.as_ref());
        put_uint_le(&mut out[4..], u64::from(power), 2)
    }
}

/// Parses bytes to uplink MAC commands.
///
/// The iterator yields an error and stops at the first unknown CID or truncated payload.
///
/// # Examples
///
/// ```
/// use lorawan_codec::maccommands::*;
///
/// let data = [0x02, 0x03, 0x07];
/// let cmds: Vec<_> = parse_uplink_mac_commands(&data).collect::<Result<_, _>>().unwrap();
/// assert_eq!(cmds.len(), 2);
/// ```
pub fn parse_uplink_mac_commands(data: &[u8]) -> MacCommandIterator<'_, UplinkMacCommand> {
    MacCommandIterator::new(data)
}

/// Parses bytes to downlink MAC commands.
///
/// The iterator yields an error and stops at the first unknown CID or truncated payload.
///
/// # Examples
///
/// ```
/// use lorawan_codec::maccommands::*;
///
/// let data = [0x02, 0x03, 0x00];
/// let cmds: Vec<_> = parse_downlink_mac_commands(&data).collect::<Result<_, _>>().unwrap();
/// assert_eq!(
///     cmds,
///     [DownlinkMacCommand::LinkCheckAns(LinkCheckAnsPayload { margin: 3, gateway_count: 0 })]
/// );
/// ```
pub fn parse_downlink_mac_commands(data: &[u8]) -> MacCommandIterator<'_, DownlinkMacCommand> {
    MacCommandIterator::new(data)
}

/// Reads the first MAC command of `data` for the given direction.
///
/// Returns the command and the number of bytes it took, or `None` if `data` is empty.
pub fn read_mac_command(
    data: &[u8],
    direction: Direction,
) -> Result<Option<(MacCommand, usize)>, Error> {
    fn first<T: MacCommandSet + Into<MacCommand>>(
        data: &[u8],
    ) -> Result<Option<(MacCommand, usize)>, Error> {
        let mut iter = MacCommandIterator::<T>::new(data);
        match iter.next() {
            Some(cmd) => Ok(Some((cmd?.into(), iter.position()))),
            None => Ok(None),
        }
    }
    match direction {
        Direction::Uplink => first::<UplinkMacCommand>(data),
        Direction::Downlink => first::<DownlinkMacCommand>(data),
    }
}

/// Implementation of iterator for MAC commands.
pub struct MacCommandIterator<'a, T> {
    pub(crate) data: &'a [u8],
    pub(crate) index: usize,
    table: &'a [MacCommandSpec],
    failed: bool,
    pub(crate) item: PhantomData<T>,
}

impl<'a, T: MacCommandSet> MacCommandIterator<'a, T> {
    /// Creation, dispatching through the command set's own table.
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_table(data, T::TABLE)
    }

    /// Dispatches through `table` instead. CIDs missing from it are reported as unknown.
    pub fn with_table(data: &'a [u8], table: &'a [MacCommandSpec]) -> Self {
        Self { data, index: 0, table, failed: false, item: PhantomData }
    }

    /// Number of bytes consumed so far.
    pub fn position(&self) -> usize {
        self.index
    }

    fn read(&mut self, cid: u8) -> Result<T, Error> {
        let unknown = Error::UnknownMacCommand { cid, direction: T::DIRECTION };
        let spec = match lookup(self.table, cid) {
            Some(spec) => spec,
            None => {
                warn!("unknown {} MAC command 0x{:x}", T::DIRECTION, cid);
                return Err(unknown);
            }
        };
        let payload = &self.data[self.index + 1..];
        if payload.len() < spec.len {
            return Err(Error::TruncatedMacCommand {
                cid,
                expected: spec.len,
                actual: payload.len(),
            });
        }
        let cmd = T::parse_payload(cid, &payload[..spec.len]).ok_or(unknown)?;
        trace!("MAC command {} ({} payload bytes)", spec.name, spec.len);
        self.index += 1 + spec.len;
        Ok(cmd)
    }
}

impl<T: MacCommandSet> Iterator for MacCommandIterator<'_, T> {
    type Item = Result<T, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.index >= self.data.len() {
            return None;
        }
        let cid = self.data[self.index];
        let res = self.read(cid);
        self.failed = res.is_err();
        Some(res)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_tables_have_unique_cids() {
        for table in [UplinkMacCommand::TABLE, DownlinkMacCommand::TABLE] {
            for (i, a) in table.iter().enumerate() {
                assert!(table[i + 1..].iter().all(|b| b.cid != a.cid), "duplicate {}", a.name);
            }
        }
    }

    #[test]
    fn test_ack_helper() {
        let ans = LinkADRAnsPayload::parse(&[0x07]);
        assert!(ans.ack());
        let ans = LinkADRAnsPayload::parse(&[0x05]);
        assert!(!ans.ack());
        assert!(ans.channel_mask_ack && ans.tx_power_ack && !ans.data_rate_ack);
    }

    #[test]
    fn test_margin_sign_extension() {
        assert_eq!(DevStatusAnsPayload::parse(&[0xff, 0x3f]).margin, -1);
        assert_eq!(DevStatusAnsPayload::parse(&[0xff, 0xdf]).margin, 31);
        assert_eq!(DevStatusAnsPayload::parse(&[0xff, 0x20]).margin, -32);
        let mut out = [0; 2];
        DevStatusAnsPayload { battery: 1, margin: -32 }.write_to(&mut out).unwrap();
        assert_eq!(out, [1, 0x20]);
        assert!(DevStatusAnsPayload { battery: 1, margin: 32 }.write_to(&mut out).is_err());
    }

    #[test]
    fn test_duty_cycle_fraction() {
        assert_eq!(DutyCycleReqPayload { max_duty_cycle: 1 }.max_duty_cycle_fraction(), 0.5);
        assert_eq!(DutyCycleReqPayload { max_duty_cycle: 0 }.max_duty_cycle_fraction(), 1.0);
    }

    #[test]
    fn test_force_rejoin_layout() {
        let p = ForceRejoinReqPayload { period_exp: 5, max_retries: 3, rejoin_type: 2, data_rate: 4 };
        let mut out = [0; 2];
        p.write_to(&mut out).unwrap();
        assert_eq!(out, [0x2b, 0x24]);
        assert_eq!(ForceRejoinReqPayload::parse(&out), p);
    }

    #[test]
    fn test_notify_new_end_device_power_level() {
        let p = RelayNotifyNewEndDeviceReqPayload {
            dev_addr: DevAddr::from([1, 2, 3, 4]),
            rssi: -100,
            snr: -5,
        };
        let mut out = [0; 6];
        p.write_to(&mut out).unwrap();
        // 100 << 5 | 15
        assert_eq!(&out[4..], &[0x8f, 0x0c]);
        assert_eq!(RelayNotifyNewEndDeviceReqPayload::parse(&out), p);
        let p = RelayNotifyNewEndDeviceReqPayload { snr: 12, ..p };
        assert!(p.write_to(&mut out).is_err());
    }

    #[test]
    fn test_iterator_stops_after_error() {
        let data = [0x02, 0x7f, 0x02];
        let mut iter = parse_uplink_mac_commands(&data);
        assert_eq!(iter.next(), Some(Ok(UplinkMacCommand::LinkCheckReq(LinkCheckReqPayload))));
        assert_eq!(
            iter.next(),
            Some(Err(Error::UnknownMacCommand { cid: 0x7f, direction: Direction::Uplink }))
        );
        assert_eq!(iter.next(), None);
    }

    #[test]
    fn test_private_table() {
        const TABLE: &[MacCommandSpec] = &[MacCommandSpec { cid: 0x02, len: 0, name: "LinkCheckReq" }];
        let data = [0x02, 0x06, 0x01, 0x02];
        let mut iter = MacCommandIterator::<UplinkMacCommand>::with_table(&data, TABLE);
        assert!(matches!(iter.next(), Some(Ok(UplinkMacCommand::LinkCheckReq(_)))));
        assert_eq!(
            iter.next(),
            Some(Err(Error::UnknownMacCommand { cid: 0x06, direction: Direction::Uplink }))
        );
    }

    #[test]
    fn test_read_mac_command() {
        let data = [0x06, 0xff, 0x05, 0x02];
        let (cmd, len) = read_mac_command(&data, Direction::Uplink).unwrap().unwrap();
        assert_eq!(len, 3);
        assert_eq!(
            cmd,
            MacCommand::Uplink(UplinkMacCommand::DevStatusAns(DevStatusAnsPayload {
                battery: 0xff,
                margin: 5
            }))
        );
        let (cmd, len) = read_mac_command(&data, Direction::Downlink).unwrap().unwrap();
        assert_eq!(len, 1);
        assert_eq!(cmd, MacCommand::Downlink(DownlinkMacCommand::DevStatusReq(DevStatusReqPayload)));
        assert_eq!(read_mac_command(&[], Direction::Downlink), Ok(None));
    }

    #[test]
    fn test_sanitized_clears_root_wor_s_key() {
        let cmd = DownlinkMacCommand::RelayUpdateUplinkListReq(RelayUpdateUplinkListReqPayload {
            uplink_list_idx: 1,
            bucket_size: 2,
            reload_rate: 3,
            dev_addr: DevAddr::from([1, 2, 3, 4]),
            w_f_cnt: 42,
            root_wor_s_key: AES128([0xaa; 16]),
        });
        let clean = cmd.sanitized();
        let DownlinkMacCommand::RelayUpdateUplinkListReq(p) = clean else {
            panic!("variant changed")
        };
        assert!(p.root_wor_s_key.is_zero());
        assert_eq!(p.w_f_cnt, 42);
        assert_eq!(clean.sanitized(), clean);
    }
}
