// Copyright (c) 2018 Ivaylo Petrov
//
// Licensed under the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//
// author: Ivaylo Petrov <ivajloip@gmail.com>

use heapless::Vec;
use lorawan_codec::maccommandcreator::*;
use lorawan_codec::maccommands::*;
use lorawan_codec::types::*;
use lorawan_codec::Error;

fn build(cmd: &dyn SerializableMacCommand) -> Vec<u8, 32> {
    let mut dst = Vec::new();
    append_serializable(&mut dst, cmd).unwrap();
    dst
}

#[test]
fn test_link_check_req_creator() {
    assert_eq!(&build(&LinkCheckReqPayload)[..], [0x02]);
}

#[test]
fn test_link_check_ans_creator() {
    let res = build(&LinkCheckAnsPayload { margin: 253, gateway_count: 254 });
    assert_eq!(&res[..], [0x02, 0xfd, 0xfe]);
}

#[test]
fn test_link_adr_req_creator() {
    let res = build(&LinkADRReqPayload {
        data_rate: 0x05,
        tx_power: 0x03,
        channel_mask: ChannelMask::from([0xc7, 0x0b]),
        redundancy: Redundancy::from_byte(0x37),
    });
    assert_eq!(&res[..], [0x03, 0x53, 0xc7, 0x0b, 0x37]);
}

#[test]
fn test_link_adr_req_creator_bad_data_rate() {
    let req = LinkADRReqPayload { data_rate: 0x10, ..Default::default() };
    let mut dst: Vec<u8, 8> = Vec::new();
    assert_eq!(
        append_serializable(&mut dst, &req),
        Err(Error::FieldOutOfRange { field: "DataRate", value: 0x10 })
    );
    assert!(dst.is_empty());
}

#[test]
fn test_link_adr_req_creator_bad_tx_power() {
    let req = LinkADRReqPayload { tx_power: 0x10, ..Default::default() };
    let mut buf = [0u8; 5];
    assert!(build_mac_commands(&[&req], &mut buf).is_err());
}

#[test]
fn test_link_adr_ans_creator() {
    let res = build(&LinkADRAnsPayload {
        channel_mask_ack: true,
        data_rate_ack: true,
        tx_power_ack: true,
    });
    assert_eq!(&res[..], [0x03, 0x07]);
}

#[test]
fn test_duty_cycle_creators() {
    let res = build(&DutyCycleReqPayload { max_duty_cycle: 0x0f });
    assert_eq!(&res[..], [DutyCycleReqPayload::cid(), 0x0f]);
    assert_eq!(&build(&DutyCycleAnsPayload)[..], [DutyCycleAnsPayload::cid()]);
}

#[test]
fn test_rx_param_setup_creators() {
    let res = build(&RXParamSetupReqPayload {
        rx1_dr_offset: 4,
        rx2_data_rate: 0x0d,
        frequency: Frequency::from(&[0x12, 0x34, 0x56]),
    });
    assert_eq!(&res[..], [RXParamSetupReqPayload::cid(), 0x4d, 0x12, 0x34, 0x56]);
    let res = build(&RXParamSetupAnsPayload {
        channel_ack: true,
        rx2_data_rate_ack: true,
        rx1_dr_offset_ack: true,
    });
    assert_eq!(&res[..], [RXParamSetupAnsPayload::cid(), 0x07]);
}

#[test]
fn test_dev_status_creators() {
    assert_eq!(&build(&DevStatusReqPayload)[..], [DevStatusReqPayload::cid()]);
    let res = build(&DevStatusAnsPayload { battery: 0xfe, margin: -32 });
    assert_eq!(&res[..], [DevStatusAnsPayload::cid(), 0xfe, 0x20]);
}

#[test]
fn test_dev_status_ans_creator_margin_limits() {
    let mut buf = [0u8; 3];
    for margin in [32, -33] {
        let ans = DevStatusAnsPayload { battery: 0, margin };
        assert!(build_mac_commands(&[&ans], &mut buf).is_err());
    }
}

#[test]
fn test_new_channel_creators() {
    let res = build(&NewChannelReqPayload {
        channel_index: 0x0f,
        frequency: Frequency::from(&[0x12, 0x34, 0x56]),
        data_rate_range: DataRateRange::from_byte(0x53),
    });
    assert_eq!(&res[..], [NewChannelReqPayload::cid(), 0x0f, 0x12, 0x34, 0x56, 0x53]);
    let res = build(&NewChannelAnsPayload { channel_freq_ack: true, data_rate_range_ack: true });
    assert_eq!(&res[..], [NewChannelAnsPayload::cid(), 0x03]);
}

#[test]
fn test_rx_timing_setup_creators() {
    let res = build(&RXTimingSetupReqPayload { delay: 0x0f });
    assert_eq!(&res[..], [RXTimingSetupReqPayload::cid(), 0x0f]);
    let mut buf = [0u8; 2];
    assert!(build_mac_commands(&[&RXTimingSetupReqPayload { delay: 0x10 }], &mut buf).is_err());
    assert_eq!(&build(&RXTimingSetupAnsPayload)[..], [RXTimingSetupAnsPayload::cid()]);
}

#[test]
fn test_frequency_not_on_grid() {
    let req = DlChannelReqPayload { channel_index: 0, frequency: Frequency::from_hz(868_100_050) };
    let mut buf = [0u8; 5];
    assert!(matches!(
        build_mac_commands(&[&req], &mut buf),
        Err(Error::FieldOutOfRange { field: "Frequency", .. })
    ));
}

#[test]
fn test_device_mode_rfu_class_round_trips() {
    let ind = DeviceModeIndPayload { class: DeviceClass::Rfu(1) };
    assert_eq!(&build(&ind)[..], [0x20, 0x01]);
    let bad = DeviceModeIndPayload { class: DeviceClass::Rfu(2) };
    let mut buf = [0u8; 2];
    assert!(build_mac_commands(&[&bad], &mut buf).is_err());
}

#[test]
fn test_build_mac_commands() {
    let link_check_req = LinkCheckReqPayload;
    let dev_status_ans = DevStatusAnsPayload { battery: 0xfe, margin: 0 };
    let cmds: [&dyn SerializableMacCommand; 2] = [&link_check_req, &dev_status_ans];
    let mut buf = [0u8; 8];
    let len = build_mac_commands(&cmds, &mut buf).unwrap();
    assert_eq!(len, mac_commands_len(&cmds));
    assert_eq!(&buf[..len], [0x02, 0x06, 0xfe, 0x00]);
}

#[test]
fn test_build_mac_commands_short_buffer() {
    let ans = LinkCheckAnsPayload { margin: 1, gateway_count: 1 };
    let mut buf = [0u8; 2];
    assert!(matches!(
        build_mac_commands(&[&ans], &mut buf),
        Err(Error::BufferTooShort { .. })
    ));
}

#[test]
fn test_append_mac_command_direction() {
    let mut fopts: Vec<u8, 15> = Vec::new();
    let up = MacCommand::Uplink(LinkCheckReqPayload.into());
    let down = MacCommand::Downlink(LinkCheckAnsPayload { margin: 1, gateway_count: 2 }.into());
    assert_eq!(append_mac_command(&mut fopts, &up, Direction::Uplink), Ok(1));
    assert_eq!(
        append_mac_command(&mut fopts, &down, Direction::Uplink),
        Err(Error::DirectionMismatch)
    );
    assert_eq!(&fopts[..], [0x02]);
}

#[test]
fn test_created_commands_parse_back() {
    let cmds = [
        DownlinkMacCommand::from(LinkADRReqPayload {
            data_rate: 3,
            tx_power: 1,
            channel_mask: ChannelMask::from([0xff, 0x00]),
            redundancy: Redundancy { channel_mask_control: 0, number_of_transmissions: 1 },
        }),
        DownlinkMacCommand::from(RXTimingSetupReqPayload { delay: 5 }),
        DownlinkMacCommand::from(DeviceTimeAnsPayload { seconds: 1_300_000_000, fractional: 128 }),
    ];
    let mut fopts: Vec<u8, 15> = Vec::new();
    for cmd in &cmds {
        append_mac_command(&mut fopts, &MacCommand::Downlink(*cmd), Direction::Downlink).unwrap();
    }
    assert_eq!(fopts.len(), 5 + 2 + 6);
    let parsed: Vec<DownlinkMacCommand, 3> =
        parse_downlink_mac_commands(&fopts).collect::<Result<_, _>>().unwrap();
    assert_eq!(&parsed[..], &cmds[..]);
}
