//! Randomised encode / decode agreement over every frame kind and every MAC command.
//!
//! Seeds are fixed so that failures reproduce.
use core::fmt::Debug;
use fastrand::Rng;
use heapless::Vec;
use lorawan_codec::keys::MIC;
use lorawan_codec::maccommandcreator::build_mac_commands;
use lorawan_codec::maccommands::*;
use lorawan_codec::packet_length::phy::{join, mac::fhdr::FOPTS_MAX_LEN, PHY_PAYLOAD_MAX_LEN};
use lorawan_codec::parser::*;
use lorawan_codec::types::*;
use lorawan_codec::Error;

const SEEDS: [u64; 4] = [1, 7, 0x5eed, 0xdead_beef];
const ROUNDS: usize = 200;

fn bytes<const N: usize>(rng: &mut Rng) -> [u8; N] {
    let mut b = [0u8; N];
    rng.fill(&mut b);
    b
}

fn mhdr(rng: &mut Rng, mtype: MType) -> MHDR {
    MHDR { mtype, major: rng.u8(0..=3) }
}

fn mic(rng: &mut Rng) -> Option<MIC> {
    Some(MIC(bytes(rng)))
}

fn data_frame(rng: &mut Rng, mtype: MType) -> PhyPayload {
    let uplink = mtype.direction() == Some(Direction::Uplink);
    let f_ctrl = FCtrl {
        adr: rng.bool(),
        adr_ack_req: uplink && rng.bool(),
        ack: rng.bool(),
        class_b: uplink && rng.bool(),
        f_pending: !uplink && rng.bool(),
    };
    let mut f_opts = Vec::new();
    for _ in 0..rng.usize(0..=FOPTS_MAX_LEN) {
        let _ = f_opts.push(rng.u8(..));
    }
    let room = PHY_PAYLOAD_MAX_LEN - 1 - 7 - f_opts.len() - 1 - 4;
    let mut frm_payload = Vec::new();
    for _ in 0..rng.usize(0..=room) {
        let _ = frm_payload.push(rng.u8(..));
    }
    let f_port = if frm_payload.is_empty() { None } else { Some(rng.u8(..)) };
    PhyPayload {
        mhdr: mhdr(rng, mtype),
        payload: Payload::Data(MacPayload {
            fhdr: FHDR {
                dev_addr: DevAddr::from(rng.u32(..)),
                f_ctrl,
                f_cnt: rng.u16(..),
                f_opts,
            },
            f_port,
            frm_payload,
        }),
        mic: mic(rng),
    }
}

fn join_request(rng: &mut Rng) -> PhyPayload {
    PhyPayload {
        mhdr: mhdr(rng, MType::JoinRequest),
        payload: Payload::JoinRequest(JoinRequestPayload {
            join_eui: EUI64::from(bytes(rng)),
            dev_eui: EUI64::from(bytes(rng)),
            dev_nonce: DevNonce::from(rng.u16(..)),
        }),
        mic: mic(rng),
    }
}

fn encrypted_join_accept(rng: &mut Rng) -> PhyPayload {
    let blob: [u8; 32] = bytes(rng);
    let len = if rng.bool() { 16 } else { 32 };
    PhyPayload {
        mhdr: mhdr(rng, MType::JoinAccept),
        payload: Payload::JoinAccept(JoinAcceptPayload::Encrypted(
            EncryptedJoinAccept::new(&blob[..len]).unwrap(),
        )),
        mic: None,
    }
}

fn cf_list(rng: &mut Rng) -> Option<CfList> {
    match rng.u8(0..3) {
        0 => None,
        1 => {
            let mut freqs = [Frequency::default(); 5];
            for f in freqs.iter_mut() {
                *f = Frequency::from_units(rng.u32(..=0x00ff_ffff)).unwrap();
            }
            Some(CfList::Frequencies(freqs))
        }
        _ => Some(CfList::ChannelMasks(ChannelMask::from(bytes::<12>(rng)))),
    }
}

fn decrypted_join_accept(rng: &mut Rng) -> PhyPayload {
    PhyPayload {
        mhdr: mhdr(rng, MType::JoinAccept),
        payload: Payload::JoinAccept(JoinAcceptPayload::Decrypted(DecryptedJoinAccept {
            join_nonce: JoinNonce::from(bytes(rng)),
            net_id: NetId::from(bytes(rng)),
            dev_addr: DevAddr::from(rng.u32(..)),
            dl_settings: DLSettings {
                opt_neg: rng.bool(),
                rx1_dr_offset: rng.u8(0..8),
                rx2_data_rate: rng.u8(0..16),
            },
            rx_delay: rng.u8(..),
            cf_list: cf_list(rng),
        })),
        mic: mic(rng),
    }
}

fn rejoin_request(rng: &mut Rng) -> PhyPayload {
    let rejoin_type = rng.u8(0..=2);
    let mut r = RejoinRequestPayload {
        rejoin_type,
        dev_eui: EUI64::from(bytes(rng)),
        rejoin_cnt: rng.u16(..),
        ..Default::default()
    };
    if rejoin_type == 1 {
        r.join_eui = EUI64::from(bytes(rng));
    } else {
        r.net_id = NetId::from(bytes(rng));
    }
    PhyPayload {
        mhdr: mhdr(rng, MType::RejoinRequest),
        payload: Payload::RejoinRequest(r),
        mic: mic(rng),
    }
}

fn proprietary(rng: &mut Rng) -> PhyPayload {
    let mut body = Vec::new();
    for _ in 0..rng.usize(0..=PHY_PAYLOAD_MAX_LEN - 5) {
        let _ = body.push(rng.u8(..));
    }
    PhyPayload { mhdr: mhdr(rng, MType::Proprietary), payload: Payload::Proprietary(body), mic: mic(rng) }
}

fn random_frame(rng: &mut Rng) -> PhyPayload {
    match rng.u8(0..8) {
        0 => join_request(rng),
        1 => encrypted_join_accept(rng),
        2 => data_frame(rng, MType::UnconfirmedDataUp),
        3 => data_frame(rng, MType::UnconfirmedDataDown),
        4 => data_frame(rng, MType::ConfirmedDataUp),
        5 => data_frame(rng, MType::ConfirmedDataDown),
        6 => rejoin_request(rng),
        _ => proprietary(rng),
    }
}

#[test]
fn test_decode_inverts_encode() {
    for seed in SEEDS {
        let mut rng = Rng::with_seed(seed);
        for _ in 0..ROUNDS {
            let phy = random_frame(&mut rng);
            let encoded = phy.to_vec().unwrap();
            assert_eq!(encoded.len(), phy.encoded_len());
            assert_eq!(decode(&encoded).as_ref(), Ok(&phy), "seed {}", seed);
        }
    }
}

#[test]
fn test_encode_inverts_decode() {
    for seed in SEEDS {
        let mut rng = Rng::with_seed(seed);
        for _ in 0..ROUNDS {
            let bytes = random_frame(&mut rng).to_vec().unwrap();
            let phy = decode(&bytes).unwrap();
            let mut out = [0u8; PHY_PAYLOAD_MAX_LEN];
            let len = phy.encode_to_slice(&mut out).unwrap();
            assert_eq!(&out[..len], &bytes[..], "seed {}", seed);
        }
    }
}

#[test]
fn test_decrypted_join_accept_round_trip() {
    for seed in SEEDS {
        let mut rng = Rng::with_seed(seed);
        for _ in 0..ROUNDS {
            let phy = decrypted_join_accept(&mut rng);
            let bytes = phy.to_vec().unwrap();
            assert!(bytes.len() == join::JOIN_ACCEPT_LEN || bytes.len() == join::JOIN_ACCEPT_WITH_CFLIST_LEN);
            assert_eq!(decode_decrypted_join_accept(&bytes).as_ref(), Ok(&phy));
            // The plaintext image is also a well-formed encrypted join-accept.
            assert!(decode(&bytes).is_ok());
        }
    }
}

#[test]
fn test_prefixes_of_fixed_size_frames_are_rejected() {
    for seed in SEEDS {
        let mut rng = Rng::with_seed(seed);
        for _ in 0..ROUNDS / 4 {
            for phy in [join_request(&mut rng), rejoin_request(&mut rng), encrypted_join_accept(&mut rng)] {
                let bytes = phy.to_vec().unwrap();
                for k in 0..bytes.len() {
                    // A 17 byte prefix of a join-accept with CFList is itself a join-accept.
                    if phy.mhdr.mtype == MType::JoinAccept && k == join::JOIN_ACCEPT_LEN {
                        continue;
                    }
                    let err = decode(&bytes[..k]).unwrap_err();
                    assert!(
                        matches!(err, Error::TruncatedFrame { actual, .. } if actual == k),
                        "prefix {} of {:?} gave {:?}",
                        k,
                        phy,
                        err
                    );
                }
            }
        }
    }
}

#[test]
fn test_data_frame_shorter_than_fhdr_is_rejected() {
    let mut rng = Rng::with_seed(3);
    let bytes = data_frame(&mut rng, MType::UnconfirmedDataUp).to_vec().unwrap();
    for k in 1..12 {
        assert_eq!(decode(&bytes[..k]), Err(Error::TruncatedFrame { expected: 12, actual: k }));
    }
}

fn check_command_set<T>(rng: &mut Rng)
where
    T: MacCommandSet + SerializableMacCommand + PartialEq + Debug + Copy,
{
    for spec in T::TABLE {
        for _ in 0..32 {
            let mut buf = [0u8; 27];
            buf[0] = spec.cid;
            rng.fill(&mut buf[1..=spec.len]);
            let data = &buf[..=spec.len];

            let mut iter = MacCommandIterator::<T>::new(data);
            let cmd = iter.next().unwrap().unwrap();
            assert_eq!(iter.position(), data.len());
            assert_eq!(cmd.cid(), spec.cid);
            assert_eq!(cmd.payload_len(), spec.len);

            let mut out = [0u8; 27];
            let len = build_mac_commands(&[&cmd], &mut out).unwrap();
            assert_eq!(len, data.len(), "{}", spec.name);
            let again = MacCommandIterator::<T>::new(&out[..len]).next().unwrap().unwrap();
            assert_eq!(again, cmd, "{}", spec.name);

            for k in 1..data.len() {
                assert_eq!(
                    MacCommandIterator::<T>::new(&data[..k]).next(),
                    Some(Err(Error::TruncatedMacCommand {
                        cid: spec.cid,
                        expected: spec.len,
                        actual: k - 1
                    }))
                );
            }
        }
    }
}

#[test]
fn test_every_mac_command_round_trips() {
    for seed in SEEDS {
        let mut rng = Rng::with_seed(seed);
        check_command_set::<UplinkMacCommand>(&mut rng);
        check_command_set::<DownlinkMacCommand>(&mut rng);
    }
}

fn check_command_sequence<T>(rng: &mut Rng)
where
    T: MacCommandSet + SerializableMacCommand + PartialEq + Debug + Copy,
{
    let mut stream: Vec<u8, 64> = Vec::new();
    let mut expected: Vec<T, 64> = Vec::new();
    loop {
        let spec = &T::TABLE[rng.usize(..T::TABLE.len())];
        if stream.len() + 1 + spec.len > FOPTS_MAX_LEN {
            break;
        }
        let mut buf = [0u8; 27];
        buf[0] = spec.cid;
        rng.fill(&mut buf[1..=spec.len]);
        let cmd = MacCommandIterator::<T>::new(&buf[..=spec.len]).next().unwrap().unwrap();
        stream.extend_from_slice(&buf[..=spec.len]).unwrap();
        expected.push(cmd).unwrap();
    }
    let parsed: Vec<T, 64> = MacCommandIterator::<T>::new(&stream).collect::<Result<_, _>>().unwrap();
    assert_eq!(parsed, expected);
}

#[test]
fn test_command_sequences_in_fopts() {
    for seed in SEEDS {
        let mut rng = Rng::with_seed(seed);
        for _ in 0..ROUNDS {
            check_command_sequence::<UplinkMacCommand>(&mut rng);
            check_command_sequence::<DownlinkMacCommand>(&mut rng);
        }
    }
}
