//! Unit tests for frame construction and mailbox identifier encoding.
use super::*;
use embedded_can::Frame;

//==================================================================================ID_REGISTER
#[test]
/// Standard identifiers occupy bits 31..21, IDE clear.
fn test_standard_id_register_layout() {
    let id = StandardId::new(0x123).unwrap();
    let reg = IdReg::new(Id::Standard(id), false);
    assert_eq!(reg.0, 0x123 << 21);
    assert!(!reg.is_extended());
    assert!(!reg.is_remote());
    assert_eq!(reg.id(), Id::Standard(id));
}

#[test]
/// Extended identifiers occupy bits 31..3 with IDE set.
fn test_extended_id_register_layout() {
    let id = ExtendedId::new(0x1ABC_DEF0).unwrap();
    let reg = IdReg::new(Id::Extended(id), true);
    assert_eq!(reg.0, (0x1ABC_DEF0 << 3) | IdReg::IDE | IdReg::RTR);
    assert!(reg.is_extended());
    assert!(reg.is_remote());
    assert_eq!(reg.id(), Id::Extended(id));
}

#[test]
/// TXRQ must not leak into the decoded identifier.
fn test_from_register_drops_txrq() {
    let reg = IdReg::from_register((0x7FF << 21) | IdReg::TXRQ);
    assert_eq!(reg.0, 0x7FF << 21);
    assert_eq!(reg.id(), Id::Standard(StandardId::MAX));
}

//==================================================================================CAN_FRAME
#[test]
/// A nine-byte payload cannot fit a classic frame.
fn test_new_data_rejects_long_payload() {
    let err = CanFrame::new_data(StandardId::ZERO, &[0; 9]).unwrap_err();
    assert_eq!(err, FrameError::DataTooLong { len: 9 });
    assert!(<CanFrame as Frame>::new(StandardId::ZERO, &[0; 9]).is_none());
}

#[test]
/// Remote frames keep their DLC but expose no payload.
fn test_remote_frame_has_no_data() {
    let frame = CanFrame::new_remote_request(StandardId::new(0x10).unwrap(), 4).unwrap();
    assert!(frame.is_remote_frame());
    assert_eq!(frame.dlc(), 4);
    assert!(frame.data().is_empty());
    assert!(CanFrame::new_remote_request(StandardId::ZERO, 9).is_err());
}

#[test]
/// Payload words are little-endian, matching the mailbox data registers.
fn test_payload_words_are_little_endian() {
    let frame = CanFrame::new_data(StandardId::ZERO, &[1, 2, 3, 4, 5, 6, 7, 8]).unwrap();
    assert_eq!(frame.low_word(), 0x0403_0201);
    assert_eq!(frame.high_word(), 0x0807_0605);
}

#[test]
/// Bytes past the DLC are zeroed when reading a mailbox.
fn test_from_mailbox_masks_bytes_past_dlc() {
    let frame = CanFrame::from_mailbox(0x55 << 21, 3, 0xDDCC_BBAA, 0xFFFF_FFFF);
    assert_eq!(frame.id(), Id::Standard(StandardId::new(0x55).unwrap()));
    assert_eq!(frame.data(), &[0xAA, 0xBB, 0xCC]);
    assert_eq!(frame.raw_data(), &[0xAA, 0xBB, 0xCC, 0, 0, 0, 0, 0]);
}

#[test]
/// A DLC above eight read from hardware is clamped.
fn test_from_mailbox_clamps_dlc() {
    let frame = CanFrame::from_mailbox(0, 0x0F, 0, 0);
    assert_eq!(frame.dlc(), 8);
}

//==================================================================================RECEIVED_FRAME
#[test]
/// `first_byte` falls back to zero when the frame carries no payload.
fn test_first_byte_of_empty_frame() {
    let frame = CanFrame::new_data(StandardId::ZERO, &[]).unwrap();
    let received = ReceivedFrame {
        frame,
        filter_index: 0,
        fifo: Fifo::Fifo0,
    };
    assert_eq!(received.first_byte(), 0);

    let frame = CanFrame::new_data(StandardId::ZERO, &[0x0A, 0xFF]).unwrap();
    let received = ReceivedFrame { frame, ..received };
    assert_eq!(received.first_byte(), 0x0A);
}

//==================================================================================DEFMT
#[cfg(feature = "defmt")]
#[test]
/// Every value the node logs or hands to the firmware is `defmt`-printable.
fn test_logged_types_are_defmt_format() {
    fn loggable<T: defmt::Format>() {}
    loggable::<IdFormat>();
    loggable::<CanFrame>();
    loggable::<ReceivedFrame>();
    loggable::<crate::node::heartbeat::Heartbeat>();
    loggable::<crate::node::heartbeat::TickOutcome>();
    loggable::<crate::node::heartbeat::HeartbeatEvent>();
    loggable::<crate::config::NodeConfig>();
    loggable::<crate::node::bringup::NodeState>();
}
