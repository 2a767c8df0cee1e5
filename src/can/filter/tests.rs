//! Unit tests for acceptance filter matching.
use super::*;
use embedded_can::{ExtendedId, StandardId};

#[test]
/// A zero mask lets any identifier through.
fn test_accept_all_matches_everything() {
    let filter = AcceptanceFilter::default();
    assert_eq!(filter.bank, 0);
    assert_eq!(filter.fifo, Fifo::Fifo0);
    for raw in [0u32, 0x7FF << 21, (0x1FFF_FFFF << 3) | IdReg::IDE, u32::MAX] {
        assert!(filter.matches(raw));
    }
}

#[test]
/// A disabled bank never matches.
fn test_disabled_filter() {
    let filter = AcceptanceFilter {
        enabled: false,
        ..AcceptanceFilter::default()
    };
    assert!(!filter.matches(0));
}

#[test]
/// Exact filters compare identifier and IDE, ignoring RTR.
fn test_exact_filter() {
    let id = StandardId::new(0x123).unwrap();
    let filter = AcceptanceFilter::exact(3, Id::Standard(id), Fifo::Fifo1);
    assert_eq!(filter.bank_bit(), 1 << 3);

    assert!(filter.matches(IdReg::new(Id::Standard(id), false).0));
    assert!(filter.matches(IdReg::new(Id::Standard(id), true).0));
    assert!(!filter.matches(IdReg::new(Id::Standard(StandardId::new(0x124).unwrap()), false).0));

    // Same numeric value as an extended id differs in IDE and position.
    let ext = ExtendedId::new(0x123).unwrap();
    assert!(!filter.matches(IdReg::new(Id::Extended(ext), false).0));
}
