use std::time::Duration;

use rstest::rstest;
use turbidostat_core::mocks::{MockLink, Reply};
use turbidostat_core::{Chamber, RawReading, TurbidostatError};
use turbidostat_traits::ManualClock;

fn chamber(link: MockLink, aux: bool) -> (Chamber<MockLink, ManualClock>, ManualClock) {
    let clock = ManualClock::new();
    (Chamber::new(link, clock.clone(), aux), clock)
}

#[test]
fn negative_period_performs_no_io() {
    let (mut c, clock) = chamber(MockLink::new().always(Reply::reading(1, 1)), true);
    let valve_events_after_open = c.link().valve_events.len();

    assert_eq!(c.dilute(-1).unwrap(), None);
    assert_eq!(c.dilute(-10_000).unwrap(), None);

    assert!(c.link().writes.is_empty());
    assert_eq!(c.link().valve_events.len(), valve_events_after_open);
    assert_eq!(clock.elapsed(), Duration::ZERO);
}

#[rstest]
#[case(0, 0)]
#[case(66, 66)]
#[case(255, 255)]
#[case(256, 255)]
#[case(100_000, 255)]
fn period_is_clamped_on_the_wire(#[case] period: i64, #[case] byte: u8) {
    let (mut c, _) = chamber(MockLink::new().always(Reply::reading(40_000, 30_000)), false);
    let r = c.dilute(period).unwrap();
    assert_eq!(r, Some(RawReading::new(40_000, 30_000)));
    assert_eq!(c.link().writes, vec![vec![byte]]);
}

#[test]
fn read_raw_is_a_zero_dilution() {
    let (mut c, _) = chamber(MockLink::new().reply(Reply::reading(10, 20)), false);
    assert_eq!(c.read_raw().unwrap(), RawReading::new(10, 20));
    assert_eq!(c.link().commands(), vec![0]);
}

#[test]
fn short_reply_is_a_timeout() {
    let (mut c, _) = chamber(MockLink::new().reply(Reply::Bytes(vec![1, 2, 3])), false);
    assert_eq!(c.read_raw(), Err(TurbidostatError::Timeout));
}

#[test]
fn silent_board_is_a_timeout() {
    let (mut c, _) = chamber(MockLink::new(), false);
    assert_eq!(c.dilute(10), Err(TurbidostatError::Timeout));
}

#[test]
fn transport_failure_is_malformed() {
    let (mut c, _) = chamber(MockLink::new().reply(Reply::Error("framing error".into())), false);
    assert_eq!(
        c.read_raw(),
        Err(TurbidostatError::Malformed("framing error".into()))
    );
}

#[test]
fn aux_pulse_holds_valve_proportionally() {
    let (mut c, clock) = chamber(MockLink::new().always(Reply::reading(1, 1)), true);
    // Construction closes the valve
    assert_eq!(c.link().valve_events, vec![false]);

    c.dilute(100).unwrap();
    assert_eq!(c.link().valve_events, vec![false, true, false]);
    assert_eq!(clock.elapsed(), Duration::from_millis(500));

    c.dilute(1000).unwrap();
    assert_eq!(clock.elapsed(), Duration::from_millis(500 + 1275));
}

#[test]
fn aux_pulse_runs_even_when_reply_is_missing() {
    let (mut c, clock) = chamber(MockLink::new(), true);
    assert_eq!(c.dilute(20), Err(TurbidostatError::Timeout));
    assert_eq!(c.link().valve_events, vec![false, true, false]);
    assert_eq!(clock.elapsed(), Duration::from_millis(100));
}

#[test]
fn no_pulse_when_disabled() {
    let (mut c, clock) = chamber(MockLink::new().always(Reply::reading(1, 1)), false);
    c.dilute(255).unwrap();
    assert_eq!(c.link().valve_events, vec![false]);
    assert_eq!(clock.elapsed(), Duration::ZERO);
}

#[test]
fn blank_from_reading_or_value() {
    let (mut c, _) = chamber(MockLink::new().reply(Reply::reading(400, 300)), false);
    assert_eq!(c.blank(), None);
    assert_eq!(c.set_blank(None).unwrap(), RawReading::new(400, 300));
    assert_eq!(c.blank(), Some(RawReading::new(400, 300)));

    c.set_blank(Some(RawReading::new(1, 2))).unwrap();
    assert_eq!(c.blank(), Some(RawReading::new(1, 2)));
    // Restoring a saved blank needs no transaction
    assert_eq!(c.link().writes.len(), 1);
}

#[test]
fn failed_blank_read_keeps_previous_blank() {
    let (mut c, _) = chamber(MockLink::new(), false);
    c.set_blank(Some(RawReading::new(5, 5))).unwrap();
    assert_eq!(c.set_blank(None), Err(TurbidostatError::Timeout));
    assert_eq!(c.blank(), Some(RawReading::new(5, 5)));
}
