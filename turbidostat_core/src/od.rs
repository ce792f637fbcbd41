//! Optical density from a raw reading and the blank.

use crate::error::{Result, TurbidostatError};
use crate::types::{Calibration, RawReading};

/// OD substituted for a reading that cannot be converted.
pub const FALLBACK_OD: f64 = 1.0;

/// `-log10((rx / tx) / (blank.rx / blank.tx))`.
///
/// Any zero that would make the ratio undefined or infinite is
/// `DivisionByZero`: `raw.tx`, `blank.tx`, `blank.rx`, and `raw.rx`.
pub fn compute_od(raw: RawReading, blank: Calibration) -> Result<f64> {
    if raw.tx == 0 || blank.tx == 0 || blank.rx == 0 || raw.rx == 0 {
        return Err(TurbidostatError::DivisionByZero);
    }
    let signal = f64::from(raw.rx) / f64::from(raw.tx);
    let blank_ratio = f64::from(blank.rx) / f64::from(blank.tx);
    Ok(-(signal / blank_ratio).log10())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const BLANK: Calibration = RawReading::new(40_000, 30_000);

    #[test]
    fn blank_reads_zero() {
        assert!(compute_od(BLANK, BLANK).unwrap().abs() < 1e-12);
    }

    #[test]
    fn tenfold_attenuation_is_one() {
        let od = compute_od(RawReading::new(40_000, 3_000), BLANK).unwrap();
        assert!((od - 1.0).abs() < 1e-12);
    }

    #[test]
    fn normalizes_by_transmit_intensity() {
        // Half the LED output with the same attenuation reads the same OD
        let od = compute_od(RawReading::new(20_000, 1_500), BLANK).unwrap();
        assert!((od - 1.0).abs() < 1e-12);
    }

    #[rstest]
    #[case(RawReading::new(0, 100), BLANK)]
    #[case(RawReading::new(100, 0), BLANK)]
    #[case(RawReading::new(100, 100), RawReading::new(0, 100))]
    #[case(RawReading::new(100, 100), RawReading::new(100, 0))]
    #[case(RawReading::new(0, 0), RawReading::new(0, 0))]
    fn degenerate_inputs_are_division_by_zero(#[case] raw: RawReading, #[case] blank: Calibration) {
        assert_eq!(compute_od(raw, blank), Err(TurbidostatError::DivisionByZero));
    }

    #[test]
    fn extremes_stay_finite() {
        let od = compute_od(RawReading::new(u32::MAX, 1), RawReading::new(1, u32::MAX)).unwrap();
        assert!(od.is_finite());
    }
}
