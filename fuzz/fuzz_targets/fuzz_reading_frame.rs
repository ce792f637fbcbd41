#![no_main]
use libfuzzer_sys::fuzz_target;
use turbidostat_core::codec::{FRAME_LEN, decode_reading, encode_reading};
use turbidostat_core::od::compute_od;
use turbidostat_core::RawReading;

fuzz_target!(|data: &[u8]| {
    match decode_reading(data) {
        Ok(raw) => {
            assert!(data.len() >= FRAME_LEN);
            assert_eq!(&encode_reading(raw)[..], &data[..FRAME_LEN]);
            // Any decoded reading either yields a finite OD or a typed error
            if let Ok(od) = compute_od(raw, RawReading::new(40_000, 30_000)) {
                assert!(od.is_finite(), "non-finite OD {od} for {raw}");
            }
        }
        Err(_) => assert!(data.len() < FRAME_LEN),
    }
});
