//! Property tests for the transform and encode stages.
//!
//! Uses proptest to verify:
//! 1. Price passthrough — the record carries the input prices unchanged
//! 2. Fixed shape — header and data row always split into 7 fields

use chrono::{FixedOffset, NaiveDate, TimeZone};
use proptest::prelude::*;
use quotevault_core::{encode_at, transform, RawQuote, SnapshotRecord};

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_price() -> impl Strategy<Value = f64> {
    (0.0..10_000.0_f64).prop_map(|p| (p * 100.0).round() / 100.0)
}

fn arb_symbol() -> impl Strategy<Value = String> {
    "[A-Z]{1,5}"
}

fn arb_quote() -> impl Strategy<Value = RawQuote> {
    (arb_price(), arb_price(), arb_price(), arb_price(), arb_price()).prop_map(
        |(c, h, l, o, pc)| RawQuote {
            current: Some(c),
            high: Some(h),
            low: Some(l),
            open: Some(o),
            previous_close: Some(pc),
            ..RawQuote::default()
        },
    )
}

fn captured_at() -> chrono::DateTime<FixedOffset> {
    FixedOffset::west_opt(5 * 3600)
        .unwrap()
        .with_ymd_and_hms(2024, 6, 3, 9, 30, 0)
        .unwrap()
}

// ── 1. Price passthrough ─────────────────────────────────────────────

proptest! {
    #[test]
    fn transform_passes_prices_through(raw in arb_quote(), symbol in arb_symbol()) {
        let record = transform(&raw, &symbol, captured_at()).unwrap();
        prop_assert_eq!(&record.symbol, &symbol);
        prop_assert_eq!(Some(record.current_price), raw.current);
        prop_assert_eq!(Some(record.high_price), raw.high);
        prop_assert_eq!(Some(record.low_price), raw.low);
        prop_assert_eq!(Some(record.open_price), raw.open);
        prop_assert_eq!(Some(record.previous_close), raw.previous_close);
    }

    #[test]
    fn any_missing_field_yields_no_record(raw in arb_quote(), missing in 0usize..5) {
        let mut raw = raw;
        match missing {
            0 => raw.current = None,
            1 => raw.high = None,
            2 => raw.low = None,
            3 => raw.open = None,
            _ => raw.previous_close = None,
        }
        prop_assert!(transform(&raw, "AAPL", captured_at()).is_err());
    }
}

// ── 2. Fixed shape ───────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn encoded_rows_have_seven_fields(raw in arb_quote(), symbol in arb_symbol()) {
        let dir = tempfile::tempdir().unwrap();
        let record = transform(&raw, &symbol, captured_at()).unwrap();
        let at = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap().and_hms_opt(9, 30, 0).unwrap();
        let encoded = encode_at(&record, dir.path(), "label", at).unwrap();

        let text = std::fs::read_to_string(&encoded.path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        prop_assert_eq!(lines.len(), 2);
        for line in &lines {
            prop_assert_eq!(line.split(',').count(), SnapshotRecord::FIELDS.len());
        }
        prop_assert_eq!(lines[0], SnapshotRecord::FIELDS.join(","));
    }
}
