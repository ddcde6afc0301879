// tests/parameters.rs

use std::time::Duration;

use proptest::prelude::*;
use scalepipe::errors::PipelineError;
use scalepipe::types::{Parameters, RawParameters, ThresholdMode};

fn raw(t: Option<&str>, m: Option<&str>, auto: bool) -> RawParameters {
    RawParameters {
        threshold: t.map(str::to_string),
        min_contour_size: m.map(str::to_string),
        auto_threshold: auto,
    }
}

const TIMEOUT: Duration = Duration::from_secs(30);

#[test]
fn parses_numeric_strings() {
    let params = Parameters::parse(&raw(Some("200"), Some(" 5.5 "), false), TIMEOUT).unwrap();
    assert_eq!(params.threshold(), 200.0);
    assert_eq!(params.min_contour_size(), 5.5);
    assert_eq!(params.mode(), ThresholdMode::Manual);
    assert_eq!(params.timeout(), TIMEOUT);
}

#[test]
fn auto_flag_selects_auto_mode() {
    let params = Parameters::parse(&raw(Some("0"), Some("5"), true), TIMEOUT).unwrap();
    assert_eq!(params.mode(), ThresholdMode::Auto);
    assert!(params.mode().is_auto());
}

#[test]
fn missing_values_are_validation_errors() {
    for r in [
        raw(None, Some("5"), false),
        raw(Some("1"), None, false),
        raw(Some("   "), Some("5"), true),
    ] {
        match Parameters::parse(&r, TIMEOUT) {
            Err(PipelineError::Validation(msg)) => assert!(msg.contains("missing"), "{msg}"),
            other => panic!("expected Validation error, got {other:?}"),
        }
    }
}

#[test]
fn non_numeric_values_are_validation_errors() {
    let err = Parameters::parse(&raw(Some("abc"), Some("5"), false), TIMEOUT).unwrap_err();
    assert!(matches!(err, PipelineError::Validation(ref msg) if msg.contains("threshold")));
    assert_eq!(err.code(), "badparams");
}

#[test]
fn non_finite_values_are_rejected() {
    for value in ["NaN", "inf", "-inf"] {
        let err = Parameters::parse(&raw(Some("1"), Some(value), false), TIMEOUT).unwrap_err();
        assert!(matches!(err, PipelineError::Validation(_)), "{value}: {err:?}");
    }
    assert!(Parameters::new(f64::NAN, 1.0, ThresholdMode::Auto, TIMEOUT).is_err());
}

#[test]
fn zero_timeout_is_rejected() {
    let err = Parameters::new(1.0, 1.0, ThresholdMode::Manual, Duration::ZERO).unwrap_err();
    assert!(matches!(err, PipelineError::Validation(ref msg) if msg.contains("timeout")));
}

#[test]
fn threshold_mode_from_str() {
    assert_eq!("auto".parse::<ThresholdMode>(), Ok(ThresholdMode::Auto));
    assert_eq!(" Manual ".parse::<ThresholdMode>(), Ok(ThresholdMode::Manual));
    assert_eq!("True".parse::<ThresholdMode>(), Ok(ThresholdMode::Auto));
    assert!("sometimes".parse::<ThresholdMode>().is_err());
}

#[test]
fn parse_trims_and_accepts_auto_with_threshold() {
    let params = Parameters::parse(&raw(Some(" 180 "), Some("12"), true), TIMEOUT).unwrap();
    assert_eq!(params.threshold(), 180.0);
    assert_eq!(params.min_contour_size(), 12.0);
    assert_eq!(params.mode(), ThresholdMode::Auto);
}

proptest! {
    #[test]
    fn any_finite_pair_round_trips_through_parse(
        t in -1.0e6f64..1.0e6,
        m in 0.0f64..1.0e4,
        auto in any::<bool>(),
    ) {
        let r = RawParameters {
            threshold: Some(t.to_string()),
            min_contour_size: Some(m.to_string()),
            auto_threshold: auto,
        };
        let params = Parameters::parse(&r, TIMEOUT).unwrap();
        prop_assert_eq!(params.threshold(), t);
        prop_assert_eq!(params.min_contour_size(), m);
        prop_assert_eq!(params.mode().is_auto(), auto);
    }
}
