//! The errno and handler are process-wide, so everything touching them
//! runs in this single test.

use chronotope::prelude::*;
use chronotope::{ErrorCode, ErrorLevel, clear_error_handler, errno, errno_reset, set_error_handler};
use parking_lot::Mutex;
use std::sync::Arc;

#[test]
fn test_error_side_channel() {
    let _ = env_logger::builder().is_test(true).try_init();
    errno_reset();

    let seen: Arc<Mutex<Vec<(ErrorLevel, ErrorCode, String)>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    set_error_handler(move |level, code, msg| {
        sink.lock().push((level, code, msg.to_string()));
    });

    // Successful calls leave the errno alone
    let span: IntSpan = "[1, 5)".parse().unwrap();
    assert_eq!(errno(), ErrorCode::Success);

    // Text input
    assert!("[5, 1)".parse::<IntSpan>().is_err());
    assert_eq!(errno(), ErrorCode::InvalidArgValue);
    assert!("[1, 2".parse::<IntSpan>().is_err());
    assert_eq!(errno_reset(), ErrorCode::TextInput);
    assert_eq!(errno(), ErrorCode::Success);

    // Unsupported interpolation
    assert!("Interp=Linear;[1@2000-01-01, 2@2000-01-02]".parse::<Temporal<i32>>().is_err());
    assert_eq!(errno(), ErrorCode::FeatureNotSupported);

    // Binary input
    let mut bytes = span.as_wkb(WkbVariant::NDR).unwrap().to_vec();
    bytes.pop();
    assert!(IntSpan::from_wkb(&bytes).is_err());
    assert_eq!(errno(), ErrorCode::WkbInput);

    // Arithmetic
    let a: Temporal<i32> = "[4@2000-01-01, 4@2000-01-02]".parse().unwrap();
    let zero: Temporal<i32> = "[0@2000-01-01, 0@2000-01-02]".parse().unwrap();
    assert_eq!(a.div(&zero).unwrap_err(), ChronotopeError::DivisionByZero);
    assert_eq!(errno(), ErrorCode::DivisionByZero);

    // Aggregation of incompatible inputs
    let mut agg = chronotope::Aggregator::tsum();
    agg.add(&a).unwrap();
    let discrete: Temporal<i32> = "{1@2000-01-01}".parse().unwrap();
    assert!(agg.add(&discrete).is_err());
    assert_eq!(errno(), ErrorCode::AggregationError);

    clear_error_handler();
    assert!("garbage".parse::<IntSpan>().is_err());

    let seen = seen.lock();
    let codes: Vec<ErrorCode> = seen.iter().map(|(_, code, _)| *code).collect();
    assert_eq!(
        codes,
        vec![
            ErrorCode::InvalidArgValue,
            ErrorCode::TextInput,
            ErrorCode::FeatureNotSupported,
            ErrorCode::WkbInput,
            ErrorCode::DivisionByZero,
            ErrorCode::AggregationError,
        ]
    );
    assert!(seen.iter().all(|(level, _, msg)| *level == ErrorLevel::Error && !msg.is_empty()));
    assert_eq!(errno(), ErrorCode::TextInput);
}
