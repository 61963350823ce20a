//! Assertion macros for client results

/// Unwrap a client call's `Ok` value, panicking with the error's debug form
#[macro_export]
macro_rules! assert_ok {
    ($call:expr) => {
        match $call {
            Ok(value) => value,
            Err(error) => panic!("client call failed: {:?}", error),
        }
    };
}

/// Assert that an error message mentions `needle`
#[macro_export]
macro_rules! assert_contains {
    ($message:expr, $needle:expr) => {{
        let message = $message;
        assert!(
            message.contains($needle),
            "{:?} does not mention {:?}",
            message,
            $needle
        );
    }};
}
