//! Endpoint logging
//!
//! The endpoint logs at three levels: lifecycle transitions (`log_info!`),
//! protocol anomalies that drop data (`log_warn!`), and anomalies the
//! protocol tolerates, like sequence skips (`log_debug!`). All three route
//! through one dispatcher: defmt when the `defmt` feature is enabled, stdout
//! in host test builds, nothing otherwise.

/// Route one record to defmt or the host console
#[doc(hidden)]
#[macro_export]
macro_rules! __shtp_log {
    ($level:ident, $tag:literal, $($arg:tt)*) => {
        #[cfg(feature = "defmt")]
        ::defmt::$level!($($arg)*);

        #[cfg(all(not(feature = "defmt"), test))]
        println!(concat!("[", $tag, "] {}"), format!($($arg)*));
    };
}

/// Log an endpoint lifecycle transition
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        $crate::__shtp_log!(info, "INFO", $($arg)*)
    };
}

/// Log a protocol anomaly that discarded data
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        $crate::__shtp_log!(warn, "WARN", $($arg)*)
    };
}

/// Log a tolerated protocol anomaly
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        $crate::__shtp_log!(debug, "DEBUG", $($arg)*)
    };
}
