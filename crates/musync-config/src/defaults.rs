//! Default value functions for serde deserialization.
//!
//! These functions forward to constants defined in `musync_core::defaults`.

use musync_core::defaults;

/// Generate default value functions that forward to musync_core::defaults constants.
macro_rules! default_fns {
    // For Copy types (integers, bool, etc.)
    ($($fn_name:ident => $const_name:ident : $ty:ty),* $(,)?) => {
        $(
            pub(crate) fn $fn_name() -> $ty {
                defaults::$const_name
            }
        )*
    };
}

/// Generate default value functions that return String from &str constants.
macro_rules! default_string_fns {
    ($($fn_name:ident => $const_name:ident),* $(,)?) => {
        $(
            pub(crate) fn $fn_name() -> String {
                defaults::$const_name.to_string()
            }
        )*
    };
}

default_fns! {
    default_reconcile_secs        => DEFAULT_RECONCILE_SECS: u64,
    default_traffic_secs          => DEFAULT_TRAFFIC_SECS: u64,
    default_load_secs             => DEFAULT_LOAD_SECS: u64,
    default_quality_secs          => DEFAULT_QUALITY_SECS: u64,
    default_io_timeout_secs       => DEFAULT_IO_TIMEOUT_SECS: u64,
    default_quality_target_timeout_secs => DEFAULT_QUALITY_TARGET_TIMEOUT_SECS: u64,
    default_quality_upload_bytes  => DEFAULT_QUALITY_UPLOAD_BYTES: usize,
}

default_string_fns! {
    default_identity_field    => DEFAULT_IDENTITY_FIELD,
    default_proxy_config_path => DEFAULT_PROXY_CONFIG_PATH,
    default_method            => DEFAULT_METHOD,
}
