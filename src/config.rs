use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "Dosewatch";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Follow-up delay bounds (minutes). A stored value outside this range is
/// clamped on write; a missing or non-positive value reads as the default.
pub const FOLLOW_UP_DELAY_MIN: i64 = 1;
pub const FOLLOW_UP_DELAY_MAX: i64 = 720;
pub const FOLLOW_UP_DELAY_DEFAULT: i64 = 60;

/// Bounded timeout for the caregiver-alert endpoint. The escalation handler
/// runs in a background-delivery context and must never hang on a dead request.
pub const CAREGIVER_REQUEST_TIMEOUT_SECS: u64 = 8;

/// Default tracing filter when RUST_LOG is not set
pub fn default_log_filter() -> String {
    format!("{}=info", env!("CARGO_PKG_NAME"))
}

/// Get the application data directory
/// ~/Dosewatch/ on all platforms (user-visible, per design requirement)
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join("Dosewatch")
}

/// Get the path of the local scheduling database
pub fn database_path() -> PathBuf {
    app_data_dir().join("scheduling.db")
}
