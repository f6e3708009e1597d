pub(crate) const STATUS_READY: &str = "Ready";
pub(crate) const STATUS_CANCELLED: &str = "Cancelled";
pub(crate) const STATUS_REFRESHING: &str = "Refreshing host status";

pub(crate) const LOG_TIMESTAMP_FORMAT: &str = "%m-%d %H:%M:%S";
pub(crate) const LOG_PARSE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub(crate) const LOG_SEPARATOR: &str = " | ";

pub(crate) const LOG_RETENTION_DAYS: i64 = 7;
pub(crate) const LOG_MAX_ENTRIES: usize = 10_000;
pub(crate) const LOG_MAX_IN_MEMORY: usize = 100;

pub(crate) const NO_HOST_SELECTED_MESSAGE: &str = "No host selected";
pub(crate) const HOST_NOT_ONLINE_MESSAGE: &str = "Selected host is not online";
pub(crate) const ACTIVATION_BUSY_MESSAGE: &str = "Already connecting";
pub(crate) const ADD_HOST_ERROR: &str = "Error adding host";

pub(crate) const NOTICE_CONNECT_FAILED_TITLE: &str = "Failed to connect!";
pub(crate) const NOTICE_DELETE_FAILED_TITLE: &str = "Error deleting host";
