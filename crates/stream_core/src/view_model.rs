pub const STATUS_LOADING: &str = "Loading";
pub const STATUS_ERROR: &str = "Error occurred";

pub const EMPTY_LOADING: &str = "Loading...";
pub const EMPTY_NOTHING_FOUND: &str = "Nothing found";
pub const EMPTY_ERROR: &str = "Error occurred. Try to refresh the page.";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PagingViewModel {
    /// Remote status label, or a placeholder before the first poll.
    pub status_text: String,
    /// Running result count; `None` until the first status arrives.
    pub found: Option<u64>,
    pub rows: Vec<String>,
    pub loaded_count: u64,
    pub spinner_visible: bool,
    /// Shown in place of the list while it has no rows.
    pub empty_message: Option<&'static str>,
    /// User-visible alert text for the failure that halted the session.
    pub error: Option<String>,
    pub settled: bool,
    pub dirty: bool,
}
