use std::time::Duration;

use crate::view_model::{
    PagingViewModel, EMPTY_ERROR, EMPTY_LOADING, EMPTY_NOTHING_FOUND, STATUS_ERROR,
    STATUS_LOADING,
};

/// Canonical status of a remote search job, as seen by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Submitted,
    Gathering,
    Done,
    Cancelled,
    Error,
}

impl JobStatus {
    /// No further status changes occur after a terminal status.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Cancelled | JobStatus::Error)
    }
}

/// Where the status-poll loop currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PollPhase {
    /// No job handle; nothing to poll.
    #[default]
    Idle,
    /// A status request is in flight.
    Polling,
    /// The next status request is scheduled.
    Waiting,
    /// The job reached `Done` or `Cancelled`.
    Terminal,
    /// A poll or page request failed; the session is halted.
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagingConfig {
    pub page_size: u64,
    pub poll_interval: Duration,
    /// Distance from the end of the list, in rows, that counts as "hit bottom".
    pub bottom_threshold_rows: u64,
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            page_size: 20,
            poll_interval: Duration::from_secs(1),
            bottom_threshold_rows: 10,
        }
    }
}

/// Visible window over the loaded rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    pub first_visible_row: u64,
    pub visible_rows: u64,
}

impl Viewport {
    /// Viewport scrolled so that the last of `content_rows` is visible.
    pub fn at_bottom(content_rows: u64, visible_rows: u64) -> Self {
        Self {
            first_visible_row: content_rows.saturating_sub(visible_rows),
            visible_rows,
        }
    }

    pub fn overflows(&self, content_rows: u64) -> bool {
        content_rows > self.visible_rows
    }

    pub fn near_bottom(&self, content_rows: u64, threshold_rows: u64) -> bool {
        self.first_visible_row + self.visible_rows + threshold_rows > content_rows
    }
}

/// Client paging state for one viewer session.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PagingState {
    config: PagingConfig,
    job: Option<String>,
    opened: bool,
    phase: PollPhase,
    status: Option<JobStatus>,
    status_label: Option<String>,
    results_count: u64,
    loaded_count: u64,
    loading: bool,
    /// Job was already terminal when the in-flight page was requested.
    page_requested_terminal: bool,
    poll_in_flight: bool,
    errored: bool,
    error_message: Option<String>,
    hit_bottom: bool,
    exhausted: bool,
    viewport: Viewport,
    rows: Vec<String>,
    dirty: bool,
}

impl PagingState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: PagingConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &PagingConfig {
        &self.config
    }

    pub fn job(&self) -> Option<&str> {
        self.job.as_deref()
    }

    pub fn phase(&self) -> PollPhase {
        self.phase
    }

    pub fn status(&self) -> Option<JobStatus> {
        self.status
    }

    pub fn results_count(&self) -> u64 {
        self.results_count
    }

    pub fn loaded_count(&self) -> u64 {
        self.loaded_count
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_errored(&self) -> bool {
        self.errored
    }

    pub fn hit_bottom(&self) -> bool {
        self.hit_bottom
    }

    pub fn rows(&self) -> &[String] {
        &self.rows
    }

    /// All rows the job will produce have been loaded.
    pub fn all_loaded(&self) -> bool {
        self.exhausted || (self.loaded_count > 0 && self.results_count <= self.loaded_count)
    }

    /// Nothing more will happen without a new job: the session failed, or the
    /// job is terminal and every result has been loaded.
    pub fn is_settled(&self) -> bool {
        match self.phase {
            PollPhase::Failed => true,
            PollPhase::Terminal => {
                !self.loading && (self.results_count == 0 || self.all_loaded())
            }
            PollPhase::Idle => self.opened && self.job.is_none(),
            PollPhase::Polling | PollPhase::Waiting => false,
        }
    }

    pub fn view(&self) -> PagingViewModel {
        let status_text = if self.errored {
            STATUS_ERROR.to_string()
        } else {
            self.status_label
                .clone()
                .unwrap_or_else(|| STATUS_LOADING.to_string())
        };

        let empty_message = if self.errored {
            Some(EMPTY_ERROR)
        } else if !self.rows.is_empty() {
            None
        } else if self.nothing_to_show() {
            Some(EMPTY_NOTHING_FOUND)
        } else {
            Some(EMPTY_LOADING)
        };

        let spinner_visible = !self.errored
            && (self.loading
                || matches!(self.phase, PollPhase::Polling | PollPhase::Waiting));

        PagingViewModel {
            status_text,
            found: self.status.map(|_| self.results_count),
            rows: self.rows.clone(),
            loaded_count: self.loaded_count,
            spinner_visible,
            empty_message,
            error: self.error_message.clone(),
            settled: self.is_settled(),
            dirty: self.dirty,
        }
    }

    fn nothing_to_show(&self) -> bool {
        match self.phase {
            PollPhase::Terminal => self.results_count == 0,
            PollPhase::Idle => self.opened && self.job.is_none(),
            _ => false,
        }
    }

    /// Returns whether state changed since the last call, and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn open(&mut self, job: Option<String>, viewport: Viewport) {
        self.job = job.filter(|job| !job.is_empty());
        self.opened = true;
        self.viewport = viewport;
        self.phase = PollPhase::Idle;
        self.mark_dirty();
    }

    /// Claims the poll slot. Returns the job to poll, or `None` when polling
    /// is not allowed (no job, halted, terminal, or a poll already in flight).
    pub(crate) fn begin_poll(&mut self) -> Option<String> {
        if self.errored || self.poll_in_flight {
            return None;
        }
        if matches!(self.phase, PollPhase::Terminal | PollPhase::Failed) {
            return None;
        }
        let job = self.job.clone()?;
        self.poll_in_flight = true;
        self.phase = PollPhase::Polling;
        self.mark_dirty();
        Some(job)
    }

    pub(crate) fn apply_status(&mut self, status: JobStatus, label: String, count: u64) {
        self.poll_in_flight = false;
        self.status = Some(status);
        self.status_label = Some(label);
        self.results_count = count;
        self.phase = if status.is_terminal() {
            PollPhase::Terminal
        } else {
            PollPhase::Waiting
        };
        self.mark_dirty();
    }

    /// Claims the page slot. Returns `(job, offset)` for the next page, or
    /// `None` when a page is already in flight.
    pub(crate) fn begin_page(&mut self) -> Option<(String, u64)> {
        if self.loading {
            return None;
        }
        let job = self.job.clone()?;
        self.loading = true;
        self.page_requested_terminal = self.status.is_some_and(JobStatus::is_terminal);
        self.hit_bottom = false;
        self.mark_dirty();
        Some((job, self.loaded_count))
    }

    pub(crate) fn apply_page(&mut self, count: u64, rows: Vec<String>) {
        self.loading = false;
        self.loaded_count += count;
        self.rows.extend(rows);
        // A short page only means "no more" if the job had stopped gathering
        // before the page was requested.
        let requested_terminal = std::mem::take(&mut self.page_requested_terminal);
        if requested_terminal && count < self.config.page_size {
            self.exhausted = true;
        }
        self.mark_dirty();
    }

    pub(crate) fn fail(&mut self, message: String) {
        self.errored = true;
        self.loading = false;
        self.poll_in_flight = false;
        self.phase = PollPhase::Failed;
        self.error_message = Some(message);
        self.mark_dirty();
    }

    pub(crate) fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        if viewport.near_bottom(self.loaded_count, self.config.bottom_threshold_rows) {
            self.hit_bottom = true;
        }
    }

    /// The "should we fetch more pages now?" predicate.
    pub(crate) fn wants_more(&self) -> bool {
        if self.results_count == 0 || self.errored || self.all_loaded() {
            return false;
        }
        self.loaded_count == 0 || !self.viewport.overflows(self.loaded_count) || self.hit_bottom
    }
}
