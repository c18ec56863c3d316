use crate::{JobStatus, Viewport};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// The viewer opened with the job token handed over by the search page.
    PageOpened {
        job: Option<String>,
        viewport: Viewport,
    },
    /// Poll timer fired, or the user asked to re-check the job.
    PollDue,
    /// Server answered a status check.
    StatusReceived {
        status: JobStatus,
        label: String,
        count: u64,
    },
    /// Status check failed.
    StatusFailed { message: String },
    /// Server delivered one page of rendered rows.
    PageReceived { count: u64, rows: Vec<String> },
    /// Page load failed.
    PageFailed { message: String },
    /// The user scrolled or the viewer was resized.
    ViewportChanged(Viewport),
    /// UI/render tick to coalesce rendering.
    Tick,
    /// Fallback for placeholder wiring.
    NoOp,
}
