use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Ask the server for the job's status and running result count.
    CheckStatus { job: String },
    /// Deliver `Msg::PollDue` once `after` has elapsed.
    SchedulePoll { after: Duration },
    /// Load one page of rendered results starting at `offset`.
    LoadPage { job: String, offset: u64 },
    /// Surface an error to the user.
    Alert { message: String },
}
