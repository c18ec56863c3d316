//! Stream core: pure client paging state machine and view-model helpers.
mod effect;
mod msg;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use msg::Msg;
pub use state::{JobStatus, PagingConfig, PagingState, PollPhase, Viewport};
pub use update::update;
pub use view_model::{
    PagingViewModel, EMPTY_ERROR, EMPTY_LOADING, EMPTY_NOTHING_FOUND, STATUS_ERROR,
    STATUS_LOADING,
};
