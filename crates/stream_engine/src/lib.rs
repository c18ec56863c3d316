//! Stream engine: remote search-job client and the viewer-facing calls built on it.
mod client;
mod config;
mod decode;
mod driver;
mod endpoints;
mod engine;
mod forward;
mod nonce;
mod query;
mod render;
mod token;
mod types;

pub use client::{ReqwestSearchJobClient, SearchJobApi};
pub use config::{ApiSettings, ServiceConfig};
pub use decode::{decode_job_status, decode_messages, decode_submission, normalize_meta};
pub use driver::SearchDriver;
pub use endpoints::{
    AjaxReply, CheckJobRequest, JobStatusReply, LoadResultsRequest, RejectReason, ResultsReply,
    SearchEndpoints, NONCE_ACTION,
};
pub use engine::{EngineEvent, EngineHandle};
pub use forward::RecordForwarder;
pub use nonce::{NonceError, NonceIssuer, NONCE_TICK_SECS};
pub use query::{
    local_time_zone, search_interval, SearchArgs, SearchQuery, SubmitBody, REMOTE_TIME_FORMAT,
};
pub use render::{RowFormat, RowRenderer, TableRowRenderer};
pub use token::{random_secret, JobTokenCodec, TokenError};
pub use types::{
    ApiError, Event, JobHandle, JobState, JobStatusReport, ResultPage, DEFAULT_PAGE_SIZE,
};
