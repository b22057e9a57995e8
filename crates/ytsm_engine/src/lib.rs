//! ytsm engine: HTTP plumbing and response decoding for the page.
mod decode;
mod engine;
mod fragment;
mod http;
mod listing;
mod types;

pub use decode::{
    decode_html, decode_jobs, decode_notifications, decode_submit_reply, decode_tree, DecodeError,
};
pub use engine::{
    handle_command, ChannelEventSink, EngineCommand, EngineConfig, EngineHandle, EventSink,
    DEFAULT_JOBS_PATH, DEFAULT_NOTIFICATIONS_PATH, DEFAULT_TREE_PATH, DEFAULT_VIDEOS_PATH,
};
pub use fragment::{parse_fragment, FragmentError};
pub use http::{FormBody, HttpSettings, ReqwestTransport, Transport};
pub use listing::parse_video_page;
pub use types::{EngineEvent, FailureKind, HttpReply, RequestError};
