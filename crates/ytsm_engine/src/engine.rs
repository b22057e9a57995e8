use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use url::Url;
use ytsm_core::{
    AjaxAction, FormEncoding, FormSubmission, ModalForm, Notification, PollOutcome,
    RawSubmitReply, TreeNode, VideoPage,
};
use ytsm_logging::{ytsm_debug, ytsm_error, ytsm_warn};

use crate::decode::{
    decode_html, decode_jobs, decode_notifications, decode_submit_reply, decode_tree,
};
use crate::fragment::parse_fragment;
use crate::http::{FormBody, HttpSettings, ReqwestTransport, Transport};
use crate::listing::parse_video_page;
use crate::{EngineEvent, FailureKind, RequestError};

pub const DEFAULT_JOBS_PATH: &str = "ajax/get_running_jobs/";
pub const DEFAULT_TREE_PATH: &str = "ajax/get_tree/";
/// The last notification id is appended to this path.
pub const DEFAULT_NOTIFICATIONS_PATH: &str = "ajax/get_notifications/";
pub const DEFAULT_VIDEOS_PATH: &str = "ajax/get_videos/";

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Site root every path is joined onto. Always ends with `/`.
    pub base_url: Url,
    pub jobs_path: String,
    pub tree_path: String,
    pub notifications_path: String,
    pub videos_path: String,
    pub http: HttpSettings,
}

impl EngineConfig {
    pub fn new(base_url: &str) -> Result<Self, RequestError> {
        let mut base_url = Url::parse(base_url)
            .map_err(|err| RequestError::new(FailureKind::InvalidUrl, err.to_string()))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            base_url,
            jobs_path: DEFAULT_JOBS_PATH.to_string(),
            tree_path: DEFAULT_TREE_PATH.to_string(),
            notifications_path: DEFAULT_NOTIFICATIONS_PATH.to_string(),
            videos_path: DEFAULT_VIDEOS_PATH.to_string(),
            http: HttpSettings::default(),
        })
    }

    pub fn resolve(&self, path: &str) -> Result<Url, RequestError> {
        self.base_url
            .join(path)
            .map_err(|err| RequestError::new(FailureKind::InvalidUrl, err.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCommand {
    PollJobs { seq: u64 },
    LoadTree,
    LoadModal { token: u64, path: String },
    SubmitModal { token: u64, submission: FormSubmission },
    PostAction(AjaxAction),
    FetchNotifications { after_id: u64 },
    LoadVideos {
        seq: u64,
        form: Vec<(String, String)>,
    },
}

impl EngineCommand {
    /// The event reporting that this command could not be carried out at all.
    pub fn failed(self, err: RequestError) -> EngineEvent {
        match self {
            EngineCommand::PollJobs { seq } => EngineEvent::JobsPolled {
                seq,
                outcome: PollOutcome::Failed(err.to_string()),
            },
            EngineCommand::LoadTree => EngineEvent::TreeLoaded(Err(err)),
            EngineCommand::LoadModal { token, .. } => EngineEvent::ModalLoaded {
                token,
                result: Err(err),
            },
            EngineCommand::SubmitModal { token, .. } => EngineEvent::ModalReplied {
                token,
                result: Err(err),
            },
            EngineCommand::PostAction(action) => EngineEvent::ActionCompleted {
                action,
                result: Err(err),
            },
            EngineCommand::FetchNotifications { after_id } => EngineEvent::NotificationsPolled {
                after_id,
                result: Err(err),
            },
            EngineCommand::LoadVideos { seq, .. } => EngineEvent::VideosLoaded {
                seq,
                result: Err(err),
            },
        }
    }
}

pub trait EventSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelEventSink {
    tx: mpsc::Sender<EngineEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

/// Runs requests on a background tokio runtime and hands results back
/// through a channel the page loop drains.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(config: EngineConfig) -> Result<Self, RequestError> {
        let transport = ReqwestTransport::new(&config.http)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    pub fn with_transport(config: EngineConfig, transport: Arc<dyn Transport>) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let config = Arc::new(config);

        thread::spawn(move || {
            let runtime = match tokio::runtime::Runtime::new() {
                Ok(runtime) => runtime,
                Err(err) => {
                    ytsm_error!("Could not start engine runtime: {}", err);
                    let sink = ChannelEventSink::new(event_tx);
                    fail_all(cmd_rx, &sink, &err.to_string());
                    return;
                }
            };
            while let Ok(command) = cmd_rx.recv() {
                let transport = transport.clone();
                let config = config.clone();
                let sink = ChannelEventSink::new(event_tx.clone());
                runtime.spawn(async move {
                    handle_command(&config, transport.as_ref(), command, &sink).await;
                });
            }
        });

        Self { cmd_tx, event_rx }
    }

    pub fn send(&self, command: EngineCommand) {
        if self.cmd_tx.send(command).is_err() {
            ytsm_warn!("Engine worker is gone; dropping command");
        }
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }
}

/// Answers every command with a failure until the sender goes away.
fn fail_all(cmd_rx: mpsc::Receiver<EngineCommand>, sink: &dyn EventSink, reason: &str) {
    while let Ok(command) = cmd_rx.recv() {
        sink.emit(command.failed(RequestError::new(FailureKind::Network, reason)));
    }
}

pub async fn handle_command(
    config: &EngineConfig,
    transport: &dyn Transport,
    command: EngineCommand,
    sink: &dyn EventSink,
) {
    ytsm_debug!("Engine command {:?}", command);
    let event = match command {
        EngineCommand::PollJobs { seq } => EngineEvent::JobsPolled {
            seq,
            outcome: poll_jobs(config, transport).await,
        },
        EngineCommand::LoadTree => EngineEvent::TreeLoaded(load_tree(config, transport).await),
        EngineCommand::LoadModal { token, path } => EngineEvent::ModalLoaded {
            token,
            result: load_modal(config, transport, &path).await,
        },
        EngineCommand::SubmitModal { token, submission } => EngineEvent::ModalReplied {
            token,
            result: submit_modal(config, transport, submission).await,
        },
        EngineCommand::PostAction(action) => EngineEvent::ActionCompleted {
            action,
            result: post_action(config, transport, action).await,
        },
        EngineCommand::FetchNotifications { after_id } => EngineEvent::NotificationsPolled {
            after_id,
            result: fetch_notifications(config, transport, after_id).await,
        },
        EngineCommand::LoadVideos { seq, form } => EngineEvent::VideosLoaded {
            seq,
            result: load_videos(config, transport, form).await,
        },
    };
    sink.emit(event);
}

async fn poll_jobs(config: &EngineConfig, transport: &dyn Transport) -> PollOutcome {
    let reply = match config.resolve(&config.jobs_path) {
        Ok(url) => transport.get(url).await,
        Err(err) => Err(err),
    };
    match reply {
        Ok(reply) => decode_jobs(&reply),
        Err(err) => PollOutcome::Failed(err.to_string()),
    }
}

async fn load_tree(
    config: &EngineConfig,
    transport: &dyn Transport,
) -> Result<Vec<TreeNode>, RequestError> {
    let reply = transport.get(config.resolve(&config.tree_path)?).await?;
    decode_tree(&reply.body).map_err(decode_failure)
}

async fn load_modal(
    config: &EngineConfig,
    transport: &dyn Transport,
    path: &str,
) -> Result<ModalForm, RequestError> {
    let reply = transport.get(config.resolve(path)?).await?;
    let html = decode_html(&reply.body, reply.content_type.as_deref()).map_err(decode_failure)?;
    parse_fragment(&html).map_err(decode_failure)
}

async fn submit_modal(
    config: &EngineConfig,
    transport: &dyn Transport,
    submission: FormSubmission,
) -> Result<RawSubmitReply, RequestError> {
    let url = config.resolve(&submission.action)?;
    let body = match submission.encoding {
        FormEncoding::UrlEncoded => FormBody::UrlEncoded(submission.values),
        FormEncoding::Multipart => FormBody::Multipart {
            values: submission.values,
            files: submission.files,
        },
    };
    let reply = transport.post(url, body).await?;
    Ok(decode_submit_reply(&reply.body))
}

async fn post_action(
    config: &EngineConfig,
    transport: &dyn Transport,
    action: AjaxAction,
) -> Result<RawSubmitReply, RequestError> {
    let reply = transport.post(config.resolve(&action.path())?, FormBody::Empty).await?;
    Ok(decode_submit_reply(&reply.body))
}

async fn fetch_notifications(
    config: &EngineConfig,
    transport: &dyn Transport,
    after_id: u64,
) -> Result<Vec<Notification>, RequestError> {
    let path = format!("{}{}", config.notifications_path, after_id);
    let reply = transport.get(config.resolve(&path)?).await?;
    decode_notifications(&reply.body).map_err(decode_failure)
}

async fn load_videos(
    config: &EngineConfig,
    transport: &dyn Transport,
    form: Vec<(String, String)>,
) -> Result<VideoPage, RequestError> {
    let url = config.resolve(&config.videos_path)?;
    let reply = transport.post(url, FormBody::UrlEncoded(form)).await?;
    let html = decode_html(&reply.body, reply.content_type.as_deref()).map_err(decode_failure)?;
    Ok(parse_video_page(&html))
}

fn decode_failure(err: impl std::fmt::Display) -> RequestError {
    RequestError::new(FailureKind::Decode, err.to_string())
}
