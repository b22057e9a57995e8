use crate::action::AjaxAction;
use crate::job::Job;
use crate::modal::{AfterSubmit, FileUpload, ModalForm, ModalRoute, RawSubmitReply};
use crate::notification::Notification;
use crate::tree::{TreeNode, TreeNodeRef};
use crate::videos::{FilterEdit, VideoPage};

/// What a job poll came back with.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    Jobs(Vec<Job>),
    /// The endpoint answered with something other than `application/json`.
    NotJson { content_type: Option<String> },
    /// Transport failure or an undecodable JSON body.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// Begin periodic job polling; polls once right away.
    StartPolling,
    /// Stop periodic job polling and forget any outstanding poll.
    StopPolling,
    /// The poll timer elapsed.
    PollTimerFired,
    /// Reply to the poll issued with `seq`.
    JobsPolled { seq: u64, outcome: PollOutcome },
    /// Render clock, in milliseconds since start.
    Tick { now_ms: u64 },
    TreeRefreshRequested,
    TreeLoaded(Result<Vec<TreeNode>, String>),
    EditNodeClicked(TreeNodeRef),
    DeleteNodeClicked(TreeNodeRef),
    OpenModal {
        route: ModalRoute,
        after_submit: AfterSubmit,
    },
    ModalLoaded {
        token: u64,
        result: Result<ModalForm, String>,
    },
    /// User submitted the open dialog with these field values and chosen files.
    ModalSubmitted {
        values: Vec<(String, String)>,
        files: Vec<FileUpload>,
    },
    ModalReplied {
        token: u64,
        result: Result<RawSubmitReply, String>,
    },
    ModalDismissed,
    ActionClicked(AjaxAction),
    ActionCompleted {
        action: AjaxAction,
        result: Result<RawSubmitReply, String>,
    },
    ToastDismissed(u64),
    StartNotifications,
    StopNotifications,
    NotificationTimerFired,
    /// Reply to the notification request made from `after_id`.
    NotificationsPolled {
        after_id: u64,
        result: Result<Vec<Notification>, String>,
    },
    /// The tree selection changed; `None` when nothing is selected.
    TreeSelectionChanged(Option<TreeNodeRef>),
    VideoFilterEdited(FilterEdit),
    VideoPageClicked(u32),
    /// Reload the video list right away with the current filter.
    VideosReloadRequested,
    VideosLoaded {
        seq: u64,
        result: Result<VideoPage, String>,
    },
}
