//! ytsm core: pure presentation state machine for the subscription manager page.
//!
//! Nothing in this crate performs IO. Network requests leave as [`Effect`]s,
//! their results come back as [`Msg`]s, and the job panel's document changes
//! are queued as [`DomCommand`]s for whoever owns the [`DomTree`].
mod action;
mod dom;
mod effect;
mod job;
mod modal;
mod msg;
mod notification;
mod panel;
mod state;
mod toast;
mod tree;
mod update;
mod videos;
mod view_model;

pub use action::AjaxAction;
pub use dom::{
    DomCommand, DomError, DomTree, ElementHandle, ElementId, JobElement, Part, Widget,
    WidgetState,
};
pub use effect::Effect;
pub use job::{clamp_progress, percent_label, Job, JobId};
pub use modal::{
    AfterSubmit, ErrorBlock, FieldErrors, FileUpload, FormEncoding, FormSubmission, Modal,
    ModalForm,
    ModalPhase, ModalRoute, Placement, RawSubmitReply, SubmitReply, SubmitResolution,
    ERROR_SLOT_TEXT, FORM_LEVEL_FIELD, INVALID_RESPONSE_TEXT, LOAD_FAILED_TEXT,
    SUBMIT_FAILED_TEXT,
};
pub use msg::{Msg, PollOutcome};
pub use notification::{
    Notification, NotificationPoller, NOTIFICATION_INTERVAL_MS, STATUS_UPDATE_KIND,
};
pub use panel::{JobEntry, JobPanel, JOB_DOM_ID_PREFIX};
pub use state::{AppState, PollingState, DEFAULT_POLL_INTERVAL_MS, MAX_SKIPPED_POLL_TICKS};
pub use toast::{Toast, ToastOptions, ToastQueue, DEFAULT_TOAST_DURATION_MS};
pub use tree::{
    can_drop, outline, NodeKind, TreeIdError, TreeNode, TreeNodeRef, TreeOperation, ROOT_PARENT,
};
pub use update::update;
pub use videos::{
    FilterEdit, ShowFilter, VideoCard, VideoFilter, VideoList, VideoListContent, VideoPage,
    VideoSort, DEFAULT_RESULTS_PER_PAGE, VIDEOS_FAILED_TEXT, VIDEO_RELOAD_DEBOUNCE_MS,
};
pub use view_model::{AppViewModel, JobRowView, ModalView, TreeRowView};
