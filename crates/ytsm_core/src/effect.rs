use crate::action::AjaxAction;
use crate::modal::FormSubmission;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    FetchJobs { seq: u64 },
    StartPollTimer { interval_ms: u64 },
    StopPollTimer,
    FetchTree,
    LoadModal { token: u64, path: String },
    SubmitForm { token: u64, submission: FormSubmission },
    PostAction(AjaxAction),
    StartNotificationTimer { interval_ms: u64 },
    StopNotificationTimer,
    FetchNotifications { after_id: u64 },
    /// Post the filter form to the video list endpoint.
    FetchVideos {
        seq: u64,
        form: Vec<(String, String)>,
    },
}
