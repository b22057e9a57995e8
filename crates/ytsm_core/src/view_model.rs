use crate::job::JobId;
use crate::modal::{ErrorBlock, Modal, ModalPhase, ModalRoute};
use crate::toast::Toast;
use crate::tree::TreeNodeRef;
use crate::videos::{VideoFilter, VideoListContent};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppViewModel {
    pub polling: bool,
    pub job_count: usize,
    pub summary: String,
    pub aggregate_progress: f64,
    pub aggregate_visible: bool,
    pub jobs: Vec<JobRowView>,
    pub modal: Option<ModalView>,
    pub toasts: Vec<Toast>,
    pub tree: Vec<TreeRowView>,
    pub notifications: bool,
    pub video_filter: VideoFilter,
    pub videos: VideoListContent,
    pub videos_loading: bool,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JobRowView {
    pub job_id: JobId,
    pub description: String,
    pub message: String,
    pub progress: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModalView {
    pub route: ModalRoute,
    pub phase: ModalPhase,
    pub title: Option<String>,
    pub fields: Vec<String>,
    pub errors: Vec<ErrorBlock>,
    pub error_slot: Option<String>,
    pub notice: Option<String>,
    pub inputs_disabled: bool,
}

impl ModalView {
    pub(crate) fn from_modal(modal: &Modal) -> Self {
        let form = modal.form();
        Self {
            route: modal.route(),
            phase: modal.phase(),
            title: form.and_then(|form| form.title.clone()),
            fields: form.map(|form| form.fields.clone()).unwrap_or_default(),
            errors: modal.errors().to_vec(),
            error_slot: modal.error_slot().map(str::to_string),
            notice: modal.notice().map(str::to_string),
            inputs_disabled: modal.inputs_disabled(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeRowView {
    pub depth: usize,
    pub node: TreeNodeRef,
    pub text: String,
}
