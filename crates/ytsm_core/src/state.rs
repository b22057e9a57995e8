use crate::dom::{DomCommand, Widget};
use crate::job::Job;
use crate::modal::{AfterSubmit, Modal, ModalRoute};
use crate::notification::NotificationPoller;
use crate::panel::JobPanel;
use crate::toast::ToastQueue;
use crate::tree::{outline, TreeNode};
use crate::videos::VideoList;
use crate::view_model::{AppViewModel, JobRowView, ModalView, TreeRowView};

/// Interval between job polls unless configured otherwise.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1500;
/// Timer ticks an unanswered request may block before it is abandoned.
pub const MAX_SKIPPED_POLL_TICKS: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollingState {
    pub active: bool,
    /// Sequence number of the poll awaiting its reply.
    pub in_flight: Option<u64>,
    pub last_seq: u64,
    pub interval_ms: u64,
    /// Ticks skipped while the current poll is outstanding.
    pub skipped_ticks: u32,
}

impl Default for PollingState {
    fn default() -> Self {
        Self {
            active: false,
            in_flight: None,
            last_seq: 0,
            interval_ms: DEFAULT_POLL_INTERVAL_MS,
            skipped_ticks: 0,
        }
    }
}

/// Everything the page shows, owned by one controller.
#[derive(Debug, Default)]
pub struct AppState {
    panel: JobPanel,
    polling: PollingState,
    modal: Option<Modal>,
    last_modal_token: u64,
    toasts: ToastQueue,
    tree: Vec<TreeNode>,
    notifications: NotificationPoller,
    videos: VideoList,
    clock_ms: u64,
    pending_dom: Vec<DomCommand>,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_poll_interval(interval_ms: u64) -> Self {
        let mut state = Self::default();
        state.polling.interval_ms = interval_ms;
        state
    }

    /// Asks the site for notifications from `last_id` on.
    pub fn with_notifications_from(mut self, last_id: u64) -> Self {
        self.notifications = NotificationPoller::starting_at(last_id);
        self
    }

    pub fn view(&self) -> AppViewModel {
        let jobs = self
            .panel
            .entries()
            .iter()
            .map(|entry| {
                let job = entry.job();
                JobRowView {
                    job_id: job.id,
                    description: job.description.clone(),
                    message: job.message.clone(),
                    progress: job.progress,
                }
            })
            .collect();

        let tree = outline(&self.tree)
            .into_iter()
            .map(|(depth, node)| TreeRowView {
                depth,
                node: node.node,
                text: node.text.clone(),
            })
            .collect();

        AppViewModel {
            polling: self.polling.active,
            job_count: self.panel.len(),
            summary: self.panel.summary_text(),
            aggregate_progress: self.panel.aggregate_progress(),
            aggregate_visible: self.panel.aggregate_visible(),
            jobs,
            modal: self.modal.as_ref().map(ModalView::from_modal),
            toasts: self.toasts.visible().to_vec(),
            tree,
            notifications: self.notifications.is_active(),
            video_filter: self.videos.filter().clone(),
            videos: self.videos.content().clone(),
            videos_loading: self.videos.is_loading(),
            dirty: self.dirty,
        }
    }

    pub fn panel(&self) -> &JobPanel {
        &self.panel
    }

    pub fn polling(&self) -> PollingState {
        self.polling
    }

    pub fn modal(&self) -> Option<&Modal> {
        self.modal.as_ref()
    }

    pub fn notifications(&self) -> &NotificationPoller {
        &self.notifications
    }

    pub fn videos(&self) -> &VideoList {
        &self.videos
    }

    /// Returns and clears the dirty flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Document changes produced since the last call, in order.
    pub fn drain_dom_commands(&mut self) -> Vec<DomCommand> {
        std::mem::take(&mut self.pending_dom)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn set_polling_active(&mut self, active: bool) {
        self.polling.active = active;
        if !active {
            self.polling.in_flight = None;
        }
        self.polling.skipped_ticks = 0;
        self.dirty = true;
    }

    /// Counts a tick skipped because a poll is outstanding; returns the count so far.
    pub(crate) fn skip_poll_tick(&mut self) -> u32 {
        self.polling.skipped_ticks += 1;
        self.polling.skipped_ticks
    }

    /// Allocates the next poll sequence number and marks it outstanding.
    pub(crate) fn begin_poll(&mut self) -> u64 {
        self.polling.skipped_ticks = 0;
        self.polling.last_seq += 1;
        self.polling.in_flight = Some(self.polling.last_seq);
        self.polling.last_seq
    }

    /// Settles the outstanding poll if `seq` matches it.
    pub(crate) fn finish_poll(&mut self, seq: u64) -> bool {
        if self.polling.in_flight == Some(seq) {
            self.polling.in_flight = None;
            self.polling.skipped_ticks = 0;
            true
        } else {
            false
        }
    }

    pub(crate) fn apply_jobs(&mut self, jobs: &[Job]) {
        let commands = self.panel.reconcile(jobs);
        self.pending_dom.extend(commands);
        self.dirty = true;
    }

    pub(crate) fn clear_jobs(&mut self) {
        let commands = self.panel.clear();
        self.pending_dom.extend(commands);
        self.dirty = true;
    }

    pub(crate) fn set_status_line(&mut self, text: String) {
        self.pending_dom.push(DomCommand::SetWidgetText {
            widget: Widget::StatusMessage,
            text,
        });
        self.dirty = true;
    }

    pub(crate) fn notifications_mut(&mut self) -> &mut NotificationPoller {
        &mut self.notifications
    }

    pub(crate) fn videos_mut(&mut self) -> &mut VideoList {
        self.dirty = true;
        &mut self.videos
    }

    pub(crate) fn set_clock(&mut self, now_ms: u64) {
        self.clock_ms = self.clock_ms.max(now_ms);
    }

    pub(crate) fn clock(&self) -> u64 {
        self.clock_ms
    }

    pub(crate) fn toasts_mut(&mut self) -> &mut ToastQueue {
        self.dirty = true;
        &mut self.toasts
    }

    pub(crate) fn expire_toasts(&mut self) {
        if self.toasts.expire(self.clock_ms) {
            self.dirty = true;
        }
    }

    pub(crate) fn set_tree(&mut self, nodes: Vec<TreeNode>) {
        self.tree = nodes;
        self.dirty = true;
    }

    /// Replaces any open dialog with a new one in the loading phase.
    pub(crate) fn open_modal(&mut self, route: ModalRoute, after_submit: AfterSubmit) -> u64 {
        self.last_modal_token += 1;
        self.modal = Some(Modal::loading(self.last_modal_token, route, after_submit));
        self.dirty = true;
        self.last_modal_token
    }

    /// The open dialog, if it is the one identified by `token`.
    pub(crate) fn modal_for(&mut self, token: u64) -> Option<&mut Modal> {
        self.modal.as_mut().filter(|modal| modal.token() == token)
    }

    pub(crate) fn modal_mut(&mut self) -> Option<&mut Modal> {
        self.modal.as_mut()
    }

    pub(crate) fn close_modal(&mut self) {
        if self.modal.take().is_some() {
            self.dirty = true;
        }
    }
}
