use ytsm_logging::{ytsm_debug, ytsm_info, ytsm_warn};

use crate::modal::{AfterSubmit, ModalRoute, SubmitReply, SubmitResolution};
use crate::notification::NOTIFICATION_INTERVAL_MS;
use crate::state::MAX_SKIPPED_POLL_TICKS;
use crate::toast::ToastOptions;
use crate::{AppState, Effect, Msg, PollOutcome};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::StartPolling => {
            if state.polling().active {
                return (state, Vec::new());
            }
            state.set_polling_active(true);
            let mut effects = vec![Effect::StartPollTimer {
                interval_ms: state.polling().interval_ms,
            }];
            if state.polling().in_flight.is_none() {
                effects.push(issue_poll(&mut state));
            }
            effects
        }
        Msg::StopPolling => {
            if !state.polling().active {
                return (state, Vec::new());
            }
            state.set_polling_active(false);
            vec![Effect::StopPollTimer]
        }
        Msg::PollTimerFired => {
            let polling = state.polling();
            if !polling.active {
                Vec::new()
            } else if let Some(seq) = polling.in_flight {
                let skipped = state.skip_poll_tick();
                if skipped < MAX_SKIPPED_POLL_TICKS {
                    ytsm_debug!("Skipping poll tick, poll {} still outstanding", seq);
                    Vec::new()
                } else {
                    ytsm_warn!("Poll {} unanswered after {} ticks, polling again", seq, skipped);
                    vec![issue_poll(&mut state)]
                }
            } else {
                vec![issue_poll(&mut state)]
            }
        }
        Msg::JobsPolled { seq, outcome } => {
            if !state.finish_poll(seq) {
                ytsm_debug!("Dropping reply for stale poll {}", seq);
                return (state, Vec::new());
            }
            ytsm_logging::set_poll_seq(seq);
            match outcome {
                PollOutcome::Jobs(jobs) => state.apply_jobs(&jobs),
                PollOutcome::NotJson { content_type } => {
                    ytsm_warn!(
                        "Jobs endpoint answered with content type {:?}; clearing job panel",
                        content_type
                    );
                    state.clear_jobs();
                }
                PollOutcome::Failed(reason) => {
                    ytsm_warn!("Job poll failed, keeping last job list: {}", reason);
                }
            }
            Vec::new()
        }
        Msg::Tick { now_ms } => {
            state.set_clock(now_ms);
            state.expire_toasts();
            if state.videos().reload_due(now_ms) {
                vec![reload_videos(&mut state)]
            } else {
                Vec::new()
            }
        }
        Msg::TreeRefreshRequested => vec![Effect::FetchTree],
        Msg::TreeLoaded(Ok(nodes)) => {
            state.set_tree(nodes);
            Vec::new()
        }
        Msg::TreeLoaded(Err(reason)) => {
            ytsm_warn!("Tree refresh failed: {}", reason);
            let now = state.clock();
            state.toasts_mut().error(
                "Could not load subscriptions",
                ToastOptions::with_body(reason),
                now,
            );
            Vec::new()
        }
        Msg::EditNodeClicked(node) => {
            open_modal(&mut state, node.edit_route(), AfterSubmit::RefreshTree)
        }
        Msg::DeleteNodeClicked(node) => {
            open_modal(&mut state, node.delete_route(), AfterSubmit::RefreshTree)
        }
        Msg::OpenModal {
            route,
            after_submit,
        } => open_modal(&mut state, route, after_submit),
        Msg::ModalLoaded { token, result } => {
            match state.modal_for(token) {
                Some(modal) => match result {
                    Ok(form) => modal.on_loaded(form),
                    Err(reason) => {
                        ytsm_warn!("Loading dialog {} failed: {}", token, reason);
                        modal.on_load_failed();
                    }
                },
                None => ytsm_debug!("Ignoring fragment for closed dialog {}", token),
            }
            state.mark_dirty();
            Vec::new()
        }
        Msg::ModalSubmitted { values, files } => {
            let Some(modal) = state.modal_mut() else {
                return (state, Vec::new());
            };
            let token = modal.token();
            match modal.begin_submit(values, files) {
                Some(submission) => {
                    state.mark_dirty();
                    vec![Effect::SubmitForm { token, submission }]
                }
                None => Vec::new(),
            }
        }
        Msg::ModalReplied { token, result } => {
            let Some(modal) = state.modal_for(token) else {
                ytsm_debug!("Ignoring reply for closed dialog {}", token);
                return (state, Vec::new());
            };
            let resolution = match result {
                Ok(raw) => modal.on_submit_reply(SubmitReply::interpret(raw)),
                Err(reason) => {
                    ytsm_warn!("Submitting dialog {} failed: {}", token, reason);
                    modal.on_submit_failed();
                    SubmitResolution::Stay
                }
            };
            state.mark_dirty();
            match resolution {
                SubmitResolution::Close(after_submit) => {
                    state.close_modal();
                    after_submit_effects(&mut state, after_submit)
                }
                SubmitResolution::Stay => Vec::new(),
            }
        }
        Msg::ModalDismissed => {
            state.close_modal();
            Vec::new()
        }
        Msg::ActionClicked(action) => vec![Effect::PostAction(action)],
        Msg::ActionCompleted { action, result } => {
            let now = state.clock();
            let accepted = matches!(
                result.as_ref().map(|raw| SubmitReply::interpret(raw.clone())),
                Ok(SubmitReply::Accepted)
            );
            if accepted {
                ytsm_info!("{} accepted", action.label());
                state
                    .toasts_mut()
                    .success(action.label(), ToastOptions::default(), now);
            } else {
                ytsm_warn!("{} failed: {:?}", action.label(), result);
                state.toasts_mut().error(
                    action.label(),
                    ToastOptions::with_body("The server could not perform this action."),
                    now,
                );
            }
            Vec::new()
        }
        Msg::ToastDismissed(id) => {
            state.toasts_mut().dismiss(id);
            Vec::new()
        }
        Msg::StartNotifications => {
            if state.notifications().is_active() {
                return (state, Vec::new());
            }
            state.mark_dirty();
            let poller = state.notifications_mut();
            poller.set_active(true);
            let mut effects = vec![Effect::StartNotificationTimer {
                interval_ms: NOTIFICATION_INTERVAL_MS,
            }];
            effects.extend(
                poller
                    .tick(MAX_SKIPPED_POLL_TICKS)
                    .map(|after_id| Effect::FetchNotifications { after_id }),
            );
            effects
        }
        Msg::StopNotifications => {
            if !state.notifications().is_active() {
                return (state, Vec::new());
            }
            state.notifications_mut().set_active(false);
            state.mark_dirty();
            vec![Effect::StopNotificationTimer]
        }
        Msg::NotificationTimerFired => state
            .notifications_mut()
            .tick(MAX_SKIPPED_POLL_TICKS)
            .map(|after_id| Effect::FetchNotifications { after_id })
            .into_iter()
            .collect(),
        Msg::NotificationsPolled { after_id, result } => {
            match result {
                Ok(entries) => {
                    if let Some(line) = state.notifications_mut().receive(after_id, &entries) {
                        state.set_status_line(line);
                    }
                }
                Err(reason) => {
                    ytsm_debug!("Notification request from {} failed: {}", after_id, reason);
                    state.notifications_mut().fail(after_id);
                }
            }
            Vec::new()
        }
        Msg::TreeSelectionChanged(node) => {
            state.videos_mut().filter_mut().select(node);
            vec![reload_videos(&mut state)]
        }
        Msg::VideoFilterEdited(edit) => {
            let now = state.clock();
            let videos = state.videos_mut();
            videos.filter_mut().apply(edit);
            videos.schedule_reload(now);
            Vec::new()
        }
        Msg::VideoPageClicked(page) => {
            state.videos_mut().filter_mut().page = page.max(1);
            vec![reload_videos(&mut state)]
        }
        Msg::VideosReloadRequested => vec![reload_videos(&mut state)],
        Msg::VideosLoaded { seq, result } => {
            if let Err(reason) = &result {
                ytsm_warn!("Video list request {} failed: {}", seq, reason);
            }
            if !state.videos_mut().finish_load(seq, result) {
                ytsm_debug!("Dropping superseded video list {}", seq);
            }
            Vec::new()
        }
    };

    (state, effects)
}

fn issue_poll(state: &mut AppState) -> Effect {
    let seq = state.begin_poll();
    ytsm_logging::set_poll_seq(seq);
    Effect::FetchJobs { seq }
}

fn open_modal(state: &mut AppState, route: ModalRoute, after_submit: AfterSubmit) -> Vec<Effect> {
    let token = state.open_modal(route, after_submit);
    vec![Effect::LoadModal {
        token,
        path: route.path(),
    }]
}

fn reload_videos(state: &mut AppState) -> Effect {
    let (seq, form) = state.videos_mut().begin_load();
    Effect::FetchVideos { seq, form }
}

fn after_submit_effects(state: &mut AppState, after_submit: AfterSubmit) -> Vec<Effect> {
    match after_submit {
        AfterSubmit::Nothing => Vec::new(),
        AfterSubmit::RefreshTree => vec![Effect::FetchTree],
        AfterSubmit::ReloadVideos => vec![reload_videos(state)],
    }
}
