use std::fmt::Write;

use chrono::{DateTime, Local};
use ytsm_core::{
    AppViewModel, DomTree, ModalPhase, Placement, VideoListContent, Widget, VIDEOS_FAILED_TEXT,
};

const INDENT: &str = "  ";
const BAR_WIDTH: usize = 20;

/// Renders the page as plain text: status line, job panel, subscription tree,
/// video list, the open dialog and visible toasts.
pub fn render(view: &AppViewModel, dom: &DomTree, now: DateTime<Local>) -> String {
    let mut out = String::new();
    let polling = if view.polling { "polling" } else { "idle" };
    let _ = writeln!(out, "[{}] {} | jobs: {}", now.format("%H:%M:%S"), polling, view.job_count);

    render_status(&mut out, dom);
    render_jobs(&mut out, dom);
    render_tree(&mut out, view);
    render_videos(&mut out, view);
    render_modal(&mut out, view);

    for toast in &view.toasts {
        match &toast.body {
            Some(body) => {
                let _ = writeln!(out, "({}) {}: {}", toast.css_class, toast.caption, body);
            }
            None => {
                let _ = writeln!(out, "({}) {}", toast.css_class, toast.caption);
            }
        }
    }
    out
}

fn render_status(out: &mut String, dom: &DomTree) {
    let message = dom.widget(Widget::StatusMessage);
    let progress = dom.widget(Widget::StatusProgress);
    if message.visible && !message.text.is_empty() {
        let _ = writeln!(out, "{}", message.text);
    }
    if progress.visible {
        let _ = writeln!(out, "{} {}", bar(progress.width), progress.text);
    }
}

fn render_jobs(out: &mut String, dom: &DomTree) {
    let title = if dom.widget(Widget::PanelTitleNoJobs).visible {
        "No running jobs"
    } else {
        "Running jobs"
    };
    let _ = writeln!(out, "== {} ==", title);
    for element in dom.job_elements() {
        let _ = writeln!(out, "{}{}", INDENT, element.title);
        if !element.subtitle.is_empty() {
            let _ = writeln!(out, "{}{}{}", INDENT, INDENT, element.subtitle);
        }
        let _ = writeln!(
            out,
            "{}{}{} {}",
            INDENT,
            INDENT,
            bar(element.progress_width),
            element.progress_text
        );
    }
}

fn render_tree(out: &mut String, view: &AppViewModel) {
    if view.tree.is_empty() {
        return;
    }
    let _ = writeln!(out, "== Subscriptions ==");
    for row in &view.tree {
        let _ = writeln!(out, "{}{} [{}]", INDENT.repeat(row.depth + 1), row.text, row.node);
    }
}

fn render_videos(out: &mut String, view: &AppViewModel) {
    let filter = &view.video_filter;
    let scope = match (filter.folder_id, filter.subscription_id) {
        (Some(id), _) => format!("folder{}", id),
        (None, Some(id)) => format!("sub{}", id),
        (None, None) => "all".to_string(),
    };
    let loading = if view.videos_loading { " (loading)" } else { "" };
    let _ = writeln!(
        out,
        "== Videos: {} | {} | page {}{} ==",
        scope,
        filter.sort.as_str(),
        filter.page,
        loading
    );
    match &view.videos {
        VideoListContent::NotLoaded => {}
        VideoListContent::Failed => {
            let _ = writeln!(out, "{}{}", INDENT, VIDEOS_FAILED_TEXT);
        }
        VideoListContent::Loaded(page) => {
            for video in &page.videos {
                let actions: Vec<String> = video.actions.iter().map(|a| a.path()).collect();
                if actions.is_empty() {
                    let _ = writeln!(out, "{}{}", INDENT, video.title);
                } else {
                    let _ = writeln!(out, "{}{} <{}>", INDENT, video.title, actions.join(" "));
                }
            }
            if !page.pages.is_empty() {
                let pages: Vec<String> = page.pages.iter().map(u32::to_string).collect();
                let _ = writeln!(out, "{}pages: {}", INDENT, pages.join(" "));
            }
        }
    }
}

fn render_modal(out: &mut String, view: &AppViewModel) {
    let Some(modal) = &view.modal else {
        return;
    };
    let title = modal.title.as_deref().unwrap_or("Dialog");
    let phase = match modal.phase {
        ModalPhase::Loading => "loading",
        ModalPhase::LoadFailed => "unavailable",
        ModalPhase::Open => "open",
        ModalPhase::Submitting => "submitting",
    };
    let _ = writeln!(out, "== {} ({}) ==", title, phase);
    if let Some(notice) = &modal.notice {
        let _ = writeln!(out, "{}{}", INDENT, notice);
    }
    for field in &modal.fields {
        let _ = writeln!(out, "{}{}:", INDENT, field);
        for block in modal
            .errors
            .iter()
            .filter(|block| matches!(&block.placement, Placement::AfterField(name) if name == field))
        {
            for message in &block.messages {
                let _ = writeln!(out, "{}{}! {}", INDENT, INDENT, message);
            }
        }
    }
    for block in modal
        .errors
        .iter()
        .filter(|block| block.placement == Placement::Form)
    {
        for message in &block.messages {
            let _ = writeln!(out, "{}! {}", INDENT, message);
        }
    }
    if let Some(slot) = &modal.error_slot {
        let _ = writeln!(out, "{}{}", INDENT, slot);
    }
}

fn bar(percent: f64) -> String {
    let filled = if percent.is_nan() {
        0
    } else {
        (percent.clamp(0.0, 100.0) * BAR_WIDTH as f64 / 100.0).round() as usize
    };
    format!("[{}{}]", "#".repeat(filled), ".".repeat(BAR_WIDTH - filled))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use ytsm_core::{
        update, AjaxAction, AppState, Effect, Job, Msg, PollOutcome, TreeNodeRef, VideoCard,
        VideoPage,
    };

    fn at_noon() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn polled(jobs: Vec<Job>) -> (AppViewModel, DomTree) {
        let (state, _) = update(AppState::new(), Msg::StartPolling);
        let (mut state, _) = update(
            state,
            Msg::JobsPolled {
                seq: 1,
                outcome: PollOutcome::Jobs(jobs),
            },
        );
        let mut dom = DomTree::new();
        dom.apply_all(&state.drain_dom_commands()).unwrap();
        (state.view(), dom)
    }

    #[test]
    fn empty_page_says_no_jobs() {
        let (view, dom) = polled(Vec::new());
        let text = render(&view, &dom, at_noon());
        assert!(text.starts_with("[12:00:00] polling | jobs: 0"));
        assert!(text.contains("== No running jobs =="));
    }

    #[test]
    fn jobs_show_with_progress_bars() {
        let (view, dom) = polled(vec![Job::new(1, "Downloading", "video 1/2", 0.5)]);
        let text = render(&view, &dom, at_noon());
        assert!(text.contains("== Running jobs =="));
        assert!(text.contains("Downloading"));
        assert!(text.contains("[##########..........] 50%"));
        assert!(text.contains("Downloading | video 1/2"));
    }

    #[test]
    fn video_list_shows_scope_cards_and_pages() {
        let (state, effects) = update(
            AppState::new(),
            Msg::TreeSelectionChanged(Some(TreeNodeRef::subscription(4))),
        );
        let Effect::FetchVideos { seq, .. } = effects[0].clone() else {
            panic!("expected a video load");
        };
        let (state, _) = update(
            state,
            Msg::VideosLoaded {
                seq,
                result: Ok(VideoPage {
                    videos: vec![VideoCard {
                        title: "Intro".into(),
                        actions: vec![AjaxAction::MarkVideoWatched(9)],
                    }],
                    pages: vec![1, 2],
                }),
            },
        );
        let text = render(&state.view(), &DomTree::new(), at_noon());
        assert!(text.contains("== Videos: sub4 | newest | page 1 =="));
        assert!(text.contains("Intro <ajax/action/mark_video_watched/9>"));
        assert!(text.contains("pages: 1 2"));

        let (state, _) = update(state, Msg::VideosReloadRequested);
        let (state, _) = update(
            state,
            Msg::VideosLoaded {
                seq: seq + 1,
                result: Err("http status 500".into()),
            },
        );
        let text = render(&state.view(), &DomTree::new(), at_noon());
        assert!(text.contains(VIDEOS_FAILED_TEXT));
    }

    #[test]
    fn bar_is_clamped() {
        assert_eq!(bar(150.0), format!("[{}]", "#".repeat(BAR_WIDTH)));
        assert_eq!(bar(-3.0), format!("[{}]", ".".repeat(BAR_WIDTH)));
    }
}
