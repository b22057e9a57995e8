use std::sync::Once;

use pretty_assertions::assert_eq;
use ytsm_core::{
    update, AppState, DomTree, Effect, Job, Msg, PollOutcome, Widget, MAX_SKIPPED_POLL_TICKS,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(ytsm_logging::initialize_for_tests);
}

fn started() -> (AppState, u64) {
    let (state, effects) = update(AppState::with_poll_interval(1500), Msg::StartPolling);
    let seq = effects
        .iter()
        .find_map(|effect| match effect {
            Effect::FetchJobs { seq } => Some(*seq),
            _ => None,
        })
        .expect("start polls immediately");
    (state, seq)
}

fn reply(state: AppState, seq: u64, jobs: Vec<Job>) -> AppState {
    let (state, effects) = update(
        state,
        Msg::JobsPolled {
            seq,
            outcome: PollOutcome::Jobs(jobs),
        },
    );
    assert!(effects.is_empty());
    state
}

#[test]
fn start_polls_and_arms_timer() {
    init_logging();
    let (state, effects) = update(AppState::with_poll_interval(1500), Msg::StartPolling);

    assert_eq!(
        effects,
        vec![
            Effect::StartPollTimer { interval_ms: 1500 },
            Effect::FetchJobs { seq: 1 },
        ]
    );
    assert!(state.polling().active);
    assert_eq!(state.polling().in_flight, Some(1));
}

#[test]
fn start_twice_is_ignored() {
    init_logging();
    let (state, _seq) = started();
    let (_state, effects) = update(state, Msg::StartPolling);
    assert!(effects.is_empty());
}

#[test]
fn ticks_are_skipped_while_a_poll_is_outstanding() {
    init_logging();
    let (state, seq) = started();

    let (state, effects) = update(state, Msg::PollTimerFired);
    assert!(effects.is_empty());

    let state = reply(state, seq, vec![]);
    let (_state, effects) = update(state, Msg::PollTimerFired);
    assert_eq!(effects, vec![Effect::FetchJobs { seq: seq + 1 }]);
}

#[test]
fn lost_reply_does_not_stop_polling() {
    init_logging();
    let (mut state, lost) = started();

    for _ in 1..MAX_SKIPPED_POLL_TICKS {
        let (next, effects) = update(state, Msg::PollTimerFired);
        assert!(effects.is_empty());
        state = next;
    }
    let (state, effects) = update(state, Msg::PollTimerFired);
    assert_eq!(effects, vec![Effect::FetchJobs { seq: lost + 1 }]);
    assert_eq!(state.polling().in_flight, Some(lost + 1));
    assert_eq!(state.polling().skipped_ticks, 0);

    // The abandoned poll answering late changes nothing.
    let state = reply(state, lost, vec![Job::new(1, "Download", "x", 0.3)]);
    assert!(state.panel().is_empty());
    let state = reply(state, lost + 1, vec![]);
    assert_eq!(state.polling().in_flight, None);
}

#[test]
fn stale_replies_are_dropped() {
    init_logging();
    let (state, seq) = started();
    let (mut state, effects) = update(
        state,
        Msg::JobsPolled {
            seq: seq + 10,
            outcome: PollOutcome::Jobs(vec![Job::new(1, "Download", "x", 0.3)]),
        },
    );

    assert!(effects.is_empty());
    assert!(state.panel().is_empty());
    assert!(state.drain_dom_commands().is_empty());
    assert_eq!(state.polling().in_flight, Some(seq));
}

#[test]
fn stop_disarms_timer_and_ignores_late_reply() {
    init_logging();
    let (state, seq) = started();
    let (state, effects) = update(state, Msg::StopPolling);
    assert_eq!(effects, vec![Effect::StopPollTimer]);

    let (state, effects) = update(state, Msg::PollTimerFired);
    assert!(effects.is_empty());

    let state = reply(state, seq, vec![Job::new(1, "Download", "x", 0.3)]);
    assert!(state.panel().is_empty());
}

#[test]
fn download_scenario_renders_and_clears() {
    init_logging();
    let (state, seq) = started();
    let mut state = reply(state, seq, vec![Job::new(1, "Download", "50%", 0.5)]);
    let mut tree = DomTree::new();
    tree.apply_all(&state.drain_dom_commands()).unwrap();

    let view = state.view();
    assert_eq!(view.job_count, 1);
    assert_eq!(view.summary, "Download | 50%");
    assert_eq!(view.aggregate_progress, 0.5);
    assert!(view.aggregate_visible);
    assert!(state.consume_dirty());
    assert_eq!(tree.widget(Widget::StatusProgress).text, "50%");

    let (state, effects) = update(state, Msg::PollTimerFired);
    let next_seq = match effects.as_slice() {
        [Effect::FetchJobs { seq }] => *seq,
        other => panic!("unexpected effects {other:?}"),
    };
    let mut state = reply(state, next_seq, vec![]);
    tree.apply_all(&state.drain_dom_commands()).unwrap();

    let view = state.view();
    assert_eq!(view.job_count, 0);
    assert_eq!(view.summary, "");
    assert!(!view.aggregate_visible);
    assert_eq!(tree.job_element_count(), 0);
    assert!(!tree.widget(Widget::StatusProgress).visible);
}

#[test]
fn non_json_reply_clears_panel() {
    init_logging();
    let (state, seq) = started();
    let state = reply(state, seq, vec![Job::new(1, "Sync", "a", 0.1)]);
    let (state, effects) = update(state, Msg::PollTimerFired);
    let Effect::FetchJobs { seq } = effects[0].clone() else {
        panic!("expected a poll");
    };

    let (state, _) = update(
        state,
        Msg::JobsPolled {
            seq,
            outcome: PollOutcome::NotJson {
                content_type: Some("text/html; charset=utf-8".into()),
            },
        },
    );
    assert!(state.panel().is_empty());
    assert_eq!(state.view().summary, "");
}

#[test]
fn failed_poll_keeps_last_view() {
    init_logging();
    let (state, seq) = started();
    let state = reply(state, seq, vec![Job::new(1, "Sync", "a", 0.1)]);
    let (state, effects) = update(state, Msg::PollTimerFired);
    let Effect::FetchJobs { seq } = effects[0].clone() else {
        panic!("expected a poll");
    };

    let (state, _) = update(
        state,
        Msg::JobsPolled {
            seq,
            outcome: PollOutcome::Failed("connection refused".into()),
        },
    );
    assert_eq!(state.panel().ids(), vec![1]);
    assert_eq!(state.polling().in_flight, None);
}
