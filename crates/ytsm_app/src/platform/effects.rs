use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use ytsm_core::{Effect, Msg};
use ytsm_engine::{EngineCommand, EngineEvent, EngineHandle};
use ytsm_logging::{ytsm_debug, ytsm_info, ytsm_warn};

/// Carries effects out against the engine and owns the page timers.
pub struct EffectRunner {
    engine: EngineHandle,
    msg_tx: mpsc::Sender<Msg>,
    timer: Option<PollTimer>,
    notification_timer: Option<PollTimer>,
}

impl EffectRunner {
    pub fn new(engine: EngineHandle, msg_tx: mpsc::Sender<Msg>) -> Self {
        Self {
            engine,
            msg_tx,
            timer: None,
            notification_timer: None,
        }
    }

    pub fn enqueue(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::FetchJobs { seq } => self.engine.send(EngineCommand::PollJobs { seq }),
                Effect::StartPollTimer { interval_ms } => {
                    ytsm_info!("Polling jobs every {} ms", interval_ms);
                    stop(&mut self.timer);
                    self.timer = Some(PollTimer::start(
                        interval_ms,
                        Msg::PollTimerFired,
                        self.msg_tx.clone(),
                    ));
                }
                Effect::StopPollTimer => {
                    ytsm_info!("Job polling stopped");
                    stop(&mut self.timer);
                }
                Effect::FetchTree => self.engine.send(EngineCommand::LoadTree),
                Effect::LoadModal { token, path } => {
                    self.engine.send(EngineCommand::LoadModal { token, path })
                }
                Effect::SubmitForm { token, submission } => {
                    ytsm_debug!("Submitting dialog {} to {}", token, submission.action);
                    self.engine
                        .send(EngineCommand::SubmitModal { token, submission })
                }
                Effect::PostAction(action) => self.engine.send(EngineCommand::PostAction(action)),
                Effect::StartNotificationTimer { interval_ms } => {
                    stop(&mut self.notification_timer);
                    self.notification_timer = Some(PollTimer::start(
                        interval_ms,
                        Msg::NotificationTimerFired,
                        self.msg_tx.clone(),
                    ));
                }
                Effect::StopNotificationTimer => stop(&mut self.notification_timer),
                Effect::FetchNotifications { after_id } => self
                    .engine
                    .send(EngineCommand::FetchNotifications { after_id }),
                Effect::FetchVideos { seq, form } => {
                    self.engine.send(EngineCommand::LoadVideos { seq, form })
                }
            }
        }
    }

    /// Engine results that arrived since the last call, as messages.
    pub fn drain_events(&self) -> Vec<Msg> {
        std::iter::from_fn(|| self.engine.try_recv())
            .map(event_to_msg)
            .collect()
    }

}

impl Drop for EffectRunner {
    fn drop(&mut self) {
        stop(&mut self.timer);
        stop(&mut self.notification_timer);
    }
}

fn stop(timer: &mut Option<PollTimer>) {
    if let Some(timer) = timer.take() {
        timer.stop();
    }
}

/// A zero interval would spin; the shortest period is one millisecond.
fn timer_interval(interval_ms: u64) -> Duration {
    Duration::from_millis(interval_ms.max(1))
}

/// Sends `msg` every interval until stopped.
struct PollTimer {
    stop: Arc<AtomicBool>,
}

impl PollTimer {
    fn start(interval_ms: u64, msg: Msg, msg_tx: mpsc::Sender<Msg>) -> Self {
        let interval = timer_interval(interval_ms);
        let stop = Arc::new(AtomicBool::new(false));
        let flag = stop.clone();
        thread::spawn(move || loop {
            thread::sleep(interval);
            if flag.load(Ordering::Relaxed) || msg_tx.send(msg.clone()).is_err() {
                break;
            }
        });
        Self { stop }
    }

    fn stop(self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}

fn event_to_msg(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::JobsPolled { seq, outcome } => Msg::JobsPolled { seq, outcome },
        EngineEvent::TreeLoaded(result) => Msg::TreeLoaded(result.map_err(|err| err.to_string())),
        EngineEvent::ModalLoaded { token, result } => Msg::ModalLoaded {
            token,
            result: result.map_err(|err| err.to_string()),
        },
        EngineEvent::ModalReplied { token, result } => Msg::ModalReplied {
            token,
            result: result.map_err(|err| {
                ytsm_warn!("Dialog {} submit failed: {}", token, err.kind);
                err.to_string()
            }),
        },
        EngineEvent::ActionCompleted { action, result } => Msg::ActionCompleted {
            action,
            result: result.map_err(|err| err.to_string()),
        },
        EngineEvent::NotificationsPolled { after_id, result } => Msg::NotificationsPolled {
            after_id,
            result: result.map_err(|err| err.to_string()),
        },
        EngineEvent::VideosLoaded { seq, result } => Msg::VideosLoaded {
            seq,
            result: result.map_err(|err| err.to_string()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use ytsm_core::{AjaxAction, PollOutcome};
    use ytsm_engine::{FailureKind, RequestError};

    #[test]
    fn engine_failures_become_message_strings() {
        let err = RequestError {
            kind: FailureKind::HttpStatus(500),
            message: "500 Internal Server Error".into(),
        };
        assert_eq!(
            event_to_msg(EngineEvent::ActionCompleted {
                action: AjaxAction::SyncNow,
                result: Err(err),
            }),
            Msg::ActionCompleted {
                action: AjaxAction::SyncNow,
                result: Err("http status 500: 500 Internal Server Error".into()),
            }
        );
    }

    #[test]
    fn poll_replies_pass_through() {
        let outcome = PollOutcome::Jobs(Vec::new());
        assert_eq!(
            event_to_msg(EngineEvent::JobsPolled {
                seq: 5,
                outcome: outcome.clone(),
            }),
            Msg::JobsPolled { seq: 5, outcome }
        );
    }

    #[test]
    fn zero_interval_is_clamped() {
        assert_eq!(timer_interval(0), Duration::from_millis(1));
        assert_eq!(timer_interval(1500), Duration::from_millis(1500));
    }

    #[test]
    fn notification_timer_sends_its_own_message() {
        let (tx, rx) = mpsc::channel();
        let timer = PollTimer::start(0, Msg::NotificationTimerFired, tx);
        assert_eq!(
            rx.recv_timeout(Duration::from_secs(2)),
            Ok(Msg::NotificationTimerFired)
        );
        timer.stop();
    }

    #[test]
    fn stopped_timer_goes_quiet() {
        let (tx, rx) = mpsc::channel();
        let timer = PollTimer::start(10, Msg::PollTimerFired, tx);
        assert_eq!(
            rx.recv_timeout(Duration::from_secs(2)),
            Ok(Msg::PollTimerFired)
        );
        timer.stop();
        thread::sleep(Duration::from_millis(50));
        while rx.try_recv().is_ok() {}
        thread::sleep(Duration::from_millis(50));
        assert!(rx.try_recv().is_err());
    }
}
