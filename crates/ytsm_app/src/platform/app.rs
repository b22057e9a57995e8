use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Context;
use chrono::Local;
use ytsm_core::{update, AppState, DomTree, Msg};
use ytsm_engine::EngineHandle;
use ytsm_logging::{ytsm_error, ytsm_info, ytsm_warn};

use super::config::AppConfig;
use super::effects::EffectRunner;
use super::{input, render};

const IDLE_WAIT: Duration = Duration::from_millis(20);

pub fn run_app(config: AppConfig, once: bool, read_input: bool) -> anyhow::Result<()> {
    let engine_config = config
        .engine_config()
        .with_context(|| format!("invalid base url {:?}", config.base_url))?;
    ytsm_info!("Talking to {}", engine_config.base_url);
    let engine = EngineHandle::new(engine_config).context("could not build http client")?;

    let (msg_tx, msg_rx) = mpsc::channel::<Msg>();
    let runner = EffectRunner::new(engine, msg_tx.clone());
    let state = AppState::with_poll_interval(config.poll_interval_ms)
        .with_notifications_from(config.last_notification_id);
    let mut page = Page::new(state, runner);
    let quit = Arc::new(AtomicBool::new(false));
    if read_input && !once {
        input::spawn_reader(msg_tx.clone(), quit.clone());
    }

    // Render clock for toast expiry.
    let started = Instant::now();
    let tick_interval = Duration::from_millis(config.tick_interval_ms.max(1));
    thread::spawn(move || loop {
        thread::sleep(tick_interval);
        let now_ms = started.elapsed().as_millis() as u64;
        if msg_tx.send(Msg::Tick { now_ms }).is_err() {
            break;
        }
    });

    page.dispatch(Msg::StartPolling);
    page.dispatch(Msg::StartNotifications);
    page.dispatch(Msg::TreeRefreshRequested);
    page.dispatch(Msg::VideosReloadRequested);

    if once {
        let budget = Duration::from_millis(
            config.connect_timeout_ms + config.request_timeout_ms + 1_000,
        );
        page.run_once(&msg_rx, budget)
    } else {
        page.run(&msg_rx, &quit)
    }
}

struct Page {
    state: AppState,
    dom: DomTree,
    runner: EffectRunner,
    needs_render: bool,
    tree_pending: bool,
}

impl Page {
    fn new(state: AppState, runner: EffectRunner) -> Self {
        Self {
            state,
            dom: DomTree::new(),
            runner,
            needs_render: true,
            tree_pending: false,
        }
    }

    fn dispatch(&mut self, msg: Msg) {
        match &msg {
            Msg::TreeRefreshRequested => self.tree_pending = true,
            Msg::TreeLoaded(_) => self.tree_pending = false,
            _ => {}
        }

        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        let commands = state.drain_dom_commands();
        if let Err(err) = self.dom.apply_all(&commands) {
            ytsm_error!("Document out of sync with job panel: {}", err);
        }
        if state.consume_dirty() {
            self.needs_render = true;
        }
        self.state = state;
        self.runner.enqueue(effects);
    }

    fn pump(&mut self, msg_rx: &mpsc::Receiver<Msg>) -> bool {
        for msg in self.runner.drain_events() {
            self.dispatch(msg);
        }
        match msg_rx.recv_timeout(IDLE_WAIT) {
            Ok(msg) => self.dispatch(msg),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => return false,
        }
        true
    }

    fn run(&mut self, msg_rx: &mpsc::Receiver<Msg>, quit: &AtomicBool) -> anyhow::Result<()> {
        while !quit.load(Ordering::Relaxed) && self.pump(msg_rx) {
            if self.needs_render {
                self.render()?;
            }
        }
        ytsm_info!("Leaving");
        self.dispatch(Msg::StopNotifications);
        self.dispatch(Msg::StopPolling);
        Ok(())
    }

    /// Waits for the first poll, the tree and the video list, prints the page
    /// once and stops the timers.
    fn run_once(&mut self, msg_rx: &mpsc::Receiver<Msg>, budget: Duration) -> anyhow::Result<()> {
        let deadline = Instant::now() + budget;
        while self.awaiting_replies() && Instant::now() < deadline {
            if !self.pump(msg_rx) {
                break;
            }
        }
        if self.awaiting_replies() {
            ytsm_warn!("Gave up waiting for the site after {:?}", budget);
        }
        self.dispatch(Msg::StopNotifications);
        self.dispatch(Msg::StopPolling);
        self.render()
    }

    fn awaiting_replies(&self) -> bool {
        self.tree_pending
            || self.state.polling().in_flight.is_some()
            || self.state.videos().is_loading()
    }

    fn render(&mut self) -> anyhow::Result<()> {
        self.needs_render = false;
        let text = render::render(&self.state.view(), &self.dom, Local::now());
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{}", text).context("writing page to stdout")?;
        stdout.flush().context("flushing stdout")?;
        Ok(())
    }
}
