//! Site notifications polled once a second. Only status updates are shown.

pub const NOTIFICATION_INTERVAL_MS: u64 = 1000;
/// Message kind carrying a line for the status bar.
pub const STATUS_UPDATE_KIND: &str = "st-up";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: u64,
    /// Local wall-clock time as (hour, minute), when the site sent one.
    pub time: Option<(u32, u32)>,
    pub kind: String,
    pub status: Option<String>,
}

impl Notification {
    pub fn status_update(id: u64, time: Option<(u32, u32)>, status: &str) -> Self {
        Self {
            id,
            time,
            kind: STATUS_UPDATE_KIND.to_string(),
            status: Some(status.to_string()),
        }
    }

    /// The status bar line for a status update, `HH:MM text`.
    pub fn status_line(&self) -> Option<String> {
        if self.kind != STATUS_UPDATE_KIND {
            return None;
        }
        let status = self.status.as_deref()?;
        Some(match self.time {
            Some((hour, minute)) => format!("{:02}:{:02} {}", hour, minute, status),
            None => status.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NotificationPoller {
    active: bool,
    /// Id the next request asks from; the site answers with entries at or after it.
    last_id: u64,
    /// Highest id already applied, so the repeated boundary entry is not applied twice.
    applied: Option<u64>,
    in_flight: Option<u64>,
    skipped_ticks: u32,
}

impl NotificationPoller {
    pub fn starting_at(last_id: u64) -> Self {
        Self {
            last_id,
            ..Self::default()
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn last_id(&self) -> u64 {
        self.last_id
    }

    pub fn in_flight(&self) -> Option<u64> {
        self.in_flight
    }

    pub(crate) fn set_active(&mut self, active: bool) {
        self.active = active;
        self.in_flight = None;
        self.skipped_ticks = 0;
    }

    /// Returns the id to request from, or `None` while a request is outstanding.
    /// After `give_up_after` skipped ticks the outstanding request is abandoned.
    pub(crate) fn tick(&mut self, give_up_after: u32) -> Option<u64> {
        if !self.active {
            return None;
        }
        if self.in_flight.is_some() {
            self.skipped_ticks += 1;
            if self.skipped_ticks < give_up_after {
                return None;
            }
        }
        self.skipped_ticks = 0;
        self.in_flight = Some(self.last_id);
        Some(self.last_id)
    }

    /// Applies a reply for the request made from `after_id`. Returns the
    /// newest status line, if any new entry carried one.
    pub(crate) fn receive(&mut self, after_id: u64, entries: &[Notification]) -> Option<String> {
        if self.in_flight != Some(after_id) {
            return None;
        }
        self.in_flight = None;
        self.skipped_ticks = 0;
        let mut line = None;
        for entry in entries {
            if self.applied.is_some_and(|applied| entry.id <= applied) {
                continue;
            }
            self.applied = Some(entry.id);
            self.last_id = entry.id;
            if let Some(text) = entry.status_line() {
                line = Some(text);
            }
        }
        line
    }

    pub(crate) fn fail(&mut self, after_id: u64) {
        if self.in_flight == Some(after_id) {
            self.in_flight = None;
            self.skipped_ticks = 0;
        }
    }
}
