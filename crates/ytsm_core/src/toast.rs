//! Transient toast notifications.

pub const DEFAULT_TOAST_DURATION_MS: u64 = 4000;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ToastOptions {
    pub body: Option<String>,
    /// Typicons class, e.g. `typcn-tick`.
    pub icon: Option<String>,
    pub css_class: Option<String>,
    pub duration_ms: Option<u64>,
}

impl ToastOptions {
    pub fn with_body(body: impl Into<String>) -> Self {
        Self {
            body: Some(body.into()),
            ..Self::default()
        }
    }

    fn or_preset(mut self, icon: &str, css_class: &str) -> Self {
        self.icon.get_or_insert_with(|| icon.to_string());
        self.css_class.get_or_insert_with(|| css_class.to_string());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub id: u64,
    pub caption: String,
    pub body: Option<String>,
    pub icon: Option<String>,
    pub css_class: String,
    pub duration_ms: u64,
    pub shown_at_ms: u64,
}

impl Toast {
    fn expired(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.shown_at_ms) >= self.duration_ms
    }
}

/// Toasts currently shown, oldest first.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ToastQueue {
    toasts: Vec<Toast>,
    last_id: u64,
}

impl ToastQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toast(&mut self, caption: impl Into<String>, options: ToastOptions, now_ms: u64) -> u64 {
        self.last_id += 1;
        self.toasts.push(Toast {
            id: self.last_id,
            caption: caption.into(),
            body: options.body,
            icon: options.icon,
            css_class: options.css_class.unwrap_or_default(),
            duration_ms: options.duration_ms.unwrap_or(DEFAULT_TOAST_DURATION_MS),
            shown_at_ms: now_ms,
        });
        self.last_id
    }

    pub fn success(&mut self, caption: impl Into<String>, options: ToastOptions, now_ms: u64) -> u64 {
        self.toast(caption, options.or_preset("typcn-tick", "bg-success"), now_ms)
    }

    pub fn warning(&mut self, caption: impl Into<String>, options: ToastOptions, now_ms: u64) -> u64 {
        self.toast(caption, options.or_preset("typcn-warning", "bg-warning"), now_ms)
    }

    pub fn error(&mut self, caption: impl Into<String>, options: ToastOptions, now_ms: u64) -> u64 {
        self.toast(caption, options.or_preset("typcn-cancel", "bg-danger"), now_ms)
    }

    /// Drops toasts whose duration has elapsed and reports whether any went away.
    pub fn expire(&mut self, now_ms: u64) -> bool {
        let before = self.toasts.len();
        self.toasts.retain(|toast| !toast.expired(now_ms));
        before != self.toasts.len()
    }

    pub fn dismiss(&mut self, id: u64) -> bool {
        let before = self.toasts.len();
        self.toasts.retain(|toast| toast.id != id);
        before != self.toasts.len()
    }

    pub fn visible(&self) -> &[Toast] {
        &self.toasts
    }
}
