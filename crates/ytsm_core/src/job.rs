/// Server-side identifier of a running job. Only ever compared for equality.
pub type JobId = u64;

/// Snapshot of one active background job as reported by the jobs endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub id: JobId,
    pub description: String,
    pub message: String,
    /// Completion fraction in `[0, 1]`.
    pub progress: f64,
}

impl Job {
    pub fn new(
        id: JobId,
        description: impl Into<String>,
        message: impl Into<String>,
        progress: f64,
    ) -> Self {
        Self {
            id,
            description: description.into(),
            message: message.into(),
            progress: clamp_progress(progress),
        }
    }
}

/// Forces a progress value into `[0, 1]`; NaN and infinities collapse to 0.
pub fn clamp_progress(progress: f64) -> f64 {
    if progress.is_finite() {
        progress.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Formats a fraction as the whole-number percentage shown on progress bars.
///
/// Rounds half away from zero, so `0.125` renders as `"13%"`.
pub fn percent_label(fraction: f64) -> String {
    format!("{}%", (fraction * 100.0).round() as i64)
}
