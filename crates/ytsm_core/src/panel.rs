//! Job panel: tracks running jobs and keeps their rendered rows in step with
//! the latest poll.

use std::collections::HashSet;

use crate::dom::{DomCommand, ElementHandle, ElementId, HandleAllocator, Part, Widget};
use crate::job::{clamp_progress, percent_label, Job, JobId};

/// Prefix of the DOM id given to every cloned job row.
pub const JOB_DOM_ID_PREFIX: &str = "job_";

/// A tracked job together with the row rendered for it.
#[derive(Debug)]
pub struct JobEntry {
    job: Job,
    handle: ElementHandle,
}

impl JobEntry {
    fn create(job: &Job, handle: ElementHandle, out: &mut Vec<DomCommand>) -> Self {
        out.push(DomCommand::CloneTemplate {
            element: handle.id(),
            dom_id: format!("{JOB_DOM_ID_PREFIX}{}", job.id),
        });
        let mut entry = Self {
            job: job.clone(),
            handle,
        };
        entry.job.progress = clamp_progress(job.progress);
        entry.render(out);
        entry
    }

    fn update(&mut self, job: &Job, out: &mut Vec<DomCommand>) {
        job.description.clone_into(&mut self.job.description);
        job.message.clone_into(&mut self.job.message);
        self.job.progress = clamp_progress(job.progress);
        self.render(out);
    }

    fn render(&self, out: &mut Vec<DomCommand>) {
        let element = self.handle.id();
        out.push(DomCommand::SetPartText {
            element,
            part: Part::Title,
            text: self.job.description.clone(),
        });
        out.push(DomCommand::SetPartText {
            element,
            part: Part::Subtitle,
            text: self.job.message.clone(),
        });
        out.push(DomCommand::SetPartWidth {
            element,
            part: Part::Progress,
            percent: self.job.progress * 100.0,
        });
        out.push(DomCommand::SetPartText {
            element,
            part: Part::Progress,
            text: percent_label(self.job.progress),
        });
    }

    fn destroy(self) -> DomCommand {
        self.handle.destroy()
    }

    pub fn job(&self) -> &Job {
        &self.job
    }

    pub fn element(&self) -> ElementId {
        self.handle.id()
    }
}

/// The tracked set of running jobs, in first-seen order.
#[derive(Debug, Default)]
pub struct JobPanel {
    entries: Vec<JobEntry>,
    handles: HandleAllocator,
}

impl JobPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Brings the tracked set in line with `latest` and returns the document
    /// changes needed to show it, including the aggregate widgets.
    pub fn reconcile(&mut self, latest: &[Job]) -> Vec<DomCommand> {
        let mut commands = Vec::new();

        for job in latest {
            match self.entries.iter().position(|entry| entry.job.id == job.id) {
                Some(index) => self.entries[index].update(job, &mut commands),
                None => {
                    let handle = self.handles.allocate();
                    let entry = JobEntry::create(job, handle, &mut commands);
                    self.entries.push(entry);
                }
            }
        }

        let keep: HashSet<JobId> = latest.iter().map(|job| job.id).collect();
        let (kept, removed): (Vec<_>, Vec<_>) = std::mem::take(&mut self.entries)
            .into_iter()
            .partition(|entry| keep.contains(&entry.job.id));
        self.entries = kept;
        commands.extend(removed.into_iter().map(JobEntry::destroy));

        self.render_aggregate(&mut commands);
        commands
    }

    /// Drops every tracked job and resets the aggregate widgets.
    pub fn clear(&mut self) -> Vec<DomCommand> {
        let mut commands: Vec<DomCommand> = self
            .entries
            .drain(..)
            .map(JobEntry::destroy)
            .collect();
        self.render_aggregate(&mut commands);
        commands
    }

    /// Mean progress over tracked jobs, 0 when nothing is tracked.
    pub fn aggregate_progress(&self) -> f64 {
        if self.entries.is_empty() {
            return 0.0;
        }
        let total: f64 = self.entries.iter().map(|entry| entry.job.progress).sum();
        total / self.entries.len() as f64
    }

    /// The aggregate bar is only shown while at least one job runs.
    pub fn aggregate_visible(&self) -> bool {
        !self.entries.is_empty()
    }

    pub fn summary_text(&self) -> String {
        match self.entries.as_slice() {
            [] => String::new(),
            [only] => format!("{} | {}", only.job.description, only.job.message),
            many => format!("Running {} jobs...", many.len()),
        }
    }

    pub fn entries(&self) -> &[JobEntry] {
        &self.entries
    }

    pub fn ids(&self) -> Vec<JobId> {
        self.entries.iter().map(|entry| entry.job.id).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn render_aggregate(&self, out: &mut Vec<DomCommand>) {
        let has_jobs = self.aggregate_visible();

        out.push(DomCommand::SetWidgetText {
            widget: Widget::StatusMessage,
            text: self.summary_text(),
        });

        out.push(DomCommand::SetWidgetVisible {
            widget: Widget::StatusProgress,
            visible: has_jobs,
        });
        if has_jobs {
            let progress = self.aggregate_progress();
            out.push(DomCommand::SetWidgetWidth {
                widget: Widget::StatusProgress,
                percent: progress * 100.0,
            });
            out.push(DomCommand::SetWidgetText {
                widget: Widget::StatusProgress,
                text: percent_label(progress),
            });
        }

        out.push(DomCommand::SetWidgetVisible {
            widget: Widget::PanelTitle,
            visible: has_jobs,
        });
        out.push(DomCommand::SetWidgetVisible {
            widget: Widget::PanelTitleNoJobs,
            visible: !has_jobs,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_ids_in_one_reply_collapse_to_one_entry() {
        let mut panel = JobPanel::new();
        let commands = panel.reconcile(&[
            Job::new(4, "Sync", "first", 0.1),
            Job::new(4, "Sync", "second", 0.3),
        ]);

        assert_eq!(panel.ids(), vec![4]);
        assert_eq!(panel.entries()[0].job().message, "second");
        let clones = commands
            .iter()
            .filter(|c| matches!(c, DomCommand::CloneTemplate { .. }))
            .count();
        assert_eq!(clones, 1);
    }

    #[test]
    fn out_of_range_progress_is_clamped_on_update() {
        let mut panel = JobPanel::new();
        panel.reconcile(&[Job::new(1, "a", "b", 0.2)]);
        let raw = Job {
            id: 1,
            description: "a".into(),
            message: "b".into(),
            progress: 3.0,
        };
        panel.reconcile(&[raw]);
        assert_eq!(panel.aggregate_progress(), 1.0);
    }
}
