//! Retained document model for the job panel and the status bar.
//!
//! Presentation code never touches the document directly. It emits
//! [`DomCommand`]s, and the owner of a [`DomTree`] applies them. Elements cloned
//! from the job template are owned through move-only [`ElementHandle`]s, so the
//! only way to get rid of one is to consume its handle into a `Remove` command.

use std::collections::BTreeMap;

use thiserror::Error;

/// Copyable name of an element, used to address it in commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(u64);

impl ElementId {
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Exclusive ownership of one element cloned from the job template.
///
/// Deliberately neither `Clone` nor `Copy`.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "dropping a handle without destroying it leaks the element"]
pub struct ElementHandle {
    id: ElementId,
}

impl ElementHandle {
    pub fn id(&self) -> ElementId {
        self.id
    }

    /// Gives up ownership and returns the command that removes the element.
    pub fn destroy(self) -> DomCommand {
        DomCommand::Remove { element: self.id }
    }
}

/// Hands out fresh element handles. Ids are never reused.
#[derive(Debug, Default)]
pub(crate) struct HandleAllocator {
    next: u64,
}

impl HandleAllocator {
    pub(crate) fn allocate(&mut self) -> ElementHandle {
        self.next += 1;
        ElementHandle {
            id: ElementId(self.next),
        }
    }
}

/// Addressable parts inside a job element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Part {
    Title,
    Subtitle,
    Progress,
}

/// Fixed page widgets outside the job list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Widget {
    StatusMessage,
    StatusProgress,
    PanelTitle,
    PanelTitleNoJobs,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DomCommand {
    /// Clone the job template into the panel and give it `dom_id`.
    CloneTemplate { element: ElementId, dom_id: String },
    SetPartText {
        element: ElementId,
        part: Part,
        text: String,
    },
    SetPartWidth {
        element: ElementId,
        part: Part,
        percent: f64,
    },
    Remove { element: ElementId },
    SetWidgetText { widget: Widget, text: String },
    SetWidgetWidth { widget: Widget, percent: f64 },
    SetWidgetVisible { widget: Widget, visible: bool },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomError {
    #[error("element {0:?} does not exist")]
    UnknownElement(ElementId),
    #[error("element {0:?} already exists")]
    DuplicateElement(ElementId),
}

/// One rendered job row.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct JobElement {
    pub dom_id: String,
    pub title: String,
    pub subtitle: String,
    pub progress_width: f64,
    pub progress_text: String,
}

impl JobElement {
    fn set_text(&mut self, part: Part, text: &str) {
        let slot = match part {
            Part::Title => &mut self.title,
            Part::Subtitle => &mut self.subtitle,
            Part::Progress => &mut self.progress_text,
        };
        text.clone_into(slot);
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct WidgetState {
    pub text: String,
    pub width: f64,
    pub visible: bool,
}

/// In-memory document holding the job list and the status widgets.
#[derive(Debug, Clone, PartialEq)]
pub struct DomTree {
    elements: Vec<(ElementId, JobElement)>,
    widgets: BTreeMap<Widget, WidgetState>,
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DomTree {
    /// Matches the page as first served: no jobs, aggregate bar hidden.
    pub fn new() -> Self {
        let mut widgets = BTreeMap::new();
        widgets.insert(Widget::StatusMessage, WidgetState::visible());
        widgets.insert(Widget::StatusProgress, WidgetState::default());
        widgets.insert(Widget::PanelTitle, WidgetState::default());
        widgets.insert(Widget::PanelTitleNoJobs, WidgetState::visible());
        Self {
            elements: Vec::new(),
            widgets,
        }
    }

    pub fn apply(&mut self, command: &DomCommand) -> Result<(), DomError> {
        match command {
            DomCommand::CloneTemplate { element, dom_id } => {
                if self.position(*element).is_some() {
                    return Err(DomError::DuplicateElement(*element));
                }
                self.elements.push((
                    *element,
                    JobElement {
                        dom_id: dom_id.clone(),
                        ..JobElement::default()
                    },
                ));
            }
            DomCommand::SetPartText {
                element,
                part,
                text,
            } => self.element_mut(*element)?.set_text(*part, text),
            DomCommand::SetPartWidth {
                element, percent, ..
            } => self.element_mut(*element)?.progress_width = *percent,
            DomCommand::Remove { element } => {
                let index = self
                    .position(*element)
                    .ok_or(DomError::UnknownElement(*element))?;
                self.elements.remove(index);
            }
            DomCommand::SetWidgetText { widget, text } => {
                text.clone_into(&mut self.widget_mut(*widget).text);
            }
            DomCommand::SetWidgetWidth { widget, percent } => {
                self.widget_mut(*widget).width = *percent;
            }
            DomCommand::SetWidgetVisible { widget, visible } => {
                self.widget_mut(*widget).visible = *visible;
            }
        }
        Ok(())
    }

    /// Applies commands in order, stopping at the first one that fails.
    pub fn apply_all<'a>(
        &mut self,
        commands: impl IntoIterator<Item = &'a DomCommand>,
    ) -> Result<(), DomError> {
        commands.into_iter().try_for_each(|command| self.apply(command))
    }

    /// Job rows in document order.
    pub fn job_elements(&self) -> impl Iterator<Item = &JobElement> {
        self.elements.iter().map(|(_, element)| element)
    }

    pub fn job_element_count(&self) -> usize {
        self.elements.len()
    }

    pub fn find_by_dom_id(&self, dom_id: &str) -> Option<&JobElement> {
        self.job_elements().find(|element| element.dom_id == dom_id)
    }

    pub fn widget(&self, widget: Widget) -> &WidgetState {
        // Every widget is inserted by `new`.
        &self.widgets[&widget]
    }

    fn position(&self, element: ElementId) -> Option<usize> {
        self.elements.iter().position(|(id, _)| *id == element)
    }

    fn element_mut(&mut self, element: ElementId) -> Result<&mut JobElement, DomError> {
        self.elements
            .iter_mut()
            .find(|(id, _)| *id == element)
            .map(|(_, el)| el)
            .ok_or(DomError::UnknownElement(element))
    }

    fn widget_mut(&mut self, widget: Widget) -> &mut WidgetState {
        self.widgets.entry(widget).or_default()
    }
}

impl WidgetState {
    fn visible() -> Self {
        Self {
            visible: true,
            ..Self::default()
        }
    }
}
