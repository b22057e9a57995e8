//! Modal dialogs loaded from server-rendered form fragments.

use std::fmt;

/// Error key the server uses for errors not tied to a single field.
pub const FORM_LEVEL_FIELD: &str = "__all__";

pub const LOAD_FAILED_TEXT: &str = "An error occurred while displaying the dialog!";
pub const SUBMIT_FAILED_TEXT: &str = "An error occurred while processing request!";
pub const INVALID_RESPONSE_TEXT: &str = "Invalid server response!";
pub const ERROR_SLOT_TEXT: &str = "An error occurred";

/// Dialogs the page knows how to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalRoute {
    CreateFolder { parent: Option<u64> },
    UpdateFolder(u64),
    DeleteFolder(u64),
    CreateSubscription { parent_folder: Option<u64> },
    ImportSubscriptions { parent_folder: Option<u64> },
    UpdateSubscription(u64),
    DeleteSubscription(u64),
}

impl ModalRoute {
    /// Path of the fragment, relative to the site root.
    pub fn path(&self) -> String {
        match self {
            ModalRoute::CreateFolder { parent: None } => "modal/create_folder/".to_string(),
            ModalRoute::CreateFolder { parent: Some(id) } => format!("modal/create_folder/{id}/"),
            ModalRoute::UpdateFolder(id) => format!("modal/update_folder/{id}/"),
            ModalRoute::DeleteFolder(id) => format!("modal/delete_folder/{id}/"),
            ModalRoute::CreateSubscription {
                parent_folder: None,
            } => "modal/create_subscription/".to_string(),
            ModalRoute::CreateSubscription {
                parent_folder: Some(id),
            } => format!("modal/create_subscription/{id}/"),
            ModalRoute::ImportSubscriptions {
                parent_folder: None,
            } => "modal/import_subscriptions/".to_string(),
            ModalRoute::ImportSubscriptions {
                parent_folder: Some(id),
            } => format!("modal/import_subscriptions/{id}/"),
            ModalRoute::UpdateSubscription(id) => format!("modal/update_subscription/{id}/"),
            ModalRoute::DeleteSubscription(id) => format!("modal/delete_subscription/{id}/"),
        }
    }
}

/// What to do once a dialog's form was accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AfterSubmit {
    #[default]
    Nothing,
    RefreshTree,
    ReloadVideos,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormEncoding {
    #[default]
    UrlEncoded,
    Multipart,
}

/// The parts of a fragment's form that matter for submission and error placement.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ModalForm {
    pub action: String,
    pub encoding: FormEncoding,
    /// Names of the form's inputs, in document order.
    pub fields: Vec<String>,
    /// Names of `<input type="file">` elements; only posted with multipart forms.
    pub file_fields: Vec<String>,
    /// Hidden inputs (CSRF token and the like) posted along with user values.
    pub hidden: Vec<(String, String)>,
    pub title: Option<String>,
    /// Whether the fragment carries a dedicated `#__modal_error` element.
    pub has_error_slot: bool,
}

impl ModalForm {
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|field| field == name) || self.has_file_field(name)
    }

    pub fn has_file_field(&self, name: &str) -> bool {
        self.file_fields.iter().any(|field| field == name)
    }
}

/// A file chosen for a file input.
#[derive(Clone, PartialEq, Eq)]
pub struct FileUpload {
    pub field: String,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl fmt::Debug for FileUpload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileUpload")
            .field("field", &self.field)
            .field("file_name", &self.file_name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldErrors {
    pub field: String,
    pub messages: Vec<String>,
}

/// Submit reply as decoded off the wire, before any interpretation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawSubmitReply {
    /// `None` when the key is missing or not a boolean.
    pub success: Option<bool>,
    /// `None` when the key is missing or not shaped like `{field: [{message}]}`.
    pub errors: Option<Vec<FieldErrors>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitReply {
    Accepted,
    Rejected(Vec<FieldErrors>),
    Malformed,
}

impl SubmitReply {
    pub fn interpret(raw: RawSubmitReply) -> Self {
        match (raw.success, raw.errors) {
            (None, _) => SubmitReply::Malformed,
            (Some(true), _) => SubmitReply::Accepted,
            (Some(false), Some(errors)) => SubmitReply::Rejected(errors),
            (Some(false), None) => SubmitReply::Malformed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    /// Appended to the form body.
    Form,
    /// Inserted right after the named input.
    AfterField(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorBlock {
    pub placement: Placement,
    pub messages: Vec<String>,
}

impl ErrorBlock {
    fn form_notice(text: &str) -> Self {
        Self {
            placement: Placement::Form,
            messages: vec![text.to_string()],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalPhase {
    Loading,
    LoadFailed,
    Open,
    Submitting,
}

/// Outcome of feeding a submit reply into the modal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitResolution {
    Close(AfterSubmit),
    Stay,
}

/// Everything needed to post a form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormSubmission {
    pub action: String,
    pub encoding: FormEncoding,
    pub values: Vec<(String, String)>,
    pub files: Vec<FileUpload>,
}

/// The one dialog currently on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Modal {
    token: u64,
    route: ModalRoute,
    after_submit: AfterSubmit,
    phase: ModalPhase,
    form: Option<ModalForm>,
    errors: Vec<ErrorBlock>,
    error_slot: Option<String>,
    notice: Option<String>,
}

impl Modal {
    pub fn loading(token: u64, route: ModalRoute, after_submit: AfterSubmit) -> Self {
        Self {
            token,
            route,
            after_submit,
            phase: ModalPhase::Loading,
            form: None,
            errors: Vec::new(),
            error_slot: None,
            notice: None,
        }
    }

    pub fn on_loaded(&mut self, form: ModalForm) {
        self.form = Some(form);
        self.phase = ModalPhase::Open;
    }

    pub fn on_load_failed(&mut self) {
        self.phase = ModalPhase::LoadFailed;
        self.notice = Some(LOAD_FAILED_TEXT.to_string());
    }

    /// Starts a submission if the form is idle; inputs stay disabled until a reply arrives.
    ///
    /// Files are kept only for file inputs of a multipart form.
    pub fn begin_submit(
        &mut self,
        values: Vec<(String, String)>,
        files: Vec<FileUpload>,
    ) -> Option<FormSubmission> {
        if self.phase != ModalPhase::Open {
            return None;
        }
        let form = self.form.as_ref()?;
        let mut merged: Vec<(String, String)> = form
            .hidden
            .iter()
            .filter(|(name, _)| !values.iter().any(|(given, _)| given == name))
            .cloned()
            .collect();
        merged.extend(values);
        let files = match form.encoding {
            FormEncoding::Multipart => files
                .into_iter()
                .filter(|file| form.has_file_field(&file.field))
                .collect(),
            FormEncoding::UrlEncoded => Vec::new(),
        };
        self.phase = ModalPhase::Submitting;
        Some(FormSubmission {
            action: form.action.clone(),
            encoding: form.encoding,
            values: merged,
            files,
        })
    }

    pub fn on_submit_reply(&mut self, reply: SubmitReply) -> SubmitResolution {
        self.errors.clear();
        self.phase = ModalPhase::Open;
        match reply {
            SubmitReply::Accepted => SubmitResolution::Close(self.after_submit),
            SubmitReply::Rejected(fields) => {
                self.errors = fields
                    .into_iter()
                    .map(|field| self.place(field))
                    .collect();
                if self.form.as_ref().is_some_and(|form| form.has_error_slot) {
                    self.error_slot = Some(ERROR_SLOT_TEXT.to_string());
                }
                SubmitResolution::Stay
            }
            SubmitReply::Malformed => {
                self.errors.push(ErrorBlock::form_notice(INVALID_RESPONSE_TEXT));
                SubmitResolution::Stay
            }
        }
    }

    pub fn on_submit_failed(&mut self) {
        self.phase = ModalPhase::Open;
        self.errors.clear();
        self.errors.push(ErrorBlock::form_notice(SUBMIT_FAILED_TEXT));
    }

    fn place(&self, field: FieldErrors) -> ErrorBlock {
        let known = self
            .form
            .as_ref()
            .is_some_and(|form| form.has_field(&field.field));
        let placement = if field.field != FORM_LEVEL_FIELD && known {
            Placement::AfterField(field.field)
        } else {
            Placement::Form
        };
        ErrorBlock {
            placement,
            messages: field.messages,
        }
    }

    pub fn token(&self) -> u64 {
        self.token
    }

    pub fn route(&self) -> ModalRoute {
        self.route
    }

    pub fn phase(&self) -> ModalPhase {
        self.phase
    }

    pub fn form(&self) -> Option<&ModalForm> {
        self.form.as_ref()
    }

    pub fn errors(&self) -> &[ErrorBlock] {
        &self.errors
    }

    pub fn error_slot(&self) -> Option<&str> {
        self.error_slot.as_deref()
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn inputs_disabled(&self) -> bool {
        self.phase == ModalPhase::Submitting
    }
}
