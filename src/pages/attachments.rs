//! Attachment editor embedded in the strategy edit form.
//!
//! # Responsibilities
//! - List the strategy's stored attachments, with signed previews for images
//! - Stage newly picked files and mark stored ones for removal
//! - Apply staged changes on save
//!
//! # Design Decisions
//! - Nothing touches storage until `commit`; Remove on a stored file
//!   toggles, so it can be undone before saving
//! - A stored file whose metadata insert fails is removed again

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use futures_util::future::join_all;
use thiserror::Error;

use crate::backend::{Attachment, Backend, BackendError, NewAttachment};
use crate::dom::{Document, EventKind, SelectedFile};
use crate::page::PageContext;
use crate::util::format;
use crate::util::html::{escape, escape_attr};

pub const SECTION_ID: &str = "attachments-section";
pub const INPUT_ID: &str = "attachment-input";
pub const LIST_ID: &str = "attachment-list";
pub const EMPTY_ID: &str = "attachment-empty";
pub const ERROR_ID: &str = "attachment-error";
pub const COUNT_ID: &str = "attachment-count";

const REMOVE_KEY_ATTR: &str = "data-remove-key";

const IMAGE_EXTENSIONS: [&str; 7] = ["png", "jpg", "jpeg", "gif", "webp", "bmp", "svg"];
const TEXT_EXTENSIONS: [&str; 4] = ["doc", "docx", "txt", "rtf"];
const ARCHIVE_EXTENSIONS: [&str; 5] = ["zip", "rar", "7z", "tar", "gz"];

/// Failure while applying staged attachment changes.
#[derive(Debug, Error)]
pub enum AttachmentError {
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("Failed to upload {name}: {source}")]
    Upload { name: String, source: BackendError },

    /// The uploaded file has already been removed again.
    #[error("Failed to save metadata for {name}: {source}")]
    Metadata { name: String, source: BackendError },

    #[error("Failed to remove {name}: {source}")]
    RemoveFile { name: String, source: BackendError },

    #[error("Failed to remove metadata for {name}: {source}")]
    RemoveMetadata { name: String, source: BackendError },
}

/// Markup for the editor; placed inside the edit form.
pub fn markup() -> String {
    format!(
        r#"<div class="mb-3" id="{section}">
  <label class="form-label" for="{input}">Attachments <span class="badge bg-light text-dark" id="{count}">0</span></label>
  <input type="file" class="form-control" id="{input}" multiple>
  <div class="alert alert-danger mt-2" id="{error}" hidden></div>
  <p class="text-muted small mt-2" id="{empty}">No attachments yet</p>
  <ul class="list-unstyled attachment-list mt-2" id="{list}"></ul>
</div>"#,
        section = SECTION_ID,
        input = INPUT_ID,
        count = COUNT_ID,
        error = ERROR_ID,
        empty = EMPTY_ID,
        list = LIST_ID,
    )
}

#[derive(Debug, Clone)]
struct StoredAttachment {
    record: Attachment,
    preview_url: Option<String>,
}

#[derive(Debug, Clone)]
struct StagedFile {
    key: u64,
    file: SelectedFile,
}

#[derive(Debug, Default)]
struct EditorState {
    stored: Vec<StoredAttachment>,
    staged: Vec<StagedFile>,
    removed: BTreeSet<String>,
    next_key: u64,
}

impl EditorState {
    fn remaining(&self) -> usize {
        self.stored
            .iter()
            .filter(|s| !self.removed.contains(&s.record.id))
            .count()
            + self.staged.len()
    }
}

/// One row of the rendered list.
struct Item<'a> {
    key: String,
    name: &'a str,
    size: u64,
    mime_type: Option<&'a str>,
    preview_url: Option<&'a str>,
    marked_for_removal: bool,
    status: &'static str,
    status_class: &'static str,
}

/// Pending attachment changes for one strategy.
#[derive(Clone)]
pub struct AttachmentEditor {
    ctx: PageContext,
    strategy_id: String,
    state: Arc<Mutex<EditorState>>,
}

impl AttachmentEditor {
    /// Bind the editor's controls and load the stored attachments.
    ///
    /// Returns `None` when the editor markup is not mounted.
    pub async fn load(ctx: &PageContext, strategy_id: &str) -> Option<Self> {
        let doc = ctx.document();
        if ![SECTION_ID, INPUT_ID, LIST_ID, EMPTY_ID, ERROR_ID]
            .iter()
            .all(|id| doc.contains(id))
        {
            return None;
        }

        let editor = Self {
            ctx: ctx.clone(),
            strategy_id: strategy_id.to_string(),
            state: Arc::new(Mutex::new(EditorState::default())),
        };

        ctx.on(INPUT_ID, EventKind::Change, {
            let editor = editor.clone();
            move |ctx, event| {
                let editor = editor.clone();
                async move {
                    editor.stage(event.files);
                    ctx.document().set_value(INPUT_ID, "");
                    editor.render();
                }
            }
        });

        editor.load_stored().await;
        editor.render();
        Some(editor)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, EditorState> {
        self.state.lock().expect("attachment state mutex poisoned")
    }

    async fn load_stored(&self) {
        let backend = match self.ctx.backend().client().await {
            Ok(backend) => backend,
            Err(e) => return self.show_error(&e.to_string()),
        };
        let records = match backend.attachments(&self.strategy_id).await {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(strategy_id = %self.strategy_id, error = %e, "Failed to fetch attachments");
                return self.show_error(&e.to_string());
            }
        };

        let stored = join_all(records.into_iter().map(|record| {
            let backend = backend.clone();
            async move {
                let preview_url = preview_url(backend.as_ref(), &record).await;
                StoredAttachment { record, preview_url }
            }
        }))
        .await;

        self.lock().stored = stored;
    }

    /// Queue picked files for upload.
    pub fn stage(&self, files: Vec<SelectedFile>) {
        let mut state = self.lock();
        for file in files {
            let key = state.next_key;
            state.next_key += 1;
            state.staged.push(StagedFile { key, file });
        }
    }

    /// Handle a remove button. Stored entries toggle; staged ones are dropped.
    fn remove(&self, key: &str) {
        let mut state = self.lock();
        if let Some(id) = key.strip_prefix("existing:") {
            if !state.removed.remove(id) {
                state.removed.insert(id.to_string());
            }
        } else if let Some(key) = key.strip_prefix("new:") {
            if let Ok(key) = key.parse::<u64>() {
                state.staged.retain(|staged| staged.key != key);
            }
        }
    }

    /// Attachments left once pending changes are applied.
    pub fn remaining(&self) -> usize {
        self.lock().remaining()
    }

    pub fn staged_count(&self) -> usize {
        self.lock().staged.len()
    }

    pub fn removed_count(&self) -> usize {
        self.lock().removed.len()
    }

    /// Redraw the list and rebind its remove buttons.
    pub fn render(&self) {
        let (markup, total, remaining) = {
            let state = self.lock();
            let mut items: Vec<Item<'_>> = state
                .stored
                .iter()
                .map(|stored| {
                    let marked = state.removed.contains(&stored.record.id);
                    Item {
                        key: format!("existing:{}", stored.record.id),
                        name: &stored.record.file_name,
                        size: stored.record.file_size,
                        mime_type: stored.record.mime_type.as_deref(),
                        preview_url: stored.preview_url.as_deref(),
                        marked_for_removal: marked,
                        status: if marked {
                            "Will be removed after Save Changes"
                        } else {
                            "Already uploaded"
                        },
                        status_class: if marked { "text-danger" } else { "text-success" },
                    }
                })
                .collect();
            items.extend(state.staged.iter().map(|staged| Item {
                key: format!("new:{}", staged.key),
                name: &staged.file.name,
                size: staged.file.size(),
                mime_type: staged.file.mime_type.as_deref(),
                preview_url: None,
                marked_for_removal: false,
                status: "Will be uploaded after Save Changes",
                status_class: "text-primary",
            }));

            let markup: String = items.iter().map(render_item).collect();
            (markup, items.len(), state.remaining())
        };

        let doc = self.ctx.document();
        doc.set_inner_html(LIST_ID, &markup);
        doc.set_visible(EMPTY_ID, total == 0);
        doc.set_text(COUNT_ID, &remaining.to_string());

        for (button, key) in doc.ids_with_attribute(REMOVE_KEY_ATTR) {
            let editor = self.clone();
            self.ctx.on(&button, EventKind::Click, move |_, _| {
                let editor = editor.clone();
                let key = key.clone();
                async move {
                    editor.remove(&key);
                    editor.render();
                }
            });
        }
    }

    /// Upload staged files, then delete the ones marked for removal.
    ///
    /// Stops at the first failure; the message names the file.
    pub async fn commit(&self) -> Result<(), AttachmentError> {
        self.clear_error();

        let (staged, removals) = {
            let state = self.lock();
            let removals: Vec<Attachment> = state
                .stored
                .iter()
                .filter(|s| state.removed.contains(&s.record.id))
                .map(|s| s.record.clone())
                .collect();
            (state.staged.clone(), removals)
        };
        if staged.is_empty() && removals.is_empty() {
            return Ok(());
        }

        let backend = self.ctx.backend().client().await?;

        for StagedFile { file, .. } in &staged {
            let path = backend
                .upload_attachment(&self.strategy_id, file)
                .await
                .map_err(|source| AttachmentError::Upload {
                    name: file.name.clone(),
                    source,
                })?;

            let created = backend
                .create_attachment(NewAttachment {
                    strategy_id: self.strategy_id.clone(),
                    file_name: file.name.clone(),
                    file_path: path.clone(),
                    mime_type: file.mime_type.clone(),
                    file_size: file.size(),
                })
                .await;
            if let Err(source) = created {
                if let Err(cleanup) = backend.remove_attachment_file(&path).await {
                    tracing::warn!(path = %path, error = %cleanup, "Failed to remove orphaned upload");
                }
                return Err(AttachmentError::Metadata {
                    name: file.name.clone(),
                    source,
                });
            }
            tracing::info!(strategy_id = %self.strategy_id, file = %file.name, "Attachment uploaded");
        }

        for attachment in &removals {
            backend
                .remove_attachment_file(&attachment.file_path)
                .await
                .map_err(|source| AttachmentError::RemoveFile {
                    name: attachment.file_name.clone(),
                    source,
                })?;
            backend
                .delete_attachment(&attachment.id)
                .await
                .map_err(|source| AttachmentError::RemoveMetadata {
                    name: attachment.file_name.clone(),
                    source,
                })?;
            tracing::info!(strategy_id = %self.strategy_id, file = %attachment.file_name, "Attachment removed");
        }

        Ok(())
    }

    pub fn show_error(&self, message: &str) {
        let doc = self.ctx.document();
        doc.set_text(ERROR_ID, message);
        doc.set_visible(ERROR_ID, true);
    }

    fn clear_error(&self) {
        let doc = self.ctx.document();
        doc.set_visible(ERROR_ID, false);
        doc.set_text(ERROR_ID, "");
    }
}

/// Signed URL for an image attachment. Anything else, or a failed
/// lookup, has no preview.
async fn preview_url(backend: &dyn Backend, attachment: &Attachment) -> Option<String> {
    if attachment.file_path.is_empty()
        || !is_image(attachment.mime_type.as_deref(), &attachment.file_name)
    {
        return None;
    }
    match backend.attachment_signed_url(&attachment.file_path).await {
        Ok(url) if !url.is_empty() => Some(url),
        Ok(_) => None,
        Err(e) => {
            tracing::debug!(path = %attachment.file_path, error = %e, "No preview URL");
            None
        }
    }
}

fn render_item(item: &Item<'_>) -> String {
    let name = if item.name.is_empty() { "Attachment" } else { item.name };
    let preview = match item.preview_url {
        Some(url) => format!(r#"<img src="{}" alt="{}">"#, escape_attr(url), escape_attr(name)),
        None => format!(
            r#"<i class="bi {}" aria-hidden="true"></i>"#,
            icon_class(item.mime_type, name)
        ),
    };
    let button_id = format!("attachment-remove-{}", item.key.replace(':', "-"));

    format!(
        r#"<li class="attachment-item d-flex align-items-start justify-content-between gap-3{faded}">
  <div class="d-flex align-items-center gap-3 flex-grow-1">
    <div class="attachment-preview">{preview}</div>
    <div class="attachment-meta">
      <p class="attachment-name" title="{title}">{name}</p>
      <p class="attachment-size">{size}</p>
      <span class="attachment-status {status_class}">{status}</span>
    </div>
  </div>
  <button type="button" class="btn btn-sm {button_class} attachment-remove-btn" id="{button_id}" data-remove-key="{key}">{label}</button>
</li>"#,
        faded = if item.marked_for_removal { " opacity-50" } else { "" },
        preview = preview,
        title = escape_attr(name),
        name = escape(name),
        size = format::bytes(item.size),
        status_class = item.status_class,
        status = item.status,
        button_class = if item.marked_for_removal {
            "btn-outline-secondary"
        } else {
            "btn-outline-danger"
        },
        button_id = escape_attr(&button_id),
        key = escape_attr(&item.key),
        label = if item.marked_for_removal { "Undo" } else { "Remove" },
    )
}

fn extension(file_name: &str) -> Option<String> {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
}

/// Whether a file is shown as an image, by MIME type or extension.
pub fn is_image(mime_type: Option<&str>, file_name: &str) -> bool {
    if mime_type.is_some_and(|m| m.starts_with("image/")) {
        return true;
    }
    extension(file_name).is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

/// Bootstrap icon class for a file.
pub fn icon_class(mime_type: Option<&str>, file_name: &str) -> &'static str {
    if is_image(mime_type, file_name) {
        return "bi-image";
    }
    match extension(file_name).as_deref() {
        Some("pdf") => "bi-file-earmark-pdf",
        Some(ext) if TEXT_EXTENSIONS.contains(&ext) => "bi-file-earmark-text",
        Some(ext) if ARCHIVE_EXTENSIONS.contains(&ext) => "bi-file-earmark-zip",
        _ => "bi-file-earmark",
    }
}
