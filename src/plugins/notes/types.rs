use crate::shared::counts::NameCount;
use crate::sync::Collection;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Template tag selecting which metadata schema and editing surface a note
/// uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NoteTemplate {
    QuickNote,
    MeetingMinutes,
}

/// Descriptor for one entry of the template catalog.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateInfo {
    pub id: NoteTemplate,
    pub name: &'static str,
    pub description: &'static str,
}

/// Catalog of the available note templates.
pub fn note_templates() -> Vec<TemplateInfo> {
    vec![
        TemplateInfo {
            id: NoteTemplate::QuickNote,
            name: "Quick Note",
            description: "Simple and fast note-taking, like a digital Post-it",
        },
        TemplateInfo {
            id: NoteTemplate::MeetingMinutes,
            name: "Meeting Minutes",
            description:
                "Structured template for meeting notes with attendees, agenda, and action items",
        },
    ]
}

/// One note document as mirrored from the store. `metadata` is free-form and
/// template-specific (meeting notes carry participants, topics, issues and
/// next-meeting details); the sync layer never interprets it.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    pub title: String,
    /// Rich-text markup; searched as plain text.
    pub content: String,
    pub template: NoteTemplate,
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,
    #[serde(default)]
    pub favorite: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    pub owner_id: String,
}

impl Collection for Note {
    const NAME: &'static str = "notes";

    fn id(&self) -> &str {
        &self.id
    }
    fn owner_id(&self) -> &str {
        &self.owner_id
    }
    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Create payload; `favorite` is stamped false by the service.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteDraft {
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub template: NoteTemplate,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

/// Partial update; `None` fields are left untouched on the remote document.
/// Metadata is forwarded as-is without the task-style coalescing guard.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<NoteTemplate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub favorite: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

/// Sidebar views over the note list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteView {
    #[default]
    All,
    Favorites,
}

/// Filter state owned by the note service.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NoteFilterState {
    pub search_query: String,
    pub selected_tag: Option<String>,
    pub selected_folder: Option<String>,
    pub selected_view: NoteView,
}

pub type TagCount = NameCount;
