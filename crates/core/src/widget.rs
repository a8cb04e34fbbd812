//! Dashboard widget entity, its content helpers, and the order payload DTO.
//!
//! Widgets arrive from the persistence layer as JSON. Only the fields the
//! ordering engine reads are typed; everything else rides along in
//! [`Widget::extra`] and round-trips untouched, explicit nulls included.
//! The typed optional fields do not: a `null` `section`, `updatedAt` or
//! `content` reads as absent and is left out on output.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::CoreError;
use crate::metric::Metric;
use crate::types::{Timestamp, WidgetId};

/// Key inside a Section's content holding its ordered child ids.
pub const CHILD_IDS_KEY: &str = "widgetIds";

/// Key inside a Metrics widget's content holding its metric list.
pub const METRICS_KEY: &str = "metrics";

// ---------------------------------------------------------------------------
// Widget type
// ---------------------------------------------------------------------------

/// Closed set of widget kinds a dashboard can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WidgetType {
    Text,
    Chart,
    Table,
    Metrics,
    Image,
    Section,
}

impl WidgetType {
    /// Return the type name as stored by the persistence layer.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "Text",
            Self::Chart => "Chart",
            Self::Table => "Table",
            Self::Metrics => "Metrics",
            Self::Image => "Image",
            Self::Section => "Section",
        }
    }

    /// Parse a type name. Returns `None` for unknown values.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Text" => Some(Self::Text),
            "Chart" => Some(Self::Chart),
            "Table" => Some(Self::Table),
            "Metrics" => Some(Self::Metrics),
            "Image" => Some(Self::Image),
            "Section" => Some(Self::Section),
            _ => None,
        }
    }

    /// All valid type names.
    pub const ALL: &'static [&'static str] =
        &["Text", "Chart", "Table", "Metrics", "Image", "Section"];
}

impl std::fmt::Display for WidgetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Widget
// ---------------------------------------------------------------------------

/// A content block on a dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Widget {
    pub id: WidgetId,
    #[serde(default)]
    pub name: String,
    pub widget_type: WidgetType,
    /// Dashboard-wide rank; sorting a sibling group by it yields display order.
    #[serde(default)]
    pub order: u32,
    /// Id of the containing Section, absent for top-level widgets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<WidgetId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub content: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Widget {
    pub fn new(
        id: impl Into<WidgetId>,
        name: impl Into<String>,
        widget_type: WidgetType,
        order: u32,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            widget_type,
            order,
            section: None,
            updated_at: None,
            content: Value::Object(Map::new()),
            extra: Map::new(),
        }
    }

    /// Builder-style helper placing the widget inside `section`.
    pub fn in_section(mut self, section: impl Into<WidgetId>) -> Self {
        self.section = Some(section.into());
        self
    }

    pub fn is_section(&self) -> bool {
        self.widget_type == WidgetType::Section
    }

    /// The containing section id. An empty string counts as "no section".
    pub fn parent_section(&self) -> Option<&str> {
        self.section.as_deref().filter(|s| !s.is_empty())
    }

    // -- Section child list ------------------------------------------------

    /// Ordered child ids cached in a Section's content.
    ///
    /// A missing or malformed `widgetIds` value reads as an empty list.
    pub fn child_ids(&self) -> Vec<&str> {
        self.content
            .get(CHILD_IDS_KEY)
            .and_then(Value::as_array)
            .map(|ids| ids.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    /// Replace the cached child id list, creating the content object if needed.
    pub fn set_child_ids(&mut self, ids: Vec<WidgetId>) {
        let ids = Value::Array(ids.into_iter().map(Value::String).collect());
        match &mut self.content {
            Value::Object(content) => {
                content.insert(CHILD_IDS_KEY.to_string(), ids);
            }
            other => {
                let mut content = Map::new();
                content.insert(CHILD_IDS_KEY.to_string(), ids);
                *other = Value::Object(content);
            }
        }
    }

    fn owned_child_ids(&self) -> Vec<WidgetId> {
        self.child_ids().into_iter().map(str::to_string).collect()
    }

    /// Append `id` to the child list, dropping any earlier occurrence.
    pub fn push_child(&mut self, id: &str) {
        let mut ids = self.owned_child_ids();
        ids.retain(|existing| existing != id);
        ids.push(id.to_string());
        self.set_child_ids(ids);
    }

    /// Insert `id` at the front of the child list, dropping any earlier occurrence.
    pub fn prepend_child(&mut self, id: &str) {
        let mut ids = self.owned_child_ids();
        ids.retain(|existing| existing != id);
        ids.insert(0, id.to_string());
        self.set_child_ids(ids);
    }

    /// Remove `id` from the child list. Returns `false` if it was not listed.
    pub fn remove_child(&mut self, id: &str) -> bool {
        let mut ids = self.owned_child_ids();
        let before = ids.len();
        ids.retain(|existing| existing != id);
        let removed = ids.len() != before;
        if removed {
            self.set_child_ids(ids);
        }
        removed
    }

    /// Exchange the list positions of two children.
    ///
    /// Returns `false` (and changes nothing) unless both ids are listed.
    pub fn swap_children(&mut self, a: &str, b: &str) -> bool {
        let mut ids = self.owned_child_ids();
        let pos_a = ids.iter().position(|id| id == a);
        let pos_b = ids.iter().position(|id| id == b);
        match (pos_a, pos_b) {
            (Some(pos_a), Some(pos_b)) => {
                ids.swap(pos_a, pos_b);
                self.set_child_ids(ids);
                true
            }
            _ => false,
        }
    }

    /// Put `new` in the list slot held by `old`, dropping any other
    /// occurrence of `new`.
    ///
    /// Returns `false` (and changes nothing) unless `old` is listed.
    pub fn replace_child(&mut self, old: &str, new: &str) -> bool {
        let mut ids = self.owned_child_ids();
        ids.retain(|id| id != new);
        let Some(pos) = ids.iter().position(|id| id == old) else {
            return false;
        };
        ids[pos] = new.to_string();
        self.set_child_ids(ids);
        true
    }

    // -- Metrics content ---------------------------------------------------

    /// Metrics listed in a Metrics widget's content. Missing list reads as empty.
    pub fn metrics(&self) -> Result<Vec<Metric>, CoreError> {
        match self.content.get(METRICS_KEY) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(value) => serde_json::from_value(value.clone()).map_err(|e| {
                CoreError::Validation(format!("Widget '{}' has malformed metrics: {e}", self.id))
            }),
        }
    }

    /// Write `metrics` back into the content object.
    pub fn set_metrics(&mut self, metrics: &[Metric]) -> Result<(), CoreError> {
        let value = serde_json::to_value(metrics)
            .map_err(|e| CoreError::Validation(format!("Failed to encode metrics: {e}")))?;
        match &mut self.content {
            Value::Object(content) => {
                content.insert(METRICS_KEY.to_string(), value);
            }
            other => {
                let mut content = Map::new();
                content.insert(METRICS_KEY.to_string(), value);
                *other = Value::Object(content);
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Order payload
// ---------------------------------------------------------------------------

/// One entry of the batch "set widget order" request sent to persistence.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetOrderEntry {
    pub id: WidgetId,
    pub name: String,
    pub order: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<WidgetId>,
    /// Present only for Section widgets.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub widget_ids: Option<Vec<WidgetId>>,
}

/// Build the persistence payload for a reordered widget collection.
pub fn order_payload(widgets: &[Widget]) -> Vec<WidgetOrderEntry> {
    widgets
        .iter()
        .map(|w| WidgetOrderEntry {
            id: w.id.clone(),
            name: w.name.clone(),
            order: w.order,
            updated_at: w.updated_at,
            section: w.parent_section().map(str::to_string),
            widget_ids: w.is_section().then(|| w.owned_child_ids()),
        })
        .collect()
}
