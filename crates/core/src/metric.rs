//! Metric entries of a Metrics widget and their reordering.
//!
//! Metrics carry no `order` field: the array position is the order, so a
//! move is a plain positional swap.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::CoreError;
use crate::widget::{Widget, WidgetType};

/// A single figure displayed by a Metrics widget.
///
/// Unknown fields ride along in `extra`. A `null` in one of the optional
/// typed fields reads as absent and is omitted when written back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metric {
    pub title: String,
    /// Number or preformatted string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_over_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Metric {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            value: None,
            change_over_time: None,
            start_date: None,
            end_date: None,
            extra: Map::new(),
        }
    }
}

/// Swap the metrics at `index` and `new_index`.
///
/// Either position falling outside the list returns the input unchanged.
pub fn move_metric(metrics: &[Metric], index: usize, new_index: isize) -> Vec<Metric> {
    let mut moved = metrics.to_vec();
    let Ok(new_index) = usize::try_from(new_index) else {
        return moved;
    };
    if index >= moved.len() || new_index >= moved.len() {
        return moved;
    }
    moved.swap(index, new_index);
    moved
}

/// Apply [`move_metric`] to the metric list of the Metrics widget `widget_id`.
///
/// Returns a new widget collection; the input is untouched.
pub fn move_widget_metric(
    widgets: &[Widget],
    widget_id: &str,
    index: usize,
    new_index: isize,
) -> Result<Vec<Widget>, CoreError> {
    let position = widgets
        .iter()
        .position(|w| w.id == widget_id)
        .ok_or_else(|| CoreError::NotFound {
            entity: "widget",
            id: widget_id.to_string(),
        })?;

    let mut updated = widgets.to_vec();
    let widget = &mut updated[position];
    if widget.widget_type != WidgetType::Metrics {
        return Err(CoreError::Validation(format!(
            "Widget '{widget_id}' is a {} widget, expected Metrics",
            widget.widget_type
        )));
    }

    let metrics = widget.metrics()?;
    let moved = move_metric(&metrics, index, new_index);
    tracing::debug!(widget_id, index, new_index, "Reordered metrics");
    widget.set_metrics(&moved)?;
    Ok(updated)
}
