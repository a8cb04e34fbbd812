//! Widget collection integrity checks and repairs.
//!
//! The mutator tolerates malformed collections; this module is where they
//! get noticed. [`check_widgets`] lists every broken invariant,
//! [`renumber`] and [`sync_section_children`] rewrite a collection into a
//! consistent shape.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::error::CoreError;
use crate::tree::display_order;
use crate::types::WidgetId;
use crate::widget::Widget;

/// A single broken invariant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "violation", rename_all = "snake_case")]
pub enum Violation {
    /// More than one widget carries the same id.
    DuplicateId { id: WidgetId },
    /// Two siblings share an `order` value.
    DuplicateOrder {
        section: Option<WidgetId>,
        order: u32,
        ids: Vec<WidgetId>,
    },
    /// A Section widget sits inside another section.
    NestedSection { id: WidgetId, parent: WidgetId },
    /// `section` names a widget that does not exist.
    DanglingSection { id: WidgetId, section: WidgetId },
    /// `section` names a widget that is not a Section.
    NotASection { id: WidgetId, section: WidgetId },
    /// A Section's cached child list names a widget that does not exist.
    DanglingChild { section: WidgetId, id: WidgetId },
    /// A Section's cached child list disagrees with its children.
    ChildListMismatch {
        section: WidgetId,
        expected: Vec<WidgetId>,
        actual: Vec<WidgetId>,
    },
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateId { id } => write!(f, "widget id '{id}' is not unique"),
            Self::DuplicateOrder { section, order, ids } => write!(
                f,
                "order {order} is shared by {} in {}",
                ids.join(", "),
                section
                    .as_deref()
                    .map_or_else(|| "the top level".to_string(), |s| format!("section '{s}'"))
            ),
            Self::NestedSection { id, parent } => {
                write!(f, "section '{id}' is nested inside '{parent}'")
            }
            Self::DanglingSection { id, section } => {
                write!(f, "widget '{id}' references missing section '{section}'")
            }
            Self::NotASection { id, section } => {
                write!(f, "widget '{id}' references '{section}', which is not a section")
            }
            Self::DanglingChild { section, id } => {
                write!(f, "section '{section}' lists missing widget '{id}'")
            }
            Self::ChildListMismatch {
                section,
                expected,
                actual,
            } => write!(
                f,
                "section '{section}' lists [{}] but contains [{}]",
                actual.join(", "),
                expected.join(", ")
            ),
        }
    }
}

/// Ids of the widgets inside `section`, by ascending `order`.
fn expected_children(widgets: &[Widget], section: &str) -> Vec<WidgetId> {
    let mut children: Vec<&Widget> = widgets
        .iter()
        .filter(|w| w.parent_section() == Some(section))
        .collect();
    children.sort_by_key(|w| w.order);
    children.into_iter().map(|w| w.id.clone()).collect()
}

/// List every invariant the collection breaks, in a stable order.
pub fn check_widgets(widgets: &[Widget]) -> Vec<Violation> {
    let mut violations = Vec::new();

    let mut by_id: HashMap<&str, &Widget> = HashMap::with_capacity(widgets.len());
    for widget in widgets {
        if by_id.insert(widget.id.as_str(), widget).is_some() {
            violations.push(Violation::DuplicateId {
                id: widget.id.clone(),
            });
        }
    }

    let mut groups: BTreeMap<(Option<&str>, u32), Vec<WidgetId>> = BTreeMap::new();
    for widget in widgets {
        groups
            .entry((widget.parent_section(), widget.order))
            .or_default()
            .push(widget.id.clone());
    }
    for ((section, order), ids) in groups {
        if ids.len() > 1 {
            violations.push(Violation::DuplicateOrder {
                section: section.map(str::to_string),
                order,
                ids,
            });
        }
    }

    for widget in widgets {
        let Some(parent) = widget.parent_section() else {
            continue;
        };
        if widget.is_section() {
            violations.push(Violation::NestedSection {
                id: widget.id.clone(),
                parent: parent.to_string(),
            });
        }
        match by_id.get(parent) {
            None => violations.push(Violation::DanglingSection {
                id: widget.id.clone(),
                section: parent.to_string(),
            }),
            Some(target) if !target.is_section() => violations.push(Violation::NotASection {
                id: widget.id.clone(),
                section: parent.to_string(),
            }),
            Some(_) => {}
        }
    }

    for section in widgets.iter().filter(|w| w.is_section()) {
        let expected = expected_children(widgets, &section.id);
        let actual: Vec<WidgetId> = section.child_ids().into_iter().map(str::to_string).collect();
        for id in actual.iter().filter(|id| !by_id.contains_key(id.as_str())) {
            violations.push(Violation::DanglingChild {
                section: section.id.clone(),
                id: id.clone(),
            });
        }
        if expected != actual {
            violations.push(Violation::ChildListMismatch {
                section: section.id.clone(),
                expected,
                actual,
            });
        }
    }

    violations
}

/// Fail with [`CoreError::InvariantViolation`] if any check fails.
pub fn assert_widgets(widgets: &[Widget]) -> Result<(), CoreError> {
    let violations = check_widgets(widgets);
    if violations.is_empty() {
        return Ok(());
    }
    let messages: Vec<String> = violations.iter().map(ToString::to_string).collect();
    Err(CoreError::InvariantViolation(messages.join("; ")))
}

/// Return the collection in display order with `order` rewritten to the
/// dashboard-wide ranks `0..n`.
pub fn renumber(widgets: &[Widget]) -> Vec<Widget> {
    let mut ordered = display_order(widgets);
    for (rank, widget) in ordered.iter_mut().enumerate() {
        widget.order = u32::try_from(rank).unwrap_or(u32::MAX);
    }
    ordered
}

/// Rewrite every Section's child list from the `section` back-references.
///
/// Positions and every other field are left as they are.
pub fn sync_section_children(widgets: &[Widget]) -> Vec<Widget> {
    let mut synced = widgets.to_vec();
    for widget in synced.iter_mut().filter(|w| w.is_section()) {
        let expected = expected_children(widgets, &widget.id);
        if widget.child_ids() != expected {
            tracing::info!(section = %widget.id, children = ?expected, "Resynced section child list");
            widget.set_child_ids(expected);
        }
    }
    synced
}
