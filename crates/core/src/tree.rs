//! Two-level widget tree for drag-and-drop views.
//!
//! The tree is never patched in place: every reorder rebuilds it from the
//! flat collection returned by [`move_widget`]. Dashboards hold tens of
//! widgets, so the rebuild cost does not matter.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::ordering::move_widget;
use crate::types::WidgetId;
use crate::widget::Widget;

/// Suffix appended to a section id to name its empty-section drop target.
pub const DIVIDER_SUFFIX: &str = "-divider";

/// Sort widgets into flat display order.
///
/// Top-level widgets come by ascending `order`, each Section immediately
/// followed by its children by ascending `order`. Only Section widgets
/// contain children and Sections are always top level; a widget whose
/// `section` does not name an existing Section is shown at top level. Ties
/// keep input order.
pub fn display_order(widgets: &[Widget]) -> Vec<Widget> {
    let section_ids: HashSet<&str> = widgets
        .iter()
        .filter(|w| w.is_section())
        .map(|w| w.id.as_str())
        .collect();

    let mut top_level: Vec<&Widget> = Vec::new();
    let mut children: HashMap<&str, Vec<&Widget>> = HashMap::new();
    for widget in widgets {
        match widget.parent_section() {
            Some(parent) if !widget.is_section() && section_ids.contains(parent) => {
                children.entry(parent).or_default().push(widget);
            }
            _ => top_level.push(widget),
        }
    }
    top_level.sort_by_key(|w| w.order);

    let mut ordered = Vec::with_capacity(widgets.len());
    for widget in top_level {
        ordered.push(widget.clone());
        if widget.is_section() {
            if let Some(mut kids) = children.remove(widget.id.as_str()) {
                kids.sort_by_key(|w| w.order);
                ordered.extend(kids.into_iter().cloned());
            }
        }
    }
    ordered
}

/// A node of the drag-and-drop tree.
///
/// Divider nodes (the drop target shown inside an empty section) carry no
/// widget.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetTreeItem {
    pub id: WidgetId,
    pub drag_index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub widget: Option<Widget>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<WidgetTreeItem>,
}

impl WidgetTreeItem {
    pub fn is_divider(&self) -> bool {
        self.widget.is_none()
    }
}

/// What a drag index points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DragSlot {
    /// Flat display position of a widget.
    Widget(usize),
    /// Divider of the section at this flat display position.
    Divider { section: usize },
}

#[derive(Debug, Clone)]
pub struct WidgetTree {
    items: Vec<WidgetTreeItem>,
    widgets: Vec<Widget>,
    slots: Vec<DragSlot>,
}

impl WidgetTree {
    /// Build the tree from a widget collection in any order.
    pub fn build(widgets: &[Widget]) -> Self {
        let widgets = display_order(widgets);
        let mut items = Vec::new();
        let mut slots = Vec::with_capacity(widgets.len());

        let mut pos = 0;
        while pos < widgets.len() {
            let widget = &widgets[pos];
            let mut item = WidgetTreeItem {
                id: widget.id.clone(),
                drag_index: slots.len(),
                widget: Some(widget.clone()),
                children: Vec::new(),
            };
            slots.push(DragSlot::Widget(pos));
            let section_pos = pos;
            pos += 1;

            if widget.is_section() {
                while pos < widgets.len()
                    && !widgets[pos].is_section()
                    && widgets[pos].parent_section() == Some(widget.id.as_str())
                {
                    item.children.push(WidgetTreeItem {
                        id: widgets[pos].id.clone(),
                        drag_index: slots.len(),
                        widget: Some(widgets[pos].clone()),
                        children: Vec::new(),
                    });
                    slots.push(DragSlot::Widget(pos));
                    pos += 1;
                }

                if item.children.is_empty() {
                    item.children.push(WidgetTreeItem {
                        id: format!("{}{DIVIDER_SUFFIX}", widget.id),
                        drag_index: slots.len(),
                        widget: None,
                        children: Vec::new(),
                    });
                    slots.push(DragSlot::Divider {
                        section: section_pos,
                    });
                }
            }
            items.push(item);
        }

        Self {
            items,
            widgets,
            slots,
        }
    }

    /// Top-level nodes.
    pub fn items(&self) -> &[WidgetTreeItem] {
        &self.items
    }

    /// Widgets in flat display order.
    pub fn widgets(&self) -> &[Widget] {
        &self.widgets
    }

    pub fn into_widgets(self) -> Vec<Widget> {
        self.widgets
    }

    /// Number of drag indices (widgets plus dividers).
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Translate a drag from `source` to `destination` (drag indices) into
    /// the `(index, new_index)` pair [`move_widget`] expects.
    ///
    /// Returns `None` when the source is not a draggable widget. Dropping on
    /// a divider targets its section; a destination past the last slot maps
    /// to an out-of-range position, which the mutator ignores.
    pub fn resolve_drop(&self, source: usize, destination: usize) -> Option<(usize, isize)> {
        let DragSlot::Widget(index) = *self.slots.get(source)? else {
            return None;
        };
        let target = match self.slots.get(destination) {
            Some(DragSlot::Widget(pos)) => *pos,
            Some(DragSlot::Divider { section }) => *section,
            None => self.widgets.len(),
        };
        Some((index, isize::try_from(target).unwrap_or(isize::MAX)))
    }

    /// Apply a drag-end event and rebuild the tree from the mutator output.
    ///
    /// Returns `None` when nothing was dropped or the source cannot move.
    pub fn on_drag_end(&self, source: usize, destination: Option<usize>) -> Option<WidgetTree> {
        let (index, new_index) = self.resolve_drop(source, destination?)?;
        tracing::debug!(source, index, new_index, "Widget dropped");
        Some(Self::build(&move_widget(&self.widgets, index, new_index)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget::WidgetType;
    use pretty_assertions::assert_eq;

    fn section(id: &str, order: u32, children: &[&str]) -> Widget {
        let mut w = Widget::new(id, id, WidgetType::Section, order);
        w.set_child_ids(children.iter().map(|c| c.to_string()).collect());
        w
    }

    fn child(id: &str, order: u32, parent: &str) -> Widget {
        Widget::new(id, id, WidgetType::Text, order).in_section(parent)
    }

    /// intro | s1 [c1, c2] | table | s2 [] | tail, shuffled.
    fn shuffled() -> Vec<Widget> {
        vec![
            Widget::new("tail", "tail", WidgetType::Image, 6),
            child("c2", 3, "s1"),
            section("s2", 5, &[]),
            Widget::new("intro", "intro", WidgetType::Text, 0),
            child("c1", 2, "s1"),
            Widget::new("table", "table", WidgetType::Table, 4),
            section("s1", 1, &["c1", "c2"]),
        ]
    }

    fn ids(widgets: &[Widget]) -> Vec<&str> {
        widgets.iter().map(|w| w.id.as_str()).collect()
    }

    // -- display_order -----------------------------------------------------

    #[test]
    fn children_follow_their_section() {
        let ordered = display_order(&shuffled());
        assert_eq!(
            ids(&ordered),
            vec!["intro", "s1", "c1", "c2", "table", "s2", "tail"]
        );
    }

    #[test]
    fn dangling_section_reference_is_shown_top_level() {
        let widgets = vec![
            child("orphan", 1, "ghost"),
            Widget::new("a", "a", WidgetType::Text, 0),
        ];
        assert_eq!(ids(&display_order(&widgets)), vec!["a", "orphan"]);
    }

    #[test]
    fn widgets_inside_non_section_are_top_level() {
        let widgets = vec![
            Widget::new("text", "text", WidgetType::Text, 0),
            child("inner", 1, "text"),
        ];
        assert_eq!(ids(&display_order(&widgets)), vec!["text", "inner"]);
    }

    #[test]
    fn nested_section_is_kept_top_level() {
        let widgets = vec![
            section("outer", 0, &[]),
            section("inner", 1, &[]).in_section("outer"),
        ];
        let tree = WidgetTree::build(&widgets);
        assert_eq!(tree.items().len(), 2);
    }

    #[test]
    fn ties_keep_input_order() {
        let widgets = vec![
            Widget::new("b", "b", WidgetType::Text, 0),
            Widget::new("a", "a", WidgetType::Text, 0),
        ];
        assert_eq!(ids(&display_order(&widgets)), vec!["b", "a"]);
    }

    // -- build -------------------------------------------------------------

    #[test]
    fn builds_two_level_tree_with_sequential_drag_indices() {
        let tree = WidgetTree::build(&shuffled());
        let top: Vec<(&str, usize)> = tree
            .items()
            .iter()
            .map(|i| (i.id.as_str(), i.drag_index))
            .collect();
        assert_eq!(
            top,
            vec![("intro", 0), ("s1", 1), ("table", 4), ("s2", 5), ("tail", 7)]
        );

        let s1 = &tree.items()[1];
        let kids: Vec<(&str, usize)> = s1
            .children
            .iter()
            .map(|i| (i.id.as_str(), i.drag_index))
            .collect();
        assert_eq!(kids, vec![("c1", 2), ("c2", 3)]);
        assert_eq!(tree.slot_count(), 8);
    }

    #[test]
    fn empty_section_gets_divider() {
        let tree = WidgetTree::build(&shuffled());
        let s2 = &tree.items()[3];
        assert_eq!(s2.children.len(), 1);
        let divider = &s2.children[0];
        assert!(divider.is_divider());
        assert_eq!(divider.id, "s2-divider");
        assert_eq!(
            serde_json::to_value(divider).unwrap(),
            serde_json::json!({ "id": "s2-divider", "dragIndex": 6 })
        );
    }

    // -- drag handling -----------------------------------------------------

    #[test]
    fn resolve_drop_maps_slots_to_positions() {
        let tree = WidgetTree::build(&shuffled());
        assert_eq!(tree.resolve_drop(7, 4), Some((6, 4)));
        assert_eq!(tree.resolve_drop(7, 6), Some((6, 5)));
        assert_eq!(tree.resolve_drop(0, 99), Some((0, 7)));
        assert_eq!(tree.resolve_drop(6, 0), None);
        assert_eq!(tree.resolve_drop(42, 0), None);
    }

    #[test]
    fn dropping_on_divider_enters_empty_section() {
        let tree = WidgetTree::build(&shuffled());
        let moved = tree.on_drag_end(7, Some(6)).unwrap();

        let s2 = &moved.items()[3];
        assert_eq!(s2.id, "s2");
        assert_eq!(s2.children.len(), 1);
        assert_eq!(s2.children[0].id, "tail");
        assert!(!s2.children[0].is_divider());
        assert_eq!(moved.items().len(), 4);
    }

    #[test]
    fn dropping_on_divider_from_above_joins_front_of_section() {
        let tree = WidgetTree::build(&shuffled());
        assert_eq!(tree.resolve_drop(4, 6), Some((4, 5)));
        let moved = tree.on_drag_end(4, Some(6)).unwrap();

        let top: Vec<&str> = moved.items().iter().map(|i| i.id.as_str()).collect();
        assert_eq!(top, vec!["intro", "s1", "s2", "tail"]);
        let s2 = &moved.items()[2];
        assert_eq!(s2.children.len(), 1);
        assert_eq!(s2.children[0].id, "table");
        assert_eq!(s2.children[0].drag_index, 5);

        let widgets = moved.widgets();
        let section = widgets.iter().find(|w| w.id == "s2").unwrap();
        assert_eq!(section.child_ids(), vec!["table"]);
        assert!(crate::integrity::check_widgets(widgets).is_empty());
    }

    #[test]
    fn dragging_section_carries_its_children() {
        let tree = WidgetTree::build(&shuffled());
        let moved = tree.on_drag_end(1, Some(4)).unwrap();

        let top: Vec<(&str, usize)> = moved
            .items()
            .iter()
            .map(|i| (i.id.as_str(), i.drag_index))
            .collect();
        assert_eq!(
            top,
            vec![("intro", 0), ("table", 1), ("s1", 2), ("s2", 5), ("tail", 7)]
        );
        let kids: Vec<&str> = moved.items()[2]
            .children
            .iter()
            .map(|i| i.id.as_str())
            .collect();
        assert_eq!(kids, vec!["c1", "c2"]);
        assert!(crate::integrity::check_widgets(moved.widgets()).is_empty());

        let back = moved.on_drag_end(2, Some(1)).unwrap();
        assert_eq!(back.items(), tree.items());
    }

    #[test]
    fn dragging_sibling_reorders_children() {
        let tree = WidgetTree::build(&shuffled());
        let moved = tree.on_drag_end(2, Some(3)).unwrap();
        let s1 = &moved.items()[1];
        let kids: Vec<&str> = s1.children.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(kids, vec!["c2", "c1"]);
    }

    #[test]
    fn dropping_outside_does_nothing() {
        let tree = WidgetTree::build(&shuffled());
        assert!(tree.on_drag_end(0, None).is_none());
    }

    #[test]
    fn divider_cannot_be_dragged() {
        let tree = WidgetTree::build(&shuffled());
        assert!(tree.on_drag_end(6, Some(0)).is_none());
    }

    #[test]
    fn drop_past_end_rebuilds_unchanged_tree() {
        let tree = WidgetTree::build(&shuffled());
        let moved = tree.on_drag_end(0, Some(99)).unwrap();
        assert_eq!(moved.widgets(), tree.widgets());
        assert_eq!(moved.items(), tree.items());
    }
}
