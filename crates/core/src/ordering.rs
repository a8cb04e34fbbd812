//! Positional widget moves (the order mutator).
//!
//! Callers pass the dashboard's widgets in display order (see
//! [`crate::tree::display_order`]) together with the flat position of the
//! widget being moved and the position it was dropped on. A move is first
//! classified into a [`MoveKind`], then applied to an index-addressed arena
//! built from a copy of the input. The returned collection keeps the input
//! positions; only `order`, `section` and Section child lists change, and the
//! caller re-sorts and persists it.
//!
//! `order` values are dashboard-wide ranks: in display order they ascend
//! strictly. Every order change below is a swap of the values held at two
//! flat positions, so the multiset of ranks never changes.
//!
//! Malformed input (dangling `section` references, child lists naming
//! unknown ids) never aborts a move. The sub-step that needs the missing
//! widget is skipped and logged; the rest of the move proceeds.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::error::CoreError;
use crate::types::WidgetId;
use crate::widget::Widget;

// ---------------------------------------------------------------------------
// Move classification
// ---------------------------------------------------------------------------

/// Which way a widget travels through the flat display sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Towards the start (`new_index < index`).
    Up,
    /// Towards the end (`new_index > index`).
    Down,
}

impl Direction {
    fn of(index: usize, new_index: usize) -> Self {
        if new_index < index {
            Self::Up
        } else {
            Self::Down
        }
    }
}

/// The end of a section's child list a widget enters or leaves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Edge {
    Front,
    Back,
}

/// The transformation a single move resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MoveKind {
    /// Exchange `order` between the two widgets.
    SimpleSwap,
    /// Carry the moving widget and its children past the neighbouring block
    /// one adjacent swap at a time.
    SubtreeCascade { direction: Direction },
    /// The moving widget becomes a child of `section`. Entering through the
    /// front also exchanges `order` with the neighbour.
    EnterSection { section: WidgetId, edge: Edge },
    /// The moving widget leaves its section. Leaving through the front also
    /// exchanges `order` with the neighbour.
    ExitSection { edge: Edge },
    /// Two children of the same section trade places.
    SiblingSwap,
    /// Children of two different sections trade places: each takes over the
    /// other's `order`, `section` and child-list slot.
    CrossSectionSwap,
}

/// Work out which [`MoveKind`] moving `index` onto `new_index` means.
///
/// Returns `None` when either position is out of range or when the widget
/// would stay where it is.
pub fn classify_move(widgets: &[Widget], index: usize, new_index: usize) -> Option<MoveKind> {
    if index == new_index {
        return None;
    }
    let widget = widgets.get(index)?;
    let neighbor = widgets.get(new_index)?;
    let direction = Direction::of(index, new_index);

    let kind = match (widget.parent_section(), neighbor.parent_section()) {
        (None, None) => match (widget.is_section(), neighbor.is_section()) {
            (false, false) => MoveKind::SimpleSwap,
            (true, true) => MoveKind::SubtreeCascade { direction },
            (true, false) => match direction {
                Direction::Up => MoveKind::SubtreeCascade { direction },
                Direction::Down if has_children(widgets, &widget.id) => {
                    MoveKind::SubtreeCascade { direction }
                }
                Direction::Down => MoveKind::SimpleSwap,
            },
            (false, true) => MoveKind::EnterSection {
                section: neighbor.id.clone(),
                edge: match direction {
                    Direction::Up => Edge::Back,
                    Direction::Down => Edge::Front,
                },
            },
        },
        (Some(parent), Some(other)) if parent == other => MoveKind::SiblingSwap,
        (Some(_), Some(_)) => MoveKind::CrossSectionSwap,
        (Some(_), None) => MoveKind::ExitSection {
            edge: match direction {
                Direction::Up => Edge::Front,
                Direction::Down => Edge::Back,
            },
        },
        (None, Some(parent)) => match direction {
            Direction::Up if widget.is_section() => MoveKind::SubtreeCascade { direction },
            Direction::Up => MoveKind::EnterSection {
                section: parent.to_string(),
                edge: Edge::Back,
            },
            Direction::Down => MoveKind::SubtreeCascade { direction },
        },
    };
    Some(kind)
}

fn has_children(widgets: &[Widget], id: &str) -> bool {
    widgets.iter().any(|w| w.parent_section() == Some(id))
}

/// First Section widget that is itself placed inside a section, if any.
pub fn find_nested_section(widgets: &[Widget]) -> Option<&Widget> {
    widgets
        .iter()
        .find(|w| w.is_section() && w.parent_section().is_some())
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Move the widget at flat position `index` onto position `new_index`.
///
/// `new_index` outside `0..widgets.len()` (and likewise an out-of-range
/// `index`) returns an unchanged copy of the input. The input slice is never
/// modified.
pub fn move_widget(widgets: &[Widget], index: usize, new_index: isize) -> Vec<Widget> {
    let Some(new_index) = usize::try_from(new_index)
        .ok()
        .filter(|&i| i < widgets.len())
    else {
        tracing::debug!(index, new_index, "Move target out of bounds, ignoring");
        return widgets.to_vec();
    };

    if let Some(nested) = find_nested_section(widgets) {
        tracing::warn!(
            section = %nested.id,
            parent = ?nested.section,
            "Nested section present, move result may be inconsistent"
        );
    }

    let Some(kind) = classify_move(widgets, index, new_index) else {
        return widgets.to_vec();
    };
    tracing::debug!(index, new_index, ?kind, "Applying widget move");

    let mut arena = WidgetArena::new(widgets);
    arena.apply(&kind, index, new_index);
    arena.into_widgets()
}

/// Like [`move_widget`], but refuses input containing nested sections.
pub fn try_move_widget(
    widgets: &[Widget],
    index: usize,
    new_index: isize,
) -> Result<Vec<Widget>, CoreError> {
    if let Some(nested) = find_nested_section(widgets) {
        return Err(CoreError::InvariantViolation(format!(
            "Section '{}' is nested inside '{}'",
            nested.id,
            nested.parent_section().unwrap_or_default()
        )));
    }
    Ok(move_widget(widgets, index, new_index))
}

// ---------------------------------------------------------------------------
// Arena
// ---------------------------------------------------------------------------

/// Working copy of a widget collection addressed by arena index.
///
/// `slots` maps each flat display position to the arena index currently
/// occupying it; cascades permute `slots` while the arena keeps the caller's
/// positions.
struct WidgetArena {
    widgets: Vec<Widget>,
    by_id: HashMap<WidgetId, usize>,
    slots: Vec<usize>,
}

impl WidgetArena {
    fn new(widgets: &[Widget]) -> Self {
        let widgets = widgets.to_vec();
        let mut by_id = HashMap::with_capacity(widgets.len());
        for (i, widget) in widgets.iter().enumerate() {
            by_id.entry(widget.id.clone()).or_insert(i);
        }
        let slots = (0..widgets.len()).collect();
        Self {
            widgets,
            by_id,
            slots,
        }
    }

    fn into_widgets(self) -> Vec<Widget> {
        self.widgets
    }

    fn apply(&mut self, kind: &MoveKind, index: usize, new_index: usize) {
        match kind {
            MoveKind::SimpleSwap => self.swap_order(index, new_index),
            MoveKind::SiblingSwap => self.swap_siblings(index, new_index),
            MoveKind::CrossSectionSwap => self.swap_across_sections(index, new_index),
            MoveKind::SubtreeCascade {
                direction: Direction::Up,
            } => self.cascade_up(index, new_index),
            MoveKind::SubtreeCascade {
                direction: Direction::Down,
            } => self.cascade_down(index, new_index),
            MoveKind::EnterSection { section, edge } => {
                self.enter_section(index, new_index, section, *edge)
            }
            MoveKind::ExitSection { edge } => self.exit_section(index, new_index, *edge),
        }
    }

    // -- lookups -----------------------------------------------------------

    /// Widget at flat position `pos`.
    fn at(&self, pos: usize) -> &Widget {
        &self.widgets[self.slots[pos]]
    }

    /// Section widget with the given id. Non-section widgets do not count.
    fn section_mut(&mut self, id: &str) -> Option<&mut Widget> {
        let i = *self.by_id.get(id)?;
        let widget = &mut self.widgets[i];
        widget.is_section().then_some(widget)
    }

    /// Ids belonging to the subtree rooted at arena index `root`.
    fn subtree_ids(&self, root: usize) -> HashSet<WidgetId> {
        let root = &self.widgets[root];
        let mut ids = HashSet::from([root.id.clone()]);
        if root.is_section() {
            ids.extend(
                self.widgets
                    .iter()
                    .filter(|w| w.parent_section() == Some(root.id.as_str()))
                    .map(|w| w.id.clone()),
            );
        }
        ids
    }

    /// Number of contiguous subtree members starting at flat position `start`.
    fn block_len(&self, start: usize, members: &HashSet<WidgetId>) -> usize {
        (start..self.slots.len())
            .take_while(|&pos| members.contains(&self.at(pos).id))
            .count()
            .max(1)
    }

    /// Extend `pos` forward over the contiguous children of `parent`.
    fn extend_run(&self, mut pos: usize, parent: &str) -> usize {
        while pos + 1 < self.slots.len() && self.at(pos + 1).parent_section() == Some(parent) {
            pos += 1;
        }
        pos
    }

    /// Last flat position of the block starting at `pos`: a section with its
    /// trailing children, or a single widget.
    fn block_end(&self, pos: usize) -> usize {
        let widget = self.at(pos);
        if widget.is_section() {
            self.extend_run(pos, &widget.id)
        } else {
            pos
        }
    }

    /// First flat position of `parent`'s block, walking back from one of its
    /// children at `pos`.
    fn parent_block_start(&self, mut pos: usize, parent: &str) -> usize {
        while pos > 0 && self.at(pos - 1).parent_section() == Some(parent) {
            pos -= 1;
        }
        if pos > 0 && self.at(pos - 1).id == parent {
            pos -= 1;
        }
        pos
    }

    // -- primitive swaps ---------------------------------------------------

    fn swap_order(&mut self, a: usize, b: usize) {
        let order_a = self.widgets[a].order;
        self.widgets[a].order = self.widgets[b].order;
        self.widgets[b].order = order_a;
    }

    /// Exchange the widgets at flat positions `pos` and `pos + 1`, leaving
    /// each position's rank in place.
    fn swap_slots(&mut self, pos: usize) {
        let (a, b) = (self.slots[pos], self.slots[pos + 1]);
        self.swap_order(a, b);
        self.slots.swap(pos, pos + 1);
    }

    // -- move kinds --------------------------------------------------------

    fn swap_siblings(&mut self, index: usize, new_index: usize) {
        self.swap_order(index, new_index);

        let widget_id = self.widgets[index].id.clone();
        let neighbor_id = self.widgets[new_index].id.clone();
        let Some(parent_id) = self.widgets[index].parent_section().map(str::to_string) else {
            return;
        };
        match self.section_mut(&parent_id) {
            Some(parent) => {
                if !parent.swap_children(&widget_id, &neighbor_id) {
                    tracing::warn!(
                        section = %parent_id,
                        widget = %widget_id,
                        neighbor = %neighbor_id,
                        "Siblings not both listed in section child list, skipping child swap"
                    );
                }
            }
            None => {
                tracing::warn!(section = %parent_id, "Parent section not found, skipping child swap")
            }
        }
    }

    fn swap_across_sections(&mut self, index: usize, new_index: usize) {
        self.swap_order(index, new_index);

        let widget_id = self.widgets[index].id.clone();
        let neighbor_id = self.widgets[new_index].id.clone();
        let widget_parent = self.widgets[index].section.take();
        let neighbor_parent = self.widgets[new_index].section.take();

        for (parent, old, new) in [
            (&widget_parent, &widget_id, &neighbor_id),
            (&neighbor_parent, &neighbor_id, &widget_id),
        ] {
            let Some(parent_id) = parent.as_deref() else {
                continue;
            };
            match self.section_mut(parent_id) {
                Some(section) => {
                    if !section.replace_child(old, new) {
                        tracing::warn!(section = %parent_id, widget = %old, "Widget not listed in section child list, skipping replacement");
                    }
                }
                None => {
                    tracing::warn!(section = %parent_id, widget = %old, "Parent section not found, skipping replacement")
                }
            }
        }

        self.widgets[index].section = neighbor_parent;
        self.widgets[new_index].section = widget_parent;
    }

    fn enter_section(&mut self, index: usize, new_index: usize, section_id: &str, edge: Edge) {
        let widget_id = self.widgets[index].id.clone();
        let Some(section) = self.section_mut(section_id) else {
            tracing::warn!(section = %section_id, widget = %widget_id, "Target section not found, skipping entry");
            return;
        };
        match edge {
            Edge::Front => section.prepend_child(&widget_id),
            Edge::Back => section.push_child(&widget_id),
        }

        if edge == Edge::Front {
            self.swap_order(index, new_index);
        }
        self.widgets[index].section = Some(section_id.to_string());
    }

    fn exit_section(&mut self, index: usize, new_index: usize, edge: Edge) {
        if edge == Edge::Front {
            self.swap_order(index, new_index);
        }

        let widget_id = self.widgets[index].id.clone();
        if let Some(parent_id) = self.widgets[index].parent_section().map(str::to_string) {
            match self.section_mut(&parent_id) {
                Some(parent) => {
                    parent.remove_child(&widget_id);
                }
                None => {
                    tracing::warn!(section = %parent_id, widget = %widget_id, "Parent section not found, skipping child removal")
                }
            }
        }
        self.widgets[index].section = None;
    }

    /// Move the subtree at `index` up until it starts at the target block.
    ///
    /// When the neighbour is a child of another section the target is that
    /// section's whole block, so the subtree lands just before the section.
    fn cascade_up(&mut self, index: usize, new_index: usize) {
        let members = self.subtree_ids(self.slots[index]);
        let len = self.block_len(index, &members);

        let neighbor = self.at(new_index);
        let lo = match neighbor.parent_section() {
            Some(parent) if !members.contains(&neighbor.id) => {
                self.parent_block_start(new_index, parent)
            }
            _ => new_index,
        };

        let mut start = index;
        while start > lo {
            for pos in start - 1..start - 1 + len {
                self.swap_slots(pos);
            }
            start -= 1;
        }
    }

    /// Move the subtree at `index` down past every position up to the end of
    /// the target block.
    ///
    /// The target block is the one after the subtree when the neighbour is
    /// one of the moving section's own children, the neighbour's section
    /// block when it is a child elsewhere, and otherwise the neighbour's own
    /// block.
    fn cascade_down(&mut self, index: usize, new_index: usize) {
        let members = self.subtree_ids(self.slots[index]);
        let len = self.block_len(index, &members);

        let neighbor = self.at(new_index);
        let hi = if members.contains(&neighbor.id) {
            let after = index + len;
            if after >= self.slots.len() {
                return;
            }
            self.block_end(after)
        } else if let Some(parent) = neighbor.parent_section() {
            self.extend_run(new_index, parent)
        } else {
            self.block_end(new_index)
        };

        let mut start = index;
        while start + len <= hi {
            for pos in (start..start + len).rev() {
                self.swap_slots(pos);
            }
            start += 1;
        }
    }
}
