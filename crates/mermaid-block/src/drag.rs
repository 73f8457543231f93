//! Pointer-driven dragging of nodes and clusters inside one rendered diagram.
//!
//! Positions live only in the session; nothing is written back to the diagram source.

use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// The SVG groups Mermaid emits that can be picked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragTargetKind {
    Node,
    Cluster,
}

impl DragTargetKind {
    /// Maps an element's `class` attribute to a draggable kind.
    pub fn from_class_list(class: &str) -> Option<Self> {
        let mut kind = None;
        for name in class.split_ascii_whitespace() {
            match name {
                "node" => return Some(DragTargetKind::Node),
                "cluster" => kind = Some(DragTargetKind::Cluster),
                _ => {}
            }
        }
        kind
    }
}

/// Element under the pointer when a press happens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragTarget {
    pub element_id: String,
    pub kind: DragTargetKind,
}

/// `translate(x,y)` applied to a dragged element.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Translate(pub Point);

impl fmt::Display for Translate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "translate({},{})", self.0.x, self.0.y)
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Selection {
    element_id: String,
    /// Pointer position minus the element's translation at press time.
    offset: Point,
}

#[derive(Debug, Default)]
pub struct DragSession {
    selected: Option<Selection>,
    positions: HashMap<String, Point>,
}

impl DragSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts tracking `target` if the press landed on a node or cluster.
    ///
    /// Returns whether a drag started. Presses on anything else, or while another element is
    /// still held, are ignored.
    pub fn press(&mut self, target: Option<&DragTarget>, pointer: Point) -> bool {
        let Some(target) = target else {
            return false;
        };
        if self.selected.is_some() {
            return false;
        }
        let current = self.translation(&target.element_id);
        self.selected = Some(Selection {
            element_id: target.element_id.clone(),
            offset: Point::new(pointer.x - current.x, pointer.y - current.y),
        });
        true
    }

    /// Moves the selected element with the pointer. Returns the element id and its new transform,
    /// or `None` when nothing is being dragged.
    pub fn move_to(&mut self, pointer: Point) -> Option<(&str, Translate)> {
        let selection = self.selected.as_ref()?;
        let position = Point::new(
            pointer.x - selection.offset.x,
            pointer.y - selection.offset.y,
        );
        self.positions.insert(selection.element_id.clone(), position);
        Some((selection.element_id.as_str(), Translate(position)))
    }

    pub fn release(&mut self) {
        self.selected = None;
    }

    /// Pointer left the canvas; same as a release.
    pub fn leave(&mut self) {
        self.release();
    }

    pub fn is_dragging(&self) -> bool {
        self.selected.is_some()
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_ref().map(|s| s.element_id.as_str())
    }

    /// Current translation of an element; zero if it was never dragged.
    pub fn translation(&self, element_id: &str) -> Point {
        self.positions.get(element_id).copied().unwrap_or_default()
    }
}
