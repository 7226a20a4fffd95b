//! Widget kinds and the arena node record.

use std::collections::HashMap;

use crate::{
    event::{EventType, Subscriptions},
    geom::Rect,
    id::{TaskId, WidgetId},
    layout::Place,
};

/// Scrollbar orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orientation {
    /// Horizontal scrollbar, placed along the bottom edge.
    Horizontal,
    /// Vertical scrollbar, placed along the right edge.
    Vertical,
}

/// The closed set of widget kinds this core manages. Each variant carries the
/// per-kind data the core needs; everything else lives behind the toolkit
/// boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetKind {
    /// A toplevel window. The root window owns the arena.
    Window,
    /// A plain container.
    Frame,
    /// A text label.
    Label,
    /// A push button.
    Button,
    /// A single-line text entry.
    Entry,
    /// A drawing canvas. A container for embedded widgets.
    Canvas,
    /// A scrollbar, attachable to a placed widget for thickness
    /// compensation and auto-placement.
    Scrollbar {
        /// Which edge the bar runs along.
        orientation: Orientation,
        /// Bar thickness in pixels.
        thickness: u32,
    },
}

impl WidgetKind {
    /// The kind name, used in errors and traces.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Window => "window",
            Self::Frame => "frame",
            Self::Label => "label",
            Self::Button => "button",
            Self::Entry => "entry",
            Self::Canvas => "canvas",
            Self::Scrollbar { .. } => "scrollbar",
        }
    }

    /// True if widgets of this kind can hold children.
    pub fn is_container(&self) -> bool {
        matches!(self, Self::Window | Self::Frame | Self::Canvas)
    }

    /// Scrollbar thickness, zero for other kinds.
    pub fn thickness(&self) -> u32 {
        match self {
            Self::Scrollbar { thickness, .. } => *thickness,
            _ => 0,
        }
    }
}

/// Arena record for one widget. Parent references are non-owning
/// back-references used for lookup only; ownership and destruction order run
/// strictly through the children vec.
pub(crate) struct WidgetNode {
    /// Widget kind and per-kind data.
    pub(crate) kind: WidgetKind,
    /// Parent in the ownership tree. None only for the root window.
    pub(crate) parent: Option<WidgetId>,
    /// Owned children, in creation order.
    pub(crate) children: Vec<WidgetId>,
    /// Relative placement constraint. Created on the first
    /// `place_relative` call, mutated in place afterwards, retained when the
    /// widget is removed from display.
    pub(crate) place: Option<Place>,
    /// Whether the widget is currently placed. Unplaced widgets are skipped
    /// by layout passes.
    pub(crate) placed: bool,
    /// Geometry from the most recent layout computation.
    pub(crate) rect: Rect,
    /// Subscription lists keyed by event type.
    pub(crate) subs: HashMap<EventType, Subscriptions>,
    /// Tasks owned by this widget, canceled at teardown.
    pub(crate) tasks: Vec<TaskId>,
    /// Whether the resize-driven layout hook has been installed. Only
    /// meaningful on toplevel windows.
    pub(crate) resize_hook: bool,
}

impl WidgetNode {
    /// Construct a fresh node under a parent.
    pub(crate) fn new(kind: WidgetKind, parent: Option<WidgetId>) -> Self {
        Self {
            kind,
            parent,
            children: Vec::new(),
            place: None,
            placed: false,
            rect: Rect::zero(),
            subs: HashMap::new(),
            tasks: Vec::new(),
            resize_hook: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn container_kinds() {
        assert!(WidgetKind::Window.is_container());
        assert!(WidgetKind::Frame.is_container());
        assert!(WidgetKind::Canvas.is_container());
        assert!(!WidgetKind::Button.is_container());
        assert!(
            !WidgetKind::Scrollbar {
                orientation: Orientation::Vertical,
                thickness: 16
            }
            .is_container()
        );
    }

    #[test]
    fn scrollbar_thickness() {
        let bar = WidgetKind::Scrollbar {
            orientation: Orientation::Horizontal,
            thickness: 12,
        };
        assert_eq!(bar.thickness(), 12);
        assert_eq!(WidgetKind::Label.thickness(), 0);
    }
}
