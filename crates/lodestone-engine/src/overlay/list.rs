use crate::coords::{Rect, Vec2};
use crate::paint::Color;

/// One overlay primitive, in overlay space (top-left origin, +Y down).
#[derive(Debug, Clone, PartialEq)]
pub enum OverlayCmd {
    Rect { rect: Rect, color: Color },
    Text { origin: Vec2, text: String, size: f32, color: Color },
}

/// Overlay primitives in paint order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverlayList {
    cmds: Vec<OverlayCmd>,
}

impl OverlayList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_rect(&mut self, rect: Rect, color: Color) {
        if !rect.is_empty() {
            self.cmds.push(OverlayCmd::Rect { rect, color });
        }
    }

    pub fn push_text(&mut self, origin: Vec2, text: impl Into<String>, size: f32, color: Color) {
        let text = text.into();
        if !text.is_empty() {
            self.cmds.push(OverlayCmd::Text { origin, text, size, color });
        }
    }

    /// Inserts a rect beneath everything pushed so far.
    pub fn push_rect_behind(&mut self, rect: Rect, color: Color) {
        if !rect.is_empty() {
            self.cmds.insert(0, OverlayCmd::Rect { rect, color });
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &OverlayCmd> {
        self.cmds.iter()
    }

    pub fn len(&self) -> usize {
        self.cmds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cmds.is_empty()
    }

    pub fn clear(&mut self) {
        self.cmds.clear();
    }
}
