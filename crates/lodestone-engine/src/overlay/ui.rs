use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::coords::{Rect, Vec2};
use crate::input::{InputFrame, InputState, MouseButton};
use crate::paint::Color;

use super::list::OverlayList;

/// Widgets a scene may place in the debug panel.
///
/// Every call lays out one row (or two, for compound widgets) below the
/// previous one. Value widgets return `true` when they changed the value.
pub trait DebugUi {
    fn label(&mut self, text: &str);
    fn separator(&mut self);
    /// True on the frame the button is released over itself.
    fn button(&mut self, label: &str) -> bool;
    fn slider_f32(&mut self, label: &str, value: &mut f32, min: f32, max: f32) -> bool;
    fn slider_vec2(&mut self, label: &str, value: &mut Vec2, min: f32, max: f32) -> bool;
    /// Straight-alpha RGBA, one slider per channel.
    fn color_edit(&mut self, label: &str, color: &mut Color) -> bool;
}

pub const ROW_HEIGHT: f32 = 22.0;
pub const TEXT_SIZE: f32 = 14.0;
const GAP: f32 = 4.0;
const PADDING: f32 = 8.0;

const PANEL: Color = Color::rgba(0.08, 0.08, 0.10, 0.85);
const WIDGET: Color = Color::rgba(0.22, 0.26, 0.34, 1.0);
const WIDGET_HOVER: Color = Color::rgba(0.30, 0.36, 0.48, 1.0);
const WIDGET_HELD: Color = Color::rgba(0.16, 0.20, 0.28, 1.0);
const FILL: Color = Color::rgba(0.35, 0.55, 0.85, 1.0);
const TEXT: Color = Color::rgba(0.92, 0.92, 0.92, 1.0);
const RULE: Color = Color::rgba(0.40, 0.40, 0.45, 1.0);

/// Widget interaction that outlives a frame.
#[derive(Debug, Default, Clone)]
pub struct OverlayState {
    active: Option<u64>,
}

impl OverlayState {
    pub fn is_interacting(&self) -> bool {
        self.active.is_some()
    }
}

/// Primary-button pointer state for one frame, in overlay space.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct OverlayInput {
    pub pointer: Option<Vec2>,
    pub down: bool,
    pub pressed: bool,
    pub released: bool,
}

impl OverlayInput {
    pub fn from_input(state: &InputState, frame: &InputFrame) -> Self {
        Self {
            pointer: state.pointer,
            down: state.button_down(MouseButton::Left),
            pressed: frame.button_pressed(MouseButton::Left),
            released: frame.button_released(MouseButton::Left),
        }
    }
}

/// What a finished panel produced.
#[derive(Debug, Clone, Default)]
pub struct OverlayOutput {
    pub list: OverlayList,
    pub panel: Rect,
    /// Pointer is over the panel or dragging one of its widgets.
    pub wants_pointer: bool,
}

#[derive(Debug, Copy, Clone)]
struct Interaction {
    hovered: bool,
    held: bool,
    clicked: bool,
}

/// Immediate-mode debug panel; rebuilt every frame.
pub struct OverlayUi<'s> {
    state: &'s mut OverlayState,
    input: OverlayInput,
    list: OverlayList,
    origin: Vec2,
    width: f32,
    cursor_y: f32,
}

impl<'s> OverlayUi<'s> {
    pub fn begin(state: &'s mut OverlayState, input: OverlayInput, origin: Vec2, width: f32) -> Self {
        Self {
            state,
            input,
            list: OverlayList::new(),
            origin,
            width,
            cursor_y: origin.y + PADDING,
        }
    }

    /// Closes the panel: puts the background behind the widgets and ends any
    /// interaction whose button went up.
    pub fn finish(mut self) -> OverlayOutput {
        if self.input.released || !self.input.down {
            self.state.active = None;
        }

        let height = (self.cursor_y - self.origin.y - GAP + PADDING).max(2.0 * PADDING);
        let panel = Rect::from_origin_size(self.origin, Vec2::new(self.width, height));
        self.list.push_rect_behind(panel, PANEL);

        let over_panel = self.input.pointer.is_some_and(|p| panel.contains(p));
        OverlayOutput {
            list: self.list,
            panel,
            wants_pointer: over_panel || self.state.active.is_some(),
        }
    }

    fn next_row(&mut self, height: f32) -> Rect {
        let row = Rect::new(
            self.origin.x + PADDING,
            self.cursor_y,
            (self.width - 2.0 * PADDING).max(0.0),
            height,
        );
        self.cursor_y += height + GAP;
        row
    }

    fn interact(&mut self, id: u64, rect: Rect) -> Interaction {
        let hovered = self.input.pointer.is_some_and(|p| rect.contains(p));
        if hovered && self.input.pressed && self.state.active.is_none() {
            self.state.active = Some(id);
        }
        let active = self.state.active == Some(id);
        Interaction {
            hovered,
            held: active && self.input.down,
            clicked: active && hovered && self.input.released,
        }
    }

    fn text_in(&mut self, rect: Rect, text: &str) {
        let origin = Vec2::new(rect.origin.x + 4.0, rect.origin.y + (rect.size.y - TEXT_SIZE) * 0.5);
        self.list.push_text(origin, text, TEXT_SIZE, TEXT);
    }

    #[allow(clippy::too_many_arguments)]
    fn slider_track(
        &mut self,
        id: u64,
        rect: Rect,
        value: &mut f32,
        min: f32,
        max: f32,
        prefix: &str,
        precision: usize,
    ) -> bool {
        let ia = self.interact(id, rect);

        let mut changed = false;
        if ia.held {
            if let Some(p) = self.input.pointer {
                let next = min + rect.fraction_x(p.x) * (max - min);
                if next != *value {
                    *value = next;
                    changed = true;
                }
            }
        }

        let t = if max > min { ((*value - min) / (max - min)).clamp(0.0, 1.0) } else { 0.0 };
        self.list.push_rect(rect, if ia.hovered || ia.held { WIDGET_HOVER } else { WIDGET });
        self.list.push_rect(
            Rect::from_origin_size(rect.origin, Vec2::new(rect.size.x * t, rect.size.y)),
            FILL,
        );
        self.text_in(rect, &format!("{prefix}{:.*}", precision, *value));
        changed
    }
}

/// Stable widget id from its label and a sub-index.
fn widget_id(label: &str, part: u32) -> u64 {
    let mut h = DefaultHasher::new();
    label.hash(&mut h);
    part.hash(&mut h);
    h.finish()
}

impl DebugUi for OverlayUi<'_> {
    fn label(&mut self, text: &str) {
        let row = self.next_row(ROW_HEIGHT);
        self.text_in(row, text);
    }

    fn separator(&mut self) {
        let row = self.next_row(1.0);
        self.list.push_rect(row, RULE);
    }

    fn button(&mut self, label: &str) -> bool {
        let row = self.next_row(ROW_HEIGHT);
        let ia = self.interact(widget_id(label, 0), row);
        let color = match (ia.held, ia.hovered) {
            (true, _) => WIDGET_HELD,
            (false, true) => WIDGET_HOVER,
            (false, false) => WIDGET,
        };
        self.list.push_rect(row, color);
        self.text_in(row, label);
        ia.clicked
    }

    fn slider_f32(&mut self, label: &str, value: &mut f32, min: f32, max: f32) -> bool {
        let row = self.next_row(ROW_HEIGHT);
        self.slider_track(widget_id(label, 0), row, value, min, max, &format!("{label}: "), 1)
    }

    fn slider_vec2(&mut self, label: &str, value: &mut Vec2, min: f32, max: f32) -> bool {
        self.label(label);
        let row = self.next_row(ROW_HEIGHT);
        let mut cols = row.columns(2, GAP);
        let (Some(cx), Some(cy)) = (cols.next(), cols.next()) else {
            return false;
        };
        let x = self.slider_track(widget_id(label, 1), cx, &mut value.x, min, max, "x ", 1);
        let y = self.slider_track(widget_id(label, 2), cy, &mut value.y, min, max, "y ", 1);
        x || y
    }

    fn color_edit(&mut self, label: &str, color: &mut Color) -> bool {
        let head = self.next_row(ROW_HEIGHT);
        self.text_in(head, label);
        let swatch = Rect::new(
            head.max().x - 2.0 * ROW_HEIGHT,
            head.origin.y + 3.0,
            2.0 * ROW_HEIGHT,
            ROW_HEIGHT - 6.0,
        );
        self.list.push_rect(swatch, color.clamped());

        let row = self.next_row(ROW_HEIGHT);
        let mut changed = false;
        for (i, (cell, prefix)) in row.columns(4, GAP).zip(["r ", "g ", "b ", "a "]).enumerate() {
            let Some(channel) = color.channel_mut(i) else { continue };
            changed |= self.slider_track(widget_id(label, 1 + i as u32), cell, channel, 0.0, 1.0, prefix, 2);
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::OverlayCmd;

    const ORIGIN: Vec2 = Vec2::new(0.0, 0.0);
    const WIDTH: f32 = 200.0;

    /// Center of the first widget row.
    fn first_row_point() -> Vec2 {
        Vec2::new(PADDING + 20.0, PADDING + ROW_HEIGHT * 0.5)
    }

    fn press(at: Vec2) -> OverlayInput {
        OverlayInput { pointer: Some(at), down: true, pressed: true, released: false }
    }

    fn hold(at: Vec2) -> OverlayInput {
        OverlayInput { pointer: Some(at), down: true, pressed: false, released: false }
    }

    fn release(at: Vec2) -> OverlayInput {
        OverlayInput { pointer: Some(at), down: false, pressed: false, released: true }
    }

    fn frame<R>(state: &mut OverlayState, input: OverlayInput, body: impl FnOnce(&mut OverlayUi<'_>) -> R) -> (R, OverlayOutput) {
        let mut ui = OverlayUi::begin(state, input, ORIGIN, WIDTH);
        let r = body(&mut ui);
        (r, ui.finish())
    }

    // ── button ────────────────────────────────────────────────────────────

    #[test]
    fn button_clicks_on_release_over_itself() {
        let mut state = OverlayState::default();
        let p = first_row_point();

        let (clicked, _) = frame(&mut state, press(p), |ui| ui.button("Texture"));
        assert!(!clicked);
        assert!(state.is_interacting());

        let (clicked, _) = frame(&mut state, release(p), |ui| ui.button("Texture"));
        assert!(clicked);
        assert!(!state.is_interacting());
    }

    #[test]
    fn release_elsewhere_does_not_click() {
        let mut state = OverlayState::default();
        let p = first_row_point();

        frame(&mut state, press(p), |ui| ui.button("Back"));
        let (clicked, _) = frame(&mut state, release(Vec2::new(500.0, 500.0)), |ui| ui.button("Back"));
        assert!(!clicked);
    }

    #[test]
    fn only_the_pressed_button_clicks() {
        let mut state = OverlayState::default();
        let p = first_row_point();

        frame(&mut state, press(p), |ui| (ui.button("a"), ui.button("b")));
        let ((a, b), _) = frame(&mut state, release(p), |ui| (ui.button("a"), ui.button("b")));
        assert!(a);
        assert!(!b);
    }

    // ── sliders ───────────────────────────────────────────────────────────

    #[test]
    fn slider_follows_pointer_while_held() {
        let mut state = OverlayState::default();
        let mut value = 0.0;
        let track_start = PADDING;
        let track_width = WIDTH - 2.0 * PADDING;
        let y = PADDING + ROW_HEIGHT * 0.5;

        let at = |fraction: f32| Vec2::new(track_start + fraction * track_width, y);

        let (changed, _) = frame(&mut state, press(at(0.5)), |ui| ui.slider_f32("speed", &mut value, 0.0, 500.0));
        assert!(changed);
        assert!((value - 250.0).abs() < 1e-3);

        // Dragging past the end clamps.
        frame(&mut state, hold(Vec2::new(1000.0, y)), |ui| ui.slider_f32("speed", &mut value, 0.0, 500.0));
        assert_eq!(value, 500.0);

        let (changed, _) = frame(&mut state, release(at(0.1)), |ui| ui.slider_f32("speed", &mut value, 0.0, 500.0));
        assert!(!changed);
        assert_eq!(value, 500.0);
    }

    #[test]
    fn vec2_slider_edits_one_axis() {
        let mut state = OverlayState::default();
        let mut value = Vec2::new(10.0, 20.0);
        // Second row holds the two tracks; the y track is the right column.
        let y = PADDING + ROW_HEIGHT + GAP + ROW_HEIGHT * 0.5;
        let right_edge = WIDTH - PADDING - 1.0;

        frame(&mut state, press(Vec2::new(right_edge, y)), |ui| {
            ui.slider_vec2("Position", &mut value, 0.0, 500.0)
        });
        assert_eq!(value.x, 10.0);
        assert!(value.y > 490.0);
    }

    #[test]
    fn color_edit_changes_a_single_channel() {
        let mut state = OverlayState::default();
        let mut color = Color::rgba(1.0, 0.8, 0.8, 1.0);
        let y = PADDING + ROW_HEIGHT + GAP + ROW_HEIGHT * 0.5;

        // Leftmost pixel of the red track.
        let (changed, _) = frame(&mut state, press(Vec2::new(PADDING, y)), |ui| ui.color_edit("Clear color", &mut color));
        assert!(changed);
        assert_eq!(color.r, 0.0);
        assert_eq!((color.g, color.b, color.a), (0.8, 0.8, 1.0));
    }

    // ── output ────────────────────────────────────────────────────────────

    #[test]
    fn panel_background_is_painted_first() {
        let mut state = OverlayState::default();
        let (_, out) = frame(&mut state, OverlayInput::default(), |ui| {
            ui.label("Framerate 60.00");
            ui.separator();
        });

        let first = out.list.iter().next().unwrap();
        assert!(matches!(first, OverlayCmd::Rect { rect, .. } if *rect == out.panel));
        assert!(out.list.iter().any(|c| matches!(c, OverlayCmd::Text { text, .. } if text == "Framerate 60.00")));
        assert!(!out.wants_pointer);
    }

    #[test]
    fn pointer_over_panel_is_captured() {
        let mut state = OverlayState::default();
        let (_, out) = frame(&mut state, hold(first_row_point()), |ui| ui.label("hi"));
        assert!(out.wants_pointer);
    }
}
