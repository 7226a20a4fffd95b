//! Relative layout: percentage constraints and the pure geometry
//! computation.
//!
//! A [`Place`] describes a widget's position and size relative to its parent
//! as percentage offsets, with optional fixed-pixel overrides per axis,
//! stick/center flags, and pixel deltas applied last. [`resolve`] maps a
//! constraint and a parent's measured size to one absolute rectangle. The
//! tree-walk driver that applies it across a subtree lives on the core.

use crate::{
    error::{Error, Result},
    geom::{Expanse, Rect},
    id::WidgetId,
};

/// A relative placement constraint.
///
/// Offsets are percentages of the parent extent. `x_offset + x_offset_left`
/// positions the left edge; `x_offset + x_offset_right` reserves space from
/// the right edge; analogously for Y. Fixed fields override the percentage
/// computation on their axis, and fixed and percentage fields may be mixed
/// across axes. Precedence for position adjustment is center over stick over
/// the raw offset computation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Place {
    /// Fixed horizontal origin, overriding the percentage computation.
    pub fix_x: Option<i32>,
    /// Fixed vertical origin.
    pub fix_y: Option<i32>,
    /// Fixed width.
    pub fix_w: Option<u32>,
    /// Fixed height.
    pub fix_h: Option<u32>,

    /// Base horizontal offset percentage.
    pub x_offset: f64,
    /// Additional offset for the left edge.
    pub x_offset_left: f64,
    /// Space reserved from the right edge.
    pub x_offset_right: f64,
    /// Base vertical offset percentage.
    pub y_offset: f64,
    /// Additional offset for the top edge.
    pub y_offset_up: f64,
    /// Space reserved from the bottom edge.
    pub y_offset_down: f64,

    /// Snap the right edge of the widget to the parent's right edge.
    pub stick_right: bool,
    /// Snap the bottom edge to the parent's bottom edge.
    pub stick_down: bool,
    /// Center horizontally, overriding offsets and stick.
    pub center_x: bool,
    /// Center vertically.
    pub center_y: bool,

    /// Pixel delta added to the computed x.
    pub change_x: i32,
    /// Pixel delta added to the computed y.
    pub change_y: i32,
    /// Pixel delta added to the computed width.
    pub change_w: i32,
    /// Pixel delta added to the computed height.
    pub change_h: i32,

    /// Attached vertical scrollbar, compensated for in the width
    /// computation when auto-placement is on.
    pub vbar: Option<WidgetId>,
    /// Attached horizontal scrollbar.
    pub hbar: Option<WidgetId>,
    /// Reposition attached scrollbars flush to the widget after each layout
    /// computation, and reserve their thickness.
    pub auto_place_bars: bool,
}

impl Place {
    /// An empty constraint: full parent extent, no adjustments.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set fixed pixel geometry for any subset of fields.
    pub fn fixed(
        mut self,
        x: Option<i32>,
        y: Option<i32>,
        w: Option<u32>,
        h: Option<u32>,
    ) -> Self {
        self.fix_x = x;
        self.fix_y = y;
        self.fix_w = w;
        self.fix_h = h;
        self
    }

    /// Set the base offset percentages for both axes.
    pub fn offset(mut self, x: f64, y: f64) -> Self {
        self.x_offset = x;
        self.y_offset = y;
        self
    }

    /// Set the per-edge horizontal offset percentages.
    pub fn x_edges(mut self, left: f64, right: f64) -> Self {
        self.x_offset_left = left;
        self.x_offset_right = right;
        self
    }

    /// Set the per-edge vertical offset percentages.
    pub fn y_edges(mut self, up: f64, down: f64) -> Self {
        self.y_offset_up = up;
        self.y_offset_down = down;
        self
    }

    /// Set the stick flags.
    pub fn stick(mut self, right: bool, down: bool) -> Self {
        self.stick_right = right;
        self.stick_down = down;
        self
    }

    /// Set the centering flags.
    pub fn center(mut self, x: bool, y: bool) -> Self {
        self.center_x = x;
        self.center_y = y;
        self
    }

    /// Set the pixel deltas applied after everything else.
    pub fn deltas(mut self, x: i32, y: i32, w: i32, h: i32) -> Self {
        self.change_x = x;
        self.change_y = y;
        self.change_w = w;
        self.change_h = h;
        self
    }

    /// Attach scrollbars for thickness compensation and auto-placement.
    pub fn scrollbars(
        mut self,
        vbar: Option<WidgetId>,
        hbar: Option<WidgetId>,
        auto_place: bool,
    ) -> Self {
        self.vbar = vbar;
        self.hbar = hbar;
        self.auto_place_bars = auto_place;
        self
    }

    /// Validate the offset sums. Each of `x_offset + x_offset_left`,
    /// `x_offset + x_offset_right`, `y_offset + y_offset_up` and
    /// `y_offset + y_offset_down` must lie in [0, 100]. Violations are
    /// rejected here, before any geometry is computed.
    pub fn validate(&self) -> Result<()> {
        let sums = [
            ("x_offset + x_offset_left", self.x_offset + self.x_offset_left),
            ("x_offset + x_offset_right", self.x_offset + self.x_offset_right),
            ("y_offset + y_offset_up", self.y_offset + self.y_offset_up),
            ("y_offset + y_offset_down", self.y_offset + self.y_offset_down),
        ];
        for (name, sum) in sums {
            if !(0.0..=100.0).contains(&sum) {
                return Err(Error::Constraint(format!(
                    "{name} must lie in [0, 100], got {sum}"
                )));
            }
        }
        Ok(())
    }
}

/// Map a percentage onto a pixel extent.
fn pct(v: f64, extent: f64) -> f64 {
    v / 100.0 * extent
}

/// Compute absolute geometry for a constraint against a parent's measured
/// size. Pure and idempotent: the same inputs always yield the same rect.
///
/// `vbar_thickness`/`hbar_thickness` are the attached scrollbar thicknesses
/// to reserve; callers pass zero when no bar is attached or auto-placement
/// is off.
pub fn resolve(
    parent: Expanse,
    place: &Place,
    vbar_thickness: u32,
    hbar_thickness: u32,
) -> Rect {
    let pw = f64::from(parent.w);
    let ph = f64::from(parent.h);

    let mut x = place
        .fix_x
        .map_or_else(|| pct(place.x_offset + place.x_offset_left, pw), f64::from);
    let mut y = place
        .fix_y
        .map_or_else(|| pct(place.y_offset + place.y_offset_up, ph), f64::from);
    let mut w = place.fix_w.map_or_else(
        || pw - pct(place.x_offset + place.x_offset_right, pw) - x - f64::from(vbar_thickness),
        f64::from,
    );
    let mut h = place.fix_h.map_or_else(
        || ph - pct(place.y_offset + place.y_offset_down, ph) - y - f64::from(hbar_thickness),
        f64::from,
    );

    // Position adjustment precedence: center beats stick beats offsets.
    if place.stick_right {
        x = pw - w;
    }
    if place.stick_down {
        y = ph - h;
    }
    if place.center_x {
        x = (pw / 2.0 - w / 2.0).round();
    }
    if place.center_y {
        y = (ph / 2.0 - h / 2.0).round();
    }

    w += f64::from(place.change_w);
    h += f64::from(place.change_h);
    x += f64::from(place.change_x);
    y += f64::from(place.change_y);

    Rect::new(
        x.round() as i32,
        y.round() as i32,
        w.round().max(0.0) as u32,
        h.round().max(0.0) as u32,
    )
}
