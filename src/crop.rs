//! Interactive crop widget over a captured still
//!
//! The selection lives in image pixel coordinates. Pointer events arrive in
//! display coordinates (relative to the image's top-left corner on screen) and
//! are mapped through the current container scale, so a container resize
//! never moves the selection on the image.

use image::DynamicImage;

use crate::domain::{DragMode, DragState, Rect, ViewMode};

const EDGE_GRAB_THICKNESS: f32 = 8.0;
const CORNER_DIAMETER: f32 = 16.0;

/// Crop widget configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropOptions {
    /// Fixed width/height ratio; `None` is a free selection
    pub aspect_ratio: Option<f32>,
    pub view_mode: ViewMode,
    pub drag_mode: DragMode,
    /// Draw a checkerboard behind the image
    pub background: bool,
    /// Fraction of the image (per axis) covered by the initial selection
    pub auto_crop_area: f32,
    /// Follow container resizes
    pub responsive: bool,
}

impl Default for CropOptions {
    fn default() -> Self {
        Self {
            aspect_ratio: None,
            view_mode: ViewMode::Restricted,
            drag_mode: DragMode::Crop,
            background: false,
            auto_crop_area: 0.8,
            responsive: true,
        }
    }
}

/// One interactive crop session bound to a still image
pub struct CropSession {
    image: DynamicImage,
    options: CropOptions,
    selection: Rect,
    /// Selection before the current drag started
    drag_origin: Rect,
    drag: DragState,
    container: (u32, u32),
    scale: f32,
}

impl CropSession {
    /// Bind a session to `image`, displayed inside a `container` of the given size
    pub fn new(image: DynamicImage, options: CropOptions, container: (u32, u32)) -> Self {
        let selection = initial_selection(image.width(), image.height(), &options);
        let scale = fit_scale(image.width(), image.height(), container);
        log::debug!(
            "Crop session on {}x{} image, initial selection {:?}, scale {}",
            image.width(),
            image.height(),
            selection,
            scale
        );
        Self {
            image,
            options,
            selection,
            drag_origin: selection,
            drag: DragState::None,
            container,
            scale,
        }
    }

    pub fn options(&self) -> &CropOptions {
        &self.options
    }

    /// Current selection in image pixels
    pub fn selection(&self) -> Rect {
        self.selection
    }

    /// Current selection in display pixels as (x, y, width, height)
    pub fn display_selection(&self) -> (f32, f32, f32, f32) {
        let sel = self.selection;
        (
            sel.left as f32 * self.scale,
            sel.top as f32 * self.scale,
            sel.width() as f32 * self.scale,
            sel.height() as f32 * self.scale,
        )
    }

    pub fn container(&self) -> (u32, u32) {
        self.container
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.image.width() as i32, self.image.height() as i32)
    }

    fn restricted(&self) -> bool {
        self.options.view_mode == ViewMode::Restricted
    }

    fn to_image(&self, x: f32, y: f32) -> (f32, f32) {
        (x / self.scale, y / self.scale)
    }

    fn clamp_point(&self, x: i32, y: i32) -> (i32, i32) {
        if self.restricted() {
            let bounds = self.bounds();
            (x.clamp(bounds.left, bounds.right), y.clamp(bounds.top, bounds.bottom))
        } else {
            (x, y)
        }
    }

    /// Replace the selection programmatically.
    ///
    /// Returns `false` and keeps the old selection when `rect` is empty or,
    /// in restricted mode, does not overlap the image.
    pub fn set_selection(&mut self, rect: Rect) -> bool {
        let rect = rect.normalized();
        let rect = if self.restricted() {
            match rect.intersect(self.bounds()) {
                Some(rect) => rect,
                None => return false,
            }
        } else {
            rect
        };
        if rect.dimensions().is_none() {
            return false;
        }
        self.selection = rect;
        self.drag_origin = rect;
        true
    }

    /// Container was resized; the selection keeps its place on the image
    pub fn resize_container(&mut self, width: u32, height: u32) {
        if !self.options.responsive {
            return;
        }
        self.container = (width, height);
        self.scale = fit_scale(self.image.width(), self.image.height(), self.container);
        log::debug!("Crop container resized to {}x{}, scale {}", width, height, self.scale);
    }

    fn hit_test(&self, x: f32, y: f32) -> DragState {
        let sel = self.selection;
        let corner = CORNER_DIAMETER / 2.0 / self.scale;
        let edge = EDGE_GRAB_THICKNESS / 2.0 / self.scale;
        let (l, t, r, b) = (
            sel.left as f32,
            sel.top as f32,
            sel.right as f32,
            sel.bottom as f32,
        );
        let near = |a: f32, b: f32, radius: f32| (a - b).abs() <= radius;

        if near(x, l, corner) && near(y, t, corner) {
            return DragState::NW;
        }
        if near(x, r, corner) && near(y, t, corner) {
            return DragState::NE;
        }
        if near(x, l, corner) && near(y, b, corner) {
            return DragState::SW;
        }
        if near(x, r, corner) && near(y, b, corner) {
            return DragState::SE;
        }

        let within_x = x >= l && x <= r;
        let within_y = y >= t && y <= b;
        if within_x && near(y, t, edge) {
            return DragState::N;
        }
        if within_x && near(y, b, edge) {
            return DragState::S;
        }
        if within_y && near(x, l, edge) {
            return DragState::W;
        }
        if within_y && near(x, r, edge) {
            return DragState::E;
        }
        DragState::None
    }

    /// Pointer pressed at display coordinates; picks what the drag will do
    pub fn pointer_down(&mut self, x: f32, y: f32) -> DragState {
        let (ix, iy) = self.to_image(x, y);
        self.drag_origin = self.selection;

        let handle = self.hit_test(ix, iy);
        let (px, py) = (ix.round() as i32, iy.round() as i32);
        let inside = self.selection.contains_point(px, py);

        self.drag = if handle != DragState::None {
            handle
        } else if inside {
            DragState::Move {
                grab_x: px - self.selection.left,
                grab_y: py - self.selection.top,
            }
        } else {
            match self.options.drag_mode {
                DragMode::Crop => {
                    let (px, py) = self.clamp_point(px, py);
                    self.selection = Rect::new(px, py, px, py);
                    DragState::SE
                }
                DragMode::Move => DragState::Move {
                    grab_x: px - self.selection.left,
                    grab_y: py - self.selection.top,
                },
                DragMode::None => DragState::None,
            }
        };
        self.drag
    }

    /// Pointer moved to display coordinates while pressed
    pub fn pointer_move(&mut self, x: f32, y: f32) {
        let (ix, iy) = self.to_image(x, y);
        let (px, py) = (ix.round() as i32, iy.round() as i32);

        match self.drag {
            DragState::None => {}
            DragState::Move { grab_x, grab_y } => {
                let prev = self.selection;
                let moved = prev.translate(px - grab_x - prev.left, py - grab_y - prev.top);
                self.selection = if self.restricted() {
                    moved.shifted_into(self.bounds())
                } else {
                    moved
                };
            }
            _ => {
                let (d_x, d_y) = self.clamp_point(px, py);
                self.handle_drag_pos(d_x, d_y);
            }
        }
    }

    /// Pointer released; a degenerate selection falls back to the one before the drag
    pub fn pointer_up(&mut self) {
        if self.selection.dimensions().is_none() {
            self.selection = self.drag_origin;
        }
        self.drag = DragState::None;
    }

    fn handle_drag_pos(&mut self, d_x: i32, d_y: i32) {
        let prev = self.selection;
        let prev_state = self.drag;

        let reflection_point = match prev_state {
            DragState::None | DragState::Move { .. } => return,
            DragState::NW => (prev.right, prev.bottom),
            DragState::N => (0, prev.bottom),
            DragState::NE => (prev.left, prev.bottom),
            DragState::E => (prev.left, 0),
            DragState::SE => (prev.left, prev.top),
            DragState::S => (0, prev.top),
            DragState::SW => (prev.right, prev.top),
            DragState::W => (prev.right, 0),
        };

        let new_drag_state = match prev_state {
            DragState::SE | DragState::NW | DragState::NE | DragState::SW => {
                if d_x < reflection_point.0 && d_y < reflection_point.1 {
                    DragState::NW
                } else if d_x > reflection_point.0 && d_y > reflection_point.1 {
                    DragState::SE
                } else if d_x > reflection_point.0 && d_y < reflection_point.1 {
                    DragState::NE
                } else if d_x < reflection_point.0 && d_y > reflection_point.1 {
                    DragState::SW
                } else {
                    prev_state
                }
            }
            DragState::N | DragState::S => {
                if d_y < reflection_point.1 {
                    DragState::N
                } else {
                    DragState::S
                }
            }
            DragState::E | DragState::W => {
                if d_x > reflection_point.0 {
                    DragState::E
                } else {
                    DragState::W
                }
            }
            DragState::None | DragState::Move { .. } => prev_state,
        };

        let top_left = match new_drag_state {
            DragState::NW => (d_x, d_y),
            DragState::NE => (reflection_point.0, d_y),
            DragState::SE => (reflection_point.0, reflection_point.1),
            DragState::SW => (d_x, reflection_point.1),
            DragState::N => (prev.left, d_y),
            DragState::E => (reflection_point.0, prev.top),
            DragState::S => (prev.left, reflection_point.1),
            DragState::W => (d_x, prev.top),
            DragState::None | DragState::Move { .. } => (prev.left, prev.top),
        };

        let bottom_right = match new_drag_state {
            DragState::NW => (reflection_point.0, reflection_point.1),
            DragState::NE => (d_x, reflection_point.1),
            DragState::SE => (d_x, d_y),
            DragState::SW => (reflection_point.0, d_y),
            DragState::N => (prev.right, reflection_point.1),
            DragState::E => (d_x, prev.bottom),
            DragState::S => (prev.right, d_y),
            DragState::W => (reflection_point.0, prev.bottom),
            DragState::None | DragState::Move { .. } => (prev.right, prev.bottom),
        };

        let mut new_rect = Rect::new(top_left.0, top_left.1, bottom_right.0, bottom_right.1);
        if let Some(ratio) = self.fixed_ratio() {
            new_rect = fit_ratio(new_rect, new_drag_state, ratio);
            if self.restricted() {
                new_rect = new_rect.intersect(self.bounds()).unwrap_or(prev);
            }
        }

        self.selection = new_rect;
        self.drag = new_drag_state;
    }

    fn fixed_ratio(&self) -> Option<f32> {
        self.options
            .aspect_ratio
            .filter(|ratio| ratio.is_finite() && *ratio > 0.0)
    }

    /// The selected sub-image.
    ///
    /// During a drag that has not yet produced an area, the selection from
    /// before the drag is used.
    pub fn cropped_image(&self) -> DynamicImage {
        let selection = if self.selection.dimensions().is_some() {
            self.selection
        } else {
            self.drag_origin
        };
        let region = selection
            .normalized()
            .intersect(self.bounds())
            .unwrap_or_default();
        log::debug!("Extracting crop region {:?}", region);
        self.image.crop_imm(
            region.left as u32,
            region.top as u32,
            region.width() as u32,
            region.height() as u32,
        )
    }

    /// Tear the session down
    pub fn destroy(self) {
        log::debug!("Crop session destroyed");
    }
}

/// Initial selection: `auto_crop_area` of each axis, centered, honoring a fixed ratio
fn initial_selection(width: u32, height: u32, options: &CropOptions) -> Rect {
    let area = options.auto_crop_area.clamp(0.0, 1.0);
    let mut crop_w = width as f32 * area;
    let mut crop_h = height as f32 * area;

    if let Some(ratio) = options
        .aspect_ratio
        .filter(|ratio| ratio.is_finite() && *ratio > 0.0)
    {
        if crop_h > 0.0 && crop_w / crop_h > ratio {
            crop_w = crop_h * ratio;
        } else {
            crop_h = crop_w / ratio;
        }
    }

    let crop_w = crop_w.round() as i32;
    let crop_h = crop_h.round() as i32;
    let left = (width as i32 - crop_w) / 2;
    let top = (height as i32 - crop_h) / 2;
    Rect::new(left, top, left + crop_w, top + crop_h)
}

/// Display pixels per image pixel when the image is fitted inside the container
fn fit_scale(width: u32, height: u32, container: (u32, u32)) -> f32 {
    let scale = (container.0 as f32 / width as f32).min(container.1 as f32 / height as f32);
    if scale.is_finite() && scale > 0.0 { scale } else { 1.0 }
}

/// Shrink `rect` to `ratio`, anchored on the side opposite the dragged handle
fn fit_ratio(rect: Rect, state: DragState, ratio: f32) -> Rect {
    let w = rect.width() as f32;
    let h = rect.height() as f32;

    match state {
        _ if state.is_corner() => {
            let (w, h) = if h > 0.0 && w / h > ratio {
                ((h * ratio).round() as i32, h as i32)
            } else {
                (w as i32, (w / ratio).round() as i32)
            };
            match state {
                DragState::NW => Rect::new(rect.right - w, rect.bottom - h, rect.right, rect.bottom),
                DragState::NE => Rect::new(rect.left, rect.bottom - h, rect.left + w, rect.bottom),
                DragState::SW => Rect::new(rect.right - w, rect.top, rect.right, rect.top + h),
                _ => Rect::new(rect.left, rect.top, rect.left + w, rect.top + h),
            }
        }
        DragState::N | DragState::S => {
            let w = (h * ratio).round() as i32;
            Rect::new(rect.left, rect.top, rect.left + w, rect.bottom)
        }
        DragState::E | DragState::W => {
            let h = (w / ratio).round() as i32;
            Rect::new(rect.left, rect.top, rect.right, rect.top + h)
        }
        _ => rect,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn still(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255])))
    }

    #[test]
    fn test_default_selection_is_centered_eighty_percent() {
        let session = CropSession::new(still(1000, 500), CropOptions::default(), (1000, 500));
        assert_eq!(session.selection(), Rect::new(100, 50, 900, 450));
        assert_eq!(session.scale(), 1.0);
    }

    #[test]
    fn test_initial_selection_honors_ratio() {
        let options = CropOptions {
            aspect_ratio: Some(1.0),
            ..CropOptions::default()
        };
        let session = CropSession::new(still(1000, 500), options, (1000, 500));
        assert_eq!(session.selection(), Rect::new(300, 50, 700, 450));
    }

    #[test]
    fn test_corner_drag_is_clamped_to_image() {
        let mut session = CropSession::new(still(1000, 500), CropOptions::default(), (1000, 500));
        assert_eq!(session.pointer_down(900.0, 450.0), DragState::SE);
        session.pointer_move(1500.0, 800.0);
        session.pointer_up();
        assert_eq!(session.selection(), Rect::new(100, 50, 1000, 500));
    }

    #[test]
    fn test_dragging_past_anchor_flips_handle() {
        let mut session = CropSession::new(still(1000, 500), CropOptions::default(), (1000, 500));
        session.pointer_down(900.0, 450.0);
        session.pointer_move(20.0, 10.0);
        session.pointer_up();
        assert_eq!(session.selection(), Rect::new(20, 10, 100, 50));
    }

    #[test]
    fn test_move_stays_inside_image() {
        let mut session = CropSession::new(still(1000, 500), CropOptions::default(), (1000, 500));
        let state = session.pointer_down(500.0, 250.0);
        assert_eq!(state, DragState::Move { grab_x: 400, grab_y: 200 });
        session.pointer_move(900.0, 300.0);
        session.pointer_up();
        assert_eq!(session.selection(), Rect::new(200, 100, 1000, 500));
    }

    #[test]
    fn test_drag_outside_draws_new_box() {
        let mut session = CropSession::new(still(1000, 500), CropOptions::default(), (1000, 500));
        session.set_selection(Rect::new(400, 200, 600, 300));
        assert_eq!(session.pointer_down(50.0, 40.0), DragState::SE);
        session.pointer_move(250.0, 140.0);
        session.pointer_up();
        assert_eq!(session.selection(), Rect::new(50, 40, 250, 140));
    }

    #[test]
    fn test_click_outside_keeps_previous_selection() {
        let mut session = CropSession::new(still(1000, 500), CropOptions::default(), (1000, 500));
        let before = session.selection();
        session.pointer_down(20.0, 20.0);
        session.pointer_up();
        assert_eq!(session.selection(), before);
    }

    #[test]
    fn test_drag_mode_none_ignores_outside_drag() {
        let options = CropOptions {
            drag_mode: DragMode::None,
            ..CropOptions::default()
        };
        let mut session = CropSession::new(still(1000, 500), options, (1000, 500));
        let before = session.selection();
        assert_eq!(session.pointer_down(20.0, 20.0), DragState::None);
        session.pointer_move(300.0, 300.0);
        session.pointer_up();
        assert_eq!(session.selection(), before);
    }

    #[test]
    fn test_resize_keeps_image_selection() {
        let mut session = CropSession::new(still(1000, 500), CropOptions::default(), (1000, 500));
        session.resize_container(500, 250);
        assert_eq!(session.scale(), 0.5);
        assert_eq!(session.selection(), Rect::new(100, 50, 900, 450));
        assert_eq!(session.display_selection(), (50.0, 25.0, 400.0, 200.0));

        // Pointer coordinates now map through the new scale
        assert_eq!(session.pointer_down(450.0, 225.0), DragState::SE);
    }

    #[test]
    fn test_unresponsive_session_ignores_resize() {
        let options = CropOptions {
            responsive: false,
            ..CropOptions::default()
        };
        let mut session = CropSession::new(still(1000, 500), options, (1000, 500));
        session.resize_container(500, 250);
        assert_eq!(session.scale(), 1.0);
    }

    #[test]
    fn test_fixed_ratio_corner_drag() {
        let options = CropOptions {
            aspect_ratio: Some(2.0),
            ..CropOptions::default()
        };
        let mut session = CropSession::new(still(1000, 500), options, (1000, 500));
        session.set_selection(Rect::new(0, 0, 200, 100));
        session.pointer_down(200.0, 100.0);
        session.pointer_move(400.0, 400.0);
        session.pointer_up();
        assert_eq!(session.selection(), Rect::new(0, 0, 400, 200));
    }

    #[test]
    fn test_set_selection_outside_image_is_rejected() {
        let mut session = CropSession::new(still(100, 100), CropOptions::default(), (100, 100));
        assert!(!session.set_selection(Rect::new(200, 200, 300, 300)));
        assert!(session.set_selection(Rect::new(50, 50, 150, 150)));
        assert_eq!(session.selection(), Rect::new(50, 50, 100, 100));
    }

    #[test]
    fn test_cropped_image_matches_selection() {
        let mut session = CropSession::new(still(640, 480), CropOptions::default(), (640, 480));
        session.set_selection(Rect::from_xywh(10, 20, 120, 40));
        let cropped = session.cropped_image();
        assert_eq!((cropped.width(), cropped.height()), (120, 40));
        session.destroy();
    }

    #[test]
    fn test_crop_mid_drag_uses_previous_selection() {
        let mut session = CropSession::new(still(640, 480), CropOptions::default(), (640, 480));
        session.set_selection(Rect::from_xywh(100, 100, 200, 50));
        session.pointer_down(2.0, 2.0);
        assert_eq!(session.selection(), Rect::new(2, 2, 2, 2));

        let cropped = session.cropped_image();
        assert_eq!((cropped.width(), cropped.height()), (200, 50));
    }
}
