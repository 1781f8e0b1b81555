//! Selection types for the crop widget

/// Drag state for rectangle selection handles
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragState {
    #[default]
    None,
    /// North-West corner
    NW,
    /// North edge
    N,
    /// North-East corner
    NE,
    /// East edge
    E,
    /// South-East corner
    SE,
    /// South edge
    S,
    /// South-West corner
    SW,
    /// West edge
    W,
    /// Whole box, grabbed at an offset from its top-left corner
    Move { grab_x: i32, grab_y: i32 },
}

impl DragState {
    pub fn is_corner(&self) -> bool {
        matches!(self, DragState::NW | DragState::NE | DragState::SE | DragState::SW)
    }
}

/// What a pointer drag outside the crop box does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragMode {
    /// Start a new crop box
    #[default]
    Crop,
    /// Move the existing box
    Move,
    /// Ignore the drag
    None,
}

/// Whether the crop box may leave the image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    /// No restriction
    Free,
    /// The crop box stays inside the image
    #[default]
    Restricted,
}
