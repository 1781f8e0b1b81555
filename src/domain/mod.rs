//! Pure domain types with minimal dependencies
//!
//! This module contains the geometry and selection types shared by the crop
//! widget and the controller. Types here have no backend dependencies.

pub mod geometry;
pub mod selection;

pub use geometry::*;
pub use selection::*;
