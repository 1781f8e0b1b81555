//! Image capture and recognition module
//!
//! This module consolidates:
//! - Camera backends and stream handles (camera.rs)
//! - The frozen still frame (frame.rs)
//! - OCR text recognition (ocr.rs)

pub mod camera;
pub mod frame;
pub mod ocr;
