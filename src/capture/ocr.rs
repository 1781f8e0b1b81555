//! OCR (Optical Character Recognition) module using rusty-tesseract

use std::collections::HashMap;
use std::future::Future;

use anyhow::{Context, anyhow};
use image::DynamicImage;

use crate::config::DialSnapConfig;

/// Engine phase reported through the progress callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OcrPhase {
    Initializing,
    RecognizingText,
}

/// One progress report; `progress` runs from 0.0 to 1.0 within a phase
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OcrProgress {
    pub phase: OcrPhase,
    pub progress: f32,
}

impl OcrProgress {
    pub fn new(phase: OcrPhase, progress: f32) -> Self {
        Self { phase, progress }
    }

    /// Whole percent complete
    pub fn percent(&self) -> u8 {
        (self.progress.clamp(0.0, 1.0) * 100.0).round() as u8
    }
}

/// Engine parameters taken from the configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcrSettings {
    pub language: String,
    pub psm: i32,
    pub oem: i32,
    pub char_whitelist: Option<String>,
}

impl OcrSettings {
    pub fn from_config(config: &DialSnapConfig) -> Self {
        Self {
            language: config.ocr_language.clone(),
            psm: config.ocr_psm,
            oem: config.ocr_oem,
            char_whitelist: config.ocr_char_whitelist.clone(),
        }
    }
}

/// An OCR backend
pub trait OcrEngine {
    /// Recognize the text in `image`, reporting progress as the engine goes
    fn recognize(
        &self,
        image: &DynamicImage,
        settings: &OcrSettings,
        progress: &mut dyn FnMut(OcrProgress),
    ) -> impl Future<Output = anyhow::Result<String>>;
}

/// Tesseract through the system `tesseract` binary
#[derive(Debug, Clone, Copy, Default)]
pub struct TesseractEngine;

impl OcrEngine for TesseractEngine {
    async fn recognize(
        &self,
        image: &DynamicImage,
        settings: &OcrSettings,
        progress: &mut dyn FnMut(OcrProgress),
    ) -> anyhow::Result<String> {
        progress(OcrProgress::new(OcrPhase::Initializing, 0.0));

        log::info!(
            "Running OCR with rusty-tesseract on {}x{} image...",
            image.width(),
            image.height()
        );

        let (processed_img, min_dimension) = upscale_for_ocr(image);
        let args = tesseract_args(settings, min_dimension);

        progress(OcrProgress::new(OcrPhase::RecognizingText, 0.0));

        let text = tokio::task::spawn_blocking(move || {
            let tess_img = rusty_tesseract::Image::from_dynamic_image(&processed_img)
                .map_err(|e| anyhow!("Failed to create tesseract image: {}", e))?;
            rusty_tesseract::image_to_string(&tess_img, &args)
                .map_err(|e| anyhow!("Tesseract OCR failed: {}", e))
        })
        .await
        .context("OCR worker stopped unexpectedly")??;

        progress(OcrProgress::new(OcrPhase::RecognizingText, 1.0));
        log::debug!("Tesseract returned {} characters", text.len());
        Ok(text)
    }
}

/// Upscale small crops; Tesseract wants text at least 10-12 pixels tall.
///
/// Returns the image to recognize and the smaller side of the input.
fn upscale_for_ocr(img: &DynamicImage) -> (DynamicImage, u32) {
    let min_dimension = img.width().min(img.height());
    let factor = if min_dimension < 100 {
        4
    } else if min_dimension < 200 {
        2
    } else {
        1
    };

    if factor == 1 {
        return (img.clone(), min_dimension);
    }

    let new_width = img.width() * factor;
    let new_height = img.height() * factor;
    log::info!("Upscaling small image {}x to {}x{}", factor, new_width, new_height);
    (
        img.resize(new_width, new_height, image::imageops::FilterType::Lanczos3),
        min_dimension,
    )
}

fn tesseract_args(settings: &OcrSettings, min_dimension: u32) -> rusty_tesseract::Args {
    let mut config_variables = HashMap::new();
    if let Some(whitelist) = &settings.char_whitelist {
        config_variables.insert("tessedit_char_whitelist".to_string(), whitelist.clone());
    }

    // Higher DPI for small text
    let dpi = if min_dimension < 200 { 300 } else { 150 };
    rusty_tesseract::Args {
        lang: settings.language.clone(),
        config_variables,
        dpi: Some(dpi),
        psm: Some(settings.psm),
        oem: Some(settings.oem),
    }
}
