//! UI view-model: control visibility, status line and result texts
//!
//! A front-end renders this; the controller is the only writer.

use std::fmt;

use crate::capture::camera::CameraError;
use crate::capture::ocr::{OcrPhase, OcrProgress};
use crate::fl;
use crate::recognition::DialUri;

/// Every interactive element the flow shows or hides
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    StartCamera,
    CameraView,
    Capture,
    CropContainer,
    Retake,
    Crop,
    ResultPanel,
    DialLink,
}

impl Control {
    pub const ALL: [Control; 8] = [
        Control::StartCamera,
        Control::CameraView,
        Control::Capture,
        Control::CropContainer,
        Control::Retake,
        Control::Crop,
        Control::ResultPanel,
        Control::DialLink,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlState {
    pub visible: bool,
    pub enabled: bool,
}

impl Default for ControlState {
    fn default() -> Self {
        Self {
            visible: false,
            enabled: true,
        }
    }
}

/// The status line
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Status {
    #[default]
    Prompt,
    RequestingCamera,
    CameraActive,
    CameraError(CameraError),
    StreamUnavailable,
    Capturing,
    CaptureFailed,
    Captured {
        retake: bool,
    },
    CropperNotReady,
    ProcessingCrop,
    OcrStarting,
    Recognizing(u8),
    OcrComplete,
    NumberFoundDialing(String),
    NumberFoundLink,
    NoNumberFound,
    OcrFailed,
    DialFailed(DialUri),
}

impl Status {
    /// Localized text for the status line
    pub fn text(&self) -> String {
        match self {
            Status::Prompt => fl!("status-prompt"),
            Status::RequestingCamera => fl!("status-requesting-camera"),
            Status::CameraActive => fl!("status-camera-active"),
            Status::CameraError(err) => err.user_message(),
            Status::StreamUnavailable => fl!("status-stream-unavailable"),
            Status::Capturing => fl!("status-capturing"),
            Status::CaptureFailed => fl!("status-capture-failed"),
            Status::Captured { retake: true } => fl!("status-captured"),
            Status::Captured { retake: false } => fl!("status-captured-no-retake"),
            Status::CropperNotReady => fl!("status-cropper-not-ready"),
            Status::ProcessingCrop => fl!("status-processing-crop"),
            Status::OcrStarting => fl!("status-ocr-starting"),
            Status::Recognizing(percent) => {
                fl!("status-recognizing", percent = i64::from(*percent))
            }
            Status::OcrComplete => fl!("status-ocr-complete"),
            Status::NumberFoundDialing(number) => {
                fl!("status-number-found-dialing", number = number.as_str())
            }
            Status::NumberFoundLink => fl!("status-number-found-link"),
            Status::NoNumberFound => fl!("status-no-number"),
            Status::OcrFailed => fl!("status-ocr-failed"),
            Status::DialFailed(uri) => fl!("status-dial-failed", uri = uri.as_str()),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}

/// The "extracted number" line of the result panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NumberLine {
    Extracted(String),
    NoNumber,
}

impl NumberLine {
    pub fn text(&self) -> String {
        match self {
            NumberLine::Extracted(number) => {
                fl!("result-extracted-number", number = number.as_str())
            }
            NumberLine::NoNumber => fl!("result-no-number"),
        }
    }
}

/// Everything a front-end needs to draw the page
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UiState {
    controls: [ControlState; 8],
    pub status: Status,
    /// The live stream is bound to the camera view
    pub preview_attached: bool,
    /// The crop container holds a captured still
    pub still_loaded: bool,
    /// Raw OCR text
    pub extracted_text: Option<String>,
    pub extracted_number: Option<NumberLine>,
    /// Target of the dial link
    pub dial_href: Option<DialUri>,
}

impl UiState {
    pub fn control(&self, control: Control) -> ControlState {
        self.controls[control.index()]
    }

    pub fn is_visible(&self, control: Control) -> bool {
        self.control(control).visible
    }

    pub fn is_enabled(&self, control: Control) -> bool {
        self.control(control).enabled
    }

    pub fn show(&mut self, control: Control) {
        self.controls[control.index()].visible = true;
    }

    pub fn hide(&mut self, control: Control) {
        self.controls[control.index()].visible = false;
    }

    pub fn enable(&mut self, control: Control) {
        self.controls[control.index()].enabled = true;
    }

    pub fn disable(&mut self, control: Control) {
        self.controls[control.index()].enabled = false;
    }

    pub fn set_status(&mut self, status: Status) {
        log::info!("{}", status);
        self.status = status;
    }

    /// Show the engine's percentage while it is recognizing text
    pub fn apply_ocr_progress(&mut self, progress: OcrProgress) {
        log::debug!("OCR progress: {:?}", progress);
        if progress.phase == OcrPhase::RecognizingText {
            self.set_status(Status::Recognizing(progress.percent()));
        }
    }

    /// Controls currently shown
    pub fn visible_controls(&self) -> Vec<Control> {
        Control::ALL
            .into_iter()
            .filter(|control| self.is_visible(*control))
            .collect()
    }

    /// Hide every intermediate element and clear all result texts.
    ///
    /// The start control is shown with the neutral prompt unless a camera
    /// start is under way, in which case it stays hidden.
    pub fn reset(&mut self, starting_camera: bool) {
        for control in [
            Control::CameraView,
            Control::Capture,
            Control::CropContainer,
            Control::Retake,
            Control::Crop,
            Control::ResultPanel,
            Control::DialLink,
        ] {
            self.hide(control);
        }

        self.preview_attached = false;
        self.still_loaded = false;
        self.extracted_text = None;
        self.extracted_number = None;
        self.dial_href = None;

        if starting_camera {
            self.hide(Control::StartCamera);
        } else {
            self.show(Control::StartCamera);
            self.enable(Control::StartCamera);
            self.set_status(Status::Prompt);
        }
    }

    /// The start control is back and usable; every intermediate control is hidden
    pub fn is_initial(&self) -> bool {
        self.is_visible(Control::StartCamera)
            && self.is_enabled(Control::StartCamera)
            && [
                Control::CameraView,
                Control::Capture,
                Control::CropContainer,
                Control::Retake,
                Control::Crop,
            ]
            .into_iter()
            .all(|control| !self.is_visible(control))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_shows_start_with_prompt() {
        let mut ui = UiState::default();
        ui.show(Control::Capture);
        ui.extracted_text = Some("junk".to_string());
        ui.reset(false);

        assert_eq!(ui.visible_controls(), vec![Control::StartCamera]);
        assert!(ui.is_enabled(Control::StartCamera));
        assert_eq!(ui.status, Status::Prompt);
        assert!(ui.extracted_text.is_none());
        assert!(ui.is_initial());
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut once = UiState::default();
        once.show(Control::CropContainer);
        once.dial_href = Some(DialUri::for_token("12345"));
        once.reset(false);

        let mut twice = once.clone();
        twice.reset(false);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_reset_while_starting_hides_start() {
        let mut ui = UiState::default();
        ui.reset(false);
        ui.set_status(Status::CameraActive);
        ui.reset(true);

        assert!(ui.visible_controls().is_empty());
        // Status is left for the caller to set
        assert_eq!(ui.status, Status::CameraActive);
    }

    #[test]
    fn test_ocr_progress_sets_percentage() {
        let mut ui = UiState::default();
        ui.set_status(Status::OcrStarting);

        ui.apply_ocr_progress(OcrProgress::new(OcrPhase::Initializing, 0.3));
        assert_eq!(ui.status, Status::OcrStarting);

        ui.apply_ocr_progress(OcrProgress::new(OcrPhase::RecognizingText, 0.5));
        assert_eq!(ui.status, Status::Recognizing(50));
        assert_eq!(ui.status.text(), "Recognizing: 50%");

        ui.apply_ocr_progress(OcrProgress::new(OcrPhase::RecognizingText, 1.0));
        assert_eq!(ui.status, Status::Recognizing(100));
    }

    #[test]
    fn test_status_texts() {
        assert_eq!(Status::Recognizing(57).text(), "Recognizing: 57%");
        assert_eq!(
            Status::NumberFoundDialing("*100#".to_string()).text(),
            "Number found! Attempting to dial: *100#"
        );
        assert_eq!(
            Status::CameraError(CameraError::PermissionDenied).text(),
            "Could not access camera. Permission denied."
        );
        assert_eq!(
            NumberLine::Extracted("0123456".to_string()).text(),
            "Extracted Number: 0123456"
        );
    }
}
