//! Capture, crop and recognition orchestration
//!
//! One `Controller` owns the camera stream, the crop session and the UI
//! view-model. Every user event is a method taking `&mut self`, so at most one
//! camera request or OCR run is ever in flight.

use image::DynamicImage;

use crate::capture::camera::{Camera, CameraConstraints, VideoStream};
use crate::capture::frame::CapturedFrame;
use crate::capture::ocr::{OcrEngine, OcrProgress, OcrSettings};
use crate::config::{DialMode, DialSnapConfig};
use crate::crop::{CropOptions, CropSession};
use crate::dial::Dialer;
use crate::recognition::{DialUri, TokenExtractor};

use super::state::{FlowEvent, FlowState};
use super::ui::{Control, NumberLine, Status, UiState};

pub struct Controller<C: Camera, O: OcrEngine, D: Dialer> {
    config: DialSnapConfig,
    camera: C,
    ocr: O,
    dialer: D,
    extractor: TokenExtractor,
    ocr_settings: OcrSettings,
    crop_options: CropOptions,
    /// Size of the crop container on screen; (0, 0) until a front-end reports it
    container: (u32, u32),
    state: FlowState,
    ui: UiState,
    stream: Option<C::Stream>,
    frame: Option<CapturedFrame>,
    cropper: Option<CropSession>,
}

impl<C: Camera, O: OcrEngine, D: Dialer> Controller<C, O, D> {
    /// Build a controller and put the UI in its load-time state
    pub fn new(config: DialSnapConfig, camera: C, ocr: O, dialer: D) -> Self {
        let extractor = TokenExtractor::new(config.min_token_len, config.substitute_letter_o);
        let ocr_settings = OcrSettings::from_config(&config);
        let mut controller = Self {
            config,
            camera,
            ocr,
            dialer,
            extractor,
            ocr_settings,
            crop_options: CropOptions::default(),
            container: (0, 0),
            state: FlowState::Idle,
            ui: UiState::default(),
            stream: None,
            frame: None,
            cropper: None,
        };
        controller.reset_ui(false);
        controller
    }

    pub fn ui(&self) -> &UiState {
        &self.ui
    }

    pub fn state(&self) -> FlowState {
        self.state
    }

    pub fn config(&self) -> &DialSnapConfig {
        &self.config
    }

    pub fn camera(&self) -> &C {
        &self.camera
    }

    pub fn ocr(&self) -> &O {
        &self.ocr
    }

    pub fn dialer(&self) -> &D {
        &self.dialer
    }

    pub fn has_camera_session(&self) -> bool {
        self.stream.is_some()
    }

    pub fn has_crop_session(&self) -> bool {
        self.cropper.is_some()
    }

    /// The compressed still shown in the crop container
    pub fn captured_still(&self) -> Option<&[u8]> {
        self.frame.as_ref().map(|frame| frame.jpeg.as_slice())
    }

    /// Pointer and selection access for the front-end while cropping
    pub fn crop_session_mut(&mut self) -> Option<&mut CropSession> {
        self.cropper.as_mut()
    }

    /// The crop container was laid out at a new size
    pub fn resize_crop_container(&mut self, width: u32, height: u32) {
        self.container = (width, height);
        if let Some(session) = self.cropper.as_mut() {
            session.resize_container(width, height);
        }
    }

    fn advance(&mut self, event: FlowEvent) -> bool {
        match self.state.transition(event) {
            Ok(next) => {
                log::debug!("Flow {} -> {} on {:?}", self.state, next, event);
                self.state = next;
                true
            }
            Err(err) => {
                log::warn!("Ignoring event: {}", err);
                false
            }
        }
    }

    /// The camera stream and the crop session only exist in the states that own them
    fn debug_check_ownership(&self) {
        debug_assert!(
            self.stream.is_none() || self.state.holds_camera(),
            "camera stream held while {}",
            self.state
        );
        debug_assert!(
            self.cropper.is_none() || self.state.holds_crop_session(),
            "crop session held while {}",
            self.state
        );
    }

    fn install_stream(&mut self, stream: C::Stream) {
        self.destroy_crop_session();
        self.stop_camera_stream();
        self.stream = Some(stream);
        self.ui.preview_attached = true;
    }

    fn install_crop_session(&mut self, session: CropSession) {
        self.stop_camera_stream();
        self.destroy_crop_session();
        self.cropper = Some(session);
    }

    fn destroy_crop_session(&mut self) {
        if let Some(session) = self.cropper.take() {
            session.destroy();
        }
    }

    /// Stop every track of the live stream, if any, and unbind the preview
    pub fn stop_camera_stream(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.stop();
            self.ui.preview_attached = false;
            log::info!("Camera stream stopped.");
        }
    }

    /// Return to a clean state; see [`UiState::reset`]
    pub fn reset_ui(&mut self, starting_camera: bool) {
        self.stop_camera_stream();
        self.destroy_crop_session();
        self.frame = None;
        self.ui.reset(starting_camera);
        self.advance(FlowEvent::Reset);
        self.debug_check_ownership();
    }

    /// Request the rear camera and go live
    pub async fn start_camera(&mut self) {
        self.reset_ui(true);
        if !self.advance(FlowEvent::StartRequested) {
            return;
        }
        self.ui.set_status(Status::RequestingCamera);
        self.ui.disable(Control::StartCamera);

        let constraints = CameraConstraints::default();
        match self.camera.open(&constraints).await {
            Ok(stream) => {
                let (width, height) = stream.video_size();
                log::info!("Camera granted at {}x{}", width, height);
                self.install_stream(stream);
                self.advance(FlowEvent::StreamGranted);

                self.ui.show(Control::CameraView);
                self.ui.show(Control::Capture);
                self.ui.hide(Control::StartCamera);
                self.ui.set_status(Status::CameraActive);
            }
            Err(err) => {
                log::error!("Error accessing camera: {}", err);
                self.advance(FlowEvent::StreamFailed);
                self.reset_ui(false);
                self.ui.set_status(Status::CameraError(err));
            }
        }

        if self.ui.is_visible(Control::StartCamera) {
            self.ui.enable(Control::StartCamera);
        }
        self.debug_check_ownership();
    }

    /// Freeze the current video frame, release the camera and open a crop session
    pub fn capture_frame(&mut self) {
        let grabbed = match self.stream.as_mut() {
            Some(stream) if self.ui.preview_attached => stream.grab_frame(),
            _ => {
                self.ui.set_status(Status::StreamUnavailable);
                return;
            }
        };

        self.ui.set_status(Status::Capturing);
        self.ui.disable(Control::Capture);

        // The device is not needed while cropping
        self.stop_camera_stream();

        let frame = grabbed
            .map_err(anyhow::Error::from)
            .and_then(|rgba| CapturedFrame::encode(&rgba, self.config.jpeg_quality));
        let frame = match frame {
            Ok(frame) => frame,
            Err(err) => {
                log::error!("Capture failed: {:#}", err);
                self.reset_ui(false);
                self.ui.set_status(Status::CaptureFailed);
                return;
            }
        };
        self.advance(FlowEvent::FrameCaptured);

        self.ui.still_loaded = true;
        self.ui.show(Control::CropContainer);
        self.ui.hide(Control::CameraView);
        self.ui.hide(Control::Capture);
        self.ui.enable(Control::Capture);
        self.ui.set_status(Status::Captured {
            retake: self.config.allow_retake,
        });

        let session = CropSession::new(frame.still.clone(), self.crop_options, self.container);
        self.frame = Some(frame);
        self.install_crop_session(session);
        self.advance(FlowEvent::CropOpened);

        if self.config.allow_retake {
            self.ui.show(Control::Retake);
        }
        self.ui.show(Control::Crop);
        self.debug_check_ownership();
    }

    /// Abandon the crop and go back to the live camera
    pub async fn handle_retake(&mut self) {
        if !self.config.allow_retake {
            log::warn!("Retake is disabled");
            return;
        }
        if !self.advance(FlowEvent::Retake) {
            return;
        }
        log::info!("Retake requested");

        self.destroy_crop_session();
        self.frame = None;
        self.ui.still_loaded = false;
        self.ui.hide(Control::CropContainer);
        self.ui.hide(Control::Retake);
        self.ui.hide(Control::Crop);
        self.ui.hide(Control::ResultPanel);

        self.start_camera().await;
    }

    /// Extract the selected region and run it through recognition
    pub async fn process_cropped_image(&mut self) {
        let Some(session) = self.cropper.take() else {
            log::error!("Cropper not initialized!");
            self.ui.set_status(Status::CropperNotReady);
            return;
        };

        self.ui.set_status(Status::ProcessingCrop);
        self.ui.disable(Control::Crop);
        self.ui.disable(Control::Retake);

        let cropped = session.cropped_image();

        self.ui.hide(Control::CropContainer);
        self.ui.hide(Control::Crop);
        self.ui.hide(Control::Retake);
        self.ui.enable(Control::Crop);
        self.ui.enable(Control::Retake);

        session.destroy();
        self.advance(FlowEvent::CropConfirmed);

        self.recognize_text(cropped).await;
    }

    /// OCR the cropped region, extract a number and dial it or offer a link.
    ///
    /// Only runs once a crop has been confirmed. Whatever the outcome, the
    /// start control comes back and every intermediate control is hidden.
    async fn recognize_text(&mut self, image: DynamicImage) {
        if self.state != FlowState::Recognizing {
            log::warn!("Ignoring recognition request while {}", self.state);
            return;
        }
        self.debug_check_ownership();

        self.ui.set_status(Status::OcrStarting);
        self.ui.hide(Control::ResultPanel);
        self.ui.extracted_text = None;
        self.ui.extracted_number = None;
        self.ui.hide(Control::DialLink);

        let ui = &mut self.ui;
        let recognized = self
            .ocr
            .recognize(&image, &self.ocr_settings, &mut |progress: OcrProgress| {
                ui.apply_ocr_progress(progress)
            })
            .await;

        let pending_dial = match recognized {
            Ok(text) => self.present_recognized_text(&text),
            Err(err) => {
                log::error!("OCR Error: {:#}", err);
                self.ui.set_status(Status::OcrFailed);
                self.ui.hide(Control::ResultPanel);
                None
            }
        };

        self.finish_recognition();

        if let Some(uri) = pending_dial {
            // Best effort: give the status a moment to render before leaving
            tokio::time::sleep(self.config.auto_dial_delay()).await;
            self.dial(&uri);
        }
    }

    /// Fill the result panel; returns a URI to auto-dial
    fn present_recognized_text(&mut self, text: &str) -> Option<DialUri> {
        self.ui.set_status(Status::OcrComplete);
        let result = self.extractor.extract(text);
        self.ui.extracted_text = Some(result.raw_text.clone());
        self.ui.show(Control::ResultPanel);

        let (Some(token), Some(uri)) = (result.token.clone(), result.dial_uri()) else {
            self.ui.extracted_number = Some(NumberLine::NoNumber);
            self.ui.set_status(Status::NoNumberFound);
            return None;
        };

        self.ui.extracted_number = Some(NumberLine::Extracted(token.clone()));
        match self.config.dial_mode {
            DialMode::AutoDial => {
                self.ui.set_status(Status::NumberFoundDialing(token));
                log::info!("Attempting to dial: {}", uri);
                Some(uri)
            }
            DialMode::Link => {
                self.ui.dial_href = Some(uri);
                self.ui.show(Control::DialLink);
                self.ui.set_status(Status::NumberFoundLink);
                None
            }
        }
    }

    fn finish_recognition(&mut self) {
        self.ui.show(Control::StartCamera);
        self.ui.enable(Control::StartCamera);
        self.ui.hide(Control::Capture);
        self.ui.hide(Control::Crop);
        self.ui.hide(Control::Retake);
        self.ui.hide(Control::CropContainer);
        self.advance(FlowEvent::RecognitionFinished);
        self.debug_check_ownership();
    }

    fn dial(&mut self, uri: &DialUri) {
        if let Err(err) = self.dialer.dial(uri) {
            log::error!("Dial failed: {:#}", err);
            self.ui.set_status(Status::DialFailed(uri.clone()));
        }
    }

    /// The user followed the dial link
    pub fn follow_dial_link(&mut self) {
        if !self.ui.is_visible(Control::DialLink) {
            return;
        }
        if let Some(uri) = self.ui.dial_href.clone() {
            self.dial(&uri);
        }
    }

    /// The page is going away; release the camera
    pub fn on_page_hide(&mut self) {
        if self.stream.is_some() {
            self.stop_camera_stream();
            self.advance(FlowEvent::StreamLost);
        }
        self.debug_check_ownership();
    }

    /// The page was backgrounded or brought back
    pub fn on_visibility_change(&mut self, hidden: bool) {
        if hidden && self.config.release_camera_when_hidden {
            self.on_page_hide();
        }
    }
}
