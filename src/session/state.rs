//! The capture flow as an explicit state machine

use std::fmt;

/// Where the capture flow currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlowState {
    /// Nothing active; the start control is offered
    #[default]
    Idle,
    /// Camera access requested, waiting for the platform
    Requesting,
    /// Live preview running
    Live,
    /// Frame captured and camera released, crop session not yet open
    Frozen,
    /// Crop session open on the captured still
    Cropping,
    /// Cropped region handed to the OCR engine
    Recognizing,
}

/// Inputs that move the flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowEvent {
    StartRequested,
    StreamGranted,
    StreamFailed,
    /// The live stream went away without a capture (page hidden)
    StreamLost,
    FrameCaptured,
    CropOpened,
    CropConfirmed,
    Retake,
    RecognitionFinished,
    Reset,
}

/// An event that is not legal in the current state
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cannot handle {event:?} while {from}")]
pub struct InvalidTransition {
    pub from: FlowState,
    pub event: FlowEvent,
}

impl FlowState {
    /// The single transition function of the flow
    pub fn transition(self, event: FlowEvent) -> Result<FlowState, InvalidTransition> {
        use FlowEvent as E;
        use FlowState as S;

        let next = match (self, event) {
            (_, E::Reset) => S::Idle,
            (S::Idle, E::StartRequested) => S::Requesting,
            (S::Requesting, E::StreamGranted) => S::Live,
            (S::Requesting, E::StreamFailed) => S::Idle,
            (S::Requesting | S::Live, E::StreamLost) => S::Idle,
            (S::Live, E::FrameCaptured) => S::Frozen,
            (S::Frozen, E::CropOpened) => S::Cropping,
            (S::Cropping, E::CropConfirmed) => S::Recognizing,
            (S::Frozen | S::Cropping, E::Retake) => S::Idle,
            (S::Recognizing, E::RecognitionFinished) => S::Idle,
            (from, event) => return Err(InvalidTransition { from, event }),
        };
        Ok(next)
    }

    /// Whether the camera device may be held in this state
    pub fn holds_camera(self) -> bool {
        matches!(self, FlowState::Requesting | FlowState::Live)
    }

    /// Whether a crop session may exist in this state
    pub fn holds_crop_session(self) -> bool {
        matches!(self, FlowState::Cropping)
    }
}

impl fmt::Display for FlowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FlowState::Idle => "idle",
            FlowState::Requesting => "requesting camera",
            FlowState::Live => "live",
            FlowState::Frozen => "frozen",
            FlowState::Cropping => "cropping",
            FlowState::Recognizing => "recognizing",
        };
        f.write_str(name)
    }
}
