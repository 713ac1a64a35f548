//! The image analysis cycle as an explicit state machine.

use thiserror::Error;

use crate::internal::models::{AnalysisResult, SelectedImage};

/// User-facing text for any failed analysis. The cause is only logged.
pub const ANALYSIS_FAILED_MESSAGE: &str = "Failed to process image. Please try again.";

#[derive(Debug, Clone, PartialEq, Default)]
pub enum WorkflowState {
    #[default]
    Idle,
    Selected(SelectedImage),
    Analyzing(SelectedImage),
    Result {
        image: SelectedImage,
        result: AnalysisResult,
    },
    Failed {
        image: SelectedImage,
        message: String,
    },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("an analysis is already in flight")]
    AnalysisInFlight,
    #[error("no image selected")]
    NoImageSelected,
    #[error("analysis already completed for this image")]
    AlreadyAnalyzed,
}

/// Owns the [`WorkflowState`] and only moves it along named transitions.
#[derive(Debug, Default)]
pub struct Workflow {
    state: WorkflowState,
}

impl Workflow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn image(&self) -> Option<&SelectedImage> {
        match &self.state {
            WorkflowState::Idle => None,
            WorkflowState::Selected(image) | WorkflowState::Analyzing(image) => Some(image),
            WorkflowState::Result { image, .. } | WorkflowState::Failed { image, .. } => {
                Some(image)
            }
        }
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        match &self.state {
            WorkflowState::Result { result, .. } => Some(result),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.state {
            WorkflowState::Failed { message, .. } => Some(message),
            _ => None,
        }
    }

    /// True while a request is in flight; the upload acceptor is disabled.
    pub fn is_processing(&self) -> bool {
        matches!(self.state, WorkflowState::Analyzing(_))
    }

    /// Whether the Analyze control is enabled.
    pub fn can_analyze(&self) -> bool {
        matches!(
            self.state,
            WorkflowState::Selected(_) | WorkflowState::Failed { .. }
        )
    }

    /// Select a new image, discarding any prior result or error.
    pub fn select_image(&mut self, image: SelectedImage) -> Result<(), WorkflowError> {
        if self.is_processing() {
            return Err(WorkflowError::AnalysisInFlight);
        }
        self.state = WorkflowState::Selected(image);
        Ok(())
    }

    pub fn clear(&mut self) -> Result<(), WorkflowError> {
        match self.state {
            WorkflowState::Analyzing(_) => Err(WorkflowError::AnalysisInFlight),
            _ => {
                self.state = WorkflowState::Idle;
                Ok(())
            }
        }
    }

    /// Enter `Analyzing` and hand back the image to upload.
    pub fn begin_analysis(&mut self) -> Result<SelectedImage, WorkflowError> {
        let image = match std::mem::take(&mut self.state) {
            WorkflowState::Selected(image) | WorkflowState::Failed { image, .. } => image,
            other => {
                let err = match &other {
                    WorkflowState::Idle => WorkflowError::NoImageSelected,
                    WorkflowState::Analyzing(_) => WorkflowError::AnalysisInFlight,
                    _ => WorkflowError::AlreadyAnalyzed,
                };
                self.state = other;
                return Err(err);
            }
        };
        self.state = WorkflowState::Analyzing(image.clone());
        Ok(image)
    }

    /// Apply the outcome of the in-flight request. Returns false (and changes
    /// nothing) if no analysis was in flight.
    pub fn finish_analysis(&mut self, outcome: Result<AnalysisResult, String>) -> bool {
        let image = match std::mem::take(&mut self.state) {
            WorkflowState::Analyzing(image) => image,
            other => {
                self.state = other;
                return false;
            }
        };
        self.state = match outcome {
            Ok(result) => WorkflowState::Result { image, result },
            Err(message) => WorkflowState::Failed { image, message },
        };
        true
    }
}
