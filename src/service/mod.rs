//! Service layer: transition orchestration and payment capture.

pub mod capture;
pub mod transition;

pub use capture::{CaptureCoordinator, CaptureOutcome};
pub use transition::TransitionService;
