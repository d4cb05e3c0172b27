//! Feedback adapters
//!
//! Short audible cues when recording starts or stops and when a memo is
//! selected.

mod chime;
mod noop;

pub use chime::RodioFeedback;
pub use noop::NoOpFeedback;

use std::sync::Arc;

use crate::application::ports::Feedback;

/// Create a feedback adapter based on whether cues are enabled
pub fn create_feedback(enabled: bool) -> Arc<dyn Feedback> {
    if enabled {
        Arc::new(RodioFeedback::new())
    } else {
        Arc::new(NoOpFeedback::new())
    }
}
