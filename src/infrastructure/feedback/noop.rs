//! No-op feedback adapter
//!
//! Used when feedback is disabled.

use async_trait::async_trait;

use crate::application::ports::{Feedback, FeedbackCue, FeedbackError};

pub struct NoOpFeedback;

impl NoOpFeedback {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NoOpFeedback {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Feedback for NoOpFeedback {
    async fn notify(&self, _cue: FeedbackCue) -> Result<(), FeedbackError> {
        Ok(())
    }
}
