//! Simulated loading progress shown while the model is thinking.
//!
//! The percentage is driven by a fixed-period timer owned by the UI, not by
//! backend latency. It moves fast to 30%, slower to 60%, crawls to 90% and
//! then waits. The indicator is discarded when the real response arrives.

/// Upper bound the simulation never passes on its own.
pub const PROGRESS_CEILING: f32 = 90.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressPhase {
    Analyzing,
    LoadingKnowledge,
    Generating,
}

impl ProgressPhase {
    pub fn caption(&self) -> &'static str {
        match self {
            ProgressPhase::Analyzing => "Analyzing input...",
            ProgressPhase::LoadingKnowledge => "Loading medical knowledge (4B parameters)...",
            ProgressPhase::Generating => "Generating clinical response...",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadingProgress {
    percent: f32,
    caption: &'static str,
}

impl Default for LoadingProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl LoadingProgress {
    pub fn new() -> Self {
        Self {
            percent: 0.0,
            caption: "Processing context...",
        }
    }

    pub fn percent(&self) -> f32 {
        self.percent
    }

    pub fn caption(&self) -> &'static str {
        self.caption
    }

    /// Advance one timer tick.
    pub fn advance(&mut self) {
        let phase = if self.percent < 30.0 {
            self.percent += 2.0;
            ProgressPhase::Analyzing
        } else if self.percent < 60.0 {
            self.percent += 0.5;
            ProgressPhase::LoadingKnowledge
        } else if self.percent < PROGRESS_CEILING {
            self.percent = (self.percent + 0.1).min(PROGRESS_CEILING);
            ProgressPhase::Generating
        } else {
            ProgressPhase::Generating
        };
        self.caption = phase.caption();
    }
}
