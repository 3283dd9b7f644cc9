//! Fixed progress milestones for a single generation.

/// Milestones reported by [`PixelDojoClient::generate`](crate::PixelDojoClient::generate),
/// in the order they fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ProgressStage {
    /// Request validated and built
    Prepared,
    /// Request handed to the transport
    Awaiting,
    /// Response received, parsing
    Parsing,
    Done,
}

impl ProgressStage {
    pub const ALL: [ProgressStage; 4] = [
        ProgressStage::Prepared,
        ProgressStage::Awaiting,
        ProgressStage::Parsing,
        ProgressStage::Done,
    ];

    pub fn fraction(self) -> f64 {
        match self {
            ProgressStage::Prepared => 0.1,
            ProgressStage::Awaiting => 0.3,
            ProgressStage::Parsing => 0.9,
            ProgressStage::Done => 1.0,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            ProgressStage::Prepared => "Sending request...",
            ProgressStage::Awaiting => "Waiting for generation...",
            ProgressStage::Parsing => "Processing response...",
            ProgressStage::Done => "Complete!",
        }
    }
}
