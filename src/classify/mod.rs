//! Garden likelihood classification of annotated tiles

pub mod openai;

use crate::domain::{Analysis, Likelihood};

pub use openai::OpenAiClassifier;

/// Reasoning stored when the classifier could not produce an answer
pub const FAILED_REASONING: &str = "Error occurred during analysis";

/// Vision classifier. Never fails: problems degrade to a `Low` answer.
pub trait Classifier {
    fn classify(&self, image: &[u8], address: &str) -> Analysis;
}

/// The answer recorded when classification fails
pub fn failed_analysis() -> Analysis {
    Analysis {
        reasoning: FAILED_REASONING.to_string(),
        likelihood: Likelihood::Low,
    }
}
