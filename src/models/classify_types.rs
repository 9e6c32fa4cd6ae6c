use serde::Serialize;

#[derive(Debug, Serialize, Clone)]
pub struct ModelStatus {
    pub downloaded: bool,
    pub loading: bool,
    pub ready: bool,
    pub error: Option<String>,
}

/// Raw per-class probabilities from the classifier, index 0 = fake, index 1 = real.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassScores {
    pub probabilities: Vec<f32>,
}

impl ClassScores {
    pub fn new(fake_probability: f32, real_probability: f32) -> Self {
        Self {
            probabilities: vec![fake_probability, real_probability],
        }
    }
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ClassificationResult {
    pub is_fake: bool,
    pub predicted_label: String,
    pub confidence: f64,
    pub fake_probability: f64,
    pub real_probability: f64,
}
