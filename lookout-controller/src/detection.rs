use crate::capabilities::RawDetection;
use serde::{Deserialize, Serialize};

/// Detection as reported in a skill result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub class: String,
    /// rounded to two decimal places
    pub confidence: f64,
    /// copied from the detector untouched
    pub bbox: [f64; 4],
}

impl From<&RawDetection> for Detection {
    fn from(raw: &RawDetection) -> Self {
        Detection {
            class: raw.class_name.clone(),
            confidence: round_confidence(raw.confidence),
            bbox: raw.bbox,
        }
    }
}

pub fn normalize(raw: &[RawDetection]) -> Vec<Detection> {
    raw.iter().map(Detection::from).collect()
}

fn round_confidence(confidence: f64) -> f64 {
    (confidence * 100.0).round() / 100.0
}
