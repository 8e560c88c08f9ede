//! Video brief captured by the builder form

use serde::{Deserialize, Serialize};

use crate::scenes::SceneStore;

pub const DEFAULT_STRUCTURE: &str = "Hook·Problem·Solution·CTA";

/// Target length of the finished video, in seconds
pub const DEFAULT_TARGET_DURATION: u32 = 15;

const BEAT_SEPARATOR: char = '·';

/// What the user wants the video to say
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoBrief {
    pub product_name: String,
    pub audience: String,
    pub value: String,
    pub structure: String,
    /// Target duration in seconds
    pub duration: u32,
    pub prompt: String,
    pub tone: String,
    /// Free text, one reference per line
    pub references: String,
}

impl Default for VideoBrief {
    fn default() -> Self {
        Self {
            product_name: String::new(),
            audience: String::new(),
            value: String::new(),
            structure: DEFAULT_STRUCTURE.to_string(),
            duration: DEFAULT_TARGET_DURATION,
            prompt: String::new(),
            tone: String::new(),
            references: String::new(),
        }
    }
}

impl VideoBrief {
    /// Reference lines that are web links
    pub fn reference_links(&self) -> Vec<&str> {
        self.references
            .lines()
            .map(str::trim)
            .filter(|line| line.starts_with("http://") || line.starts_with("https://"))
            .collect()
    }

    /// Named beats of the structure, e.g. `["Hook", "Problem", ...]`
    pub fn beats(&self) -> Vec<&str> {
        self.structure
            .split(BEAT_SEPARATOR)
            .map(str::trim)
            .filter(|beat| !beat.is_empty())
            .collect()
    }

    /// Storyboard length minus target length, in seconds
    ///
    /// Positive when the scenes run long, negative when they run short.
    pub fn duration_gap(&self, scenes: &SceneStore) -> i64 {
        scenes.total_duration() as i64 - self.duration as i64
    }
}
