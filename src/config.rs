use serde::{Deserialize, Serialize};

/// How output keys are assigned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum KeyPolicy {
    /// `0..n` in insertion order, no gaps.
    #[default]
    Contiguous,
    /// Key is the record's zero-based position in the input. Skipped
    /// records leave gaps.
    SourcePosition,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizerConfig {
    #[serde(default)]
    pub key_policy: KeyPolicy,
}

impl NormalizerConfig {
    pub fn with_key_policy(key_policy: KeyPolicy) -> Self {
        Self { key_policy }
    }
}
