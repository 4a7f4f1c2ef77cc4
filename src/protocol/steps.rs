/*!
 * Step identifiers and the per-job step plan.
 *
 * The remote service splits a document into chunks during `init`; the rest of the
 * plan is derived from that chunk count once and never changes afterwards.
 */

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Result};

/// One atomic remote operation within a job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    /// Create the remote job and split the content into chunks
    Init,
    /// Translate the document title
    Title,
    /// Translate content chunk `n` (0-based)
    Content(usize),
    /// Translate the excerpt
    Excerpt,
    /// Assemble the chunks and save the translated document
    Finalize,
}

impl Step {
    /// Wire name of the step, as sent in the `step` request field
    pub fn wire_name(&self) -> String {
        match self {
            Self::Init => "init".to_string(),
            Self::Title => "title".to_string(),
            Self::Content(index) => format!("content_{}", index),
            Self::Excerpt => "excerpt".to_string(),
            Self::Finalize => "finalize".to_string(),
        }
    }

    /// Human-readable progress message for this step
    pub fn message(&self) -> String {
        match self {
            Self::Init => "Initializing...".to_string(),
            Self::Title => "Translating title...".to_string(),
            Self::Content(index) => format!("Translating content (part {})...", index + 1),
            Self::Excerpt => "Translating excerpt...".to_string(),
            Self::Finalize => "Saving translation...".to_string(),
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.wire_name())
    }
}

impl FromStr for Step {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "init" => Ok(Self::Init),
            "title" => Ok(Self::Title),
            "excerpt" => Ok(Self::Excerpt),
            "finalize" => Ok(Self::Finalize),
            other => other
                .strip_prefix("content_")
                .and_then(|index| index.parse::<usize>().ok())
                .map(Self::Content)
                .ok_or_else(|| anyhow!("Invalid translation step: {}", s)),
        }
    }
}

impl Serialize for Step {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.wire_name())
    }
}

impl<'de> Deserialize<'de> for Step {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Ordered, immutable list of steps for one job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepPlan {
    steps: Vec<Step>,
}

impl StepPlan {
    /// Plan known before the init response arrives: only `init`
    pub fn initial() -> Self {
        Self {
            steps: vec![Step::Init],
        }
    }

    /// Full plan: init, title, content_0..content_{n-1}, excerpt, finalize
    pub fn from_chunk_count(chunk_count: usize) -> Self {
        let mut steps = Vec::with_capacity(chunk_count.saturating_add(4));
        steps.push(Step::Init);
        steps.push(Step::Title);
        steps.extend((0..chunk_count).map(Step::Content));
        steps.push(Step::Excerpt);
        steps.push(Step::Finalize);
        Self { steps }
    }

    /// Number of steps in the plan
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// A plan always holds at least `init`
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Step at `index`, if within the plan
    pub fn get(&self, index: usize) -> Option<Step> {
        self.steps.get(index).copied()
    }

    /// All steps in order
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }
}
