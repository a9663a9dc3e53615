//! Workflow data model shared by every stage of the studio pipeline.
//!
//! Wire names are camelCase so the JSON exchanged with the generative
//! backend and HTTP clients matches the shapes the prompts ask for.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Confidence shown for a step that has not been drafted yet.
pub const DISPLAY_CONFIDENCE_DEFAULT: f64 = 0.78;

/// Confidence assumed by the simulation for a step without one.
pub const SIMULATION_CONFIDENCE_DEFAULT: f64 = 0.75;

/// Distribution channels in the closed catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Instagram,
    Youtube,
    Facebook,
    Threads,
    Pinterest,
    Tiktok,
}

impl Channel {
    pub const ALL: [Channel; 6] = [
        Channel::Instagram,
        Channel::Youtube,
        Channel::Facebook,
        Channel::Threads,
        Channel::Pinterest,
        Channel::Tiktok,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Channel::Instagram => "instagram",
            Channel::Youtube => "youtube",
            Channel::Facebook => "facebook",
            Channel::Threads => "threads",
            Channel::Pinterest => "pinterest",
            Channel::Tiktok => "tiktok",
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Channel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        Channel::ALL
            .into_iter()
            .find(|c| c.as_str() == needle)
            .ok_or_else(|| format!("unknown channel: {s}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ContentFormat {
    Reels,
    Carousel,
    Story,
    Shorts,
    IdeaPin,
}

impl ContentFormat {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ContentFormat::Reels => "reels",
            ContentFormat::Carousel => "carousel",
            ContentFormat::Story => "story",
            ContentFormat::Shorts => "shorts",
            ContentFormat::IdeaPin => "ideaPin",
        }
    }
}

impl std::fmt::Display for ContentFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "reels" => Ok(ContentFormat::Reels),
            "carousel" => Ok(ContentFormat::Carousel),
            "story" => Ok(ContentFormat::Story),
            "shorts" => Ok(ContentFormat::Shorts),
            "ideaPin" | "idea-pin" | "ideapin" => Ok(ContentFormat::IdeaPin),
            other => Err(format!("unknown content format: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepCategory {
    Ideation,
    Production,
    Repurpose,
    Distribution,
    Optimize,
}

impl std::fmt::Display for StepCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StepCategory::Ideation => write!(f, "ideation"),
            StepCategory::Production => write!(f, "production"),
            StepCategory::Repurpose => write!(f, "repurpose"),
            StepCategory::Distribution => write!(f, "distribution"),
            StepCategory::Optimize => write!(f, "optimize"),
        }
    }
}

/// A named step tunable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Flag(bool),
    Number(f64),
    Text(String),
}

impl ConfigValue {
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            ConfigValue::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl std::fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigValue::Flag(b) => write!(f, "{b}"),
            ConfigValue::Number(n) => write!(f, "{n}"),
            ConfigValue::Text(s) => f.write_str(s),
        }
    }
}

/// Ordered set of target channels. Duplicates collapse to their first
/// occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Channel>", into = "Vec<Channel>")]
pub struct TargetChannels(Vec<Channel>);

impl TargetChannels {
    #[must_use]
    pub fn as_slice(&self) -> &[Channel] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = Channel> + '_ {
        self.0.iter().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn contains(&self, channel: Channel) -> bool {
        self.0.contains(&channel)
    }

    /// Removes `channel` when selected, otherwise appends it.
    pub fn toggle(&mut self, channel: Channel) {
        if let Some(pos) = self.0.iter().position(|c| *c == channel) {
            self.0.remove(pos);
        } else {
            self.0.push(channel);
        }
    }

    /// Comma-separated wire names, used when embedding channels in prompts.
    #[must_use]
    pub fn joined(&self) -> String {
        self.0
            .iter()
            .map(|c| c.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl FromIterator<Channel> for TargetChannels {
    fn from_iter<I: IntoIterator<Item = Channel>>(iter: I) -> Self {
        let mut out = Vec::new();
        for channel in iter {
            if !out.contains(&channel) {
                out.push(channel);
            }
        }
        Self(out)
    }
}

impl From<Vec<Channel>> for TargetChannels {
    fn from(channels: Vec<Channel>) -> Self {
        channels.into_iter().collect()
    }
}

impl From<TargetChannels> for Vec<Channel> {
    fn from(channels: TargetChannels) -> Self {
        channels.0
    }
}

/// One stage of the automation pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowStep {
    pub id: String,
    pub title: String,
    pub category: StepCategory,
    pub description: String,
    pub duration_minutes: u32,
    #[serde(default)]
    pub config: BTreeMap<String, ConfigValue>,
    /// Heuristic effectiveness in `[0, 1]`, set once the step is drafted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl WorkflowStep {
    #[must_use]
    pub fn confidence_or(&self, default: f64) -> f64 {
        self.confidence.unwrap_or(default)
    }

    #[must_use]
    pub fn display_confidence(&self) -> f64 {
        self.confidence_or(DISPLAY_CONFIDENCE_DEFAULT)
    }
}

/// A candidate creative strategy. The hook is its identity key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViralAngle {
    pub hook: String,
    pub pattern: String,
    pub framing: String,
    #[serde(default)]
    pub platform_fit: BTreeMap<Channel, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowTemplate {
    pub persona: String,
    pub hook: String,
    pub content_format: ContentFormat,
    pub target_channels: TargetChannels,
    pub steps: Vec<WorkflowStep>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelBreakdown {
    pub channel: Channel,
    pub predicted_reach: u64,
    pub cta: String,
    /// `HH:MM`, 24-hour clock.
    pub best_post_time: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationOutput {
    pub performance_score: u32,
    pub reach_projection: u64,
    pub virality_narrative: String,
    pub channel_breakdown: Vec<ChannelBreakdown>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchStatus {
    Queued,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutopostReceipt {
    pub dispatch_id: Uuid,
    pub status: DispatchStatus,
    pub scheduled_at: DateTime<Utc>,
    pub queue_count: usize,
}
