//! Performance simulation for a drafted workflow.

use std::fmt::Write as _;
use std::sync::Arc;

use launchpad_backend::{parse_object, BackendError, GenerativeBackend};
use launchpad_core::{
    channel_info, Channel, ChannelBreakdown, SimulationOutput, TargetChannels, WorkflowStep,
    WorkflowTemplate, SIMULATION_CONFIDENCE_DEFAULT,
};
use serde::Deserialize;

use crate::error::PipelineError;
use crate::generated::Generated;
use crate::text::truncate_chars;

const CONTEXT: &str = "simulation";

const BASE_REACH: f64 = 12_000.0;
const FALLBACK_SCORE_CAP: u32 = 98;
const MAX_NARRATIVE_CHARS: usize = 420;

const PRIMARY_NARRATIVE: &str = "Predicting 3.1x baseline reach driven by aggressive hook velocity and repurpose depth. Expect viral loops on Instagram within 48h, with Shorts and Threads acting as secondary accelerants.";
const PRIMARY_POST_TIMES: [&str; 4] = ["09:00", "11:30", "14:00", "17:45"];

const DEGRADED_NARRATIVE: &str = "Simulation fallback executed without backend analysis. Configure OPENAI_API_KEY with a reachable backend for richer projections.";
const DEGRADED_POST_TIMES: [&str; 4] = ["08:30", "12:15", "16:45", "20:30"];
const DEGRADED_CTA_DEFAULT: &str = "Drive saves and comments.";

pub struct SimulationEngine {
    backend: Option<Arc<dyn GenerativeBackend>>,
}

impl SimulationEngine {
    #[must_use]
    pub fn new(backend: Option<Arc<dyn GenerativeBackend>>) -> Self {
        Self { backend }
    }

    /// Projects performance of `steps` across `template.target_channels`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Validation`] when `steps` or the target
    /// channels are empty. Backend problems never surface as errors.
    pub async fn simulate(
        &self,
        template: &WorkflowTemplate,
        steps: &[WorkflowStep],
    ) -> Result<Generated<SimulationOutput>, PipelineError> {
        if steps.is_empty() {
            return Err(PipelineError::validation("cannot simulate a workflow without steps"));
        }
        if template.target_channels.is_empty() {
            return Err(PipelineError::validation("select at least one channel to simulate"));
        }

        let mean = mean_confidence(steps);
        let Some(backend) = &self.backend else {
            return Ok(Generated::fallback(primary_fallback(&template.target_channels, mean)));
        };

        let prompt = simulation_prompt(template, steps);
        match request_simulation(backend.as_ref(), &prompt, &template.target_channels).await {
            Ok(output) => Ok(Generated::backend(output)),
            Err(e) => {
                tracing::warn!(
                    backend = backend.name(),
                    kind = %e.kind(),
                    error = %e,
                    "simulation failed, using degraded projection"
                );
                Ok(Generated::degraded(
                    degraded_fallback(&template.target_channels, mean),
                    e.kind(),
                ))
            }
        }
    }
}

/// Average step confidence, treating a missing value as
/// [`SIMULATION_CONFIDENCE_DEFAULT`].
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn mean_confidence(steps: &[WorkflowStep]) -> f64 {
    if steps.is_empty() {
        return SIMULATION_CONFIDENCE_DEFAULT;
    }
    let total: f64 = steps
        .iter()
        .map(|s| s.confidence_or(SIMULATION_CONFIDENCE_DEFAULT))
        .sum();
    total / steps.len() as f64
}

/// Projection used when no backend is configured.
#[must_use]
pub fn primary_fallback(channels: &TargetChannels, mean: f64) -> SimulationOutput {
    SimulationOutput {
        performance_score: score(mean).min(FALLBACK_SCORE_CAP),
        reach_projection: round_count(BASE_REACH * (1.0 + mean)),
        virality_narrative: PRIMARY_NARRATIVE.to_string(),
        channel_breakdown: breakdown(channels, mean, 1.4, 0.12, &PRIMARY_POST_TIMES, |c| {
            channel_info(c)
                .best_practices
                .first()
                .map(|s| (*s).to_string())
                .unwrap_or_default()
        }),
    }
}

/// Projection used when a configured backend failed. The score is not
/// capped here.
#[must_use]
pub fn degraded_fallback(channels: &TargetChannels, mean: f64) -> SimulationOutput {
    SimulationOutput {
        performance_score: score(mean).min(100),
        reach_projection: round_count(BASE_REACH * (1.0 + mean)),
        virality_narrative: DEGRADED_NARRATIVE.to_string(),
        channel_breakdown: breakdown(channels, mean, 1.3, 0.08, &DEGRADED_POST_TIMES, |c| {
            channel_info(c)
                .best_practices
                .get(1)
                .map_or_else(|| DEGRADED_CTA_DEFAULT.to_string(), |s| (*s).to_string())
        }),
    }
}

#[allow(clippy::cast_precision_loss)]
fn breakdown(
    channels: &TargetChannels,
    mean: f64,
    start: f64,
    decay: f64,
    times: &[&str; 4],
    cta: impl Fn(Channel) -> String,
) -> Vec<ChannelBreakdown> {
    channels
        .iter()
        .enumerate()
        .map(|(i, channel)| ChannelBreakdown {
            channel,
            predicted_reach: round_count(BASE_REACH * (start - decay * i as f64) * mean),
            cta: cta(channel),
            best_post_time: times[i % times.len()].to_string(),
        })
        .collect()
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn score(mean: f64) -> u32 {
    (mean * 100.0).round().max(0.0) as u32
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn round_count(value: f64) -> u64 {
    value.round().max(0.0) as u64
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SimulationWire {
    performance_score: f64,
    reach_projection: f64,
    virality_narrative: String,
    channel_breakdown: Vec<BreakdownWire>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BreakdownWire {
    channel: Channel,
    predicted_reach: f64,
    cta: String,
    best_post_time: String,
}

async fn request_simulation(
    backend: &dyn GenerativeBackend,
    prompt: &str,
    channels: &TargetChannels,
) -> Result<SimulationOutput, BackendError> {
    let raw = backend.complete_json(prompt).await?;
    let wire: SimulationWire = parse_object(&raw, CONTEXT)?;
    validate_simulation(wire, channels)
}

fn validate_simulation(
    wire: SimulationWire,
    channels: &TargetChannels,
) -> Result<SimulationOutput, BackendError> {
    if !(0.0..=100.0).contains(&wire.performance_score) {
        return Err(BackendError::malformed(
            CONTEXT,
            format!("performanceScore {} outside [0, 100]", wire.performance_score),
        ));
    }
    if !wire.reach_projection.is_finite() || wire.reach_projection < 0.0 {
        return Err(BackendError::malformed(CONTEXT, "negative reachProjection"));
    }

    let returned: Vec<Channel> = wire.channel_breakdown.iter().map(|b| b.channel).collect();
    if returned != channels.as_slice() {
        return Err(BackendError::malformed(
            CONTEXT,
            format!(
                "channelBreakdown covers [{}], expected [{}]",
                returned.iter().map(|c| c.as_str()).collect::<Vec<_>>().join(", "),
                channels.joined()
            ),
        ));
    }

    let channel_breakdown = wire
        .channel_breakdown
        .into_iter()
        .map(|b| {
            if !b.predicted_reach.is_finite() || b.predicted_reach < 0.0 {
                return Err(BackendError::malformed(
                    CONTEXT,
                    format!("negative predictedReach for {}", b.channel),
                ));
            }
            if !is_clock_time(&b.best_post_time) {
                return Err(BackendError::malformed(
                    CONTEXT,
                    format!("bestPostTime `{}` is not HH:MM", b.best_post_time),
                ));
            }
            Ok(ChannelBreakdown {
                channel: b.channel,
                predicted_reach: round_count(b.predicted_reach),
                cta: b.cta,
                best_post_time: b.best_post_time,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(SimulationOutput {
        performance_score: u32::try_from(round_count(wire.performance_score)).unwrap_or(100),
        reach_projection: round_count(wire.reach_projection),
        virality_narrative: truncate_chars(&wire.virality_narrative, MAX_NARRATIVE_CHARS),
        channel_breakdown,
    })
}

fn is_clock_time(value: &str) -> bool {
    let Some((hours, minutes)) = value.split_once(':') else {
        return false;
    };
    let two_digits = |s: &str| s.len() == 2 && s.bytes().all(|b| b.is_ascii_digit());
    two_digits(hours)
        && two_digits(minutes)
        && hours.parse::<u8>().is_ok_and(|h| h < 24)
        && minutes.parse::<u8>().is_ok_and(|m| m < 60)
}

fn simulation_prompt(template: &WorkflowTemplate, steps: &[WorkflowStep]) -> String {
    let mut rendered = String::new();
    for step in steps {
        let _ = writeln!(
            rendered,
            "- {} ({}) => {}",
            step.title, step.category, step.description
        );
    }

    format!(
        "You are simulating content virality for a multi-channel automation workflow.\n\
         Persona: {persona}\n\
         Hook: {hook}\n\
         Channels (in order): {channels}\n\
         Steps:\n{rendered}\n\
         Respond with a JSON object with performanceScore (0-100), reachProjection (integer), \
         viralityNarrative (at most {MAX_NARRATIVE_CHARS} characters) and channelBreakdown: \
         an array with one entry per channel above, in the same order, each \
         {{\"channel\", \"predictedReach\", \"cta\", \"bestPostTime\" (HH:MM)}}.",
        persona = template.persona,
        hook = template.hook,
        channels = template.target_channels.joined(),
    )
}

#[cfg(test)]
#[path = "simulation_test.rs"]
mod tests;
