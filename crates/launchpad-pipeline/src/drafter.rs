//! Step drafting: recalibrates the baseline steps for a chosen angle.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::Arc;

use launchpad_backend::{parse_field, BackendError, GenerativeBackend};
use launchpad_core::{ConfigValue, ViralAngle, WorkflowStep, WorkflowTemplate};
use serde::Deserialize;

use crate::generated::Generated;
use crate::text::truncate_chars;

const CONTEXT: &str = "step drafting";

/// Characters of the angle pattern appended to each fallback description.
const PATTERN_PREFIX_CHARS: usize = 90;

const MAX_DESCRIPTION_CHARS: usize = 200;

const FALLBACK_CONFIDENCE_START: f64 = 0.82;
const FALLBACK_CONFIDENCE_STEP: f64 = 0.03;

pub struct StepDrafter {
    backend: Option<Arc<dyn GenerativeBackend>>,
}

impl StepDrafter {
    #[must_use]
    pub fn new(backend: Option<Arc<dyn GenerativeBackend>>) -> Self {
        Self { backend }
    }

    /// Drafts `template.steps` for `angle`.
    ///
    /// Without a backend the steps get the deterministic [`fallback_draft`].
    /// When a configured backend fails, the baseline steps are returned
    /// unchanged rather than the fallback transform.
    pub async fn draft(
        &self,
        template: &WorkflowTemplate,
        angle: &ViralAngle,
    ) -> Generated<Vec<WorkflowStep>> {
        let Some(backend) = &self.backend else {
            return Generated::fallback(fallback_draft(&template.steps, angle));
        };

        let prompt = draft_prompt(&template.steps, angle);
        match request_steps(backend.as_ref(), &prompt, &template.steps).await {
            Ok(steps) => Generated::backend(steps),
            Err(e) => {
                tracing::warn!(
                    backend = backend.name(),
                    kind = %e.kind(),
                    error = %e,
                    "step drafting failed, keeping baseline steps"
                );
                Generated::degraded(template.steps.clone(), e.kind())
            }
        }
    }
}

/// Appends the angle pattern to every description and assigns a confidence
/// that decays by position.
#[must_use]
pub fn fallback_draft(baseline: &[WorkflowStep], angle: &ViralAngle) -> Vec<WorkflowStep> {
    let pattern = truncate_chars(&angle.pattern, PATTERN_PREFIX_CHARS);
    baseline
        .iter()
        .enumerate()
        .map(|(i, step)| {
            let mut drafted = step.clone();
            drafted.description = format!(
                "{} | Amplified with angle: {pattern}...",
                step.description
            );
            drafted.config.remove("confidence");
            drafted.confidence = Some(fallback_confidence(i));
            drafted
        })
        .collect()
}

/// `0.82 - 0.03 * index`, floored at zero.
#[allow(clippy::cast_precision_loss)]
fn fallback_confidence(index: usize) -> f64 {
    (FALLBACK_CONFIDENCE_START - FALLBACK_CONFIDENCE_STEP * index as f64).max(0.0)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DraftedStep {
    id: String,
    description: String,
    #[serde(default)]
    duration_minutes: Option<f64>,
    #[serde(default)]
    config: BTreeMap<String, ConfigValue>,
    #[serde(default)]
    confidence: Option<f64>,
}

async fn request_steps(
    backend: &dyn GenerativeBackend,
    prompt: &str,
    baseline: &[WorkflowStep],
) -> Result<Vec<WorkflowStep>, BackendError> {
    let raw = backend.complete_json(prompt).await?;
    let drafted: Vec<DraftedStep> = parse_field(&raw, "steps", CONTEXT)?;
    merge_drafted(baseline, drafted)
}

/// Validates backend steps against the baseline and merges them onto it.
/// Identity, title and category always come from the baseline.
fn merge_drafted(
    baseline: &[WorkflowStep],
    drafted: Vec<DraftedStep>,
) -> Result<Vec<WorkflowStep>, BackendError> {
    if drafted.len() != baseline.len() {
        return Err(BackendError::malformed(
            CONTEXT,
            format!("expected {} steps, got {}", baseline.len(), drafted.len()),
        ));
    }

    baseline
        .iter()
        .zip(drafted)
        .map(|(base, mut step)| {
            if step.id != base.id {
                return Err(BackendError::malformed(
                    CONTEXT,
                    format!("expected step id `{}`, got `{}`", base.id, step.id),
                ));
            }

            let promoted = step.config.remove("confidence").and_then(|v| v.as_number());
            let confidence = step.confidence.or(promoted).ok_or_else(|| {
                BackendError::malformed(CONTEXT, format!("step `{}` has no confidence", base.id))
            })?;
            if !(0.0..=1.0).contains(&confidence) {
                return Err(BackendError::malformed(
                    CONTEXT,
                    format!("step `{}` confidence {confidence} outside [0, 1]", base.id),
                ));
            }

            Ok(WorkflowStep {
                id: base.id.clone(),
                title: base.title.clone(),
                category: base.category,
                description: truncate_chars(&step.description, MAX_DESCRIPTION_CHARS),
                duration_minutes: step
                    .duration_minutes
                    .and_then(positive_minutes)
                    .unwrap_or(base.duration_minutes),
                config: step.config,
                confidence: Some(confidence),
            })
        })
        .collect()
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn positive_minutes(minutes: f64) -> Option<u32> {
    let rounded = minutes.round();
    (rounded >= 1.0 && rounded <= f64::from(u32::MAX)).then_some(rounded as u32)
}

fn draft_prompt(baseline: &[WorkflowStep], angle: &ViralAngle) -> String {
    let mut steps = String::new();
    for (i, step) in baseline.iter().enumerate() {
        let config = serde_json::to_string(&step.config).unwrap_or_default();
        let _ = writeln!(
            steps,
            "{}. [{}] {} [{}] -> {} (duration: {}min, config: {config})",
            i + 1,
            step.id,
            step.title,
            step.category,
            step.description,
            step.duration_minutes,
        );
    }
    let angle = serde_json::to_string_pretty(angle).unwrap_or_default();

    format!(
        "You are calibrating a content automation pipeline for a new viral angle.\n\
         Template steps:\n{steps}\n\
         Viral angle:\n{angle}\n\n\
         Respond with a JSON object {{\"steps\": [...]}} containing one entry per template \
         step, in the same order, each with: id (unchanged), description (at most \
         {MAX_DESCRIPTION_CHARS} characters), durationMinutes, config (tunables adjusted to \
         maximize retention lift) and confidence (a number between 0 and 1)."
    )
}

#[cfg(test)]
#[path = "drafter_test.rs"]
mod tests;
