//! Viral angle generation.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use launchpad_backend::{parse_field, BackendError, GenerativeBackend};
use launchpad_core::{Channel, ContentFormat, TargetChannels, ViralAngle};

use crate::generated::Generated;

const CONTEXT: &str = "angle generation";

/// Proposes candidate viral angles for the current inputs.
pub struct AngleGenerator {
    backend: Option<Arc<dyn GenerativeBackend>>,
}

impl AngleGenerator {
    #[must_use]
    pub fn new(backend: Option<Arc<dyn GenerativeBackend>>) -> Self {
        Self { backend }
    }

    /// Returns the backend's angles, or [`fallback_angles`] when no backend
    /// is configured or its response is unusable.
    pub async fn generate(
        &self,
        persona: &str,
        hook: &str,
        format: ContentFormat,
        channels: &TargetChannels,
    ) -> Generated<Vec<ViralAngle>> {
        let Some(backend) = &self.backend else {
            return Generated::fallback(fallback_angles());
        };

        let prompt = angle_prompt(persona, hook, format, channels);
        match request_angles(backend.as_ref(), &prompt).await {
            Ok(angles) => {
                tracing::debug!(count = angles.len(), "backend produced viral angles");
                Generated::backend(angles)
            }
            Err(e) => {
                tracing::warn!(
                    backend = backend.name(),
                    kind = %e.kind(),
                    error = %e,
                    "angle generation failed, using fallback angles"
                );
                Generated::degraded(fallback_angles(), e.kind())
            }
        }
    }
}

async fn request_angles(
    backend: &dyn GenerativeBackend,
    prompt: &str,
) -> Result<Vec<ViralAngle>, BackendError> {
    let raw = backend.complete_json(prompt).await?;
    let angles: Vec<ViralAngle> = parse_field(&raw, "angles", CONTEXT)?;
    validate_angles(&angles)?;
    Ok(angles)
}

fn validate_angles(angles: &[ViralAngle]) -> Result<(), BackendError> {
    let mut seen = HashSet::new();
    for angle in angles {
        if angle.hook.trim().is_empty() {
            return Err(BackendError::malformed(CONTEXT, "angle with empty hook"));
        }
        if !seen.insert(angle.hook.as_str()) {
            return Err(BackendError::malformed(
                CONTEXT,
                format!("duplicate hook: {}", angle.hook),
            ));
        }
    }
    Ok(())
}

fn angle_prompt(
    persona: &str,
    hook: &str,
    format: ContentFormat,
    channels: &TargetChannels,
) -> String {
    format!(
        "You are a growth strategist designing content for a short-form automation system.\n\
         Propose 3 distinct viral angles for this creator.\n\
         Persona: {persona}\n\
         Core hook: {hook}\n\
         Format: {format}\n\
         Channels: {channels}\n\n\
         Respond with a JSON object of the form \
         {{\"angles\": [{{\"hook\": string, \"pattern\": string, \"framing\": string, \
         \"platformFit\": {{\"<channel>\": string}}}}]}}. \
         Each hook must be unique. platformFit keys must be channel ids from the list above.",
        channels = channels.joined(),
    )
}

/// The three fixed angles used whenever the backend is absent or fails.
#[must_use]
pub fn fallback_angles() -> Vec<ViralAngle> {
    vec![
        angle(
            "The bizarre storytelling loop trick Instagram's top creators won't admit",
            "Pattern interrupt with sensory overload in first 0.6s.",
            "Confessional voiceover revealing behind-the-scenes cheat code.",
            [
                "Film vertical, punchy CC, comment CTA about risk-taking.",
                "Add mid-roll tension beat before reveal, end with sub CTA.",
                "Lean into community FOMO, mention shareable challenge.",
                "Convert to swipe thread: Hook > Why it works > CTA to reel.",
                "Visual storyboard of steps with hero payoff frame.",
                "Duet-friendly angle, mention trending meme overlay.",
            ],
        ),
        angle(
            "I fed 10 million viral posts into an AI and it spat this blueprint",
            "Data-backed intrigue with screenshot overlays.",
            "Show tactical repeatable formula in 3 beats.",
            [
                "Show before/after metrics, CTA to save for later.",
                "Extended cut with extra examples and resource link.",
                "Highlight community case study, push to comments.",
                "Carousel with each strategy card expressed as prompt.",
                "Idea pin with each beat as polished frame.",
                "Overlay text with trending sound down tempo.",
            ],
        ),
        angle(
            "This retention hack prints reels that outpace your last 30 uploads combined",
            "Promise transformation by leveraging tension-release rhythm.",
            "Narrate as a story arc with stakes, conflict, resolution.",
            [
                "Use comment magnet CTA asking viewers biggest hurdle.",
                "Add 10-sec end screen to cross-promote longer vid.",
                "Seed conversation around shared struggle.",
                "Turn into swipe thread with each beat as micro-story.",
                "Visual checklist for retention beats.",
                "Cap each beat with sound-emphasized caption pop.",
            ],
        ),
    ]
}

/// `fit` is ordered like [`Channel::ALL`].
fn angle(hook: &str, pattern: &str, framing: &str, fit: [&str; 6]) -> ViralAngle {
    let platform_fit: BTreeMap<Channel, String> = Channel::ALL
        .into_iter()
        .zip(fit)
        .map(|(channel, advice)| (channel, advice.to_string()))
        .collect();
    ViralAngle {
        hook: hook.to_string(),
        pattern: pattern.to_string(),
        framing: framing.to_string(),
        platform_fit,
    }
}
