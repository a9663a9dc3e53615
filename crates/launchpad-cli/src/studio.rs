//! Command handlers. Each returns the pretty-printed JSON document the
//! command writes to stdout.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::Args;
use launchpad_backend::{GenerativeBackend, OpenAiBackend};
use launchpad_core::{AppConfig, Channel, ContentFormat, TemplateSource, WorkflowTemplate, CATALOG};
use launchpad_pipeline::{Origin, Pipeline, RecalibrationController, ViewRevision};
use serde::Serialize;

/// Overrides applied on top of the baseline template.
#[derive(Debug, Clone, Default, Args)]
pub(crate) struct InputArgs {
    /// Audience persona
    #[arg(long)]
    pub persona: Option<String>,
    /// Core hook of the content piece
    #[arg(long)]
    pub hook: Option<String>,
    /// Content format (reels, carousel, story, shorts, ideaPin)
    #[arg(long)]
    pub format: Option<ContentFormat>,
    /// Target channel; repeat to select several
    #[arg(long = "channel")]
    pub channels: Vec<Channel>,
}

impl InputArgs {
    pub(crate) fn apply(&self, mut template: WorkflowTemplate) -> WorkflowTemplate {
        if let Some(persona) = &self.persona {
            template.persona.clone_from(persona);
        }
        if let Some(hook) = &self.hook {
            template.hook.clone_from(hook);
        }
        if let Some(format) = self.format {
            template.content_format = format;
        }
        if !self.channels.is_empty() {
            template.target_channels = self.channels.iter().copied().collect();
        }
        template
    }
}

#[derive(Debug, Serialize)]
struct AnglesReport<'a> {
    origin: String,
    angles: &'a [launchpad_core::ViralAngle],
}

pub(crate) fn origin_label(origin: Origin) -> String {
    match origin {
        Origin::Backend => "backend".to_string(),
        Origin::Fallback => "fallback".to_string(),
        Origin::Degraded(kind) => format!("degraded:{kind}"),
    }
}

fn baseline(config: &AppConfig) -> anyhow::Result<WorkflowTemplate> {
    TemplateSource::from_path(config.template_path.clone())
        .read()
        .context("failed to load workflow template")
}

fn build_pipeline(config: &AppConfig) -> anyhow::Result<Arc<Pipeline>> {
    let backend = OpenAiBackend::from_settings(&config.backend)?
        .map(|b| Arc::new(b) as Arc<dyn GenerativeBackend>);
    Ok(Arc::new(Pipeline::new(backend, ViewRevision::new())))
}

pub(crate) fn run_template(config: &AppConfig) -> anyhow::Result<String> {
    let template = baseline(config)?;
    Ok(serde_json::to_string_pretty(&template)?)
}

pub(crate) fn run_channels() -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(&CATALOG)?)
}

pub(crate) async fn run_angles(config: &AppConfig, inputs: &InputArgs) -> anyhow::Result<String> {
    let template = inputs.apply(baseline(config)?);
    let pipeline = build_pipeline(config)?;
    let generated = pipeline
        .angles
        .generate(
            &template.persona,
            &template.hook,
            template.content_format,
            &template.target_channels,
        )
        .await;

    let report = AnglesReport {
        origin: origin_label(generated.origin),
        angles: &generated.value,
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

/// Runs one full recalibration, optionally switches to angle `angle`
/// (1-based), simulates, and optionally queues an autopost. Prints the
/// final session snapshot.
pub(crate) async fn run_preview(
    config: &AppConfig,
    inputs: &InputArgs,
    angle: usize,
    autopost: bool,
) -> anyhow::Result<String> {
    let template = inputs.apply(baseline(config)?);
    if template.target_channels.is_empty() {
        bail!("at least one target channel is required");
    }

    let pipeline = build_pipeline(config)?;
    let controller = RecalibrationController::new(
        template,
        pipeline,
        Duration::from_millis(config.debounce_ms),
    );
    controller.refresh().await;

    let angles = controller.snapshot().angles;
    let Some(chosen) = angle.checked_sub(1).and_then(|i| angles.get(i)) else {
        bail!("angle {angle} out of range (1..={})", angles.len());
    };
    if angle > 1 {
        controller.select_angle(&chosen.hook).await?;
    }

    controller.simulate().await?;
    if autopost {
        let receipt = controller.autopost()?;
        tracing::info!(dispatch_id = %receipt.dispatch_id, "autopost queued");
    }

    let snapshot = controller.snapshot();
    controller.shutdown();
    Ok(serde_json::to_string_pretty(&snapshot)?)
}
