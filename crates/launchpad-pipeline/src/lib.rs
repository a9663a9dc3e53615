//! Workflow drafting and simulation pipeline.
//!
//! Four stages turn creator inputs into a publishable plan:
//!
//! 1. [`AngleGenerator`] proposes candidate viral angles.
//! 2. [`StepDrafter`] recalibrates the baseline steps for one angle.
//! 3. [`SimulationEngine`] projects performance across channels.
//! 4. [`AutopostDispatcher`] queues the finished workflow.
//!
//! [`RecalibrationController`] owns a session's state and re-runs stages 1
//! and 2 whenever inputs settle, discarding results from superseded runs.
//! Every backend-capable stage degrades to deterministic content instead of
//! failing.

pub mod angles;
pub mod autopost;
pub mod cache;
pub mod controller;
pub mod drafter;
pub mod error;
pub mod generated;
pub mod simulation;

mod text;

#[cfg(test)]
mod testing;

use std::sync::Arc;

use launchpad_backend::GenerativeBackend;

pub use angles::{fallback_angles, AngleGenerator};
pub use autopost::{AutopostDispatcher, AutopostPayload};
pub use cache::ViewRevision;
pub use controller::{InputPatch, Notice, NoticeLevel, Phase, RecalibrationController, SessionSnapshot};
pub use drafter::StepDrafter;
pub use error::PipelineError;
pub use generated::{Generated, Origin};
pub use simulation::SimulationEngine;

/// The four pipeline stages sharing one optional backend.
pub struct Pipeline {
    pub angles: AngleGenerator,
    pub drafter: StepDrafter,
    pub simulator: SimulationEngine,
    pub dispatcher: AutopostDispatcher,
    backend_name: Option<String>,
}

impl Pipeline {
    #[must_use]
    pub fn new(backend: Option<Arc<dyn GenerativeBackend>>, revision: ViewRevision) -> Self {
        match &backend {
            Some(b) => tracing::info!(backend = b.name(), "pipeline running in enhanced mode"),
            None => tracing::info!("no generative backend configured; pipeline is fallback-only"),
        }
        Self {
            angles: AngleGenerator::new(backend.clone()),
            drafter: StepDrafter::new(backend.clone()),
            backend_name: backend.as_ref().map(|b| b.name().to_string()),
            simulator: SimulationEngine::new(backend),
            dispatcher: AutopostDispatcher::new(revision),
        }
    }

    /// Name of the configured backend, `None` in fallback-only mode.
    #[must_use]
    pub fn backend_name(&self) -> Option<&str> {
        self.backend_name.as_deref()
    }

    #[must_use]
    pub fn revision(&self) -> &ViewRevision {
        self.dispatcher.revision()
    }

    #[must_use]
    pub fn fallback_only(revision: ViewRevision) -> Self {
        Self::new(None, revision)
    }
}
