use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use launchpad_core::{
    AutopostReceipt, ContentFormat, SimulationOutput, TargetChannels, ViralAngle, WorkflowTemplate,
};
use serde::{Deserialize, Serialize};

/// Notices kept per session; older ones are dropped first.
pub const MAX_NOTICES: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    Idle,
    PendingDebounce,
    GeneratingAngles,
    DraftingSteps,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Info,
    Warning,
    Error,
}

/// A transient, user-visible message about a pipeline action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    pub at: DateTime<Utc>,
}

/// Partial update of the creator inputs. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputPatch {
    pub persona: Option<String>,
    pub hook: Option<String>,
    pub content_format: Option<ContentFormat>,
    pub target_channels: Option<TargetChannels>,
}

impl InputPatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.persona.is_none()
            && self.hook.is_none()
            && self.content_format.is_none()
            && self.target_channels.is_none()
    }
}

/// Complete observable state of one session.
///
/// `template` is the session's override of the baseline: current inputs
/// plus the current step list.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub template: WorkflowTemplate,
    pub angles: Vec<ViralAngle>,
    pub selected_angle: Option<ViralAngle>,
    pub simulation: Option<SimulationOutput>,
    pub last_receipt: Option<AutopostReceipt>,
    pub phase: Phase,
    pub generation: u64,
    #[serde(skip)]
    pub(crate) draft_token: u64,
    /// Stage of the automatic run for `generation`; `None` once it settled.
    #[serde(skip)]
    pub(crate) run_phase: Option<Phase>,
    pub notices: VecDeque<Notice>,
}

impl SessionSnapshot {
    pub(crate) fn new(baseline: WorkflowTemplate) -> Self {
        Self {
            template: baseline,
            angles: Vec::new(),
            selected_angle: None,
            simulation: None,
            last_receipt: None,
            phase: Phase::Idle,
            generation: 0,
            draft_token: 0,
            run_phase: None,
            notices: VecDeque::new(),
        }
    }

    /// Moves the automatic run to `phase` and mirrors it in the visible phase.
    pub(crate) fn enter(&mut self, phase: Phase) {
        self.run_phase = Some(phase);
        self.phase = phase;
    }

    /// Ends a stage. The visible phase falls back to whatever the automatic
    /// run is still doing, or `Idle` when nothing is pending.
    pub(crate) fn settle(&mut self, ends_run: bool) {
        if ends_run {
            self.run_phase = None;
        }
        self.phase = self.run_phase.unwrap_or(Phase::Idle);
    }

    /// Applies `patch` to the inputs, returning whether anything changed.
    pub(crate) fn apply_patch(&mut self, patch: InputPatch) -> bool {
        let template = &mut self.template;
        let mut changed = false;
        if let Some(persona) = patch.persona {
            changed |= replace(&mut template.persona, persona);
        }
        if let Some(hook) = patch.hook {
            changed |= replace(&mut template.hook, hook);
        }
        if let Some(format) = patch.content_format {
            changed |= replace(&mut template.content_format, format);
        }
        if let Some(channels) = patch.target_channels {
            changed |= replace(&mut template.target_channels, channels);
        }
        changed
    }

    pub(crate) fn push_notice(&mut self, level: NoticeLevel, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!(?level, message = %message, "session notice");
        if self.notices.len() == MAX_NOTICES {
            self.notices.pop_front();
        }
        self.notices.push_back(Notice {
            level,
            message,
            at: Utc::now(),
        });
    }

    #[must_use]
    pub fn latest_notice(&self) -> Option<&Notice> {
        self.notices.back()
    }
}

fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}

#[cfg(test)]
mod tests {
    use launchpad_core::{baseline_template, Channel};

    use super::*;

    #[test]
    fn patch_reports_only_real_changes() {
        let baseline = baseline_template();
        let mut state = SessionSnapshot::new(baseline.clone());

        assert!(!state.apply_patch(InputPatch::default()));
        assert!(!state.apply_patch(InputPatch {
            persona: Some(baseline.persona.clone()),
            ..InputPatch::default()
        }));
        assert!(state.apply_patch(InputPatch {
            hook: Some("new hook".into()),
            target_channels: Some(vec![Channel::Tiktok].into()),
            ..InputPatch::default()
        }));
        assert_eq!(state.template.hook, "new hook");
        assert_eq!(state.template.target_channels.as_slice(), &[Channel::Tiktok]);
        assert_eq!(state.template.persona, baseline.persona);
    }

    #[test]
    fn notices_are_bounded() {
        let mut state = SessionSnapshot::new(baseline_template());
        for i in 0..(MAX_NOTICES + 5) {
            state.push_notice(NoticeLevel::Info, format!("notice {i}"));
        }
        assert_eq!(state.notices.len(), MAX_NOTICES);
        assert_eq!(state.notices[0].message, "notice 5");
        assert_eq!(
            state.latest_notice().map(|n| n.message.as_str()),
            Some("notice 24")
        );
    }

    #[test]
    fn patch_deserializes_from_camel_case() {
        let patch: InputPatch = serde_json::from_str(
            r#"{"contentFormat":"ideaPin","targetChannels":["pinterest","pinterest","threads"]}"#,
        )
        .expect("valid patch");
        assert_eq!(patch.content_format, Some(ContentFormat::IdeaPin));
        assert_eq!(
            patch.target_channels.map(Vec::from),
            Some(vec![Channel::Pinterest, Channel::Threads])
        );
        assert!(patch.persona.is_none());
    }

    #[test]
    fn snapshot_hides_draft_token() {
        let state = SessionSnapshot::new(baseline_template());
        let value = serde_json::to_value(&state).expect("serializable");
        assert!(value.get("draftToken").is_none());
        assert_eq!(value["phase"], "idle");
    }

    #[test]
    fn settle_falls_back_to_the_automatic_run() {
        let mut state = SessionSnapshot::new(baseline_template());
        state.enter(Phase::PendingDebounce);
        state.phase = Phase::DraftingSteps;

        state.settle(false);
        assert_eq!(state.phase, Phase::PendingDebounce);

        state.enter(Phase::DraftingSteps);
        state.settle(true);
        assert_eq!(state.phase, Phase::Idle);
        assert!(state.run_phase.is_none());
    }
}
