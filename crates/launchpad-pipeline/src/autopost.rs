//! Logical dispatch of a finished workflow.
//!
//! Nothing is posted to any platform. A dispatch is an audit log record plus
//! a view invalidation, acknowledged with a receipt.

use chrono::Utc;
use launchpad_core::{AutopostReceipt, DispatchStatus, ViralAngle, WorkflowStep, WorkflowTemplate};
use serde::Serialize;
use uuid::Uuid;

use crate::cache::ViewRevision;

/// Path of the workflow view invalidated on every dispatch.
const WORKFLOW_VIEW_PATH: &str = "/";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AutopostPayload<'a> {
    pub template: &'a WorkflowTemplate,
    pub steps: &'a [WorkflowStep],
    pub angle: &'a ViralAngle,
}

#[derive(Debug, Clone)]
pub struct AutopostDispatcher {
    revision: ViewRevision,
}

impl AutopostDispatcher {
    #[must_use]
    pub fn new(revision: ViewRevision) -> Self {
        Self { revision }
    }

    #[must_use]
    pub fn revision(&self) -> &ViewRevision {
        &self.revision
    }

    /// Records the dispatch and returns a queued receipt with one entry per
    /// target channel.
    pub fn dispatch(&self, payload: &AutopostPayload<'_>) -> AutopostReceipt {
        let receipt = AutopostReceipt {
            dispatch_id: Uuid::new_v4(),
            status: DispatchStatus::Queued,
            scheduled_at: Utc::now(),
            queue_count: payload.template.target_channels.len(),
        };

        let payload_json = serde_json::to_string(payload)
            .unwrap_or_else(|e| format!("{{\"serializationError\":\"{e}\"}}"));
        tracing::info!(
            dispatch_id = %receipt.dispatch_id,
            scheduled_at = %receipt.scheduled_at.to_rfc3339(),
            queue_count = receipt.queue_count,
            channels = %payload.template.target_channels.joined(),
            payload = %payload_json,
            "autopost triggered"
        );

        self.revision.invalidate(WORKFLOW_VIEW_PATH);
        receipt
    }
}

#[cfg(test)]
mod tests {
    use launchpad_core::{baseline_template, Channel, TargetChannels};

    use super::*;
    use crate::angles::fallback_angles;

    #[test]
    fn receipt_counts_target_channels() {
        let dispatcher = AutopostDispatcher::new(ViewRevision::new());
        let angle = &fallback_angles()[0];

        for channels in [
            vec![],
            vec![Channel::Instagram],
            Channel::ALL.to_vec(),
        ] {
            let mut template = baseline_template();
            template.target_channels = TargetChannels::from(channels.clone());
            let receipt = dispatcher.dispatch(&AutopostPayload {
                template: &template,
                steps: &template.steps,
                angle,
            });
            assert_eq!(receipt.queue_count, channels.len());
            assert_eq!(receipt.status, DispatchStatus::Queued);
        }
    }

    #[test]
    fn dispatch_invalidates_the_view() {
        let revision = ViewRevision::new();
        let dispatcher = AutopostDispatcher::new(revision.clone());
        let template = baseline_template();

        dispatcher.dispatch(&AutopostPayload {
            template: &template,
            steps: &template.steps,
            angle: &fallback_angles()[1],
        });
        assert_eq!(revision.current(), 1);
    }

    #[test]
    fn every_dispatch_gets_a_new_id() {
        let dispatcher = AutopostDispatcher::new(ViewRevision::new());
        let template = baseline_template();
        let angle = &fallback_angles()[2];
        let payload = AutopostPayload {
            template: &template,
            steps: &template.steps,
            angle,
        };

        let first = dispatcher.dispatch(&payload);
        let second = dispatcher.dispatch(&payload);
        assert_ne!(first.dispatch_id, second.dispatch_id);
        assert!(second.scheduled_at >= first.scheduled_at);
    }

    #[test]
    fn payload_serializes_camel_case() {
        let template = baseline_template();
        let angle = &fallback_angles()[0];
        let value = serde_json::to_value(AutopostPayload {
            template: &template,
            steps: &template.steps,
            angle,
        })
        .expect("serializable");

        assert!(value["template"]["targetChannels"].is_array());
        assert_eq!(value["angle"]["hook"], angle.hook.as_str());
        assert_eq!(
            value["steps"].as_array().map(Vec::len),
            Some(template.steps.len())
        );
    }
}
