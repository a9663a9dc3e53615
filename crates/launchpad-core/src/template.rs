//! Baseline workflow template: built in, or loaded from a YAML file.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use crate::types::{
    Channel, ConfigValue, ContentFormat, StepCategory, TargetChannels, WorkflowStep,
    WorkflowTemplate,
};
use crate::ConfigError;

/// Where the baseline template comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    BuiltIn,
    File(PathBuf),
}

impl TemplateSource {
    #[must_use]
    pub fn from_path(path: Option<PathBuf>) -> Self {
        path.map_or(TemplateSource::BuiltIn, TemplateSource::File)
    }

    /// Read the baseline template. Repeated reads return equal values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a template file cannot be read, parsed, or
    /// fails validation. The built-in template never fails.
    pub fn read(&self) -> Result<WorkflowTemplate, ConfigError> {
        match self {
            TemplateSource::BuiltIn => Ok(baseline_template()),
            TemplateSource::File(path) => load_template(path),
        }
    }
}

/// Load and validate a baseline template from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_template(path: &Path) -> Result<WorkflowTemplate, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::TemplateFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_template(&content)
}

fn parse_template(content: &str) -> Result<WorkflowTemplate, ConfigError> {
    let mut template: WorkflowTemplate = serde_yaml::from_str(content)?;
    for step in &mut template.steps {
        promote_confidence(step)?;
    }
    validate_template(&template)?;

    Ok(template)
}

/// Moves a `confidence` entry out of the step config into the typed field.
/// An explicit `confidence` field wins over the config entry.
fn promote_confidence(step: &mut WorkflowStep) -> Result<(), ConfigError> {
    let Some(value) = step.config.remove("confidence") else {
        return Ok(());
    };
    let Some(confidence) = value.as_number() else {
        return Err(ConfigError::Validation(format!(
            "step '{}' has a non-numeric confidence: {value}",
            step.id
        )));
    };
    step.confidence.get_or_insert(confidence);
    Ok(())
}

fn validate_template(template: &WorkflowTemplate) -> Result<(), ConfigError> {
    if template.steps.is_empty() {
        return Err(ConfigError::Validation(
            "template must define at least one step".to_string(),
        ));
    }

    if template.target_channels.is_empty() {
        return Err(ConfigError::Validation(
            "template must target at least one channel".to_string(),
        ));
    }

    let mut seen_ids = HashSet::new();
    for step in &template.steps {
        if step.id.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "step '{}' has an empty id",
                step.title
            )));
        }

        if !seen_ids.insert(step.id.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate step id: '{}'",
                step.id
            )));
        }

        if step.duration_minutes == 0 {
            return Err(ConfigError::Validation(format!(
                "step '{}' must have a positive duration",
                step.id
            )));
        }

        if let Some(confidence) = step.confidence {
            if !(0.0..=1.0).contains(&confidence) {
                return Err(ConfigError::Validation(format!(
                    "step '{}' has confidence {confidence}; must be within [0, 1]",
                    step.id
                )));
            }
        }
    }

    Ok(())
}

fn step(
    id: &str,
    title: &str,
    category: StepCategory,
    description: &str,
    duration_minutes: u32,
    config: &[(&str, ConfigValue)],
) -> WorkflowStep {
    WorkflowStep {
        id: id.to_string(),
        title: title.to_string(),
        category,
        description: description.to_string(),
        duration_minutes,
        config: config
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect::<BTreeMap<_, _>>(),
        confidence: None,
    }
}

/// The built-in baseline workflow.
#[must_use]
pub fn baseline_template() -> WorkflowTemplate {
    use ConfigValue::{Flag, Number, Text};

    WorkflowTemplate {
        persona: "Solo creator coaching ambitious 25-34 year olds on building a faceless \
                  Instagram brand with AI tools, posting five reels a week."
            .to_string(),
        hook: "I automated my entire content week in 20 minutes and my reach tripled."
            .to_string(),
        content_format: ContentFormat::Reels,
        target_channels: TargetChannels::from(vec![
            Channel::Instagram,
            Channel::Youtube,
            Channel::Facebook,
            Channel::Threads,
            Channel::Pinterest,
        ]),
        steps: vec![
            step(
                "audience-mining",
                "Audience Pain Mining",
                StepCategory::Ideation,
                "Scrape top comments and saves from niche leaders to surface recurring pains.",
                15,
                &[
                    ("sources", Number(12.0)),
                    ("sentimentFilter", Text("frustrated".into())),
                ],
            ),
            step(
                "hook-lab",
                "Hook Lab",
                StepCategory::Ideation,
                "Generate and rank opening lines against retention benchmarks.",
                10,
                &[("variants", Number(20.0)), ("maxWords", Number(12.0))],
            ),
            step(
                "script-expansion",
                "Script Expansion",
                StepCategory::Production,
                "Expand the winning hook into a 35-second script with pattern interrupts.",
                20,
                &[
                    ("targetSeconds", Number(35.0)),
                    ("tone", Text("confessional".into())),
                ],
            ),
            step(
                "asset-production",
                "Asset Production",
                StepCategory::Production,
                "Assemble b-roll, captions and voiceover into a vertical master cut.",
                45,
                &[
                    ("aspectRatio", Text("9:16".into())),
                    ("burnedCaptions", Flag(true)),
                ],
            ),
            step(
                "atomize-variants",
                "Atomize Variants",
                StepCategory::Repurpose,
                "Cut the master into channel-native variants with copy tuned per platform.",
                25,
                &[("variantsPerChannel", Number(2.0)), ("carousel", Flag(true))],
            ),
            step(
                "autopost-queue",
                "Autopost Queue",
                StepCategory::Distribution,
                "Schedule every variant at each channel's peak window.",
                5,
                &[
                    ("staggerMinutes", Number(30.0)),
                    ("timezone", Text("America/New_York".into())),
                ],
            ),
            step(
                "retention-loop",
                "Retention Loop",
                StepCategory::Optimize,
                "Compare 48h retention curves and feed winners back into the hook lab.",
                10,
                &[
                    ("reviewAfterHours", Number(48.0)),
                    ("autoRecycle", Flag(false)),
                ],
            ),
        ],
    }
}
