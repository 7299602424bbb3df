//! Writing metrics and the health report export port

use chrono::{DateTime, Utc};
use ethos_editor::{Activity, EditorEvent};
use serde::{Deserialize, Serialize};

use crate::error::ExportError;

/// Heuristic writing scores, shown in the sidebar and the health report
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub ai_risk: f64,
    pub originality: f64,
    pub academic_strength: f64,
    pub repetition: f64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self {
            ai_risk: 5.0,
            originality: 85.0,
            academic_strength: 70.0,
            repetition: 12.0,
        }
    }
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Update the scores for one unit of editor activity
    ///
    /// Pasted content raises the AI risk sharply, typing slowly earns it back.
    pub fn record(&mut self, activity: Activity) {
        match activity {
            Activity::Paste => {
                self.ai_risk = (self.ai_risk + 45.0).min(95.0);
                self.originality = (self.originality - 30.0).max(5.0);
            }
            Activity::Keystroke => {
                self.ai_risk = (self.ai_risk - 0.2).max(0.0);
                self.originality = (self.originality + 0.5).min(100.0);
            }
        }
    }

    /// Feed an editor event, ignoring everything but activity
    pub fn observe(&mut self, event: &EditorEvent) {
        if let EditorEvent::Activity(activity) = event {
            self.record(*activity);
        }
    }
}

/// Snapshot handed to a report exporter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    /// Serialized document tree
    pub content: String,
    pub metrics: Metrics,
    pub generated_at: DateTime<Utc>,
}

impl HealthReport {
    pub fn new(content: impl Into<String>, metrics: Metrics) -> Self {
        Self {
            content: content.into(),
            metrics,
            generated_at: Utc::now(),
        }
    }

    /// Rounded percentage pair shown on the report cards
    pub fn headline(&self) -> (u32, u32) {
        (
            self.metrics.ai_risk.round() as u32,
            self.metrics.originality.round() as u32,
        )
    }
}

/// Renders a health report somewhere outside the editor
pub trait ReportExporter {
    fn export(&mut self, report: &HealthReport) -> Result<(), ExportError>;
}
