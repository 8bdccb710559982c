use chrono::{DateTime, Duration, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use crate::alert::format::{alert_message, format_timestamp};
use crate::alert::rules::{AlertLevel, Thresholds};
use crate::metrics::Assessment;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum AlertDecision {
    NoAlert,
    Suppressed { level: AlertLevel },
    Dispatch { level: AlertLevel, payload: String },
}

impl AlertDecision {
    pub fn level(&self) -> AlertLevel {
        match self {
            Self::NoAlert => AlertLevel::Normal,
            Self::Suppressed { level } | Self::Dispatch { level, .. } => *level,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AlertPolicy {
    pub thresholds: Thresholds,
    pub cooldown: Duration,
    pub utc_offset: FixedOffset,
}

impl AlertPolicy {
    pub fn new(thresholds: Thresholds, cooldown: Duration, utc_offset: FixedOffset) -> Self {
        Self {
            thresholds,
            cooldown,
            utc_offset,
        }
    }

    /// Pure decision for one entity. The caller owns recording `now` as the
    /// last alert time when this returns `Dispatch`.
    pub fn evaluate(
        &self,
        assessment: &Assessment,
        last_alert_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> AlertDecision {
        let level = self.thresholds.classify(assessment.utilization_percent);
        if level == AlertLevel::Normal {
            return AlertDecision::NoAlert;
        }
        if let Some(last) = last_alert_at {
            if now.signed_duration_since(last) < self.cooldown {
                return AlertDecision::Suppressed { level };
            }
        }
        let timestamp = format_timestamp(now, self.utc_offset);
        AlertDecision::Dispatch {
            level,
            payload: alert_message(level, assessment, &timestamp),
        }
    }
}
