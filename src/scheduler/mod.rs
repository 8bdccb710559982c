//! Drives the polling loop, the daily digest and the one-shot cycles the CLI
//! exposes. Per-entity failures are logged and isolated; nothing fetched or
//! delivered during steady state can stop the loops.

pub mod digest;

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, FixedOffset, Utc};
use futures::future::join_all;
use serde::Serialize;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::alert::cooldown::CooldownStore;
use crate::alert::engine::{AlertDecision, AlertPolicy};
use crate::alert::format::{digest_message, format_timestamp};
use crate::alert::rules::AlertLevel;
use crate::alert::sink::Notifier;
use crate::config::{Config, TrackedEntity};
use crate::errors::{ConfigError, FetchError};
use crate::metrics::normalize::assess;
use crate::metrics::Assessment;
use crate::sources::SourceRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    Startup,
    Poll,
    Digest,
    Manual,
}

#[derive(Debug, Clone, Copy)]
pub struct MonitorSettings {
    pub poll_interval: Duration,
    pub fetch_timeout: Duration,
    pub digest_hour: u32,
    pub utc_offset: FixedOffset,
}

impl MonitorSettings {
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let utc_offset = config.utc_offset().ok_or_else(|| {
            ConfigError::Invalid(format!(
                "schedule.utc_offset_minutes out of range: {}",
                config.schedule.utc_offset_minutes
            ))
        })?;
        Ok(Self {
            poll_interval: Duration::from_secs(config.schedule.poll_interval_secs.max(1)),
            fetch_timeout: Duration::from_secs(config.schedule.fetch_timeout_secs.max(1)),
            digest_hour: config.schedule.digest_hour,
            utc_offset,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EntityFailure {
    pub entity_id: String,
    pub display_name: String,
    pub reason: String,
}

/// Readings gathered in one trigger. Order follows the configured entities.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Collected {
    pub assessments: Vec<Assessment>,
    pub failures: Vec<EntityFailure>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Delivery {
    pub delivered: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct EntityDecision {
    pub entity_id: String,
    #[serde(flatten)]
    pub decision: AlertDecision,
}

#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub trigger: Trigger,
    pub started_at: DateTime<Utc>,
    pub assessments: Vec<Assessment>,
    pub failures: Vec<EntityFailure>,
    pub decisions: Vec<EntityDecision>,
    pub delivery: Delivery,
}

impl CycleReport {
    pub fn dispatched(&self) -> usize {
        self.decisions
            .iter()
            .filter(|d| matches!(d.decision, AlertDecision::Dispatch { .. }))
            .count()
    }
}

pub struct Scheduler {
    entities: Vec<TrackedEntity>,
    registry: SourceRegistry,
    notifiers: Vec<Arc<dyn Notifier>>,
    cooldowns: Arc<CooldownStore>,
    policy: AlertPolicy,
    settings: MonitorSettings,
}

impl Scheduler {
    pub fn new(
        entities: Vec<TrackedEntity>,
        registry: SourceRegistry,
        notifiers: Vec<Arc<dyn Notifier>>,
        policy: AlertPolicy,
        settings: MonitorSettings,
    ) -> Self {
        Self {
            entities,
            registry,
            notifiers,
            cooldowns: Arc::new(CooldownStore::new()),
            policy,
            settings,
        }
    }

    pub fn from_config(
        config: &Config,
        registry: SourceRegistry,
        notifiers: Vec<Arc<dyn Notifier>>,
    ) -> Result<Self, ConfigError> {
        let settings = MonitorSettings::from_config(config)?;
        let cooldown = config.cooldown().ok_or_else(|| {
            ConfigError::Invalid(format!(
                "alerts.cooldown_secs out of range: {}",
                config.alerts.cooldown_secs
            ))
        })?;
        let policy = AlertPolicy::new(config.alerts.thresholds, cooldown, settings.utc_offset);
        Ok(Self::new(
            config.entities.clone(),
            registry,
            notifiers,
            policy,
            settings,
        ))
    }

    pub fn cooldowns(&self) -> &CooldownStore {
        &self.cooldowns
    }

    /// Fetch and assess every entity concurrently. A failed entity lands in
    /// `failures` and never affects the others.
    pub async fn collect(&self) -> Collected {
        let timeout = self.settings.fetch_timeout;
        let results = join_all(self.entities.iter().map(|entity| async move {
            let outcome = self
                .registry
                .fetch(entity, timeout)
                .await
                .and_then(|reading| assess(reading).map_err(FetchError::from));
            (entity, outcome)
        }))
        .await;

        let mut collected = Collected::default();
        for (entity, outcome) in results {
            match outcome {
                Ok(assessment) => {
                    info!(
                        entity = %entity.id,
                        utilization = %assessment.utilization_percent.round_dp(2),
                        apy = %assessment.reading.supply_apy_percent.round_dp(2),
                        "assessed"
                    );
                    collected.assessments.push(assessment);
                }
                Err(err) => {
                    warn!(entity = %entity.id, "fetch failed: {err}");
                    collected.failures.push(EntityFailure {
                        entity_id: entity.id.clone(),
                        display_name: entity.name.clone(),
                        reason: err.to_string(),
                    });
                }
            }
        }
        collected
    }

    /// Send `text` to every notifier. Failures are warnings, never retried.
    pub async fn dispatch(&self, text: &str) -> Delivery {
        let mut delivery = Delivery::default();
        for notifier in &self.notifiers {
            match notifier.send(text).await {
                Ok(()) => delivery.delivered += 1,
                Err(err) => {
                    delivery.failed += 1;
                    warn!(sink = notifier.name(), "failed sending notification: {err}");
                }
            }
        }
        delivery
    }

    pub async fn run_alert_cycle(&self, trigger: Trigger) -> CycleReport {
        self.run_alert_cycle_at(trigger, Utc::now()).await
    }

    /// Fetch, classify and alert. Cooldown state is committed before the
    /// payload is handed to the notifiers.
    pub async fn run_alert_cycle_at(&self, trigger: Trigger, now: DateTime<Utc>) -> CycleReport {
        let collected = self.collect().await;
        let mut decisions = Vec::with_capacity(collected.assessments.len());
        let mut delivery = Delivery::default();

        for assessment in &collected.assessments {
            let entity_id = &assessment.reading.entity_id;
            let decision = self.cooldowns.evaluate(&self.policy, assessment, now);
            match &decision {
                AlertDecision::Dispatch { level, payload } => {
                    let utilization = assessment.utilization_percent.round_dp(2);
                    if *level == AlertLevel::Critical {
                        error!(entity = %entity_id, %level, %utilization, "dispatching alert");
                    } else {
                        warn!(entity = %entity_id, %level, %utilization, "dispatching alert");
                    }
                    let sent = self.dispatch(payload).await;
                    delivery.delivered += sent.delivered;
                    delivery.failed += sent.failed;
                }
                AlertDecision::Suppressed { level } => {
                    info!(entity = %entity_id, %level, "alert suppressed by cooldown");
                }
                AlertDecision::NoAlert => {
                    debug!(entity = %entity_id, "within thresholds");
                }
            }
            decisions.push(EntityDecision {
                entity_id: entity_id.clone(),
                decision,
            });
        }

        CycleReport {
            trigger,
            started_at: now,
            assessments: collected.assessments,
            failures: collected.failures,
            decisions,
            delivery,
        }
    }

    pub async fn run_digest(&self) -> CycleReport {
        self.run_digest_at(Utc::now()).await
    }

    /// Build the combined summary and always send it, whatever the levels
    /// and even when every fetch failed.
    pub async fn run_digest_at(&self, now: DateTime<Utc>) -> CycleReport {
        let collected = self.collect().await;
        let message = self.digest_text(&collected, now);
        let delivery = self.dispatch(&message).await;
        info!(
            entities = collected.assessments.len(),
            failures = collected.failures.len(),
            delivered = delivery.delivered,
            "daily digest sent"
        );
        CycleReport {
            trigger: Trigger::Digest,
            started_at: now,
            assessments: collected.assessments,
            failures: collected.failures,
            decisions: Vec::new(),
            delivery,
        }
    }

    pub fn digest_text(&self, collected: &Collected, now: DateTime<Utc>) -> String {
        let failures: Vec<(String, String)> = collected
            .failures
            .iter()
            .map(|f| (f.display_name.clone(), f.reason.clone()))
            .collect();
        digest_message(
            &collected.assessments,
            &failures,
            &self.policy.thresholds,
            &format_timestamp(now, self.settings.utc_offset),
        )
    }

    /// Immediate cycle, then one per poll interval. A cycle that overruns the
    /// interval causes the missed ticks to be skipped, never queued.
    pub async fn poll_loop(&self) {
        let mut ticker = tokio::time::interval(self.settings.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut trigger = Trigger::Startup;
        loop {
            ticker.tick().await;
            let report = self.run_alert_cycle(trigger).await;
            info!(
                trigger = ?report.trigger,
                ok = report.assessments.len(),
                failed = report.failures.len(),
                alerts = report.dispatched(),
                "cycle complete"
            );
            trigger = Trigger::Poll;
        }
    }

    /// Sleep until the next local `digest_hour:00`, send, then reschedule.
    pub async fn digest_loop(&self) {
        let mut last_fired: Option<DateTime<Utc>> = None;
        loop {
            let now = Utc::now();
            let Some(next) = digest::next_digest_after(
                now,
                last_fired,
                self.settings.digest_hour,
                self.settings.utc_offset,
            ) else {
                error!(hour = self.settings.digest_hour, "no valid digest time, digest disabled");
                return std::future::pending().await;
            };
            info!(
                next = %format_timestamp(next, self.settings.utc_offset),
                "next daily digest scheduled"
            );
            tokio::time::sleep(digest::until(next, now)).await;
            self.run_digest_at(next).await;
            last_fired = Some(next);
        }
    }

    /// Run both loops until Ctrl-C.
    pub async fn run(&self) {
        info!(
            entities = self.entities.len(),
            sinks = self.notifiers.len(),
            poll_secs = self.settings.poll_interval.as_secs(),
            digest_hour = self.settings.digest_hour,
            "monitor started"
        );
        tokio::select! {
            _ = self.poll_loop() => {}
            _ = self.digest_loop() => {}
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown requested");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::{Duration as ChronoDuration, TimeZone};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::alert::rules::Thresholds;
    use crate::config::{AdapterConfig, SourceKind};
    use crate::errors::NotifyError;
    use crate::metrics::{EntityKind, Reading};
    use crate::sources::SourceAdapter;

    /// Serves canned utilization per entity id; unknown ids fail.
    struct FixedSource {
        utilization: Mutex<Vec<(String, Decimal)>>,
    }

    impl FixedSource {
        fn new(values: &[(&str, Decimal)]) -> Self {
            Self {
                utilization: Mutex::new(
                    values
                        .iter()
                        .map(|(id, value)| (id.to_string(), *value))
                        .collect(),
                ),
            }
        }

        fn set(&self, id: &str, value: Decimal) {
            let mut guard = self.utilization.lock().expect("lock");
            if let Some(entry) = guard.iter_mut().find(|(known, _)| known == id) {
                entry.1 = value;
            }
        }
    }

    #[async_trait]
    impl SourceAdapter for FixedSource {
        fn kind(&self) -> SourceKind {
            SourceKind::Morpho
        }

        async fn fetch(&self, entity: &TrackedEntity) -> Result<Reading, FetchError> {
            let value = self
                .utilization
                .lock()
                .expect("lock")
                .iter()
                .find(|(id, _)| *id == entity.id)
                .map(|(_, value)| *value)
                .ok_or_else(|| FetchError::Missing(format!("no data for {}", entity.id)))?;
            Ok(
                Reading::new(entity.id.clone(), entity.name.clone(), EntityKind::Vault)
                    .with_liquidity(dec!(100), dec!(100) - value, value)
                    .with_apy(dec!(4.2)),
            )
        }
    }

    struct SlowSource;

    #[async_trait]
    impl SourceAdapter for SlowSource {
        fn kind(&self) -> SourceKind {
            SourceKind::Aave
        }

        async fn fetch(&self, _entity: &TrackedEntity) -> Result<Reading, FetchError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Err(FetchError::Missing("unreachable".to_string()))
        }
    }

    /// An empty reserve: nothing supplied, nothing borrowed.
    struct EmptyReserveSource;

    #[async_trait]
    impl SourceAdapter for EmptyReserveSource {
        fn kind(&self) -> SourceKind {
            SourceKind::Aave
        }

        async fn fetch(&self, entity: &TrackedEntity) -> Result<Reading, FetchError> {
            Ok(Reading::new(entity.id.clone(), entity.name.clone(), EntityKind::Reserve))
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        messages: Mutex<Vec<String>>,
    }

    impl RecordingSink {
        fn messages(&self) -> Vec<String> {
            self.messages.lock().expect("lock").clone()
        }
    }

    #[async_trait]
    impl Notifier for RecordingSink {
        fn name(&self) -> &'static str {
            "recording"
        }

        async fn send(&self, text: &str) -> Result<(), NotifyError> {
            self.messages.lock().expect("lock").push(text.to_string());
            Ok(())
        }
    }

    struct FailingSink;

    #[async_trait]
    impl Notifier for FailingSink {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn send(&self, _text: &str) -> Result<(), NotifyError> {
            Err(NotifyError::Telegram("chat not found".to_string()))
        }
    }

    fn vault(id: &str) -> TrackedEntity {
        TrackedEntity {
            id: id.to_string(),
            name: format!("Vault {id}"),
            adapter: AdapterConfig::Morpho {
                vault: "0xeE8F4eC5672F09119b96Ab6fB59C27E1b7e44b61".to_string(),
                chain_id: 8453,
                decimals: 6,
            },
        }
    }

    fn reserve(id: &str) -> TrackedEntity {
        TrackedEntity {
            id: id.to_string(),
            name: format!("Reserve {id}"),
            adapter: AdapterConfig::Aave {
                pool: "0x87870Bca3F3fD6335C3F4ce8392D69350B4fA4E2".to_string(),
                asset: "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48".to_string(),
                decimals: Some(6),
            },
        }
    }

    fn settings() -> MonitorSettings {
        MonitorSettings {
            poll_interval: Duration::from_secs(600),
            fetch_timeout: Duration::from_millis(50),
            digest_hour: 9,
            utc_offset: FixedOffset::east_opt(8 * 3600).expect("offset"),
        }
    }

    fn scheduler(
        entities: Vec<TrackedEntity>,
        registry: SourceRegistry,
        notifiers: Vec<Arc<dyn Notifier>>,
    ) -> Scheduler {
        let settings = settings();
        let policy = AlertPolicy::new(
            Thresholds::default(),
            ChronoDuration::hours(1),
            settings.utc_offset,
        );
        Scheduler::new(entities, registry, notifiers, policy, settings)
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 2, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn failed_entity_does_not_block_others() {
        let source = Arc::new(FixedSource::new(&[("a", dec!(50))]));
        let registry = SourceRegistry::new().with_adapter(source);
        let sched = scheduler(vec![vault("a"), vault("missing")], registry, Vec::new());

        let collected = sched.collect().await;
        assert_eq!(collected.assessments.len(), 1);
        assert_eq!(collected.assessments[0].reading.entity_id, "a");
        assert_eq!(collected.failures.len(), 1);
        assert_eq!(collected.failures[0].entity_id, "missing");
    }

    #[tokio::test]
    async fn entity_without_adapter_is_a_failure() {
        let source = Arc::new(FixedSource::new(&[("a", dec!(50))]));
        let registry = SourceRegistry::new().with_adapter(source);
        let sched = scheduler(vec![vault("a"), reserve("r")], registry, Vec::new());

        let collected = sched.collect().await;
        assert_eq!(collected.assessments.len(), 1);
        assert!(collected.failures[0].reason.contains("aave"));
    }

    #[tokio::test]
    async fn slow_adapter_times_out() {
        let registry = SourceRegistry::new()
            .with_adapter(Arc::new(SlowSource))
            .with_adapter(Arc::new(FixedSource::new(&[("a", dec!(10))])));
        let sched = scheduler(vec![reserve("slow"), vault("a")], registry, Vec::new());

        let collected = sched.collect().await;
        assert_eq!(collected.assessments.len(), 1);
        assert_eq!(collected.failures[0].entity_id, "slow");
        assert!(collected.failures[0].reason.contains("timed out"));
    }

    #[tokio::test]
    async fn alerts_respect_cooldown() {
        let source = Arc::new(FixedSource::new(&[("a", dec!(91))]));
        let registry = SourceRegistry::new().with_adapter(source.clone());
        let sink = Arc::new(RecordingSink::default());
        let notifiers: Vec<Arc<dyn Notifier>> = vec![sink.clone()];
        let sched = scheduler(vec![vault("a")], registry, notifiers);

        let first = sched.run_alert_cycle_at(Trigger::Startup, t0()).await;
        assert_eq!(first.dispatched(), 1);
        assert_eq!(first.decisions[0].decision.level(), AlertLevel::Warning);

        // escalation inside the window is still suppressed
        source.set("a", dec!(97));
        let second = sched
            .run_alert_cycle_at(Trigger::Poll, t0() + ChronoDuration::minutes(10))
            .await;
        assert_eq!(second.dispatched(), 0);
        assert_eq!(
            second.decisions[0].decision,
            AlertDecision::Suppressed {
                level: AlertLevel::Critical
            }
        );

        let third = sched
            .run_alert_cycle_at(Trigger::Poll, t0() + ChronoDuration::minutes(61))
            .await;
        assert_eq!(third.dispatched(), 1);
        let messages = sink.messages();
        assert_eq!(messages.len(), 2);
        assert!(messages[0].contains("WARNING"));
        assert!(messages[1].contains("CRITICAL"));
    }

    #[tokio::test]
    async fn failed_entity_does_not_block_alerts_for_others() {
        let source = Arc::new(FixedSource::new(&[("hot", dec!(96))]));
        let registry = SourceRegistry::new().with_adapter(source);
        let sink = Arc::new(RecordingSink::default());
        let notifiers: Vec<Arc<dyn Notifier>> = vec![sink.clone()];
        let sched = scheduler(vec![vault("broken"), vault("hot")], registry, notifiers);

        let report = sched.run_alert_cycle_at(Trigger::Poll, t0()).await;
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].entity_id, "broken");
        assert_eq!(report.dispatched(), 1);
        assert_eq!(report.decisions[0].entity_id, "hot");
        assert_eq!(report.decisions[0].decision.level(), AlertLevel::Critical);
        let messages = sink.messages();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("CRITICAL"));
        assert!(messages[0].contains("Vault hot"));
    }

    #[tokio::test]
    async fn empty_reserve_is_normal_and_silent() {
        let registry = SourceRegistry::new().with_adapter(Arc::new(EmptyReserveSource));
        let sink = Arc::new(RecordingSink::default());
        let notifiers: Vec<Arc<dyn Notifier>> = vec![sink.clone()];
        let sched = scheduler(vec![reserve("empty")], registry, notifiers);

        let report = sched.run_alert_cycle_at(Trigger::Poll, t0()).await;
        assert!(report.failures.is_empty());
        assert_eq!(report.assessments[0].utilization_percent, Decimal::ZERO);
        assert_eq!(report.decisions[0].decision, AlertDecision::NoAlert);
        assert!(sink.messages().is_empty());
    }

    #[tokio::test]
    async fn normal_readings_send_nothing() {
        let source = Arc::new(FixedSource::new(&[("a", dec!(90))]));
        let registry = SourceRegistry::new().with_adapter(source);
        let sink = Arc::new(RecordingSink::default());
        let notifiers: Vec<Arc<dyn Notifier>> = vec![sink.clone()];
        let sched = scheduler(vec![vault("a")], registry, notifiers);

        let report = sched.run_alert_cycle_at(Trigger::Poll, t0()).await;
        assert_eq!(report.decisions[0].decision, AlertDecision::NoAlert);
        assert!(sink.messages().is_empty());
        assert!(sched.cooldowns().get("a").and_then(|e| e.last_alert_at).is_none());
    }

    #[tokio::test]
    async fn failed_delivery_still_starts_cooldown() {
        let source = Arc::new(FixedSource::new(&[("a", dec!(99))]));
        let registry = SourceRegistry::new().with_adapter(source);
        let recorder = Arc::new(RecordingSink::default());
        let notifiers: Vec<Arc<dyn Notifier>> = vec![Arc::new(FailingSink), recorder.clone()];
        let sched = scheduler(vec![vault("a")], registry, notifiers);

        let report = sched.run_alert_cycle_at(Trigger::Poll, t0()).await;
        assert_eq!(report.delivery, Delivery { delivered: 1, failed: 1 });
        assert_eq!(recorder.messages().len(), 1);
        let entry = sched.cooldowns().get("a").expect("entry");
        assert_eq!(entry.last_alert_at, Some(t0()));
    }

    #[tokio::test]
    async fn digest_is_sent_when_everything_is_normal() {
        let source = Arc::new(FixedSource::new(&[("a", dec!(20)), ("b", dec!(30))]));
        let registry = SourceRegistry::new().with_adapter(source);
        let sink = Arc::new(RecordingSink::default());
        let notifiers: Vec<Arc<dyn Notifier>> = vec![sink.clone()];
        let sched = scheduler(vec![vault("a"), vault("b")], registry, notifiers);

        let report = sched.run_digest_at(t0()).await;
        assert_eq!(report.trigger, Trigger::Digest);
        assert_eq!(report.delivery.delivered, 1);
        let messages = sink.messages();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("Vault a"));
        assert!(messages[0].contains("Vault b"));
        // digest never touches cooldown state
        assert!(sched.cooldowns().is_empty());
    }

    #[tokio::test]
    async fn digest_bypasses_cooldown() {
        let source = Arc::new(FixedSource::new(&[("a", dec!(99))]));
        let registry = SourceRegistry::new().with_adapter(source);
        let sink = Arc::new(RecordingSink::default());
        let notifiers: Vec<Arc<dyn Notifier>> = vec![sink.clone()];
        let sched = scheduler(vec![vault("a")], registry, notifiers);

        sched.run_alert_cycle_at(Trigger::Poll, t0()).await;
        sched.run_digest_at(t0() + ChronoDuration::minutes(1)).await;
        assert_eq!(sink.messages().len(), 2);
    }

    #[tokio::test]
    async fn digest_is_sent_when_every_fetch_fails() {
        let registry = SourceRegistry::new();
        let sink = Arc::new(RecordingSink::default());
        let notifiers: Vec<Arc<dyn Notifier>> = vec![sink.clone()];
        let sched = scheduler(vec![vault("a")], registry, notifiers);

        let report = sched.run_digest_at(t0()).await;
        assert!(report.assessments.is_empty());
        assert_eq!(report.failures.len(), 1);
        let messages = sink.messages();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("Unavailable"));
    }

    #[test]
    fn settings_follow_config() {
        let config = Config::default();
        let settings = MonitorSettings::from_config(&config).expect("settings");
        assert_eq!(settings.poll_interval, Duration::from_secs(600));
        assert_eq!(settings.fetch_timeout, Duration::from_secs(30));
        assert_eq!(settings.utc_offset.local_minus_utc(), 8 * 3600);
    }
}
