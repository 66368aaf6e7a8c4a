//! Daily batch scheduler
//!
//! Ticks on a coarse interval and, once per calendar day after the
//! configured hour, runs the full reconciliation batch for yesterday.
//! Batch failures are logged and never stop the loop.

use crate::{
    engine::{BatchSummary, ReconciliationEngine},
    error::{Error, Result},
};
use chrono::{DateTime, Datelike, Timelike, Utc};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tokio::time::Duration;

/// Scheduler settings
#[derive(Debug, Clone, Copy)]
pub struct SchedulerConfig {
    /// Whether the background loop runs at all
    pub enabled: bool,

    /// UTC hour after which the daily run becomes due
    pub run_hour: u32,

    /// Seconds between due-checks
    pub check_interval_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            run_hour: 2,
            check_interval_secs: 60,
        }
    }
}

impl SchedulerConfig {
    /// Load settings from environment variables, falling back to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("RECONCILIATION_ENABLED") {
            config.enabled = val
                .parse()
                .map_err(|_| Error::Config(format!("invalid RECONCILIATION_ENABLED: {val}")))?;
        }
        if let Ok(val) = std::env::var("RECONCILIATION_RUN_HOUR") {
            config.run_hour = val
                .parse()
                .map_err(|_| Error::Config(format!("invalid RECONCILIATION_RUN_HOUR: {val}")))?;
        }
        if let Ok(val) = std::env::var("RECONCILIATION_CHECK_INTERVAL_SECS") {
            config.check_interval_secs = val.parse().map_err(|_| {
                Error::Config(format!("invalid RECONCILIATION_CHECK_INTERVAL_SECS: {val}"))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the loop cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.run_hour > 23 {
            return Err(Error::Config(format!(
                "run_hour must be 0..=23, got {}",
                self.run_hour
            )));
        }
        if self.check_interval_secs == 0 {
            return Err(Error::Config(
                "check_interval_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Sentinel for a scheduler that has not run yet
const NEVER_RAN: i64 = i64::MIN;

/// Background loop driving the daily reconciliation batch
pub struct ReconciliationScheduler {
    engine: Arc<ReconciliationEngine>,
    config: SchedulerConfig,
    /// Day ordinal (`num_days_from_ce`) of the last run
    last_run: AtomicI64,
}

impl ReconciliationScheduler {
    /// Create a scheduler over the shared engine
    pub fn new(engine: Arc<ReconciliationEngine>, config: SchedulerConfig) -> Self {
        Self {
            engine,
            config,
            last_run: AtomicI64::new(NEVER_RAN),
        }
    }

    /// Spawn the background loop
    pub fn start(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            if !self.config.enabled {
                tracing::info!("Reconciliation scheduler disabled");
                return;
            }
            tracing::info!(
                run_hour = self.config.run_hour,
                interval_secs = self.config.check_interval_secs,
                "Reconciliation scheduler started"
            );

            let mut ticker =
                tokio::time::interval(Duration::from_secs(self.config.check_interval_secs));
            loop {
                ticker.tick().await;
                self.run_if_due(Utc::now());
            }
        })
    }

    /// Run the batch when due at `now`; at most one run per calendar day
    pub fn run_if_due(&self, now: DateTime<Utc>) -> Option<BatchSummary> {
        let today = now.date_naive();
        if now.hour() < self.config.run_hour {
            return None;
        }

        // The swap claims today's run; later ticks the same day back off
        let today_ordinal = i64::from(today.num_days_from_ce());
        if self.last_run.swap(today_ordinal, Ordering::AcqRel) == today_ordinal {
            return None;
        }

        let yesterday = today - chrono::Days::new(1);
        tracing::info!(date = %yesterday, "Scheduled reconciliation run");
        Some(self.engine.reconcile_all(yesterday))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog::Catalog;
    use ledger::{BalanceLedger, Config, InventoryLedger};
    use orders::OrderEngine;

    fn scheduler(config: SchedulerConfig) -> ReconciliationScheduler {
        let ledger_config = Config::default();
        let catalog = Arc::new(Catalog::new());
        let balances = Arc::new(BalanceLedger::new(&ledger_config));
        let inventory = Arc::new(InventoryLedger::new(&ledger_config));
        let orders = Arc::new(OrderEngine::new(
            catalog.clone(),
            balances.clone(),
            inventory,
        ));
        let engine = Arc::new(ReconciliationEngine::new(catalog, balances, orders));
        ReconciliationScheduler::new(engine, config)
    }

    fn at_hour(hour: u32) -> DateTime<Utc> {
        Utc::now()
            .date_naive()
            .and_hms_opt(hour, 30, 0)
            .unwrap()
            .and_utc()
    }

    #[test]
    fn test_not_due_before_run_hour() {
        let sched = scheduler(SchedulerConfig::default());
        assert!(sched.run_if_due(at_hour(1)).is_none());
    }

    #[test]
    fn test_runs_once_per_day() {
        let sched = scheduler(SchedulerConfig::default());

        let summary = sched.run_if_due(at_hour(2)).unwrap();
        assert_eq!(
            summary.report_date,
            Utc::now().date_naive() - chrono::Days::new(1)
        );

        // Later ticks the same day are no-ops
        assert!(sched.run_if_due(at_hour(3)).is_none());
        assert!(sched.run_if_due(at_hour(23)).is_none());
    }

    #[test]
    fn test_validate_rejects_bad_settings() {
        let mut config = SchedulerConfig::default();
        config.run_hour = 24;
        assert!(config.validate().is_err());

        let mut config = SchedulerConfig::default();
        config.check_interval_secs = 0;
        assert!(config.validate().is_err());
    }
}
