//! Spend protection for the companion chat service
//!
//! Keeps day/week/month running totals of model spend in memory, answers
//! admission checks before a request and accumulates actual cost after one.
//! State is not persisted: a restart starts every window from zero.

pub mod clock;
pub mod cost;
pub mod tracker;

use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

pub use clock::{Clock, ManualClock, SystemClock};
pub use cost::{calculate_cost, CostBreakdown, TokenUsage};
pub use tracker::{
    AlertLevel, BudgetAlert, BudgetDecision, BudgetLimits, BudgetStatus, BudgetTracker,
    BudgetWindow, WindowStatus,
};

/// Estimate used when the caller does not supply one
pub const DEFAULT_ESTIMATED_COST: f64 = 0.001;

/// Shared budget service
pub struct BudgetProtection {
    tracker: Mutex<BudgetTracker>,
    clock: Arc<dyn Clock>,
}

impl BudgetProtection {
    pub fn new(limits: BudgetLimits) -> Self {
        Self::with_clock(limits, Arc::new(SystemClock))
    }

    pub fn with_clock(limits: BudgetLimits, clock: Arc<dyn Clock>) -> Self {
        let tracker = BudgetTracker::new(limits, clock.now());
        Self {
            tracker: Mutex::new(tracker),
            clock,
        }
    }

    pub async fn limits(&self) -> BudgetLimits {
        self.tracker.lock().await.limits()
    }

    pub fn calculate_cost(&self, usage: &TokenUsage) -> CostBreakdown {
        calculate_cost(usage)
    }

    pub async fn check_and_reset(&self) {
        let now = self.clock.now();
        self.tracker.lock().await.check_and_reset(now);
    }

    pub async fn can_make_request(&self, estimated_cost: Option<f64>) -> BudgetDecision {
        let estimate = estimated_cost.unwrap_or(DEFAULT_ESTIMATED_COST);
        let now = self.clock.now();
        let decision = self.tracker.lock().await.can_make_request(estimate, now);

        if !decision.allowed {
            warn!(
                reason = decision.reason.as_deref().unwrap_or_default(),
                estimate,
                "Request refused by budget"
            );
        }
        decision
    }

    /// Record the actual cost of a completed request
    pub async fn track_usage(
        &self,
        device_id: Option<&str>,
        cost: &CostBreakdown,
    ) -> Vec<BudgetAlert> {
        let now = self.clock.now();
        let mut tracker = self.tracker.lock().await;
        let alerts = tracker.track(cost.dollar_cost, now);

        info!(
            device_id = %mask_device_id(device_id),
            input_tokens = cost.input_tokens,
            output_tokens = cost.output_tokens,
            quota = cost.quota_consumed,
            cost = cost.dollar_cost,
            daily_spent = tracker.spent(BudgetWindow::Daily),
            weekly_spent = tracker.spent(BudgetWindow::Weekly),
            monthly_spent = tracker.spent(BudgetWindow::Monthly),
            "Usage tracked"
        );
        drop(tracker);

        for alert in &alerts {
            warn!(
                level = ?alert.level,
                spent = alert.spent,
                limit = alert.limit,
                "Budget alert: {}",
                alert.message
            );
        }
        alerts
    }

    pub async fn status(&self) -> BudgetStatus {
        let now = self.clock.now();
        self.tracker.lock().await.status(now)
    }

    /// Zero all totals
    pub async fn reset(&self) {
        let now = self.clock.now();
        self.tracker.lock().await.reset(now);
        info!("Budget totals reset");
    }
}

/// First 8 characters of a device id followed by `***`
pub fn mask_device_id(device_id: Option<&str>) -> String {
    match device_id {
        Some(id) if !id.is_empty() => {
            let prefix: String = id.chars().take(8).collect();
            format!("{prefix}***")
        }
        _ => "unknown".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn service() -> (Arc<ManualClock>, BudgetProtection) {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 2, 10, 8, 0, 0).unwrap(),
        ));
        let budget = BudgetProtection::with_clock(BudgetLimits::default(), clock.clone());
        (clock, budget)
    }

    #[test]
    fn test_mask_device_id() {
        assert_eq!(mask_device_id(Some("abcdef1234567890")), "abcdef12***");
        assert_eq!(mask_device_id(Some("short")), "short***");
        assert_eq!(mask_device_id(Some("")), "unknown");
        assert_eq!(mask_device_id(None), "unknown");
    }

    #[tokio::test]
    async fn test_track_then_refuse() {
        let (_, budget) = service();
        let cost = CostBreakdown {
            dollar_cost: 9.9995,
            ..Default::default()
        };
        budget.track_usage(Some("device-1"), &cost).await;

        let decision = budget.can_make_request(None).await;
        assert!(!decision.allowed);
        assert_eq!(decision.reason.as_deref(), Some("daily_budget_exceeded"));
    }

    #[tokio::test]
    async fn test_next_day_allows_again() {
        let (clock, budget) = service();
        let cost = CostBreakdown {
            dollar_cost: 10.0,
            ..Default::default()
        };
        budget.track_usage(None, &cost).await;
        assert!(!budget.can_make_request(Some(0.01)).await.allowed);

        clock.advance(Duration::days(1));
        assert!(budget.can_make_request(Some(0.01)).await.allowed);

        let status = budget.status().await;
        assert_eq!(status.daily.spent, 0.0);
        assert_eq!(status.weekly.spent, 10.0);
    }

    #[tokio::test]
    async fn test_check_and_reset_crosses_month() {
        let (clock, budget) = service();
        let cost = CostBreakdown {
            dollar_cost: 5.0,
            ..Default::default()
        };
        budget.track_usage(None, &cost).await;

        // Tuesday 10 Feb -> Monday 2 Mar
        clock.advance(Duration::days(20));
        budget.check_and_reset().await;

        let status = budget.status().await;
        assert_eq!(status.daily.spent, 0.0);
        assert_eq!(status.weekly.spent, 0.0);
        assert_eq!(status.monthly.spent, 0.0);
    }

    #[tokio::test]
    async fn test_reset_zeroes_everything() {
        let (_, budget) = service();
        let cost = CostBreakdown {
            dollar_cost: 40.0,
            ..Default::default()
        };
        let alerts = budget.track_usage(Some("abc"), &cost).await;
        assert!(alerts.iter().any(|a| a.level == AlertLevel::Critical));

        budget.reset().await;
        let status = budget.status().await;
        assert_eq!(status.daily.spent, 0.0);
        assert_eq!(status.monthly.spent, 0.0);
    }
}
