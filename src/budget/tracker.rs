//! Running spend totals with calendar-aligned windows
//!
//! Windows are the UTC calendar day, the ISO week and the calendar month.
//! A window resets the first time it is touched after its marker changes.

use chrono::{DateTime, Datelike, IsoWeek, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

/// Warn once a window reaches this share of its limit
pub const WARNING_THRESHOLD: f64 = 0.7;
/// Critical once a window reaches this share of its limit
pub const CRITICAL_THRESHOLD: f64 = 0.9;

/// Spend limits in dollars
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BudgetLimits {
    pub daily: f64,
    pub weekly: f64,
    pub monthly: f64,
}

impl Default for BudgetLimits {
    fn default() -> Self {
        Self {
            daily: 10.0,
            weekly: 50.0,
            monthly: 150.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetWindow {
    Daily,
    Weekly,
    Monthly,
}

impl BudgetWindow {
    /// Check order for admission
    pub const ALL: [BudgetWindow; 3] = [
        BudgetWindow::Daily,
        BudgetWindow::Weekly,
        BudgetWindow::Monthly,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }

    fn slot(&self) -> usize {
        match self {
            Self::Daily => 0,
            Self::Weekly => 1,
            Self::Monthly => 2,
        }
    }
}

impl fmt::Display for BudgetWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Answer to "may the chat service spend this much?"
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetDecision {
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining: Option<f64>,
}

impl BudgetDecision {
    fn allow() -> Self {
        Self {
            allowed: true,
            reason: None,
            spent: None,
            limit: None,
            remaining: None,
        }
    }

    fn deny(window: BudgetWindow, spent: f64, limit: f64) -> Self {
        Self {
            allowed: false,
            reason: Some(format!("{window}_budget_exceeded")),
            spent: Some(spent),
            limit: Some(limit),
            remaining: Some(limit - spent),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlertLevel {
    Warning,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetAlert {
    pub level: AlertLevel,
    pub message: String,
    pub spent: f64,
    pub limit: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WindowStatus {
    pub spent: f64,
    pub limit: f64,
    pub remaining: f64,
    /// Percent of the limit used, one decimal
    pub percentage: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BudgetStatus {
    pub daily: WindowStatus,
    pub weekly: WindowStatus,
    pub monthly: WindowStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Markers {
    day: NaiveDate,
    week: IsoWeek,
    month: (i32, u32),
}

impl Markers {
    fn at(now: DateTime<Utc>) -> Self {
        Self {
            day: now.date_naive(),
            week: now.iso_week(),
            month: (now.year(), now.month()),
        }
    }
}

/// Totals and reset markers. Not thread-safe on its own.
#[derive(Debug, Clone)]
pub struct BudgetTracker {
    limits: BudgetLimits,
    spent: [f64; 3],
    markers: Markers,
}

impl BudgetTracker {
    pub fn new(limits: BudgetLimits, now: DateTime<Utc>) -> Self {
        Self {
            limits,
            spent: [0.0; 3],
            markers: Markers::at(now),
        }
    }

    pub fn limits(&self) -> BudgetLimits {
        self.limits
    }

    pub fn limit(&self, window: BudgetWindow) -> f64 {
        match window {
            BudgetWindow::Daily => self.limits.daily,
            BudgetWindow::Weekly => self.limits.weekly,
            BudgetWindow::Monthly => self.limits.monthly,
        }
    }

    pub fn spent(&self, window: BudgetWindow) -> f64 {
        self.spent[window.slot()]
    }

    /// Zero every window whose calendar marker has moved on
    pub fn check_and_reset(&mut self, now: DateTime<Utc>) {
        let current = Markers::at(now);

        if current.day != self.markers.day {
            self.reset_window(BudgetWindow::Daily);
        }
        if current.week != self.markers.week {
            self.reset_window(BudgetWindow::Weekly);
        }
        if current.month != self.markers.month {
            self.reset_window(BudgetWindow::Monthly);
        }

        self.markers = current;
    }

    fn reset_window(&mut self, window: BudgetWindow) {
        let slot = window.slot();
        info!(
            window = %window,
            spent = %format!("{:.4}", self.spent[slot]),
            "Budget window reset"
        );
        self.spent[slot] = 0.0;
    }

    /// First window (daily, weekly, monthly) the estimate would overrun
    pub fn can_make_request(&mut self, estimated_cost: f64, now: DateTime<Utc>) -> BudgetDecision {
        self.check_and_reset(now);

        for window in BudgetWindow::ALL {
            let spent = self.spent(window);
            let limit = self.limit(window);
            if spent + estimated_cost > limit {
                return BudgetDecision::deny(window, spent, limit);
            }
        }

        BudgetDecision::allow()
    }

    /// Add a cost to every window and report thresholds crossed
    pub fn track(&mut self, cost: f64, now: DateTime<Utc>) -> Vec<BudgetAlert> {
        self.check_and_reset(now);
        for total in self.spent.iter_mut() {
            *total += cost;
        }
        self.alerts()
    }

    pub fn alerts(&self) -> Vec<BudgetAlert> {
        BudgetWindow::ALL
            .into_iter()
            .filter_map(|window| {
                let spent = self.spent(window);
                let limit = self.limit(window);
                let share = spent / limit;

                let level = if share >= CRITICAL_THRESHOLD {
                    AlertLevel::Critical
                } else if share >= WARNING_THRESHOLD {
                    AlertLevel::Warning
                } else {
                    return None;
                };

                Some(BudgetAlert {
                    level,
                    message: format!("{window} budget at {:.1}%", share * 100.0),
                    spent,
                    limit,
                })
            })
            .collect()
    }

    pub fn status(&mut self, now: DateTime<Utc>) -> BudgetStatus {
        self.check_and_reset(now);
        BudgetStatus {
            daily: self.window_status(BudgetWindow::Daily),
            weekly: self.window_status(BudgetWindow::Weekly),
            monthly: self.window_status(BudgetWindow::Monthly),
        }
    }

    fn window_status(&self, window: BudgetWindow) -> WindowStatus {
        let spent = self.spent(window);
        let limit = self.limit(window);
        WindowStatus {
            spent,
            limit,
            remaining: limit - spent,
            percentage: (spent / limit * 1000.0).round() / 10.0,
        }
    }

    /// Zero all windows and restamp markers
    pub fn reset(&mut self, now: DateTime<Utc>) {
        self.spent = [0.0; 3];
        self.markers = Markers::at(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    // 2026-01-07 is a Wednesday
    fn tracker() -> BudgetTracker {
        BudgetTracker::new(BudgetLimits::default(), at(2026, 1, 7, 9))
    }

    #[test]
    fn test_daily_reset_keeps_week_and_month() {
        let mut t = tracker();
        t.track(2.0, at(2026, 1, 7, 10));
        t.check_and_reset(at(2026, 1, 8, 0));

        assert_eq!(t.spent(BudgetWindow::Daily), 0.0);
        assert_eq!(t.spent(BudgetWindow::Weekly), 2.0);
        assert_eq!(t.spent(BudgetWindow::Monthly), 2.0);
    }

    #[test]
    fn test_iso_week_reset() {
        let mut t = tracker();
        t.track(3.0, at(2026, 1, 10, 12)); // Saturday
        t.check_and_reset(at(2026, 1, 12, 1)); // Monday

        assert_eq!(t.spent(BudgetWindow::Weekly), 0.0);
        assert_eq!(t.spent(BudgetWindow::Monthly), 3.0);
    }

    #[test]
    fn test_month_reset() {
        let mut t = BudgetTracker::new(BudgetLimits::default(), at(2026, 3, 31, 22));
        t.track(4.0, at(2026, 3, 31, 23));
        t.check_and_reset(at(2026, 4, 1, 0));

        assert_eq!(t.spent(BudgetWindow::Monthly), 0.0);
        assert_eq!(t.spent(BudgetWindow::Daily), 0.0);
    }

    #[test]
    fn test_rejects_first_window_over_limit() {
        let mut t = tracker();
        let now = at(2026, 1, 7, 11);
        t.track(9.9995, now);

        let decision = t.can_make_request(0.001, now);
        assert!(!decision.allowed);
        assert_eq!(decision.reason.as_deref(), Some("daily_budget_exceeded"));
        assert_eq!(decision.limit, Some(10.0));

        assert!(t.can_make_request(0.0001, now).allowed);
    }

    #[test]
    fn test_weekly_rejection_after_daily_reset() {
        let mut t = BudgetTracker::new(
            BudgetLimits {
                daily: 10.0,
                weekly: 12.0,
                monthly: 150.0,
            },
            at(2026, 1, 5, 9),
        );
        t.track(8.0, at(2026, 1, 5, 10));
        t.track(3.5, at(2026, 1, 6, 10));

        let decision = t.can_make_request(1.0, at(2026, 1, 7, 10));
        assert_eq!(decision.reason.as_deref(), Some("weekly_budget_exceeded"));
        assert_eq!(decision.spent, Some(11.5));
        assert_eq!(decision.remaining, Some(0.5));
    }

    #[test]
    fn test_alert_thresholds() {
        let mut t = tracker();
        let now = at(2026, 1, 7, 12);

        assert!(t.track(6.5, now).is_empty());

        let alerts = t.track(1.0, now);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].level, AlertLevel::Warning);
        assert_eq!(alerts[0].message, "daily budget at 75.0%");

        let alerts = t.track(2.0, now);
        assert_eq!(alerts[0].level, AlertLevel::Critical);
        assert_eq!(alerts[0].message, "daily budget at 95.0%");
    }

    #[test]
    fn test_status_and_reset() {
        let mut t = tracker();
        let now = at(2026, 1, 7, 12);
        t.track(2.5, now);

        let status = t.status(now);
        assert_eq!(status.daily.percentage, 25.0);
        assert_eq!(status.daily.remaining, 7.5);
        assert_eq!(status.monthly.percentage, 1.7);

        t.reset(now);
        assert_eq!(t.status(now).weekly.spent, 0.0);
    }

    #[test]
    fn test_denied_decision_serializes_reason() {
        let decision = BudgetDecision::deny(BudgetWindow::Monthly, 150.0, 150.0);
        let json = serde_json::to_value(&decision).unwrap();
        assert_eq!(json["reason"], "monthly_budget_exceeded");

        let json = serde_json::to_value(BudgetDecision::allow()).unwrap();
        assert_eq!(json, serde_json::json!({"allowed": true}));
    }
}
