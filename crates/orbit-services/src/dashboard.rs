// crates/orbit-services/src/dashboard.rs

use serde::Serialize;

use crate::finance::MilestoneTotals;

/// Headline numbers for a user's own projects
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DashboardStats {
    pub revenue: f64,
    pub pending_revenue: f64,
    pub active_projects: i64,
    pub total_minutes: i64,
    pub total_hours: i64,
}

impl DashboardStats {
    pub fn new(totals: &MilestoneTotals, active_projects: i64, total_minutes: i64) -> Self {
        let total_minutes = total_minutes.max(0);
        Self {
            revenue: totals.revenue,
            pending_revenue: totals.pending_revenue,
            active_projects,
            total_minutes,
            total_hours: (total_minutes + 30) / 60,
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use crate::project::MilestoneStatus;

    #[test]
    fn test_stats_from_totals() {
        let totals = MilestoneTotals::from_amounts([
            (MilestoneStatus::Paid, 1200.0),
            (MilestoneStatus::Pending, 300.0),
            (MilestoneStatus::Overdue, 50.0),
        ]);
        let stats = DashboardStats::new(&totals, 2, 150);

        assert_eq!(stats.revenue, 1200.0);
        assert_eq!(stats.pending_revenue, 300.0);
        assert_eq!(stats.active_projects, 2);
        assert_eq!(stats.total_hours, 3);
    }

    #[test]
    fn test_hours_round_to_nearest() {
        let totals = MilestoneTotals::default();
        assert_eq!(DashboardStats::new(&totals, 0, 29).total_hours, 0);
        assert_eq!(DashboardStats::new(&totals, 0, 89).total_hours, 1);
        assert_eq!(DashboardStats::new(&totals, 0, 90).total_hours, 2);
    }
}
