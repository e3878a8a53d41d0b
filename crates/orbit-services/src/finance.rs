// crates/orbit-services/src/finance.rs

use serde::Serialize;

use crate::project::{Collaborator, Milestone, MilestoneStatus};

/// Collaborator splits may not add up to more than this.
pub const MAX_TOTAL_SPLIT: f64 = 100.0;

/// Milestone amount for `percentage` of `budget`. `None` without a budget.
pub fn amount_from_percentage(budget: f64, percentage: f64) -> Option<f64> {
    (budget > 0.0).then(|| budget * percentage / 100.0)
}

/// Share of `budget` that `amount` represents. `None` without a budget.
pub fn percentage_from_amount(budget: f64, amount: f64) -> Option<f64> {
    (budget > 0.0).then(|| amount / budget * 100.0)
}

/// Milestone amounts summed per status
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MilestoneTotals {
    pub revenue: f64,
    pub pending_revenue: f64,
    pub overdue: f64,
}

impl MilestoneTotals {
    pub fn from_amounts(amounts: impl IntoIterator<Item = (MilestoneStatus, f64)>) -> Self {
        amounts
            .into_iter()
            .fold(Self::default(), |mut totals, (status, amount)| {
                match status {
                    MilestoneStatus::Paid => totals.revenue += amount,
                    MilestoneStatus::Pending => totals.pending_revenue += amount,
                    MilestoneStatus::Overdue => totals.overdue += amount,
                }
                totals
            })
    }

    pub fn from_milestones(milestones: &[Milestone]) -> Self {
        Self::from_amounts(milestones.iter().map(|m| (m.status, m.amount)))
    }
}

/// One collaborator's cut of a payment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RevenueShare {
    pub email: String,
    pub percentage: f64,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RevenueSplit {
    pub shares: Vec<RevenueShare>,
    pub owner_amount: f64,
}

pub fn total_split(collaborators: &[Collaborator]) -> f64 {
    collaborators.iter().map(|c| c.split_percentage).sum()
}

/// Divide `amount` between collaborators by their split percentage; the
/// owner keeps the remainder.
pub fn split_revenue(amount: f64, collaborators: &[Collaborator]) -> RevenueSplit {
    let shares: Vec<RevenueShare> = collaborators
        .iter()
        .map(|c| RevenueShare {
            email: c.email.clone(),
            percentage: c.split_percentage,
            amount: amount * c.split_percentage / 100.0,
        })
        .collect();

    let owner_percentage = (MAX_TOTAL_SPLIT - total_split(collaborators)).max(0.0);

    RevenueSplit {
        shares,
        owner_amount: amount * owner_percentage / 100.0,
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;

    fn collaborator(email: &str, pct: f64) -> Collaborator {
        Collaborator {
            id: format!("c-{}", email),
            project_id: "p1".to_string(),
            user_id: None,
            email: email.to_string(),
            role: "Designer".to_string(),
            color: None,
            split_percentage: pct,
        }
    }

    #[test]
    fn test_percentage_amount_derivation() {
        assert_eq!(amount_from_percentage(50_000.0, 30.0), Some(15_000.0));
        assert_eq!(percentage_from_amount(50_000.0, 12_500.0), Some(25.0));
        assert_eq!(amount_from_percentage(0.0, 30.0), None);
        assert_eq!(percentage_from_amount(0.0, 100.0), None);
    }

    #[test]
    fn test_totals_by_status() {
        let totals = MilestoneTotals::from_amounts([
            (MilestoneStatus::Paid, 1000.0),
            (MilestoneStatus::Paid, 500.0),
            (MilestoneStatus::Pending, 250.0),
            (MilestoneStatus::Overdue, 75.0),
        ]);
        assert_eq!(totals.revenue, 1500.0);
        assert_eq!(totals.pending_revenue, 250.0);
        assert_eq!(totals.overdue, 75.0);
    }

    #[test]
    fn test_totals_empty() {
        assert_eq!(MilestoneTotals::from_amounts([]), MilestoneTotals::default());
    }

    #[test]
    fn test_split_revenue() {
        let collaborators = vec![collaborator("a@x.io", 20.0), collaborator("b@x.io", 30.0)];
        let split = split_revenue(10_000.0, &collaborators);

        assert_eq!(split.shares.len(), 2);
        assert_eq!(split.shares[0].amount, 2000.0);
        assert_eq!(split.shares[1].amount, 3000.0);
        assert_eq!(split.owner_amount, 5000.0);
    }

    #[test]
    fn test_split_without_collaborators_goes_to_owner() {
        let split = split_revenue(800.0, &[]);
        assert!(split.shares.is_empty());
        assert_eq!(split.owner_amount, 800.0);
    }
}
