//! Savings goal business logic.
//!
//! Goals are stored as one JSON collection and credited explicitly; they are
//! not derived from the savings ledger. Progress is a pure linear projection
//! over whole days.

use crate::{
    core::calendar::{self, local_midnight},
    errors::{Error, Result},
    models::{GoalCategory, GoalProgress, GoalType, SavingsGoal},
    storage::{FailurePolicy, JsonCollection, KeyValueStore, SAVINGS_GOALS_KEY},
};
use chrono::{DateTime, Days, Local, TimeZone, Utc};
use std::sync::Arc;
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// Persisted savings goals.
#[derive(Debug, Clone)]
pub struct GoalTracker {
    goals: JsonCollection<SavingsGoal>,
    policy: FailurePolicy,
}

impl GoalTracker {
    /// Creates a tracker over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>, policy: FailurePolicy) -> Self {
        Self {
            goals: JsonCollection::new(store, SAVINGS_GOALS_KEY),
            policy,
        }
    }

    /// Creates and stores a goal starting today (local midnight).
    pub async fn create_goal(
        &self,
        goal_type: GoalType,
        target_amount: f64,
        category: GoalCategory,
    ) -> Result<SavingsGoal> {
        self.create_goal_at(goal_type, target_amount, category, &Local::now())
            .await
    }

    /// Creates and stores a goal whose period starts at midnight of the day
    /// containing `now`, in the time zone of `now`.
    ///
    /// Monthly goals end on the same day of the next month; a day that month
    /// lacks carries over into the one after. Existing goals are left untouched.
    ///
    /// # Arguments
    /// * `goal_type` - Weekly or monthly period
    /// * `target_amount` - Amount to save over the period
    /// * `category` - Which savings count toward the goal
    /// * `now` - Any instant on the first day of the period
    ///
    /// # Returns
    /// The stored `SavingsGoal`, active and with nothing saved yet
    ///
    /// # Errors
    /// Returns `Error::InvalidAmount` if `target_amount` is not a positive,
    /// finite number, and `Error::DateOutOfRange` if the end date cannot be
    /// represented.
    #[instrument(skip(self, now))]
    pub async fn create_goal_at<Tz: TimeZone>(
        &self,
        goal_type: GoalType,
        target_amount: f64,
        category: GoalCategory,
        now: &DateTime<Tz>,
    ) -> Result<SavingsGoal> {
        if !target_amount.is_finite() || target_amount <= 0.0 {
            return Err(Error::InvalidAmount {
                amount: target_amount,
            });
        }

        let tz = now.timezone();
        let start_day = now.date_naive();
        let end_day = match goal_type {
            GoalType::Weekly => start_day.checked_add_days(Days::new(7)),
            GoalType::Monthly => calendar::next_month_same_day(start_day),
        }
        .ok_or(Error::DateOutOfRange { date: start_day })?;

        let goal = SavingsGoal {
            id: format!("goal_{}", Uuid::now_v7()),
            goal_type,
            target_amount,
            current_saved: 0.0,
            start_date: local_midnight(&tz, start_day),
            end_date: local_midnight(&tz, end_day),
            category,
            is_active: true,
        };

        self.save_goal(goal.clone()).await?;
        info!("Created {:?} goal {} for ${:.2}", goal.goal_type, goal.id, target_amount);
        Ok(goal)
    }

    /// Adds `amount` to a goal's saved total. Unknown ids are ignored.
    pub async fn credit_goal(&self, goal_id: &str, amount: f64) -> Result<()> {
        let id = goal_id.to_string();
        let result = self
            .goals
            .update(move |goals| {
                goals
                    .iter_mut()
                    .find(|g| g.id == id)
                    .map(|goal| {
                        goal.current_saved += amount;
                        goal.current_saved
                    })
            })
            .await
            .map(|credited| match credited {
                Some(total) => debug!("Goal {goal_id} now at ${total:.2}"),
                None => debug!("Goal {goal_id} not found, nothing credited"),
            });

        self.policy
            .apply(result, "Failed to update goal progress", || ())
    }

    /// First active, unexpired goal in storage order.
    pub async fn get_active_goal(&self) -> Result<Option<SavingsGoal>> {
        self.get_active_goal_at(Utc::now()).await
    }

    /// First goal that is active and whose end date is after `now`.
    pub async fn get_active_goal_at(&self, now: DateTime<Utc>) -> Result<Option<SavingsGoal>> {
        let goals = self.list_goals().await?;
        Ok(goals
            .into_iter()
            .find(|g| g.is_active && g.end_date > now))
    }

    /// Every stored goal, in storage order.
    pub async fn list_goals(&self) -> Result<Vec<SavingsGoal>> {
        self.policy.apply(
            self.goals.load().await,
            "Failed to load savings goals",
            Vec::new,
        )
    }

    /// Deletes a goal. Unknown ids are ignored.
    pub async fn delete_goal(&self, goal_id: &str) -> Result<()> {
        let id = goal_id.to_string();
        let result = self
            .goals
            .update(move |goals| goals.retain(|g| g.id != id))
            .await;

        self.policy.apply(result, "Failed to delete goal", || ())
    }

    async fn save_goal(&self, goal: SavingsGoal) -> Result<()> {
        let result = self
            .goals
            .update(move |goals| {
                if let Some(existing) = goals.iter_mut().find(|g| g.id == goal.id) {
                    *existing = goal;
                } else {
                    goals.push(goal);
                }
            })
            .await;

        self.policy.apply(result, "Failed to save savings goal", || ())
    }
}

/// Projects how `goal` is going at `now`.
///
/// Day counts are rounded up, so any part of a day counts as a whole day.
/// The projection assumes the average daily savings so far continue for the
/// whole period.
///
/// # Arguments
/// * `goal` - Goal to project
/// * `now` - Instant to measure elapsed and remaining days against
///
/// # Returns
/// A `GoalProgress` with percent complete clamped to `[0, 100]`
#[must_use]
pub fn progress(goal: &SavingsGoal, now: DateTime<Utc>) -> GoalProgress {
    let total_days = calendar::ceil_days(goal.start_date, goal.end_date);
    let days_elapsed = calendar::ceil_days(goal.start_date, now);
    let days_remaining = (total_days - days_elapsed).max(0);

    let percent_complete = if goal.target_amount > 0.0 {
        (goal.current_saved / goal.target_amount) * 100.0
    } else {
        0.0
    };

    #[allow(clippy::cast_precision_loss)]
    let average_daily_savings = if days_elapsed > 0 {
        goal.current_saved / days_elapsed as f64
    } else {
        0.0
    };

    #[allow(clippy::cast_precision_loss)]
    let projected_savings = average_daily_savings * total_days as f64;

    GoalProgress {
        goal: goal.clone(),
        percent_complete: percent_complete.clamp(0.0, 100.0),
        days_remaining,
        on_track: projected_savings >= goal.target_amount,
        projected_savings,
        average_daily_savings,
    }
}

/// One-line status for a goal's progress.
#[must_use]
pub fn status_message(progress: &GoalProgress) -> String {
    let goal = &progress.goal;

    if progress.percent_complete >= 100.0 {
        return format!("🎉 Goal achieved! You saved ${:.2}!", goal.current_saved);
    }

    if progress.on_track {
        return format!(
            "You're on track! At this rate, you'll hit your goal by {}",
            goal.end_date.with_timezone(&Local).format("%-m/%-d/%Y")
        );
    }

    if progress.days_remaining == 0 {
        return format!(
            "Goal period ended. You saved ${:.2} of ${:.2}",
            goal.current_saved, goal.target_amount
        );
    }

    let amount_needed = goal.target_amount - goal.current_saved;
    #[allow(clippy::cast_precision_loss)]
    let daily_needed = amount_needed / progress.days_remaining as f64;
    format!(
        "Need ${daily_needed:.2}/day to reach goal ({} days left)",
        progress.days_remaining
    )
}
