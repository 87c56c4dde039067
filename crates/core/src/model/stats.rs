use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::CardId;
use crate::model::progress::DayKey;

/// Base points awarded for any completed task.
pub const BASE_POINTS: u32 = 10;
/// Bonus for finishing a timed task before its countdown ran out.
pub const TIMED_BONUS_POINTS: u32 = 5;
/// Points per level; level = points / POINTS_PER_LEVEL + 1.
pub const POINTS_PER_LEVEL: u32 = 100;

/// One completed task in the user's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedTask {
    pub card_id: CardId,
    pub completed_at: DateTime<Utc>,
    pub seconds_spent: u32,
    pub was_timed: bool,
    pub completed_in_time: bool,
}

/// What a badge measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeKind {
    Tasks,
    Streak,
    Points,
}

/// A badge definition from the static catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Badge {
    pub id: &'static str,
    pub name: &'static str,
    pub kind: BadgeKind,
    pub requirement: u32,
}

/// The full badge catalog. Order matters only for display.
#[must_use]
pub fn all_badges() -> &'static [Badge] {
    const BADGES: &[Badge] = &[
        Badge {
            id: "first_step",
            name: "First Step",
            kind: BadgeKind::Tasks,
            requirement: 1,
        },
        Badge {
            id: "declutter_starter",
            name: "Declutter Starter",
            kind: BadgeKind::Tasks,
            requirement: 10,
        },
        Badge {
            id: "declutter_master",
            name: "Declutter Master",
            kind: BadgeKind::Tasks,
            requirement: 50,
        },
        Badge {
            id: "declutter_legend",
            name: "Declutter Legend",
            kind: BadgeKind::Tasks,
            requirement: 100,
        },
        Badge {
            id: "streak_3",
            name: "Three-Day Streak",
            kind: BadgeKind::Streak,
            requirement: 3,
        },
        Badge {
            id: "streak_7",
            name: "Weekly Streak",
            kind: BadgeKind::Streak,
            requirement: 7,
        },
        Badge {
            id: "streak_30",
            name: "Monthly Streak",
            kind: BadgeKind::Streak,
            requirement: 30,
        },
        Badge {
            id: "points_100",
            name: "Hundred Points",
            kind: BadgeKind::Points,
            requirement: 100,
        },
        Badge {
            id: "points_500",
            name: "Five Hundred Points",
            kind: BadgeKind::Points,
            requirement: 500,
        },
        Badge {
            id: "points_1000",
            name: "Thousand Points",
            kind: BadgeKind::Points,
            requirement: 1000,
        },
    ];
    BADGES
}

/// Accumulated gamification state: points, streaks, history, badges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct UserStats {
    points: u32,
    current_streak: u32,
    longest_streak: u32,
    last_completed_at: Option<DateTime<Utc>>,
    completed_tasks: Vec<CompletedTask>,
    unlocked_badges: Vec<String>,
}

impl UserStats {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild stats from a persisted store.
    #[must_use]
    pub fn from_persisted(
        points: u32,
        current_streak: u32,
        longest_streak: u32,
        last_completed_at: Option<DateTime<Utc>>,
        completed_tasks: Vec<CompletedTask>,
        unlocked_badges: Vec<String>,
    ) -> Self {
        Self {
            points,
            current_streak,
            longest_streak,
            last_completed_at,
            completed_tasks,
            unlocked_badges,
        }
    }

    #[must_use]
    pub fn points(&self) -> u32 {
        self.points
    }

    #[must_use]
    pub fn current_streak(&self) -> u32 {
        self.current_streak
    }

    #[must_use]
    pub fn longest_streak(&self) -> u32 {
        self.longest_streak
    }

    #[must_use]
    pub fn last_completed_at(&self) -> Option<DateTime<Utc>> {
        self.last_completed_at
    }

    #[must_use]
    pub fn completed_tasks(&self) -> &[CompletedTask] {
        &self.completed_tasks
    }

    #[must_use]
    pub fn unlocked_badges(&self) -> &[String] {
        &self.unlocked_badges
    }

    #[must_use]
    pub fn total_tasks(&self) -> u32 {
        u32::try_from(self.completed_tasks.len()).unwrap_or(u32::MAX)
    }

    #[must_use]
    pub fn level(&self) -> u32 {
        self.points / POINTS_PER_LEVEL + 1
    }

    #[must_use]
    pub fn points_to_next_level(&self) -> u32 {
        self.level() * POINTS_PER_LEVEL - self.points
    }

    /// Progress through the current level as a fraction in [0, 1).
    #[must_use]
    pub fn level_progress(&self) -> f64 {
        f64::from(self.points % POINTS_PER_LEVEL) / f64::from(POINTS_PER_LEVEL)
    }

    #[must_use]
    pub fn has_badge(&self, badge_id: &str) -> bool {
        self.unlocked_badges.iter().any(|b| b == badge_id)
    }

    /// Record a completion: award points, update the streak, append the
    /// history entry, and unlock any newly earned badges.
    ///
    /// Returns the points earned and the badges unlocked by this completion.
    pub fn record_completion(
        &mut self,
        task: CompletedTask,
        today: DayKey,
    ) -> (u32, Vec<Badge>) {
        let earned = if task.was_timed && task.completed_in_time {
            BASE_POINTS + TIMED_BONUS_POINTS
        } else {
            BASE_POINTS
        };

        self.current_streak = self.next_streak(today);
        self.longest_streak = self.longest_streak.max(self.current_streak);
        self.points += earned;
        self.last_completed_at = Some(task.completed_at);
        self.completed_tasks.push(task);

        let new_badges = self.unlockable();
        for badge in &new_badges {
            self.unlocked_badges.push(badge.id.to_string());
        }

        (earned, new_badges)
    }

    fn next_streak(&self, today: DayKey) -> u32 {
        let Some(last) = self.last_completed_at else {
            return 1;
        };
        let last_day = DayKey::new(last.date_naive());
        if last_day == today {
            self.current_streak
        } else if Some(last_day) == today.previous() {
            self.current_streak + 1
        } else {
            1
        }
    }

    /// Badges whose requirement is met but which have not been awarded yet.
    #[must_use]
    pub fn unlockable(&self) -> Vec<Badge> {
        all_badges()
            .iter()
            .filter(|badge| !self.has_badge(badge.id))
            .filter(|badge| {
                let value = match badge.kind {
                    BadgeKind::Tasks => self.total_tasks(),
                    BadgeKind::Streak => self.current_streak,
                    BadgeKind::Points => self.points,
                };
                value >= badge.requirement
            })
            .copied()
            .collect()
    }

    /// Completions on the given day.
    #[must_use]
    pub fn tasks_on(&self, day: DayKey) -> Vec<&CompletedTask> {
        self.completed_tasks
            .iter()
            .filter(|task| DayKey::new(task.completed_at.date_naive()) == day)
            .collect()
    }

    /// Completions within the trailing window ending at `until`, inclusive.
    #[must_use]
    pub fn tasks_since(&self, since: DateTime<Utc>, until: DateTime<Utc>) -> Vec<&CompletedTask> {
        self.completed_tasks
            .iter()
            .filter(|task| task.completed_at >= since && task.completed_at <= until)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(day: &str, hour: u32) -> DateTime<Utc> {
        let date: chrono::NaiveDate = day.parse().unwrap();
        Utc.from_utc_datetime(&date.and_hms_opt(hour, 0, 0).unwrap())
    }

    fn task(id: &str, completed_at: DateTime<Utc>) -> CompletedTask {
        CompletedTask {
            card_id: CardId::new(id),
            completed_at,
            seconds_spent: 300,
            was_timed: false,
            completed_in_time: false,
        }
    }

    fn timed_task(id: &str, completed_at: DateTime<Utc>, in_time: bool) -> CompletedTask {
        CompletedTask {
            was_timed: true,
            completed_in_time: in_time,
            ..task(id, completed_at)
        }
    }

    #[test]
    fn base_points_for_untimed_completion() {
        let mut stats = UserStats::new();
        let (earned, _) = stats.record_completion(
            task("a", at("2024-01-01", 9)),
            DayKey::new("2024-01-01".parse().unwrap()),
        );
        assert_eq!(earned, BASE_POINTS);
        assert_eq!(stats.points(), BASE_POINTS);
    }

    #[test]
    fn bonus_points_only_when_timed_and_in_time() {
        let mut stats = UserStats::new();
        let day = DayKey::new("2024-01-01".parse().unwrap());

        let (earned, _) = stats.record_completion(timed_task("a", at("2024-01-01", 9), true), day);
        assert_eq!(earned, BASE_POINTS + TIMED_BONUS_POINTS);

        let (earned, _) = stats.record_completion(timed_task("b", at("2024-01-01", 10), false), day);
        assert_eq!(earned, BASE_POINTS);
    }

    #[test]
    fn streak_extends_over_consecutive_days() {
        let mut stats = UserStats::new();
        stats.record_completion(
            task("a", at("2024-01-01", 9)),
            DayKey::new("2024-01-01".parse().unwrap()),
        );
        assert_eq!(stats.current_streak(), 1);

        stats.record_completion(
            task("b", at("2024-01-02", 9)),
            DayKey::new("2024-01-02".parse().unwrap()),
        );
        assert_eq!(stats.current_streak(), 2);

        // Same day keeps the streak.
        stats.record_completion(
            task("c", at("2024-01-02", 12)),
            DayKey::new("2024-01-02".parse().unwrap()),
        );
        assert_eq!(stats.current_streak(), 2);

        // A gap resets to 1 but the longest streak is remembered.
        stats.record_completion(
            task("d", at("2024-01-05", 9)),
            DayKey::new("2024-01-05".parse().unwrap()),
        );
        assert_eq!(stats.current_streak(), 1);
        assert_eq!(stats.longest_streak(), 2);
    }

    #[test]
    fn first_task_unlocks_first_step() {
        let mut stats = UserStats::new();
        let (_, badges) = stats.record_completion(
            task("a", at("2024-01-01", 9)),
            DayKey::new("2024-01-01".parse().unwrap()),
        );
        assert!(badges.iter().any(|b| b.id == "first_step"));
        assert!(stats.has_badge("first_step"));
    }

    #[test]
    fn badges_are_never_awarded_twice() {
        let mut stats = UserStats::new();
        let day = DayKey::new("2024-01-01".parse().unwrap());
        stats.record_completion(task("a", at("2024-01-01", 9)), day);
        let (_, badges) = stats.record_completion(task("b", at("2024-01-01", 10)), day);
        assert!(!badges.iter().any(|b| b.id == "first_step"));
    }

    #[test]
    fn level_derives_from_points() {
        let stats = UserStats::from_persisted(250, 0, 0, None, Vec::new(), Vec::new());
        assert_eq!(stats.level(), 3);
        assert_eq!(stats.points_to_next_level(), 50);
        assert!((stats.level_progress() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn history_queries_filter_by_window() {
        let mut stats = UserStats::new();
        stats.record_completion(
            task("a", at("2024-01-01", 9)),
            DayKey::new("2024-01-01".parse().unwrap()),
        );
        stats.record_completion(
            task("b", at("2024-01-08", 9)),
            DayKey::new("2024-01-08".parse().unwrap()),
        );

        let today = DayKey::new("2024-01-08".parse().unwrap());
        assert_eq!(stats.tasks_on(today).len(), 1);
        assert_eq!(
            stats
                .tasks_since(at("2024-01-02", 0), at("2024-01-08", 23))
                .len(),
            1
        );
        assert_eq!(
            stats
                .tasks_since(at("2024-01-01", 0), at("2024-01-08", 23))
                .len(),
            2
        );
    }
}
