mod card;
mod criteria;
mod ids;
mod progress;
mod stats;
mod timer;

pub use card::{Card, CardDraft, CardValidationError, Difficulty, TimeUnit, ValidatedCard};
pub use criteria::{Category, CriteriaError, SelectionCriteria};
pub use ids::CardId;
pub use progress::{DailyProgress, DayKey, DayKeyError};
pub use stats::{
    Badge, BadgeKind, CompletedTask, UserStats, all_badges, BASE_POINTS, POINTS_PER_LEVEL,
    TIMED_BONUS_POINTS,
};
pub use timer::{DEFAULT_WARNING_THRESHOLD, TaskTimer, TimerPhase, TimerTick};
