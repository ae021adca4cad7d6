use time::{Date, Duration, OffsetDateTime};
use tracing::{info, instrument};

use super::repo_types::HabitCompletion;
use crate::{
    auth::extractors::Identity,
    error::{AppError, AppResult},
    habits::services::get_habit,
    state::AppState,
};

pub const DEFAULT_WINDOW_DAYS: i64 = 30;
const MAX_WINDOW_DAYS: i64 = 366;

/// Resolves an optional `[from, to]` range against `today`.
///
/// With no bounds the window is the last [`DEFAULT_WINDOW_DAYS`] days ending
/// today.
pub fn resolve_range(today: Date, from: Option<Date>, to: Option<Date>) -> AppResult<(Date, Date)> {
    let to = to.unwrap_or(today);
    let from = match from {
        Some(from) => from,
        None => to
            .checked_sub(Duration::days(DEFAULT_WINDOW_DAYS - 1))
            .ok_or_else(|| AppError::validation("date out of range"))?,
    };
    if from > to {
        return Err(AppError::validation("from must not be after to"));
    }
    if (to - from).whole_days() >= MAX_WINDOW_DAYS {
        return Err(AppError::validation("date range too large"));
    }
    Ok((from, to))
}

#[instrument(skip(state), fields(user_id = identity.user_id))]
pub async fn mark_complete(
    state: &AppState,
    identity: &Identity,
    habit_id: i64,
    date: Date,
) -> AppResult<HabitCompletion> {
    let habit = get_habit(state, identity, habit_id).await?;

    let completion = HabitCompletion::mark(&state.db, habit.id, identity.user_id, date).await?;
    info!(habit_id, %date, "habit marked complete");
    Ok(completion)
}

#[instrument(skip(state), fields(user_id = identity.user_id))]
pub async fn unmark_complete(
    state: &AppState,
    identity: &Identity,
    habit_id: i64,
    date: Date,
) -> AppResult<()> {
    let habit = get_habit(state, identity, habit_id).await?;
    HabitCompletion::unmark(&state.db, habit.id, identity.user_id, date).await?;
    info!(habit_id, %date, "habit completion removed");
    Ok(())
}

pub async fn list_completions(
    state: &AppState,
    identity: &Identity,
    habit_id: i64,
    from: Option<Date>,
    to: Option<Date>,
) -> AppResult<Vec<HabitCompletion>> {
    let (from, to) = resolve_range(OffsetDateTime::now_utc().date(), from, to)?;
    let habit = get_habit(state, identity, habit_id).await?;
    HabitCompletion::list(&state.db, habit.id, identity.user_id, from, to).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn default_range_is_thirty_days_ending_today() {
        let (from, to) = resolve_range(date!(2025 - 03 - 31), None, None).unwrap();
        assert_eq!(to, date!(2025 - 03 - 31));
        assert_eq!(from, date!(2025 - 03 - 02));
    }

    #[test]
    fn explicit_bounds_are_kept() {
        let (from, to) = resolve_range(
            date!(2025 - 03 - 31),
            Some(date!(2025 - 01 - 01)),
            Some(date!(2025 - 01 - 10)),
        )
        .unwrap();
        assert_eq!((from, to), (date!(2025 - 01 - 01), date!(2025 - 01 - 10)));
    }

    #[test]
    fn window_before_the_earliest_date_is_rejected() {
        assert!(matches!(
            resolve_range(date!(2025 - 01 - 01), None, Some(Date::MIN)),
            Err(AppError::Validation(_))
        ));
        let (from, to) = resolve_range(date!(2025 - 01 - 01), Some(Date::MIN), Some(Date::MIN)).unwrap();
        assert_eq!((from, to), (Date::MIN, Date::MIN));
    }

    #[test]
    fn inverted_or_huge_ranges_are_rejected() {
        let today = date!(2025 - 03 - 31);
        assert!(matches!(
            resolve_range(today, Some(date!(2025 - 04 - 01)), None),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            resolve_range(today, Some(date!(2020 - 01 - 01)), None),
            Err(AppError::Validation(_))
        ));
    }
}
