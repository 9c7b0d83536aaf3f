//! Upgrades persisted blobs to the current schema and repairs structural
//! damage. Runs once per load, before any engine operation.
//!
//! Version 0 is the unversioned blob written by the browser build: dates in
//! `Date.toDateString()` form, `habits.noPorn == true` meaning the behavior
//! happened, and achievements stored as full objects.

use crate::model::{
    AchievementId, ChallengeId, HistoryEntry, LocationId, ProgressState, HISTORY_LIMIT,
    SAVE_VERSION,
};
use chrono::NaiveDate;
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Parses, migrates and repairs a saved blob. `None` means the blob is not a
/// JSON object at all and nothing can be salvaged.
pub(crate) fn decode(raw: &str) -> Option<ProgressState> {
    let value: Value = serde_json::from_str(raw).ok()?;
    if !value.is_object() {
        return None;
    }
    let value = migrate(value);
    let mut state = match serde_json::from_value::<ProgressState>(value.clone()) {
        Ok(s) => s,
        Err(e) => {
            warn!(error = %e, "saved progress has malformed fields, salvaging the rest");
            salvage(&value)
        }
    };
    repair(&mut state);
    Some(state)
}

pub(crate) fn migrate(mut value: Value) -> Value {
    let version = value.get("version").and_then(Value::as_u64).unwrap_or(0);
    if version < 1 {
        debug!("upgrading save from version 0");
        upgrade_v0(&mut value);
    }
    value
}

fn upgrade_v0(value: &mut Value) {
    let Some(obj) = value.as_object_mut() else {
        return;
    };

    if let Some(settings) = obj.get_mut("settings").and_then(Value::as_object_mut) {
        if let Some(limit) = settings.remove("screenTimeLimit") {
            settings.insert("screenTimeLimitMinutes".into(), limit);
        }
    }

    if let Some(habits) = obj.get_mut("habits") {
        *habits = legacy_habits(habits);
    }

    for key in ["lastLogDate", "lastLoginDate"] {
        if let Some(date) = obj.get_mut(key) {
            *date = legacy_date(date);
        }
    }

    if let Some(Value::Array(history)) = obj.get_mut("habitHistory") {
        *history = history.iter().filter_map(legacy_history_entry).collect();
    }

    if let Some(Value::Array(achievements)) = obj.get_mut("achievements") {
        *achievements = achievements
            .iter()
            .filter_map(legacy_achievement)
            .collect();
    }

    if let Some(Value::Array(challenges)) = obj.get_mut("challenges") {
        *challenges = challenges.iter().filter_map(legacy_challenge).collect();
    }

    obj.insert("version".into(), Value::from(SAVE_VERSION));
}

/// Accepts ISO dates and `toDateString()` output ("Sat Oct 18 2025").
fn parse_legacy_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%a %b %d %Y"))
        .ok()
}

fn legacy_date(v: &Value) -> Value {
    v.as_str()
        .and_then(parse_legacy_date)
        .map_or(Value::Null, |d| Value::from(d.format("%Y-%m-%d").to_string()))
}

fn legacy_habits(v: &Value) -> Value {
    let mut out = Map::new();
    if let Some(indulged) = v.get("noPorn").and_then(Value::as_bool) {
        out.insert("abstained".into(), Value::from(!indulged));
    }
    if let Some(minutes) = v.get("screenTime").and_then(Value::as_u64) {
        out.insert("screenTimeMinutes".into(), Value::from(minutes));
    }
    if let Some(note) = v.get("productivityTask").and_then(Value::as_str) {
        out.insert("productivityNote".into(), Value::from(note));
    }
    Value::Object(out)
}

fn legacy_history_entry(v: &Value) -> Option<Value> {
    let date = legacy_date(v.get("date")?);
    if date.is_null() {
        warn!(entry = %v, "dropping history entry without a readable date");
        return None;
    }
    let mut out = Map::new();
    out.insert("date".into(), date);
    out.insert("habits".into(), legacy_habits(v));
    out.insert(
        "xpGained".into(),
        Value::from(v.get("xpGained").and_then(Value::as_u64).unwrap_or(0)),
    );
    Some(Value::Object(out))
}

fn legacy_achievement(v: &Value) -> Option<Value> {
    let id = v.get("id").or(Some(v)).filter(|id| id.is_string())?;
    if serde_json::from_value::<AchievementId>(id.clone()).is_err() {
        warn!(id = %id, "dropping unknown achievement");
        return None;
    }
    let mut out = Map::new();
    out.insert("id".into(), id.clone());
    out.insert(
        "earnedOn".into(),
        v.get("date").map_or(Value::Null, legacy_date),
    );
    Some(Value::Object(out))
}

fn legacy_challenge(v: &Value) -> Option<Value> {
    let id = v.get("id")?;
    if serde_json::from_value::<ChallengeId>(id.clone()).is_err() {
        warn!(id = %id, "dropping unknown challenge");
        return None;
    }
    let date = legacy_date(v.get("date")?);
    if date.is_null() {
        return None;
    }
    let mut out = v.as_object()?.clone();
    out.insert("date".into(), date);
    Some(Value::Object(out))
}

/// Builds a state from the default record plus every top-level field of
/// `value` that deserializes on its own.
fn salvage(value: &Value) -> ProgressState {
    let mut merged = match serde_json::to_value(ProgressState::default()) {
        Ok(Value::Object(m)) => m,
        _ => return ProgressState::default(),
    };
    if let Some(obj) = value.as_object() {
        for (key, field) in obj {
            let mut candidate = merged.clone();
            candidate.insert(key.clone(), field.clone());
            if serde_json::from_value::<ProgressState>(Value::Object(candidate.clone())).is_ok() {
                merged = candidate;
            } else {
                warn!(field = %key, "discarding malformed field");
            }
        }
    }
    serde_json::from_value(Value::Object(merged)).unwrap_or_default()
}

/// Restores the structural invariants a hand-edited or older save may break.
pub(crate) fn repair(state: &mut ProgressState) {
    state.version = SAVE_VERSION;

    let mut seen = BTreeSet::new();
    let before = state.achievements.len();
    state.achievements.retain(|a| seen.insert(a.id));
    if state.achievements.len() != before {
        warn!("removed duplicate achievements");
    }

    let mut days = BTreeSet::new();
    let before = state.challenges.len();
    state.challenges.retain(|c| days.insert(c.date));
    if state.challenges.len() != before {
        warn!("removed extra challenges sharing a date");
    }

    // older saves appended a new entry on every submission; the last one for
    // a day is the one that counted
    let before = state.habit_history.len();
    state.habit_history.sort_by_key(|h| h.date);
    let mut history: Vec<HistoryEntry> = Vec::with_capacity(before);
    for entry in state.habit_history.drain(..) {
        match history.last_mut() {
            Some(last) if last.date == entry.date => *last = entry,
            _ => history.push(entry),
        }
    }
    state.habit_history = history;
    if state.habit_history.len() != before {
        warn!("merged history entries sharing a date");
    }

    if state.habit_history.len() > HISTORY_LIMIT {
        let excess = state.habit_history.len() - HISTORY_LIMIT;
        state.habit_history.drain(..excess);
    }

    state.unlocked_locations.insert(LocationId::Village);
    if !state.unlocked_locations.contains(&state.current_location) {
        state.current_location = LocationId::Village;
    }

    if state.last_log_date.is_none() {
        state.day_baseline = None;
    }

    state.refresh_derived();
}
