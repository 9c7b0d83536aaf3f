use chrono::{NaiveDate, NaiveTime};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub(crate) const SAVE_VERSION: u32 = 1;
pub(crate) const XP_PER_LEVEL: u64 = 500;
pub(crate) const HISTORY_LIMIT: usize = 30;

#[derive(
    Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub(crate) enum LocationId {
    Village,
    Forest,
    Mountain,
    Ocean,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "kebab-case")]
pub(crate) enum AchievementId {
    WeekNoPorn,
    WeekDiscipline,
    ThousandXp,
    DailyStreak,
    ProductivityMaster,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub(crate) enum ChallengeId {
    LessScreen,
    ProductiveTask,
    MindfulMoment,
    HelpSomeone,
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub(crate) enum WorldState {
    Bright,
    Normal,
    Dim,
    #[default]
    Dark,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum CharacterTier {
    Hero,
    Strong,
    Developing,
    Novice,
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Theme {
    #[default]
    Dark,
    Light,
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub(crate) enum MotivationFrequency {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub(crate) enum ReminderFrequency {
    #[default]
    Daily,
}

/// One day's self-reported habits.
///
/// `abstained == true` means the target behavior did not happen that day.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct HabitReport {
    pub(crate) abstained: bool,
    pub(crate) screen_time_minutes: u32,
    pub(crate) productivity_note: String,
}

impl HabitReport {
    pub(crate) fn productivity_done(&self) -> bool {
        !self.productivity_note.trim().is_empty()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct Notifications {
    pub(crate) enabled: bool,
    #[serde(with = "hh_mm")]
    pub(crate) time: NaiveTime,
    pub(crate) frequency: ReminderFrequency,
}

impl Default for Notifications {
    fn default() -> Self {
        Self {
            enabled: true,
            time: NaiveTime::from_hms_opt(20, 0, 0).unwrap_or_default(),
            frequency: ReminderFrequency::Daily,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct Settings {
    pub(crate) screen_time_limit_minutes: u32,
    pub(crate) theme: Theme,
    pub(crate) motivation_frequency: MotivationFrequency,
    pub(crate) notifications: Notifications,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            screen_time_limit_minutes: 120,
            theme: Theme::Dark,
            motivation_frequency: MotivationFrequency::Medium,
            notifications: Notifications::default(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EarnedAchievement {
    pub(crate) id: AchievementId,
    #[serde(default)]
    pub(crate) earned_on: Option<NaiveDate>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Challenge {
    pub(crate) id: ChallengeId,
    pub(crate) date: NaiveDate,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) xp_reward: u64,
    #[serde(default)]
    pub(crate) completed: bool,
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct DailyRewards {
    pub(crate) claimed_today: bool,
    pub(crate) consecutive_days: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub(crate) struct HistoryEntry {
    pub(crate) date: NaiveDate,
    #[serde(default)]
    pub(crate) habits: HabitReport,
    #[serde(default)]
    pub(crate) xp_gained: u64,
}

/// Counters as they stood before the first report of `last_log_date`.
/// A second report on the same day is scored against these instead of the
/// already-advanced counters.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct DayBaseline {
    pub(crate) last_log_date: Option<NaiveDate>,
    pub(crate) streak: u32,
    pub(crate) no_porn_streak: u32,
    pub(crate) low_screen_streak: u32,
    pub(crate) productivity_streak: u32,
    pub(crate) consecutive_days: u32,
    pub(crate) xp_gained: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct ProgressState {
    pub(crate) version: u32,
    #[serde(rename = "totalXP")]
    pub(crate) total_xp: u64,
    pub(crate) streak: u32,
    pub(crate) no_porn_streak: u32,
    pub(crate) low_screen_streak: u32,
    pub(crate) productivity_streak: u32,
    pub(crate) last_log_date: Option<NaiveDate>,
    pub(crate) last_login_date: Option<NaiveDate>,
    pub(crate) login_streak: u32,
    pub(crate) habits: HabitReport,
    pub(crate) settings: Settings,
    pub(crate) achievements: Vec<EarnedAchievement>,
    pub(crate) challenges: Vec<Challenge>,
    pub(crate) world_state: WorldState,
    pub(crate) character_level: u32,
    pub(crate) current_location: LocationId,
    pub(crate) unlocked_locations: BTreeSet<LocationId>,
    pub(crate) daily_rewards: DailyRewards,
    pub(crate) habit_history: Vec<HistoryEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) day_baseline: Option<DayBaseline>,
}

impl Default for ProgressState {
    fn default() -> Self {
        Self {
            version: SAVE_VERSION,
            total_xp: 0,
            streak: 0,
            no_porn_streak: 0,
            low_screen_streak: 0,
            productivity_streak: 0,
            last_log_date: None,
            last_login_date: None,
            login_streak: 0,
            habits: HabitReport::default(),
            settings: Settings::default(),
            achievements: Vec::new(),
            challenges: Vec::new(),
            world_state: WorldState::Dark,
            character_level: 1,
            current_location: LocationId::Village,
            unlocked_locations: BTreeSet::from([LocationId::Village]),
            daily_rewards: DailyRewards::default(),
            habit_history: Vec::new(),
            day_baseline: None,
        }
    }
}

impl ProgressState {
    pub(crate) fn has_achievement(&self, id: AchievementId) -> bool {
        self.achievements.iter().any(|a| a.id == id)
    }

    pub(crate) fn challenge_for(&self, date: NaiveDate) -> Option<&Challenge> {
        self.challenges.iter().find(|c| c.date == date)
    }
}

/// Reminder times are stored as "HH:MM"; "HH:MM:SS" is accepted on read.
pub(crate) mod hh_mm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%H:%M";

    pub(crate) fn parse(s: &str) -> Result<NaiveTime, chrono::ParseError> {
        let s = s.trim();
        NaiveTime::parse_from_str(s, FORMAT).or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
    }

    pub(crate) fn serialize<S: Serializer>(t: &NaiveTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&t.format(FORMAT).to_string())
    }

    pub(crate) fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(d)?;
        parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state_starts_in_the_village() {
        let st = ProgressState::default();
        assert_eq!(st.character_level, 1);
        assert_eq!(st.settings.screen_time_limit_minutes, 120);
        assert!(st.unlocked_locations.contains(&LocationId::Village));
        assert_eq!(st.unlocked_locations.len(), 1);
        assert!(st.habit_history.is_empty());
    }

    #[test]
    fn serializes_with_camel_case_field_names() {
        let v = serde_json::to_value(ProgressState::default()).unwrap();
        assert_eq!(v["totalXP"], 0);
        assert_eq!(v["noPornStreak"], 0);
        assert_eq!(v["settings"]["screenTimeLimitMinutes"], 120);
        assert_eq!(v["settings"]["notifications"]["time"], "20:00");
        assert_eq!(v["unlockedLocations"], serde_json::json!(["village"]));
        assert_eq!(v["worldState"], "dark");
        assert!(v.get("dayBaseline").is_none());
    }

    #[test]
    fn ids_use_kebab_case() {
        assert_eq!(
            serde_json::to_value(AchievementId::ThousandXp).unwrap(),
            "thousand-xp"
        );
        assert_eq!(
            serde_json::to_value(ChallengeId::MindfulMoment).unwrap(),
            "mindful-moment"
        );
    }

    #[test]
    fn reminder_time_accepts_seconds() {
        let t = hh_mm::parse("07:30:00").unwrap();
        assert_eq!(t, NaiveTime::from_hms_opt(7, 30, 0).unwrap());
        assert!(hh_mm::parse("25:00").is_err());
    }

    #[test]
    fn blank_note_is_not_productive() {
        let r = HabitReport {
            productivity_note: "   \t".into(),
            ..HabitReport::default()
        };
        assert!(!r.productivity_done());
    }
}
