use crate::catalog::{self, ACHIEVEMENTS, CHALLENGES, LOCATIONS};
use crate::model::{
    AchievementId, ChallengeId, CharacterTier, DayBaseline, EarnedAchievement, HabitReport,
    HistoryEntry, LocationId, MotivationFrequency, ProgressState, WorldState, HISTORY_LIMIT,
    XP_PER_LEVEL,
};
use chrono::NaiveDate;
use rand::Rng;
use tracing::{debug, info};

pub(crate) const ABSTINENCE_XP: u64 = 50;
pub(crate) const SCREEN_TIME_XP: u64 = 30;
pub(crate) const PRODUCTIVITY_XP: u64 = 40;
pub(crate) const PERFECT_DAY_BONUS_XP: u64 = 50;
pub(crate) const WEEKLY_BONUS_XP: u64 = 100;

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum GameEvent {
    LevelUp {
        level: u32,
    },
    LocationUnlocked(LocationId),
    AchievementEarned(AchievementId),
    NewChallenge {
        id: ChallengeId,
        title: String,
        description: String,
        xp_reward: u64,
    },
    ChallengeCompleted {
        id: ChallengeId,
        xp_reward: u64,
    },
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct Outcome {
    pub(crate) xp_gained: u64,
    pub(crate) events: Vec<GameEvent>,
}

pub(crate) fn level_for(total_xp: u64) -> u32 {
    u32::try_from(total_xp / XP_PER_LEVEL)
        .unwrap_or(u32::MAX - 1)
        .saturating_add(1)
}

pub(crate) fn world_state_for(mean_streak: f64) -> WorldState {
    if mean_streak > 14.0 {
        WorldState::Bright
    } else if mean_streak > 7.0 {
        WorldState::Normal
    } else if mean_streak > 3.0 {
        WorldState::Dim
    } else {
        WorldState::Dark
    }
}

fn next_streak(previous: u32, met: bool, continuing: bool) -> u32 {
    match (met, continuing) {
        (false, _) => 0,
        (true, true) => previous.saturating_add(1),
        (true, false) => 1,
    }
}

impl ProgressState {
    /// Scores one day's report. A second report for the same `today` replaces
    /// the first: it is scored against the counters as they were before the
    /// first one, and the first one's XP is taken back.
    pub(crate) fn submit_daily_report(&mut self, report: &HabitReport, today: NaiveDate) -> Outcome {
        let previous_level = self.character_level;
        let baseline = self.baseline_for(today);

        // roll back whatever an earlier report today already applied
        self.streak = baseline.streak;
        self.no_porn_streak = baseline.no_porn_streak;
        self.low_screen_streak = baseline.low_screen_streak;
        self.productivity_streak = baseline.productivity_streak;
        self.daily_rewards.consecutive_days = baseline.consecutive_days;
        self.total_xp = self.total_xp.saturating_sub(baseline.xp_gained);

        let continuing = baseline.last_log_date.is_some() && baseline.last_log_date == today.pred_opt();

        let abstained = report.abstained;
        let low_screen = report.screen_time_minutes <= self.settings.screen_time_limit_minutes;
        let productive = report.productivity_done();
        let perfect = abstained && low_screen && productive;

        let mut xp = 0;
        if abstained {
            xp += ABSTINENCE_XP;
        }
        if low_screen {
            xp += SCREEN_TIME_XP;
        }
        if productive {
            xp += PRODUCTIVITY_XP;
        }
        if perfect {
            xp += PERFECT_DAY_BONUS_XP;
        }

        self.no_porn_streak = next_streak(baseline.no_porn_streak, abstained, continuing);
        self.low_screen_streak = next_streak(baseline.low_screen_streak, low_screen, continuing);
        self.productivity_streak = next_streak(baseline.productivity_streak, productive, continuing);
        self.streak = next_streak(baseline.streak, perfect, continuing);

        if self.streak > 0 && self.streak % 7 == 0 {
            xp += WEEKLY_BONUS_XP;
        }

        self.total_xp = self.total_xp.saturating_add(xp);

        self.daily_rewards.consecutive_days = if continuing {
            baseline.consecutive_days.saturating_add(1)
        } else {
            1
        };
        self.daily_rewards.claimed_today = true;

        let mut events = Vec::new();
        self.refresh_derived();
        if self.character_level > previous_level {
            info!(level = self.character_level, "level up");
            events.push(GameEvent::LevelUp {
                level: self.character_level,
            });
        }
        events.extend(self.evaluate_progress(today));

        self.record_history(today, report, xp);
        self.habits = report.clone();
        self.last_log_date = Some(today);
        self.day_baseline = Some(DayBaseline {
            xp_gained: xp,
            ..baseline
        });

        debug!(
            %today,
            xp,
            streak = self.streak,
            no_porn = self.no_porn_streak,
            low_screen = self.low_screen_streak,
            productivity = self.productivity_streak,
            "daily report scored"
        );

        Outcome {
            xp_gained: xp,
            events,
        }
    }

    fn baseline_for(&self, today: NaiveDate) -> DayBaseline {
        if self.last_log_date == Some(today) {
            if let Some(b) = &self.day_baseline {
                return b.clone();
            }
            // Saved before baselines were tracked. Today's XP is known from
            // history; the counters are stepped back one day so the run that
            // led into today still continues.
            debug!(%today, "same-day report without a baseline");
            return DayBaseline {
                last_log_date: today.pred_opt(),
                streak: self.streak.saturating_sub(1),
                no_porn_streak: self.no_porn_streak.saturating_sub(1),
                low_screen_streak: self.low_screen_streak.saturating_sub(1),
                productivity_streak: self.productivity_streak.saturating_sub(1),
                consecutive_days: self.daily_rewards.consecutive_days.saturating_sub(1),
                xp_gained: self
                    .habit_history
                    .iter()
                    .rfind(|h| h.date == today)
                    .map_or(0, |h| h.xp_gained),
            };
        }
        self.snapshot()
    }

    fn snapshot(&self) -> DayBaseline {
        DayBaseline {
            last_log_date: self.last_log_date,
            streak: self.streak,
            no_porn_streak: self.no_porn_streak,
            low_screen_streak: self.low_screen_streak,
            productivity_streak: self.productivity_streak,
            consecutive_days: self.daily_rewards.consecutive_days,
            xp_gained: 0,
        }
    }

    fn record_history(&mut self, today: NaiveDate, report: &HabitReport, xp_gained: u64) {
        let entry = HistoryEntry {
            date: today,
            habits: report.clone(),
            xp_gained,
        };
        // kept in date order even if the clock went backwards
        let at = self.habit_history.partition_point(|h| h.date < today);
        match self.habit_history.get_mut(at) {
            Some(existing) if existing.date == today => {
                *existing = entry;
                return;
            }
            _ => self.habit_history.insert(at, entry),
        }
        if self.habit_history.len() > HISTORY_LIMIT {
            let excess = self.habit_history.len() - HISTORY_LIMIT;
            self.habit_history.drain(..excess);
        }
    }

    /// Adds newly reached locations and achievements. Neither is ever removed.
    pub(crate) fn evaluate_progress(&mut self, today: NaiveDate) -> Vec<GameEvent> {
        let mut events = Vec::new();

        for loc in LOCATIONS {
            let Some(open) = loc.unlocked_when else {
                continue;
            };
            if !self.unlocked_locations.contains(&loc.id) && open(self) {
                self.unlocked_locations.insert(loc.id);
                info!(location = ?loc.id, "location unlocked");
                events.push(GameEvent::LocationUnlocked(loc.id));
            }
        }

        for def in ACHIEVEMENTS {
            if !self.has_achievement(def.id) && (def.earned_when)(self) {
                self.achievements.push(EarnedAchievement {
                    id: def.id,
                    earned_on: Some(today),
                });
                info!(achievement = ?def.id, "achievement earned");
                events.push(GameEvent::AchievementEarned(def.id));
            }
        }

        events
    }

    /// Recomputes `character_level` and `world_state`. Neither is ever set
    /// anywhere else.
    pub(crate) fn refresh_derived(&mut self) {
        self.character_level = level_for(self.total_xp);
        self.world_state = world_state_for(self.mean_streak());
    }

    pub(crate) fn ensure_daily_challenge<R: Rng + ?Sized>(
        &mut self,
        today: NaiveDate,
        rng: &mut R,
    ) -> Option<GameEvent> {
        if self.challenge_for(today).is_some() {
            return None;
        }
        let template = &CHALLENGES[rng.gen_range(0..CHALLENGES.len())];
        let challenge = template.stamp(today);
        debug!(id = ?challenge.id, %today, "new daily challenge");
        let event = GameEvent::NewChallenge {
            id: challenge.id,
            title: challenge.title.clone(),
            description: challenge.description.clone(),
            xp_reward: challenge.xp_reward,
        };
        self.challenges.push(challenge);
        self.challenges
            .retain(|c| (today - c.date).num_days() < HISTORY_LIMIT as i64);
        Some(event)
    }

    /// Returns `None` (nothing awarded, nothing changed) unless an open
    /// challenge with `id` exists. The most recent open one is completed.
    pub(crate) fn complete_challenge(&mut self, id: ChallengeId, today: NaiveDate) -> Option<Outcome> {
        let challenge = self
            .challenges
            .iter_mut()
            .rev()
            .find(|c| c.id == id && !c.completed)?;
        challenge.completed = true;
        let reward = challenge.xp_reward;

        let previous_level = self.character_level;
        self.total_xp = self.total_xp.saturating_add(reward);
        self.refresh_derived();

        let mut events = vec![GameEvent::ChallengeCompleted {
            id,
            xp_reward: reward,
        }];
        if self.character_level > previous_level {
            events.push(GameEvent::LevelUp {
                level: self.character_level,
            });
        }
        events.extend(self.evaluate_progress(today));

        Some(Outcome {
            xp_gained: reward,
            events,
        })
    }

    pub(crate) fn reset_all() -> ProgressState {
        ProgressState::default()
    }

    /// Tracks the login streak and refreshes `claimed_today` for a new day.
    pub(crate) fn record_login(&mut self, today: NaiveDate) {
        match self.last_login_date {
            Some(d) if d == today => {}
            Some(d) if Some(d) == today.pred_opt() => {
                self.login_streak = self.login_streak.saturating_add(1);
            }
            _ => self.login_streak = 1,
        }
        self.last_login_date = Some(today);
        self.daily_rewards.claimed_today = self.last_log_date == Some(today);
    }

    pub(crate) fn visit_location(&mut self, id: LocationId) -> bool {
        if !self.unlocked_locations.contains(&id) {
            return false;
        }
        self.current_location = id;
        true
    }

    pub(crate) fn mean_streak(&self) -> f64 {
        (self.no_porn_streak as f64 + self.low_screen_streak as f64 + self.productivity_streak as f64)
            / 3.0
    }

    pub(crate) fn character_tier(&self) -> CharacterTier {
        match world_state_for(self.mean_streak()) {
            WorldState::Bright => CharacterTier::Hero,
            WorldState::Normal => CharacterTier::Strong,
            WorldState::Dim => CharacterTier::Developing,
            WorldState::Dark => CharacterTier::Novice,
        }
    }

    /// Share of logged days (0-100) that had a productive task.
    pub(crate) fn productivity_score(&self) -> u8 {
        if self.habit_history.is_empty() {
            return 0;
        }
        let done = self
            .habit_history
            .iter()
            .filter(|h| h.habits.productivity_done())
            .count();
        ((done as f64 / self.habit_history.len() as f64) * 100.0).round() as u8
    }

    pub(crate) fn xp_into_level(&self) -> u64 {
        self.total_xp % XP_PER_LEVEL
    }

    pub(crate) fn xp_to_next_level(&self) -> u64 {
        XP_PER_LEVEL - self.xp_into_level()
    }

    /// Picks a message, or nothing when the configured frequency says to
    /// stay quiet this time.
    pub(crate) fn motivational_message<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&'static str> {
        let chance = match self.settings.motivation_frequency {
            MotivationFrequency::Low => 0.34,
            MotivationFrequency::Medium => 0.67,
            MotivationFrequency::High => 1.0,
        };
        if !rng.gen_bool(chance) {
            return None;
        }
        let mut pool: Vec<&'static str> = catalog::MOTIVATION.to_vec();
        if self.streak >= 30 {
            pool.push(catalog::MONTH_MILESTONE);
        } else if self.streak >= 7 {
            pool.push(catalog::WEEK_MILESTONE);
        }
        Some(pool[rng.gen_range(0..pool.len())])
    }
}
