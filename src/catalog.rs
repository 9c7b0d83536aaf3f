//! Fixed game content: achievements, challenge templates, locations and
//! the flavour text shown for each world mood and character tier.

use crate::model::{
    AchievementId, Challenge, ChallengeId, CharacterTier, LocationId, ProgressState, WorldState,
};
use chrono::NaiveDate;

pub(crate) struct AchievementDef {
    pub(crate) id: AchievementId,
    pub(crate) title: &'static str,
    pub(crate) description: &'static str,
    pub(crate) earned_when: fn(&ProgressState) -> bool,
}

pub(crate) const ACHIEVEMENTS: &[AchievementDef] = &[
    AchievementDef {
        id: AchievementId::WeekNoPorn,
        title: "Week of Purity",
        description: "7 days without porn",
        earned_when: week_no_porn,
    },
    AchievementDef {
        id: AchievementId::WeekDiscipline,
        title: "Disciplined Week",
        description: "7 days of perfect habits",
        earned_when: week_discipline,
    },
    AchievementDef {
        id: AchievementId::ThousandXp,
        title: "Thousand XP",
        description: "Reached 1000 total XP",
        earned_when: thousand_xp,
    },
    AchievementDef {
        id: AchievementId::DailyStreak,
        title: "Daily Commitment",
        description: "Logged habits for 7 consecutive days",
        earned_when: daily_streak,
    },
    AchievementDef {
        id: AchievementId::ProductivityMaster,
        title: "Productivity Master",
        description: "14 days of productive tasks",
        earned_when: productivity_master,
    },
];

fn week_no_porn(s: &ProgressState) -> bool {
    s.no_porn_streak >= 7
}

fn week_discipline(s: &ProgressState) -> bool {
    s.streak >= 7
}

fn thousand_xp(s: &ProgressState) -> bool {
    s.total_xp >= 1000
}

fn daily_streak(s: &ProgressState) -> bool {
    s.daily_rewards.consecutive_days >= 7
}

fn productivity_master(s: &ProgressState) -> bool {
    s.productivity_streak >= 14
}

pub(crate) fn achievement(id: AchievementId) -> &'static AchievementDef {
    ACHIEVEMENTS
        .iter()
        .find(|a| a.id == id)
        .unwrap_or(&ACHIEVEMENTS[0])
}

pub(crate) struct ChallengeTemplate {
    pub(crate) id: ChallengeId,
    pub(crate) title: &'static str,
    pub(crate) description: &'static str,
    pub(crate) xp_reward: u64,
}

impl ChallengeTemplate {
    pub(crate) fn stamp(&self, date: NaiveDate) -> Challenge {
        Challenge {
            id: self.id,
            date,
            title: self.title.to_string(),
            description: self.description.to_string(),
            xp_reward: self.xp_reward,
            completed: false,
        }
    }
}

pub(crate) const CHALLENGES: &[ChallengeTemplate] = &[
    ChallengeTemplate {
        id: ChallengeId::LessScreen,
        title: "Screen Time Challenge",
        description: "Keep screen time under 60 minutes",
        xp_reward: 25,
    },
    ChallengeTemplate {
        id: ChallengeId::ProductiveTask,
        title: "Deep Work Challenge",
        description: "Complete a meaningful productive task",
        xp_reward: 35,
    },
    ChallengeTemplate {
        id: ChallengeId::MindfulMoment,
        title: "Mindfulness Challenge",
        description: "Take 5 minutes for mindfulness",
        xp_reward: 20,
    },
    ChallengeTemplate {
        id: ChallengeId::HelpSomeone,
        title: "Service Challenge",
        description: "Do something kind for someone else",
        xp_reward: 30,
    },
];

pub(crate) struct LocationDef {
    pub(crate) id: LocationId,
    pub(crate) name: &'static str,
    pub(crate) narrative: &'static str,
    pub(crate) unlock_hint: &'static str,
    /// `None` for locations that are open from the start.
    pub(crate) unlocked_when: Option<fn(&ProgressState) -> bool>,
}

pub(crate) const LOCATIONS: &[LocationDef] = &[
    LocationDef {
        id: LocationId::Village,
        name: "Home Village",
        narrative: "You explore this area. The path of recovery has many destinations, each offering its own lessons.",
        unlock_hint: "Where every journey begins",
        unlocked_when: None,
    },
    LocationDef {
        id: LocationId::Forest,
        name: "Forest of Focus",
        narrative: "You enter the Forest of Focus. Here, your mind becomes clear and distractions fade away.",
        unlock_hint: "Abstain for 7 days in a row",
        unlocked_when: Some(forest_open),
    },
    LocationDef {
        id: LocationId::Mountain,
        name: "Mountain of Discipline",
        narrative: "You climb the Mountain of Discipline. Each step strengthens your willpower and resolve.",
        unlock_hint: "Keep a 14 day perfect streak",
        unlocked_when: Some(mountain_open),
    },
    LocationDef {
        id: LocationId::Ocean,
        name: "Ocean of Calm",
        narrative: "You reach the Ocean of Calm. The rhythmic waves help center your thoughts and emotions.",
        unlock_hint: "Earn 1000 XP",
        unlocked_when: Some(ocean_open),
    },
];

fn forest_open(s: &ProgressState) -> bool {
    s.no_porn_streak >= 7
}

fn mountain_open(s: &ProgressState) -> bool {
    s.streak >= 14
}

fn ocean_open(s: &ProgressState) -> bool {
    s.total_xp >= 1000
}

pub(crate) fn location(id: LocationId) -> &'static LocationDef {
    LOCATIONS
        .iter()
        .find(|l| l.id == id)
        .unwrap_or(&LOCATIONS[0])
}

pub(crate) struct WorldView {
    pub(crate) terrain: &'static str,
    pub(crate) weather: &'static str,
    pub(crate) status: &'static str,
    pub(crate) narrative: &'static str,
}

pub(crate) fn world_view(world: WorldState) -> WorldView {
    match world {
        WorldState::Bright => WorldView {
            terrain: "Lush Greenery",
            weather: "Sunny & Clear",
            status: "The world is bright and full of life! Your discipline brings light.",
            narrative: "The land glows with your strength. Your discipline has brought peace and prosperity. The people celebrate your unwavering willpower.",
        },
        WorldState::Normal => WorldView {
            terrain: "Decent Landscape",
            weather: "Partly Cloudy",
            status: "The world has a balanced atmosphere. Keep making good choices.",
            narrative: "The land thrives under your growing discipline. Your journey shows you are developing true strength.",
        },
        WorldState::Dim => WorldView {
            terrain: "Dry Terrain",
            weather: "Overcast",
            status: "The world appears more challenging now. Remember, setbacks are temporary.",
            narrative: "The land responds to your efforts. Though challenges remain, your determination is growing.",
        },
        WorldState::Dark => WorldView {
            terrain: "Barren Land",
            weather: "Stormy",
            status: "The world is dark, but there is still hope. One good day can change everything.",
            narrative: "The land reflects your struggle. But remember, every hero faces trials. Your journey has just begun.",
        },
    }
}

pub(crate) fn character_status(tier: CharacterTier) -> &'static str {
    match tier {
        CharacterTier::Hero => "Your hero is at peak strength! Keep it up!",
        CharacterTier::Strong => "Your character grows stronger with discipline!",
        CharacterTier::Developing => "Your character is developing through effort!",
        CharacterTier::Novice => "Your character is on a journey of growth!",
    }
}

pub(crate) const MOTIVATION: &[&str] = &[
    "Every choice builds character. Choose wisely.",
    "The hero within you grows stronger with each challenge.",
    "Small victories today create great triumphs tomorrow.",
    "Your willpower is a muscle that strengthens with use.",
    "Each day without relapse is a victory worth celebrating.",
    "You have the power to change your habits and your life.",
    "Discipline is choosing between what you want now and what you want most.",
    "Your future self will thank you for the choices you make today.",
    "The journey of a thousand miles begins with a single step.",
    "You are stronger than your urges.",
    "Progress, not perfection, is the goal.",
    "Recovery is not a destination but a journey of daily choices.",
    "Your strength today creates your freedom tomorrow.",
    "Each day of discipline is a gift to your future self.",
    "You've overcome challenges before, and you can do it again.",
    "Every moment is a new opportunity to make a positive choice.",
];

pub(crate) const MONTH_MILESTONE: &str =
    "A month of discipline! You're developing incredible strength.";
pub(crate) const WEEK_MILESTONE: &str = "A week of consistency! Your discipline is taking root.";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_id_has_exactly_one_definition() {
        for id in [
            AchievementId::WeekNoPorn,
            AchievementId::WeekDiscipline,
            AchievementId::ThousandXp,
            AchievementId::DailyStreak,
            AchievementId::ProductivityMaster,
        ] {
            assert_eq!(ACHIEVEMENTS.iter().filter(|a| a.id == id).count(), 1);
        }
        for id in [
            LocationId::Village,
            LocationId::Forest,
            LocationId::Mountain,
            LocationId::Ocean,
        ] {
            assert_eq!(LOCATIONS.iter().filter(|l| l.id == id).count(), 1);
        }
        assert_eq!(CHALLENGES.len(), 4);
    }

    #[test]
    fn only_the_village_is_open_from_the_start() {
        for l in LOCATIONS {
            assert_eq!(l.unlocked_when.is_none(), l.id == LocationId::Village);
        }
    }

    #[test]
    fn stamped_challenge_starts_open() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let c = CHALLENGES[1].stamp(day);
        assert_eq!(c.id, ChallengeId::ProductiveTask);
        assert_eq!(c.xp_reward, 35);
        assert_eq!(c.date, day);
        assert!(!c.completed);
    }
}
