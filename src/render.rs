//! Plain-text views of the progress record for the terminal.

use crate::catalog::{self, ACHIEVEMENTS, LOCATIONS};
use crate::engine::GameEvent;
use crate::model::{Challenge, ProgressState, Theme, WorldState, XP_PER_LEVEL};
use chrono::NaiveDate;
use clap::ValueEnum;
use crossterm::style::{Color, Stylize};
const BAR_WIDTH: u64 = 30;

/// Newline-terminated text from a view's lines.
pub(crate) fn join_lines(lines: &[String]) -> String {
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn accent(theme: Theme) -> Color {
    match theme {
        Theme::Dark => Color::Cyan,
        Theme::Light => Color::Blue,
    }
}

fn world_color(world: WorldState) -> Color {
    match world {
        WorldState::Bright => Color::Green,
        WorldState::Normal => Color::Yellow,
        WorldState::Dim => Color::DarkYellow,
        WorldState::Dark => Color::DarkGrey,
    }
}

pub(crate) fn xp_bar(into_level: u64) -> String {
    let filled = (into_level.min(XP_PER_LEVEL) * BAR_WIDTH / XP_PER_LEVEL) as usize;
    format!(
        "[{}{}]",
        "#".repeat(filled),
        "-".repeat(BAR_WIDTH as usize - filled)
    )
}

pub(crate) fn dashboard(st: &ProgressState, today: NaiveDate, message: Option<&str>) -> String {
    let a = accent(st.settings.theme);
    let world = catalog::world_view(st.world_state);

    let mut lines = vec![
        format!(
            "{}  {}",
            format!("Level {}", st.character_level).with(a).bold(),
            format!("{} XP total", st.total_xp).with(a)
        ),
        format!(
            "{} {} / {} XP ({} to next level)",
            xp_bar(st.xp_into_level()),
            st.xp_into_level(),
            XP_PER_LEVEL,
            st.xp_to_next_level()
        ),
        String::new(),
        format!("Perfect-day streak  {:>4}", st.streak),
        format!("Abstinence streak   {:>4}", st.no_porn_streak),
        format!("Low screen streak   {:>4}", st.low_screen_streak),
        format!("Productivity streak {:>4}", st.productivity_streak),
        format!(
            "Logged days in a row {:>3}   Login streak {:>3}   Productivity {:>3}%",
            st.daily_rewards.consecutive_days,
            st.login_streak,
            st.productivity_score()
        ),
        String::new(),
        format!(
            "{}  {} / {}",
            format!("World: {:?}", st.world_state).with(world_color(st.world_state)),
            world.terrain,
            world.weather
        ),
        world.status.to_string(),
        catalog::character_status(st.character_tier()).to_string(),
        String::new(),
    ];

    lines.push(if st.daily_rewards.claimed_today {
        "Today's habits are logged.".green().to_string()
    } else {
        "Today's habits are not logged yet.".yellow().to_string()
    });
    lines.push(match st.challenge_for(today) {
        Some(c) => format!("Today's challenge: {}", challenge_line(c)),
        None => "No challenge yet. Log your habits first!".to_string(),
    });

    if let Some(m) = message {
        lines.push(String::new());
        lines.push(m.italic().to_string());
    }
    join_lines(&lines)
}

fn challenge_line(c: &Challenge) -> String {
    let status = if c.completed {
        "completed".green().to_string()
    } else {
        "open".yellow().to_string()
    };
    format!(
        "{} ({}): {} [+{} XP, {}]",
        c.title,
        c.id.to_possible_value()
            .map(|v| v.get_name().to_owned())
            .unwrap_or_default(),
        c.description,
        c.xp_reward,
        status
    )
}

pub(crate) fn challenges(st: &ProgressState, today: NaiveDate) -> String {
    let mut lines = match st.challenge_for(today) {
        Some(c) => vec!["Today".bold().to_string(), format!("  {}", challenge_line(c))],
        None => vec!["No challenges available yet. Log your habits first!".to_string()],
    };
    let previous: Vec<_> = st.challenges.iter().filter(|c| c.date != today).collect();
    if !previous.is_empty() {
        lines.push("Previous challenges".bold().to_string());
        lines.extend(
            previous
                .iter()
                .rev()
                .map(|c| format!("  {}  {}", c.date, challenge_line(c))),
        );
    }
    join_lines(&lines)
}

pub(crate) fn history(st: &ProgressState, today: NaiveDate, days: usize) -> String {
    if st.habit_history.is_empty() {
        return "No history available yet. Start by logging your habits!\n".to_string();
    }
    let tick = |ok: bool| if ok { "yes" } else { "no " };
    let skip = st.habit_history.len().saturating_sub(days);
    let lines: Vec<String> = st.habit_history[skip..]
        .iter()
        .map(|h| {
            format!(
                "{}{}  abstained {}  screen {:>4}m  productive {}  +{} XP",
                h.date,
                if h.date == today { " (today)" } else { "        " },
                tick(h.habits.abstained),
                h.habits.screen_time_minutes,
                tick(h.habits.productivity_done()),
                h.xp_gained
            )
        })
        .collect();
    join_lines(&lines)
}

pub(crate) fn achievements(st: &ProgressState) -> String {
    let lines: Vec<String> = ACHIEVEMENTS
        .iter()
        .map(|def| match st.achievements.iter().find(|a| a.id == def.id) {
            Some(earned) => format!(
                "{} {}: {}{}",
                "[x]".green(),
                def.title.bold(),
                def.description,
                earned
                    .earned_on
                    .map(|d| format!(" on {d}"))
                    .unwrap_or_default()
            ),
            None => format!("{} {}: {}", "[ ]".dark_grey(), def.title, def.description),
        })
        .collect();
    join_lines(&lines)
}

pub(crate) fn map(st: &ProgressState) -> String {
    let mut lines = vec![
        catalog::world_view(st.world_state).narrative.to_string(),
        String::new(),
    ];
    for loc in LOCATIONS {
        let here = if loc.id == st.current_location { " <- you are here" } else { "" };
        lines.push(if st.unlocked_locations.contains(&loc.id) {
            format!("{} {}{}", "*".green(), loc.name.bold(), here)
        } else {
            format!("{} {} (locked: {})", "-".dark_grey(), loc.name, loc.unlock_hint)
        });
    }
    join_lines(&lines)
}

pub(crate) fn event(ev: &GameEvent) -> String {
    match ev {
        GameEvent::LevelUp { level } => {
            format!("{} You reached level {level}!", "Level Up!".green().bold())
        }
        GameEvent::LocationUnlocked(id) => format!(
            "{} You unlocked the {}!",
            "New Location Unlocked!".green().bold(),
            catalog::location(*id).name
        ),
        GameEvent::AchievementEarned(id) => {
            let def = catalog::achievement(*id);
            format!(
                "{} {}: {}",
                "Achievement Unlocked!".magenta().bold(),
                def.title,
                def.description
            )
        }
        GameEvent::NewChallenge {
            title,
            description,
            xp_reward,
            ..
        } => format!(
            "{} {title}: {description} (+{xp_reward} XP)",
            "New Challenge!".blue().bold()
        ),
        GameEvent::ChallengeCompleted { xp_reward, .. } => {
            format!("{} +{xp_reward} XP", "Challenge Complete!".green().bold())
        }
    }
}
