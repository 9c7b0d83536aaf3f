use crate::model::{hh_mm, ChallengeId, HabitReport, LocationId, MotivationFrequency, Theme};
use chrono::NaiveTime;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "victory-road")]
#[command(version, about = "Turn daily habits into XP, streaks and a world that grows with you")]
pub(crate) struct Cli {
    /// Directory holding save.json and config.json (default: platform data dir)
    #[arg(long, global = true)]
    pub(crate) data_dir: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true, default_value_t = false)]
    pub(crate) verbose: bool,

    #[command(subcommand)]
    pub(crate) command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Show level, streaks, world and today's challenge
    Status,
    /// Log today's habits
    Log(LogArgs),
    /// List today's and previous challenges
    Challenges,
    /// Mark a challenge as completed
    Complete {
        #[arg(value_enum)]
        id: ChallengeId,
    },
    /// Show recently logged days
    History {
        #[arg(long, default_value_t = 7)]
        days: usize,
    },
    /// Show earned and locked achievements
    Achievements,
    /// Show the world map
    Map,
    /// Travel to an unlocked location
    Visit {
        #[arg(value_enum)]
        location: LocationId,
    },
    /// Show or change settings
    Settings(SettingsArgs),
    /// Erase all progress
    Reset {
        /// Skip the confirmation prompt
        #[arg(long, default_value_t = false)]
        yes: bool,
    },
    /// Serve the web bundle and send daily reminders
    Serve {
        #[arg(long)]
        port: Option<u16>,
        #[arg(long)]
        static_dir: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
pub(crate) struct LogArgs {
    /// The target behavior did not happen today
    #[arg(long, conflicts_with = "relapsed", required_unless_present = "relapsed")]
    pub(crate) abstained: bool,

    /// The target behavior happened today
    #[arg(long)]
    pub(crate) relapsed: bool,

    /// Minutes of screen time today
    #[arg(long, value_name = "MINUTES")]
    pub(crate) screen_time: u32,

    /// A productive task you completed
    #[arg(long, default_value = "")]
    pub(crate) task: String,
}

impl LogArgs {
    pub(crate) fn report(&self) -> HabitReport {
        HabitReport {
            abstained: self.abstained && !self.relapsed,
            screen_time_minutes: self.screen_time,
            productivity_note: self.task.clone(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum Toggle {
    On,
    Off,
}

#[derive(Args, Debug, Default)]
pub(crate) struct SettingsArgs {
    /// Daily screen time limit in minutes
    #[arg(long, value_name = "MINUTES")]
    pub(crate) screen_time_limit: Option<u32>,

    #[arg(long, value_enum)]
    pub(crate) theme: Option<Theme>,

    /// How often to show motivational messages
    #[arg(long, value_enum)]
    pub(crate) motivation: Option<MotivationFrequency>,

    /// Daily reminder time (HH:MM)
    #[arg(long, value_parser = parse_time)]
    pub(crate) reminder: Option<NaiveTime>,

    #[arg(long, value_enum)]
    pub(crate) notifications: Option<Toggle>,
}

impl SettingsArgs {
    pub(crate) fn is_empty(&self) -> bool {
        self.screen_time_limit.is_none()
            && self.theme.is_none()
            && self.motivation.is_none()
            && self.reminder.is_none()
            && self.notifications.is_none()
    }
}

fn parse_time(s: &str) -> Result<NaiveTime, String> {
    hh_mm::parse(s).map_err(|_| format!("expected HH:MM, got {s:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn log_builds_a_report() {
        let cli = Cli::try_parse_from([
            "victory-road",
            "log",
            "--abstained",
            "--screen-time",
            "30",
            "--task",
            "wrote report",
        ])
        .unwrap();
        let Some(Command::Log(args)) = cli.command else {
            panic!("expected log");
        };
        assert_eq!(
            args.report(),
            HabitReport {
                abstained: true,
                screen_time_minutes: 30,
                productivity_note: "wrote report".into(),
            }
        );
    }

    #[test]
    fn log_needs_exactly_one_outcome() {
        assert!(Cli::try_parse_from(["victory-road", "log", "--screen-time", "5"]).is_err());
        assert!(Cli::try_parse_from([
            "victory-road",
            "log",
            "--abstained",
            "--relapsed",
            "--screen-time",
            "5"
        ])
        .is_err());
        let cli =
            Cli::try_parse_from(["victory-road", "log", "--relapsed", "--screen-time", "5"]).unwrap();
        let Some(Command::Log(args)) = cli.command else {
            panic!("expected log");
        };
        assert!(!args.report().abstained);
    }

    #[test]
    fn negative_screen_time_is_rejected() {
        assert!(Cli::try_parse_from([
            "victory-road",
            "log",
            "--abstained",
            "--screen-time",
            "-5"
        ])
        .is_err());
    }

    #[test]
    fn ids_parse_in_kebab_case() {
        let cli = Cli::try_parse_from(["victory-road", "complete", "mindful-moment"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Command::Complete {
                id: ChallengeId::MindfulMoment
            })
        ));
        assert!(Cli::try_parse_from(["victory-road", "visit", "atlantis"]).is_err());
    }

    #[test]
    fn reminder_time_is_validated() {
        let cli = Cli::try_parse_from(["victory-road", "settings", "--reminder", "07:45"]).unwrap();
        let Some(Command::Settings(s)) = cli.command else {
            panic!("expected settings");
        };
        assert_eq!(s.reminder, NaiveTime::from_hms_opt(7, 45, 0));
        assert!(Cli::try_parse_from(["victory-road", "settings", "--reminder", "7pm"]).is_err());
    }
}
