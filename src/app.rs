use crate::catalog;
use crate::cli::{Cli, Command, SettingsArgs, Toggle};
use crate::config::{
    load_config, project_paths, resolve_port, save_config_atomic, AppConfig, Paths,
};
use crate::model::ProgressState;
use crate::render;
use crate::reminder;
use crate::server;
use crate::storage::{load_state, save_state, JsonFileStore, SaveLock};
use anyhow::{Context, Result};
use chrono::{Datelike, Local, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::io::{self, BufRead, Write as _};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

pub(crate) async fn run(cli: Cli) -> Result<()> {
    let paths = project_paths(cli.data_dir.as_deref())?;
    let config = load_config(&paths.config_path);
    init_logging(&config, cli.verbose);

    if !paths.config_path.exists() {
        if let Err(e) = save_config_atomic(&paths.config_path, &config) {
            warn!(error = %e, "could not write default config");
        }
    }

    let today = Local::now().date_naive();
    let mut rng = make_rng(config.seed, today);

    match cli.command.unwrap_or(Command::Status) {
        Command::Serve { port, static_dir } => {
            let port = resolve_port(port, std::env::var("PORT").ok().as_deref(), &config);
            let static_dir = static_dir.unwrap_or_else(|| config.static_dir.clone());
            let reminder = reminder::spawn_daily(JsonFileStore::new(&paths.save_path));
            let served = server::run(port, &static_dir).await;
            reminder.abort();
            served
        }
        Command::Reset { yes } => {
            if !yes && !confirm_reset()? {
                println!("Reset cancelled.");
                return Ok(());
            }
            let mut session = Session::open(&paths, today)?;
            session.state = ProgressState::reset_all();
            session.commit()?;
            info!("progress reset");
            println!("All data has been reset. Your journey starts anew!");
            Ok(())
        }
        command => {
            let mut session = Session::open(&paths, today)?;
            let output = execute(&mut session.state, command, today, &mut rng);
            session.commit()?;
            print!("{output}");
            Ok(())
        }
    }
}

fn init_logging(config: &AppConfig, verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// With a configured seed the picks repeat for a given day but still vary
/// from day to day.
fn make_rng(seed: Option<u64>, today: NaiveDate) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s ^ today.num_days_from_ce() as u64),
        None => StdRng::from_entropy(),
    }
}

/// An open read-modify-write cycle on the save. The lock is held until the
/// session is dropped, so two invocations can never interleave.
pub(crate) struct Session {
    store: JsonFileStore,
    _lock: SaveLock,
    pub(crate) state: ProgressState,
}

impl Session {
    pub(crate) fn open(paths: &Paths, today: NaiveDate) -> Result<Self> {
        let store = JsonFileStore::new(&paths.save_path);
        let lock = SaveLock::acquire(&paths.lock_path)?;
        let mut state = load_state(&store).context("could not load progress")?;
        state.record_login(today);
        Ok(Self {
            store,
            _lock: lock,
            state,
        })
    }

    pub(crate) fn commit(self) -> Result<()> {
        save_state(&self.store, &self.state).context("could not save progress")?;
        Ok(())
    }
}

fn confirm_reset() -> Result<bool> {
    print!("This erases all progress and cannot be undone. Type 'reset' to confirm: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(reset_confirmed(&line))
}

fn reset_confirmed(input: &str) -> bool {
    input.trim() == "reset"
}

pub(crate) fn execute<R: Rng + ?Sized>(
    state: &mut ProgressState,
    command: Command,
    today: NaiveDate,
    rng: &mut R,
) -> String {
    match command {
        Command::Status => {
            let message = state.motivational_message(rng);
            render::dashboard(state, today, message)
        }
        Command::Log(args) => {
            let outcome = state.submit_daily_report(&args.report(), today);
            let mut lines = vec![format!("Log saved! You earned {} XP today!", outcome.xp_gained)];
            lines.extend(outcome.events.iter().map(render::event));
            lines.extend(state.ensure_daily_challenge(today, rng).as_ref().map(render::event));
            lines.push("Keep up the great work on your recovery journey!".to_string());
            render::join_lines(&lines)
        }
        Command::Challenges => render::challenges(state, today),
        Command::Complete { id } => match state.complete_challenge(id, today) {
            Some(outcome) => {
                let lines: Vec<String> = outcome.events.iter().map(render::event).collect();
                render::join_lines(&lines)
            }
            None => {
                debug!(?id, "nothing to complete");
                format!("There is no open {id:?} challenge to complete.\n")
            }
        },
        Command::History { days } => render::history(state, today, days),
        Command::Achievements => render::achievements(state),
        Command::Map => render::map(state),
        Command::Visit { location } => {
            let def = catalog::location(location);
            if state.visit_location(location) {
                format!("{}\n", def.narrative)
            } else {
                format!("{} is still locked. {}.\n", def.name, def.unlock_hint)
            }
        }
        Command::Settings(args) => {
            apply_settings(state, &args);
            settings_summary(state)
        }
        // handled before a session is opened
        Command::Reset { .. } | Command::Serve { .. } => String::new(),
    }
}

fn apply_settings(state: &mut ProgressState, args: &SettingsArgs) {
    let s = &mut state.settings;
    if let Some(limit) = args.screen_time_limit {
        s.screen_time_limit_minutes = limit;
    }
    if let Some(theme) = args.theme {
        s.theme = theme;
    }
    if let Some(freq) = args.motivation {
        s.motivation_frequency = freq;
    }
    if let Some(at) = args.reminder {
        s.notifications.time = at;
    }
    if let Some(toggle) = args.notifications {
        s.notifications.enabled = toggle == Toggle::On;
    }
    if !args.is_empty() {
        debug!(settings = ?state.settings, "settings updated");
    }
}

fn settings_summary(state: &ProgressState) -> String {
    let s = &state.settings;
    render::join_lines(&[
        format!("Screen time limit   {} minutes", s.screen_time_limit_minutes),
        format!("Theme               {:?}", s.theme),
        format!("Motivation          {:?}", s.motivation_frequency),
        format!(
            "Daily reminder      {} ({})",
            s.notifications.time.format("%H:%M"),
            if s.notifications.enabled { "on" } else { "off" }
        ),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::LogArgs;
    use crate::model::{ChallengeId, LocationId, MotivationFrequency};
    use chrono::NaiveTime;
    use tempfile::tempdir;

    fn day(n: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 9, 1).unwrap() + chrono::Duration::days(n)
    }

    fn log(abstained: bool, minutes: u32, task: &str) -> Command {
        Command::Log(LogArgs {
            abstained,
            relapsed: !abstained,
            screen_time: minutes,
            task: task.into(),
        })
    }

    #[test]
    fn logging_reports_xp_and_creates_a_challenge() {
        let mut st = ProgressState::default();
        let mut rng = StdRng::seed_from_u64(11);
        let out = execute(&mut st, log(true, 30, "wrote report"), day(0), &mut rng);
        assert!(out.contains("You earned 170 XP"));
        assert!(out.contains("New Challenge!"));
        assert_eq!(st.challenges.len(), 1);

        // logging again the same day does not add a second challenge
        execute(&mut st, log(true, 30, "wrote report"), day(0), &mut rng);
        assert_eq!(st.challenges.len(), 1);
        assert_eq!(st.total_xp, 170);
    }

    #[test]
    fn completing_reports_success_or_nothing() {
        let mut st = ProgressState::default();
        let mut rng = StdRng::seed_from_u64(5);
        execute(&mut st, log(false, 500, ""), day(0), &mut rng);
        let id = st.challenges[0].id;
        let reward = st.challenges[0].xp_reward;

        let out = execute(&mut st, Command::Complete { id }, day(0), &mut rng);
        assert!(out.contains(&format!("+{reward} XP")));
        assert_eq!(st.total_xp, reward);

        let out = execute(&mut st, Command::Complete { id }, day(0), &mut rng);
        assert!(out.contains("no open"));
        assert_eq!(st.total_xp, reward);
    }

    #[test]
    fn unknown_challenge_is_a_no_op() {
        let mut st = ProgressState::default();
        let mut rng = StdRng::seed_from_u64(5);
        let before = st.clone();
        execute(
            &mut st,
            Command::Complete {
                id: ChallengeId::HelpSomeone,
            },
            day(0),
            &mut rng,
        );
        assert_eq!(st, before);
    }

    #[test]
    fn settings_are_applied() {
        let mut st = ProgressState::default();
        let mut rng = StdRng::seed_from_u64(5);
        let args = SettingsArgs {
            screen_time_limit: Some(60),
            motivation: Some(MotivationFrequency::Low),
            reminder: NaiveTime::from_hms_opt(7, 0, 0),
            notifications: Some(Toggle::Off),
            ..SettingsArgs::default()
        };
        let out = execute(&mut st, Command::Settings(args), day(0), &mut rng);
        assert_eq!(st.settings.screen_time_limit_minutes, 60);
        assert!(!st.settings.notifications.enabled);
        assert!(out.contains("07:00 (off)"));

        // the new limit applies to the next report
        let out = execute(&mut st, log(false, 90, ""), day(0), &mut rng);
        assert!(out.contains("You earned 0 XP"));
    }

    #[test]
    fn visiting_requires_an_unlock() {
        let mut st = ProgressState::default();
        let mut rng = StdRng::seed_from_u64(5);
        let out = execute(
            &mut st,
            Command::Visit {
                location: LocationId::Mountain,
            },
            day(0),
            &mut rng,
        );
        assert!(out.contains("still locked"));
        assert_eq!(st.current_location, LocationId::Village);
    }

    #[test]
    fn reset_needs_the_exact_word() {
        assert!(reset_confirmed("reset\n"));
        assert!(!reset_confirmed("yes\n"));
        assert!(!reset_confirmed(""));
    }

    #[test]
    fn sessions_persist_between_invocations() {
        let dir = tempdir().unwrap();
        let paths = Paths::in_dir(dir.path());
        let mut rng = StdRng::seed_from_u64(2);

        for n in 0..2 {
            let mut session = Session::open(&paths, day(n)).unwrap();
            let out = execute(&mut session.state, log(true, 10, "gym"), day(n), &mut rng);
            assert!(out.contains("You earned 170 XP"));
            session.commit().unwrap();
        }

        let st = load_state(&JsonFileStore::new(&paths.save_path)).unwrap();
        assert_eq!(st.streak, 2);
        assert_eq!(st.login_streak, 2);
        assert_eq!(st.total_xp, 340);
    }

    #[test]
    fn lock_is_released_after_commit() {
        let dir = tempdir().unwrap();
        let paths = Paths::in_dir(dir.path());
        let first = Session::open(&paths, day(0)).unwrap();
        first.commit().unwrap();
        // lock released on drop
        let second = Session::open(&paths, day(0)).unwrap();
        assert_eq!(second.state.login_streak, 1);
    }

    #[test]
    fn seeded_rng_is_stable_within_a_day() {
        let a: u64 = make_rng(Some(9), day(0)).gen();
        let b: u64 = make_rng(Some(9), day(0)).gen();
        let c: u64 = make_rng(Some(9), day(1)).gen();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
