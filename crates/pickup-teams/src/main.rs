// Pickup teams entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to file, not terminal)
// 2. Load config
// 3. Open the formations database
// 4. Import the player pool
// 5. Run the requested mode and print both rosters
// 6. Optionally save the result as a named formation

use std::time::Duration;

use anyhow::{bail, Context};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{error, info};

use pickup_teams::config::{self, Config};
use pickup_teams::db::Database;
use pickup_teams::formation::{FormationRepository, FormationResult, FormationSession, TeamSlot};
use pickup_teams::host::{self, DraftCommand, DraftOutcome, DraftUpdate};
use pickup_teams::pool;

const USAGE: &str = "usage: pickup-teams [balance|shuffle|draft <captain1> <captain2>|saved|load <id>] [--save <name>]";

#[derive(Debug)]
enum Command {
    ListSaved,
    Form(FormMode),
}

/// Ways of producing a pair of rosters.
#[derive(Debug)]
enum FormMode {
    /// Whatever `[balance] shuffle` selects.
    Default,
    Balance,
    Shuffle,
    Draft { captain1: String, captain2: String },
    Load { id: i64 },
}

#[derive(Debug)]
struct Args {
    command: Command,
    save_as: Option<String>,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> anyhow::Result<Args> {
    let mut positional = Vec::new();
    let mut save_as = None;
    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        if arg == "--save" {
            save_as = Some(iter.next().context("--save needs a name")?);
        } else {
            positional.push(arg);
        }
    }

    let command = match positional.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        ["saved"] => Command::ListSaved,
        [] => Command::Form(FormMode::Default),
        ["balance"] => Command::Form(FormMode::Balance),
        ["shuffle"] => Command::Form(FormMode::Shuffle),
        ["draft", c1, c2] => Command::Form(FormMode::Draft {
            captain1: c1.to_string(),
            captain2: c2.to_string(),
        }),
        ["load", id] => Command::Form(FormMode::Load {
            id: id.parse().with_context(|| format!("invalid formation id `{id}`"))?,
        }),
        _ => bail!("{USAGE}"),
    };
    Ok(Args { command, save_as })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing()?;
    info!("Pickup teams starting up");

    let args = parse_args(std::env::args().skip(1))?;

    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: {}s pick timer, {} goalkeeper(s) per team",
        config.draft.pick_timer_seconds, config.balance.goalkeepers_per_team
    );

    if let Some(parent) = config.db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let db_path = config.db_path.to_string_lossy().to_string();
    let repo = FormationRepository::new(Database::open(&db_path).context("failed to open database")?);
    info!("Database opened at {}", db_path);

    match args.command {
        Command::ListSaved => list_saved(&repo).await?,
        Command::Form(mode) => form_teams(&config, &repo, mode, args.save_as).await?,
    }

    info!("Pickup teams shut down cleanly");
    Ok(())
}

async fn list_saved(repo: &FormationRepository<Database>) -> anyhow::Result<()> {
    for f in repo.list().await? {
        let last = f
            .last_used_at
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "never".to_string());
        println!(
            "{:>4}  {:<30}  {} vs {}  used {}x, last {}",
            f.id, f.name, f.team1_color, f.team2_color, f.times_used, last
        );
    }
    Ok(())
}

/// Import the pool, build rosters with `mode`, print them and optionally
/// save them as `save_as`.
async fn form_teams(
    config: &Config,
    repo: &FormationRepository<Database>,
    mode: FormMode,
    save_as: Option<String>,
) -> anyhow::Result<()> {
    let players = pool::load_pool(&config.pool_path).context("failed to load player pool")?;
    info!("Loaded {} players from {}", players.len(), config.pool_path.display());
    let mut session = FormationSession::new(players, config.formation_settings());

    let result = match mode {
        FormMode::Default if config.balance.shuffle => session.shuffle(&mut rand::thread_rng())?,
        FormMode::Default | FormMode::Balance => session.balance()?,
        FormMode::Shuffle => session.shuffle(&mut rand::thread_rng())?,
        FormMode::Draft { captain1, captain2 } => {
            match run_draft(&session, &captain1, &captain2).await? {
                Some(result) => result,
                None => {
                    println!("Draft cancelled");
                    return Ok(());
                }
            }
        }
        FormMode::Load { id } => {
            let saved = repo.load(id).await?;
            let (manual, dropped) = session.manual_from_saved(&saved)?;
            if !dropped.is_empty() {
                println!("Not in today's pool: {}", dropped.join(", "));
            }
            session.score_manual(&manual)
        }
    };

    print_result(&result);

    if let Some(name) = save_as {
        let saved = repo
            .save(
                &name,
                result.player_ids(TeamSlot::Team1),
                result.player_ids(TeamSlot::Team2),
                result.colors(),
            )
            .await?;
        println!("Saved as '{}' (id {})", saved.name, saved.id);
    }
    Ok(())
}

/// Run a snake draft with picks read from stdin as `<pick_number> <player_id>`
/// lines, or `cancel`. Returns `None` when cancelled.
async fn run_draft(
    session: &FormationSession,
    captain1: &str,
    captain2: &str,
) -> anyhow::Result<Option<FormationResult>> {
    let mut draft = session.start_draft()?;
    draft.select_captains(captain1, captain2)?;
    println!("Draft started. Enter `<pick> <player_id>` or `cancel`.");

    let (cmd_tx, cmd_rx) = mpsc::channel(16);
    let (update_tx, mut update_rx) = mpsc::channel(64);

    let input_handle = tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let cmd = match line.split_whitespace().collect::<Vec<_>>().as_slice() {
                ["cancel"] => DraftCommand::Cancel,
                [n, id] => match n.parse() {
                    Ok(pick_number) => DraftCommand::Pick {
                        pick_number,
                        player_id: id.to_string(),
                    },
                    Err(_) => continue,
                },
                _ => continue,
            };
            if cmd_tx.send(cmd).await.is_err() {
                break;
            }
        }
    });

    let printer_handle = tokio::spawn(async move {
        while let Some(update) = update_rx.recv().await {
            match update {
                DraftUpdate::Event(event) => println!("{event:?}"),
                DraftUpdate::Clock(turn) if turn.remaining_ms % 5_000 == 0 => {
                    println!("Pick {} ({}): {}s left", turn.pick_number, turn.slot, turn.remaining_ms / 1_000)
                }
                DraftUpdate::Clock(_) => {}
                DraftUpdate::Rejected(e) => println!("Rejected: {e}"),
            }
        }
    });

    let outcome = host::run(draft, cmd_rx, update_tx, Duration::from_secs(1)).await;
    input_handle.abort();
    if let Err(e) = printer_handle.await {
        error!("Draft printer task failed: {}", e);
    }

    match outcome? {
        DraftOutcome::Completed(done) => Ok(Some(session.score_draft(&done))),
        DraftOutcome::Cancelled => Ok(None),
    }
}

fn print_result(result: &FormationResult) {
    for (slot, color) in [(TeamSlot::Team1, result.team1_color), (TeamSlot::Team2, result.team2_color)] {
        let s = result.strength(slot);
        println!(
            "{} ({}): overall {:.2}  atk {:.2}  mid {:.2}  def {:.2}  gk {:.2}",
            slot, color, s.overall_rating, s.attack_rating, s.midfield_rating, s.defense_rating, s.goalkeeper_rating
        );
        for p in result.roster(slot) {
            println!("  {:<4} {:<20} {:.1}", p.position, p.name, p.overall_rating);
        }
    }
    println!(
        "Difference {:.1}% ({})",
        result.difference_percent, result.band
    );
    for w in &result.warnings {
        println!("Warning: {w}");
    }
    for s in &result.suggestions {
        println!(
            "Rotation: swap {} <-> {} ({:+.1}% difference)",
            s.team1_player_name, s.team2_player_name, s.difference_change_percent
        );
    }
}

/// Initialize tracing to log to a file (the terminal carries the rosters).
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("pickup-teams.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("pickup_teams=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
