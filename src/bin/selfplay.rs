use clap::Parser;
use clickchess::engine::{pick_move, RandomSource};
use clickchess::{ComputerTurn, GameSession, SessionConfig};
use tracing_subscriber::EnvFilter;

/// Play a random game through a session: one side clicks random legal
/// moves, the other is the built-in computer.
#[derive(Parser, Debug)]
#[command(version = env!("BUILD_TIMESTAMP"))]
struct Args {
    /// Seed for both sides' move choice.
    #[arg(long)]
    seed: Option<u64>,

    /// Stop after this many plies even if the game is not over.
    #[arg(long, default_value_t = 200)]
    max_plies: usize,

    /// Thinking delay to report for the computer, in milliseconds.
    #[arg(long, default_value_t = 0)]
    delay_ms: u32,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    let args = Args::parse();

    let config = SessionConfig {
        think_delay_ms: args.delay_ms,
        seed: args.seed,
        ..SessionConfig::new()
    };
    let mut session = GameSession::new(config);
    let mut human = RandomSource::from_seed(args.seed.map(|s| s.wrapping_add(1)));
    let mut plies = 0;

    while !session.status().is_terminal() && plies < args.max_plies {
        if let Some(ticket) = session.pending_computer_move() {
            match session.fire_computer_move(ticket.token) {
                ComputerTurn::Played(_) => plies += 1,
                ComputerTurn::Reset => {
                    eprintln!("computer could not move; game was reset");
                    plies = 0;
                }
                ComputerTurn::Skipped => {}
            }
            continue;
        }

        let chosen = match pick_move(session.rules(), session.position(), &mut human) {
            Ok(result) => result.mv,
            Err(err) => {
                eprintln!("no move for the human side: {err}");
                break;
            }
        };
        session.on_square_click(chosen.from);
        if session.on_square_click(chosen.to).is_none() {
            eprintln!("session refused {chosen}");
            break;
        }
        plies += 1;
    }

    let view = session.view();
    let result = view.message.as_deref().unwrap_or("ongoing");
    eprintln!("Game over after {plies} plies: {result}");
    println!("{}", view.fen);
}
