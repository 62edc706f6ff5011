use pvp_battle_sim::{run, BattleCommand, Command, MatchupCommand, MatchupRequest, MatrixCommand};
use std::env;
use std::path::PathBuf;

fn usage() -> ! {
    eprintln!(
        "Usage:\n  pvp-sim battle --catalog gamemaster.json --request battle.json [--seed SEED] [--output result.json] [--log]\n  \
pvp-sim matrix --catalog gamemaster.json --roster roster.json [--sims-per-cell N] [--seed SEED] [--output matrix.csv]\n  \
pvp-sim matchup --catalog gamemaster.json --opponent NAME --team NAME[,NAME,NAME] [--output matchup.json]"
    );
    std::process::exit(1);
}

fn next_path(args: &mut impl Iterator<Item = String>, flag: &str) -> anyhow::Result<PathBuf> {
    args.next()
        .map(PathBuf::from)
        .ok_or_else(|| anyhow::anyhow!("{flag} requires a path"))
}

fn next_number<T>(args: &mut impl Iterator<Item = String>, flag: &str) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let val = args
        .next()
        .ok_or_else(|| anyhow::anyhow!("{flag} requires a number"))?;
    Ok(val.parse()?)
}

fn parse_battle(mut args: impl Iterator<Item = String>) -> anyhow::Result<Command> {
    let mut catalog_path = PathBuf::from("gamemaster.json");
    let mut request_path = None;
    let mut seed = 0u64;
    let mut output_path = None;
    let mut with_log = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--catalog" => catalog_path = next_path(&mut args, "--catalog")?,
            "--request" => request_path = Some(next_path(&mut args, "--request")?),
            "--seed" => seed = next_number(&mut args, "--seed")?,
            "--output" => output_path = Some(next_path(&mut args, "--output")?),
            "--log" => with_log = true,
            "--help" | "-h" => usage(),
            other => return Err(anyhow::anyhow!("Unknown argument {other}")),
        }
    }

    let request_path = request_path
        .ok_or_else(|| anyhow::anyhow!("battle requires --request (e.g. --request battle.json)"))?;
    Ok(Command::Battle(BattleCommand {
        catalog_path,
        request_path,
        seed,
        output_path,
        with_log,
    }))
}

fn parse_matrix(mut args: impl Iterator<Item = String>) -> anyhow::Result<Command> {
    let mut catalog_path = PathBuf::from("gamemaster.json");
    let mut roster_path = PathBuf::from("roster.json");
    let mut sims_per_cell = 100usize;
    let mut seed = 0u64;
    let mut output_path = PathBuf::from("matrix.csv");

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--catalog" => catalog_path = next_path(&mut args, "--catalog")?,
            "--roster" => roster_path = next_path(&mut args, "--roster")?,
            "--sims-per-cell" => sims_per_cell = next_number(&mut args, "--sims-per-cell")?,
            "--seed" => seed = next_number(&mut args, "--seed")?,
            "--output" => output_path = next_path(&mut args, "--output")?,
            "--help" | "-h" => usage(),
            other => return Err(anyhow::anyhow!("Unknown argument {other}")),
        }
    }

    Ok(Command::Matrix(MatrixCommand {
        catalog_path,
        roster_path,
        sims_per_cell,
        seed,
        output_path,
    }))
}

fn parse_matchup(mut args: impl Iterator<Item = String>) -> anyhow::Result<Command> {
    let mut catalog_path = PathBuf::from("gamemaster.json");
    let mut opponent = None;
    let mut team = Vec::new();
    let mut output_path = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--catalog" => catalog_path = next_path(&mut args, "--catalog")?,
            "--opponent" => {
                opponent = Some(
                    args.next()
                        .ok_or_else(|| anyhow::anyhow!("--opponent requires a name"))?,
                )
            }
            "--team" => {
                let names = args
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--team requires comma-separated names"))?;
                team = names
                    .split(',')
                    .map(str::trim)
                    .filter(|n| !n.is_empty())
                    .map(String::from)
                    .collect();
            }
            "--output" => output_path = Some(next_path(&mut args, "--output")?),
            "--help" | "-h" => usage(),
            other => return Err(anyhow::anyhow!("Unknown argument {other}")),
        }
    }

    let opponent = opponent.ok_or_else(|| anyhow::anyhow!("matchup requires --opponent"))?;
    Ok(Command::Matchup(MatchupCommand {
        catalog_path,
        request: MatchupRequest { opponent, team },
        output_path,
    }))
}

fn parse_args() -> anyhow::Result<Command> {
    let mut args = env::args().skip(1);
    match args.next().as_deref() {
        Some("battle") => parse_battle(args),
        Some("matrix") => parse_matrix(args),
        Some("matchup") => parse_matchup(args),
        Some("--help") | Some("-h") | None => usage(),
        Some(other) => Err(anyhow::anyhow!("Unknown command {other} (use battle, matrix or matchup)")),
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let command = parse_args()?;
    run(command)
}
