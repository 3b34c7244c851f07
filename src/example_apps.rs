use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, error::ErrorKind};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;

use crate::candidates::CandidateSet;
use crate::config::{GameProfile, GuessPool, SolverConfig};
use crate::constants::apps::{DEFAULT_OPENER_BOOK_FILE, DEFAULT_SELF_PLAY_SEED};
use crate::constants::entropy::DEFAULT_RANKED_SUGGESTIONS;
use crate::entropy::GuessChoice;
use crate::metrics::{GuessStats, guess_stats};
use crate::openers::OpenerBook;
use crate::self_play::{SelfPlayReport, play_many};
use crate::solver::Solver;
use crate::source::CsvSource;
use crate::types::Label;

#[derive(Debug, Parser)]
#[command(
    name = "self_play_demo",
    disable_help_subcommand = true,
    about = "Play a game against hidden targets",
    long_about = "Load a game profile and its CSV table, then let the solver discover hidden targets using simulated feedback and report guess-count statistics.",
    after_help = "Targets are chosen in order by explicit --target values, a seeded --sample, then every record in the table."
)]
/// CLI for `self_play_demo`.
///
/// Common usage:
/// - Play every record: `--profile game.json --data game.csv`
/// - Play specific targets: repeat `--target <LABEL>`
/// - Play a reproducible random subset: `--sample 20 --seed 7`
struct SelfPlayCli {
    #[arg(long, value_name = "PATH", help = "Game profile JSON file")]
    profile: PathBuf,
    #[arg(long, value_name = "PATH", help = "CSV table with a header row")]
    data: PathBuf,
    #[arg(
        long = "target",
        value_name = "LABEL",
        help = "Hidden target label, repeat as needed"
    )]
    targets: Vec<Label>,
    #[arg(
        long,
        value_parser = parse_positive_usize,
        conflicts_with = "targets",
        help = "Number of targets sampled from the table"
    )]
    sample: Option<usize>,
    #[arg(
        long,
        default_value_t = DEFAULT_SELF_PLAY_SEED,
        help = "Deterministic seed used for --sample"
    )]
    seed: u64,
    #[arg(
        long = "full-table-pool",
        help = "Score every record as a guess, not only remaining candidates"
    )]
    full_table_pool: bool,
    #[arg(long, help = "Score guesses on the rayon thread pool")]
    parallel: bool,
    #[arg(
        long = "max-guesses",
        value_parser = parse_positive_usize,
        help = "Stop a game after this many guesses (defaults to the table size)"
    )]
    max_guesses: Option<usize>,
    #[arg(
        long,
        default_value_t = DEFAULT_RANKED_SUGGESTIONS,
        help = "Number of ranked opening guesses to print (0 disables)"
    )]
    top: usize,
}

#[derive(Debug, Clone)]
struct GameArg {
    profile: PathBuf,
    data: PathBuf,
}

#[derive(Debug, Parser)]
#[command(
    name = "opener_book_demo",
    disable_help_subcommand = true,
    about = "Precompute opening guesses",
    long_about = "Compute the best first guess for each game and store it in a JSON opener book keyed by the profile display name.",
    after_help = "Existing entries are reused while the table size and opener label still match, unless --refresh is given."
)]
struct OpenersCli {
    #[arg(
        long = "game",
        value_name = "PROFILE=CSV",
        value_parser = parse_game_arg,
        required = true,
        help = "Profile JSON and CSV table for one game, repeat as needed"
    )]
    games: Vec<GameArg>,
    #[arg(
        long,
        value_name = "PATH",
        default_value = DEFAULT_OPENER_BOOK_FILE,
        help = "Opener book JSON file"
    )]
    output: PathBuf,
    #[arg(long, help = "Recompute openers even when a matching entry exists")]
    refresh: bool,
    #[arg(long, help = "Score guesses on the rayon thread pool")]
    parallel: bool,
}

/// Play self-play games for one profile and print guess statistics.
///
/// `args_iter` excludes the program name.
pub fn run_self_play<I>(args_iter: I) -> Result<(), Box<dyn Error>>
where
    I: Iterator<Item = String>,
{
    init_tracing();

    let Some(cli) = parse_cli::<SelfPlayCli, _>(
        std::iter::once("self_play_demo".to_string()).chain(args_iter),
    )?
    else {
        return Ok(());
    };

    let profile = GameProfile::load_from_file(&cli.profile)?;
    let pool = if cli.full_table_pool {
        GuessPool::FullTable
    } else {
        GuessPool::Candidates
    };
    let config = SolverConfig::default()
        .with_guess_pool(pool)
        .with_parallel_scoring(cli.parallel);
    let mut solver = Solver::from_source(&profile, &CsvSource::new(&cli.data), config)?;

    println!(
        "=== {} ({} records, label column '{}') ===",
        solver.display_name(),
        solver.table().len(),
        solver.table().label_column()
    );
    if cli.top > 0 {
        let full = CandidateSet::full(solver.table());
        let ranked = solver.ranked_guesses(&full, cli.top)?;
        print_ranked_guesses(&ranked);
    }

    let targets = select_targets(&solver, &cli);
    let reports = play_many(&mut solver, &targets, cli.max_guesses)?;
    for report in &reports {
        print_report(report);
    }
    if let Some(stats) = guess_stats(&reports) {
        print_stats(&stats);
    }

    let cache = solver.engine().stats();
    println!(
        "Score cache: {} hits, {} misses, {} candidate sets",
        cache.hits,
        cache.misses,
        solver.engine().cached_sets()
    );
    Ok(())
}

/// Compute opening guesses for each profile and write them to the opener book.
pub fn run_openers<I>(args_iter: I) -> Result<(), Box<dyn Error>>
where
    I: Iterator<Item = String>,
{
    init_tracing();

    let Some(cli) = parse_cli::<OpenersCli, _>(
        std::iter::once("opener_book_demo".to_string()).chain(args_iter),
    )?
    else {
        return Ok(());
    };

    let mut book = OpenerBook::load_or_default(&cli.output)?;
    let config = SolverConfig::default().with_parallel_scoring(cli.parallel);
    for game in &cli.games {
        let profile = GameProfile::load_from_file(&game.profile)?;
        let mut solver =
            Solver::from_source(&profile, &CsvSource::new(&game.data), config.clone())?;
        if !cli.refresh {
            if let Some(entry) = book.lookup(&solver) {
                println!(
                    "{:<20} {:<24} (cached, {:.3} bits)",
                    solver.display_name(),
                    entry.label,
                    entry.entropy
                );
                continue;
            }
        }
        let entry = book.record(&mut solver)?;
        println!(
            "{:<20} {:<24} {:.3} bits, worst case {} of {}",
            solver.display_name(),
            entry.label,
            entry.entropy,
            entry.largest_group,
            entry.records
        );
    }

    book.save(&cli.output)?;
    println!(
        "Saved {} opener(s) to {}",
        book.len(),
        cli.output.display()
    );
    Ok(())
}

fn select_targets(solver: &Solver, cli: &SelfPlayCli) -> Vec<Label> {
    if !cli.targets.is_empty() {
        return cli.targets.clone();
    }
    let labels: Vec<Label> = solver.table().labels().map(str::to_string).collect();
    match cli.sample {
        Some(count) => {
            let mut rng = StdRng::seed_from_u64(cli.seed);
            labels.choose_multiple(&mut rng, count).cloned().collect()
        }
        None => labels,
    }
}

fn print_ranked_guesses(ranked: &[GuessChoice]) {
    println!("Top opening guesses:");
    for (rank, choice) in ranked.iter().enumerate() {
        match &choice.score {
            Some(score) => println!(
                "  {:>2}. {:<24} {:.3} bits, {} groups, worst case {}",
                rank + 1,
                choice.label,
                score.entropy,
                score.groups,
                score.largest_group
            ),
            None => println!("  {:>2}. {:<24} (only candidate)", rank + 1, choice.label),
        }
    }
    println!();
}

fn print_report(report: &SelfPlayReport) {
    let status = if report.solved { "solved" } else { "UNSOLVED" };
    println!(
        "{:<24} {:>2} guess(es) {:<8} {}",
        report.target,
        report.guess_count(),
        status,
        report.guesses.join(" -> ")
    );
}

fn print_stats(stats: &GuessStats) {
    println!();
    println!("=== Summary ===");
    println!("  games:   {}", stats.games);
    println!("  solved:  {}", stats.solved);
    if stats.solved > 0 {
        println!("  guesses: min {}, max {}, mean {:.2}", stats.min, stats.max, stats.mean);
        for (guesses, games) in &stats.histogram {
            println!("  {:>3} | {}", guesses, "#".repeat(*games));
        }
    }
    if !stats.unsolved.is_empty() {
        println!("  unsolved: {}", stats.unsolved.join(", "));
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn parse_game_arg(raw: &str) -> Result<GameArg, String> {
    let (profile, data) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected PROFILE=CSV, got '{raw}'"))?;
    let (profile, data) = (profile.trim(), data.trim());
    if profile.is_empty() || data.is_empty() {
        return Err(format!("expected PROFILE=CSV, got '{raw}'"));
    }
    Ok(GameArg {
        profile: PathBuf::from(profile),
        data: PathBuf::from(data),
    })
}

fn parse_positive_usize(raw: &str) -> Result<usize, String> {
    let parsed = raw
        .parse::<usize>()
        .map_err(|_| format!("Could not parse '{}' as a positive integer", raw))?;
    if parsed == 0 {
        return Err("value must be greater than zero".to_string());
    }
    Ok(parsed)
}

fn parse_cli<T, I>(args: I) -> Result<Option<T>, Box<dyn Error>>
where
    T: Parser,
    I: IntoIterator,
    I::Item: Into<std::ffi::OsString> + Clone,
{
    match T::try_parse_from(args) {
        Ok(cli) => Ok(Some(cli)),
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                err.print()?;
                Ok(None)
            }
            _ => Err(err.into()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const PROFILE: &str = r#"{
        "display_name": "Tinydle",
        "label_column": "Name",
        "categories": [
            { "name": "Gender", "kind": "yes_no" },
            { "name": "Roles", "kind": "partial_matchable" },
            { "name": "Year", "kind": "orderable" }
        ]
    }"#;

    const TABLE: &str = "Name,Gender,Roles,Year\n\
        Ahri,Female,Mid,2011\n\
        Braum,Male,Support,2014\n\
        Caitlyn,Female,Bottom,2011\n\
        Darius,Male,Top,2012\n";

    fn write_game(dir: &std::path::Path) -> (PathBuf, PathBuf) {
        let profile = dir.join("tinydle.json");
        let data = dir.join("tinydle.csv");
        fs::write(&profile, PROFILE).unwrap();
        fs::write(&data, TABLE).unwrap();
        (profile, data)
    }

    fn args(values: &[&str]) -> impl Iterator<Item = String> {
        values
            .iter()
            .map(|value| value.to_string())
            .collect::<Vec<_>>()
            .into_iter()
    }

    #[test]
    fn game_arg_requires_both_paths() {
        let game = parse_game_arg("a.json = b.csv").unwrap();
        assert_eq!(game.profile, PathBuf::from("a.json"));
        assert_eq!(game.data, PathBuf::from("b.csv"));
        assert!(parse_game_arg("a.json").is_err());
        assert!(parse_game_arg("=b.csv").is_err());
    }

    #[test]
    fn sample_and_target_conflict() {
        let parsed = SelfPlayCli::try_parse_from([
            "self_play_demo",
            "--profile",
            "p.json",
            "--data",
            "d.csv",
            "--target",
            "Ahri",
            "--sample",
            "2",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn help_is_not_an_error() {
        assert!(run_self_play(args(&["--help"])).is_ok());
    }

    #[test]
    fn self_play_runs_over_files() {
        let temp = tempdir().unwrap();
        let (profile, data) = write_game(temp.path());
        run_self_play(args(&[
            "--profile",
            profile.to_str().unwrap(),
            "--data",
            data.to_str().unwrap(),
            "--sample",
            "2",
            "--top",
            "2",
        ]))
        .unwrap();
    }

    #[test]
    fn openers_are_written_and_reused() {
        let temp = tempdir().unwrap();
        let (profile, data) = write_game(temp.path());
        let output = temp.path().join("openers.json");
        let game = format!("{}={}", profile.display(), data.display());
        let run = || {
            run_openers(args(&[
                "--game",
                &game,
                "--output",
                output.to_str().unwrap(),
            ]))
        };

        run().unwrap();
        let book = OpenerBook::load(&output).unwrap();
        let entry = book.get("Tinydle").unwrap();
        assert_eq!(entry.records, 4);

        run().unwrap();
        let reused = OpenerBook::load(&output).unwrap();
        assert_eq!(reused.len(), 1);
        assert_eq!(reused.get("Tinydle").unwrap().label, entry.label);
    }
}
