use std::path::Path;
use std::process;

use anyhow::{Context, Result, bail};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use probot::{
    config::Config,
    editor::Editor,
    engine::{
        Program, Run,
        source::{load_level, load_program},
    },
    player::Player,
    types::{Outcome, RunEvent},
};

/// Exit status for a program that ran but did not solve the level.
const PUZZLE_FAILED: i32 = 2;

fn main() {
    init_tracing();
    match run() {
        Ok(true) => {}
        Ok(false) => process::exit(PUZZLE_FAILED),
        Err(e) => {
            eprintln!("Error: {e:#}");
            process::exit(1);
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("PROBOT_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

const RUN_USAGE: &str = "probot run <level.json> <program.json> [--json]";
const PLAY_USAGE: &str = "probot play <level.json> <program.json>";
const EDIT_USAGE: &str = "probot edit <level.json> <program.json>";

/// Returns whether the command succeeded as a puzzle run.
fn run() -> Result<bool> {
    let mut args = std::env::args().skip(1);

    match args.next().as_deref() {
        Some("run") => {
            let level_path = args.next().context(RUN_USAGE)?;
            let program_path = args.next().context(RUN_USAGE)?;
            let json = match args.next().as_deref() {
                None => false,
                Some("--json") => true,
                Some(other) => bail!("Unknown option {other}\n\nUsage:\n  {RUN_USAGE}"),
            };
            headless(&level_path, &program_path, json)
        }
        Some("play") => {
            let level_path = args.next().context(PLAY_USAGE)?;
            let program_path = args.next().context(PLAY_USAGE)?;
            play(&level_path, &program_path)?;
            Ok(true)
        }
        Some("edit") => {
            let level_path = args.next().context(EDIT_USAGE)?;
            let program_path = args.next().context(EDIT_USAGE)?;
            edit(&level_path, &program_path)?;
            Ok(true)
        }
        _ => bail!(
            "Probot — grid puzzle runner\n\nUsage:\n  {RUN_USAGE}\n  {PLAY_USAGE}\n  {EDIT_USAGE}"
        ),
    }
}

fn read_program(path: &str) -> Result<Program> {
    if !Path::new(path).exists() {
        bail!("Program file {path} does not exist");
    }
    load_program(path)
}

fn headless(level_path: &str, program_path: &str, json: bool) -> Result<bool> {
    let level = load_level(level_path)?;
    let program = read_program(program_path)?;

    for class in program.over_budget(level.budgets()) {
        warn!(?class, "program exceeds the level's command budget");
    }

    let mut events: Vec<RunEvent> = Vec::new();
    let outcome = Run::new(&level)
        .execute(&program, &mut events)
        .with_context(|| format!("Cannot run {program_path}"))?;

    if json {
        for event in &events {
            println!("{}", serde_json::to_string(event)?);
        }
        println!("{}", serde_json::to_string(&outcome)?);
    } else {
        for event in &events {
            println!("{event}");
        }
        println!("{outcome}");
    }

    Ok(matches!(outcome, Outcome::Success))
}

fn play(level_path: &str, program_path: &str) -> Result<()> {
    let level = load_level(level_path)?;
    let program = read_program(program_path)?;
    program
        .check()
        .with_context(|| format!("Cannot run {program_path}"))?;

    let mut player = Player::new(level, program, Config::load());
    player.play()
}

fn edit(level_path: &str, program_path: &str) -> Result<()> {
    let mut editor = Editor::open(level_path, program_path)?;
    editor.run()
}
