//! churnscope: Customer churn analysis CLI
//!
//! This is the main entrypoint that loads the dataset, dispatches the selected
//! menu action and prints its view, either once or in an interactive shell.

use std::io::{self, BufRead, Write};
use std::path::Path;
use std::time::Instant;

use anyhow::Result;
use churnscope::cli::parse_shell_command;
use churnscope::{dispatch, AppState, Args, MenuAction, MenuKind};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse();

    let default_filter = if args.verbose {
        "churnscope=debug"
    } else {
        "churnscope=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    if args.verbose {
        println!("churnscope - Customer Churn Analysis");
        println!("====================================\n");
    }

    let state = load_initial_state(&args);

    match args.action()? {
        Some(action) => {
            run_action(state, &action, args.verbose);
        }
        None => run_shell(state, args.verbose)?,
    }

    Ok(())
}

/// Session state with the input dataset loaded when the file exists
fn load_initial_state(args: &Args) -> AppState {
    let state = AppState::new(args.settings());
    if !Path::new(&args.input).exists() {
        tracing::info!(path = %args.input, "no dataset found; starting without data");
        return state;
    }

    let (state, view) = dispatch(state, &MenuAction::Load(args.input.clone()));
    if args.verbose || view.is_error() {
        print!("{}", view);
    }
    state
}

/// Run a single menu action and print its view
fn run_action(state: AppState, action: &MenuAction, verbose: bool) -> AppState {
    let start_time = Instant::now();
    let (state, view) = dispatch(state, action);
    println!("{}", view);

    if verbose {
        println!(
            "Processing time: {:.2}s",
            start_time.elapsed().as_secs_f64()
        );
    }
    state
}

/// Read menu commands from stdin until `quit` or end of input
fn run_shell(mut state: AppState, verbose: bool) -> Result<()> {
    print_menu();

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("churnscope> ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else { break };
        let line = line?;
        match line.trim() {
            "" => continue,
            "quit" | "exit" => break,
            "help" => {
                print_menu();
                continue;
            }
            _ => {}
        }

        match parse_shell_command(&line) {
            Ok(action) => state = run_action(state, &action, verbose),
            Err(err) => println!("✗ {}", err),
        }
    }

    Ok(())
}

fn print_menu() {
    println!("=== Menu ===");
    for kind in MenuKind::ALL {
        let usage = match kind {
            MenuKind::Load => "load <path>",
            MenuKind::ShowData => "data",
            MenuKind::ChurnChart => "chart",
            MenuKind::Eda => "eda [column]",
            MenuKind::Modeling => "model",
            MenuKind::Prediction => "predict [v1,v2,...]",
            MenuKind::Insights => "insights",
        };
        println!("  {:<20} {}", usage, kind.label());
    }
    println!("  {:<20} Show this menu", "help");
    println!("  {:<20} Leave the session\n", "quit");
}
