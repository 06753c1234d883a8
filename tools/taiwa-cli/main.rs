use clap::Parser;
use std::fs;
use std::io::{self, BufRead, Write};
use taiwa::graph::visualizer::to_dot;
use taiwa::prelude::*;
use tracing_subscriber::EnvFilter;

/// Chat with a conversation flow from the terminal
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the flow definition JSON file
    flow_path: String,

    /// Optional TOML file with [engine] and [compiler] sections
    #[arg(short, long)]
    config: Option<String>,

    /// Replay the turns in this file (one per line) instead of reading from stdin
    #[arg(short, long)]
    script: Option<String>,

    /// Print the compiled graph as Graphviz DOT and exit
    #[arg(long)]
    dot: bool,

    /// Print the path walked by each turn
    #[arg(short, long)]
    trace: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("taiwa=info,warn")),
        )
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::from_file(path)
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to load config: {}", e))),
        None => Config::default(),
    };

    let definition = fs::read(&cli.flow_path).unwrap_or_else(|e| {
        exit_with_error(&format!(
            "Failed to read flow file '{}': {}",
            cli.flow_path, e
        ))
    });
    let graph = load_graph_with(&definition, &config.compiler)
        .unwrap_or_else(|e| exit_with_error(&format!("Flow rejected: {}", e)));

    if cli.dot {
        println!("{}", to_dot(&graph, "flow"));
        return;
    }

    let engine = Engine::builder(graph).with_config(config.engine).build();
    match &cli.script {
        Some(path) => run_script(&engine, path, cli.trace),
        None => run_interactive(&engine, cli.trace),
    }
}

/// Feeds every non-empty line of `path` to one session.
fn run_script(engine: &Engine, path: &str, trace: bool) {
    let script = fs::read_to_string(path)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to read script '{}': {}", path, e)));
    let session = engine.start_session();

    for line in script.lines().map(str::trim).filter(|l| !l.is_empty()) {
        println!("> {}", line);
        if !submit(engine, &session, line, trace) {
            break;
        }
    }
}

fn run_interactive(engine: &Engine, trace: bool) {
    println!("--- Taiwa Chat (type 'exit' to quit) ---");
    let session = engine.start_session();
    let stdin = io::stdin();

    loop {
        print!("> ");
        if io::stdout().flush().is_err() {
            break;
        }

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => exit_with_error(&format!("Failed to read input: {}", e)),
        }
        let input = line.trim();
        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            break;
        }
        if !submit(engine, &session, input, trace) {
            break;
        }
    }
}

/// Runs one turn and prints it. Returns whether the conversation can continue.
fn submit(engine: &Engine, session: &str, input: &str, trace: bool) -> bool {
    match engine.submit_turn(session, input) {
        Ok(result) => {
            if trace {
                println!("  [{}]", TraceFormatter::format_turn(&result));
            }
            println!("{}\n", result.output_text);
            !result.terminal
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            false
        }
    }
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
