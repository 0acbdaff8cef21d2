use std::fs::File;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};
use memmap2::Mmap;

use rox::ast_printer::AstPrinter;
use rox::error::LoxError;
use rox::parser::Parser;
use rox::scanner::Scanner;
use rox::session::{Outcome, Session};

#[derive(ClapParser, Debug)]
#[command(version, about = "Lox language interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Enable logging to app.log
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes input from a file, printing each token
    Tokenize {
        filename: Option<PathBuf>,

        /// Print the token stream as JSON
        #[arg(long)]
        json: bool,
    },

    /// Parses input from a file as a single expression and prints its AST
    Parse { filename: Option<PathBuf> },

    /// Evaluates input from a file as a single expression and prints the result
    Evaluate { filename: Option<PathBuf> },

    /// Runs input from a file as a Lox program, or starts a prompt without one
    Run { filename: Option<PathBuf> },
}

/// Maps the file and decodes it as UTF‑8.
fn read_file(filename: &Path) -> Result<String> {
    info!("Reading file: {:?}", filename);
    let file = File::open(filename).context(format!("Failed to open file {:?}", filename))?;

    let len = file
        .metadata()
        .context(format!("Failed to stat file {:?}", filename))?
        .len();

    // Zero-length mappings are rejected on some platforms.
    if len == 0 {
        return Ok(String::new());
    }

    // SAFETY: the mapping is read-only and dropped before this function returns.
    let mmap = unsafe { Mmap::map(&file) }.context(format!("Failed to map file {:?}", filename))?;

    let text = std::str::from_utf8(&mmap)
        .map_err(LoxError::from)
        .context(format!("File {:?} is not valid UTF-8", filename))?
        .to_owned();

    info!("Read {} bytes from {:?}", text.len(), filename);

    Ok(text)
}

fn init_logger() -> Result<()> {
    let log_file = File::create("app.log").context("Failed to create app.log")?;

    Builder::new()
        .format(|buf, record| {
            let module = record.module_path().unwrap_or("<unnamed>");
            let module = module.strip_prefix("rox::").unwrap_or(module);
            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug)
        .parse_default_env()
        .init();

    info!("Logger initialized, writing to app.log");
    Ok(())
}

fn report(outcome: &Outcome) {
    match outcome {
        Outcome::Success => {}
        Outcome::StaticErrors(errors) => {
            for e in errors {
                eprintln!("{}", e);
            }
        }
        Outcome::RuntimeError(e) => eprintln!("{}", e),
    }
}

fn run_prompt(session: &mut Session) -> Result<()> {
    info!("Starting prompt");

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("> ");
        io::stdout().flush().context("Failed to flush prompt")?;

        let Some(line) = lines.next() else {
            println!();
            break;
        };
        let line = line.context("Failed to read from stdin")?;

        // Errors are reported and the globals stay usable for the next line.
        let outcome = session.run(&line);
        debug!("Prompt input finished: {:?}", outcome);
        report(&outcome);
    }

    Ok(())
}

fn no_input() -> ! {
    info!("No filepath provided");
    println!("No input filepath was provided. Exiting...");
    std::process::exit(0);
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    if args.log {
        init_logger()?;
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("off")).init();
    }

    info!("CLI arguments: {:?}", args);

    match args.commands {
        Commands::Tokenize { filename, json } => {
            let Some(filename) = filename else { no_input() };
            let source = read_file(&filename)?;
            let scanned = Scanner::scan_all(&source);

            for e in &scanned.errors {
                eprintln!("{}", e);
            }

            if json {
                let rendered = serde_json::to_string_pretty(&scanned.tokens)
                    .context("Failed to serialise tokens")?;
                println!("{}", rendered);
            } else {
                for token in &scanned.tokens {
                    println!("{}", token);
                }
            }

            if !scanned.errors.is_empty() {
                debug!("Tokenization failed, exiting with code 65");
                std::process::exit(65);
            }
        }

        Commands::Parse { filename } => {
            let Some(filename) = filename else { no_input() };
            let source = read_file(&filename)?;
            let scanned = Scanner::scan_all(&source);

            if let Some(e) = scanned.errors.first() {
                eprintln!("{}", e);
                std::process::exit(65);
            }

            match Parser::new(scanned.tokens).parse_expression() {
                Ok(expr) => println!("{}", AstPrinter::print(&expr)),
                Err(e) => {
                    eprintln!("{}", e);
                    std::process::exit(65);
                }
            }
        }

        Commands::Evaluate { filename } => {
            let Some(filename) = filename else { no_input() };
            let source = read_file(&filename)?;
            let mut session = Session::new();

            match session.evaluate(&source) {
                Ok(value) => println!("{}", value),
                Err(e) => {
                    eprintln!("{}", e);
                    std::process::exit(if e.is_static() { 65 } else { 70 });
                }
            }
        }

        Commands::Run { filename } => {
            let mut session = Session::new();

            match filename {
                Some(filename) => {
                    let source = read_file(&filename)?;
                    let outcome = session.run(&source);
                    report(&outcome);

                    if !outcome.is_success() {
                        std::process::exit(outcome.exit_code());
                    }
                }
                None => run_prompt(&mut session)?,
            }
        }
    }

    Ok(())
}
