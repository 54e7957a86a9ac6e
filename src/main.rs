use anyhow::Context;
use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

mod cli;
mod client;
mod config;
mod context;
mod errors;
mod export;
mod log;
mod prompt;
mod provider;
mod refine;
mod repl;
mod suggest;
mod ux;
mod wire;
mod wizard;

use client::GenerationClient;
use errors::BrewError;
use export::TextCardRenderer;
use repl::Command;
use suggest::SuggestionUpdate;
use wizard::{Advance, PendingStep, Stage, StepKind, StepOutput, Wizard};

type StepResult = (PendingStep, Result<StepOutput, BrewError>);

enum Event {
    Line(Option<String>),
    Suggestion(SuggestionUpdate),
    Step(PendingStep, Result<StepOutput, BrewError>),
}

/// What the loop should do after a command.
enum Flow {
    Continue,
    Quit,
}

fn init_tracing(debug: bool) {
    let default = if debug { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn spinner(kind: &StepKind) -> ProgressBar {
    let msg = match kind {
        StepKind::Complements => "Finding pairings…",
        StepKind::Recipes => "Writing the menu…",
        StepKind::Refinement { .. } => "Refining the recipe…",
    };
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}").unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn prompt_line() {
    print!("{} ", "›".cyan().bold());
    let _ = std::io::stdout().flush();
}

struct Session {
    wizard: Wizard,
    export_dir: String,
    steps: mpsc::UnboundedSender<StepResult>,
    spinner: Option<ProgressBar>,
}

impl Session {
    fn show(&self) {
        println!("{}", ux::render(&self.wizard.view()));
    }

    fn report(&self, err: &BrewError) {
        println!("{}", ux::banner(err));
    }

    /// Run the ticket's call in the background; the outcome comes back as an event.
    fn dispatch(&mut self, step: PendingStep) {
        self.spinner = Some(spinner(&step.kind));
        let client = self.wizard.client();
        let tx = self.steps.clone();
        tokio::spawn(async move {
            let outcome = client.run_step(&step).await;
            let _ = tx.send((step, outcome));
        });
    }

    fn stop_spinner(&mut self) {
        if let Some(pb) = self.spinner.take() {
            pb.finish_and_clear();
        }
    }

    fn handle(&mut self, cmd: Command) -> Flow {
        match cmd {
            Command::Inspire(text) => {
                self.wizard.set_inspiration(&text);
                self.show();
            }
            Command::Add(name) => {
                if !self.wizard.add_ingredient(&name) {
                    println!("{} is already in the list.", name.bold());
                }
                self.show();
            }
            Command::Remove(name) => {
                if !self.wizard.remove_ingredient(&name) {
                    println!("{} is not in the list.", name.bold());
                }
                self.show();
            }
            Command::Quick(n) => {
                if self.wizard.add_quick_suggestion(n - 1).is_none() {
                    println!("No new quick-add item at {n}.");
                }
                self.show();
            }
            Command::Dietary(on) => {
                self.wizard.set_dietary_constraint(on);
                self.show();
            }
            Command::Toggle(c) => {
                self.wizard.toggle_characteristic(c);
                self.show();
            }
            Command::Pick(name) => {
                if self.wizard.toggle_complement(&name).is_none() {
                    println!("{} is not one of the offered pairings.", name.bold());
                }
                self.show();
            }
            Command::Choose(n) => match self.wizard.select_recipe(n - 1) {
                Ok(_) => self.show(),
                Err(e) => self.report(&e),
            },
            Command::Next => match self.wizard.begin_advance() {
                Ok(Advance::Moved(_)) => self.show(),
                Ok(Advance::Pending(step)) => self.dispatch(step),
                Err(e) => self.report(&e),
            },
            Command::Back => {
                self.stop_spinner();
                match self.wizard.retreat() {
                    Ok(_) => self.show(),
                    Err(e) => self.report(&e),
                }
            }
            Command::Reset => {
                self.stop_spinner();
                self.wizard.reset();
                self.show();
            }
            Command::Refine(text) => {
                self.wizard.set_refinement_input(&text);
                match self.wizard.begin_refine() {
                    Ok(Some(step)) => self.dispatch(step),
                    Ok(None) if self.wizard.stage() != Stage::Refinement => {
                        println!("Choose a recipe before refining it.");
                    }
                    Ok(None) => println!("Describe the change you want."),
                    Err(e) => self.report(&e),
                }
            }
            Command::Export => {
                let renderer = TextCardRenderer::default();
                match self.wizard.export(&renderer, Path::new(&self.export_dir)) {
                    Ok(path) => {
                        let size = fs_err::metadata(&path).map(|m| m.len()).unwrap_or(0);
                        println!(
                            "{} {} ({})",
                            "Saved".green().bold(),
                            path.display(),
                            humansize::format_size(size, humansize::DECIMAL)
                        );
                    }
                    Err(e) => self.report(&e),
                }
            }
            Command::Show => self.show(),
            Command::Help => println!("{}", ux::HELP),
            Command::Quit => return Flow::Quit,
        }
        Flow::Continue
    }

    fn finish(&mut self, step: PendingStep, outcome: Result<StepOutput, BrewError>) {
        let from = step.from;
        let waiting = self.spinner.is_some();
        match self.wizard.finish_step(step, outcome) {
            Ok(Some(_)) => {
                self.stop_spinner();
                self.show();
            }
            // Superseded; a newer ticket may still own the spinner.
            Ok(None) => {
                if !self.wizard.is_busy() {
                    self.stop_spinner();
                    if waiting && self.wizard.stage() == from {
                        println!("{}", "Inputs changed while the generator was working; try again.".yellow());
                    }
                }
            }
            Err(e) => {
                self.stop_spinner();
                self.report(&e);
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = cli::Args::parse();
    init_tracing(args.debug);

    let cfg = config::Config::resolve(&args)?;
    tracing::debug!(?cfg, "resolved configuration");

    let provider = provider::make_provider(&cfg).context("creating the generation provider")?;
    let mut client = GenerationClient::new(provider);
    if let Some(root) = cfg.transcript_dir() {
        let transcript = log::Transcript::new(&root, Uuid::new_v4());
        println!("Transcripts: {}", transcript.dir().display());
        client = client.with_transcript(transcript);
    }

    let (steps_tx, mut steps_rx) = mpsc::unbounded_channel::<StepResult>();
    let mut session = Session {
        wizard: Wizard::new(Arc::new(client), cfg.debounce()),
        export_dir: cfg.export_dir.clone(),
        steps: steps_tx,
        spinner: None,
    };

    println!("{}", "Brew Wizard".bold());
    println!("Type `help` for commands.");
    session.show();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        prompt_line();
        let event = tokio::select! {
            line = lines.next_line() => Event::Line(line.context("reading stdin")?),
            Some(update) = session.wizard.recv_suggestion() => Event::Suggestion(update),
            Some((step, outcome)) = steps_rx.recv() => Event::Step(step, outcome),
        };

        match event {
            Event::Line(None) => break,
            Event::Line(Some(line)) => match repl::parse(&line) {
                Ok(cmd) => {
                    if let Flow::Quit = session.handle(cmd) {
                        break;
                    }
                }
                Err(msg) => println!("{}", msg.yellow()),
            },
            Event::Suggestion(update) => {
                if session.wizard.apply_suggestion(update) && session.wizard.stage() == Stage::Intake {
                    println!();
                    session.show();
                }
            }
            Event::Step(step, outcome) => session.finish(step, outcome),
        }
    }

    session.stop_spinner();
    Ok(())
}
