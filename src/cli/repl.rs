//! Interactive REPL for Conductor
//!
//! Provides the main user interaction loop.

use std::io::{self, BufRead, Write};

use crate::agent::RunReport;
use crate::cli::commands::{handle_command, CommandResult};
use crate::cli::session::{spawn_interrupt_handler, Session, Target};
use crate::core::Result;
use crate::definitions::DefinitionStore;

/// Interactive REPL (Read-Eval-Print Loop)
pub struct Repl {
    session: Session,
}

impl Repl {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    /// Run the REPL
    pub async fn run(&mut self) -> Result<()> {
        self.print_banner();

        print!("Connecting to Ollama...");
        io::stdout().flush()?;

        match self.session.orchestrator().initialize().await {
            Ok(models) => println!(" Ready! ({} models available)\n", models.len()),
            Err(e) => {
                println!("\n\nInitialization Error: {}\n", e);
                return Ok(());
            }
        }

        let handler = spawn_interrupt_handler(self.session.interrupt());
        let stdin = io::stdin();
        let mut stdout = io::stdout();

        loop {
            print!("You: ");
            stdout.flush()?;

            let mut input = String::new();
            match stdin.lock().read_line(&mut input) {
                Ok(0) => {
                    // EOF (Ctrl+D)
                    println!("\nGoodbye!");
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    eprintln!("Error reading input: {}", e);
                    continue;
                }
            }

            let input = input.trim();
            if input.is_empty() {
                continue;
            }

            match handle_command(input, &mut self.session).await {
                Ok(CommandResult::Exit) => {
                    println!("\nGoodbye!");
                    break;
                }
                Ok(CommandResult::Clear) => {
                    println!("Session memory cleared.\n");
                }
                Ok(CommandResult::Handled(output)) => {
                    println!("{}\n", output);
                }
                Ok(CommandResult::Continue(input)) => match self.session.ask(&input).await {
                    Ok(report) => print_report(&report),
                    Err(e) if e.is_construction() => eprintln!("\nDefinition error: {}\n", e),
                    Err(e) => eprintln!("\nError: {}\n", e),
                },
                Err(e) => {
                    eprintln!("Command error: {}\n", e);
                }
            }
        }

        handler.abort();
        Ok(())
    }

    fn print_banner(&self) {
        let config = self.session.config();
        let store = self.session.orchestrator().resolver().store();

        println!(
            r#"
╔═══════════════════════════════════════════════════════════╗
║                                                           ║
║   CONDUCTOR                                               ║
║                                                           ║
║   Declarative Teams of AI Agents                          ║
║                                                           ║
╚═══════════════════════════════════════════════════════════╝
"#
        );
        println!("Ollama:     {}", config.ollama_url());
        println!("Namespace:  {}", store.namespace());
        println!("Target:     {}", self.session.target());
        println!("Models:");
        println!("  Agents:   {}", config.models.default);
        println!("  Selector: {}", config.models.selector);
        println!();
        println!("Commands: help, teams, use, responses, usage, status, clear, exit");
        println!("───────────────────────────────────────────────────────────");
    }
}

/// Print the outcome of one run
pub fn print_report(report: &RunReport) {
    match report.final_content() {
        Some(content) => println!("\nAssistant:\n{}\n", content),
        None => println!("\n(no output)\n"),
    }
    if let Some(err) = &report.error {
        eprintln!("Error: {}\n", err);
    }
}

/// First team in the definitions, or the first agent when there are no teams
pub fn default_target(store: &dyn DefinitionStore) -> Option<Target> {
    store
        .team_names()
        .into_iter()
        .next()
        .map(Target::Team)
        .or_else(|| store.agent_names().into_iter().next().map(Target::Agent))
}
