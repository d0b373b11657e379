//! `tactico chat`: ask questions interactively.

use std::io::Write;
use std::path::Path;

use tokio::io::{AsyncBufReadExt, BufReader};

use super::{CommandResult, Interrupts, build_agent, load_config, summary};

pub async fn run(config_path: Option<&Path>) -> CommandResult {
    let config = load_config(config_path)?;
    let agent = build_agent(&config)?;

    println!();
    println!("  Tactico: interactive match analysis");
    println!();
    println!("  Provider:  {}", config.llm.provider);
    println!("  Model:     {}", config.llm.model);
    println!("  Graph:     {}", config.graph.uri);
    println!("  Tools:     {}", agent.registry().names().join(", "));
    println!();
    println!("  Type a question and press Enter. Type 'exit' to quit.");
    println!("  Ctrl+C cancels the running analysis, or quits at the prompt.");
    println!();

    let interrupts = Interrupts::install();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("  You > ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if matches!(question, "exit" | "quit") {
            break;
        }

        eprint!("  ...");
        let analysis = interrupts.analyze(&agent, question).await;
        eprint!("\r     \r");

        if analysis.success {
            println!();
            for line in analysis.answer.lines() {
                println!("  Analyst > {line}");
            }
            println!("  ({})", summary(&analysis));
        } else {
            eprintln!("  [Error] {}", analysis.error.unwrap_or_default());
        }
        println!();
    }

    println!();
    println!("  Goodbye!");
    Ok(())
}
