mod rotation;
mod roster;
mod history;
mod rules;
mod display;
mod web;

use std::path::PathBuf;

use chrono::Utc;

use history::{HistoryStore, store_path};
use roster::load_roster;
use rotation::HistoryEntry;

fn data_dir() -> PathBuf {
    std::env::var("DISH_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("data"))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Check if we should run in web mode
    let args: Vec<String> = std::env::args().collect();
    if args.len() > 1 && args[1] == "web" {
        let port = args.get(2)
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(8080);
        let password = std::env::var("ADMIN_PASSWORD")
            .unwrap_or_else(|_| "admin123".to_string()); // Default password, change this!

        let dir = data_dir();
        let members = load_roster(&dir.join("roster.csv"))?;

        println!("Starting web server on port {}...", port);
        println!("Data directory: {}", dir.display());
        println!("Roster: {}", members.iter().map(|m| m.name.as_str()).collect::<Vec<_>>().join(", "));
        println!("Access the site at http://localhost:{}", port);

        web::start_server(port, password, &dir, members).await?;
        return Ok(());
    }

    // CLI mode: one-shot selection for the names given on the command line
    let mut test_mode = false;
    let mut confirm = false;
    let mut names: Vec<String> = Vec::new();
    for arg in &args[1..] {
        match arg.as_str() {
            "--test" => test_mode = true,
            "--confirm" => confirm = true,
            _ => names.push(arg.clone()),
        }
    }

    if names.is_empty() {
        println!("Usage: dish-duty [--test] [--confirm] NAME NAME...");
        println!("       dish-duty web [port]");
        return Ok(());
    }

    let dir = data_dir();
    let members = load_roster(&dir.join("roster.csv"))?;
    for name in &names {
        if !members.iter().any(|m| m.name == *name) {
            let known: Vec<&str> = members.iter().map(|m| m.name.as_str()).collect();
            return Err(format!("Unknown brother '{}' (roster: {})", name, known.join(", ")).into());
        }
    }
    if names.len() < 2 {
        return Err("Select at least two brothers".into());
    }

    let environment = if test_mode { "test" } else { "production" };
    let mut store = HistoryStore::load(store_path(&dir, environment));
    println!("Loaded {} history entries ({})", store.entries().len(), environment);

    rules::selection_allowed(test_mode, store.entries())?;

    let result = rotation::select(&names, store.entries())?;
    display::print_decision(&result);

    let group_entries: Vec<HistoryEntry> = store
        .entries()
        .iter()
        .filter(|e| e.group == result.group)
        .cloned()
        .collect();
    println!("\nHistory for this group:");
    display::print_log(&group_entries);

    if confirm {
        let entry = HistoryEntry {
            brother: result.chosen.clone(),
            group: result.group.clone(),
            date: Utc::now().to_rfc3339(),
            present_brothers: result.present_brothers.clone(),
        };
        store.append(entry)?;
        println!("\nRecorded in {} mode! {} will do the dishes tonight.", environment, result.chosen);
    } else {
        println!("\nDry run only. Re-run with --confirm to record this result.");
    }

    Ok(())
}
