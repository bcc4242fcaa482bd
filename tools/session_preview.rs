/// Session Preview: interactive shell for trying catalogs and configs.
///
/// Usage: session_preview [--catalog <path>] [--config <path>] [--seed <n>]
///
/// Reads commands from stdin, so a scripted session can be piped in:
///   echo "budget market-square weighted-arms" | session_preview
///
/// Commands:
///   budget <location> [props...]  apply a budget
///   move <munchie> <location>  move a character
///   buggie <id> <n>  set a stressor's intensity
///   story <title>  start a new story
///   add <stage> <title>  add a beat
///   stage <n|next|prev>  move the stage cursor
///   beat  insert the regulation beat
///   pause | ack <alert> | clear  regulation controls
///   tick <seconds>  advance the session clock
///   lanes | status | note | export | reset | help | quit

use curmunchkins_engine::core::regulation::Alert;
use curmunchkins_engine::core::requests::Fallback;
use curmunchkins_engine::schema::spark::{EventDraft, EventId, SparkStage};
use curmunchkins_engine::schema::story::Goals;
use curmunchkins_engine::Session;
use std::io::{self, BufRead, Write};
use std::time::Duration;

fn main() {
    let args: Vec<String> = std::env::args().collect();

    let mut catalog_path = None;
    let mut config_path = None;
    let mut seed: u64 = 42;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_usage();
                return;
            }
            "--catalog" if i + 1 < args.len() => {
                i += 1;
                catalog_path = Some(args[i].clone());
            }
            "--config" if i + 1 < args.len() => {
                i += 1;
                config_path = Some(args[i].clone());
            }
            "--seed" if i + 1 < args.len() => {
                i += 1;
                seed = args[i].parse().unwrap_or(42);
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let mut builder = Session::builder().seed(seed);
    if let Some(ref path) = catalog_path {
        builder = builder.catalog_path(path);
    }
    if let Some(ref path) = config_path {
        builder = builder.config_path(path);
    }
    let mut session = match builder.build() {
        Ok(session) => session,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            std::process::exit(1);
        }
    };

    println!(
        "Loaded {} locations, {} props, {} buggies",
        session.catalog().locations().len(),
        session.catalog().props().len(),
        session.buggies().len()
    );
    println!("Seed: {}", seed);
    println!("Type 'help' for commands.\n");

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("studio[{}]> ", session.current_stage().number());
        stdout.flush().ok();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line).is_err() || line.is_empty() {
            break;
        }
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        let cmd = parts[0].to_lowercase();

        match cmd.as_str() {
            "quit" | "exit" | "q" => {
                println!("Goodbye.");
                break;
            }
            "help" | "h" | "?" => {
                print_help();
            }
            "budget" => {
                if parts.len() < 2 {
                    println!("Usage: budget <location> [props...]");
                    continue;
                }
                match session.apply_budget(parts[1], &parts[2..]) {
                    Ok(_) => print_budget(&session),
                    Err(e) => println!("ERROR: {}", e),
                }
            }
            "move" => {
                if parts.len() < 3 {
                    println!("Usage: move <munchie> <location>");
                    continue;
                }
                match session.move_character_to_location(parts[1], parts[2]) {
                    Ok(_) => print_budget(&session),
                    Err(e) => println!("ERROR: {}", e),
                }
            }
            "buggie" => {
                if parts.len() < 3 {
                    println!("Usage: buggie <id> <intensity>");
                    for b in session.buggies() {
                        println!("  {} ({}) = {}", b.id, b.label, b.intensity);
                    }
                    continue;
                }
                let Ok(requested) = parts[2].parse::<i64>() else {
                    println!("Intensity must be a number");
                    continue;
                };
                match session.adjust_buggie_intensity(parts[1], requested) {
                    Some(stored) => {
                        println!("{} = {}", parts[1], stored);
                        print_regulation(&session);
                    }
                    None => println!("Unknown buggie: {}", parts[1]),
                }
            }
            "story" => {
                let title = parts[1..].join(" ");
                let story = session.create_new_story(&title, Goals::default());
                println!("New story '{}' ({})", story.title, story.id);
            }
            "add" => {
                if parts.len() < 3 {
                    println!("Usage: add <stage 1-5> <title>");
                    continue;
                }
                let Ok(n) = parts[1].parse::<i64>() else {
                    println!("Stage must be a number");
                    continue;
                };
                let title = parts[2..].join(" ");
                let event = session.add_event(EventDraft::new(SparkStage::clamped(n), title));
                println!("Added {} to {}", event.id, event.spark);
            }
            "stage" => {
                match parts.get(1).copied() {
                    Some("next") => {
                        session.next_stage();
                    }
                    Some("prev") => {
                        session.previous_stage();
                    }
                    Some(n) => match n.parse::<i64>() {
                        Ok(n) => session.jump_to_stage(SparkStage::clamped(n)),
                        Err(_) => println!("Usage: stage <n|next|prev>"),
                    },
                    None => {}
                }
                let stage = session.current_stage();
                println!("{}: {}", stage, stage.description());
            }
            "beat" => match session.insert_regulation_beat() {
                Some(event) => println!("Inserted {}: {}", event.id, event.text),
                None => println!("The regulation beat can only be added at stage 4"),
            },
            "scene" => {
                let Some(id) = parts.get(1) else {
                    println!("Usage: scene <event-id>");
                    continue;
                };
                match session.scene_request(&EventId(id.to_string())) {
                    Some(request) => {
                        if let Ok(json) = serde_json::to_string_pretty(&request) {
                            println!("{}", json);
                        }
                        println!("Offline text: {}", request.fallback());
                    }
                    None => println!("Unknown event: {}", id),
                }
            }
            "pause" => {
                session.trigger_pause_and_breathe();
                print_regulation(&session);
            }
            "ack" => {
                let alert = match parts.get(1).copied() {
                    Some("micro") => Alert::MicroBeat,
                    Some("pause") => Alert::PauseAndBreathe,
                    _ => {
                        println!("Usage: ack <micro|pause>");
                        continue;
                    }
                };
                session.acknowledge(alert);
                print_regulation(&session);
            }
            "clear" => {
                session.clear_regulation();
                print_regulation(&session);
            }
            "tick" => {
                let secs = parts.get(1).and_then(|s| s.parse::<u64>().ok()).unwrap_or(1);
                let expired = session.advance(Duration::from_secs(secs));
                for alert in expired {
                    println!("Auto-cleared {:?}", alert);
                }
                print_regulation(&session);
            }
            "lanes" => {
                for stage in SparkStage::ALL {
                    println!(
                        "  {} {:<10} {:>3}% {:?}",
                        stage.number(),
                        stage.name(),
                        session.lane_progress(stage),
                        session.lane_status(stage)
                    );
                    for event in session.lane(stage) {
                        println!("      - {} ({})", event.title, event.id);
                    }
                }
            }
            "status" => {
                print_budget(&session);
                print_regulation(&session);
                let t = session.telemetry();
                println!(
                    "Telemetry: {} ms, {} edits, {} mitigated, {} triggers",
                    t.time_on_task, t.edits, t.sbs_overages_mitigated, t.regulation_triggers
                );
            }
            "note" => {
                println!("\n{}\n", session.care_note());
            }
            "export" => match session.export_json() {
                Ok(json) => println!("{}", json),
                Err(e) => println!("ERROR: {}", e),
            },
            "reset" => {
                session.reset();
                println!("Session reset.");
            }
            _ => {
                println!("Unknown command: '{}'. Type 'help' for commands.", cmd);
            }
        }
    }
}

fn print_budget(session: &Session) {
    let budget = session.budget();
    let axes: Vec<String> = budget
        .iter()
        .map(|(axis, value)| format!("{}={}", axis.key(), value))
        .collect();
    println!(
        "Budget: {} (total {}){}",
        axes.join(" "),
        budget.total(),
        if session.is_exceeded() { " EXCEEDED" } else { "" }
    );
}

fn print_regulation(session: &Session) {
    let state = session.regulation();
    println!(
        "Regulation: micro-beat {}, pause-and-breathe {}",
        if state.micro_beat { "ON" } else { "off" },
        if state.pause_and_breathe { "ON" } else { "off" }
    );
}

fn print_usage() {
    println!("Session Preview: interactive shell for trying catalogs and configs.");
    println!();
    println!("Usage: session_preview [--catalog <path>] [--config <path>] [--seed <n>]");
    println!();
    println!("  --catalog <path>  Catalog RON file (default: bundled catalog)");
    println!("  --config <path>   Session config RON file (default: built-in defaults)");
    println!("  --seed <n>        Seed for id generation (default: 42)");
}

fn print_help() {
    println!("Commands:");
    println!("  budget <location> [props...]  Apply a budget for a location and props");
    println!("  move <munchie> <location>     Move a character (budget without props)");
    println!("  buggie <id> <n>               Set a stressor's intensity (0-5)");
    println!("  story <title>                 Start a new story (drops all beats)");
    println!("  add <stage> <title>           Add a beat to a stage lane");
    println!("  stage <n|next|prev>           Move the stage cursor");
    println!("  beat                          Insert the regulation beat (stage 4 only)");
    println!("  scene <event-id>              Show the scene request and offline text");
    println!("  pause                         Raise pause-and-breathe");
    println!("  ack <micro|pause>             Acknowledge one alert");
    println!("  clear                         Acknowledge both alerts");
    println!("  tick <seconds>                Advance the session clock");
    println!("  lanes                         Show stage lanes");
    println!("  status                        Show budget, alerts and telemetry");
    println!("  note                          Print the care note");
    println!("  export                        Print the JSON snapshot");
    println!("  reset                         Start over");
    println!("  help                          Show this help");
    println!("  quit                          Exit");
}
