//! # Wayfarer Main Entry Point
//!
//! Parses arguments, sets up logging, and runs a terminal front end over the
//! scene manager: typed keys in, an ASCII view of the session out.

use clap::{Parser, ValueEnum};
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, BufReader};
use wayfarer::{
    ContentGenerator, FileSaveStore, GameEvent, GameMode, GenerationConfig, InputDebouncer,
    InputHandler, LldmConfig, LldmGenerator, ProceduralGenerator, RulesConfig, SceneManager,
    Session, Snapshot, WayfarerResult,
};
#[cfg(feature = "dev-tools")]
use tracing::{info, Level};

#[cfg(not(feature = "dev-tools"))]
use log::info;

/// Which content generator fills new chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum GeneratorKind {
    /// Offline, deterministic per seed
    Procedural,
    /// External language model command
    Lldm,
}

/// Command line arguments for Wayfarer.
#[derive(Parser, Debug)]
#[command(name = "wayfarer")]
#[command(about = "A chunk-streaming RPG with LLM-driven world generation")]
#[command(version)]
struct Args {
    /// Random seed for generation and combat rolls
    #[arg(short, long)]
    seed: Option<u64>,

    /// JSON file overriding the rules table
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,

    /// Save file location
    #[arg(long, default_value = "wayfarer_save.json")]
    save: std::path::PathBuf,

    /// Content generator
    #[arg(long, value_enum, default_value = "procedural")]
    generator: GeneratorKind,

    /// Command run by the LLM generator; the prompt arrives on stdin
    #[arg(long, default_value = "llm")]
    lldm_command: String,

    /// Enable development mode with debug tools
    #[arg(long)]
    dev_mode: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> WayfarerResult<()> {
    let args = Args::parse();
    initialize_logging(&args.log_level, args.dev_mode);
    info!("Starting Wayfarer v{}", wayfarer::VERSION);

    let rules = match &args.config {
        Some(path) => RulesConfig::load(path)?,
        None => RulesConfig::default(),
    };
    let seed = args.seed.unwrap_or_else(rand::random);
    info!("Using seed {}", seed);

    let session = Session::new(rules, seed)?;
    let saves = FileSaveStore::new(&args.save);

    match args.generator {
        GeneratorKind::Procedural => {
            let generator = ProceduralGenerator::new(GenerationConfig::new(seed));
            run_game(SceneManager::new(session, generator, saves), args.dev_mode).await
        }
        GeneratorKind::Lldm => {
            let config = LldmConfig {
                command: args.lldm_command.clone(),
                ..LldmConfig::default()
            };
            let generator = LldmGenerator::from_config(config);
            run_game(SceneManager::new(session, generator, saves), args.dev_mode).await
        }
    }
}

/// Initializes the logging system based on the specified log level.
fn initialize_logging(log_level: &str, dev_mode: bool) {
    #[cfg(feature = "dev-tools")]
    {
        let level = match log_level.to_lowercase().as_str() {
            "error" => Level::ERROR,
            "warn" => Level::WARN,
            "info" => Level::INFO,
            "debug" => Level::DEBUG,
            "trace" => Level::TRACE,
            _ => Level::INFO,
        };
        let level = if dev_mode { Level::DEBUG.max(level) } else { level };

        tracing_subscriber::fmt()
            .with_max_level(level)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    #[cfg(not(feature = "dev-tools"))]
    {
        let level = if dev_mode { "debug" } else { log_level };
        env_logger::Builder::new()
            .parse_filters(level)
            .target(env_logger::Target::Stderr)
            .init();
    }
}

/// Runs the terminal loop until stdin closes or the player types `quit`.
async fn run_game<G: ContentGenerator>(
    mut manager: SceneManager<G, FileSaveStore>,
    dev_mode: bool,
) -> WayfarerResult<()> {
    let input = InputHandler::new();
    let mut debouncer = InputDebouncer::default();
    let started = Instant::now();
    let mut last_tick = Instant::now();

    render(&manager.session().snapshot(), dev_mode);
    tokio::time::sleep(std::time::Duration::from_millis(
        manager.session().rules.boot_delay_ms,
    ))
    .await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        manager.tick(last_tick.elapsed().as_millis() as u64);
        last_tick = Instant::now();
        render(&manager.session().snapshot(), dev_mode);

        let Some(line) = lines.next_line().await? else {
            break;
        };
        if line.trim().eq_ignore_ascii_case("quit") {
            break;
        }
        if !debouncer.accept(started.elapsed().as_millis() as u64) {
            continue;
        }

        for (index, action) in input.map_line(&line).into_iter().enumerate() {
            // the rest of a batched line goes no faster than the debounce rate
            if index > 0 {
                let wait = debouncer.pace(started.elapsed().as_millis() as u64);
                if wait > 0 {
                    render(&manager.session().snapshot(), dev_mode);
                    tokio::time::sleep(std::time::Duration::from_millis(wait)).await;
                }
            }
            manager.tick(last_tick.elapsed().as_millis() as u64);
            last_tick = Instant::now();
            match manager.dispatch(action) {
                Ok(events) => log_events(&events),
                Err(err) => {
                    log::warn!("Rejected {}: {}", action, err);
                    continue;
                }
            }
            if manager.pending_requests() > 0 {
                render(&manager.session().snapshot(), dev_mode);
                let events = manager.pump().await?;
                log_events(&events);
            }
        }
    }

    info!("Game loop ended");
    Ok(())
}

fn log_events(events: &[GameEvent]) {
    for event in events {
        log::debug!("{:?}", event);
    }
}

fn render(snapshot: &Snapshot<'_>, dev_mode: bool) {
    let mut out = String::new();
    out.push_str("\n========================================\n");

    match snapshot.mode {
        GameMode::Boot => out.push_str("WAYFARER\n\nbooting...\n"),
        GameMode::Title => {
            out.push_str("WAYFARER\n\n");
            out.push_str(&menu_line("NEW GAME", snapshot.cursors.title == 0));
            if snapshot.has_save {
                out.push_str(&menu_line("CONTINUE", snapshot.cursors.title == 1));
            }
        }
        GameMode::ClassSelect => {
            out.push_str("CHOOSE YOUR CLASS\n\n");
            for (index, class) in snapshot.classes.iter().enumerate() {
                let label = format!(
                    "{:<8} HP {:>2} MP {:>2}  {}",
                    class.name, class.hp, class.mp, class.description
                );
                out.push_str(&menu_line(&label, snapshot.cursors.class == index));
            }
        }
        GameMode::Loading => out.push_str("LOADING...\n"),
        GameMode::Playing | GameMode::LevelUp | GameMode::GameOver => {
            out.push_str(&render_chunk(snapshot));
            if snapshot.mode == GameMode::LevelUp {
                out.push_str(&render_level_up(snapshot));
            }
            if snapshot.mode == GameMode::GameOver {
                out.push_str("\nGAME OVER (start to continue)\n");
            }
        }
        GameMode::Inventory => {
            out.push_str("INVENTORY\n\n");
            if snapshot.player.inventory.is_empty() {
                out.push_str("  (empty)\n");
            }
            for (index, item) in snapshot.player.inventory.items().iter().enumerate() {
                let label = format!("{} x{}  {}", item.name, item.count, item.description);
                out.push_str(&menu_line(&label, snapshot.cursors.inventory == index));
            }
        }
        GameMode::Dialogue => {
            if let Some(dialogue) = snapshot.dialogue {
                out.push_str(&format!("{}\n\n\"{}\"\n", dialogue.npc_name, dialogue.text));
                if dialogue.is_shopkeeper {
                    out.push_str("\n[primary] shop  [secondary] leave\n");
                }
            }
        }
        GameMode::Shop => {
            out.push_str(&format!("SHOP  (gold: {})\n\n", snapshot.player.score));
            for (index, item) in snapshot.shop_items.iter().enumerate() {
                let label = format!("{:<8} {:>3}g", item.name, item.cost.unwrap_or(0));
                out.push_str(&menu_line(&label, snapshot.cursors.shop == index));
            }
        }
        GameMode::Map => out.push_str(&render_world_map(snapshot)),
    }

    if !snapshot.message.is_empty() {
        out.push_str(&format!("\n> {}\n", snapshot.message));
    }
    if dev_mode {
        out.push_str(&format!(
            "[{} turn {} chunks {}]\n",
            snapshot.mode.label(),
            snapshot.turn_number,
            snapshot.store.len()
        ));
    }
    print!("{out}");
}

fn menu_line(label: &str, selected: bool) -> String {
    format!("{} {}\n", if selected { ">" } else { " " }, label)
}

fn render_chunk(snapshot: &Snapshot<'_>) -> String {
    let Some(chunk) = snapshot.chunk else {
        return String::new();
    };
    let mut rows: Vec<Vec<char>> = chunk
        .render_rows()
        .into_iter()
        .map(|row| row.chars().collect())
        .collect();
    let mut put = |x: i32, y: i32, glyph: char| {
        if let Some(cell) = rows
            .get_mut(y.max(0) as usize)
            .and_then(|row| row.get_mut(x.max(0) as usize))
        {
            *cell = glyph;
        }
    };
    for npc in snapshot.npcs {
        put(npc.position.x, npc.position.y, 'N');
    }
    for enemy in snapshot.enemies {
        let glyph = if enemy.flash.is_some() { '!' } else { enemy.glyph() };
        put(enemy.position.x, enemy.position.y, glyph);
    }
    put(snapshot.player.position.x, snapshot.player.position.y, '@');

    let stats = &snapshot.player.stats;
    let mut out = format!(
        "{} ({})  {}\n",
        chunk.biome_name, snapshot.coord, snapshot.player.class_name
    );
    for row in rows {
        out.extend(row);
        out.push('\n');
    }
    out.push_str(&format!(
        "HP {}/{}  MP {}/{}  LV {}  XP {}/{}  GOLD {}\n",
        stats.hp,
        stats.max_hp,
        stats.mp,
        stats.max_mp,
        stats.level,
        stats.xp,
        stats.xp_to_next,
        snapshot.player.score
    ));
    if let Some(quest) = snapshot.player.active_quest.as_ref().filter(|q| !q.is_completed) {
        out.push_str(&format!("QUEST: {}\n", quest.description));
    }
    out
}

fn render_level_up(snapshot: &Snapshot<'_>) -> String {
    let stats = &snapshot.player.stats;
    let mut out = format!("\nLEVEL UP! points: {}\n", stats.points_available);
    let values = [stats.grit, stats.agility, stats.will, stats.wisdom];
    for (index, attribute) in wayfarer::Attribute::all().into_iter().enumerate() {
        let label = format!("{:<8} {}", attribute.label(), values[index]);
        out.push_str(&menu_line(&label, snapshot.cursors.level_up == index));
    }
    out
}

fn render_world_map(snapshot: &Snapshot<'_>) -> String {
    let coords = snapshot.store.coords();
    let (Some(min_x), Some(max_x)) = (
        coords.iter().map(|c| c.cx).min(),
        coords.iter().map(|c| c.cx).max(),
    ) else {
        return "WORLD MAP\n\n  (nothing explored)\n".to_string();
    };
    let min_y = coords.iter().map(|c| c.cy).min().unwrap_or(0);
    let max_y = coords.iter().map(|c| c.cy).max().unwrap_or(0);

    let mut out = String::from("WORLD MAP\n\n");
    for cy in min_y..=max_y {
        for cx in min_x..=max_x {
            let coord = wayfarer::ChunkCoord::new(cx, cy);
            let glyph = if coord == snapshot.coord {
                '@'
            } else {
                match snapshot.store.get(coord) {
                    Some(chunk) if chunk.is_city => 'T',
                    Some(_) => '#',
                    None => ' ',
                }
            };
            out.push(glyph);
        }
        out.push('\n');
    }
    out
}
