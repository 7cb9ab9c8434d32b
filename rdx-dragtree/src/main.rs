use anyhow::Result;
use dragtree::prelude::*;
use dragtree::{ENGINE_NAME, VERSION};
use std::env;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Reaction delays the autopilot cycles through. `None` jumps the start.
const AUTOPILOT_REACTIONS: [Option<u64>; 4] = [Some(240), Some(180), None, Some(310)];

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    // 2. Load the configuration, from the first argument if one is given.
    let config_path = env::args().nth(1).unwrap_or_else(|| "dragtree.toml".to_string());
    let config = TreeConfig::load(&config_path)?;
    info!("{} v{} using {}", ENGINE_NAME, VERSION, config_path);

    // 3. Create the engine and listen to what it does.
    let engine = TreeEngine::new(config);
    spawn_event_listeners(&engine);

    // 4. Let an autopilot drive the tree instead of a keyboard.
    let (key_tx, key_rx) = mpsc::channel(8);
    spawn_autopilot(&engine, key_tx);

    // 5. Run the engine until the autopilot quits.
    let scoreboard = engine.run(key_rx).await?;
    info!(
        "Session over: {} runs, {} false starts, best {:?}, recent average {:?}",
        scoreboard.runs(),
        scoreboard.false_starts(),
        scoreboard.best(),
        scoreboard.recent_average()
    );
    Ok(())
}

/// Spawns tasks that log the engine's event streams.
fn spawn_event_listeners(engine: &TreeEngine) {
    let mut system_rx = engine.subscribe_system_events();
    tokio::spawn(async move {
        while let Ok(event) = system_rx.recv().await {
            info!("[SYSTEM] => {:?}", event);
        }
    });

    let mut race_rx = engine.subscribe_race_events();
    tokio::spawn(async move {
        while let Ok(event) = race_rx.recv().await {
            info!("[RACE] => {:?}", event);
        }
    });
}

/// Presses the action key at scripted moments, then quits.
fn spawn_autopilot(engine: &TreeEngine, keys: mpsc::Sender<String>) {
    let mut race_rx = engine.subscribe_race_events();
    let mapper = engine.mapper().clone();
    let action = key_for(&mapper, Intent::Action);
    let quit = key_for(&mapper, Intent::Quit);

    tokio::spawn(async move {
        let mut plan = AUTOPILOT_REACTIONS.iter();
        let mut current = plan.next().copied();
        while let Ok(event) = race_rx.recv().await {
            match (event, current) {
                (RaceEvent::Armed, Some(None)) => {
                    tokio::time::sleep(Duration::from_millis(900)).await;
                    keys.send(action.clone()).await.ok();
                }
                (RaceEvent::StageAdvanced { to: Stage::Launch, .. }, Some(Some(delay))) => {
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                    keys.send(action.clone()).await.ok();
                }
                (RaceEvent::Finished { .. } | RaceEvent::FalseStart { .. }, _) => {
                    current = plan.next().copied();
                    if current.is_none() {
                        keys.send(quit.clone()).await.ok();
                        break;
                    }
                }
                _ => {}
            }
        }
    });
}

fn key_for(mapper: &InputMapper, intent: Intent) -> String {
    match mapper
        .bindings()
        .into_iter()
        .find(|binding| binding.intent == intent)
        .and_then(|binding| binding.keys.first())
    {
        Some(key) => key.clone(),
        None => {
            warn!("No key bound to {}; the autopilot cannot press it.", intent);
            String::new()
        }
    }
}
