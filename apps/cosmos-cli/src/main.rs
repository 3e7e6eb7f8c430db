use anyhow::{Context, bail};
use clap::{Parser, Subcommand, ValueEnum};
use cosmos_common::{EntityId, FixedDelta};
use cosmos_input::{CosmicEntropy, Intent, IntentKind};
use cosmos_kernel::{Cosmos, CosmosSettings};
use cosmos_persist::{Demo, state_digest};
use cosmos_predict::ConfirmedStep;
use cosmos_setups::{
    AppConfig, ClientSetup, EditorSetup, FrameLoop, MainMenuSetup, ServerSetup, Setup,
    TestSceneSetup,
};
use cosmos_solver::test_scenes::test_scene_cosmos;
use cosmos_solver::{NoCallbacks, SolverSettings, solve};
use cosmos_tools::{CosmosInspector, TickProfiler};
use cosmos_view::{DebugTextRenderer, RenderView, Renderer};
use glam::Vec2;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Steps before the menu background rewinds.
const MENU_LOOP_STEPS: u64 = 600;

#[derive(Parser)]
#[command(name = "cosmos-cli", about = "CLI for the cosmos simulation kernel")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Seed of the simulated cosmos
    #[arg(long, global = true, default_value = "42")]
    seed: u64,

    /// Logic steps per second
    #[arg(long, global = true, default_value = "60")]
    tickrate: u32,

    /// Rebuild and compare every cache after each step
    #[arg(long, global = true)]
    verify_caches: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and test scene info
    Info,
    /// Run the test scene twice, and once from a demo, and compare digests
    Determinism {
        #[arg(short, long, default_value = "600")]
        ticks: u64,
    },
    /// Simulate a client predicting against a lagging server
    Predict {
        #[arg(short, long, default_value = "300")]
        ticks: u64,
        /// Steps between a client sending input and the server applying it
        #[arg(short, long, default_value = "4")]
        latency: usize,
    },
    /// Drive a setup through the frame loop
    Run {
        #[arg(long, value_enum, default_value_t = SetupChoice::TestScene)]
        setup: SetupChoice,
        #[arg(short, long, default_value = "120")]
        frames: u32,
        /// Rendered frames per second
        #[arg(long, default_value = "144")]
        fps: u32,
        /// Worker threads for read-only jobs, 0 for one per core
        #[arg(long, default_value = "0")]
        workers: usize,
    },
    /// Summarize the test scene after some ticks
    Inspect {
        #[arg(short, long, default_value = "0")]
        ticks: u64,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Record a scripted demo of the test scene to a file
    Record {
        out: PathBuf,
        #[arg(short, long, default_value = "600")]
        ticks: u64,
    },
    /// Play a recorded demo and print its final digest
    Play { path: PathBuf },
}

#[derive(Clone, Copy, ValueEnum)]
enum SetupChoice {
    Server,
    Client,
    Editor,
    MainMenu,
    TestScene,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let config = AppConfig {
        cosmos: CosmosSettings {
            delta: FixedDelta::from_tickrate(cli.tickrate.max(1)),
            seed: cli.seed,
        },
        solver: SolverSettings {
            verify_caches_every_step: cli.verify_caches,
        },
        ..AppConfig::default()
    };

    match cli.command {
        Commands::Info => info(&config),
        Commands::Determinism { ticks } => determinism(&config, ticks),
        Commands::Predict { ticks, latency } => predict(&config, ticks, latency),
        Commands::Run {
            setup,
            frames,
            fps,
            workers,
        } => {
            let mut config = config;
            config.frame.worker_threads = workers;
            run(&config, setup, frames, fps)
        }
        Commands::Inspect { ticks, json } => inspect(&config, ticks, json),
        Commands::Record { out, ticks } => record(&config, &out, ticks),
        Commands::Play { path } => play(&config, &path),
    }
}

/// Walk in a square, sweep the crosshair and fire in bursts.
fn scripted_input(player: EntityId, step: u64) -> CosmicEntropy {
    const DIRECTIONS: [IntentKind; 4] = [
        IntentKind::MoveRight,
        IntentKind::MoveUp,
        IntentKind::MoveLeft,
        IntentKind::MoveDown,
    ];
    let mut entropy = CosmicEntropy::new();
    if step % 30 == 0 {
        let leg = (step / 30) as usize;
        if leg > 0 {
            entropy = entropy.with_intent(player, Intent::released(DIRECTIONS[(leg - 1) % 4]));
        }
        entropy = entropy.with_intent(player, Intent::pressed(DIRECTIONS[leg % 4]));
    }
    match step % 20 {
        5 => entropy = entropy.with_intent(player, Intent::pressed(IntentKind::Shoot)),
        9 => entropy = entropy.with_intent(player, Intent::released(IntentKind::Shoot)),
        _ => {}
    }
    if step % 10 == 0 {
        let sweep = if (step / 10) % 2 == 0 { 12.0 } else { -12.0 };
        entropy = entropy.with_motion(player, Vec2::new(sweep, sweep * 0.5));
    }
    entropy
}

fn scene(config: &AppConfig) -> anyhow::Result<(Cosmos, EntityId)> {
    let (cosmos, scene) = test_scene_cosmos(config.cosmos).context("building test scene")?;
    Ok((cosmos, scene.player))
}

fn info(config: &AppConfig) -> anyhow::Result<()> {
    println!("cosmos-cli v{}", env!("CARGO_PKG_VERSION"));
    let (cosmos, _) = scene(config)?;
    println!("flavours: {}", cosmos.flavours().len());
    println!("delta: {} ms, seed: {}", cosmos.delta().ms, cosmos.seed());
    println!("{}", CosmosInspector::summary(&cosmos));
    Ok(())
}

fn determinism(config: &AppConfig, ticks: u64) -> anyhow::Result<()> {
    println!("Determinism: seed={}, ticks={ticks}", config.cosmos.seed);

    let (mut first, player) = scene(config)?;
    let (mut second, _) = scene(config)?;
    let mut demo = Demo::begin(&first)?;
    let mut profiler = TickProfiler::new(
        ticks.clamp(1, 1024) as usize,
        Duration::from_millis(u64::from(first.delta().ms)),
    );

    for _ in 0..ticks {
        let entropy = scripted_input(player, first.step());
        demo.record(first.step(), entropy.clone());
        let report = solve(&mut first, &entropy, config.solver, &mut NoCallbacks);
        profiler.record(&report.profile);
        solve(&mut second, &entropy, config.solver, &mut NoCallbacks);
    }
    let replayed = demo.play(config.solver)?;

    let digests = [
        state_digest(&first)?,
        state_digest(&second)?,
        state_digest(&replayed)?,
    ];
    println!("Run 1:  step={} digest={}", first.step(), digests[0]);
    println!("Run 2:  step={} digest={}", second.step(), digests[1]);
    println!("Replay: step={} digest={}", replayed.step(), digests[2]);
    let total = profiler.total();
    println!(
        "Tick cost: avg={:?} max={:?} over budget={}",
        total.average,
        total.max,
        profiler.over_budget()
    );

    if digests.iter().any(|d| *d != digests[0]) {
        bail!("MISMATCH: runs diverged");
    }
    println!("Match: OK");
    Ok(())
}

fn predict(config: &AppConfig, ticks: u64, latency: usize) -> anyhow::Result<()> {
    let (cosmos, player) = scene(config)?;
    let mut server = ServerSetup::new(cosmos.clone(), config.solver, config.frame);
    let mut client = ClientSetup::new(
        cosmos,
        player,
        config.prediction,
        config.solver,
        config.frame,
    );
    let mut to_server: VecDeque<Vec<CosmicEntropy>> = VecDeque::new();
    let mut to_client: VecDeque<Vec<ConfirmedStep>> = VecDeque::new();
    let mut resamples = 0;
    let mut max_ahead = 0;

    for step in 0..ticks {
        client.advance(&scripted_input(player, client.predicted().step()));
        to_server.push_back(client.take_outbox());

        if to_server.len() > latency {
            for entropy in to_server.pop_front().unwrap_or_default() {
                server.accept_client_entropy(player, entropy);
            }
        }
        // The server runs its own clock regardless of client input.
        if step >= latency as u64 {
            server.advance(&CosmicEntropy::new());
        }
        to_client.push_back(server.drain_confirmed());

        if to_client.len() > latency {
            let confirmed = to_client.pop_front().unwrap_or_default();
            client.receive_confirmed(&confirmed);
        }
        if client.reload_viewables() {
            resamples += 1;
        }
        max_ahead = max_ahead.max(client.coordinator().predicted_ahead());
    }

    println!(
        "Server step={}  client referential={} predicted={}",
        server.cosmos().step(),
        client.coordinator().referential().step(),
        client.predicted().step()
    );
    println!("Max predicted ahead: {max_ahead}");
    println!("Resamples: {resamples}");
    Ok(())
}

fn build_setup(config: &AppConfig, choice: SetupChoice) -> anyhow::Result<Setup> {
    let (cosmos, player) = scene(config)?;
    Ok(match choice {
        SetupChoice::Server => {
            Setup::Server(ServerSetup::new(cosmos, config.solver, config.frame))
        }
        SetupChoice::Client => Setup::Client(ClientSetup::new(
            cosmos,
            player,
            config.prediction,
            config.solver,
            config.frame,
        )),
        SetupChoice::Editor => {
            let mut editor = EditorSetup::new(cosmos, config.solver, config.frame);
            editor.start_playtest();
            Setup::Editor(editor)
        }
        SetupChoice::MainMenu => Setup::MainMenu(MainMenuSetup::new(
            cosmos,
            MENU_LOOP_STEPS,
            config.solver,
            config.frame,
        )?),
        SetupChoice::TestScene => Setup::TestScene(TestSceneSetup::new(config)?),
    })
}

fn run(config: &AppConfig, choice: SetupChoice, frames: u32, fps: u32) -> anyhow::Result<()> {
    let setup = build_setup(config, choice)?;
    let kind = setup.kind();
    let (mut frame_loop, subscriber) = FrameLoop::new(setup, config)?;
    let dt = 1.0 / fps.max(1) as f32;
    let budget = Duration::from_millis(u64::from(config.cosmos.delta.ms));
    let mut profiler = TickProfiler::new(256, budget);
    tracing::info!(%kind, frames, fps, workers = frame_loop.worker_threads(), "running frame loop");

    let presented = std::thread::scope(|scope| -> anyhow::Result<u64> {
        let presenter = scope.spawn(|| {
            let renderer = DebugTextRenderer::new();
            let mut presented = 0u64;
            let mut last = String::new();
            while subscriber.wait_next(Duration::from_millis(250)).is_some() {
                let frame = subscriber.latest();
                last = renderer.render(&frame, &RenderView::default());
                presented += 1;
            }
            (presented, last)
        });

        for frame in 0..frames {
            if let Some(character) = frame_loop.setup().viewed_character() {
                let step = frame_loop.setup().viewed_cosmos().step();
                frame_loop.queue_input(scripted_input(character, step));
            }
            let outcome = frame_loop.run_frame(dt)?;
            for report in &outcome.steps {
                profiler.record(&report.profile);
            }
            if let Setup::Server(server) = frame_loop.setup_mut() {
                server.drain_confirmed();
            }
            tracing::trace!(frame, steps = outcome.steps.len(), "frame done");
        }
        drop(frame_loop);

        let (presented, last) = presenter
            .join()
            .map_err(|_| anyhow::anyhow!("presentation thread panicked"))?;
        print!("{last}");
        Ok(presented)
    })?;

    let total = profiler.total();
    println!(
        "{kind}: {frames} frames, {presented} presented, {} ticks, avg tick {:?}, max {:?}",
        profiler.ticks(),
        total.average,
        total.max
    );
    for (phase, stats) in profiler.hottest().into_iter().take(3) {
        println!("  {phase}: avg {:?}", stats.average);
    }
    Ok(())
}

fn inspect(config: &AppConfig, ticks: u64, json: bool) -> anyhow::Result<()> {
    let (mut cosmos, player) = scene(config)?;
    for _ in 0..ticks {
        let entropy = scripted_input(player, cosmos.step());
        solve(&mut cosmos, &entropy, config.solver, &mut NoCallbacks);
    }
    let summary = CosmosInspector::summary(&cosmos);
    if json {
        let entities: Vec<_> = CosmosInspector::list_entities(&cosmos)
            .into_iter()
            .filter_map(|id| CosmosInspector::inspect_entity(&cosmos, id))
            .collect();
        let doc = serde_json::json!({ "summary": summary, "entities": entities });
        println!("{}", serde_json::to_string_pretty(&doc)?);
    } else {
        println!("{summary}");
        for id in CosmosInspector::list_entities(&cosmos) {
            if let Some(info) = CosmosInspector::inspect_entity(&cosmos, id) {
                println!("  {info}");
            }
        }
    }
    Ok(())
}

fn record(config: &AppConfig, out: &Path, ticks: u64) -> anyhow::Result<()> {
    let (mut cosmos, player) = scene(config)?;
    let mut demo = Demo::begin(&cosmos)?;
    for _ in 0..ticks {
        let entropy = scripted_input(player, cosmos.step());
        demo.record(cosmos.step(), entropy.clone());
        solve(&mut cosmos, &entropy, config.solver, &mut NoCallbacks);
    }
    demo.save(out)
        .with_context(|| format!("writing demo to {}", out.display()))?;
    println!(
        "Recorded {} steps to {} (final digest {})",
        demo.log.len(),
        out.display(),
        state_digest(&cosmos)?
    );
    Ok(())
}

fn play(config: &AppConfig, path: &Path) -> anyhow::Result<()> {
    let demo = Demo::load(path).with_context(|| format!("reading demo {}", path.display()))?;
    let cosmos = demo.play(config.solver)?;
    println!(
        "Played {} steps from step {}: final step {} digest {}",
        demo.log.len(),
        demo.start.step(),
        cosmos.step(),
        state_digest(&cosmos)?
    );
    Ok(())
}
