//! dispatch-demo: a few simulated frames of a game loop wired through the
//! event registry.
//!
//! Usage: `dispatch-demo [registry.toml]`

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, AtomicU32, Ordering};

use anyhow::{Context, Result};
use parking_lot::Mutex;
use tracing::info;

use dispatch_core::logging::init_tracing;
use dispatch_core::{
    DispatchReport, Event, EventRegistry, HandlerResult, Listener, LoggerConfig, RegistryConfig,
    Subscriptions,
};

#[derive(Debug)]
struct PlayerDamaged {
    amount: i64,
}
impl Event for PlayerDamaged {}

#[derive(Debug)]
struct ItemPicked {
    item: &'static str,
}
impl Event for ItemPicked {}

#[derive(Debug)]
struct LevelCompleted {
    level: u32,
}
impl Event for LevelCompleted {}

struct Hud {
    health: AtomicI64,
}

impl Hud {
    fn on_damage(&self, ev: &PlayerDamaged) -> HandlerResult {
        let left: i64 = self.health.fetch_sub(ev.amount, Ordering::Relaxed) - ev.amount;
        info!(health = left, "HUD: health bar updated");
        Ok(())
    }

    fn on_level(&self, ev: &LevelCompleted) -> HandlerResult {
        info!(level = ev.level, "HUD: level banner shown");
        Ok(())
    }
}

impl Listener for Hud {
    fn subscriptions(&self, subs: &mut Subscriptions<Self>) {
        subs.on("on_damage", Self::on_damage)
            .on("on_level", Self::on_level);
    }
}

/// Only knows a handful of sounds; anything else is a handler error.
struct AudioMixer {
    played: Mutex<Vec<&'static str>>,
}

impl AudioMixer {
    fn on_pickup(&self, ev: &ItemPicked) -> HandlerResult {
        let clip: &'static str = match ev.item {
            "coin" => "sfx/coin.ogg",
            "potion" => "sfx/gulp.ogg",
            other => anyhow::bail!("no sound clip for item '{}'", other),
        };
        self.played.lock().push(clip);
        Ok(())
    }
}

impl Listener for AudioMixer {
    fn subscriptions(&self, subs: &mut Subscriptions<Self>) {
        subs.on("on_pickup", Self::on_pickup);
    }
}

#[derive(Default)]
struct Achievements {
    pickups: AtomicU32,
}

impl Listener for Achievements {
    fn subscriptions(&self, subs: &mut Subscriptions<Self>) {
        subs.on("on_pickup", |a: &Achievements, _ev: &ItemPicked| {
            let count: u32 = a.pickups.fetch_add(1, Ordering::Relaxed) + 1;
            if count == 3 {
                info!("Achievement unlocked: hoarder");
            }
            Ok(())
        });
    }
}

fn load_config() -> Result<RegistryConfig> {
    match std::env::args().nth(1) {
        Some(path) => RegistryConfig::load_from_file(&path)
            .with_context(|| format!("Failed to load registry config from {}", path)),
        None => Ok(RegistryConfig::default()),
    }
}

fn frame(registry: &EventRegistry, number: u32, events: &[Box<dyn Event>]) {
    let mut summary: DispatchReport = DispatchReport::default();

    for event in events {
        let report: DispatchReport = registry.dispatch(event.as_ref());
        summary.delivered += report.delivered;
        summary.failed += report.failed;
        summary.skipped += report.skipped;
    }

    info!(
        frame = number,
        delivered = summary.delivered,
        failed = summary.failed,
        skipped = summary.skipped,
        "Frame dispatched"
    );
}

fn main() -> Result<()> {
    init_tracing(&LoggerConfig::default()).context("Failed to initialize logging")?;

    let config: RegistryConfig = load_config()?;
    info!(?config, "Starting dispatch demo");

    let registry: EventRegistry = EventRegistry::with_config(config);

    let hud: Arc<Hud> = Arc::new(Hud {
        health: AtomicI64::new(100),
    });
    let audio: Arc<AudioMixer> = Arc::new(AudioMixer {
        played: Mutex::new(Vec::new()),
    });
    let achievements: Arc<Achievements> = Arc::new(Achievements::default());

    registry.register(&hud)?;
    registry.register(&audio)?;
    registry.register(&achievements)?;

    let opening: Vec<Box<dyn Event>> = vec![
        Box::new(ItemPicked { item: "coin" }),
        Box::new(PlayerDamaged { amount: 15 }),
    ];
    frame(&registry, 1, &opening);

    // The mixer has no clip for keys; the achievement tracker still counts it.
    let loot: Vec<Box<dyn Event>> = vec![
        Box::new(ItemPicked { item: "key" }),
        Box::new(ItemPicked { item: "potion" }),
    ];
    frame(&registry, 2, &loot);

    registry.unregister(&audio)?;
    drop(achievements);

    let finale: Vec<Box<dyn Event>> = vec![
        Box::new(ItemPicked { item: "coin" }),
        Box::new(LevelCompleted { level: 1 }),
    ];
    frame(&registry, 3, &finale);

    let pruned: usize = registry.prune();
    info!(
        clips = ?audio.played.lock(),
        pruned,
        stats = ?registry.stats(),
        "Demo finished"
    );

    Ok(())
}
