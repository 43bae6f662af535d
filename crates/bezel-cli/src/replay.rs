use crate::scene::Scene;
use anyhow::{Context, Result};
use bezel_events::{Event, EventListener, InputEvent};
use bezel_graph::OrthoCamera;
use bezel_nav::{ManualTimers, NavigationController, NavigatorSettings};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One line of a replay script: either a host input event or a pause during
/// which due timers fire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScriptStep {
    Advance { advance_ms: u64 },
    Input(InputEvent),
}

/// A notification together with the virtual time it was published at.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplayRecord {
    pub at_ms: u64,
    pub event: Event,
}

pub fn load_script(path: &Path) -> Result<Vec<ScriptStep>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read script {:?}", path))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid script {:?}", path))
}

type Navigator = NavigationController<OrthoCamera, ManualTimers>;

/// Run `steps` against a fresh navigator looking at `scene` and collect every
/// notification it publishes.
pub fn replay(
    scene: &Scene,
    settings: NavigatorSettings,
    steps: &[ScriptStep],
) -> Vec<ReplayRecord> {
    let mut nav = Navigator::new(scene.camera, ManualTimers::new(), settings);
    let mut records = Vec::new();
    nav.set_model(scene.graph.clone(), scene.landmark_set());
    nav.enable();
    collect(&nav, &mut records);

    for step in steps {
        match step {
            ScriptStep::Input(event) => nav.handle(event.clone()),
            ScriptStep::Advance { advance_ms } => advance(&mut nav, *advance_ms, &mut records),
        }
        collect(&nav, &mut records);
    }
    tracing::info!(
        steps = steps.len(),
        events = records.len(),
        elapsed_ms = nav.timers().now_ms(),
        "Replay finished"
    );
    records
}

fn advance(nav: &mut Navigator, ms: u64, records: &mut Vec<ReplayRecord>) {
    let until = nav.timers().now_ms().saturating_add(ms);
    while let Some((_, due)) = nav.timers().next_due()
        && due <= until
    {
        let Some(kind) = nav.timers_mut().fire_next() else {
            break;
        };
        nav.handle(InputEvent::Timer { kind });
        collect(nav, records);
    }
    let rest = until.saturating_sub(nav.timers().now_ms());
    for kind in nav.timers_mut().advance(rest) {
        nav.handle(InputEvent::Timer { kind });
        collect(nav, records);
    }
}

/// Stamps each dispatched notification with the virtual clock.
struct Recorder<'a> {
    at_ms: u64,
    records: &'a mut Vec<ReplayRecord>,
}

impl EventListener for Recorder<'_> {
    fn handle_event(&mut self, event: &Event) {
        self.records.push(ReplayRecord {
            at_ms: self.at_ms,
            event: event.clone(),
        });
    }
}

fn collect(nav: &Navigator, records: &mut Vec<ReplayRecord>) {
    let mut recorder = Recorder {
        at_ms: nav.timers().now_ms(),
        records,
    };
    nav.events().dispatch_to(&mut recorder);
}
