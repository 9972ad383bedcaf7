use std::path::Path;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use log::{info, warn};
use partview_scene::{ModelPart, PartOptions, SceneOwner};
use partview_vr::device::{DeviceFactory, GpuInit, StereoEmulatorFactory};
use partview_vr::logging::{LoggingConfig, init_logging};
use partview_vr::{Actor, CommandKind, Geometry, VrConfig, VrController, VrEvent};

const DEFAULT_FRAMES: u64 = 270;

/// Mesh files are read by the desktop shell; the demo builds parts in code.
fn no_reader(path: &Path) -> Result<Geometry> {
    bail!("no mesh reader available for {}", path.display())
}

fn frames_from_env() -> Result<u64> {
    match std::env::var("PARTVIEW_FRAMES") {
        Ok(v) => v
            .parse()
            .with_context(|| format!("PARTVIEW_FRAMES must be a frame count, got {v:?}")),
        Err(_) => Ok(DEFAULT_FRAMES),
    }
}

fn part(name: &str, geometry: Geometry) -> ModelPart {
    ModelPart::with_actor(name, Actor::new(name, geometry))
}

fn main() -> Result<()> {
    init_logging(LoggingConfig {
        env_filter: std::env::var("PARTVIEW_LOG").ok(),
        ..LoggingConfig::default()
    });

    let frames = frames_from_env()?;
    let config = VrConfig::default();
    let interval = config.frame_interval;

    let factory = StereoEmulatorFactory::new(GpuInit::default());
    let gpu_resources = factory.counter();
    let vr = VrController::new(config, move || -> Box<dyn DeviceFactory> {
        Box::new(factory.clone())
    });

    let mut owner = SceneOwner::new(no_reader, vr);

    // ── demo assembly ──────────────────────────────────────────────────────
    let tree = owner.tree_mut();
    let assembly = tree.add_root(ModelPart::group("assembly"));
    tree.add(Some(assembly), part("base", Geometry::cube([0.0, 0.0, 0.0], 0.5)));
    let post = tree
        .add(Some(assembly), part("post", Geometry::cube([0.0, 0.75, 0.0], 0.25)))
        .context("assembly group vanished")?;
    tree.add(Some(assembly), part("cap", Geometry::tetrahedron([-0.25, 1.0, -0.25], 0.5)));
    let spare = tree.add_root(part("spare", Geometry::cube([2.0, 0.0, 0.0], 0.5)));
    if let Some(spare) = tree.get_mut(spare) {
        spare.set_visible(false);
    }

    // ── run ────────────────────────────────────────────────────────────────
    if !owner.handle_start_vr() {
        bail!("VR did not start");
    }

    for frame in 0..frames {
        thread::sleep(interval);

        for event in owner.poll_vr() {
            match event {
                VrEvent::DeviceFailed { reason, .. } => warn!("VR device failed: {reason}"),
                VrEvent::Stopped { report, .. } => {
                    info!("VR stopped early after {} frame(s)", report.frames_presented);
                }
                _ => {}
            }
        }
        if !owner.vr().is_running() {
            break;
        }

        if frame == frames / 3 {
            owner.set_part_options(
                post,
                PartOptions {
                    name: "post".into(),
                    colour: [220, 40, 40],
                    visible: true,
                },
            );
        }
        if frame == frames / 2 {
            owner.vr().issue_command(CommandKind::RotateY, 45.0);
        }
    }

    owner.handle_stop_vr();
    thread::sleep(Duration::from_millis(10));
    for event in owner.poll_vr() {
        if let VrEvent::Stopped { report, .. } = event {
            info!(
                "presented {} frame(s), skipped {}, {} actor(s) mirrored",
                report.frames_presented,
                report.frames_skipped,
                report.final_actors.len()
            );
            for actor in &report.final_actors {
                let [r, g, b] = actor.color.to_u8();
                info!("  {} ({}): #{r:02x}{g:02x}{b:02x}", actor.name, actor.id);
            }
        }
    }

    if gpu_resources.held() > 0 {
        warn!("{} GPU resource(s) still held", gpu_resources.held());
    }
    Ok(())
}
