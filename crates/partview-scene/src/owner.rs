use std::path::Path;

use anyhow::Result;
use log::{debug, info};
use partview_vr::{ActorSummary, VrController, VrEvent};

use crate::loader::{self, ImportSummary, MeshLoader};
use crate::status::StatusBar;
use crate::tree::{PartId, PartTree};

/// Edits from the part-options dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartOptions {
    pub name: String,
    pub colour: [u8; 3],
    pub visible: bool,
}

/// UI-thread owner of the part tree and the VR controller.
pub struct SceneOwner<L> {
    tree: PartTree,
    vr: VrController,
    status: StatusBar,
    loader: L,
    mirrored: Vec<ActorSummary>,
}

impl<L: MeshLoader> SceneOwner<L> {
    pub fn new(loader: L, vr: VrController) -> Self {
        Self {
            tree: PartTree::new(),
            vr,
            status: StatusBar::new(),
            loader,
            mirrored: Vec::new(),
        }
    }

    pub fn tree(&self) -> &PartTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut PartTree {
        &mut self.tree
    }

    pub fn vr(&self) -> &VrController {
        &self.vr
    }

    pub fn vr_mut(&mut self) -> &mut VrController {
        &mut self.vr
    }

    pub fn status(&self) -> &StatusBar {
        &self.status
    }

    pub fn status_mut(&mut self) -> &mut StatusBar {
        &mut self.status
    }

    /// Actors the running VR instance reported as received.
    pub fn mirrored(&self) -> &[ActorSummary] {
        &self.mirrored
    }

    fn flush_notices(&mut self) {
        for notice in self.vr.take_notices() {
            self.status.notice(&notice);
        }
    }

    // ── VR ─────────────────────────────────────────────────────────────────

    /// Mirrors every visible part into a new VR instance.
    pub fn handle_start_vr(&mut self) -> bool {
        let started = self.vr.start(self.tree.visible_actors()).is_ok();
        if started {
            self.mirrored.clear();
        }
        self.flush_notices();
        started
    }

    pub fn handle_stop_vr(&mut self) -> bool {
        let stopped = self.vr.stop();
        self.flush_notices();
        stopped
    }

    /// Drains VR events and forwards their notices to the status bar.
    pub fn poll_vr(&mut self) -> Vec<VrEvent> {
        let events = self.vr.poll_events();
        for event in &events {
            if let VrEvent::ActorsReceived { generation, actors } = event {
                info!("vr#{generation} received {} actor(s)", actors.len());
                self.mirrored = actors.clone();
            }
        }
        self.flush_notices();
        events
    }

    // ── parts ──────────────────────────────────────────────────────────────

    /// Applies the options dialog result to `id`.
    ///
    /// A colour change is forwarded to the running VR instance.
    pub fn set_part_options(&mut self, id: PartId, options: PartOptions) -> bool {
        let Some(part) = self.tree.get_mut(id) else {
            return false;
        };

        let [r, g, b] = options.colour;
        let recolored = part.colour() != options.colour;
        part.rename(options.name);
        part.set_colour(r, g, b);
        part.set_visible(options.visible);

        if recolored && let Some(actor) = part.actor() {
            let forwarded = self.vr.change_actor_color(
                actor.id(),
                f64::from(r) / 255.0,
                f64::from(g) / 255.0,
                f64::from(b) / 255.0,
            );
            if forwarded {
                debug!("forwarded recolor of {} to VR", actor.id());
            }
        }

        self.status.show("Updated item options", StatusBar::DEFAULT_TIMEOUT_MS);
        true
    }

    /// Replaces the tree with the parts found under `dir`.
    ///
    /// A running VR instance keeps its own clones.
    pub fn open_folder(&mut self, dir: &Path) -> Result<ImportSummary> {
        self.tree.clear();
        let summary = loader::import_folder(&mut self.tree, None, dir, &self.loader)?;
        self.status.show(
            format!("Loaded {} part(s) from {} (invisible)", summary.parts, dir.display()),
            StatusBar::DEFAULT_TIMEOUT_MS,
        );
        Ok(summary)
    }

    pub fn add_single_file(&mut self, path: &Path) -> PartId {
        let (id, _) = loader::add_file(&mut self.tree, path, &self.loader);
        let name = self.tree.get(id).map(|p| p.name().to_string()).unwrap_or_default();
        self.status.show(
            format!("Loaded single file: {name}"),
            StatusBar::DEFAULT_TIMEOUT_MS,
        );
        id
    }

    /// Empties the tree. A running VR instance keeps its own clones.
    pub fn clear(&mut self) {
        self.tree.clear();
        self.status.show("Tree view and scene cleared", StatusBar::DEFAULT_TIMEOUT_MS);
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::thread;
    use std::time::{Duration, Instant};

    use super::*;
    use crate::tree::ModelPart;
    use partview_vr::device::{DeviceFactory, NoDisplay};
    use partview_vr::{Actor, Geometry, Rgb, VrConfig};

    fn loader(_: &Path) -> Result<Geometry> {
        Ok(Geometry::cube([0.0; 3], 1.0))
    }

    type Loader = fn(&Path) -> Result<Geometry>;

    fn owner() -> SceneOwner<Loader> {
        let config = VrConfig {
            frame_interval: Duration::from_millis(1),
            ..VrConfig::default()
        };
        let vr = VrController::new(config, || -> Box<dyn DeviceFactory> { Box::new(NoDisplay) });
        SceneOwner::new(loader as Loader, vr)
    }

    fn mesh(name: &str) -> ModelPart {
        ModelPart::with_actor(name, Actor::new(name, Geometry::cube([0.0; 3], 1.0)))
    }

    fn poll_until(owner: &mut SceneOwner<Loader>, mut hit: impl FnMut(&VrEvent) -> bool) -> Vec<VrEvent> {
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut seen = Vec::new();
        loop {
            for event in owner.poll_vr() {
                let done = hit(&event);
                seen.push(event);
                if done {
                    return seen;
                }
            }
            assert!(Instant::now() < deadline, "event not seen: {seen:?}");
            thread::sleep(Duration::from_millis(1));
        }
    }

    fn texts(owner: &mut SceneOwner<Loader>) -> Vec<String> {
        owner.status_mut().take().into_iter().map(|m| m.text).collect()
    }

    #[test]
    fn start_mirrors_only_visible_parts() {
        let mut owner = owner();
        owner.tree_mut().add_root(mesh("shown"));
        let hidden = owner.tree_mut().add_root(mesh("hidden"));
        owner.tree_mut().get_mut(hidden).unwrap().set_visible(false);

        assert!(owner.handle_start_vr());
        poll_until(&mut owner, |e| matches!(e, VrEvent::ActorsReceived { .. }));

        let names: Vec<&str> = owner.mirrored().iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["shown"]);
        assert!(owner.handle_stop_vr());
    }

    #[test]
    fn status_messages_follow_the_vr_lifecycle() {
        let mut owner = owner();

        assert!(!owner.handle_stop_vr());
        assert!(owner.handle_start_vr());
        assert!(!owner.handle_start_vr());
        assert!(owner.handle_stop_vr());

        assert_eq!(
            texts(&mut owner),
            vec![
                "VR thread was not running",
                "VR started",
                "VR is already running.",
                "VR thread stopped",
            ]
        );
        assert_eq!(owner.status().latest(), None);
    }

    #[test]
    fn recolor_is_forwarded_to_the_running_clone() {
        let mut owner = owner();
        owner.tree_mut().add_root(mesh("one"));
        let two = owner.tree_mut().add_root(mesh("two"));
        owner.handle_start_vr();

        let options = PartOptions {
            name: "two".into(),
            colour: [255, 0, 0],
            visible: true,
        };
        assert!(owner.set_part_options(two, options));
        owner.handle_stop_vr();

        let events = poll_until(&mut owner, |e| matches!(e, VrEvent::Stopped { .. }));
        let Some(VrEvent::Stopped { report, .. }) = events.last() else {
            unreachable!()
        };
        let colors: Vec<Rgb> = report.final_actors.iter().map(|a| a.color).collect();
        assert_eq!(colors, vec![Rgb::WHITE, Rgb::RED]);
    }

    #[test]
    fn part_options_update_the_tree() {
        let mut owner = owner();
        let id = owner.tree_mut().add_root(mesh("gear"));
        let options = PartOptions {
            name: "big gear".into(),
            colour: [0, 128, 255],
            visible: false,
        };
        assert!(owner.set_part_options(id, options));

        let part = owner.tree().get(id).unwrap();
        assert_eq!(part.name(), "big gear");
        assert_eq!(part.colour(), [0, 128, 255]);
        assert!(!part.visible());
        assert_eq!(
            owner.status().latest().map(|m| m.timeout_ms),
            Some(StatusBar::DEFAULT_TIMEOUT_MS)
        );
    }

    #[test]
    fn opening_a_folder_replaces_the_tree() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        fs::write(first.path().join("a.stl"), "solid a").unwrap();
        fs::write(second.path().join("b.stl"), "solid b").unwrap();

        let mut owner = owner();
        owner.tree_mut().add_root(mesh("hand made"));
        owner.open_folder(first.path()).unwrap();
        owner.open_folder(second.path()).unwrap();

        let tree = owner.tree();
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.get(tree.roots()[0]).unwrap().name(), "b.stl");
    }

    #[test]
    fn folder_import_and_clear() {
        let root = tempfile::tempdir().unwrap();
        fs::write(root.path().join("a.stl"), "solid a").unwrap();
        fs::write(root.path().join("b.stl"), "solid b").unwrap();

        let mut owner = owner();
        let summary = owner.open_folder(root.path()).unwrap();
        assert_eq!(summary.parts, 2);
        assert!(owner.tree().visible_actors().is_empty());

        let single = owner.add_single_file(&root.path().join("a.stl"));
        assert!(owner.tree().get(single).unwrap().visible());

        owner.clear();
        assert!(owner.tree().is_empty());
        assert_eq!(
            owner.status().latest().map(|m| m.text.as_str()),
            Some("Tree view and scene cleared")
        );
    }
}
