use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, warn};
use partview_vr::{Actor, Geometry};

use crate::tree::{ModelPart, PartId, PartTree};

/// Mesh-reading collaborator. Turns a file into triangle geometry.
pub trait MeshLoader {
    fn load(&self, path: &Path) -> Result<Geometry>;
}

impl<F> MeshLoader for F
where
    F: Fn(&Path) -> Result<Geometry>,
{
    fn load(&self, path: &Path) -> Result<Geometry> {
        self(path)
    }
}

/// What a folder import added.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// Mesh files added as parts, including the ones that failed to load.
    pub parts: usize,
    /// Sub-directories added as groups.
    pub groups: usize,
    /// Files the loader rejected. Their parts have no actor.
    pub failed: Vec<PathBuf>,
}

fn is_stl(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("stl" | "STL")
    )
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Builds the part for one mesh file. A load failure yields a part without an actor.
fn load_part(path: &Path, loader: &dyn MeshLoader) -> (ModelPart, bool) {
    let name = file_label(path);
    match loader.load(path) {
        Ok(geometry) => {
            let actor = Actor::new(name.clone(), geometry);
            (ModelPart::with_actor(name, actor), true)
        }
        Err(err) => {
            warn!("failed to load {}: {err:#}", path.display());
            (ModelPart::group(name), false)
        }
    }
}

/// Recursively imports `dir` under `parent`.
///
/// Mesh files (`*.stl`, `*.STL`) of a directory come first, sorted by name,
/// then one group per sub-directory. Imported parts start hidden.
pub fn import_folder(
    tree: &mut PartTree,
    parent: Option<PartId>,
    dir: &Path,
    loader: &dyn MeshLoader,
) -> Result<ImportSummary> {
    let mut summary = ImportSummary::default();
    import_dir(tree, parent, dir, loader, &mut summary)?;
    debug!(
        "imported {} part(s) in {} group(s) from {}",
        summary.parts,
        summary.groups,
        dir.display()
    );
    Ok(summary)
}

fn import_dir(
    tree: &mut PartTree,
    parent: Option<PartId>,
    dir: &Path,
    loader: &dyn MeshLoader,
    summary: &mut ImportSummary,
) -> Result<()> {
    let entries = fs::read_dir(dir).with_context(|| format!("reading {}", dir.display()))?;

    let mut files = Vec::new();
    let mut dirs = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("reading {}", dir.display()))?;
        let path = entry.path();
        let kind = entry
            .file_type()
            .with_context(|| format!("inspecting {}", path.display()))?;
        if kind.is_dir() {
            dirs.push(path);
        } else if is_stl(&path) {
            files.push(path);
        }
    }
    files.sort();
    dirs.sort();

    for path in files {
        let (mut part, loaded) = load_part(&path, loader);
        part.set_visible(false);
        tree.add(parent, part)
            .with_context(|| format!("parent of {} no longer exists", path.display()))?;
        summary.parts += 1;
        if !loaded {
            summary.failed.push(path);
        }
    }

    for path in dirs {
        let group = tree
            .add(parent, ModelPart::group(file_label(&path)))
            .with_context(|| format!("parent of {} no longer exists", path.display()))?;
        summary.groups += 1;
        import_dir(tree, Some(group), &path, loader, summary)?;
    }

    Ok(())
}

/// Adds one mesh file as a visible root part.
///
/// Returns the part and whether the loader produced geometry for it.
pub fn add_file(tree: &mut PartTree, path: &Path, loader: &dyn MeshLoader) -> (PartId, bool) {
    let (part, loaded) = load_part(path, loader);
    (tree.add_root(part), loaded)
}
