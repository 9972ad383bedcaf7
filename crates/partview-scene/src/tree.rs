use partview_vr::{Actor, ActorId, Rgb};

/// Handle to a part in a [`PartTree`].
///
/// Ids from before a [`PartTree::clear`] never resolve afterwards.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct PartId {
    epoch: u32,
    index: u32,
}

/// One row of the part hierarchy: a loaded mesh or a group.
#[derive(Debug)]
pub struct ModelPart {
    name: String,
    colour: [u8; 3],
    visible: bool,
    actor: Option<Actor>,
    parent: Option<PartId>,
    children: Vec<PartId>,
}

impl ModelPart {
    /// A part without geometry (folder, or a file the loader rejected).
    pub fn group(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            colour: [255, 255, 255],
            visible: true,
            actor: None,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn with_actor(name: impl Into<String>, actor: Actor) -> Self {
        let mut part = Self::group(name);
        part.actor = Some(actor);
        part.sync_actor();
        part
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn colour(&self) -> [u8; 3] {
        self.colour
    }

    #[inline]
    pub fn visible(&self) -> bool {
        self.visible
    }

    #[inline]
    pub fn actor(&self) -> Option<&Actor> {
        self.actor.as_ref()
    }

    #[inline]
    pub fn parent(&self) -> Option<PartId> {
        self.parent
    }

    #[inline]
    pub fn children(&self) -> &[PartId] {
        &self.children
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
        if let Some(actor) = self.actor.as_mut() {
            actor.set_name(self.name.clone());
        }
    }

    /// Sets the colour and recolors the part's actor.
    pub fn set_colour(&mut self, r: u8, g: u8, b: u8) {
        self.colour = [r, g, b];
        if let Some(actor) = self.actor.as_mut() {
            actor.set_color(Rgb::from_u8(r, g, b));
        }
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
        if let Some(actor) = self.actor.as_mut() {
            actor.set_visible(visible);
        }
    }

    fn sync_actor(&mut self) {
        let [r, g, b] = self.colour;
        let visible = self.visible;
        if let Some(actor) = self.actor.as_mut() {
            actor.set_color(Rgb::from_u8(r, g, b));
            actor.set_visible(visible);
        }
    }
}

/// Authoritative part hierarchy, owned by the UI thread.
#[derive(Debug, Default)]
pub struct PartTree {
    parts: Vec<ModelPart>,
    roots: Vec<PartId>,
    epoch: u32,
}

impl PartTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn roots(&self) -> &[PartId] {
        &self.roots
    }

    fn slot(&self, id: PartId) -> Option<usize> {
        (id.epoch == self.epoch && (id.index as usize) < self.parts.len())
            .then_some(id.index as usize)
    }

    pub fn get(&self, id: PartId) -> Option<&ModelPart> {
        self.slot(id).map(|i| &self.parts[i])
    }

    pub fn get_mut(&mut self, id: PartId) -> Option<&mut ModelPart> {
        self.slot(id).map(|i| &mut self.parts[i])
    }

    /// Appends `part` under `parent`, or at the root when `parent` is `None`.
    ///
    /// Returns `None` if `parent` does not resolve.
    pub fn add(&mut self, parent: Option<PartId>, part: ModelPart) -> Option<PartId> {
        match parent {
            Some(p) => {
                let slot = self.slot(p)?;
                Some(self.push(Some((p, slot)), part))
            }
            None => Some(self.push(None, part)),
        }
    }

    pub fn add_root(&mut self, part: ModelPart) -> PartId {
        self.push(None, part)
    }

    fn push(&mut self, parent: Option<(PartId, usize)>, mut part: ModelPart) -> PartId {
        let id = PartId {
            epoch: self.epoch,
            index: self.parts.len() as u32,
        };
        part.parent = parent.map(|(p, _)| p);
        part.children.clear();
        self.parts.push(part);

        match parent {
            Some((_, slot)) => self.parts[slot].children.push(id),
            None => self.roots.push(id),
        }
        id
    }

    /// Removes every part. Outstanding ids stop resolving.
    pub fn clear(&mut self) {
        self.parts.clear();
        self.roots.clear();
        self.epoch = self.epoch.wrapping_add(1);
    }

    /// Every part in depth-first, child-order sequence.
    pub fn walk(&self) -> Vec<PartId> {
        let mut out = Vec::with_capacity(self.parts.len());
        let mut stack: Vec<PartId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            if let Some(part) = self.get(id) {
                stack.extend(part.children.iter().rev().copied());
            }
        }
        out
    }

    /// Actors of every visible part, in tree order.
    ///
    /// Visibility is per part: a visible part under a hidden group is still
    /// included.
    pub fn visible_actors(&self) -> Vec<&Actor> {
        self.walk()
            .into_iter()
            .filter_map(|id| self.get(id))
            .filter(|part| part.visible)
            .filter_map(ModelPart::actor)
            .collect()
    }

    /// Finds the part that owns the actor `id`.
    pub fn find_actor(&self, id: ActorId) -> Option<PartId> {
        self.walk().into_iter().find(|&p| {
            self.get(p)
                .and_then(ModelPart::actor)
                .is_some_and(|a| a.id() == id)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use partview_vr::Geometry;

    fn mesh(name: &str) -> ModelPart {
        ModelPart::with_actor(name, Actor::new(name, Geometry::cube([0.0; 3], 1.0)))
    }

    #[test]
    fn walk_is_depth_first_in_child_order() {
        let mut tree = PartTree::new();
        let a = tree.add_root(ModelPart::group("a"));
        let a1 = tree.add(Some(a), mesh("a1")).unwrap();
        let a2 = tree.add(Some(a), mesh("a2")).unwrap();
        let b = tree.add_root(mesh("b"));
        let a1x = tree.add(Some(a1), mesh("a1x")).unwrap();

        assert_eq!(tree.walk(), vec![a, a1, a1x, a2, b]);
        assert_eq!(tree.get(a1x).unwrap().parent(), Some(a1));
    }

    #[test]
    fn visible_actors_skip_hidden_parts_and_groups() {
        let mut tree = PartTree::new();
        let group = tree.add_root(ModelPart::group("group"));
        tree.get_mut(group).unwrap().set_visible(false);
        tree.add(Some(group), mesh("shown"));
        let hidden = tree.add(Some(group), mesh("hidden")).unwrap();
        tree.get_mut(hidden).unwrap().set_visible(false);

        let names: Vec<&str> = tree.visible_actors().iter().map(|a| a.name()).collect();
        assert_eq!(names, vec!["shown"]);
    }

    #[test]
    fn part_edits_reach_the_actor() {
        let mut tree = PartTree::new();
        let id = tree.add_root(mesh("bracket"));
        let part = tree.get_mut(id).unwrap();
        part.set_colour(255, 0, 0);
        part.set_visible(false);
        part.rename("left bracket");

        let actor = tree.get(id).unwrap().actor().unwrap();
        assert_eq!(actor.material().color, Rgb::RED);
        assert!(!actor.material().visible);
        assert_eq!(actor.name(), "left bracket");
    }

    #[test]
    fn ids_do_not_survive_clear() {
        let mut tree = PartTree::new();
        let old = tree.add_root(mesh("old"));
        tree.clear();
        let new = tree.add_root(mesh("new"));

        assert!(tree.get(old).is_none());
        assert_eq!(tree.get(new).unwrap().name(), "new");
        assert!(tree.add(Some(old), mesh("orphan")).is_none());
    }

    #[test]
    fn find_actor_by_id() {
        let mut tree = PartTree::new();
        tree.add_root(mesh("a"));
        let b = tree.add_root(mesh("b"));
        let actor_id = tree.get(b).unwrap().actor().unwrap().id();
        assert_eq!(tree.find_actor(actor_id), Some(b));
    }
}
