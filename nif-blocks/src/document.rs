use glam::Affine3A;
use id_arena::Arena;

use crate::{
    blocks::{AvObject, ControllerId, KeyframeController, KeyframeDataId, ObjectId},
    keys::{Key, KeyframeData},
};

/// An in-memory NIF file: every block the deserializer produced, plus the
/// tree topology between them.
///
/// Scene objects form a forest. The document owns all blocks in typed
/// arenas and maintains the parent back-references: an object has at most
/// one parent, and parent links always point back up the tree.
#[derive(Debug, Default)]
pub struct NifDocument {
    objects: Arena<AvObject>,
    controllers: Arena<KeyframeController>,
    keyframe_data: Arena<KeyframeData>,
    roots: Vec<ObjectId>,
}

impl NifDocument {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an object with no parent. It becomes a root of the forest.
    pub fn add_root(&mut self, object: AvObject) -> ObjectId {
        let id = self.objects.alloc(object);
        self.roots.push(id);
        id
    }

    /// Add an object as the last child of `parent`.
    pub fn add_child(&mut self, parent: ObjectId, object: AvObject) -> ObjectId {
        let id = self.objects.alloc(object);
        self.objects[id].parent = Some(parent);
        self.objects[parent].children.push(id);
        id
    }

    /// Add a keyframe controller block.
    pub fn add_controller(&mut self, controller: KeyframeController) -> ControllerId {
        self.controllers.alloc(controller)
    }

    /// Add a keyframe data block.
    pub fn add_keyframe_data(&mut self, data: KeyframeData) -> KeyframeDataId {
        self.keyframe_data.alloc(data)
    }

    /// The roots of the scene forest, in insertion order.
    pub fn roots(&self) -> &[ObjectId] {
        &self.roots
    }

    /// Look up a scene object.
    pub fn object(&self, id: ObjectId) -> &AvObject {
        &self.objects[id]
    }

    /// Look up a scene object for mutation.
    pub fn object_mut(&mut self, id: ObjectId) -> &mut AvObject {
        &mut self.objects[id]
    }

    /// Look up a controller. `None` signals a dangling reference.
    pub fn controller(&self, id: ControllerId) -> Option<&KeyframeController> {
        self.controllers.get(id)
    }

    /// Look up a controller for mutation.
    pub fn controller_mut(&mut self, id: ControllerId) -> Option<&mut KeyframeController> {
        self.controllers.get_mut(id)
    }

    /// Look up a keyframe data block. `None` signals a dangling reference.
    pub fn keyframe_data(&self, id: KeyframeDataId) -> Option<&KeyframeData> {
        self.keyframe_data.get(id)
    }

    /// Iterate over every scene object in insertion order.
    pub fn objects(&self) -> impl Iterator<Item = (ObjectId, &AvObject)> {
        self.objects.iter()
    }

    /// Pre-order traversal of the subtree under `root`, `root` included.
    pub fn descendants(&self, root: ObjectId) -> Descendants<'_> {
        Descendants {
            document: self,
            stack: vec![root],
        }
    }

    /// The first object named `name` in pre-order from `root`, `root`
    /// itself included.
    pub fn find_by_name(&self, root: ObjectId, name: &str) -> Option<ObjectId> {
        self.descendants(root).find(|&id| self.objects[id].name == name)
    }

    /// The transform of `object` relative to `ancestor`, accumulated up the
    /// parent chain. `None` when `ancestor` is not actually an ancestor.
    pub fn relative_transform(&self, object: ObjectId, ancestor: ObjectId) -> Option<Affine3A> {
        let mut accumulated = Affine3A::IDENTITY;
        let mut current = object;
        loop {
            if current == ancestor {
                return Some(accumulated);
            }
            accumulated = self.objects[current].transform.to_affine() * accumulated;
            current = self.objects[current].parent?;
        }
    }

    /// The first non-empty text key list in the subtree under `root`.
    pub fn find_text_keys(&self, root: ObjectId) -> Option<&[Key<String>]> {
        self.descendants(root)
            .map(|id| self.objects[id].text_keys.as_slice())
            .find(|keys| !keys.is_empty())
    }
}

/// Iterator over a subtree, pre-order, driven by an explicit stack.
pub struct Descendants<'a> {
    document: &'a NifDocument,
    stack: Vec<ObjectId>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = ObjectId;

    fn next(&mut self) -> Option<ObjectId> {
        let next = self.stack.pop()?;
        // Reversed so the leftmost child comes out first.
        for &child in self.document.objects[next].children.iter().rev() {
            self.stack.push(child);
        }
        Some(next)
    }
}
