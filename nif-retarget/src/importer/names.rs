use std::collections::{HashMap, HashSet};

use log::debug;
use nif_blocks::{NifDocument, NodeKind, ObjectId};

/// Longest name a host will accept, in bytes.
const MAX_NAME_LEN: usize = 63;

/// Hands out unique, host-safe names for blocks, one per block id.
///
/// Blocks in a NIF file may share names or have none at all, while hosts
/// want short unique identifiers. The registry memoizes its answers so the
/// same block always maps to the same name, wherever it is asked for.
#[derive(Default)]
pub(crate) struct NameRegistry {
    names: HashMap<ObjectId, String>,
    taken: HashSet<String>,
}

impl NameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the unique import name for a block, allocating one on first
    /// use.
    pub fn name_for(&mut self, document: &NifDocument, id: ObjectId) -> String {
        if let Some(name) = self.names.get(&id) {
            return name.clone();
        }

        let object = document.object(id);
        let source = if object.name.is_empty() {
            match object.kind {
                NodeKind::CollisionRoot => "RootCollisionNode",
                _ => "noname",
            }
        } else {
            object.name.as_str()
        };

        let mut candidate = truncated(source, MAX_NAME_LEN - 1).to_string();
        if self.taken.contains(&candidate) {
            // suffix over a shortened stem; the last candidate wins if all
            // thousand are taken
            let stem = truncated(source, MAX_NAME_LEN - 4);
            for n in 0..1000 {
                candidate = format!("{stem}.{n:02}");
                if !self.taken.contains(&candidate) {
                    break;
                }
            }
        }

        debug!("'{}' named '{}'", object.name, candidate);
        self.names.insert(id, candidate.clone());
        self.taken.insert(candidate.clone());
        candidate
    }

    /// Records an externally supplied name for a block. Used when matching
    /// against an existing armature, whose bone names take precedence over
    /// generated ones.
    pub fn assign(&mut self, id: ObjectId, name: &str) {
        self.names.insert(id, name.to_string());
        self.taken.insert(name.to_string());
    }
}

/// Truncates to at most `max_bytes`, backing up to a character boundary.
fn truncated(name: &str, max_bytes: usize) -> &str {
    if name.len() <= max_bytes {
        return name;
    }
    let mut end = max_bytes;
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    &name[..end]
}
