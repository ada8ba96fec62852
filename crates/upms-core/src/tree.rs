//! In-memory resource hierarchy.
//!
//! Resources are stored flat with a `parent_id` link. These helpers
//! arrange a loaded set into nodes whose `children` are always
//! initialised; a leaf carries an empty `Vec`.

use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use crate::error::{UpmsError, UpmsResult};
use crate::models::resource::Resource;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceNode {
    pub resource: Resource,
    /// Ordered by `sort_order`, then name.
    pub children: Vec<ResourceNode>,
}

impl ResourceNode {
    pub fn leaf(resource: Resource) -> Self {
        Self {
            resource,
            children: Vec::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.resource.id
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn len(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(&node.children);
        }
        count
    }

    /// Depth-first search for a node in this subtree.
    pub fn find(&self, id: Uuid) -> Option<&ResourceNode> {
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            if node.id() == id {
                return Some(node);
            }
            stack.extend(node.children.iter().rev());
        }
        None
    }

    /// Pre-order walk over the resources of this subtree.
    pub fn walk(&self) -> Vec<&Resource> {
        let mut out = Vec::with_capacity(self.len());
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            out.push(&node.resource);
            stack.extend(node.children.iter().rev());
        }
        out
    }
}

/// Arrange `resources` into root nodes.
///
/// A resource is a root when it has no parent or its parent is not in
/// the set (for instance a disabled parent filtered out by the
/// caller). Resources that cannot be reached from any root sit on a
/// parent cycle and are reported as [`UpmsError::CycleDetected`].
pub fn build_forest(resources: Vec<Resource>) -> UpmsResult<Vec<ResourceNode>> {
    let total = resources.len();
    let present: HashSet<Uuid> = resources.iter().map(|r| r.id).collect();

    let mut roots = Vec::new();
    let mut by_parent: HashMap<Uuid, Vec<Resource>> = HashMap::new();
    for resource in resources {
        match resource.parent_id {
            Some(pid) if present.contains(&pid) => {
                by_parent.entry(pid).or_default().push(resource);
            }
            _ => roots.push(resource),
        }
    }

    sort_siblings(&mut roots);
    let forest: Vec<ResourceNode> = roots
        .into_iter()
        .map(|root| grow(root, &mut by_parent))
        .collect();

    let placed: usize = forest.iter().map(ResourceNode::len).sum();
    if placed != total {
        let stranded = by_parent
            .values()
            .flatten()
            .map(|r| r.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        return Err(UpmsError::CycleDetected(format!(
            "resources not reachable from any root: {stranded}"
        )));
    }

    Ok(forest)
}

/// Arrange `descendants` under `root`. Entries not connected to `root`
/// through their parent links are ignored.
pub fn build_subtree(root: Resource, descendants: Vec<Resource>) -> ResourceNode {
    let mut by_parent: HashMap<Uuid, Vec<Resource>> = HashMap::new();
    for resource in descendants {
        if resource.id == root.id {
            continue;
        }
        if let Some(pid) = resource.parent_id {
            by_parent.entry(pid).or_default().push(resource);
        }
    }
    grow(root, &mut by_parent)
}

/// Attach everything reachable from `root` in `by_parent` beneath it.
///
/// Nodes are first laid out breadth-first, so a child's slot always
/// comes after its parent's, then assembled from the last slot back.
/// Neither pass recurses, whatever the depth.
fn grow(root: Resource, by_parent: &mut HashMap<Uuid, Vec<Resource>>) -> ResourceNode {
    let mut slots: Vec<(Resource, Vec<usize>)> = Vec::new();
    let root_children = take_children(root.id, by_parent, &mut slots);

    let mut next = 0;
    while next < slots.len() {
        let parent_id = slots[next].0.id;
        slots[next].1 = take_children(parent_id, by_parent, &mut slots);
        next += 1;
    }

    let mut built: Vec<Option<ResourceNode>> = Vec::with_capacity(slots.len());
    built.resize_with(slots.len(), || None);
    for (slot, (resource, children)) in slots.into_iter().enumerate().rev() {
        let children = assemble(children, &mut built);
        built[slot] = Some(ResourceNode { resource, children });
    }

    ResourceNode {
        children: assemble(root_children, &mut built),
        resource: root,
    }
}

/// Move `parent_id`'s children into `slots` in sibling order and
/// return their slot indexes.
fn take_children(
    parent_id: Uuid,
    by_parent: &mut HashMap<Uuid, Vec<Resource>>,
    slots: &mut Vec<(Resource, Vec<usize>)>,
) -> Vec<usize> {
    let mut children = by_parent.remove(&parent_id).unwrap_or_default();
    sort_siblings(&mut children);
    children
        .into_iter()
        .map(|child| {
            slots.push((child, Vec::new()));
            slots.len() - 1
        })
        .collect()
}

fn assemble(slots: Vec<usize>, built: &mut [Option<ResourceNode>]) -> Vec<ResourceNode> {
    slots.into_iter().filter_map(|slot| built[slot].take()).collect()
}

fn sort_siblings(siblings: &mut [Resource]) {
    siblings.sort_by(|a, b| {
        a.sort_order
            .cmp(&b.sort_order)
            .then_with(|| a.name.cmp(&b.name))
    });
}
