//! Depth-first descendant computation over an in-memory node snapshot.
//!
//! [`ResourceForest`] indexes a snapshot by parent id once, so a traversal
//! touches every node at most once instead of rescanning the whole snapshot
//! at each level.

use std::collections::{HashMap, HashSet};

use tracing::warn;

use crate::models::resource::ResourceNode;

/// Strict descendants of a node, in depth-first pre-order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Descendants {
    pub nodes: Vec<ResourceNode>,
    /// Ids of nodes that were reached but not followed because they point
    /// back into the already visited chain (self-parented or cyclic).
    pub malformed: Vec<String>,
}

impl Descendants {
    pub fn contains(&self, id: &str) -> bool {
        self.nodes.iter().any(|n| n.id == id)
    }

    pub fn ids(&self) -> HashSet<&str> {
        self.nodes.iter().map(|n| n.id.as_str()).collect()
    }
}

/// A snapshot of nodes with a parent → children index.
pub struct ResourceForest<'a> {
    nodes: &'a [ResourceNode],
    children: HashMap<&'a str, Vec<usize>>,
}

impl<'a> ResourceForest<'a> {
    pub fn new(nodes: &'a [ResourceNode]) -> Self {
        let mut children: HashMap<&'a str, Vec<usize>> = HashMap::new();
        for (idx, node) in nodes.iter().enumerate() {
            children.entry(node.parent_id.as_str()).or_default().push(idx);
        }
        Self { nodes, children }
    }

    pub fn get(&self, id: &str) -> Option<&'a ResourceNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Every node reachable below `root_id`, excluding the root itself.
    pub fn descendants_of(&self, root_id: &str) -> Descendants {
        let mut out = Descendants::default();
        let mut visited: HashSet<&str> = HashSet::from([root_id]);

        // Reversed pushes keep siblings in snapshot order when popped.
        let mut stack: Vec<usize> = Vec::new();
        push_children(&mut stack, self.children.get(root_id));

        while let Some(idx) = stack.pop() {
            let node = &self.nodes[idx];
            // A self-parented node is only reachable from itself, so it
            // always lands here along with longer cycles.
            if !visited.insert(node.id.as_str()) {
                warn!(
                    resource_id = %node.id,
                    parent_id = %node.parent_id,
                    self_parented = node.id == node.parent_id,
                    "Malformed hierarchy, branch not followed"
                );
                out.malformed.push(node.id.clone());
                continue;
            }
            out.nodes.push(node.clone());
            push_children(&mut stack, self.children.get(node.id.as_str()));
        }

        out
    }
}

fn push_children(stack: &mut Vec<usize>, children: Option<&Vec<usize>>) {
    if let Some(children) = children {
        stack.extend(children.iter().rev().copied());
    }
}

/// Convenience wrapper building a [`ResourceForest`] for a single traversal.
pub fn descendants_of(nodes: &[ResourceNode], root_id: &str) -> Descendants {
    ResourceForest::new(nodes).descendants_of(root_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::resource::{NodeAttr, ROOT_PARENT_ID, ResourceType};

    fn node(id: &str, parent_id: &str) -> ResourceNode {
        ResourceNode {
            id: id.into(),
            name: format!("node {id}"),
            attr: NodeAttr::Container,
            parent_id: parent_id.into(),
            resource_type: ResourceType::SubsystemMenu,
            system_owned: false,
            inner_flag: true,
            service_code: None,
        }
    }

    fn ids(d: &Descendants) -> Vec<&str> {
        d.nodes.iter().map(|n| n.id.as_str()).collect()
    }

    #[test]
    fn chain_yields_all_descendants() {
        let nodes = vec![node("A", ROOT_PARENT_ID), node("B", "A"), node("C", "B")];
        let d = descendants_of(&nodes, "A");
        assert_eq!(ids(&d), ["B", "C"]);
        assert!(d.malformed.is_empty());
    }

    #[test]
    fn root_is_excluded() {
        let nodes = vec![node("A", ROOT_PARENT_ID), node("B", "A")];
        let d = descendants_of(&nodes, "A");
        assert!(!d.contains("A"));
    }

    #[test]
    fn order_is_depth_first_in_snapshot_order() {
        let nodes = vec![
            node("R", ROOT_PARENT_ID),
            node("X", "R"),
            node("Y", "R"),
            node("X1", "X"),
            node("Y1", "Y"),
            node("X2", "X"),
        ];
        let d = descendants_of(&nodes, "R");
        assert_eq!(ids(&d), ["X", "X1", "X2", "Y", "Y1"]);
    }

    #[test]
    fn leaf_and_unknown_roots_have_no_descendants() {
        let nodes = vec![node("A", ROOT_PARENT_ID), node("B", "A")];
        assert!(descendants_of(&nodes, "B").nodes.is_empty());
        assert!(descendants_of(&nodes, "missing").nodes.is_empty());
    }

    #[test]
    fn sentinel_root_lists_the_whole_forest() {
        let nodes = vec![
            node("A", ROOT_PARENT_ID),
            node("B", ROOT_PARENT_ID),
            node("A1", "A"),
        ];
        let d = descendants_of(&nodes, ROOT_PARENT_ID);
        assert_eq!(ids(&d), ["A", "A1", "B"]);
    }

    #[test]
    fn self_parented_node_is_flagged_not_followed() {
        let nodes = vec![node("S", "S"), node("T", "S")];
        let d = descendants_of(&nodes, "S");
        assert_eq!(ids(&d), ["T"]);
        assert_eq!(d.malformed, ["S"]);
    }

    #[test]
    fn two_node_cycle_terminates() {
        let nodes = vec![node("A", "B"), node("B", "A"), node("C", "B")];
        let d = descendants_of(&nodes, "A");
        assert_eq!(ids(&d), ["B", "C"]);
        assert_eq!(d.malformed, ["A"]);
    }

    #[test]
    fn repeated_traversal_is_identical() {
        let nodes = vec![node("A", ROOT_PARENT_ID), node("B", "A"), node("C", "B")];
        let forest = ResourceForest::new(&nodes);
        assert_eq!(forest.descendants_of("A"), forest.descendants_of("A"));
    }

    #[test]
    fn forest_looks_up_nodes_by_id() {
        let nodes = vec![node("A", ROOT_PARENT_ID), node("B", "A"), node("C", "B")];
        let forest = ResourceForest::new(&nodes);
        assert_eq!(forest.get("C").map(|n| n.parent_id.as_str()), Some("B"));
        assert!(forest.get("Z").is_none());
    }
}
