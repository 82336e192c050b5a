//! Property tests for tree construction

use conntree_model::{ConnectionInfo, ConnectionTree, ConstantId, RootNodeInfo};
use proptest::prelude::*;

fn build(ops: &[(usize, bool)]) -> ConnectionTree {
    let mut tree = ConnectionTree::new(RootNodeInfo::default());
    let mut parents: Vec<ConstantId> = vec![tree.root_id().clone()];
    for (i, (pick, container)) in ops.iter().enumerate() {
        let parent = parents[pick % parents.len()].clone();
        if *container {
            let id = tree.add_container(&parent, format!("group-{i}")).unwrap();
            parents.push(id);
        } else {
            tree.add_connection(&parent, format!("host-{i}"), ConnectionInfo::default())
                .unwrap();
        }
    }
    tree
}

proptest! {
    #[test]
    fn prop_built_trees_are_valid(
        ops in proptest::collection::vec((0..64usize, any::<bool>()), 0..60)
    ) {
        let tree = build(&ops);
        prop_assert!(tree.validate().is_ok());
        prop_assert_eq!(tree.len(), ops.len() + 1);
    }

    #[test]
    fn prop_root_reaches_every_node_once(
        ops in proptest::collection::vec((0..64usize, any::<bool>()), 0..60)
    ) {
        let tree = build(&ops);
        let mut reached = tree.descendants(tree.root_id());
        prop_assert_eq!(reached.len(), tree.len() - 1);
        reached.sort();
        reached.dedup();
        prop_assert_eq!(reached.len(), tree.len() - 1);
    }

    #[test]
    fn prop_only_containers_hold_children(
        ops in proptest::collection::vec((0..64usize, any::<bool>()), 0..60)
    ) {
        let tree = build(&ops);
        for node in tree.iter() {
            if !node.children().is_empty() {
                prop_assert!(node.can_have_children());
            }
        }
    }
}
