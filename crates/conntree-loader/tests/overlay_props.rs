//! Property tests for the local properties merge

use conntree_loader::apply_local_connection_properties;
use conntree_model::ConstantId;
use conntree_persist::LocalConnectionProperties;
use conntree_test_utils::{sample_tree, SampleIds};
use proptest::prelude::*;

// (target slot, connected, favorite, expanded); slot 5 is an unknown id
type Flags = (usize, bool, bool, bool);

fn target(ids: &SampleIds, slot: usize) -> ConstantId {
    match slot {
        0 => ids.root.clone(),
        1 => ids.servers.clone(),
        2 => ids.web.clone(),
        3 => ids.db.clone(),
        4 => ids.jump.clone(),
        _ => ConstantId::new("unknown"),
    }
}

fn to_records(ids: &SampleIds, flags: &[Flags]) -> Vec<LocalConnectionProperties> {
    flags
        .iter()
        .map(|&(slot, connected, favorite, expanded)| LocalConnectionProperties {
            connection_id: target(ids, slot),
            connected,
            favorite,
            expanded,
        })
        .collect()
}

fn flags() -> impl Strategy<Value = Vec<Flags>> {
    prop::collection::vec((0usize..6, any::<bool>(), any::<bool>(), any::<bool>()), 0..8)
}

proptest! {
    #[test]
    fn merge_is_idempotent(flags in flags()) {
        let (mut tree, ids) = sample_tree();
        let records = to_records(&ids, &flags);

        apply_local_connection_properties(&mut tree, &records);
        let once = tree.clone();
        apply_local_connection_properties(&mut tree, &records);

        prop_assert_eq!(tree, once);
    }

    #[test]
    fn root_is_never_touched(flags in flags()) {
        let (mut tree, ids) = sample_tree();
        let before = tree.root().clone();

        apply_local_connection_properties(&mut tree, &to_records(&ids, &flags));

        prop_assert_eq!(tree.root(), &before);
    }

    #[test]
    fn connections_never_gain_expanded_state(flags in flags()) {
        let (mut tree, ids) = sample_tree();

        apply_local_connection_properties(&mut tree, &to_records(&ids, &flags));

        for id in [&ids.web, &ids.db, &ids.jump] {
            prop_assert_eq!(tree.get(id).unwrap().is_expanded(), None);
        }
    }
}
