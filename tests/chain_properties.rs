//! Property tests for chain resolution and merging

use indexmap::IndexMap;
use pom_builder::{
    BuildRequest, ChainError, ChainResolver, InMemoryModelSource, ModelBuilder, ModelTree,
    ParentRef, RawModel, StaticEnvironment,
};
use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;

/// Models m0..m{n-1}; model i points at `parents[i]` when set
fn chain_models(parents: &[Option<usize>]) -> Vec<RawModel> {
    parents
        .iter()
        .enumerate()
        .map(|(i, parent)| {
            let model = RawModel::new(ModelTree::with_coordinates("g", &format!("m{}", i), "1"));
            match parent {
                Some(p) => model.with_parent(ParentRef::new("g", format!("m{}", p), "1")),
                None => model,
            }
        })
        .collect()
}

fn arb_parents() -> impl Strategy<Value = Vec<Option<usize>>> {
    (1usize..12).prop_flat_map(|n| prop::collection::vec(prop::option::of(0..n), n))
}

fn arb_props() -> impl Strategy<Value = IndexMap<String, String>> {
    prop::collection::vec(("[a-e]", "[a-z0-9]{0,6}"), 0..6)
        .prop_map(|pairs| pairs.into_iter().collect())
}

proptest! {
    #[test]
    fn prop_resolution_terminates(parents in arb_parents(), start in 0usize..12) {
        let models = chain_models(&parents);
        let start = start % models.len();

        let mut source = InMemoryModelSource::new();
        for model in &models {
            source.insert(model.clone());
        }
        let resolver = ChainResolver::new(&source).with_max_depth(64);

        match resolver.resolve(Arc::new(models[start].clone())) {
            Ok(chain) => {
                // Distinct ids, leaf first, root has no parent
                let mut ids: Vec<String> = chain.ids().iter().map(|id| id.as_str().to_string()).collect();
                let leaf_id = chain.leaf().id();
                prop_assert_eq!(leaf_id.as_str(), format!("g:m{}:1", start));
                prop_assert!(chain.root().parent.is_none());
                let len = ids.len();
                ids.sort();
                ids.dedup();
                prop_assert_eq!(ids.len(), len);
            }
            Err(ChainError::CycleDetected { path }) => {
                prop_assert!(path.len() >= 2);
                prop_assert_eq!(path.first(), path.last());
            }
            Err(other) => prop_assert!(false, "unexpected error: {}", other),
        }
    }

    #[test]
    fn prop_merge_child_properties_win(parent_props in arb_props(), child_props in arb_props()) {
        let mut root_tree = ModelTree::with_coordinates("g", "root", "1");
        root_tree.properties = parent_props.clone();
        let root = RawModel::new(root_tree);

        let leaf = RawModel::new(ModelTree {
            artifact_id: Some("leaf".to_string()),
            properties: child_props.clone(),
            ..ModelTree::default()
        })
        .with_parent(ParentRef::new("g", "root", "1"));

        let builder = ModelBuilder::new(Arc::new(InMemoryModelSource::new().with_model(root)))
            .with_environment(Arc::new(StaticEnvironment::new()));
        let first = builder.build(BuildRequest::new(leaf.clone())).unwrap();
        let second = builder.build(BuildRequest::new(leaf)).unwrap();

        prop_assert_eq!(&first.effective_model.digest, &second.effective_model.digest);

        let props = &first.effective_model.tree.properties;
        for (key, value) in &child_props {
            prop_assert_eq!(props.get(key), Some(value));
        }
        for (key, value) in &parent_props {
            if !child_props.contains_key(key) {
                prop_assert_eq!(props.get(key), Some(value));
            }
        }
        let distinct: HashSet<&String> = parent_props.keys().chain(child_props.keys()).collect();
        prop_assert_eq!(props.len(), distinct.len());
    }
}
