//! End-to-end model building tests
//!
//! Drives the builder over the chain corpus and over a few hand-built
//! chains that exercise ordering rules.

mod fixtures;

use fixtures::{assert_subset, init_tracing, ChainCase, ChainCorpus};
use pom_builder::{
    Activation, BuildRequest, BuildStage, Dependency, IdValidation, InMemoryModelSource,
    ModelBuilder, ModelBuildingResult, ModelTree, ParentRef, Profile, RawModel, StaticEnvironment,
};
use std::sync::Arc;

fn run_case(case: &ChainCase) {
    let start = case
        .start_model()
        .unwrap_or_else(|| panic!("{}: no model with id {}", case.id, case.start));
    let settings = case
        .settings()
        .unwrap_or_else(|e| panic!("{}: bad settings: {}", case.id, e));

    let builder = ModelBuilder::with_settings(settings, Arc::new(case.source()))
        .with_environment(Arc::new(case.environment()));

    let mut request = BuildRequest::new(start);
    for profile in &case.external_profiles {
        request = request.with_external_profile(profile.clone());
    }

    let result = builder.build(request);
    let expected = &case.expected;

    if let Some(code) = &expected.error {
        let failure = match result {
            Ok(outcome) => panic!(
                "{}: expected {} but built {}",
                case.id, code, outcome.effective_model.id
            ),
            Err(failure) => failure,
        };
        assert_eq!(failure.code(), code.as_str(), "{}: {}", case.id, failure);
        if let Some(stage) = &expected.stage {
            assert_eq!(failure.stage.as_str(), stage.as_str(), "{}", case.id);
        }
        return;
    }

    let outcome = result.unwrap_or_else(|f| panic!("{}: {}", case.id, f));
    let tree = serde_json::to_value(&outcome.effective_model.tree).unwrap();

    if let Some(subset) = &expected.tree {
        assert_subset(subset, &tree, "");
    }
    for key in &expected.absent {
        assert!(tree.get(key).is_none(), "{}: '{}' should be absent", case.id, key);
    }
    if let Some(ids) = &expected.model_ids {
        let actual: Vec<&str> = outcome.model_ids().into_iter().map(|id| id.as_str()).collect();
        assert_eq!(&actual, ids, "{}", case.id);
    }
    if let Some(profiles) = &expected.active_profiles {
        assert_eq!(&outcome.summary().active_profiles, profiles, "{}", case.id);
    }
    if let Some(count) = expected.warnings {
        assert_eq!(outcome.warnings.len(), count, "{}: {:?}", case.id, outcome.warnings);
    }
}

// ===== Category 1: Corpus =====

#[test]
fn test_chain_corpus() {
    init_tracing();
    let corpus = ChainCorpus::load().expect("Failed to load chain corpus");
    assert_eq!(corpus.schema_version, 1);
    assert!(!corpus.cases.is_empty());

    for case in &corpus.cases {
        run_case(case);
    }
}

#[test]
fn test_corpus_ids_unique() {
    let corpus = ChainCorpus::load().unwrap();
    let mut ids: Vec<&str> = corpus.cases.iter().map(|c| c.id.as_str()).collect();
    ids.sort_unstable();
    let before = ids.len();
    ids.dedup();
    assert_eq!(before, ids.len(), "duplicate case ids in corpus");
}

// ===== Category 2: Ordering =====

fn root_with_profiles() -> RawModel {
    RawModel::new(ModelTree::with_coordinates("g", "root", "1"))
        .with_profile(
            Profile::new("root-a")
                .with_activation(Activation::property_present("ci"))
                .with_tree(ModelTree::default().with_property("order", "root-a")),
        )
        .with_profile(
            Profile::new("root-b")
                .with_activation(Activation::property_present("ci"))
                .with_tree(ModelTree::default().with_property("order", "root-b")),
        )
}

fn leaf_with_profile() -> RawModel {
    RawModel::new(ModelTree {
        artifact_id: Some("leaf".to_string()),
        ..ModelTree::default()
    })
    .with_parent(ParentRef::new("g", "root", "1"))
    .with_profile(
        Profile::new("leaf-a")
            .with_activation(Activation::property_present("ci"))
            .with_tree(ModelTree::default().with_property("order", "leaf-a")),
    )
}

#[test]
fn test_profiles_applied_root_first_then_external() {
    let source = InMemoryModelSource::new().with_model(root_with_profiles());
    let builder = ModelBuilder::new(Arc::new(source))
        .with_environment(Arc::new(StaticEnvironment::new().with_property("ci", "true")));

    let outcome = builder
        .build(BuildRequest::new(leaf_with_profile()))
        .unwrap();
    assert_eq!(
        outcome.summary().active_profiles,
        vec!["root-a", "root-b", "leaf-a"]
    );
    assert_eq!(outcome.effective_model.tree.properties["order"], "leaf-a");

    let external = Profile::new("ext").with_tree(ModelTree::default().with_property("order", "ext"));
    let outcome = builder
        .build(BuildRequest::new(leaf_with_profile()).with_external_profile(external))
        .unwrap();
    assert_eq!(outcome.effective_model.tree.properties["order"], "ext");
    assert_eq!(outcome.active_external_profiles.len(), 1);
}

#[test]
fn test_active_by_default_yields_to_other_profiles() {
    let model = RawModel::new(ModelTree::with_coordinates("g", "app", "1"))
        .with_profile(Profile::new("default").with_activation(Activation::by_default()))
        .with_profile(Profile::new("ci").with_activation(Activation::property_present("ci")));

    let source = Arc::new(InMemoryModelSource::new());
    let quiet = ModelBuilder::new(source.clone()).with_environment(Arc::new(StaticEnvironment::new()));
    let outcome = quiet.build(BuildRequest::new(model.clone())).unwrap();
    assert_eq!(outcome.summary().active_profiles, vec!["default"]);

    let ci = ModelBuilder::new(source)
        .with_environment(Arc::new(StaticEnvironment::new().with_property("ci", "1")));
    let outcome = ci.build(BuildRequest::new(model)).unwrap();
    assert_eq!(outcome.summary().active_profiles, vec!["ci"]);
}

#[test]
fn test_keyed_lists_keep_parent_order() {
    let root = RawModel::new(
        ModelTree::with_coordinates("g", "root", "1")
            .with_dependency(Dependency::new("org.a", "a", Some("1")))
            .with_dependency(Dependency::new("org.b", "b", Some("1"))),
    );
    let leaf = RawModel::new(
        ModelTree {
            artifact_id: Some("leaf".to_string()),
            ..ModelTree::default()
        }
        .with_dependency(Dependency::new("org.c", "c", Some("1")))
        .with_dependency(Dependency::new("org.a", "a", Some("2"))),
    )
    .with_parent(ParentRef::new("g", "root", "1"));

    let outcome = ModelBuilder::new(Arc::new(InMemoryModelSource::new().with_model(root)))
        .with_environment(Arc::new(StaticEnvironment::new()))
        .build(BuildRequest::new(leaf))
        .unwrap();

    let deps: Vec<(&str, &str)> = outcome
        .effective_model
        .tree
        .dependencies
        .iter()
        .map(|d| {
            (
                d.artifact_id.as_deref().unwrap_or_default(),
                d.version.as_deref().unwrap_or_default(),
            )
        })
        .collect();
    assert_eq!(deps, vec![("a", "2"), ("b", "1"), ("c", "1")]);
}

// ===== Category 3: Determinism =====

#[test]
fn test_repeated_builds_produce_same_digest() {
    let source = Arc::new(InMemoryModelSource::new().with_model(root_with_profiles()));
    let builder = ModelBuilder::new(source)
        .with_environment(Arc::new(StaticEnvironment::new().with_property("ci", "yes")));

    let first = builder.build(BuildRequest::new(leaf_with_profile())).unwrap();
    let second = builder.build(BuildRequest::new(leaf_with_profile())).unwrap();

    assert_eq!(first.effective_model.digest, second.effective_model.digest);
    assert_eq!(first.effective_model.tree, second.effective_model.tree);
    assert_ne!(first.build_id, second.build_id);
}

#[test]
fn test_interpolated_tree_is_stable() {
    let model = RawModel::new(
        ModelTree::with_coordinates("g", "app", "1")
            .with_property("a", "${b}-x")
            .with_property("b", "${project.artifactId}"),
    );
    let builder = ModelBuilder::new(Arc::new(InMemoryModelSource::new()))
        .with_environment(Arc::new(StaticEnvironment::new()));

    let once = builder.build(BuildRequest::new(model)).unwrap();
    assert_eq!(once.effective_model.tree.properties["a"], "app-x");

    // Building from the effective tree again must not change it
    let again = builder
        .build(BuildRequest::new(RawModel::new(once.effective_model.tree.clone())))
        .unwrap();
    assert_eq!(again.effective_model.tree, once.effective_model.tree);
    assert_eq!(again.effective_model.digest, once.effective_model.digest);
}

// ===== Category 4: Result container =====

#[test]
fn test_publish_into_result_container() {
    let source = InMemoryModelSource::new().with_model(root_with_profiles());
    let outcome = ModelBuilder::new(Arc::new(source))
        .with_environment(Arc::new(StaticEnvironment::new().with_property("ci", "on")))
        .build(BuildRequest::new(leaf_with_profile()).with_external_profile(Profile::new("ext")))
        .unwrap();

    let mut result = ModelBuildingResult::with_id_validation(IdValidation::Enforce);
    outcome.publish(&mut result).unwrap();

    let ids: Vec<&str> = result.model_ids().iter().map(|id| id.as_str()).collect();
    assert_eq!(ids, vec!["g:leaf:1", "g:root:1"]);
    assert_eq!(
        result.raw_model().and_then(|m| m.tree.artifact_id.as_deref()),
        Some("leaf")
    );
    assert_eq!(result.active_pom_profiles("g:root:1").map(<[Profile]>::len), Some(2));
    assert_eq!(result.active_pom_profiles("g:leaf:1").map(<[Profile]>::len), Some(1));
    assert_eq!(result.active_external_profiles()[0].id, "ext");
    assert_eq!(
        result.effective_model().map(|m| m.digest.as_str()),
        Some(outcome.effective_model.digest.as_str())
    );
}

// ===== Category 5: Failures =====

#[test]
fn test_chain_too_long() {
    let mut source = InMemoryModelSource::new();
    for level in 0..5 {
        let mut model = RawModel::new(ModelTree::with_coordinates("g", &format!("m{}", level), "1"));
        if level > 0 {
            model = model.with_parent(ParentRef::new("g", format!("m{}", level - 1), "1"));
        }
        source.insert(model);
    }
    let leaf = RawModel::new(ModelTree::with_coordinates("g", "m5", "1"))
        .with_parent(ParentRef::new("g", "m4", "1"));

    let mut settings = pom_builder::BuilderSettings::default();
    settings.chain.max_depth = 3;
    let failure = ModelBuilder::with_settings(settings, Arc::new(source))
        .with_environment(Arc::new(StaticEnvironment::new()))
        .build(BuildRequest::new(leaf))
        .unwrap_err();

    assert_eq!(failure.stage, BuildStage::ChainResolution);
    assert_eq!(failure.code(), "CHAIN_TOO_LONG");
}
