//! Importance scorer tests: fan-in/out, entry-point detection, bounded
//! depth on cyclic graphs, and annotation density.

use jrm_core::config::ScorerConfig;
use jrm_core::model::{BuildTool, TypeKind};
use jrm_facts::build_meta::BuildFacts;
use jrm_facts::collect::{ModuleFacts, RepoFacts};
use jrm_facts::java::{SourceFileFacts, TypeFacts};
use jrm_map::{builder, score};
use std::path::PathBuf;

fn type_facts(name: &str, annotations: &[&str], members: &[&str]) -> TypeFacts {
    TypeFacts {
        name: name.to_string(),
        kind: TypeKind::Class,
        annotations: annotations.iter().map(ToString::to_string).collect(),
        public_members: members.iter().map(ToString::to_string).collect(),
    }
}

fn source_file(
    path: &str,
    package: &str,
    imports: &[&str],
    types: Vec<TypeFacts>,
) -> SourceFileFacts {
    SourceFileFacts {
        path: PathBuf::from(path),
        package: Some(package.to_string()),
        imports: imports.iter().map(ToString::to_string).collect(),
        types,
    }
}

fn repo(files: Vec<SourceFileFacts>) -> RepoFacts {
    RepoFacts {
        name: "demo".to_string(),
        build_tool: BuildTool::Maven,
        coordinates: None,
        modules: vec![ModuleFacts {
            id: "demo".to_string(),
            root: PathBuf::from("."),
            build: BuildFacts::default(),
            files,
            raw_edges: None,
        }],
        degradations: Vec::new(),
    }
}

/// Two packages: `a` imports nothing, `b` imports `a` and exposes a route.
fn scenario() -> RepoFacts {
    repo(vec![
        source_file(
            "src/main/java/com/demo/a/A.java",
            "com.demo.a",
            &[],
            vec![type_facts("A", &[], &["value"])],
        ),
        source_file(
            "src/main/java/com/demo/b/B.java",
            "com.demo.b",
            &["com.demo.a.A"],
            vec![type_facts("B", &["Path"], &["hello"])],
        ),
    ])
}

#[test]
fn test_scenario_entry_point_and_depth() {
    let mut graph = builder::build(&scenario()).unwrap();
    score::score(&mut graph, &ScorerConfig::default());

    let b_type = graph.types["demo:com.demo.b.B"].score.unwrap();
    assert!(b_type.entry_point, "route annotation marks the entry point");

    let b_pkg = graph.packages["demo:com.demo.b"].score.unwrap();
    assert!(b_pkg.entry_point);
    assert_eq!(b_pkg.depth, 0, "entry-point packages seed the depth at 0");

    let a_pkg = graph.packages["demo:com.demo.a"].score.unwrap();
    assert_eq!(a_pkg.depth, 1, "one hop from the nearest entry point");
    assert!(!a_pkg.entry_point);
}

#[test]
fn test_scenario_fan_counts() {
    let mut graph = builder::build(&scenario()).unwrap();
    score::score(&mut graph, &ScorerConfig::default());

    let a_pkg = graph.packages["demo:com.demo.a"].score.unwrap();
    assert_eq!((a_pkg.fan_in, a_pkg.fan_out), (1, 0));
    let b_pkg = graph.packages["demo:com.demo.b"].score.unwrap();
    assert_eq!((b_pkg.fan_in, b_pkg.fan_out), (0, 1));

    let a_type = graph.types["demo:com.demo.a.A"].score.unwrap();
    assert_eq!(a_type.fan_in, 1, "A is imported by one package");
    let b_type = graph.types["demo:com.demo.b.B"].score.unwrap();
    assert_eq!(b_type.fan_out, 1, "B's file imports one internal package");
}

#[test]
fn test_main_member_marks_entry_point() {
    let mut graph = builder::build(&repo(vec![source_file(
        "src/main/java/com/demo/Main.java",
        "com.demo",
        &[],
        vec![type_facts("Main", &[], &["main"])],
    )]))
    .unwrap();
    score::score(&mut graph, &ScorerConfig::default());

    assert!(graph.types["demo:com.demo.Main"].score.unwrap().entry_point);
}

#[test]
fn test_qualified_entry_annotation_matches_simple_name() {
    let mut graph = builder::build(&repo(vec![source_file(
        "src/main/java/com/demo/R.java",
        "com.demo",
        &[],
        vec![type_facts("R", &["jakarta.ws.rs.Path"], &[])],
    )]))
    .unwrap();
    score::score(&mut graph, &ScorerConfig::default());

    assert!(graph.types["demo:com.demo.R"].score.unwrap().entry_point);
}

#[test]
fn test_annotation_density_normalized() {
    let mut graph = builder::build(&repo(vec![source_file(
        "src/main/java/com/demo/S.java",
        "com.demo",
        &[],
        vec![type_facts("S", &["ApplicationScoped", "Deprecated"], &[])],
    )]))
    .unwrap();
    score::score(&mut graph, &ScorerConfig::default());

    let s = graph.types["demo:com.demo.S"].score.unwrap();
    assert_eq!(s.annotation_density, 2.0 / 4.0);
}

#[test]
fn test_depth_tolerates_cycles() {
    let mut graph = builder::build(&repo(vec![
        source_file(
            "src/main/java/com/demo/x/X.java",
            "com.demo.x",
            &["com.demo.y.Y"],
            vec![type_facts("X", &["Path"], &[])],
        ),
        source_file(
            "src/main/java/com/demo/y/Y.java",
            "com.demo.y",
            &["com.demo.x.X"],
            vec![type_facts("Y", &[], &[])],
        ),
    ]))
    .unwrap();
    score::score(&mut graph, &ScorerConfig::default());

    assert_eq!(graph.packages["demo:com.demo.x"].score.unwrap().depth, 0);
    assert_eq!(graph.packages["demo:com.demo.y"].score.unwrap().depth, 1);
}

#[test]
fn test_depth_capped_on_long_chains() {
    let config = ScorerConfig {
        depth_cap: 2,
        ..ScorerConfig::default()
    };
    let mut graph = builder::build(&repo(vec![
        source_file(
            "src/main/java/p0/P0.java",
            "p0",
            &["p1.T1"],
            vec![type_facts("T0", &["Path"], &[])],
        ),
        source_file(
            "src/main/java/p1/T1.java",
            "p1",
            &["p2.T2"],
            vec![type_facts("T1", &[], &[])],
        ),
        source_file(
            "src/main/java/p2/T2.java",
            "p2",
            &["p3.T3"],
            vec![type_facts("T2", &[], &[])],
        ),
        source_file(
            "src/main/java/p3/T3.java",
            "p3",
            &[],
            vec![type_facts("T3", &[], &[])],
        ),
    ]))
    .unwrap();
    score::score(&mut graph, &config);

    assert_eq!(graph.packages["demo:p2"].score.unwrap().depth, 2);
    // Beyond the cap: never discovered, reported at the cap.
    assert_eq!(graph.packages["demo:p3"].score.unwrap().depth, 2);
}

#[test]
fn test_no_entry_points_means_everything_at_cap() {
    let mut graph = builder::build(&repo(vec![source_file(
        "src/main/java/com/demo/Quiet.java",
        "com.demo",
        &[],
        vec![type_facts("Quiet", &[], &[])],
    )]))
    .unwrap();
    score::score(&mut graph, &ScorerConfig::default());

    assert_eq!(graph.packages["demo:com.demo"].score.unwrap().depth, 10);
}

#[test]
fn test_scoring_never_mutates_topology() {
    let mut graph = builder::build(&scenario()).unwrap();
    let packages_before: Vec<String> = graph.packages.keys().cloned().collect();
    let edges_before = graph.edges.clone();

    score::score(&mut graph, &ScorerConfig::default());

    let packages_after: Vec<String> = graph.packages.keys().cloned().collect();
    assert_eq!(packages_before, packages_after);
    assert_eq!(edges_before, graph.edges);
}
