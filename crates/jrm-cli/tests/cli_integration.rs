//! Integration tests for jrm functionality.
//! Exercises the underlying library pipeline the CLI commands invoke, end to
//! end on a fixture project written to disk.

use jrm_core::config::{BudgetConfig, BudgetUnit, JrmConfig};
use jrm_facts::collect::CollectOptions;
use std::path::Path;

const POM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<project xmlns="http://maven.apache.org/POM/4.0.0">
  <groupId>org.acme</groupId>
  <artifactId>code-with-quarkus</artifactId>
  <version>1.0.0-SNAPSHOT</version>
  <dependencies>
    <dependency>
      <groupId>io.quarkus</groupId>
      <artifactId>quarkus-rest</artifactId>
    </dependency>
  </dependencies>
</project>
"#;

const RESOURCE: &str = r#"package org.acme.api;

import jakarta.ws.rs.GET;
import jakarta.ws.rs.Path;
import org.acme.core.GreetingService;

@Path("/hello")
public class GreetingResource {

    @GET
    public String hello() {
        return service.greet();
    }
}
"#;

const SERVICE: &str = r"package org.acme.core;

public class GreetingService {

    public String greet() {
        return greeting;
    }

    public String farewell() {
        return parting;
    }
}
";

fn write_file(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

fn fixture_project() -> tempfile::TempDir {
    let tmp = tempfile::tempdir().unwrap();
    write_file(tmp.path(), "pom.xml", POM);
    write_file(
        tmp.path(),
        "src/main/java/org/acme/api/GreetingResource.java",
        RESOURCE,
    );
    write_file(
        tmp.path(),
        "src/main/java/org/acme/core/GreetingService.java",
        SERVICE,
    );
    tmp
}

fn build_artifact(root: &Path, config: &JrmConfig) -> serde_json::Value {
    let facts = jrm_facts::collect::collect(root, &CollectOptions::default(), None).unwrap();
    let outcome = jrm_map::pipeline::run(&facts, config, None).unwrap();
    let artifact = root.join(jrm_core::storage::DEFAULT_ARTIFACT);
    jrm_core::storage::write_artifact(&artifact, &outcome.bytes).unwrap();
    let content = std::fs::read_to_string(&artifact).unwrap();
    serde_json::from_str(&content).unwrap()
}

#[test]
fn test_end_to_end_build_writes_artifact() {
    let tmp = fixture_project();
    let doc = build_artifact(tmp.path(), &JrmConfig::default());

    assert_eq!(doc["schemaVersion"], "1.0.0");
    assert_eq!(doc["repository"]["buildTool"], "maven");
    assert_eq!(doc["repository"]["coordinates"]["artifact"], "code-with-quarkus");
    assert_eq!(doc["repository"]["frameworkFeatures"][0], "quarkus-rest");

    let packages: Vec<&str> = doc["packages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_str().unwrap())
        .collect();
    assert!(packages.contains(&"code-with-quarkus:org.acme.api"));
    assert!(packages.contains(&"code-with-quarkus:org.acme.core"));

    let api = doc["packages"]
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["id"] == "code-with-quarkus:org.acme.api")
        .unwrap();
    assert_eq!(api["importance"]["entryPoint"], true);
    assert!(
        api["dependsOn"]
            .as_array()
            .unwrap()
            .iter()
            .any(|t| t == "code-with-quarkus:org.acme.core"),
        "api package must depend on core"
    );
}

#[test]
fn test_end_to_end_runs_are_byte_identical() {
    let tmp = fixture_project();
    let facts = jrm_facts::collect::collect(tmp.path(), &CollectOptions::default(), None).unwrap();
    let config = JrmConfig::default();

    let first = jrm_map::pipeline::run(&facts, &config, None).unwrap();
    let second = jrm_map::pipeline::run(&facts, &config, None).unwrap();
    assert_eq!(first.bytes, second.bytes);
}

#[test]
fn test_tight_budget_drops_detail_but_keeps_boundaries() {
    let tmp = fixture_project();
    let config = JrmConfig {
        budget: BudgetConfig {
            limit: 0,
            unit: BudgetUnit::Bytes,
        },
        ..JrmConfig::default()
    };
    let doc = build_artifact(tmp.path(), &config);

    assert!(doc["types"].as_array().unwrap().is_empty());
    assert!(!doc["packages"].as_array().unwrap().is_empty());
    assert_eq!(doc["budgetReport"]["budgetExceeded"], true);
}

#[test]
fn test_framework_features_reach_repository_metadata() {
    let tmp = fixture_project();
    let facts = jrm_facts::collect::collect(tmp.path(), &CollectOptions::default(), None).unwrap();
    assert_eq!(
        facts.modules[0].build.framework_features,
        vec!["quarkus-rest"]
    );
}

#[test]
fn test_missing_sources_still_succeed_with_note() {
    let tmp = tempfile::tempdir().unwrap();
    write_file(tmp.path(), "pom.xml", POM);

    let facts = jrm_facts::collect::collect(tmp.path(), &CollectOptions::default(), None).unwrap();
    let outcome = jrm_map::pipeline::run(&facts, &JrmConfig::default(), None).unwrap();

    assert!(outcome.report.notes.iter().any(|n| n.contains("ingest gap")));
    assert!(outcome.graph.types.is_empty());
}

#[test]
fn test_config_env_budget_override() {
    let tmp = fixture_project();
    // Env overrides are process-global; set and clear inside one test.
    unsafe {
        std::env::set_var("JRM_BUDGET", "123");
    }
    let config = JrmConfig::load(tmp.path()).unwrap();
    unsafe {
        std::env::remove_var("JRM_BUDGET");
    }
    assert_eq!(config.budget.limit, 123);
}
