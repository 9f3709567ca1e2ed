//! Build-descriptor metadata extraction.
//!
//! Maven descriptors get a full read-only DOM walk; Gradle scripts get a
//! best-effort line scan. Malformed or missing descriptors never abort a
//! run — the facts degrade and the condition is noted for the report.

use jrm_core::error::Degradation;
use jrm_core::model::{BuildTool, Coordinates};
use regex::Regex;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;

/// A dependency declared in a build descriptor.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct DependencyDecl {
    pub group: String,
    pub artifact: String,
    pub scope: String,
}

/// A build plugin declared in a build descriptor.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct PluginDecl {
    pub group: String,
    pub artifact: String,
    pub version: String,
}

/// Metadata extracted from one module's build descriptor.
#[derive(Debug, Clone, Default)]
pub struct BuildFacts {
    pub tool: Option<BuildTool>,
    pub coordinates: Option<Coordinates>,
    pub properties: BTreeMap<String, String>,
    pub dependencies: Vec<DependencyDecl>,
    pub plugins: Vec<PluginDecl>,
    /// Framework-marker artifacts (Quarkus extensions, Spring Boot starters).
    pub framework_features: Vec<String>,
    /// Submodule directories declared by an aggregator descriptor.
    pub modules: Vec<String>,
    pub degradations: Vec<Degradation>,
}

impl BuildFacts {
    fn degraded(tool: Option<BuildTool>, detail: String) -> Self {
        Self {
            tool,
            degradations: vec![Degradation::MetadataDegraded(detail)],
            ..Self::default()
        }
    }
}

/// Load build facts for a module root, trying Maven then Gradle.
pub fn load_build_facts(module_root: &Path) -> BuildFacts {
    let pom = module_root.join("pom.xml");
    if pom.exists() {
        return match std::fs::read_to_string(&pom) {
            Ok(content) => parse_pom(&content),
            Err(err) => BuildFacts::degraded(
                Some(BuildTool::Maven),
                format!("unreadable {}: {err}", pom.display()),
            ),
        };
    }

    for name in ["build.gradle", "build.gradle.kts"] {
        let gradle = module_root.join(name);
        if gradle.exists() {
            return match std::fs::read_to_string(&gradle) {
                Ok(content) => parse_gradle(&content),
                Err(err) => BuildFacts::degraded(
                    Some(BuildTool::Gradle),
                    format!("unreadable {}: {err}", gradle.display()),
                ),
            };
        }
    }

    BuildFacts::degraded(None, format!("no build descriptor in {}", module_root.display()))
}

fn child_elem<'a, 'input>(
    node: roxmltree::Node<'a, 'input>,
    name: &str,
) -> Option<roxmltree::Node<'a, 'input>> {
    node.children()
        .find(|c| c.is_element() && c.tag_name().name() == name)
}

fn child_text(node: roxmltree::Node<'_, '_>, name: &str) -> Option<String> {
    child_elem(node, name)
        .and_then(|c| c.text())
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Parse a `pom.xml` document.
pub fn parse_pom(content: &str) -> BuildFacts {
    let doc = match roxmltree::Document::parse(content) {
        Ok(doc) => doc,
        Err(err) => {
            return BuildFacts::degraded(Some(BuildTool::Maven), format!("malformed pom.xml: {err}"));
        }
    };
    let root = doc.root_element();
    let parent = child_elem(root, "parent");

    let group = child_text(root, "groupId").or_else(|| parent.and_then(|p| child_text(p, "groupId")));
    let artifact = child_text(root, "artifactId");
    let version = child_text(root, "version").or_else(|| parent.and_then(|p| child_text(p, "version")));

    let coordinates = match (group, artifact) {
        (Some(group), Some(artifact)) => Some(Coordinates {
            group,
            artifact,
            version,
        }),
        _ => None,
    };

    let mut properties = BTreeMap::new();
    if let Some(props) = child_elem(root, "properties") {
        for child in props.children().filter(roxmltree::Node::is_element) {
            if let Some(text) = child.text() {
                properties.insert(child.tag_name().name().to_string(), text.trim().to_string());
            }
        }
    }

    let mut dependencies = Vec::new();
    let mut framework_features = Vec::new();
    if let Some(deps) = child_elem(root, "dependencies") {
        for dep in deps.children().filter(|c| c.tag_name().name() == "dependency") {
            let group = child_text(dep, "groupId").unwrap_or_default();
            let artifact = child_text(dep, "artifactId").unwrap_or_default();
            let scope = child_text(dep, "scope").unwrap_or_else(|| "compile".to_string());
            if is_framework_feature(&group, &artifact) {
                framework_features.push(artifact.clone());
            }
            dependencies.push(DependencyDecl {
                group,
                artifact,
                scope,
            });
        }
    }
    dependencies.sort();
    framework_features.sort();

    let mut plugins = Vec::new();
    if let Some(build) = child_elem(root, "build")
        && let Some(plugins_node) = child_elem(build, "plugins")
    {
        for plugin in plugins_node
            .children()
            .filter(|c| c.tag_name().name() == "plugin")
        {
            plugins.push(PluginDecl {
                group: child_text(plugin, "groupId").unwrap_or_default(),
                artifact: child_text(plugin, "artifactId").unwrap_or_default(),
                version: child_text(plugin, "version").unwrap_or_default(),
            });
        }
    }
    plugins.sort();

    let mut modules = Vec::new();
    if let Some(modules_node) = child_elem(root, "modules") {
        for module in modules_node
            .children()
            .filter(|c| c.tag_name().name() == "module")
        {
            if let Some(text) = module.text() {
                let text = text.trim();
                if !text.is_empty() {
                    modules.push(text.to_string());
                }
            }
        }
    }
    modules.sort();

    BuildFacts {
        tool: Some(BuildTool::Maven),
        coordinates,
        properties,
        dependencies,
        plugins,
        framework_features,
        modules,
        degradations: Vec::new(),
    }
}

fn is_framework_feature(group: &str, artifact: &str) -> bool {
    (group == "io.quarkus" && artifact.starts_with("quarkus-"))
        || (group == "org.springframework.boot" && artifact.starts_with("spring-boot-starter"))
}

fn gradle_dep_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"^\s*(implementation|api|compileOnly|runtimeOnly|testImplementation)\s*[( ]\s*["']([\w.\-]+):([\w.\-]+)(?::[\w.\-+]+)?["']"#,
        )
        .unwrap()
    })
}

fn gradle_assign_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"^\s*(group|version)\s*=?\s*["']([^"']+)["']"#).unwrap())
}

/// Best-effort scan of a `build.gradle` / `build.gradle.kts` script.
pub fn parse_gradle(content: &str) -> BuildFacts {
    let mut group = None;
    let mut version = None;
    let mut dependencies = Vec::new();
    let mut framework_features = Vec::new();

    for line in content.lines() {
        if let Some(caps) = gradle_assign_re().captures(line) {
            let value = caps.get(2).unwrap().as_str().to_string();
            match caps.get(1).unwrap().as_str() {
                "group" => group = Some(value),
                _ => version = Some(value),
            }
            continue;
        }
        if let Some(caps) = gradle_dep_re().captures(line) {
            let scope = match caps.get(1).unwrap().as_str() {
                "testImplementation" => "test",
                "runtimeOnly" => "runtime",
                "compileOnly" => "provided",
                _ => "compile",
            };
            let dep_group = caps.get(2).unwrap().as_str().to_string();
            let dep_artifact = caps.get(3).unwrap().as_str().to_string();
            if is_framework_feature(&dep_group, &dep_artifact) {
                framework_features.push(dep_artifact.clone());
            }
            dependencies.push(DependencyDecl {
                group: dep_group,
                artifact: dep_artifact,
                scope: scope.to_string(),
            });
        }
    }
    dependencies.sort();
    framework_features.sort();

    // Gradle scripts rarely restate the artifact id; the collector falls
    // back to the directory name for module identity.
    let coordinates = group.map(|group| Coordinates {
        group,
        artifact: String::new(),
        version,
    });

    BuildFacts {
        tool: Some(BuildTool::Gradle),
        coordinates,
        properties: BTreeMap::new(),
        dependencies,
        plugins: Vec::new(),
        framework_features,
        modules: Vec::new(),
        degradations: Vec::new(),
    }
}

fn gradle_include_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"["']:?([A-Za-z0-9_.:\-]+)["']"#).unwrap())
}

/// Submodule directories from a `settings.gradle(.kts)` script.
/// `include ':api', ':core:util'` yields `api` and `core/util`.
pub fn gradle_settings_modules(content: &str) -> Vec<String> {
    let mut modules = Vec::new();
    for line in content.lines() {
        if !line.trim_start().starts_with("include") {
            continue;
        }
        for caps in gradle_include_re().captures_iter(line) {
            modules.push(caps.get(1).unwrap().as_str().replace(':', "/"));
        }
    }
    modules.sort();
    modules.dedup();
    modules
}

#[cfg(test)]
mod tests {
    use super::*;

    const POM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<project xmlns="http://maven.apache.org/POM/4.0.0">
  <groupId>com.example</groupId>
  <artifactId>code-with-quarkus</artifactId>
  <version>1.0.0-SNAPSHOT</version>
  <properties>
    <maven.compiler.release>21</maven.compiler.release>
  </properties>
  <dependencies>
    <dependency>
      <groupId>io.quarkus</groupId>
      <artifactId>quarkus-rest</artifactId>
    </dependency>
    <dependency>
      <groupId>io.quarkus</groupId>
      <artifactId>quarkus-arc</artifactId>
    </dependency>
    <dependency>
      <groupId>org.junit.jupiter</groupId>
      <artifactId>junit-jupiter</artifactId>
      <scope>test</scope>
    </dependency>
  </dependencies>
  <build>
    <plugins>
      <plugin>
        <groupId>io.quarkus.platform</groupId>
        <artifactId>quarkus-maven-plugin</artifactId>
        <version>3.15.1</version>
      </plugin>
    </plugins>
  </build>
</project>
"#;

    #[test]
    fn test_parse_pom_coordinates_and_properties() {
        let facts = parse_pom(POM);
        assert_eq!(facts.tool, Some(BuildTool::Maven));
        let coords = facts.coordinates.unwrap();
        assert_eq!(coords.group, "com.example");
        assert_eq!(coords.artifact, "code-with-quarkus");
        assert_eq!(coords.version.as_deref(), Some("1.0.0-SNAPSHOT"));
        assert_eq!(
            facts.properties.get("maven.compiler.release").map(String::as_str),
            Some("21")
        );
    }

    #[test]
    fn test_parse_pom_dependencies_sorted_with_default_scope() {
        let facts = parse_pom(POM);
        assert_eq!(facts.dependencies.len(), 3);
        assert_eq!(facts.dependencies[0].artifact, "quarkus-arc");
        assert_eq!(facts.dependencies[0].scope, "compile");
        assert_eq!(facts.dependencies[2].scope, "test");
    }

    #[test]
    fn test_parse_pom_framework_features() {
        let facts = parse_pom(POM);
        assert_eq!(facts.framework_features, vec!["quarkus-arc", "quarkus-rest"]);
    }

    #[test]
    fn test_parse_pom_plugins() {
        let facts = parse_pom(POM);
        assert_eq!(facts.plugins.len(), 1);
        assert_eq!(facts.plugins[0].artifact, "quarkus-maven-plugin");
        assert_eq!(facts.plugins[0].version, "3.15.1");
    }

    #[test]
    fn test_parse_pom_parent_fallback() {
        let pom = r"<project>
  <parent>
    <groupId>com.example.parent</groupId>
    <version>2.0</version>
  </parent>
  <artifactId>child-module</artifactId>
</project>";
        let coords = parse_pom(pom).coordinates.unwrap();
        assert_eq!(coords.group, "com.example.parent");
        assert_eq!(coords.artifact, "child-module");
        assert_eq!(coords.version.as_deref(), Some("2.0"));
    }

    #[test]
    fn test_parse_pom_malformed_degrades() {
        let facts = parse_pom("<project><unclosed>");
        assert_eq!(facts.tool, Some(BuildTool::Maven));
        assert!(facts.coordinates.is_none());
        assert_eq!(facts.degradations.len(), 1);
        assert!(matches!(
            facts.degradations[0],
            Degradation::MetadataDegraded(_)
        ));
    }

    #[test]
    fn test_parse_gradle_dependencies() {
        let facts = parse_gradle(
            r#"
group = "com.example"
version = "0.9.0"

dependencies {
    implementation "org.springframework.boot:spring-boot-starter-web:3.2.0"
    implementation("com.fasterxml.jackson.core:jackson-databind")
    testImplementation 'org.junit.jupiter:junit-jupiter:5.10.0'
}
"#,
        );
        assert_eq!(facts.tool, Some(BuildTool::Gradle));
        let coords = facts.coordinates.unwrap();
        assert_eq!(coords.group, "com.example");
        assert_eq!(coords.version.as_deref(), Some("0.9.0"));
        assert_eq!(facts.dependencies.len(), 3);
        assert_eq!(facts.dependencies[2].scope, "test");
        assert_eq!(facts.framework_features, vec!["spring-boot-starter-web"]);
    }

    #[test]
    fn test_load_build_facts_missing_descriptor() {
        let tmp = tempfile::tempdir().unwrap();
        let facts = load_build_facts(tmp.path());
        assert_eq!(facts.tool, None);
        assert_eq!(facts.degradations.len(), 1);
    }

    #[test]
    fn test_parse_pom_aggregator_modules() {
        let pom = r"<project>
  <groupId>com.example</groupId>
  <artifactId>aggregate</artifactId>
  <modules>
    <module>service</module>
    <module>api</module>
  </modules>
</project>";
        let facts = parse_pom(pom);
        assert_eq!(facts.modules, vec!["api", "service"]);
    }

    #[test]
    fn test_gradle_settings_modules() {
        let settings = r"
rootProject.name = 'shop'
include ':api', ':core:util'
include(':web')
";
        assert_eq!(
            gradle_settings_modules(settings),
            vec!["api", "core/util", "web"]
        );
    }

    #[test]
    fn test_load_build_facts_prefers_maven() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("pom.xml"), POM).unwrap();
        std::fs::write(tmp.path().join("build.gradle"), "group = 'x'").unwrap();
        let facts = load_build_facts(tmp.path());
        assert_eq!(facts.tool, Some(BuildTool::Maven));
    }
}
