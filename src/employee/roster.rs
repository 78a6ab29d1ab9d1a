//! Roster construction.
//!
//! The default roster is built by an explicit function taking its
//! collaborators — no ambient factories or global registries. Extra
//! employees can be declared in TOML files and loaded from a directory.

use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

use super::registry::Registry;
use super::Employee;
use crate::capability::Capability;
use crate::error::{Error, Result};
use crate::llm::TextGenerator;
use crate::memory::MemoryStore;
use crate::workflow::Workflow;

/// Build the default three-employee registry.
pub fn default_registry(
    generator: Arc<dyn TextGenerator>,
    memory: Arc<dyn MemoryStore>,
) -> Result<Registry> {
    let mut registry = Registry::new();
    registry.register(engineering_manager(Arc::clone(&generator), Arc::clone(&memory)))?;
    registry.register(research_agent(Arc::clone(&generator), Arc::clone(&memory)))?;
    registry.register(doc_specialist(generator, memory))?;
    Ok(registry)
}

/// Engineering manager: claims specification-shaped tasks.
fn engineering_manager(
    generator: Arc<dyn TextGenerator>,
    memory: Arc<dyn MemoryStore>,
) -> Employee {
    let mut employee = Employee::new(
        "eng_mgr_001",
        "EngineeringManager",
        "You are a Senior Engineering Manager with 10+ years of experience leading technical teams.\n\
         You excel at breaking down complex problems into clear, actionable specifications.\n\
         You consider scalability, maintainability, and team capabilities in your planning.\n\
         You communicate technical concepts clearly to both technical and non-technical stakeholders.\n\
         You always provide structured, comprehensive specifications that teams can execute on.",
    );

    employee.add_rule(
        Capability::all_of(vec![
            Capability::Assignment,
            Capability::keyword([
                "specification",
                "spec",
                "requirements",
                "architecture",
                "design",
                "plan",
                "roadmap",
                "technical approach",
                "solution design",
            ]),
            Capability::content_length(20),
        ]),
        "specification",
        10,
    );
    employee.add_workflow(Workflow::new("specification", generator, memory));
    employee
}

/// Research agent: claims any assigned task with enough substance.
fn research_agent(
    generator: Arc<dyn TextGenerator>,
    memory: Arc<dyn MemoryStore>,
) -> Employee {
    let mut employee = Employee::new(
        "research_001",
        "ResearchAgent",
        "You are a Research Specialist with expertise in gathering and analyzing information across various domains.\n\
         You excel at finding credible sources, synthesizing complex information, and identifying key insights.\n\
         You present findings objectively with proper analysis and actionable recommendations.\n\
         You stay current with industry trends and emerging technologies.\n\
         You always provide comprehensive research with multiple perspectives and evidence-based conclusions.",
    );

    employee.add_rule(
        Capability::all_of(vec![
            Capability::Assignment,
            Capability::content_length(15),
        ]),
        "research",
        10,
    );
    employee.add_workflow(Workflow::new("research", generator, memory));
    employee
}

/// Documentation specialist: claims doc- and code-shaped tasks.
fn doc_specialist(
    generator: Arc<dyn TextGenerator>,
    memory: Arc<dyn MemoryStore>,
) -> Employee {
    let mut employee = Employee::new(
        "doc_spec_001",
        "DocSpecialist",
        "You are a Technical Documentation Specialist who creates clear, comprehensive documentation.\n\
         You excel at explaining complex code and systems in simple, understandable terms.\n\
         You create well-structured documentation that serves developers at all skill levels.\n\
         You always include practical examples and clear explanations of functionality.\n\
         When appropriate, you suggest where visual diagrams would enhance understanding.",
    );

    employee.add_rule(
        Capability::all_of(vec![
            Capability::Assignment,
            Capability::keyword([
                "documentation",
                "document",
                "doc",
                "readme",
                "api docs",
                "code",
                "python",
                "```",
                "function",
                "class",
                "module",
            ]),
            Capability::content_length(10),
        ]),
        "documentation",
        10,
    );
    employee.add_workflow(Workflow::new("documentation", generator, memory));
    employee
}

// ---------------------------------------------------------------------------
// Declarative roster files
// ---------------------------------------------------------------------------

/// Top-level TOML wrapper.
#[derive(Debug, Deserialize)]
struct EmployeeConfig {
    employee: EmployeeDef,
}

/// A declarative employee definition.
#[derive(Debug, Deserialize)]
struct EmployeeDef {
    id: String,
    name: String,
    persona: String,
    #[serde(default)]
    workflows: Vec<String>,
    #[serde(default)]
    rules: Vec<RuleDef>,
}

/// A declarative capability rule. All listed conditions are combined
/// with AND on top of the implicit assignment check.
#[derive(Debug, Deserialize)]
struct RuleDef {
    workflow: String,
    #[serde(default)]
    priority: i32,
    #[serde(default)]
    keywords: Vec<String>,
    min_content: Option<usize>,
    #[serde(default)]
    statuses: Vec<String>,
}

impl RuleDef {
    fn capability(&self) -> Capability {
        let mut checks = vec![Capability::Assignment];
        if !self.keywords.is_empty() {
            checks.push(Capability::keyword(self.keywords.iter().cloned()));
        }
        if let Some(min) = self.min_content {
            checks.push(Capability::content_length(min));
        }
        if !self.statuses.is_empty() {
            checks.push(Capability::status(self.statuses.iter()));
        }
        Capability::all_of(checks)
    }
}

/// Load all `.toml` employee definitions from a directory into a
/// registry.
pub fn load_from_dir(
    dir: &Path,
    generator: Arc<dyn TextGenerator>,
    memory: Arc<dyn MemoryStore>,
) -> Result<Registry> {
    let mut registry = Registry::new();

    let entries = std::fs::read_dir(dir)
        .map_err(|e| Error::Config(format!("cannot read roster dir {}: {e}", dir.display())))?;

    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        if !path.extension().is_some_and(|ext| ext == "toml") {
            continue;
        }
        let content = std::fs::read_to_string(&path)?;
        let config: EmployeeConfig = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("bad roster config {}: {e}", path.display())))?;

        let def = config.employee;
        let mut employee = Employee::new(&def.id, &def.name, &def.persona);
        for rule in &def.rules {
            employee.add_rule(rule.capability(), &rule.workflow, rule.priority);
        }
        for workflow_type in &def.workflows {
            employee.add_workflow(Workflow::new(
                workflow_type.clone(),
                Arc::clone(&generator),
                Arc::clone(&memory),
            ));
        }
        registry.register(employee)?;
    }

    Ok(registry)
}
