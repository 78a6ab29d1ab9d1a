//! Composite prompt assembly.
//!
//! The prompt sent to the generator layers the employee persona, the
//! workflow's action instructions, the task fields, any
//! workflow-specific context, and recalled memories.

use std::fmt::Write;

use super::{RunContext, WorkflowKind};

/// Build the full prompt for an execute-action step.
pub fn build_composite_prompt(ctx: &RunContext) -> String {
    let task = &ctx.task;
    let mut prompt = String::new();

    prompt.push_str(&ctx.profile.persona);
    prompt.push_str("\n\n");
    prompt.push_str(action_prompt(ctx.kind));

    let _ = write!(
        prompt,
        "\n\n## Task Details\nTitle: {}\nDescription: {}\nContent: {}\nGitHub: {}\n",
        task.title,
        task.description,
        task.content,
        task.github_url.as_deref().unwrap_or("Not specified"),
    );

    if ctx.kind == WorkflowKind::Research {
        let scope = ctx.string_list("research_scope");
        if !scope.is_empty() {
            prompt.push_str("\n## Research Scope\nFocus on these specific questions/topics:\n");
            for topic in &scope {
                let _ = writeln!(prompt, "- {topic}");
            }
        }
    } else if ctx.kind == WorkflowKind::Documentation {
        let blocks = ctx.string_list("code_blocks");
        if !blocks.is_empty() {
            let _ = write!(
                prompt,
                "\n## Code Analysis\nFound {} code blocks to document.\n",
                blocks.len()
            );
        }
    }

    let memories = ctx.string_list("memories");
    if !memories.is_empty() {
        prompt.push_str(
            "\n## Relevant Memories\nThese are relevant memories from your previous work:\n",
        );
        for memory in &memories {
            let _ = writeln!(prompt, "- {memory}");
        }
    }

    prompt.push_str("\nProvide your response:");
    prompt
}

/// Per-workflow action instructions.
fn action_prompt(kind: WorkflowKind) -> &'static str {
    match kind {
        WorkflowKind::Specification => {
            "Create a detailed technical specification including:\n\
             - Clear problem statement and objectives\n\
             - Functional requirements (what the system should do)\n\
             - Non-functional requirements (performance, security, scalability)\n\
             - Technical approach and architecture overview\n\
             - Implementation milestones and timeline\n\
             - Success criteria and acceptance criteria\n\
             - Risk assessment and mitigation strategies\n\
             \n\
             Format your response as a structured document with clear sections."
        }
        WorkflowKind::Research => {
            "Conduct thorough research and provide:\n\
             - Executive summary of key findings\n\
             - Detailed analysis of the research topic\n\
             - Multiple perspectives and sources of information\n\
             - Data and evidence to support conclusions\n\
             - Actionable recommendations based on findings\n\
             - Proper citations and references\n\
             - Implications and next steps\n\
             \n\
             Be comprehensive but focus on actionable insights."
        }
        WorkflowKind::Documentation => {
            "Create comprehensive technical documentation including:\n\
             - Clear overview of what the code does\n\
             - Detailed explanation of key functions and classes\n\
             - API documentation with parameters and return values\n\
             - Usage examples and code snippets\n\
             - Architecture overview and design patterns\n\
             - Installation and setup instructions (if applicable)\n\
             - Troubleshooting and common issues\n\
             \n\
             Write for developers who need to understand, use, or maintain this code.\n\
             If code analysis suggests complex architecture, mention where diagrams would be helpful."
        }
        WorkflowKind::Default => {
            "Analyze and respond to the task appropriately with detailed, helpful information."
        }
    }
}
