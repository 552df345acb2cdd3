//! System prompt rendering.
//!
//! The prompt carries the response protocol the model must honor and the
//! workspace layout contract. Memory augmentation is injected upstream
//! by the orchestrator proxy, so only the static contract is rendered
//! here.

use anyhow::Result;
use minijinja::{Environment, context};

use crate::config::AgentConfig;
use crate::core::protocol::{ACTION_DIRECTIVE, COMMAND_LABEL};
use crate::io::exec::OUTPUT_PREFIX;

const SYSTEM_TEMPLATE: &str = include_str!("prompts/system.md");

/// Render the system message that opens every conversation.
pub fn render_system_prompt(config: &AgentConfig) -> Result<String> {
    let mut env = Environment::new();
    env.add_template("system", SYSTEM_TEMPLATE)
        .expect("system template should be valid");
    let template = env.get_template("system")?;
    let rendered = template.render(context! {
        name => config.agent_name,
        role => config.agent_role,
        workspace_root => config.workspace.root.display().to_string(),
        out_dir => config.workspace.out_dir.display().to_string(),
        in_dir => config.workspace.in_dir.display().to_string(),
        work_dir => config.workspace.work_dir.display().to_string(),
        www_dir => config.workspace.www_dir.display().to_string(),
        directive => ACTION_DIRECTIVE,
        command_label => COMMAND_LABEL,
        output_prefix => OUTPUT_PREFIX,
    })?;
    Ok(rendered)
}
