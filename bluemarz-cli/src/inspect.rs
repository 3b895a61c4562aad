//! Static views of assignment spec files.

use bluemarz::{AssignmentSpec, BluemarzResult, ToolSpec};
use serde_json::{Value, json};
use std::path::Path;

fn all_tools(spec: &AssignmentSpec) -> impl Iterator<Item = &ToolSpec> {
    spec.agent.tools.iter().chain(&spec.additional_tools)
}

/// Summary of what an assignment built from `spec` would look like.
pub fn describe(spec: &AssignmentSpec) -> Value {
    let tools: Vec<Value> = all_tools(spec)
        .map(|tool| {
            json!({
                "name": tool.name,
                "type": tool.tool_type.to_string(),
                "variables": tool.variables.as_ref().map_or(0, |vars| vars.len()),
            })
        })
        .collect();

    json!({
        "agent": {
            "id": spec.agent.id,
            "type": spec.agent.agent_type,
            "model": spec.agent.model,
            "hasApiKey": spec.agent.api_key.is_some(),
        },
        "sessionType": spec.resolved_session_type(),
        "newSession": spec.session.as_ref().is_none_or(|session| session.is_new()),
        "tools": tools,
        "syncTools": all_tools(spec).filter(|tool| tool.is_sync()).count(),
        "query": spec.query.as_deref().or(spec.agent.default_query.as_deref()),
        "parameters": spec.parameters,
    })
}

/// Function-calling schemas of every tool the agent would advertise.
pub fn tool_schemas(spec: &AssignmentSpec) -> Value {
    Value::Array(all_tools(spec).map(ToolSpec::function_schema).collect())
}

pub fn run_inspect(path: &Path) -> BluemarzResult<()> {
    let spec = AssignmentSpec::load_from_file(path)?;
    tracing::info!(path = %path.display(), agent = %spec.agent.id, "Loaded assignment spec");
    println!("{}", serde_json::to_string_pretty(&describe(&spec))?);
    Ok(())
}

pub fn run_schema(path: &Path) -> BluemarzResult<()> {
    let spec = AssignmentSpec::load_from_file(path)?;
    println!("{}", serde_json::to_string_pretty(&tool_schemas(&spec))?);
    Ok(())
}
