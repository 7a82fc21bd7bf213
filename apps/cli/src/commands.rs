use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, bail};
use serde::Serialize;
use serde_json::Value;
use switchboard_action::{ActionParams, ActionResult, ToolCall};
use switchboard_controller::RouteTable;

use crate::config::AppConfig;
use crate::console::Console;

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn exit_code(success: bool) -> ExitCode {
    if success { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}

fn parse_params(raw: &str) -> anyhow::Result<ActionParams> {
    match serde_json::from_str(raw).context("--params must be JSON")? {
        Value::Object(params) => Ok(params),
        other => bail!("--params must be a JSON object, got {other}"),
    }
}

pub fn actions(console: &Console, page: Option<&str>, json: bool) -> anyhow::Result<ExitCode> {
    let actions = console.session.available_actions(page);
    if json {
        print_json(&actions)?;
        return Ok(ExitCode::SUCCESS);
    }

    let width = actions.iter().map(|a| a.id.len()).max().unwrap_or(0);
    for action in &actions {
        let flag = if action.deprecated { " (deprecated)" } else { "" };
        println!(
            "{:<width$}  {:<10}  {}{flag}",
            action.id,
            action.category.as_str(),
            action.description,
        );
    }
    Ok(ExitCode::SUCCESS)
}

pub async fn run(
    console: &mut Console,
    action: &str,
    params: &str,
    at: Option<&str>,
) -> anyhow::Result<ExitCode> {
    let params = parse_params(params)?;
    if let Some(path) = at {
        if console.session.navigate(path).is_none() {
            tracing::warn!(path, "path does not resolve to a page");
        }
    }
    let result = console.session.execute_action(action, params).await;
    print_json(&result)?;
    Ok(exit_code(result.success))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ScriptStep {
    name: String,
    page: Option<String>,
    result: ActionResult,
}

pub async fn script(console: &mut Console, file: &Path) -> anyhow::Result<ExitCode> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("reading script {}", file.display()))?;
    let calls: Vec<ToolCall> = serde_json::from_str(&text)
        .with_context(|| format!("parsing script {}", file.display()))?;

    let mut steps = Vec::with_capacity(calls.len());
    for call in calls {
        let name = call.name.clone();
        let result = console.session.execute_tool_call(call).await;
        steps.push(ScriptStep {
            name,
            page: console.session.current_page().map(str::to_owned),
            result,
        });
    }
    let success = steps.iter().all(|s| s.result.success);
    print_json(&steps)?;
    Ok(exit_code(success))
}

pub fn tools(console: &Console) -> anyhow::Result<ExitCode> {
    print_json(&console.session.tools())?;
    Ok(ExitCode::SUCCESS)
}

pub fn route(routes: &RouteTable, path: &str) -> anyhow::Result<ExitCode> {
    let Some(matched) = routes.resolve(path) else {
        bail!("no page for path {path}");
    };
    print_json(&matched)?;
    Ok(ExitCode::SUCCESS)
}

pub fn stats(console: &Console) -> anyhow::Result<ExitCode> {
    print_json(&console.registry.statistics())?;
    Ok(ExitCode::SUCCESS)
}

pub fn config(config: &AppConfig) -> anyhow::Result<ExitCode> {
    print_json(config)?;
    Ok(ExitCode::SUCCESS)
}
