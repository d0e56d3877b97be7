// Copyright 2025 Sushanth (https://github.com/sushanthpy)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Terminal rendering for command results

use anyhow::Result;
use serde::Serialize;
use tracereplay_client::{ReplayResponse, TraceList};
use tracereplay_core::{Message, ReplayContext, TraceDocument};

/// Longest content shown per message in human output
const CONTENT_PREVIEW_CHARS: usize = 200;

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_trace(trace: &TraceDocument) {
    println!("Trace {}", trace.id);
    if let Some(name) = &trace.name {
        println!("  Name: {}", name);
    }
    if let Some(user_id) = &trace.user_id {
        println!("  User: {}", user_id);
    }
    if let Some(session_id) = &trace.session_id {
        println!("  Session: {}", session_id);
    }
    println!("  Timestamp: {}", trace.timestamp.to_rfc3339());
    if !trace.tags.is_empty() {
        println!("  Tags: {}", trace.tags.join(", "));
    }

    println!("  Observations: {}", trace.observations.len());
    for (i, obs) in trace.observations.iter().enumerate() {
        let mut line = format!("    {}. [{}] {}", i + 1, obs.kind, obs.id);
        if let Some(name) = &obs.name {
            line.push_str(&format!(" {}", name));
        }
        if let Some(model) = &obs.model {
            line.push_str(&format!(" model={}", model));
        }
        if let Some(usage) = &obs.usage {
            line.push_str(&format!(
                " tokens={}/{}/{}",
                usage.input.unwrap_or(0),
                usage.output.unwrap_or(0),
                usage.total.unwrap_or(0)
            ));
        }
        if let Some(ms) = obs.duration_ms() {
            line.push_str(&format!(" {}ms", ms));
        }
        if let Some(level) = &obs.level {
            line.push_str(&format!(" level={}", level));
        }
        println!("{}", line);
    }
}

pub fn print_trace_list(list: &TraceList) {
    println!(
        "Page {}/{} ({} traces total)",
        list.meta.page, list.meta.total_pages, list.meta.total_items
    );
    for (i, trace) in list.data.iter().enumerate() {
        println!(
            "  {}. {} {} {} user={} session={} observations={}",
            i + 1,
            trace.id,
            trace.timestamp.to_rfc3339(),
            trace.name.as_deref().unwrap_or("-"),
            trace.user_id.as_deref().unwrap_or("-"),
            trace.session_id.as_deref().unwrap_or("-"),
            trace.observations.len()
        );
    }
}

pub fn print_messages(messages: &[Message]) {
    for (i, message) in messages.iter().enumerate() {
        println!("Message {}:", i + 1);
        println!("  Role: {}", message.role.as_deref().unwrap_or("(missing)"));
        if message.content.is_some() {
            println!("  Content: {}", preview(&message.content_text()));
        }
        if let Some(calls) = &message.tool_calls {
            println!("  Tool Calls: {}", calls);
        }
        if let Some(id) = &message.tool_call_id {
            println!("  Tool Call ID: {}", id);
        }
        println!();
    }
}

pub fn print_context_summary(ctx: &ReplayContext) {
    println!("Replay context for session {}", ctx.session_id);
    println!("  User: {}", ctx.user_id);
    println!("  Trace: {}", ctx.trace_id);
    println!("  Model: {} @ {}", ctx.model_config.model, ctx.model_config.base_url);
    println!("  Tools: {}", ctx.tools.len());
    println!("  Turns: {}", ctx.history.len());
    println!("  Tool calls: {}", ctx.tool_call_count());
    println!("  Total tokens: {}", ctx.total_tokens());
}

pub fn print_replay_response(response: &ReplayResponse) -> Result<()> {
    println!("Response Status: {}", response.status);
    match response.json() {
        Some(body) if response.is_success() => print_json(&body)?,
        _ if response.is_success() => println!("{}", response.body),
        _ => eprintln!("Error response: {}", response.body),
    }
    Ok(())
}

fn preview(text: &str) -> String {
    let total = text.chars().count();
    if total <= CONTENT_PREVIEW_CHARS {
        return text.to_string();
    }
    let head: String = text.chars().take(CONTENT_PREVIEW_CHARS).collect();
    format!("{}... (truncated, total length: {})", head, total)
}
