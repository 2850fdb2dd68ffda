// src/cli/chat.rs — Terminal REPL driving the same dialogue as the bot

use crate::infra::config::Config;

/// Run the interactive chat REPL as `user`.
pub async fn run_chat(config: &Config, user: &str) -> anyhow::Result<()> {
    // local sessions stay out of the analytics database
    let controller = super::build_controller(config, None)?;

    eprintln!(
        "{} v{} | {} | type quit to leave, #N picks a suggestion\n",
        config.bot.name,
        env!("CARGO_PKG_VERSION"),
        config.model.model,
    );

    let mut suggestions: Vec<String> = Vec::new();
    let mut next = Some("/start".to_string());

    while let Some(input) = next.take().or_else(read_input) {
        let trimmed = input.trim();
        if trimmed == "quit" || trimmed == "exit" {
            break;
        }

        let text = resolve_shortcut(trimmed, &suggestions);
        let reply = controller.handle_message(user, &text).await;

        println!("\n{}\n", reply.text);
        if !reply.quick_replies.is_empty() {
            println!("{}\n", render_suggestions(&reply.quick_replies));
        }
        suggestions = reply.quick_replies;
    }

    Ok(())
}

fn read_input() -> Option<String> {
    use std::io::{self, BufRead, Write};

    print!("> ");
    io::stdout().flush().ok();

    let stdin = io::stdin();
    let mut line = String::new();
    match stdin.lock().read_line(&mut line) {
        Ok(0) => None, // EOF
        Ok(_) => Some(line),
        Err(_) => None,
    }
}

/// `#3` stands for the third suggestion; anything else passes through.
fn resolve_shortcut(input: &str, suggestions: &[String]) -> String {
    input
        .strip_prefix('#')
        .and_then(|n| n.parse::<usize>().ok())
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| suggestions.get(i))
        .cloned()
        .unwrap_or_else(|| input.to_string())
}

fn render_suggestions(suggestions: &[String]) -> String {
    suggestions
        .iter()
        .enumerate()
        .map(|(i, s)| format!("#{} {s}", i + 1))
        .collect::<Vec<_>>()
        .join("  ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn suggestions() -> Vec<String> {
        vec!["🔍 Symptom Analysis".into(), "💬 AI Chat".into()]
    }

    #[test]
    fn test_shortcut_picks_suggestion() {
        assert_eq!(resolve_shortcut("#2", &suggestions()), "💬 AI Chat");
    }

    #[test]
    fn test_shortcut_out_of_range_passes_through() {
        assert_eq!(resolve_shortcut("#0", &suggestions()), "#0");
        assert_eq!(resolve_shortcut("#9", &suggestions()), "#9");
        assert_eq!(resolve_shortcut("#two", &suggestions()), "#two");
        assert_eq!(resolve_shortcut("headache", &suggestions()), "headache");
    }

    #[test]
    fn test_render_suggestions() {
        assert_eq!(
            render_suggestions(&suggestions()),
            "#1 🔍 Symptom Analysis  #2 💬 AI Chat"
        );
    }
}
