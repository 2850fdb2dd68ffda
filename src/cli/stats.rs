// src/cli/stats.rs — Print usage analytics from the SQLite store

use crate::infra::paths;
use crate::memory::store::AnalyticsSummary;
use crate::memory::MemoryManager;

pub async fn show_stats(top: u32, json: bool) -> anyhow::Result<()> {
    let db_path = paths::db_path();
    if !db_path.exists() {
        println!("No analytics recorded yet ({}).", db_path.display());
        return Ok(());
    }

    let mm = MemoryManager::open(&db_path)?;
    let summary = mm.store.summary(top)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print!("{}", format_summary(&summary));
    }
    Ok(())
}

fn format_summary(summary: &AnalyticsSummary) -> String {
    let mut out = format!(
        "Users:        {}\nActive today: {}\n",
        summary.total_users, summary.active_today
    );
    if summary.top_symptoms.is_empty() {
        out.push_str("\nNo symptoms recorded.\n");
        return out;
    }
    out.push_str("\nTop symptoms:\n");
    let width = summary
        .top_symptoms
        .iter()
        .map(|r| r.symptom.chars().count())
        .max()
        .unwrap_or(0);
    for row in &summary.top_symptoms {
        let pad = width - row.symptom.chars().count();
        out.push_str(&format!("  {}{}  {}\n", row.symptom, " ".repeat(pad), row.count));
    }
    out
}
