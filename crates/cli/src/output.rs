//! Console rendering of session results and history.

use std::fmt::Write as _;

use anyhow::Result;
use console::style;
use core_types::Language;
use serde::Serialize;
use session::{LabelledHit, Session};

#[derive(Serialize)]
struct JsonReport<'a> {
    query_class: Option<&'a str>,
    total: usize,
    page: usize,
    page_count: usize,
    results: &'a [LabelledHit],
}

/// The whole current result set as pretty JSON.
pub fn render_json(session: &Session) -> Result<String> {
    let report = JsonReport {
        query_class: session.query_class(),
        total: session.results().len(),
        page: session.page() + 1,
        page_count: session.page_count(),
        results: session.results(),
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

/// The current page with match colouring.
pub fn render_page(session: &Session) -> String {
    let zh = session.language() == Language::Zh;
    let mut out = String::new();
    let total = session.results().len();
    let class = session.query_class().unwrap_or(if zh { "无" } else { "None" });

    if zh {
        let _ = writeln!(out, "{} {}", style("查询类别:").cyan(), style(class).bold());
        let _ = writeln!(out, "{} {total}", style("总结果数:").cyan());
    } else {
        let _ = writeln!(out, "{} {}", style("Query class:").cyan(), style(class).bold());
        let _ = writeln!(out, "{} {total}", style("Total results:").cyan());
    }
    if total == 0 {
        return out;
    }
    out.push('\n');

    let offset = session.page() * session::PAGE_SIZE;
    for (i, r) in session.current_page_results().iter().enumerate() {
        let score = format!("{:6.2}%", r.hit.score);
        let score = if r.matches {
            style(score).green()
        } else {
            style(score).red()
        };
        let _ = writeln!(
            out,
            "{:>3}. {} {} {}",
            offset + i + 1,
            score,
            style(r.hit.file_name()).bold(),
            style(format!("[{}]", r.class)).dim()
        );
    }

    let (page, pages) = (session.page() + 1, session.page_count());
    if zh {
        let _ = writeln!(out, "\n第 {page} 页 / 共 {pages} 页");
    } else {
        let _ = writeln!(out, "\nPage {page} / {pages}");
    }
    out
}

/// History listing, newest first, with the index `replay` expects.
pub fn render_history(session: &Session) -> String {
    let history = session.history();
    if history.is_empty() {
        return if session.language() == Language::Zh {
            "暂无检索历史\n".into()
        } else {
            "No search history\n".into()
        };
    }
    let mut out = String::new();
    for (i, entry) in history.iter_recent().enumerate() {
        let _ = writeln!(
            out,
            "{} {}",
            style(format!("[{i}]")).cyan(),
            entry.summary(session.language())
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::config::AppConfig;

    fn empty_session() -> Session {
        console::set_colors_enabled(false);
        Session::new(&AppConfig::default())
    }

    #[test]
    fn empty_result_page_shows_header_only() {
        let text = render_page(&empty_session());
        assert_eq!(text, "Query class: None\nTotal results: 0\n");
    }

    #[test]
    fn empty_history_message_follows_language() {
        let mut session = empty_session();
        assert_eq!(render_history(&session), "No search history\n");
        session.set_language(Language::Zh);
        assert_eq!(render_history(&session), "暂无检索历史\n");
    }

    #[test]
    fn json_report_is_valid_json() -> Result<()> {
        let value: serde_json::Value = serde_json::from_str(&render_json(&empty_session())?)?;
        assert_eq!(value["total"], 0);
        assert_eq!(value["page_count"], 0);
        assert!(value["query_class"].is_null());
        assert!(value["results"].as_array().is_some_and(Vec::is_empty));
        Ok(())
    }
}
