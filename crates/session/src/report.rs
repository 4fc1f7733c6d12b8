//! Plain-text rendering of a result set.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result, bail};
use core_types::Language;

use crate::LabelledHit;

struct Labels {
    title: &'static str,
    query_class: &'static str,
    total: &'static str,
    result: &'static str,
    file: &'static str,
    path: &'static str,
    similarity: &'static str,
    class: &'static str,
    status: &'static str,
    matched: &'static str,
    mismatched: &'static str,
    none: &'static str,
}

const EN: Labels = Labels {
    title: "Search Results:",
    query_class: "Query Class",
    total: "Total Results",
    result: "Result",
    file: "File",
    path: "Path",
    similarity: "Similarity",
    class: "Class",
    status: "Match Status",
    matched: "Match",
    mismatched: "Mismatch",
    none: "None",
};

const ZH: Labels = Labels {
    title: "检索结果:",
    query_class: "查询类别",
    total: "总结果数",
    result: "结果",
    file: "文件",
    path: "路径",
    similarity: "相似度",
    class: "类别",
    status: "匹配状态",
    matched: "匹配",
    mismatched: "不匹配",
    none: "无",
};

const fn labels(language: Language) -> &'static Labels {
    match language {
        Language::En => &EN,
        Language::Zh => &ZH,
    }
}

/// Render `results` as the text report shown to users and saved to disk.
pub fn render_text_report(
    query_class: Option<&str>,
    results: &[LabelledHit],
    language: Language,
) -> String {
    let l = labels(language);
    let mut out = String::new();
    let _ = writeln!(out, "{}", l.title);
    let _ = writeln!(out, "{}: {}", l.query_class, query_class.unwrap_or(l.none));
    let _ = writeln!(out, "{}: {}\n", l.total, results.len());

    for (i, r) in results.iter().enumerate() {
        let _ = writeln!(out, "{} {}:", l.result, i + 1);
        let _ = writeln!(out, "{}: {}", l.file, r.hit.file_name());
        let _ = writeln!(out, "{}: {}", l.path, r.hit.path.display());
        let _ = writeln!(out, "{}: {:.2}%", l.similarity, r.hit.score);
        let _ = writeln!(out, "{}: {}", l.class, r.class);
        let status = if r.matches { l.matched } else { l.mismatched };
        let _ = writeln!(out, "{}: {status}\n", l.status);
    }
    out
}

/// Write a rendered report as UTF-8. Refuses to write an empty result set.
pub fn save_text_report(
    path: &Path,
    query_class: Option<&str>,
    results: &[LabelledHit],
    language: Language,
) -> Result<()> {
    if results.is_empty() {
        bail!("no results to save");
    }
    let text = render_text_report(query_class, results, language);
    std::fs::write(path, text).with_context(|| format!("saving results to {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::RetrievalHit;
    use tempfile::tempdir;

    fn sample() -> Vec<LabelledHit> {
        vec![
            LabelledHit::label(RetrievalHit::new("/models/bolt_01.step", 100.0), Some("bolt")),
            LabelledHit::label(RetrievalHit::new("/models/gear_07.stp", 41.2345), Some("bolt")),
        ]
    }

    #[test]
    fn english_report_lists_every_result() {
        let text = render_text_report(Some("bolt"), &sample(), Language::En);
        assert!(text.starts_with("Search Results:\nQuery Class: bolt\nTotal Results: 2\n\n"));
        assert!(text.contains("Result 1:\nFile: bolt_01.step\nPath: /models/bolt_01.step\n"));
        assert!(text.contains("Similarity: 100.00%\nClass: bolt\nMatch Status: Match\n"));
        assert!(text.contains("Similarity: 41.23%\nClass: gear\nMatch Status: Mismatch\n"));
    }

    #[test]
    fn chinese_report_uses_chinese_labels() {
        let text = render_text_report(None, &sample(), Language::Zh);
        assert!(text.contains("查询类别: 无"));
        assert!(text.contains("相似度: 41.23%"));
        assert!(text.contains("匹配状态: 不匹配"));
    }

    #[test]
    fn refuses_to_save_nothing() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("out.txt");
        assert!(save_text_report(&path, None, &[], Language::En).is_err());
        assert!(!path.exists());

        save_text_report(&path, Some("bolt"), &sample(), Language::En)?;
        assert!(std::fs::read_to_string(&path)?.contains("Total Results: 2"));
        Ok(())
    }
}
