// UI layer: terminal output for the commands. Confirmation uses
// `dialoguer`, long uploads report progress with `indicatif`, and the
// display helpers write to any `Write` so they can be checked in tests.

use std::io::Write;
use std::time::Duration;

use anyhow::Result;
use dialoguer::Confirm;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;

use crate::model::{Count, Page};

/// Ask a yes/no question; "no" is the default.
pub fn confirm(prompt: &str) -> Result<bool> {
    Ok(Confirm::new().with_prompt(prompt).default(false).interact()?)
}

/// Progress bar over `len` directories, drawn on stderr. Hidden when
/// stderr is not a terminal so plain log output stays readable.
pub fn progress_bar(len: u64, on_terminal: bool) -> ProgressBar {
    if !on_terminal {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(len);
    let style = ProgressStyle::with_template("{spinner} [{elapsed_precise}] {bar:40} {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb
}

/// `1234567` -> `"1,234,567"`.
pub fn thousands(n: impl std::fmt::Display) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Milliseconds with thousands separators, as in `(took 1,234 ms)`.
pub fn format_duration(d: Duration) -> String {
    thousands(d.as_millis())
}

pub fn display_config(out: &mut impl Write, config: &Value) -> Result<()> {
    writeln!(out, "Config")?;
    writeln!(out, "=======")?;
    writeln!(out, "{}", serde_json::to_string_pretty(config)?)?;
    writeln!(out)?;
    Ok(())
}

pub fn display_page(out: &mut impl Write, page: &Page) -> Result<()> {
    let page_no = page.page.map(|p| p.to_string()).unwrap_or_else(|| "?".into());
    match page.total_elements {
        Some(total) => writeln!(
            out,
            "Displaying {} / {} results. Page {} / {}.",
            page.rows.len(),
            thousands(total),
            page_no,
            page.total_pages.map(|p| thousands(p)).unwrap_or_else(|| "?".into())
        )?,
        None => writeln!(out, "Displaying {} results. Page {}.", page.rows.len(), page_no)?,
    }
    for row in &page.rows {
        writeln!(out, "{row}")?;
    }
    if page.has_next {
        writeln!(out, "More results available ...")?;
    }
    Ok(())
}

pub fn display_count(out: &mut impl Write, count: &Count) -> Result<()> {
    writeln!(out, "{} results.", thousands(count.total_elements))?;
    if count.timeout {
        writeln!(out, "(count timed out, the total may be incomplete)")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn render<F: FnOnce(&mut Vec<u8>) -> Result<()>>(f: F) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn progress_bar_hidden_off_terminal() {
        assert!(progress_bar(10, false).is_hidden());
        assert_eq!(progress_bar(10, true).length(), Some(10));
    }

    #[test]
    fn thousands_separators() {
        assert_eq!(thousands(0u32), "0");
        assert_eq!(thousands(999u32), "999");
        assert_eq!(thousands(1000u32), "1,000");
        assert_eq!(thousands(1234567u64), "1,234,567");
        assert_eq!(format_duration(Duration::from_millis(12345)), "12,345");
    }

    #[test]
    fn page_with_totals() {
        let page: Page = serde_json::from_value(json!({
            "totalPages": 1500,
            "totalElements": 30000,
            "rows": [{"Sample": "a"}, {"Sample": "b"}],
            "hasNext": true,
            "timeout": false,
            "page": 1,
            "size": 20
        }))
        .unwrap();
        let text = render(|out| display_page(out, &page));
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("Displaying 2 / 30,000 results. Page 1 / 1,500."));
        assert_eq!(lines.next(), Some(r#"{"Sample":"a"}"#));
        assert!(text.ends_with("More results available ...\n"));
    }

    #[test]
    fn page_without_totals() {
        let page: Page = serde_json::from_value(json!({"rows": [], "hasNext": false, "page": 2})).unwrap();
        let text = render(|out| display_page(out, &page));
        assert_eq!(text, "Displaying 0 results. Page 2.\n");
    }

    #[test]
    fn config_is_pretty_printed() {
        let text = render(|out| display_config(out, &json!({"views": []})));
        assert!(text.starts_with("Config\n=======\n{\n"));
    }

    #[test]
    fn count_line() {
        let text = render(|out| {
            display_count(
                out,
                &Count {
                    total_elements: 4321,
                    timeout: false,
                },
            )
        });
        assert_eq!(text, "4,321 results.\n");
    }
}
