//! Inspect the view endpoints: configuration, first page and count.

use std::io::Write;
use std::time::Instant;

use anyhow::{Context, Result};

use crate::api::FairspaceApi;
use crate::model::ViewRequest;
use crate::ui::{display_config, display_count, display_page, format_duration};

/// Print the view configuration when `view` is absent or `"config"`,
/// otherwise the first page of the view and its count, each timed.
pub fn retrieve_view(api: &mut FairspaceApi, view: Option<&str>, out: &mut impl Write) -> Result<()> {
    let view = match view {
        None | Some("config") => {
            writeln!(out, "Fetching view config")?;
            let config = api.retrieve_view_config().context("Failed to retrieve view config")?;
            return display_config(out, &config);
        }
        Some(view) => view,
    };

    writeln!(out, "Fetching {view} view")?;
    let start = Instant::now();
    let page = api
        .retrieve_view_page(&ViewRequest::new(view))
        .with_context(|| format!("Failed to retrieve {view} view page"))?;
    writeln!(out, "(took {} ms)", format_duration(start.elapsed()))?;
    display_page(out, &page)?;

    writeln!(out)?;
    writeln!(out, "Fetching {view} view count")?;
    let start = Instant::now();
    let count = api
        .count(view, None)
        .with_context(|| format!("Failed to count {view} view"))?;
    writeln!(out, "(took {} ms)", format_duration(start.elapsed()))?;
    display_count(out, &count)
}
