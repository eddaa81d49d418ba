//! Helpdesk commands: push, pull and sync

use super::common::HandlerContext;
use crate::cli::output::OutputFormatter;
use crate::error::{DeskError, Result};
use colored::Colorize;
use tokio_util::sync::CancellationToken;

/// Handle the push command
pub async fn handle_push_command(reference: &str, formatter: &OutputFormatter) -> Result<()> {
    let ctx = HandlerContext::load()?;
    let ticket = ctx.service.get(reference)?;
    let link = ctx.engine()?.push_create(&ticket.id).await?;

    if formatter.is_json() {
        formatter.print_json(&link)?;
    } else {
        formatter.success(&format!(
            "{} mirrored as helpdesk ticket {}",
            ticket.display_number, link.external_id
        ));
        formatter.info(&link.external_url);
    }
    Ok(())
}

/// Handle the pull command
pub async fn handle_pull_command(reference: &str, formatter: &OutputFormatter) -> Result<()> {
    let ctx = HandlerContext::load()?;
    let engine = ctx.engine()?;
    let ticket = ctx.service.get(reference)?;
    let external_id = ticket.external_id.clone().ok_or_else(|| {
        DeskError::validation(format!(
            "ticket {} has no helpdesk counterpart; push it first",
            ticket.display_number
        ))
    })?;

    let ticket = engine.pull_ticket(&external_id).await?;
    let imported = engine.pull_comments(&external_id).await?;

    if formatter.is_json() {
        formatter.print_json(&serde_json::json!({
            "ticket": ticket,
            "comments_imported": imported.len(),
        }))?;
    } else {
        formatter.success(&format!(
            "Pulled {} ({}), {} new comment(s)",
            ticket.display_number,
            ticket.status,
            imported.len()
        ));
    }
    Ok(())
}

/// Handle the sync command
///
/// Ctrl-C stops the batch before the next ticket; tickets already reconciled
/// stay reconciled.
pub async fn handle_sync_command(formatter: &OutputFormatter) -> Result<()> {
    let ctx = HandlerContext::load()?;
    let engine = ctx.engine()?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    let watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });
    let report = engine.sync_all_with_cancel(&cancel).await;
    watcher.abort();
    let report = report?;

    if formatter.is_json() {
        return formatter.print_json(&report);
    }

    formatter.success(&format!(
        "Reconciled {} of {} ticket(s), imported {} comment(s)",
        report.succeeded, report.attempted, report.comments_imported
    ));
    for failure in &report.failed {
        formatter.warning(&format!(
            "{} (helpdesk #{}): {}",
            failure.ticket.bold(),
            failure.external_id,
            failure.error
        ));
    }
    for skipped in &report.unreadable {
        formatter.warning(&format!(
            "skipped unreadable {}: {}",
            skipped.path.display(),
            skipped.error
        ));
    }
    if report.cancelled {
        formatter.warning("Interrupted; remaining tickets were not reconciled");
    }
    Ok(())
}
