//! Ticket commands: new, list, show, edit, status and comment

use super::common::HandlerContext;
use crate::cli::output::{OutputFormatter, paint_priority, paint_status};
use crate::cli::split_list;
use crate::core::{ChangedFields, Comment, Priority, Requester, Status, Ticket, TicketField};
use crate::error::{DeskError, Result};
use crate::services::{AuthorRole, NewTicket, TicketEdit};
use chrono::Utc;
use colored::Colorize;
use std::collections::BTreeMap;

/// Parameters for the new command
pub struct NewParams {
    pub subject: String,
    pub description: String,
    pub requester: Requester,
    pub category: Option<String>,
    pub priority: Option<String>,
    pub tags: Option<String>,
    pub assignee: Option<String>,
    pub channel: String,
    pub fields: Vec<String>,
    pub push: bool,
}

/// Handle the new command
pub async fn handle_new_command(params: NewParams, formatter: &OutputFormatter) -> Result<()> {
    let ctx = HandlerContext::load()?;

    let input = NewTicket {
        subject: params.subject,
        description: params.description,
        category: params.category,
        priority: params.priority.as_deref().map(str::parse::<Priority>).transpose()?,
        tags: split_list(params.tags.as_deref()),
        requester: params.requester,
        assignee: params.assignee,
        channel: params.channel.parse()?,
        custom_fields: parse_custom_fields(&params.fields)?,
    };
    let ticket = ctx.service.create(input)?;

    if formatter.is_json() && !params.push {
        return formatter.print_json(&ticket);
    }
    formatter.success(&format!(
        "Created ticket {} '{}'",
        ticket.display_number, ticket.subject
    ));

    if params.push {
        let link = ctx.engine()?.push_create(&ticket.id).await?;
        if formatter.is_json() {
            return formatter.print_json(&ctx.service.get(&ticket.id.to_string())?);
        }
        formatter.success(&format!("Mirrored as helpdesk ticket {}", link.external_id));
        formatter.info(&link.external_url);
    }
    Ok(())
}

/// Handle the list command
pub fn handle_list_command(status: Option<&str>, formatter: &OutputFormatter) -> Result<()> {
    let ctx = HandlerContext::load()?;
    let status = status.map(str::parse::<Status>).transpose()?;
    let tickets = ctx.service.list(status)?;

    if formatter.is_json() {
        return formatter.print_json(&tickets);
    }
    if tickets.is_empty() {
        formatter.info("No tickets found");
        return Ok(());
    }

    for ticket in &tickets {
        let linked = if ticket.is_linked() { "⇄" } else { " " };
        formatter.info(&format!(
            "{} {linked} {:<16} {:<8} {}",
            ticket.display_number.to_string().bold(),
            paint_status(ticket.status),
            paint_priority(ticket.priority),
            ticket.subject
        ));
    }
    formatter.info(&format!("\n{} ticket(s)", tickets.len()));
    Ok(())
}

/// Handle the show command
pub fn handle_show_command(reference: &str, formatter: &OutputFormatter) -> Result<()> {
    let ctx = HandlerContext::load()?;
    let ticket = ctx.service.get(reference)?;
    let comments = ctx.service.comments(&ticket.id)?;
    // A category deleted from the registry just means no SLA section
    let sla = ticket
        .category
        .as_deref()
        .and_then(|name| ctx.service.categories().get(name).ok())
        .map(|category| category.sla_report(&ticket, Utc::now()));

    if formatter.is_json() {
        return formatter.print_json(&serde_json::json!({
            "ticket": ticket,
            "comments": comments,
            "sla": sla,
            "response_minutes": ticket.response_minutes(),
            "resolution_minutes": ticket.resolution_minutes(),
        }));
    }

    print_ticket(&ticket, formatter);
    if let Some(sla) = sla {
        let mark = |breached: bool| if breached { "breached".red() } else { "ok".green() };
        formatter.info(&format!(
            "SLA:         response by {} ({}), resolution by {} ({})",
            sla.response_due.format("%Y-%m-%d %H:%M"),
            mark(sla.response_breached),
            sla.resolution_due.format("%Y-%m-%d %H:%M"),
            mark(sla.resolution_breached)
        ));
    }

    if !ticket.status_history.is_empty() {
        formatter.info(&format!("\n{}", "History".bold()));
        let mut to = ticket.status;
        let mut lines = Vec::new();
        for change in ticket.status_history.iter().rev() {
            let note = change.note.as_deref().map(|n| format!(" ({n})")).unwrap_or_default();
            lines.push(format!(
                "  {} {} → {} by {}{note}",
                change.changed_at.format("%Y-%m-%d %H:%M"),
                change.status,
                to,
                change.actor
            ));
            to = change.status;
        }
        for line in lines.iter().rev() {
            formatter.info(line);
        }
    }

    if !comments.is_empty() {
        formatter.info(&format!("\n{}", "Comments".bold()));
        for comment in &comments {
            print_comment(comment, formatter);
        }
    }
    Ok(())
}

/// Parameters for the edit command
pub struct EditParams {
    pub reference: String,
    pub subject: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub tags: Option<String>,
    pub assignee: Option<String>,
    pub push: bool,
}

/// Handle the edit command
pub async fn handle_edit_command(params: EditParams, formatter: &OutputFormatter) -> Result<()> {
    let ctx = HandlerContext::load()?;
    let ticket = ctx.service.get(&params.reference)?;

    let edit = TicketEdit {
        subject: params.subject,
        description: params.description,
        priority: params.priority.as_deref().map(str::parse::<Priority>).transpose()?,
        tags: params.tags.map(|t| split_list(Some(&t))),
        assignee: params.assignee,
    };
    let (ticket, changed) = ctx.service.edit(&ticket.id, edit)?;

    report_ticket(&ticket, &format!("Updated ticket {}", ticket.display_number), formatter)?;
    if params.push {
        push_changes(&ctx, &ticket, &changed, formatter).await?;
    }
    Ok(())
}

/// Handle the status command
pub async fn handle_status_command(
    reference: &str,
    status: &str,
    actor: &str,
    note: Option<String>,
    push: bool,
    formatter: &OutputFormatter,
) -> Result<()> {
    let ctx = HandlerContext::load()?;
    let to = status.parse::<Status>()?;
    let ticket = ctx.service.get(reference)?;
    let from = ticket.status;
    let ticket = ctx.service.transition(&ticket.id, to, actor, note)?;

    report_ticket(
        &ticket,
        &format!("{} moved from {from} to {to}", ticket.display_number),
        formatter,
    )?;
    if push {
        push_changes(&ctx, &ticket, &[TicketField::Status].into(), formatter).await?;
    }
    Ok(())
}

/// Handle the comment command
pub async fn handle_comment_command(
    reference: &str,
    body: &str,
    author: &str,
    from_requester: bool,
    internal: bool,
    push: bool,
    formatter: &OutputFormatter,
) -> Result<()> {
    let ctx = HandlerContext::load()?;
    let ticket = ctx.service.get(reference)?;
    let (role, author) = if from_requester {
        (AuthorRole::Requester, ticket.requester.id.as_str())
    } else {
        (AuthorRole::Staff, author)
    };
    let is_public = internal.then_some(false);

    let (comment, updated) = ctx
        .service
        .add_comment(&ticket.id, author, body, is_public, role)?;
    let comment = if push {
        ctx.engine()?.push_comment(&ticket.id, &comment.id).await?
    } else {
        comment
    };

    if formatter.is_json() {
        return formatter.print_json(&serde_json::json!({
            "comment": comment,
            "ticket": updated,
        }));
    }
    formatter.success(&format!("Comment added to {}", updated.display_number));
    if updated.status != ticket.status {
        formatter.info(&format!(
            "Ticket moved from {} to {}",
            ticket.status, updated.status
        ));
    }
    if let Some(note_id) = &comment.external_id {
        formatter.info(&format!("Mirrored as helpdesk note {note_id}"));
    }
    Ok(())
}

async fn push_changes(
    ctx: &HandlerContext,
    ticket: &Ticket,
    changed: &ChangedFields,
    formatter: &OutputFormatter,
) -> Result<()> {
    if ctx.engine()?.push_update(&ticket.id, changed).await? {
        formatter.success("Changes sent to the helpdesk");
    } else {
        formatter.info("Nothing to send to the helpdesk");
    }
    Ok(())
}

fn report_ticket(ticket: &Ticket, message: &str, formatter: &OutputFormatter) -> Result<()> {
    if formatter.is_json() {
        formatter.print_json(ticket)
    } else {
        formatter.success(message);
        Ok(())
    }
}

/// Parse `key=value` pairs; values that are valid JSON keep their type
pub fn parse_custom_fields(fields: &[String]) -> Result<BTreeMap<String, serde_json::Value>> {
    fields
        .iter()
        .map(|field| {
            let (key, value) = field
                .split_once('=')
                .filter(|(key, _)| !key.trim().is_empty())
                .ok_or_else(|| {
                    DeskError::validation(format!(
                        "custom field '{field}' must look like key=value"
                    ))
                })?;
            let value = serde_json::from_str(value)
                .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
            Ok((key.trim().to_string(), value))
        })
        .collect()
}

fn print_ticket(ticket: &Ticket, formatter: &OutputFormatter) {
    formatter.info(&format!(
        "{} {}",
        ticket.display_number.to_string().bold(),
        ticket.subject.bold()
    ));
    formatter.info(&format!("ID:          {}", ticket.id));
    formatter.info(&format!("Status:      {}", paint_status(ticket.status)));
    formatter.info(&format!("Priority:    {}", paint_priority(ticket.priority)));
    if let Some(category) = &ticket.category {
        formatter.info(&format!("Category:    {category}"));
    }
    if !ticket.tags.is_empty() {
        formatter.info(&format!("Tags:        {}", ticket.tags.join(", ")));
    }
    formatter.info(&format!("Requester:   {}", ticket.requester.id));
    if let Some(assignee) = &ticket.assignee {
        formatter.info(&format!("Assignee:    {assignee}"));
    }
    formatter.info(&format!("Channel:     {}", ticket.channel));
    formatter.info(&format!(
        "Created:     {}",
        ticket.created_at.format("%Y-%m-%d %H:%M")
    ));
    if let Some(minutes) = ticket.response_minutes() {
        formatter.info(&format!("Responded:   after {minutes} min"));
    }
    if let Some(minutes) = ticket.resolution_minutes() {
        formatter.info(&format!("Resolved:    after {minutes} min"));
    }
    if let (Some(id), Some(url)) = (&ticket.external_id, &ticket.external_url) {
        formatter.info(&format!("Helpdesk:    #{id} {url}"));
    }
    for (key, value) in &ticket.custom_fields {
        formatter.info(&format!("Field:       {key} = {value}"));
    }
    formatter.info(&format!("\n{}", ticket.description));
}

fn print_comment(comment: &Comment, formatter: &OutputFormatter) {
    let visibility = if comment.is_visible_publicly() {
        String::new()
    } else {
        format!(" {}", "[internal]".yellow())
    };
    formatter.info(&format!(
        "  {} {}{visibility}",
        comment.created_at.format("%Y-%m-%d %H:%M"),
        comment.author_id.bold()
    ));
    formatter.info(&format!("    {}", comment.body));
}
