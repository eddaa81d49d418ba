use super::common::HandlerContext;
use crate::cli::output::{OutputFormatter, paint_priority};
use crate::cli::{CategoryCommands, split_list};
use crate::core::{Category, Priority};
use crate::error::Result;
use colored::Colorize;

/// Handle `category` subcommands
pub fn handle_category_command(
    command: CategoryCommands,
    formatter: &OutputFormatter,
) -> Result<()> {
    let ctx = HandlerContext::load()?;
    match command {
        CategoryCommands::Add {
            name,
            description,
            priority,
            tags,
            assign_to,
            response_hours,
            resolution_hours,
            default,
            inactive,
        } => {
            let mut category = Category::new(name)
                .with_priority(priority.parse::<Priority>()?)
                .with_tags(split_list(tags.as_deref()))
                .with_sla(response_hours, resolution_hours);
            category.description = description;
            category.auto_assign_to = assign_to;
            category.is_default = default;
            category.is_active = !inactive;

            let saved = ctx.service.categories().upsert(category)?;
            if formatter.is_json() {
                formatter.print_json(&saved)?;
            } else {
                formatter.success(&format!("Saved category '{}'", saved.name));
                print_category(&saved, formatter);
            }
        },
        CategoryCommands::List { all } => {
            let categories = ctx.service.categories().list(!all)?;
            if formatter.is_json() {
                formatter.print_json(&categories)?;
            } else if categories.is_empty() {
                formatter.info("No categories. Add one with 'etdesk category add <name>'");
            } else {
                for category in &categories {
                    print_category(category, formatter);
                }
            }
        },
        CategoryCommands::Default { name } => {
            let category = ctx.service.categories().set_default(&name)?;
            if formatter.is_json() {
                formatter.print_json(&category)?;
            } else {
                formatter.success(&format!("'{}' is now the default category", category.name));
            }
        },
    }
    Ok(())
}

fn print_category(category: &Category, formatter: &OutputFormatter) {
    let mut flags = Vec::new();
    if category.is_default {
        flags.push("default".green().to_string());
    }
    if !category.is_active {
        flags.push("inactive".dimmed().to_string());
    }

    formatter.info(&format!(
        "{} [{}] {}",
        category.name.bold(),
        paint_priority(category.default_priority),
        flags.join(" ")
    ));
    if let Some(description) = &category.description {
        formatter.info(&format!("  {description}"));
    }
    formatter.info(&format!(
        "  SLA: respond within {}h, resolve within {}h",
        category.sla.response_hours, category.sla.resolution_hours
    ));
    if !category.default_tags.is_empty() {
        formatter.info(&format!("  Tags: {}", category.default_tags.join(", ")));
    }
    if let Some(assignee) = &category.auto_assign_to {
        formatter.info(&format!("  Assigned to: {assignee}"));
    }
}
