//! Terminal rendering of a [`RenderModel`]

use colored::Colorize;

use crate::app::{NoticeLevel, RenderModel, Section};

/// Print the notices of the last event
pub fn print_notices(model: &RenderModel) {
    for notice in &model.notices {
        match notice.level {
            NoticeLevel::Success => println!("{} {}", "✓".bright_green(), notice.message),
            NoticeLevel::Warning => println!("{} {}", "!".yellow(), notice.message.yellow()),
            NoticeLevel::Error => println!("{} {}", "✗".red(), notice.message.red()),
        }
    }
}

/// Print the company digest, if one is available
pub fn print_digest(model: &RenderModel) {
    if let Some(digest) = &model.digest {
        println!();
        println!("{}", "Company".bright_cyan().bold());
        println!("{}", digest);
    }
}

/// Print the posts analysis, if one is cached
pub fn print_analysis(model: &RenderModel) {
    if let Some(section) = &model.analysis {
        print_section("Posts analysis", section);
    }
}

/// Print the example post, if one is cached
pub fn print_example(model: &RenderModel) {
    if let Some(section) = &model.example {
        print_section("Example post", section);
    }
}

/// Print everything the model holds
pub fn print_model(model: &RenderModel) {
    print_notices(model);
    if let Some(url) = &model.company_url {
        println!("{} {}", "Company URL:".dimmed(), url);
    }
    println!("{} {}", "State:".dimmed(), model.state);
    println!(
        "{} {}",
        "Session started:".dimmed(),
        model.session_started_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    print_digest(model);
    print_analysis(model);
    print_example(model);
    println!();
}

fn print_section(title: &str, section: &Section) {
    println!();
    let stamp = format!("({})", section.stored_at.format("%H:%M:%S UTC")).dimmed();
    if section.stale {
        println!(
            "{} {} {}",
            title.bright_cyan().bold(),
            stamp,
            "(from previously fetched posts)".yellow()
        );
    } else {
        println!("{} {}", title.bright_cyan().bold(), stamp);
    }
    println!("{}", section.text);
}
