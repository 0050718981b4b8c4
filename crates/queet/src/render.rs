//! Plain-text output for the terminal

use chrono::{DateTime, Local};
use queet_api::{Achievement, LocalSettings, LocalUser, ProgressData, Trigger};
use queet_core::{HistoryReport, Notice, NoticeLevel};
use queet_store::{StorageStats, ValidationReport};
use queet_util::format_datetime_full;

pub fn notices(notices: &[Notice]) {
    for notice in notices {
        match notice.level {
            NoticeLevel::Success => println!("✓ {}", notice),
            NoticeLevel::Warning => eprintln!("! {}", notice),
            NoticeLevel::Error => eprintln!("✗ {}", notice),
        }
    }
}

pub fn status(progress: &ProgressData, now: DateTime<Local>) {
    println!("Current streak:  {} days", progress.current_streak);
    println!("Longest streak:  {} days", progress.longest_streak);
    println!("Total days:      {}", progress.total_days);
    println!("Hits today:      {}", progress.hits_today(now));
    println!("Total hits:      {}", progress.smoking_hits);
    println!(
        "Purchases:       {} ({:.2} spent)",
        progress.weed_purchases, progress.total_money_spent
    );
    println!("Triggers:        {}", progress.triggers.len());
    println!("Achievements:    {}", progress.achievements.len());
    println!("Since:           {}", format_datetime_full(&progress.start_date));
    println!("Last relapse:    {}", format_datetime_full(&progress.last_reset_date));
}

pub fn triggers(triggers: &[Trigger]) {
    if triggers.is_empty() {
        println!("No triggers logged");
        return;
    }

    for t in triggers {
        println!(
            "{}  {}  {:<9} {:>2}/10  {}{}",
            t.id,
            format_datetime_full(&t.date),
            t.kind.as_str(),
            t.intensity,
            t.notes,
            if t.handled { " (handled)" } else { "" }
        );
    }
}

pub fn achievements(achievements: &[Achievement]) {
    if achievements.is_empty() {
        println!("No achievements yet");
        return;
    }

    for a in achievements {
        println!(
            "{}  {}: {}",
            format_datetime_full(&a.date),
            a.title,
            a.description
        );
    }
}

pub fn report(report: &HistoryReport) {
    let peak = report.days.iter().map(|d| d.hits).max().unwrap_or(0).max(1);
    for day in &report.days {
        let width = (day.hits * 30).div_ceil(peak) as usize;
        println!("{}  {:>3}  {}", day.date, day.hits, "#".repeat(width));
    }

    println!();
    println!("Total hits:      {}", report.total_hits);
    println!(
        "Days with hits:  {} of {}",
        report.days_with_hits,
        report.days.len()
    );
    println!("Average per day: {:.2}", report.average_per_day);
    if let Some(worst) = report.worst_day {
        println!("Worst day:       {} ({} hits)", worst.date, worst.hits);
    }
    println!(
        "Purchases:       {} ({:.2} spent)",
        report.purchases, report.money_spent
    );
}

pub fn settings(settings: &LocalSettings, user: Option<&LocalUser>) {
    match user {
        Some(user) => println!("Profile:         {} ({})", user.email, user.id),
        None => println!("Profile:         not signed in"),
    }
    println!("Language:        {}", settings.language);
    println!("Notifications:   {}", on_off(settings.notifications));
    println!("Dark mode:       {}", on_off(settings.dark_mode));
}

pub fn validation(report: &ValidationReport, stats: &StorageStats, integrity: bool) {
    if report.is_valid() {
        println!("No problems found");
    } else {
        for issue in &report.issues {
            println!("- {}", issue);
        }
    }

    println!();
    println!("Integrity check: {}", if integrity { "ok" } else { "failed" });
    println!(
        "Stored:          progress {}, user {}, settings {}",
        yes_no(stats.has_progress),
        yes_no(stats.has_user),
        yes_no(stats.has_settings)
    );
    println!(
        "Size:            {} bytes ({} for progress)",
        stats.total_size, stats.progress_size
    );
}

fn on_off(value: bool) -> &'static str {
    if value { "on" } else { "off" }
}

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}
