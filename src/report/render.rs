use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{DailyReport, FloorPlan, PropertySummary, ScrapingResult};
use crate::report::aggregate::{group_by_property, positive_mean};

const RULE: &str = "==================================================";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    Daily,
    Comparison,
    Bedroom,
    Availability,
}

impl ReportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportKind::Daily => "daily",
            ReportKind::Comparison => "comparison",
            ReportKind::Bedroom => "bedroom",
            ReportKind::Availability => "availability",
        }
    }
}

impl FromStr for ReportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" => Ok(ReportKind::Daily),
            "comparison" => Ok(ReportKind::Comparison),
            "bedroom" => Ok(ReportKind::Bedroom),
            "availability" => Ok(ReportKind::Availability),
            _ => Err("Invalid report type. Use: daily, comparison, bedroom, or availability".to_string()),
        }
    }
}

/// Render one report kind over a day's floor plans
pub fn render(kind: ReportKind, date: NaiveDate, floor_plans: &[FloorPlan], results: &[ScrapingResult]) -> String {
    match kind {
        ReportKind::Daily => render_executive_summary(date, floor_plans, results),
        ReportKind::Comparison => render_comparison(date, floor_plans),
        ReportKind::Bedroom => render_bedroom_analysis(date, floor_plans),
        ReportKind::Availability => render_availability(date, floor_plans),
    }
}

/// Whole dollars with thousands separators, e.g. "$1,583"
pub fn format_currency(amount: f64) -> String {
    let rounded = amount.round();
    let sign = if rounded < 0.0 { "-" } else { "" };
    format!("{}${}", sign, group_thousands(rounded.abs() as u64))
}

pub fn format_square_footage(square_footage: u32) -> String {
    format!("{} sq ft", group_thousands(u64::from(square_footage)))
}

pub fn format_bed_bath(bedrooms: u32, bathrooms: f64) -> String {
    format!("{} / {} Bath", bedroom_label(bedrooms), bathrooms)
}

fn bedroom_label(bedrooms: u32) -> String {
    if bedrooms == 0 {
        "Studio".to_string()
    } else {
        format!("{} Bed", bedrooms)
    }
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

pub fn render_floor_plan(plan: &FloorPlan) -> String {
    let mut lines = vec![
        format!("🏠 {} ({})", plan.name, plan.property_name),
        format!("   💰 Price: {}", format_currency(plan.price)),
        format!("   🛏️  Layout: {}", format_bed_bath(plan.bedrooms, plan.bathrooms)),
        format!("   📐 Size: {}", format_square_footage(plan.square_footage)),
        format!("   💵 Price/sq ft: ${:.2}/sq ft", plan.price_per_sq_ft),
        format!("   🏠 Type: {}", plan.unit_type),
        format!("   📅 Available: {}", plan.availability),
    ];

    if let Some(range) = plan.price_range {
        lines.insert(
            2,
            format!("   💲 Range: {} - {}", format_currency(range.min), format_currency(range.max)),
        );
    }

    if !plan.amenities.is_empty() {
        let shown = plan.amenities.iter().take(3).cloned().collect::<Vec<_>>().join(", ");
        let more = if plan.amenities.len() > 3 { "..." } else { "" };
        lines.push(format!("   ✨ Amenities: {}{}", shown, more));
    }

    lines.join("\n")
}

pub fn render_property_summary(summary: &PropertySummary) -> String {
    let beds = &summary.bedroom_distribution;
    [
        format!("🏢 {}", summary.property_name),
        format!("   📊 Total Floor Plans: {}", summary.total_floor_plans),
        format!(
            "   💰 Price Range: {} - {}",
            format_currency(summary.price_range.min),
            format_currency(summary.price_range.max)
        ),
        format!("   💵 Avg Price/sq ft: ${:.2}/sq ft", summary.avg_price_per_sq_ft),
        format!("   🏠 Available Units: {}", summary.available_units),
        String::new(),
        "   🛏️  Bedroom Distribution:".to_string(),
        format!("      Studio: {}", beds.studio),
        format!("      1 Bed: {}", beds.one_bed),
        format!("      2 Bed: {}", beds.two_bed),
        format!("      3 Bed: {}", beds.three_bed),
        format!("      4+ Bed: {}", beds.four_plus_bed),
    ]
    .join("\n")
}

/// Every floor plan, grouped by property, cheapest first within each property
pub fn render_detailed_listing(floor_plans: &[FloorPlan]) -> String {
    if floor_plans.is_empty() {
        return "❌ No floor plans found.".to_string();
    }

    let mut out = String::from("📋 DETAILED LISTING\n");
    out.push_str(RULE);

    for (property, mut plans) in group_by_property(floor_plans) {
        plans.sort_by(|a, b| a.price.total_cmp(&b.price));
        let _ = write!(out, "\n\n🏢 {} ({} floor plans)", property, plans.len());
        for plan in &plans {
            out.push_str("\n\n");
            out.push_str(&render_floor_plan(plan));
        }
    }

    out
}

/// Day-level overview of one report
pub fn render_daily_report(report: &DailyReport) -> String {
    let market = &report.market;
    if report.floor_plans.is_empty() {
        return "❌ No floor plans found today.".to_string();
    }
    if market.average_price <= 0.0 {
        return "❌ No valid pricing data found.".to_string();
    }

    let mut lines = vec![
        "📊 DAILY SUMMARY".to_string(),
        RULE.to_string(),
        format!("📅 Date: {}", report.date),
        format!("🏢 Properties Scraped: {}", market.total_properties),
        format!("📋 Total Floor Plans: {}", market.total_floor_plans),
        format!(
            "💰 Price Range: {} - {}",
            format_currency(market.overall_price_range.min),
            format_currency(market.overall_price_range.max)
        ),
        format!("💵 Average Price: {}", format_currency(market.average_price)),
        format!("📐 Avg Price/sq ft: ${:.2}", market.average_price_per_sq_ft),
        String::new(),
        "🏠 Properties:".to_string(),
    ];

    for summary in &report.property_summaries {
        lines.push(format!("   • {}: {} floor plans", summary.property_name, summary.total_floor_plans));
    }

    lines.push(String::new());
    lines.push("🛏️  Floor Plan Types:".to_string());
    for (bedrooms, count) in bedroom_counts(&report.floor_plans) {
        lines.push(format!("   • {}: {}", bedroom_label(bedrooms), count));
    }

    let highlights = [
        ("💸 Cheapest", &market.cheapest),
        ("💎 Most Expensive", &market.most_expensive),
        ("🏆 Best Value", &market.best_value),
    ];
    if highlights.iter().any(|(_, plan)| plan.is_some()) {
        lines.push(String::new());
        for (label, plan) in highlights {
            if let Some(plan) = plan {
                lines.push(format!(
                    "{}: {} ({}) - {} | ${:.2}/sq ft",
                    label,
                    plan.name,
                    plan.property_name,
                    format_currency(plan.price),
                    plan.price_per_sq_ft
                ));
            }
        }
    }

    lines.join("\n")
}

fn bedroom_counts(floor_plans: &[FloorPlan]) -> BTreeMap<u32, usize> {
    let mut counts = BTreeMap::new();
    for plan in floor_plans {
        *counts.entry(plan.bedrooms).or_insert(0) += 1;
    }
    counts
}

/// Properties ranked by average price and by average price per sq ft, plus the best value per bedroom count
pub fn render_comparison(date: NaiveDate, floor_plans: &[FloorPlan]) -> String {
    if floor_plans.is_empty() {
        return "❌ No floor plans available for comparison.".to_string();
    }

    let groups = group_by_property(floor_plans);
    let mut lines = vec![
        "🏢 PROPERTY COMPARISON REPORT".to_string(),
        RULE.to_string(),
        format!("📅 Date: {}", date),
        format!("🏢 Properties: {}", groups.len()),
        format!("📋 Total Floor Plans: {}", floor_plans.len()),
        String::new(),
    ];

    let mut by_sqft: Vec<(&str, f64)> = groups
        .iter()
        .map(|(name, plans)| (*name, positive_mean(plans.iter().map(|p| p.price_per_sq_ft))))
        .filter(|(_, avg)| *avg > 0.0)
        .collect();
    by_sqft.sort_by(|a, b| a.1.total_cmp(&b.1));

    lines.push("📐 Properties by Price per Sq Ft:".to_string());
    for (rank, (name, avg)) in by_sqft.iter().enumerate() {
        lines.push(format!("  {}. {}: ${:.2}/sq ft", rank + 1, name, avg));
    }
    lines.push(String::new());

    let mut by_price: Vec<(&str, f64, usize)> = groups
        .iter()
        .map(|(name, plans)| (*name, positive_mean(plans.iter().map(|p| p.price)), plans.len()))
        .filter(|(_, avg, _)| *avg > 0.0)
        .collect();
    by_price.sort_by(|a, b| a.1.total_cmp(&b.1));

    lines.push("💰 Properties by Average Price:".to_string());
    for (rank, (name, avg, count)) in by_price.iter().enumerate() {
        lines.push(format!("  {}. {}: {} (avg, {} units)", rank + 1, name, format_currency(*avg), count));
    }
    lines.push(String::new());

    for bedrooms in 0..=3 {
        let best = floor_plans
            .iter()
            .filter(|p| p.bedrooms == bedrooms && p.price_per_sq_ft > 0.0)
            .fold(None, |best: Option<&FloorPlan>, p| match best {
                Some(b) if b.price_per_sq_ft <= p.price_per_sq_ft => Some(b),
                _ => Some(p),
            });
        if let Some(best) = best {
            let label = if bedrooms == 0 {
                "Studio".to_string()
            } else {
                format!("{} Bedroom", bedrooms)
            };
            lines.push(format!("🏆 Best {} Value:", label));
            lines.push(format!("   {} ({})", best.name, best.property_name));
            lines.push(format!(
                "   💰 {} | ${:.2}/sq ft",
                format_currency(best.price),
                best.price_per_sq_ft
            ));
            lines.push(String::new());
        }
    }

    lines.join("\n").trim_end().to_string()
}

/// Top five by price per sq ft, cheapest and largest, optionally for one bedroom count
pub fn render_value_ranking(floor_plans: &[FloorPlan], bedrooms: Option<u32>) -> String {
    let title = match bedrooms {
        Some(0) => "🔍 Studio Comparison".to_string(),
        Some(n) => format!("🔍 {} Bedroom Comparison", n),
        None => "🔍 All Floor Plans Comparison".to_string(),
    };
    let plans: Vec<&FloorPlan> = floor_plans
        .iter()
        .filter(|p| bedrooms.map_or(true, |n| p.bedrooms == n))
        .collect();
    if plans.is_empty() {
        return format!("{}\n❌ No matching floor plans found.", title);
    }

    let mut ranked = plans.clone();
    // Unknown price per sq ft sorts last
    ranked.sort_by(|a, b| sort_key(a.price_per_sq_ft).total_cmp(&sort_key(b.price_per_sq_ft)));

    let mut lines = vec![title, RULE.to_string(), String::new(), "💡 Best Value (by price per sq ft):".to_string()];
    for (rank, plan) in ranked.iter().take(5).enumerate() {
        lines.push(format!("{}. {} ({})", rank + 1, plan.name, plan.property_name));
        lines.push(format!(
            "   💰 {} | ${:.2}/sq ft | {}",
            format_currency(plan.price),
            plan.price_per_sq_ft,
            format_square_footage(plan.square_footage)
        ));
        lines.push(String::new());
    }

    if let Some(cheapest) = plans.iter().filter(|p| p.price > 0.0).min_by(|a, b| a.price.total_cmp(&b.price)) {
        lines.push("💸 Cheapest Option:".to_string());
        lines.push(format!("   {} ({})", cheapest.name, cheapest.property_name));
        lines.push(format!("   💰 {}", format_currency(cheapest.price)));
        lines.push(String::new());
    }

    // max_by_key keeps the last maximum; reverse so the first listed wins
    if let Some(largest) = plans.iter().rev().max_by_key(|p| p.square_footage) {
        lines.push("📐 Largest Space:".to_string());
        lines.push(format!("   {} ({})", largest.name, largest.property_name));
        lines.push(format!(
            "   📐 {} | 💰 {}",
            format_square_footage(largest.square_footage),
            format_currency(largest.price)
        ));
    }

    lines.join("\n").trim_end().to_string()
}

fn sort_key(value: f64) -> f64 {
    if value > 0.0 {
        value
    } else {
        f64::INFINITY
    }
}

/// Price and size statistics per bedroom count
pub fn render_bedroom_analysis(date: NaiveDate, floor_plans: &[FloorPlan]) -> String {
    if floor_plans.is_empty() {
        return "❌ No floor plans available for analysis.".to_string();
    }

    let mut groups: BTreeMap<u32, Vec<&FloorPlan>> = BTreeMap::new();
    for plan in floor_plans {
        groups.entry(plan.bedrooms).or_default().push(plan);
    }

    let mut lines = vec![
        "🛏️ BEDROOM ANALYSIS REPORT".to_string(),
        RULE.to_string(),
        format!("📅 Date: {}", date),
        format!("📋 Total Floor Plans: {}", floor_plans.len()),
        String::new(),
    ];

    for (bedrooms, plans) in groups {
        let prices: Vec<f64> = plans.iter().map(|p| p.price).filter(|p| *p > 0.0).collect();
        if prices.is_empty() {
            continue;
        }
        let min = prices.iter().copied().fold(f64::INFINITY, f64::min);
        let max = prices.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let avg_size = positive_mean(plans.iter().map(|p| f64::from(p.square_footage)));

        let available = plans.iter().filter(|p| p.is_available()).count();
        lines.push(format!(
            "🏠 {} Units ({} floor plans, {} available)",
            bedroom_label(bedrooms),
            plans.len(),
            available
        ));
        lines.push(format!("   💰 Price Range: {} - {}", format_currency(min), format_currency(max)));
        lines.push(format!(
            "   💵 Average Price: {}",
            format_currency(positive_mean(prices.iter().copied()))
        ));
        lines.push(format!("   📐 Average Size: {}", format_square_footage(avg_size as u32)));
        lines.push(format!(
            "   💲 Avg Price/Sq Ft: ${:.2}",
            positive_mean(plans.iter().map(|p| p.price_per_sq_ft))
        ));
        if let Some(best) = plans
            .iter()
            .filter(|p| p.price_per_sq_ft > 0.0)
            .min_by(|a, b| a.price_per_sq_ft.total_cmp(&b.price_per_sq_ft))
        {
            lines.push(format!(
                "   🏆 Best Value: {} ({}) - ${:.2}/sq ft",
                best.name, best.property_name, best.price_per_sq_ft
            ));
        }
        lines.push(String::new());
    }

    lines.join("\n").trim_end().to_string()
}

/// Availability status counts, overall, per property and per bedroom count
pub fn render_availability(date: NaiveDate, floor_plans: &[FloorPlan]) -> String {
    if floor_plans.is_empty() {
        return "❌ No floor plans available for availability analysis.".to_string();
    }

    let total = floor_plans.len();
    let mut by_status: BTreeMap<&str, usize> = BTreeMap::new();
    for plan in floor_plans {
        *by_status.entry(plan.availability.as_str()).or_insert(0) += 1;
    }

    let mut lines = vec![
        "📅 AVAILABILITY REPORT".to_string(),
        RULE.to_string(),
        format!("📅 Date: {}", date),
        format!("📋 Total Floor Plans: {}", total),
        String::new(),
        "📊 Overall Availability:".to_string(),
    ];
    for (status, count) in &by_status {
        lines.push(format!("   • {}: {} units ({:.1}%)", status, count, percent(*count, total)));
    }

    lines.push(String::new());
    lines.push("🏢 Availability by Property:".to_string());
    for (property, plans) in group_by_property(floor_plans) {
        let available = plans.iter().filter(|p| p.is_available()).count();
        lines.push(format!(
            "   • {}: {}/{} available ({:.1}%)",
            property,
            available,
            plans.len(),
            percent(available, plans.len())
        ));
    }

    lines.push(String::new());
    lines.push("🛏️ Available Units by Type:".to_string());
    let available: Vec<FloorPlan> = floor_plans.iter().filter(|p| p.is_available()).cloned().collect();
    for (bedrooms, count) in bedroom_counts(&available) {
        lines.push(format!("   • {}: {} available", bedroom_label(bedrooms), count));
    }

    lines.join("\n")
}

/// Short overview including how many sites scraped successfully
pub fn render_executive_summary(date: NaiveDate, floor_plans: &[FloorPlan], results: &[ScrapingResult]) -> String {
    if floor_plans.is_empty() {
        return "❌ No data available for executive summary.".to_string();
    }

    let total = floor_plans.len();
    let properties = group_by_property(floor_plans).len();
    let available = floor_plans.iter().filter(|p| p.is_available()).count();
    let succeeded = results.iter().filter(|r| r.success).count();
    let prices: Vec<f64> = floor_plans.iter().map(|p| p.price).filter(|p| *p > 0.0).collect();
    let min = prices.iter().copied().reduce(f64::min).unwrap_or(0.0);
    let max = prices.iter().copied().reduce(f64::max).unwrap_or(0.0);

    [
        "📋 EXECUTIVE SUMMARY".to_string(),
        "=".repeat(30),
        format!("📅 {}", date),
        String::new(),
        "🎯 Key Metrics:".to_string(),
        format!("   • Properties Monitored: {}", properties),
        format!("   • Total Units Found: {}", total),
        format!("   • Available Units: {} ({:.1}%)", available, percent(available, total)),
        format!("   • Scraping Success Rate: {:.1}%", percent(succeeded, results.len())),
        String::new(),
        "💰 Pricing Overview:".to_string(),
        format!("   • Price Range: {} - {}", format_currency(min), format_currency(max)),
        format!("   • Average Price: {}", format_currency(positive_mean(prices.into_iter()))),
        format!(
            "   • Avg Price/Sq Ft: ${:.2}",
            positive_mean(floor_plans.iter().map(|p| p.price_per_sq_ft))
        ),
    ]
    .join("\n")
}

/// Numbered list of every site error in a run
pub fn render_errors(results: &[ScrapingResult]) -> String {
    let errors: Vec<&String> = results.iter().flat_map(|r| r.errors.iter()).collect();
    if errors.is_empty() {
        return "✅ No errors encountered during scraping.".to_string();
    }

    let mut lines = vec!["❌ SCRAPING ERRORS".to_string(), RULE.to_string(), String::new()];
    for (idx, error) in errors.iter().enumerate() {
        lines.push(format!("{}. {}", idx + 1, error));
    }
    lines.join("\n")
}
