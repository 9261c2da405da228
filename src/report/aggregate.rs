//! Pure aggregation over collected floor plans.
//!
//! A price, size or price-per-sqft of 0 means "not found on the page", so
//! only positive values take part in ranges, averages and best-of picks.

use chrono::NaiveDate;
use indexmap::IndexMap;

use crate::models::{
    BedroomDistribution, DailyReport, FloorPlan, HistoryPoint, MarketSummary, PriceRange, PropertySummary,
    ScrapingResult,
};
use crate::parsing::round_cents;

pub fn create_property_summary(property_name: &str, floor_plans: &[FloorPlan]) -> PropertySummary {
    let mut bedroom_distribution = BedroomDistribution::default();
    for plan in floor_plans {
        bedroom_distribution.record(plan.bedrooms);
    }

    PropertySummary {
        property_name: property_name.to_string(),
        total_floor_plans: floor_plans.len(),
        price_range: positive_range(floor_plans.iter().map(|p| p.price)),
        avg_price_per_sq_ft: positive_mean(floor_plans.iter().map(|p| p.price_per_sq_ft)),
        bedroom_distribution,
        available_units: floor_plans.iter().filter(|p| p.is_available()).count(),
    }
}

/// Floor plans grouped by property name, in first-seen order
pub fn group_by_property(floor_plans: &[FloorPlan]) -> IndexMap<&str, Vec<FloorPlan>> {
    let mut groups: IndexMap<&str, Vec<FloorPlan>> = IndexMap::new();
    for plan in floor_plans {
        groups.entry(plan.property_name.as_str()).or_default().push(plan.clone());
    }
    groups
}

pub fn summarize_properties(floor_plans: &[FloorPlan]) -> Vec<PropertySummary> {
    group_by_property(floor_plans)
        .iter()
        .map(|(name, plans)| create_property_summary(name, plans))
        .collect()
}

pub fn create_market_summary(summaries: &[PropertySummary], floor_plans: &[FloorPlan]) -> MarketSummary {
    MarketSummary {
        total_properties: summaries.len(),
        total_floor_plans: floor_plans.len(),
        available_units: floor_plans.iter().filter(|p| p.is_available()).count(),
        overall_price_range: positive_range(floor_plans.iter().map(|p| p.price)),
        average_price: positive_mean(floor_plans.iter().map(|p| p.price)),
        average_price_per_sq_ft: positive_mean(floor_plans.iter().map(|p| p.price_per_sq_ft)),
        cheapest: first_best(floor_plans, |p| p.price, |candidate, best| candidate < best),
        most_expensive: first_best(floor_plans, |p| p.price, |candidate, best| candidate > best),
        best_value: first_best(floor_plans, |p| p.price_per_sq_ft, |candidate, best| candidate < best),
    }
}

pub fn create_daily_report(
    date: NaiveDate,
    property_summaries: Vec<PropertySummary>,
    floor_plans: Vec<FloorPlan>,
) -> DailyReport {
    let market = create_market_summary(&property_summaries, &floor_plans);
    DailyReport {
        date,
        property_summaries,
        floor_plans,
        market,
        scraping_results: Vec::new(),
    }
}

/// Daily report for one run, carrying the per-site outcomes
pub fn build_daily_report(
    date: NaiveDate,
    floor_plans: Vec<FloorPlan>,
    scraping_results: Vec<ScrapingResult>,
) -> DailyReport {
    let summaries = summarize_properties(&floor_plans);
    DailyReport {
        scraping_results,
        ..create_daily_report(date, summaries, floor_plans)
    }
}

/// One day's figures for a property; `None` when it had no floor plans that day
pub fn history_point(date: NaiveDate, floor_plans: &[FloorPlan], property_name: &str) -> Option<HistoryPoint> {
    let plans: Vec<&FloorPlan> = floor_plans
        .iter()
        .filter(|p| p.property_name == property_name)
        .collect();
    if plans.is_empty() {
        return None;
    }

    let range = positive_range(plans.iter().map(|p| p.price));
    Some(HistoryPoint {
        date,
        property_name: property_name.to_string(),
        unit_count: plans.len(),
        avg_price: positive_mean(plans.iter().map(|p| p.price)),
        avg_price_per_sq_ft: positive_mean(plans.iter().map(|p| p.price_per_sq_ft)),
        min_price: range.min,
        max_price: range.max,
    })
}

/// Mean of the positive values, rounded to cents; 0 when there are none
pub fn positive_mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values
        .filter(|v| *v > 0.0)
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        0.0
    } else {
        round_cents(sum / count as f64)
    }
}

fn positive_range(values: impl Iterator<Item = f64>) -> PriceRange {
    values
        .filter(|v| *v > 0.0)
        .fold(None, |range: Option<PriceRange>, v| {
            Some(match range {
                Some(r) => PriceRange {
                    min: r.min.min(v),
                    max: r.max.max(v),
                },
                None => PriceRange { min: v, max: v },
            })
        })
        .unwrap_or_default()
}

fn first_best(
    floor_plans: &[FloorPlan],
    key: impl Fn(&FloorPlan) -> f64,
    better: impl Fn(f64, f64) -> bool,
) -> Option<FloorPlan> {
    let mut best: Option<&FloorPlan> = None;
    for plan in floor_plans.iter().filter(|p| key(p) > 0.0) {
        match best {
            Some(current) if !better(key(plan), key(current)) => {}
            _ => best = Some(plan),
        }
    }
    best.cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UnitType;
    use proptest::prelude::*;

    fn plan(property: &str, name: &str, price: f64, bedrooms: u32, sqft: u32) -> FloorPlan {
        FloorPlan {
            name: name.to_string(),
            price,
            price_range: None,
            bedrooms,
            bathrooms: 1.0,
            square_footage: sqft,
            price_per_sq_ft: crate::parsing::calculate_price_per_sqft(price, sqft),
            amenities: vec![],
            availability: "Available Now".to_string(),
            available: true,
            property_name: property.to_string(),
            property_url: String::new(),
            unit_type: UnitType::Apartment,
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    #[test]
    fn property_summary_ignores_missing_prices() {
        let mut unavailable = plan("Camden", "C1", 0.0, 3, 1400);
        unavailable.available = false;
        let plans = vec![
            plan("Camden", "A1", 1500.0, 1, 750),
            plan("Camden", "B1", 2100.0, 2, 1050),
            unavailable,
            plan("Camden", "S1", 1200.0, 0, 0),
        ];

        let summary = create_property_summary("Camden", &plans);
        assert_eq!(summary.total_floor_plans, 4);
        assert_eq!(summary.price_range, PriceRange { min: 1200.0, max: 2100.0 });
        assert_eq!(summary.avg_price_per_sq_ft, 2.0);
        assert_eq!(summary.available_units, 3);
        assert_eq!(summary.bedroom_distribution.studio, 1);
        assert_eq!(summary.bedroom_distribution.three_bed, 1);
    }

    #[test]
    fn properties_keep_first_seen_order() {
        let plans = vec![
            plan("Drift", "A1", 1400.0, 1, 700),
            plan("Camden", "A1", 1500.0, 1, 750),
            plan("Drift", "B1", 1900.0, 2, 1000),
        ];
        let summaries = summarize_properties(&plans);
        let names: Vec<_> = summaries.iter().map(|s| s.property_name.as_str()).collect();
        assert_eq!(names, vec!["Drift", "Camden"]);
        assert_eq!(summaries[0].total_floor_plans, 2);
    }

    #[test]
    fn market_picks_first_on_ties() {
        let plans = vec![
            plan("Drift", "A1", 1500.0, 1, 750),
            plan("Camden", "A2", 1500.0, 1, 750),
            plan("Camden", "B2", 2400.0, 2, 1000),
        ];
        let report = create_daily_report(date(), summarize_properties(&plans), plans);
        let market = &report.market;

        assert_eq!(market.total_properties, 2);
        assert_eq!(market.cheapest.as_ref().map(|p| p.property_name.as_str()), Some("Drift"));
        assert_eq!(market.best_value.as_ref().map(|p| p.name.as_str()), Some("A1"));
        assert_eq!(market.most_expensive.as_ref().map(|p| p.name.as_str()), Some("B2"));
        assert_eq!(market.average_price, 1800.0);
    }

    #[test]
    fn all_zero_prices_leave_no_candidates() {
        let plans = vec![plan("Drift", "A1", 0.0, 1, 0), plan("Drift", "B1", 0.0, 2, 0)];
        let report = create_daily_report(date(), summarize_properties(&plans), plans);

        assert_eq!(report.market.cheapest, None);
        assert_eq!(report.market.most_expensive, None);
        assert_eq!(report.market.best_value, None);
        assert_eq!(report.market.overall_price_range, PriceRange::default());
        assert_eq!(report.market.average_price, 0.0);
    }

    #[test]
    fn history_point_for_one_property() {
        let plans = vec![
            plan("Drift", "A1", 1400.0, 1, 700),
            plan("Camden", "A1", 1500.0, 1, 750),
            plan("Drift", "B1", 1900.0, 2, 950),
        ];
        let point = history_point(date(), &plans, "Drift").unwrap();
        assert_eq!(point.unit_count, 2);
        assert_eq!(point.avg_price, 1650.0);
        assert_eq!(point.avg_price_per_sq_ft, 2.0);
        assert_eq!((point.min_price, point.max_price), (1400.0, 1900.0));

        assert!(history_point(date(), &plans, "Columns").is_none());
    }

    #[test]
    fn daily_report_survives_json() {
        let plans = vec![plan("Drift", "A1", 1433.33, 1, 701), plan("Camden", "B1", 2100.0, 2, 1050)];
        let report = build_daily_report(date(), plans, vec![ScrapingResult::failed("Columns", "timeout")]);

        let json = serde_json::to_string(&report).unwrap();
        let restored: DailyReport = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, report);
    }

    fn arb_plan() -> impl Strategy<Value = FloorPlan> {
        (
            prop::sample::select(vec!["Camden", "Drift", "Columns"]),
            prop_oneof![Just(0.0), 500.0f64..10_000.0],
            0u32..6,
            prop_oneof![Just(0u32), 300u32..2500],
        )
            .prop_map(|(property, price, bedrooms, sqft)| plan(property, "Plan", price, bedrooms, sqft))
    }

    proptest! {
        #[test]
        fn price_range_is_ordered_and_drawn_from_positive_prices(
            plans in prop::collection::vec(arb_plan(), 1..40)
                .prop_filter("needs a priced plan", |plans| plans.iter().any(|p| p.price > 0.0))
        ) {
            let report = create_daily_report(date(), summarize_properties(&plans), plans.clone());
            let range = report.market.overall_price_range;

            prop_assert!(range.min <= range.max);
            prop_assert!(range.min > 0.0);
            prop_assert!(plans.iter().any(|p| p.price == range.min));
            prop_assert!(plans.iter().any(|p| p.price == range.max));

            let priced: Vec<&FloorPlan> = plans.iter().filter(|p| p.price > 0.0).collect();
            let cheapest = report.market.cheapest.clone().unwrap();
            prop_assert!(priced.iter().all(|p| cheapest.price <= p.price));
            let most_expensive = report.market.most_expensive.clone().unwrap();
            prop_assert!(priced.iter().all(|p| most_expensive.price >= p.price));

            let valued: Vec<f64> = plans.iter().map(|p| p.price_per_sq_ft).filter(|v| *v > 0.0).collect();
            match &report.market.best_value {
                Some(best) => {
                    prop_assert!(best.price_per_sq_ft > 0.0);
                    prop_assert!(valued.iter().all(|v| best.price_per_sq_ft <= *v));
                }
                None => {
                    prop_assert!(valued.is_empty());
                }
            }

            for summary in &report.property_summaries {
                let range = summary.price_range;
                prop_assert!(range.min <= range.max);

                let own: Vec<f64> = plans
                    .iter()
                    .filter(|p| p.property_name == summary.property_name && p.price > 0.0)
                    .map(|p| p.price)
                    .collect();
                if own.is_empty() {
                    prop_assert_eq!(range, PriceRange::default());
                } else {
                    prop_assert!(range.min > 0.0);
                    prop_assert!(own.contains(&range.min));
                    prop_assert!(own.contains(&range.max));
                    prop_assert!(own.iter().all(|p| range.min <= *p && *p <= range.max));
                }
            }
        }

        #[test]
        fn aggregation_is_idempotent(plans in prop::collection::vec(arb_plan(), 0..30)) {
            let first = create_daily_report(date(), summarize_properties(&plans), plans.clone());
            let second = create_daily_report(date(), summarize_properties(&plans), plans);
            prop_assert_eq!(first, second);
        }
    }
}
