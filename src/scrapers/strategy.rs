//! Ordered extraction strategies over a page snapshot.
//!
//! Each strategy is a pure `PageModel -> Option<Vec<RawRecord>>`; a site lists
//! its strategies in priority order and the first non-empty result wins.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use scraper::ElementRef;
use tracing::debug;

use crate::scrapers::page::{element_text, probe_text, probe_text_where, selector, PageModel};
use crate::scrapers::plan_table::PlanCodeTable;
use crate::scrapers::types::{fragment_or_fallback, FieldKind, RawRecord};

static RE_LISTING_SIGNAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bbed|\bbath|sq\.?\s*ft|sqft").expect("invalid regex: listing signal")
});

static RE_PLAN_PRICE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(?P<code>[A-Z]{1,2}\d{1,2}[A-Z]?)\b\s*[-:–]?\s*(?:[Ff]rom\s+|[Ss]tarting\s+at\s+)?(?P<price>\$\s?\d[\d,]*(?:\s*[-–]\s*\$?\s?\d[\d,]*)?)",
    )
    .expect("invalid regex: plan code price")
});

static RE_LISTING_BLOB: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(\$[\d,]+).*?(\d+)\s*bed.*?(\d+(?:\.\d+)?)\s*bath.*?(\d+(?:,\d+)*)\s*(?:sq\s*ft|sqft)",
    )
    .expect("invalid regex: listing blob")
});

/// Upper bound on text scanned after a plan code for its bed/bath/size details
const PLAN_WINDOW_CHARS: usize = 240;

/// Selector lists for repeating floor plan cards
#[derive(Debug, Clone)]
pub struct CardLayout {
    pub containers: &'static [&'static str],
    pub name: &'static [&'static str],
    pub price: &'static [&'static str],
    pub bedrooms: &'static [&'static str],
    pub bathrooms: &'static [&'static str],
    pub square_footage: &'static [&'static str],
    pub availability: &'static [&'static str],
    pub amenities: &'static [&'static str],
    /// Used as "<prefix> <n>" for cards without a readable name
    pub name_prefix: &'static str,
}

#[derive(Debug, Clone)]
pub enum Strategy {
    /// Repeating card elements with nested field selectors
    StructuredCards(CardLayout),
    /// Generic containers whose text looks like a listing
    LooseCards {
        containers: &'static [&'static str],
        name_prefix: &'static str,
    },
    /// Plan code followed by a price, anywhere in the page text
    PlanCodeBlob { table: Arc<PlanCodeTable> },
    /// "price … bed … bath … sqft" sequences in the page text
    ListingBlob { name_prefix: &'static str },
}

impl Strategy {
    pub fn label(&self) -> &'static str {
        match self {
            Strategy::StructuredCards(_) => "structured cards",
            Strategy::LooseCards { .. } => "loose cards",
            Strategy::PlanCodeBlob { .. } => "plan-code text",
            Strategy::ListingBlob { .. } => "listing text",
        }
    }

    pub fn apply(&self, page: &PageModel) -> Option<Vec<RawRecord>> {
        let records = match self {
            Strategy::StructuredCards(layout) => structured_cards(page, layout),
            Strategy::LooseCards {
                containers,
                name_prefix,
            } => loose_cards(page, containers, name_prefix),
            Strategy::PlanCodeBlob { table } => plan_code_blob(&page.text(), table),
            Strategy::ListingBlob { name_prefix } => listing_blob(&page.text(), name_prefix),
        };
        (!records.is_empty()).then_some(records)
    }
}

/// First strategy with a non-empty result, with its label
pub fn run_strategies(strategies: &[Strategy], page: &PageModel) -> Option<(&'static str, Vec<RawRecord>)> {
    strategies.iter().find_map(|strategy| {
        let records = strategy.apply(page);
        debug!(
            "Strategy '{}' found {} records",
            strategy.label(),
            records.as_ref().map_or(0, Vec::len)
        );
        records.map(|records| (strategy.label(), records))
    })
}

fn structured_cards(page: &PageModel, layout: &CardLayout) -> Vec<RawRecord> {
    let Some((container, cards)) = layout.containers.iter().find_map(|css| {
        let cards = page.query(css);
        (!cards.is_empty()).then_some((*css, cards))
    }) else {
        return Vec::new();
    };

    debug!("Found {} cards with selector '{}'", cards.len(), container);

    cards
        .into_iter()
        .enumerate()
        .filter_map(|(idx, card)| read_card(card, layout, idx))
        .collect()
}

fn read_card(card: ElementRef<'_>, layout: &CardLayout, idx: usize) -> Option<RawRecord> {
    let full_text = element_text(card);

    let name = probe_text(card, layout.name)
        .map(|text| text.split_whitespace().collect::<Vec<_>>().join(" "))
        .unwrap_or_else(|| format!("{} {}", layout.name_prefix, idx + 1));

    let record = RawRecord {
        name,
        price_text: fragment_or_fallback(
            probe_text_where(card, layout.price, |text| text.contains('$')),
            &full_text,
            FieldKind::Price,
        ),
        bedroom_text: fragment_or_fallback(probe_text(card, layout.bedrooms), &full_text, FieldKind::Bedrooms),
        bathroom_text: fragment_or_fallback(probe_text(card, layout.bathrooms), &full_text, FieldKind::Bathrooms),
        sqft_text: fragment_or_fallback(
            probe_text(card, layout.square_footage),
            &full_text,
            FieldKind::SquareFootage,
        ),
        availability_text: probe_text(card, layout.availability).unwrap_or_else(|| "Available".to_string()),
        amenities: card_amenities(card, layout.amenities),
        defaults: None,
    };

    record.has_signal().then_some(record)
}

fn card_amenities(card: ElementRef<'_>, selectors: &[&str]) -> Vec<String> {
    selectors
        .iter()
        .filter_map(|css| selector(css))
        .flat_map(|sel| card.select(&sel).map(element_text).collect::<Vec<_>>())
        .filter(|text| {
            let len = text.chars().count();
            len > 2 && len < 50 && !text.contains('$')
        })
        .collect()
}

fn loose_cards(page: &PageModel, containers: &[&str], name_prefix: &str) -> Vec<RawRecord> {
    containers
        .iter()
        .flat_map(|css| page.query(css))
        .map(element_text)
        .filter(|text| text.contains('$') && RE_LISTING_SIGNAL.is_match(text))
        .enumerate()
        .map(|(idx, text)| {
            let mut record = RawRecord::from_text(&text, &format!("{} {}", name_prefix, idx + 1));
            record.availability_text = "Available".to_string();
            record
        })
        .filter(RawRecord::has_signal)
        .collect()
}

/// One record per "plan code + price" token, details read up to the next token
pub fn plan_code_blob(text: &str, table: &PlanCodeTable) -> Vec<RawRecord> {
    let matches: Vec<_> = RE_PLAN_PRICE.captures_iter(text).collect();

    matches
        .iter()
        .enumerate()
        .filter_map(|(idx, caps)| {
            let whole = caps.get(0)?;
            let code = caps.name("code")?.as_str();
            let price = caps.name("price")?.as_str();

            let window_end = matches
                .get(idx + 1)
                .and_then(|next| next.get(0))
                .map_or(text.len(), |next| next.start());
            let window = clip(&text[whole.end()..window_end], PLAN_WINDOW_CHARS);
            let details = RawRecord::from_text(window, code);

            Some(RawRecord {
                name: code.to_string(),
                price_text: price.to_string(),
                bedroom_text: details.bedroom_text,
                bathroom_text: details.bathroom_text,
                sqft_text: details.sqft_text,
                availability_text: "Available".to_string(),
                amenities: Vec::new(),
                defaults: table.lookup(code),
            })
        })
        .collect()
}

pub fn listing_blob(text: &str, name_prefix: &str) -> Vec<RawRecord> {
    RE_LISTING_BLOB
        .captures_iter(text)
        .enumerate()
        .map(|(idx, caps)| RawRecord {
            name: format!("{} {}", name_prefix, idx + 1),
            price_text: caps[1].to_string(),
            bedroom_text: format!("{} bed", &caps[2]),
            bathroom_text: format!("{} bath", &caps[3]),
            sqft_text: format!("{} sq ft", &caps[4]),
            availability_text: "Available".to_string(),
            ..Default::default()
        })
        .collect()
}

fn clip(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}
