use scraper::{ElementRef, Html, Selector};
use tracing::warn;

/// Parsed snapshot of a rendered page
pub struct PageModel {
    document: Html,
}

impl PageModel {
    pub fn parse(html: &str) -> Self {
        Self {
            document: Html::parse_document(html),
        }
    }

    /// Visible text of the whole page, whitespace-collapsed
    pub fn text(&self) -> String {
        element_text(self.document.root_element())
    }

    /// All elements matching a CSS selector; an invalid selector matches nothing
    pub fn query(&self, css: &str) -> Vec<ElementRef<'_>> {
        match selector(css) {
            Some(sel) => self.document.select(&sel).collect(),
            None => Vec::new(),
        }
    }

    pub fn html(&self) -> String {
        self.document.html()
    }
}

pub fn selector(css: &str) -> Option<Selector> {
    match Selector::parse(css) {
        Ok(sel) => Some(sel),
        Err(e) => {
            warn!("Invalid selector '{}': {}", css, e);
            None
        }
    }
}

/// Text of an element and its descendants, skipping script and style bodies
pub fn element_text(element: ElementRef<'_>) -> String {
    let mut parts = Vec::new();

    for node in element.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node
            .parent()
            .and_then(|parent| parent.value().as_element().map(|el| el.name().to_string()))
            .is_some_and(|name| matches!(name.as_str(), "script" | "style" | "noscript"));
        if hidden {
            continue;
        }
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            parts.push(trimmed);
        }
    }

    parts.join(" ").split_whitespace().collect::<Vec<_>>().join(" ")
}

/// First non-empty text found by trying selectors in order inside `scope`
pub fn probe_text(scope: ElementRef<'_>, selectors: &[&str]) -> Option<String> {
    probe_text_where(scope, selectors, |_| true)
}

pub fn probe_text_where<F>(scope: ElementRef<'_>, selectors: &[&str], accept: F) -> Option<String>
where
    F: Fn(&str) -> bool,
{
    selectors.iter().find_map(|css| {
        let sel = selector(css)?;
        scope
            .select(&sel)
            .map(element_text)
            .find(|text| !text.is_empty() && accept(text))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const HTML: &str = r#"
        <html><head><style>.x { color: red }</style><script>var price = "$9";</script></head>
        <body>
          <div class="card"><h3>The Birch</h3><span class="price">$1,583</span></div>
          <div class="card"><h3> </h3><span class="rent">$1,650</span></div>
        </body></html>"#;

    #[test]
    fn text_skips_scripts_and_styles() {
        let page = PageModel::parse(HTML);
        let text = page.text();
        assert!(text.contains("The Birch $1,583"));
        assert!(!text.contains("var price"));
        assert!(!text.contains("color"));
    }

    #[test]
    fn probing_tries_selectors_in_order() {
        let page = PageModel::parse(HTML);
        let cards = page.query(".card");
        assert_eq!(cards.len(), 2);

        assert_eq!(probe_text(cards[0], &[".missing", ".price"]).as_deref(), Some("$1,583"));
        assert_eq!(probe_text(cards[1], &["h3"]), None);
        assert_eq!(
            probe_text_where(cards[1], &[".price", ".rent"], |t| t.contains('$')).as_deref(),
            Some("$1,650")
        );
    }

    #[test]
    fn invalid_selector_matches_nothing() {
        let page = PageModel::parse(HTML);
        assert!(page.query("div[[").is_empty());
    }
}
