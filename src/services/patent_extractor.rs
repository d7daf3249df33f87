use regex::Regex;
use scraper::{ElementRef, Selector};

use crate::domain::Patent;

use super::text_clean::{clean_organization, clean_patent_title, collapse_whitespace, dedup_values};

const SITE_ROOT: &str = "https://ised-isde.canada.ca";

/// A container whose text matches any of these is navigation, chrome or
/// empty-result boilerplate, never a listing entry.
pub const SKIP_INDICATORS: [&str; 7] = [
    "Searching...",
    "Keyword search",
    "Save your search",
    "Collaboration Opportunities",
    "Licensing Opportunity",
    "Your search found no results",
    "Please note that ExploreIP",
];

/// Lines shorter than this never qualify as a fallback title.
const MIN_TITLE_LINE_LEN: usize = 10;

/// One step of a field's extraction cascade: structural selectors are
/// tried in order, then textual patterns over the container's full text.
enum Strategy {
    Css(Selector),
    Pattern(Regex),
}

impl Strategy {
    fn css(selector: &str) -> Self {
        Strategy::Css(Selector::parse(selector).unwrap())
    }

    fn pattern(re: &str) -> Self {
        Strategy::Pattern(Regex::new(re).unwrap())
    }

    fn apply(&self, item: ElementRef, full_text: &str) -> Option<String> {
        match self {
            Strategy::Css(selector) => item
                .select(selector)
                .next()
                .map(|el| collapse_whitespace(&el.text().collect::<Vec<_>>().join(" ")))
                .filter(|text| !text.is_empty()),
            Strategy::Pattern(re) => re
                .captures(full_text)
                .map(|caps| {
                    let m = caps.get(1).unwrap_or_else(|| caps.get(0).unwrap());
                    collapse_whitespace(m.as_str())
                })
                .filter(|text| !text.is_empty()),
        }
    }
}

fn apply_cascade(strategies: &[Strategy], item: ElementRef, full_text: &str) -> String {
    strategies
        .iter()
        .find_map(|strategy| strategy.apply(item, full_text))
        .unwrap_or_default()
}

/// Extracts one candidate record from one rendered container. Field
/// failures degrade to empty values; only the skip rule and the
/// minimal-completeness rule discard a container outright.
pub struct PatentExtractor {
    title: Vec<Strategy>,
    patent_number: Vec<Strategy>,
    organization: Vec<Strategy>,
    patent_type: Vec<Strategy>,
    year: Vec<Strategy>,
    date_added: Vec<Strategy>,
    description: Vec<Strategy>,
    url_selector: Selector,
    cited_selector: Selector,
    family_selector: Selector,
    classification_selector: Selector,
    patent_id_re: Regex,
    ipc_code_re: Regex,
    keywords_re: Regex,
}

impl Default for PatentExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl PatentExtractor {
    pub fn new() -> Self {
        PatentExtractor {
            title: vec![Strategy::css(".result-title")],
            patent_number: vec![
                Strategy::css(".publication-number"),
                Strategy::pattern(r"\b(?:CA|US|WO|EP)\s?\d{6,}[A-Z]?\d*\b"),
            ],
            organization: vec![
                Strategy::css(".organisation a"),
                Strategy::css(".organisation"),
                Strategy::pattern(r"(?i)Organi[sz]ation[:\s]+([^\n]+)"),
            ],
            patent_type: vec![
                Strategy::css(".ip-type span"),
                Strategy::css(".ip-type"),
                Strategy::pattern(r"(?i)\b(patent|trade-?mark|industrial design|copyright)\b"),
            ],
            year: vec![
                Strategy::css(".filed"),
                Strategy::pattern(r"\b(?:19|20)\d{2}\b"),
            ],
            date_added: vec![
                Strategy::css(".date-added"),
                Strategy::pattern(r"\b\d{4}-\d{2}-\d{2}\b"),
            ],
            description: vec![Strategy::css(".invention-description")],
            url_selector: Selector::parse(".desktop-display").unwrap(),
            cited_selector: Selector::parse(".cited-patents, .references").unwrap(),
            family_selector: Selector::parse(".family-members, .patent-family").unwrap(),
            classification_selector: Selector::parse(".classification, .ipc-codes").unwrap(),
            patent_id_re: Regex::new(r"\b(?:CA|US|WO|EP)\d{6,}[A-Z]?\d*\b").unwrap(),
            ipc_code_re: Regex::new(r"[A-Z]\d{2}[A-Z]\s+\d{2}/\d{2}").unwrap(),
            keywords_re: Regex::new(r"(?i)(?:Prior art keywords|Keywords)[:\s]+([^\n]+)").unwrap(),
        }
    }

    /// Returns the candidate record for one container, or `None` when
    /// the container is boilerplate or has no title and no number.
    pub fn extract(&self, item: ElementRef) -> Option<Patent> {
        let full_text = item.text().collect::<Vec<_>>().join("\n");

        if SKIP_INDICATORS
            .iter()
            .any(|indicator| full_text.contains(indicator))
        {
            return None;
        }

        let mut patent = Patent {
            title: clean_patent_title(&apply_cascade(&self.title, item, &full_text)),
            patent_number: apply_cascade(&self.patent_number, item, &full_text),
            organization: clean_organization(&apply_cascade(&self.organization, item, &full_text)),
            patent_type: apply_cascade(&self.patent_type, item, &full_text),
            year: apply_cascade(&self.year, item, &full_text),
            date_added: apply_cascade(&self.date_added, item, &full_text),
            description: apply_cascade(&self.description, item, &full_text),
            url: self.extract_url(item),
            cited_patents: self.scan_patent_ids(item, &self.cited_selector),
            family_members: self.scan_patent_ids(item, &self.family_selector),
            classification_codes: self.scan_classification_codes(item),
            prior_art_keywords: self.scan_keywords(&full_text),
        };

        if patent.title.is_empty() {
            patent.title = self.fallback_title(&full_text);
        }

        match patent.is_valid() {
            true => Some(patent),
            false => None,
        }
    }

    fn extract_url(&self, item: ElementRef) -> String {
        item.select(&self.url_selector)
            .next()
            .and_then(|link| link.value().attr("href"))
            .map(|href| format!("{SITE_ROOT}{href}"))
            .unwrap_or_default()
    }

    fn scan_patent_ids(&self, item: ElementRef, selector: &Selector) -> Vec<String> {
        let ids = item
            .select(selector)
            .flat_map(|section| {
                let text = section.text().collect::<Vec<_>>().join(" ");
                self.patent_id_re
                    .find_iter(&text)
                    .map(|m| m.as_str().to_string())
                    .collect::<Vec<_>>()
            })
            .collect();
        dedup_values(ids)
    }

    fn scan_classification_codes(&self, item: ElementRef) -> Vec<String> {
        let codes = item
            .select(&self.classification_selector)
            .flat_map(|section| {
                let text = section.text().collect::<Vec<_>>().join(" ");
                self.ipc_code_re
                    .find_iter(&text)
                    .map(|m| m.as_str().to_string())
                    .collect::<Vec<_>>()
            })
            .collect();
        dedup_values(codes)
    }

    fn scan_keywords(&self, full_text: &str) -> Vec<String> {
        let keywords = self
            .keywords_re
            .captures_iter(full_text)
            .flat_map(|caps| {
                caps[1]
                    .split(',')
                    .map(|word| word.trim().to_string())
                    .filter(|word| !word.is_empty())
                    .collect::<Vec<_>>()
            })
            .collect();
        dedup_values(keywords)
    }

    /// Last-resort title: the first text line that is long enough and
    /// not boilerplate.
    fn fallback_title(&self, full_text: &str) -> String {
        full_text
            .lines()
            .map(collapse_whitespace)
            .filter(|line| line.len() > MIN_TITLE_LINE_LEN)
            .find(|line| {
                !SKIP_INDICATORS
                    .iter()
                    .any(|indicator| line.contains(indicator))
            })
            .map(|line| clean_patent_title(&line))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use scraper::Html;

    use super::PatentExtractor;

    fn extract_first(html: &str) -> Option<crate::domain::Patent> {
        let document = Html::parse_fragment(html);
        let extractor = PatentExtractor::new();
        extractor.extract(document.root_element())
    }

    #[test]
    fn structured_fields_come_from_their_selectors() {
        let patent = extract_first(
            r#"
            <div class="result">
              <a class="desktop-display" href="/ipm-mcpi/patent/123"><span class="result-title">An   Improved Widget</span></a>
              <div class="publication-number">CA1234567</div>
              <div class="organisation"><a>Acme Research</a></div>
              <div class="ip-type"><span>Patent</span></div>
              <div class="filed">2019</div>
              <div class="date-added">2021-06-01</div>
              <div class="invention-description">A widget, but improved.</div>
            </div>
            "#,
        )
        .expect("record expected");

        assert_eq!(patent.title, "An Improved Widget");
        assert_eq!(patent.patent_number, "CA1234567");
        assert_eq!(patent.organization, "Acme Research");
        assert_eq!(patent.patent_type, "Patent");
        assert_eq!(patent.year, "2019");
        assert_eq!(patent.date_added, "2021-06-01");
        assert_eq!(patent.description, "A widget, but improved.");
        assert_eq!(
            patent.url,
            "https://ised-isde.canada.ca/ipm-mcpi/patent/123"
        );
    }

    #[test]
    fn pattern_fallback_finds_patent_number_in_plain_text() {
        let patent = extract_first(
            "<div><span class=\"result-title\">An Improved Widget</span>\
             <p>Filed under CA1234567 in Canada</p></div>",
        )
        .expect("record expected");

        assert_eq!(patent.patent_number, "CA1234567");
    }

    #[test]
    fn skip_indicator_discards_the_whole_container() {
        assert!(extract_first(
            "<div><p>Keyword search</p><span class=\"result-title\">Not a record</span></div>"
        )
        .is_none());
    }

    #[test]
    fn short_text_without_title_or_number_yields_no_record() {
        // Every line is below the fallback-title length floor.
        assert!(extract_first("<div><p>Refine by</p><p>2019</p></div>").is_none());
    }

    #[test]
    fn fallback_title_takes_first_qualifying_line() {
        let patent = extract_first(
            "<div><p>Short</p><p>A sufficiently long invention title</p>\
             <p>CA7654321</p></div>",
        )
        .expect("record expected");

        assert_eq!(patent.title, "A sufficiently long invention title");
    }

    #[test]
    fn cited_patents_are_deduplicated() {
        let patent = extract_first(
            "<div><span class=\"result-title\">An Improved Widget</span>\
             <div class=\"references\">CA1111111 US2222222 CA1111111</div>\
             <div class=\"cited-patents\">US2222222 EP3333333</div></div>",
        )
        .expect("record expected");

        assert_eq!(
            patent.cited_patents,
            vec!["CA1111111", "US2222222", "EP3333333"]
        );
    }

    #[test]
    fn classification_codes_and_keywords_are_collected() {
        let patent = extract_first(
            "<div><span class=\"result-title\">An Improved Widget</span>\
             <div class=\"classification\">A61K 31/00 and A61K 31/00 and B29C 45/17</div>\
             <p>Prior art keywords: widget, gear, widget</p></div>",
        )
        .expect("record expected");

        assert_eq!(patent.classification_codes, vec!["A61K 31/00", "B29C 45/17"]);
        assert_eq!(patent.prior_art_keywords, vec!["widget", "gear"]);
    }

    #[test]
    fn noisy_organization_degrades_to_empty() {
        let patent = extract_first(
            "<div><span class=\"result-title\">An Improved Widget</span>\
             <div class=\"organisation\">ExploreIP legal notice</div></div>",
        )
        .expect("record expected");

        assert_eq!(patent.organization, "");
    }
}
