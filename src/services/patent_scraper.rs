use std::time::Duration;

use anyhow::Context;
use scraper::{Html, Selector};
use url::Url;

use crate::configuration::ScraperSettings;
use crate::domain::{PageOutcome, Patent, RunResult};

use super::droid::PageSession;
use super::patent_extractor::{PatentExtractor, SKIP_INDICATORS};
use super::readiness::ContentReadiness;

/// Containers found by the generic-div fallback must carry at least
/// this much text to be considered.
const MIN_FALLBACK_TEXT_LEN: usize = 50;

/// Immutable parameters of one run. Built once from the configuration,
/// never mutated afterwards.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub base_url: Url,
    pub start_page: u32,
    pub end_page: u32,
    pub timeout: Duration,
    pub rate_limit_delay: Duration,
    pub max_retries: u32,
}

impl TryFrom<&ScraperSettings> for RunConfig {
    type Error = anyhow::Error;

    fn try_from(settings: &ScraperSettings) -> Result<Self, Self::Error> {
        let base_url = Url::parse(&settings.base_url)
            .with_context(|| format!("Invalid scraper base url: {}", settings.base_url))?;

        Ok(RunConfig {
            base_url,
            start_page: settings.start_page,
            end_page: settings.end_page,
            timeout: Duration::from_secs(settings.timeout),
            rate_limit_delay: Duration::from_secs(settings.rate_limit_delay),
            max_retries: settings.max_retries,
        })
    }
}

/// Drives the page loop: readiness wait, extraction, bounded retries
/// with backoff and the unconditional inter-page rate-limit delay.
/// Strictly sequential; the one borrowed session is the only resource.
pub struct PatentScraper<'a, S: PageSession> {
    config: RunConfig,
    session: &'a S,
    readiness: ContentReadiness,
    extractor: PatentExtractor,
    row_selector: Selector,
    title_selector: Selector,
    div_selector: Selector,
}

impl<'a, S: PageSession> PatentScraper<'a, S> {
    pub fn new(config: RunConfig, session: &'a S) -> Self {
        let readiness = ContentReadiness::new(config.timeout);
        PatentScraper {
            config,
            session,
            readiness,
            extractor: PatentExtractor::new(),
            row_selector: Selector::parse("tr.ng-scope").unwrap(),
            title_selector: Selector::parse(".result-title").unwrap(),
            div_selector: Selector::parse("div").unwrap(),
        }
    }

    /// Runs the whole configured page range. Per-page failures never
    /// abort the run; every page index in the range is attempted.
    pub async fn scrape_all_pages(&self) -> RunResult {
        let mut result = RunResult::default();

        for page_num in self.config.start_page..=self.config.end_page {
            let outcome = self.scrape_with_retries(page_num).await;

            result.pages_scraped.push(page_num);
            match outcome.ready {
                true => {
                    log::info!(
                        "Found {} patents on page {} after {} attempt(s)",
                        outcome.patents.len(),
                        page_num,
                        outcome.attempts
                    );
                    result.patents.extend(outcome.patents);
                }
                false => {
                    log::warn!(
                        "Skipping page {} after {} failed attempt(s)",
                        page_num,
                        outcome.attempts
                    );
                    result.pages_skipped += 1;
                }
            }

            // The sole throttle against the remote service. Applies even
            // to a fully skipped page.
            tokio::time::sleep(self.config.rate_limit_delay).await;
        }

        log::info!("Total patents scraped: {}", result.patents.len());
        result
    }

    async fn scrape_with_retries(&self, page_num: u32) -> PageOutcome {
        let mut attempts = 0;

        loop {
            attempts += 1;
            match self.scrape_patent_page(page_num).await {
                Ok(Some(patents)) => {
                    return PageOutcome {
                        patents,
                        ready: true,
                        attempts,
                    }
                }
                Ok(None) => {
                    log::warn!("Page {} may not have loaded properly", page_num);
                }
                Err(e) => {
                    log::warn!("Error scraping page {}: {:?}", page_num, e);
                }
            }

            if attempts >= self.config.max_retries {
                return PageOutcome {
                    patents: vec![],
                    ready: false,
                    attempts,
                };
            }

            log::warn!(
                "Retry {}/{} for page {}",
                attempts,
                self.config.max_retries,
                page_num
            );
            tokio::time::sleep(self.config.rate_limit_delay * 2).await;
        }
    }

    /// One page attempt. `Ok(None)` means the page never escaped its
    /// loading or placeholder state and is eligible for retry. A ready
    /// page with no recognizable containers is `Ok(Some(vec![]))`, not
    /// an error.
    async fn scrape_patent_page(&self, page_num: u32) -> anyhow::Result<Option<Vec<Patent>>> {
        let url = self.page_url(page_num);
        log::info!("Scraping page {}...", page_num);
        self.session.navigate(&url).await?;

        if !self
            .readiness
            .wait_for_content_load(self.session, page_num)
            .await
        {
            return Ok(None);
        }

        let page_source = self.session.page_source().await?;
        let document = Html::parse_document(&page_source);

        // Primary strategy: dynamically rendered table rows that carry a
        // title marker.
        let mut patents: Vec<Patent> = document
            .select(&self.row_selector)
            .filter(|row| row.select(&self.title_selector).next().is_some())
            .filter_map(|row| self.extractor.extract(row))
            .collect();

        // Fallback: any block container with substantial, non-boilerplate
        // text.
        if patents.is_empty() {
            patents = document
                .select(&self.div_selector)
                .filter(|div| {
                    let text = div.text().collect::<Vec<_>>().join(" ");
                    text.trim().len() > MIN_FALLBACK_TEXT_LEN
                        && !SKIP_INDICATORS.iter().any(|skip| text.contains(skip))
                })
                .filter_map(|div| self.extractor.extract(div))
                .collect();
        }

        Ok(Some(patents))
    }

    /// Page URL: unfiltered search, fixed licensing-order sort, page
    /// index and language tag. The search and sort values are already
    /// percent-encoded the way the endpoint expects them.
    fn page_url(&self, page_num: u32) -> String {
        let mut url = self.config.base_url.clone();
        url.set_query(Some(&format!(
            "search=querystring%3D%26advanced%3Dfalse&sort=%2Blicensing-order&page={}&lang=en",
            page_num
        )));
        url.to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    use tokio::time::Instant;
    use url::Url;

    use super::{PatentScraper, RunConfig};
    use crate::services::droid::PageSession;
    use crate::services::readiness::ContentReadiness;

    const READY_PAGE_ONE: &str = r#"
        <html><body><table><tbody>
          <tr class="ng-scope">
            <td><a class="desktop-display" href="/ipm-mcpi/patent/1"><span class="result-title">
              Method and apparatus for improved widget control systems
              Method and apparatus for improved widget control systems
            </span></a></td>
            <td class="publication-number">CA1234567</td>
            <td class="organisation"><a>Acme Research</a></td>
          </tr>
        </tbody></table></body></html>
    "#;

    const READY_PAGE_TWO: &str = r#"
        <html><body><table><tbody>
          <tr class="ng-scope">
            <td><span class="result-title">Self-sealing gasket assembly</span></td>
            <td class="publication-number">CA7654321</td>
          </tr>
        </tbody></table></body></html>
    "#;

    const NO_RESULTS_PAGE: &str =
        "<html><body><p>Your search found no results</p></body></html>";

    const BOILERPLATE_PAGE: &str = r#"
        <html><body><table><tbody>
          <tr class="ng-scope">
            <td><span class="result-title">Keyword search</span>
            <p>Save your search to be notified about new opportunities</p></td>
          </tr>
        </tbody></table></body></html>
    "#;

    /// Serves a fixed snapshot per page index and records when each
    /// navigation started.
    struct ScriptedSite {
        pages: HashMap<u32, &'static str>,
        current: Mutex<&'static str>,
        navigations: Mutex<Vec<(u32, Instant)>>,
    }

    impl ScriptedSite {
        fn new(pages: &[(u32, &'static str)]) -> Self {
            ScriptedSite {
                pages: pages.iter().copied().collect(),
                current: Mutex::new(""),
                navigations: Mutex::new(vec![]),
            }
        }

        fn page_param(url: &str) -> u32 {
            let url = Url::parse(url).unwrap();
            url.query_pairs()
                .find(|(key, _)| key == "page")
                .map(|(_, value)| value.parse().unwrap())
                .unwrap()
        }
    }

    impl PageSession for ScriptedSite {
        async fn navigate(&self, url: &str) -> anyhow::Result<()> {
            let page_num = Self::page_param(url);
            *self.current.lock().unwrap() = self.pages[&page_num];
            self.navigations
                .lock()
                .unwrap()
                .push((page_num, Instant::now()));
            Ok(())
        }

        async fn body_text(&self) -> anyhow::Result<String> {
            Ok(self.current.lock().unwrap().to_string())
        }

        async fn page_source(&self) -> anyhow::Result<String> {
            Ok(self.current.lock().unwrap().to_string())
        }
    }

    fn test_config(start_page: u32, end_page: u32) -> RunConfig {
        RunConfig {
            base_url: Url::parse("https://ised-isde.canada.ca/ipm-mcpi/patents-brevets").unwrap(),
            start_page,
            end_page,
            timeout: Duration::from_millis(100),
            rate_limit_delay: Duration::from_millis(50),
            max_retries: 3,
        }
    }

    fn fast_scraper<'a>(
        config: RunConfig,
        session: &'a ScriptedSite,
    ) -> PatentScraper<'a, ScriptedSite> {
        let mut scraper = PatentScraper::new(config, session);
        scraper.readiness = ContentReadiness {
            timeout: Duration::from_millis(100),
            poll_interval: Duration::from_millis(10),
            settle_delay: Duration::from_millis(10),
        };
        scraper
    }

    #[tokio::test(start_paused = true)]
    async fn page_url_carries_fixed_query_parameters() {
        let site = ScriptedSite::new(&[]);
        let scraper = fast_scraper(test_config(1, 1), &site);

        assert_eq!(
            scraper.page_url(7),
            "https://ised-isde.canada.ca/ipm-mcpi/patents-brevets\
             ?search=querystring%3D%26advanced%3Dfalse&sort=%2Blicensing-order&page=7&lang=en"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn duplicated_title_is_collapsed_and_record_kept() {
        let site = ScriptedSite::new(&[(1, READY_PAGE_ONE)]);
        let scraper = fast_scraper(test_config(1, 1), &site);

        let result = scraper.scrape_all_pages().await;

        assert_eq!(result.patents.len(), 1);
        assert_eq!(
            result.patents[0].title,
            "Method and apparatus for improved widget control systems"
        );
        assert_eq!(result.patents[0].patent_number, "CA1234567");
        assert_eq!(result.patents[0].organization, "Acme Research");
        assert_eq!(result.pages_skipped, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn never_ready_page_is_skipped_after_max_retries_and_run_continues() {
        let site = ScriptedSite::new(&[(1, NO_RESULTS_PAGE), (2, READY_PAGE_TWO)]);
        let scraper = fast_scraper(test_config(1, 2), &site);

        let result = scraper.scrape_all_pages().await;

        assert_eq!(result.pages_skipped, 1);
        assert_eq!(result.pages_scraped, vec![1, 2]);
        assert_eq!(result.patents.len(), 1);
        assert_eq!(result.patents[0].patent_number, "CA7654321");

        // Page 1 was attempted exactly max_retries times, then page 2 once.
        let navigations = site.navigations.lock().unwrap();
        let page_one_attempts = navigations.iter().filter(|(p, _)| *p == 1).count();
        assert_eq!(page_one_attempts, 3);
        assert_eq!(navigations.iter().filter(|(p, _)| *p == 2).count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn boilerplate_containers_yield_zero_records_without_skipping_the_page() {
        let site = ScriptedSite::new(&[(1, BOILERPLATE_PAGE)]);
        let scraper = fast_scraper(test_config(1, 1), &site);

        let result = scraper.scrape_all_pages().await;

        assert!(result.patents.is_empty());
        assert_eq!(result.pages_skipped, 0);
        // Accepted as "no data": no retries were spent on it.
        assert_eq!(site.navigations.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn records_keep_page_index_order_and_fetches_respect_the_rate_limit() {
        let site = ScriptedSite::new(&[(1, READY_PAGE_ONE), (2, READY_PAGE_TWO)]);
        let scraper = fast_scraper(test_config(1, 2), &site);

        let result = scraper.scrape_all_pages().await;

        assert_eq!(result.patents.len(), 2);
        assert_eq!(result.patents[0].patent_number, "CA1234567");
        assert_eq!(result.patents[1].patent_number, "CA7654321");

        let navigations = site.navigations.lock().unwrap();
        assert_eq!(navigations.len(), 2);
        let gap = navigations[1].1 - navigations[0].1;
        assert!(gap >= Duration::from_millis(50), "gap was {:?}", gap);
    }
}
