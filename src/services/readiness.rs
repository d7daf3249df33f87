use std::time::Duration;

use tokio::time::Instant;

use super::droid::PageSession;

/// Text shown while the listing is still being rendered client-side.
pub const LOADING_MARKER: &str = "Searching...";

/// Text that marks a rendered page as placeholder rather than results.
pub const PLACEHOLDER_MARKERS: [&str; 3] = [
    "Searching...",
    "Your search found no results",
    "Please note that ExploreIP does not provide a search of all known patents",
];

const POLL_INTERVAL: Duration = Duration::from_millis(500);
const SETTLE_DELAY: Duration = Duration::from_secs(5);

/// Decides whether a page's asynchronous content has actually rendered,
/// as opposed to a loading or empty-result placeholder.
pub struct ContentReadiness {
    pub timeout: Duration,
    pub poll_interval: Duration,
    pub settle_delay: Duration,
}

impl ContentReadiness {
    pub fn new(timeout: Duration) -> Self {
        ContentReadiness {
            timeout,
            poll_interval: POLL_INTERVAL,
            settle_delay: SETTLE_DELAY,
        }
    }

    /// Polls the page's visible text until the loading marker disappears
    /// or the timeout elapses, settles, then classifies the final text.
    /// A timeout alone never fails the page; a slow render that ends up
    /// with real content still counts as ready. `false` means "retry",
    /// never a fatal condition.
    pub async fn wait_for_content_load<S: PageSession>(&self, session: &S, page_num: u32) -> bool {
        let deadline = Instant::now() + self.timeout;

        loop {
            match session.body_text().await {
                Ok(text) if !text.contains(LOADING_MARKER) => break,
                Ok(_) => {}
                Err(e) => log::warn!("Failed to read page {} text while polling: {:?}", page_num, e),
            }
            if Instant::now() >= deadline {
                log::warn!("Page {} may still be loading after timeout", page_num);
                break;
            }
            tokio::time::sleep(self.poll_interval).await;
        }

        // Let late-rendering scripts finish before classifying.
        tokio::time::sleep(self.settle_delay).await;

        match session.body_text().await {
            Ok(text) => match PLACEHOLDER_MARKERS.iter().any(|marker| text.contains(marker)) {
                true => {
                    log::warn!("Page {} still contains placeholder text", page_num);
                    false
                }
                false => true,
            },
            Err(e) => {
                log::warn!("Failed to read page {} text after settling: {:?}", page_num, e);
                false
            }
        }
    }
}
