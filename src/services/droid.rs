use std::future::Future;

use anyhow::Context;
use thirtyfour::{By, ChromiumLikeCapabilities, DesiredCapabilities, WebDriver};

use crate::configuration::ScraperSettings;

/// The seam between the pipeline and the live browser. The driver and
/// the readiness detector only ever see page snapshots through this
/// trait; the underlying handle is never aliased.
pub trait PageSession {
    fn navigate(&self, url: &str) -> impl Future<Output = anyhow::Result<()>> + Send;
    fn body_text(&self) -> impl Future<Output = anyhow::Result<String>> + Send;
    fn page_source(&self) -> impl Future<Output = anyhow::Result<String>> + Send;
}

/// Owns the one headless Chrome session of a run. Acquired once at run
/// start; `quit` must be called on every exit path.
pub struct Droid {
    driver: WebDriver,
}

impl Droid {
    pub async fn new(settings: &ScraperSettings) -> anyhow::Result<Self> {
        let mut caps = DesiredCapabilities::chrome();
        for arg in [
            "--headless",
            "--no-sandbox",
            "--disable-dev-shm-usage",
            "--disable-gpu",
            "--window-size=1920,1080",
            "--disable-blink-features=AutomationControlled",
        ] {
            caps.add_arg(arg)?;
        }
        caps.add_arg(&format!("--user-agent={}", settings.user_agent))?;

        let driver = WebDriver::new(&settings.webdriver_url, caps)
            .await
            .context("Failed to start a webdriver session")?;

        Ok(Droid { driver })
    }

    pub async fn quit(self) -> anyhow::Result<()> {
        self.driver.quit().await?;
        Ok(())
    }
}

impl PageSession for Droid {
    async fn navigate(&self, url: &str) -> anyhow::Result<()> {
        self.driver.goto(url).await?;
        Ok(())
    }

    async fn body_text(&self) -> anyhow::Result<String> {
        let body = self.driver.find(By::Tag("body")).await?;
        Ok(body.text().await?)
    }

    async fn page_source(&self) -> anyhow::Result<String> {
        Ok(self.driver.source().await?)
    }
}
