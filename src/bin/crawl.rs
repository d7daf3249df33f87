use std::path::PathBuf;
use std::process;

use env_logger::Env;
use exploreip::{
    configuration::get_configuration,
    services::{Droid, OutputSink, PatentScraper, RunConfig},
};

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let configuration = get_configuration().expect("Failed to read configuration.");
    let run_config =
        RunConfig::try_from(&configuration.scraper).expect("Invalid scraper configuration.");

    // The only fatal condition: no browser, no run.
    let droid = match Droid::new(&configuration.scraper).await {
        Ok(droid) => droid,
        Err(e) => {
            log::error!("Failed to setup browser session: {:?}", e);
            log::error!("Please ensure a webdriver is reachable at {}", configuration.scraper.webdriver_url);
            process::exit(1);
        }
    };

    let scraper = PatentScraper::new(run_config, &droid);

    let result = tokio::select! {
        result = scraper.scrape_all_pages() => Some(result),
        _ = tokio::signal::ctrl_c() => {
            log::warn!("Interrupted, closing browser session");
            None
        }
    };

    // Single release point for the browser resource, on every exit path.
    if let Err(e) = droid.quit().await {
        log::warn!("Failed to close browser session: {:?}", e);
    }

    if let Some(result) = result {
        let sink = OutputSink::new(PathBuf::from(configuration.scraper.output_dir));
        match sink.save_run(&result) {
            Ok(summary) => log::info!("Scraping completed. Summary: {:?}", summary),
            Err(e) => log::error!("Failed to write run output: {:?}", e),
        }
    }
}
