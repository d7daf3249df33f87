use serde::Deserialize;
use serde_aux::field_attributes::deserialize_number_from_string;

#[derive(Deserialize, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub scraper: ScraperSettings,
    pub api_keys: ApiKeySettings,
}

#[derive(Deserialize, Clone)]
pub struct ApplicationSettings {
    pub host: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
}

#[derive(Deserialize, Clone)]
pub struct ScraperSettings {
    pub base_url: String,
    pub webdriver_url: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub start_page: u32,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub end_page: u32,
    /// Seconds to wait for a page to escape its loading state.
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout: u64,
    /// Seconds slept between page fetches. Doubled for retry backoff.
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub rate_limit_delay: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub max_retries: u32,
    pub user_agent: String,
    pub output_dir: String,
}

#[derive(Deserialize, Clone)]
pub struct ApiKeySettings {
    pub openai: String,
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let base_path = std::env::current_dir().expect("Failed to determine the current directory");
    let configuration_directory = base_path.join("configuration");

    let settings = config::Config::builder()
        .set_default("application.host", "127.0.0.1")?
        .set_default("application.port", 8000)?
        .set_default(
            "scraper.base_url",
            "https://ised-isde.canada.ca/ipm-mcpi/patents-brevets",
        )?
        .set_default("scraper.webdriver_url", "http://localhost:9515")?
        .set_default("scraper.start_page", 1)?
        .set_default("scraper.end_page", 20)?
        .set_default("scraper.timeout", 30)?
        .set_default("scraper.rate_limit_delay", 5)?
        .set_default("scraper.max_retries", 3)?
        .set_default(
            "scraper.user_agent",
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
             (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
        )?
        .set_default("scraper.output_dir", "output")?
        .set_default("api_keys.openai", "")?
        .add_source(
            config::File::from(configuration_directory.join("base.yaml")).required(false),
        )
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}
