pub mod droid;
pub mod openai_client;
pub mod output_sink;
pub mod patent_extractor;
pub mod patent_scraper;
pub mod readiness;
pub mod text_clean;

pub use droid::*;
pub use openai_client::*;
pub use output_sink::*;
pub use patent_extractor::*;
pub use patent_scraper::*;
pub use readiness::*;
pub use text_clean::*;
