use std::net::TcpListener;
use std::path::PathBuf;

use env_logger::Env;
use exploreip::{configuration::get_configuration, services::OpenaiClient, startup::run};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let configuration = get_configuration().expect("Failed to read configuration.");

    let address = format!(
        "{}:{}",
        configuration.application.host, configuration.application.port
    );
    let listener = TcpListener::bind(address)?;
    let openai_client = OpenaiClient::new(configuration.api_keys.openai);
    let output_dir = PathBuf::from(configuration.scraper.output_dir);

    run(listener, openai_client, output_dir)?.await
}
