use std::net::TcpListener;
use std::path::PathBuf;

use actix_files::Files;
use actix_web::{
    dev::Server,
    middleware::Logger,
    web::Data,
    App, HttpServer,
};

use crate::routes::patent_route::{self, OutputDir};
use crate::services::OpenaiClient;

pub fn run(
    listener: TcpListener,
    openai_client: OpenaiClient,
    output_dir: PathBuf,
) -> Result<Server, std::io::Error> {
    let openai_client = Data::new(openai_client);
    let files_dir = output_dir.clone();
    let output_dir = Data::new(OutputDir(output_dir));

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .service(Files::new("/output", files_dir.clone()).prefer_utf8(true))
            .service(patent_route::index)
            .service(patent_route::view_run)
            .service(patent_route::api_run)
            .service(patent_route::delete_run)
            .service(patent_route::report_card)
            .app_data(openai_client.clone())
            .app_data(output_dir.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}
