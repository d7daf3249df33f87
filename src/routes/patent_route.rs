use std::fs;
use std::path::PathBuf;

use actix_web::{get, post, web, HttpResponse};
use askama::Template;

use crate::domain::Patent;
use crate::services::OpenaiClient;

/// Viewer state: where the crawl binary left its artifacts.
pub struct OutputDir(pub PathBuf);

#[derive(Template)]
#[template(path = "index.html")]
struct IndexTemplate {
    runs: Vec<RunFileRow>,
}

struct RunFileRow {
    filename: String,
    records: usize,
}

#[derive(Template)]
#[template(path = "run.html")]
struct RunTemplate {
    filename: String,
    patents: Vec<Patent>,
}

/// Artifact names come from URLs; anything that could escape the output
/// directory is rejected before touching the filesystem.
fn is_safe_artifact_name(name: &str) -> bool {
    !name.is_empty()
        && name.ends_with(".json")
        && !name.contains('/')
        && !name.contains('\\')
        && !name.contains("..")
}

fn load_patents(dir: &OutputDir, filename: &str) -> Option<Vec<Patent>> {
    if !is_safe_artifact_name(filename) {
        return None;
    }
    let content = fs::read_to_string(dir.0.join(filename)).ok()?;
    serde_json::from_str(&content).ok()
}

#[get("/")]
async fn index(output_dir: web::Data<OutputDir>) -> HttpResponse {
    let mut runs: Vec<RunFileRow> = fs::read_dir(&output_dir.0)
        .map(|entries| {
            entries
                .filter_map(|entry| entry.ok())
                .filter_map(|entry| entry.file_name().into_string().ok())
                .filter(|name| name.starts_with("cleaned_patents_") && name.ends_with(".json"))
                .map(|filename| {
                    let records = load_patents(&output_dir, &filename)
                        .map(|patents| patents.len())
                        .unwrap_or(0);
                    RunFileRow { filename, records }
                })
                .collect()
        })
        .unwrap_or_default();
    runs.sort_by(|a, b| b.filename.cmp(&a.filename));

    HttpResponse::Ok().body(IndexTemplate { runs }.render().unwrap())
}

#[get("/run/{filename}")]
async fn view_run(output_dir: web::Data<OutputDir>, path: web::Path<String>) -> HttpResponse {
    let filename = path.into_inner();

    match load_patents(&output_dir, &filename) {
        Some(patents) => HttpResponse::Ok().body(
            RunTemplate { filename, patents }.render().unwrap(),
        ),
        None => HttpResponse::NotFound().body("Run artifact not found"),
    }
}

#[get("/api/run/{filename}")]
async fn api_run(output_dir: web::Data<OutputDir>, path: web::Path<String>) -> HttpResponse {
    match load_patents(&output_dir, &path.into_inner()) {
        Some(patents) => HttpResponse::Ok().json(patents),
        None => HttpResponse::NotFound().json(serde_json::json!({
            "error": "Run artifact not found"
        })),
    }
}

#[post("/delete/{filename}")]
async fn delete_run(output_dir: web::Data<OutputDir>, path: web::Path<String>) -> HttpResponse {
    let filename = path.into_inner();

    if !is_safe_artifact_name(&filename) {
        return HttpResponse::NotFound().body("Run artifact not found");
    }

    match fs::remove_file(output_dir.0.join(&filename)) {
        Ok(()) => {
            log::info!("Deleted run artifact {}", filename);
            HttpResponse::SeeOther()
                .insert_header(("Location", "/"))
                .finish()
        }
        Err(e) => {
            log::error!("Failed to delete {}: {:?}", filename, e);
            HttpResponse::NotFound().body("Run artifact not found")
        }
    }
}

#[post("/report-card/{filename}/{index}")]
async fn report_card(
    output_dir: web::Data<OutputDir>,
    openai_client: web::Data<OpenaiClient>,
    path: web::Path<(String, usize)>,
) -> HttpResponse {
    let (filename, patent_index) = path.into_inner();

    let patent = match load_patents(&output_dir, &filename)
        .and_then(|patents| patents.into_iter().nth(patent_index))
    {
        Some(patent) => patent,
        None => return HttpResponse::NotFound().body("Patent not found"),
    };

    match openai_client.generate_report_card(&patent).await {
        Ok(card) => HttpResponse::Ok().json(card),
        Err(e) => {
            log::error!("Error generating report card: {:?}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Error generating report card"
            }))
        }
    }
}
