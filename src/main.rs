use image_recon::ImageAnalyzer;
use std::path::Path;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Prints a single `{"error": …}` object so a total failure is never
/// mistaken for a report.
fn print_error(message: &str) -> ExitCode {
    println!("{}", serde_json::json!({ "error": message }));
    ExitCode::FAILURE
}

#[tokio::main]
async fn main() -> ExitCode {
    // Diagnostics go to stderr; stdout carries exactly one JSON document.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let Some(image_path) = std::env::args().nth(1) else {
        eprintln!("usage: image-recon <image-file>");
        return ExitCode::FAILURE;
    };

    let analyzer = match ImageAnalyzer::builder().build() {
        Ok(analyzer) => analyzer,
        Err(e) => return print_error(&e.to_string()),
    };

    match analyzer.analyze_image(Path::new(&image_path)).await {
        Ok(report) => match serde_json::to_string_pretty(&report) {
            Ok(json) => {
                println!("{json}");
                ExitCode::SUCCESS
            }
            Err(e) => print_error(&e.to_string()),
        },
        Err(e) => print_error(&e.to_string()),
    }
}
