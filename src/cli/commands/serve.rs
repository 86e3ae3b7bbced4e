//! HTTP API server command.

use crate::cli::Output;
use crate::config::Settings;
use crate::server;
use crate::studio::Studio;

/// Run the HTTP API server.
pub async fn run_serve(host: Option<String>, port: Option<u16>, settings: Settings) -> anyhow::Result<()> {
    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);
    let studio = Studio::new(settings)?;

    Output::header("Scholar API Server");
    println!();
    Output::success(&format!("Listening on http://{}:{}", host, port));
    match studio.llm_description() {
        Some(llm) => Output::kv("LLM", &llm),
        None => Output::warning("No LLM key configured; generation endpoints will fail."),
    }
    let providers = studio.search_providers();
    if providers.is_empty() {
        Output::warning("No search provider keys configured; /api/search will fail.");
    } else {
        Output::kv("Search", &providers.join(", "));
    }
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET    /health");
    Output::kv("Search", "POST   /api/search");
    Output::kv("Research", "POST   /api/research, GET /api/research/{id}");
    Output::kv("Materials", "POST   /api/materials/{quiz|lesson|vocab|diagram}");
    Output::kv("Transcript", "POST   /api/video/transcript");
    Output::kv("Videos", "POST   /api/video/search");
    Output::kv("From video", "POST   /api/video/materials/{kind}");
    Output::kv("Library", "GET    /api/library, GET|DELETE /api/library/{id}");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    server::serve(&host, port, studio).await?;

    Ok(())
}
