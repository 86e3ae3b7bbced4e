//! Library command implementation.

use crate::cli::{LibraryAction, Output};
use crate::config::Settings;
use crate::library::{Library, SqliteLibrary};
use crate::materials::MaterialKind;
use anyhow::{anyhow, bail, Result};
use console::style;
use uuid::Uuid;

/// Export formats for saved items.
#[derive(Debug, Clone, Copy, PartialEq)]
enum ExportFormat {
    Markdown,
    Json,
}

impl std::str::FromStr for ExportFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "markdown" | "md" => Ok(ExportFormat::Markdown),
            "json" => Ok(ExportFormat::Json),
            other => Err(anyhow!("Unknown format '{}'. Use markdown or json.", other)),
        }
    }
}

/// Run a library subcommand.
pub async fn run_library(action: &LibraryAction, settings: Settings) -> Result<()> {
    let library = SqliteLibrary::new(&settings.sqlite_path())?;

    match action {
        LibraryAction::List { kind } => {
            let kind = kind.as_deref().map(str::parse::<MaterialKind>).transpose()?;
            list(&library, kind).await
        }
        LibraryAction::Show { id, json } => {
            let format = if *json { ExportFormat::Json } else { ExportFormat::Markdown };
            println!("{}", render(&library, id, format).await?);
            Ok(())
        }
        LibraryAction::Delete { id } => {
            let id = parse_id(id)?;
            if library.delete_material(id).await? {
                Output::success(&format!("Deleted {}", id));
                Ok(())
            } else {
                bail!("No saved material with id {}", id)
            }
        }
        LibraryAction::Export { id, output, format } => {
            let format: ExportFormat = format.parse()?;
            let content = render(&library, id, format).await?;
            Output::emit(&content, output.as_deref())
        }
    }
}

async fn list(library: &dyn Library, kind: Option<MaterialKind>) -> Result<()> {
    let materials = library.list_materials(kind).await?;
    // Reports have no kind; only list them when unfiltered.
    let reports = if kind.is_none() {
        library.list_reports().await?
    } else {
        Vec::new()
    };

    if materials.is_empty() && reports.is_empty() {
        Output::info("The library is empty. Generate something with --save.");
        return Ok(());
    }

    if !materials.is_empty() {
        Output::header(&format!("Materials ({})", materials.len()));
        for m in &materials {
            println!(
                "  {} {} [{}] {}",
                style("*").cyan(),
                style(&m.title).bold(),
                m.kind,
                style(m.id).dim()
            );
            Output::kv("Topic", &m.topic);
            Output::kv("Saved", &m.created_at.format("%Y-%m-%d %H:%M").to_string());
        }
    }

    if !reports.is_empty() {
        Output::header(&format!("Research reports ({})", reports.len()));
        for r in &reports {
            Output::list_item(&format!(
                "{} ({} personas) {}",
                style(&r.topic).bold(),
                r.analyses.len(),
                style(r.id).dim()
            ));
        }
    }

    Ok(())
}

/// Render a saved material, or a research report with the same id.
async fn render(library: &dyn Library, id: &str, format: ExportFormat) -> Result<String> {
    let id = parse_id(id)?;

    if let Some(saved) = library.get_material(id).await? {
        return Ok(match format {
            ExportFormat::Markdown => saved.material.to_markdown(),
            ExportFormat::Json => serde_json::to_string_pretty(&saved)?,
        });
    }
    if let Some(report) = library.get_report(id).await? {
        return Ok(match format {
            ExportFormat::Markdown => report.to_markdown(),
            ExportFormat::Json => serde_json::to_string_pretty(&report)?,
        });
    }

    bail!("Nothing in the library with id {}", id)
}

fn parse_id(id: &str) -> Result<Uuid> {
    Uuid::parse_str(id.trim()).map_err(|_| anyhow!("'{}' is not a valid library id", id))
}
