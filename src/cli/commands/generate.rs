//! Material generation commands (quiz, lesson, vocab, diagram).

use crate::cli::preflight::{self, Operation};
use crate::cli::{MaterialArgs, Output};
use crate::config::Settings;
use crate::materials::{DiagramKind, MaterialKind, MaterialRequest};
use crate::studio::Studio;
use anyhow::{bail, Result};

/// Kind-specific options on top of [`MaterialArgs`].
#[derive(Debug, Default)]
pub struct GenerateOptions {
    pub count: Option<u32>,
    pub diagram_kind: Option<String>,
}

/// Generate one material and print, write or save it.
pub async fn run_generate(
    kind: MaterialKind,
    args: MaterialArgs,
    options: GenerateOptions,
    settings: Settings,
) -> Result<()> {
    let topic = args.topic.clone().unwrap_or_default();
    if topic.trim().is_empty() && args.video.is_none() {
        bail!("Give a topic, or use --video to generate from a YouTube transcript.");
    }

    let diagram_kind = options
        .diagram_kind
        .as_deref()
        .map(str::parse::<DiagramKind>)
        .transpose()?;

    let source_text = match &args.source {
        Some(path) => Some(std::fs::read_to_string(Settings::expand_path(path))?),
        None => None,
    };

    preflight::check(Operation::Generate, &settings)?;
    let studio = Studio::new(settings)?;

    let request = MaterialRequest {
        topic,
        source_text,
        grade_level: args.grade.clone(),
        count: options.count,
        diagram_kind,
    };

    let spinner = Output::spinner(&format!("Generating {}...", kind));
    let result = match &args.video {
        Some(video) => studio
            .generate_from_video(kind, video, request)
            .await
            .map(|out| (out.topic, out.material, Some(out.video))),
        None => {
            let topic = request.topic.clone();
            studio.generate(kind, &request).await.map(|m| (topic, m, None))
        }
    };
    spinner.finish_and_clear();
    let (topic, material, video) = result?;

    if args.save {
        let saved = studio
            .save_material(&topic, material.clone(), video.as_ref().map(|v| v.url.as_str()))
            .await?;
        Output::success(&format!("Saved {} as {}", kind, saved.id));
    }

    let content = if args.json {
        serde_json::to_string_pretty(&material)?
    } else {
        material.to_markdown()
    };
    Output::emit(&content, args.output.as_deref())
}
