/// Implementation of `mpfd inspect`.
///
/// Streams the body part by part and prints one summary line per part,
/// followed by optional headers (`--headers`) and a body preview
/// (`--show-body`). Bodies are never held in memory beyond the preview.
///
/// # Output format
///
/// ```text
/// Part 0: field "title" text/plain [UTF-8] (11 bytes)
/// Part 1: file "upload" filename="a.png" image/png [UTF-8] (2048 bytes)
/// ---
/// 2 parts, ended at offset 2391
/// ```
use anyhow::{Context, Result};

use crate::InspectArgs;

const PREVIEW_CHARS: usize = 80;

/// Run the `mpfd inspect` command.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the body is malformed.
/// Parts printed before the failure stay on stdout.
pub fn run(args: &InspectArgs) -> Result<()> {
    let mut decoder = args.body.open()?;
    let mut count = 0usize;

    while let Some(mut part) = decoder.next_part().context("cannot read part headers")? {
        let idx = part.index();
        count += 1;

        if let Some(target) = args.part
            && idx != target
        {
            part.close().with_context(|| format!("cannot skip part {idx}"))?;
            continue;
        }

        let kind = if part.is_file() { "file" } else { "field" };
        let name = part.name().map_or_else(|| "<unnamed>".to_string(), |n| format!("{n:?}"));
        let filename = part
            .filename()
            .map(|f| format!(" filename={f:?}"))
            .unwrap_or_default();
        let media = part.content_type().unwrap_or("text/plain").to_string();
        let charset = part.charset().name();
        let show_headers = args.headers.then(|| part.headers().to_string());

        let mut preview = Vec::new();
        let mut size = 0u64;
        let mut chunk = [0u8; 8192];
        loop {
            let n = part
                .read_chunk(&mut chunk)
                .with_context(|| format!("cannot read body of part {idx}"))?;
            if n == 0 {
                break;
            }
            size += n as u64;
            if args.show_body && preview.len() < PREVIEW_CHARS * 4 {
                let take = n.min(PREVIEW_CHARS * 4 - preview.len());
                preview.extend_from_slice(&chunk[..take]);
            }
        }

        println!("Part {idx}: {kind} {name}{filename} {media} [{charset}] ({size} bytes)");

        if let Some(headers) = show_headers {
            for line in headers.lines() {
                println!("         {line}");
            }
        }

        if args.show_body {
            let text = String::from_utf8_lossy(&preview);
            let truncated: String = text.chars().take(PREVIEW_CHARS).collect();
            let cut = (preview.len() as u64) < size || text.chars().count() > PREVIEW_CHARS;
            let ellipsis = if cut { "…" } else { "" };
            println!("         Body:    {truncated:?}{ellipsis}");
        }
    }

    println!("---");
    println!(
        "{count} part{}, ended at offset {}",
        if count == 1 { "" } else { "s" },
        decoder.position()
    );

    Ok(())
}
