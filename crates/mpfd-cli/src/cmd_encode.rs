/// Implementation of `mpfd encode`.
///
/// Parses a JSON manifest describing the parts of a form and serialises them
/// into a `multipart/form-data` body using `FormEncoder`. The manifest path is
/// the sole positional argument; the output file is required via `-o`.
///
/// # Manifest format
///
/// ```json
/// {
///   "boundary": "XYZ",
///   "parts": [
///     { "name": "title", "value": "Quarterly report" },
///     { "name": "note", "value": "Grüße", "charset": "utf-8" },
///     {
///       "name": "upload",
///       "filename": "report.csv",
///       "content_type": "text/csv",
///       "content_file": "data/report.csv",
///       "headers": [{ "name": "Content-Language", "value": "en" }]
///     }
///   ]
/// }
/// ```
///
/// `content_file` paths are resolved relative to the manifest file's parent
/// directory. An empty `parts` list needs `"headerless_empty": true`.
///
/// # Part kinds
///
/// ```text
/// ┌───────────────────────────┬──────────────────────────────────────────┐
/// │ Keys present              │ Encoded as                               │
/// ├───────────────────────────┼──────────────────────────────────────────┤
/// │ filename                  │ file part (content_type defaults to      │
/// │                           │ application/octet-stream)                │
/// │ charset                   │ text/plain; charset=<charset> field      │
/// │ content_type              │ field with an explicit Content-Type      │
/// │ none of the above         │ plain field, no Content-Type             │
/// └───────────────────────────┴──────────────────────────────────────────┘
/// ```
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use mpfd_encoder::FormEncoder;

use crate::EncodeArgs;

const DEFAULT_FILE_TYPE: &str = "application/octet-stream";

// ── Manifest serde types ──────────────────────────────────────────────────────

#[derive(serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct Manifest {
    boundary: Option<String>,
    #[serde(default)]
    headerless_empty: bool,
    parts: Vec<ManifestPart>,
}

/// A single part entry in the JSON manifest.
#[derive(serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct ManifestPart {
    name: String,
    /// Inline text body. Takes precedence over `content_file`.
    value: Option<String>,
    /// Read the body from this path (relative to manifest dir).
    content_file: Option<String>,
    filename: Option<String>,
    content_type: Option<String>,
    charset: Option<String>,
    #[serde(default)]
    headers: Vec<ManifestHeader>,
}

#[derive(serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct ManifestHeader {
    name: String,
    value: String,
}

// ── Public entry point ────────────────────────────────────────────────────────

/// Run the `mpfd encode` command.
///
/// Prints the `Content-Type` to send alongside the body and a one-line
/// summary (`Wrote N bytes to <path>`) on success.
///
/// # Errors
///
/// Returns an error if the manifest cannot be read or parsed, if a part
/// references a `content_file` that does not exist, or if the encoder
/// rejects the form (bad boundary, boundary inside a body, bad names).
pub fn run(args: &EncodeArgs) -> Result<()> {
    let manifest_src = fs::read_to_string(&args.input)
        .with_context(|| format!("cannot read {}", args.input.display()))?;

    let manifest: Manifest = serde_json::from_str(&manifest_src)
        .with_context(|| format!("failed to parse manifest {}", args.input.display()))?;

    let manifest_dir = args.input.parent().unwrap_or_else(|| Path::new("."));

    let mut encoder = FormEncoder::new();
    if let Some(boundary) = args.boundary.as_ref().or(manifest.boundary.as_ref()) {
        encoder.with_boundary(boundary);
    }
    if manifest.headerless_empty {
        encoder.headerless_empty();
    }

    for (idx, part) in manifest.parts.iter().enumerate() {
        apply_part(&mut encoder, part, manifest_dir)
            .with_context(|| format!("part {idx}: failed to apply"))?;
    }

    let bytes = encoder.encode().context("cannot encode form")?;

    fs::write(&args.output, &bytes)
        .with_context(|| format!("cannot write {}", args.output.display()))?;

    println!("Content-Type: {}", encoder.content_type());
    println!("Wrote {} bytes to {}", bytes.len(), args.output.display());
    Ok(())
}

// ── Part application helpers ──────────────────────────────────────────────────

fn apply_part(encoder: &mut FormEncoder, part: &ManifestPart, manifest_dir: &Path) -> Result<()> {
    let body = resolve_content(part.value.as_deref(), part.content_file.as_deref(), manifest_dir)?;

    match (&part.filename, &part.charset, &part.content_type) {
        (Some(filename), _, content_type) => {
            let content_type = content_type.as_deref().unwrap_or(DEFAULT_FILE_TYPE);
            encoder.add_file(&part.name, filename, content_type, &body);
        }
        (None, Some(charset), _) => {
            encoder.add_field_with_charset(&part.name, &body, charset);
        }
        (None, None, Some(content_type)) => {
            encoder
                .add_field_bytes(&part.name, &body)
                .with_header("Content-Type", content_type);
        }
        (None, None, None) => {
            encoder.add_field_bytes(&part.name, &body);
        }
    }

    for header in &part.headers {
        encoder.with_header(&header.name, &header.value);
    }
    Ok(())
}

/// Returns the body bytes for a part.
///
/// Prefers `value` (inline string) over `content_file` (file path).
fn resolve_content(
    value: Option<&str>,
    content_file: Option<&str>,
    manifest_dir: &Path,
) -> Result<Vec<u8>> {
    if let Some(text) = value {
        return Ok(text.as_bytes().to_vec());
    }
    if let Some(path_str) = content_file {
        let path = manifest_dir.join(path_str);
        return fs::read(&path)
            .with_context(|| format!("cannot read content_file {}", path.display()));
    }
    Err(anyhow!("part requires either \"value\" or \"content_file\""))
}
