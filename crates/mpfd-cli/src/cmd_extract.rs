/// Implementation of `mpfd extract`.
///
/// Streams the body until the requested part (by `--part` index or first
/// `--name` match) and copies its bytes to `-o FILE` or stdout. Earlier
/// parts are skipped without buffering; decoding stops right after the
/// extracted part.
use std::fs::File;
use std::io::{self, BufWriter, Write};

use anyhow::{Context, Result, bail};

use crate::ExtractArgs;

/// Run the `mpfd extract` command.
///
/// # Errors
///
/// Returns an error if the body is malformed before the target part ends,
/// no part matches, or the output cannot be written.
pub fn run(args: &ExtractArgs) -> Result<()> {
    let mut decoder = args.body.open()?;

    while let Some(mut part) = decoder.next_part().context("cannot read part headers")? {
        let idx = part.index();
        let wanted = match (&args.part, &args.name) {
            (Some(target), _) => idx == *target,
            (None, Some(name)) => part.name() == Some(name.as_str()),
            (None, None) => false,
        };
        if !wanted {
            part.close().with_context(|| format!("cannot skip part {idx}"))?;
            continue;
        }

        let written = match &args.output {
            Some(path) => {
                let file = File::create(path)
                    .with_context(|| format!("cannot create {}", path.display()))?;
                let mut out = BufWriter::new(file);
                let n = io::copy(&mut part, &mut out)
                    .with_context(|| format!("cannot extract part {idx}"))?;
                out.flush()
                    .with_context(|| format!("cannot write {}", path.display()))?;
                n
            }
            None => {
                let stdout = io::stdout();
                let mut out = stdout.lock();
                io::copy(&mut part, &mut out).with_context(|| format!("cannot extract part {idx}"))?
            }
        };

        if let Some(path) = &args.output {
            eprintln!("Extracted part {idx} ({written} bytes) to {}", path.display());
        }
        return Ok(());
    }

    match (&args.part, &args.name) {
        (Some(target), _) => bail!("body has {} parts, no part {target}", decoder.parts_seen()),
        (None, Some(name)) => bail!("no part named {name:?}"),
        (None, None) => bail!("either --part or --name is required"),
    }
}
