//! `resembed list`: show what a target embeds, from its persisted record.

use resembed_cache::GenerationRecord;
use resembed_config::{resolve_out_dir, TargetOverrides};

use crate::project::load_project;
use crate::{GlobalArgs, ListArgs, ReportFormat};

/// Runs the `resembed list` command.
pub fn run(args: &ListArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let (project_dir, config) = load_project(global)?;
    let overrides = TargetOverrides {
        roots: Vec::new(),
        out_dir: args.out_dir.clone(),
    };
    let target_dir =
        resolve_out_dir(&config, &args.target, &project_dir, &overrides)?.join(&args.target);

    let record = GenerationRecord::load(&target_dir)?
        .ok_or_else(|| format!("target '{}' has not been generated", args.target))?;

    print!("{}", render(&record, args.format)?);
    Ok(0)
}

fn render(record: &GenerationRecord, format: ReportFormat) -> Result<String, serde_json::Error> {
    match format {
        ReportFormat::Json => Ok(serde_json::to_string_pretty(record)? + "\n"),
        ReportFormat::Text => {
            let mut out = String::new();
            for (path, entry) in &record.entries {
                out.push_str(&format!(
                    "{:>12}  {:>3}  {}  {}\n",
                    entry.len, entry.chunks, entry.fingerprint, path
                ));
            }
            Ok(out)
        }
    }
}
