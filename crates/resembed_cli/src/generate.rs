//! `resembed generate`: scan, generate and publish targets.
//!
//! 1. Find the project and load `resembed.toml`
//! 2. Resolve every selected target (all configuration errors surface here)
//! 3. Optionally purge previous output
//! 4. Run the generation pipeline per target

use resembed_config::{resolve_target, ResolvedTarget, TargetOverrides};
use resembed_gen::{clean_target, generate_target, GenerateOptions, TOOL_VERSION};

use crate::project::{load_project, select_targets};
use crate::{GenerateArgs, GlobalArgs};

/// Runs the `resembed generate` command.
///
/// Returns exit code 0 when every target was generated.
pub fn run(args: &GenerateArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let (project_dir, config) = load_project(global)?;
    let names = select_targets(&config, &args.targets)?;

    if !args.root.is_empty() && names.len() != 1 {
        return Err("--root requires exactly one target".into());
    }
    if names.is_empty() {
        if !global.quiet {
            eprintln!("warning: no targets configured");
        }
        return Ok(0);
    }

    let overrides = TargetOverrides {
        roots: args.root.clone(),
        out_dir: args.out_dir.clone(),
    };
    let targets: Vec<ResolvedTarget> = names
        .iter()
        .map(|name| resolve_target(&config, name, &project_dir, &overrides))
        .collect::<Result<_, _>>()?;

    let options = GenerateOptions {
        tool_version: TOOL_VERSION.to_string(),
        force: args.force,
        jobs: args.jobs.map(usize::from),
    };

    for target in &targets {
        if args.clean {
            clean_target(&target.name, &target.target_dir())?;
        }
        if !global.quiet {
            eprintln!("  Generating {}", target.name);
        }
        let report = generate_target(target, &options)?;
        if !global.quiet {
            eprintln!(
                "   Generated {} ({} resources: {} generated, {} unchanged, {} pruned)",
                report.target, report.resources, report.generated, report.skipped, report.pruned
            );
            if global.verbose {
                eprintln!("    Manifest {}", report.manifest.display());
            }
        }
    }
    Ok(0)
}
