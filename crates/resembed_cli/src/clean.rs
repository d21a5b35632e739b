//! `resembed clean`: remove generated output.

use resembed_config::{resolve_out_dir, TargetOverrides};
use resembed_gen::clean_target;

use crate::project::{load_project, select_targets};
use crate::{CleanArgs, GlobalArgs};

/// Runs the `resembed clean` command.
///
/// Roots are not checked, so output can be removed after its resources are gone.
pub fn run(args: &CleanArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let (project_dir, config) = load_project(global)?;
    let overrides = TargetOverrides {
        roots: Vec::new(),
        out_dir: args.out_dir.clone(),
    };

    for name in select_targets(&config, &args.targets)? {
        let target_dir = resolve_out_dir(&config, &name, &project_dir, &overrides)?.join(&name);
        let removed = clean_target(&name, &target_dir)?;
        if !global.quiet {
            if removed {
                eprintln!("     Cleaned {name}");
            } else {
                eprintln!("     Nothing to clean for {name}");
            }
        }
    }
    Ok(0)
}
