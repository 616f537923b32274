use std::path::Path;

use anyhow::{bail, Result};
use tracing::{info, warn};

use crate::commands::util::load_case;

/// Build the network (reference and value checks) and run its diagnostics.
pub fn handle(case: &Path, strict: bool) -> Result<()> {
    let network = load_case(case)?;
    println!("{}: {}", case.display(), network.stats());

    let diagnostics = network.diagnose();
    print!("{diagnostics}");
    for issue in diagnostics.warnings() {
        warn!(category = %issue.category, "{}", issue.message);
    }

    if diagnostics.has_errors() {
        bail!("{} has {}", case.display(), diagnostics.summary());
    }
    if strict && diagnostics.warning_count() > 0 {
        bail!(
            "{} has {} (strict mode)",
            case.display(),
            diagnostics.summary()
        );
    }
    info!("validation passed");
    Ok(())
}
