//! Start the interactive shell on the terminal.

use tracing::{info, warn};

use crate::config::CliConfig;
use crate::error::CommandError;
use crate::shell::{Editor, Shell};
use crate::workspace::Workspace;

/// Run the menu shell until the user quits.
///
/// # Errors
///
/// Returns an error if the data directory cannot be loaded or saved, or the
/// terminal fails.
pub fn run(config: &CliConfig) -> Result<(), CommandError> {
    let mut workspace = Workspace::open(config)?;
    if !workspace.is_persistent() {
        warn!("No data directory configured; changes will be lost on exit");
    }

    let editor = Editor::new()?;
    let stdout = std::io::stdout();
    info!("Starting interactive shell");
    Shell::new(&mut workspace, editor, stdout.lock()).run()
}
