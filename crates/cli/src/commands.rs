//! Command-line surface and command handlers.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde::Serialize;

use perfdash_core::integrity::{check_widgets, renumber, sync_section_children};
use perfdash_core::metric::move_widget_metric;
use perfdash_core::ordering::{classify_move, move_widget, try_move_widget};
use perfdash_core::tree::{display_order, WidgetTree};
use perfdash_core::widget::order_payload;

use crate::config::CliConfig;
use crate::document::DashboardDocument;
use crate::error::{CliError, CliResult};

#[derive(Debug, Parser)]
#[command(name = "perfdash", version, about = "Reorder and verify exported dashboards")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the drag-and-drop widget tree.
    Tree {
        file: PathBuf,
    },
    /// Move a widget; positions refer to the display order.
    MoveWidget {
        file: PathBuf,
        index: usize,
        #[arg(allow_negative_numbers = true)]
        new_index: isize,
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Emit the batch "set widget order" payload instead of the document.
        #[arg(long)]
        payload: bool,
    },
    /// Swap two metrics of a Metrics widget.
    MoveMetric {
        file: PathBuf,
        #[arg(long)]
        widget: String,
        index: usize,
        #[arg(allow_negative_numbers = true)]
        new_index: isize,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Report integrity violations; exits with status 1 when any are found.
    Check {
        file: PathBuf,
    },
    /// Rewrite orders to display ranks and resync section child lists.
    Renumber {
        file: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Run a command. Returns `false` when the command completed but found
/// problems (used for the process exit status).
pub fn run(command: Command, config: &CliConfig) -> CliResult<bool> {
    match command {
        Command::Tree { file } => {
            let document = DashboardDocument::load(&file)?;
            let tree = WidgetTree::build(&document.widgets);
            emit(tree.items(), None, config)?;
            Ok(true)
        }
        Command::MoveWidget {
            file,
            index,
            new_index,
            output,
            payload,
        } => {
            let mut document = DashboardDocument::load(&file)?;
            let flat = display_order(&document.widgets);

            let kind = usize::try_from(new_index)
                .ok()
                .and_then(|target| classify_move(&flat, index, target));
            tracing::info!(index, new_index, ?kind, "Moving widget");

            let moved = if config.strict {
                try_move_widget(&flat, index, new_index)?
            } else {
                move_widget(&flat, index, new_index)
            };

            let violations = check_widgets(&moved);
            if !violations.is_empty() {
                tracing::warn!(
                    count = violations.len(),
                    "Dashboard has integrity violations after the move"
                );
            }

            document.widgets = display_order(&moved);
            if payload {
                emit(&order_payload(&document.widgets), output.as_deref(), config)?;
            } else {
                emit(&document, output.as_deref(), config)?;
            }
            Ok(true)
        }
        Command::MoveMetric {
            file,
            widget,
            index,
            new_index,
            output,
        } => {
            let mut document = DashboardDocument::load(&file)?;
            document.widgets = move_widget_metric(&document.widgets, &widget, index, new_index)?;
            tracing::info!(widget = %widget, index, new_index, "Moved metric");
            emit(&document, output.as_deref(), config)?;
            Ok(true)
        }
        Command::Check { file } => {
            let document = DashboardDocument::load(&file)?;
            let violations = check_widgets(&document.widgets);
            for violation in &violations {
                tracing::warn!(%violation, "Integrity violation");
            }
            emit(&violations, None, config)?;
            Ok(violations.is_empty())
        }
        Command::Renumber { file, output } => {
            let mut document = DashboardDocument::load(&file)?;
            document.widgets = sync_section_children(&renumber(&document.widgets));
            tracing::info!(widgets = document.widgets.len(), "Renumbered dashboard");
            emit(&document, output.as_deref(), config)?;
            Ok(true)
        }
    }
}

/// Serialize `value` as JSON to `output`, or to stdout when no path is given.
fn emit<T: Serialize + ?Sized>(
    value: &T,
    output: Option<&Path>,
    config: &CliConfig,
) -> CliResult<()> {
    let json = if config.pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };

    match output {
        Some(path) => {
            std::fs::write(path, format!("{json}\n")).map_err(|source| CliError::Write {
                path: path.to_path_buf(),
                source,
            })?;
            tracing::info!(path = %path.display(), "Wrote output");
        }
        None => println!("{json}"),
    }
    Ok(())
}
