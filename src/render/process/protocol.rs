use serde::{Deserialize, Serialize};

use crate::scale::policy::ScalePolicy;

/// One line written to the renderer's stdin.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Command {
    /// Show or update a layer.
    Add {
        /// Layer name.
        identifier: String,
        /// Left column.
        x: i32,
        /// Top line.
        y: i32,
        /// Local image file.
        path: String,
        /// Width in columns.
        width: u32,
        /// Height in lines.
        height: u32,
        /// Redraw right away.
        draw: bool,
        /// Finish drawing before reading the next command.
        synchronously_draw: bool,
        /// Fit policy, by wire name.
        scaler: ScalePolicy,
        /// Horizontal anchor of the scaled image, `[0, 1]`.
        scaling_position_x: f64,
        /// Vertical anchor of the scaled image, `[0, 1]`.
        scaling_position_y: f64,
    },
    /// Hide a layer.
    Remove {
        /// Layer name.
        identifier: String,
        /// Redraw right away.
        draw: bool,
    },
}

impl Command {
    /// The command as a single JSON line, newline included.
    pub fn to_line(&self) -> serde_json::Result<String> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }

    /// Layer the command refers to.
    pub fn identifier(&self) -> &str {
        match self {
            Self::Add { identifier, .. } | Self::Remove { identifier, .. } => identifier,
        }
    }
}

/// A record read from the renderer's stderr.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct DiagRecord {
    /// Human-readable text.
    #[serde(default)]
    pub message: String,
    /// Failing component or exception name.
    #[serde(default)]
    pub name: String,
    /// Record kind; `"error"` marks a failure.
    #[serde(rename = "type", default)]
    pub kind: String,
}

impl DiagRecord {
    /// Whether the renderer reports a failure.
    pub fn is_error(&self) -> bool {
        self.kind == "error"
    }
}
