//! Output formatting: table, JSON, YAML.
//!
//! Renders data in the format selected by `--output`. Table uses `tabled`,
//! structured formats serialize the read model via serde.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use crate::cli::{ColorMode, OutputFormat};
use crate::error::CliError;

/// Resolved presentation settings shared by every handler.
#[derive(Debug, Clone, Copy)]
pub struct Printer {
    pub format: OutputFormat,
    pub color: bool,
    pub quiet: bool,
}

impl Printer {
    pub fn new(format: OutputFormat, color: ColorMode, quiet: bool) -> Self {
        Self {
            format,
            color: should_color(color),
            quiet,
        }
    }

    /// Table rows for `table`, the serialized data otherwise.
    pub fn list<T, R>(&self, data: &T, rows: impl FnOnce() -> Vec<R>) -> Result<String, CliError>
    where
        T: serde::Serialize + ?Sized,
        R: Tabled,
    {
        match self.format {
            OutputFormat::Table => Ok(render_table(&rows())),
            _ => self.structured(data),
        }
    }

    /// Pre-formatted detail text for `table`, the serialized data otherwise.
    pub fn single<T>(&self, data: &T, detail: impl FnOnce() -> String) -> Result<String, CliError>
    where
        T: serde::Serialize + ?Sized,
    {
        match self.format {
            OutputFormat::Table => Ok(detail()),
            _ => self.structured(data),
        }
    }

    fn structured<T: serde::Serialize + ?Sized>(&self, data: &T) -> Result<String, CliError> {
        match self.format {
            OutputFormat::Json | OutputFormat::Table => render_json(data, false),
            OutputFormat::JsonCompact => render_json(data, true),
            OutputFormat::Yaml => render_yaml(data),
        }
    }

    /// Print to stdout, respecting quiet mode.
    pub fn print(&self, output: &str) {
        if self.quiet || output.is_empty() {
            return;
        }
        let mut stdout = io::stdout().lock();
        let _ = writeln!(stdout, "{output}");
    }

    // ── Colour helpers ───────────────────────────────────────────────

    pub fn good(&self, text: &str) -> String {
        if self.color {
            text.green().to_string()
        } else {
            text.to_owned()
        }
    }

    pub fn warn(&self, text: &str) -> String {
        if self.color {
            text.yellow().to_string()
        } else {
            text.to_owned()
        }
    }

    pub fn bad(&self, text: &str) -> String {
        if self.color {
            text.red().bold().to_string()
        } else {
            text.to_owned()
        }
    }

    pub fn dim(&self, text: &str) -> String {
        if self.color {
            text.dimmed().to_string()
        } else {
            text.to_owned()
        }
    }
}

/// Determine whether color output should be enabled.
pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

// ── Format-specific renderers ────────────────────────────────────────

fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

fn render_json<T: serde::Serialize + ?Sized>(data: &T, compact: bool) -> Result<String, CliError> {
    let rendered = if compact {
        serde_json::to_string(data)
    } else {
        serde_json::to_string_pretty(data)
    };
    rendered.map_err(|e| CliError::Render(e.to_string()))
}

fn render_yaml<T: serde::Serialize + ?Sized>(data: &T) -> Result<String, CliError> {
    serde_yaml::to_string(data).map_err(|e| CliError::Render(e.to_string()))
}

/// Empty cell placeholder.
pub fn dash() -> String {
    "-".into()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[derive(Tabled, serde::Serialize)]
    struct Row {
        #[tabled(rename = "ID")]
        id: u32,
    }

    fn printer(format: OutputFormat) -> Printer {
        Printer::new(format, ColorMode::Never, false)
    }

    #[test]
    fn table_and_structured_formats() {
        let data = vec![Row { id: 7 }];
        let table = printer(OutputFormat::Table)
            .list(&data, || vec![Row { id: 7 }])
            .unwrap();
        assert!(table.contains("ID"));

        let compact = printer(OutputFormat::JsonCompact)
            .list(&data, Vec::<Row>::new)
            .unwrap();
        assert_eq!(compact, r#"[{"id":7}]"#);

        let yaml = printer(OutputFormat::Yaml)
            .single(&data[0], String::new)
            .unwrap();
        assert_eq!(yaml.trim(), "id: 7");
    }

    #[test]
    fn colour_is_off_when_disabled() {
        assert_eq!(printer(OutputFormat::Table).bad("down"), "down");
    }
}
