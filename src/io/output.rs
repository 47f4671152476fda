use crate::core::MeasurementResult;
use crate::service::InspectionReport;
use colored::*;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Json,
    Markdown,
    Terminal,
}

pub trait OutputWriter {
    fn write_inspections(&mut self, reports: &[InspectionReport<'_>]) -> anyhow::Result<()>;

    fn write_measurement(&mut self, source: &str, result: &MeasurementResult)
        -> anyhow::Result<()>;
}

#[derive(Serialize)]
struct MeasurementOutput<'a> {
    source: &'a str,
    #[serde(flatten)]
    measurement: &'a MeasurementResult,
}

pub struct JsonWriter<W: Write> {
    writer: W,
}

impl<W: Write> JsonWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> OutputWriter for JsonWriter<W> {
    fn write_inspections(&mut self, reports: &[InspectionReport<'_>]) -> anyhow::Result<()> {
        let json = match reports {
            [single] => serde_json::to_string_pretty(single)?,
            many => serde_json::to_string_pretty(many)?,
        };
        writeln!(self.writer, "{json}")?;
        Ok(())
    }

    fn write_measurement(
        &mut self,
        source: &str,
        result: &MeasurementResult,
    ) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(&MeasurementOutput {
            source,
            measurement: result,
        })?;
        writeln!(self.writer, "{json}")?;
        Ok(())
    }
}

pub struct MarkdownWriter<W: Write> {
    writer: W,
}

impl<W: Write> MarkdownWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> OutputWriter for MarkdownWriter<W> {
    fn write_inspections(&mut self, reports: &[InspectionReport<'_>]) -> anyhow::Result<()> {
        self.write_header(reports)?;
        for report in reports {
            self.write_summary(report)?;
            self.write_suggestions(report)?;
            self.write_matches(report)?;
            self.write_rewrite(report)?;
        }
        Ok(())
    }

    fn write_measurement(
        &mut self,
        source: &str,
        result: &MeasurementResult,
    ) -> anyhow::Result<()> {
        writeln!(self.writer, "# Greenmap Measurement")?;
        writeln!(self.writer)?;
        writeln!(self.writer, "| Metric | Value |")?;
        writeln!(self.writer, "|--------|-------|")?;
        writeln!(self.writer, "| Source | `{source}` |")?;
        writeln!(self.writer, "| Status | {} |", result.status())?;
        if let Some(duration) = result.duration_sec() {
            writeln!(self.writer, "| Duration | {duration:.4} s |")?;
            writeln!(self.writer, "| Emissions | {:e} kg CO2 |", result.emissions_kg())?;
        }
        if let Some(error) = result.error() {
            writeln!(self.writer, "| Error | {error} |")?;
        }
        if let Some(message) = result.execution_error() {
            writeln!(self.writer, "| Raised | `{message}` |")?;
        }
        Ok(())
    }
}

impl<W: Write> MarkdownWriter<W> {
    fn write_header(&mut self, reports: &[InspectionReport<'_>]) -> anyhow::Result<()> {
        writeln!(self.writer, "# Greenmap Report")?;
        writeln!(self.writer)?;
        if let Some(first) = reports.first() {
            writeln!(
                self.writer,
                "Generated: {}",
                first.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
            )?;
            writeln!(self.writer, "Version: {}", first.version)?;
            writeln!(self.writer)?;
        }
        Ok(())
    }

    fn write_summary(&mut self, report: &InspectionReport<'_>) -> anyhow::Result<()> {
        writeln!(self.writer, "## {}", report.source)?;
        writeln!(self.writer)?;
        if let Some(error) = &report.report.error {
            writeln!(self.writer, "> **Error:** {error}")?;
            writeln!(self.writer)?;
        }
        writeln!(self.writer, "| Metric | Value | Status |")?;
        writeln!(self.writer, "|--------|-------|--------|")?;
        writeln!(
            self.writer,
            "| Efficiency Score | {} / 100 | {} |",
            report.report.score,
            score_status(report.report.score)
        )?;
        writeln!(self.writer, "| Energy | {} Wh | - |", report.report.energy_wh)?;
        writeln!(self.writer, "| CO2 | {} g | - |", report.report.co2_grams)?;
        writeln!(self.writer, "| Operations | {} | - |", report.report.operations)?;
        writeln!(self.writer)?;
        Ok(())
    }

    fn write_suggestions(&mut self, report: &InspectionReport<'_>) -> anyhow::Result<()> {
        if report.report.suggestions.is_empty() {
            return Ok(());
        }
        writeln!(self.writer, "### Suggestions")?;
        writeln!(self.writer)?;
        for suggestion in &report.report.suggestions {
            writeln!(self.writer, "- {suggestion}")?;
        }
        writeln!(self.writer)?;
        Ok(())
    }

    fn write_matches(&mut self, report: &InspectionReport<'_>) -> anyhow::Result<()> {
        if report.matches.is_empty() {
            return Ok(());
        }
        writeln!(self.writer, "### Matched Patterns")?;
        writeln!(self.writer)?;
        writeln!(self.writer, "| Rule | Line | Fix |")?;
        writeln!(self.writer, "|------|------|-----|")?;
        for found in &report.matches {
            writeln!(
                self.writer,
                "| {} | {} | {} |",
                found.rule_id,
                found.line,
                found.fix_description.replace('|', "\\|")
            )?;
        }
        writeln!(self.writer)?;
        Ok(())
    }

    fn write_rewrite(&mut self, report: &InspectionReport<'_>) -> anyhow::Result<()> {
        if !report.rewrite.changed() {
            return Ok(());
        }
        writeln!(self.writer, "### Proposed Rewrite")?;
        writeln!(self.writer)?;
        writeln!(self.writer, "```python")?;
        writeln!(self.writer, "{}", report.rewrite.rewritten_code.trim_end())?;
        writeln!(self.writer, "```")?;
        writeln!(self.writer)?;
        write!(self.writer, "{}", report.rewrite.rationale)?;
        Ok(())
    }
}

pub struct TerminalWriter<W: Write> {
    writer: W,
}

impl Default for TerminalWriter<std::io::Stdout> {
    fn default() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> TerminalWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> OutputWriter for TerminalWriter<W> {
    fn write_inspections(&mut self, reports: &[InspectionReport<'_>]) -> anyhow::Result<()> {
        for report in reports {
            self.print_header(report)?;
            self.print_summary(report)?;
            self.print_matches(report)?;
            self.print_rewrite(report)?;
        }
        Ok(())
    }

    fn write_measurement(
        &mut self,
        source: &str,
        result: &MeasurementResult,
    ) -> anyhow::Result<()> {
        writeln!(self.writer, "{} {}", "Measured".bold(), source.cyan())?;
        let status = match result {
            MeasurementResult::Completed { .. } => result.status().green(),
            MeasurementResult::CompletedWithError { .. } => result.status().yellow(),
            MeasurementResult::Timeout { .. } | MeasurementResult::Failed { .. } => {
                result.status().red()
            }
        };
        writeln!(self.writer, "  Status:    {status}")?;
        if let Some(duration) = result.duration_sec() {
            writeln!(self.writer, "  Duration:  {duration:.4} s")?;
            writeln!(self.writer, "  Emissions: {:e} kg CO2", result.emissions_kg())?;
        }
        if let Some(error) = result.error() {
            writeln!(self.writer, "  Error:     {}", error.red())?;
        }
        if let Some(message) = result.execution_error() {
            writeln!(self.writer, "  Raised:    {}", message.yellow())?;
        }
        Ok(())
    }
}

impl<W: Write> TerminalWriter<W> {
    fn print_header(&mut self, report: &InspectionReport<'_>) -> anyhow::Result<()> {
        let divider = "═".repeat(50);
        writeln!(self.writer, "{}", divider.blue())?;
        writeln!(self.writer, "    {} {}", "GREENMAP".bold(), report.source.cyan())?;
        writeln!(self.writer, "{}", divider.blue())?;
        Ok(())
    }

    fn print_summary(&mut self, report: &InspectionReport<'_>) -> anyhow::Result<()> {
        let stats = &report.report;
        if let Some(error) = &stats.error {
            writeln!(self.writer, "{}", error.red().bold())?;
        }

        let label = format!("{} / 100", stats.score);
        let score = if stats.score >= 80 {
            label.green()
        } else if stats.score >= 50 {
            label.yellow()
        } else {
            label.red()
        };
        writeln!(self.writer, "  Efficiency score: {score}")?;
        writeln!(self.writer, "  Energy:           {} Wh", stats.energy_wh)?;
        writeln!(self.writer, "  CO2:              {} g", stats.co2_grams)?;

        if !stats.suggestions.is_empty() {
            writeln!(self.writer)?;
            writeln!(self.writer, "{}", "Suggestions".bold())?;
            for suggestion in &stats.suggestions {
                writeln!(self.writer, "  • {suggestion}")?;
            }
        }
        Ok(())
    }

    fn print_matches(&mut self, report: &InspectionReport<'_>) -> anyhow::Result<()> {
        if report.matches.is_empty() {
            writeln!(self.writer)?;
            writeln!(self.writer, "{}", "No known wasteful patterns found".green())?;
            return Ok(());
        }

        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec!["Rule", "Line", "Fix"]);
        for found in &report.matches {
            table.add_row(vec![
                found.rule_id.to_string(),
                found.line.to_string(),
                found.fix_description.to_string(),
            ]);
        }

        writeln!(self.writer)?;
        writeln!(self.writer, "{}", "Matched patterns".bold())?;
        writeln!(self.writer, "{table}")?;
        Ok(())
    }

    fn print_rewrite(&mut self, report: &InspectionReport<'_>) -> anyhow::Result<()> {
        if !report.rewrite.changed() {
            return Ok(());
        }
        writeln!(self.writer)?;
        writeln!(self.writer, "{}", "Proposed rewrite".bold())?;
        for line in report.rewrite.rewritten_code.lines() {
            writeln!(self.writer, "  {}", line.green())?;
        }
        writeln!(self.writer)?;
        writeln!(self.writer, "{}", report.rewrite.rationale.trim_end())?;
        Ok(())
    }
}

fn score_status(score: u32) -> &'static str {
    if score >= 80 {
        "✅ Efficient"
    } else if score >= 50 {
        "⚠️ Moderate"
    } else {
        "❌ Wasteful"
    }
}

pub fn create_writer<'w>(
    format: OutputFormat,
    destination: Box<dyn Write + 'w>,
) -> Box<dyn OutputWriter + 'w> {
    match format {
        OutputFormat::Json => Box::new(JsonWriter::new(destination)),
        OutputFormat::Markdown => Box::new(MarkdownWriter::new(destination)),
        OutputFormat::Terminal => Box::new(TerminalWriter::new(destination)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GreenmapConfig, SamplerKind};
    use crate::service::GreenAnalyzer;

    fn analyzer() -> GreenAnalyzer {
        let mut config = GreenmapConfig::default();
        config.energy.sampler = SamplerKind::None;
        GreenAnalyzer::from_config(&config).unwrap()
    }

    fn render(format: OutputFormat, reports: &[InspectionReport<'_>]) -> String {
        let mut buffer = Vec::new();
        create_writer(format, Box::new(&mut buffer))
            .write_inspections(reports)
            .unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn test_json_single_report_is_object_without_pattern() {
        let analyzer = analyzer();
        let report = analyzer.inspect("a.py", "total = sum([x for x in xs])");
        let output = render(OutputFormat::Json, std::slice::from_ref(&report));

        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["source"], "a.py");
        assert_eq!(value["matches"][0]["rule_id"], "gen_exp");
        assert!(value["matches"][0].get("pattern").is_none());
        assert_eq!(value["rewrite"]["rewritten_code"], "total = sum(x for x in xs)");
    }

    #[test]
    fn test_json_many_reports_is_array() {
        let analyzer = analyzer();
        let reports = vec![analyzer.inspect("a.py", "x = 1"), analyzer.inspect("b.py", "y = 2")];
        let value: serde_json::Value =
            serde_json::from_str(&render(OutputFormat::Json, &reports)).unwrap();
        assert_eq!(value.as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn test_markdown_sections() {
        let analyzer = analyzer();
        let report = analyzer.inspect("a.py", "for i in range(len(xs)):\n    total = sum([x for x in xs])\n");
        let output = render(OutputFormat::Markdown, std::slice::from_ref(&report));

        assert!(output.starts_with("# Greenmap Report"));
        assert!(output.contains("## a.py"));
        assert!(output.contains("### Suggestions"));
        assert!(output.contains("| enum_opt |"));
        assert!(output.contains("```python"));
        assert!(output.contains("Memory Optimization"));
    }

    #[test]
    fn test_terminal_lists_matches() {
        let analyzer = analyzer();
        let report = analyzer.inspect("a.py", "while 1:\n    break\n");
        let output = render(OutputFormat::Terminal, std::slice::from_ref(&report));
        assert!(output.contains("while_one"));
        assert!(output.contains("Use 'while True'"));
    }

    #[test]
    fn test_measurement_json_is_flat() {
        let mut buffer = Vec::new();
        JsonWriter::new(&mut buffer)
            .write_measurement("<stdin>", &MeasurementResult::Timeout { timeout_sec: 0.5 })
            .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(value["source"], "<stdin>");
        assert_eq!(value["status"], "timeout");
        assert_eq!(value["error"], "Timeout");
    }
}
