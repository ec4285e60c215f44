use crate::domain::model::NameMismatch;
use crate::utils::error::Result;
use std::io::Write;
use std::path::Path;

const TITLE: &str = "Users with Empty or Mismatched Preferred Names";
const TITLE_RULE: &str = "===========================================";
const ENTRY_RULE: &str = "-------------------------------------------";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum ReportFormat {
    #[default]
    Text,
    Csv,
}

pub fn write_text<W: Write>(mut out: W, mismatches: &[NameMismatch]) -> Result<()> {
    writeln!(out, "{}", TITLE)?;
    writeln!(out, "{}", TITLE_RULE)?;
    writeln!(out)?;
    for user in mismatches {
        writeln!(out, "User ID: {}", user.id)?;
        writeln!(out, "Full Name: {}", user.full_name)?;
        writeln!(out, "First Name: {}", user.first_name)?;
        writeln!(out, "Preferred Name: {}", user.preferred_name)?;
        writeln!(out, "Email: {}", user.email)?;
        writeln!(out, "Division: {}", user.division)?;
        writeln!(out, "{}", ENTRY_RULE)?;
    }
    Ok(())
}

pub fn write_csv<W: Write>(out: W, mismatches: &[NameMismatch]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    for user in mismatches {
        writer.serialize(user)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_report(path: &Path, format: ReportFormat, mismatches: &[NameMismatch]) -> Result<()> {
    let file = std::io::BufWriter::new(std::fs::File::create(path)?);
    match format {
        ReportFormat::Text => write_text(file, mismatches)?,
        ReportFormat::Csv => write_csv(file, mismatches)?,
    }
    tracing::info!("📁 Results written to {}", path.display());
    Ok(())
}

/// Without an output file the details go to the log.
pub fn log_mismatches(mismatches: &[NameMismatch]) {
    tracing::info!("=== Detailed Results ===");
    for user in mismatches {
        tracing::info!(
            user_id = %user.id,
            full_name = %user.full_name,
            first_name = %user.first_name,
            preferred_name = %user.preferred_name,
            email = %user.email,
            division = %user.division,
            "mismatched preferred name"
        );
    }
}
