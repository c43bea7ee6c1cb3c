//! Rendering and persistence of composed reports.
//!
//! Every report is written twice: as pretty JSON (the full tree, for other
//! tools) and as a Markdown document meant for people.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fmt::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::analyzers::tier::PerformanceTier;
use crate::analyzers::types::{AggregateStats, LayoutSegments};
use crate::config::ReportConfig;
use crate::records::display_score;
use crate::report::{Institution, InstructorSummary, ProgramReport};

const BAR_WIDTH: usize = 40;
const BAR_GLYPHS: [char; 4] = ['█', '▓', '▒', '░'];

/// Serializes `value` as pretty JSON into `path`, creating parent directories.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let body = serde_json::to_string_pretty(value)?;
    std::fs::write(path, body).with_context(|| format!("failed to write {}", path.display()))?;
    debug!(path = %path.display(), "Wrote JSON report");
    Ok(())
}

/// Writes a Markdown document into `path`, creating parent directories.
pub fn write_text(path: &Path, body: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(path, body).with_context(|| format!("failed to write {}", path.display()))?;
    debug!(path = %path.display(), "Wrote Markdown report");
    Ok(())
}

/// File-name-safe form of a label (`"Ana Ruiz/2"` → `"Ana_Ruiz_2"`).
pub fn file_stem(label: &str) -> String {
    let stem = label.trim().replace([' ', '/', '\\'], "_");
    if stem.is_empty() { "sin_nombre".to_string() } else { stem }
}

/// Files produced for one report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenReport {
    pub json: PathBuf,
    pub markdown: PathBuf,
    /// Classroom-level detail, written for program reports only.
    pub detail: Option<PathBuf>,
}

pub fn write_instructor(
    out_dir: &Path,
    date: &str,
    summary: &InstructorSummary,
    config: &ReportConfig,
) -> Result<WrittenReport> {
    let stem = format!(
        "{}_docente_{}_{}",
        date,
        file_stem(&summary.name),
        file_stem(&summary.id)
    );
    let dir = out_dir.join("instructors");
    let report = WrittenReport {
        json: dir.join(format!("{stem}.json")),
        markdown: dir.join(format!("{stem}.md")),
        detail: None,
    };
    write_json(&report.json, summary)?;
    write_text(&report.markdown, &render_instructor(summary, config, date))?;
    Ok(report)
}

pub fn write_program(
    out_dir: &Path,
    date: &str,
    program: &ProgramReport,
    config: &ReportConfig,
) -> Result<WrittenReport> {
    let stem = format!("{}_{}", date, file_stem(&program.name));
    let dir = out_dir.join("programs");
    let report = WrittenReport {
        json: dir.join(format!("{stem}__resumen.json")),
        markdown: dir.join(format!("{stem}__resumen.md")),
        detail: Some(dir.join(format!("{stem}__detalle.md"))),
    };
    write_json(&report.json, program)?;
    write_text(&report.markdown, &render_program_summary(program, config, date))?;
    if let Some(detail) = &report.detail {
        write_text(detail, &render_program_detail(program, config))?;
    }
    Ok(report)
}

pub fn write_institution(
    out_dir: &Path,
    date: &str,
    institution: &Institution,
    config: &ReportConfig,
) -> Result<WrittenReport> {
    let dir = out_dir.join("global");
    let report = WrittenReport {
        json: dir.join("global_programas__resumen.json"),
        markdown: dir.join("global_programas__resumen.md"),
        detail: None,
    };
    write_json(&report.json, institution)?;
    write_text(&report.markdown, &render_institution(institution, config, date))?;
    info!(
        programs = institution.programs.len(),
        classrooms = institution.totals.total_count,
        path = %report.markdown.display(),
        "Institution report written"
    );
    Ok(report)
}

/// Text stacked bar: one glyph per tier, widths taken from the layout segments.
pub fn text_bar(layout: &LayoutSegments) -> String {
    if layout.values().iter().all(|w| *w == 0.0) {
        return " ".repeat(BAR_WIDTH);
    }
    let mut bar = String::new();
    let mut used = 0usize;
    for tier in PerformanceTier::ALL {
        let cells = if tier == PerformanceTier::Unsatisfactory {
            BAR_WIDTH.saturating_sub(used)
        } else {
            ((layout.get(tier) / 100.0) * BAR_WIDTH as f64).round() as usize
        };
        let cells = cells.min(BAR_WIDTH - used);
        used += cells;
        bar.extend(std::iter::repeat_n(BAR_GLYPHS[tier.index()], cells));
    }
    bar
}

fn write_kpis(output: &mut String, stats: &AggregateStats, config: &ReportConfig) {
    let _ = writeln!(output, "| Indicador | Valor | % |");
    let _ = writeln!(output, "|---|---:|---:|");
    let _ = writeln!(output, "| Aulas evaluadas | {} | |", stats.total_count);
    let _ = writeln!(output, "| Promedio final | {} | |", stats.display_average());
    for tier in PerformanceTier::ALL {
        let _ = writeln!(
            output,
            "| {} | {} | {:.1}% |",
            config.styles.get(tier).label,
            stats.tier_counts.get(tier),
            stats.tier_percents.get(tier)
        );
    }
    let _ = writeln!(output);
    let layout = stats.layout();
    let _ = writeln!(output, "`{}`", text_bar(&layout));
    let _ = writeln!(
        output,
        "Segmentos: {:.4}% · {:.4}% · {:.4}% · {:.4}%",
        layout.excellent, layout.good, layout.acceptable, layout.unsatisfactory
    );
    let _ = writeln!(output);
}

fn write_classroom_table(output: &mut String, summary: &InstructorSummary, config: &ReportConfig) {
    let _ = writeln!(
        output,
        "| NRC | Asignatura | Programa | Alistamiento | Ejecución | Final | Desempeño | Revisión |"
    );
    let _ = writeln!(output, "|---|---|---|---:|---:|---:|---|---|");
    for (classroom, tier) in summary.classroom_tiers(&config.bands) {
        let _ = writeln!(
            output,
            "| {} | {} | {} | {} | {} | {} | {} | {} |",
            classroom.nrc,
            classroom.subject,
            classroom.program,
            display_score(classroom.phase1_score),
            display_score(classroom.phase2_score),
            display_score(classroom.final_score),
            config.styles.get(tier).label,
            classroom.review_status().label()
        );
    }
    let _ = writeln!(output);
}

pub fn render_instructor(summary: &InstructorSummary, config: &ReportConfig, date: &str) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Informe final de seguimiento – {}", summary.name);
    let _ = writeln!(output, "Docente ID {} · generado el {}", summary.id, date);
    let _ = writeln!(output);
    write_kpis(&mut output, &summary.totals, config);

    let _ = writeln!(output, "## Resumen final de aulas revisadas");
    write_classroom_table(&mut output, summary, config);
    let _ = writeln!(output, "{}", config.bands.legend(&config.styles));
    let _ = writeln!(output);
    let _ = writeln!(
        output,
        "El promedio final de sus aulas es **{:.1}**, con un {}.",
        summary.totals.average,
        config.styles.get(summary.average_tier).label.to_lowercase()
    );

    output
}

pub fn render_program_summary(program: &ProgramReport, config: &ReportConfig, date: &str) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Informe final – Programa {}", program.name);
    let _ = writeln!(output, "Generado el {}", date);
    let _ = writeln!(output);
    write_kpis(&mut output, &program.totals, config);

    let _ = writeln!(output, "## Docentes");
    let _ = writeln!(output, "| Docente | Aulas | Promedio final |");
    let _ = writeln!(output, "|---|---:|---:|");
    for instructor in &program.instructors {
        let _ = writeln!(
            output,
            "| {} | {} | {} |",
            instructor.name,
            instructor.totals.total_count,
            instructor.totals.display_average()
        );
    }
    let _ = writeln!(output);
    let _ = writeln!(output, "{}", config.bands.legend(&config.styles));

    output
}

/// Classroom-level detail of a program, one table per instructor.
pub fn render_program_detail(program: &ProgramReport, config: &ReportConfig) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Detalle final por NRC – Programa {}", program.name);
    let _ = writeln!(output);
    for instructor in &program.instructors {
        let _ = writeln!(output, "## {} (ID {})", instructor.name, instructor.id);
        write_classroom_table(&mut output, instructor, config);
    }

    output
}

pub fn render_institution(institution: &Institution, config: &ReportConfig, date: &str) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Informe global – Programas académicos");
    let _ = writeln!(output, "Generado el {}", date);
    let _ = writeln!(output);
    write_kpis(&mut output, &institution.totals, config);

    let _ = writeln!(output, "## Distribución por programa");
    for program in institution.comparison_order() {
        let _ = writeln!(
            output,
            "- `{}` {} ({} aulas)",
            text_bar(&program.layout),
            program.name,
            program.totals.total_count
        );
    }
    let _ = writeln!(output);

    let _ = writeln!(output, "## Resumen por programa");
    let _ = writeln!(
        output,
        "| Programa | Aulas | Promedio | Excelente | Bueno | Aceptable | Insatisfactorio |"
    );
    let _ = writeln!(output, "|---|---:|---:|---:|---:|---:|---:|");
    let row = |output: &mut String, label: &str, stats: &AggregateStats| {
        let _ = writeln!(
            output,
            "| {} | {} | {} | {} | {} | {} | {} |",
            label,
            stats.total_count,
            stats.display_average(),
            stats.tier_counts.get(PerformanceTier::Excellent),
            stats.tier_counts.get(PerformanceTier::Good),
            stats.tier_counts.get(PerformanceTier::Acceptable),
            stats.tier_counts.get(PerformanceTier::Unsatisfactory)
        );
    };
    for program in &institution.programs {
        row(&mut output, &program.name, &program.totals);
    }
    row(&mut output, "**TOTAL**", &institution.totals);
    let _ = writeln!(output);

    for program in &institution.programs {
        let _ = write!(output, "{}", render_program_summary(program, config, date));
        let _ = writeln!(output);
    }
    let _ = writeln!(output, "{}", config.bands.legend(&config.styles));

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::tier::TierBands;
    use crate::records::ClassroomRecord;
    use crate::report::{ReportFilters, compose_institution, compose_instructors};

    fn records() -> Vec<ClassroomRecord> {
        let record = |id: &str, name: &str, program: &str, nrc: &str, score: f64| ClassroomRecord {
            instructor_id: id.to_string(),
            instructor_name: name.to_string(),
            email: String::new(),
            program: program.to_string(),
            nrc: nrc.to_string(),
            subject: "Cálculo".to_string(),
            phase1_score: 40.0,
            phase2_score: 45.5,
            final_score: score,
            review_flag: "No seleccionada".to_string(),
        };
        vec![
            record("1", "Ana Ruiz", "Derecho", "10", 95.0),
            record("1", "Ana Ruiz", "Derecho", "11", 65.0),
            record("2", "Luis/Paz", "Contaduría", "20", 85.0),
        ]
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem("Ana Ruiz/2"), "Ana_Ruiz_2");
        assert_eq!(file_stem("   "), "sin_nombre");
    }

    #[test]
    fn test_text_bar_width() {
        let full = LayoutSegments {
            excellent: 50.0,
            good: 0.0,
            acceptable: 0.0,
            unsatisfactory: 50.0,
        };
        let bar = text_bar(&full);
        assert_eq!(bar.chars().count(), BAR_WIDTH);
        assert_eq!(bar.chars().filter(|c| *c == '█').count(), 20);

        let empty = text_bar(&LayoutSegments::default());
        assert_eq!(empty.chars().count(), BAR_WIDTH);
        assert!(empty.trim().is_empty());
    }

    #[test]
    fn test_render_instructor_contents() {
        let config = ReportConfig::default();
        let summaries =
            compose_instructors(&records(), &config.bands, &ReportFilters::default(), None);
        let text = render_instructor(&summaries[0], &config, "2026-10-19");
        assert!(text.contains("Ana Ruiz"));
        assert!(text.contains("| 10 | Cálculo | Derecho | 40 | 45 | 95 | Desempeño excelente | Muestreo: no seleccionada |"));
        assert!(text.contains("**80.0**"));
        assert!(text.contains("Desempeño excelente (91–100)"));
    }

    #[test]
    fn test_namesake_instructors_get_separate_files() {
        let dir = tempfile::tempdir().unwrap();
        let config = ReportConfig::default();
        let mut recs = records();
        recs[2].instructor_name = "Ana Ruiz".to_string();
        let summaries =
            compose_instructors(&recs, &config.bands, &ReportFilters::default(), None);
        assert_eq!(summaries.len(), 2);

        let first = write_instructor(dir.path(), "2026-10-19", &summaries[0], &config).unwrap();
        let second = write_instructor(dir.path(), "2026-10-19", &summaries[1], &config).unwrap();
        assert_ne!(first.json, second.json);
        assert!(first.markdown.exists());
        assert!(second.markdown.exists());
    }

    #[test]
    fn test_write_reports_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let config = ReportConfig::default();
        let recs = records();
        let summaries =
            compose_instructors(&recs, &TierBands::default(), &ReportFilters::default(), None);
        let written = write_instructor(dir.path(), "2026-10-19", &summaries[1], &config).unwrap();
        assert!(written.json.ends_with("instructors/2026-10-19_docente_Luis_Paz_2.json"));
        assert!(written.markdown.exists());

        let json = std::fs::read_to_string(&written.json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["totals"]["total_count"], 1);
        assert_eq!(value["totals"]["tier_counts"]["GOOD"], 1);

        let institution = compose_institution(&recs, &config.bands, &ReportFilters::default());
        let global = write_institution(dir.path(), "2026-10-19", &institution, &config).unwrap();
        let text = std::fs::read_to_string(&global.markdown).unwrap();
        assert!(text.contains("| **TOTAL** | 3 |"));
    }
}
