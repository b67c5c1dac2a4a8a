//! Self-contained HTML rendering.

use super::{task_title, Report, ReportFigure};
use crate::error::{FigsyncError, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use maud::{html, Markup, PreEscaped, DOCTYPE};
use std::fs;
use std::path::{Path, PathBuf};

const REPORT_CSS: &str = r#"
body { font-family: sans-serif; margin: 2em auto; max-width: 1100px; color: #222; }
.report-section h2 { padding: 10px; background-color: #f0f0f8; border-left: 5px solid #3498db; }
.report-section h3 { margin-top: 20px; border-bottom: 2px solid #7cb9e8; }
.report-section h4 { margin-top: 15px; color: #2980b9; }
figure { box-shadow: 0 2px 5px rgba(0,0,0,0.1); padding: 10px; margin: 15px 0; }
figure img { max-width: 100%; }
figcaption { font-size: 14px; margin-top: 8px; font-style: italic; }
.missing { color: #a33; }
"#;

/// Serializes a [`Report`] into a document.
pub trait ReportRenderer {
    /// File extension of rendered documents, without the dot.
    fn extension(&self) -> &'static str;
    fn render(&self, report: &Report) -> Result<String>;
}

/// Single-file HTML with every figure inlined as a base64 data URI.
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlReportRenderer;

impl ReportRenderer for HtmlReportRenderer {
    fn extension(&self) -> &'static str {
        "html"
    }

    fn render(&self, report: &Report) -> Result<String> {
        let date = report.date.format("%Y-%m-%d").to_string();
        let markup = html! {
            (DOCTYPE)
            html lang="en" {
                head {
                    meta charset="utf-8";
                    title { (report.title) " - " (date) }
                    style { (PreEscaped(REPORT_CSS)) }
                }
                body {
                    h1 { (report.title) }
                    section class="overview" {
                        h2 { "Analysis Overview" }
                        p { "Report generated on " (date) }
                        p { "This report contains analysis results organized by analysis type." }
                        p { "Total figures: " (report.total_figures) }
                    }
                    @for section in &report.sections {
                        section class="report-section" id=(section.name) {
                            h2 { (section.title) }
                            @for task in &section.tasks {
                                h3 { (task_title(&task.task)) }
                                @for subject in &task.subjects {
                                    h4 { "Subject: " (subject.subject) }
                                    @for condition in &subject.conditions {
                                        h5 { "Condition: " (condition.condition) }
                                        @for figure in &condition.figures {
                                            (figure_markup(figure))
                                        }
                                    }
                                }
                            }
                            @for subdir in &section.subdirectories {
                                h3 { (subdir.title) }
                                @for figure in &subdir.figures {
                                    (figure_markup(figure))
                                }
                            }
                        }
                    }
                }
            }
        };
        Ok(markup.into_string())
    }
}

fn figure_markup(figure: &ReportFigure) -> Markup {
    match data_uri(&figure.path) {
        Ok(uri) => html! {
            figure {
                img src=(uri) alt=(figure.title);
                figcaption { strong { (figure.title) } br; (figure.caption) }
            }
        },
        Err(err) => {
            tracing::warn!("Skipping image {}: {}", figure.path.display(), err);
            html! {
                figure {
                    p class="missing" { "Image unavailable: " (figure.filename) }
                    figcaption { (figure.caption) }
                }
            }
        }
    }
}

fn data_uri(path: &Path) -> std::io::Result<String> {
    let bytes = fs::read(path)?;
    Ok(format!("data:{};base64,{}", mime_type(path), BASE64.encode(bytes)))
}

fn mime_type(path: &Path) -> &'static str {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("").to_ascii_lowercase();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}

/// Render `report` and write it to `<output_dir>/<prefix>_<YYYY-MM-DD>.<ext>`.
pub fn write_report(
    renderer: &dyn ReportRenderer,
    report: &Report,
    output_dir: &Path,
    prefix: &str,
) -> Result<PathBuf> {
    let document = renderer.render(report)?;
    fs::create_dir_all(output_dir)
        .map_err(|source| FigsyncError::CreateDir { path: output_dir.to_path_buf(), source })?;

    let filename = format!("{}_{}.{}", prefix, report.date.format("%Y-%m-%d"), renderer.extension());
    let path = output_dir.join(filename);
    fs::write(&path, document).map_err(|e| {
        FigsyncError::Report(format!("failed to write {}: {}", path.display(), e))
    })?;

    tracing::info!("Report generated at: {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{CategorySection, SubdirSection};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn report_with(figures: Vec<ReportFigure>) -> Report {
        Report {
            title: "Weekly <Report>".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 2, 9).unwrap(),
            total_figures: figures.len(),
            sections: vec![CategorySection {
                name: "meg_analysis".to_string(),
                title: "Meg Analysis".to_string(),
                figure_count: figures.len(),
                tasks: vec![],
                subdirectories: vec![SubdirSection {
                    name: "subject_01".to_string(),
                    title: "Meg Analysis - Subject 01".to_string(),
                    figures,
                }],
            }],
        }
    }

    #[test]
    fn inlines_images_and_escapes_text() {
        let tmp = TempDir::new().expect("tmp");
        let image = tmp.path().join("a.png");
        fs::write(&image, b"\x89PNG").expect("write");

        let report = report_with(vec![ReportFigure {
            path: image,
            filename: "a.png".to_string(),
            title: "A".to_string(),
            caption: "Subject: 01".to_string(),
        }]);
        let html = HtmlReportRenderer.render(&report).expect("render");

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("data:image/png;base64,iVBORw=="));
        assert!(html.contains("Weekly &lt;Report&gt;"));
        assert!(html.contains("Meg Analysis - Subject 01"));
        assert!(html.contains("Total figures: 1"));
    }

    #[test]
    fn missing_image_is_rendered_as_placeholder() {
        let report = report_with(vec![ReportFigure {
            path: PathBuf::from("/definitely/not/here.png"),
            filename: "here.png".to_string(),
            title: "Here".to_string(),
            caption: "No metadata available".to_string(),
        }]);
        let html = HtmlReportRenderer.render(&report).expect("render");
        assert!(html.contains("Image unavailable: here.png"));
    }

    #[test]
    fn writes_dated_file() {
        let tmp = TempDir::new().expect("tmp");
        let out = tmp.path().join("reports");
        let path = write_report(&HtmlReportRenderer, &report_with(vec![]), &out, "mne_report")
            .expect("write");
        assert_eq!(path, out.join("mne_report_2024-02-09.html"));
        assert!(path.exists());
    }
}
