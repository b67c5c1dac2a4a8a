//! Report assembly from the classified figure tree.
//!
//! Collection is separate from rendering: [`collect_report`] produces a plain
//! [`Report`] value that any [`ReportRenderer`] can serialize.

pub mod html;

pub use html::{write_report, HtmlReportRenderer, ReportRenderer};

use crate::domain::{FigureMetadata, MetadataIndex};
use crate::error::{FigsyncError, Result};
use chrono::NaiveDate;
use globset::GlobSet;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const NO_METADATA: &str = "No metadata available";
const UNKNOWN: &str = "unknown";

/// Attributes shown in captions, in display order. `timestamp` is appended
/// separately as the acquisition date.
const CAPTION_ATTRIBUTES: &[&str] = &["subject", "task", "condition", "component", "analysis_type"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportFigure {
    pub path: PathBuf,
    pub filename: String,
    pub title: String,
    pub caption: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionGroup {
    pub condition: String,
    pub figures: Vec<ReportFigure>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectGroup {
    pub subject: String,
    pub conditions: Vec<ConditionGroup>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskGroup {
    pub task: String,
    pub subjects: Vec<SubjectGroup>,
}

/// Figures in one `<subcat>_<value>` directory of a category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubdirSection {
    pub name: String,
    pub title: String,
    pub figures: Vec<ReportFigure>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategorySection {
    pub name: String,
    pub title: String,
    pub figure_count: usize,
    /// Figures placed directly in the category, grouped task → subject → condition.
    pub tasks: Vec<TaskGroup>,
    pub subdirectories: Vec<SubdirSection>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub title: String,
    pub date: NaiveDate,
    pub total_figures: usize,
    pub sections: Vec<CategorySection>,
}

/// Build the report model for every non-empty category directory under `root`.
pub fn collect_report(
    root: &Path,
    images: &GlobSet,
    index: &MetadataIndex,
    title: &str,
    date: NaiveDate,
) -> Result<Report> {
    let mut sections = Vec::new();
    for category_dir in sorted_entries(root, true)? {
        let figure_count = count_figures(&category_dir, images);
        if figure_count == 0 {
            continue;
        }
        let name = file_name(&category_dir);
        let section_title = section_title(&name);

        let direct: Vec<PathBuf> = sorted_entries(&category_dir, false)?
            .into_iter()
            .filter(|p| is_image(p, images))
            .collect();
        let tasks = group_by_metadata(&direct, index);

        let mut subdirectories = Vec::new();
        for subdir in sorted_entries(&category_dir, true)? {
            let sub_name = file_name(&subdir);
            let figures: Vec<ReportFigure> = sorted_entries(&subdir, false)?
                .into_iter()
                .filter(|p| is_image(p, images))
                .map(|p| report_figure(p, index))
                .collect();
            subdirectories.push(SubdirSection {
                title: format!("{} - {}", section_title, title_case(&sub_name.replace('_', " "))),
                name: sub_name,
                figures,
            });
        }

        sections.push(CategorySection {
            name,
            title: section_title,
            figure_count,
            tasks,
            subdirectories,
        });
    }

    let total_figures = sections.iter().map(|s| s.figure_count).sum();
    Ok(Report { title: title.to_string(), date, total_figures, sections })
}

/// Group figures task → subject → condition. Figures missing from the index
/// land under `unknown` at every level.
pub fn group_by_metadata(figures: &[PathBuf], index: &MetadataIndex) -> Vec<TaskGroup> {
    type Grouped = BTreeMap<String, BTreeMap<String, BTreeMap<String, Vec<ReportFigure>>>>;
    let mut grouped: Grouped = BTreeMap::new();

    for path in figures {
        let filename = file_name(path);
        let (task, subject, condition) = match index.get(&filename) {
            Some(meta) => (
                meta.attribute("task").unwrap_or("unknown_task").to_string(),
                meta.attribute("subject").unwrap_or("unknown_subject").to_string(),
                meta.attribute("condition").unwrap_or("unknown_condition").to_string(),
            ),
            None => (UNKNOWN.to_string(), UNKNOWN.to_string(), UNKNOWN.to_string()),
        };
        grouped
            .entry(task)
            .or_default()
            .entry(subject)
            .or_default()
            .entry(condition)
            .or_default()
            .push(report_figure(path.clone(), index));
    }

    grouped
        .into_iter()
        .map(|(task, subjects)| TaskGroup {
            task,
            subjects: subjects
                .into_iter()
                .map(|(subject, conditions)| SubjectGroup {
                    subject,
                    conditions: conditions
                        .into_iter()
                        .map(|(condition, figures)| ConditionGroup { condition, figures })
                        .collect(),
                })
                .collect(),
        })
        .collect()
}

/// `"Subject: 07 | Task: rest | ... | Date: 20240101T120000"`
pub fn caption(metadata: Option<&FigureMetadata>) -> String {
    let Some(meta) = metadata else {
        return NO_METADATA.to_string();
    };

    let mut parts: Vec<String> = CAPTION_ATTRIBUTES
        .iter()
        .filter_map(|key| {
            meta.attribute(key).map(|value| format!("{}: {}", title_case(&key.replace('_', " ")), value))
        })
        .collect();
    if let Some(timestamp) = meta.attribute("timestamp") {
        parts.push(format!("Date: {timestamp}"));
    }

    if parts.is_empty() {
        NO_METADATA.to_string()
    } else {
        parts.join(" | ")
    }
}

/// Human-readable title for a figure: extension dropped, underscores as spaces.
pub fn figure_title(filename: &str) -> String {
    let stem = Path::new(filename).file_stem().and_then(|s| s.to_str()).unwrap_or(filename);
    title_case(&stem.replace('_', " "))
}

/// `time_frequency` → `Time Frequency`
pub fn section_title(name: &str) -> String {
    title_case(&name.replace('_', " "))
}

pub fn task_title(task: &str) -> String {
    format!("{} Task", title_case(&task.replace('_', " ")))
}

/// Uppercase the first letter of every run of letters, lowercase the rest.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_word = false;
    for ch in text.chars() {
        if ch.is_alphabetic() {
            if in_word {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(ch);
            in_word = false;
        }
    }
    out
}

fn report_figure(path: PathBuf, index: &MetadataIndex) -> ReportFigure {
    let filename = file_name(&path);
    ReportFigure {
        title: figure_title(&filename),
        caption: caption(index.get(&filename)),
        filename,
        path,
    }
}

fn file_name(path: &Path) -> String {
    path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default()
}

fn is_image(path: &Path, images: &GlobSet) -> bool {
    path.is_file() && path.file_name().is_some_and(|name| images.is_match(name))
}

fn count_figures(dir: &Path, images: &GlobSet) -> usize {
    WalkDir::new(dir)
        .min_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file() && images.is_match(entry.file_name()))
        .count()
}

/// Immediate children of `dir` that are directories (`dirs = true`) or not.
fn sorted_entries(dir: &Path, dirs: bool) -> Result<Vec<PathBuf>> {
    let listing_err = |source: std::io::Error| FigsyncError::Listing { path: dir.to_path_buf(), source };
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir).map_err(listing_err)? {
        let entry = entry.map_err(listing_err)?;
        if entry.file_type().map_err(listing_err)?.is_dir() == dirs {
            entries.push(entry.path());
        }
    }
    entries.sort();
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::extract::MetadataExtractor;
    use chrono::NaiveDateTime;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 5).unwrap().and_hms_opt(10, 0, 0).unwrap()
    }

    fn index_of(names: &[&str]) -> MetadataIndex {
        names
            .iter()
            .map(|n| (n.to_string(), MetadataExtractor::default_patterns().extract(n, now())))
            .collect()
    }

    #[test]
    fn caption_orders_attributes() {
        let index = index_of(&["sub-07_task-mindsentences_cond-A_meg_N100_20240101T120000.png"]);
        let meta = index.values().next();
        assert_eq!(
            caption(meta),
            "Subject: 07 | Task: mindsentences | Condition: A | Component: N100 | Analysis Type: meg | Date: 20240101T120000"
        );
    }

    #[test]
    fn caption_without_metadata() {
        assert_eq!(caption(None), "No metadata available");
        let index = index_of(&["randomfile.png"]);
        assert_eq!(caption(index.values().next()), "No metadata available");
    }

    #[test]
    fn titles() {
        assert_eq!(figure_title("sub-07_evoked_n100.png"), "Sub-07 Evoked N100");
        assert_eq!(section_title("source_localization"), "Source Localization");
        assert_eq!(task_title("mindsentences"), "Mindsentences Task");
        assert_eq!(title_case("EEG erp"), "Eeg Erp");
    }

    #[test]
    fn groups_with_unknown_fallbacks() {
        let index = index_of(&["task-rest_sub-01_meg.png", "task-rest_meg.png"]);
        let figures = vec![
            PathBuf::from("/r/meg_analysis/task-rest_sub-01_meg.png"),
            PathBuf::from("/r/meg_analysis/task-rest_meg.png"),
            PathBuf::from("/r/meg_analysis/untracked.png"),
        ];

        let groups = group_by_metadata(&figures, &index);
        let tasks: Vec<&str> = groups.iter().map(|g| g.task.as_str()).collect();
        assert_eq!(tasks, vec!["rest", "unknown"]);

        let rest = &groups[0];
        let subjects: Vec<&str> = rest.subjects.iter().map(|s| s.subject.as_str()).collect();
        assert_eq!(subjects, vec!["01", "unknown_subject"]);
        assert_eq!(rest.subjects[0].conditions[0].condition, "unknown_condition");

        let unknown = &groups[1];
        assert_eq!(unknown.subjects[0].subject, "unknown");
        assert_eq!(unknown.subjects[0].conditions[0].figures[0].caption, "No metadata available");
    }

    #[test]
    fn collects_sections_from_tree() {
        let tmp = tempfile::TempDir::new().expect("tmp");
        let root = tmp.path();
        fs::create_dir_all(root.join("eeg_analysis/subject_01")).expect("mkdir");
        fs::create_dir_all(root.join("connectivity")).expect("mkdir");
        fs::create_dir_all(root.join("misc")).expect("mkdir");
        fs::write(root.join("eeg_analysis/subject_01/sub-01_eeg.png"), b"png").expect("write");
        fs::write(root.join("eeg_analysis/grand_erp.png"), b"png").expect("write");
        fs::write(root.join("misc/other.png"), b"png").expect("write");
        fs::write(root.join("metadata.json"), b"{}").expect("write");

        let images = Config::default().image_matcher().expect("globs");
        let index = index_of(&["sub-01_eeg.png", "grand_erp.png"]);
        let date = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        let report = collect_report(root, &images, &index, "Weekly", date).expect("collect");

        assert_eq!(report.total_figures, 3);
        let names: Vec<&str> = report.sections.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["eeg_analysis", "misc"]);

        let eeg = &report.sections[0];
        assert_eq!(eeg.title, "Eeg Analysis");
        assert_eq!(eeg.figure_count, 2);
        assert_eq!(eeg.tasks.len(), 1);
        assert_eq!(eeg.tasks[0].task, "unknown_task");
        assert_eq!(eeg.subdirectories.len(), 1);
        assert_eq!(eeg.subdirectories[0].title, "Eeg Analysis - Subject 01");
        assert_eq!(eeg.subdirectories[0].figures[0].caption, "Subject: 01 | Analysis Type: eeg");
    }
}
