//! Master results and the summary report across all surveys under a root

use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use serde::Serialize;

use super::paths::{self, RESULTS_FILE};
use crate::domain::{AnalysisRecord, Summary};

/// Folder under the survey root that receives compiled output
pub const MASTER_DIR: &str = "master_analysis";
pub const MASTER_FILE: &str = "master_results.json";
pub const REPORT_FILE: &str = "analysis_report.txt";

const RULE_WIDTH: usize = 60;

/// Records of one survey folder after duplicate removal
#[derive(Debug, Clone)]
pub struct CompiledSurvey {
    pub name: String,
    pub records: Vec<AnalysisRecord>,
    pub duplicates_removed: usize,
}

impl CompiledSurvey {
    pub fn summary(&self) -> Summary {
        Summary::from_records(&self.records)
    }

    pub fn pending(&self) -> usize {
        self.records.iter().filter(|r| !r.is_complete()).count()
    }
}

/// One row of the master file
#[derive(Debug, Serialize)]
struct MasterRecord<'a> {
    survey: &'a str,
    #[serde(flatten)]
    record: &'a AnalysisRecord,
}

/// Paths written by [`compile`]
#[derive(Debug, Clone)]
pub struct CompileOutput {
    pub master_path: PathBuf,
    pub report_path: PathBuf,
    pub report: String,
}

/// Key identifying one property: house number plus the first word of the street.
///
/// "114 Wirraway Street, Albury" and "114 Wirraway St, East Albury" share a key.
/// Addresses without a house number have none and are never merged.
fn property_key(address: &str) -> Option<String> {
    let number = paths::house_number(address)?;
    let rest = address.trim_start()[number.len()..].trim_start();
    let street = rest
        .split(|c: char| c.is_whitespace() || c == ',')
        .find(|word| !word.is_empty())
        .unwrap_or_default()
        .to_lowercase();
    Some(format!("{number} {street}"))
}

/// Collapse records that describe the same property.
///
/// Of each duplicate group the first analyzed record is kept, else the first
/// record. Output keeps the order in which properties first appear.
pub fn dedupe(records: Vec<AnalysisRecord>) -> (Vec<AnalysisRecord>, usize) {
    let mut kept: Vec<AnalysisRecord> = Vec::with_capacity(records.len());
    let mut by_key: HashMap<String, usize> = HashMap::new();
    let mut removed = 0;

    for record in records {
        let Some(key) = property_key(&record.address) else {
            kept.push(record);
            continue;
        };
        match by_key.get(&key) {
            Some(&i) => {
                removed += 1;
                if !kept[i].is_complete() && record.is_complete() {
                    log::debug!("Keeping analyzed {} over {}", record.address, kept[i].address);
                    kept[i] = record;
                }
            }
            None => {
                by_key.insert(key, kept.len());
                kept.push(record);
            }
        }
    }

    (kept, removed)
}

/// Survey folders under `root` that contain a results file, sorted by name
pub fn find_surveys(root: &Path) -> Result<Vec<(String, PathBuf)>> {
    let entries = std::fs::read_dir(root)
        .with_context(|| format!("Failed to read survey root: {}", root.display()))?;

    let mut surveys = Vec::new();
    for entry in entries {
        let entry = entry?;
        let path = entry.path().join(RESULTS_FILE);
        if entry.file_type()?.is_dir() && path.is_file() {
            surveys.push((entry.file_name().to_string_lossy().into_owned(), path));
        }
    }
    surveys.sort();
    Ok(surveys)
}

/// Load and dedupe every survey under `root`. Unreadable files are skipped.
pub fn load_surveys(root: &Path) -> Result<Vec<CompiledSurvey>> {
    let mut surveys = Vec::new();
    for (name, path) in find_surveys(root)? {
        let records = match read_records(&path) {
            Ok(records) => records,
            Err(err) => {
                log::warn!("Skipping {name}: {err:#}");
                continue;
            }
        };
        let (records, duplicates_removed) = dedupe(records);
        if duplicates_removed > 0 {
            log::info!("{name}: removed {duplicates_removed} duplicate address(es)");
        }
        surveys.push(CompiledSurvey {
            name,
            records,
            duplicates_removed,
        });
    }
    Ok(surveys)
}

fn read_records(path: &Path) -> Result<Vec<AnalysisRecord>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("Failed to parse {}", path.display()))
}

fn percent(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 * 100.0 / total as f64
    }
}

fn write_breakdown(out: &mut String, summary: &Summary, indent: &str) {
    let total = summary.total();
    for (label, count) in [
        ("Low", summary.low),
        ("Medium", summary.medium),
        ("High", summary.high),
    ] {
        let _ = writeln!(
            out,
            "{indent}{:<8}{count:5} ({:5.1}%)",
            format!("{label}:"),
            percent(count, total)
        );
    }
}

/// Render the text report for compiled surveys
pub fn render_report(surveys: &[CompiledSurvey]) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let all: Vec<&AnalysisRecord> = surveys.iter().flat_map(|s| &s.records).collect();
    let overall = Summary::from_records(all.iter().copied());
    let pending: usize = surveys.iter().map(CompiledSurvey::pending).sum();
    let duplicates: usize = surveys.iter().map(|s| s.duplicates_removed).sum();
    let analyzed = overall.total();
    let medium_or_high = overall.medium + overall.high;

    let mut out = String::new();
    let _ = writeln!(out, "Garden Analysis Report\n{rule}");
    let _ = writeln!(out, "Generated: {}\n", Local::now().format("%Y-%m-%d %H:%M:%S"));

    let _ = writeln!(out, "SUMMARY\n{rule}");
    let _ = writeln!(out, "Surveys: {}", surveys.len());
    let _ = writeln!(out, "Total addresses: {}", all.len());
    let _ = writeln!(out, "Duplicates removed: {duplicates}");
    let _ = writeln!(out, "Not yet analyzed: {pending}");
    let _ = writeln!(out, "Analyzed: {analyzed}");
    write_breakdown(&mut out, &overall, "  ");
    let _ = writeln!(
        out,
        "Medium or high: {medium_or_high} ({:.1}% of analyzed)",
        percent(medium_or_high, analyzed)
    );
    let _ = writeln!(
        out,
        "High only: {} ({:.1}% of analyzed)\n",
        overall.high,
        percent(overall.high, analyzed)
    );

    let _ = writeln!(out, "BY SURVEY\n{rule}");
    for survey in surveys {
        let summary = survey.summary();
        let _ = writeln!(
            out,
            "{}: {} addresses, {} analyzed, {} pending",
            survey.name,
            survey.records.len(),
            summary.total(),
            survey.pending()
        );
        write_breakdown(&mut out, &summary, "  ");
    }

    let _ = writeln!(out, "{rule}\nEnd of Report");
    out
}

/// Merge every survey under `root` into `<root>/master_analysis/` and write
/// the report next to it
pub fn compile(root: &Path) -> Result<CompileOutput> {
    let surveys = load_surveys(root)?;
    if surveys.is_empty() {
        anyhow::bail!("No survey results found under {}", root.display());
    }

    let master_dir = root.join(MASTER_DIR);
    std::fs::create_dir_all(&master_dir)
        .with_context(|| format!("Failed to create {}", master_dir.display()))?;

    let rows: Vec<MasterRecord<'_>> = surveys
        .iter()
        .flat_map(|survey| {
            survey.records.iter().map(|record| MasterRecord {
                survey: &survey.name,
                record,
            })
        })
        .collect();
    let master_path = master_dir.join(MASTER_FILE);
    std::fs::write(&master_path, serde_json::to_string_pretty(&rows)?)
        .with_context(|| format!("Failed to write {}", master_path.display()))?;

    let report = render_report(&surveys);
    let report_path = master_dir.join(REPORT_FILE);
    std::fs::write(&report_path, &report)
        .with_context(|| format!("Failed to write {}", report_path.display()))?;

    log::info!(
        "Compiled {} records from {} surveys into {}",
        rows.len(),
        surveys.len(),
        master_dir.display()
    );
    Ok(CompileOutput {
        master_path,
        report_path,
        report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Analysis, Likelihood};
    use crate::session::{JsonResultStore, ResultStore};

    fn analyzed(address: &str, likelihood: Likelihood) -> AnalysisRecord {
        AnalysisRecord::analyzed(
            address,
            Analysis {
                reasoning: "from above".to_string(),
                likelihood,
            },
        )
    }

    fn write_survey(root: &Path, name: &str, records: Vec<AnalysisRecord>) {
        let mut store = JsonResultStore::open(root.join(name).join(RESULTS_FILE)).unwrap();
        for record in records {
            store.upsert(record).unwrap();
        }
    }

    #[test]
    fn test_property_key() {
        assert_eq!(
            property_key("114 Wirraway Street, Albury"),
            property_key("114 Wirraway St, East Albury")
        );
        assert_ne!(property_key("12 Oak St"), property_key("12 Elm St"));
        assert_eq!(property_key("Wirraway St"), None);
    }

    #[test]
    fn test_dedupe_prefers_analyzed_record() {
        let records = vec![
            AnalysisRecord::pending("232 Wirraway St, East Albury"),
            AnalysisRecord::pending("Wirraway St"),
            analyzed("232 Wirraway Street, Albury", Likelihood::High),
            analyzed("232 Wirraway St", Likelihood::Low),
            AnalysisRecord::pending("Wirraway St"),
        ];
        let (kept, removed) = dedupe(records);

        assert_eq!(removed, 2);
        assert_eq!(kept.len(), 3);
        assert_eq!(kept[0].address, "232 Wirraway Street, Albury");
        assert_eq!(kept[0].likelihood, Some(Likelihood::High));
    }

    #[test]
    fn test_find_surveys_skips_folders_without_results() {
        let dir = tempfile::tempdir().unwrap();
        write_survey(dir.path(), "Oak_St", vec![analyzed("1 Oak St", Likelihood::Low)]);
        std::fs::create_dir_all(dir.path().join("empty")).unwrap();
        std::fs::write(dir.path().join("stray.json"), "[]").unwrap();

        let surveys = find_surveys(dir.path()).unwrap();
        assert_eq!(surveys.len(), 1);
        assert_eq!(surveys[0].0, "Oak_St");
    }

    #[test]
    fn test_compile_writes_master_and_report() {
        let dir = tempfile::tempdir().unwrap();
        write_survey(
            dir.path(),
            "Elm_St",
            vec![
                analyzed("1 Elm St", Likelihood::High),
                analyzed("3 Elm St", Likelihood::Low),
                AnalysisRecord::pending("5 Elm St"),
            ],
        );
        write_survey(
            dir.path(),
            "Oak_St",
            vec![
                analyzed("2 Oak St", Likelihood::Medium),
                analyzed("4 Oak St", Likelihood::Low),
            ],
        );
        std::fs::create_dir_all(dir.path().join("broken")).unwrap();
        std::fs::write(dir.path().join("broken").join(RESULTS_FILE), "{ nope").unwrap();

        let output = compile(dir.path()).unwrap();

        let master: Vec<serde_json::Value> =
            serde_json::from_str(&std::fs::read_to_string(&output.master_path).unwrap()).unwrap();
        assert_eq!(master.len(), 5);
        assert_eq!(master[0]["survey"], "Elm_St");
        assert_eq!(master[0]["address"], "1 Elm St");
        assert_eq!(master[0]["likelihood"], "high");

        let report = std::fs::read_to_string(&output.report_path).unwrap();
        assert_eq!(report, output.report);
        assert!(report.contains("Surveys: 2"));
        assert!(report.contains("Total addresses: 5"));
        assert!(report.contains("Not yet analyzed: 1"));
        assert!(report.contains("Analyzed: 4"));
        assert!(report.contains("Low:        2 ( 50.0%)"), "{report}");
        assert!(report.contains("Medium or high: 2 (50.0% of analyzed)"));
        assert!(report.contains("High only: 1 (25.0% of analyzed)"));
        assert!(report.contains("Elm_St: 3 addresses, 2 analyzed, 1 pending"));
        assert!(report.contains("Oak_St: 2 addresses, 2 analyzed, 0 pending"));
    }

    #[test]
    fn test_compile_without_surveys_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(compile(dir.path()).is_err());
    }

    #[test]
    fn test_percent_of_nothing_is_zero() {
        assert_eq!(percent(0, 0), 0.0);
        assert_eq!(percent(1, 4), 25.0);
    }
}
