//! Text renderings of a finished benchmark run.

use std::time::Duration;

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::bench::{CaseResults, ResultsTable, SummaryStat};
use crate::environment::SystemInfo;
use crate::versions::VersionInfo;

const DEAD: &str = "Dead";

/// How the numbers in a report were obtained.
#[derive(Debug, Clone, Serialize)]
pub struct RunInfo {
    pub generated_at: DateTime<Local>,
    pub repetitions: usize,
    #[serde(rename = "timeout_secs", serialize_with = "serialize_secs")]
    pub timeout: Duration,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<SystemInfo>,
}

impl RunInfo {
    pub fn now(repetitions: usize, timeout: Duration) -> Self {
        Self {
            generated_at: Local::now(),
            repetitions,
            timeout,
            system: None,
        }
    }

    pub fn system(mut self, system: SystemInfo) -> Self {
        self.system = Some(system);
        self
    }
}

fn serialize_secs<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}

#[derive(Serialize)]
struct JsonReport<'a> {
    #[serde(flatten)]
    info: &'a RunInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    versions: Option<&'a [VersionInfo]>,
    #[serde(flatten)]
    results: &'a ResultsTable,
}

pub fn render_json(
    table: &ResultsTable,
    info: &RunInfo,
    versions: Option<&[VersionInfo]>,
) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&JsonReport {
        info,
        versions,
        results: table,
    })
}

pub fn render_markdown(
    table: &ResultsTable,
    info: &RunInfo,
    versions: Option<&[VersionInfo]>,
) -> String {
    let mut out = String::from("# Benchmark results\n\n");
    out += &format!(
        "Generated at {}.\n\n",
        info.generated_at.format("%Y-%m-%d %H:%M:%S %z")
    );

    if let Some(system) = &info.system {
        out += "## Environment\n\n";
        out += &self::system_info_table(system);
        out += "\n\n";
    }

    if let Some(versions) = versions {
        out += "## Compilers & Interpreters\n\n";
        out += &self::version_table(versions);
        out += "\n\n";
    }

    out += "## Performance Tests\n\n";
    out += &format!(
        "Each program was executed {} times with a {} seconds timeout. \
         Tables show the mean of the successful runs and their relative standard deviation.\n\n",
        info.repetitions,
        info.timeout.as_secs_f64()
    );

    for case in table.cases() {
        out += &format!("#### {}\n\n", case.case().title());
        out += &self::results_table(case);
        out += "\n\n";
    }
    out
}

/// One Markdown table: a row per language, in priority order.
pub fn results_table(case: &CaseResults) -> String {
    let mut rows = vec![
        row(["Lang", "Avg. cycles", "Std. cycles", "Avg. hanoi", "Std. hanoi"]),
        row([":-----:"; 5]),
    ];
    for r in case.rows() {
        let cells = [
            mean_cell(&r.cycle),
            rsd_cell(&r.cycle),
            mean_cell(&r.hanoi),
            rsd_cell(&r.hanoi),
        ];
        rows.push(row([
            r.language.as_str(),
            cells[0].as_str(),
            cells[1].as_str(),
            cells[2].as_str(),
            cells[3].as_str(),
        ]));
    }
    rows.join("\n")
}

pub fn version_table(versions: &[VersionInfo]) -> String {
    let mut rows = vec![
        row(["Language", "Available Version"]),
        row([":-----:"; 2]),
    ];
    rows.extend(
        versions
            .iter()
            .map(|v| row([v.language.as_str(), v.version.as_str()])),
    );
    rows.join("\n")
}

pub fn system_info_table(system: &SystemInfo) -> String {
    let mut rows = vec![row(["Info", ""]), row([":-----:"; 2])];
    rows.extend(
        system
            .entries()
            .iter()
            .map(|(label, value)| row([*label, value.as_str()])),
    );
    rows.join("\n")
}

pub fn mean_cell(stat: &SummaryStat) -> String {
    match stat.mean() {
        Some(mean) => format!("{:.3}s", mean),
        None => DEAD.to_owned(),
    }
}

pub fn rsd_cell(stat: &SummaryStat) -> String {
    match (stat.is_available(), stat.rsd_percent()) {
        (true, Some(rsd)) => format!("{:.2}%", rsd),
        (true, None) => "-".to_owned(),
        (false, _) => DEAD.to_owned(),
    }
}

fn row<const N: usize>(cells: [&str; N]) -> String {
    // `|` inside a cell would break the table.
    let cells: Vec<String> = cells.iter().map(|c| c.replace('|', "\\|")).collect();
    format!("| {} |", cells.join(" | "))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::bench::{
        ExecutionOutcome, LanguageRow, LanguageSpec, PairSamples, SampleSet, TestCase, Verdict,
    };
    use chrono::TimeZone;

    fn ms(ms: u64) -> ExecutionOutcome {
        ExecutionOutcome::Success(Duration::from_millis(ms))
    }

    fn table() -> ResultsTable {
        let cases = [TestCase::new(0, 15, 6, 100000)];
        let c = LanguageSpec::new("C", "./c").unwrap();
        let py = LanguageSpec::new("Python", "python3 p.py").unwrap();
        let rows = vec![
            vec![LanguageRow::new(
                &c,
                &PairSamples {
                    cycle: SampleSet::from_attempts(&[ms(1000), ms(3000)]),
                    hanoi: SampleSet::from_attempts(&[ms(250)]),
                },
            )],
            vec![LanguageRow::new(
                &py,
                &PairSamples::uniform(SampleSet::failed(Verdict::Timeout)),
            )],
        ];
        ResultsTable::from_language_rows(&cases, rows)
    }

    fn info() -> RunInfo {
        RunInfo {
            generated_at: Local.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            repetitions: 5,
            timeout: Duration::from_secs(1),
            system: None,
        }
    }

    fn system() -> SystemInfo {
        SystemInfo {
            os: "Arch Linux".to_owned(),
            os_version: None,
            kernel: Some("6.8.1".to_owned()),
            arch: "x86_64".to_owned(),
            cpu_brand: Some("AMD Ryzen 7 5800X 8-Core Processor".to_owned()),
            cpu_cores: Some(8),
            ram_bytes: None,
            hostname: None,
        }
    }

    #[test]
    fn markdown_cells() {
        let t = table();
        assert_eq!(
            results_table(&t.cases()[0]),
            [
                "| Lang | Avg. cycles | Std. cycles | Avg. hanoi | Std. hanoi |",
                "| :-----: | :-----: | :-----: | :-----: | :-----: |",
                "| C | 2.000s | 70.71% | 0.250s | - |",
                "| Python | Dead | Dead | Dead | Dead |",
            ]
            .join("\n")
        );
    }

    #[test]
    fn markdown_document() {
        let versions = [VersionInfo {
            language: "C".to_owned(),
            toolchain: "/usr/bin/gcc".to_owned(),
            version: "gcc 13.2".to_owned(),
        }];
        let md = render_markdown(&table(), &info(), Some(&versions));
        assert!(md.starts_with("# Benchmark results\n"));
        assert!(md.contains("| C | gcc 13.2 |"));
        assert!(md.contains("executed 5 times with a 1 seconds timeout"));
        assert!(md.contains("#### Test 1. - Discs 15, Pegs 6, Iterations 100000\n\n| Lang |"));

        let md = render_markdown(&table(), &info(), None);
        assert!(!md.contains("Compilers & Interpreters"));
    }

    #[test]
    fn system_info_precedes_versions() {
        assert_eq!(
            system_info_table(&system()),
            [
                "| Info |  |",
                "| :-----: | :-----: |",
                "| OS | Arch Linux |",
                "| Architecture | x86_64 |",
                "| Kernel | 6.8.1 |",
                "| CPU | AMD Ryzen 7 5800X 8-Core Processor |",
                "| Cores | 8 |",
            ]
            .join("\n")
        );

        let versions = [VersionInfo {
            language: "C".to_owned(),
            toolchain: "/usr/bin/gcc".to_owned(),
            version: "gcc 13.2".to_owned(),
        }];
        let md = render_markdown(&table(), &info().system(system()), Some(&versions));
        let env_at = md.find("## Environment\n\n| Info |").unwrap();
        let versions_at = md.find("## Compilers & Interpreters").unwrap();
        assert!(env_at < versions_at);

        assert!(!render_markdown(&table(), &info(), None).contains("| Info |"));
    }

    #[test]
    fn pipes_in_names_are_escaped() {
        assert_eq!(row(["a|b", "c"]), "| a\\|b | c |");
    }

    #[test]
    fn json_report() {
        let json = render_json(&table(), &info(), None).unwrap();
        let v: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(v["repetitions"], 5);
        assert_eq!(v["timeout_secs"], 1.0);
        assert!(v.get("versions").is_none());
        assert!(v.get("system").is_none());

        let test = &v["tests"][0];
        assert_eq!(test["discs"], 15);
        assert_eq!(test["results"][0]["language"], "C");
        assert_eq!(test["results"][0]["cycle"]["status"], "measured");
        assert_eq!(test["results"][0]["cycle"]["mean"], 2.0);
        assert_eq!(test["results"][0]["cycle"]["samples"], 2);
        assert_eq!(test["results"][1]["hanoi"]["verdict"], "timeout");

        let json = render_json(&table(), &info().system(system()), None).unwrap();
        let v: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(v["system"]["os"], "Arch Linux");
        assert_eq!(v["system"]["cpu_cores"], 8);
        assert!(v["system"].get("ram_bytes").is_none());
    }
}
