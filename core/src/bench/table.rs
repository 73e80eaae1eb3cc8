use serde::Serialize;

use super::{
    language::LanguageSpec,
    samples::PairSamples,
    stats::SummaryStat,
    testcase::{Dimension, TestCase},
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LanguageRow {
    pub language: String,
    pub order: i64,
    pub cycle: SummaryStat,
    pub hanoi: SummaryStat,
}

impl LanguageRow {
    pub fn new(lang: &LanguageSpec, samples: &PairSamples) -> Self {
        Self {
            language: lang.name().to_owned(),
            order: lang.get_order(),
            cycle: SummaryStat::from_samples(&samples.cycle),
            hanoi: SummaryStat::from_samples(&samples.hanoi),
        }
    }

    pub fn get(&self, dim: Dimension) -> &SummaryStat {
        match dim {
            Dimension::Cycle => &self.cycle,
            Dimension::Hanoi => &self.hanoi,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseResults {
    #[serde(flatten)]
    case: TestCase,
    results: Vec<LanguageRow>,
}

impl CaseResults {
    pub fn case(&self) -> &TestCase {
        &self.case
    }

    /// One row per language, in priority order.
    pub fn rows(&self) -> &[LanguageRow] {
        &self.results
    }
}

/// Final, immutable result of a benchmark run. Every (language, test case)
/// pair is present exactly once.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultsTable {
    tests: Vec<CaseResults>,
}

impl ResultsTable {
    /// `rows_per_language[l][t]` is the row of language `l` for `cases[t]`.
    /// Languages must already be in priority order.
    pub(crate) fn from_language_rows<I>(cases: &[TestCase], rows_per_language: I) -> Self
    where
        I: IntoIterator<Item = Vec<LanguageRow>>,
    {
        let mut tests: Vec<CaseResults> = cases
            .iter()
            .map(|&case| CaseResults {
                case,
                results: Vec::new(),
            })
            .collect();
        for rows in rows_per_language {
            debug_assert_eq!(rows.len(), cases.len());
            for (t, row) in tests.iter_mut().zip(rows) {
                t.results.push(row);
            }
        }
        Self { tests }
    }

    pub fn cases(&self) -> &[CaseResults] {
        &self.tests
    }

    /// Total number of (language, test case) entries.
    pub fn entry_count(&self) -> usize {
        self.tests.iter().map(|t| t.results.len()).sum()
    }

    pub fn get(&self, language: &str, case_index: usize) -> Option<&LanguageRow> {
        self.tests
            .iter()
            .find(|t| t.case.index == case_index)?
            .results
            .iter()
            .find(|row| row.language == language)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::bench::{outcome::Verdict, samples::SampleSet};

    fn row(name: &str, order: i64) -> LanguageRow {
        let lang = LanguageSpec::new(name, "true").unwrap().order(order);
        LanguageRow::new(
            &lang,
            &PairSamples::uniform(SampleSet::failed(Verdict::ToolUnavailable)),
        )
    }

    #[test]
    fn transposes_language_rows_into_cases() {
        let cases = [TestCase::new(0, 3, 6, 10), TestCase::new(1, 4, 6, 20)];
        let table = ResultsTable::from_language_rows(
            &cases,
            vec![
                vec![row("C", 1), row("C", 1)],
                vec![row("Go", 2), row("Go", 2)],
            ],
        );

        assert_eq!(table.entry_count(), 4);
        assert_eq!(table.cases().len(), 2);
        for (t, case) in table.cases().iter().zip(&cases) {
            assert_eq!(t.case(), case);
            let names: Vec<_> = t.rows().iter().map(|r| r.language.as_str()).collect();
            assert_eq!(names, ["C", "Go"]);
        }
        assert!(table.get("Go", 1).is_some());
        assert!(table.get("Go", 2).is_none());
        assert_eq!(
            table.get("C", 0).unwrap().get(Dimension::Hanoi).verdict(),
            Verdict::ToolUnavailable
        );
    }
}
