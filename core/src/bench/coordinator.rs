use std::{collections::HashMap, sync::Arc};

use anyhow::Context as _;
use tokio::{
    sync::{Mutex, Semaphore},
    task::JoinSet,
};

use super::{
    executor::TestExecutor,
    language::LanguageSpec,
    table::{LanguageRow, ResultsTable},
    testcase::TestCase,
};
use crate::toolchain::Toolchain;

/// Called after every finished pair. Invoked from worker tasks.
pub type PairHook = Arc<dyn Fn(&TestCase, &LanguageRow) + Send + Sync>;

/// Runs every language against every test case.
///
/// Each language runs its test cases strictly in order on one worker; up to
/// `jobs` languages run at the same time. Languages sharing a toolchain never
/// overlap. The result is ordered by (priority, declaration order) regardless
/// of completion order.
#[derive(Clone)]
pub struct Coordinator {
    executor: Arc<TestExecutor>,
    jobs: usize,
    on_pair_done: Option<PairHook>,
}

impl Coordinator {
    pub fn new(executor: TestExecutor) -> Self {
        Self {
            executor: Arc::new(executor),
            jobs: 1,
            on_pair_done: None,
        }
    }

    pub fn jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    pub fn on_pair_done(mut self, hook: PairHook) -> Self {
        self.on_pair_done = Some(hook);
        self
    }

    pub fn get_executor(&self) -> &TestExecutor {
        &self.executor
    }

    /// Priority order: ascending `order`, ties keep declaration order.
    pub fn sort_by_priority(languages: &[LanguageSpec]) -> Vec<LanguageSpec> {
        let mut v = languages.to_vec();
        v.sort_by_key(LanguageSpec::get_order); // stable
        v
    }

    pub async fn run_all(
        &self,
        languages: &[LanguageSpec],
        cases: &[TestCase],
    ) -> anyhow::Result<ResultsTable> {
        let ordered = Self::sort_by_priority(languages);
        if self.jobs == 1 {
            let mut finished = Vec::with_capacity(ordered.len());
            for lang in &ordered {
                finished.push(
                    run_language(&self.executor, lang, cases, self.on_pair_done.as_ref()).await?,
                );
            }
            return Ok(ResultsTable::from_language_rows(cases, finished));
        }

        let cases: Arc<[TestCase]> = cases.into();
        let permits = Arc::new(Semaphore::new(self.jobs));
        let locks = toolchain_locks(&ordered);

        let mut workers = JoinSet::new();
        for (rank, lang) in ordered.into_iter().enumerate() {
            let executor = self.executor.clone();
            let cases = cases.clone();
            let permits = permits.clone();
            let lock = locks[&toolchain_key(&lang)].clone();
            let hook = self.on_pair_done.clone();

            workers.spawn(async move {
                // Toolchain first: a worker queued behind a busy toolchain must not hold a slot.
                let _toolchain = lock.lock().await;
                let _permit = permits
                    .acquire_owned()
                    .await
                    .context("Worker pool is closed")?;

                let rows = run_language(&executor, &lang, &cases, hook.as_ref()).await?;
                anyhow::Ok((rank, rows))
            });
        }

        let mut finished = Vec::with_capacity(workers.len());
        while let Some(joined) = workers.join_next().await {
            let res = joined
                .context("Benchmark worker panicked")
                .and_then(|res| res);
            match res {
                Ok(done) => finished.push(done),
                Err(e) => {
                    // Dropping the remaining workers kills their processes and cleans their artifacts.
                    workers.shutdown().await;
                    return Err(e);
                }
            }
        }

        finished.sort_by_key(|(rank, _)| *rank);
        Ok(ResultsTable::from_language_rows(
            &cases,
            finished.into_iter().map(|(_, rows)| rows),
        ))
    }
}

/// All test cases of one language, strictly in order.
async fn run_language(
    executor: &TestExecutor,
    lang: &LanguageSpec,
    cases: &[TestCase],
    hook: Option<&PairHook>,
) -> anyhow::Result<Vec<LanguageRow>> {
    let mut rows = Vec::with_capacity(cases.len());
    for case in cases {
        let samples = executor
            .execute(lang, case)
            .await
            .with_context(|| format!("Failed to benchmark {}", lang.name()))?;
        let row = LanguageRow::new(lang, &samples);
        if let Some(hook) = hook {
            hook(case, &row);
        }
        rows.push(row);
    }
    Ok(rows)
}

fn toolchain_key(lang: &LanguageSpec) -> String {
    match lang.get_toolchain() {
        Toolchain::Found(path) => path.to_string_lossy().into_owned(),
        _ => format!("lang:{}", lang.name()),
    }
}

fn toolchain_locks(languages: &[LanguageSpec]) -> HashMap<String, Arc<Mutex<()>>> {
    languages
        .iter()
        .map(|lang| (toolchain_key(lang), Arc::new(Mutex::new(()))))
        .collect()
}
