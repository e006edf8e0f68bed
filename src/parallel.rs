//! Worker-pool runner: distributes per-variant scoring across a fixed pool
//! of workers, each owning a private scorer instance. Bounded channels
//! provide backpressure on both sides; closing the work channel is the
//! shutdown signal. Results are re-sorted by input index before the
//! ordered write pass, trading in-order streaming for throughput.
use crate::annotation::Annotator;
use crate::pipeline::{score_variant, AnnotationSink, RunSummary, ScoringOptions, VariantSource};
use crate::reference::ReferenceGenome;
use crate::scorer::Scorer;
use crate::variant::{AnnotatedRecord, Variant};
use anyhow::{anyhow, ensure, Result};
use crossbeam_channel::bounded;
use log::warn;
use std::thread;

type ScoredItem = (usize, Variant, Result<Vec<String>>);

pub fn run_parallel<Src, Snk, R, S, F>(
    source: &mut Src,
    sink: &mut Snk,
    annotator: &Annotator,
    genome: &R,
    make_scorer: F,
    workers: usize,
    queue_depth: usize,
    options: &ScoringOptions,
) -> Result<RunSummary>
where
    Src: VariantSource,
    Snk: AnnotationSink,
    R: ReferenceGenome + Sync,
    S: Scorer,
    F: Fn() -> S + Sync,
{
    ensure!(workers >= 1, "worker pool needs at least one worker");
    ensure!(queue_depth >= 1, "queue depth must be at least 1");

    let (work_tx, work_rx) = bounded::<(usize, Variant)>(queue_depth);
    let (result_tx, result_rx) = bounded::<ScoredItem>(queue_depth);

    let mut results = thread::scope(|scope| -> Result<Vec<ScoredItem>> {
        let make_scorer = &make_scorer;
        for _ in 0..workers {
            let work_rx = work_rx.clone();
            let result_tx = result_tx.clone();
            scope.spawn(move || {
                // each worker owns its ensemble: the inference call is not
                // assumed to be reentrant
                let scorer = make_scorer();
                for (index, variant) in work_rx {
                    let scored = score_variant(&variant, annotator, genome, &scorer, options);
                    if result_tx.send((index, variant, scored)).is_err() {
                        break;
                    }
                }
            });
        }
        drop(work_rx);
        drop(result_tx);

        let collector = scope.spawn(move || result_rx.into_iter().collect::<Vec<_>>());

        let mut fed = 0usize;
        while let Some(next) = source.next_variant() {
            match next {
                Ok(variant) => {
                    work_tx
                        .send((fed, variant))
                        .map_err(|_| anyhow!("worker pool shut down while feeding"))?;
                    fed += 1;
                }
                Err(err) => warn!("skipping record (bad input): {err}"),
            }
        }
        drop(work_tx);

        collector
            .join()
            .map_err(|_| anyhow!("result collector panicked"))
    })?;

    results.sort_by_key(|(index, _, _)| *index);

    let mut summary = RunSummary::default();
    for (_, variant, scored) in results {
        let annotations = scored?;
        summary.records += 1;
        summary.annotations += annotations.len();
        sink.write(&AnnotatedRecord {
            variant,
            annotations,
        })?;
    }
    Ok(summary)
}
