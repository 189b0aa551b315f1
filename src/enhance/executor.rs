use futures::future::BoxFuture;
use futures::stream::{self, StreamExt};
use futures::FutureExt;

/// Runs a batch of jobs and hands back their outputs in input order.
pub trait BatchExecutor: Send + Sync {
    fn run_all<'a, T: Send + 'a>(
        &'a self,
        workers: usize,
        jobs: Vec<BoxFuture<'a, T>>,
    ) -> BoxFuture<'a, Vec<T>>;
}

/// Up to `workers` jobs of a batch running at once.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoundedExecutor;

impl BatchExecutor for BoundedExecutor {
    fn run_all<'a, T: Send + 'a>(
        &'a self,
        workers: usize,
        jobs: Vec<BoxFuture<'a, T>>,
    ) -> BoxFuture<'a, Vec<T>> {
        let mut slots: Vec<Option<T>> = jobs.iter().map(|_| None).collect();

        let tagged: Vec<_> = jobs
            .into_iter()
            .enumerate()
            .map(|(index, job)| job.map(move |output| (index, output)))
            .collect();
        let mut finished = stream::iter(tagged).buffer_unordered(workers.max(1));

        async move {
            // Completion order is arbitrary; place each output by its index.
            while let Some((index, output)) = finished.next().await {
                slots[index] = Some(output);
            }

            slots.into_iter().flatten().collect()
        }
        .boxed()
    }
}

/// One job at a time, in order. Used where determinism matters more than latency.
#[derive(Debug, Clone, Copy, Default)]
pub struct SequentialExecutor;

impl BatchExecutor for SequentialExecutor {
    fn run_all<'a, T: Send + 'a>(
        &'a self,
        _workers: usize,
        jobs: Vec<BoxFuture<'a, T>>,
    ) -> BoxFuture<'a, Vec<T>> {
        async move {
            let mut outputs = Vec::with_capacity(jobs.len());
            for job in jobs {
                outputs.push(job.await);
            }
            outputs
        }
        .boxed()
    }
}
