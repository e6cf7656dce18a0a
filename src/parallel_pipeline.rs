// THEORY:
// Sample points are independent units of work: nothing flows from one point to the
// next, so a survey parallelises by handing whole points to a fixed set of workers.
// A single dispatcher task hands submitted points to the workers round-robin over
// unbounded channels. Each worker runs the CPU-heavy segmentation and classification
// on tokio's blocking pool and replies through the task's own oneshot channel, so a
// caller that stops listening only loses its own result.

use crate::error::{GreenViewError, Result};
use crate::pipeline::GreenViewPipeline;
use crate::survey::image_source::ImageSource;
use crate::survey::metadata::PanoramaRecord;
use crate::survey::point::{headings, measure_point};
use crate::survey::record::GreenViewRecord;
use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error};

/// Everything a worker needs to measure a point, shared by all workers.
#[derive(Clone)]
struct WorkerContext {
    pipeline: Arc<GreenViewPipeline>,
    source: Arc<dyn ImageSource>,
    headings: Arc<[f64]>,
}

struct PointTask {
    panorama: PanoramaRecord,
    result_sender: oneshot::Sender<GreenViewRecord>,
}

struct WorkerPool {
    task_sender: mpsc::UnboundedSender<PointTask>,
    dispatcher: JoinHandle<()>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Must be called from within a tokio runtime.
    fn new(context: WorkerContext, worker_count: usize) -> Self {
        let (task_sender, mut task_receiver) = mpsc::unbounded_channel::<PointTask>();

        let (worker_senders, worker_receivers): (Vec<_>, Vec<_>) = (0..worker_count)
            .map(|_| mpsc::unbounded_channel::<PointTask>())
            .unzip();

        // Spawn dispatcher
        let dispatcher = tokio::spawn(async move {
            let mut worker_idx = 0;
            while let Some(task) = task_receiver.recv().await {
                if worker_senders[worker_idx].send(task).is_err() {
                    error!(worker = worker_idx, "worker stopped; task dropped");
                }
                worker_idx = (worker_idx + 1) % worker_senders.len();
            }
        });

        // Spawn workers
        let workers = worker_receivers
            .into_iter()
            .enumerate()
            .map(|(worker_idx, mut worker_receiver)| {
                let context = context.clone();
                tokio::spawn(async move {
                    while let Some(task) = worker_receiver.recv().await {
                        Self::process_point_worker(worker_idx, &context, task).await;
                    }
                })
            })
            .collect();

        Self {
            task_sender,
            dispatcher,
            workers,
        }
    }

    async fn process_point_worker(worker_idx: usize, context: &WorkerContext, task: PointTask) {
        let PointTask {
            panorama,
            result_sender,
        } = task;
        let pano_id = panorama.pano_id.clone();
        let context = context.clone();

        let measured = tokio::task::spawn_blocking(move || {
            measure_point(
                &context.pipeline,
                context.source.as_ref(),
                panorama,
                &context.headings,
            )
        })
        .await;

        match measured {
            Ok(record) => {
                if result_sender.send(record).is_err() {
                    debug!(worker = worker_idx, pano_id = %pano_id, "result receiver dropped");
                }
            }
            // Dropping the sender tells the caller the point was lost.
            Err(e) => error!(worker = worker_idx, pano_id = %pano_id, error = %e, "point task panicked"),
        }
    }

    async fn process_point(&self, panorama: PanoramaRecord) -> Result<GreenViewRecord> {
        let (result_sender, result_receiver) = oneshot::channel();

        let task = PointTask {
            panorama,
            result_sender,
        };

        self.task_sender
            .send(task)
            .map_err(|_| GreenViewError::Worker("failed to send task to worker pool".into()))?;

        result_receiver
            .await
            .map_err(|_| GreenViewError::Worker("failed to receive result from worker".into()))
    }

    async fn shutdown(self) {
        drop(self.task_sender);
        if let Err(e) = self.dispatcher.await {
            error!(error = %e, "dispatcher did not stop cleanly");
        }
        for worker in self.workers {
            if let Err(e) = worker.await {
                error!(error = %e, "worker did not stop cleanly");
            }
        }
    }
}

/// Measures many sample points concurrently.
pub struct ParallelPipeline {
    worker_pool: WorkerPool,
    worker_count: usize,
}

impl ParallelPipeline {
    /// Must be called from within a tokio runtime.
    pub fn new(
        pipeline: GreenViewPipeline,
        source: Arc<dyn ImageSource>,
        heading_count: usize,
        worker_count: usize,
    ) -> Result<Self> {
        if heading_count == 0 {
            return Err(GreenViewError::InvalidInput("heading_count must be positive".into()));
        }
        if worker_count == 0 {
            return Err(GreenViewError::InvalidInput("worker_count must be positive".into()));
        }
        let context = WorkerContext {
            pipeline: Arc::new(pipeline),
            source,
            headings: headings(heading_count).into(),
        };
        debug!(worker_count, heading_count, "starting worker pool");
        Ok(Self {
            worker_pool: WorkerPool::new(context, worker_count),
            worker_count,
        })
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    pub async fn process_point(&self, panorama: PanoramaRecord) -> Result<GreenViewRecord> {
        self.worker_pool.process_point(panorama).await
    }

    /// Measures every point; results come back in submission order.
    pub async fn process_points(&self, panoramas: Vec<PanoramaRecord>) -> Result<Vec<GreenViewRecord>> {
        let pending = panoramas
            .into_iter()
            .map(|panorama| self.worker_pool.process_point(panorama));
        join_all(pending).await.into_iter().collect()
    }

    /// Stops the dispatcher and workers after queued points finish.
    pub async fn shutdown(self) {
        self.worker_pool.shutdown().await;
    }
}
