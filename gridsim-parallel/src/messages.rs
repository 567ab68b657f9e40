use crate::WorkerStat;
use gridsim_core::Episode;

/// Message a [`Worker`](crate::Worker) sends when its batch is done.
pub struct BatchMessage {
    /// Dispatch index of the worker.
    pub id: usize,

    /// Episodes of the batch, or the error message of the failed batch.
    pub episodes: Result<Vec<Episode>, String>,

    /// Stats of the batch.
    pub stat: WorkerStat,
}
