use std::time::Duration;

/// Stats of a batch generated by a [`Worker`](crate::Worker).
#[derive(Clone, Debug, Default)]
pub struct WorkerStat {
    /// Dispatch index of the worker.
    pub id: usize,

    /// The number of episodes generated.
    pub n_episodes: usize,

    /// The number of environment steps.
    pub env_steps: usize,

    /// Duration of the batch.
    pub duration: Duration,
}

/// Returns a formatted string of the set of [`WorkerStat`] for reporting.
pub fn worker_stats_fmt(stats: &[WorkerStat]) -> String {
    let mut s = "worker id, episodes, steps, duration [sec], steps per sec\n".to_string();
    for stat in stats.iter() {
        let d = stat.duration.as_secs_f32();
        let p = if d > 0.0 { stat.env_steps as f32 / d } else { 0.0 };
        s += format!(
            "{}, {}, {}, {}, {}\n",
            stat.id, stat.n_episodes, stat.env_steps, d, p
        )
        .as_str();
    }
    s
}
