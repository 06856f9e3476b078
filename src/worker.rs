//! Background calculator worker
//!
//! Runs the investment calculators off the request path so interactive
//! slider input never waits on them. Jobs are correlated by kind; when
//! several jobs of the same kind pile up before the worker gets to them,
//! only the newest is computed and the superseded submissions resolve as
//! cancelled (last write wins per kind, by contract).

use std::collections::HashMap;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::calc::{
    annual_yield, monthly_profit, ProfitBreakdown, ProfitInputs, YieldBreakdown, YieldInputs,
};

/// A calculation request
#[derive(Debug, Clone)]
pub enum CalcJob {
    Yield(YieldInputs),
    Profit(ProfitInputs),
}

/// Tag used to correlate jobs of the same type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CalcKind {
    Yield,
    Profit,
}

/// A calculation result
#[derive(Debug, Clone, PartialEq)]
pub enum CalcReply {
    Yield(YieldBreakdown),
    Profit(ProfitBreakdown),
}

impl CalcJob {
    pub fn kind(&self) -> CalcKind {
        match self {
            CalcJob::Yield(_) => CalcKind::Yield,
            CalcJob::Profit(_) => CalcKind::Profit,
        }
    }
}

type Submission = (CalcJob, oneshot::Sender<CalcReply>);

/// Handle to a spawned calculator worker
///
/// One worker per mounting UI unit; dropping the handle closes the channel
/// and the task winds down on its own.
pub struct CalcWorker {
    tx: mpsc::UnboundedSender<Submission>,
    handle: JoinHandle<()>,
}

impl CalcWorker {
    /// Spawn the worker task
    pub fn spawn() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(run(rx));
        Self { tx, handle }
    }

    /// Submit a job, fire-and-forget
    ///
    /// The returned receiver resolves with the reply, or errors if the
    /// submission was superseded by a newer job of the same kind (or the
    /// worker is gone).
    pub fn submit(&self, job: CalcJob) -> oneshot::Receiver<CalcReply> {
        let (reply_tx, reply_rx) = oneshot::channel();
        if self.tx.send((job, reply_tx)).is_err() {
            debug!("calc worker gone, dropping job");
        }
        reply_rx
    }

    /// Drop the submit side and wait for the task to finish
    pub async fn shutdown(self) {
        let Self { tx, handle } = self;
        drop(tx);
        let _ = handle.await;
    }
}

async fn run(mut rx: mpsc::UnboundedReceiver<Submission>) {
    while let Some(first) = rx.recv().await {
        for (job, reply_tx) in take_latest(first, &mut rx) {
            let reply = compute(job);
            // Receiver may have hung up; that's fine
            let _ = reply_tx.send(reply);
        }
    }
    debug!("calc worker stopped");
}

/// Drain the backlog, keeping only the newest submission per kind.
/// Superseded senders are dropped here, which cancels their receivers.
fn take_latest(first: Submission, rx: &mut mpsc::UnboundedReceiver<Submission>) -> Vec<Submission> {
    let mut latest: HashMap<CalcKind, Submission> = HashMap::new();
    let mut order: Vec<CalcKind> = Vec::new();

    let mut insert = |sub: Submission, order: &mut Vec<CalcKind>| {
        let kind = sub.0.kind();
        if latest.insert(kind, sub).is_some() {
            debug!("superseding pending {:?} job", kind);
        } else {
            order.push(kind);
        }
    };

    insert(first, &mut order);
    while let Ok(sub) = rx.try_recv() {
        insert(sub, &mut order);
    }

    order
        .into_iter()
        .filter_map(|kind| latest.remove(&kind))
        .collect()
}

fn compute(job: CalcJob) -> CalcReply {
    match job {
        CalcJob::Yield(inputs) => CalcReply::Yield(annual_yield(&inputs)),
        CalcJob::Profit(inputs) => CalcReply::Profit(monthly_profit(&inputs)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yield_job(nightly_rate: f64) -> CalcJob {
        CalcJob::Yield(YieldInputs {
            purchase_price: 100_000.0,
            nightly_rate,
            occupancy: 0.7,
            management_fee: 0.2,
            monthly_costs: 150.0,
        })
    }

    fn profit_job() -> CalcJob {
        CalcJob::Profit(ProfitInputs {
            area_sqm: 50.0,
            rate_per_sqm: 1.2,
            occupancy: 0.8,
            management_fee: 0.25,
            monthly_costs: 200.0,
        })
    }

    #[tokio::test]
    async fn test_submit_resolves() {
        let worker = CalcWorker::spawn();
        let reply = worker.submit(yield_job(60.0)).await.expect("reply");
        match reply {
            CalcReply::Yield(breakdown) => assert!(breakdown.yield_pct > 0.0),
            other => panic!("unexpected reply: {other:?}"),
        }
        worker.shutdown().await;
    }

    #[tokio::test]
    async fn test_same_kind_backlog_is_last_write_wins() {
        // Current-thread runtime: the worker cannot run between these two
        // synchronous sends, so both land in the backlog together.
        let worker = CalcWorker::spawn();
        let stale = worker.submit(yield_job(10.0));
        let fresh = worker.submit(yield_job(60.0));

        assert!(stale.await.is_err(), "superseded job must cancel");
        match fresh.await.expect("fresh reply") {
            CalcReply::Yield(breakdown) => {
                assert!((breakdown.gross_annual - 15_330.0).abs() < 1e-6);
            }
            other => panic!("unexpected reply: {other:?}"),
        }
        worker.shutdown().await;
    }

    #[tokio::test]
    async fn test_different_kinds_do_not_supersede() {
        let worker = CalcWorker::spawn();
        let y = worker.submit(yield_job(60.0));
        let p = worker.submit(profit_job());

        assert!(matches!(y.await, Ok(CalcReply::Yield(_))));
        assert!(matches!(p.await, Ok(CalcReply::Profit(_))));
        worker.shutdown().await;
    }
}
