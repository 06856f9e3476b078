use realtrust::calc::{ProfitInputs, YieldInputs};
use realtrust::worker::{CalcJob, CalcReply, CalcWorker};

fn yield_job(nightly_rate: f64) -> CalcJob {
    CalcJob::Yield(YieldInputs {
        purchase_price: 120_000.0,
        nightly_rate,
        occupancy: 0.65,
        management_fee: 0.2,
        monthly_costs: 180.0,
    })
}

fn profit_job(area_sqm: f64) -> CalcJob {
    CalcJob::Profit(ProfitInputs {
        area_sqm,
        rate_per_sqm: 1.1,
        occupancy: 0.75,
        management_fee: 0.25,
        monthly_costs: 220.0,
    })
}

/// Simulates a slider being dragged: a burst of same-kind jobs lands before
/// the worker runs; only the final position gets an answer.
#[tokio::test]
async fn test_slider_burst_keeps_only_last_value() {
    let worker = CalcWorker::spawn();

    // Current-thread test runtime: the worker task cannot interleave with
    // these synchronous sends, so all five queue up together.
    let receivers: Vec<_> = [40.0, 45.0, 50.0, 55.0, 60.0]
        .into_iter()
        .map(|rate| worker.submit(yield_job(rate)))
        .collect();

    let mut replies = Vec::new();
    for rx in receivers {
        replies.push(rx.await);
    }

    // Exactly one reply, and it is the last one
    let delivered: Vec<_> = replies.iter().filter(|r| r.is_ok()).collect();
    assert_eq!(delivered.len(), 1);
    assert!(replies[..4].iter().all(|r| r.is_err()));
    match replies[4].as_ref().expect("last submit answers") {
        CalcReply::Yield(breakdown) => {
            // 60 * 365 * 0.65
            assert!((breakdown.gross_annual - 14_235.0).abs() < 1e-6);
        }
        other => panic!("unexpected reply: {other:?}"),
    }

    worker.shutdown().await;
}

/// Different request tags never cancel each other.
#[tokio::test]
async fn test_mixed_kinds_all_answer() {
    let worker = CalcWorker::spawn();

    let y = worker.submit(yield_job(60.0));
    let p = worker.submit(profit_job(48.0));

    assert!(matches!(y.await, Ok(CalcReply::Yield(_))));
    assert!(matches!(p.await, Ok(CalcReply::Profit(_))));

    worker.shutdown().await;
}

/// Sequential submits (each awaited) all resolve; last-write-wins only
/// applies to a backlog.
#[tokio::test]
async fn test_sequential_submits_all_resolve() {
    let worker = CalcWorker::spawn();

    for rate in [40.0, 50.0, 60.0] {
        let reply = worker.submit(yield_job(rate)).await.expect("reply");
        assert!(matches!(reply, CalcReply::Yield(_)));
    }

    worker.shutdown().await;
}

/// A job submitted right before teardown still answers; the worker drains
/// its queue before exiting.
#[tokio::test]
async fn test_pending_job_survives_teardown() {
    let worker = CalcWorker::spawn();
    let pending = worker.submit(profit_job(48.0));
    worker.shutdown().await;

    assert!(matches!(pending.await, Ok(CalcReply::Profit(_))));
}
