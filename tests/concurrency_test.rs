mod common;

use boleto_gateway::application::orchestrator::BoletoService;
use boleto_gateway::infrastructure::scripted::{NativeOp, ScriptedLibrary};
use std::sync::Arc;
use std::sync::mpsc;
use std::time::Duration;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_never_overlap_sessions() {
    let dir = common::workspace();
    let library = ScriptedLibrary::new();
    let service = Arc::new(BoletoService::new(
        Box::new(library.clone()),
        common::config(dir.path()),
    ));

    let handles: Vec<_> = (1..=8)
        .map(|titles| {
            let service = Arc::clone(&service);
            tokio::spawn(async move { service.generate(common::request("pdf", titles)).await })
        })
        .collect();

    for handle in handles {
        let response = handle.await.unwrap();
        assert!(response.success, "{:?}", response.error);
    }

    assert_eq!(library.overlapping_opens(), 0);
    assert_eq!(library.count(NativeOp::Open), 8);
    assert_eq!(library.count(NativeOp::Finalize), 8);

    // Every open is followed by its own finalize before the next open.
    let sessions: Vec<NativeOp> = library
        .ops()
        .into_iter()
        .filter(|op| matches!(op, NativeOp::Open | NativeOp::Finalize))
        .collect();
    for pair in sessions.chunks(2) {
        assert_eq!(pair, [NativeOp::Open, NativeOp::Finalize]);
    }
    assert!(common::scratch_files(dir.path()).is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_cancelled_caller_does_not_abandon_open_session() {
    let dir = common::workspace();
    let (release, gate) = mpsc::channel();
    let library = ScriptedLibrary::new().hold_submit(gate);
    let service = Arc::new(BoletoService::new(
        Box::new(library.clone()),
        common::config(dir.path()),
    ));

    let pending = {
        let service = Arc::clone(&service);
        tokio::spawn(async move { service.generate(common::request("pdf", 2)).await })
    };

    // Wait until the session is open and parked inside the submission.
    tokio::time::timeout(Duration::from_secs(10), async {
        while library.count(NativeOp::SubmitBatch) == 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();
    assert_eq!(common::scratch_files(dir.path()).len(), 2);

    pending.abort();
    assert!(pending.await.unwrap_err().is_cancelled());
    assert_eq!(library.count(NativeOp::Finalize), 0);

    let next = {
        let service = Arc::clone(&service);
        tokio::spawn(async move { service.generate(common::request("pdf", 1)).await })
    };
    release.send(()).unwrap();

    let response = next.await.unwrap();
    assert!(response.success);

    // The cancelled session ran to completion before the next one opened.
    assert_eq!(
        &library.ops()[..7],
        &[
            NativeOp::Open,
            NativeOp::ClearList,
            NativeOp::SubmitBatch,
            NativeOp::TotalCount,
            NativeOp::SetOutputDir,
            NativeOp::GenerateOutput,
            NativeOp::Finalize,
        ]
    );
    assert_eq!(library.count(NativeOp::Open), 2);
    assert_eq!(library.count(NativeOp::Finalize), 2);
    assert_eq!(library.overlapping_opens(), 0);
    assert!(common::scratch_files(dir.path()).is_empty());
}
