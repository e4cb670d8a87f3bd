//! Holders observe a close through their closing signal.

use std::time::Duration;

use nebula_lifecycle::{Gate, GateConfig};

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn holder_releases_when_close_starts() {
    let gate = Gate::new(GateConfig::named("signal").without_drain_warning());
    gate.open();

    let hold = gate.acquire().unwrap();
    let worker = tokio::spawn(async move {
        let signal = hold.closing_signal();
        tokio::select! {
            () = tokio::time::sleep(Duration::from_secs(30)) => false,
            () = signal.closed() => {
                hold.release();
                true
            }
        }
    });

    let closer = gate.clone();
    tokio::task::spawn_blocking(move || closer.close())
        .await
        .unwrap();

    assert!(worker.await.unwrap(), "worker should have seen the close");
    assert!(gate.acquire().is_err());
}

#[tokio::test]
async fn released_hold_signal_resolves_immediately() {
    let gate = Gate::new(GateConfig::named("released"));
    gate.open();
    let hold = gate.acquire().unwrap();
    hold.release();

    let signal = hold.closing_signal();
    assert!(signal.token().is_none());
    tokio::time::timeout(Duration::from_secs(1), signal.closed())
        .await
        .expect("released hold's signal is already fired");
}

#[tokio::test]
async fn signal_token_composes_with_child_tokens() {
    let gate = Gate::new(GateConfig::named("child").without_drain_warning());
    gate.open();
    let hold = gate.acquire().unwrap();

    let child = hold.closing_signal().token().unwrap().child_token();
    assert!(!child.is_cancelled());

    let closer = gate.clone();
    let close = tokio::task::spawn_blocking(move || closer.close());
    child.cancelled().await;
    drop(hold);
    close.await.unwrap();
}
