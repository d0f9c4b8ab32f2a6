//! Tests for tokio spawner utilities

use taskshift::runtime::TokioSpawner;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_tokio_spawner_spawn() {
    let spawner = TokioSpawner::new(tokio::runtime::Handle::current());

    let (tx, rx) = tokio::sync::oneshot::channel();
    let handle = spawner.spawn(async move {
        tx.send(123).unwrap();
    });

    let result = rx.await.expect("oneshot result");
    assert_eq!(result, 123);
    handle.await.unwrap();
}

#[test]
fn test_owned_runtime_runs_spawned_work() {
    let spawner = TokioSpawner::with_worker_threads(2).unwrap();

    let (tx, rx) = std::sync::mpsc::channel();
    let handle = spawner.spawn(async move {
        tx.send(7).unwrap();
    });

    spawner.handle().block_on(handle).unwrap();
    assert_eq!(rx.recv().unwrap(), 7);
}

#[test]
fn test_owned_runtime_outlives_original_spawner() {
    let clone = {
        let spawner = TokioSpawner::with_worker_threads(0).unwrap();
        spawner.clone()
    };

    let handle = clone.spawn(async {});
    clone.handle().block_on(handle).unwrap();
}
