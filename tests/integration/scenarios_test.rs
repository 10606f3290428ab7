// End-to-end fuse scenarios on the system clock

use lighter_fuse::clock::{Clock, SystemClock};
use lighter_fuse::{Fuse, FuseBox, FuseConfig, FuseSettings, MemoryStore};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

fn fuse(name: &str, max_melts: u32, window_ms: u64, anneal_ms: u64) -> Fuse<MemoryStore> {
    Fuse::new(
        name,
        FuseConfig::new(max_melts, window_ms, anneal_ms),
        Arc::new(MemoryStore::new()),
    )
    .unwrap()
}

async fn melt_times(fuse: &Fuse<MemoryStore>, times: usize) {
    for _ in 0..times {
        fuse.melt().await.unwrap();
    }
}

#[tokio::test]
async fn test_back_to_back_melts_blow_the_fuse() {
    let fuse = fuse("testFuse", 10, 100, 1000);

    melt_times(&fuse, 11).await;

    assert!(fuse.blown().await.unwrap());
}

#[tokio::test]
async fn test_blown_fuse_recovers_after_anneal() {
    let fuse = fuse("testFuse", 10, 100, 1000);

    melt_times(&fuse, 11).await;
    assert!(fuse.blown().await.unwrap());
    assert!(!fuse.ok().await.unwrap());

    sleep(Duration::from_millis(1000)).await;

    assert!(!fuse.blown().await.unwrap());
    assert!(fuse.ok().await.unwrap());
}

#[tokio::test]
async fn test_melts_in_between_do_not_extend_anneal() {
    for anneal_ms in [250u64, 500] {
        let fuse = fuse("testFuse", 10, 100, anneal_ms);

        let start = SystemClock.now_ms();
        melt_times(&fuse, 11).await;

        // now the fuse is blown. it should stay that way for the anneal period.
        assert!(fuse.blown().await.unwrap());
        assert!(!fuse.ok().await.unwrap());

        while !fuse.ok().await.unwrap() {
            fuse.melt().await.unwrap();
            sleep(Duration::from_millis(10)).await;
        }
        let stop = SystemClock.now_ms();

        assert!(
            stop - start >= anneal_ms,
            "recovered after {} ms, anneal is {} ms",
            stop - start,
            anneal_ms
        );
        assert!(fuse.ok().await.unwrap());
    }
}

#[tokio::test]
async fn test_fresh_melts_after_recovery_do_not_retrip() {
    let fuse = fuse("recovered", 3, 100, 100);

    melt_times(&fuse, 4).await;
    assert!(fuse.blown().await.unwrap());

    sleep(Duration::from_millis(150)).await;
    assert!(fuse.ok().await.unwrap());

    let snapshot = fuse.snapshot().await.unwrap();
    assert!(snapshot.melts.is_empty());
    assert_eq!(snapshot.restart_at, None);

    melt_times(&fuse, 3).await;
    assert!(fuse.ok().await.unwrap());
}

#[tokio::test]
async fn test_slow_melts_never_blow() {
    let fuse = fuse("slow", 2, 50, 1000);

    // one melt every ~30 ms keeps at most 2 inside any 50 ms window
    for _ in 0..8 {
        fuse.melt().await.unwrap();
        assert!(fuse.ok().await.unwrap());
        sleep(Duration::from_millis(30)).await;
    }
}

#[tokio::test]
async fn test_fuse_box_defaults_blow_and_recover() {
    let fuse_box = FuseBox::new(Arc::new(MemoryStore::new()), FuseSettings::default()).unwrap();
    let fuse = fuse_box.fuse("defaults").unwrap();

    melt_times(&fuse, 11).await;
    assert!(fuse.blown().await.unwrap());

    // another handle to the same fuse sees the same state
    let other = fuse_box.fuse("defaults").unwrap();
    assert!(other.blown().await.unwrap());
}
