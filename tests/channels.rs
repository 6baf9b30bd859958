//! Channels shared between tasks, and pipelines running across them.

use std::time::Duration;

use millrace::channel::bridge::{consumer_into, producer_from, spawn_consumer, spawn_producer};
use millrace::channel::{channel, ChannelConfig, Overflow, Sink, SinkExt, SourceExt};
use millrace::effect::{self, from_async};
use millrace::proxy::{self, fold, pipes, Closed, Consumer, Producer};
use millrace::{CancelToken, Either, Error, Interrupted, Schedule};
use tracing_subscriber::filter::LevelFilter;

// Channel lifecycle logs show up with `cargo test -- --nocapture`.
fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(LevelFilter::DEBUG)
        .with_test_writer()
        .try_init();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn many_writers_one_bounded_channel() {
    init_logging();
    let (sink, source) = channel(ChannelConfig::bounded(4));

    let writers: Vec<_> = (0..3u64)
        .map(|w| {
            let sink = sink.clone();
            tokio::spawn(async move {
                for n in 0..100 {
                    sink.post(w * 1000 + n).await.unwrap();
                }
            })
        })
        .collect();
    drop(sink);

    let reader = tokio::spawn(source.collect());
    for writer in writers {
        writer.await.unwrap();
    }

    let mut values = reader.await.unwrap().unwrap();
    assert_eq!(values.len(), 300);
    values.sort_unstable();
    values.dedup();
    assert_eq!(values.len(), 300);
}

#[tokio::test]
async fn merged_producers_feed_one_pipeline() {
    let low: Producer<u32> = proxy::each(0..50);
    let high: Producer<u32> = proxy::each(50..100);
    let merged = spawn_producer(low, (), ChannelConfig::bounded(2))
        .merge(spawn_producer(high, (), ChannelConfig::bounded(2)));

    let pipeline: Closed<Vec<u32>> = proxy::to_vec(producer_from(merged));
    let mut values = proxy::run(pipeline, &()).await.unwrap();
    values.sort_unstable();
    assert_eq!(values, (0..100).collect::<Vec<_>>());
}

#[tokio::test]
async fn spawned_consumer_batches_into_another_channel() {
    let (batches, read_batches) = channel(ChannelConfig::unbounded());
    let batching: Consumer<u32> = fold::fold_until(
        |sum: u32, x: &u32| sum + x,
        |sum: &u32, _: &u32| *sum >= 10,
        0,
    )
    .pipe(consumer_into(batches));
    let (sink, handle) = spawn_consumer(batching, (), ChannelConfig::bounded(1));

    for n in [4, 6, 9, 1, 2] {
        sink.post(n).await.unwrap();
    }
    drop(sink);

    assert_eq!(handle.await.unwrap(), Ok(()));
    assert_eq!(read_batches.collect().await, Ok(vec![10, 10]));
}

#[tokio::test]
async fn routed_stages_split_one_stream() {
    let (small, small_source) = channel::<u32>(ChannelConfig::unbounded());
    let (large, large_source) = channel::<u32>(ChannelConfig::unbounded());
    let router = small.route(large, |n: u32| {
        if n < 10 {
            Either::Left(n)
        } else {
            Either::Right(n)
        }
    });

    let pipeline: Closed<()> = proxy::each([1u32, 20, 3, 40]).pipe(consumer_into(router));
    proxy::run(pipeline, &()).await.unwrap();

    assert_eq!(small_source.collect().await, Ok(vec![1, 3]));
    assert_eq!(large_source.collect().await, Ok(vec![20, 40]));
}

#[tokio::test]
async fn cancelling_a_reader_pipeline_closes_its_channel() {
    init_logging();
    let (sink, source) = channel::<i32>(ChannelConfig::unbounded());
    let pipeline: Closed<()> = producer_from(source).pipe(pipes::drain());

    let token = CancelToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        canceller.cancel();
    });

    let outcome = proxy::run_until_cancelled(pipeline, &(), &token).await;
    assert!(matches!(outcome, Err(Interrupted::Cancelled)));
    // The dropped pipeline held the only reader.
    assert_eq!(sink.post(1).await, Err(Error::Closed));
}

#[tokio::test(start_paused = true)]
async fn retrying_a_post_until_a_reader_makes_room() {
    let (sink, source) = channel(ChannelConfig::bounded(1).with_overflow(Overflow::Fail));
    sink.post(1).await.unwrap();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(25)).await;
        assert_eq!(source.try_read(), Ok(Some(1)));
        // Keep the channel open for the retried post.
        tokio::time::sleep(Duration::from_secs(1)).await;
        drop(source);
    });

    let attempt = move || {
        let sink = sink.clone();
        from_async(move |_: &()| async move { sink.post(2).await })
    };
    let posted = effect::retry(attempt, Schedule::spaced(Duration::from_millis(10)).take(5));
    assert!(effect::Effect::run(posted, &()).await.is_ok());
}

#[tokio::test]
async fn failing_upstream_fails_the_spawned_channel() {
    init_logging();
    let broken: Producer<i32> = proxy::each([1, 2]).and_then(|()| {
        proxy::lift(effect::fail(Error::message("sensor offline")))
    });
    let source = spawn_producer(broken, (), ChannelConfig::bounded(1));
    let seen = source.map(|x| x * 10).collect().await;
    assert_eq!(seen, Err(Error::message("sensor offline")));
}

#[tokio::test]
async fn failed_post_fails_the_writing_pipeline() {
    init_logging();
    let (sink, source) = channel::<i32>(ChannelConfig::unbounded());
    drop(source);
    let pipeline: Closed<()> = proxy::each([1, 2, 3]).pipe(consumer_into(sink));
    assert_eq!(proxy::run(pipeline, &()).await, Err(Error::Closed));
}
