//! Tests for the proxy algebra.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::effect::prelude::*;
use crate::proxy::{self, fold, pipes, Client, Closed, Consumer, Pipe, Producer, Proxy, Server};
use crate::{Error, Schedule};

fn numbers(xs: Vec<i32>) -> Producer<i32> {
    proxy::each(xs)
}

// A producer that counts how many values it has been asked for.
fn counted(limit: usize, pulls: Arc<AtomicUsize>) -> Producer<usize> {
    proxy::repeat_m(move || {
        let pulls = pulls.clone();
        from_fn(move |_: &()| Ok(pulls.fetch_add(1, Ordering::SeqCst)))
    })
    .pipe(pipes::take(limit))
}

fn recording(seen: Arc<Mutex<Vec<i32>>>) -> Consumer<i32> {
    proxy::repeat(move || {
        let seen = seen.clone();
        proxy::awaiting().and_then(move |x| {
            proxy::lift(from_fn(move |_: &()| {
                seen.lock().unwrap().push(x);
                Ok(())
            }))
        })
    })
}

fn delayed(by: Duration) -> Pipe<i32, i32> {
    pipes::map_m(move |x: i32| {
        from_async(move |_: &()| async move {
            tokio::time::sleep(by).await;
            Ok(x)
        })
    })
}

#[tokio::test]
async fn producer_pipe_consumer() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let pipeline: Closed<()> = numbers(vec![1, 2, 3])
        .pipe(pipes::map(|x: i32| x * 10))
        .pipe(recording(seen.clone()));

    proxy::run(pipeline, &()).await.unwrap();
    assert_eq!(*seen.lock().unwrap(), vec![10, 20, 30]);
}

#[tokio::test]
async fn take_stops_pulling_upstream() {
    let pulls = Arc::new(AtomicUsize::new(0));
    let out = proxy::to_vec(counted(3, pulls.clone()));
    assert_eq!(proxy::run(out, &()).await, Ok(vec![0, 1, 2]));
    assert_eq!(pulls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn consumer_finishing_first_ends_pipeline() {
    let consumer: Consumer<i32, i32> =
        proxy::awaiting().and_then(|a: i32| proxy::awaiting().map(move |b: i32| a + b));
    let pipeline: Closed<i32> = proxy::compose(proxy::repeat_m(|| pure(1)), consumer);
    assert_eq!(proxy::run(pipeline, &()).await, Ok(2));
}

#[tokio::test]
async fn long_pure_pipelines_run_in_constant_stack() {
    let producer: Producer<u64> = proxy::each(0..200_000u64);
    let pipeline = proxy::fold_producer(
        producer.pipe(pipes::map(|x: u64| x + 1)).pipe(pipes::filter(|x: &u64| x % 2 == 0)),
        0u64,
        |acc, x| acc + x,
    );
    let (total, ()) = proxy::run(pipeline, &()).await.unwrap();
    assert_eq!(total, (1..=100_000u64).map(|k| 2 * k).sum::<u64>());
}

fn doubling_server(request: i32) -> Server<i32, i32, i32> {
    proxy::respond(request * 2).and_then(doubling_server)
}

#[tokio::test]
async fn pull_serves_client_requests() {
    let client: Client<i32, i32, i32> =
        proxy::request(1).and_then(|a: i32| proxy::request(20).map(move |b: i32| a + b));
    let session: Closed<i32> = proxy::pull(doubling_server, client);
    assert_eq!(proxy::run(session, &()).await, Ok(42));
}

fn record_from(seen: Arc<Mutex<Vec<i32>>>, first: i32) -> Consumer<i32> {
    proxy::lift(from_fn(move |_: &()| {
        seen.lock().unwrap().push(first);
        Ok(seen)
    }))
    .and_then(|seen| proxy::awaiting().and_then(move |next| record_from(seen, next)))
}

#[tokio::test]
async fn push_starts_downstream_with_first_value() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let pipeline: Closed<()> = proxy::push(numbers(vec![4, 5, 6]), move |first| {
        record_from(sink, first)
    });
    proxy::run(pipeline, &()).await.unwrap();
    assert_eq!(*seen.lock().unwrap(), vec![4, 5, 6]);
}

#[tokio::test]
async fn for_each_request_answers_locally() {
    let client: Client<&str, usize, usize> = proxy::request("four")
        .and_then(|a: usize| proxy::request("eleven").map(move |b: usize| a + b));
    let served: Closed<usize> = proxy::for_each_request(|word: &str| Proxy::Pure(word.len()), client);
    assert_eq!(proxy::run(served, &()).await, Ok(10));
}

#[tokio::test]
async fn for_each_respond_can_expand_values() {
    let expanded: Producer<i32> =
        proxy::for_each_respond(numbers(vec![1, 2]), |x| proxy::each(vec![x, -x]));
    let out = proxy::to_vec(expanded);
    assert_eq!(proxy::run(out, &()).await, Ok(vec![1, -1, 2, -2]));
}

#[tokio::test]
async fn reflect_turns_producer_into_client() {
    let client: Client<i32, (), ()> = numbers(vec![3, 4]).reflect();
    let total = Arc::new(AtomicUsize::new(0));
    let sum = total.clone();
    let served: Closed<()> = proxy::for_each_request(
        move |x: i32| {
            sum.fetch_add(x as usize, Ordering::SeqCst);
            Proxy::Pure(())
        },
        client,
    );
    proxy::run(served, &()).await.unwrap();
    assert_eq!(total.load(Ordering::SeqCst), 7);
}

#[tokio::test]
async fn reflect_twice_behaves_like_original() {
    let twice: Producer<i32> = numbers(vec![1, 2, 3]).reflect().reflect();
    assert_eq!(proxy::run(proxy::to_vec(twice), &()).await, Ok(vec![1, 2, 3]));
}

#[tokio::test]
async fn observe_preserves_behavior_and_fuses_effects() {
    let steps: Producer<i32> = proxy::lift(pure(1))
        .and_then(|a: i32| proxy::lift(pure(a + 1)))
        .and_then(proxy::yielding);
    let observed = steps.observe();
    assert!(matches!(observed, Proxy::Effect(_)));
    assert_eq!(proxy::run(proxy::to_vec(observed), &()).await, Ok(vec![2]));
}

#[tokio::test]
async fn failing_step_ends_the_run() {
    let pipeline: Closed<Vec<i32>> = proxy::to_vec(
        numbers(vec![1, 2, 3]).pipe(pipes::map_m(|x: i32| {
            if x == 2 {
                from_result(Err(Error::message("two")))
            } else {
                from_result(Ok(x))
            }
        })),
    );
    assert_eq!(proxy::run(pipeline, &()).await, Err(Error::message("two")));
}

#[tokio::test]
async fn catch_replaces_rest_of_proxy() {
    let producer: Producer<i32> = proxy::yielding(1)
        .and_then(|()| proxy::lift(fail(Error::Full)))
        .and_then(|()| proxy::yielding(2));
    let recovered = producer.catch(|e| {
        assert_eq!(e, Error::Full);
        proxy::yielding(99)
    });
    assert_eq!(proxy::run(proxy::to_vec(recovered), &()).await, Ok(vec![1, 99]));
}

#[tokio::test]
async fn map_err_retypes_every_step() {
    let pipeline: Closed<i32, String> = proxy::lift(pure(1))
        .and_then(|_: i32| proxy::lift(fail::<i32, _, ()>(Error::Closed)))
        .map_err(|e: Error| format!("wrapped: {}", e));
    assert_eq!(
        proxy::run(pipeline, &()).await,
        Err("wrapped: channel is closed".to_string())
    );
}

#[tokio::test]
async fn closed_pipeline_is_an_effect() {
    let pipeline: Closed<usize> = proxy::to_vec(numbers(vec![1, 2])).map(|v| v.len());
    let effect = pipeline.boxed().map(|n| n * 10);
    assert_eq!(effect.run(&()).await, Ok(20));
}

#[tokio::test]
async fn environment_reaches_every_step() {
    #[derive(Clone)]
    struct Scale(i32);

    let scaled: Pipe<i32, i32, (), Error, Scale> =
        pipes::map_m(|x: i32| from_fn(move |env: &Scale| Ok(x * env.0)));
    let producer: Producer<i32, (), Error, Scale> = proxy::each(vec![1, 2]);
    let out = proxy::to_vec(producer.pipe(scaled));
    assert_eq!(proxy::run(out, &Scale(3)).await, Ok(vec![3, 6]));
}

#[tokio::test]
async fn repeat_with_runs_once_plus_each_delay() {
    let runs = Arc::new(AtomicUsize::new(0));
    let counter = runs.clone();
    let looped: Closed<usize> = proxy::repeat_with(Schedule::recurs(2), move || {
        let counter = counter.clone();
        proxy::lift(from_fn(move |_: &()| Ok(counter.fetch_add(1, Ordering::SeqCst) + 1)))
    });
    assert_eq!(proxy::run(looped, &()).await, Ok(3));
    assert_eq!(runs.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn repeat_m_with_sleeps_between_emissions() {
    let start = tokio::time::Instant::now();
    let ticks: Producer<&str> = proxy::repeat_m_with(
        Schedule::spaced(Duration::from_millis(50)).take(2),
        || pure("tick"),
    );
    let out = proxy::run(proxy::to_vec(ticks), &()).await.unwrap();
    assert_eq!(out, vec!["tick"; 3]);
    assert!(start.elapsed() >= Duration::from_millis(100));
}

#[tokio::test]
async fn fold_until_emits_and_resets() {
    let sums = numbers(vec![4, 5, 3, 9, 1, 1])
        .pipe(fold::fold_until(|s, x: &i32| s + x, |s, _| *s >= 10, 0));
    assert_eq!(proxy::run(proxy::to_vec(sums), &()).await, Ok(vec![12, 10]));
}

#[tokio::test]
async fn fold_while_emits_previous_state_on_violation() {
    let runs = numbers(vec![1, 2, 3, 10, 1, 1])
        .pipe(fold::fold_while(|s, x: &i32| s + x, |next, _| *next <= 6, 0));
    assert_eq!(proxy::run(proxy::to_vec(runs), &()).await, Ok(vec![6, 10]));
}

#[tokio::test]
async fn fold_while_groups_by_key() {
    let words: Producer<&str> = proxy::each(vec!["apple", "avocado", "banana", "blueberry", "cherry"]);
    let groups = words.pipe(fold::fold_while(
        |mut group: Vec<&'static str>, w: &&'static str| {
            group.push(*w);
            group
        },
        |group, _| group.iter().all(|w| w[..1] == group[0][..1]),
        Vec::new(),
    ));
    assert_eq!(
        proxy::run(proxy::to_vec(groups), &()).await,
        Ok(vec![vec!["apple", "avocado"], vec!["banana", "blueberry"]])
    );
}

#[tokio::test(start_paused = true)]
async fn fold_emits_when_window_elapses() {
    let windows = numbers(vec![1, 2, 3, 4, 5, 6])
        .pipe(delayed(Duration::from_millis(4)))
        .pipe(fold::fold(
            Schedule::spaced(Duration::from_millis(10)),
            |s, x: &i32| s + x,
            0,
        ));
    assert_eq!(proxy::run(proxy::to_vec(windows), &()).await, Ok(vec![6, 15]));
}

#[tokio::test(start_paused = true)]
async fn fold_finishes_when_schedule_is_exhausted() {
    let pulls = Arc::new(AtomicUsize::new(0));
    let seen = pulls.clone();
    let source = numbers(vec![1, 2, 3, 4, 5, 6]).pipe(pipes::map(move |x: i32| {
        seen.fetch_add(1, Ordering::SeqCst);
        x
    }));
    let windows = source.pipe(delayed(Duration::from_millis(4))).pipe(fold::fold(
        Schedule::spaced(Duration::from_millis(10)).take(1),
        |s, x: &i32| s + x,
        0,
    ));
    assert_eq!(proxy::run(proxy::to_vec(windows), &()).await, Ok(vec![6]));
    assert_eq!(pulls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn fold_with_empty_schedule_finishes_immediately() {
    let windows = numbers(vec![1, 2]).pipe(fold::fold(Schedule::never(), |s, x: &i32| s + x, 0));
    assert_eq!(proxy::run(proxy::to_vec(windows), &()).await, Ok(vec![]));
}

#[tokio::test(start_paused = true)]
async fn fold_until_within_flushes_on_window() {
    // Predicate never fires for these values; the 10ms window does.
    let windows = numbers(vec![1, 1, 1, 1])
        .pipe(delayed(Duration::from_millis(6)))
        .pipe(fold::fold_until_within(
            Schedule::spaced(Duration::from_millis(10)),
            |s, x: &i32| s + x,
            |s, _| *s >= 100,
            0,
        ));
    assert_eq!(proxy::run(proxy::to_vec(windows), &()).await, Ok(vec![2, 2]));
}

#[tokio::test(start_paused = true)]
async fn fold_while_within_combines_both_rules() {
    let windows = numbers(vec![1, 2, 5, 1])
        .pipe(delayed(Duration::from_millis(3)))
        .pipe(fold::fold_while_within(
            Schedule::spaced(Duration::from_millis(10)),
            |s, x: &i32| s + x,
            |next, _| *next <= 6,
            0,
        ));
    // 5 breaks the run 1 + 2; the window closing at t=12 flushes 5 + 1.
    assert_eq!(proxy::run(proxy::to_vec(windows), &()).await, Ok(vec![3, 6]));
}
