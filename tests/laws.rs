//! Composition laws, checked by running both sides and comparing outputs.

use proptest::prelude::*;

use millrace::proxy::{self, pipes, Client, Pipe, Producer, Proxy, Server};
use millrace::Error;

fn numbers(xs: Vec<i32>) -> Producer<i32> {
    proxy::each(xs)
}

fn collect(producer: Producer<i32>) -> Result<Vec<i32>, Error> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    runtime.block_on(proxy::run(proxy::to_vec(producer), &()))
}

fn shift(k: i32) -> Pipe<i32, i32> {
    pipes::map(move |x: i32| x.wrapping_add(k))
}

fn evens() -> Pipe<i32, i32> {
    pipes::filter(|x: &i32| x % 2 == 0)
}

proptest! {
    #[test]
    fn prop_cat_is_left_identity(xs in prop::collection::vec(any::<i32>(), 0..50), k in any::<i32>()) {
        let with_cat = collect(numbers(xs.clone()).pipe(proxy::cat().pipe(shift(k))));
        let without = collect(numbers(xs).pipe(shift(k)));
        prop_assert_eq!(with_cat, without);
    }

    #[test]
    fn prop_cat_is_right_identity(xs in prop::collection::vec(any::<i32>(), 0..50), k in any::<i32>()) {
        let with_cat = collect(numbers(xs.clone()).pipe(shift(k).pipe(proxy::cat())));
        let without = collect(numbers(xs).pipe(shift(k)));
        prop_assert_eq!(with_cat, without);
    }

    #[test]
    fn prop_composition_is_associative(
        xs in prop::collection::vec(any::<i32>(), 0..50),
        k in any::<i32>(),
        n in 0usize..60,
    ) {
        let left = collect(numbers(xs.clone()).pipe(shift(k)).pipe(evens()).pipe(pipes::take(n)));
        let right = collect(numbers(xs).pipe(shift(k).pipe(evens().pipe(pipes::take(n)))));
        prop_assert_eq!(left, right);
    }

    #[test]
    fn prop_respond_is_identity_for_for_each_respond(xs in prop::collection::vec(any::<i32>(), 0..50)) {
        let replaced: Producer<i32> = proxy::for_each_respond(numbers(xs.clone()), proxy::respond);
        prop_assert_eq!(collect(replaced), Ok(xs));
    }

    #[test]
    fn prop_for_each_respond_distributes_over_binds(xs in prop::collection::vec(any::<i32>(), 0..30)) {
        let doubled: Producer<i32> = proxy::for_each_respond(numbers(xs.clone()), |x: i32| proxy::each([x, x]));
        let expected: Vec<i32> = xs.iter().flat_map(|&x| [x, x]).collect();
        prop_assert_eq!(collect(doubled), Ok(expected));
    }

    #[test]
    fn prop_reflect_is_an_involution(xs in prop::collection::vec(any::<i32>(), 0..50)) {
        let twice: Producer<i32> = numbers(xs.clone()).reflect().reflect();
        prop_assert_eq!(collect(twice), Ok(xs));
    }

    #[test]
    fn prop_pull_agrees_with_pipe(xs in prop::collection::vec(any::<i32>(), 0..50), k in any::<i32>()) {
        let source = xs.clone();
        let pulled: Producer<i32> = proxy::pull(move |()| numbers(source), shift(k));
        let piped = numbers(xs).pipe(shift(k));
        prop_assert_eq!(collect(pulled), collect(piped));
    }

    #[test]
    fn prop_request_is_identity_for_for_each_request(xs in prop::collection::vec(any::<i32>(), 1..20)) {
        // A client that asks for each element of `xs` by index and sums the replies.
        let len = xs.len();
        let client: Client<usize, i32, i32> = summing(0, len, 0);
        let table = xs.clone();
        let served = proxy::pull(
            move |first: usize| lookup(table.clone(), first),
            proxy::for_each_request(proxy::request, client),
        );
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let total = runtime.block_on(proxy::run(served, &()));
        prop_assert_eq!(total, Ok(xs.iter().fold(0i32, |acc, x| acc.wrapping_add(*x))));
    }
}

fn summing(index: usize, len: usize, acc: i32) -> Client<usize, i32, i32> {
    if index == len {
        return Proxy::Pure(acc);
    }
    proxy::request(index).and_then(move |x: i32| summing(index + 1, len, acc.wrapping_add(x)))
}

fn lookup(table: Vec<i32>, index: usize) -> Server<usize, i32, i32> {
    let value = table[index];
    proxy::respond(value).and_then(move |next: usize| lookup(table, next))
}
