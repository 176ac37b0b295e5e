// The specialized and generic queues must be indistinguishable from the
// outside: same outcome, same value, at every step of any operation sequence.

use iqueue::{GenericQueue, IndirectQueue, Native, Portable, RingProtocol};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Debug, Clone, Copy)]
enum Op {
    Enqueue(usize),
    Dequeue,
}

fn random_ops(seed: u64, len: usize, enqueue_bias: f64) -> Vec<Op> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..len)
        .map(|_| {
            if rng.gen_bool(enqueue_bias) {
                Op::Enqueue(rng.gen())
            } else {
                Op::Dequeue
            }
        })
        .collect()
}

fn run_in_lockstep<A: RingProtocol, B: RingProtocol>(a: &A, b: &B, ops: &[Op]) {
    assert_eq!(a.capacity(), b.capacity());
    let mut depth = 0usize;

    for (step, op) in ops.iter().enumerate() {
        unsafe {
            match *op {
                Op::Enqueue(v) => {
                    let (ra, rb) = (a.enqueue(v), b.enqueue(v));
                    assert_eq!(ra, rb, "enqueue outcome diverged at step {step}");
                    if ra.is_ok() {
                        depth += 1;
                    }
                }
                Op::Dequeue => {
                    let (ra, rb) = (a.dequeue(), b.dequeue());
                    assert_eq!(ra, rb, "dequeue outcome diverged at step {step}");
                    if ra.is_ok() {
                        depth -= 1;
                    }
                }
            }
        }
        assert!(depth <= a.capacity());
        assert_eq!(a.len(), depth, "len diverged at step {step}");
        assert_eq!(b.len(), depth, "len diverged at step {step}");
    }
}

#[test]
fn specialized_and_generic_agree_on_random_sequences() {
    for (seed, capacity, bias) in [
        (1, 2, 0.5),
        (2, 4, 0.6),
        (3, 8, 0.4),
        (4, 16, 0.55),
        (5, 64, 0.7),
        (6, 3, 0.5),
    ] {
        let ops = random_ops(seed, 20_000, bias);
        let native = IndirectQueue::<Native>::with_capacity(capacity).unwrap();
        let generic = GenericQueue::with_capacity(capacity).unwrap();
        run_in_lockstep(&native, &generic, &ops);
    }
}

#[test]
fn portable_adapter_agrees_with_native_adapter() {
    let ops = random_ops(42, 10_000, 0.5);
    let native = IndirectQueue::<Native>::with_capacity(8).unwrap();
    let portable = IndirectQueue::<Portable>::with_capacity(8).unwrap();
    run_in_lockstep(&native, &portable, &ops);
}

#[test]
fn saturating_sequences_hit_full_on_both() {
    // heavily biased toward enqueue: most steps land on a full queue
    let ops = random_ops(7, 5_000, 0.95);
    let native = IndirectQueue::<Native>::with_capacity(4).unwrap();
    let generic = GenericQueue::with_capacity(4).unwrap();
    run_in_lockstep(&native, &generic, &ops);
    assert_eq!(native.len(), generic.len());
}
