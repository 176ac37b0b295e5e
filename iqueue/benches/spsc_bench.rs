// Producer/consumer throughput on each path. The fork benches run the
// specialized ring across processes from a shared mapping; the thread benches
// go through the channel endpoints.

use criterion::{criterion_group, criterion_main, Criterion};
use iqueue::{
    channel_with_config, Empty, Full, IndirectQueue, MemoryModel, Native, PathSelection, Portable,
    QueueConfig,
};
use nix::{
    libc,
    sys::wait::waitpid,
    unistd::{fork, ForkResult},
};
use std::sync::atomic::{AtomicU32, Ordering};
use std::thread;
use std::time::{Duration, Instant};

const RING_CAP: usize = 32_768;
const ITERS: usize = 1_000_000;
const FLAGS_BYTES: usize = 128;

unsafe fn map_shared(bytes: usize) -> *mut u8 {
    let ptr = libc::mmap(
        std::ptr::null_mut(),
        bytes,
        libc::PROT_READ | libc::PROT_WRITE,
        libc::MAP_SHARED | libc::MAP_ANONYMOUS,
        -1,
        0,
    );
    if ptr == libc::MAP_FAILED {
        panic!("mmap failed: {}", std::io::Error::last_os_error());
    }
    ptr.cast()
}

unsafe fn unmap_shared(ptr: *mut u8, len: usize) {
    let ret = libc::munmap(ptr.cast(), len);
    assert_eq!(ret, 0, "munmap failed: {}", std::io::Error::last_os_error());
}

// One fork per run: child produces ITERS words, parent times the drain.
fn fork_and_run<M: MemoryModel>() -> Duration {
    let bytes = FLAGS_BYTES + IndirectQueue::<M>::shared_size(RING_CAP);
    let shm = unsafe { map_shared(bytes) };
    let flag = unsafe { &*(shm as *const AtomicU32) };
    flag.store(0, Ordering::Relaxed);
    let q = unsafe { IndirectQueue::<M>::init_in_shared(shm.add(FLAGS_BYTES), RING_CAP) }
        .expect("shared queue");

    match unsafe { fork() }.expect("fork failed") {
        ForkResult::Child => {
            flag.store(1, Ordering::Release);
            while flag.load(Ordering::Acquire) < 2 {
                std::hint::spin_loop();
            }
            for i in 0..ITERS {
                while unsafe { q.enqueue(i) }.is_err() {
                    std::hint::spin_loop();
                }
            }
            unsafe { libc::_exit(0) };
        }
        ForkResult::Parent { child } => {
            while flag.load(Ordering::Acquire) < 1 {
                std::hint::spin_loop();
            }
            flag.store(2, Ordering::Release);

            let start = Instant::now();
            let mut consumed = 0;
            while consumed < ITERS {
                match unsafe { q.dequeue() } {
                    Ok(_) => consumed += 1,
                    Err(Empty) => std::hint::spin_loop(),
                }
            }
            let duration = start.elapsed();

            let _ = waitpid(child, None).expect("waitpid failed");
            unsafe { unmap_shared(shm, bytes) };
            duration
        }
    }
}

fn threads_and_run(path: PathSelection) -> Duration {
    let config = QueueConfig::new(RING_CAP).path(path);
    let (mut tx, mut rx) = channel_with_config::<usize>(config).expect("channel");

    let start = Instant::now();
    let producer = thread::spawn(move || {
        for i in 0..ITERS {
            let mut value = i;
            while let Err(Full(v)) = tx.push(value) {
                value = v;
                std::hint::spin_loop();
            }
        }
    });
    let mut consumed = 0;
    while consumed < ITERS {
        match rx.pop() {
            Ok(_) => consumed += 1,
            Err(Empty) => std::hint::spin_loop(),
        }
    }
    let duration = start.elapsed();
    producer.join().expect("producer panicked");
    duration
}

fn sum_runs(iters: u64, run: impl Fn() -> Duration) -> Duration {
    (0..iters).map(|_| run()).sum()
}

fn bench_fork(c: &mut Criterion) {
    c.bench_function(&format!("fork/{}", Native::NAME), |b| {
        b.iter_custom(|iters| sum_runs(iters, fork_and_run::<Native>))
    });
    if Native::NAME != Portable::NAME {
        c.bench_function("fork/portable", |b| {
            b.iter_custom(|iters| sum_runs(iters, fork_and_run::<Portable>))
        });
    }
}

fn bench_threads(c: &mut Criterion) {
    c.bench_function("threads/auto", |b| {
        b.iter_custom(|iters| sum_runs(iters, || threads_and_run(PathSelection::Auto)))
    });
    c.bench_function("threads/generic", |b| {
        b.iter_custom(|iters| sum_runs(iters, || threads_and_run(PathSelection::Generic)))
    });
}

fn custom_criterion() -> Criterion {
    // slow-path events with `--features tracing` and RUST_LOG=iqueue=trace
    iqueue::init_tracing();
    Criterion::default()
        .warm_up_time(Duration::from_secs(5))
        .measurement_time(Duration::from_secs(15))
        .sample_size(10)
}

criterion_group! {
    name = benches;
    config = custom_criterion();
    targets = bench_fork, bench_threads,
}
criterion_main!(benches);
