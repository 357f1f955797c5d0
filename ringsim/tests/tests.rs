use std::fs;
use std::path::Path;
use std::thread;

use ringsim::distributed::init::initialize;
use ringsim::{
    checkpoint_len, checkpoint_state, collect_print, direct_forces, drift, generate, kick, launch,
    partition_size, Body, CheckpointReader, CommError, Communicator, LocalComm, LocalWorld,
    RingEngine, RunConfig, SimError, SoftenedGravity,
};

/// Run `f` on every worker of a fresh group and return the results by rank.
pub fn run_group<T, F>(size: usize, f: F) -> Vec<T>
where
    T: Send,
    F: Fn(&LocalComm) -> T + Sync,
{
    let comms = LocalWorld::new(size);
    thread::scope(|s| {
        let f = &f;
        let handles: Vec<_> = comms.iter().map(|c| s.spawn(move || f(c))).collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    })
}

/// Small run writing under `dir`
pub fn test_config(dir: &Path, total_bodies: usize, workers: usize, iterations: i32) -> RunConfig {
    RunConfig {
        total_bodies,
        workers,
        iterations,
        checkpoint_interval: 1,
        dt: 0.01,
        results_folder: dir.to_path_buf(),
        ..RunConfig::default()
    }
}

pub fn gravity() -> SoftenedGravity {
    SoftenedGravity { G: 1.0, softening: 0.1 }
}

/// Single-process reference: direct sum, kick, drift
pub fn reference_run(total: usize, iterations: usize, dt: f64) -> Vec<Body> {
    let mut bodies = generate(total, 0, total);
    for _ in 0..iterations {
        let f = direct_forces(&bodies, &gravity());
        kick(&mut bodies, &f, dt);
        drift(&mut bodies, dt);
    }
    bodies
}

pub fn assert_close(a: &[Body], b: &[Body]) {
    assert_eq!(a.len(), b.len());
    for (i, (x, y)) in a.iter().zip(b).enumerate() {
        let dx = (x.x - y.x).norm() / y.x.norm().max(1.0);
        let dv = (x.v - y.v).norm() / y.v.norm().max(1.0);
        assert!(dx < 1e-10 && dv < 1e-10, "body {i}: {:?} vs {:?}", x, y);
        assert_eq!(x.m, y.m);
    }
}

// ==================================================================================
// Initialization tests
// ==================================================================================

#[test]
fn fresh_start_distributes_partitions() {
    let dir = tempfile::tempdir().unwrap();
    let ckpt = dir.path().join("checkpoint.dat");
    let states = run_group(2, |c| initialize(c, 4, false, &ckpt).unwrap());

    // worker 0 owns {0,1}, worker 1 owns {2,3}
    assert_eq!(states[0].local, generate(2, 0, 4));
    assert_eq!(states[1].local, generate(2, 2, 4));
    for s in &states {
        assert_eq!(s.next_iteration, 0);
        assert!(s.local.iter().all(|b| b.m == 0.25));
    }
    let b3 = states[1].local[1];
    assert_eq!((b3.x.x, b3.x.y, b3.x.z), (3.0, 3.0, 3.0));
    assert_eq!((b3.v.x, b3.v.y, b3.v.z), (9.0, 9.0, 9.0));
}

#[test]
fn uneven_partitions_favour_low_ranks() {
    let dir = tempfile::tempdir().unwrap();
    let ckpt = dir.path().join("checkpoint.dat");
    let states = run_group(2, |c| initialize(c, 3, false, &ckpt).unwrap());
    assert_eq!(states[0].local.len(), 2);
    assert_eq!(states[1].local.len(), 1);
    assert_eq!(states[1].local[0].x.x, 2.0);
}

#[test]
fn restore_without_checkpoint_starts_fresh() {
    let dir = tempfile::tempdir().unwrap();
    let ckpt = dir.path().join("checkpoint.dat");
    let states = run_group(3, |c| initialize(c, 7, true, &ckpt).unwrap());
    assert!(states.iter().all(|s| s.next_iteration == 0));
    let all: Vec<Body> = states.into_iter().flat_map(|s| s.local).collect();
    assert_eq!(all, generate(7, 0, 7));
}

#[test]
fn total_mass_is_one_for_any_group() {
    let dir = tempfile::tempdir().unwrap();
    let ckpt = dir.path().join("checkpoint.dat");
    for size in 1..5 {
        let states = run_group(size, |c| initialize(c, 11, false, &ckpt).unwrap());
        let mass: f64 = states.iter().map(|s| s.local_mass()).sum();
        assert!((mass - 1.0).abs() < 1e-12);
    }
}

// ==================================================================================
// Ring tests
// ==================================================================================

#[test]
fn ring_matches_direct_sum() {
    let total = 7;
    let dt = 0.01;
    let expected = reference_run(total, 1, dt);
    let dir = tempfile::tempdir().unwrap();
    let ckpt = dir.path().join("checkpoint.dat");

    for size in 1..=5 {
        let states = run_group(size, |c| {
            let mut state = initialize(c, total, false, &ckpt).unwrap();
            let mut engine = RingEngine::new(state.partition.node_max(), gravity(), dt);
            engine.do_iteration(c, &mut state).unwrap();
            state
        });
        let got: Vec<Body> = states.into_iter().flat_map(|s| s.local).collect();
        assert_close(&got, &expected);
    }
}

#[test]
fn ring_with_more_workers_than_bodies() {
    let dt = 0.01;
    let expected = reference_run(3, 2, dt);
    let dir = tempfile::tempdir().unwrap();
    let ckpt = dir.path().join("checkpoint.dat");

    let states = run_group(5, |c| {
        let mut state = initialize(c, 3, false, &ckpt).unwrap();
        let mut engine = RingEngine::new(state.partition.node_max(), gravity(), dt);
        for _ in 0..2 {
            engine.do_iteration(c, &mut state).unwrap();
        }
        state
    });
    assert_eq!(states[4].local.len(), 0);
    let got: Vec<Body> = states.into_iter().flat_map(|s| s.local).collect();
    assert_close(&got, &expected);
}

#[test]
fn launch_matches_reference() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = test_config(dir.path(), 9, 4, 3);
    let reports = launch(&cfg).unwrap();
    let got: Vec<Body> = reports.into_iter().flat_map(|r| r.state.local).collect();
    assert_close(&got, &reference_run(9, 3, 0.01));
}

// ==================================================================================
// Checkpoint tests
// ==================================================================================

#[test]
fn checkpoint_file_after_run() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = test_config(dir.path(), 10, 3, 5);
    let reports = launch(&cfg).unwrap();

    let path = cfg.checkpoint_file();
    let bytes = fs::read(&path).unwrap();
    assert_eq!(bytes.len() as u64, checkpoint_len(10));
    assert_eq!(bytes.len(), 4 + 10 * 56);
    assert_eq!(i32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]), 4);

    assert!(reports.iter().all(|r| r.checkpoints == 5 && r.last_checkpoint == Some(4)));

    // bodies on disk are the final state, in rank order
    let mut reader = CheckpointReader::open_expecting(&path, 10).unwrap();
    assert_eq!(reader.read_iteration().unwrap(), 4);
    let mut stored = Vec::new();
    reader.read_bodies_into(&mut stored, 10).unwrap();
    let finals: Vec<Body> = reports.into_iter().flat_map(|r| r.state.local).collect();
    assert_eq!(stored, finals);

    // per-worker metrics and coordinator progress
    for rank in 0..3 {
        let log = cfg.results_dir().join(format!("logs/iteration_time_{rank}.csv"));
        let text = fs::read_to_string(log).unwrap();
        assert_eq!(text.lines().count(), 6);
    }
    let progress = fs::read_to_string(cfg.results_dir().join("progress.csv")).unwrap();
    assert_eq!(progress.lines().count(), 5);
}

#[test]
fn checkpoint_interval_selects_iterations() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = RunConfig {
        checkpoint_interval: 2,
        ..test_config(dir.path(), 6, 2, 5)
    };
    let reports = launch(&cfg).unwrap();
    // iterations 0, 2, 4
    assert!(reports.iter().all(|r| r.checkpoints == 3 && r.last_checkpoint == Some(4)));
}

#[test]
fn checkpoint_restore_is_bit_exact() {
    let dir = tempfile::tempdir().unwrap();
    let ckpt = dir.path().join("checkpoint.dat");
    let total = 13;

    let written = run_group(3, |c| {
        let mut state = initialize(c, total, false, &ckpt).unwrap();
        let mut engine = RingEngine::new(state.partition.node_max(), gravity(), 0.5);
        engine.do_iteration(c, &mut state).unwrap();
        checkpoint_state(c, &state, engine.buffers.scratch(), 7, &ckpt).unwrap();
        state
    });

    let restored = run_group(3, |c| initialize(c, total, true, &ckpt).unwrap());
    for (w, r) in written.iter().zip(&restored) {
        assert_eq!(r.next_iteration, 8);
        assert_eq!(r.local.len(), partition_size(total, 3, r.partition.rank));
        let wb: &[u8] = bytemuck::cast_slice(w.local.as_slice());
        let rb: &[u8] = bytemuck::cast_slice(r.local.as_slice());
        assert_eq!(wb, rb);
    }
}

#[test]
fn resumed_run_equals_uninterrupted_run() {
    let full_dir = tempfile::tempdir().unwrap();
    let full = launch(&test_config(full_dir.path(), 11, 3, 6)).unwrap();

    let dir = tempfile::tempdir().unwrap();
    launch(&test_config(dir.path(), 11, 3, 3)).unwrap();
    let resumed = launch(&RunConfig {
        restore: true,
        ..test_config(dir.path(), 11, 3, 6)
    })
    .unwrap();

    for (f, r) in full.iter().zip(&resumed) {
        assert_eq!(r.start_iteration, 3);
        assert_eq!(r.iterations_run, 3);
        assert_eq!(f.state.local, r.state.local);
    }
}

#[test]
fn restore_past_the_end_runs_nothing() {
    let dir = tempfile::tempdir().unwrap();
    launch(&test_config(dir.path(), 5, 2, 5)).unwrap();
    let reports = launch(&RunConfig {
        restore: true,
        ..test_config(dir.path(), 5, 2, 5)
    })
    .unwrap();
    assert!(reports.iter().all(|r| r.start_iteration == 5 && r.iterations_run == 0));
}

#[test]
fn truncated_checkpoint_aborts_every_worker() {
    let dir = tempfile::tempdir().unwrap();
    let ckpt = dir.path().join("checkpoint.dat");
    let mut bytes = 2i32.to_ne_bytes().to_vec();
    bytes.extend_from_slice(bytemuck::cast_slice(generate(3, 0, 6).as_slice()));
    fs::write(&ckpt, bytes).unwrap();

    let results = run_group(3, |c| initialize(c, 6, true, &ckpt));
    assert!(matches!(results[0], Err(SimError::InitializationAbort(_))));
    for r in &results[1..] {
        assert!(matches!(r, Err(SimError::Comm(CommError::Aborted { code: 1 }))));
    }
}

#[test]
fn launch_reports_root_cause() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = RunConfig {
        restore: true,
        ..test_config(dir.path(), 8, 4, 2)
    };
    fs::create_dir_all(cfg.results_dir()).unwrap();
    fs::write(cfg.checkpoint_file(), b"bad").unwrap();
    let err = launch(&cfg).unwrap_err();
    assert!(matches!(err, SimError::InitializationAbort(_)), "{err}");
}

#[test]
fn checkpoint_into_missing_directory_aborts() {
    let dir = tempfile::tempdir().unwrap();
    let ckpt = dir.path().join("missing").join("checkpoint.dat");
    let results = run_group(2, |c| {
        let state = initialize(c, 4, false, &ckpt).unwrap();
        let mut scratch = Vec::new();
        checkpoint_state(c, &state, &mut scratch, 0, &ckpt)
    });
    assert!(matches!(results[0], Err(SimError::CheckpointOpen { .. })));
    assert!(matches!(results[1], Err(SimError::Comm(CommError::Aborted { .. }))));
}

// ==================================================================================
// Diagnostic gather tests
// ==================================================================================

#[test]
fn gather_reports_every_body_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let ckpt = dir.path().join("checkpoint.dat");
    let gathered = run_group(3, |c| {
        let state = initialize(c, 8, false, &ckpt).unwrap();
        let mut scratch = Vec::with_capacity(state.partition.node_max());
        let mut sink: Vec<(usize, Body)> = Vec::new();
        let n = collect_print(c, &state, &mut scratch, &mut sink).unwrap();
        (c.rank(), n, sink, state)
    });

    let (_, n, sink, _) = &gathered[0];
    assert_eq!(*n, 8);
    let indices: Vec<usize> = sink.iter().map(|(i, _)| *i).collect();
    assert_eq!(indices, (0..8).collect::<Vec<_>>());
    let bodies: Vec<Body> = sink.iter().map(|(_, b)| *b).collect();
    assert_eq!(bodies, generate(8, 0, 8));

    for (rank, n, sink, state) in &gathered[1..] {
        assert!(*rank > 0);
        assert_eq!(*n, 0);
        assert!(sink.is_empty());
        // gather is read-only
        assert_eq!(state.local, generate(state.partition.len(), state.partition.offset(), 8));
    }
}

#[test]
fn print_flag_runs_gathers() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = RunConfig {
        print: true,
        ..test_config(dir.path(), 5, 2, 1)
    };
    let reports = launch(&cfg).unwrap();
    assert_eq!(reports.len(), 2);
    assert!(reports.iter().all(|r| r.iterations_run == 1));
}
