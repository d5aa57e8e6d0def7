// crates/tp_physics/tests/backend_equivalence.rs

//! 后端等价性测试
//!
//! 相同初始状态与输入下，串行、分块并行、逐单元并行三种后端
//! 在一个或多个时间步之后给出浮点容差内相同的高度与速度。

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use tp_physics::{
    CellParallelStrategy, ChunkParallelStrategy, FluidEngine, HeightFieldState,
    SequentialStrategy, SimulationStrategy, SurfaceTopology,
};

// ============================================================
// 测试辅助函数
// ============================================================

const REL_TOL: f64 = 1e-9;

/// 以固定种子随机播种高度与速度
fn seeded_state(topology: &SurfaceTopology, seed: u64) -> HeightFieldState {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut state = HeightFieldState::from_topology(topology).unwrap();
    for h in state.heights_mut() {
        *h = rng.gen_range(0.5..2.0);
    }
    for v in state.speeds_mut() {
        *v = rng.gen_range(-0.5..0.5);
    }
    state
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= REL_TOL * a.abs().max(b.abs()).max(1.0)
}

fn assert_states_close(reference: &HeightFieldState, other: &HeightFieldState, label: &str) {
    assert_eq!(reference.n_cells(), other.n_cells());
    for i in 0..reference.n_cells() {
        let (h0, h1) = (reference.heights()[i], other.heights()[i]);
        let (v0, v1) = (reference.speeds()[i], other.speeds()[i]);
        assert!(close(h0, h1), "{label}: 单元 {i} 高度 {h0} vs {h1}");
        assert!(close(v0, v1), "{label}: 单元 {i} 速度 {v0} vs {v1}");
    }
}

/// 在给定拓扑上用全部后端运行若干步并逐一比较
fn check_equivalence(topology: &SurfaceTopology, chunk_counts: &[usize], steps: usize) {
    let state = seeded_state(topology, 42);
    let target = state.total_volume() + 0.1;
    let forced = topology.n_cells() / 2;

    let run = |strategy: Box<dyn SimulationStrategy>| {
        let mut engine = FluidEngine::new(state.clone(), strategy);
        for step in 0..steps {
            if step == 0 && topology.n_cells() > 0 {
                engine.apply_force(forced, -3.0, 2.0).unwrap();
                engine.apply_force(0, 1.0, 1.0).unwrap();
            }
            engine.simulate(target, 20.0, 0.998, 0.02);
        }
        engine.state().clone()
    };

    let reference = run(Box::new(SequentialStrategy::new()));
    for &k in chunk_counts {
        let chunked = run(Box::new(ChunkParallelStrategy::new(k)));
        assert_states_close(&reference, &chunked, &format!("chunk_parallel(K={k})"));
    }
    let cellwise = run(Box::new(CellParallelStrategy::new()));
    assert_states_close(&reference, &cellwise, "cell_parallel");
}

// ============================================================
// 测试
// ============================================================

#[test]
fn test_single_cell() {
    check_equivalence(&SurfaceTopology::uniform(1, 1), &[1, 3, 7, 16], 3);
}

#[test]
fn test_two_cells() {
    check_equivalence(&SurfaceTopology::uniform(1, 2), &[1, 3, 7, 16], 3);
}

#[test]
fn test_seventeen_cells_irregular() {
    let topology = SurfaceTopology::from_column_spans(&[(1, 4), (0, 6), (2, 3), (0, 4)]);
    assert_eq!(topology.n_cells(), 17);
    check_equivalence(&topology, &[2, 3, 7, 16], 5);
}

#[test]
fn test_ten_thousand_cells() {
    let topology = SurfaceTopology::uniform(100, 100);
    assert_eq!(topology.n_cells(), 10_000);
    check_equivalence(&topology, &[3, 7, 16], 4);
}

#[test]
fn test_built_topology() {
    use tp_physics::SurfaceLimit;

    let limits: Vec<SurfaceLimit> = (0..12)
        .map(|i| {
            let w = 1.0 + (i as f64 * 0.7).sin().abs() * 2.0;
            SurfaceLimit::new(-w, w * 0.8)
        })
        .collect();
    let topology = SurfaceTopology::build(&limits, 0.25, 0.0).unwrap();
    assert!(topology.validate().is_valid());
    check_equivalence(&topology, &[0, 3, 7], 6);
}

#[test]
fn test_empty_topology() {
    check_equivalence(&SurfaceTopology::uniform(0, 0), &[3], 2);
}

#[test]
fn test_speeds_bitwise_identical_after_one_step() {
    // 速度只依赖逐单元算式，与调度无关
    let topology = SurfaceTopology::uniform(13, 11);
    let state = seeded_state(&topology, 7);
    let target = state.total_volume();

    let mut sequential = FluidEngine::new(state.clone(), Box::new(SequentialStrategy::new()));
    let mut chunked = FluidEngine::new(state, Box::new(ChunkParallelStrategy::new(7)));
    sequential.simulate(target, 20.0, 0.998, 0.02);
    chunked.simulate(target, 20.0, 0.998, 0.02);

    assert_eq!(sequential.state().speeds(), chunked.state().speeds());
}
