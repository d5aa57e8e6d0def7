// crates/tp_physics/tests/interaction.rs

//! 交互接口与基准场景测试

use tp_config::BackendKind;
use tp_foundation::TpError;
use tp_physics::{FluidEngine, HeightFieldState, SurfaceTopology};

fn uniform_engine(n_x: usize, n_z: usize, kind: BackendKind) -> FluidEngine {
    let topology = SurfaceTopology::uniform(n_x, n_z);
    let mut state = HeightFieldState::from_topology(&topology).unwrap();
    state.fill_height(1.0);
    FluidEngine::with_backend(state, kind, 3, 0)
}

// ============================================================
// 外力队列
// ============================================================

/// 同一单元的两次外力与一次合力等效
#[test]
fn test_force_queue_additive() {
    let mut split = uniform_engine(4, 4, BackendKind::Sequential);
    let mut combined = uniform_engine(4, 4, BackendKind::Sequential);
    let target = split.state().total_volume();

    split.apply_force(5, 3.0, 2.0).unwrap();
    split.apply_force(5, 1.0, 4.0).unwrap();
    combined.apply_force(5, 3.0 / 2.0 + 1.0 / 4.0, 1.0).unwrap();

    let a = split.simulate(target, 20.0, 0.998, 0.5);
    let b = combined.simulate(target, 20.0, 0.998, 0.5);

    assert_eq!(a.forces_applied, 2);
    assert_eq!(b.forces_applied, 1);
    for i in 0..split.n_cells() {
        let (va, vb) = (split.state().speeds()[i], combined.state().speeds()[i]);
        assert!((va - vb).abs() < 1e-12, "单元 {i}: {va} vs {vb}");
    }
}

/// 外力在扩散之前施加，且只施加一次
#[test]
fn test_force_applied_before_diffusion_once() {
    let mut engine = uniform_engine(3, 3, BackendKind::Sequential);
    let target = engine.state().total_volume();

    engine.apply_force(4, -10.0, 1.0).unwrap();
    engine.simulate(target, 0.0, 1.0, 0.1);
    // 无扩散、无衰减：Δv = a·Δt
    assert!((engine.state().speeds()[4] + 1.0).abs() < 1e-12);

    engine.simulate(target, 0.0, 1.0, 0.1);
    assert!((engine.state().speeds()[4] + 1.0).abs() < 1e-12);
}

#[test]
fn test_out_of_range_requests_rejected() {
    let mut engine = uniform_engine(2, 3, BackendKind::Sequential);
    let before = engine.state().clone();

    let err = engine.apply_force(6, 1.0, 1.0).unwrap_err();
    assert!(matches!(err, TpError::CellOutOfBounds { .. }));
    assert!(engine.displace_volume(100, 1.0).is_err());
    assert!(engine.apply_force(0, 1.0, -1.0).is_err());
    assert!(engine.apply_force(0, f64::NAN, 1.0).is_err());

    assert!(engine.pending_forces().is_empty());
    assert_eq!(engine.state().heights(), before.heights());
}

#[test]
fn test_displace_volume_immediate() {
    let mut engine = uniform_engine(2, 2, BackendKind::Sequential);
    engine.displace_volume(2, 0.25).unwrap();
    assert_eq!(engine.height(2), Some(1.25));
    assert!(engine.pending_forces().is_empty());
}

// ============================================================
// 基准场景：3×3 网格中心扰动
// ============================================================

#[test]
fn test_center_disturbance_scenario() {
    for kind in [
        BackendKind::Sequential,
        BackendKind::ChunkParallel,
        BackendKind::CellParallel,
    ] {
        let topology = SurfaceTopology::uniform(3, 3);
        let mut state = HeightFieldState::from_topology(&topology).unwrap();
        state.set_height(4, 1.0).unwrap();
        let mut engine = FluidEngine::with_backend(state, kind, 2, 0);

        let report = engine.simulate(1.0, 20.0, 0.998, 0.02);
        let speeds = engine.state().speeds();

        // 中心: (0 − 1)·0.4·0.998
        assert!((speeds[4] + 0.3992).abs() < 1e-12, "{kind}: {}", speeds[4]);
        for i in [1, 3, 5, 7] {
            // 正交邻居: (0.25 − 0)·0.4·0.998
            assert!((speeds[i] - 0.0998).abs() < 1e-12, "{kind}: 单元 {i} {}", speeds[i]);
        }
        for i in [0, 2, 6, 8] {
            assert_eq!(speeds[i], 0.0, "{kind}: 角点 {i}");
        }

        assert_eq!(report.clamped_cells, 0);
        assert!((report.measured_volume - 1.0).abs() < 1e-15);
        assert!((engine.state().total_volume() - 1.0).abs() < 1e-12);
        assert!((engine.height(4).unwrap() - 0.992016).abs() < 1e-12);
    }
}
