// crates/tp_physics/src/fluid.rs

//! 液面门面
//!
//! 将配置、表面网格、拓扑、引擎与体积跟踪组合为一个完整的液面：
//!
//! ```text
//! SimulationConfig ─┐
//! SurfaceGrid ──────┼─► SurfaceTopology ─► HeightFieldState ─► FluidEngine
//!                   └─► VolumeTracker (baseline = depth · N · res²)
//! ```
//!
//! 每帧 [`FluidSurface::step`] 按配置的子步数推进，
//! 每个子步都重新计算目标体积。

use glam::DVec3;
use tp_config::SimulationConfig;
use tp_foundation::{TpError, TpResult};

use crate::engine::{FluidEngine, StepParams, StepReport};
use crate::state::HeightFieldState;
use crate::surface::SurfaceGrid;
use crate::topology::SurfaceTopology;
use crate::volume::{DisplacerId, VolumeTracker};

/// 完整液面
#[derive(Debug)]
pub struct FluidSurface {
    config: SimulationConfig,
    grid: SurfaceGrid,
    topology: SurfaceTopology,
    engine: FluidEngine,
    volume: VolumeTracker,
}

impl FluidSurface {
    /// 创建液面，所有单元以静止水深播种
    pub fn new(config: SimulationConfig, grid: SurfaceGrid) -> TpResult<Self> {
        config
            .validate()
            .map_err(|e| TpError::config(e.to_string()))?;
        if (config.grid_resolution - grid.grid_resolution()).abs() > f64::EPSILON {
            return Err(TpError::config(format!(
                "配置网格间距 {} 与表面网格间距 {} 不一致",
                config.grid_resolution,
                grid.grid_resolution()
            )));
        }

        let topology = grid.build_topology()?;
        let report = topology.validate();
        if !report.is_valid() {
            return Err(TpError::invalid_topology(report.to_string()));
        }

        let height = vec![grid.depth(); topology.n_cells()];
        let state = HeightFieldState::with_heights(topology.neighbors(), height)?;
        let volume = VolumeTracker::from_state(&state, config.cell_area())?;
        let engine = FluidEngine::with_backend(
            state,
            config.backend,
            config.chunk_count,
            config.min_parallel_size,
        );

        log::debug!(
            "液面创建完成: {} 个单元, 基准体积 {:.4}, 后端 {}",
            topology.n_cells(),
            volume.baseline_volume(),
            engine.backend_name()
        );

        Ok(Self {
            config,
            grid,
            topology,
            engine,
            volume,
        })
    }

    /// 推进一帧，返回最后一个子步的报告
    pub fn step(&mut self, frame_dt: f64) -> StepReport {
        let dt = self.config.sub_step_dt(frame_dt);
        let mut report = StepReport::default();
        for _ in 0..self.config.iterations_per_step {
            let params = StepParams::from_config(&self.config, self.volume.target_height_sum(), dt);
            report = self.engine.simulate_with(&params);
        }
        report
    }

    // ========== 交互 ==========

    /// 在世界位置处施加竖直推力（单位质量）
    ///
    /// 返回受力单元；位置不在液面上时返回 `None`。
    pub fn push_volume(&mut self, world: DVec3, force_y: f64) -> TpResult<Option<usize>> {
        match self.cell_index_at(world) {
            Some(index) => {
                self.engine.apply_force(index, force_y, 1.0)?;
                Ok(Some(index))
            }
            None => Ok(None),
        }
    }

    /// 在世界位置处直接改变高度
    ///
    /// 返回被改变的单元；位置不在液面上时返回 `None`，体积非有限时返回错误。
    pub fn displace_volume_at(&mut self, world: DVec3, volume: f64) -> TpResult<Option<usize>> {
        match self.cell_index_at(world) {
            Some(index) => {
                self.engine.displace_volume(index, volume)?;
                Ok(Some(index))
            }
            None => Ok(None),
        }
    }

    /// 按单元索引施加外力
    pub fn apply_force(&mut self, index: usize, force: f64, mass: f64) -> TpResult<()> {
        self.engine.apply_force(index, force, mass)
    }

    /// 按单元索引直接改变高度
    pub fn displace_volume(&mut self, index: usize, volume: f64) -> TpResult<()> {
        self.engine.displace_volume(index, volume)
    }

    // ========== 排水体 ==========

    /// 注册排水体
    pub fn register_displacer(&mut self) -> DisplacerId {
        self.volume.register()
    }

    /// 更新排水体的浸没体积
    pub fn update_displacer(&mut self, id: DisplacerId, submerged_volume: f64) -> TpResult<()> {
        self.volume.update(id, submerged_volume)
    }

    /// 移除排水体
    pub fn remove_displacer(&mut self, id: DisplacerId) -> Option<f64> {
        self.volume.remove(id)
    }

    // ========== 查询 ==========

    /// 世界位置对应的单元索引
    #[inline]
    pub fn cell_index_at(&self, world: DVec3) -> Option<usize> {
        self.grid.cell_index_at(&self.topology, world)
    }

    /// 世界位置处的液面高程；不在液面上时返回静止液面
    pub fn surface_level_at(&self, world: DVec3) -> f64 {
        self.cell_index_at(world)
            .and_then(|index| self.engine.height(index))
            .map_or(self.grid.bbox_max().y, |h| self.grid.surface_level(h))
    }

    /// 单元高度
    #[inline]
    pub fn height(&self, index: usize) -> Option<f64> {
        self.engine.height(index)
    }

    /// 当前体积（世界单位）
    pub fn measured_volume(&self) -> f64 {
        self.volume.measured_volume(self.engine.state())
    }

    /// 单元数量
    #[inline]
    pub fn n_cells(&self) -> usize {
        self.topology.n_cells()
    }

    /// 配置
    #[inline]
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// 表面网格
    #[inline]
    pub fn grid(&self) -> &SurfaceGrid {
        &self.grid
    }

    /// 表面拓扑
    #[inline]
    pub fn topology(&self) -> &SurfaceTopology {
        &self.topology
    }

    /// 模拟引擎
    #[inline]
    pub fn engine(&self) -> &FluidEngine {
        &self.engine
    }

    /// 可变模拟引擎
    #[inline]
    pub fn engine_mut(&mut self) -> &mut FluidEngine {
        &mut self.engine
    }

    /// 体积跟踪器
    #[inline]
    pub fn volume(&self) -> &VolumeTracker {
        &self.volume
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tp_config::BackendKind;

    fn make_surface() -> FluidSurface {
        let config = SimulationConfig {
            backend: BackendKind::Sequential,
            ..Default::default()
        };
        let grid =
            SurfaceGrid::rectangle(DVec3::new(0.0, 1.0, 0.0), DVec3::new(2.0, 1.0, 1.0), 0.5)
                .unwrap();
        FluidSurface::new(config, grid).unwrap()
    }

    #[test]
    fn test_seeded_at_rest_depth() {
        let surface = make_surface();
        assert_eq!(surface.n_cells(), 54);
        assert!((0..surface.n_cells()).all(|i| surface.height(i) == Some(1.0)));
        assert!((surface.volume().baseline_volume() - 54.0 * 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_resolution_mismatch_rejected() {
        let config = SimulationConfig {
            grid_resolution: 0.25,
            ..Default::default()
        };
        let grid = SurfaceGrid::rectangle(DVec3::ZERO, DVec3::ONE, 0.5).unwrap();
        assert!(matches!(FluidSurface::new(config, grid), Err(TpError::Config { .. })));
    }

    #[test]
    fn test_push_volume_outside_is_noop() {
        let mut surface = make_surface();
        let hit = surface.push_volume(DVec3::new(100.0, 0.0, 0.0), -5.0).unwrap();
        assert_eq!(hit, None);
        assert!(surface.engine().pending_forces().is_empty());

        let hit = surface.push_volume(DVec3::new(0.0, 1.0, 0.0), -5.0).unwrap();
        assert!(hit.is_some());
        assert_eq!(surface.engine().pending_forces().len(), 1);
    }

    #[test]
    fn test_surface_level() {
        let mut surface = make_surface();
        let center = DVec3::new(0.0, 1.0, 0.25);
        assert!((surface.surface_level_at(center) - 1.0).abs() < 1e-12);
        let index = surface.displace_volume_at(center, 0.5).unwrap();
        assert_eq!(index, surface.cell_index_at(center));
        assert!((surface.surface_level_at(center) - 1.5).abs() < 1e-12);
        assert_eq!(surface.surface_level_at(DVec3::new(50.0, 0.0, 0.0)), 1.0);
    }

    #[test]
    fn test_displace_volume_at_reports_bad_volume() {
        let mut surface = make_surface();
        let center = DVec3::new(0.0, 1.0, 0.25);

        // 液面外不是错误，只是没有命中
        assert_eq!(surface.displace_volume_at(DVec3::new(50.0, 0.0, 0.0), 0.5), Ok(None));

        // 命中液面但体积非法时必须返回错误，高度保持不变
        assert!(matches!(
            surface.displace_volume_at(center, f64::NAN),
            Err(TpError::NonFinite { field: "volume", .. })
        ));
        assert!((surface.surface_level_at(center) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_step_keeps_rest_state() {
        let mut surface = make_surface();
        let before = surface.measured_volume();
        let report = surface.step(1.0 / 60.0);
        assert_eq!(report.clamped_cells, 0);
        assert!((surface.measured_volume() - before).abs() < 1e-9);
    }
}
