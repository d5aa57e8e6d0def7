// crates/tp_physics/src/engine/mod.rs

//! 引擎核心
//!
//! 持有高度场状态与外力队列，每次 [`FluidEngine::simulate`] 取出队列中
//! 全部外力并交给执行后端完成一个时间步。
//!
//! # 时间步
//!
//! ```text
//! forces.drain() ─► strategy.step(state, forces, params) ─► StepReport
//!                                                         └► metrics.record
//! ```
//!
//! 队列在后端执行之前即已清空：每个请求恰好被应用一次。

pub mod forces;
pub(crate) mod kernels;
pub mod metrics;
pub mod strategy;

use std::time::Instant;

use tp_config::{simulation_config::STABILITY_LIMIT, BackendKind, SimulationConfig};
use tp_foundation::{TpError, TpResult};

use crate::state::HeightFieldState;

pub use forces::{ForceQueue, ForceRequest};
pub use metrics::SimulationMetrics;
pub use strategy::{
    create_strategy, CellParallelStrategy, ChunkParallelStrategy, SequentialStrategy,
    SimulationStrategy,
};

// ============================================================
// 时间步参数与报告
// ============================================================

/// 单个时间步的参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepParams {
    /// 目标体积（高度和）
    pub target_volume: f64,
    /// 扩散速度
    pub diffusion_speed: f64,
    /// 粘性
    pub viscosity: f64,
    /// 时间步长
    pub dt: f64,
}

impl StepParams {
    /// 创建参数
    pub fn new(target_volume: f64, diffusion_speed: f64, viscosity: f64, dt: f64) -> Self {
        Self {
            target_volume,
            diffusion_speed,
            viscosity,
            dt,
        }
    }

    /// 由配置构建，`dt` 为子步长
    pub fn from_config(config: &SimulationConfig, target_volume: f64, dt: f64) -> Self {
        Self::new(target_volume, config.diffusion_speed, config.viscosity, dt)
    }

    /// 扩散传递率 `diffusion_speed · Δt`
    #[inline]
    pub fn transfer_rate(&self) -> f64 {
        self.diffusion_speed * self.dt
    }

    /// 稳定性数 `diffusion_speed · Δt²`
    #[inline]
    pub fn stability_number(&self) -> f64 {
        self.diffusion_speed * self.dt * self.dt
    }
}

/// 单个时间步的结果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepReport {
    /// 扩散前测得的高度和
    pub measured_volume: f64,
    /// 每单元体积修正量
    pub volume_per_cell: f64,
    /// 本步施加的外力请求数
    pub forces_applied: usize,
    /// 被零下限截断的单元数
    pub clamped_cells: usize,
}

impl StepReport {
    /// 本步是否发生截断（截断会使体积偏离目标）
    #[inline]
    pub fn has_clamping(&self) -> bool {
        self.clamped_cells > 0
    }
}

// ============================================================
// 引擎
// ============================================================

/// 液面模拟引擎
pub struct FluidEngine {
    state: HeightFieldState,
    forces: ForceQueue,
    strategy: Box<dyn SimulationStrategy>,
    metrics: SimulationMetrics,
    stability_warned: bool,
}

impl std::fmt::Debug for FluidEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FluidEngine")
            .field("n_cells", &self.state.n_cells())
            .field("backend", &self.strategy.name())
            .field("pending_forces", &self.forces.len())
            .finish()
    }
}

impl FluidEngine {
    /// 使用指定策略创建引擎
    pub fn new(state: HeightFieldState, strategy: Box<dyn SimulationStrategy>) -> Self {
        log::debug!(
            "创建模拟引擎: {} 个单元, 后端 {}",
            state.n_cells(),
            strategy.name()
        );
        Self {
            state,
            forces: ForceQueue::new(),
            strategy,
            metrics: SimulationMetrics::default(),
            stability_warned: false,
        }
    }

    /// 按后端类型创建引擎
    pub fn with_backend(
        state: HeightFieldState,
        kind: BackendKind,
        chunk_count: usize,
        min_parallel_size: usize,
    ) -> Self {
        let strategy = create_strategy(kind, state.n_cells(), chunk_count, min_parallel_size);
        Self::new(state, strategy)
    }

    /// 执行一个时间步
    pub fn simulate(
        &mut self,
        target_volume: f64,
        diffusion_speed: f64,
        viscosity: f64,
        dt: f64,
    ) -> StepReport {
        self.simulate_with(&StepParams::new(
            target_volume,
            diffusion_speed,
            viscosity,
            dt,
        ))
    }

    /// 以参数结构执行一个时间步
    pub fn simulate_with(&mut self, params: &StepParams) -> StepReport {
        if !self.stability_warned && params.stability_number() >= STABILITY_LIMIT {
            log::warn!(
                "diffusion_speed·dt² = {:.3} 超出稳定上限 {}，结果可能发散",
                params.stability_number(),
                STABILITY_LIMIT
            );
            self.stability_warned = true;
        }

        let forces = self.forces.drain();
        let start = Instant::now();
        let report = self.strategy.step(&mut self.state, &forces, params);
        let elapsed = start.elapsed();

        log::trace!(
            "step: volume={:.6} correction={:.3e} forces={} clamped={} ({:?})",
            report.measured_volume,
            report.volume_per_cell,
            report.forces_applied,
            report.clamped_cells,
            elapsed
        );
        if report.has_clamping() {
            log::debug!("{} 个单元被截断到零高度", report.clamped_cells);
        }

        self.metrics.record(&report, params.target_volume, elapsed);
        report
    }

    /// 提交外力，在下一次 `simulate` 开始时生效
    ///
    /// 加速度为 `force / mass`；同一单元的多个请求相加。
    pub fn apply_force(&mut self, index: usize, force: f64, mass: f64) -> TpResult<()> {
        self.forces.push(index, force, mass, self.state.n_cells())
    }

    /// 立即改变单元高度（不截断）
    ///
    /// 可能使高度暂时为负，直到下一次平流截断。
    pub fn displace_volume(&mut self, index: usize, volume: f64) -> TpResult<()> {
        TpError::check_cell(index, self.state.n_cells())?;
        TpError::check_finite("volume", volume)?;
        self.state.heights_mut()[index] += volume;
        Ok(())
    }

    // ========== 访问器 ==========

    /// 单元高度
    #[inline]
    pub fn height(&self, index: usize) -> Option<f64> {
        self.state.height(index)
    }

    /// 单元数量
    #[inline]
    pub fn n_cells(&self) -> usize {
        self.state.n_cells()
    }

    /// 当前状态
    #[inline]
    pub fn state(&self) -> &HeightFieldState {
        &self.state
    }

    /// 可变状态
    #[inline]
    pub fn state_mut(&mut self) -> &mut HeightFieldState {
        &mut self.state
    }

    /// 后端名称
    #[inline]
    pub fn backend_name(&self) -> &'static str {
        self.strategy.name()
    }

    /// 性能指标
    #[inline]
    pub fn metrics(&self) -> &SimulationMetrics {
        &self.metrics
    }

    /// 待处理的外力请求
    #[inline]
    pub fn pending_forces(&self) -> &[ForceRequest] {
        self.forces.pending()
    }
}
