// crates/tp_physics/src/engine/strategy/mod.rs

//! 执行后端策略
//!
//! 提供五阶段模拟管线的统一接口：
//!
//! 1. 施加外力
//! 2. 扩散（读取更新前的高度快照）
//! 3. 体积测量（与扩散同一快照）
//! 4. 守恒修正（全局归约）
//! 5. 平流（零下限截断）
//!
//! 各实现仅在内部调度上不同，对相同输入必须给出浮点容差内相同的结果。

pub mod cellwise;
pub mod chunked;
pub mod sequential;

use tp_config::BackendKind;

use crate::engine::forces::ForceRequest;
use crate::engine::{StepParams, StepReport};
use crate::state::HeightFieldState;

/// 执行后端 trait
pub trait SimulationStrategy: Send + Sync {
    /// 策略名称
    fn name(&self) -> &'static str;

    /// 执行一个完整时间步
    ///
    /// `forces` 已从队列中取出；无论结果如何，调用方都不会再次提交它们。
    fn step(
        &mut self,
        state: &mut HeightFieldState,
        forces: &[ForceRequest],
        params: &StepParams,
    ) -> StepReport;

    /// 是否使用多线程
    fn is_parallel(&self) -> bool {
        false
    }
}

/// 根据后端类型创建策略
///
/// `Auto` 在单元数低于 `min_parallel_size` 时退化为串行。
pub fn create_strategy(
    kind: BackendKind,
    n_cells: usize,
    chunk_count: usize,
    min_parallel_size: usize,
) -> Box<dyn SimulationStrategy> {
    match kind.resolve(n_cells, min_parallel_size) {
        BackendKind::ChunkParallel => Box::new(ChunkParallelStrategy::new(chunk_count)),
        BackendKind::CellParallel => Box::new(CellParallelStrategy::new()),
        BackendKind::Sequential | BackendKind::Auto => Box::new(SequentialStrategy::new()),
    }
}

pub use cellwise::CellParallelStrategy;
pub use chunked::ChunkParallelStrategy;
pub use sequential::SequentialStrategy;
