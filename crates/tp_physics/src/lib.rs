// crates/tp_physics/src/lib.rs

//! 液面高度场求解器模块
//!
//! 在不规则（非矩形）网格上模拟二维液面高度场，每步依次执行：
//! 外力施加 → 扩散（高度差产生竖直速度）→ 体积测量 → 守恒修正 → 平流（速度积分到高度）。
//!
//! - 表面拓扑 (topology) - 由逐列前/后边界构建单元与四向邻居表
//! - 表面网格 (surface) - 包围盒、世界坐标到单元索引的映射
//! - 状态管理 (state) - 高度与竖直速度数组
//! - 引擎核心 (engine) - 模拟管线、外力队列、执行后端
//! - 体积跟踪 (volume) - 基准体积与排水体积
//! - 外部效果 (effects) - 降雨等瞬时体积扰动
//! - 门面 (fluid) - 组合上述模块的完整液面
//!
//! # Trait 抽象
//!
//! - [`SimulationStrategy`]: 执行后端接口，串行与并行实现在可观测输出上等价
//!
//! # 示例
//!
//! ```
//! use tp_physics::{FluidEngine, HeightFieldState, SurfaceTopology};
//! use tp_config::BackendKind;
//!
//! let topology = SurfaceTopology::uniform(3, 3);
//! let mut state = HeightFieldState::from_topology(&topology).unwrap();
//! state.heights_mut()[4] = 1.0;
//!
//! let mut engine = FluidEngine::with_backend(state, BackendKind::Sequential, 16, 0);
//! let report = engine.simulate(1.0, 20.0, 0.998, 0.02);
//! assert_eq!(report.clamped_cells, 0);
//! assert!(engine.state().speeds()[4] < 0.0);
//! ```

#![warn(clippy::all)]

pub mod effects;
pub mod engine;
pub mod fluid;
pub mod state;
pub mod surface;
pub mod topology;
pub mod volume;

// 重导出常用类型
pub use effects::RainEffect;
pub use engine::{
    create_strategy, CellParallelStrategy, ChunkParallelStrategy, FluidEngine, ForceQueue,
    ForceRequest, SequentialStrategy, SimulationMetrics, SimulationStrategy, StepParams,
    StepReport,
};
pub use fluid::FluidSurface;
pub use state::{HeightFieldState, StateError};
pub use surface::SurfaceGrid;
pub use topology::{Direction, Neighbor, StripData, SurfaceLimit, SurfaceTopology, MAX_CELLS};
pub use volume::{DisplacerId, VolumeTracker};
