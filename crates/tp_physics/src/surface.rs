// crates/tp_physics/src/surface.rs

//! 表面网格
//!
//! 描述液面在世界空间中的包围盒与逐列边界，负责世界坐标与单元索引之间的映射。
//!
//! # 坐标约定
//!
//! - 列 `x` 沿世界 x 轴，间距为 `grid_resolution`，列 0 位于 `bbox_min.x`
//! - 局部 z 索引 `z` 对应世界 `bbox_min.z + z·res − res/2`
//! - 静止液面位于 `bbox_max.y`，池底位于 `bbox_min.y`，单元高度从池底量起

use glam::DVec3;
use serde::{Deserialize, Serialize};
use tp_foundation::{ensure, TpError, TpResult};

use crate::topology::{SurfaceLimit, SurfaceTopology, MAX_CELLS};

/// 表面网格
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceGrid {
    /// 液面中心（`origin.z` 为参考行）
    origin: DVec3,
    /// 网格间距
    grid_resolution: f64,
    /// 包围盒最小角
    bbox_min: DVec3,
    /// 包围盒最大角（`max.y` 为静止液面）
    bbox_max: DVec3,
    /// 逐列边界
    limits: Vec<SurfaceLimit>,
}

impl SurfaceGrid {
    /// 矩形液面
    ///
    /// 包围盒为 `origin ± half_extent`，但上表面固定在 `origin.y`。
    /// 生成 `1 + ceil(宽度 / res)` 列，每列覆盖完整的 z 范围。
    pub fn rectangle(origin: DVec3, half_extent: DVec3, grid_resolution: f64) -> TpResult<Self> {
        TpError::check_positive("grid_resolution", grid_resolution)?;
        ensure!(
            half_extent.cmpge(DVec3::ZERO).all() && half_extent.is_finite() && origin.is_finite(),
            TpError::invalid_input(format!("半尺寸必须为非负有限值: {half_extent}"))
        );

        let bbox_min = origin - half_extent;
        let mut bbox_max = origin + half_extent;
        bbox_max.y = origin.y;

        let spans = ((bbox_max.x - bbox_min.x) / grid_resolution).ceil();
        ensure!(
            spans < MAX_CELLS as f64,
            TpError::invalid_topology(format!("宽度对应 {spans} 列, 超出上限 {MAX_CELLS}"))
        );
        let n_strips = 1 + spans as usize;
        let limits = vec![SurfaceLimit::new(bbox_min.z, bbox_max.z); n_strips];

        Ok(Self {
            origin,
            grid_resolution,
            bbox_min,
            bbox_max,
            limits,
        })
    }

    /// 由外部探测得到的逐列边界构建
    ///
    /// 包围盒的 z 范围取所有列的并集，x 从 `x_min` 起按列延伸，
    /// y 从 `floor_y` 到 `origin.y`。
    pub fn from_limits(
        origin: DVec3,
        x_min: f64,
        floor_y: f64,
        limits: Vec<SurfaceLimit>,
        grid_resolution: f64,
    ) -> TpResult<Self> {
        TpError::check_positive("grid_resolution", grid_resolution)?;
        ensure!(!limits.is_empty(), TpError::invalid_input("逐列边界不能为空"));
        ensure!(
            floor_y <= origin.y,
            TpError::invalid_input(format!("池底 {floor_y} 高于液面 {}", origin.y))
        );

        let min_z = limits.iter().map(|l| l.back).fold(f64::INFINITY, f64::min);
        let max_z = limits.iter().map(|l| l.front).fold(f64::NEG_INFINITY, f64::max);
        let x_max = x_min + (limits.len() - 1) as f64 * grid_resolution;

        Ok(Self {
            origin,
            grid_resolution,
            bbox_min: DVec3::new(x_min, floor_y, min_z),
            bbox_max: DVec3::new(x_max, origin.y, max_z),
            limits,
        })
    }

    /// 构建表面拓扑（参考行为 `origin.z`）
    pub fn build_topology(&self) -> TpResult<SurfaceTopology> {
        SurfaceTopology::build(&self.limits, self.grid_resolution, self.origin.z)
    }

    // ========== 坐标映射 ==========

    /// 世界坐标对应的 `(列, 局部 z)`，落在包围盒负侧时返回 `None`
    pub fn grid_coords(&self, world: DVec3) -> Option<(isize, isize)> {
        let half = self.half_resolution();
        let x = ((world.x - self.bbox_min.x + half) / self.grid_resolution).floor();
        let z = ((world.z - self.bbox_min.z + half) / self.grid_resolution).floor();
        if !(x.is_finite() && z.is_finite()) || x < 0.0 || z < 0.0 {
            return None;
        }
        Some((x as isize, z as isize))
    }

    /// 世界坐标对应的单元索引
    pub fn cell_index_at(&self, topology: &SurfaceTopology, world: DVec3) -> Option<usize> {
        let (x, z) = self.grid_coords(world)?;
        topology.vertex_index(x, z)
    }

    /// 网格点相对 `bbox_min` 的静止位置
    #[inline]
    pub fn vertex_local_position(&self, x: usize, z: usize) -> DVec3 {
        DVec3::new(
            x as f64 * self.grid_resolution,
            self.depth(),
            z as f64 * self.grid_resolution - self.half_resolution(),
        )
    }

    /// 网格点的静止世界位置
    #[inline]
    pub fn vertex_world_position(&self, x: usize, z: usize) -> DVec3 {
        self.bbox_min + self.vertex_local_position(x, z)
    }

    /// 给定单元高度的世界液面高程
    #[inline]
    pub fn surface_level(&self, height: f64) -> f64 {
        self.bbox_min.y + height
    }

    // ========== 几何量 ==========

    /// 静止水深 `max.y − min.y`（每个单元的初始高度）
    #[inline]
    pub fn depth(&self) -> f64 {
        self.bbox_max.y - self.bbox_min.y
    }

    /// 包围盒水平面积
    #[inline]
    pub fn area(&self) -> f64 {
        let size = self.bbox_max - self.bbox_min;
        size.x * size.z
    }

    /// 网格间距
    #[inline]
    pub fn grid_resolution(&self) -> f64 {
        self.grid_resolution
    }

    /// 网格间距的一半
    #[inline]
    pub fn half_resolution(&self) -> f64 {
        self.grid_resolution / 2.0
    }

    /// 液面中心
    #[inline]
    pub fn origin(&self) -> DVec3 {
        self.origin
    }

    /// 包围盒最小角
    #[inline]
    pub fn bbox_min(&self) -> DVec3 {
        self.bbox_min
    }

    /// 包围盒最大角
    #[inline]
    pub fn bbox_max(&self) -> DVec3 {
        self.bbox_max
    }

    /// 逐列边界
    #[inline]
    pub fn limits(&self) -> &[SurfaceLimit] {
        &self.limits
    }
}
