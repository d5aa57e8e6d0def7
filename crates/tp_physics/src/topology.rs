// crates/tp_physics/src/topology.rs

//! 表面拓扑构建
//!
//! 将逐列（strip）的前/后边界转换为扁平的单元数组与四向邻居表。
//!
//! # 索引空间
//!
//! 每一列在一个固定高度的局部 z 索引空间 `[0, max_strip_size)` 中占据一段连续区间
//! `[local_offset, local_offset + count)`，区间外的位置不存在单元。
//! 全局单元索引按列依次累加：
//!
//! ```text
//! strip 0: global [0, c0)          local [o0, o0 + c0)
//! strip 1: global [c0, c0 + c1)    local [o1, o1 + c1)
//! ...
//! ```
//!
//! # 反射边界
//!
//! 几何上不存在的邻居一律指向单元自身，使边界处梯度为零，
//! 既不回绕也不产生非法引用。

use serde::{Deserialize, Serialize};
use tp_foundation::validation::{ValidationError, ValidationReport, ValidationWarning};
use tp_foundation::{TpError, TpResult};

/// 单个液面允许的最大单元数，同时限制局部 z 索引空间的大小
pub const MAX_CELLS: usize = 1 << 28;

// ============================================================
// 输入与基础类型
// ============================================================

/// 单列的表面边界（世界坐标 z）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceLimit {
    /// 后边界（z 较小一侧）
    pub back: f64,
    /// 前边界（z 较大一侧）
    pub front: f64,
}

impl SurfaceLimit {
    /// 创建边界
    #[inline]
    pub const fn new(back: f64, front: f64) -> Self {
        Self { back, front }
    }

    /// 是否满足 `front >= back`
    #[inline]
    pub fn is_well_formed(&self) -> bool {
        self.front >= self.back
    }
}

/// 单列在局部/全局索引空间中的位置
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StripData {
    /// 列首单元在局部 z 索引空间中的偏移
    pub local_offset: usize,
    /// 列首单元的全局索引
    pub global_offset: usize,
    /// 列内单元数
    pub count: usize,
}

impl StripData {
    /// 局部 z 是否落在本列
    #[inline]
    pub fn contains_local(&self, z: usize) -> bool {
        z >= self.local_offset && z < self.local_offset + self.count
    }

    /// 局部区间的末端（不含）
    #[inline]
    pub fn local_end(&self) -> usize {
        self.local_offset + self.count
    }
}

/// 邻居方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// x 负方向
    PrevX,
    /// x 正方向
    NextX,
    /// z 负方向
    PrevZ,
    /// z 正方向
    NextZ,
}

impl Direction {
    /// 全部方向
    pub const ALL: [Direction; 4] = [
        Direction::PrevX,
        Direction::NextX,
        Direction::PrevZ,
        Direction::NextZ,
    ];

    /// 方向名称
    pub fn name(&self) -> &'static str {
        match self {
            Self::PrevX => "prevX",
            Self::NextX => "nextX",
            Self::PrevZ => "prevZ",
            Self::NextZ => "nextZ",
        }
    }

    /// 相反方向
    pub fn opposite(&self) -> Self {
        match self {
            Self::PrevX => Self::NextX,
            Self::NextX => Self::PrevX,
            Self::PrevZ => Self::NextZ,
            Self::NextZ => Self::PrevZ,
        }
    }

    /// 局部坐标偏移 (dx, dz)
    #[inline]
    fn offset(&self) -> (isize, isize) {
        match self {
            Self::PrevX => (-1, 0),
            Self::NextX => (1, 0),
            Self::PrevZ => (0, -1),
            Self::NextZ => (0, 1),
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// 单元的四向邻居索引
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Neighbor {
    /// x 负方向邻居
    pub prev_x: usize,
    /// x 正方向邻居
    pub next_x: usize,
    /// z 负方向邻居
    pub prev_z: usize,
    /// z 正方向邻居
    pub next_z: usize,
}

impl Neighbor {
    /// 所有方向都指向自身的孤立单元
    #[inline]
    pub const fn isolated(index: usize) -> Self {
        Self {
            prev_x: index,
            next_x: index,
            prev_z: index,
            next_z: index,
        }
    }

    /// 按方向取邻居
    #[inline]
    pub fn get(&self, direction: Direction) -> usize {
        match direction {
            Direction::PrevX => self.prev_x,
            Direction::NextX => self.next_x,
            Direction::PrevZ => self.prev_z,
            Direction::NextZ => self.next_z,
        }
    }

    /// 以数组形式返回 `[prev_x, next_x, prev_z, next_z]`
    #[inline]
    pub fn as_array(&self) -> [usize; 4] {
        [self.prev_x, self.next_x, self.prev_z, self.next_z]
    }
}

// ============================================================
// 表面拓扑
// ============================================================

/// 表面拓扑：列元数据 + 邻居表
///
/// 构建一次后不可变；高度场状态持有其邻居表的共享副本。
#[derive(Debug, Clone, Default)]
pub struct SurfaceTopology {
    strips: Vec<StripData>,
    neighbors: Vec<Neighbor>,
    max_strip_size: usize,
    n_cells: usize,
}

impl SurfaceTopology {
    /// 从逐列边界构建拓扑
    ///
    /// # 参数
    /// - `limits`: 每列的 `(back, front)` 世界 z 边界，要求 `front >= back`
    /// - `grid_resolution`: 网格间距，必须为正
    /// - `reference_z`: 参考行的世界 z 坐标（液面中心）
    ///
    /// 每列的有效边界先与相邻两列取并集，以平滑单列尖刺。
    /// 不合法的边界（`front < back`）不报错，只会得到更短甚至为空的列。
    ///
    /// # 错误
    /// 间距非正、参考坐标或边界非有限，或单元数超过 [`MAX_CELLS`] 时返回错误。
    pub fn build(
        limits: &[SurfaceLimit],
        grid_resolution: f64,
        reference_z: f64,
    ) -> TpResult<Self> {
        TpError::check_positive("grid_resolution", grid_resolution)?;
        TpError::check_finite("reference_z", reference_z)?;
        if limits.is_empty() {
            return Ok(Self::default());
        }

        let half_resolution = grid_resolution / 2.0;
        let bbox_min_z = limits.iter().map(|l| l.back).fold(f64::INFINITY, f64::min);

        // 在浮点域判定范围后再转整数，之后的加减不会溢出
        let cells_before = |distance: f64| -> TpResult<i64> {
            let cells = ((distance - half_resolution) / grid_resolution).ceil();
            if cells.abs() <= MAX_CELLS as f64 {
                Ok(cells as i64)
            } else {
                Err(TpError::invalid_topology(format!(
                    "距离 {distance} 在间距 {grid_resolution} 下对应 {cells} 个单元, 超出上限 {MAX_CELLS}"
                )))
            }
        };

        let reference_offset = cells_before(reference_z - bbox_min_z)?;
        let n_strips = limits.len();
        let mut spans = Vec::with_capacity(n_strips);
        let mut total = 0usize;

        for i in 0..n_strips {
            let mut back = limits[i].back;
            let mut front = limits[i].front;

            if i > 0 {
                back = back.min(limits[i - 1].back);
                front = front.max(limits[i - 1].front);
            }
            if i + 1 < n_strips {
                back = back.min(limits[i + 1].back);
                front = front.max(limits[i + 1].front);
            }

            let n_back = cells_before(reference_z - back)?;
            let n_front = cells_before(front - reference_z)?;

            let local_offset = (reference_offset - n_back).max(0) as usize;
            let count = n_back + n_front + 2;
            if count <= 0 || !limits[i].is_well_formed() {
                log::warn!(
                    "第 {} 列边界异常 (back={}, front={})，生成 {} 个单元",
                    i,
                    limits[i].back,
                    limits[i].front,
                    count.max(0)
                );
            }
            let count = count.max(0) as usize;

            total += count;
            if total > MAX_CELLS || local_offset + count > MAX_CELLS {
                return Err(TpError::invalid_topology(format!(
                    "第 {i} 列之后单元数或局部索引超出上限 {MAX_CELLS}"
                )));
            }
            spans.push((local_offset, count));
        }

        let topology = Self::from_column_spans(&spans);
        log::debug!(
            "表面拓扑构建完成: {} 列, {} 个单元, 最大列长 {}",
            topology.strip_count(),
            topology.n_cells(),
            topology.max_strip_size()
        );
        Ok(topology)
    }

    /// 从逐列 `(local_offset, count)` 直接构建拓扑
    pub fn from_column_spans(spans: &[(usize, usize)]) -> Self {
        let mut strips = Vec::with_capacity(spans.len());
        let mut n_cells = 0;
        let mut max_strip_size = 0;

        for &(local_offset, count) in spans {
            strips.push(StripData {
                local_offset,
                global_offset: n_cells,
                count,
            });
            n_cells += count;
            max_strip_size = max_strip_size.max(local_offset + count);
        }

        let mut topology = Self {
            strips,
            neighbors: (0..n_cells).map(Neighbor::isolated).collect(),
            max_strip_size,
            n_cells,
        };
        topology.link_neighbors();
        topology
    }

    /// 规则矩形网格（`n_x` 列，每列 `n_z` 个单元）
    ///
    /// 单元 `(x, z)` 的全局索引为 `x * n_z + z`。
    pub fn uniform(n_x: usize, n_z: usize) -> Self {
        let spans = vec![(0, n_z); n_x];
        Self::from_column_spans(&spans)
    }

    /// 两遍扫描建立邻居表
    ///
    /// 第一遍计算全部四个方向；第二遍仅在 `prevZ` 既不指向自身、
    /// 又不等于 `nextZ` 时重新推导 `prevZ`，其余三个方向无条件重算。
    fn link_neighbors(&mut self) {
        for x in 0..self.strips.len() {
            for z in 0..self.max_strip_size {
                let Some(index) = self.vertex_index(x as isize, z as isize) else {
                    continue;
                };
                let mut neighbor = Neighbor::isolated(index);
                for direction in Direction::ALL {
                    let link = self.step(x, z, direction, index);
                    match direction {
                        Direction::PrevX => neighbor.prev_x = link,
                        Direction::NextX => neighbor.next_x = link,
                        Direction::PrevZ => neighbor.prev_z = link,
                        Direction::NextZ => neighbor.next_z = link,
                    }
                }
                self.neighbors[index] = neighbor;
            }
        }

        for x in 0..self.strips.len() {
            for z in 0..self.max_strip_size {
                let Some(index) = self.vertex_index(x as isize, z as isize) else {
                    continue;
                };
                let current = self.neighbors[index];
                let prev_z = if current.prev_z != index && current.prev_z != current.next_z {
                    self.step(x, z, Direction::PrevZ, index)
                } else {
                    current.prev_z
                };
                self.neighbors[index] = Neighbor {
                    prev_z,
                    next_z: self.step(x, z, Direction::NextZ, index),
                    prev_x: self.step(x, z, Direction::PrevX, index),
                    next_x: self.step(x, z, Direction::NextX, index),
                };
            }
        }
    }

    #[inline]
    fn step(&self, x: usize, z: usize, direction: Direction, default: usize) -> usize {
        let (dx, dz) = direction.offset();
        self.vertex_index_or(x as isize + dx, z as isize + dz, default)
    }

    // ========== 查询 ==========

    /// 局部坐标 `(x, z)` 对应的全局单元索引
    ///
    /// `x` 超出 `[0, strip_count)` 或 `(x, z)` 不在该列的有效区间时返回 `None`。
    #[inline]
    pub fn vertex_index(&self, x: isize, z: isize) -> Option<usize> {
        if x < 0 || z < 0 {
            return None;
        }
        let strip = self.strips.get(x as usize)?;
        let z = z as usize;
        if strip.contains_local(z) {
            Some(strip.global_offset + z - strip.local_offset)
        } else {
            None
        }
    }

    /// 同 [`vertex_index`](Self::vertex_index)，缺失时返回调用方给定的默认值
    #[inline]
    pub fn vertex_index_or(&self, x: isize, z: isize, default: usize) -> usize {
        self.vertex_index(x, z).unwrap_or(default)
    }

    /// 全局索引对应的局部坐标 `(x, z)`
    pub fn cell_coords(&self, index: usize) -> Option<(usize, usize)> {
        if index >= self.n_cells {
            return None;
        }
        // 空列与后继列共享 global_offset，取最后一个不超过 index 的非空列
        let x = self
            .strips
            .partition_point(|s| s.global_offset <= index)
            .checked_sub(1)?;
        let x = (0..=x).rev().find(|&i| self.strips[i].count > 0)?;
        let strip = &self.strips[x];
        Some((x, strip.local_offset + index - strip.global_offset))
    }

    /// 单元数
    #[inline]
    pub fn n_cells(&self) -> usize {
        self.n_cells
    }

    /// 列数
    #[inline]
    pub fn strip_count(&self) -> usize {
        self.strips.len()
    }

    /// 局部 z 索引空间大小
    #[inline]
    pub fn max_strip_size(&self) -> usize {
        self.max_strip_size
    }

    /// 列元数据
    #[inline]
    pub fn strips(&self) -> &[StripData] {
        &self.strips
    }

    /// 邻居表
    #[inline]
    pub fn neighbors(&self) -> &[Neighbor] {
        &self.neighbors
    }

    /// 取出邻居表
    pub fn into_neighbors(self) -> Vec<Neighbor> {
        self.neighbors
    }

    // ========== 验证 ==========

    /// 验证拓扑不变量
    ///
    /// - 邻居索引均在 `[0, n_cells)`
    /// - 缺失方向的邻居指向自身，存在的方向指向几何邻居
    /// - 邻接关系对称
    pub fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::new();

        if self.neighbors.len() != self.n_cells {
            report.add_error(ValidationError::LengthMismatch {
                expected: self.n_cells,
                actual: self.neighbors.len(),
            });
            return report;
        }

        for (x, strip) in self.strips.iter().enumerate() {
            if strip.count == 0 {
                report.add_warning(ValidationWarning::EmptyStrip { strip: x });
            }

            for z in strip.local_offset..strip.local_end() {
                let cell = strip.global_offset + z - strip.local_offset;
                let neighbor = self.neighbors[cell];

                for direction in Direction::ALL {
                    let link = neighbor.get(direction);
                    if link >= self.n_cells {
                        report.add_error(ValidationError::LinkOutOfRange {
                            cell,
                            direction: direction.name(),
                            link,
                            n_cells: self.n_cells,
                        });
                        continue;
                    }

                    let expected = self.step(x, z, direction, cell);
                    if link != expected {
                        report.add_error(ValidationError::LinkMismatch {
                            cell,
                            direction: direction.name(),
                            link,
                            expected,
                        });
                    } else if link != cell
                        && self.neighbors[link].get(direction.opposite()) != cell
                    {
                        report.add_error(ValidationError::AsymmetricLink {
                            cell,
                            direction: direction.name(),
                            link,
                        });
                    }
                }
            }
        }

        report
    }
}

// ============================================================
// 测试
// ============================================================
