use serde::{Deserialize, Serialize};

/// 单元格状态
///
/// 数值与文件格式一致：0 空闲，1 占据，2 出口。
/// 出口是独立的状态，不会被折叠为占据；两者都属于"非空闲"。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum CellState {
    #[default]
    Free = 0,
    Occupied = 1,
    Outlet = 2,
}

impl CellState {
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn is_free(self) -> bool {
        self == CellState::Free
    }
}

impl TryFrom<i64> for CellState {
    type Error = i64;

    fn try_from(value: i64) -> std::result::Result<Self, Self::Error> {
        match value {
            0 => Ok(CellState::Free),
            1 => Ok(CellState::Occupied),
            2 => Ok(CellState::Outlet),
            other => Err(other),
        }
    }
}

/// 栅格的空间范围（米）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridBounds {
    pub min: [f64; 3],
    pub max: [f64; 3],
}

/// 三维占据栅格
/// 数据按 x 变化最快，y 其次，z 最慢的顺序存储
/// 索引计算: index = x + y * nx + z * nx * ny
#[derive(Debug, Clone, PartialEq)]
pub struct OccupancyGrid {
    bounds: GridBounds,
    /// 网格维度 [nx, ny, nz]
    dimensions: [usize; 3],
    /// 单元格边长（米）
    cell_size: f64,
    cells: Vec<CellState>,
}

impl OccupancyGrid {
    /// 用给定的单元格数据创建栅格，数据长度必须与维度一致
    pub fn new(
        bounds: GridBounds,
        dimensions: [usize; 3],
        cell_size: f64,
        cells: Vec<CellState>,
    ) -> Result<Self, String> {
        let total = cell_total(dimensions)?;
        if cells.len() != total {
            return Err(format!(
                "数据量不匹配: 维度 {:?} 需要 {} 个单元格，但提供了 {} 个",
                dimensions,
                total,
                cells.len()
            ));
        }

        Ok(Self {
            bounds,
            dimensions,
            cell_size,
            cells,
        })
    }

    /// 创建全部为空闲的栅格
    ///
    /// 内存分配失败时返回错误，而不是中止进程。
    pub fn filled_free(
        bounds: GridBounds,
        dimensions: [usize; 3],
        cell_size: f64,
    ) -> Result<Self, String> {
        let total = cell_total(dimensions)?;
        let mut cells = Vec::new();
        cells
            .try_reserve_exact(total)
            .map_err(|e| format!("无法为 {} 个单元格分配内存: {}", total, e))?;
        cells.resize(total, CellState::Free);

        Ok(Self {
            bounds,
            dimensions,
            cell_size,
            cells,
        })
    }

    pub fn bounds(&self) -> GridBounds {
        self.bounds
    }

    pub fn dimensions(&self) -> [usize; 3] {
        self.dimensions
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn cells(&self) -> &[CellState] {
        &self.cells
    }

    /// 原始占据序列（0/1/2），用于批量查询响应
    pub fn occupancy(&self) -> Vec<u8> {
        self.cells.iter().map(|c| c.as_u8()).collect()
    }

    /// 三维坐标到线性索引
    ///
    /// 不做边界检查：越界输入会得到与其他单元格重叠的索引。
    /// 调用方需要先保证 `x < nx`、`y < ny`、`z < nz`，或者使用 [`Self::checked_index`]。
    #[inline]
    pub fn index_from_3d(&self, x: usize, y: usize, z: usize) -> usize {
        let [nx, ny, _] = self.dimensions;
        x + y * nx + z * nx * ny
    }

    /// 带边界检查的线性索引
    pub fn checked_index(&self, x: usize, y: usize, z: usize) -> Option<usize> {
        self.contains_cell(x, y, z)
            .then(|| self.index_from_3d(x, y, z))
    }

    /// 线性索引到三维坐标
    pub fn coords_from_index(&self, index: usize) -> Option<[usize; 3]> {
        if index >= self.cells.len() {
            return None;
        }
        let [nx, ny, _] = self.dimensions;
        Some([index % nx, (index / nx) % ny, index / (nx * ny)])
    }

    pub fn contains_cell(&self, x: usize, y: usize, z: usize) -> bool {
        let [nx, ny, nz] = self.dimensions;
        x < nx && y < ny && z < nz
    }

    /// 单元格状态，越界时返回 None
    pub fn cell_state(&self, x: usize, y: usize, z: usize) -> Option<CellState> {
        self.checked_index(x, y, z).map(|i| self.cells[i])
    }

    /// 单元格中心的世界坐标: min + (index + 0.5) * cell_size
    pub fn cell_center(&self, x: usize, y: usize, z: usize) -> [f64; 3] {
        let min = self.bounds.min;
        [
            min[0] + (x as f64 + 0.5) * self.cell_size,
            min[1] + (y as f64 + 0.5) * self.cell_size,
            min[2] + (z as f64 + 0.5) * self.cell_size,
        ]
    }

    /// 包含给定世界坐标点的单元格
    /// 每个轴上的有效区间为 [min, min + n * cell_size)
    pub fn cell_containing(&self, point: [f64; 3]) -> Option<[usize; 3]> {
        let mut cell = [0usize; 3];
        for axis in 0..3 {
            let offset = (point[axis] - self.bounds.min[axis]) / self.cell_size;
            if !offset.is_finite() || offset < 0.0 {
                return None;
            }
            let index = offset.floor() as usize;
            if index >= self.dimensions[axis] {
                return None;
            }
            cell[axis] = index;
        }
        Some(cell)
    }

    /// 给定世界坐标点所在单元格的状态
    pub fn state_at(&self, point: [f64; 3]) -> Option<CellState> {
        let [x, y, z] = self.cell_containing(point)?;
        self.cell_state(x, y, z)
    }

    /// 按线性索引顺序遍历处于给定状态的单元格
    pub fn cells_in_state(&self, state: CellState) -> impl Iterator<Item = [usize; 3]> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(move |(_, c)| **c == state)
            .filter_map(|(i, _)| self.coords_from_index(i))
    }

    /// 所有非空闲单元格（占据与出口）
    pub fn non_free_cells(&self) -> impl Iterator<Item = [usize; 3]> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, c)| !c.is_free())
            .filter_map(|(i, _)| self.coords_from_index(i))
    }

    pub fn count(&self, state: CellState) -> usize {
        self.cells.iter().filter(|c| **c == state).count()
    }

    pub(crate) fn set(&mut self, index: usize, state: CellState) {
        self.cells[index] = state;
    }
}

/// 单元格总数，维度为 0 或乘积溢出时返回错误
fn cell_total(dimensions: [usize; 3]) -> Result<usize, String> {
    if dimensions.contains(&0) {
        return Err(format!("单元格数量必须为正: {:?}", dimensions));
    }
    dimensions
        .iter()
        .try_fold(1usize, |acc, n| acc.checked_mul(*n))
        .ok_or_else(|| format!("单元格总数溢出: {:?}", dimensions))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn grid_2x3x4() -> OccupancyGrid {
        let bounds = GridBounds {
            min: [-1.0, 0.0, 2.0],
            max: [0.0, 1.5, 4.0],
        };
        OccupancyGrid::filled_free(bounds, [2, 3, 4], 0.5).unwrap()
    }

    #[test]
    fn test_index_is_injective_over_bounds() {
        let grid = grid_2x3x4();
        let mut seen = vec![false; grid.cell_count()];
        for z in 0..4 {
            for y in 0..3 {
                for x in 0..2 {
                    let i = grid.index_from_3d(x, y, z);
                    assert!(!seen[i], "索引 {} 重复", i);
                    seen[i] = true;
                    assert_eq!(grid.coords_from_index(i), Some([x, y, z]));
                }
            }
        }
        assert!(seen.iter().all(|s| *s));
    }

    #[test]
    fn test_raw_index_aliases_out_of_range() {
        let grid = grid_2x3x4();
        // x == nx 与下一行的 x == 0 重叠
        assert_eq!(grid.index_from_3d(2, 0, 0), grid.index_from_3d(0, 1, 0));
        assert_eq!(grid.checked_index(2, 0, 0), None);
        assert_eq!(grid.checked_index(1, 2, 3), Some(1 + 2 * 2 + 3 * 6));
    }

    #[test]
    fn test_cell_center() {
        let grid = grid_2x3x4();
        let c = grid.cell_center(0, 0, 0);
        assert_relative_eq!(c[0], -0.75);
        assert_relative_eq!(c[1], 0.25);
        assert_relative_eq!(c[2], 2.25);

        let c = grid.cell_center(1, 2, 3);
        assert_relative_eq!(c[0], -0.25);
        assert_relative_eq!(c[1], 1.25);
        assert_relative_eq!(c[2], 3.75);
    }

    #[test]
    fn test_cell_containing_boundaries() {
        let grid = grid_2x3x4();
        assert_eq!(grid.cell_containing([-1.0, 0.0, 2.0]), Some([0, 0, 0]));
        assert_eq!(grid.cell_containing([-0.5, 0.5, 2.5]), Some([1, 1, 1]));
        assert_eq!(grid.cell_containing([-0.01, 1.49, 3.99]), Some([1, 2, 3]));
        // 上边界不属于栅格
        assert_eq!(grid.cell_containing([0.0, 0.0, 2.0]), None);
        assert_eq!(grid.cell_containing([-1.01, 0.0, 2.0]), None);
        assert_eq!(grid.cell_containing([f64::NAN, 0.0, 2.0]), None);
    }

    #[test]
    fn test_cell_center_is_contained_in_its_cell() {
        let grid = grid_2x3x4();
        for z in 0..4 {
            for y in 0..3 {
                for x in 0..2 {
                    let center = grid.cell_center(x, y, z);
                    assert_eq!(grid.cell_containing(center), Some([x, y, z]));
                }
            }
        }
    }

    #[test]
    fn test_outlet_is_distinct_but_not_free() {
        let mut grid = grid_2x3x4();
        let occupied = grid.index_from_3d(1, 0, 0);
        let outlet = grid.index_from_3d(0, 2, 3);
        grid.set(occupied, CellState::Occupied);
        grid.set(outlet, CellState::Outlet);

        assert_eq!(grid.cell_state(1, 0, 0), Some(CellState::Occupied));
        assert_eq!(grid.cell_state(0, 2, 3), Some(CellState::Outlet));
        assert_eq!(grid.cells_in_state(CellState::Occupied).collect::<Vec<_>>(), vec![[1, 0, 0]]);
        assert_eq!(grid.cells_in_state(CellState::Outlet).collect::<Vec<_>>(), vec![[0, 2, 3]]);
        assert_eq!(
            grid.non_free_cells().collect::<Vec<_>>(),
            vec![[1, 0, 0], [0, 2, 3]]
        );
        assert_eq!(grid.count(CellState::Free), 22);
        assert_eq!(grid.state_at(grid.cell_center(0, 2, 3)), Some(CellState::Outlet));
    }

    #[test]
    fn test_new_rejects_wrong_length() {
        let bounds = GridBounds {
            min: [0.0; 3],
            max: [1.0; 3],
        };
        assert!(OccupancyGrid::new(bounds, [2, 2, 2], 0.5, vec![CellState::Free; 7]).is_err());
        let grid = OccupancyGrid::new(bounds, [2, 2, 2], 0.5, vec![CellState::Free; 8]).unwrap();
        assert_eq!(grid.occupancy(), vec![0; 8]);
    }

    #[test]
    fn test_constructors_reject_zero_and_overflowing_dimensions() {
        let bounds = GridBounds {
            min: [0.0; 3],
            max: [1.0; 3],
        };
        assert!(OccupancyGrid::new(bounds, [2, 0, 2], 0.5, Vec::new()).is_err());
        assert!(OccupancyGrid::filled_free(bounds, [0, 1, 1], 0.5).is_err());
        assert!(OccupancyGrid::new(bounds, [usize::MAX, 2, 1], 0.5, Vec::new()).is_err());
        assert!(OccupancyGrid::filled_free(bounds, [usize::MAX, 2, 1], 0.5).is_err());
    }

    #[test]
    fn test_filled_free_reports_unallocatable_size() {
        let bounds = GridBounds {
            min: [0.0; 3],
            max: [1.0; 3],
        };
        // 乘积不溢出 usize，但超过 isize::MAX
        let err = OccupancyGrid::filled_free(bounds, [1 << 32, 1 << 31, 1], 1.0).unwrap_err();
        assert!(err.contains("分配内存"), "{}", err);
    }

    #[test]
    fn test_cell_state_try_from() {
        assert_eq!(CellState::try_from(2i64), Ok(CellState::Outlet));
        assert_eq!(CellState::try_from(3i64), Err(3));
        assert_eq!(CellState::try_from(-1i64), Err(-1));
    }
}
