use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{LoadError, Result};
use crate::utils::occupancy_grid::{CellState, GridBounds, OccupancyGrid};

/// 层分隔行
const LAYER_SEPARATOR: &str = ";";

/// 数据体层数超过文件头声明时的处理策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerOverflowPolicy {
    /// 直接返回 LayerOverflow 错误（查询服务使用）
    #[default]
    Strict,
    /// 忽略多余的行，把第一次越界记录在诊断信息里（可视化使用）
    Truncate,
}

/// 加载结果：栅格本身以及加载过程中记录的可恢复错误
#[derive(Debug)]
pub struct LoadedGrid {
    pub grid: OccupancyGrid,
    pub source: PathBuf,
    /// 在 Truncate 策略下被容忍的错误
    pub diagnostics: Vec<LoadError>,
    /// 因层数越界而被忽略的行数
    pub ignored_lines: usize,
}

/// 文件头的四行内容
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridHeader {
    pub bounds: GridBounds,
    pub dimensions: [usize; 3],
    pub cell_size: f64,
}

/// 三维占据栅格文本格式解析器
///
/// 文件格式：
/// ```text
/// <tag> <min_x> <min_y> <min_z>
/// <tag> <max_x> <max_y> <max_z>
/// <tag> <cells_x> <cells_y> <cells_z>
/// <tag> <cell_size>
/// <cells_x 行，每行 cells_y 个整数>   (第 0 层)
/// ;
/// <cells_x 行，每行 cells_y 个整数>   (第 1 层)
/// ;
/// ```
/// 每个数据行对应一个固定的 x，行内第 j 个值对应 y = j，`;` 使 z 加一。
#[derive(Debug, Clone, Copy, Default)]
pub struct OccupancyGridLoader {
    policy: LayerOverflowPolicy,
}

impl OccupancyGridLoader {
    pub fn new(policy: LayerOverflowPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> LayerOverflowPolicy {
        self.policy
    }

    /// 从文件加载栅格，文件只读取一次
    ///
    /// 空路径返回 [`LoadError::MissingSource`]，不会访问文件系统。
    pub fn load(&self, path: impl AsRef<Path>) -> Result<LoadedGrid> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(LoadError::MissingSource);
        }

        let file = File::open(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.load_reader(BufReader::new(file), path)
    }

    /// 从内存中的文本加载栅格
    pub fn load_str(&self, text: &str) -> Result<LoadedGrid> {
        self.load_reader(text.as_bytes(), Path::new("<memory>"))
    }

    /// 逐行解析：先读四行文件头，再对数据体做一次折叠
    pub fn load_reader<R: BufRead>(&self, reader: R, source: &Path) -> Result<LoadedGrid> {
        let mut lines = reader.lines().enumerate().map(|(i, line)| {
            line.map(|l| (i + 1, l)).map_err(|e| LoadError::Io {
                path: source.to_path_buf(),
                source: e,
            })
        });

        let header = parse_header(&mut lines)?;
        check_extent(&header);

        let mut grid =
            OccupancyGrid::filled_free(header.bounds, header.dimensions, header.cell_size)
                .map_err(|message| LoadError::header(3, message))?;
        let mut cursor = BodyCursor::default();
        for line in lines {
            let (line_no, text) = line?;
            cursor = self.apply_line(cursor, line_no, &text, &mut grid)?;
        }

        let [_, _, nz] = header.dimensions;
        let layers_read = cursor.layers_read();
        if layers_read < nz {
            log::warn!(
                "[加载] {} 只包含 {} 层数据，文件头声明了 {} 层，其余单元格视为空闲",
                source.display(),
                layers_read,
                nz
            );
        }

        let mut diagnostics = Vec::new();
        if let Some(overflow) = cursor.overflow {
            log::warn!(
                "[加载] {}: {}，共忽略 {} 行",
                source.display(),
                overflow,
                cursor.ignored_lines
            );
            diagnostics.push(overflow);
        }

        log::info!(
            "[加载] {} 完成: 维度 {:?}，单元格 {} m，占据 {}，出口 {}",
            source.display(),
            grid.dimensions(),
            grid.cell_size(),
            grid.count(CellState::Occupied),
            grid.count(CellState::Outlet)
        );

        Ok(LoadedGrid {
            grid,
            source: source.to_path_buf(),
            diagnostics,
            ignored_lines: cursor.ignored_lines,
        })
    }

    /// 处理数据体中的一行，返回新的游标
    fn apply_line(
        &self,
        mut cursor: BodyCursor,
        line_no: usize,
        line: &str,
        grid: &mut OccupancyGrid,
    ) -> Result<BodyCursor> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(cursor);
        }

        let [nx, ny, nz] = grid.dimensions();

        if line == LAYER_SEPARATOR {
            log::debug!("[加载] 第 {} 层读取完成 ({} 行)", cursor.z, cursor.x);
            cursor.z += 1;
            cursor.x = 0;
            return Ok(cursor);
        }

        if cursor.z >= nz {
            let overflow = LoadError::LayerOverflow {
                line: line_no,
                layer: cursor.z,
                declared: nz,
            };
            match self.policy {
                LayerOverflowPolicy::Strict => return Err(overflow),
                LayerOverflowPolicy::Truncate => {
                    cursor.overflow.get_or_insert(overflow);
                    cursor.ignored_lines += 1;
                    return Ok(cursor);
                }
            }
        }

        if cursor.x >= nx {
            return Err(LoadError::RowOverflow {
                line: line_no,
                message: format!("第 {} 层已经有 {} 行 (cells_x = {})", cursor.z, cursor.x, nx),
            });
        }

        for (y, token) in line.split_whitespace().enumerate() {
            if y >= ny {
                return Err(LoadError::RowOverflow {
                    line: line_no,
                    message: format!("一行最多 {} 个值 (cells_y)", ny),
                });
            }
            let value: i64 = token.parse().map_err(|_| LoadError::BodyParse {
                line: line_no,
                token: token.to_string(),
            })?;
            let state = CellState::try_from(value)
                .map_err(|value| LoadError::InvalidCellValue { line: line_no, value })?;
            let index = grid.index_from_3d(cursor.x, y, cursor.z);
            grid.set(index, state);
        }

        cursor.x += 1;
        Ok(cursor)
    }
}

/// 按严格策略加载文件
pub fn load(path: impl AsRef<Path>) -> Result<OccupancyGrid> {
    OccupancyGridLoader::default().load(path).map(|loaded| loaded.grid)
}

/// 数据体解析状态，在逐行折叠中传递
#[derive(Debug, Default)]
struct BodyCursor {
    /// 当前层内的行号，即 x 索引
    x: usize,
    /// 当前层，即 z 索引
    z: usize,
    ignored_lines: usize,
    overflow: Option<LoadError>,
}

impl BodyCursor {
    /// 已经开始读取的层数（末尾缺少 `;` 时最后一层也计入）
    fn layers_read(&self) -> usize {
        if self.x > 0 { self.z + 1 } else { self.z }
    }
}

fn parse_header<I>(lines: &mut I) -> Result<GridHeader>
where
    I: Iterator<Item = Result<(usize, String)>>,
{
    let mut next_line = |expected_line: usize| -> Result<(usize, String)> {
        match lines.next() {
            Some(line) => line,
            None => Err(LoadError::header(expected_line, "文件在文件头结束前终止")),
        }
    };

    let (line_no, text) = next_line(1)?;
    let min: [f64; 3] = parse_fields(line_no, &text)?;
    let (line_no, text) = next_line(2)?;
    let max: [f64; 3] = parse_fields(line_no, &text)?;
    let (line_no, text) = next_line(3)?;
    let dimensions: [usize; 3] = parse_fields(line_no, &text)?;
    let (line_no, text) = next_line(4)?;
    let [cell_size]: [f64; 1] = parse_fields(line_no, &text)?;

    for (line_no, values) in [(1, &min), (2, &max)] {
        if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
            return Err(LoadError::header(line_no, format!("边界值 {} 不是有限数", bad)));
        }
    }
    if dimensions.contains(&0) {
        return Err(LoadError::header(3, format!("单元格数量必须为正: {:?}", dimensions)));
    }
    if dimensions
        .iter()
        .try_fold(1usize, |acc, n| acc.checked_mul(*n))
        .is_none()
    {
        return Err(LoadError::header(3, format!("单元格总数溢出: {:?}", dimensions)));
    }
    if !(cell_size.is_finite() && cell_size > 0.0) {
        return Err(LoadError::header(4, format!("单元格边长必须为正: {}", cell_size)));
    }

    Ok(GridHeader {
        bounds: GridBounds { min, max },
        dimensions,
        cell_size,
    })
}

/// 解析 "<tag> v1 v2 ..."，标签被忽略，数值个数必须恰好为 N
fn parse_fields<T: FromStr + Copy + Default, const N: usize>(
    line_no: usize,
    text: &str,
) -> Result<[T; N]> {
    let mut tokens = text.split_whitespace();
    if tokens.next().is_none() {
        return Err(LoadError::header(line_no, "空行"));
    }

    let values: Vec<&str> = tokens.collect();
    if values.len() != N {
        return Err(LoadError::header(
            line_no,
            format!("标签后需要 {} 个数值，但得到 {} 个", N, values.len()),
        ));
    }

    let mut out = [T::default(); N];
    for (slot, token) in out.iter_mut().zip(values) {
        *slot = token
            .parse()
            .map_err(|_| LoadError::header(line_no, format!("无法解析数值 '{}'", token)))?;
    }
    Ok(out)
}

/// 检查 (max - min) / cell_size 与单元格数量是否大致一致，只记录警告
fn check_extent(header: &GridHeader) {
    for axis in 0..3 {
        let span = header.bounds.max[axis] - header.bounds.min[axis];
        let expected = span / header.cell_size;
        let declared = header.dimensions[axis] as f64;
        if (expected - declared).abs() > 1.0 {
            log::warn!(
                "[加载] 轴 {} 的范围 {:.3} m / {} m = {:.1}，与声明的 {} 个单元格不一致",
                axis,
                span,
                header.cell_size,
                expected,
                header.dimensions[axis]
            );
        }
    }
}
