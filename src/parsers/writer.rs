use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::utils::occupancy_grid::OccupancyGrid;

/// 把栅格写成与加载器相同的文本格式
///
/// 每一层都以 `;` 结束。浮点数使用最短的可还原表示，重新加载后与原栅格完全一致。
pub fn write_to<W: Write>(grid: &OccupancyGrid, mut out: W) -> io::Result<()> {
    let bounds = grid.bounds();
    let [nx, ny, nz] = grid.dimensions();

    writeln!(
        out,
        "#env_min(m) {} {} {}",
        bounds.min[0], bounds.min[1], bounds.min[2]
    )?;
    writeln!(
        out,
        "#env_max(m) {} {} {}",
        bounds.max[0], bounds.max[1], bounds.max[2]
    )?;
    writeln!(out, "#num_cells {} {} {}", nx, ny, nz)?;
    writeln!(out, "#cell_size(m) {}", grid.cell_size())?;

    let cells = grid.cells();
    let mut row = String::with_capacity(ny * 2);
    for z in 0..nz {
        for x in 0..nx {
            row.clear();
            for y in 0..ny {
                if y > 0 {
                    row.push(' ');
                }
                let state = cells[grid.index_from_3d(x, y, z)];
                row.push(char::from(b'0' + state.as_u8()));
            }
            writeln!(out, "{}", row)?;
        }
        writeln!(out, ";")?;
    }

    out.flush()
}

pub fn to_text(grid: &OccupancyGrid) -> io::Result<String> {
    let mut buf = Vec::new();
    write_to(grid, &mut buf)?;
    String::from_utf8(buf).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

pub fn write_file(grid: &OccupancyGrid, path: impl AsRef<Path>) -> io::Result<()> {
    let file = File::create(path)?;
    write_to(grid, BufWriter::new(file))
}
