//! Map export.
//!
//! Black-and-white PNG dumps of an occupancy grid for debugging: free cells
//! are white, everything else black.
//!
//! ```rust,ignore
//! use anveshak_map::io::save_png;
//!
//! save_png(&grid, Path::new("base.png"))?;
//! ```

use std::path::Path;

use image::{GrayImage, Luma};

use crate::error::{MapError, Result};
use crate::grid::OccupancyGrid;

const FREE_PIXEL: u8 = 255;
const OTHER_PIXEL: u8 = 0;

/// Render the grid as a grayscale image.
pub fn to_image(grid: &OccupancyGrid) -> Result<GrayImage> {
    let (width, height) = (grid.width(), grid.height());
    if width == 0 || height == 0 || width > u32::MAX as usize || height > u32::MAX as usize {
        return Err(MapError::InvalidDimensions { width, height });
    }

    let cells = grid.cells();
    Ok(GrayImage::from_fn(width as u32, height as u32, |x, y| {
        let flags = cells[y as usize * width + x as usize];
        Luma([if flags.is_free() {
            FREE_PIXEL
        } else {
            OTHER_PIXEL
        }])
    }))
}

/// Write the grid to `path` as a PNG.
pub fn save_png(grid: &OccupancyGrid, path: &Path) -> Result<()> {
    let img = to_image(grid)?;
    img.save_with_format(path, image::ImageFormat::Png)?;
    log::debug!(
        "[io] saved {}x{} map to {}",
        grid.width(),
        grid.height(),
        path.display()
    );
    Ok(())
}

impl OccupancyGrid {
    /// Write this grid to `path` as a black-and-white PNG.
    pub fn save_png(&self, path: &Path) -> Result<()> {
        save_png(self, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::GridCoord;

    #[test]
    fn test_free_cells_render_white() {
        let mut grid = OccupancyGrid::new(3, 2);
        grid.set_free_space_at(GridCoord::new(2, 1));
        grid.set_obstacle_at(GridCoord::new(0, 0));

        let img = to_image(&grid).unwrap();
        assert_eq!(img.dimensions(), (3, 2));
        assert_eq!(img.get_pixel(2, 1).0[0], 255);
        assert_eq!(img.get_pixel(0, 0).0[0], 0);
        assert_eq!(img.get_pixel(1, 0).0[0], 0);
    }

    #[test]
    fn test_empty_grid_rejected() {
        let grid = OccupancyGrid::new(0, 5);
        assert!(matches!(
            to_image(&grid),
            Err(MapError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn test_save_png_roundtrip_dimensions() {
        let mut grid = OccupancyGrid::new(4, 4);
        grid.set_free_space_at(GridCoord::new(1, 1));

        let path = std::env::temp_dir().join(format!("anveshak-io-{}.png", std::process::id()));
        grid.save_png(&path).unwrap();
        let loaded = image::open(&path).unwrap().into_luma8();
        assert_eq!(loaded.dimensions(), (4, 4));
        assert_eq!(loaded.get_pixel(1, 1).0[0], 255);
        let _ = std::fs::remove_file(&path);
    }
}
