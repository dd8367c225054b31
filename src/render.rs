// Draw the occupancy grid as an image.
//
// Rows of the image follow the grid's x index and columns its y index,
// the same layout a matrix plot of grid[x, y] shows. Colours are taken
// from the ends of the viridis map.

use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_circle_mut;
use ndarray::{Array, Ix2};

use crate::aggregation::Cluster;
use crate::error::DlaError;

pub const EMPTY: Rgb<u8> = Rgb([68, 1, 84]);
pub const OCCUPIED: Rgb<u8> = Rgb([253, 231, 37]);
// Colour of the oldest cells when colouring by age
pub const EARLY: Rgb<u8> = Rgb([33, 145, 140]);
pub const SEED_MARKER: Rgb<u8> = Rgb([255, 255, 255]);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Pixels per grid cell along each axis.
    pub scale: u32,
    /// Shade stuck cells from oldest to newest instead of a flat colour.
    pub colour_by_age: bool,
    /// Circle the seed cell.
    pub mark_seed: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions {
            scale: 1,
            colour_by_age: false,
            mark_seed: false,
        }
    }
}

/// Occupied cells in one colour, empty cells in another.
pub fn render_occupancy(grid: &Array<bool, Ix2>, scale: u32) -> Result<RgbImage, DlaError> {
    let (rows, cols) = grid.dim();
    let mut img = RgbImage::new(cols as u32, rows as u32);
    for ((x, y), &occupied) in grid.indexed_iter() {
        img.put_pixel(y as u32, x as u32, if occupied { OCCUPIED } else { EMPTY });
    }
    upscale(img, scale)
}

// Side length of a scaled image; it must fit the i32 coordinates imageproc draws in.
fn scaled_side(side: u32, scale: u32) -> Result<u32, DlaError> {
    if scale == 0 {
        return Err(DlaError::InvalidConfig("render scale must be positive"));
    }
    side.checked_mul(scale)
        .filter(|&scaled| scaled <= i32::MAX as u32)
        .ok_or(DlaError::InvalidConfig("render scale is too large"))
}

fn upscale(img: RgbImage, scale: u32) -> Result<RgbImage, DlaError> {
    let width = scaled_side(img.width(), scale)?;
    let height = scaled_side(img.height(), scale)?;
    if scale == 1 {
        return Ok(img);
    }
    Ok(RgbImage::from_fn(width, height, |px, py| {
        *img.get_pixel(px / scale, py / scale)
    }))
}

fn blend(from: Rgb<u8>, to: Rgb<u8>, t: f64) -> Rgb<u8> {
    let mut out = [0u8; 3];
    for (channel, value) in out.iter_mut().enumerate() {
        let a = f64::from(from[channel]);
        let b = f64::from(to[channel]);
        *value = (a + (b - a) * t).round() as u8;
    }
    Rgb(out)
}

impl Cluster {
    pub fn image(&self, options: &RenderOptions) -> Result<RgbImage, DlaError> {
        scaled_side(self.size() as u32, options.scale)?;
        let mut img = if options.colour_by_age {
            let size = self.size() as u32;
            let mut img = RgbImage::from_pixel(size, size, EMPTY);
            let last = self.len().saturating_sub(1).max(1) as f64;
            for (age, cell) in self.cells().enumerate() {
                let colour = blend(EARLY, OCCUPIED, age as f64 / last);
                img.put_pixel(cell.y as u32, cell.x as u32, colour);
            }
            upscale(img, options.scale)?
        } else {
            render_occupancy(self.grid(), options.scale)?
        };
        if options.mark_seed {
            let seed = self.seed_cell();
            // Bounded by the scaled side checked above.
            let scale = options.scale as i32;
            let centre = (
                seed.y as i32 * scale + scale / 2,
                seed.x as i32 * scale + scale / 2,
            );
            draw_hollow_circle_mut(&mut img, centre, scale.saturating_mul(2), SEED_MARKER);
        }
        Ok(img)
    }
}
