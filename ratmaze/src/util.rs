use std::path::Path;

use anyhow::{anyhow, Context};
use image::DynamicImage;
use log::debug;

use crate::{Cell, GridMap};

/// Dark pixels become blocked cells, everything else is free
pub fn parse_img(img: &DynamicImage) -> Result<GridMap, anyhow::Error> {
    let img = img.to_luma8();
    let (width, height) = img.dimensions();

    if width != height {
        return Err(anyhow!("Maze image must be square, got {}x{}", width, height));
    }

    let size = width as usize;
    let mut cells = vec![vec![Cell::Blocked; size]; size];

    for row in 0..size {
        for col in 0..size {
            let p = img.get_pixel(col as u32, row as u32);

            cells[row][col] = if p.0[0] < 128 {
                Cell::Blocked
            } else {
                Cell::Free
            }
        }
    }

    GridMap::from_rows(cells)
}

/// Load a maze, picking the format from the file extension: `json`, an image format, or
/// the plain text format for anything else
pub fn load_grid(path: impl AsRef<Path>) -> Result<GridMap, anyhow::Error> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    debug!("loading maze from {}", path.display());

    let map = match extension.as_deref() {
        Some("json") => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("invalid maze in {}", path.display()))?
        }
        Some("png" | "jpg" | "jpeg" | "bmp" | "gif") => {
            let img = image::open(path)
                .with_context(|| format!("failed to open image {}", path.display()))?;
            parse_img(&img)?
        }
        _ => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?
            .parse()
            .with_context(|| format!("invalid maze in {}", path.display()))?,
    };

    Ok(map)
}

#[cfg(test)]
mod test {

    use image::{GrayImage, Luma};

    use super::*;
    use crate::Point;

    #[test]
    fn test_parse_img() {
        let img = GrayImage::from_fn(3, 3, |x, y| {
            if x == 1 && y != 2 {
                Luma([0])
            } else {
                Luma([255])
            }
        });

        let map = parse_img(&DynamicImage::ImageLuma8(img)).unwrap();

        assert_eq!(map.to_string(), ".X.\n.X.\n...\n");
        assert_eq!(map.get(Point { row: 0, col: 1 }), Some(Cell::Blocked));
    }

    #[test]
    fn test_parse_img_not_square() {
        let img = GrayImage::new(3, 2);
        assert!(parse_img(&DynamicImage::ImageLuma8(img)).is_err());
    }

    #[test]
    fn test_load_missing_file() {
        assert!(load_grid("does/not/exist.txt").is_err());
        assert!(load_grid("does/not/exist.json").is_err());
    }

    #[test]
    fn test_load_sample() {
        let map = load_grid(concat!(env!("CARGO_MANIFEST_DIR"), "/../data/maze-01.txt"))
            .unwrap();

        assert_eq!(map.size(), 8);
        assert!(map.validate().is_ok());

        let json = load_grid(concat!(env!("CARGO_MANIFEST_DIR"), "/../data/maze-01.json"))
            .unwrap();
        assert_eq!(json, map);
    }
}
