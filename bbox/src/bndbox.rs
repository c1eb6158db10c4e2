use crate::{common::*, ImageSize};

/// Names one of the four box coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Coord {
    XMin,
    YMin,
    XMax,
    YMax,
}

impl Coord {
    /// Coordinates in annotation file order.
    pub const ALL: [Coord; 4] = [Coord::XMin, Coord::YMin, Coord::XMax, Coord::YMax];

    pub fn name(&self) -> &'static str {
        match self {
            Coord::XMin => "xmin",
            Coord::YMin => "ymin",
            Coord::XMax => "xmax",
            Coord::YMax => "ymax",
        }
    }

    /// Returns true for coordinates measured along the image width.
    pub fn is_horizontal(&self) -> bool {
        matches!(self, Coord::XMin | Coord::XMax)
    }

    /// The inclusive upper bound of this coordinate within an image.
    pub fn upper_bound(&self, size: &ImageSize) -> u32 {
        if self.is_horizontal() {
            size.width
        } else {
            size.height
        }
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Bounding box in corner format.
///
/// The type does not require `xmin <= xmax` or `ymin <= ymax`. Annotation tools
/// occasionally emit flipped corners and the dataset checks only range them
/// against the image size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BndBox<T> {
    pub xmin: T,
    pub ymin: T,
    pub xmax: T,
    pub ymax: T,
}

/// Bounding box in pixel units.
pub type PixelBndBox = BndBox<i64>;

/// Bounding box in ratio units, where the image spans `[0, 1]` on both axes.
pub type RatioBndBox = BndBox<f32>;

impl<T> BndBox<T>
where
    T: Copy,
{
    pub fn new(xmin: T, ymin: T, xmax: T, ymax: T) -> Self {
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
        }
    }

    pub fn get(&self, coord: Coord) -> T {
        match coord {
            Coord::XMin => self.xmin,
            Coord::YMin => self.ymin,
            Coord::XMax => self.xmax,
            Coord::YMax => self.ymax,
        }
    }

    pub fn coords(&self) -> [(Coord, T); 4] {
        Coord::ALL.map(|coord| (coord, self.get(coord)))
    }
}

impl BndBox<i64> {
    /// Lists the coordinates falling outside `[0, width]` or `[0, height]`.
    ///
    /// Every coordinate is checked, so the result reports all offending
    /// coordinates at once.
    pub fn out_of_range(&self, size: &ImageSize) -> Vec<Coord> {
        self.coords()
            .into_iter()
            .filter(|&(coord, value)| !(0..=coord.upper_bound(size) as i64).contains(&value))
            .map(|(coord, _)| coord)
            .collect()
    }

    /// Divides horizontal coordinates by the width and vertical ones by the height.
    ///
    /// No clamping is applied. The result lies in `[0, 1]` only if the box is within the image.
    pub fn to_ratio(&self, size: &ImageSize) -> RatioBndBox {
        let width = size.width as f64;
        let height = size.height as f64;
        BndBox {
            xmin: (self.xmin as f64 / width) as f32,
            ymin: (self.ymin as f64 / height) as f32,
            xmax: (self.xmax as f64 / width) as f32,
            ymax: (self.ymax as f64 / height) as f32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn bndbox_range_check() {
        let size = ImageSize::new(100, 50);
        assert!(PixelBndBox::new(0, 0, 100, 50).out_of_range(&size).is_empty());
        assert_eq!(
            PixelBndBox::new(-1, 0, 101, 51).out_of_range(&size),
            vec![Coord::XMin, Coord::XMax, Coord::YMax]
        );
        assert_eq!(
            PixelBndBox::new(10, 60, 20, 30).out_of_range(&size),
            vec![Coord::YMin]
        );
    }

    #[test]
    fn flipped_corners_are_not_range_errors() {
        let size = ImageSize::new(100, 50);
        assert!(PixelBndBox::new(80, 40, 20, 10).out_of_range(&size).is_empty());
    }

    #[test]
    fn bndbox_ratio_conversion() {
        let size = ImageSize::new(200, 100);
        let ratio = PixelBndBox::new(50, 25, 200, 100).to_ratio(&size);
        assert_abs_diff_eq!(ratio.xmin, 0.25);
        assert_abs_diff_eq!(ratio.ymin, 0.25);
        assert_abs_diff_eq!(ratio.xmax, 1.0);
        assert_abs_diff_eq!(ratio.ymax, 1.0);

        let ratio = PixelBndBox::new(1, 2, 3, 4).to_ratio(&ImageSize::new(3, 7));
        assert_abs_diff_eq!(ratio.xmin, 1.0 / 3.0);
        assert_abs_diff_eq!(ratio.ymax, 4.0 / 7.0);
    }

    #[test]
    fn coordinate_lookup() {
        let bbox = PixelBndBox::new(1, 2, 3, 4);
        assert_eq!(bbox.get(Coord::YMin), 2);
        assert_eq!(
            bbox.coords(),
            [
                (Coord::XMin, 1),
                (Coord::YMin, 2),
                (Coord::XMax, 3),
                (Coord::YMax, 4)
            ]
        );
        assert_eq!(Coord::YMax.to_string(), "ymax");
        assert_eq!(Coord::XMax.upper_bound(&ImageSize::new(5, 6)), 5);
        assert_eq!(Coord::YMin.upper_bound(&ImageSize::new(5, 6)), 6);
    }
}
