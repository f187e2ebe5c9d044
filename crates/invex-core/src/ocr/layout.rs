//! Reading-order assembly of recognized text regions.
//!
//! Detectors return one region per word group, often splitting a table row
//! into separate cells. The line heuristics need each visual row on a single
//! line, so regions whose vertical centres fall inside the same band are
//! joined left to right.

/// A recognized text region with its axis-aligned bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRegion {
    pub text: String,
    pub x_min: f32,
    pub y_min: f32,
    pub y_max: f32,
}

impl TextRegion {
    pub fn new(text: impl Into<String>, x_min: f32, y_min: f32, y_max: f32) -> Self {
        Self {
            text: text.into(),
            x_min,
            y_min,
            y_max,
        }
    }

    fn center_y(&self) -> f32 {
        (self.y_min + self.y_max) / 2.0
    }
}

/// Join regions into newline-separated rows in reading order.
pub fn assemble_lines(mut regions: Vec<TextRegion>) -> String {
    regions.retain(|r| !r.text.trim().is_empty());
    regions.sort_by(|a, b| a.center_y().total_cmp(&b.center_y()));

    let mut rows: Vec<Vec<TextRegion>> = Vec::new();
    let mut band = (f32::NEG_INFINITY, f32::NEG_INFINITY);

    for region in regions {
        let center = region.center_y();
        match rows.last_mut() {
            Some(row) if center >= band.0 && center <= band.1 => row.push(region),
            _ => {
                band = (region.y_min, region.y_max);
                rows.push(vec![region]);
            }
        }
    }

    rows.into_iter()
        .map(|mut row| {
            row.sort_by(|a, b| a.x_min.total_cmp(&b.x_min));
            row.iter()
                .map(|r| r.text.trim())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cells_on_one_row_are_joined() {
        let regions = vec![
            TextRegion::new("25.00", 500.0, 102.0, 118.0),
            TextRegion::new("1 Paracetamol 500mg", 10.0, 100.0, 120.0),
            TextRegion::new("01/01/2024 10 2.50", 250.0, 101.0, 119.0),
        ];

        assert_eq!(
            assemble_lines(regions),
            "1 Paracetamol 500mg 01/01/2024 10 2.50 25.00"
        );
    }

    #[test]
    fn test_rows_are_top_to_bottom() {
        let regions = vec![
            TextRegion::new("second", 0.0, 50.0, 70.0),
            TextRegion::new("first", 0.0, 10.0, 30.0),
            TextRegion::new("  ", 0.0, 80.0, 90.0),
            TextRegion::new("third", 40.0, 100.0, 120.0),
        ];

        assert_eq!(assemble_lines(regions), "first\nsecond\nthird");
    }

    #[test]
    fn test_empty_regions() {
        assert_eq!(assemble_lines(Vec::new()), "");
    }
}
