use super::*;
use rustc_hash::FxHashMap as HashMap;
use std::ops::ControlFlow;

// Below this the columns are so wide that a single column covers every longitude.
const MIN_COS_LAT: f64 = 1.0e-6;

/// The smallest cell size [GridIndexView::build_for] accepts. Smaller cells would need more rows
/// than fit in the cell keys.
pub const MIN_CELL_KM: f64 = 1.0e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CellKey {
    row: i64,
    col: i64,
}

/// A uniform latitude / longitude grid over a slice of items.
///
/// Cells are `cell_km` tall and at least `cell_km` wide everywhere the data lives, so any item
/// within `cell_km` (as measured by [equirectangular_distance]) of a coordinate is stored in the
/// cell of that coordinate or one of the eight cells around it. Columns wrap around at the
/// antimeridian.
#[derive(Debug)]
pub struct GridIndexView<'a, T> {
    data: &'a [T],
    cells: HashMap<CellKey, Vec<usize>>,
    cell_lat: f64,
    cell_lon: f64,
    num_cols: i64,
}

impl<'a, T: Geo> GridIndexView<'a, T> {
    /// Build a view into the provided list.
    ///
    /// Returns `None` if there is no data or the cell size isn't a finite number of at least
    /// [MIN_CELL_KM].
    pub fn build_for(data: &'a [T], cell_km: f64) -> Option<Self> {
        if data.is_empty() || !cell_km.is_finite() || cell_km < MIN_CELL_KM {
            return None;
        }

        let cell_lat = cell_km / KM_PER_DEGREE;

        // Meridians converge toward the poles, so the columns must be sized for the most poleward
        // item or a neighbor could be more than one column away.
        let max_abs_lat = data
            .iter()
            .map(|item| item.centroid().lat.abs())
            .fold(0.0, f64::max);
        let cos_lat = f64::cos(max_abs_lat * DEG2RAD);

        let num_cols = if cos_lat < MIN_COS_LAT {
            1
        } else {
            ((360.0 * cos_lat / cell_lat).floor() as i64).max(1)
        };
        let cell_lon = 360.0 / num_cols as f64;

        let mut view = GridIndexView {
            data,
            cells: HashMap::with_capacity_and_hasher(data.len(), Default::default()),
            cell_lat,
            cell_lon,
            num_cols,
        };

        for (index, item) in data.iter().enumerate() {
            let key = view.key_for(item.centroid());
            view.cells.entry(key).or_default().push(index);
        }

        Some(view)
    }

    /// Apply `visit` to every item stored in the 3x3 block of cells around `coord`.
    ///
    /// The arguments to `visit` are the item, its index in the underlying slice, and an
    /// accumulator that is threaded from call to call like the accumulator of a fold. If `visit`
    /// returns `Break(..)` iteration stops right away. The final value of the accumulator is
    /// returned.
    ///
    /// Items in the same cell are visited in ascending index order.
    pub fn foreach_near<V, F>(&self, coord: Coord, user_data: V, mut visit: F) -> V
    where
        F: FnMut(&T, usize, V) -> ControlFlow<V, V>,
    {
        let center = self.key_for(coord);
        let (cols, num_cols) = self.neighbor_columns(center.col);

        let mut user_data = user_data;
        for row in center.row.saturating_sub(1)..=center.row.saturating_add(1) {
            for &col in &cols[..num_cols] {
                let indexes = match self.cells.get(&CellKey { row, col }) {
                    Some(indexes) => indexes,
                    None => continue,
                };

                for &index in indexes {
                    match visit(&self.data[index], index, user_data) {
                        ControlFlow::Continue(value) => user_data = value,
                        ControlFlow::Break(value) => return value,
                    }
                }
            }
        }

        user_data
    }

    /// The number of cells that hold at least one item.
    pub fn num_cells(&self) -> usize {
        self.cells.len()
    }

    /// Cell height and width in degrees.
    pub fn cell_size(&self) -> (f64, f64) {
        (self.cell_lat, self.cell_lon)
    }

    fn key_for(&self, coord: Coord) -> CellKey {
        let row = ((coord.lat + 90.0) / self.cell_lat).floor() as i64;
        let col = (((coord.lon + 180.0) / self.cell_lon).floor() as i64).rem_euclid(self.num_cols);

        CellKey { row, col }
    }

    fn neighbor_columns(&self, col: i64) -> ([i64; 3], usize) {
        let n = self.num_cols;
        if n >= 3 {
            ([(col - 1).rem_euclid(n), col, (col + 1).rem_euclid(n)], 3)
        } else {
            // With one or two columns every column is a neighbor, list each only once.
            ([0, 1, 2], n as usize)
        }
    }
}
