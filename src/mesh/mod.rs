//! # Grids
//!
//! A grid decides which geometry arrays a file has and how its text shell is
//! laid out. Every grid implements [`Grid`](crate::Grid) and is driven by a
//! [`VtkFile`](crate::VtkFile), which keeps the offsets and moves the values.
//!
//! Only unstructured grids are provided. Their geometry is made of four arrays:
//!
//! | name           | location | default type | shape                    |
//! |----------------|----------|--------------|--------------------------|
//! | `Points`       | point    | `Float64`    | vector                   |
//! | `offsets`      | cell     | `Int32`      | scalar                   |
//! | `types`        | cell     | `Int32`      | scalar                   |
//! | `connectivity` | cell     | `Int32`      | scalar, or one row per cell |
//!
//! ## Homogeneous grids
//!
//! When every cell has the same element type, `offsets` and `types` carry no
//! information that is not already known from the element type and the number
//! of cells. Such grids are declared with
//! [`VtkUnstructured::homogeneous`](crate::VtkUnstructured) or
//! `set_homogeneous_dimensions`: both arrays are then generated while writing
//! and are never read back, and the connectivity becomes a table with one row
//! per cell.

mod unstructured;

pub use unstructured::{UnstructuredGrid, VtkUnstructured};
