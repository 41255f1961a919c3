//! Spatial query construction
//!
//! Only whitelisted column names are interpolated into the SQL text. The
//! dataset path and the coordinates are always bound as parameters, in the
//! order given by [`bind_order`].

use super::request::Projection;

/// Geometry column of the boundary dataset
pub const GEOMETRY_COLUMN: &str = "geometry";

/// Precomputed bounding box struct column (`xmin`, `xmax`, `ymin`, `ymax`)
pub const BBOX_COLUMN: &str = "geometry_bbox";

/// Zero-row query used to read the dataset schema
pub const SCHEMA_SQL: &str = "SELECT * FROM read_parquet(?) LIMIT 0";

/// Positional parameter in the reverse geocode statement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bind {
    Path,
    Lon,
    Lat,
}

/// Parameter order matching the placeholders emitted by [`reverse_sql`]
pub const fn bind_order() -> [Bind; 7] {
    [
        Bind::Path,
        Bind::Lon,
        Bind::Lon,
        Bind::Lat,
        Bind::Lat,
        Bind::Lon,
        Bind::Lat,
    ]
}

/// Quote an identifier for DuckDB, doubling embedded quotes
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Resolve a projection against the dataset schema.
///
/// Explicit column lists keep caller order and duplicates; the `*` forms
/// follow schema order.
pub fn output_columns<'a>(projection: &'a Projection, schema: &'a [String]) -> Vec<&'a str> {
    match projection {
        Projection::AllExceptGeometry => schema
            .iter()
            .map(String::as_str)
            .filter(|c| *c != GEOMETRY_COLUMN)
            .collect(),
        Projection::All => schema.iter().map(String::as_str).collect(),
        Projection::Columns(columns) => columns.iter().map(String::as_str).collect(),
    }
}

/// Render the projection clause, one JSON text value per output column
pub fn select_clause(columns: &[&str]) -> String {
    if columns.is_empty() {
        return "NULL".to_string();
    }
    columns
        .iter()
        .map(|c| format!("CAST(to_json({}) AS VARCHAR)", quote_identifier(c)))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Build the point-in-polygon statement.
///
/// The bounding box comparison prunes rows before the exact
/// `ST_ContainsProperly` test. Column `i` of each result row holds the
/// engine-rendered JSON of `columns[i]`.
pub fn reverse_sql(columns: &[&str]) -> String {
    format!(
        "SELECT {select} \
         FROM read_parquet(?) \
         WHERE {bbox}.xmin <= ? AND {bbox}.xmax >= ? \
         AND {bbox}.ymin <= ? AND {bbox}.ymax >= ? \
         AND ST_ContainsProperly({geom}, ST_Point(?, ?))",
        select = select_clause(columns),
        bbox = BBOX_COLUMN,
        geom = GEOMETRY_COLUMN,
    )
}
