//! Arrow utility functions for extracting validated column values
//!
//! Feature columns are symptom flags and must hold 0 or 1 in every row. These
//! helpers turn arbitrary Arrow columns (integers, floats, booleans, numeric
//! strings) into flag vectors and reject anything else.

use arrow::array::{Array, ArrayRef, BooleanArray, Float64Array, Int64Array, StringArray};
use arrow::compute::{CastOptions, cast_with_options};
use arrow::datatypes::DataType;

use crate::error::{Result, TriageError};

fn strict_cast(array: &ArrayRef, to: &DataType, column: &str) -> Result<ArrayRef> {
    let options = CastOptions {
        safe: false,
        ..CastOptions::default()
    };
    cast_with_options(array, to, &options).map_err(|e| {
        TriageError::data(format!(
            "Column '{column}' cannot be read as {to}: {e}"
        ))
    })
}

fn non_binary(column: &str, row: usize, value: impl std::fmt::Display) -> TriageError {
    TriageError::data(format!(
        "Column '{column}' row {row} holds {value}, expected 0 or 1"
    ))
}

/// Extract a column of symptom flags. Nulls count as 0.
///
/// # Arguments
/// * `array` - The Arrow array
/// * `column` - Column name (for error context)
pub fn binary_flags(array: &ArrayRef, column: &str) -> Result<Vec<u8>> {
    match array.data_type() {
        DataType::Null => Ok(vec![0; array.len()]),
        DataType::Boolean => {
            let flags = array
                .as_any()
                .downcast_ref::<BooleanArray>()
                .ok_or_else(|| TriageError::data(format!("Column '{column}' is not boolean")))?;
            Ok((0..flags.len())
                .map(|i| u8::from(flags.is_valid(i) && flags.value(i)))
                .collect())
        }
        DataType::Float16 | DataType::Float32 | DataType::Float64 => {
            let cast = strict_cast(array, &DataType::Float64, column)?;
            let values = cast
                .as_any()
                .downcast_ref::<Float64Array>()
                .ok_or_else(|| TriageError::data(format!("Column '{column}' is not numeric")))?;
            (0..values.len())
                .map(|i| {
                    if values.is_null(i) {
                        return Ok(0);
                    }
                    let value = values.value(i);
                    if value == 0.0 {
                        Ok(0)
                    } else if value == 1.0 {
                        Ok(1)
                    } else {
                        Err(non_binary(column, i, value))
                    }
                })
                .collect()
        }
        _ => {
            let cast = strict_cast(array, &DataType::Int64, column)?;
            let values = cast
                .as_any()
                .downcast_ref::<Int64Array>()
                .ok_or_else(|| TriageError::data(format!("Column '{column}' is not numeric")))?;
            (0..values.len())
                .map(|i| {
                    if values.is_null(i) {
                        return Ok(0);
                    }
                    match values.value(i) {
                        0 => Ok(0),
                        1 => Ok(1),
                        other => Err(non_binary(column, i, other)),
                    }
                })
                .collect()
        }
    }
}

/// Extract a column as optional strings
pub fn string_values(array: &ArrayRef, column: &str) -> Result<Vec<Option<String>>> {
    let cast = strict_cast(array, &DataType::Utf8, column)?;
    let strings = cast
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| TriageError::data(format!("Column '{column}' is not a string column")))?;

    Ok((0..strings.len())
        .map(|i| strings.is_valid(i).then(|| strings.value(i).to_string()))
        .collect())
}
