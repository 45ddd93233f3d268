//! Delimited-text loader selecting the iris columns by header name.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};
use ndarray::Array2;

use super::DataFormatError;
use super::samples::{FEATURE_NAMES, LABEL_COLUMN, N_FEATURES, SampleSet};

/// Load a CSV file with a header row into a sample set.
///
/// Only the four feature columns and the `species` column are read; any other
/// columns are ignored and column order does not matter. Classes are the
/// distinct label values in sorted order.
pub fn load_csv(path: &Path) -> Result<SampleSet, DataFormatError> {
    let file = File::open(path).map_err(|source| DataFormatError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|source| DataFormatError::Csv {
            path: path.to_path_buf(),
            source,
        })?
        .clone();
    let columns = ColumnIndex::resolve(&headers)?;

    let mut values = Vec::new();
    let mut raw_labels = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(|source| DataFormatError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        for (feature, &col) in columns.features.iter().enumerate() {
            values.push(parse_feature(&record, row, feature, col)?);
        }
        let label = record.get(columns.label).unwrap_or_default();
        if label.is_empty() {
            return Err(DataFormatError::MissingLabel { row });
        }
        raw_labels.push(label.to_string());
    }

    if raw_labels.is_empty() {
        return Err(DataFormatError::Empty {
            path: path.to_path_buf(),
        });
    }

    let classes: Vec<String> = raw_labels
        .iter()
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let class_index: BTreeMap<&str, usize> = classes
        .iter()
        .enumerate()
        .map(|(idx, name)| (name.as_str(), idx))
        .collect();
    let labels = raw_labels
        .iter()
        .map(|name| class_index[name.as_str()])
        .collect();

    let features = Array2::from_shape_vec((raw_labels.len(), N_FEATURES), values)?;
    tracing::debug!(
        path = %path.display(),
        rows = raw_labels.len(),
        classes = classes.len(),
        "Loaded CSV dataset"
    );
    SampleSet::new(classes, features, labels)
}

/// Header positions of the required columns.
struct ColumnIndex {
    features: [usize; N_FEATURES],
    label: usize,
}

impl ColumnIndex {
    fn resolve(headers: &StringRecord) -> Result<Self, DataFormatError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|header| header == name)
                .ok_or_else(|| DataFormatError::MissingColumn {
                    column: name.to_string(),
                })
        };
        let mut features = [0usize; N_FEATURES];
        for (slot, name) in features.iter_mut().zip(FEATURE_NAMES) {
            *slot = find(name)?;
        }
        Ok(Self {
            features,
            label: find(LABEL_COLUMN)?,
        })
    }
}

fn parse_feature(
    record: &StringRecord,
    row: usize,
    feature: usize,
    col: usize,
) -> Result<f32, DataFormatError> {
    let cell = record.get(col).unwrap_or_default();
    let value = cell
        .parse::<f32>()
        .map_err(|_| DataFormatError::NonNumeric {
            row,
            column: FEATURE_NAMES[feature].to_string(),
            value: cell.to_string(),
        })?;
    if !value.is_finite() {
        return Err(DataFormatError::NonFinite {
            row,
            column: FEATURE_NAMES[feature].to_string(),
            value,
        });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_csv(contents: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("iris.csv");
        std::fs::write(&path, contents).unwrap();
        (dir, path)
    }

    #[test]
    fn loads_rows_and_sorts_classes() {
        let (_dir, path) = write_csv(
            "sepal_length,sepal_width,petal_length,petal_width,species\n\
             6.3,3.3,6.0,2.5,virginica\n\
             5.1,3.5,1.4,0.2,setosa\n\
             7.0,3.2,4.7,1.4,versicolor\n",
        );
        let set = load_csv(&path).unwrap();
        assert_eq!(set.len(), 3);
        assert_eq!(set.classes(), &["setosa", "versicolor", "virginica"]);
        assert_eq!(set.labels(), &[2, 0, 1]);
        assert_eq!(set.row(1).to_vec(), vec![5.1, 3.5, 1.4, 0.2]);
    }

    #[test]
    fn column_order_and_extra_columns_are_ignored() {
        let (_dir, path) = write_csv(
            "id,species,petal_width,petal_length,sepal_width,sepal_length\n\
             1,setosa,0.2,1.4,3.5,5.1\n\
             2,virginica,2.5,6.0,3.3,6.3\n",
        );
        let set = load_csv(&path).unwrap();
        assert_eq!(set.row(0).to_vec(), vec![5.1, 3.5, 1.4, 0.2]);
        assert_eq!(set.label_name(1), "virginica");
    }

    #[test]
    fn missing_column_fails_fast() {
        let (_dir, path) = write_csv(
            "sepal_length,sepal_width,petal_length,species\n\
             5.1,3.5,1.4,setosa\n",
        );
        let err = load_csv(&path).unwrap_err();
        match err {
            DataFormatError::MissingColumn { column } => assert_eq!(column, "petal_width"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn non_numeric_cell_reports_position() {
        let (_dir, path) = write_csv(
            "sepal_length,sepal_width,petal_length,petal_width,species\n\
             5.1,3.5,1.4,0.2,setosa\n\
             4.9,wide,1.4,0.2,setosa\n",
        );
        let err = load_csv(&path).unwrap_err();
        match err {
            DataFormatError::NonNumeric { row, column, value } => {
                assert_eq!(row, 1);
                assert_eq!(column, "sepal_width");
                assert_eq!(value, "wide");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_cell_is_non_numeric() {
        let (_dir, path) = write_csv(
            "sepal_length,sepal_width,petal_length,petal_width,species\n\
             5.1,,1.4,0.2,setosa\n",
        );
        assert!(matches!(
            load_csv(&path),
            Err(DataFormatError::NonNumeric { row: 0, .. })
        ));
    }

    #[test]
    fn nan_cell_is_rejected() {
        let (_dir, path) = write_csv(
            "sepal_length,sepal_width,petal_length,petal_width,species\n\
             5.1,NaN,1.4,0.2,setosa\n",
        );
        assert!(matches!(
            load_csv(&path),
            Err(DataFormatError::NonFinite { row: 0, .. })
        ));
    }

    #[test]
    fn header_only_file_is_empty() {
        let (_dir, path) =
            write_csv("sepal_length,sepal_width,petal_length,petal_width,species\n");
        assert!(matches!(load_csv(&path), Err(DataFormatError::Empty { .. })));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let err = load_csv(&dir.path().join("absent.csv")).unwrap_err();
        assert!(matches!(err, DataFormatError::Io { .. }));
    }
}
