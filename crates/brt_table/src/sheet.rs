//! Reading the duplication sheet.
//!
//! Duplication sheets are maintained as workbooks; this reads a CSV export of one with an
//! `Original` and a `Dupe` column. Rows missing either value are skipped.

use std::path::Path;

use polars::prelude::*;
use tracing::{debug, instrument};

use crate::edit::DuplicatePair;
use crate::error::{Error, Result};

fn sheet_error(error: PolarsError) -> Error {
    Error::DuplicateSheet(error.to_string())
}

fn column(frame: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let series = frame.column(name).map_err(sheet_error)?.as_materialized_series();
    let values = series.str().map_err(sheet_error)?;
    Ok(values
        .into_iter()
        .map(|value| value.map(str::trim).filter(|value| !value.is_empty()).map(str::to_owned))
        .collect())
}

/// Read every `(Original, Dupe)` row of a CSV sheet
#[instrument(skip_all, fields(path = %path.as_ref().display()), err)]
pub fn read_duplicate_pairs(path: impl AsRef<Path>) -> Result<Vec<DuplicatePair>> {
    let is_workbook = path
        .as_ref()
        .extension()
        .is_some_and(|extension| extension.eq_ignore_ascii_case("xlsx") || extension.eq_ignore_ascii_case("xls"));
    if is_workbook {
        return Err(Error::DuplicateSheet(
            "workbooks are not read directly, export the sheet to CSV first".into(),
        ));
    }

    // Every column is read as text
    let frame = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(path.as_ref().to_path_buf()))
        .and_then(|reader| reader.finish())
        .map_err(sheet_error)?;

    let originals = column(&frame, "Original")?;
    let duplicates = column(&frame, "Dupe")?;

    let mut pairs = Vec::with_capacity(originals.len());
    for (row, (original, duplicate)) in originals.into_iter().zip(duplicates).enumerate() {
        match (original, duplicate) {
            (Some(original), Some(duplicate)) => pairs.push(DuplicatePair::new(original, duplicate)),
            _ => debug!("skipping incomplete row {}", row + 1),
        }
    }

    debug!("read {} duplicate pairs", pairs.len());
    Ok(pairs)
}

#[cfg(test)]
mod test {
    use std::fs;

    use pretty_assertions::assert_eq;

    use crate::edit::DuplicatePair;
    use crate::error::{Error, Result};
    use crate::sheet::read_duplicate_pairs;

    #[test]
    fn read_pairs() -> Result<()> {
        let path = std::env::temp_dir().join(format!("brt_sheet_{}.csv", std::process::id()));
        fs::write(
            &path,
            "Original,Dupe,Notes\nart/foo.tex,art/foo_dupe.tex,\n,art/lost.tex,missing\nart/bar.tex,art/bar_dupe.tex,x\n",
        )?;

        let pairs = read_duplicate_pairs(&path);
        fs::remove_file(&path)?;

        assert_eq!(
            pairs?,
            vec![
                DuplicatePair::new("art/foo.tex".into(), "art/foo_dupe.tex".into()),
                DuplicatePair::new("art/bar.tex".into(), "art/bar_dupe.tex".into()),
            ]
        );

        Ok(())
    }

    #[test]
    fn workbooks_ask_for_a_csv_export() {
        let result = read_duplicate_pairs("dupes.xlsx");
        assert!(matches!(result, Err(Error::DuplicateSheet(message)) if message.contains("export the sheet to CSV")));
    }

    #[test]
    fn missing_column() -> Result<()> {
        let path = std::env::temp_dir().join(format!("brt_sheet_bad_{}.csv", std::process::id()));
        fs::write(&path, "Source,Target\na,b\n")?;

        let result = read_duplicate_pairs(&path);
        fs::remove_file(&path)?;

        assert!(matches!(result, Err(Error::DuplicateSheet(_))));

        Ok(())
    }
}
