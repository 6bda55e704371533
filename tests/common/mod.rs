#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use flate2::write::GzEncoder;
use flate2::Compression;
use rust_xlsxwriter::{Format, Formula, Workbook};
use tempfile::{tempdir, TempDir};

use typedtab::config::LoaderConfig;
use typedtab::model::TypedTable;
use typedtab::parser::LoaderFactory;

/// Scratch directory that is removed on drop
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn file(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }

    /// Writes `contents` into a file under the workspace and returns the path
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.file(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }

    /// Writes `contents` gzip-compressed
    pub fn write_gz(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.file(name);
        let file = File::create(&path).expect("create temp file");
        let mut encoder = GzEncoder::new(file, Compression::default());
        encoder.write_all(contents.as_bytes()).expect("compress");
        encoder.finish().expect("finish gzip");
        path
    }

    /// A two-sheet workbook; the first sheet mixes numbers, dates, text,
    /// booleans, blanks, and a formula
    pub fn write_workbook(&self, name: &str) -> PathBuf {
        let path = self.file(name);
        let mut workbook = Workbook::new();
        let date = Format::new().set_num_format("yyyy-mm-dd");

        let sheet = workbook.add_worksheet();
        sheet.set_name("people").unwrap();
        sheet.write_string(0, 0, "name").unwrap();
        sheet.write_string(0, 1, "age").unwrap();
        sheet.write_string(0, 2, "joined").unwrap();
        sheet.write_string(0, 3, "active").unwrap();
        sheet.write_string(0, 4, "double").unwrap();

        sheet.write_string(1, 0, "ann").unwrap();
        sheet.write_number(1, 1, 31.0).unwrap();
        // 2020-01-01
        sheet.write_number_with_format(1, 2, 43831.0, &date).unwrap();
        sheet.write_boolean(1, 3, true).unwrap();
        sheet
            .write_formula(1, 4, Formula::new("=B2*2").set_result("62"))
            .unwrap();

        sheet.write_string(2, 0, "bob").unwrap();
        sheet.write_string(2, 1, "?").unwrap();
        sheet.write_number_with_format(2, 2, 43832.0, &date).unwrap();
        sheet.write_boolean(2, 3, false).unwrap();

        let second = workbook.add_worksheet();
        second.set_name("other").unwrap();
        second.write_string(0, 0, "x").unwrap();
        second.write_number(1, 0, 1.0).unwrap();

        workbook.save(&path).expect("save workbook");
        path
    }
}

/// Load the full table behind `path`
pub fn load(path: &Path, config: LoaderConfig) -> TypedTable {
    LoaderFactory::open(path, config)
        .expect("open loader")
        .data_set()
        .expect("load data set")
}

/// Every cell rendered as text, `None` for missing
pub fn cells(table: &TypedTable) -> Vec<Vec<Option<String>>> {
    (0..table.row_count())
        .map(|row| {
            (0..table.column_count())
                .map(|col| table.display_value(row, col).map(|v| v.into_owned()))
                .collect()
        })
        .collect()
}
