//! Shared test data: a small earnings report with known counts.

use std::{
    fs,
    path::{Path, PathBuf},
};

pub const EARNINGS_ROWS: usize = 14;

/// Header mirrors the published report; one row has an empty POSTAL.
pub const EARNINGS_CSV: &str = "\
NAME,DEPARTMENT_NAME,TITLE,Gender,TOTAL EARNINGS,POSTAL
\"Abbott, Alan\",Police,Officer,M,98000.50,02124
\"Baker, Beth\",Police,Officer,M,91000.00,02124
\"Chan, Cara\",Police,Officer,F,88000.25,02136
\"Diaz, Dan\",Police,Officer,M,93000.00,02132
\"Evans, Eli\",Police,Sergeant,M,120000.00,02124
\"Frost, Fay\",Police,Sergeant,F,118500.75,02124
\"Gomez, Gil\",Fire,Firefighter,M,87000.00,02132
\"Hart, Hal\",Fire,Firefighter,M,86000.00,02132
\"Ito, Ivy\",Fire,Firefighter,F,85500.00,02136
\"Jones, Jo\",Library,Librarian,F,61000.00,02130
\"Kim, Kay\",Library,Librarian,F,60500.00,
\"Lopez, Lee\",Library,Librarian,M,59000.00,02130
\"Moss, Mia\",Police,Officer,F,90500.00,02127
\"Nash, Ned\",Fire,Firefighter,M,84000.00,02124
";

pub fn write_earnings_csv(dir: &Path) -> PathBuf {
    let path = dir.join("employee_earnings_report.csv");
    fs::write(&path, EARNINGS_CSV).expect("write fixture");
    path
}
