use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;
use xrit::codetables::Channel;

use crate::{CMD_NAME, utils};

/// Raw counts of the test product, north-west corner first.
const RAW_COUNTS: [f32; 16] = [
    27., 26., 25., 24., 23., 22., 21., 20., 17., 16., 15., 14., 13., 12., 11., 10.,
];

crate::commands::test_simple_display! {
    (
        text_display_of_raw_counts,
        "decode",
        utils::ir108()?,
        vec!["--raw"],
        |_: &utils::TestProduct| "\
# Meteosat-9_IR_108_200611141200 4x4+0+0
27 26 25 24
23 22 21 20
17 16 15 14
13 12 11 10
"
    ),
    (
        text_display_of_raw_counts_in_area,
        "decode",
        utils::ir108()?,
        vec!["--raw", "--area", "1,1,2,2"],
        |_: &utils::TestProduct| "\
# Meteosat-9_IR_108_200611141200_2x2+1+1 2x2+1+1
22 21
16 15
"
    ),
    (
        text_display_of_linear_calibration,
        "decode",
        utils::product(Channel::Vis006, &[1, 2])?,
        Vec::<&str>::new(),
        |_: &utils::TestProduct| "\
# Meteosat-9_VIS006_200611141200 4x4+0+0
12.5 12 11.5 11
10.5 10 9.5 9
7.5 7 6.5 6
5.5 5 4.5 4
"
    ),
}

macro_rules! test_operation_with_byte_order_options {
    ($(($name:ident, $byte_order_flag:expr, $to_bytes:expr),)*) => ($(
        #[test]
        fn $name() -> Result<(), Box<dyn std::error::Error>> {
            let input = utils::ir108()?;

            let dir = TempDir::new()?;
            let out_path = dir.path().join("out.bin");
            let out_path = format!("{}", out_path.display());

            let mut cmd = Command::cargo_bin(CMD_NAME)?;
            cmd.arg("decode")
                .arg(input.arg())
                .arg("--raw")
                .arg($byte_order_flag)
                .arg(&out_path);
            cmd.assert()
                .success()
                .stdout(predicate::str::is_empty())
                .stderr(predicate::str::is_empty());

            let actual = utils::cat_as_bytes(&out_path)?;
            let expected = RAW_COUNTS.iter().flat_map($to_bytes).collect::<Vec<u8>>();
            assert_eq!(actual, expected);

            Ok(())
        }
    )*);
}

test_operation_with_byte_order_options! {
    (decoding_as_big_endian, "-b", |v: &f32| v.to_be_bytes()),
    (decoding_as_little_endian, "-l", |v: &f32| v.to_le_bytes()),
}

#[test]
fn decoding_to_stdout() -> Result<(), Box<dyn std::error::Error>> {
    let input = utils::ir108()?;
    let expected = RAW_COUNTS
        .iter()
        .flat_map(|v| v.to_be_bytes())
        .collect::<Vec<u8>>();

    let mut cmd = Command::cargo_bin(CMD_NAME)?;
    cmd.arg("decode").arg(input.arg()).args(["--raw", "-b", "-"]);
    cmd.assert()
        .success()
        .stdout(expected)
        .stderr(predicate::str::is_empty());

    Ok(())
}

#[test]
fn decoding_product_with_missing_segment() -> Result<(), Box<dyn std::error::Error>> {
    let input = utils::product(Channel::Ir108, &[1])?;
    let mut cmd = Command::cargo_bin(CMD_NAME)?;
    cmd.arg("decode").arg(input.arg()).arg("--raw");
    cmd.assert().success().stdout(predicate::str::diff(
        "\
# Meteosat-9_IR_108_200611141200 4x4+0+0
NaN NaN NaN NaN
NaN NaN NaN NaN
17 16 15 14
13 12 11 10
",
    ));

    Ok(())
}

#[test]
fn decoding_geographic_area() -> Result<(), Box<dyn std::error::Error>> {
    let input = utils::ir108()?;
    let mut cmd = Command::cargo_bin(CMD_NAME)?;
    cmd.arg("decode")
        .arg(input.arg())
        .args(["--raw", "--geo", "-0.01,0.01,-0.01,0.01"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::starts_with(
            "# Meteosat-9_IR_108_200611141200_1x1+2+2 1x1+2+2\n",
        ))
        .stderr(predicate::str::is_empty());

    Ok(())
}

macro_rules! test_invalid_options {
    ($(($name:ident, $options:expr, $message:expr),)*) => ($(
        #[test]
        fn $name() -> Result<(), Box<dyn std::error::Error>> {
            let input = utils::ir108()?;
            let mut cmd = Command::cargo_bin(CMD_NAME)?;
            cmd.arg("decode").arg(input.arg()).args($options);
            cmd.assert()
                .failure()
                .stdout(predicate::str::is_empty())
                .stderr(predicate::str::contains($message));

            Ok(())
        }
    )*);
}

test_invalid_options! {
    (decoding_with_malformed_area, ["--area", "1,1,2"], "X,Y,WIDTH,HEIGHT"),
    (decoding_with_area_outside_image, ["--area", "3,3,2,2"], "is not inside the 4x4 image"),
    (
        decoding_with_both_areas,
        ["--area", "1,1,2,2", "--geo", "0,1,0,1"],
        "cannot be used with"
    ),
    (decoding_with_both_byte_orders, ["-b", "a", "-l", "b"], "cannot be used with"),
}
