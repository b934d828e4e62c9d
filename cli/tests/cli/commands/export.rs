use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

use crate::{CMD_NAME, utils};

fn decode_as_bytes(product: &str, raw: bool) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin(CMD_NAME)?;
    cmd.arg("decode").arg(product).args(["-b", "-"]);
    if raw {
        cmd.arg("--raw");
    }
    Ok(cmd.output()?.stdout)
}

#[test]
fn exporting_whole_product() -> Result<(), Box<dyn std::error::Error>> {
    let input = utils::ir108()?;
    let out = TempDir::new()?;
    let exported = format!("{}/H:MSG2:IR_108:200611141200", out.path().display());

    let mut cmd = Command::cargo_bin(CMD_NAME)?;
    cmd.arg("export").arg(input.arg()).arg(out.path());
    cmd.assert()
        .success()
        .stdout(predicate::str::diff(format!("{exported}\n")))
        .stderr(predicate::str::is_empty());

    assert_eq!(
        decode_as_bytes(&exported, true)?,
        decode_as_bytes(&input.arg(), true)?
    );
    // exported prologue keeps the calibration of the input
    assert_eq!(
        decode_as_bytes(&exported, false)?,
        decode_as_bytes(&input.arg(), false)?
    );

    Ok(())
}

#[test]
fn exporting_area() -> Result<(), Box<dyn std::error::Error>> {
    let input = utils::ir108()?;
    let out = TempDir::new()?;
    let exported = format!("{}/H:MSG2:IR_108:200611141200", out.path().display());

    let mut cmd = Command::cargo_bin(CMD_NAME)?;
    cmd.arg("export")
        .arg(input.arg())
        .arg(out.path())
        .args(["--area", "1,1,2,2"]);
    cmd.assert().success();

    let mut cmd = Command::cargo_bin(CMD_NAME)?;
    cmd.arg("decode").arg(&exported).arg("--raw");
    cmd.assert()
        .success()
        .stdout(predicate::str::ends_with("\n22 21\n16 15\n"));

    Ok(())
}
