use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use xrit::codetables::Channel;

use crate::{CMD_NAME, utils};

crate::commands::test_simple_display! {
    (
        display_of_thermal_channel_product,
        "info",
        utils::ir108()?,
        Vec::<&str>::new(),
        |p: &utils::TestProduct| format!("\
Product:                                {}
Channel:                                IR_108 (9)
Spacecraft:                             Meteosat-9 (HRIT 322, WMO 56)
Acquisition time:                       2006-11-14 12:00:00 UTC
Sub-satellite longitude:                0
Segments:                               2 of 2 (missing: none)
Segment size:                           4 x 2, 10 bits per pixel
Frame size:                             4 x 4
Column/line scaling factors:            -13642337 / -13642337
Column/line offsets:                    2 / 2
Pixel size at sub-satellite point:      3.000 x 3.000 km
Calibration:                            brightness temperature (slope 0.2, offset -10.2) [K]
", p.arg())
    ),
}

#[test]
fn display_of_product_with_missing_segment() -> Result<(), Box<dyn std::error::Error>> {
    let input = utils::product(Channel::Vis006, &[2])?;
    let mut cmd = Command::cargo_bin(CMD_NAME)?;
    cmd.arg("info").arg(input.arg());
    cmd.assert()
        .success()
        .stdout(
            predicate::str::contains("Channel:                                VIS006 (1)\n")
                .and(predicate::str::contains(
                    "Segments:                               1 of 2 (missing: 1)\n",
                ))
                .and(predicate::str::contains(
                    "Calibration:                            linear (slope 0.5, offset -1) [mW m-2 sr-1 (cm-1)-1]\n",
                )),
        )
        .stderr(predicate::str::contains("missing segments [1]"));

    Ok(())
}
