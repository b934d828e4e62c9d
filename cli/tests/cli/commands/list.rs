use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use xrit::codetables::Channel;

use crate::{CMD_NAME, utils};

fn listing(p: &utils::TestProduct, segments: &[Option<u16>]) -> String {
    let path = |file_name: String| p.dir.path().join(file_name).display().to_string();
    let mut expected = format!(
        " segment │ file\n     PRO │ {}\n     EPI │ {}\n",
        path(p.name.prologue_file_name()),
        path(p.name.epilogue_file_name())
    );
    for (i, sequence) in segments.iter().enumerate() {
        let file = sequence
            .map(|s| path(p.name.segment_file_name(s)))
            .unwrap_or_else(|| "-".to_owned());
        expected.push_str(&format!("{:>8} │ {file}\n", i + 1));
    }
    expected
}

crate::commands::test_simple_display! {
    (
        listing_complete_product,
        "list",
        utils::ir108()?,
        Vec::<&str>::new(),
        |p: &utils::TestProduct| listing(p, &[Some(1), Some(2)])
    ),
}

#[test]
fn listing_product_with_missing_segment() -> Result<(), Box<dyn std::error::Error>> {
    let input = utils::product(Channel::Ir108, &[2])?;
    let mut cmd = Command::cargo_bin(CMD_NAME)?;
    cmd.arg("list").arg(input.arg());
    cmd.assert()
        .success()
        .stdout(predicate::str::diff(listing(&input, &[None, Some(2)])))
        .stderr(predicate::str::contains("missing segments [1]"));

    Ok(())
}
