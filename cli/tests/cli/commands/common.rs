use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

use crate::CMD_NAME;

macro_rules! test_subcommands_without_args {
    ($(($name:ident, $str:expr),)*) => ($(
        #[test]
        fn $name() -> Result<(), Box<dyn std::error::Error>> {
            let mut cmd = Command::cargo_bin(CMD_NAME)?;
            cmd.arg($str);
            cmd.assert()
                .failure()
                .stdout(predicate::str::is_empty())
                .stderr(
                    predicate::str::starts_with(
                        "error: the following required arguments were not provided:",
                    )
                        .and(predicate::str::contains("Usage:"))
                        .and(predicate::str::contains("Commands:").not()),
                );

            Ok(())
        }
    )*);
}

test_subcommands_without_args! {
    (decode_without_args, "decode"),
    (export_without_args, "export"),
    (info_without_args, "info"),
    (list_without_args, "list"),
}

macro_rules! test_subcommands_with_nonexisting_product {
    ($(($name:ident, $command:expr, $args:expr),)*) => ($(
        #[test]
        fn $name() -> Result<(), Box<dyn std::error::Error>> {
            let dir = TempDir::new()?;
            let product = format!("{}/H:MSG2:IR_108:200611141200", dir.path().display());

            let mut cmd = Command::cargo_bin(CMD_NAME)?;
            cmd.arg($command).arg(product).args($args);
            cmd.assert()
                .failure()
                .stdout(predicate::str::is_empty())
                .stderr(predicate::str::contains("error: no such file"));

            Ok(())
        }
    )*);
}

test_subcommands_with_nonexisting_product! {
    (decode_with_nonexisting_product, "decode", Vec::<&str>::new()),
    (export_with_nonexisting_product, "export", vec!["out"]),
    (info_with_nonexisting_product, "info", Vec::<&str>::new()),
    (list_with_nonexisting_product, "list", Vec::<&str>::new()),
}

macro_rules! test_subcommands_with_malformed_product_name {
    ($(($name:ident, $command:expr),)*) => ($(
        #[test]
        fn $name() -> Result<(), Box<dyn std::error::Error>> {
            let mut cmd = Command::cargo_bin(CMD_NAME)?;
            cmd.arg($command).arg("/data/H:MSG2:IR_108");
            cmd.assert()
                .failure()
                .stdout(predicate::str::is_empty())
                .stderr(predicate::str::contains("is not of the form"));

            Ok(())
        }
    )*);
}

test_subcommands_with_malformed_product_name! {
    (decode_with_malformed_product_name, "decode"),
    (info_with_malformed_product_name, "info"),
    (list_with_malformed_product_name, "list"),
}
