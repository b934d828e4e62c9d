use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgMatches, Command, arg};
use xrit::{Consumer, ImageAssembler, Prologue, XritExporter};

use crate::cli;

pub fn cli() -> Command {
    Command::new(crate::cli::module_component!())
        .about("Write raw counts of a product, or of an area of it, as a new product")
        .arg(arg!(<PRODUCT> "Product as <DIR>/<RESOLUTION>:<PRODUCT_ID1>:<PRODUCT_ID2>:<TIMING>"))
        .arg(arg!(<OUT_DIR> "Directory to write to").value_parser(clap::value_parser!(PathBuf)))
        .arg(
            arg!(--area <AREA> "Export only the pixels of X,Y,WIDTH,HEIGHT")
                .required(false)
                .value_parser(clap::value_parser!(cli::CliPixelArea)),
        )
}

pub fn exec(args: &ArgMatches) -> Result<()> {
    let name = args.get_one::<String>("PRODUCT").unwrap();
    let out_dir = args.get_one::<PathBuf>("OUT_DIR").unwrap();
    let product = cli::product(name)?;
    let prologue = Prologue::read(&product.prologue)?;

    let mut options = xrit::DecodeOptions::default().raw();
    if let Some(cli::CliPixelArea(area)) = args.get_one::<cli::CliPixelArea>("area") {
        options = options.with_area(*area);
    }
    let image = ImageAssembler::new(product, options).run()?;

    let mut exporter =
        XritExporter::new(out_dir).with_radiometric_processing(prologue.radiometric_processing);
    exporter.accept(image)?;
    for name in exporter.written() {
        println!("{name}");
    }
    Ok(())
}
