use std::{fmt, path::PathBuf};

use anyhow::Result;
use clap::{ArgAction, ArgMatches, Command, arg};
use xrit::{DecodeOptions, Image, ImageAssembler};

use crate::cli;

pub fn cli() -> Command {
    Command::new(crate::cli::module_component!())
        .about("Export decoded pixel values")
        .arg(arg!(<PRODUCT> "Product as <DIR>/<RESOLUTION>:<PRODUCT_ID1>:<PRODUCT_ID2>:<TIMING>"))
        .arg(
            arg!(--area <AREA> "Decode only the pixels of X,Y,WIDTH,HEIGHT")
                .required(false)
                .value_parser(clap::value_parser!(cli::CliPixelArea)),
        )
        .arg(
            arg!(--geo <AREA> "Decode only the pixels covering LATMIN,LATMAX,LONMIN,LONMAX")
                .required(false)
                .allow_hyphen_values(true)
                .value_parser(clap::value_parser!(cli::CliGeoArea))
                .conflicts_with("area"),
        )
        .arg(arg!(--raw "Keep raw counts instead of physical values").action(ArgAction::SetTrue))
        .arg(
            arg!(-b --"big-endian" <OUT_FILE> "Export as a big-endian flat binary file")
                .required(false) // There is no syntax yet for optional options.
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            arg!(-l --"little-endian" <OUT_FILE> "Export as a little-endian flat binary file")
                .required(false) // There is no syntax yet for optional options.
                .value_parser(clap::value_parser!(PathBuf))
                .conflicts_with("big-endian"),
        )
}

fn options(args: &ArgMatches) -> DecodeOptions {
    let mut options = DecodeOptions::default();
    if let Some(cli::CliPixelArea(area)) = args.get_one::<cli::CliPixelArea>("area") {
        options = options.with_area(*area);
    }
    if let Some(cli::CliGeoArea(area)) = args.get_one::<cli::CliGeoArea>("geo") {
        options = options.with_geo_area(*area);
    }
    if args.get_flag("raw") {
        options = options.raw();
    }
    options
}

fn write_output(
    out_path: &PathBuf,
    values: impl Iterator<Item = f32>,
    to_bytes: fn(&f32) -> [u8; 4],
) -> Result<()> {
    let mut stream = cli::WriteStream::new(out_path)?;
    for value in values {
        stream.write_all(&to_bytes(&value))?;
    }
    stream.flush()?;
    Ok(())
}

pub fn exec(args: &ArgMatches) -> Result<()> {
    let name = args.get_one::<String>("PRODUCT").unwrap();
    let product = cli::product(name)?;
    let image = ImageAssembler::new(product, options(args)).run()?;
    let values = image.data().all_scaled();

    if let Some(out_path) = args.get_one::<PathBuf>("big-endian") {
        write_output(out_path, values.into_iter(), |f| f.to_be_bytes())
    } else if let Some(out_path) = args.get_one::<PathBuf>("little-endian") {
        write_output(out_path, values.into_iter(), |f| f.to_le_bytes())
    } else {
        cli::display_in_pager(DecodeTextDisplay(&image, &values));
        Ok(())
    }
}

struct DecodeTextDisplay<'a>(&'a Image, &'a [f32]);

impl cli::PredictableNumLines for DecodeTextDisplay<'_> {
    fn num_lines(&self) -> usize {
        let Self(image, _) = self;
        image.lines() + 1
    }
}

impl fmt::Display for DecodeTextDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let Self(image, values) = self;
        writeln!(
            f,
            "# {} {}x{}+{}+{}",
            image.default_file_name(),
            image.columns(),
            image.lines(),
            image.x0,
            image.y0
        )?;
        for line in values.chunks(image.columns().max(1)) {
            let line = line
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(" ");
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}
