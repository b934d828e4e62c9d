use std::{
    fmt::{self, Display, Formatter},
    path::Path,
};

use clap::{ArgMatches, Command, arg};
use console::Style;
use xrit::LocatedProduct;

use crate::cli;

pub fn cli() -> Command {
    Command::new(crate::cli::module_component!())
        .about("List files making up a product")
        .arg(arg!(<PRODUCT> "Product as <DIR>/<RESOLUTION>:<PRODUCT_ID1>:<PRODUCT_ID2>:<TIMING>"))
}

pub fn exec(args: &ArgMatches) -> anyhow::Result<()> {
    let name = args.get_one::<String>("PRODUCT").unwrap();
    let product = cli::product(name)?;
    cli::display_in_pager(ListView(&product));

    Ok(())
}

struct ListView<'i>(&'i LocatedProduct);

impl cli::PredictableNumLines for ListView<'_> {
    fn num_lines(&self) -> usize {
        let Self(product) = self;
        let header_height = 1;
        header_height + 2 + product.segment_count()
    }
}

fn format_path(path: Option<&Path>) -> String {
    path.map_or_else(|| "-".to_owned(), |p| p.display().to_string())
}

impl Display for ListView<'_> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let Self(product) = self;
        let style = Style::new().bold();
        writeln!(f, "{}", style.apply_to(format!("{:>8} │ {}", "segment", "file")))?;
        writeln!(f, "{:>8} │ {}", "PRO", product.prologue.display())?;
        writeln!(
            f,
            "{:>8} │ {}",
            "EPI",
            format_path(product.epilogue.as_deref())
        )?;
        for (i, path) in product.segments.iter().enumerate() {
            writeln!(f, "{:>8} │ {}", i + 1, format_path(path.as_deref()))?;
        }
        Ok(())
    }
}
