use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
    str::FromStr,
    sync::LazyLock,
};

#[cfg(unix)]
use pager::Pager;
use regex::Regex;
#[cfg(unix)]
use which::which;
use xrit::{GeoArea, LocatedProduct, PixelArea, ProductName};

pub(crate) fn product(name: &str) -> anyhow::Result<LocatedProduct> {
    let name = name.parse::<ProductName>()?;
    Ok(xrit::locate(&name)?)
}

pub(crate) fn display_in_pager<V>(view: V)
where
    V: PredictableNumLines + std::fmt::Display,
{
    let user_attended = console::user_attended();

    let term = console::Term::stdout();
    let (height, _width) = term.size();
    if view.num_lines() > height.into() {
        start_pager();
    }

    if user_attended {
        console::set_colors_enabled(true);
    }

    print!("{view}");
}

pub(crate) trait PredictableNumLines {
    fn num_lines(&self) -> usize;
}

#[cfg(unix)]
fn start_pager() {
    if which("less").is_ok() {
        Pager::with_pager("less -R").setup();
    } else {
        Pager::new().setup();
    }
}

#[cfg(not(unix))]
fn start_pager() {}

static NUMBER_LIST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?x)                  # insignificant whitespace mode
        ^
        ([-+]?[0-9]+(?:\.[0-9]*)?)  # first
        ,
        ([-+]?[0-9]+(?:\.[0-9]*)?)  # second
        ,
        ([-+]?[0-9]+(?:\.[0-9]*)?)  # third
        ,
        ([-+]?[0-9]+(?:\.[0-9]*)?)  # fourth
        $",
    )
    .unwrap()
});

fn four_numbers<T: FromStr>(s: &str) -> Option<[T; 4]> {
    let cap = NUMBER_LIST.captures(s)?;
    let parse = |i: usize| cap.get(i).and_then(|m| m.as_str().parse::<T>().ok());
    Some([parse(1)?, parse(2)?, parse(3)?, parse(4)?])
}

/// Pixel area given as `X,Y,WIDTH,HEIGHT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CliPixelArea(pub(crate) PixelArea);

impl FromStr for CliPixelArea {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let [x, y, width, height] = four_numbers::<usize>(s).ok_or_else(|| {
            anyhow::anyhow!(
                "pixel area must be specified as 'X,Y,WIDTH,HEIGHT' where all are non-negative integers"
            )
        })?;
        Ok(Self(PixelArea::new(x, y, width, height)))
    }
}

/// Geographic area given as `LATMIN,LATMAX,LONMIN,LONMAX` in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct CliGeoArea(pub(crate) GeoArea);

impl FromStr for CliGeoArea {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let [lat_min, lat_max, lon_min, lon_max] = four_numbers::<f64>(s).ok_or_else(|| {
            anyhow::anyhow!(
                "geographic area must be specified as 'LATMIN,LATMAX,LONMIN,LONMAX' in degrees"
            )
        })?;
        Ok(Self(GeoArea::new(lat_min, lat_max, lon_min, lon_max)?))
    }
}

pub(crate) enum WriteStream {
    File(BufWriter<std::fs::File>),
    Stdout(std::io::Stdout),
}

impl WriteStream {
    pub(crate) fn new<P>(out_path: P) -> std::io::Result<Self>
    where
        P: AsRef<Path>,
    {
        let stream = if is_dash(&out_path) {
            Self::Stdout(std::io::stdout())
        } else {
            let f = File::create(out_path)?;
            let f = BufWriter::new(f);
            Self::File(f)
        };
        Ok(stream)
    }

    pub(crate) fn write_all(&mut self, buf: &[u8]) -> std::io::Result<()> {
        match self {
            Self::File(file) => file.write_all(buf),
            Self::Stdout(stdout) => stdout.write_all(buf),
        }
    }

    pub(crate) fn flush(&mut self) -> std::io::Result<()> {
        match self {
            Self::File(file) => file.flush(),
            Self::Stdout(stdout) => stdout.flush(),
        }
    }
}

fn is_dash<P: AsRef<Path>>(path: P) -> bool {
    matches!(path.as_ref().to_str(), Some("-"))
}

macro_rules! module_component {
    () => {
        module_path!().split("::").last().unwrap_or("")
    };
}
pub(crate) use module_component;
