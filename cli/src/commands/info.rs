use std::fmt::{self, Display, Formatter};

use clap::{ArgMatches, Command, arg};
use xrit::{
    HRV_FRAME_COLUMNS, LocatedProduct, Prologue, SegmentHeader,
    codetables::{Channel, spacecraft_id_from_hrit, spacecraft_name},
    facts,
};

use crate::cli;

pub fn cli() -> Command {
    Command::new(crate::cli::module_component!())
        .about("Show identification information of a product")
        .arg(arg!(<PRODUCT> "Product as <DIR>/<RESOLUTION>:<PRODUCT_ID1>:<PRODUCT_ID2>:<TIMING>"))
}

pub fn exec(args: &ArgMatches) -> anyhow::Result<()> {
    let name = args.get_one::<String>("PRODUCT").unwrap();
    let product = cli::product(name)?;
    let prologue = Prologue::read(&product.prologue)?;
    print!("{}", InfoView::new(&product, &prologue)?);
    Ok(())
}

struct InfoView<'i> {
    product: &'i LocatedProduct,
    prologue: &'i Prologue,
    header: &'i SegmentHeader,
    channel: Channel,
}

impl<'i> InfoView<'i> {
    fn new(product: &'i LocatedProduct, prologue: &'i Prologue) -> anyhow::Result<Self> {
        let header = &product.first_header;
        let channel_id = header.segment_id()?.channel_id;
        let channel = Channel::try_from(channel_id)
            .map_err(|_| anyhow::anyhow!("unknown spectral channel id {channel_id}"))?;
        Ok(Self {
            product,
            prologue,
            header,
            channel,
        })
    }
}

impl Display for InfoView<'_> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let Self {
            product,
            prologue,
            header,
            channel,
        } = self;
        let (Ok(structure), Ok(navigation), Ok(segment_id)) = (
            header.image_structure(),
            header.navigation(),
            header.segment_id(),
        ) else {
            return Err(fmt::Error);
        };

        let wmo_id = spacecraft_id_from_hrit(segment_id.spacecraft_id);
        let frame_columns = if *channel == Channel::Hrv {
            HRV_FRAME_COLUMNS
        } else {
            usize::from(structure.columns)
        };
        let frame_lines = usize::from(structure.lines) * product.segment_count();
        let missing = product.missing_sequences();
        let missing = if missing.is_empty() {
            "none".to_owned()
        } else {
            missing
                .iter()
                .map(|s| s.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        };
        let (slope, offset, is_linear) = prologue.radiometric_processing.slope_offset(*channel);
        let calibration = if is_linear {
            "linear"
        } else {
            "brightness temperature"
        };

        write!(
            f,
            "\
Product:                                {}
Channel:                                {} ({})
Spacecraft:                             {} (HRIT {}, WMO {})
Acquisition time:                       {}
Sub-satellite longitude:                {}
Segments:                               {} of {} (missing: {})
Segment size:                           {} x {}, {} bits per pixel
Frame size:                             {} x {}
Column/line scaling factors:            {} / {}
Column/line offsets:                    {} / {}
Pixel size at sub-satellite point:      {:.3} x {:.3} km
Calibration:                            {} (slope {}, offset {}) [{}]
",
            product.name,
            channel,
            u8::from(*channel),
            spacecraft_name(wmo_id),
            segment_id.spacecraft_id,
            wmo_id,
            prologue.acquisition_time,
            prologue.sub_satellite_longitude,
            product.present_count(),
            product.segment_count(),
            missing,
            structure.columns,
            structure.lines,
            structure.bits_per_pixel,
            frame_columns,
            frame_lines,
            navigation.column_factor,
            navigation.line_factor,
            navigation.column_offset,
            navigation.line_offset,
            facts::pixel_h_size_from_column_factor(navigation.column_factor),
            facts::pixel_v_size_from_line_factor(navigation.line_factor),
            calibration,
            slope,
            offset,
            channel.unit(),
        )
    }
}
