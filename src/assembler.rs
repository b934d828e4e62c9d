use std::{
    fmt::{self, Display, Formatter},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use log::{debug, info, warn};

use crate::{
    address::{HrvLayout, SegmentGeometry},
    cache::{FileSegmentSource, SegmentCache, SegmentShape, SegmentSource},
    calibration::Calibrator,
    codetables::{Channel, spacecraft_id_from_hrit},
    data::{ImageData, Samples},
    error::*,
    header::SegmentHeader,
    image::{Image, Quality},
    locator::{LocatedProduct, ProductName, locate},
    prologue::{Epilogue, HrvCoverage, Prologue},
    projection::{GeoArea, PixelArea},
};

/// Options controlling how an image is decoded.
#[derive(Debug, Clone)]
pub struct DecodeOptions {
    /// Pixel rectangle to decode; the whole frame when `None`
    pub area: Option<PixelArea>,
    /// Geographic rectangle to decode, translated to pixels before decoding
    pub geo_area: Option<GeoArea>,
    /// Convert counts into physical values; raw counts are kept otherwise
    pub calibrate: bool,
    pub missing_value: f32,
    /// Checked once per line; decoding stops with [`XritError::Cancelled`]
    /// once set
    pub cancel: Option<Arc<AtomicBool>>,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            area: None,
            geo_area: None,
            calibrate: true,
            missing_value: f32::NAN,
            cancel: None,
        }
    }
}

impl DecodeOptions {
    pub fn with_area(self, area: PixelArea) -> Self {
        Self {
            area: Some(area),
            ..self
        }
    }

    pub fn with_geo_area(self, area: GeoArea) -> Self {
        Self {
            geo_area: Some(area),
            ..self
        }
    }

    pub fn raw(self) -> Self {
        Self {
            calibrate: false,
            ..self
        }
    }

    pub fn with_missing_value(self, missing_value: f32) -> Self {
        Self {
            missing_value,
            ..self
        }
    }

    pub fn with_cancel_flag(self, flag: Arc<AtomicBool>) -> Self {
        Self {
            cancel: Some(flag),
            ..self
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}

/// Access to the pixels of a segmented product, one frame line at a time.
pub struct DataAccess<S = FileSegmentSource> {
    pub geometry: SegmentGeometry,
    pub shape: SegmentShape,
    cache: SegmentCache<S>,
}

impl DataAccess<FileSegmentSource> {
    /// Prepares access to the segments of `product`. `hrv_coverage` is only
    /// used for HRV products.
    pub fn open(product: &LocatedProduct, hrv_coverage: &HrvCoverage) -> Result<Self, XritError> {
        let header = &product.first_header;
        let structure = header.image_structure()?;
        let navigation = header.navigation()?;
        let segment_id = header.segment_id()?;

        let columns = usize::from(structure.columns);
        let hrv = if segment_id.channel_id == u8::from(Channel::Hrv) {
            Some(HrvLayout::from_coverage(hrv_coverage, columns)?)
        } else {
            None
        };
        let geometry = SegmentGeometry {
            columns,
            seglines: usize::from(structure.lines),
            segments: product.segment_count(),
            swap_x: navigation.column_factor < 0,
            swap_y: navigation.line_factor < 0,
            hrv,
        };
        let shape = SegmentShape {
            columns: structure.columns,
            lines: structure.lines,
            bits_per_pixel: structure.bits_per_pixel,
        };
        let source = FileSegmentSource::new(product.segments.clone(), shape);
        Ok(Self::new(geometry, shape, source))
    }
}

impl<S: SegmentSource> DataAccess<S> {
    pub fn new(geometry: SegmentGeometry, shape: SegmentShape, source: S) -> Self {
        Self {
            geometry,
            shape,
            cache: SegmentCache::new(source),
        }
    }

    pub fn columns(&self) -> usize {
        self.geometry.frame_columns()
    }

    pub fn lines(&self) -> usize {
        self.geometry.lines()
    }

    pub fn npixperseg(&self) -> usize {
        self.geometry.npixperseg()
    }

    pub fn line_start(&self, line: usize) -> usize {
        self.geometry.line_start(line)
    }

    pub fn segment(&mut self, index: usize) -> Result<Option<&[u16]>, XritError> {
        self.cache.segment(index)
    }

    /// Raw sample at `(x, y)`, 0 where there is no data.
    pub fn sample(&mut self, x: usize, y: usize) -> Result<u16, XritError> {
        let Some(address) = self.geometry.resolve(x, y) else {
            return Ok(0);
        };
        Ok(self
            .cache
            .segment(address.segment)?
            .map_or(0, |s| s[address.offset]))
    }

    /// Reads frame line `y` into `buf`, which must hold [`Self::columns`]
    /// samples. Pixels without data are set to 0.
    pub fn line_read(&mut self, y: usize, buf: &mut [u16]) -> Result<(), XritError> {
        if buf.len() != self.columns() || y >= self.lines() {
            return Err(XritError::InvalidValueError(format!(
                "cannot read line {y} of {} into a buffer of {} samples",
                self.lines(),
                buf.len()
            )));
        }
        buf.fill(0);
        for (x, value) in buf.iter_mut().enumerate() {
            let Some(address) = self.geometry.resolve(x, y) else {
                continue;
            };
            if let Some(segment) = self.cache.segment(address.segment)? {
                *value = segment[address.offset];
            }
        }
        Ok(())
    }

    pub fn cache(&self) -> &SegmentCache<S> {
        &self.cache
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssemblyState {
    Located,
    HeadersParsed,
    Calibrated,
    Assembling,
    Complete,
    Failed,
}

impl Display for AssemblyState {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let s = match self {
            Self::Located => "located",
            Self::HeadersParsed => "headers parsed",
            Self::Calibrated => "calibrated",
            Self::Assembling => "assembling",
            Self::Complete => "complete",
            Self::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

/// Builds one [`Image`] out of a located product.
pub struct ImageAssembler {
    product: LocatedProduct,
    options: DecodeOptions,
    state: AssemblyState,
}

struct Session {
    prologue: Prologue,
    channel: Channel,
    access: DataAccess,
}

impl ImageAssembler {
    pub fn new(product: LocatedProduct, options: DecodeOptions) -> Self {
        Self {
            product,
            options,
            state: AssemblyState::Located,
        }
    }

    pub fn state(&self) -> AssemblyState {
        self.state
    }

    fn enter(&mut self, state: AssemblyState) {
        debug!("{}: {} -> {state}", self.product.name, self.state);
        self.state = state;
    }

    /// Runs assembly to completion. No image is returned on failure.
    pub fn run(&mut self) -> Result<Image, XritError> {
        let result = self.assemble();
        match &result {
            Ok(_) => self.enter(AssemblyState::Complete),
            Err(e) => {
                debug!("{}: {e}", self.product.name);
                self.enter(AssemblyState::Failed);
            }
        }
        result
    }

    fn assemble(&mut self) -> Result<Image, XritError> {
        let mut session = self.parse_headers()?;
        self.enter(AssemblyState::HeadersParsed);

        let header = self.product.first_header.clone();
        let bpp = header.image_structure()?.bits_per_pixel;
        let calibrator = if self.options.calibrate {
            Calibrator::for_channel(
                &session.prologue.radiometric_processing,
                session.channel,
                bpp,
            )?
        } else {
            Calibrator::Identity
        };
        self.enter(AssemblyState::Calibrated);

        let mut image = self.frame_metadata(&session, &header)?;
        let area = self.requested_area(&image, &session.access)?;
        self.enter(AssemblyState::Assembling);

        let data = fill_area(
            &mut session.access,
            &area,
            &calibrator,
            bpp,
            &self.options,
        )?;
        image.set_data(data);
        image.column_offset -= area.x as i32;
        image.line_offset -= area.y as i32;
        image.x0 = area.x;
        image.y0 = area.y;
        if area.x != 0 || area.y != 0 || area.width != session.access.columns() {
            image.add_to_history(&format!(
                "area {}x{}+{}+{}",
                area.width, area.height, area.x, area.y
            ));
        }
        info!(
            "{}: decoded {}x{} pixels, {} segment loads",
            self.product.name,
            area.width,
            area.height,
            session.access.cache().load_count()
        );
        Ok(image)
    }

    fn parse_headers(&self) -> Result<Session, XritError> {
        let product = &self.product;
        let first_path = product
            .segments
            .iter()
            .flatten()
            .next()
            .cloned()
            .unwrap_or_default();
        product
            .first_header
            .check_image_data()
            .map_err(|e| XritError::at(&first_path, e))?;

        let prologue = Prologue::read(&product.prologue)?;
        let channel_id = product.first_header.segment_id()?.channel_id;
        let channel =
            Channel::try_from(channel_id).map_err(|_| FormatError::UnknownChannel(channel_id))?;

        let coverage = if channel == Channel::Hrv {
            hrv_coverage(product, &prologue)?
        } else {
            HrvCoverage::default()
        };
        let access = DataAccess::open(product, &coverage)?;

        Ok(Session {
            prologue,
            channel,
            access,
        })
    }

    /// Metadata of the whole frame, before any cropping.
    fn frame_metadata(&self, session: &Session, header: &SegmentHeader) -> Result<Image, XritError> {
        let navigation = header.navigation()?;
        let segment_id = header.segment_id()?;
        let access = &session.access;

        let column_offset = if access.geometry.swap_x {
            access.columns() as i32 - navigation.column_offset
        } else {
            navigation.column_offset
        };
        let line_offset = if access.geometry.swap_y {
            access.lines() as i32 - navigation.line_offset
        } else {
            navigation.line_offset
        };

        let mut image = Image::new(ImageData::prescaled(0, 0, Vec::new(), 0.0)?);
        image.time = session.prologue.acquisition_time;
        image.spacecraft_id = spacecraft_id_from_hrit(segment_id.spacecraft_id);
        image.channel_id = segment_id.channel_id;
        image.sub_satellite_longitude = navigation
            .sub_satellite_longitude()
            .unwrap_or(session.prologue.sub_satellite_longitude);
        image.column_factor = navigation.column_factor.abs();
        image.line_factor = navigation.line_factor.abs();
        image.column_offset = column_offset;
        image.line_offset = line_offset;
        image.quality = if self.product.present_count() == self.product.segment_count() {
            Quality::Complete
        } else {
            Quality::MissingSegments
        };
        image.add_to_history(&format!("decoded from {}", self.product.name));
        Ok(image)
    }

    fn requested_area(&self, frame: &Image, access: &DataAccess) -> Result<PixelArea, XritError> {
        let (columns, lines) = (access.columns(), access.lines());
        let area = match (&self.options.area, &self.options.geo_area) {
            (Some(_), Some(_)) => {
                return Err(XritError::ConfigError(
                    "pixel and geographic areas cannot be requested together".to_owned(),
                ));
            }
            (Some(area), None) => *area,
            (None, Some(geo)) => frame.projection().pixel_area(geo, columns, lines)?,
            (None, None) => PixelArea::new(0, 0, columns, lines),
        };
        area.check_within(columns, lines)?;
        Ok(area)
    }
}

fn hrv_coverage(product: &LocatedProduct, prologue: &Prologue) -> Result<HrvCoverage, XritError> {
    match &product.epilogue {
        Some(path) => Ok(Epilogue::read(path)?.actual_hrv_coverage),
        None => {
            warn!(
                "{}: no epilogue, using planned HRV coverage",
                product.name
            );
            Ok(prologue.planned_hrv_coverage)
        }
    }
}

/// Reads the pixels of `area` line by line, top to bottom, converting each
/// raw sample with `convert`.
fn read_area<S, T, F>(
    access: &mut DataAccess<S>,
    area: &PixelArea,
    options: &DecodeOptions,
    out: &mut [T],
    convert: F,
) -> Result<(), XritError>
where
    S: SegmentSource,
    F: Fn(u16) -> Result<T, FormatError>,
{
    let mut line = vec![0u16; access.columns()];
    for (row, y) in (area.y..area.y + area.height).enumerate() {
        if options.is_cancelled() {
            return Err(XritError::Cancelled);
        }
        access.line_read(y, &mut line)?;
        let out_row = &mut out[row * area.width..(row + 1) * area.width];
        for (dst, raw) in out_row.iter_mut().zip(&line[area.x..area.x + area.width]) {
            *dst = convert(*raw)?;
        }
    }
    Ok(())
}

fn fill_area<S: SegmentSource>(
    access: &mut DataAccess<S>,
    area: &PixelArea,
    calibrator: &Calibrator,
    bpp: u8,
    options: &DecodeOptions,
) -> Result<ImageData, XritError> {
    let n = area.width * area.height;
    let mut data = if calibrator.keeps_raw_counts() {
        let limit = 1u32 << bpp;
        let check = |raw: u16| {
            if u32::from(raw) < limit {
                Ok(raw)
            } else {
                Err(FormatError::SampleOutOfRange(u32::from(raw), limit as usize))
            }
        };
        let mut samples = Samples::raw(bpp, n);
        match &mut samples {
            Samples::U8(v) => read_area(access, area, options, v, |raw| {
                check(raw).map(|raw| raw as u8)
            })?,
            Samples::U16(v) => read_area(access, area, options, v, check)?,
            Samples::U32(v) => read_area(access, area, options, v, |raw| {
                check(raw).map(u32::from)
            })?,
            Samples::F32(v) => read_area(access, area, options, v, |raw| {
                check(raw).map(f32::from)
            })?,
        }
        let (slope, offset) = calibrator.slope_offset();
        ImageData::with_raw_counts(area.width, area.height, samples, bpp, slope, offset)?
    } else {
        let mut values = vec![f32::NAN; n];
        read_area(access, area, options, &mut values, |raw| {
            calibrator.calibrate(raw)
        })?;
        let (_, offset) = calibrator.slope_offset();
        ImageData::prescaled(area.width, area.height, values, offset)?
    };
    data.missing_value = options.missing_value;
    Ok(data)
}

/// Something that decodes one image.
pub trait Decoder {
    fn decode(&self, options: &DecodeOptions) -> Result<Image, XritError>;
}

/// Something that takes decoded images, e.g. a writer.
pub trait Consumer {
    fn accept(&mut self, image: Image) -> Result<(), XritError>;
}

/// Decoder for xRIT products on disk.
pub struct XritDecoder {
    name: ProductName,
}

impl XritDecoder {
    pub fn new(name: ProductName) -> Self {
        Self { name }
    }
}

impl Decoder for XritDecoder {
    fn decode(&self, options: &DecodeOptions) -> Result<Image, XritError> {
        let product = locate(&self.name)?;
        ImageAssembler::new(product, options.clone()).run()
    }
}

/// Locates and decodes the product `name`.
pub fn decode(name: &ProductName, options: &DecodeOptions) -> Result<Image, XritError> {
    XritDecoder::new(name.clone()).decode(options)
}
