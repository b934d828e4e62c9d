//! Writing xRIT products: prologue, epilogue and uncompressed image
//! segments.

use std::{
    fs,
    path::{Path, PathBuf},
};

use log::{debug, info};

use crate::{
    assembler::Consumer,
    codetables::{Channel, spacecraft_id_to_hrit},
    error::*,
    header::*,
    image::Image,
    locator::ProductName,
    prologue::{Epilogue, HrvCoverage, Prologue, RadiometricProcessing},
    stream::{pack_samples, packed_len},
    time::UtcDateTime,
};

/// Everything needed to lay out the files of one product.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductWriter {
    pub name: ProductName,
    /// HRIT spacecraft code
    pub spacecraft_id: u16,
    pub channel: Channel,
    pub bits_per_pixel: u8,
    pub segment_columns: u16,
    pub segment_lines: u16,
    pub planned_end_segment: u16,
    /// Navigation as stored in segment headers, i.e. negative factors for
    /// south-up, east-left storage
    pub column_factor: i32,
    pub line_factor: i32,
    pub column_offset: i32,
    pub line_offset: i32,
    pub sub_satellite_longitude: f32,
    pub time: UtcDateTime,
    /// Data field format written to segment identification records
    pub data_field_format: u8,
}

impl ProductWriter {
    fn path_of(&self, file_name: String) -> PathBuf {
        self.name.directory.join(file_name)
    }

    pub fn write_prologue(&self, prologue: &Prologue) -> Result<PathBuf, XritError> {
        let path = self.path_of(self.name.prologue_file_name());
        let data = prologue.to_data_field()?;
        write_file(&path, file_type::PROLOGUE, &[], &data, data.len() as u64 * 8)?;
        Ok(path)
    }

    pub fn write_epilogue(&self, epilogue: &Epilogue) -> Result<PathBuf, XritError> {
        let path = self.path_of(self.name.epilogue_file_name());
        let data = epilogue.to_data_field();
        write_file(&path, file_type::EPILOGUE, &[], &data, data.len() as u64 * 8)?;
        Ok(path)
    }

    /// Writes segment `sequence` (1-based) holding `samples` in native
    /// order.
    pub fn write_segment(&self, sequence: u16, samples: &[u16]) -> Result<PathBuf, XritError> {
        let expected = usize::from(self.segment_columns) * usize::from(self.segment_lines);
        if samples.len() != expected {
            return Err(XritError::InvalidValueError(format!(
                "segment {sequence} needs {expected} samples, got {}",
                samples.len()
            )));
        }
        let file_name = self.name.segment_file_name(sequence);
        let path = self.path_of(file_name.clone());
        let (days, millis_of_day) = self.time.to_cds()?;

        let records = [
            ImageStructure {
                bits_per_pixel: self.bits_per_pixel,
                columns: self.segment_columns,
                lines: self.segment_lines,
                compression: 0,
            }
            .to_bytes(),
            ImageNavigation {
                projection_name: format!("GEOS({:+06.1})", self.sub_satellite_longitude),
                column_factor: self.column_factor,
                line_factor: self.line_factor,
                column_offset: self.column_offset,
                line_offset: self.line_offset,
            }
            .to_bytes(),
            annotation(&file_name),
            TimeStamp {
                days,
                millis_of_day,
            }
            .to_bytes(),
            SegmentIdentification {
                spacecraft_id: self.spacecraft_id,
                channel_id: u8::from(self.channel),
                sequence_number: sequence,
                planned_start_segment: 1,
                planned_end_segment: self.planned_end_segment,
                data_field_format: self.data_field_format,
            }
            .to_bytes(),
        ];
        let data = pack_samples(samples, self.bits_per_pixel);
        debug_assert_eq!(data.len(), packed_len(self.bits_per_pixel, samples.len()));
        let bits = samples.len() as u64 * u64::from(self.bits_per_pixel);
        write_file(&path, file_type::IMAGE, &records, &data, bits)?;
        Ok(path)
    }
}

fn annotation(text: &str) -> Vec<u8> {
    let len = 3 + text.len();
    let mut buf = Vec::with_capacity(len);
    buf.push(4);
    buf.extend_from_slice(&(len as u16).to_be_bytes());
    buf.extend_from_slice(text.as_bytes());
    buf
}

fn write_file(
    path: &Path,
    file_type_code: u8,
    records: &[Vec<u8>],
    data: &[u8],
    data_field_length: u64,
) -> Result<(), XritError> {
    let records = records.concat();
    let primary = PrimaryHeader {
        file_type_code,
        total_header_length: (PRIMARY_HEADER_SIZE + records.len()) as u32,
        data_field_length,
    };
    let bytes = [primary.to_bytes(), records, data.to_vec()].concat();
    fs::write(path, bytes).map_err(|e| XritError::at(path, e))?;
    debug!("wrote {}", path.display());
    Ok(())
}

/// Lines per segment of normal-resolution SEVIRI products.
pub const DEFAULT_SEGMENT_LINES: usize = 464;

/// Writes decoded images back as xRIT products in a directory.
///
/// Only raw-count, non-HRV images can be written. Images are split into
/// segments of [`DEFAULT_SEGMENT_LINES`] lines when their height allows it,
/// and written as a single segment otherwise.
pub struct XritExporter {
    directory: PathBuf,
    radiometric_processing: Option<RadiometricProcessing>,
    written: Vec<ProductName>,
}

impl XritExporter {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            radiometric_processing: None,
            written: Vec::new(),
        }
    }

    /// Uses the calibration of an existing product in written prologues.
    pub fn with_radiometric_processing(self, processing: RadiometricProcessing) -> Self {
        Self {
            radiometric_processing: Some(processing),
            ..self
        }
    }

    /// Products written so far.
    pub fn written(&self) -> &[ProductName] {
        &self.written
    }
}

fn product_id1(hrit_spacecraft_id: u16) -> String {
    match hrit_spacecraft_id {
        321..=324 => format!("MSG{}", hrit_spacecraft_id - 320),
        _ => "MSG".to_owned(),
    }
}

impl Consumer for XritExporter {
    fn accept(&mut self, image: Image) -> Result<(), XritError> {
        let channel = image
            .channel()
            .ok_or(FormatError::UnknownChannel(image.channel_id))?;
        if channel == Channel::Hrv {
            return Err(XritError::InvalidValueError(
                "HRV images cannot be re-segmented".to_owned(),
            ));
        }
        let data = image.data();
        if data.is_prescaled() || data.bpp == 0 || data.bpp > 16 {
            return Err(XritError::InvalidValueError(
                "only raw counts of at most 16 bits can be written".to_owned(),
            ));
        }
        let (columns, lines) = (image.columns(), image.lines());
        let segment_lines = if lines % DEFAULT_SEGMENT_LINES == 0 {
            DEFAULT_SEGMENT_LINES
        } else {
            lines
        };
        let segments = lines / segment_lines;
        let too_large = |v: usize| u16::try_from(v).is_err();
        if too_large(columns) || too_large(segment_lines) || too_large(segments) {
            return Err(XritError::InvalidValueError(format!(
                "{columns}x{lines} image is too large for xRIT segments"
            )));
        }

        let spacecraft_id = spacecraft_id_to_hrit(image.spacecraft_id);
        let name = ProductName::new(
            &self.directory,
            "H",
            &product_id1(spacecraft_id),
            channel.product_name(),
            &image.time.timing(),
        )?;
        let writer = ProductWriter {
            name: name.clone(),
            spacecraft_id,
            channel,
            bits_per_pixel: data.bpp,
            segment_columns: columns as u16,
            segment_lines: segment_lines as u16,
            planned_end_segment: segments as u16,
            column_factor: -image.column_factor,
            line_factor: -image.line_factor,
            column_offset: columns as i32 - image.column_offset,
            line_offset: lines as i32 - image.line_offset,
            sub_satellite_longitude: image.sub_satellite_longitude,
            time: image.time,
            data_field_format: SegmentIdentification::NATIVE_FORMAT,
        };

        let processing = match &self.radiometric_processing {
            Some(processing) => processing.clone(),
            None => {
                let mut coefficients = [(1.0, 0.0); 12];
                coefficients[usize::from(u8::from(channel)) - 1] = (data.slope, data.offset);
                RadiometricProcessing {
                    satellite_id: spacecraft_id,
                    coefficients,
                }
            }
        };
        writer.write_prologue(&Prologue {
            satellite_id: spacecraft_id,
            acquisition_time: image.time,
            sub_satellite_longitude: image.sub_satellite_longitude,
            planned_hrv_coverage: HrvCoverage::default(),
            radiometric_processing: processing,
        })?;
        writer.write_epilogue(&Epilogue {
            actual_hrv_coverage: HrvCoverage::default(),
        })?;

        // native storage is rotated by 180 degrees
        let mut samples = Vec::with_capacity(columns * segment_lines);
        for segment in 0..segments {
            samples.clear();
            for r in segment * segment_lines..(segment + 1) * segment_lines {
                for c in 0..columns {
                    let raw = data.raw(columns - 1 - c, lines - 1 - r).unwrap_or(0);
                    samples.push(raw as u16);
                }
            }
            writer.write_segment(segment as u16 + 1, &samples)?;
        }

        info!("wrote {name} ({segments} segments)");
        self.written.push(name);
        Ok(())
    }
}
