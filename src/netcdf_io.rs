//! NetCDF I/O for gridded fields and spectrum reports
//!
//! Fields are written with coordinate variables for `time`, `lat` and `lon`
//! when known, channel names as a `channels` attribute and a `history`
//! attribute, and can be read back with [`read_field`].

use crate::errors::{GridcastError, Result};
use crate::field::GriddedField;
use crate::spectra::SpectrumReport;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use ndarray::{Array1, ArrayD};
use netcdf::{create, AttributeValue};
use std::{fs, path::Path};

const TIME_UNITS: &str = "hours since 1970-01-01 00:00:00";

/// Writer for gridded fields
pub struct FieldWriter<'a> {
    output_path: &'a Path,
}

impl<'a> FieldWriter<'a> {
    /// Create a new writer; an existing file at `output_path` is replaced
    pub fn new(output_path: &'a Path) -> Self {
        Self { output_path }
    }

    /// Write `field` as variable `var_name`
    pub fn write(&self, field: &GriddedField, var_name: &str) -> Result<()> {
        field.validate()?;

        if self.output_path.exists() {
            fs::remove_file(self.output_path)?;
        }
        let mut file = create(self.output_path)?;

        for (dim_name, &dim_len) in field.dims.iter().zip(field.shape()) {
            file.add_dimension(dim_name, dim_len)?;
        }

        if !field.times.is_empty() && var_name != "time" {
            let hours: Vec<f64> = field.times.iter().map(|t| hours_since_epoch(*t)).collect();
            let mut time_var = file.add_variable::<f64>("time", &["time"])?;
            time_var.put_attribute("units", TIME_UNITS)?;
            time_var.put_attribute("calendar", "standard")?;
            time_var.put(Array1::from(hours).view(), ..)?;
        }
        if !field.lat.is_empty() && var_name != "lat" {
            let mut lat_var = file.add_variable::<f32>("lat", &["lat"])?;
            lat_var.put_attribute("units", "degrees_north")?;
            lat_var.put(Array1::from(field.lat.clone()).view(), ..)?;
        }
        if !field.lon.is_empty() && var_name != "lon" {
            let mut lon_var = file.add_variable::<f32>("lon", &["lon"])?;
            lon_var.put_attribute("units", "degrees_east")?;
            lon_var.put(Array1::from(field.lon.clone()).view(), ..)?;
        }

        let dim_refs: Vec<&str> = field.dims.iter().map(String::as_str).collect();
        let mut var = file.add_variable::<f32>(var_name, &dim_refs)?;
        var.put(field.data.view(), ..)?;

        if !field.channels.is_empty() {
            var.put_attribute("channels", field.channels.clone())?;
        }
        for (key, value) in &field.attrs {
            var.put_attribute(key, value.as_str())?;
        }

        file.add_attribute(
            "history",
            format!("Created by gridcast on {}", Utc::now().to_rfc3339()),
        )?;

        Ok(())
    }
}

/// Read variable `var_name` and whatever coordinates the file provides
pub fn read_field(path: &Path, var_name: &str) -> Result<GriddedField> {
    let file = netcdf::open(path)?;
    let var = file
        .variable(var_name)
        .ok_or_else(|| GridcastError::VariableNotFound {
            var: var_name.to_string(),
        })?;

    let dims: Vec<String> = var
        .dimensions()
        .iter()
        .map(|d| d.name().to_string())
        .collect();
    let shape: Vec<usize> = var
        .dimensions()
        .iter()
        .map(netcdf::Dimension::len)
        .collect();
    let values = var.get_values::<f32, _>(..)?;
    let data = ArrayD::from_shape_vec(shape, values)?;

    let mut field = GriddedField::new(data, dims)?;

    for attr in var.attributes() {
        let name = attr.name().to_string();
        match attr.value()? {
            AttributeValue::Strs(vals) if name == "channels" => field.channels = vals,
            AttributeValue::Str(val) if name == "channels" => {
                field.channels = val.split(',').map(|s| s.trim().to_string()).collect();
            }
            AttributeValue::Str(val) => {
                field.attrs.insert(name, val);
            }
            _ => {}
        }
    }

    if field.axis_of("time").is_some() && var_name != "time" {
        if let Some(time_var) = file.variable("time") {
            let offsets = time_var.get_values::<f64, _>(..)?;
            let units = match time_var.attribute("units") {
                Some(attr) => match attr.value()? {
                    AttributeValue::Str(s) => s,
                    _ => TIME_UNITS.to_string(),
                },
                None => TIME_UNITS.to_string(),
            };
            field.times = decode_times(&offsets, &units)?;
        }
    }
    if field.axis_of("lat").is_some() && var_name != "lat" {
        if let Some(lat_var) = file.variable("lat") {
            field.lat = lat_var.get_values::<f32, _>(..)?;
        }
    }
    if field.axis_of("lon").is_some() && var_name != "lon" {
        if let Some(lon_var) = file.variable("lon") {
            field.lon = lon_var.get_values::<f32, _>(..)?;
        }
    }

    field.validate()?;
    Ok(field)
}

/// Write a zonal power spectrum report
///
/// Variables: `power(time, freq)`, `freq(freq)`, `lead_days(time)` and
/// `high_wave_power(time)`.
pub fn write_spectrum(path: &Path, report: &SpectrumReport) -> Result<()> {
    if path.exists() {
        fs::remove_file(path)?;
    }
    let mut file = create(path)?;

    let (nt, nf) = report.power.dim();
    file.add_dimension("time", nt)?;
    file.add_dimension("freq", nf)?;

    {
        let mut freq = file.add_variable::<f64>("freq", &["freq"])?;
        freq.put_attribute("units", "cycles per grid point")?;
        freq.put(Array1::from(report.freqs.clone()).view(), ..)?;
    }
    {
        let mut lead = file.add_variable::<f64>("lead_days", &["time"])?;
        lead.put_attribute("units", "days")?;
        lead.put(Array1::from(report.lead_days.clone()).view(), ..)?;
    }
    {
        let mut power = file.add_variable::<f64>("power", &["time", "freq"])?;
        power.put_attribute("channel", report.channel.as_str())?;
        power.put(report.power.view(), ..)?;
    }
    {
        let mut high = file.add_variable::<f64>("high_wave_power", &["time"])?;
        high.put_attribute("min_index", report.min_index.to_string())?;
        high.put(Array1::from(report.high_wave_power.clone()).view(), ..)?;
    }

    file.add_attribute(
        "history",
        format!("Created by gridcast on {}", Utc::now().to_rfc3339()),
    )?;
    Ok(())
}

fn hours_since_epoch(t: NaiveDateTime) -> f64 {
    let epoch = DateTime::<Utc>::UNIX_EPOCH.naive_utc();
    (t - epoch).num_seconds() as f64 / 3600.0
}

/// Decode CF-style `"<unit> since <reference>"` time offsets
pub fn decode_times(offsets: &[f64], units: &str) -> Result<Vec<NaiveDateTime>> {
    let invalid = || GridcastError::InvalidParameter(format!("unsupported time units '{units}'"));

    let (unit, reference) = units.split_once(" since ").ok_or_else(invalid)?;
    let seconds_per_unit = match unit.trim() {
        "days" | "day" => 86_400.0,
        "hours" | "hour" => 3_600.0,
        "minutes" | "minute" => 60.0,
        "seconds" | "second" => 1.0,
        _ => return Err(invalid()),
    };

    let reference = reference.trim().trim_end_matches(" UTC");
    let start = NaiveDateTime::parse_from_str(reference, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(reference, "%Y-%m-%dT%H:%M:%S%.f"))
        .or_else(|_| {
            NaiveDate::parse_from_str(reference, "%Y-%m-%d").map(|d| d.and_time(NaiveTime::MIN))
        })
        .map_err(|_| invalid())?;

    offsets
        .iter()
        .map(|&v| {
            let millis = (v * seconds_per_unit * 1000.0).round();
            // fill values and offsets past the representable range
            if !millis.is_finite() || millis.abs() >= i64::MAX as f64 {
                return Err(out_of_range(v, units));
            }
            Duration::try_milliseconds(millis as i64)
                .and_then(|d| start.checked_add_signed(d))
                .ok_or_else(|| out_of_range(v, units))
        })
        .collect()
}

fn out_of_range(offset: f64, units: &str) -> GridcastError {
    GridcastError::InvalidParameter(format!("time offset {offset} {units} is out of range"))
}
