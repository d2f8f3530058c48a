use crate::utils::error::{LocatorError, Result};

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(LocatorError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(LocatorError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_positive_distance(field_name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(LocatorError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Distance must be a positive number of meters".to_string(),
        });
    }
    Ok(())
}

pub fn validate_latitude(field_name: &str, value: f64) -> Result<()> {
    validate_range(field_name, value, -90.0, 90.0)
}

pub fn validate_longitude(field_name: &str, value: f64) -> Result<()> {
    validate_range(field_name, value, -180.0, 180.0)
}

fn validate_range(field_name: &str, value: f64, min: f64, max: f64) -> Result<()> {
    // NaN fails both comparisons, so check it explicitly
    if value.is_nan() || value < min || value > max {
        return Err(LocatorError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

pub fn validate_dataset_extension(field_name: &str, path: &str) -> Result<()> {
    let allowed = ["json", "csv"];
    let extension = std::path::Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    match extension {
        Some(ext) if allowed.contains(&ext.as_str()) => Ok(()),
        _ => Err(LocatorError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: format!("Dataset must be one of: {}", allowed.join(", ")),
        }),
    }
}
