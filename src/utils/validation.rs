use crate::domain::catalog::normalize;
use crate::domain::model::BoundingBox;
use crate::utils::error::{FloatChatError, Result};
use std::collections::HashSet;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(FloatChatError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(FloatChatError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(FloatChatError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(FloatChatError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

/// 不支援跨越換日線的區域：minLon 必須不大於 maxLon
pub fn validate_bbox(field_name: &str, bbox: &BoundingBox) -> Result<()> {
    let rendered = format!("{:?}", bbox.as_array());

    for lat in [bbox.min_lat, bbox.max_lat] {
        if !(-90.0..=90.0).contains(&lat) {
            return Err(FloatChatError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: rendered,
                reason: "Latitude values must be between -90 and 90".to_string(),
            });
        }
    }

    for lon in [bbox.min_lon, bbox.max_lon] {
        if !(-180.0..=180.0).contains(&lon) {
            return Err(FloatChatError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: rendered,
                reason: "Longitude values must be between -180 and 180".to_string(),
            });
        }
    }

    if bbox.min_lat > bbox.max_lat {
        return Err(FloatChatError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: rendered,
            reason: "min_lat must not exceed max_lat".to_string(),
        });
    }

    if bbox.min_lon > bbox.max_lon {
        return Err(FloatChatError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: rendered,
            reason: "min_lon must not exceed max_lon (antimeridian-spanning regions are not supported)"
                .to_string(),
        });
    }

    Ok(())
}

pub fn validate_aliases(field_name: &str, aliases: &[String]) -> Result<()> {
    if aliases.is_empty() {
        return Err(FloatChatError::ConfigValidationError {
            field: field_name.to_string(),
            message: "At least one alias is required".to_string(),
        });
    }

    for alias in aliases {
        validate_non_empty_string(field_name, alias)?;
        if normalize(alias).is_empty() {
            return Err(FloatChatError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: alias.clone(),
                reason: "Alias must contain letters or digits".to_string(),
            });
        }
    }

    Ok(())
}

pub fn validate_unique_names<'a>(
    field_name: &str,
    names: impl IntoIterator<Item = &'a str>,
) -> Result<()> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name.to_lowercase()) {
            return Err(FloatChatError::ConfigValidationError {
                field: field_name.to_string(),
                message: format!("Duplicate entry: {}", name),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_bbox() {
        assert!(validate_bbox("regions", &BoundingBox::new(-180.0, -60.0, -70.0, 60.0)).is_ok());
        assert!(validate_bbox("regions", &BoundingBox::new(170.0, -10.0, -170.0, 10.0)).is_err());
        assert!(validate_bbox("regions", &BoundingBox::new(0.0, 10.0, 10.0, -10.0)).is_err());
        assert!(validate_bbox("regions", &BoundingBox::new(0.0, -95.0, 10.0, 0.0)).is_err());
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range("engine.sample_size", 10, 1, 10).is_ok());
        assert!(validate_range("engine.sample_size", 0, 1, 10).is_err());
    }

    #[test]
    fn test_validate_unique_names() {
        assert!(validate_unique_names("regions", ["Pacific", "Atlantic"]).is_ok());
        assert!(validate_unique_names("regions", ["Pacific", "pacific"]).is_err());
    }

    #[test]
    fn test_validate_aliases() {
        assert!(validate_aliases("regions.aliases", &["pacific".to_string()]).is_ok());
        assert!(validate_aliases("regions.aliases", &[]).is_err());
        assert!(validate_aliases("regions.aliases", &["  ".to_string()]).is_err());
    }
}
