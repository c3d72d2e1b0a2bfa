use crate::domain::catalog::{find_term, normalize, Catalog};
use crate::domain::model::{DateRange, DepthRange, FloatStatus, Query, QueryParameters};
use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use regex::Regex;
use std::sync::{Arc, OnceLock};

const COMPARISON_KEYWORDS: [&str; 5] = ["compare", "comparison", "between", "versus", "vs"];

/// Explicit follow-up context supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryContext {
    /// Region of the previous query, reused only when the new query names
    /// neither a region nor a comparison.
    pub carry_region: Option<String>,
}

struct Patterns {
    float_id: Regex,
    year: Regex,
    depth: Regex,
    depth_value: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        float_id: Regex::new(r"\b(?:float|wmo)\s+(?:id\s+)?(\d{4,9})\b")
            .expect("float id pattern is valid"),
        year: Regex::new(r"\b((?:19|20)\d{2})\b").expect("year pattern is valid"),
        depth: Regex::new(r"\b(\d+)(?:\s*m)?\s+(?:to\s+)?(\d+)\s*(?:m|meters|metres)\b")
            .expect("depth pattern is valid"),
        depth_value: Regex::new(r"\b\d+\s*(?:m|meters|metres)\b")
            .expect("depth value pattern is valid"),
    })
}

/// 將自由文字轉成 QueryParameters；永不失敗，最差情況回傳全空參數
#[derive(Debug, Clone)]
pub struct ParameterExtractor {
    catalog: Arc<Catalog>,
}

impl ParameterExtractor {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    pub fn extract(&self, query: &Query) -> QueryParameters {
        self.extract_with_context(query, &QueryContext::default())
    }

    pub fn extract_with_context(&self, query: &Query, context: &QueryContext) -> QueryParameters {
        let normalized = normalize(&query.text);
        let mut params = QueryParameters::default();

        if let Some(wmo_id) = self.extract_float_id(&normalized) {
            tracing::debug!("Float id lookup detected: {}", wmo_id);
            params.wmo_id = Some(wmo_id);
        }

        // 比較模式：收集所有提到的區域（依首次出現順序）
        let wants_comparison = COMPARISON_KEYWORDS
            .iter()
            .any(|keyword| find_term(&normalized, keyword).is_some());

        if wants_comparison {
            let mentioned: Vec<String> = self
                .catalog
                .regions_in_order(&normalized)
                .into_iter()
                .map(|r| r.name.clone())
                .collect();

            if mentioned.len() >= 2 {
                params.comparison_regions = Some(mentioned);
            } else {
                tracing::debug!(
                    "Comparison requested with {} region(s), falling back to single-region query",
                    mentioned.len()
                );
            }
        }

        if !params.is_comparison() {
            let region = self
                .catalog
                .match_region(&normalized)
                .or_else(|| {
                    context
                        .carry_region
                        .as_deref()
                        .and_then(|name| self.catalog.region(name))
                });

            if let Some(region) = region {
                params.region = Some(region.name.clone());
                params.bbox = Some(region.bbox);
            }
        }

        params.variables = self.catalog.match_variables(&normalized);
        params.status = extract_status(&normalized);
        params.depth_range = extract_depth_range(&normalized);
        params.date_range = extract_date_range(&normalized, query.received_at);

        tracing::debug!("Extracted parameters: {:?}", params);
        params
    }

    fn extract_float_id(&self, normalized: &str) -> Option<String> {
        patterns()
            .float_id
            .captures(normalized)
            .map(|caps| caps[1].to_string())
    }
}

fn extract_status(normalized: &str) -> Option<FloatStatus> {
    FloatStatus::ALL
        .iter()
        .copied()
        .find(|status| find_term(normalized, status.as_str()).is_some())
}

fn extract_depth_range(normalized: &str) -> Option<DepthRange> {
    if let Some(caps) = patterns().depth.captures(normalized) {
        let min = caps[1].parse::<f64>().ok();
        let max = caps[2].parse::<f64>().ok();
        if let Some(range) = min.zip(max).and_then(|(min, max)| DepthRange::new(min, max)) {
            return Some(range);
        }
    }

    if find_term(normalized, "surface").is_some() {
        return DepthRange::new(0.0, 100.0);
    }
    if find_term(normalized, "deep").is_some() {
        return DepthRange::new(1000.0, 6000.0);
    }
    None
}

fn extract_date_range(normalized: &str, now: DateTime<Utc>) -> Option<DateRange> {
    if normalized.contains("last month") {
        return last_month(now);
    }

    // 浮標編號與深度數字 (例如 "float 2019"、"below 2000 m") 不可被當成年份
    let patterns = patterns();
    let mut masked = patterns.float_id.replace_all(normalized, " ").into_owned();
    for hint in [&patterns.depth, &patterns.depth_value] {
        masked = hint.replace_all(&masked, " ").into_owned();
    }

    let year = patterns
        .year
        .captures(&masked)
        .and_then(|caps| caps[1].parse::<i32>().ok())?;

    let start = Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).single()?;
    let end = Utc.with_ymd_and_hms(year, 12, 31, 23, 59, 59).single()?;
    Some(DateRange { start, end })
}

fn last_month(now: DateTime<Utc>) -> Option<DateRange> {
    let (year, month) = if now.month() == 1 {
        (now.year() - 1, 12)
    } else {
        (now.year(), now.month() - 1)
    };

    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next_first = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };

    let start = first.and_hms_opt(0, 0, 0)?.and_utc();
    let end = next_first.and_hms_opt(0, 0, 0)?.and_utc() - Duration::seconds(1);
    Some(DateRange { start, end })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{BoundingBox, VariableId};

    fn extractor() -> ParameterExtractor {
        ParameterExtractor::new(Arc::new(Catalog::builtin()))
    }

    fn extract(text: &str) -> QueryParameters {
        let received = Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap();
        extractor().extract(&Query::at(text, received))
    }

    #[test]
    fn test_pacific_temperature_query() {
        let params = extract("what is the average temperature in pacific ocean");
        assert_eq!(params.region.as_deref(), Some("Pacific Ocean"));
        assert_eq!(params.bbox, Some(BoundingBox::new(-180.0, -60.0, -70.0, 60.0)));
        assert_eq!(params.variables, vec![VariableId::Temperature]);
        assert_eq!(params.status, None);
        assert!(!params.is_comparison());
    }

    #[test]
    fn test_comparison_collects_regions_in_order() {
        let params = extract("compare salinity between indian and atlantic ocean");
        assert_eq!(
            params.comparison_regions,
            Some(vec!["Indian Ocean".to_string(), "Atlantic Ocean".to_string()])
        );
        assert_eq!(params.region, None);
        assert_eq!(params.bbox, None);
        assert_eq!(params.variables, vec![VariableId::Salinity]);
    }

    #[test]
    fn test_comparison_with_one_region_degrades() {
        let params = extract("compare temperature in the arctic");
        assert_eq!(params.comparison_regions, None);
        assert_eq!(params.region.as_deref(), Some("Arctic Ocean"));

        let params = extract("temperature versus salinity");
        assert_eq!(params.comparison_regions, None);
        assert_eq!(params.region, None);
        assert_eq!(
            params.variables,
            vec![VariableId::Temperature, VariableId::Salinity]
        );
    }

    #[test]
    fn test_status_keywords() {
        assert_eq!(extract("inactive floats").status, Some(FloatStatus::Inactive));
        assert_eq!(extract("active floats in indian ocean").status, Some(FloatStatus::Active));
        assert_eq!(extract("floats under maintenance").status, Some(FloatStatus::Maintenance));
    }

    #[test]
    fn test_empty_query_is_unconstrained() {
        assert!(extract("").is_unconstrained());
        assert!(extract("???").is_unconstrained());
    }

    #[test]
    fn test_depth_hints() {
        let params = extract("oxygen in the southern ocean between 0-500m depth");
        assert_eq!(params.depth_range, DepthRange::new(0.0, 500.0));
        assert_eq!(params.region.as_deref(), Some("Southern Ocean"));

        assert_eq!(extract("surface salinity").depth_range, DepthRange::new(0.0, 100.0));
        assert_eq!(extract("200 to 1000 meters").depth_range, DepthRange::new(200.0, 1000.0));
        assert_eq!(extract("500-100m").depth_range, None);
        assert_eq!(extract("12m").depth_range, None);
    }

    #[test]
    fn test_depth_numbers_are_not_years() {
        let params = extract("temperature from 2000 to 4000 meters");
        assert_eq!(params.depth_range, DepthRange::new(2000.0, 4000.0));
        assert_eq!(params.date_range, None);
    }

    #[test]
    fn test_single_depth_is_not_a_year() {
        for text in [
            "salinity below 2000 meters in the atlantic",
            "temperature at 1950 m",
            "oxygen near 2010m",
            "nitrate deeper than 1999 metres",
        ] {
            assert_eq!(extract(text).date_range, None, "{}", text);
        }

        // 深度之外的年份仍然有效
        let range = extract("salinity below 2000 meters in 2023").date_range.unwrap();
        assert_eq!(range.start, Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_float_id_is_not_a_year() {
        let params = extract("show float 2019");
        assert_eq!(params.wmo_id.as_deref(), Some("2019"));
        assert_eq!(params.date_range, None);

        let params = extract("float 2019 in 2021");
        assert_eq!(params.wmo_id.as_deref(), Some("2019"));
        assert_eq!(
            params.date_range.unwrap().start,
            Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_year_hint() {
        let range = extract("temperature in the pacific in 2023").date_range.unwrap();
        assert_eq!(range.start, Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(range.end, Utc.with_ymd_and_hms(2023, 12, 31, 23, 59, 59).unwrap());
    }

    #[test]
    fn test_last_month_hint_handles_february_and_january() {
        let range = extract("salinity last month").date_range.unwrap();
        assert_eq!(range.start, Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap());
        assert_eq!(range.end, Utc.with_ymd_and_hms(2024, 2, 29, 23, 59, 59).unwrap());

        let january = Utc.with_ymd_and_hms(2025, 1, 10, 8, 0, 0).unwrap();
        let range = extractor()
            .extract(&Query::at("last month", january))
            .date_range
            .unwrap();
        assert_eq!(range.start, Utc.with_ymd_and_hms(2024, 12, 1, 0, 0, 0).unwrap());
        assert_eq!(range.end, Utc.with_ymd_and_hms(2024, 12, 31, 23, 59, 59).unwrap());
    }

    #[test]
    fn test_float_id_lookup() {
        assert_eq!(extract("show me float 5904818").wmo_id.as_deref(), Some("5904818"));
        assert_eq!(extract("data for float id 2902746").wmo_id.as_deref(), Some("2902746"));
        assert_eq!(extract("WMO #6903240").wmo_id.as_deref(), Some("6903240"));
        assert_eq!(extract("floats in 2023").wmo_id, None);
    }

    #[test]
    fn test_carry_region_is_opt_in() {
        let extractor = extractor();
        let context = QueryContext {
            carry_region: Some("Indian Ocean".to_string()),
        };

        let params = extractor.extract_with_context(&Query::new("and salinity too"), &context);
        assert_eq!(params.region.as_deref(), Some("Indian Ocean"));

        let params = extractor.extract_with_context(&Query::new("salinity in the arctic"), &context);
        assert_eq!(params.region.as_deref(), Some("Arctic Ocean"));

        let params = extractor.extract(&Query::new("and salinity too"));
        assert_eq!(params.region, None);
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let text = "compare chlorophyll and nitrate between south and pacific vs atlantic";
        assert_eq!(extract(text), extract(text));
        assert_eq!(
            extract(text).comparison_regions,
            Some(vec![
                "Southern Ocean".to_string(),
                "Pacific Ocean".to_string(),
                "Atlantic Ocean".to_string()
            ])
        );
    }
}
