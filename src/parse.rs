use regex::Regex;

/// Regex-backed normalizers for the raw strings the extractors pull out
/// of product markup. Prices arrive as "12,345원", review counts as
/// "(1,234)", ratings either as plain numbers or as a star-widget style
/// attribute like "background-position: 80%".
pub struct FieldParser {
    digits_regex: Regex,
    percent_regex: Regex,
}

impl Default for FieldParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldParser {
    pub fn new() -> Self {
        FieldParser {
            digits_regex: Regex::new(r"\d+").unwrap(),
            percent_regex: Regex::new(r"background-position\s*:\s*(\d+(?:\.\d+)?)%").unwrap(),
        }
    }

    /// "12,345원" -> 12345, "" -> 0. Smallest currency unit, no subunit.
    pub fn parse_price(&self, text: &str) -> u64 {
        self.first_digit_run(text).unwrap_or(0)
    }

    /// "(1,234)" -> 1234, "상품평 567개" -> 567, no digits -> 0.
    pub fn parse_count(&self, text: &str) -> u32 {
        self.first_digit_run(text).unwrap_or(0).min(u32::MAX as u64) as u32
    }

    /// Accepts either a plain rating ("4.5") or the star widget's CSS
    /// ("background-position: 80%", a 100%-wide 5-star track, so percent
    /// maps linearly onto 0-5). Unparsable input yields 0.0.
    pub fn parse_rating(&self, text: &str) -> f32 {
        if let Some(captures) = self.percent_regex.captures(text) {
            if let Ok(percent) = captures[1].parse::<f32>() {
                return (percent / 20.0).clamp(0.0, 5.0);
            }
        }

        match text.trim().parse::<f32>() {
            Ok(value) => value.clamp(0.0, 5.0),
            Err(_) => 0.0,
        }
    }

    // Thousands separators are stripped first so "1,299,000" reads as
    // one run, then the first run of digits wins.
    fn first_digit_run(&self, text: &str) -> Option<u64> {
        let cleaned = text.replace(',', "");
        let matched = self.digits_regex.find(&cleaned)?;
        matched.as_str().parse::<u64>().ok()
    }
}
