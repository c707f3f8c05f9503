use crate::estimator::calculator::EstimateResult;
use crate::i18n::Locale;
use url::Url;

/// Value of the `source` query parameter on consult links
pub const HANDOFF_SOURCE: &str = "estimator";

/// Formats whole-unit prices for a locale and currency
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceFormatter {
    locale: Locale,
    currency: String,
}

impl PriceFormatter {
    pub fn new(locale: Locale, currency: impl Into<String>) -> Self {
        Self {
            locale,
            currency: currency.into().to_uppercase(),
        }
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    /// e.g. `11.220.000 ₫` (vi) or `$11,220,000` (en)
    pub fn format(&self, amount: i64) -> String {
        match self.locale {
            Locale::Vi => {
                let digits = group_digits(amount, '.');
                format!("{} {}", digits, self.symbol())
            }
            Locale::En => {
                let digits = group_digits(amount, ',');
                match self.currency.as_str() {
                    "USD" | "EUR" => {
                        if let Some(unsigned) = digits.strip_prefix('-') {
                            format!("-{}{}", self.symbol(), unsigned)
                        } else {
                            format!("{}{}", self.symbol(), digits)
                        }
                    }
                    _ => format!("{} {}", digits, self.currency),
                }
            }
        }
    }

    fn symbol(&self) -> &str {
        match self.currency.as_str() {
            "VND" => "₫",
            "USD" => "$",
            "EUR" => "€",
            other => other,
        }
    }
}

fn group_digits(amount: i64, separator: char) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(separator);
        }
        grouped.push(ch);
    }
    if amount < 0 {
        grouped.insert(0, '-');
    }
    grouped
}

/// Hands a finished estimate off to the lead-capture page
#[derive(Debug, Clone)]
pub struct Handoff {
    consult_url: Url,
    formatter: PriceFormatter,
}

impl Handoff {
    pub fn new(consult_url: Url, formatter: PriceFormatter) -> Self {
        Self {
            consult_url,
            formatter,
        }
    }

    pub fn formatter(&self) -> &PriceFormatter {
        &self.formatter
    }

    pub fn display_price(&self, result: &EstimateResult) -> String {
        self.formatter.format(result.estimated_price)
    }

    /// Consult page URL carrying the estimate as query parameters.
    ///
    /// Existing query parameters on the configured URL are preserved.
    pub fn consult_link(&self, result: &EstimateResult) -> Url {
        let mut url = self.consult_url.clone();
        url.query_pairs_mut()
            .append_pair("project_type", &result.project_type_name)
            .append_pair("pages", &result.pages.to_string())
            .append_pair("features", &result.feature_names.join(","))
            .append_pair("complexity", &result.complexity_label)
            .append_pair("timeline", &result.timeline_label)
            .append_pair("estimated_price", &result.estimated_price.to_string())
            .append_pair("currency", self.formatter.currency())
            .append_pair("source", HANDOFF_SOURCE);
        url
    }
}
