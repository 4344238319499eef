//! Period resolution.
//!
//! The sequence resets at the finest date unit the template prints, so a
//! visible number is never ambiguous: `{{YYYY}}-{{SEQ}}` restarts every year,
//! `{{YY}}{{MM}}-{{SEQ}}` every month, and a template without date
//! placeholders counts forever.

use crate::model::counter::PeriodKey;
use crate::template::compiler::{CompiledTemplate, Placeholder, TemplateToken};
use chrono::NaiveDate;

/// Reset cadence derived from a template's date placeholders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PeriodGranularity {
    /// No date placeholder; one counter for all time.
    Perpetual,
    /// `YYYY` or `YY` present; key `YYYY`.
    Yearly,
    /// `MM` present; key `YYYY-MM`.
    Monthly,
    /// `DD` present; key `YYYY-MM-DD`.
    Daily,
}

impl PeriodGranularity {
    pub(crate) fn of_tokens(tokens: &[TemplateToken]) -> Self {
        tokens
            .iter()
            .filter_map(|token| match token {
                TemplateToken::Placeholder(Placeholder::Year4 | Placeholder::Year2) => {
                    Some(Self::Yearly)
                }
                TemplateToken::Placeholder(Placeholder::Month) => Some(Self::Monthly),
                TemplateToken::Placeholder(Placeholder::Day) => Some(Self::Daily),
                _ => None,
            })
            .max()
            .unwrap_or(Self::Perpetual)
    }

    /// Formats the period key that `date` falls into.
    pub fn key_for(self, date: NaiveDate) -> PeriodKey {
        match self {
            Self::Perpetual => PeriodKey::perpetual(),
            Self::Yearly => PeriodKey::new(date.format("%Y").to_string()),
            Self::Monthly => PeriodKey::new(date.format("%Y-%m").to_string()),
            Self::Daily => PeriodKey::new(date.format("%Y-%m-%d").to_string()),
        }
    }
}

/// Resolves the counter period for `template` on the given calendar date.
pub fn resolve_period_key(template: &CompiledTemplate, date: NaiveDate) -> PeriodKey {
    template.granularity().key_for(date)
}

#[cfg(test)]
mod tests {
    use super::{resolve_period_key, PeriodGranularity};
    use crate::template::compile_template;
    use chrono::NaiveDate;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn finest_date_placeholder_decides_the_key() {
        let on = date(2024, 3, 7);
        let cases = [
            ("FAC-{{SEQ}}", "ALL"),
            ("FAC-{{YYYY}}-{{SEQ}}", "2024"),
            ("FAC-{{YY}}-{{SEQ}}", "2024"),
            ("FAC-{{YY}}{{MM}}-{{SEQ}}", "2024-03"),
            ("{{DD}}/{{SEQ}}", "2024-03-07"),
            ("{{MM}}{{YYYY}}{{DD}}-{{SEQ}}", "2024-03-07"),
        ];

        for (text, expected) in cases {
            let template = compile_template(text).unwrap();
            assert_eq!(resolve_period_key(&template, on).as_str(), expected, "{text}");
        }
    }

    #[test]
    fn granularity_is_ordered_from_coarse_to_fine() {
        assert!(PeriodGranularity::Perpetual < PeriodGranularity::Yearly);
        assert!(PeriodGranularity::Yearly < PeriodGranularity::Monthly);
        assert!(PeriodGranularity::Monthly < PeriodGranularity::Daily);
    }
}
