//! Property-based tests for the template language.

use chrono::NaiveDate;
use docnum_core::{
    compile_template, PeriodGranularity, RenderContext, TemplateCompileError,
    MAX_SEQUENCE_WIDTH,
};
use proptest::prelude::*;

const KNOWN_NAMES: &[&str] = &["YYYY", "YY", "MM", "DD", "SEQ", "TENANT"];

fn any_date() -> impl Strategy<Value = NaiveDate> {
    (1970i32..2200, 1u32..=12, 1u32..=28)
        .prop_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap())
}

proptest! {
    #[test]
    fn sequence_is_padded_but_never_truncated(
        width in 1usize..=MAX_SEQUENCE_WIDTH,
        sequence in any::<u64>(),
        date in any_date(),
    ) {
        let template = compile_template(&format!("{{{{SEQ:{width}}}}}")).unwrap();
        let rendered = template.render(&RenderContext { date, sequence, tenant_code: None });

        prop_assert_eq!(rendered.parse::<u64>().unwrap(), sequence);
        prop_assert_eq!(rendered.len(), width.max(sequence.to_string().len()));
    }

    #[test]
    fn literal_text_is_preserved_verbatim(
        prefix in "[A-Za-z0-9 ./_#-]{0,16}",
        suffix in "[A-Za-z0-9 ./_#-]{0,16}",
        sequence in 1u64..100_000,
        date in any_date(),
    ) {
        let template = compile_template(&format!("{prefix}{{{{SEQ:5}}}}{suffix}")).unwrap();
        let rendered = template.render(&RenderContext { date, sequence, tenant_code: None });

        prop_assert!(rendered.starts_with(&prefix));
        prop_assert!(rendered.ends_with(&suffix));
        prop_assert_eq!(template.granularity(), PeriodGranularity::Perpetual);
    }

    #[test]
    fn unknown_names_are_rejected(name in "[A-Z]{1,8}") {
        prop_assume!(!KNOWN_NAMES.contains(&name.as_str()));

        let err = compile_template(&format!("X{{{{{name}}}}}{{{{SEQ}}}}")).unwrap_err();
        prop_assert_eq!(err, TemplateCompileError::UnknownPlaceholder { name, position: 1 });
    }

    #[test]
    fn rendered_date_fields_match_the_period_key(date in any_date(), sequence in 1u64..1000) {
        let template = compile_template("{{YYYY}}-{{MM}}-{{DD}}/{{SEQ:3}}").unwrap();
        let rendered = template.render(&RenderContext { date, sequence, tenant_code: None });
        let key = template.granularity().key_for(date);

        prop_assert!(rendered.starts_with(key.as_str()));
    }
}
