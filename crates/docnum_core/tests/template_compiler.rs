use docnum_core::{
    compile_template, PeriodGranularity, Placeholder, TemplateCompileError, TemplateToken,
    DEFAULT_SEQUENCE_WIDTH,
};

#[test]
fn compiles_literals_and_placeholders_in_order() {
    let template = compile_template("PAFO-{{YYYY}}-{{SEQ:5}}").unwrap();

    assert_eq!(
        template.tokens(),
        &[
            TemplateToken::Literal("PAFO-".to_string()),
            TemplateToken::Placeholder(Placeholder::Year4),
            TemplateToken::Literal("-".to_string()),
            TemplateToken::Placeholder(Placeholder::Sequence { width: 5 }),
        ]
    );
    assert_eq!(template.sequence_width(), 5);
    assert_eq!(template.granularity(), PeriodGranularity::Yearly);
    assert_eq!(template.source(), "PAFO-{{YYYY}}-{{SEQ:5}}");
}

#[test]
fn bare_sequence_uses_default_width() {
    let template = compile_template("{{SEQ}}").unwrap();
    assert_eq!(template.sequence_width(), DEFAULT_SEQUENCE_WIDTH);
    assert_eq!(template.granularity(), PeriodGranularity::Perpetual);
}

#[test]
fn single_braces_and_punctuation_stay_literal() {
    let template = compile_template("{A}/[{{TENANT}}]#{{SEQ}}.").unwrap();
    assert_eq!(
        template.tokens(),
        &[
            TemplateToken::Literal("{A}/[".to_string()),
            TemplateToken::Placeholder(Placeholder::TenantCode),
            TemplateToken::Literal("]#".to_string()),
            TemplateToken::Placeholder(Placeholder::Sequence { width: 4 }),
            TemplateToken::Literal(".".to_string()),
        ]
    );
    assert!(template.uses_tenant_code());
}

#[test]
fn rejects_duplicate_sequence_with_position() {
    assert_eq!(
        compile_template("{{SEQ}}-{{SEQ}}"),
        Err(TemplateCompileError::DuplicateSequence { position: 8 })
    );
}

#[test]
fn rejects_missing_sequence() {
    assert_eq!(
        compile_template("FAC-{{YYYY}}"),
        Err(TemplateCompileError::MissingSequence)
    );
    assert_eq!(compile_template(""), Err(TemplateCompileError::MissingSequence));
}

#[test]
fn rejects_unknown_placeholder_with_name_and_position() {
    let err = compile_template("X-{{FOO}}-{{SEQ}}").unwrap_err();
    assert_eq!(
        err,
        TemplateCompileError::UnknownPlaceholder {
            name: "FOO".to_string(),
            position: 2,
        }
    );
    assert!(err.to_string().contains("FOO"));
    assert!(err.to_string().contains("position 2"));
}

#[test]
fn rejects_unmatched_delimiters() {
    assert_eq!(
        compile_template("FAC-{{SEQ"),
        Err(TemplateCompileError::UnmatchedOpen { position: 4 })
    );
    assert_eq!(
        compile_template("FAC-SEQ}}"),
        Err(TemplateCompileError::UnmatchedClose { position: 7 })
    );
    assert_eq!(
        compile_template("}}{{SEQ}}"),
        Err(TemplateCompileError::UnmatchedClose { position: 0 })
    );
    assert_eq!(
        compile_template("{{YYYY {{SEQ}}"),
        Err(TemplateCompileError::UnmatchedOpen { position: 0 })
    );
}

#[test]
fn rejects_bad_sequence_widths() {
    for width in ["0", "-1", "+5", "11", "abc", "2.5", "0x5"] {
        let text = format!("{{{{SEQ:{width}}}}}");
        assert_eq!(
            compile_template(&text),
            Err(TemplateCompileError::InvalidSequenceWidth {
                argument: width.to_string(),
                position: 0,
            }),
            "{text}"
        );
    }
    assert_eq!(compile_template("{{SEQ:10}}").unwrap().sequence_width(), 10);
    assert_eq!(compile_template("{{SEQ:1}}").unwrap().sequence_width(), 1);
}

#[test]
fn rejects_arguments_on_date_placeholders() {
    assert_eq!(
        compile_template("{{YYYY:2}}-{{SEQ}}"),
        Err(TemplateCompileError::UnexpectedArgument {
            name: "YYYY",
            argument: "2".to_string(),
            position: 0,
        })
    );
}

#[test]
fn rejects_empty_placeholder() {
    assert_eq!(
        compile_template("A{{ }}{{SEQ}}"),
        Err(TemplateCompileError::EmptyPlaceholder { position: 1 })
    );
}
