//! Rendering of compiled templates.

use crate::template::compiler::{CompiledTemplate, Placeholder, TemplateToken};
use chrono::{Datelike, NaiveDate};
use std::fmt::Write;

/// Inputs for one rendering pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderContext<'a> {
    /// Calendar date that also selected the counter period.
    pub date: NaiveDate,
    /// Sequence value to print (allocated or hypothetical next).
    pub sequence: u64,
    /// Short tenant code for `{{TENANT}}`; renders empty when absent.
    pub tenant_code: Option<&'a str>,
}

impl CompiledTemplate {
    /// Renders the final reference number.
    ///
    /// Sequence values wider than the configured padding are printed in
    /// full, never truncated.
    pub fn render(&self, context: &RenderContext<'_>) -> String {
        let mut out = String::with_capacity(self.source().len() + self.sequence_width());
        for token in self.tokens() {
            match token {
                TemplateToken::Literal(text) => out.push_str(text),
                TemplateToken::Placeholder(placeholder) => {
                    write_placeholder(&mut out, *placeholder, context)
                }
            }
        }
        out
    }
}

fn write_placeholder(out: &mut String, placeholder: Placeholder, context: &RenderContext<'_>) {
    let date = context.date;
    // Writing into a String cannot fail.
    let _ = match placeholder {
        Placeholder::Year4 => write!(out, "{:04}", date.year()),
        Placeholder::Year2 => write!(out, "{:02}", date.year().rem_euclid(100)),
        Placeholder::Month => write!(out, "{:02}", date.month()),
        Placeholder::Day => write!(out, "{:02}", date.day()),
        Placeholder::Sequence { width } => write!(out, "{:0width$}", context.sequence),
        Placeholder::TenantCode => {
            out.push_str(context.tenant_code.unwrap_or_default());
            Ok(())
        }
    };
}
