use docnum_core::db::open_db_in_memory;
use docnum_core::{
    DocumentType, RepoError, SqliteTemplateRepository, TemplateCompileError, TemplateSource,
    DEFAULT_PURCHASE_ORDER_FOLLOWUP_TEMPLATE,
};

#[test]
fn set_and_read_active_template() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTemplateRepository::try_new(&conn).unwrap();

    assert_eq!(
        repo.active_template("T1", DocumentType::Invoice).unwrap(),
        None
    );

    repo.set_template("T1", DocumentType::Invoice, "FAC-{{YYYY}}-{{SEQ:4}}")
        .unwrap();
    assert_eq!(
        repo.active_template("T1", DocumentType::Invoice)
            .unwrap()
            .as_deref(),
        Some("FAC-{{YYYY}}-{{SEQ:4}}")
    );
    assert_eq!(repo.active_template("T2", DocumentType::Invoice).unwrap(), None);
    assert_eq!(repo.active_template("T1", DocumentType::Quote).unwrap(), None);
}

#[test]
fn set_template_replaces_previous_text() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTemplateRepository::try_new(&conn).unwrap();

    repo.set_template("T1", DocumentType::Quote, "Q-{{SEQ}}").unwrap();
    repo.set_template("T1", DocumentType::Quote, "QT/{{YY}}/{{SEQ:6}}")
        .unwrap();

    let records = repo.list_templates("T1").unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].template, "QT/{{YY}}/{{SEQ:6}}");
}

#[test]
fn invalid_template_is_rejected_and_not_stored() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTemplateRepository::try_new(&conn).unwrap();

    let err = repo
        .set_template("T1", DocumentType::Invoice, "FAC-{{FOO}}")
        .unwrap_err();
    match err {
        RepoError::InvalidTemplate {
            document_type,
            error,
        } => {
            assert_eq!(document_type, DocumentType::Invoice);
            assert!(matches!(
                error,
                TemplateCompileError::UnknownPlaceholder { .. }
            ));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(
        repo.active_template("T1", DocumentType::Invoice).unwrap(),
        None
    );
}

#[test]
fn ensure_default_template_only_fills_gaps() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTemplateRepository::try_new(&conn).unwrap();

    let inserted = repo
        .ensure_default_template(
            "T1",
            DocumentType::PurchaseOrderFollowup,
            DEFAULT_PURCHASE_ORDER_FOLLOWUP_TEMPLATE,
        )
        .unwrap();
    assert!(inserted);

    repo.set_template("T2", DocumentType::PurchaseOrderFollowup, "CUSTOM-{{SEQ}}")
        .unwrap();
    let inserted = repo
        .ensure_default_template(
            "T2",
            DocumentType::PurchaseOrderFollowup,
            DEFAULT_PURCHASE_ORDER_FOLLOWUP_TEMPLATE,
        )
        .unwrap();
    assert!(!inserted);

    assert_eq!(
        repo.active_template("T1", DocumentType::PurchaseOrderFollowup)
            .unwrap()
            .as_deref(),
        Some("PAFO-{{YYYY}}-{{SEQ:5}}")
    );
    assert_eq!(
        repo.active_template("T2", DocumentType::PurchaseOrderFollowup)
            .unwrap()
            .as_deref(),
        Some("CUSTOM-{{SEQ}}")
    );
}

#[test]
fn list_templates_is_sorted_and_tenant_scoped() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTemplateRepository::try_new(&conn).unwrap();

    repo.set_template("T1", DocumentType::Quote, "Q-{{SEQ}}").unwrap();
    repo.set_template("T1", DocumentType::CreditNote, "CN-{{SEQ}}")
        .unwrap();
    repo.set_template("T2", DocumentType::Invoice, "I-{{SEQ}}").unwrap();

    let kinds: Vec<DocumentType> = repo
        .list_templates("T1")
        .unwrap()
        .into_iter()
        .map(|record| record.document_type)
        .collect();
    assert_eq!(kinds, vec![DocumentType::CreditNote, DocumentType::Quote]);
}

#[test]
fn remove_template_reports_whether_a_row_existed() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTemplateRepository::try_new(&conn).unwrap();

    repo.set_template("T1", DocumentType::Invoice, "I-{{SEQ}}").unwrap();
    assert!(repo.remove_template("T1", DocumentType::Invoice).unwrap());
    assert!(!repo.remove_template("T1", DocumentType::Invoice).unwrap());
}

#[test]
fn corrupted_document_type_code_is_reported() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO numbering_templates (tenant_id, document_type, template)
         VALUES ('T1', 'purchase_order', 'PO-{{SEQ}}');",
        [],
    )
    .unwrap();
    let repo = SqliteTemplateRepository::try_new(&conn).unwrap();

    let err = repo.list_templates("T1").unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(_)));
}

#[test]
fn template_record_serializes_with_document_type_code() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTemplateRepository::try_new(&conn).unwrap();
    repo.set_template("T1", DocumentType::SupplierCreditNote, "SCN-{{SEQ}}")
        .unwrap();

    let record = repo.list_templates("T1").unwrap().remove(0);
    let json = serde_json::to_value(&record).unwrap();
    assert_eq!(json["tenant_id"], "T1");
    assert_eq!(json["document_type"], "supplier-credit-note");
    assert_eq!(json["template"], "SCN-{{SEQ}}");
}
