mod common;

use common::{make_pdf, order, setup, OrderPayload};
use paperwork::model::Direction;
use paperwork::pdf::Attachment;
use std::fs;

#[test]
fn compose_artifact_writes_file_and_repoints_record() {
    let (_dir, workspace) = setup();
    let store = workspace.collection::<OrderPayload>("purchase-orders", "PO");
    let record = store.create(order("Acme Metals", 2, None)).unwrap();

    let updated = workspace
        .compose_artifact(&store, record.id, Vec::new())
        .unwrap();

    let filename = updated.artifact_filename.clone().expect("artifact filename");
    assert!(filename.starts_with("PO00001_Acme_Metals_"));
    assert!(filename.ends_with(".pdf"));
    assert_eq!(updated.artifact_language, Some(Direction::Ltr));

    let path = store.spec().artifact_dir.join(&filename);
    let bytes = fs::read(&path).unwrap();
    assert!(bytes.starts_with(b"%PDF"));
}

#[test]
fn recompose_replaces_the_previous_artifact() {
    let (_dir, workspace) = setup();
    let store = workspace.collection::<OrderPayload>("purchase-orders", "PO");
    let record = store.create(order("Acme", 1, None)).unwrap();

    let first = workspace
        .compose_artifact(&store, record.id, Vec::new())
        .unwrap();
    let first_name = first.artifact_filename.clone().unwrap();

    // Change the counterparty so the replacement gets a different filename
    store
        .update(record.id, |r| r.payload.supplier = "Besco Steel".to_string())
        .unwrap();
    let second = workspace
        .compose_artifact(
            &store,
            record.id,
            vec![Attachment::Bytes(make_pdf(1, 612.0, 792.0))],
        )
        .unwrap();
    let second_name = second.artifact_filename.clone().unwrap();

    assert_ne!(first_name, second_name);
    assert!(second_name.starts_with("PO00001_Besco_Steel_"));
    let dir = &store.spec().artifact_dir;
    assert!(!dir.join(&first_name).exists(), "previous artifact not removed");
    assert!(dir.join(&second_name).exists());
}

#[test]
fn failed_compose_leaves_previous_artifact_untouched() {
    let (_dir, workspace) = setup();
    let store = workspace.collection::<OrderPayload>("purchase-orders", "PO");
    let record = store.create(order("Acme", 1, None)).unwrap();

    let first = workspace
        .compose_artifact(&store, record.id, Vec::new())
        .unwrap();
    let first_name = first.artifact_filename.clone().unwrap();

    let bogus = Attachment::Bytes(b"not a pdf".to_vec());
    assert!(workspace
        .compose_artifact(&store, record.id, vec![bogus])
        .is_err());

    // Record still points at the intact previous artifact
    let reloaded = store.get(record.id).unwrap();
    assert_eq!(reloaded.artifact_filename.as_deref(), Some(first_name.as_str()));
    assert!(store.spec().artifact_dir.join(&first_name).exists());
}
