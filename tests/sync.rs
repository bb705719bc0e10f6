
use std::time::Duration;

use contacts_sync::client::Client;
use contacts_sync::destination::{AddressBook, LocalTable, VcfFile};
use contacts_sync::destination::local_table::FRIENDS_TABLE_SCHEMA;
use contacts_sync::error::ErrorKind;
use contacts_sync::source::{JsonFileSource, VcfFileSource};
use contacts_sync::sync::sync_progress::SyncProgress;
use contacts_sync::sync::RunState;
use contacts_sync::traits::Reconciler;
use contacts_sync::vcard;
use contacts_sync::Orchestrator;

use scenarii::FakeAddressBook;

fn address_book(url: &str) -> AddressBook {
    let client = Client::new(url, "john", "s3cr3t", Duration::from_secs(5)).unwrap();
    AddressBook::new(client)
}

#[tokio::test]
async fn test_carddav_full_replace() {
    let _ = env_logger::builder().is_test(true).try_init();

    let book = FakeAddressBook::new();
    book.insert("stale.vcf", "BEGIN:VCARD\r\nVERSION:3.0\r\nFN:Old friend\r\nEND:VCARD\r\n");
    let server = book.serve().await;

    let dir = tempfile::tempdir().unwrap();
    let export = scenarii::write_json_export(dir.path(), &scenarii::contacts());
    let mut destination = address_book(&scenarii::collection_url(&server));
    let mut orchestrator = Orchestrator::new(JsonFileSource::new(&export));

    let report = orchestrator.run(&mut destination, &mut SyncProgress::new()).await.unwrap();
    assert_eq!(orchestrator.state(), RunState::Done);
    assert_eq!(report.converted, 2);
    assert_eq!(report.imported, 2);
    assert_eq!(report.skipped, 1);
    assert!(report.errors.is_empty(), "unexpected errors: {:?}", report.errors);
    assert_eq!(book.paths(), vec!["/dav/ab/ada-1.vcf".to_string(), "/dav/ab/charles-2.vcf".to_string()]);

    let uploaded = book.get("ada-1.vcf").unwrap();
    assert!(uploaded.starts_with("BEGIN:VCARD\r\nVERSION:3.0\r\nFN:Ada Lovelace\r\n"));
    assert!(uploaded.contains("NOTE:Met at the Royal Society\\, London\\nCall back on Monday\r\n"));

    // Syncing the same contacts again leaves the collection in the same state
    orchestrator.reset().unwrap();
    let report = orchestrator.run(&mut destination, &mut SyncProgress::new()).await.unwrap();
    assert_eq!(report.imported, 2);
    assert!(report.errors.is_empty());
    assert_eq!(book.paths().len(), 2);
}

#[tokio::test]
async fn test_partial_upload_failure() {
    let _ = env_logger::builder().is_test(true).try_init();

    let book = FakeAddressBook::new().failing_put("FN:Charles Babbage");
    let server = book.serve().await;

    let dir = tempfile::tempdir().unwrap();
    let export = scenarii::write_json_export(dir.path(), &scenarii::named_contacts());
    let mut destination = address_book(&scenarii::collection_url(&server));
    let mut orchestrator = Orchestrator::new(JsonFileSource::new(&export));

    let report = orchestrator.run(&mut destination, &mut SyncProgress::new()).await.unwrap();
    assert_eq!(orchestrator.state(), RunState::Done);
    assert_eq!(report.imported, 1);
    assert_eq!(report.skipped, 0);
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].contains("500"));
    assert_eq!(book.paths(), vec!["/dav/ab/ada-1.vcf".to_string()]);
}

#[tokio::test]
async fn test_refused_listing_does_not_prevent_uploads() {
    let book = FakeAddressBook::new().refusing_listing();
    book.insert("stale.vcf", "BEGIN:VCARD\r\nVERSION:3.0\r\nFN:Old friend\r\nEND:VCARD\r\n");
    let server = book.serve().await;

    let dir = tempfile::tempdir().unwrap();
    let export = scenarii::write_json_export(dir.path(), &scenarii::named_contacts());
    let mut destination = address_book(&scenarii::collection_url(&server));
    let mut orchestrator = Orchestrator::new(JsonFileSource::new(&export));

    let report = orchestrator.run(&mut destination, &mut SyncProgress::new()).await.unwrap();
    assert_eq!(report.imported, 2);
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].contains("403"));
    // Nothing has been deleted
    assert_eq!(book.paths().len(), 3);
}

#[tokio::test]
async fn test_failed_delete_does_not_stop_the_wipe() {
    let _ = env_logger::builder().is_test(true).try_init();

    let book = FakeAddressBook::new().locking("locked.vcf");
    book.insert("a-stale.vcf", "BEGIN:VCARD\r\nVERSION:3.0\r\nFN:Old friend\r\nEND:VCARD\r\n");
    book.insert("locked.vcf", "BEGIN:VCARD\r\nVERSION:3.0\r\nFN:Locked\r\nEND:VCARD\r\n");
    book.insert("z-stale.vcf", "BEGIN:VCARD\r\nVERSION:3.0\r\nFN:Older friend\r\nEND:VCARD\r\n");
    let server = book.serve().await;

    let dir = tempfile::tempdir().unwrap();
    let export = scenarii::write_json_export(dir.path(), &scenarii::named_contacts());
    let mut destination = address_book(&scenarii::collection_url(&server));
    let mut orchestrator = Orchestrator::new(JsonFileSource::new(&export));

    let report = orchestrator.run(&mut destination, &mut SyncProgress::new()).await.unwrap();
    assert_eq!(orchestrator.state(), RunState::Done);
    assert_eq!(report.imported, 2);
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].contains("423"));
    assert!(report.errors[0].contains("locked.vcf"));
    assert_eq!(book.paths(), vec![
        "/dav/ab/ada-1.vcf".to_string(),
        "/dav/ab/charles-2.vcf".to_string(),
        "/dav/ab/locked.vcf".to_string(),
    ]);
}

#[tokio::test]
async fn test_unreachable_server_fails_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let export = scenarii::write_json_export(dir.path(), &scenarii::contacts());
    let mut destination = address_book("http://127.0.0.1:1/dav/ab/");
    let mut orchestrator = Orchestrator::new(JsonFileSource::new(&export));

    let err = orchestrator.run(&mut destination, &mut SyncProgress::new()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TransportFailure);
    assert_eq!(orchestrator.state(), RunState::Failed);
}

#[tokio::test]
async fn test_missing_export_fails_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let book = FakeAddressBook::new();
    book.insert("kept.vcf", "BEGIN:VCARD\r\nVERSION:3.0\r\nFN:Kept\r\nEND:VCARD\r\n");
    let server = book.serve().await;

    let mut destination = address_book(&scenarii::collection_url(&server));
    let mut orchestrator = Orchestrator::new(JsonFileSource::new(dir.path().join("nothing.json")));

    let err = orchestrator.run(&mut destination, &mut SyncProgress::new()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::FatalSetupFailure);
    // The destination has not been touched
    assert_eq!(book.paths(), vec!["/dav/ab/kept.vcf".to_string()]);
}

#[tokio::test]
async fn test_local_table() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("friends.db");
    {
        let conn = rusqlite::Connection::open(&db_path).unwrap();
        conn.execute_batch(FRIENDS_TABLE_SCHEMA).unwrap();
        conn.execute(
            "INSERT INTO friends (friend_list_id, sip_uri, subscribe_policy, send_subscribe, vCard, presence_received)
             VALUES (1, 'sip:+33100000000@old.example', 0, 1, 'BEGIN:VCARD', 1)",
            [],
        ).unwrap();
    }

    let export = scenarii::write_json_export(dir.path(), &scenarii::contacts());
    let mut destination = LocalTable::open(&db_path, "sip.example.net").unwrap();
    let mut orchestrator = Orchestrator::new(JsonFileSource::new(&export));

    let report = orchestrator.run(&mut destination, &mut SyncProgress::new()).await.unwrap();
    assert_eq!(report.imported, 2);
    assert_eq!(report.skipped, 1);
    assert!(report.errors.is_empty(), "unexpected errors: {:?}", report.errors);

    let friends = destination.friends().unwrap();
    let uris: Vec<_> = friends.iter().map(|f| f.sip_uri.as_str()).collect();
    assert_eq!(uris, vec!["sip:+33612345678@sip.example.net", "sip:+442079460321@sip.example.net"]);
    assert!(friends[0].vcard.contains("IMPP:sip:+33612345678@sip.example.net"));
    assert!(friends[0].vcard.contains("FN:Ada Lovelace"));
    assert!(friends.iter().all(|f| f.send_subscribe && f.presence_received));
}

#[tokio::test]
async fn test_missing_database() {
    let dir = tempfile::tempdir().unwrap();
    let err = LocalTable::open(dir.path().join("friends.db"), "sip.example.net").err().unwrap();
    assert_eq!(err.kind(), ErrorKind::FatalSetupFailure);
}

#[tokio::test]
async fn test_vcf_export_and_reimport() {
    let dir = tempfile::tempdir().unwrap();
    let export = scenarii::write_json_export(dir.path(), &scenarii::contacts());
    let vcf_path = dir.path().join("contacts.vcf");

    let mut destination = VcfFile::new(&vcf_path);
    assert!(destination.name().contains("contacts.vcf"));
    let mut orchestrator = Orchestrator::new(JsonFileSource::new(&export));
    let report = orchestrator.run(&mut destination, &mut SyncProgress::new()).await.unwrap();
    assert_eq!(report.imported, 2);

    // The exported file is a valid source on its own
    let mut orchestrator = Orchestrator::new(VcfFileSource::new(&vcf_path));
    let mut second = VcfFile::new(dir.path().join("again.vcf"));
    let report = orchestrator.run(&mut second, &mut SyncProgress::new()).await.unwrap();
    assert_eq!(report.converted, 2);
    assert_eq!(report.skipped, 0);

    let first = std::fs::read_to_string(&vcf_path).unwrap();
    let again = std::fs::read_to_string(dir.path().join("again.vcf")).unwrap();
    assert_eq!(first, again);
}

#[test]
fn test_vcard_round_trip() {
    for contact in scenarii::named_contacts() {
        let record = vcard::build_from(&contact).unwrap();
        let mut parsed = vcard::parse_records(&record.to_vcard());
        assert_eq!(parsed.len(), 1);
        let parsed = parsed.remove(0).unwrap();

        assert_eq!(parsed.full_name(), record.full_name());
        assert_eq!(parsed.phones(), record.phones());
        assert_eq!(parsed.emails(), record.emails());
        assert_eq!(parsed.note(), contact.note.clone());
        assert_eq!(parsed.organization(), contact.company_name.clone());
    }
}
