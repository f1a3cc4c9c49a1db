mod common;

use common::{UnavailableSheet, VIDEO_COL, fixture_sheet, layout};
use delivery_verification::gateway::{MemoryFileStore, SheetGateway};
use delivery_verification::{
    CustomerSheet, DeliveryError, DeliveryUpdater, Item, ProofUploader, VideoLinkUpdater,
};
use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;

fn quantities(pairs: &[(&str, u32)]) -> HashMap<String, u32> {
    pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

#[tokio::test]
async fn confirmed_quantities_show_up_in_the_next_lookup() {
    let sheet = fixture_sheet();
    let deliveries = DeliveryUpdater::new(sheet.clone(), layout());
    let customers = CustomerSheet::new(sheet.clone(), layout());

    deliveries
        .update("REQ1", &quantities(&[("BOX", 3)]))
        .await
        .unwrap();

    let record = customers.resolve("REQ1").await.unwrap().unwrap();
    assert_eq!(record.items[0].received, 3);
    // Omitted keys are written as zero
    assert_eq!(sheet.cell(5, 54).as_deref(), Some("3"));
    assert_eq!(sheet.cell(5, 55).as_deref(), Some("0"));
}

#[tokio::test]
async fn item_keys_match_headers_loosely() {
    let sheet = fixture_sheet();
    let deliveries = DeliveryUpdater::new(sheet.clone(), layout());
    let customers = CustomerSheet::new(sheet.clone(), layout());

    deliveries
        .update(" req2", &quantities(&[(" tape ", 4), ("Glue", 9)]))
        .await
        .unwrap();

    let record = customers.resolve("REQ2").await.unwrap().unwrap();
    assert_eq!(
        record.items,
        vec![Item {
            name: "Tape".to_string(),
            sent: 5,
            received: 4,
        }]
    );
    // Only the two received columns are touched
    assert_eq!(sheet.cell(6, 56), None);
    // Other rows are left alone
    assert_eq!(sheet.cell(5, 54).as_deref(), Some("1"));
}

#[tokio::test]
async fn non_product_columns_keep_their_values() {
    let sheet = fixture_sheet();
    sheet.set(3, 25, "Pincode");
    sheet.set(3, 56, "Pincode");
    sheet.set(5, 25, "560001");
    sheet.set(5, 56, "560001");
    let deliveries = DeliveryUpdater::new(sheet.clone(), layout());
    let customers = CustomerSheet::new(sheet.clone(), layout());

    deliveries
        .update("REQ1", &quantities(&[("Box", 3), ("Pincode", 0)]))
        .await
        .unwrap();

    assert_eq!(sheet.cell(5, 54).as_deref(), Some("3"));
    assert_eq!(sheet.cell(5, 55).as_deref(), Some("0"));
    assert_eq!(sheet.cell(5, 56).as_deref(), Some("560001"));
    let record = customers.resolve("REQ1").await.unwrap().unwrap();
    assert_eq!(
        record.items,
        vec![Item {
            name: "Box".to_string(),
            sent: 3,
            received: 3,
        }]
    );
}

#[tokio::test]
async fn unknown_cid_is_not_found_and_writes_nothing() {
    let sheet = fixture_sheet();
    let deliveries = DeliveryUpdater::new(sheet.clone(), layout());

    let result = deliveries.update("REQ9", &quantities(&[("Box", 1)])).await;

    assert!(matches!(result, Err(DeliveryError::NotFound(cid)) if cid == "REQ9"));
    assert_eq!(sheet.cell(5, 54).as_deref(), Some("1"));
}

#[tokio::test]
async fn gateway_failure_is_distinct_from_not_found() {
    let deliveries = DeliveryUpdater::new(Arc::new(UnavailableSheet), layout());

    let result = deliveries.update("REQ1", &quantities(&[("Box", 1)])).await;
    assert!(matches!(result, Err(DeliveryError::Gateway(_))));
}

#[tokio::test]
async fn video_link_lands_in_the_headed_column() {
    let sheet = fixture_sheet();
    let links = VideoLinkUpdater::new(sheet.clone(), layout());

    links
        .update("req2", "https://drive.google.com/file/d/abc/view?usp=sharing")
        .await
        .unwrap();

    assert_eq!(
        sheet.cell(6, VIDEO_COL).as_deref(),
        Some("https://drive.google.com/file/d/abc/view?usp=sharing")
    );
    assert_eq!(sheet.cell(5, VIDEO_COL), None);
}

#[tokio::test]
async fn video_link_without_header_is_a_configuration_error() {
    let sheet = fixture_sheet();
    sheet.update_cell(3, VIDEO_COL, "").await.unwrap();
    let links = VideoLinkUpdater::new(sheet.clone(), layout());

    let result = links.update("REQ1", "https://example.com/v").await;
    assert!(matches!(result, Err(DeliveryError::Configuration(_))));
}

#[tokio::test]
async fn published_proof_is_public_and_linked() {
    let sheet = fixture_sheet();
    let store = Arc::new(MemoryFileStore::new());
    let uploader = ProofUploader::new(store.clone(), VideoLinkUpdater::new(sheet.clone(), layout()))
        .with_folder(Some("proofs".to_string()));

    let mut video = tempfile::NamedTempFile::new().unwrap();
    video.write_all(b"not really an mp4").unwrap();

    let url = uploader
        .publish("req1", video.path(), "video/mp4")
        .await
        .unwrap();

    let id = url
        .strip_prefix("https://drive.google.com/file/d/")
        .and_then(|rest| rest.strip_suffix("/view?usp=sharing"))
        .expect("shareable link format");
    let object = store.object(id).unwrap();
    assert!(object.public);
    assert_eq!(object.metadata.name, "REQ1_proof.mp4");
    assert_eq!(object.metadata.parents, vec!["proofs".to_string()]);
    assert_eq!(object.bytes, b"not really an mp4");
    assert_eq!(sheet.cell(5, VIDEO_COL), Some(url));
}

#[tokio::test]
async fn proof_for_unknown_cid_reports_not_found() {
    let sheet = fixture_sheet();
    let store = Arc::new(MemoryFileStore::new());
    let uploader = ProofUploader::new(store, VideoLinkUpdater::new(sheet.clone(), layout()));

    let video = tempfile::NamedTempFile::new().unwrap();
    let result = uploader.publish("REQ9", video.path(), "video/mp4").await;

    assert!(matches!(result, Err(DeliveryError::NotFound(_))));
}
