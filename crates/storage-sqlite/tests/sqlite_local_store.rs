use std::sync::Arc;

use boracrm_core::contacts::{Contact, NewContact};
use boracrm_core::deals::{Deal, DealStage};
use boracrm_core::optimistic::OptimisticCollection;
use boracrm_core::storage::{LocalStoreBackend, StorageConfig, StorageFacade};
use boracrm_core::{Entity, EntityKind};
use boracrm_storage_sqlite::SqliteLocalStore;
use chrono::NaiveDate;

fn facade(store: SqliteLocalStore) -> Arc<StorageFacade> {
    Arc::new(StorageFacade::new(
        Arc::new(store),
        None,
        StorageConfig::immediate(),
    ))
}

#[tokio::test]
async fn saved_collections_survive_reopening_the_database() {
    let dir = tempfile::tempdir().unwrap();

    let mut contacts = Contact::seed();
    contacts.push(
        Contact::create_with_id(
            "c99",
            NewContact {
                name: "Dana Reyes".to_string(),
                email: "dana@example.com".to_string(),
                company: Some("Northwind".to_string()),
                ..NewContact::default()
            },
            NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(),
        )
        .unwrap(),
    );

    {
        let facade = facade(SqliteLocalStore::open(dir.path()).unwrap());
        facade.save_contacts(&contacts).await.unwrap();
    }

    let reopened = facade(SqliteLocalStore::open(dir.path()).unwrap());
    let loaded = reopened.load_contacts().await;
    assert_eq!(loaded.len(), 4);
    assert_eq!(loaded, contacts);
    // Deals were never written, so they still come from the seed.
    assert_eq!(reopened.load_deals().await, Deal::seed());
}

#[tokio::test]
async fn concurrent_keyed_upserts_both_survive() {
    let dir = tempfile::tempdir().unwrap();
    let facade = facade(SqliteLocalStore::open(dir.path()).unwrap());

    let mut first = Deal::seed()[0].clone();
    first.id = "d10".to_string();
    let mut second = Deal::seed()[1].clone();
    second.id = "d11".to_string();
    let moved = Deal::seed()[2].with_stage(DealStage::Negotiation);

    let (a, b, c) = futures::join!(
        facade.upsert(&first),
        facade.upsert(&second),
        facade.upsert(&moved)
    );
    a.unwrap();
    b.unwrap();
    c.unwrap();

    let stored = facade.load_deals().await;
    assert_eq!(stored.len(), 6);
    assert!(stored.iter().any(|d| d.id == "d10"));
    assert!(stored.iter().any(|d| d.id == "d11"));
    assert_eq!(
        stored.iter().find(|d| d.id == "d3").unwrap().stage,
        DealStage::Negotiation
    );
}

#[tokio::test]
async fn corrupt_row_falls_back_to_seed() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteLocalStore::open(dir.path()).unwrap();
    store
        .put(EntityKind::Deals.storage_key(), "not json".to_string())
        .await
        .unwrap();

    assert_eq!(facade(store).load_deals().await, Deal::seed());
}

#[tokio::test]
async fn optimistic_moves_land_in_sqlite() {
    let dir = tempfile::tempdir().unwrap();
    let facade = facade(SqliteLocalStore::open(dir.path()).unwrap());
    let deals = OptimisticCollection::<Deal>::load(Arc::clone(&facade)).await;

    deals
        .move_to_stage("d4", DealStage::Qualified)
        .unwrap()
        .persisted()
        .await
        .unwrap();
    deals.remove("d3").unwrap().persisted().await.unwrap();

    let stored = facade.load_deals().await;
    let ids: Vec<&str> = stored.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec!["d1", "d2", "d4"]);
    assert_eq!(stored[2].stage, DealStage::Qualified);
}
