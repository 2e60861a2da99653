use futures::TryStreamExt as _;
use sqlx::Executor;
use time::macros::datetime;
use translog_dal::record::CreateTranslationRecord;
use translog_dal::{ListingParams, Order, SortField};

const TEST_DATA: &str = r#"
INSERT INTO translation_records (id, original_text, translated_text, source_lang, target_lang, user_id, ip_address, model, created_at, updated_at)
VALUES (1, 'hello world', 'hola mundo', 'en', 'es', 'alice', '10.0.0.5', 'engine-a', '2026-08-01 10:00:00.0', '2026-08-01 10:00:00.0');
INSERT INTO translation_records (id, original_text, translated_text, source_lang, target_lang, user_id, ip_address, model, created_at, updated_at)
VALUES (2, 'good morning', 'buenos dias', 'en', 'es', 'alice', '10.0.0.5', 'engine-a', '2026-08-02 09:30:00.0', '2026-08-02 09:30:00.0');
INSERT INTO translation_records (id, original_text, translated_text, source_lang, target_lang, user_id, ip_address, model, created_at, updated_at)
VALUES (3, 'world peace', 'paix mondiale', 'en', 'fr', 'bob', '10.0.0.7', 'engine-b', '2026-08-03 08:00:00.0', '2026-08-03 08:00:00.0');
INSERT INTO translation_records (id, original_text, translated_text, source_lang, target_lang, user_id, ip_address, model, created_at, updated_at)
VALUES (4, 'good night', 'bonne nuit world', 'en', 'fr', NULL, NULL, NULL, '2026-08-04 23:00:00.0', '2026-08-04 23:00:00.0');
"#;

fn record(original: &str, translated: &str, user: Option<&str>) -> CreateTranslationRecord {
    CreateTranslationRecord {
        original_text: original.to_string(),
        translated_text: translated.to_string(),
        source_lang: "en".to_string(),
        target_lang: "es".to_string(),
        user_id: user.map(|u| u.to_string()),
        ip_address: None,
        model: None,
    }
}

async fn init_db() -> sqlx::Pool<sqlx::Sqlite> {
    const DB_URL: &str = "sqlite::memory:";
    let conn = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .connect(DB_URL)
        .await
        .unwrap();
    translog_dal::MIGRATOR.run(&conn).await.unwrap();

    conn.execute_many(TEST_DATA)
        .try_collect::<Vec<_>>()
        .await
        .unwrap();

    conn
}

#[tokio::test]
async fn test_create_and_find() {
    let conn = init_db().await;
    let repo = translog_dal::record::TranslationRecordRepositoryImpl::new(conn);

    let created = repo
        .create(record("thank you", "gracias", Some("carol")))
        .await
        .unwrap();
    assert!(created.id > 4);
    assert_eq!(created.original_text, "thank you");
    assert_eq!(created.translated_text, "gracias");
    assert_eq!(created.user_id.as_deref(), Some("carol"));
    assert_eq!(created.created_at, created.updated_at);

    let found = repo.find(created.id).await.unwrap().unwrap();
    assert_eq!(found.id, created.id);
    assert_eq!(found.original_text, created.original_text);
    assert_eq!(found.created_at, created.created_at);

    assert!(repo.find(99999).await.unwrap().is_none());
}

#[tokio::test]
async fn test_update_keeps_created_at() {
    let conn = init_db().await;
    let repo = translog_dal::record::TranslationRecordRepositoryImpl::new(conn);

    let created = repo
        .create(record("see you", "hasta luego", Some("carol")))
        .await
        .unwrap();

    let mut payload = record("see you", "nos vemos", Some("carol"));
    payload.model = Some("engine-c".to_string());
    let updated = repo.update(created.id, payload).await.unwrap();

    assert_eq!(updated.id, created.id);
    assert_eq!(updated.translated_text, "nos vemos");
    assert_eq!(updated.model.as_deref(), Some("engine-c"));
    assert_eq!(updated.created_at, created.created_at);
    assert!(updated.updated_at >= created.updated_at);

    let missing = repo.update(99999, record("x", "y", None)).await;
    assert!(matches!(
        missing,
        Err(translog_dal::Error::RecordNotFound(_))
    ));
}

#[tokio::test]
async fn test_delete_is_idempotent() {
    let conn = init_db().await;
    let repo = translog_dal::record::TranslationRecordRepositoryImpl::new(conn);

    repo.delete(1).await.unwrap();
    assert!(repo.find(1).await.unwrap().is_none());

    // second delete and never-existed ids are no-op successes
    repo.delete(1).await.unwrap();
    repo.delete(99999).await.unwrap();
}

#[tokio::test]
async fn test_list_by_user_newest_first() {
    let conn = init_db().await;
    let repo = translog_dal::record::TranslationRecordRepositoryImpl::new(conn);

    let records = repo.list_by_user("alice").await.unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].id, 2);
    assert_eq!(records[1].id, 1);

    let paged = repo
        .list_by_user_paged(
            "alice",
            ListingParams::new(0, 1).with_order(Order::Desc(SortField::CreatedAt)),
        )
        .await
        .unwrap();
    assert_eq!(paged.rows.len(), 1);
    assert_eq!(paged.total, 2);
    assert_eq!(paged.rows[0].id, 2);

    assert!(repo.list_by_user("nobody").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_list_by_langs() {
    let conn = init_db().await;
    let repo = translog_dal::record::TranslationRecordRepositoryImpl::new(conn);

    let en_fr = repo.list_by_langs("en", "fr").await.unwrap();
    assert_eq!(en_fr.len(), 2);
    assert!(en_fr.iter().all(|r| r.target_lang == "fr"));

    assert!(repo.list_by_langs("fr", "en").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_created_between_half_open() {
    let conn = init_db().await;
    let repo = translog_dal::record::TranslationRecordRepositoryImpl::new(conn);

    // [start, end) includes the record at start, excludes the one at end
    let records = repo
        .list_by_created_between(
            datetime!(2026-08-02 09:30:00),
            datetime!(2026-08-03 08:00:00),
        )
        .await
        .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, 2);

    let count = repo
        .count_created_between(datetime!(2026-08-01 00:00:00), datetime!(2026-08-05 00:00:00))
        .await
        .unwrap();
    assert_eq!(count, 4);
}

#[tokio::test]
async fn test_search_substring_over_both_texts() {
    let conn = init_db().await;
    let repo = translog_dal::record::TranslationRecordRepositoryImpl::new(conn);

    // "world" appears in original_text of 1 and 3, and translated_text of 4
    let batch = repo
        .search(Some("world"), None, ListingParams::default())
        .await
        .unwrap();
    assert_eq!(batch.total, 3);
    let mut ids: Vec<i64> = batch.rows.iter().map(|r| r.id).collect();
    ids.sort();
    assert_eq!(ids, vec![1, 3, 4]);

    // both filters combine with AND
    let batch = repo
        .search(Some("world"), Some("alice"), ListingParams::default())
        .await
        .unwrap();
    assert_eq!(batch.total, 1);
    assert_eq!(batch.rows[0].id, 1);

    let batch = repo
        .search(None, Some("bob"), ListingParams::default())
        .await
        .unwrap();
    assert_eq!(batch.total, 1);
    assert_eq!(batch.rows[0].id, 3);

    let batch = repo
        .search(Some("no such text"), None, ListingParams::default())
        .await
        .unwrap();
    assert_eq!(batch.total, 0);
    assert!(batch.rows.is_empty());
}

#[tokio::test]
async fn test_search_without_filters_equals_list_all() {
    let conn = init_db().await;
    let repo = translog_dal::record::TranslationRecordRepositoryImpl::new(conn);

    let order = Order::Asc(SortField::Id);
    let searched = repo
        .search(None, None, ListingParams::new(0, 10).with_order(order))
        .await
        .unwrap();
    let listed = repo
        .list_all(ListingParams::new(0, 10).with_order(order))
        .await
        .unwrap();

    assert_eq!(searched.total, listed.total);
    let searched_ids: Vec<i64> = searched.rows.iter().map(|r| r.id).collect();
    let listed_ids: Vec<i64> = listed.rows.iter().map(|r| r.id).collect();
    assert_eq!(searched_ids, listed_ids);
}

#[tokio::test]
async fn test_pagination_totals() {
    let conn = init_db().await;
    sqlx::query("DELETE FROM translation_records")
        .execute(&conn)
        .await
        .unwrap();
    let repo = translog_dal::record::TranslationRecordRepositoryImpl::new(conn);

    for i in 0..25 {
        repo.create(record(
            &format!("text {i}"),
            &format!("texto {i}"),
            Some("alice"),
        ))
        .await
        .unwrap();
    }

    let order = Order::Asc(SortField::Id);
    let page0 = repo
        .list_all(ListingParams::new(0, 10).with_order(order))
        .await
        .unwrap();
    let page1 = repo
        .list_all(ListingParams::new(10, 10).with_order(order))
        .await
        .unwrap();
    let page2 = repo
        .list_all(ListingParams::new(20, 10).with_order(order))
        .await
        .unwrap();

    assert_eq!(page0.rows.len(), 10);
    assert_eq!(page1.rows.len(), 10);
    assert_eq!(page2.rows.len(), 5);
    assert_eq!(page0.total, 25);
    assert_eq!(page1.total, 25);
    assert_eq!(page2.total, 25);

    // pages do not overlap
    assert!(page0.rows.last().unwrap().id < page1.rows.first().unwrap().id);
    assert!(page1.rows.last().unwrap().id < page2.rows.first().unwrap().id);
}

#[tokio::test]
async fn test_ordering_by_sort_field() {
    let conn = init_db().await;
    let repo = translog_dal::record::TranslationRecordRepositoryImpl::new(conn);

    let batch = repo
        .list_all(ListingParams::new(0, 10).with_order(Order::Desc(SortField::CreatedAt)))
        .await
        .unwrap();
    let ids: Vec<i64> = batch.rows.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![4, 3, 2, 1]);

    let batch = repo
        .list_all(ListingParams::new(0, 10).with_order(Order::Asc(SortField::TargetLang)))
        .await
        .unwrap();
    assert_eq!(batch.rows[0].target_lang, "es");
    assert_eq!(batch.rows[3].target_lang, "fr");
}
